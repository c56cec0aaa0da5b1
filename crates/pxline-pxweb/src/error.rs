//! Error type for the extraction pipeline

use pxline_core::HttpError;

/// Error from building or executing a PX-Web query.
///
/// Single-shot calls return it directly; batched extraction records it
/// per batch and keeps going.
#[derive(Debug)]
pub enum ExtractError {
    /// Remote rejected the request or could not be reached
    Http(HttpError),
    /// Query could not be serialized to JSON
    Encode(serde_json::Error),
    /// Metadata document unparsable or inconsistent
    Metadata(String),
    /// Batch size must be positive
    InvalidBatchSize(usize),
    /// "Latest N" needs N >= 1
    InvalidTopN(u32),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(e) => write!(f, "{e}"),
            Self::Encode(e) => write!(f, "query encoding: {e}"),
            Self::Metadata(msg) => write!(f, "metadata: {msg}"),
            Self::InvalidBatchSize(n) => write!(f, "batch size must be positive, got {n}"),
            Self::InvalidTopN(n) => write!(f, "top-N count must be positive, got {n}"),
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::Encode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<HttpError> for ExtractError {
    fn from(e: HttpError) -> Self {
        Self::Http(e)
    }
}

impl From<serde_json::Error> for ExtractError {
    fn from(e: serde_json::Error) -> Self {
        Self::Encode(e)
    }
}

impl ExtractError {
    /// HTTP status of a rejected request, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status(),
            _ => None,
        }
    }

    /// True for errors raised before any network activity
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidBatchSize(_) | Self::InvalidTopN(_))
    }
}

//! JSON-over-HTTP with a blocking interface.
//!
//! Uses async reqwest internally on a shared tokio runtime, but presents
//! sync functions so the extraction loop stays a plain sequential loop.

use std::sync::{LazyLock, OnceLock};
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

const JSON_MIME: &str = "application/json";

/// Redirect hops followed before giving up
const MAX_REDIRECTS: usize = 10;

/// Timeouts applied to the shared client.
///
/// Must be set (via [`set_http_config`]) before the first request; the
/// client is built once and reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
        }
    }
}

static HTTP_CONFIG: OnceLock<HttpConfig> = OnceLock::new();

/// Install process-wide HTTP settings. Later calls are ignored.
pub fn set_http_config(config: HttpConfig) {
    if HTTP_CONFIG.set(config).is_err() {
        log::warn!("HTTP config already initialized, ignoring {config:?}");
    }
}

/// Effective HTTP settings (defaults when never set)
pub fn http_config() -> HttpConfig {
    HTTP_CONFIG.get().copied().unwrap_or_default()
}

/// Failure of a single HTTP exchange
#[derive(Debug)]
pub enum HttpError {
    /// Server answered with anything other than 200
    Status { status: u16, body: String },
    /// Connect, timeout, redirect or body-read failure (no usable status)
    Transport(String),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status { status, body } => write!(f, "HTTP {status}: {body}"),
            Self::Transport(message) => write!(f, "HTTP error: {message}"),
        }
    }
}

impl std::error::Error for HttpError {}

impl HttpError {
    /// Create transport error from reqwest error.
    ///
    /// The URL is stripped so query endpoints don't end up in logs twice.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        Self::Transport(e.without_url().to_string())
    }

    /// Status code, when the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) => None,
        }
    }
}

/// Shared async HTTP client (redirects followed, timeouts from [`http_config`]).
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    let config = http_config();
    reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .expect("failed to build HTTP client")
});

/// Get shared HTTP client.
pub fn http_client() -> &'static reqwest::Client {
    &SHARED_CLIENT
}

/// Shared tokio runtime for HTTP operations.
///
/// Multi-thread flavor so `Handle::block_on` can drive the IO driver.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// POST a JSON body and return the response text.
///
/// Any status other than 200 is an error carrying status and body.
pub fn post_json(url: &str, body: String) -> Result<String, HttpError> {
    log::debug!("POST {url} ({} bytes)", body.len());
    SHARED_RUNTIME.handle().block_on(async {
        let response = http_client()
            .post(url)
            .header(CONTENT_TYPE, JSON_MIME)
            .header(ACCEPT, JSON_MIME)
            .body(body)
            .send()
            .await
            .map_err(HttpError::from_reqwest)?;
        read_ok(response).await
    })
}

/// GET a JSON document and return the response text.
pub fn get_json(url: &str) -> Result<String, HttpError> {
    log::debug!("GET {url}");
    SHARED_RUNTIME.handle().block_on(async {
        let response = http_client()
            .get(url)
            .header(ACCEPT, JSON_MIME)
            .send()
            .await
            .map_err(HttpError::from_reqwest)?;
        read_ok(response).await
    })
}

async fn read_ok(response: reqwest::Response) -> Result<String, HttpError> {
    let status = response.status();
    let body = response.text().await.map_err(HttpError::from_reqwest)?;
    if status != StatusCode::OK {
        return Err(HttpError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

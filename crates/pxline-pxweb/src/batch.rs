//! Batch planning over the postal-code axis
//!
//! The server caps response size at roughly postal codes x years x
//! building types x metrics cells. Only postal codes are split; the caller
//! sizes batches so the other axes fit.

use crate::error::ExtractError;

/// Postal codes per request when the caller does not choose
pub const DEFAULT_BATCH_SIZE: usize = 30;

/// Contiguous, order-preserving chunks of at most `size` items.
///
/// The last chunk may be shorter; empty input gives no chunks.
pub fn chunk<T>(items: &[T], size: usize) -> Result<Vec<&[T]>, ExtractError> {
    if size == 0 {
        return Err(ExtractError::InvalidBatchSize(size));
    }
    Ok(items.chunks(size).collect())
}

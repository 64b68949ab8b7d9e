//! Concurrency helpers.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::errors::{EnrichError, Result};

/// Run `fut` unless `cancel` fires first, in which case `fut` is dropped and
/// [`EnrichError::Cancelled`] is returned.
///
/// An already-cancelled token wins even if `fut` is immediately ready.
pub async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(EnrichError::Cancelled),
        res = fut => res,
    }
}

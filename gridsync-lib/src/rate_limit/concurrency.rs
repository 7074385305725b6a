//! Concurrency limiting for simultaneous requests.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::sync::SemaphorePermit;

use crate::error::ApiError;

/// Limits the number of concurrent requests.
///
/// Wraps a `tokio::sync::Semaphore`. Bulk deletes fan out one request per
/// selected row; this keeps a large selection from opening an unbounded
/// number of connections.
///
/// # Example
///
/// ```
/// use gridsync_lib::rate_limit::ConcurrencyLimiter;
///
/// let limiter = ConcurrencyLimiter::new(4);
/// assert_eq!(limiter.limit(), 4);
/// assert_eq!(limiter.available(), 4);
/// ```
#[derive(Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl ConcurrencyLimiter {
    /// Limit used when none is configured.
    pub const DEFAULT_LIMIT: usize = 8;

    /// Creates a new concurrency limiter with the specified limit.
    pub fn new(limit: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// Acquires a permit, waiting if necessary.
    ///
    /// The permit is released when dropped. Fails only after [`close`](Self::close).
    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>, ApiError> {
        self.semaphore.acquire().await.map_err(|_| ApiError::Shutdown)
    }

    /// Stops handing out permits; waiting and future acquires fail.
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Returns the configured limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the number of available permits.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl Default for ConcurrencyLimiter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT)
    }
}

//! Concurrency limiter implementation
//!
//! Provides a semaphore-based limiter shared by every migration task so
//! the number of in-flight management API requests never exceeds the
//! operator-configured worker count.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Semaphore-based limiter for concurrent management API requests.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    max_concurrent_requests: usize,
    requests_acquired: Arc<AtomicU64>,
}

impl ConcurrencyLimiter {
    /// Create a limiter with the given number of permits. Zero is clamped
    /// to one so a misconfigured run degrades to sequential execution
    /// instead of deadlocking.
    pub fn new(max_concurrent_requests: usize) -> Self {
        let permits = max_concurrent_requests.max(1);

        Self {
            semaphore: Arc::new(Semaphore::new(permits)),
            max_concurrent_requests: permits,
            requests_acquired: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Acquire a permit for making a request. Waits if at capacity.
    /// Returns an owned permit that releases automatically when dropped.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        let permit = self.semaphore.clone().acquire_owned().await.unwrap();
        self.requests_acquired.fetch_add(1, Ordering::Relaxed);

        debug!(
            "Concurrency limiter: acquired permit ({}/{} in use)",
            self.max_concurrent_requests - self.semaphore.available_permits(),
            self.max_concurrent_requests
        );

        permit
    }

    /// Get the number of requests that can start immediately.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Get the maximum number of concurrent requests.
    pub fn max_concurrent_requests(&self) -> usize {
        self.max_concurrent_requests
    }

    /// Total permits handed out since creation.
    pub fn requests_acquired(&self) -> u64 {
        self.requests_acquired.load(Ordering::Relaxed)
    }
}

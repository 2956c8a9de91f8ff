//! Global bounded-parallelism limiter shared by crawling and downloading.
//!
//! Backed by a tokio [`Semaphore`], which wakes waiters in FIFO order, so no
//! waiter starves while permits keep being released.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::trace;

/// Error returned when the gate has been closed.
#[derive(Debug, thiserror::Error)]
#[error("concurrency gate closed")]
pub struct GateClosed;

/// Counting gate with a fixed number of slots.
///
/// Clones share the same slots.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// A held slot. Dropping it frees the slot.
#[derive(Debug)]
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl GatePermit {
    /// Frees the slot now.
    pub fn release(self) {
        drop(self);
    }
}

impl ConcurrencyGate {
    /// Creates a gate with `capacity` slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Total number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots not currently held.
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Suspends until a slot is free, then holds it.
    ///
    /// # Errors
    ///
    /// Returns [`GateClosed`] if [`close`](Self::close) was called.
    pub async fn acquire(&self) -> Result<GatePermit, GateClosed> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| GateClosed)?;
        trace!(available = self.available(), "gate slot acquired");
        Ok(GatePermit { _permit: permit })
    }

    /// Stops admitting work; pending and future acquisitions fail.
    ///
    /// Slots already held stay valid until their permits drop.
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }
}

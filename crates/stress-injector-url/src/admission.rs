//! Admission control for bulk call scheduling.
//!
//! Scheduling a call requires a permit. A refused permit is an admission
//! failure, which the injector answers with backoff, never with dropping the
//! call.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Admission was refused because the pool is saturated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("worker pool saturated: {capacity} calls in flight")]
pub struct AdmissionError {
    /// Capacity of the refusing pool.
    pub capacity: usize,
}

/// Held by a scheduled call for as long as it runs.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: Option<OwnedSemaphorePermit>,
}

impl AdmissionPermit {
    /// A permit not tied to any pool.
    pub fn unbounded() -> Self {
        Self { _permit: None }
    }
}

/// Decides whether another call may be scheduled right now.
pub trait Admission: Send + Sync + 'static {
    /// Attempts to admit one call without waiting.
    fn try_admit(&self) -> Result<AdmissionPermit, AdmissionError>;

    /// Maximum number of concurrently admitted calls.
    fn capacity(&self) -> usize;
}

/// Semaphore-backed pool with a fixed number of slots.
#[derive(Debug, Clone)]
pub struct PoolAdmission {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl PoolAdmission {
    /// Creates a pool with `capacity` slots, clamped to what a semaphore can hold.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Free slots.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl Admission for PoolAdmission {
    fn try_admit(&self) -> Result<AdmissionPermit, AdmissionError> {
        Arc::clone(&self.semaphore)
            .try_acquire_owned()
            .map(|permit| AdmissionPermit {
                _permit: Some(permit),
            })
            .map_err(|_| AdmissionError {
                capacity: self.capacity,
            })
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

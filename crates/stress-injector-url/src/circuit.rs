//! Cumulative admission retry accounting.
//!
//! One [`CircuitState`] lives for a whole injector run. Retries are never
//! cleared between calls, so the limit bounds the total number of backoffs.

use std::time::Duration;

/// What to do after an admission failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitDecision {
    /// Sleep for the interval, then retry the same call.
    Backoff(Duration),
    /// The retry limit is exceeded; stop scheduling.
    Exhausted,
}

/// Admission retry counter and backoff interval for one injector run.
///
/// The counter is cumulative across the run: it is not reset when a retry
/// succeeds, only by [`reset`](Self::reset) at the start of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitState {
    retries: usize,
    limit: usize,
    backoff: Duration,
}

impl CircuitState {
    /// Creates a fresh state.
    pub fn new(limit: usize, backoff: Duration) -> Self {
        Self {
            retries: 0,
            limit,
            backoff,
        }
    }

    /// Counts one admission failure.
    pub fn record_failure(&mut self) -> CircuitDecision {
        self.retries += 1;
        if self.retries > self.limit {
            CircuitDecision::Exhausted
        } else {
            CircuitDecision::Backoff(self.backoff)
        }
    }

    /// Failures recorded so far.
    pub fn retries(&self) -> usize {
        self.retries
    }

    /// Configured retry limit.
    pub fn limit(&self) -> usize {
        self.limit
    }
}

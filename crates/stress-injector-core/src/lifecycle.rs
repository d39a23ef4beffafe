//! Run lifecycle shared by every stress controller.
//!
//! ```text
//! Idle -> Starting -> Running -> Stopping -> Reporting -> Idle
//!            |           |          ^
//!            +-----------+----------+   (cancellation)
//!            |
//!            +----------------------------> Reporting     (aborted start)
//! ```
//!
//! The phase is stored atomically so other threads (a signal handler, a
//! progress display) can observe it while the controller drives the run.

use crate::error::StressError;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Phase of a stress run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum RunPhase {
    /// No run is in progress.
    Idle = 0,
    /// Setup: spawning samplers, preflight calls.
    Starting = 1,
    /// The engine is generating load.
    Running = 2,
    /// Load generation is being torn down.
    Stopping = 3,
    /// The final report is being assembled.
    Reporting = 4,
}

impl RunPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => RunPhase::Starting,
            2 => RunPhase::Running,
            3 => RunPhase::Stopping,
            4 => RunPhase::Reporting,
            _ => RunPhase::Idle,
        }
    }

    /// Returns the phase name used in events and metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Idle => "Idle",
            RunPhase::Starting => "Starting",
            RunPhase::Running => "Running",
            RunPhase::Stopping => "Stopping",
            RunPhase::Reporting => "Reporting",
        }
    }

    /// Returns `true` if the lifecycle may move from `self` to `to`.
    pub fn can_transition_to(&self, to: RunPhase) -> bool {
        use RunPhase::*;
        matches!(
            (*self, to),
            (Idle, Starting)
                | (Starting, Running)
                | (Starting, Stopping)
                | (Starting, Reporting)
                | (Running, Stopping)
                | (Stopping, Reporting)
                | (Reporting, Idle)
        )
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic holder of the current [`RunPhase`] for one controller.
#[derive(Debug)]
pub struct Lifecycle {
    phase: AtomicU8,
}

impl Lifecycle {
    /// Creates a lifecycle in [`RunPhase::Idle`].
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(RunPhase::Idle as u8),
        }
    }

    /// Returns the current phase.
    pub fn phase(&self) -> RunPhase {
        RunPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Moves to `to`, returning the phase that was left.
    ///
    /// Starting a run while another is in flight yields
    /// [`StressError::AlreadyRunning`]; any other disallowed move yields
    /// [`StressError::InvalidTransition`].
    pub fn advance(&self, to: RunPhase) -> Result<RunPhase, StressError> {
        let mut current = self.phase();
        loop {
            if !current.can_transition_to(to) {
                return Err(if to == RunPhase::Starting {
                    StressError::AlreadyRunning { phase: current }
                } else {
                    StressError::InvalidTransition { from: current, to }
                });
            }
            match self.phase.compare_exchange(
                current as u8,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(current),
                Err(actual) => current = RunPhase::from_u8(actual),
            }
        }
    }

    /// Forces the lifecycle back to [`RunPhase::Idle`], returning the phase
    /// that was left. Used when a run ends, successfully or not.
    pub fn finish(&self) -> RunPhase {
        RunPhase::from_u8(self.phase.swap(RunPhase::Idle as u8, Ordering::AcqRel))
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

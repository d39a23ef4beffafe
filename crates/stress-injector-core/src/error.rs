//! Common error types for stress engines.
//!
//! [`StressError`] covers the conditions that stop a controller from
//! producing a report at all: invalid input, an unsupported host, misuse of
//! the run lifecycle, or failing to spawn the execution units a run needs.
//!
//! Conditions that end a run early but still yield a report (preflight
//! failure, admission exhaustion, manual cancellation) are not errors; they
//! are recorded in the report of the engine that hit them. Per-call network
//! failures are plain values folded into counters.
//!
//! # Examples
//!
//! ```
//! use stress_injector_core::StressError;
//!
//! let err = StressError::invalid_input("rate", "must be positive");
//! assert!(err.is_invalid_input());
//! assert_eq!(err.to_string(), "invalid rate: must be positive");
//! ```

use crate::lifecycle::RunPhase;

/// Errors that prevent a stress run from starting or from being reported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StressError {
    /// A run parameter was rejected during validation.
    #[error("invalid {field}: {reason}")]
    InvalidInput {
        /// The parameter that failed validation.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The host operating system is outside the supported set.
    #[error("unsupported platform '{os}': supported on macOS, Linux, Windows")]
    UnsupportedPlatform {
        /// The operating system name reported by the host.
        os: String,
    },

    /// The controller is already executing a run.
    #[error("a run is already in progress (phase: {phase})")]
    AlreadyRunning {
        /// The phase the in-flight run was in.
        phase: RunPhase,
    },

    /// The lifecycle was asked to make a transition it does not allow.
    #[error("invalid lifecycle transition from {from} to {to}")]
    InvalidTransition {
        /// Phase the lifecycle was in.
        from: RunPhase,
        /// Phase that was requested.
        to: RunPhase,
    },

    /// An execution unit (thread or task) could not be spawned.
    #[error("failed to spawn {what}: {reason}")]
    Spawn {
        /// What was being spawned.
        what: &'static str,
        /// The underlying failure.
        reason: String,
    },

    /// Final counts do not add up to the requested volume.
    #[error("accounting mismatch: requested {requested}, accounted for {accounted}")]
    AccountingMismatch {
        /// Volume the run was asked for.
        requested: usize,
        /// Sum of every bucket in the final report.
        accounted: usize,
    },
}

/// Result type for stress operations.
pub type Result<T> = std::result::Result<T, StressError>;

impl StressError {
    /// Creates an [`StressError::InvalidInput`] error.
    pub fn invalid_input(field: &'static str, reason: impl Into<String>) -> Self {
        StressError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Creates an [`StressError::Spawn`] error from any displayable failure.
    pub fn spawn(what: &'static str, reason: impl std::fmt::Display) -> Self {
        StressError::Spawn {
            what,
            reason: reason.to_string(),
        }
    }

    /// Returns `true` if this is an input validation error.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, StressError::InvalidInput { .. })
    }

    /// Returns `true` if this is an unsupported platform error.
    pub fn is_unsupported_platform(&self) -> bool {
        matches!(self, StressError::UnsupportedPlatform { .. })
    }

    /// Returns `true` for errors raised during setup, before any work began.
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            StressError::InvalidInput { .. }
                | StressError::UnsupportedPlatform { .. }
                | StressError::AlreadyRunning { .. }
        )
    }
}

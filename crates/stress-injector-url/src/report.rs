//! Load accounting and the final URL report.

use crate::error::RequestError;
use crate::method::HttpMethod;
use std::fmt;
use std::time::Duration;
use stress_injector_core::StressError;

/// Final counts of one injection.
///
/// `success + error + abandoned == requested` and
/// `success + error == scheduled` hold for every run, completed or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LoadResult {
    /// Calls the run was asked to make.
    pub requested: usize,
    /// Calls that were admitted and dispatched.
    pub scheduled: usize,
    /// Calls that completed with a success status.
    pub success: usize,
    /// Calls that raised or returned a failure status.
    pub error: usize,
    /// Calls never dispatched.
    pub abandoned: usize,
}

impl LoadResult {
    /// A result where nothing was dispatched.
    pub fn all_abandoned(requested: usize) -> Self {
        Self {
            requested,
            abandoned: requested,
            ..Self::default()
        }
    }

    /// Re-checks the accounting invariants.
    pub fn verify(&self) -> Result<(), StressError> {
        let accounted = self.success + self.error + self.abandoned;
        if accounted != self.requested || self.success + self.error != self.scheduled {
            return Err(StressError::AccountingMismatch {
                requested: self.requested,
                accounted,
            });
        }
        Ok(())
    }
}

/// Why an injection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Termination {
    /// Every call was dispatched and completed.
    Completed,
    /// Scheduling stopped on external cancellation.
    Cancelled,
    /// Admission retries exceeded the limit.
    AdmissionExhausted {
        /// Admission failures recorded in the run.
        retries: usize,
    },
    /// The preflight call failed; no bulk call was made.
    PreflightFailed {
        /// Why the preflight failed.
        cause: RequestError,
    },
}

impl Termination {
    /// Returns `true` if the run ended before dispatching every call.
    pub fn is_early(&self) -> bool {
        !matches!(self, Termination::Completed)
    }
}

/// Result of one [`LoadInjector`](crate::LoadInjector) run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injection {
    /// Final counts.
    pub result: LoadResult,
    /// How scheduling ended.
    pub termination: Termination,
    /// Admission failures recorded.
    pub admission_retries: usize,
    /// Wall time from first schedule to last completion.
    pub elapsed: Duration,
}

/// Final report of a URL stress run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct UrlReport {
    /// `host[:port]` of the target.
    pub target: String,
    /// Request method used.
    pub method: HttpMethod,
    /// Final counts.
    pub result: LoadResult,
    /// How the run ended.
    pub termination: Termination,
    /// Admission failures recorded.
    pub admission_retries: usize,
    /// Duration of the bulk phase.
    pub elapsed: Duration,
}

impl fmt::Display for UrlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.termination {
            Termination::PreflightFailed { cause } => {
                writeln!(f, "Sample call failed, cannot proceed stress testing: {cause}")?;
            }
            termination => {
                writeln!(
                    f,
                    "Request injection on '{}' with rate {}",
                    self.target,
                    thousands(self.result.requested)
                )?;
                writeln!(
                    f,
                    "Request injection completed in {:.2} seconds",
                    self.elapsed.as_secs_f64()
                )?;
                match termination {
                    Termination::Cancelled => writeln!(f, "Injection was cancelled")?,
                    Termination::AdmissionExhausted { retries } => writeln!(
                        f,
                        "Scheduling stopped after {retries} admission retries"
                    )?,
                    _ => {}
                }
            }
        }
        writeln!(f, "Total number of requests passed: {}", thousands(self.result.success))?;
        writeln!(f, "Total number of requests failed: {}", thousands(self.result.error))?;
        write!(
            f,
            "Total number of requests abandoned: {}",
            thousands(self.result.abandoned)
        )
    }
}

/// Formats `n` with comma thousands separators.
pub fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

//! Aggregation of utilization samples into a per-core ranking.

use std::fmt;
use std::time::Duration;

/// Peak utilization observed on one logical core.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CorePeak {
    /// Zero-based core index.
    pub core: usize,
    /// Highest utilization percentage recorded for the core.
    pub percent: f32,
}

impl fmt::Display for CorePeak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Core {} - {}%", self.core + 1, self.percent)
    }
}

/// Outcome of the aggregation step.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum UtilizationReport {
    /// Cores sorted by peak utilization, highest first; ties keep ascending
    /// core order.
    Measured(Vec<CorePeak>),
    /// The run stopped before the sampler recorded anything.
    StoppedBeforeMeasurement,
}

impl UtilizationReport {
    /// Returns the ranking, or an empty slice when nothing was measured.
    pub fn ranking(&self) -> &[CorePeak] {
        match self {
            UtilizationReport::Measured(peaks) => peaks,
            UtilizationReport::StoppedBeforeMeasurement => &[],
        }
    }

    /// Returns `true` if at least one sample contributed to the report.
    pub fn is_measured(&self) -> bool {
        matches!(self, UtilizationReport::Measured(_))
    }
}

impl fmt::Display for UtilizationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UtilizationReport::StoppedBeforeMeasurement => {
                write!(f, "Stress Test was stopped before it began.")
            }
            UtilizationReport::Measured(peaks) => {
                write!(f, "CPU Usage Report:")?;
                for peak in peaks {
                    write!(f, "\n{peak}")?;
                }
                Ok(())
            }
        }
    }
}

/// Turns "one row per poll, one column per core" into "one row per core,
/// one column per poll". Rows are truncated to the shortest poll.
pub fn transpose(rows: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let cores = rows.iter().map(Vec::len).min().unwrap_or(0);
    (0..cores)
        .map(|core| rows.iter().map(|row| row[core]).collect())
        .collect()
}

/// Reduces each core's readings to their maximum and ranks the cores.
///
/// # Examples
///
/// ```
/// use stress_injector_cpu::{rank_cores, CorePeak, UtilizationReport};
///
/// let report = rank_cores(&[vec![10.0, 90.0], vec![30.0, 70.0]]);
/// assert_eq!(
///     report,
///     UtilizationReport::Measured(vec![
///         CorePeak { core: 1, percent: 90.0 },
///         CorePeak { core: 0, percent: 30.0 },
///     ])
/// );
/// ```
pub fn rank_cores(rows: &[Vec<f32>]) -> UtilizationReport {
    if rows.is_empty() {
        return UtilizationReport::StoppedBeforeMeasurement;
    }

    let mut peaks: Vec<CorePeak> = transpose(rows)
        .into_iter()
        .enumerate()
        .map(|(core, readings)| CorePeak {
            core,
            percent: readings.into_iter().fold(f32::MIN, f32::max),
        })
        .collect();

    // sort_by is stable, so equal peaks stay in ascending core order
    peaks.sort_by(|a, b| b.percent.total_cmp(&a.percent));
    UtilizationReport::Measured(peaks)
}

/// Final report of one CPU stress run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CpuReport {
    /// Duration the run was asked to load the cores for.
    pub requested: Duration,
    /// How long workers actually ran; `None` if they never started.
    pub load_runtime: Option<Duration>,
    /// Number of workers that were started.
    pub workers_started: usize,
    /// Workers that missed the termination grace and were detached.
    pub workers_detached: usize,
    /// Number of polls the sampler recorded.
    pub samples: usize,
    /// Whether the run was cancelled externally.
    pub cancelled: bool,
    /// Per-core ranking.
    pub utilization: UtilizationReport,
}

impl CpuReport {
    /// Seconds the run stopped short of the requested duration, if any.
    pub fn stopped_early_by(&self) -> Option<u64> {
        let runtime = self.load_runtime?.as_secs();
        let requested = self.requested.as_secs();
        (runtime > 0 && runtime < requested).then(|| requested - runtime)
    }
}

impl fmt::Display for CpuReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(early), Some(runtime)) = (self.stopped_early_by(), self.load_runtime) {
            writeln!(
                f,
                "Actual runtime: {} seconds. Stopped {} seconds early.",
                runtime.as_secs(),
                early
            )?;
        }
        write!(f, "{}", self.utilization)
    }
}

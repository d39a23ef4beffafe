//! Per-core utilization sampling on a dedicated thread.

use crate::events::CpuEvent;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use stress_injector_core::events::EventListeners;
use stress_injector_core::{CancellationToken, SharedProgress, StressError};
use sysinfo::System;

#[cfg(feature = "metrics")]
use metrics::counter;

/// Source of per-core utilization readings.
///
/// Each call returns one percentage per logical core, measured over the time
/// since the previous call.
pub trait UtilizationSource: Send + 'static {
    /// Takes one reading per core.
    fn sample(&mut self) -> Vec<f32>;
}

impl<F> UtilizationSource for F
where
    F: FnMut() -> Vec<f32> + Send + 'static,
{
    fn sample(&mut self) -> Vec<f32> {
        self()
    }
}

/// Reads utilization from the operating system through `sysinfo`.
pub struct SysinfoSource {
    system: System,
}

impl SysinfoSource {
    /// Creates a source and primes its baseline reading.
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        Self { system }
    }
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl UtilizationSource for SysinfoSource {
    fn sample(&mut self) -> Vec<f32> {
        self.system.refresh_cpu_usage();
        self.system
            .cpus()
            .iter()
            .map(|cpu| round_tenth(cpu.cpu_usage()))
            .collect()
    }
}

/// Number of logical cores on the host.
pub fn logical_cores() -> usize {
    let mut system = System::new();
    system.refresh_cpu_usage();
    system.cpus().len().max(1)
}

fn round_tenth(percent: f32) -> f32 {
    (percent * 10.0).round() / 10.0
}

/// One utilization reading for one core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtilizationSample {
    /// Zero-based core index.
    pub core: usize,
    /// Utilization percentage.
    pub percent: f32,
    /// When the poll that produced this reading completed.
    pub taken_at: Instant,
}

#[derive(Debug, Clone)]
struct SampleRow {
    taken_at: Instant,
    percents: Vec<f32>,
}

/// Bounded log of sampler polls.
///
/// When the log reaches capacity every stored row is folded into a single
/// row of per-core maxima, so peaks survive while memory stays bounded.
#[derive(Debug, Clone)]
pub struct SampleLog {
    rows: Vec<SampleRow>,
    capacity: usize,
    compactions: usize,
}

impl SampleLog {
    /// Creates an empty log holding at most `capacity` rows (minimum 2).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            rows: Vec::with_capacity(capacity.min(4096)),
            capacity,
            compactions: 0,
        }
    }

    /// Appends one poll.
    pub fn record(&mut self, percents: Vec<f32>) {
        if self.rows.len() == self.capacity {
            self.compact();
        }
        self.rows.push(SampleRow {
            taken_at: Instant::now(),
            percents,
        });
    }

    fn compact(&mut self) {
        let Some(last) = self.rows.last() else {
            return;
        };
        let taken_at = last.taken_at;
        let rows: Vec<Vec<f32>> = self.rows.drain(..).map(|row| row.percents).collect();
        let percents = crate::report::transpose(&rows)
            .into_iter()
            .map(|readings| readings.into_iter().fold(f32::MIN, f32::max))
            .collect();
        self.rows.push(SampleRow { taken_at, percents });
        self.compactions += 1;
    }

    /// Number of rows currently held.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of times the log folded itself to stay within capacity.
    pub fn compactions(&self) -> usize {
        self.compactions
    }

    /// Row-major copy of the readings: one row per poll.
    pub fn rows(&self) -> Vec<Vec<f32>> {
        self.rows.iter().map(|row| row.percents.clone()).collect()
    }

    /// Iterates every individual reading.
    pub fn samples(&self) -> impl Iterator<Item = UtilizationSample> + '_ {
        self.rows.iter().flat_map(|row| {
            row.percents
                .iter()
                .enumerate()
                .map(move |(core, &percent)| UtilizationSample {
                    core,
                    percent,
                    taken_at: row.taken_at,
                })
        })
    }
}

/// Renders the live per-core line shown while sampling.
pub fn live_line(percents: &[f32]) -> String {
    percents
        .iter()
        .enumerate()
        .map(|(core, percent)| format!("Core {}: {}%", core + 1, percent))
        .collect::<Vec<_>>()
        .join("\t")
}

/// Handle to a running sampler thread.
pub struct Sampler {
    stop: CancellationToken,
    handle: JoinHandle<SampleLog>,
}

pub(crate) struct SamplerSettings {
    pub(crate) interval: Duration,
    pub(crate) capacity: usize,
    pub(crate) engine_name: String,
    pub(crate) listeners: EventListeners<CpuEvent>,
    pub(crate) progress: SharedProgress,
}

impl Sampler {
    /// Starts polling `source` every `settings.interval` on a new thread.
    ///
    /// The thread checks its stop flag before every poll, so a sampler that is
    /// stopped before its first interval elapses records nothing.
    pub(crate) fn spawn(
        mut source: Box<dyn UtilizationSource>,
        settings: SamplerSettings,
    ) -> Result<Self, StressError> {
        let stop = CancellationToken::new();
        let observed = stop.clone();

        let handle = thread::Builder::new()
            .name("cpu-sampler".to_string())
            .spawn(move || {
                let mut log = SampleLog::with_capacity(settings.capacity);
                while !observed.wait_timeout(settings.interval) {
                    let percents = source.sample();
                    settings.progress.update(&live_line(&percents));

                    #[cfg(feature = "metrics")]
                    counter!("cpu_samples_total", "engine" => settings.engine_name.clone())
                        .increment(1);

                    settings.listeners.emit(&CpuEvent::Sampled {
                        engine_name: settings.engine_name.clone(),
                        timestamp: Instant::now(),
                        percents: percents.clone(),
                    });
                    log.record(percents);
                }
                settings.progress.finish();
                log
            })
            .map_err(|e| StressError::spawn("cpu sampler", e))?;

        Ok(Self { stop, handle })
    }

    /// Signals the sampler to stop and collects its log.
    ///
    /// A sampler that panicked yields an empty log.
    pub fn stop(self) -> SampleLog {
        self.stop.cancel();
        match self.handle.join() {
            Ok(log) => log,
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::error!("CPU sampler panicked; reporting without samples");
                SampleLog::with_capacity(2)
            }
        }
    }
}

//! Configuration for the CPU stress engine.

use crate::events::CpuEvent;
use crate::sampler::{SysinfoSource, UtilizationSource};
use crate::CpuStress;
use std::sync::Arc;
use std::time::Duration;
use stress_injector_core::events::EventListeners;
use stress_injector_core::{progress, RunPhase, SharedProgress, StressError};

#[cfg(feature = "metrics")]
use metrics::{describe_counter, describe_gauge};
#[cfg(feature = "metrics")]
use std::sync::Once;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// Factory producing a fresh utilization source for each run.
pub type SourceFactory = Arc<dyn Fn() -> Box<dyn UtilizationSource> + Send + Sync>;

/// Configuration for the CPU stress engine.
#[derive(Clone)]
pub struct CpuStressConfig {
    pub(crate) duration: Duration,
    pub(crate) cores: Option<usize>,
    pub(crate) sample_interval: Duration,
    pub(crate) warmup: Duration,
    pub(crate) settle: Duration,
    pub(crate) termination_grace: Duration,
    pub(crate) sample_capacity: usize,
    pub(crate) name: String,
    pub(crate) progress: SharedProgress,
    pub(crate) source: SourceFactory,
    pub(crate) event_listeners: EventListeners<CpuEvent>,
}

impl CpuStressConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CpuStressConfigBuilder {
        #[cfg(feature = "metrics")]
        {
            METRICS_INIT.call_once(|| {
                describe_counter!(
                    "cpu_workers_started_total",
                    "Total number of core workers started"
                );
                describe_counter!(
                    "cpu_workers_detached_total",
                    "Core workers that missed the termination grace period"
                );
                describe_counter!(
                    "cpu_samples_total",
                    "Total number of per-core utilization polls"
                );
                describe_gauge!(
                    "cpu_run_phase",
                    "Lifecycle phase of the CPU stress run"
                );
            });
        }
        CpuStressConfigBuilder::new()
    }

    /// Requested load duration.
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// Builder for [`CpuStressConfig`].
pub struct CpuStressConfigBuilder {
    duration: Duration,
    cores: Option<usize>,
    sample_interval: Duration,
    warmup: Duration,
    settle: Duration,
    termination_grace: Duration,
    sample_capacity: usize,
    name: String,
    progress: SharedProgress,
    source: SourceFactory,
    event_listeners: EventListeners<CpuEvent>,
}

impl CpuStressConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            duration: Duration::ZERO,
            cores: None,
            sample_interval: Duration::from_secs(1),
            warmup: Duration::from_secs(1),
            settle: Duration::from_secs(1),
            termination_grace: Duration::from_millis(500),
            sample_capacity: 3600,
            name: "cpu".to_string(),
            progress: progress::noop(),
            source: Arc::new(|| Box::new(SysinfoSource::new()) as Box<dyn UtilizationSource>),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets how long the workers load the cores. Must be positive.
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Shorthand for [`duration`](Self::duration) in whole seconds.
    pub fn seconds(self, seconds: u64) -> Self {
        self.duration(Duration::from_secs(seconds))
    }

    /// Overrides the number of workers.
    ///
    /// Default: one per logical core
    pub fn cores(mut self, cores: usize) -> Self {
        self.cores = Some(cores);
        self
    }

    /// Sets the sampler poll interval.
    ///
    /// Default: 1 second
    pub fn sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Sets the pause between starting the sampler and starting the workers.
    ///
    /// Default: 1 second
    pub fn warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    /// Sets the pause between terminating the workers and stopping the sampler.
    ///
    /// Skipped when the run was cancelled. Default: 1 second
    pub fn settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Sets how long to wait for each worker to exit before detaching it.
    ///
    /// Default: 500 milliseconds
    pub fn termination_grace(mut self, grace: Duration) -> Self {
        self.termination_grace = grace;
        self
    }

    /// Sets how many polls the sample log keeps before folding them.
    ///
    /// Default: 3600
    pub fn sample_capacity(mut self, capacity: usize) -> Self {
        self.sample_capacity = capacity;
        self
    }

    /// Sets the name of this engine instance.
    ///
    /// Default: "cpu"
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets where the live per-core line is written.
    ///
    /// Default: discarded
    pub fn progress(mut self, progress: SharedProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Replaces the operating system utilization source.
    pub fn utilization_source<F, S>(mut self, factory: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: UtilizationSource,
    {
        self.source = Arc::new(move || Box::new(factory()) as Box<dyn UtilizationSource>);
        self
    }

    /// Registers a callback for every sampler poll.
    pub fn on_sample<F>(mut self, f: F) -> Self
    where
        F: Fn(&[f32]) + Send + Sync + 'static,
    {
        self.event_listeners.add(move |event: &CpuEvent| {
            if let CpuEvent::Sampled { percents, .. } = event {
                f(percents);
            }
        });
        self
    }

    /// Registers a callback for when a core worker starts.
    pub fn on_worker_started<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(move |event: &CpuEvent| {
            if let CpuEvent::WorkerStarted { worker, .. } = event {
                f(*worker);
            }
        });
        self
    }

    /// Registers a callback for when a core worker is torn down.
    ///
    /// The flag is `true` when the worker was detached.
    pub fn on_worker_terminated<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, bool) + Send + Sync + 'static,
    {
        self.event_listeners.add(move |event: &CpuEvent| {
            if let CpuEvent::WorkerTerminated {
                worker, detached, ..
            } = event
            {
                f(*worker, *detached);
            }
        });
        self
    }

    /// Registers a callback for lifecycle transitions.
    pub fn on_phase_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(RunPhase, RunPhase) + Send + Sync + 'static,
    {
        self.event_listeners.on_phase(f);
        self
    }

    /// Validates the configuration and builds the engine.
    pub fn build(self) -> Result<CpuStress, StressError> {
        if self.duration.is_zero() {
            return Err(StressError::invalid_input(
                "seconds",
                "duration must be positive",
            ));
        }
        if self.cores == Some(0) {
            return Err(StressError::invalid_input(
                "cores",
                "at least one core is required",
            ));
        }
        if self.sample_interval.is_zero() {
            return Err(StressError::invalid_input(
                "sample_interval",
                "interval must be positive",
            ));
        }

        let config = CpuStressConfig {
            duration: self.duration,
            cores: self.cores,
            sample_interval: self.sample_interval,
            warmup: self.warmup,
            settle: self.settle,
            termination_grace: self.termination_grace,
            sample_capacity: self.sample_capacity,
            name: self.name,
            progress: self.progress,
            source: self.source,
            event_listeners: self.event_listeners,
        };
        Ok(CpuStress::new(config))
    }
}

impl Default for CpuStressConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

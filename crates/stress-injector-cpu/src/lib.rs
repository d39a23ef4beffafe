//! CPU stress engine.
//!
//! Saturates every logical core with a busy loop for a fixed duration while a
//! sampler thread records per-core utilization, then ranks the cores by the
//! peak load observed on each.
//!
//! Workers and the sampler are plain OS threads. The sampler stops on its own
//! cancellation token; workers are torn down through per-worker kill switches
//! that they check only between fixed bursts of computation.
//!
//! # Basic Example
//!
//! ```rust,no_run
//! use stress_injector_core::CancellationToken;
//! use stress_injector_cpu::CpuStress;
//!
//! let engine = CpuStress::builder().seconds(10).build()?;
//! let report = engine.run(&CancellationToken::new())?;
//! println!("{report}");
//! # Ok::<(), stress_injector_core::StressError>(())
//! ```
//!
//! # Deterministic Sampling
//!
//! The operating system source can be replaced, which is how the ranking is
//! tested without depending on real host load:
//!
//! ```rust
//! use std::time::Duration;
//! use stress_injector_core::CancellationToken;
//! use stress_injector_cpu::CpuStress;
//!
//! let engine = CpuStress::builder()
//!     .duration(Duration::from_millis(50))
//!     .cores(2)
//!     .warmup(Duration::ZERO)
//!     .settle(Duration::ZERO)
//!     .sample_interval(Duration::from_millis(5))
//!     .utilization_source(|| || vec![40.0, 95.5])
//!     .build()?;
//!
//! let report = engine.run(&CancellationToken::new())?;
//! assert_eq!(report.utilization.ranking()[0].core, 1);
//! # Ok::<(), stress_injector_core::StressError>(())
//! ```

pub mod config;
pub mod events;
pub mod report;
pub mod sampler;
pub mod worker;

pub use config::{CpuStressConfig, CpuStressConfigBuilder, SourceFactory};
pub use events::CpuEvent;
pub use report::{rank_cores, transpose, CorePeak, CpuReport, UtilizationReport};
pub use sampler::{
    live_line, logical_cores, SampleLog, Sampler, SysinfoSource, UtilizationSample,
    UtilizationSource,
};
pub use worker::{WorkerExit, WorkerHandle, WorkerState};

use sampler::SamplerSettings;
use std::sync::Arc;
use std::time::Instant;
use stress_injector_core::{CancellationToken, Lifecycle, Result, RunPhase, StressError};

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// CPU stress engine.
///
/// One instance runs at most one stress run at a time; a second concurrent
/// call to [`run`](Self::run) fails with [`StressError::AlreadyRunning`].
pub struct CpuStress {
    config: Arc<CpuStressConfig>,
    lifecycle: Lifecycle,
}

impl CpuStress {
    /// Creates a new configuration builder.
    pub fn builder() -> CpuStressConfigBuilder {
        CpuStressConfig::builder()
    }

    pub(crate) fn new(config: CpuStressConfig) -> Self {
        Self {
            config: Arc::new(config),
            lifecycle: Lifecycle::new(),
        }
    }

    /// Returns the validated configuration.
    pub fn config(&self) -> &CpuStressConfig {
        &self.config
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> RunPhase {
        self.lifecycle.phase()
    }

    /// Runs one stress cycle and blocks until it is reported.
    ///
    /// Cancelling `token` moves the run straight to teardown. A run cancelled
    /// before any worker started reports
    /// [`UtilizationReport::StoppedBeforeMeasurement`].
    pub fn run(&self, token: &CancellationToken) -> Result<CpuReport> {
        self.transition(RunPhase::Starting)?;
        let result = self.execute(token);
        let from = self.lifecycle.finish();
        self.emit_phase(from, RunPhase::Idle);
        result
    }

    fn execute(&self, token: &CancellationToken) -> Result<CpuReport> {
        let config = &self.config;
        let cores = config.cores.unwrap_or_else(logical_cores);

        #[cfg(feature = "tracing")]
        tracing::info!(
            engine = %config.name,
            cores,
            seconds = config.duration.as_secs_f64(),
            "Starting CPU stress"
        );

        let sampler = Sampler::spawn(
            (config.source)(),
            SamplerSettings {
                interval: config.sample_interval,
                capacity: config.sample_capacity,
                engine_name: config.name.clone(),
                listeners: config.event_listeners.clone(),
                progress: Arc::clone(&config.progress),
            },
        )?;

        if token.wait_timeout(config.warmup) {
            #[cfg(feature = "tracing")]
            tracing::warn!(engine = %config.name, "CPU stress cancelled during warm-up");

            self.transition(RunPhase::Stopping)?;
            let log = sampler.stop();
            self.transition(RunPhase::Reporting)?;
            return Ok(CpuReport {
                requested: config.duration,
                load_runtime: None,
                workers_started: 0,
                workers_detached: 0,
                samples: log.len(),
                cancelled: true,
                utilization: UtilizationReport::StoppedBeforeMeasurement,
            });
        }

        self.transition(RunPhase::Running)?;
        let workers = self.start_workers(cores);
        let started_at = Instant::now();
        let cancelled = token.wait_timeout(config.duration);
        let load_runtime = started_at.elapsed();

        self.transition(RunPhase::Stopping)?;
        let workers_started = workers.len();
        let workers_detached = self.stop_workers(workers);

        if !cancelled {
            token.wait_timeout(config.settle);
        }
        let log = sampler.stop();

        self.transition(RunPhase::Reporting)?;
        let utilization = if workers_started == 0 {
            UtilizationReport::StoppedBeforeMeasurement
        } else {
            rank_cores(&log.rows())
        };

        #[cfg(feature = "tracing")]
        tracing::info!(
            engine = %config.name,
            runtime = load_runtime.as_secs_f64(),
            samples = log.len(),
            workers_detached,
            cancelled,
            "CPU stress completed"
        );

        Ok(CpuReport {
            requested: config.duration,
            load_runtime: Some(load_runtime),
            workers_started,
            workers_detached,
            samples: log.len(),
            cancelled,
            utilization,
        })
    }

    fn start_workers(&self, cores: usize) -> Vec<WorkerHandle> {
        let mut workers = Vec::with_capacity(cores);
        for id in 0..cores {
            let mut worker = WorkerHandle::new(id);
            match worker.start() {
                Ok(()) => {
                    #[cfg(feature = "metrics")]
                    counter!("cpu_workers_started_total", "engine" => self.config.name.clone())
                        .increment(1);

                    self.config.event_listeners.emit(&CpuEvent::WorkerStarted {
                        engine_name: self.config.name.clone(),
                        timestamp: Instant::now(),
                        worker: id,
                    });
                    workers.push(worker);
                }
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!(engine = %self.config.name, worker = id, error = %_e, "Failed to start core worker");
                }
            }
        }
        workers
    }

    /// Flips every kill switch first, then joins each worker.
    fn stop_workers(&self, workers: Vec<WorkerHandle>) -> usize {
        for worker in &workers {
            worker.terminate();
        }

        let mut detached = 0;
        for worker in workers {
            let id = worker.id();
            let exit = worker.join(self.config.termination_grace);
            let was_detached = exit == WorkerExit::Detached;
            if was_detached {
                detached += 1;

                #[cfg(feature = "tracing")]
                tracing::warn!(engine = %self.config.name, worker = id, "Core worker detached after grace period");

                #[cfg(feature = "metrics")]
                counter!("cpu_workers_detached_total", "engine" => self.config.name.clone())
                    .increment(1);
            }
            self.config.event_listeners.emit(&CpuEvent::WorkerTerminated {
                engine_name: self.config.name.clone(),
                timestamp: Instant::now(),
                worker: id,
                detached: was_detached,
            });
        }
        detached
    }

    fn transition(&self, to: RunPhase) -> std::result::Result<(), StressError> {
        let from = self.lifecycle.advance(to)?;
        self.emit_phase(from, to);
        Ok(())
    }

    fn emit_phase(&self, from: RunPhase, to: RunPhase) {
        #[cfg(feature = "metrics")]
        gauge!("cpu_run_phase", "engine" => self.config.name.clone()).set(to as u8 as f64);

        self.config
            .event_listeners
            .emit_phase(&self.config.name, from, to);
    }
}

//! Memory stress engine.
//!
//! Allocates the requested volume as 1 MiB blocks of random bytes, keeps every
//! block alive until the run ends, then asks the host for the peak resident
//! memory of the process.
//!
//! Allocation is sequential. Cancellation is observed between blocks, never
//! mid-block, and the peak probe is queried whether or not the run finished.
//!
//! # Example
//!
//! ```rust
//! use stress_injector_core::CancellationToken;
//! use stress_injector_memory::MemoryStress;
//!
//! let engine = MemoryStress::builder().megabytes(4).build()?;
//! let report = engine.run(&CancellationToken::new())?;
//! assert_eq!(report.blocks_allocated, 4);
//! assert_eq!(report.allocated_bytes(), 4 * 1024 * 1024);
//! # Ok::<(), stress_injector_core::StressError>(())
//! ```

pub mod allocator;
pub mod config;
pub mod events;
pub mod probe;
pub mod report;

pub use allocator::{AllocationBlock, ByteAllocator, BLOCK_SIZE};
pub use config::{MemoryStressConfig, MemoryStressConfigBuilder, BLOCKS_PER_GIGABYTE};
pub use events::MemoryEvent;
pub use probe::{
    probe_for, PeakMemoryProbe, RusageProbe, SharedProbe, UnavailableProbe, WorkingSetProbe,
    LINUX_SCALE, MACOS_SCALE,
};
pub use report::MemoryReport;

use std::time::Instant;
use stress_injector_core::size::GIB;
use stress_injector_core::{CancellationToken, Lifecycle, Result, RunPhase};
use sysinfo::System;

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Volume suggested to users: twice the physical memory, in whole gigabytes.
pub fn suggested_gigabytes() -> u64 {
    let mut system = System::new();
    system.refresh_memory();
    (system.total_memory() as f64 / GIB as f64 * 2.0).round() as u64
}

/// Memory stress engine.
pub struct MemoryStress {
    config: MemoryStressConfig,
    lifecycle: Lifecycle,
}

impl MemoryStress {
    /// Creates a new configuration builder.
    pub fn builder() -> MemoryStressConfigBuilder {
        MemoryStressConfig::builder()
    }

    pub(crate) fn new(config: MemoryStressConfig) -> Self {
        Self {
            config,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Returns the validated configuration.
    pub fn config(&self) -> &MemoryStressConfig {
        &self.config
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> RunPhase {
        self.lifecycle.phase()
    }

    /// Allocates the configured volume and reports the peak memory.
    ///
    /// The blocks are released when this returns.
    pub fn run(&self, token: &CancellationToken) -> Result<MemoryReport> {
        self.transition(RunPhase::Starting)?;
        let result = self.execute(token);
        let from = self.lifecycle.finish();
        self.emit_phase(from, RunPhase::Idle);
        result
    }

    fn execute(&self, token: &CancellationToken) -> Result<MemoryReport> {
        let config = &self.config;
        let requested = config.blocks;

        #[cfg(feature = "tracing")]
        tracing::info!(
            engine = %config.name,
            blocks = requested,
            probe = config.probe.name(),
            "Starting memory stress"
        );

        self.transition(RunPhase::Running)?;
        let mut allocator = ByteAllocator::new();
        let mut last_percent = None;
        while allocator.len() < requested {
            if token.is_cancelled() {
                break;
            }
            allocator.allocate();

            #[cfg(feature = "metrics")]
            counter!("memory_blocks_allocated_total", "engine" => config.name.clone())
                .increment(1);

            config.event_listeners.emit(&MemoryEvent::BlockAllocated {
                engine_name: config.name.clone(),
                timestamp: Instant::now(),
                allocated: allocator.len(),
                requested,
            });

            let percent = allocator.len() * 100 / requested;
            if last_percent != Some(percent) {
                last_percent = Some(percent);
                config
                    .progress
                    .update(&format!("Generating random bytes: {percent}%"));
            }
        }
        config.progress.finish();

        let cancelled = allocator.len() < requested;
        self.transition(RunPhase::Stopping)?;

        let peak_resident_bytes = config.probe.peak_resident_bytes();

        #[cfg(feature = "metrics")]
        {
            if let Some(bytes) = peak_resident_bytes {
                gauge!("memory_peak_resident_bytes", "engine" => config.name.clone())
                    .set(bytes as f64);
            }
        }

        config.event_listeners.emit(&MemoryEvent::PeakMeasured {
            engine_name: config.name.clone(),
            timestamp: Instant::now(),
            probe: config.probe.name(),
            peak_bytes: peak_resident_bytes,
        });

        self.transition(RunPhase::Reporting)?;
        let report = MemoryReport {
            requested_blocks: requested,
            blocks_allocated: allocator.len(),
            peak_resident_bytes,
            cancelled,
        };

        #[cfg(feature = "tracing")]
        tracing::info!(
            engine = %config.name,
            blocks = report.blocks_allocated,
            peak = ?report.peak_resident_bytes,
            cancelled,
            "Memory stress completed"
        );

        drop(allocator);
        Ok(report)
    }

    fn transition(&self, to: RunPhase) -> Result<()> {
        let from = self.lifecycle.advance(to)?;
        self.emit_phase(from, to);
        Ok(())
    }

    fn emit_phase(&self, from: RunPhase, to: RunPhase) {
        self.config
            .event_listeners
            .emit_phase(&self.config.name, from, to);
    }
}

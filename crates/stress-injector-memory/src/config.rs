//! Configuration for the memory stress engine.

use crate::events::MemoryEvent;
use crate::probe::{probe_for, PeakMemoryProbe, SharedProbe};
use crate::MemoryStress;
use std::sync::Arc;
use stress_injector_core::events::EventListeners;
use stress_injector_core::{progress, HostFamily, RunPhase, SharedProgress, StressError};

#[cfg(feature = "metrics")]
use metrics::{describe_counter, describe_gauge};
#[cfg(feature = "metrics")]
use std::sync::Once;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// Blocks per gigabyte.
pub const BLOCKS_PER_GIGABYTE: usize = 1024;

/// Configuration for the memory stress engine.
#[derive(Clone)]
pub struct MemoryStressConfig {
    pub(crate) blocks: usize,
    pub(crate) name: String,
    pub(crate) probe: SharedProbe,
    pub(crate) progress: SharedProgress,
    pub(crate) event_listeners: EventListeners<MemoryEvent>,
}

impl MemoryStressConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> MemoryStressConfigBuilder {
        #[cfg(feature = "metrics")]
        {
            METRICS_INIT.call_once(|| {
                describe_counter!(
                    "memory_blocks_allocated_total",
                    "Total number of 1 MiB blocks allocated"
                );
                describe_gauge!(
                    "memory_peak_resident_bytes",
                    "Peak resident memory reported after allocation"
                );
            });
        }
        MemoryStressConfigBuilder::new()
    }

    /// Number of blocks the run allocates.
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    /// Name of the selected probe.
    pub fn probe_name(&self) -> &'static str {
        self.probe.name()
    }
}

enum Volume {
    Unset,
    Gigabytes(usize),
    Megabytes(usize),
}

/// Builder for [`MemoryStressConfig`].
pub struct MemoryStressConfigBuilder {
    volume: Volume,
    name: String,
    probe: Option<SharedProbe>,
    family: HostFamily,
    progress: SharedProgress,
    event_listeners: EventListeners<MemoryEvent>,
}

impl MemoryStressConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            volume: Volume::Unset,
            name: "memory".to_string(),
            probe: None,
            family: HostFamily::current(),
            progress: progress::noop(),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the volume in gigabytes. Must be positive.
    pub fn gigabytes(mut self, gigabytes: usize) -> Self {
        self.volume = Volume::Gigabytes(gigabytes);
        self
    }

    /// Sets the volume in megabytes (one block each). Must be positive.
    pub fn megabytes(mut self, megabytes: usize) -> Self {
        self.volume = Volume::Megabytes(megabytes);
        self
    }

    /// Sets the name of this engine instance.
    ///
    /// Default: "memory"
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Selects the probe for a host family.
    ///
    /// Default: the family of the current host
    pub fn platform(mut self, family: HostFamily) -> Self {
        self.family = family;
        self
    }

    /// Replaces the probe selected from the host family.
    pub fn probe<P>(mut self, probe: P) -> Self
    where
        P: PeakMemoryProbe + 'static,
    {
        let probe: SharedProbe = Arc::new(probe);
        self.probe = Some(probe);
        self
    }

    /// Sets where allocation progress is written.
    ///
    /// Default: discarded
    pub fn progress(mut self, progress: SharedProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Registers a callback for every allocated block with `(allocated, requested)`.
    pub fn on_block_allocated<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(move |event: &MemoryEvent| {
            if let MemoryEvent::BlockAllocated {
                allocated,
                requested,
                ..
            } = event
            {
                f(*allocated, *requested);
            }
        });
        self
    }

    /// Registers a callback for the peak memory query.
    pub fn on_peak_measured<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<u64>) + Send + Sync + 'static,
    {
        self.event_listeners.add(move |event: &MemoryEvent| {
            if let MemoryEvent::PeakMeasured { peak_bytes, .. } = event {
                f(*peak_bytes);
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
    pub fn build(self) -> Result<MemoryStress, StressError> {
        let blocks = match self.volume {
            Volume::Gigabytes(gb) if gb > 0 => gb.checked_mul(BLOCKS_PER_GIGABYTE).ok_or_else(|| {
                StressError::invalid_input("gigabytes", "volume overflows the address space")
            })?,
            Volume::Megabytes(mb) if mb > 0 => mb,
            Volume::Gigabytes(_) | Volume::Unset => {
                return Err(StressError::invalid_input(
                    "gigabytes",
                    "volume must be positive",
                ))
            }
            Volume::Megabytes(_) => {
                return Err(StressError::invalid_input(
                    "megabytes",
                    "volume must be positive",
                ))
            }
        };

        let probe = self.probe.unwrap_or_else(|| probe_for(self.family));

        Ok(MemoryStress::new(MemoryStressConfig {
            blocks,
            name: self.name,
            probe,
            progress: self.progress,
            event_listeners: self.event_listeners,
        }))
    }
}

impl Default for MemoryStressConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

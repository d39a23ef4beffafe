//! Events emitted by the memory stress engine.

use std::time::Instant;
use stress_injector_core::events::{EngineKind, StressEvent};
use stress_injector_core::RunPhase;

/// Events emitted by the memory stress engine.
#[derive(Debug, Clone)]
pub enum MemoryEvent {
    /// The run moved between lifecycle phases.
    PhaseTransition {
        engine_name: String,
        timestamp: Instant,
        from: RunPhase,
        to: RunPhase,
    },
    /// One block was allocated and retained.
    BlockAllocated {
        engine_name: String,
        timestamp: Instant,
        allocated: usize,
        requested: usize,
    },
    /// The peak memory probe was queried.
    PeakMeasured {
        engine_name: String,
        timestamp: Instant,
        probe: &'static str,
        peak_bytes: Option<u64>,
    },
}

impl StressEvent for MemoryEvent {
    const KIND: EngineKind = EngineKind::Memory;

    fn phase_transition(
        engine_name: String,
        timestamp: Instant,
        from: RunPhase,
        to: RunPhase,
    ) -> Self {
        MemoryEvent::PhaseTransition {
            engine_name,
            timestamp,
            from,
            to,
        }
    }

    fn phase_change(&self) -> Option<(RunPhase, RunPhase)> {
        match self {
            MemoryEvent::PhaseTransition { from, to, .. } => Some((*from, *to)),
            _ => None,
        }
    }

    fn event_type(&self) -> &'static str {
        match self {
            MemoryEvent::PhaseTransition { .. } => "PhaseTransition",
            MemoryEvent::BlockAllocated { .. } => "BlockAllocated",
            MemoryEvent::PeakMeasured { .. } => "PeakMeasured",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            MemoryEvent::PhaseTransition { timestamp, .. }
            | MemoryEvent::BlockAllocated { timestamp, .. }
            | MemoryEvent::PeakMeasured { timestamp, .. } => *timestamp,
        }
    }

    fn engine_name(&self) -> &str {
        match self {
            MemoryEvent::PhaseTransition { engine_name, .. }
            | MemoryEvent::BlockAllocated { engine_name, .. }
            | MemoryEvent::PeakMeasured { engine_name, .. } => engine_name,
        }
    }
}

//! Events emitted by the CPU stress engine.

use std::time::Instant;
use stress_injector_core::events::{EngineKind, StressEvent};
use stress_injector_core::RunPhase;

/// Events emitted by the CPU stress engine.
#[derive(Debug, Clone)]
pub enum CpuEvent {
    /// The run moved between lifecycle phases.
    PhaseTransition {
        engine_name: String,
        timestamp: Instant,
        from: RunPhase,
        to: RunPhase,
    },
    /// A core worker began its busy loop.
    WorkerStarted {
        engine_name: String,
        timestamp: Instant,
        worker: usize,
    },
    /// A core worker was torn down.
    WorkerTerminated {
        engine_name: String,
        timestamp: Instant,
        worker: usize,
        /// The worker missed the termination grace and was detached.
        detached: bool,
    },
    /// The sampler recorded one utilization reading per core.
    Sampled {
        engine_name: String,
        timestamp: Instant,
        percents: Vec<f32>,
    },
}

impl StressEvent for CpuEvent {
    const KIND: EngineKind = EngineKind::Cpu;

    fn phase_transition(
        engine_name: String,
        timestamp: Instant,
        from: RunPhase,
        to: RunPhase,
    ) -> Self {
        CpuEvent::PhaseTransition {
            engine_name,
            timestamp,
            from,
            to,
        }
    }

    fn phase_change(&self) -> Option<(RunPhase, RunPhase)> {
        match self {
            CpuEvent::PhaseTransition { from, to, .. } => Some((*from, *to)),
            _ => None,
        }
    }

    fn event_type(&self) -> &'static str {
        match self {
            CpuEvent::PhaseTransition { .. } => "PhaseTransition",
            CpuEvent::WorkerStarted { .. } => "WorkerStarted",
            CpuEvent::WorkerTerminated { .. } => "WorkerTerminated",
            CpuEvent::Sampled { .. } => "Sampled",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CpuEvent::PhaseTransition { timestamp, .. }
            | CpuEvent::WorkerStarted { timestamp, .. }
            | CpuEvent::WorkerTerminated { timestamp, .. }
            | CpuEvent::Sampled { timestamp, .. } => *timestamp,
        }
    }

    fn engine_name(&self) -> &str {
        match self {
            CpuEvent::PhaseTransition { engine_name, .. }
            | CpuEvent::WorkerStarted { engine_name, .. }
            | CpuEvent::WorkerTerminated { engine_name, .. }
            | CpuEvent::Sampled { engine_name, .. } => engine_name,
        }
    }
}

//! Events emitted by the URL load injector.

use crate::error::RequestError;
use std::time::{Duration, Instant};
use stress_injector_core::events::{EngineKind, StressEvent};
use stress_injector_core::RunPhase;

/// Events emitted by the URL load injector.
#[derive(Debug, Clone)]
pub enum UrlEvent {
    /// The run moved between lifecycle phases.
    PhaseTransition {
        engine_name: String,
        timestamp: Instant,
        from: RunPhase,
        to: RunPhase,
    },
    /// The preflight call finished.
    Preflight {
        engine_name: String,
        timestamp: Instant,
        /// `None` on success.
        failure: Option<RequestError>,
    },
    /// A bulk call finished.
    CallCompleted {
        engine_name: String,
        timestamp: Instant,
        index: usize,
        success: bool,
    },
    /// Admission was refused and the injector is backing off.
    AdmissionRetry {
        engine_name: String,
        timestamp: Instant,
        retries: usize,
        delay: Duration,
    },
    /// The retry limit was exceeded and scheduling stopped.
    AdmissionExhausted {
        engine_name: String,
        timestamp: Instant,
        retries: usize,
        abandoned: usize,
    },
}

impl StressEvent for UrlEvent {
    const KIND: EngineKind = EngineKind::Url;

    fn phase_transition(
        engine_name: String,
        timestamp: Instant,
        from: RunPhase,
        to: RunPhase,
    ) -> Self {
        UrlEvent::PhaseTransition {
            engine_name,
            timestamp,
            from,
            to,
        }
    }

    fn phase_change(&self) -> Option<(RunPhase, RunPhase)> {
        match self {
            UrlEvent::PhaseTransition { from, to, .. } => Some((*from, *to)),
            _ => None,
        }
    }

    fn event_type(&self) -> &'static str {
        match self {
            UrlEvent::PhaseTransition { .. } => "PhaseTransition",
            UrlEvent::Preflight { .. } => "Preflight",
            UrlEvent::CallCompleted { .. } => "CallCompleted",
            UrlEvent::AdmissionRetry { .. } => "AdmissionRetry",
            UrlEvent::AdmissionExhausted { .. } => "AdmissionExhausted",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            UrlEvent::PhaseTransition { timestamp, .. }
            | UrlEvent::Preflight { timestamp, .. }
            | UrlEvent::CallCompleted { timestamp, .. }
            | UrlEvent::AdmissionRetry { timestamp, .. }
            | UrlEvent::AdmissionExhausted { timestamp, .. } => *timestamp,
        }
    }

    fn engine_name(&self) -> &str {
        match self {
            UrlEvent::PhaseTransition { engine_name, .. }
            | UrlEvent::Preflight { engine_name, .. }
            | UrlEvent::CallCompleted { engine_name, .. }
            | UrlEvent::AdmissionRetry { engine_name, .. }
            | UrlEvent::AdmissionExhausted { engine_name, .. } => engine_name,
        }
    }
}

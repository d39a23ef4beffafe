//! Engine events and the listeners that observe them.
//!
//! Every engine defines one event enum. The enums differ in what they carry
//! (worker ids, block counts, call outcomes) but share two things that live
//! here: the engine kind, and a lifecycle transition variant. Builders
//! register plain closures; [`EventListeners::on_phase`] wires a transition
//! callback once for all three engines.

use crate::lifecycle::RunPhase;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// Which engine emitted an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EngineKind {
    Cpu,
    Memory,
    Url,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Cpu => "cpu",
            EngineKind::Memory => "memory",
            EngineKind::Url => "url",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event emitted by one engine.
pub trait StressEvent: Send + Sync + fmt::Debug + Sized {
    /// Engine this event type belongs to.
    const KIND: EngineKind;

    /// Builds the lifecycle transition variant.
    fn phase_transition(engine_name: String, timestamp: Instant, from: RunPhase, to: RunPhase)
        -> Self;

    /// `(from, to)` when this event is a lifecycle transition.
    fn phase_change(&self) -> Option<(RunPhase, RunPhase)>;

    /// Variant name, e.g. `"AdmissionRetry"`.
    fn event_type(&self) -> &'static str;

    fn timestamp(&self) -> Instant;

    /// Name of the engine instance, as set on its builder.
    fn engine_name(&self) -> &str;
}

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Callbacks registered on an engine builder.
///
/// Cloning shares the callbacks, so the sampler thread and spawned call
/// tasks can emit into the same set.
pub struct EventListeners<E: StressEvent> {
    listeners: Vec<Listener<E>>,
}

impl<E: StressEvent> EventListeners<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Registers a callback for every event.
    pub fn add<F>(&mut self, f: F)
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.listeners.push(Arc::new(f));
    }

    /// Registers a callback for lifecycle transitions only.
    pub fn on_phase<F>(&mut self, f: F)
    where
        F: Fn(RunPhase, RunPhase) + Send + Sync + 'static,
    {
        self.add(move |event: &E| {
            if let Some((from, to)) = event.phase_change() {
                f(from, to);
            }
        });
    }

    /// Delivers `event` to every callback and returns how many panicked.
    ///
    /// A panicking callback is skipped; the rest still run and the engine
    /// keeps going.
    pub fn emit(&self, event: &E) -> usize {
        let mut panicked = 0;
        for listener in &self.listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                panicked += 1;

                #[cfg(feature = "tracing")]
                tracing::warn!(
                    kind = %E::KIND,
                    engine = event.engine_name(),
                    event = event.event_type(),
                    "Event listener panicked"
                );
            }
        }
        panicked
    }

    /// Logs and emits a lifecycle transition of engine `engine_name`.
    pub fn emit_phase(&self, engine_name: &str, from: RunPhase, to: RunPhase) {
        #[cfg(feature = "tracing")]
        tracing::debug!(kind = %E::KIND, engine = engine_name, %from, %to, "Phase transition");

        self.emit(&E::phase_transition(
            engine_name.to_string(),
            Instant::now(),
            from,
            to,
        ));
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: StressEvent> Clone for EventListeners<E> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
        }
    }
}

impl<E: StressEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: StressEvent> fmt::Debug for EventListeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("kind", &E::KIND)
            .field("len", &self.listeners.len())
            .finish()
    }
}

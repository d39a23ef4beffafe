//! Core infrastructure for stress-injector.
//!
//! This crate provides the shared functionality used by every stress engine:
//! - Event system for observability
//! - Cancellation token shared between a controller and its workers
//! - Run lifecycle state machine
//! - Host platform detection
//! - Progress sinks for incremental output
//! - Human readable byte formatting
//! - The common error taxonomy

pub mod cancel;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod platform;
pub mod progress;
pub mod size;

pub use cancel::CancellationToken;
pub use error::{Result, StressError};
pub use events::{EngineKind, EventListeners, StressEvent};
pub use lifecycle::{Lifecycle, RunPhase};
pub use platform::{HostFamily, PlatformProbe};
pub use progress::{ConsoleProgress, NoopProgress, ProgressSink, SharedProgress};
pub use size::{SizeError, format_size};

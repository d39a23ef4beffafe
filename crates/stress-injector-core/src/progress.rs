//! Progress sinks for incremental run output.
//!
//! Engines push short status lines ("Core 1: 97%\tCore 2: 100%",
//! "Generating random bytes: 40%") into a [`ProgressSink`] and never care
//! how, or whether, they are displayed.
//!
//! # Examples
//!
//! Any `Fn(&str)` closure is a sink:
//!
//! ```
//! use stress_injector_core::ProgressSink;
//! use std::sync::{Arc, Mutex};
//!
//! let lines = Arc::new(Mutex::new(Vec::new()));
//! let captured = Arc::clone(&lines);
//! let sink = move |text: &str| captured.lock().unwrap().push(text.to_string());
//!
//! sink.update("Core 1: 100%");
//! assert_eq!(lines.lock().unwrap().len(), 1);
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Receives incremental progress text.
pub trait ProgressSink: Send + Sync {
    /// Replaces the currently displayed progress text.
    fn update(&self, text: &str);

    /// Called once when the engine stops producing progress.
    fn finish(&self) {}
}

/// Shared, type-erased progress sink.
pub type SharedProgress = Arc<dyn ProgressSink>;

impl<F> ProgressSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn update(&self, text: &str) {
        self(text)
    }
}

/// Discards all progress. Used for non-interactive runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn update(&self, _text: &str) {}
}

/// Rewrites a single line on standard error with carriage returns.
#[derive(Debug, Default)]
pub struct ConsoleProgress {
    last_len: AtomicUsize,
}

impl ConsoleProgress {
    /// Creates a console sink.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for ConsoleProgress {
    fn update(&self, text: &str) {
        let previous = self.last_len.swap(text.len(), Ordering::Relaxed);
        let padding = previous.saturating_sub(text.len());
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r{text}{:padding$}", "");
        let _ = stderr.flush();
    }

    fn finish(&self) {
        let previous = self.last_len.swap(0, Ordering::Relaxed);
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r{:previous$}\r", "");
        let _ = stderr.flush();
    }
}

/// Returns a sink that discards everything.
pub fn noop() -> SharedProgress {
    Arc::new(NoopProgress)
}

//! Cancellation token shared between a controller and its execution units.
//!
//! The token is a one-way latch: once cancelled it stays cancelled. It can be
//! observed three ways:
//! - [`CancellationToken::is_cancelled`] for a lock-free poll,
//! - [`CancellationToken::wait_timeout`] to block an OS thread until either
//!   the timeout elapses or the token is cancelled,
//! - [`CancellationToken::cancelled`] to await cancellation from async code.
//!
//! # Examples
//!
//! ```
//! use stress_injector_core::CancellationToken;
//! use std::time::Duration;
//!
//! let token = CancellationToken::new();
//! let observer = token.clone();
//!
//! assert!(!observer.wait_timeout(Duration::from_millis(1)));
//! token.cancel();
//! assert!(observer.is_cancelled());
//! assert!(observer.wait_timeout(Duration::from_secs(60)));
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;

struct Inner {
    cancelled: AtomicBool,
    lock: Mutex<()>,
    condvar: Condvar,
    notify: Notify,
}

/// A cloneable, thread-safe cancellation signal.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                lock: Mutex::new(()),
                condvar: Condvar::new(),
                notify: Notify::new(),
            }),
        }
    }

    /// Cancels the token, waking every blocked and awaiting observer.
    ///
    /// Cancelling an already-cancelled token is a no-op.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        // Taking the lock orders the store before any waiter's predicate check.
        drop(self.inner.lock.lock().unwrap_or_else(PoisonError::into_inner));
        self.inner.condvar.notify_all();
        self.inner.notify.notify_waiters();
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Blocks the current thread for up to `timeout`.
    ///
    /// Returns `true` if the token was cancelled (before or during the wait),
    /// `false` if the timeout elapsed first.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }
        let guard = self
            .inner
            .lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let _ = self
            .inner
            .condvar
            .wait_timeout_while(guard, timeout, |_| !self.is_cancelled())
            .unwrap_or_else(PoisonError::into_inner);
        self.is_cancelled()
    }

    /// Completes once the token is cancelled.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

//! Core workers: one busy-looping OS thread per logical core.
//!
//! A worker never looks at the run's cancellation token. It computes in
//! fixed bursts and only checks its own kill switch between bursts, which is
//! how the controller terminates it.

use std::hint::black_box;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use stress_injector_core::StressError;

/// Iterations per burst; roughly a millisecond of work on current hardware.
const BURST_ITERATIONS: u64 = 200_000;

/// Lifecycle of one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    /// Handle exists, thread not spawned.
    Created = 0,
    /// Busy loop is executing.
    Running = 1,
    /// Kill switch set, waiting for the thread to exit.
    Cancelling = 2,
    /// Thread exited or was detached.
    Terminated = 3,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => WorkerState::Running,
            2 => WorkerState::Cancelling,
            3 => WorkerState::Terminated,
            _ => WorkerState::Created,
        }
    }
}

/// How a worker left the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// The thread exited within the grace period and was joined.
    Joined {
        /// Bursts completed before exit.
        bursts: u64,
    },
    /// The thread missed the grace period and was detached.
    Detached,
    /// The thread was never started.
    NeverStarted,
}

/// Identity and lifecycle of one core worker.
#[derive(Debug)]
pub struct WorkerHandle {
    id: usize,
    state: Arc<AtomicU8>,
    kill: Arc<AtomicBool>,
    thread: Option<JoinHandle<u64>>,
}

impl WorkerHandle {
    /// Creates a handle in [`WorkerState::Created`].
    pub fn new(id: usize) -> Self {
        Self {
            id,
            state: Arc::new(AtomicU8::new(WorkerState::Created as u8)),
            kill: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    /// Zero-based worker id.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Spawns the busy-loop thread.
    pub fn start(&mut self) -> Result<(), StressError> {
        if self.thread.is_some() {
            return Ok(());
        }
        let kill = Arc::clone(&self.kill);
        let state = Arc::clone(&self.state);
        state.store(WorkerState::Running as u8, Ordering::Release);

        let spawned = thread::Builder::new()
            .name(format!("core-worker-{}", self.id))
            .spawn(move || {
                let bursts = busy_loop(&kill);
                state.store(WorkerState::Terminated as u8, Ordering::Release);
                bursts
            });

        match spawned {
            Ok(handle) => {
                self.thread = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.state
                    .store(WorkerState::Terminated as u8, Ordering::Release);
                Err(StressError::spawn("core worker", e))
            }
        }
    }

    /// Sets the kill switch. The thread exits at the end of its current burst.
    pub fn terminate(&self) {
        self.kill.store(true, Ordering::Release);
        if self.thread.is_some() && self.state() == WorkerState::Running {
            let _ = self.state.compare_exchange(
                WorkerState::Running as u8,
                WorkerState::Cancelling as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
        }
    }

    /// Waits up to `grace` for the thread to exit, then joins or detaches it.
    pub fn join(mut self, grace: Duration) -> WorkerExit {
        self.terminate();
        let Some(handle) = self.thread.take() else {
            self.state
                .store(WorkerState::Terminated as u8, Ordering::Release);
            return WorkerExit::NeverStarted;
        };

        let deadline = Instant::now() + grace;
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }

        if handle.is_finished() {
            let bursts = handle.join().unwrap_or(0);
            WorkerExit::Joined { bursts }
        } else {
            // Dropping the handle detaches the thread; its kill switch is set,
            // so it exits after the burst it is in.
            self.state
                .store(WorkerState::Terminated as u8, Ordering::Release);
            WorkerExit::Detached
        }
    }
}

fn busy_loop(kill: &AtomicBool) -> u64 {
    let mut bursts = 0u64;
    let mut acc = 0x9E37_79B9_7F4A_7C15u64;
    while !kill.load(Ordering::Acquire) {
        acc = burn(acc);
        bursts += 1;
    }
    black_box(acc);
    bursts
}

fn burn(seed: u64) -> u64 {
    let mut acc = seed;
    for i in 0..BURST_ITERATIONS {
        acc = acc.wrapping_add(i.wrapping_mul(i)).wrapping_mul(31).rotate_left(7);
    }
    black_box(acc)
}

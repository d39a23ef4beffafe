//! Bulk scheduling of calls onto a bounded pool.

use crate::admission::{Admission, PoolAdmission};
use crate::circuit::{CircuitDecision, CircuitState};
use crate::error::RequestError;
use crate::events::UrlEvent;
use crate::executor::{CallKind, RequestOutcome};
use crate::report::{Injection, LoadResult, Termination};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use stress_injector_core::events::EventListeners;
use stress_injector_core::{progress, CancellationToken, SharedProgress};
use tokio::task::JoinSet;
use tower::{Service, ServiceExt};

#[cfg(feature = "metrics")]
use metrics::{counter, histogram};

/// Per-run outcome counters, shared by every in-flight call.
#[derive(Debug, Default)]
pub struct LoadCounters {
    success: AtomicUsize,
    error: AtomicUsize,
}

impl LoadCounters {
    /// Folds one outcome into the counters.
    pub fn record(&self, outcome: &RequestOutcome) {
        match outcome {
            RequestOutcome::Success => self.success.fetch_add(1, Ordering::AcqRel),
            RequestOutcome::Failure(_) => self.error.fetch_add(1, Ordering::AcqRel),
        };
    }

    /// Successful calls so far.
    pub fn success(&self) -> usize {
        self.success.load(Ordering::Acquire)
    }

    /// Failed calls so far.
    pub fn error(&self) -> usize {
        self.error.load(Ordering::Acquire)
    }

    /// Calls that have finished.
    pub fn completed(&self) -> usize {
        self.success() + self.error()
    }
}

/// Schedules `rate` calls of `S` under admission control `A`.
///
/// Each [`run`](Self::run) starts with fresh counters and a fresh
/// [`CircuitState`], so one injector can be reused for consecutive runs.
pub struct LoadInjector<S, A = PoolAdmission> {
    service: S,
    admission: A,
    retry_limit: usize,
    backoff: Duration,
    name: String,
    listeners: EventListeners<UrlEvent>,
    progress: SharedProgress,
}

impl<S, A> LoadInjector<S, A>
where
    S: Service<CallKind, Error = RequestError> + Clone + Send + 'static,
    S::Response: Send + 'static,
    S::Future: Send + 'static,
    A: Admission,
{
    /// Creates an injector.
    pub fn new(service: S, admission: A, retry_limit: usize, backoff: Duration) -> Self {
        Self {
            service,
            admission,
            retry_limit,
            backoff,
            name: "url".to_string(),
            listeners: EventListeners::new(),
            progress: progress::noop(),
        }
    }

    /// Sets the name used in events and logs.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the listeners that receive call and admission events.
    pub fn with_listeners(mut self, listeners: EventListeners<UrlEvent>) -> Self {
        self.listeners = listeners;
        self
    }

    /// Sets where completion progress is written.
    pub fn with_progress(mut self, progress: SharedProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Dispatches up to `rate` calls and waits for every dispatched call.
    ///
    /// Cancellation stops further scheduling; calls already in flight run to
    /// completion and are counted.
    pub async fn run(&self, rate: usize, token: &CancellationToken) -> Injection {
        let started = Instant::now();
        let counters = Arc::new(LoadCounters::default());
        let mut circuit = CircuitState::new(self.retry_limit, self.backoff);

        let mut tasks = JoinSet::new();
        let mut scheduled = 0;
        let mut termination = Termination::Completed;

        while scheduled < rate {
            if token.is_cancelled() {
                termination = Termination::Cancelled;
                break;
            }

            let permit = match self.admission.try_admit() {
                Ok(permit) => permit,
                Err(_err) => match circuit.record_failure() {
                    CircuitDecision::Backoff(delay) => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(
                            engine = %self.name,
                            error = %_err,
                            retries = circuit.retries(),
                            delay_ms = delay.as_millis() as u64,
                            "Admission refused, backing off"
                        );

                        #[cfg(feature = "metrics")]
                        counter!("url_admission_retries_total", "engine" => self.name.clone())
                            .increment(1);

                        self.listeners.emit(&UrlEvent::AdmissionRetry {
                            engine_name: self.name.clone(),
                            timestamp: Instant::now(),
                            retries: circuit.retries(),
                            delay,
                        });

                        let cancelled = tokio::select! {
                            _ = tokio::time::sleep(delay) => false,
                            _ = token.cancelled() => true,
                        };
                        if cancelled {
                            termination = Termination::Cancelled;
                            break;
                        }
                        continue;
                    }
                    CircuitDecision::Exhausted => {
                        #[cfg(feature = "tracing")]
                        {
                            let completed = counters.completed();
                            tracing::error!(engine = %self.name, error = %_err, "Admission retry limit exceeded");
                            tracing::warn!(engine = %self.name, "Cancelling future tasks");
                            tracing::warn!(engine = %self.name, "Calls made: {scheduled}");
                            tracing::warn!(engine = %self.name, "Calls completed: {completed}");
                            tracing::warn!(
                                engine = %self.name,
                                "Calls pending: {}",
                                scheduled.saturating_sub(completed)
                            );
                            tracing::warn!(engine = %self.name, "Awaiting pending tasks to complete");
                        }

                        self.listeners.emit(&UrlEvent::AdmissionExhausted {
                            engine_name: self.name.clone(),
                            timestamp: Instant::now(),
                            retries: circuit.retries(),
                            abandoned: rate - scheduled,
                        });
                        termination = Termination::AdmissionExhausted {
                            retries: circuit.retries(),
                        };
                        break;
                    }
                },
            };

            let index = scheduled;
            scheduled += 1;

            let service = self.service.clone();
            let counters = Arc::clone(&counters);
            let listeners = self.listeners.clone();
            let name = self.name.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let outcome = RequestOutcome::from(
                    service
                        .oneshot(CallKind::Bulk { index })
                        .await
                        .map(|_| ()),
                );
                counters.record(&outcome);

                #[cfg(feature = "tracing")]
                {
                    if let RequestOutcome::Failure(cause) = &outcome {
                        tracing::debug!(engine = %name, index, error = %cause, "Call failed");
                    }
                }

                listeners.emit(&UrlEvent::CallCompleted {
                    engine_name: name,
                    timestamp: Instant::now(),
                    index,
                    success: outcome.is_success(),
                });
            });
        }

        let step = (scheduled / 100).max(1);
        let mut joined = 0;
        while let Some(joined_task) = tasks.join_next().await {
            joined += 1;
            if let Err(_e) = joined_task {
                // The call panicked before it could record its outcome.
                counters.record(&RequestOutcome::Failure(RequestError::Transport(
                    "call task panicked".to_string(),
                )));

                #[cfg(feature = "tracing")]
                tracing::error!(engine = %self.name, error = %_e, "Call task failed");
            }
            if joined % step == 0 || joined == scheduled {
                self.progress
                    .update(&format!("Completed {joined}/{scheduled} calls"));
            }
        }
        self.progress.finish();

        let result = LoadResult {
            requested: rate,
            scheduled,
            success: counters.success(),
            error: counters.error(),
            abandoned: rate - scheduled,
        };

        #[cfg(feature = "metrics")]
        {
            counter!("url_calls_total", "engine" => self.name.clone(), "outcome" => "success")
                .increment(result.success as u64);
            counter!("url_calls_total", "engine" => self.name.clone(), "outcome" => "error")
                .increment(result.error as u64);
            counter!("url_calls_total", "engine" => self.name.clone(), "outcome" => "abandoned")
                .increment(result.abandoned as u64);
            histogram!("url_injection_duration_seconds", "engine" => self.name.clone())
                .record(started.elapsed().as_secs_f64());
        }

        Injection {
            result,
            termination,
            admission_retries: circuit.retries(),
            elapsed: started.elapsed(),
        }
    }
}

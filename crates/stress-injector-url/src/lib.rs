//! URL load injector.
//!
//! Validates a target URL and method, makes one mandatory preflight call, and
//! when it succeeds schedules `rate` concurrent calls onto a bounded pool.
//! Every requested call ends up counted exactly once as a success, an error,
//! or abandoned.
//!
//! Calls go through a `tower::Service<CallKind>`; [`HttpExecutor`] is the
//! `reqwest` implementation, and any other service can be injected with
//! [`UrlStressConfigBuilder::build_with_executor`].
//!
//! # Basic Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use stress_injector_core::CancellationToken;
//! use stress_injector_url::{HttpMethod, UrlStress};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = UrlStress::builder("https://example.com/health")
//!     .method(HttpMethod::Get)
//!     .rate(1_000)
//!     .timeout(Duration::from_secs(5))
//!     .build()?;
//!
//! let report = engine.run(&CancellationToken::new()).await?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```
//!
//! # Custom Executor
//!
//! ```rust
//! use stress_injector_core::CancellationToken;
//! use stress_injector_url::{CallKind, RequestError, UrlStress};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = tower::service_fn(|_call: CallKind| async { Ok::<u16, RequestError>(200) });
//! let engine = UrlStress::builder("http://localhost")
//!     .rate(25)
//!     .build_with_executor(service)?;
//!
//! let report = engine.run(&CancellationToken::new()).await?;
//! assert_eq!(report.result.success, 25);
//! # Ok(())
//! # }
//! ```

pub mod admission;
pub mod circuit;
pub mod config;
pub mod error;
pub mod events;
pub mod executor;
pub mod injector;
pub mod method;
pub mod report;

pub use admission::{Admission, AdmissionError, AdmissionPermit, PoolAdmission};
pub use circuit::{CircuitDecision, CircuitState};
pub use config::{UrlStressConfig, UrlStressConfigBuilder, ALLOWED_SCHEMES, DEFAULT_RATE};
pub use error::{RequestError, UrlError};
pub use events::UrlEvent;
pub use executor::{CallKind, HttpExecutor, RequestOutcome, RequestTarget};
pub use injector::{LoadCounters, LoadInjector};
pub use method::HttpMethod;
pub use report::{thousands, Injection, LoadResult, Termination, UrlReport};

use std::sync::Arc;
use std::time::{Duration, Instant};
use stress_injector_core::{CancellationToken, Lifecycle, Result, RunPhase};
use tower::{Service, ServiceExt};

#[cfg(feature = "metrics")]
use metrics::counter;

/// URL load injector.
pub struct UrlStress<S = HttpExecutor> {
    config: UrlStressConfig,
    service: S,
    lifecycle: Lifecycle,
}

impl UrlStress<HttpExecutor> {
    /// Creates a new configuration builder for `url`.
    pub fn builder(url: impl Into<String>) -> UrlStressConfigBuilder {
        UrlStressConfig::builder(url)
    }
}

impl<S> UrlStress<S>
where
    S: Service<CallKind, Error = RequestError> + Clone + Send + 'static,
    S::Response: Send + 'static,
    S::Future: Send + 'static,
{
    pub(crate) fn new(config: UrlStressConfig, service: S) -> Self {
        Self {
            config,
            service,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Returns the validated configuration.
    pub fn config(&self) -> &UrlStressConfig {
        &self.config
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> RunPhase {
        self.lifecycle.phase()
    }

    /// Runs the preflight and, if it passes, the bulk injection.
    ///
    /// Preflight failure, admission exhaustion and cancellation all produce a
    /// report. Errors are reserved for lifecycle misuse and for counts that
    /// fail to add up.
    pub async fn run(&self, token: &CancellationToken) -> Result<UrlReport> {
        self.transition(RunPhase::Starting)?;
        let result = self.execute(token).await;
        let from = self.lifecycle.finish();
        self.emit_phase(from, RunPhase::Idle);
        result
    }

    async fn execute(&self, token: &CancellationToken) -> Result<UrlReport> {
        let config = &self.config;
        let rate = config.rate;

        #[cfg(feature = "tracing")]
        tracing::info!(engine = %config.name, "Initiating sample call");

        let preflight = tokio::select! {
            outcome = self.service.clone().oneshot(CallKind::Preflight) => Some(outcome),
            _ = token.cancelled() => None,
        };

        let report = match preflight {
            None => {
                #[cfg(feature = "tracing")]
                tracing::warn!(engine = %config.name, "Cancelled during sample call");

                self.transition(RunPhase::Stopping)?;
                self.transition(RunPhase::Reporting)?;
                self.report(Injection {
                    result: LoadResult::all_abandoned(rate),
                    termination: Termination::Cancelled,
                    admission_retries: 0,
                    elapsed: Duration::ZERO,
                })
            }
            Some(Err(cause)) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    engine = %config.name,
                    error = %cause,
                    "Sample call failed, cannot proceed stress testing"
                );

                self.preflight_done(Some(cause.clone()));
                self.transition(RunPhase::Reporting)?;
                self.report(Injection {
                    result: LoadResult::all_abandoned(rate),
                    termination: Termination::PreflightFailed { cause },
                    admission_retries: 0,
                    elapsed: Duration::ZERO,
                })
            }
            Some(Ok(_)) => {
                #[cfg(feature = "tracing")]
                tracing::info!(engine = %config.name, "Sample call successful");

                self.preflight_done(None);
                self.transition(RunPhase::Running)?;

                #[cfg(feature = "tracing")]
                tracing::info!(
                    engine = %config.name,
                    "Running request injection on '{}' with rate {}",
                    config.target.netloc(),
                    thousands(rate)
                );

                let injector = LoadInjector::new(
                    self.service.clone(),
                    PoolAdmission::new(config.max_concurrency),
                    config.retry_limit,
                    config.backoff,
                )
                .with_name(config.name.clone())
                .with_listeners(config.event_listeners.clone())
                .with_progress(Arc::clone(&config.progress));
                let injection = injector.run(rate, token).await;

                self.transition(RunPhase::Stopping)?;
                self.transition(RunPhase::Reporting)?;
                self.report(injection)
            }
        };

        report.result.verify()?;

        #[cfg(feature = "tracing")]
        {
            tracing::info!(
                engine = %config.name,
                "Request injection completed in {:.2} seconds",
                report.elapsed.as_secs_f64()
            );
            tracing::info!(engine = %config.name, "Total number of requests passed: {}", report.result.success);
            tracing::warn!(engine = %config.name, "Total number of requests failed: {}", report.result.error);
            if report.result.abandoned > 0 {
                tracing::warn!(engine = %config.name, "Total number of requests abandoned: {}", report.result.abandoned);
            }
        }

        Ok(report)
    }

    fn report(&self, injection: Injection) -> UrlReport {
        UrlReport {
            target: self.config.target.netloc(),
            method: self.config.target.method,
            result: injection.result,
            termination: injection.termination,
            admission_retries: injection.admission_retries,
            elapsed: injection.elapsed,
        }
    }

    fn preflight_done(&self, failure: Option<RequestError>) {
        #[cfg(feature = "metrics")]
        {
            let outcome = if failure.is_none() { "success" } else { "error" };
            counter!("url_preflight_total", "engine" => self.config.name.clone(), "outcome" => outcome)
                .increment(1);
        }

        self.config.event_listeners.emit(&UrlEvent::Preflight {
            engine_name: self.config.name.clone(),
            timestamp: Instant::now(),
            failure,
        });
    }

    fn transition(&self, to: RunPhase) -> Result<()> {
        let from = self.lifecycle.advance(to)?;
        self.emit_phase(from, to);
        Ok(())
    }

    fn emit_phase(&self, from: RunPhase, to: RunPhase) {
        self.config
            .event_listeners
            .emit_phase(&self.config.name, from, to);
    }
}

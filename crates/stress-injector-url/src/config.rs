//! Configuration for the URL load injector.

use crate::error::{RequestError, UrlError};
use crate::events::UrlEvent;
use crate::executor::{CallKind, HttpExecutor, RequestTarget};
use crate::method::HttpMethod;
use crate::UrlStress;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use std::time::Duration;
use stress_injector_core::events::EventListeners;
use stress_injector_core::{progress, RunPhase, SharedProgress};
use tower::Service;

#[cfg(feature = "metrics")]
use metrics::{describe_counter, describe_histogram};
#[cfg(feature = "metrics")]
use std::sync::Once;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// URL schemes accepted by validation.
pub const ALLOWED_SCHEMES: [&str; 14] = [
    "http", "https", "ws", "ftp", "tcp", "udp", "ssh", "gopher", "mailto", "news", "telnet",
    "file", "nntp", "wais",
];

/// Default number of calls per run.
pub const DEFAULT_RATE: usize = 100_000;

/// Configuration for the URL load injector.
#[derive(Clone)]
pub struct UrlStressConfig {
    pub(crate) target: RequestTarget,
    pub(crate) rate: usize,
    pub(crate) max_concurrency: usize,
    pub(crate) retry_limit: usize,
    pub(crate) backoff: Duration,
    pub(crate) name: String,
    pub(crate) progress: SharedProgress,
    pub(crate) event_listeners: EventListeners<UrlEvent>,
}

impl UrlStressConfig {
    /// Creates a new configuration builder for `url`.
    pub fn builder(url: impl Into<String>) -> UrlStressConfigBuilder {
        #[cfg(feature = "metrics")]
        {
            METRICS_INIT.call_once(|| {
                describe_counter!(
                    "url_calls_total",
                    "Bulk calls by outcome (success, error, abandoned)"
                );
                describe_counter!(
                    "url_admission_retries_total",
                    "Admission failures answered with backoff"
                );
                describe_counter!(
                    "url_preflight_total",
                    "Preflight calls by outcome"
                );
                describe_histogram!(
                    "url_injection_duration_seconds",
                    "Wall time of the bulk phase"
                );
            });
        }
        UrlStressConfigBuilder::new(url)
    }

    /// The validated request target.
    pub fn target(&self) -> &RequestTarget {
        &self.target
    }

    /// Calls per run.
    pub fn rate(&self) -> usize {
        self.rate
    }

    /// Worker pool capacity.
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Admission retry limit.
    pub fn retry_limit(&self) -> usize {
        self.retry_limit
    }

    /// Admission backoff interval.
    pub fn backoff(&self) -> Duration {
        self.backoff
    }
}

/// Builder for [`UrlStressConfig`].
pub struct UrlStressConfigBuilder {
    url: String,
    method: Result<HttpMethod, UrlError>,
    rate: usize,
    timeout: Option<Duration>,
    retry_limit: usize,
    backoff: Duration,
    max_concurrency: Option<usize>,
    headers: Vec<(String, String)>,
    body: Option<String>,
    name: String,
    progress: SharedProgress,
    event_listeners: EventListeners<UrlEvent>,
}

impl UrlStressConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Ok(HttpMethod::Get),
            rate: DEFAULT_RATE,
            timeout: None,
            retry_limit: 5,
            backoff: Duration::from_secs(1),
            max_concurrency: None,
            headers: Vec::new(),
            body: None,
            name: "url".to_string(),
            progress: progress::noop(),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the request method.
    ///
    /// Default: GET
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Ok(method);
        self
    }

    /// Sets the request method by name, validated at build time.
    pub fn method_name(mut self, method: &str) -> Self {
        self.method = method.parse();
        self
    }

    /// Sets the number of bulk calls. Must be positive.
    ///
    /// Default: 100,000
    pub fn rate(mut self, rate: usize) -> Self {
        self.rate = rate;
        self
    }

    /// Sets the per-call timeout for bulk calls. The preflight ignores it.
    ///
    /// Default: none
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets how many admission failures are tolerated before scheduling stops.
    ///
    /// Default: 5
    pub fn retry_limit(mut self, limit: usize) -> Self {
        self.retry_limit = limit;
        self
    }

    /// Sets the sleep between admission retries.
    ///
    /// Default: 1 second
    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Caps the worker pool independently of the rate.
    ///
    /// Default: equal to the rate
    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = Some(max);
        self
    }

    /// Adds a request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the request body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the name of this engine instance.
    ///
    /// Default: "url"
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets where completion progress is written.
    ///
    /// Default: discarded
    pub fn progress(mut self, progress: SharedProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Registers a callback for the preflight result.
    pub fn on_preflight<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&RequestError>) + Send + Sync + 'static,
    {
        self.event_listeners.add(move |event: &UrlEvent| {
            if let UrlEvent::Preflight { failure, .. } = event {
                f(failure.as_ref());
            }
        });
        self
    }

    /// Registers a callback for every completed bulk call with `(index, success)`.
    pub fn on_call_completed<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, bool) + Send + Sync + 'static,
    {
        self.event_listeners.add(move |event: &UrlEvent| {
            if let UrlEvent::CallCompleted { index, success, .. } = event {
                f(*index, *success);
            }
        });
        self
    }

    /// Registers a callback for admission backoff with `(retries, delay)`.
    pub fn on_admission_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(move |event: &UrlEvent| {
            if let UrlEvent::AdmissionRetry { retries, delay, .. } = event {
                f(*retries, *delay);
            }
        });
        self
    }

    /// Registers a callback for lifecycle transitions.
    pub fn on_phase_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(RunPhase, RunPhase) + Send + Sync + 'static,
    {
        self.event_listeners.on_phase(f);
        self
    }

    /// Validates the configuration and builds an engine issuing real HTTP calls.
    pub fn build(self) -> Result<UrlStress<HttpExecutor>, UrlError> {
        let config = self.validate()?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| UrlError::Client(e.to_string()))?;
        let executor = HttpExecutor::new(client, config.target.clone());
        Ok(UrlStress::new(config, executor))
    }

    /// Validates the configuration and builds an engine around `service`.
    pub fn build_with_executor<S>(self, service: S) -> Result<UrlStress<S>, UrlError>
    where
        S: Service<CallKind, Error = RequestError> + Clone + Send + 'static,
        S::Response: Send + 'static,
        S::Future: Send + 'static,
    {
        let config = self.validate()?;
        Ok(UrlStress::new(config, service))
    }

    fn validate(self) -> Result<UrlStressConfig, UrlError> {
        let url = Url::parse(&self.url).map_err(|e| UrlError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        if !ALLOWED_SCHEMES.contains(&url.scheme()) {
            return Err(UrlError::UnsupportedScheme {
                scheme: url.scheme().to_string(),
            });
        }
        let method = self.method?;
        if self.rate == 0 {
            return Err(UrlError::NonPositive { field: "rate" });
        }
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(UrlError::NonPositive { field: "timeout" });
        }
        let max_concurrency = self.max_concurrency.unwrap_or(self.rate);
        if max_concurrency == 0 {
            return Err(UrlError::NonPositive {
                field: "max_concurrency",
            });
        }

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| UrlError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| UrlError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            headers.append(header_name, header_value);
        }

        Ok(UrlStressConfig {
            target: RequestTarget {
                url,
                method,
                timeout: self.timeout,
                headers,
                body: self.body,
            },
            rate: self.rate,
            max_concurrency,
            retry_limit: self.retry_limit,
            backoff: self.backoff,
            name: self.name,
            progress: self.progress,
            event_listeners: self.event_listeners,
        })
    }
}

//! Single-request execution as a `tower::Service`.

use crate::error::RequestError;
use crate::method::HttpMethod;
use futures::future::BoxFuture;
use reqwest::header::HeaderMap;
use reqwest::Url;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::Service;

/// Which call of a run is being made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// The mandatory trial call. Never subject to the per-call timeout.
    Preflight,
    /// One of the `rate` bulk calls.
    Bulk {
        /// Zero-based scheduling index.
        index: usize,
    },
}

/// Classified result of one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The call completed with a success status.
    Success,
    /// The call raised or returned a failure status.
    Failure(RequestError),
}

impl RequestOutcome {
    /// Returns `true` for [`RequestOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, RequestOutcome::Success)
    }
}

impl<T> From<Result<T, RequestError>> for RequestOutcome {
    fn from(result: Result<T, RequestError>) -> Self {
        match result {
            Ok(_) => RequestOutcome::Success,
            Err(err) => RequestOutcome::Failure(err),
        }
    }
}

/// Everything needed to issue the configured request.
#[derive(Debug, Clone)]
pub struct RequestTarget {
    pub(crate) url: Url,
    pub(crate) method: HttpMethod,
    pub(crate) timeout: Option<Duration>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<String>,
}

impl RequestTarget {
    /// Target URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Per-call timeout for bulk calls.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// `host[:port]` of the target, or the whole URL when it has no host.
    pub fn netloc(&self) -> String {
        match self.url.host_str() {
            Some(host) => match self.url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            },
            None => self.url.to_string(),
        }
    }
}

/// Issues the configured request with `reqwest`.
///
/// Responds with the status code. Statuses of 400 and above become
/// [`RequestError::Status`].
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: reqwest::Client,
    target: Arc<RequestTarget>,
}

impl HttpExecutor {
    /// Creates an executor from a client and a target.
    pub fn new(client: reqwest::Client, target: RequestTarget) -> Self {
        Self {
            client,
            target: Arc::new(target),
        }
    }

    /// The request this executor issues.
    pub fn target(&self) -> &RequestTarget {
        &self.target
    }
}

impl Service<CallKind> for HttpExecutor {
    type Response = u16;
    type Error = RequestError;
    type Future = BoxFuture<'static, Result<u16, RequestError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, kind: CallKind) -> Self::Future {
        let target = &self.target;
        let mut request = self
            .client
            .request(target.method.to_reqwest(), target.url.clone())
            .headers(target.headers.clone());
        if let Some(body) = &target.body {
            request = request.body(body.clone());
        }
        if let (CallKind::Bulk { .. }, Some(timeout)) = (kind, target.timeout) {
            request = request.timeout(timeout);
        }

        Box::pin(async move {
            let response = request.send().await?;
            let status = response.status();
            if status.is_client_error() || status.is_server_error() {
                Err(RequestError::Status(status.as_u16()))
            } else {
                Ok(status.as_u16())
            }
        })
    }
}

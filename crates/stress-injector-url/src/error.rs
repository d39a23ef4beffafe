//! Error types for the URL load injector.

use stress_injector_core::StressError;

/// Configuration errors. Raised before any network activity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    /// The target did not parse as a URL.
    #[error("bad url '{url}': {reason}")]
    InvalidUrl {
        /// The rejected input.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// The URL scheme is not in the allow-list.
    #[error("bad url scheme '{scheme}'")]
    UnsupportedScheme {
        /// The rejected scheme.
        scheme: String,
    },

    /// The request method is not one of GET, PUT, POST, DELETE.
    #[error("bad request type '{method}': allowed GET, PUT, POST, DELETE")]
    UnsupportedMethod {
        /// The rejected method.
        method: String,
    },

    /// A count or duration that must be positive was zero.
    #[error("{field} must be positive")]
    NonPositive {
        /// The offending setting.
        field: &'static str,
    },

    /// A request header could not be encoded.
    #[error("invalid header '{name}': {reason}")]
    InvalidHeader {
        /// Header name as given.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl From<UrlError> for StressError {
    fn from(err: UrlError) -> Self {
        let reason = err.to_string();
        match err {
            UrlError::InvalidUrl { .. } | UrlError::UnsupportedScheme { .. } => {
                StressError::invalid_input("url", reason)
            }
            UrlError::UnsupportedMethod { .. } => StressError::invalid_input("method", reason),
            UrlError::NonPositive { field } => StressError::invalid_input(field, reason),
            UrlError::InvalidHeader { .. } => StressError::invalid_input("headers", reason),
            UrlError::Client(reason) => StressError::spawn("http client", reason),
        }
    }
}

/// Why one call failed. Recoverable: folded into the error counter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum RequestError {
    /// The per-call timeout elapsed.
    #[error("request timed out")]
    Timeout,
    /// The target answered with a non-success status.
    #[error("server responded with status {0}")]
    Status(u16),
    /// Connection, protocol or body failure.
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RequestError::Timeout
        } else if let Some(status) = err.status() {
            RequestError::Status(status.as_u16())
        } else {
            RequestError::Transport(err.to_string())
        }
    }
}

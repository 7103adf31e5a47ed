//! Error types for the edge proxy.
//!
//! Every failure the proxy can hit while handling a request is one variant
//! of [`ProxyError`]. Each variant maps to exactly one HTTP status code, so
//! nothing is swallowed on the way back to the browser.

use thiserror::Error;

/// Result type alias for proxy operations.
pub type Result<T> = std::result::Result<T, ProxyError>;

/// Unified error type for proxy operations.
///
/// An upstream that answers with a 4xx/5xx status is *not* an error here:
/// that response is relayed verbatim as a successful forward.
///
/// # Example
///
/// ```
/// use edgeproxy_core::error::{ProxyError, Result};
///
/// fn require_host(host: Option<&str>) -> Result<&str> {
///     host.ok_or_else(|| ProxyError::UnauthorizedHost("<missing>".into()))
/// }
///
/// assert!(require_host(None).is_err());
/// ```
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Host or Origin failed allow-list validation.
    #[error("Unauthorized host: {0}")]
    UnauthorizedHost(String),

    /// Configuration error (missing or invalid values).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The upstream origin or path could not be turned into a URL.
    #[error("Invalid upstream URL: {0}")]
    InvalidUpstreamUrl(String),

    /// Upstream did not answer before the deadline fired.
    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),

    /// DNS, connect or TLS failure reaching the upstream.
    #[error("Upstream connection failed: {0}")]
    UpstreamConnectionFailed(String),

    /// Request body too large.
    #[error("Request body too large: {size} bytes (max: {max} bytes)")]
    BodyTooLarge {
        /// Actual body size in bytes.
        size: usize,
        /// Maximum allowed size in bytes.
        max: usize,
    },

    /// Failed to read the inbound request body.
    #[error("Body read error: {0}")]
    BodyReadError(String),

    /// HTTP client error (from reqwest).
    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),
}

impl ProxyError {
    /// Returns the HTTP status code that should be returned to the client.
    pub fn status_code(&self) -> hyper::StatusCode {
        use hyper::StatusCode;

        match self {
            Self::UnauthorizedHost(_) => StatusCode::FORBIDDEN,
            Self::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidUpstreamUrl(_) => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::UpstreamConnectionFailed(_) => StatusCode::BAD_GATEWAY,
            Self::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::BodyReadError(_) => StatusCode::BAD_REQUEST,
            Self::HttpClientError(err) if err.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            Self::HttpClientError(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Returns a short message suitable for an HTTP response body.
    ///
    /// Internal details (URLs, socket errors) stay in the logs.
    pub fn user_message(&self) -> &str {
        match self {
            Self::UnauthorizedHost(_) => "Forbidden",
            Self::ConfigError(_) => "Internal server error",
            Self::InvalidUpstreamUrl(_) => "Bad gateway",
            Self::UpstreamTimeout(_) => "Request timeout",
            Self::UpstreamConnectionFailed(_) => "Proxy error",
            Self::BodyTooLarge { .. } => "Request body too large",
            Self::BodyReadError(_) => "Failed to read request body",
            Self::HttpClientError(err) if err.is_timeout() => "Request timeout",
            Self::HttpClientError(_) => "Proxy error",
        }
    }

    /// Returns true if this error should be logged at error level.
    ///
    /// Rejected hosts and oversized bodies are client mistakes and only
    /// warrant a warning.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigError(_)
                | Self::InvalidUpstreamUrl(_)
                | Self::UpstreamTimeout(_)
                | Self::UpstreamConnectionFailed(_)
                | Self::HttpClientError(_)
        )
    }

    /// Returns true if the failure came from the deadline firing.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::UpstreamTimeout(_) => true,
            Self::HttpClientError(err) => err.is_timeout(),
            _ => false,
        }
    }
}

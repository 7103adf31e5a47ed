//! Request outcomes and their HTTP responses.
//!
//! Every request resolves to exactly one [`ProxyOutcome`], and every outcome
//! maps to exactly one response:
//!
//! | Outcome            | Status | Body                                          |
//! |--------------------|--------|-----------------------------------------------|
//! | `Passthrough`      | as-is  | as-is                                         |
//! | `Forbidden`        | 403    | `Forbidden` (text)                            |
//! | `Timeout`          | 504    | `{"error":"Request timeout","message":...}`   |
//! | `UpstreamError`    | 502    | `{"error":"Proxy error","message":...}`       |
//! | `UpstreamResponse` | as-is  | as-is, hop-by-hop headers dropped             |
//! | `Rejected`         | per error | plain-text user message                    |

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::error::ProxyError;
use crate::forwarder::UpstreamResponse;
use crate::headers::is_hop_by_hop;

/// Response body type produced by the proxy.
pub type ProxyBody = Full<Bytes>;

/// Final result of handling one request.
#[derive(Debug)]
pub enum ProxyOutcome {
    /// Relayed from the app origin, possibly with cache headers adjusted.
    Passthrough(Response<ProxyBody>),
    /// Host or Origin failed validation in development.
    Forbidden,
    /// The upstream deadline fired.
    Timeout(String),
    /// Any other failure reaching the upstream.
    UpstreamError(ProxyError),
    /// The upstream answered; relayed with its own status and body.
    UpstreamResponse(UpstreamResponse),
    /// The inbound request was refused before any upstream call.
    Rejected(ProxyError),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
}

impl ProxyOutcome {
    /// Converts the outcome into the response sent to the browser.
    pub fn into_response(self) -> Response<ProxyBody> {
        match self {
            Self::Passthrough(response) => response,
            Self::Forbidden => create_error_response(StatusCode::FORBIDDEN, "Forbidden"),
            Self::Timeout(message) => {
                json_error_response(StatusCode::GATEWAY_TIMEOUT, "Request timeout", &message)
            }
            Self::UpstreamError(err) => {
                json_error_response(StatusCode::BAD_GATEWAY, "Proxy error", &err.to_string())
            }
            Self::UpstreamResponse(upstream) => upstream_into_response(upstream),
            Self::Rejected(err) => create_error_response(err.status_code(), err.user_message()),
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Passthrough(_) => "passthrough",
            Self::Forbidden => "forbidden",
            Self::Timeout(_) => "timeout",
            Self::UpstreamError(_) => "upstream_error",
            Self::UpstreamResponse(_) => "upstream_response",
            Self::Rejected(_) => "rejected",
        }
    }
}

/// Builds a relayed response, dropping hop-by-hop headers.
///
/// Repeated headers such as `set-cookie` are appended, never collapsed.
pub fn upstream_into_response(upstream: UpstreamResponse) -> Response<ProxyBody> {
    let mut response = Response::new(Full::new(upstream.body));
    *response.status_mut() = upstream.status;

    let headers = response.headers_mut();
    for (name, value) in &upstream.headers {
        if !is_hop_by_hop(name.as_str()) {
            headers.append(name.clone(), value.clone());
        }
    }
    response
}

/// Creates a plain-text error response.
///
/// # Example
///
/// ```
/// use edgeproxy_core::outcome::create_error_response;
/// use hyper::StatusCode;
///
/// let response = create_error_response(StatusCode::FORBIDDEN, "Forbidden");
/// assert_eq!(response.status(), StatusCode::FORBIDDEN);
/// ```
pub fn create_error_response(status: StatusCode, message: &str) -> Response<ProxyBody> {
    let mut response = Response::new(Full::new(Bytes::from(message.to_string())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response
}

/// Creates a JSON error response of the form `{"error": ..., "message": ...}`.
pub fn json_error_response(status: StatusCode, error: &str, message: &str) -> Response<ProxyBody> {
    let body = serde_json::to_vec(&ErrorBody { error, message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{error}\"}}").into_bytes());

    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

//! CORS response headers for development mode.
//!
//! In production the browser talks to the proxy same-origin, so no CORS
//! headers are emitted at all.

use hyper::HeaderMap;
use hyper::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue,
};

use crate::types::{Environment, HostPolicy};

/// Methods advertised in `Access-Control-Allow-Methods`.
pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// Headers advertised in `Access-Control-Allow-Headers`.
pub const ALLOWED_HEADERS: &str =
    "Content-Type, Authorization, X-Requested-With, Accept, Origin, X-XSRF-TOKEN";

/// Adds CORS headers to a response when running in development.
///
/// `Access-Control-Allow-Origin` reflects the request `Origin`, falling back
/// to the configured local default when the request carried none (or one
/// that is not a valid header value). Returns `true` if headers were added.
pub fn annotate(
    headers: &mut HeaderMap,
    environment: Environment,
    request_origin: Option<&str>,
    policy: &HostPolicy,
) -> bool {
    if !environment.is_development() {
        return false;
    }

    let allow_origin = request_origin
        .and_then(|origin| HeaderValue::from_str(origin).ok())
        .or_else(|| HeaderValue::from_str(&policy.cors_default_origin).ok())
        .unwrap_or_else(|| HeaderValue::from_static(crate::defaults::CORS_DEFAULT_ORIGIN));

    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    true
}

//! Upstream forwarding.
//!
//! Builds the outgoing request (URL, headers, body), runs exactly one
//! upstream call under a cancellable deadline and reports the result as a
//! [`ProxyOutcome`]. There are no retries: a failed call is mapped straight
//! to a 502/504 for the browser to handle.
//!
//! # Deadline
//!
//! Each call gets a fresh [`CancellationToken`] and a timer task that
//! cancels it after the configured timeout. The call future races the
//! token; whichever finishes first wins, and the losing call future is
//! dropped, which aborts the in-flight request and discards any partially
//! received body. The timer is aborted as soon as the race settles.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use hyper::header::{HOST, HeaderName, HeaderValue};
use hyper::{HeaderMap, Method, StatusCode};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::error::{ProxyError, Result};
use crate::headers::{CONTENT_LENGTH, X_FORWARDED_HOST, X_FORWARDED_PROTO, is_hop_by_hop};
use crate::outcome::ProxyOutcome;
use crate::path_classifier::normalize_path;

/// Canonical GraphQL path on the API origin.
pub const GRAPHQL_PATH: &str = "/graphql";

/// Alias the browser uses for the GraphQL endpoint.
pub const GRAPHQL_ALIAS: &str = "/api/graphql";

/// A fully resolved request ready to be sent upstream.
#[derive(Clone, Debug)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// `None` for GET/HEAD, otherwise the inbound body as an opaque blob.
    pub body: Option<Bytes>,
}

/// A complete upstream response, body fully received.
#[derive(Clone, Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// The network seam: sends one request and returns one response.
///
/// Implementations must not retry. Dropping the returned future must abort
/// the call.
pub trait HttpTransport: Send + Sync {
    /// Sends the request and reads the full response body.
    fn send(
        &self,
        request: UpstreamRequest,
    ) -> impl Future<Output = Result<UpstreamResponse>> + Send;
}

/// [`HttpTransport`] backed by a shared, pooled [`reqwest::Client`].
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a client that relays redirects instead of following them.
    ///
    /// No client-level timeout is set; the deadline is owned by [`forward`].
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|err| {
            if err.is_connect() {
                ProxyError::UpstreamConnectionFailed(err.to_string())
            } else {
                ProxyError::HttpClientError(err)
            }
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

/// A timer that cancels a token once the timeout elapses.
///
/// The timer task is aborted when the deadline is cleared or dropped, so a
/// finished call never leaves a sleeping task behind.
#[derive(Debug)]
pub struct Deadline {
    token: CancellationToken,
    timer: JoinHandle<()>,
}

impl Deadline {
    /// Starts the timer. Must be called inside a Tokio runtime.
    pub fn start(timeout: Duration) -> Self {
        let token = CancellationToken::new();
        let timer = tokio::spawn({
            let token = token.clone();
            async move {
                tokio::time::sleep(timeout).await;
                token.cancel();
            }
        });
        Self { token, timer }
    }

    /// Token cancelled when the deadline fires.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Stops the timer. Returns `true` if the deadline had already fired.
    pub fn clear(self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

/// Runs a single upstream call bound to a fresh deadline.
///
/// # Example
///
/// ```ignore
/// let outcome = forwarder::forward(&transport, request, Duration::from_secs(30)).await;
/// ```
pub async fn forward<T: HttpTransport>(
    transport: &T,
    request: UpstreamRequest,
    timeout: Duration,
) -> ProxyOutcome {
    let url = request.url.clone();
    let deadline = Deadline::start(timeout);

    let result = tokio::select! {
        biased;
        () = deadline.token().cancelled() => Err(ProxyError::UpstreamTimeout(format!(
            "Upstream did not respond within {} seconds",
            timeout.as_secs()
        ))),
        result = transport.send(request) => result,
    };
    let fired = deadline.clear();
    debug!(url = %url, deadline_fired = fired, ok = result.is_ok(), "Upstream call settled");

    match result {
        Ok(response) => ProxyOutcome::UpstreamResponse(response),
        Err(err) if err.is_timeout() => ProxyOutcome::Timeout(err.to_string()),
        Err(err) => ProxyOutcome::UpstreamError(err),
    }
}

/// Maps the inbound path onto the API origin's path.
///
/// Both GraphQL spellings go to the canonical `/graphql`; everything else
/// passes through unchanged.
pub fn upstream_path(path: &str) -> &str {
    match normalize_path(path) {
        GRAPHQL_ALIAS | GRAPHQL_PATH => GRAPHQL_PATH,
        _ => path,
    }
}

/// Joins an origin with a path and optional query string.
pub fn upstream_url(origin: &Url, path: &str, query: Option<&str>) -> Result<Url> {
    if origin.cannot_be_a_base() || origin.host_str().is_none() {
        return Err(ProxyError::InvalidUpstreamUrl(origin.to_string()));
    }
    let mut url = origin.clone();
    url.set_path(path);
    url.set_query(query);
    Ok(url)
}

/// `host[:port]` of an origin, as sent in the `Host` header.
pub fn authority(origin: &Url) -> Result<String> {
    let host = origin
        .host_str()
        .ok_or_else(|| ProxyError::InvalidUpstreamUrl(origin.to_string()))?;
    Ok(match origin.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Copies inbound headers minus hop-by-hop headers, `host` and `content-length`.
///
/// Repeated headers (for example several `cookie` lines) are kept.
pub fn copy_request_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len() + 3);
    for (name, value) in inbound {
        if name == HOST || name.as_str() == CONTENT_LENGTH || is_hop_by_hop(name.as_str()) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

/// Builds the outgoing headers for an API call.
///
/// `host` is rewritten to the API origin, `x-forwarded-host` carries the
/// inbound host and `x-forwarded-proto` is always `https`.
pub fn api_request_headers(
    inbound: &HeaderMap,
    origin: &Url,
    inbound_host: Option<&str>,
) -> Result<HeaderMap> {
    let mut headers = copy_request_headers(inbound);
    headers.insert(HOST, header_value(&authority(origin)?)?);
    if let Some(host) = inbound_host {
        headers.insert(
            HeaderName::from_static(X_FORWARDED_HOST),
            header_value(host)?,
        );
    }
    headers.insert(
        HeaderName::from_static(X_FORWARDED_PROTO),
        HeaderValue::from_static("https"),
    );
    Ok(headers)
}

/// Returns `true` if a request with this method carries a body upstream.
pub fn method_has_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD)
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| ProxyError::InvalidUpstreamUrl(format!("invalid header value '{value}'")))
}

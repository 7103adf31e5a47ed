//! HTTP request handling and proxying.
//!
//! [`ProxyMiddleware`] composes the other modules for every inbound request.
//!
//! # Architecture
//!
//! The request handling flow:
//! 1. Classify the path ([`path_classifier`])
//! 2. `DynamicPage` / `Proxied`: in development, validate Host and Origin
//!    ([`host_validator`]) and answer 403 on failure
//! 3. `Bypass` / `StaticAsset`: relay to the app origin untouched
//! 4. `DynamicPage`: relay to the app origin, force `Cache-Control: no-store`
//! 5. `Proxied`: forward to the API origin ([`forwarder`]), rewrite cookies
//!    ([`cookie_rewriter`]) and add CORS headers ([`cors`])
//! 6. Map the [`ProxyOutcome`] to a response
//!
//! Bypassed endpoints and static assets skip host validation in every
//! environment. Bypassed endpoints are cheap public-data endpoints served by
//! the app itself; any of them gaining side effects must be moved off the
//! bypass list.
//!
//! # Connection Pooling
//!
//! The transport is shared by every request. [`ReqwestTransport`] wraps one
//! pooled [`reqwest::Client`].
//!
//! [`ReqwestTransport`]: crate::forwarder::ReqwestTransport

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::header::{CACHE_CONTROL, CONTENT_LENGTH, HOST, HeaderValue, ORIGIN};
use hyper::http::request::Parts;
use hyper::{Request, Response};
use std::convert::Infallible;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, error, warn};
use url::Url;

use crate::error::{ProxyError, Result};
use crate::forwarder::{self, HttpTransport, UpstreamRequest};
use crate::headers::X_FORWARDED_HOST;
use crate::outcome::{ProxyBody, ProxyOutcome, upstream_into_response};
use crate::path_classifier::{self, PathClassification};
use crate::types::ConfigProvider;
use crate::{cookie_rewriter, cors, host_validator};

/// Per-request orchestrator over shared, immutable configuration.
#[derive(Debug)]
pub struct ProxyMiddleware<C, T> {
    config: Arc<C>,
    transport: T,
}

impl<C: ConfigProvider, T: HttpTransport> ProxyMiddleware<C, T> {
    /// Creates the middleware. Both values live for the whole process.
    pub fn new(config: Arc<C>, transport: T) -> Self {
        Self { config, transport }
    }

    /// Handles one request and always produces a response.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<ProxyBody>
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Display,
    {
        let outcome = self.process(req).await;
        log_outcome(&outcome);
        outcome.into_response()
    }

    /// Decides what to do with a request and runs it to a [`ProxyOutcome`].
    pub async fn process<B>(&self, req: Request<B>) -> ProxyOutcome
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Display,
    {
        let classification = path_classifier::classify(req.uri().path());
        let host = inbound_host(&req);
        debug!(
            method = %req.method(),
            path = req.uri().path(),
            host = host.as_deref().unwrap_or("-"),
            classification = classification.as_str(),
            "Classified request"
        );

        let origin = header_str(&req, ORIGIN.as_str()).map(str::to_owned);
        if classification.is_host_checked()
            && self.config.environment().is_development()
            && !self.is_authorized(host.as_deref(), origin.as_deref())
        {
            let err = ProxyError::UnauthorizedHost(host.clone().unwrap_or_default());
            warn!(
                error = %err,
                origin = origin.as_deref().unwrap_or("-"),
                path = req.uri().path(),
                "Rejected request from unapproved host"
            );
            return ProxyOutcome::Forbidden;
        }

        match classification {
            PathClassification::Bypass | PathClassification::StaticAsset => {
                self.relay_to_app(req, host.as_deref(), false).await
            }
            PathClassification::DynamicPage => self.relay_to_app(req, host.as_deref(), true).await,
            PathClassification::Proxied => {
                self.forward_to_api(req, host.as_deref(), origin.as_deref()).await
            }
        }
    }

    /// Host must be approved; an `Origin`, when present, must be approved too.
    fn is_authorized(&self, host: Option<&str>, origin: Option<&str>) -> bool {
        let policy = self.config.host_policy();
        let host_ok = host.is_some_and(|host| host_validator::is_approved_host(host, policy));
        let origin_ok =
            origin.is_none_or(|origin| host_validator::is_approved_origin(origin, policy));
        host_ok && origin_ok
    }

    async fn forward_to_api<B>(
        &self,
        req: Request<B>,
        host: Option<&str>,
        origin: Option<&str>,
    ) -> ProxyOutcome
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Display,
    {
        let environment = self.config.environment();
        let upstream = self.config.upstream_config();
        let policy = self.config.host_policy();
        let api_origin = upstream.api_origin(environment);

        let (parts, body) = req.into_parts();
        let request = match self
            .build_request(&parts, body, api_origin, |parts, target| {
                let path = forwarder::upstream_path(parts.uri.path());
                let url = forwarder::upstream_url(target, path, parts.uri.query())?;
                let headers = forwarder::api_request_headers(&parts.headers, target, host)?;
                Ok((url, headers))
            })
            .await
        {
            Ok(request) => request,
            Err(err) => return rejection(err),
        };

        match forwarder::forward(&self.transport, request, upstream.timeout).await {
            ProxyOutcome::UpstreamResponse(mut response) => {
                cookie_rewriter::rewrite_response_cookies(
                    &mut response.headers,
                    environment,
                    host,
                    policy,
                );
                cors::annotate(&mut response.headers, environment, origin, policy);
                ProxyOutcome::UpstreamResponse(response)
            }
            failure => failure,
        }
    }

    async fn relay_to_app<B>(
        &self,
        req: Request<B>,
        host: Option<&str>,
        no_store: bool,
    ) -> ProxyOutcome
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Display,
    {
        let upstream = self.config.upstream_config();

        let (parts, body) = req.into_parts();
        let request = match self
            .build_request(&parts, body, &upstream.app_origin, |parts, target| {
                let url = forwarder::upstream_url(target, parts.uri.path(), parts.uri.query())?;
                let mut headers = forwarder::copy_request_headers(&parts.headers);
                headers.insert(HOST, app_header_value(&forwarder::authority(target)?)?);
                if let Some(host) = host {
                    headers.insert(X_FORWARDED_HOST, app_header_value(host)?);
                }
                Ok((url, headers))
            })
            .await
        {
            Ok(request) => request,
            Err(err) => return rejection(err),
        };

        match forwarder::forward(&self.transport, request, upstream.timeout).await {
            ProxyOutcome::UpstreamResponse(response) => {
                let mut response = upstream_into_response(response);
                if no_store {
                    response
                        .headers_mut()
                        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
                }
                ProxyOutcome::Passthrough(response)
            }
            failure => failure,
        }
    }

    /// Resolves URL and headers, then reads the body for methods that carry one.
    async fn build_request<B, F>(
        &self,
        parts: &Parts,
        body: B,
        target: &Url,
        resolve: F,
    ) -> Result<UpstreamRequest>
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Display,
        F: FnOnce(&Parts, &Url) -> Result<(Url, hyper::HeaderMap)>,
    {
        let (url, headers) = resolve(parts, target)?;

        let body = if forwarder::method_has_body(&parts.method) {
            let max = self.config.upstream_config().max_body_size;
            Some(read_body(parts, body, max).await?)
        } else {
            None
        };

        Ok(UpstreamRequest {
            method: parts.method.clone(),
            url,
            headers,
            body,
        })
    }
}

/// Handles a request with a shared middleware.
///
/// Signature fits [`hyper::service::service_fn`].
pub async fn handle_request<B, C, T>(
    req: Request<B>,
    middleware: Arc<ProxyMiddleware<C, T>>,
) -> std::result::Result<Response<ProxyBody>, Infallible>
where
    B: Body + Send,
    B::Data: Send,
    B::Error: Display,
    C: ConfigProvider,
    T: HttpTransport,
{
    Ok(middleware.handle(req).await)
}

/// Reads the whole inbound body, enforcing the size limit (0 = unlimited).
async fn read_body<B>(parts: &Parts, body: B, max: usize) -> Result<Bytes>
where
    B: Body,
    B::Error: Display,
{
    if max > 0
        && let Some(declared) = parts
            .headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok())
        && declared > max
    {
        return Err(ProxyError::BodyTooLarge {
            size: declared,
            max,
        });
    }

    let bytes = body
        .collect()
        .await
        .map_err(|err| ProxyError::BodyReadError(err.to_string()))?
        .to_bytes();

    if max > 0 && bytes.len() > max {
        return Err(ProxyError::BodyTooLarge {
            size: bytes.len(),
            max,
        });
    }
    Ok(bytes)
}

/// Host header, falling back to the URI authority (HTTP/2 style requests).
fn inbound_host<B>(req: &Request<B>) -> Option<String> {
    header_str(req, HOST.as_str())
        .map(str::to_owned)
        .or_else(|| req.uri().authority().map(|authority| authority.to_string()))
}

fn header_str<'a, B>(req: &'a Request<B>, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|value| value.to_str().ok())
}

fn app_header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| ProxyError::ConfigError(format!("invalid header value '{value}'")))
}

/// Failures before any upstream call are client or config errors.
fn rejection(err: ProxyError) -> ProxyOutcome {
    if err.is_server_error() {
        ProxyOutcome::UpstreamError(err)
    } else {
        ProxyOutcome::Rejected(err)
    }
}

fn log_outcome(outcome: &ProxyOutcome) {
    match outcome {
        ProxyOutcome::Timeout(message) => error!(%message, "Upstream timeout"),
        ProxyOutcome::UpstreamError(err) if err.is_server_error() => {
            error!(error = %err, "Upstream failure")
        }
        ProxyOutcome::UpstreamError(err) | ProxyOutcome::Rejected(err) => {
            warn!(error = %err, "Request refused")
        }
        other => debug!(outcome = other.label(), "Request completed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        Behavior, RecordingTransport, TEST_API_ORIGIN, TEST_APP_ORIGIN, TestConfig,
    };
    use crate::forwarder::UpstreamResponse;
    use http_body_util::Full;
    use hyper::{HeaderMap, Method, StatusCode};
    use std::time::Duration;

    fn middleware(
        config: TestConfig,
        transport: RecordingTransport,
    ) -> ProxyMiddleware<TestConfig, RecordingTransport> {
        ProxyMiddleware::new(Arc::new(config), transport)
    }

    fn get(path: &str, host: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(Method::GET)
            .uri(path)
            .header("host", host)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    async fn body_of(response: Response<ProxyBody>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    fn cookie_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.append(
            "set-cookie",
            HeaderValue::from_static(
                "token=abc; Path=/; Domain=.bhenning.com; Secure; SameSite=None",
            ),
        );
        headers.append(
            "set-cookie",
            HeaderValue::from_static("theme=dark; Secure; SameSite=None"),
        );
        headers
    }

    // ===========================================
    // Bypass
    // ===========================================

    #[tokio::test]
    async fn test_bypass_in_production_never_hits_api() {
        let transport = RecordingTransport::ok(HeaderMap::new(), "ok");
        let proxy = middleware(TestConfig::production(), transport.clone());

        let response = proxy.handle(get("/api/health", "evil.example.com")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(transport.calls_to(TEST_API_ORIGIN), 0);
        assert_eq!(transport.calls_to(TEST_APP_ORIGIN), 1);
        assert_eq!(
            transport.requests()[0].url.as_str(),
            "http://127.0.0.1:3001/api/health"
        );
    }

    #[tokio::test]
    async fn test_bypass_skips_host_check_in_development() {
        let transport = RecordingTransport::ok(HeaderMap::new(), "{\"status\":\"UP\"}");
        let proxy = middleware(TestConfig::development(), transport.clone());

        let response = proxy.handle(get("/api/uuid/generate", "evil.example.com")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_of(response).await, "{\"status\":\"UP\"}");
        assert_eq!(transport.calls_to(TEST_API_ORIGIN), 0);
    }

    #[tokio::test]
    async fn test_bypass_leaves_cookies_and_cache_alone() {
        let mut headers = cookie_headers();
        headers.insert("cache-control", HeaderValue::from_static("max-age=60"));
        let transport = RecordingTransport::ok(headers, "ok");
        let proxy = middleware(TestConfig::development(), transport.clone());

        let response = proxy.handle(get("/api/weather", "localhost:3000")).await;

        assert_eq!(
            response.headers().get("cache-control").unwrap(),
            "max-age=60"
        );
        let cookies: Vec<_> = response.headers().get_all("set-cookie").iter().collect();
        assert_eq!(
            cookies[0],
            "token=abc; Path=/; Domain=.bhenning.com; Secure; SameSite=None"
        );
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }

    // ===========================================
    // Host rejection
    // ===========================================

    #[tokio::test]
    async fn test_unapproved_host_forbidden_in_development() {
        let transport = RecordingTransport::ok(HeaderMap::new(), "ok");
        let proxy = middleware(TestConfig::development(), transport.clone());

        let response = proxy.handle(get("/api/test", "evil.example.com")).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_of(response).await, "Forbidden");
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_spoofed_hosts_forbidden_in_development() {
        for host in [
            "vercel.bhenning.com.evil.com",
            "evilvercel.bhenning.com",
            "localhost.evil.com",
            "127.0.0.1.evil.com",
        ] {
            let transport = RecordingTransport::ok(HeaderMap::new(), "ok");
            let proxy = middleware(TestConfig::development(), transport.clone());

            let response = proxy.handle(get("/graphql", host)).await;

            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{host}");
            assert_eq!(transport.call_count(), 0, "{host}");
        }
    }

    #[tokio::test]
    async fn test_unapproved_origin_forbidden_in_development() {
        let transport = RecordingTransport::ok(HeaderMap::new(), "ok");
        let proxy = middleware(TestConfig::development(), transport.clone());

        let req = Request::builder()
            .uri("/api/account/totals")
            .header("host", "localhost:3000")
            .header("origin", "https://evil.example.com")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = proxy.handle(req).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_host_forbidden_in_development() {
        let transport = RecordingTransport::ok(HeaderMap::new(), "ok");
        let proxy = middleware(TestConfig::development(), transport.clone());

        let req = Request::builder()
            .uri("/api/test")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = proxy.handle(req).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_production_does_not_host_check() {
        let transport = RecordingTransport::ok(HeaderMap::new(), "ok");
        let proxy = middleware(TestConfig::production(), transport.clone());

        let response = proxy.handle(get("/api/test", "evil.example.com")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(transport.calls_to(TEST_API_ORIGIN), 1);
    }

    #[tokio::test]
    async fn test_dynamic_page_from_unapproved_host_forbidden_in_development() {
        let transport = RecordingTransport::ok(HeaderMap::new(), "<html></html>");
        let proxy = middleware(TestConfig::development(), transport.clone());

        let response = proxy.handle(get("/finance", "evil.example.com")).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_of(response).await, "Forbidden");
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_dynamic_page_from_localhost_allowed_in_development() {
        let transport = RecordingTransport::ok(HeaderMap::new(), "<html></html>");
        let proxy = middleware(TestConfig::development(), transport.clone());

        let response = proxy.handle(get("/finance", "localhost:3000")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("cache-control").unwrap(), "no-store");
        assert_eq!(transport.calls_to(TEST_APP_ORIGIN), 1);
    }

    #[tokio::test]
    async fn test_static_asset_not_host_checked() {
        let transport = RecordingTransport::ok(HeaderMap::new(), "body{}");
        let proxy = middleware(TestConfig::development(), transport.clone());

        let response = proxy
            .handle(get("/_next/static/css/app.css", "evil.example.com"))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(transport.calls_to(TEST_APP_ORIGIN), 1);
    }

    // ===========================================
    // Forwarding
    // ===========================================

    #[tokio::test]
    async fn test_graphql_alias_forwarded_to_canonical_path() {
        let transport = RecordingTransport::ok(HeaderMap::new(), "{\"data\":{}}");
        let proxy = middleware(TestConfig::development(), transport.clone());

        let response = proxy
            .handle(get("/api/graphql?op=Accounts", "localhost:3000"))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url.as_str(),
            "https://api.test.bhenning.com/graphql?op=Accounts"
        );
    }

    #[tokio::test]
    async fn test_forwarded_headers() {
        let transport = RecordingTransport::ok(HeaderMap::new(), "[]");
        let proxy = middleware(TestConfig::development(), transport.clone());

        let req = Request::builder()
            .uri("/api/transaction/account/select/checking_brian?page=0")
            .header("host", "localhost:3000")
            .header("accept", "application/json")
            .header("cookie", "token=abc")
            .header("connection", "keep-alive")
            .body(Full::new(Bytes::new()))
            .unwrap();
        proxy.handle(req).await;

        let request = &transport.requests()[0];
        assert_eq!(
            request.url.as_str(),
            "https://api.test.bhenning.com/api/transaction/account/select/checking_brian?page=0"
        );
        assert_eq!(
            request.headers.get("host").unwrap(),
            "api.test.bhenning.com"
        );
        assert_eq!(
            request.headers.get("x-forwarded-host").unwrap(),
            "localhost:3000"
        );
        assert_eq!(request.headers.get("x-forwarded-proto").unwrap(), "https");
        assert_eq!(request.headers.get("cookie").unwrap(), "token=abc");
        assert!(request.headers.get("connection").is_none());
        assert!(request.body.is_none());
    }

    #[tokio::test]
    async fn test_target_override_wins() {
        let transport = RecordingTransport::ok(HeaderMap::new(), "ok");
        let config = TestConfig::production().with_target_override("http://127.0.0.1:8443");
        let proxy = middleware(config, transport.clone());

        proxy.handle(get("/api/test", "vercel.bhenning.com")).await;

        assert_eq!(
            transport.requests()[0].url.as_str(),
            "http://127.0.0.1:8443/api/test"
        );
        assert_eq!(
            transport.requests()[0].headers.get("host").unwrap(),
            "127.0.0.1:8443"
        );
    }

    #[tokio::test]
    async fn test_post_body_forwarded_verbatim() {
        let transport = RecordingTransport::ok(HeaderMap::new(), "created");
        let proxy = middleware(TestConfig::development(), transport.clone());

        let payload = Bytes::from_static(b"{\"amount\":12.5,\"\xffraw\":true}");
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/transaction/insert")
            .header("host", "localhost:3000")
            .header("content-type", "application/json")
            .body(Full::new(payload.clone()))
            .unwrap();
        proxy.handle(req).await;

        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.body.as_ref().unwrap(), &payload);
    }

    #[tokio::test]
    async fn test_body_too_large_rejected_without_upstream_call() {
        let transport = RecordingTransport::ok(HeaderMap::new(), "ok");
        let config = TestConfig::development().with_max_body_size(8);
        let proxy = middleware(config, transport.clone());

        let req = Request::builder()
            .method(Method::PUT)
            .uri("/api/account/update")
            .header("host", "localhost:3000")
            .body(Full::new(Bytes::from_static(b"0123456789")))
            .unwrap();
        let response = proxy.handle(req).await;

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_upstream_error_status_relayed_verbatim() {
        let transport = RecordingTransport::new(Behavior::Respond(UpstreamResponse {
            status: StatusCode::UNAUTHORIZED,
            headers: HeaderMap::new(),
            body: Bytes::from_static(b"{\"error\":\"token expired\"}"),
        }));
        let proxy = middleware(TestConfig::production(), transport.clone());

        let response = proxy.handle(get("/api/me", "vercel.bhenning.com")).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_of(response).await, "{\"error\":\"token expired\"}");
    }

    #[tokio::test]
    async fn test_network_failure_is_502_json() {
        let transport = RecordingTransport::new(Behavior::Fail);
        let proxy = middleware(TestConfig::production(), transport.clone());

        let response = proxy.handle(get("/api/test", "vercel.bhenning.com")).await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json: serde_json::Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(json["error"], "Proxy error");
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_upstream_is_single_504() {
        let transport = RecordingTransport::new(Behavior::Hang);
        let proxy = middleware(TestConfig::development(), transport.clone());

        let response = proxy.handle(get("/api/test", "localhost:3000")).await;

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        let json: serde_json::Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(json["error"], "Request timeout");
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_timeout_applies() {
        let transport = RecordingTransport::new(Behavior::Hang);
        let config = TestConfig::production().with_timeout(Duration::from_secs(5));
        let proxy = middleware(config, transport.clone());

        let started = tokio::time::Instant::now();
        let response = proxy.handle(get("/api/test", "vercel.bhenning.com")).await;

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    // ===========================================
    // Cookies and CORS
    // ===========================================

    #[tokio::test]
    async fn test_cookies_rewritten_for_localhost_in_development() {
        let transport = RecordingTransport::ok(cookie_headers(), "ok");
        let proxy = middleware(TestConfig::development(), transport.clone());

        let response = proxy.handle(get("/api/login", "localhost:3000")).await;

        let cookies: Vec<_> = response
            .headers()
            .get_all("set-cookie")
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(
            cookies,
            vec![
                "token=abc; SameSite=Lax; Path=/".to_string(),
                "theme=dark; Secure; SameSite=None".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_cookies_untouched_in_production() {
        let transport = RecordingTransport::ok(cookie_headers(), "ok");
        let proxy = middleware(TestConfig::production(), transport.clone());

        let response = proxy.handle(get("/api/login", "localhost:3000")).await;

        let cookies: Vec<_> = response.headers().get_all("set-cookie").iter().collect();
        assert_eq!(
            cookies[0],
            "token=abc; Path=/; Domain=.bhenning.com; Secure; SameSite=None"
        );
    }

    #[tokio::test]
    async fn test_cookies_untouched_for_allow_listed_host() {
        let transport = RecordingTransport::ok(cookie_headers(), "ok");
        let proxy = middleware(TestConfig::development(), transport.clone());

        let response = proxy.handle(get("/api/login", "vercel.bhenning.com")).await;

        let cookies: Vec<_> = response.headers().get_all("set-cookie").iter().collect();
        assert_eq!(
            cookies[0],
            "token=abc; Path=/; Domain=.bhenning.com; Secure; SameSite=None"
        );
    }

    #[tokio::test]
    async fn test_cors_headers_only_in_development() {
        let transport = RecordingTransport::ok(HeaderMap::new(), "ok");
        let proxy = middleware(TestConfig::development(), transport.clone());
        let req = Request::builder()
            .uri("/api/test")
            .header("host", "localhost:3000")
            .header("origin", "http://localhost:3000")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = proxy.handle(req).await;
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            response.headers().get("access-control-allow-credentials").unwrap(),
            "true"
        );

        let transport = RecordingTransport::ok(HeaderMap::new(), "ok");
        let proxy = middleware(TestConfig::production(), transport);
        let response = proxy.handle(get("/api/test", "vercel.bhenning.com")).await;
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }

    // ===========================================
    // Pages and assets
    // ===========================================

    #[tokio::test]
    async fn test_dynamic_page_forces_no_store() {
        let mut headers = HeaderMap::new();
        headers.insert("cache-control", HeaderValue::from_static("public, max-age=3600"));
        let transport = RecordingTransport::ok(headers, "<html></html>");
        let proxy = middleware(TestConfig::production(), transport.clone());

        let response = proxy.handle(get("/finance/", "vercel.bhenning.com")).await;

        assert_eq!(response.headers().get("cache-control").unwrap(), "no-store");
        assert_eq!(
            transport.requests()[0].url.as_str(),
            "http://127.0.0.1:3001/finance/"
        );
        assert_eq!(
            transport.requests()[0].headers.get("x-forwarded-host").unwrap(),
            "vercel.bhenning.com"
        );
    }

    #[tokio::test]
    async fn test_static_asset_cache_headers_untouched() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cache-control",
            HeaderValue::from_static("public, max-age=31536000, immutable"),
        );
        let transport = RecordingTransport::ok(headers, "body{}");
        let proxy = middleware(TestConfig::production(), transport.clone());

        let response = proxy
            .handle(get("/_next/static/css/app.css", "vercel.bhenning.com"))
            .await;

        assert_eq!(
            response.headers().get("cache-control").unwrap(),
            "public, max-age=31536000, immutable"
        );
        assert!(response.headers().get("set-cookie").is_none());
    }

    #[tokio::test]
    async fn test_app_down_is_502() {
        let transport = RecordingTransport::new(Behavior::Fail);
        let proxy = middleware(TestConfig::production(), transport);

        let response = proxy.handle(get("/", "vercel.bhenning.com")).await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_handle_request_wrapper() {
        let transport = RecordingTransport::ok(HeaderMap::new(), "ok");
        let proxy = Arc::new(middleware(TestConfig::production(), transport));

        let response = handle_request(get("/api/health", "localhost"), proxy)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}

//! Test utilities for the edge proxy.
//!
//! Shared configuration and a recording transport for unit tests. Only
//! compiled when running tests (`#[cfg(test)]`).

use bytes::Bytes;
use hyper::{HeaderMap, StatusCode};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

use crate::error::{ProxyError, Result};
use crate::forwarder::{HttpTransport, UpstreamRequest, UpstreamResponse};
use crate::types::{
    Environment, EnvironmentProvider, HostPolicy, HostPolicyProvider, UpstreamConfig,
    UpstreamProvider,
};

pub const TEST_API_ORIGIN: &str = "https://api.test.bhenning.com";
pub const TEST_APP_ORIGIN: &str = "http://127.0.0.1:3001";

/// Shared test configuration with builder methods.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub environment: Environment,
    pub upstream: UpstreamConfig,
    pub policy: HostPolicy,
}

impl Default for TestConfig {
    fn default() -> Self {
        let mut upstream = UpstreamConfig::new(TEST_APP_ORIGIN.parse().unwrap());
        upstream.production_origin = TEST_API_ORIGIN.parse().unwrap();
        upstream.development_origin = TEST_API_ORIGIN.parse().unwrap();

        Self {
            environment: Environment::Production,
            upstream,
            policy: HostPolicy::default(),
        }
    }
}

impl TestConfig {
    /// Production configuration with test origins.
    pub fn production() -> Self {
        Self::default()
    }

    /// Development configuration with test origins.
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            ..Self::default()
        }
    }

    /// Configure the API origin override.
    pub fn with_target_override(mut self, origin: &str) -> Self {
        self.upstream.target_override = Some(origin.parse().unwrap());
        self
    }

    /// Configure the upstream deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.upstream.timeout = timeout;
        self
    }

    /// Configure the inbound body limit in bytes.
    pub fn with_max_body_size(mut self, bytes: usize) -> Self {
        self.upstream.max_body_size = bytes;
        self
    }
}

impl EnvironmentProvider for TestConfig {
    fn environment(&self) -> Environment {
        self.environment
    }
}

impl UpstreamProvider for TestConfig {
    fn upstream_config(&self) -> &UpstreamConfig {
        &self.upstream
    }
}

impl HostPolicyProvider for TestConfig {
    fn host_policy(&self) -> &HostPolicy {
        &self.policy
    }
}

/// What a [`RecordingTransport`] does with each request.
#[derive(Clone, Debug)]
pub enum Behavior {
    Respond(UpstreamResponse),
    Fail,
    Hang,
}

/// Transport that records every request it is handed.
#[derive(Clone, Debug)]
pub struct RecordingTransport {
    requests: Arc<Mutex<Vec<UpstreamRequest>>>,
    behavior: Behavior,
}

impl RecordingTransport {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            behavior,
        }
    }

    /// Responds 200 with the given headers and body.
    pub fn ok(headers: HeaderMap, body: &'static str) -> Self {
        Self::new(Behavior::Respond(UpstreamResponse {
            status: StatusCode::OK,
            headers,
            body: Bytes::from_static(body.as_bytes()),
        }))
    }

    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Requests whose URL starts with the given origin.
    pub fn calls_to(&self, origin: &str) -> usize {
        let origin: Url = origin.parse().unwrap();
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.url.origin() == origin.origin())
            .count()
    }
}

impl HttpTransport for RecordingTransport {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse> {
        let url = request.url.to_string();
        self.requests.lock().unwrap().push(request);

        match &self.behavior {
            Behavior::Respond(response) => Ok(response.clone()),
            Behavior::Fail => Err(ProxyError::UpstreamConnectionFailed(format!(
                "error sending request for url ({url})"
            ))),
            Behavior::Hang => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TestConfig::default();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(
            config.upstream.api_origin(Environment::Production).as_str(),
            "https://api.test.bhenning.com/"
        );
        assert_eq!(config.upstream.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builder_methods() {
        let config = TestConfig::development()
            .with_target_override("http://127.0.0.1:9000")
            .with_timeout(Duration::from_millis(250))
            .with_max_body_size(16);

        assert_eq!(config.environment, Environment::Development);
        assert_eq!(
            config.upstream.api_origin(config.environment).as_str(),
            "http://127.0.0.1:9000/"
        );
        assert_eq!(config.upstream.timeout, Duration::from_millis(250));
        assert_eq!(config.upstream.max_body_size, 16);
    }
}

//! EdgeProxy Core - Reusable edge proxy components
//!
//! This crate provides the request pipeline of a front-door proxy that sits
//! between browsers and two origins (a web app and a finance API):
//! - Path classification (bypass, proxied, static asset, dynamic page)
//! - Host and Origin validation against an allow-list (development only)
//! - Single-shot upstream forwarding under a cancellable deadline
//! - `Set-Cookie` rewriting so auth cookies survive on `localhost`
//! - Development CORS headers
//!
//! # Overview
//!
//! `edgeproxy-core` is framework-agnostic. Configuration is provided via the
//! [`ConfigProvider`] trait and the network via the
//! [`HttpTransport`](forwarder::HttpTransport) trait, so the whole pipeline
//! can run against recorded transports in tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use edgeproxy_core::forwarder::ReqwestTransport;
//! use edgeproxy_core::request_handler::ProxyMiddleware;
//! use edgeproxy_core::{
//!     Environment, EnvironmentProvider, HostPolicy, HostPolicyProvider, UpstreamConfig,
//!     UpstreamProvider,
//! };
//! use std::sync::Arc;
//!
//! struct MyConfig {
//!     upstream: UpstreamConfig,
//!     policy: HostPolicy,
//! }
//!
//! impl EnvironmentProvider for MyConfig {
//!     fn environment(&self) -> Environment { Environment::Production }
//! }
//!
//! impl UpstreamProvider for MyConfig {
//!     fn upstream_config(&self) -> &UpstreamConfig { &self.upstream }
//! }
//!
//! impl HostPolicyProvider for MyConfig {
//!     fn host_policy(&self) -> &HostPolicy { &self.policy }
//! }
//!
//! let config = Arc::new(MyConfig {
//!     upstream: UpstreamConfig::new("http://127.0.0.1:3000".parse().unwrap()),
//!     policy: HostPolicy::default(),
//! });
//! let middleware = ProxyMiddleware::new(config, ReqwestTransport::new().unwrap());
//! ```
//!
//! # Modules
//!
//! - [`types`] - Environment, configuration structs and provider traits
//! - [`error`] - Error types and result aliases
//! - [`headers`] - HTTP header constants
//! - [`defaults`] - Default origins, domains and limits
//! - [`path_classifier`] - Route table
//! - [`host_validator`] - Host and Origin allow-list checks
//! - [`cookie_rewriter`] - `Set-Cookie` parsing and local-development rewriting
//! - [`cors`] - Development CORS headers
//! - [`forwarder`] - Upstream transport, deadline and request building
//! - [`outcome`] - Request outcomes and their responses
//! - [`request_handler`] - Per-request orchestration

#![forbid(unsafe_code)]

pub mod cookie_rewriter;
pub mod cors;
pub mod defaults;
pub mod error;
pub mod forwarder;
pub mod headers;
pub mod host_validator;
pub mod outcome;
pub mod path_classifier;
pub mod request_handler;
#[cfg(test)]
pub mod test_utils;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{ProxyError, Result};
pub use forwarder::{HttpTransport, ReqwestTransport, UpstreamRequest, UpstreamResponse};
pub use outcome::{ProxyBody, ProxyOutcome};
pub use path_classifier::PathClassification;
pub use request_handler::{ProxyMiddleware, handle_request};
pub use types::{
    // Aggregated configuration trait
    ConfigProvider,
    // Deployment environment
    Environment,
    // Composable configuration traits
    EnvironmentProvider,
    // Configuration structs
    HostPolicy,
    HostPolicyProvider,
    UpstreamConfig,
    UpstreamProvider,
};

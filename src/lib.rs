//! EdgeProxy - Front-door proxy for a web app and its finance API
//!
//! # Overview
//!
//! EdgeProxy sits in front of two origins and decides, per request path,
//! where the request goes:
//! - Local-only API endpoints, pages and static assets go to the app origin
//! - Everything else under `/api/` (and `/graphql`) goes to the API origin
//! - In development, API calls and pages are host-checked, auth cookies are
//!   relaxed for `localhost` and CORS headers are added
//! - Every upstream call is bounded by a single deadline (504 on expiry)
//! - Structured logging with JSON support
//!
//! # Example
//!
//! ```rust,no_run
//! use edgeproxy::config::EnvVarConfig;
//! use edgeproxy_core::{ProxyMiddleware, ReqwestTransport};
//! use std::sync::Arc;
//!
//! // Read configuration once from the environment
//! let config = Arc::new(EnvVarConfig::from_env("http://127.0.0.1:3000".parse().unwrap()));
//!
//! // Build the per-request pipeline
//! let middleware = ProxyMiddleware::new(config, ReqwestTransport::new().unwrap());
//! ```
//!
//! # Modules
//!
//! - [`config`] - Configuration from environment variables
//! - [`env_vars`] - Environment variable constants
//! - [`server`] - Startup banner, accept loop and graceful shutdown
//! - [`args`] - Command line argument parsing
//!
//! # Re-exports from edgeproxy-core
//!
//! Core functionality is provided by the `edgeproxy-core` crate:
//! - [`path_classifier`] - Route table
//! - [`host_validator`] - Host and Origin checks
//! - [`cookie_rewriter`] - `Set-Cookie` rewriting
//! - [`request_handler`] - Per-request orchestration

#![forbid(unsafe_code)]

pub mod args;
pub mod config;
pub mod env_vars;
pub mod server;

// Re-export edgeproxy-core modules
pub use edgeproxy_core::cookie_rewriter;
pub use edgeproxy_core::host_validator;
pub use edgeproxy_core::path_classifier;
pub use edgeproxy_core::request_handler;
pub use edgeproxy_core::types;

// Re-export commonly used items at crate root
pub use config::EnvVarConfig;
pub use edgeproxy_core::{
    // Aggregated configuration trait
    ConfigProvider,
    // Deployment environment
    Environment,
    // Composable configuration traits
    EnvironmentProvider,
    // Configuration structs
    HostPolicy,
    HostPolicyProvider,
    ProxyError,
    ProxyMiddleware,
    ReqwestTransport,
    UpstreamConfig,
    UpstreamProvider,
};

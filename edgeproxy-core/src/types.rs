//! Type definitions for edge proxy configuration.
//!
//! Configuration is built once at process start and never mutated, so it is
//! shared between request tasks as a plain `Arc<C>` with no locking.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

// ============================================================================
// Environment
// ============================================================================

/// Process-wide deployment mode, fixed at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    /// Serving real users behind the hosting edge.
    Production,
    /// Local development against a remote, production-shaped backend.
    Development,
}

impl Environment {
    /// Returns `true` in development mode.
    pub fn is_development(self) -> bool {
        self == Self::Development
    }

    /// Canonical lowercase name, as accepted by `NODE_ENV`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "development" => Ok(Self::Development),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Composable Configuration Traits
// ============================================================================

/// Provides the deployment environment.
pub trait EnvironmentProvider: Send + Sync {
    /// Returns the environment the process was started in.
    fn environment(&self) -> Environment;
}

/// Provides upstream (API and app origin) settings.
pub trait UpstreamProvider: Send + Sync {
    /// Returns the upstream configuration.
    fn upstream_config(&self) -> &UpstreamConfig;
}

/// Provides the host allow-list and the cookie/CORS policy derived from it.
pub trait HostPolicyProvider: Send + Sync {
    /// Returns the host policy.
    fn host_policy(&self) -> &HostPolicy;
}

// ============================================================================
// ConfigProvider - Aggregated trait for full configuration
// ============================================================================

/// Trait for complete configuration injection.
///
/// Combines every specialized provider. Any type implementing all of them is
/// a `ConfigProvider` through the blanket implementation below.
///
/// # Example
///
/// ```
/// use edgeproxy_core::{
///     Environment, EnvironmentProvider, HostPolicy, HostPolicyProvider, UpstreamConfig,
///     UpstreamProvider,
/// };
///
/// struct MyConfig {
///     upstream: UpstreamConfig,
///     policy: HostPolicy,
/// }
///
/// impl EnvironmentProvider for MyConfig {
///     fn environment(&self) -> Environment { Environment::Development }
/// }
///
/// impl UpstreamProvider for MyConfig {
///     fn upstream_config(&self) -> &UpstreamConfig { &self.upstream }
/// }
///
/// impl HostPolicyProvider for MyConfig {
///     fn host_policy(&self) -> &HostPolicy { &self.policy }
/// }
///
/// let config = MyConfig {
///     upstream: UpstreamConfig::new("http://127.0.0.1:3000".parse().unwrap()),
///     policy: HostPolicy::default(),
/// };
/// assert_eq!(
///     config.upstream_config().api_origin(config.environment()).as_str(),
///     "https://finance.bhenning.com/"
/// );
/// ```
pub trait ConfigProvider: EnvironmentProvider + UpstreamProvider + HostPolicyProvider {}

impl<T> ConfigProvider for T where T: EnvironmentProvider + UpstreamProvider + HostPolicyProvider {}

// ============================================================================
// Configuration structs
// ============================================================================

/// Upstream origins and forwarding limits.
#[derive(Clone, Debug)]
pub struct UpstreamConfig {
    /// Explicit API origin; wins over both environment defaults when set.
    pub target_override: Option<Url>,
    /// API origin used in production when no override is set.
    pub production_origin: Url,
    /// API origin used in development when no override is set.
    pub development_origin: Url,
    /// Local app server that owns pages, assets and the bypass endpoints.
    pub app_origin: Url,
    /// Deadline for a single upstream call.
    pub timeout: Duration,
    /// Maximum inbound body size in bytes (0 = unlimited).
    pub max_body_size: usize,
}

impl UpstreamConfig {
    /// Creates a configuration with default API origins and limits.
    ///
    /// The default origins are compile-time constants known to parse.
    pub fn new(app_origin: Url) -> Self {
        Self {
            target_override: None,
            production_origin: default_origin(crate::defaults::PRODUCTION_API_ORIGIN),
            development_origin: default_origin(crate::defaults::DEVELOPMENT_API_ORIGIN),
            app_origin,
            timeout: crate::defaults::PROXY_TIMEOUT,
            max_body_size: crate::defaults::MAX_BODY_SIZE,
        }
    }

    /// Resolves the API origin: override first, then the environment default.
    pub fn api_origin(&self, environment: Environment) -> &Url {
        if let Some(target) = &self.target_override {
            return target;
        }
        match environment {
            Environment::Production => &self.production_origin,
            Environment::Development => &self.development_origin,
        }
    }

    /// Returns `true` if the configuration is valid.
    ///
    /// A zero deadline would time out every request.
    pub fn is_valid(&self) -> bool {
        !self.timeout.is_zero()
    }

    /// Get max body size in MB for display.
    pub fn max_body_size_mb(&self) -> String {
        if self.max_body_size == 0 {
            "unlimited".to_string()
        } else {
            (self.max_body_size / 1024 / 1024).to_string()
        }
    }

    /// Convert MB to bytes for internal use.
    pub fn mb_to_bytes(mb: usize) -> usize {
        mb.saturating_mul(1024 * 1024)
    }
}

fn default_origin(origin: &str) -> Url {
    match Url::parse(origin) {
        Ok(url) => url,
        Err(err) => unreachable!("default origin {origin} must parse: {err}"),
    }
}

/// Allow-list and cookie policy, fixed at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostPolicy {
    /// Hosts equal to this domain, or any subdomain of it, are approved.
    pub allowed_domain: String,
    /// `Domain=` cookie attributes at or below this domain are stripped in development.
    pub cookie_domain: String,
    /// `Access-Control-Allow-Origin` fallback when the request has no `Origin`.
    pub cors_default_origin: String,
}

impl Default for HostPolicy {
    fn default() -> Self {
        Self {
            allowed_domain: crate::defaults::ALLOWED_HOST_DOMAIN.to_string(),
            cookie_domain: crate::defaults::COOKIE_DOMAIN.to_string(),
            cors_default_origin: crate::defaults::CORS_DEFAULT_ORIGIN.to_string(),
        }
    }
}

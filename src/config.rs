//! Configuration management for EdgeProxy.
//!
//! This module reads configuration from environment variables exactly once,
//! at startup, into an immutable [`EnvVarConfig`] that is then shared by
//! every request as `Arc<EnvVarConfig>`.
//!
//! Invalid values never abort startup: each one logs a warning and falls
//! back to its default. An unrecognized `NODE_ENV` falls back to
//! production, which disables every development relaxation.
//!
//! # Example
//!
//! ```
//! use edgeproxy::config::EnvVarConfig;
//! use edgeproxy_core::{EnvironmentProvider, UpstreamProvider};
//!
//! let config = EnvVarConfig::from_env("http://127.0.0.1:3000".parse().unwrap());
//! println!("Environment: {}", config.environment());
//! println!("Timeout: {:?}", config.upstream_config().timeout);
//! ```

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;
use url::Url;

use crate::env_vars;
use edgeproxy_core::defaults::{
    ALLOWED_HOST_DOMAIN, COOKIE_DOMAIN, CORS_DEFAULT_ORIGIN, MAX_BODY_SIZE_MB, PROXY_TIMEOUT_SECS,
};
use edgeproxy_core::{
    Environment, EnvironmentProvider, HostPolicy, HostPolicyProvider, UpstreamConfig,
    UpstreamProvider,
};

// ============================================================================
// Internal Helpers
// ============================================================================

/// Reads a variable, treating blank values as unset.
fn non_empty<F>(env_var: &F, var_name: &str) -> Option<String>
where
    F: Fn(&str) -> Result<String, env::VarError>,
{
    env_var(var_name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parses an environment variable with fallback to a default value.
///
/// Logs a warning if the value exists but cannot be parsed.
fn parse_env_var_or_default<F, T>(env_var: &F, var_name: &str, default: T) -> T
where
    F: Fn(&str) -> Result<String, env::VarError>,
    T: FromStr,
{
    match non_empty(env_var, var_name) {
        Some(value) => match value.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(var = var_name, value = %value, "Invalid env var value, using default");
                default
            }
        },
        None => default,
    }
}

/// Parses an origin URL. Anything without a host is rejected.
fn parse_origin(value: &str) -> Option<Url> {
    Url::parse(value)
        .ok()
        .filter(|url| url.host_str().is_some() && matches!(url.scheme(), "http" | "https"))
}

fn origin_or_default<F>(env_var: &F, var_name: &str, default: Url) -> Url
where
    F: Fn(&str) -> Result<String, env::VarError>,
{
    match non_empty(env_var, var_name) {
        Some(value) => parse_origin(&value).unwrap_or_else(|| {
            warn!(var = var_name, value = %value, "Invalid origin URL, using default");
            default
        }),
        None => default,
    }
}

fn string_or_default<F>(env_var: &F, var_name: &str, default: &str) -> String
where
    F: Fn(&str) -> Result<String, env::VarError>,
{
    non_empty(env_var, var_name).unwrap_or_else(|| default.to_string())
}

/// Computes the deployment environment. Unset means production.
fn compute_environment<F>(env_var: &F) -> Environment
where
    F: Fn(&str) -> Result<String, env::VarError>,
{
    match non_empty(env_var, env_vars::NODE_ENV) {
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!(
                var = env_vars::NODE_ENV,
                value = %value,
                "Unrecognized environment, falling back to production"
            );
            Environment::Production
        }),
        None => Environment::Production,
    }
}

/// Computes upstream configuration from environment variables.
fn compute_upstream_config<F>(env_var: &F, app_origin: Url) -> UpstreamConfig
where
    F: Fn(&str) -> Result<String, env::VarError>,
{
    let defaults = UpstreamConfig::new(app_origin);

    let target_override = non_empty(env_var, env_vars::API_PROXY_TARGET).and_then(|value| {
        let parsed = parse_origin(&value);
        if parsed.is_none() {
            warn!(
                var = env_vars::API_PROXY_TARGET,
                value = %value,
                "Invalid API target override, ignoring"
            );
        }
        parsed
    });

    let timeout_secs =
        parse_env_var_or_default(env_var, env_vars::PROXY_TIMEOUT_SECS, PROXY_TIMEOUT_SECS);
    let max_body_mb =
        parse_env_var_or_default(env_var, env_vars::MAX_BODY_SIZE_MB, MAX_BODY_SIZE_MB);

    let config = UpstreamConfig {
        target_override,
        production_origin: origin_or_default(
            env_var,
            env_vars::API_PRODUCTION_ORIGIN,
            defaults.production_origin.clone(),
        ),
        development_origin: origin_or_default(
            env_var,
            env_vars::API_DEVELOPMENT_ORIGIN,
            defaults.development_origin.clone(),
        ),
        app_origin: defaults.app_origin.clone(),
        timeout: Duration::from_secs(timeout_secs),
        max_body_size: UpstreamConfig::mb_to_bytes(max_body_mb),
    };

    // Validate configuration
    if !config.is_valid() {
        warn!("Invalid proxy timeout, using default");
        return UpstreamConfig {
            timeout: defaults.timeout,
            ..config
        };
    }

    config
}

/// Computes the host policy from environment variables.
fn compute_host_policy<F>(env_var: &F) -> HostPolicy
where
    F: Fn(&str) -> Result<String, env::VarError>,
{
    HostPolicy {
        allowed_domain: string_or_default(
            env_var,
            env_vars::ALLOWED_HOST_DOMAIN,
            ALLOWED_HOST_DOMAIN,
        )
        .to_ascii_lowercase(),
        cookie_domain: string_or_default(env_var, env_vars::COOKIE_DOMAIN, COOKIE_DOMAIN)
            .trim_start_matches('.')
            .to_ascii_lowercase(),
        cors_default_origin: string_or_default(
            env_var,
            env_vars::CORS_DEFAULT_ORIGIN,
            CORS_DEFAULT_ORIGIN,
        ),
    }
}

// ============================================================================
// EnvVarConfig - ConfigProvider implementation using environment variables
// ============================================================================

/// Configuration provider that reads from environment variables.
///
/// This is the default configuration provider for the EdgeProxy CLI. Values
/// are read once at construction and never change afterwards.
#[derive(Clone, Debug)]
pub struct EnvVarConfig {
    environment: Environment,
    upstream: UpstreamConfig,
    policy: HostPolicy,
}

impl EnvVarConfig {
    /// Creates a configuration provider from the process environment.
    ///
    /// `app_origin` comes from the command line, not the environment.
    pub fn from_env(app_origin: Url) -> Self {
        Self::from_lookup(app_origin, |key| env::var(key))
    }

    /// Creates a configuration provider from an arbitrary variable lookup.
    pub fn from_lookup<F>(app_origin: Url, env_var: F) -> Self
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        Self {
            environment: compute_environment(&env_var),
            upstream: compute_upstream_config(&env_var, app_origin),
            policy: compute_host_policy(&env_var),
        }
    }
}

impl EnvironmentProvider for EnvVarConfig {
    fn environment(&self) -> Environment {
        self.environment
    }
}

impl UpstreamProvider for EnvVarConfig {
    fn upstream_config(&self) -> &UpstreamConfig {
        &self.upstream
    }
}

impl HostPolicyProvider for EnvVarConfig {
    fn host_policy(&self) -> &HostPolicy {
        &self.policy
    }
}

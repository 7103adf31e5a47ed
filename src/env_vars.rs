//! Environment variable names used throughout EdgeProxy configuration

/// Deployment environment (`production` / `development`)
pub const NODE_ENV: &str = "NODE_ENV";

/// API origin selection
pub const API_PROXY_TARGET: &str = "API_PROXY_TARGET";
pub const API_PRODUCTION_ORIGIN: &str = "API_PRODUCTION_ORIGIN";
pub const API_DEVELOPMENT_ORIGIN: &str = "API_DEVELOPMENT_ORIGIN";

/// Host allow-list and cookie policy
pub const ALLOWED_HOST_DOMAIN: &str = "ALLOWED_HOST_DOMAIN";
pub const COOKIE_DOMAIN: &str = "COOKIE_DOMAIN";
pub const CORS_DEFAULT_ORIGIN: &str = "CORS_DEFAULT_ORIGIN";

/// Proxy behavior configuration
pub const PROXY_TIMEOUT_SECS: &str = "PROXY_TIMEOUT_SECS";
pub const MAX_BODY_SIZE_MB: &str = "MAX_BODY_SIZE_MB";

/// Get all environment variable names for documentation/validation
pub fn all_env_vars() -> &'static [&'static str] {
    &[
        NODE_ENV,
        API_PROXY_TARGET,
        API_PRODUCTION_ORIGIN,
        API_DEVELOPMENT_ORIGIN,
        ALLOWED_HOST_DOMAIN,
        COOKIE_DOMAIN,
        CORS_DEFAULT_ORIGIN,
        PROXY_TIMEOUT_SECS,
        MAX_BODY_SIZE_MB,
    ]
}

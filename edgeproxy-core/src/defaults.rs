//! Default configuration values for the edge proxy.
//!
//! Centralized so production code and tests agree on the same values.

use std::time::Duration;

/// Default API origin when running in production.
pub const PRODUCTION_API_ORIGIN: &str = "https://finance.bhenning.com";

/// Default API origin when running in development.
pub const DEVELOPMENT_API_ORIGIN: &str = "https://finance.bhenning.com";

/// Default allow-list domain (hosts equal to it or below it are approved).
pub const ALLOWED_HOST_DOMAIN: &str = "vercel.bhenning.com";

/// Default domain whose `Domain=` cookie attributes are stripped in development.
pub const COOKIE_DOMAIN: &str = "bhenning.com";

/// `Access-Control-Allow-Origin` value used when a request carries no `Origin`.
pub const CORS_DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Default upstream deadline in seconds.
pub const PROXY_TIMEOUT_SECS: u64 = 30;

/// Default upstream deadline.
pub const PROXY_TIMEOUT: Duration = Duration::from_secs(PROXY_TIMEOUT_SECS);

/// Default maximum inbound body size in megabytes.
pub const MAX_BODY_SIZE_MB: usize = 100;

/// Default maximum inbound body size in bytes.
pub const MAX_BODY_SIZE: usize = MAX_BODY_SIZE_MB * 1024 * 1024;

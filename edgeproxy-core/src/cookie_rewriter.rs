//! Development-only `Set-Cookie` rewriting.
//!
//! A browser talking to `http://localhost` cannot store a `Secure` cookie,
//! a `SameSite=None` cookie, or one scoped to the production domain. When a
//! local client authenticates against the remote backend through the proxy,
//! auth and CSRF cookies are relaxed so the session works locally.
//!
//! The rewrite only happens when *all* of these hold:
//! - the process runs in [`Environment::Development`]
//! - the inbound Host is a loopback host
//! - the inbound Host is not on the allow-list domain
//! - the cookie is an auth (`token`, `session`, `auth`) or CSRF (`XSRF-TOKEN`) cookie
//!
//! Every other `Set-Cookie` value is relayed byte-for-byte. Rewritten values
//! are re-serialized by the [`cookie`] crate in its canonical attribute order;
//! attributes that crate does not model are dropped.

use cookie::{Cookie, SameSite};
use hyper::HeaderMap;
use hyper::header::{HeaderValue, SET_COOKIE};
use tracing::debug;

use crate::host_validator::{is_host_or_subdomain, is_localhost, is_vercel_host};
use crate::types::{Environment, HostPolicy};

/// Cookie names treated as authentication cookies (case-insensitive).
const AUTH_COOKIE_NAMES: &[&str] = &["token", "session", "auth"];

/// Cookie name of the CSRF token (case-sensitive).
const CSRF_COOKIE_NAME: &str = "XSRF-TOKEN";

/// Rewrite eligibility class, derived from the cookie name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CookieClass {
    /// Session or bearer token cookie.
    Auth,
    /// Anti-CSRF token cookie.
    Csrf,
    /// Anything else; never rewritten.
    Other,
}

impl CookieClass {
    /// Classifies a cookie by name.
    pub fn from_name(name: &str) -> Self {
        if AUTH_COOKIE_NAMES
            .iter()
            .any(|auth| auth.eq_ignore_ascii_case(name))
        {
            Self::Auth
        } else if name == CSRF_COOKIE_NAME {
            Self::Csrf
        } else {
            Self::Other
        }
    }

    /// Returns `true` for the classes the rewriter may touch.
    pub fn is_rewritable(self) -> bool {
        matches!(self, Self::Auth | Self::Csrf)
    }
}

/// Applies the local-development relaxations: drop a `Domain` scoped to
/// `cookie_domain`, drop `Secure`, downgrade `SameSite=None|Strict` to `Lax`.
///
/// # Example
///
/// ```
/// use cookie::Cookie;
/// use edgeproxy_core::cookie_rewriter::relax_for_local_development;
///
/// let mut cookie = Cookie::parse("token=abc; Domain=.bhenning.com; Secure").unwrap();
/// relax_for_local_development(&mut cookie, "bhenning.com");
/// assert_eq!(cookie.domain(), None);
/// assert_eq!(cookie.secure(), None);
/// ```
pub fn relax_for_local_development(cookie: &mut Cookie<'_>, cookie_domain: &str) {
    if cookie
        .domain()
        .is_some_and(|domain| is_host_or_subdomain(domain.trim_start_matches('.'), cookie_domain))
    {
        cookie.unset_domain();
    }

    cookie.set_secure(None);

    if matches!(cookie.same_site(), Some(SameSite::None | SameSite::Strict)) {
        cookie.set_same_site(SameSite::Lax);
    }
}

/// Returns `true` if responses to this request may have cookies rewritten.
pub fn is_rewrite_context(
    environment: Environment,
    request_host: Option<&str>,
    policy: &HostPolicy,
) -> bool {
    environment.is_development()
        && request_host.is_some_and(|host| is_localhost(host) && !is_vercel_host(host, policy))
}

/// Rewrites a single `Set-Cookie` value if it is an auth or CSRF cookie.
///
/// The caller must already have checked [`is_rewrite_context`]. Returns
/// `None` when the value must be relayed unchanged.
pub fn rewrite_set_cookie(raw: &str, policy: &HostPolicy) -> Option<String> {
    let mut cookie = Cookie::parse(raw).ok()?;
    if !CookieClass::from_name(cookie.name()).is_rewritable() {
        return None;
    }
    relax_for_local_development(&mut cookie, &policy.cookie_domain);
    Some(cookie.to_string())
}

/// Rewrites every eligible `Set-Cookie` header in place.
///
/// Header order is preserved and non-eligible values are kept as the exact
/// bytes the upstream sent. Returns the number of cookies rewritten.
pub fn rewrite_response_cookies(
    headers: &mut HeaderMap,
    environment: Environment,
    request_host: Option<&str>,
    policy: &HostPolicy,
) -> usize {
    if !is_rewrite_context(environment, request_host, policy) || !headers.contains_key(SET_COOKIE)
    {
        return 0;
    }

    let originals: Vec<HeaderValue> = headers.get_all(SET_COOKIE).iter().cloned().collect();
    headers.remove(SET_COOKIE);

    let mut rewritten = 0;
    for original in originals {
        let replacement = original
            .to_str()
            .ok()
            .and_then(|raw| rewrite_set_cookie(raw, policy))
            .and_then(|cookie| HeaderValue::from_str(&cookie).ok());

        match replacement {
            Some(value) => {
                rewritten += 1;
                headers.append(SET_COOKIE, value);
            }
            None => {
                headers.append(SET_COOKIE, original);
            }
        }
    }

    if rewritten > 0 {
        debug!(count = rewritten, "Rewrote cookies for local development");
    }
    rewritten
}

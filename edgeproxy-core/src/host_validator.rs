//! Host and Origin allow-list validation.
//!
//! Every check here is a pure function over strings. Matching is never
//! substring based: a host is approved only when it *equals* an allowed
//! value, or ends with `"." + domain` where the dot sits exactly at the
//! label boundary. That single rule rejects both suffix attacks
//! (`vercel.bhenning.com.evil.com`) and prefix attacks
//! (`evilvercel.bhenning.com`).
//!
//! # Internationalized hosts
//!
//! Unicode hosts are not normalized. A homograph such as a Cyrillic `о` in
//! place of the Latin `o` is simply a different string and fails to match
//! the ASCII allow-list entry. Origins that go through URL parsing are
//! IDNA-encoded to `xn--` labels, which fail the same way.

use url::Url;

use crate::types::HostPolicy;

/// Canonical spellings of the loopback host.
const LOCALHOST_NAMES: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0", "::1"];

/// Strips a trailing `:port`, unwraps `[...]` IPv6 literals and lowercases.
///
/// A bare IPv6 literal (`::1`) keeps its colons: only a host with exactly
/// one colon followed by at least one digit is treated as `host:port`.
fn normalize_host(host: &str) -> String {
    let host = host.trim();

    let without_port = if let Some(rest) = host.strip_prefix('[') {
        match rest.split_once(']') {
            Some((inner, tail)) if tail.is_empty() || is_port_suffix(tail) => inner,
            _ => host,
        }
    } else {
        match host.rsplit_once(':') {
            Some((name, port)) if !name.contains(':') && is_port(port) => name,
            _ => host,
        }
    };

    without_port.to_ascii_lowercase()
}

fn is_port_suffix(tail: &str) -> bool {
    tail.strip_prefix(':').is_some_and(is_port)
}

/// A non-empty run of ASCII digits.
fn is_port(port: &str) -> bool {
    !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())
}

/// Extracts the hostname from an origin, falling back to the raw string.
fn origin_host(origin: &str) -> String {
    match Url::parse(origin.trim()) {
        Ok(url) => match url.host_str() {
            Some(host) => host.to_string(),
            None => origin.to_string(),
        },
        Err(_) => origin.to_string(),
    }
}

/// Returns `true` if `host` is one of the canonical loopback names.
///
/// The value is normalized first (port stripped, IPv6 brackets removed,
/// lowercased) and then compared for exact equality.
///
/// # Example
///
/// ```
/// use edgeproxy_core::host_validator::is_localhost;
///
/// assert!(is_localhost("localhost:3000"));
/// assert!(is_localhost("[::1]:8080"));
/// assert!(!is_localhost("localhost.evil.com"));
/// ```
pub fn is_localhost(host: &str) -> bool {
    let normalized = normalize_host(host);
    LOCALHOST_NAMES.contains(&normalized.as_str())
}

/// Returns `true` if `host` equals `domain` or is a subdomain of it.
///
/// Both sides are port-stripped and lowercased. The subdomain case requires
/// the byte immediately before the matched suffix to be a `.`.
///
/// # Example
///
/// ```
/// use edgeproxy_core::host_validator::is_host_or_subdomain;
///
/// assert!(is_host_or_subdomain("preview.vercel.bhenning.com", "vercel.bhenning.com"));
/// assert!(!is_host_or_subdomain("vercel.bhenning.com.evil.com", "vercel.bhenning.com"));
/// assert!(!is_host_or_subdomain("evilvercel.bhenning.com", "vercel.bhenning.com"));
/// ```
pub fn is_host_or_subdomain(host: &str, domain: &str) -> bool {
    let host = normalize_host(host);
    let domain = normalize_host(domain);

    if host.is_empty() || domain.is_empty() {
        return false;
    }
    if host == domain {
        return true;
    }

    host.len() > domain.len()
        && host.ends_with(&domain)
        && host.as_bytes()[host.len() - domain.len() - 1] == b'.'
}

/// Returns `true` if the origin's hostname is `domain` or a subdomain of it.
pub fn is_origin_for_domain(origin: &str, domain: &str) -> bool {
    is_host_or_subdomain(&origin_host(origin), domain)
}

/// Returns `true` if the origin's hostname is a loopback name.
pub fn is_localhost_origin(origin: &str) -> bool {
    is_localhost(&origin_host(origin))
}

/// Returns `true` if `host` belongs to the configured allow-list domain.
pub fn is_vercel_host(host: &str, policy: &HostPolicy) -> bool {
    is_host_or_subdomain(host, &policy.allowed_domain)
}

/// Returns `true` if `host` is loopback or on the allow-list domain.
pub fn is_approved_host(host: &str, policy: &HostPolicy) -> bool {
    is_localhost(host) || is_vercel_host(host, policy)
}

/// Returns `true` if `origin` is a loopback origin or on the allow-list domain.
pub fn is_approved_origin(origin: &str, policy: &HostPolicy) -> bool {
    is_localhost_origin(origin) || is_origin_for_domain(origin, &policy.allowed_domain)
}

//! Request path routing.
//!
//! A single ordered table decides, once per request, what the proxy does
//! with a path. The first matching route wins:
//!
//! 1. Local-only API endpoints: [`PathClassification::Bypass`]
//! 2. `/api/*` and `/graphql`: [`PathClassification::Proxied`]
//! 3. Framework assets and static files: [`PathClassification::StaticAsset`]
//! 4. Everything else: [`PathClassification::DynamicPage`]
//!
//! Paths are matched raw (not percent-decoded), so an encoded spelling of a
//! bypass endpoint falls through to `Proxied` and is host-checked.

use once_cell::sync::Lazy;

/// What the proxy does with a request, decided from its path alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathClassification {
    /// Local-only endpoint: relayed to the app untouched, no host validation.
    Bypass,
    /// Backend API call: host-validated and forwarded to the API origin.
    Proxied,
    /// Static file or framework asset: relayed to the app untouched.
    StaticAsset,
    /// Rendered page: host-validated, relayed to the app with
    /// `Cache-Control: no-store` forced.
    DynamicPage,
}

impl PathClassification {
    /// Short label for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bypass => "bypass",
            Self::Proxied => "proxied",
            Self::StaticAsset => "static",
            Self::DynamicPage => "page",
        }
    }

    /// Returns `true` for the classes that must pass host validation in
    /// development.
    pub fn is_host_checked(self) -> bool {
        matches!(self, Self::Proxied | Self::DynamicPage)
    }
}

/// Endpoints served by the app itself. Exact match only.
pub const BYPASS_PATHS: &[&str] = &[
    "/api/nhl",
    "/api/nba",
    "/api/mlb",
    "/api/nfl",
    "/api/celsius",
    "/api/fahrenheit",
    "/api/lead",
    "/api/player-ads",
    "/api/player-analytics",
    "/api/player-heartbeat",
    "/api/player-metadata",
    "/api/weather",
    "/api/uuid",
    "/api/human",
    "/api/health",
];

/// The one bypass endpoint that also owns its sub-paths.
pub const BYPASS_PREFIXES: &[&str] = &["/api/uuid/"];

/// Internal framework asset prefixes.
pub const STATIC_PREFIXES: &[&str] = &["/_next/"];

/// File extensions served as static assets (compared case-insensitively).
pub const STATIC_EXTENSIONS: &[&str] = &[
    "avif",
    "css",
    "eot",
    "gif",
    "ico",
    "jpeg",
    "jpg",
    "js",
    "json",
    "map",
    "mjs",
    "otf",
    "png",
    "svg",
    "ttf",
    "txt",
    "webmanifest",
    "webp",
    "woff",
    "woff2",
    "xml",
];

#[derive(Debug)]
enum Matcher {
    Exact(&'static str),
    Prefix(&'static str),
    Extension(&'static [&'static str]),
}

impl Matcher {
    fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(expected) => path == *expected,
            Self::Prefix(prefix) => path.starts_with(prefix),
            Self::Extension(extensions) => file_extension(path).is_some_and(|ext| {
                extensions
                    .iter()
                    .any(|candidate| candidate.eq_ignore_ascii_case(ext))
            }),
        }
    }
}

#[derive(Debug)]
struct Route {
    matcher: Matcher,
    classification: PathClassification,
}

/// Ordered routing table; the first matching route wins.
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Builds the table for this deployment.
    pub fn standard() -> Self {
        let mut routes = Vec::new();

        for path in BYPASS_PATHS.iter().copied() {
            routes.push(Route {
                matcher: Matcher::Exact(path),
                classification: PathClassification::Bypass,
            });
        }
        for prefix in BYPASS_PREFIXES.iter().copied() {
            routes.push(Route {
                matcher: Matcher::Prefix(prefix),
                classification: PathClassification::Bypass,
            });
        }

        routes.push(Route {
            matcher: Matcher::Prefix("/api/"),
            classification: PathClassification::Proxied,
        });
        routes.push(Route {
            matcher: Matcher::Exact("/graphql"),
            classification: PathClassification::Proxied,
        });

        for prefix in STATIC_PREFIXES.iter().copied() {
            routes.push(Route {
                matcher: Matcher::Prefix(prefix),
                classification: PathClassification::StaticAsset,
            });
        }
        routes.push(Route {
            matcher: Matcher::Extension(STATIC_EXTENSIONS),
            classification: PathClassification::StaticAsset,
        });

        Self { routes }
    }

    /// Classifies a request path. The path is normalized first.
    pub fn classify(&self, path: &str) -> PathClassification {
        let path = normalize_path(path);
        self.routes
            .iter()
            .find(|route| route.matcher.matches(path))
            .map_or(PathClassification::DynamicPage, |route| route.classification)
    }
}

static ROUTES: Lazy<RouteTable> = Lazy::new(RouteTable::standard);

/// Classifies a request path against the standard routing table.
///
/// # Example
///
/// ```
/// use edgeproxy_core::path_classifier::{classify, PathClassification};
///
/// assert_eq!(classify("/api/health"), PathClassification::Bypass);
/// assert_eq!(classify("/api/transaction/active"), PathClassification::Proxied);
/// assert_eq!(classify("/_next/static/chunk.js"), PathClassification::StaticAsset);
/// assert_eq!(classify("/finance"), PathClassification::DynamicPage);
/// ```
pub fn classify(path: &str) -> PathClassification {
    ROUTES.classify(path)
}

/// Strips trailing slashes, keeping the root path as `/`.
pub fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

fn file_extension(path: &str) -> Option<&str> {
    let segment = path.rsplit('/').next()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext)
}

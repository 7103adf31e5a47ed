//! Command line argument parsing for EdgeProxy.
//!
//! This module defines the CLI interface using [`clap`] for argument parsing.
//! It provides the listen address, the app origin and output verbosity.
//! Everything else is read from the environment (see [`crate::env_vars`]).
//!
//! # Example
//!
//! ```no_run
//! use edgeproxy::args::Args;
//! use clap::Parser;
//!
//! let args = Args::parse();
//! if let Err(e) = args.validate() {
//!     eprintln!("Configuration error: {}", e);
//!     std::process::exit(1);
//! }
//! ```

use clap::Parser;
use url::Url;

/// Command line arguments for EdgeProxy.
///
/// # Fields
///
/// * `bind` - Address to bind for listening (default: "0.0.0.0")
/// * `listen` - Port to listen on for incoming requests
/// * `app_port` - Port of the local app origin (pages, assets, local APIs)
/// * `app_origin` - Full app origin URL, overrides `app_port`
/// * `verbose` - Enable detailed configuration output
/// * `quiet` - Suppress non-essential output (conflicts with verbose)
/// * `json_logs` - Output logs in JSON format for structured logging
#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(
    long_about = "Edge proxy in front of a web app and a finance API\nRoutes API calls to the backend, relays pages and assets to the app\n\nExample usage:\n  edgeproxy --listen 8080 --app-port 3000\n  edgeproxy -l 8080 --app-origin http://10.0.0.5:3000 --verbose"
)]
#[command(
    after_help = "Environment variables:\n  NODE_ENV               production (default) or development\n  API_PROXY_TARGET       Explicit API origin (overrides the two below)\n  API_PRODUCTION_ORIGIN  Production API origin\n  API_DEVELOPMENT_ORIGIN Development API origin\n  ALLOWED_HOST_DOMAIN    Allow-listed host domain (development checks)\n  COOKIE_DOMAIN          Cookie domain stripped for localhost\n  CORS_DEFAULT_ORIGIN    Default Access-Control-Allow-Origin\n  PROXY_TIMEOUT_SECS     Upstream timeout (default: 30)\n  MAX_BODY_SIZE_MB       Request body limit, 0 = unlimited (default: 100)"
)]
pub struct Args {
    /// Address to bind to
    #[arg(
        long,
        short = 'b',
        help = "Bind address for listening (also the app host when only --app-port is given)",
        value_name = "ADDRESS",
        default_value = "0.0.0.0"
    )]
    pub bind: String,

    /// Port to listen on for incoming requests
    #[arg(
        long,
        short = 'l',
        help = "Listen port for incoming connections",
        value_name = "PORT"
    )]
    pub listen: u16,

    /// Port of the app origin
    #[arg(
        long,
        short = 'a',
        help = "Port of the local app origin",
        value_name = "PORT",
        required_unless_present = "app_origin"
    )]
    pub app_port: Option<u16>,

    /// Full app origin URL
    #[arg(
        long,
        help = "App origin URL (e.g. http://127.0.0.1:3000), overrides --app-port",
        value_name = "URL"
    )]
    pub app_origin: Option<String>,

    /// Enable verbose output
    #[arg(
        long,
        short = 'v',
        help = "Show detailed configuration and startup information"
    )]
    pub verbose: bool,

    /// Enable quiet mode (minimal output)
    #[arg(
        long,
        short = 'q',
        help = "Suppress configuration output, show only essential messages",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Output logs in JSON format (for structured logging)
    #[arg(long, help = "Output logs in JSON format for structured logging")]
    pub json_logs: bool,
}

impl Args {
    /// Validates the parsed command line arguments.
    ///
    /// Performs the following validations:
    /// - Listen port must be greater than 0
    /// - Listen and app ports must be different
    /// - Bind address must be a valid IP address
    /// - App origin must be an http(s) URL with a host
    ///
    /// # Example
    ///
    /// ```
    /// use edgeproxy::args::Args;
    /// use clap::Parser;
    ///
    /// // Same listen and app ports would loop back into the proxy
    /// let args = Args::try_parse_from(["edgeproxy", "-l", "8080", "-a", "8080"]).unwrap();
    /// assert!(args.validate().is_err());
    ///
    /// // Valid configuration
    /// let args = Args::try_parse_from(["edgeproxy", "-l", "8080", "-a", "3000"]).unwrap();
    /// assert!(args.validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<(), String> {
        if self.listen == 0 || self.app_port == Some(0) {
            return Err("Ports must be greater than 0".to_string());
        }

        // Validate bind address format
        if self.bind.parse::<std::net::IpAddr>().is_err() {
            return Err(format!("Invalid bind address: '{}'", self.bind));
        }

        if self.app_origin.is_none() && self.app_port == Some(self.listen) {
            return Err("Listen and app ports cannot be the same".to_string());
        }

        self.app_origin_url().map(|_| ())
    }

    /// Resolves the app origin URL.
    ///
    /// `--app-origin` wins; otherwise the app is assumed on the bind host,
    /// with a wildcard bind mapped to loopback.
    pub fn app_origin_url(&self) -> Result<Url, String> {
        if let Some(origin) = &self.app_origin {
            let url =
                Url::parse(origin).map_err(|e| format!("Invalid app origin '{origin}': {e}"))?;
            if url.host_str().is_none() || !matches!(url.scheme(), "http" | "https") {
                return Err(format!(
                    "Invalid app origin '{origin}': expected http(s)://host[:port]"
                ));
            }
            return Ok(url);
        }

        let port = self
            .app_port
            .ok_or_else(|| "Either --app-port or --app-origin is required".to_string())?;
        let host = match self.bind.parse::<std::net::IpAddr>() {
            Ok(ip) if ip.is_unspecified() && ip.is_ipv6() => "[::1]".to_string(),
            Ok(ip) if ip.is_unspecified() => "127.0.0.1".to_string(),
            Ok(std::net::IpAddr::V6(ip)) => format!("[{ip}]"),
            Ok(ip) => ip.to_string(),
            Err(_) => return Err(format!("Invalid bind address: '{}'", self.bind)),
        };
        Url::parse(&format!("http://{host}:{port}")).map_err(|e| format!("Invalid app origin: {e}"))
    }
}

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use edgeproxy::args::Args;
use edgeproxy::config::EnvVarConfig;
use edgeproxy::server;
use edgeproxy_core::{ProxyMiddleware, ReqwestTransport};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins; otherwise `--verbose` means debug, `--quiet` means warn.
fn init_tracing(args: &Args) {
    let default_level = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if args.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Validate arguments
    if let Err(err) = args.validate() {
        eprintln!("❌ Configuration error: {err}");
        std::process::exit(1);
    }

    init_tracing(&args);

    let app_origin = match args.app_origin_url() {
        Ok(url) => url,
        Err(err) => {
            eprintln!("❌ Configuration error: {err}");
            std::process::exit(1);
        }
    };
    let config = Arc::new(EnvVarConfig::from_env(app_origin));

    server::print_startup_info(&args, config.as_ref());

    let transport = match ReqwestTransport::new() {
        Ok(transport) => transport,
        Err(err) => {
            eprintln!("❌ Failed to build HTTP client: {err}");
            std::process::exit(1);
        }
    };
    let middleware = Arc::new(ProxyMiddleware::new(config, transport));

    // Bind to address
    let bind_addr = match args.bind.parse::<std::net::IpAddr>() {
        Ok(ip) => SocketAddr::from((ip, args.listen)),
        Err(err) => {
            eprintln!("❌ Invalid bind address '{}': {err}", args.bind);
            std::process::exit(1);
        }
    };
    let listener = match TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(addr = %bind_addr, error = %err, "Failed to bind");
            eprintln!("❌ Failed to bind to port {}: {}", args.listen, err);
            std::process::exit(1);
        }
    };

    info!(addr = %bind_addr, "EdgeProxy is running");
    if !args.quiet {
        println!("✅ EdgeProxy is running on port {}", args.listen);
    }

    let shutdown = CancellationToken::new();
    tokio::spawn(server::cancel_on_ctrl_c(shutdown.clone()));

    server::serve(listener, middleware, shutdown).await;
}

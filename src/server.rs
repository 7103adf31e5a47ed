//! Server lifecycle: startup banner, accept loop and graceful shutdown.

use std::env;
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::{args::Args, env_vars};
use edgeproxy_core::{ConfigProvider, Environment, HttpTransport, ProxyMiddleware, handle_request};

/// How long in-flight connections may run after shutdown is requested.
pub const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(30);

/// Print startup banner with configuration
pub fn print_startup_info<C: ConfigProvider>(args: &Args, config: &C) {
    let environment = config.environment();

    if args.quiet {
        // Quiet mode: only essential information
        println!(
            "🚀 EdgeProxy v{} starting on port {} ({})",
            env!("CARGO_PKG_VERSION"),
            args.listen,
            environment
        );
        return;
    }

    // Normal/verbose mode: full configuration display
    println!("🛡️  {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    println!("   {}", env!("CARGO_PKG_DESCRIPTION"));
    println!();
    println!("📡 Network Configuration:");
    println!("   Listen:         {}:{}", args.bind, args.listen);
    println!("   Environment:    {}", environment);
    println!();

    let upstream = config.upstream_config();
    println!("🔧 Upstream Configuration:");
    println!("   App Origin:     {}", upstream.app_origin);
    println!("   API Origin:     {}", upstream.api_origin(environment));
    if upstream.target_override.is_some() {
        println!("   Override:       active ({})", env_vars::API_PROXY_TARGET);
    }
    println!("   Timeout:        {} seconds", upstream.timeout.as_secs());
    println!("   Max Body Size:  {} MB", upstream.max_body_size_mb());

    // Show security configuration
    print_security_config(config);

    // Show environment configuration in verbose mode
    if args.verbose {
        print_env_config();
    }

    println!();
    println!("🚀 Server starting...");
}

/// Print host policy summary
fn print_security_config<C: ConfigProvider>(config: &C) {
    let policy = config.host_policy();

    println!();
    println!("🔒 Security Configuration:");
    match config.environment() {
        Environment::Development => {
            println!("   Host Checks:    localhost + {}", policy.allowed_domain);
            println!("   Cookie Rewrite: {} cookies relaxed for localhost", policy.cookie_domain);
            println!("   CORS:           enabled (default {})", policy.cors_default_origin);
        }
        Environment::Production => {
            println!("   Host Checks:    delegated to the hosting edge");
            println!("   Cookie Rewrite: disabled");
            println!("   CORS:           disabled");
        }
    }
}

/// Print environment variable configuration status (used in verbose mode)
fn print_env_config() {
    println!();
    println!("🔧 Environment Variables:");

    for &var_name in env_vars::all_env_vars() {
        match env::var(var_name) {
            Ok(value) => {
                // Mask the override target
                let display_value = if var_name == env_vars::API_PROXY_TARGET {
                    "[CONFIGURED]".to_string()
                } else {
                    value
                };
                println!("   {:<25} = {}", var_name, display_value);
            }
            Err(_) => {
                println!("   {:<25} = [NOT SET]", var_name);
            }
        }
    }
}

/// Accepts connections until `shutdown` is cancelled, then drains them.
///
/// Each connection is served on its own tracked task. After shutdown the
/// listener is dropped, idle keep-alive connections are told to close, and
/// in-flight requests get [`SHUTDOWN_GRACE_PERIOD`] to finish.
pub async fn serve<C, T>(
    listener: TcpListener,
    middleware: Arc<ProxyMiddleware<C, T>>,
    shutdown: CancellationToken,
) where
    C: ConfigProvider + 'static,
    T: HttpTransport + 'static,
{
    let tracker = TaskTracker::new();

    loop {
        let (stream, addr) = tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(err) => {
                    warn!(error = %err, "Failed to accept connection");
                    continue;
                }
            },
        };

        debug!(client = %addr, "New connection");

        let io = TokioIo::new(stream);
        let middleware = middleware.clone();
        let shutdown = shutdown.clone();

        tracker.spawn(async move {
            let service = service_fn(move |req| handle_request(req, middleware.clone()));
            let conn = http1::Builder::new().serve_connection(io, service);
            tokio::pin!(conn);

            let result = tokio::select! {
                result = conn.as_mut() => result,
                () = shutdown.cancelled() => {
                    conn.as_mut().graceful_shutdown();
                    conn.await
                }
            };

            if let Err(err) = result {
                debug!(client = %addr, error = %err, "Connection error");
            }
        });
    }

    drop(listener);
    tracker.close();
    info!(pending = tracker.len(), "Shutting down, draining connections");

    tokio::select! {
        () = tracker.wait() => info!("All connections closed"),
        () = tokio::time::sleep(SHUTDOWN_GRACE_PERIOD) => {
            warn!(pending = tracker.len(), "Grace period expired, exiting with open connections");
        }
    }
}

/// Cancels `token` on the first Ctrl-C.
pub async fn cancel_on_ctrl_c(token: CancellationToken) {
    cancel_on_signal(tokio::signal::ctrl_c(), token).await;
}

/// Cancels `token` once `signal` fires.
///
/// A signal listener that fails to install never triggers shutdown; the
/// server keeps running and can still be stopped by other means.
async fn cancel_on_signal<S>(signal: S, token: CancellationToken)
where
    S: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            info!("Received ctrl-c signal, shutting down");
            token.cancel();
        }
        Err(err) => {
            warn!(error = %err, "Failed to listen for ctrl-c, graceful shutdown disabled");
            std::future::pending::<()>().await;
        }
    }
}

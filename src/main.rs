//! forwarder: single-backend rewriting reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ /ping ──▶ "pong"
//!     │
//!     └──▶ ProxyForwarder ──▶ InterceptingTransport ──▶ HyperTransport ──▶ Backend
//!          (retarget, request        (gunzip, buffer, rewrite,
//!           header rewrite)           Content-Length)
//! ```
//!
//! Configuration comes from `FORWARDER_*` environment variables, optionally
//! layered over a TOML file named by `FORWARDER_CONFIG`.

use std::ffi::OsString;

use clap::Parser;
use tokio::net::TcpListener;

use forwarder::config::{load_config, validate_config};
use forwarder::lifecycle::{shutdown_signal, Shutdown};
use forwarder::observability::{logging, metrics};
use forwarder::{version_banner, HttpServer};

#[derive(Parser)]
#[command(name = "forwarder", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Any argument prints the version and exits without serving.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<OsString>,
}

/// Whether the process was started with any argument at all.
///
/// clap swallows a bare `--`, so the raw argument list decides.
fn version_only(argv: &[OsString]) -> bool {
    argv.len() > 1
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<OsString> = std::env::args_os().collect();
    let cli = Cli::parse_from(&argv);
    println!("{}", version_banner());
    if version_only(&argv) || !cli.args.is_empty() {
        return Ok(());
    }

    let config = load_config()?;
    logging::init_logging(&config.observability.log_level);

    let settings = match validate_config(&config) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    tracing::info!(
        listen_address = %settings.listen_address,
        backend = %settings.backend,
        "Configuration loaded"
    );
    tracing::info!(replace = %settings.rules.response, "Response substitutions");
    tracing::info!(request_replace = %settings.rules.request, "Request header substitutions");
    tracing::info!(
        exclude_extensions = ?settings.rules.excluded.extensions(),
        "Extensions excluded from rewriting"
    );

    if let Some(addr) = settings.metrics_address {
        metrics::init_metrics(addr);
    }

    let listener = TcpListener::bind(settings.listen_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    HttpServer::new(settings).run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

//! Component server binary.
//!
//! ```text
//!     Client ──▶ http::server ──▶ routing::Router ──┬─▶ static file
//!                                                  ├─▶ execution (components)
//!                                                  └─▶ handlers::remote (upstream)
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use component_server::component::TemplateEngine;
use component_server::config::{load_config, ConfigWatcher, ServerConfig};
use component_server::lifecycle::{wait_for_signal, Shutdown};
use component_server::observability::{logging, metrics};
use component_server::{HandlerPlugins, HttpServer};

#[derive(Debug, Parser)]
#[command(name = "component-server", version, about = "Serve static files and components per host")]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload document roots when the configuration file changes.
    #[arg(short, long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("component-server: {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => ServerConfig {
            base_dir: std::env::current_dir().unwrap_or_default(),
            ..ServerConfig::default()
        },
    };

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "component-server starting");

    match run(args, config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        roots = config.contents.len(),
        cache = config.components.cache,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // The watcher must stay alive for updates to flow.
    let (_watcher, config_updates) = match (&args.config, args.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path, config.clone());
            (Some(watcher.run()?), updates)
        }
        _ => (None, mpsc::unbounded_channel().1),
    };

    let plugins = HandlerPlugins::standard(&config, Arc::new(TemplateEngine::new()));
    let server = HttpServer::new(config, plugins)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, config_updates, server_shutdown).await?;
    Ok(())
}

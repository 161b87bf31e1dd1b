//! einsum.org edge forwarder
//!
//! Every request under `/api` on a site is forwarded to that site's compute
//! backend, chosen from the request's subdomain, and the backend's reply is
//! relayed back unchanged.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                  EDGE FORWARDER                  │
//!                         │                                                  │
//!   Client Request        │  ┌─────────┐    ┌──────────┐    ┌────────────┐   │
//!   ──────────────────────┼─▶│  http   │───▶│ routing  │───▶│ forwarder  │   │
//!                         │  │ server  │    │ matcher  │    │  resolve   │   │
//!                         │  └─────────┘    └──────────┘    └─────┬──────┘   │
//!                         │                                       │          │
//!                         │                                       ▼          │
//!   Client Response       │  ┌─────────┐    ┌──────────┐    ┌────────────┐   │
//!   ◀─────────────────────┼──│  relay  │◀───│   net    │◀───│  upstream  │◀──┼── {sub}.api.einsum.org
//!                         │  │ stream  │    │  client  │    │  request   │   │
//!                         │  └─────────┘    └──────────┘    └────────────┘   │
//!                         │                                                  │
//!                         │  config (TOML, hot reload) · observability ·     │
//!                         │  lifecycle (signals, graceful shutdown)          │
//!                         └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use einsum_edge::config::validation::validate_config;
use einsum_edge::config::{load_config, ConfigError, ConfigWatcher, TargetMode};
use einsum_edge::lifecycle::spawn_signal_handler;
use einsum_edge::observability::{logging, metrics};
use einsum_edge::{ForwarderConfig, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "einsum-edge")]
#[command(about = "Edge request forwarder for einsum.org sites", long_about = None)]
struct Args {
    /// TOML configuration file; reloaded on change.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Forward everything to the fixed local target.
    #[arg(long)]
    dev: bool,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None if args.dev => ForwarderConfig::local_development(),
        None => ForwarderConfig::default(),
    };
    apply_overrides(&mut config, &args);
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "einsum-edge starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        mode = ?config.upstream.mode,
        path_prefixes = ?config.routes.path_prefixes,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    // The watcher must outlive the server for reloads to keep arriving.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            let dev = args.dev;
            let bind = args.bind.clone();
            let updates = reapply_overrides(updates, dev, bind);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_tx, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    spawn_signal_handler(shutdown);

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn apply_overrides(config: &mut ForwarderConfig, args: &Args) {
    override_config(config, args.dev, args.bind.as_deref());
}

fn override_config(config: &mut ForwarderConfig, dev: bool, bind: Option<&str>) {
    if dev {
        config.upstream.mode = TargetMode::Fixed;
    }
    if let Some(bind) = bind {
        config.listener.bind_address = bind.to_string();
    }
}

/// Command-line flags win over reloaded files too.
fn reapply_overrides(
    mut updates: mpsc::UnboundedReceiver<ForwarderConfig>,
    dev: bool,
    bind: Option<String>,
) -> mpsc::UnboundedReceiver<ForwarderConfig> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(mut config) = updates.recv().await {
            override_config(&mut config, dev, bind.as_deref());
            if tx.send(config).is_err() {
                break;
            }
        }
    });
    rx
}

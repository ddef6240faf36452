//! HealthTracker Application Host
//!
//! Declares and runs the distributed application: a Redis cache and two
//! project services with readiness ordering between them.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────┐
//!                  │                    APP HOST                      │
//!                  │                                                  │
//!   declarations   │  ┌─────────┐    ┌─────────┐    ┌─────────────┐   │
//!   ───────────────┼─▶│  model  │───▶│ runtime │───▶│  processes  │   │
//!   (this file)    │  │ builder │    │         │    │ cache/api/  │   │
//!                  │  └─────────┘    └────┬────┘    │    web      │   │
//!                  │                      │         └──────▲──────┘   │
//!                  │                      ▼                │ probes   │
//!                  │  ┌────────────────────────────────────┴──────┐   │
//!                  │  │            Cross-Cutting Concerns         │   │
//!                  │  │  ┌────────┐ ┌────────┐ ┌──────┐ ┌──────┐  │   │
//!                  │  │  │ config │ │ health │ │status│ │ obs. │  │   │
//!                  │  │  └────────┘ └────────┘ └──────┘ └──────┘  │   │
//!                  │  └───────────────────────────────────────────┘   │
//!                  └──────────────────────────────────────────────────┘
//! ```
//!
//! The wait-for edges mean the web frontend is not started until both the
//! cache and the API service report healthy.

use std::path::PathBuf;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use apphost::config::{loader, watcher::ConfigWatcher};
use apphost::model::AppHostBuilder;
use apphost::runtime::Orchestrator;

#[derive(Parser)]
#[command(name = "apphost")]
#[command(about = "HealthTracker application host", long_about = None)]
struct Args {
    /// Path to the host configuration file.
    #[arg(short, long, default_value = "apphost.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "apphost=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("apphost v{} starting", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = loader::load_or_default(&args.config)?;

    tracing::info!(
        status_address = %config.status.bind_address,
        health_interval_secs = config.health_check.interval_secs,
        startup_timeout_secs = config.timeouts.startup_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            apphost::observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    // Hot reload of probe/restart settings while running. The watcher
    // handle must stay alive for the lifetime of the process.
    let (_watcher, config_updates) = if args.config.exists() {
        let (config_watcher, updates) = ConfigWatcher::new(&args.config);
        (Some(config_watcher.run()?), updates)
    } else {
        let (_tx, updates) = mpsc::unbounded_channel();
        (None, updates)
    };

    // Declare the application model
    let mut builder = AppHostBuilder::new();

    let cache = builder.add_redis("cache").id();

    let api_service = builder
        .add_project("apiservice", "healthtracker-apiservice")
        .with_http_health_check("/health")
        .id();

    builder
        .add_project("webfrontend", "healthtracker-web")
        .with_external_http_endpoints()
        .with_http_health_check("/health")
        .with_reference(cache)
        .wait_for(cache)
        .with_reference(api_service)
        .wait_for(api_service);

    let model = builder.build()?;

    // Hand the model to the runtime; blocks until shutdown
    let orchestrator = Orchestrator::new(model, config);
    orchestrator.run(config_updates).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

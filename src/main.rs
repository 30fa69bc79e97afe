//! Server configuration service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ net (listener) ──▶ http (router, middleware)
//!                                            │
//!                                            ▼
//!                                  service (validation, errors)
//!                                            │
//!                                            ▼
//!                                  store (PostgreSQL repository) ◀── health
//!
//!     lifecycle: open store → bind → serve → stop(deadline) → close store
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info, info_span};

use loyalty::config::load_config;
use loyalty::lifecycle::{wait_for_termination, App};
use loyalty::observability::{logging, metrics};
use loyalty::store::PostgresConnector;

#[derive(Parser)]
#[command(name = "loyalty")]
#[command(about = "HTTP service for named server configuration entries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server until SIGINT/SIGTERM
    RunServer {
        /// Path to a TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::RunServer { config } => run_server(config.as_deref()).await,
    }
}

async fn run_server(config_path: Option<&Path>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = logging::init(&config.observability) {
        eprintln!("failed to initialize logging: {err}");
        return ExitCode::FAILURE;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        database = %config.database.redacted_url(),
        request_timeout_secs = config.timeouts.request_secs,
        shutdown_secs = config.timeouts.shutdown_secs,
        "loyalty starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let deadline = Duration::from_secs(config.timeouts.shutdown_secs);
    let app = Arc::new(App::new(config, Arc::new(PostgresConnector), info_span!("app")));

    let stopper = tokio::spawn({
        let app = Arc::clone(&app);
        async move {
            match wait_for_termination().await {
                Ok(signal) => info!(?signal, "Termination signal received"),
                Err(err) => error!(error = %err, "Cannot listen for termination signals, stopping"),
            }
            app.stop(deadline).await
        }
    });

    if let Err(err) = app.run().await {
        error!(error = %err, "Fatal error, exiting");
        stopper.abort();
        return ExitCode::FAILURE;
    }

    match stopper.await {
        Ok(Ok(())) => {
            info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Ok(Err(err)) => {
            error!(error = %err, "Shutdown finished with errors");
            ExitCode::FAILURE
        }
        Err(err) => {
            error!(error = %err, "Shutdown task failed");
            ExitCode::FAILURE
        }
    }
}

//! `airssys-registry` - standalone global registry server (spec.md §6).

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use parking_lot::RwLock;

use airssys_registry::config;
use airssys_registry::state::RegistryState;
use airssys_registry::sweeper;
use airssys_registry::Server;

/// Cross-node actor name service: registration, heartbeat decay, and
/// SSH-driven manager process control.
#[derive(Parser, Debug)]
#[command(name = "airssys-registry")]
#[command(version, about, long_about = None)]
struct Args {
    /// Address to bind the registry RPC listener to, e.g. `tcp://0.0.0.0:5555`
    #[arg(long, default_value = "tcp://0.0.0.0:5555")]
    endpoint: String,

    /// Path to a host/manager config file for process control RPCs
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let process_control_config = match config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(%error, "failed to load config file");
            return ExitCode::FAILURE;
        }
    };

    let state = Arc::new(RwLock::new(RegistryState::new()));
    let (sweeper_handle, sweeper_shutdown) = sweeper::spawn(Arc::clone(&state));
    let server = Server::new(state, process_control_config);

    let (server_shutdown_tx, server_shutdown_rx) = tokio::sync::watch::channel(false);

    let addr = normalize_endpoint(&args.endpoint);
    let serve = tokio::spawn(async move { server.serve(&addr, server_shutdown_rx).await });

    wait_for_shutdown_signal().await;
    tracing::info!("shutdown signal received, stopping registry");

    let _ = server_shutdown_tx.send(true);
    let _ = sweeper_shutdown.send(true);
    let _ = sweeper_handle.await;

    match serve.await {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(error)) => {
            tracing::error!(%error, "registry server error");
            ExitCode::FAILURE
        }
        Err(error) => {
            tracing::error!(%error, "registry server task panicked");
            ExitCode::FAILURE
        }
    }
}

fn normalize_endpoint(endpoint: &str) -> String {
    endpoint
        .strip_prefix("tcp://")
        .unwrap_or(endpoint)
        .replace('*', "0.0.0.0")
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let sigterm = signal(SignalKind::terminate());
    let sigint = signal(SignalKind::interrupt());
    let (mut sigterm, mut sigint) = match (sigterm, sigint) {
        (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
        (result_a, result_b) => {
            if let Err(error) = result_a {
                tracing::error!(%error, "failed to install SIGTERM handler, falling back to ctrl_c");
            }
            if let Err(error) = result_b {
                tracing::error!(%error, "failed to install SIGINT handler, falling back to ctrl_c");
            }
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

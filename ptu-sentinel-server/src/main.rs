//! PTU Sentinel - Headless Daemon
//!
//! Receives Event Grid deliveries for model deployment writes on
//! /api/events and reports provisioned throughput against capacity
//! reservations. `check` and `replay` run the same pipeline from the CLI.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod cli;
mod commands;
mod router;
mod server_utils;
mod state;

use cli::{Cli, Commands};
use commands::CheckTarget;
use ptu_sentinel_core::modules::config::load_config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = load_config(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    match cli.command {
        None => run_server(cli.port, config).await,
        Some(Commands::Serve { port }) => run_server(port, config).await,
        Some(Commands::Check {
            subscription,
            resource_group,
            account,
            deployment,
            workspace,
            all_accounts,
            json,
        }) => {
            let target = CheckTarget {
                subscription,
                resource_group,
                account,
                deployment,
                workspace,
                all_accounts,
            };
            commands::handle_check(config, target, json).await
        },
        Some(Commands::Replay { file, json }) => {
            commands::handle_replay(config, &file, json).await
        },
    }
}

async fn run_server(port: u16, config: ptu_sentinel_types::SentinelConfig) -> Result<()> {
    info!("🚀 PTU Sentinel starting on port {}...", port);
    info!(
        scan_mode = ?config.scan_mode,
        max_parallel_scans = config.max_parallel_scans,
        timeout_secs = config.timeout_secs,
        "Configuration loaded"
    );

    let state = AppState::from_config(config)?;
    let app = router::build_router(state);
    let listener = server_utils::create_listener(port).await?;

    info!("🔌 Event Grid webhook at http://localhost:{}/api/events", port);

    axum::serve(listener, app).with_graceful_shutdown(server_utils::shutdown_signal()).await?;

    info!("✅ Server stopped");
    Ok(())
}

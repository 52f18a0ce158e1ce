//! Waitboard server binary.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (`WAITBOARD_CONFIG` or `waitboard.yaml`, then
//!    environment overrides)
//! 2. Initialize structured logging (tracing)
//! 3. Create the board from the configured display defaults
//! 4. Serve HTTP until Ctrl-C, then close all event streams

use std::sync::Arc;

use tracing::info;
use waitboard_core::{Board, WaitboardConfig};
use waitboard_server::logging::init_tracing;
use waitboard_server::{AppState, shutdown_signal, start_server};

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, template loading or binding fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = WaitboardConfig::load()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!("waitboard starting");
    info!(
        host = config.server.host,
        port = config.server.port,
        wait_minutes = config.display.wait_minutes,
        mode = %config.display.mode,
        heartbeat_secs = config.stream.heartbeat_secs,
        listener_capacity = config.stream.listener_capacity,
        "Configuration loaded"
    );

    // 3. Create the board.
    let board = Arc::new(Board::from_config(&config));
    let state = Arc::new(AppState::new(Arc::clone(&board), &config.server)?);

    // 4. Serve.
    start_server(&config.server, state, shutdown_signal()).await?;

    info!(payload = %board.payload(), "waitboard stopped");
    Ok(())
}

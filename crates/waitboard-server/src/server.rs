//! HTTP server lifecycle management.
//!
//! [`start_server`] binds the configured address and serves until the
//! given shutdown future resolves. On shutdown the board closes every
//! listener, so open event streams end and the graceful drain can
//! finish instead of waiting on screens that never disconnect.

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};
use waitboard_core::config::HttpConfig;

use crate::router::build_router;
use crate::state::AppState;

/// Errors that can occur when starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),

    /// Page templates could not be loaded.
    #[error("template error: {0}")]
    Template(String),
}

/// Bind to `config.host:config.port` and serve until `shutdown` resolves.
pub async fn start_server<F>(
    config: &HttpConfig,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .map_err(|e| {
            ServerError::Bind(format!("bind failed on {}:{}: {e}", config.host, config.port))
        })?;

    serve(listener, state, shutdown).await
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("no local address: {e}")))?;
    let board = Arc::clone(&state.board);
    let router = build_router(state);

    info!(%addr, "Waitboard server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!(
                listeners = board.listener_count(),
                "shutdown requested, closing event streams"
            );
            board.shutdown();
        })
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

    info!("Waitboard server stopped");
    Ok(())
}

/// Resolve on Ctrl-C. If the signal handler cannot be installed the
/// server runs until killed.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

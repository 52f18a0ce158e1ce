//! Shared application state for the Axum server.
//!
//! [`AppState`] is wrapped in [`Arc`] and injected via Axum's `State`
//! extractor. The [`Board`] inside is the only mutable state in the
//! process; everything else is fixed at startup.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use waitboard_core::Board;
use waitboard_core::config::HttpConfig;

use crate::pages::PageRenderer;
use crate::server::ServerError;

/// Shared state for the Axum application.
#[derive(Debug)]
pub struct AppState {
    /// Display state and its listeners.
    pub board: Arc<Board>,
    /// Page templates.
    pub pages: PageRenderer,
    /// Directory served under `/static`.
    pub static_dir: PathBuf,
    /// When this state was created, for the health probe.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Build the state for `board`, loading templates as configured.
    pub fn new(board: Arc<Board>, config: &HttpConfig) -> Result<Self, ServerError> {
        let pages = match &config.templates_dir {
            Some(dir) => PageRenderer::from_dir(dir)?,
            None => PageRenderer::embedded()?,
        };

        Ok(Self {
            board,
            pages,
            static_dir: config.static_dir.clone(),
            started_at: Utc::now(),
        })
    }
}

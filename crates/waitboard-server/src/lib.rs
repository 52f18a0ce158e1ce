//! HTTP surface of the Waitboard display server.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Event stream** (`GET /stream`) pushing the display state to every
//!   connected screen, one pipe-delimited line per change, with
//!   heartbeats while nothing changes
//! - **Control API** (`/wait`, `/offer`, `/offer_visibility`, `/mode`,
//!   `/auto_offer`) taking form-encoded input from the control panel
//! - **Pages** (`/screen`, `/display`, `/control`) rendered from
//!   `minijinja` templates
//! - **Health probe** (`GET /health`) and static files (`/static`)
//!
//! # Architecture
//!
//! All handlers share one [`AppState`] holding an `Arc` to the
//! [`Board`](waitboard_core::Board). Control handlers mutate the board,
//! which broadcasts to every open stream; pages and probes only read it.

pub mod control;
pub mod error;
pub mod health;
pub mod logging;
pub mod pages;
pub mod router;
pub mod server;
pub mod state;
pub mod stream;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerError, serve, shutdown_signal, start_server};
pub use state::AppState;

//! Axum router construction.
//!
//! Assembles the control API, the event stream, the pages, the health
//! probe and the static files into a single [`Router`] with CORS and
//! request tracing enabled.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{control, health, pages, stream};

/// Build the complete router.
///
/// - `GET /`, `/screen`, `/display`, `/control` -- HTML pages
/// - `GET|POST /wait`, `/offer`, `/mode` -- read or change state
/// - `POST /offer_visibility`, `/auto_offer` -- toggles
/// - `GET /stream` -- event stream for the screens
/// - `GET /health` -- liveness probe
/// - `GET /static/*` -- files from the static directory
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        // Pages
        .route("/", get(pages::root))
        .route("/screen", get(pages::screen))
        .route("/display", get(pages::display))
        .route("/control", get(pages::control))
        // Control API
        .route("/wait", get(control::get_wait).post(control::set_wait))
        .route("/offer", get(control::get_offer).post(control::set_offer))
        .route("/offer_visibility", post(control::set_offer_visibility))
        .route("/mode", get(control::get_mode).post(control::set_mode))
        .route("/auto_offer", post(control::set_auto_offer))
        // Event stream
        .route("/stream", get(stream::stream))
        // Probes
        .route("/health", get(health::health))
        .nest_service("/static", static_files)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

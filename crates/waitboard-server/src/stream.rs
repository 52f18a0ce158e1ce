//! Event-stream endpoint for the display screens.
//!
//! Screens connect to `GET /stream` with `EventSource`. Each connection
//! opens a [`StreamSession`](waitboard_core::StreamSession) on the shared
//! board and the response is that session's events as server-sent
//! events:
//!
//! ```text
//! data: 5|un expresso|time|1
//!
//! retry:3000
//!
//! : heartbeat
//!
//! ```
//!
//! When the client goes away the body stream is dropped, which drops
//! the session and unregisters its listener.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderName, HeaderValue};
use axum::response::IntoResponse;
use axum::response::sse::{Event, Sse};
use futures::StreamExt;
use tracing::debug;
use waitboard_core::SessionEvent;
use waitboard_core::session::HEARTBEAT_COMMENT;

use crate::state::AppState;

/// Map a session event onto its server-sent event.
pub fn to_sse(event: &SessionEvent) -> Event {
    match event {
        SessionEvent::Snapshot(payload) | SessionEvent::Update(payload) => {
            Event::default().data(payload)
        }
        SessionEvent::Retry(delay) => Event::default().retry(*delay),
        SessionEvent::Heartbeat => Event::default().comment(HEARTBEAT_COMMENT),
    }
}

/// `GET /stream`
pub async fn stream(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.board.open_session();
    debug!(
        listener_id = ?session.listener_id(),
        listeners = state.board.listener_count(),
        "display client connected"
    );

    let events = session
        .into_stream()
        .map(|event| Ok::<_, Infallible>(to_sse(&event)));

    (
        [(
            HeaderName::from_static("x-accel-buffering"),
            HeaderValue::from_static("no"),
        )],
        Sse::new(events),
    )
}

//! Control API handlers for changing what the screens show.
//!
//! Every `POST` handler validates its form input, applies it through the
//! shared [`Board`](waitboard_core::Board) (which broadcasts the new state
//! to every connected screen) and answers with the stored values. All
//! forms accept an optional `pin` field; it is not checked.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/wait` | Current wait time |
//! | `POST` | `/wait` | Set wait time (clamped to 0-10 minutes) |
//! | `GET` | `/offer` | Current offer and visibility |
//! | `POST` | `/offer` | Set offer text (empty hides the banner) |
//! | `POST` | `/offer_visibility` | Show or hide the banner |
//! | `GET` | `/mode` | Current display mode |
//! | `POST` | `/mode` | Set display mode (`time`, `logo`, `dual`) |
//! | `POST` | `/auto_offer` | Store the auto-offer flag |

use std::num::IntErrorKind;
use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Form, Json};

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Form types
// ---------------------------------------------------------------------------

/// Form body for `POST /wait`, `POST /offer` and `POST /mode`.
#[derive(Debug, Default, serde::Deserialize)]
pub struct ValueForm {
    /// The new value, as typed.
    pub value: Option<String>,
    /// Operator PIN. Accepted, never checked.
    pub pin: Option<String>,
}

/// Form body for the boolean toggles.
#[derive(Debug, Default, serde::Deserialize)]
pub struct ToggleForm {
    /// Checkbox-style flag: absent or empty means off.
    pub enabled: Option<String>,
    /// Operator PIN. Accepted, never checked.
    pub pin: Option<String>,
}

/// Interpret a checkbox-style form value: any non-empty value is true,
/// including `0` and `false`.
pub fn truthy(raw: Option<&str>) -> bool {
    raw.is_some_and(|value| !value.is_empty())
}

/// The `value` field of a form that requires one. An empty value counts
/// as missing.
pub fn required_value(form: &ValueForm) -> Result<&str, ApiError> {
    form.value
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::Validation(String::from("value is required")))
}

/// Parse a wait value. Integers too large for `i64` saturate, since they
/// are clamped to the 0-10 range anyway.
pub fn parse_wait(raw: &str) -> Result<i64, ApiError> {
    match raw.trim().parse::<i64>() {
        Ok(value) => Ok(value),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Ok(i64::MAX),
            IntErrorKind::NegOverflow => Ok(i64::MIN),
            _ => Err(ApiError::Validation(format!(
                "value must be an integer, got {raw:?}"
            ))),
        },
    }
}

// ---------------------------------------------------------------------------
// Wait time
// ---------------------------------------------------------------------------

/// `GET /wait`
pub async fn get_wait(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let wait = state.board.snapshot().wait_minutes;
    Json(serde_json::json!({ "wait": wait }))
}

/// `POST /wait` -- nothing is changed when `value` is not an integer.
pub async fn set_wait(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ValueForm>,
) -> Result<impl IntoResponse, ApiError> {
    let value = parse_wait(required_value(&form)?)?;

    let wait = state.board.set_wait(value);

    Ok(Json(serde_json::json!({ "ok": true, "wait": wait })))
}

// ---------------------------------------------------------------------------
// Offer
// ---------------------------------------------------------------------------

/// `GET /offer`
pub async fn get_offer(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.board.snapshot();
    Json(serde_json::json!({
        "offer": snapshot.offer_text,
        "show": snapshot.show_offer,
    }))
}

/// `POST /offer` -- a missing or blank value clears the offer and hides
/// the banner.
pub async fn set_offer(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ValueForm>,
) -> impl IntoResponse {
    let (offer, show) = state.board.set_offer(form.value.as_deref().unwrap_or_default());
    Json(serde_json::json!({ "ok": true, "offer": offer, "show": show }))
}

/// `POST /offer_visibility`
pub async fn set_offer_visibility(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ToggleForm>,
) -> impl IntoResponse {
    let show = state.board.set_offer_visibility(truthy(form.enabled.as_deref()));
    Json(serde_json::json!({ "ok": true, "show": show }))
}

// ---------------------------------------------------------------------------
// Display mode
// ---------------------------------------------------------------------------

/// `GET /mode`
pub async fn get_mode(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mode = state.board.snapshot().display_mode;
    Json(serde_json::json!({ "mode": mode }))
}

/// `POST /mode` -- a missing value is a 422; an unknown mode answers
/// `{"ok": false}` and changes nothing.
pub async fn set_mode(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ValueForm>,
) -> Result<impl IntoResponse, ApiError> {
    let mode = state.board.set_mode(required_value(&form)?)?;
    Ok(Json(serde_json::json!({ "ok": true, "mode": mode })))
}

// ---------------------------------------------------------------------------
// Auto offer
// ---------------------------------------------------------------------------

/// `POST /auto_offer` -- the flag is stored and broadcast, nothing more.
pub async fn set_auto_offer(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ToggleForm>,
) -> impl IntoResponse {
    let auto_offer = state.board.set_auto_offer(truthy(form.enabled.as_deref()));
    Json(serde_json::json!({ "ok": true, "auto_offer": auto_offer }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_values() {
        for raw in ["on", "1", "true", "0", "false", "off", " "] {
            assert!(truthy(Some(raw)), "{raw}");
        }
        assert!(!truthy(Some("")));
        assert!(!truthy(None));
    }

    #[test]
    fn required_value_rejects_missing_and_empty() {
        let form = |value: Option<&str>| ValueForm {
            value: value.map(String::from),
            pin: None,
        };
        assert_eq!(required_value(&form(Some("logo"))).ok(), Some("logo"));
        assert!(matches!(required_value(&form(Some(""))), Err(ApiError::Validation(_))));
        assert!(matches!(required_value(&form(None)), Err(ApiError::Validation(_))));
    }

    #[test]
    fn parse_wait_accepts_integers() {
        assert_eq!(parse_wait(" 7 ").ok(), Some(7));
        assert_eq!(parse_wait("-3").ok(), Some(-3));
        assert_eq!(parse_wait("99999999999999999999999").ok(), Some(i64::MAX));
        assert_eq!(parse_wait("-99999999999999999999999").ok(), Some(i64::MIN));
    }

    #[test]
    fn parse_wait_rejects_non_integers() {
        for raw in ["", "abc", "4.5", "5 min"] {
            assert!(matches!(parse_wait(raw), Err(ApiError::Validation(_))), "{raw}");
        }
    }
}

//! HTML pages for the screens and the control panel.
//!
//! Pages are rendered with `minijinja`. The four templates are compiled
//! into the binary; when `server.templates_dir` is configured they are
//! read from that directory instead, so a shop can restyle its screens
//! without recompiling. Template names end in `.html`, which turns on
//! HTML auto-escaping for the offer text.
//!
//! # Endpoints
//!
//! | Method | Path | Template |
//! |--------|------|----------|
//! | `GET` | `/` | redirect to `/screen` |
//! | `GET` | `/screen` | chosen by display mode |
//! | `GET` | `/display` | `display.html` |
//! | `GET` | `/control` | `control.html` |

use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect};
use minijinja::{Environment, context};
use waitboard_core::{DisplayMode, DisplayState};

use crate::error::ApiError;
use crate::server::ServerError;
use crate::state::AppState;

/// Wait time page.
pub const DISPLAY_TEMPLATE: &str = "display.html";
/// Logo-only page.
pub const LOGO_TEMPLATE: &str = "logo_only.html";
/// Wait time plus logo page.
pub const DUAL_TEMPLATE: &str = "dual.html";
/// Control panel page.
pub const CONTROL_TEMPLATE: &str = "control.html";

const TEMPLATE_NAMES: [&str; 4] = [DISPLAY_TEMPLATE, LOGO_TEMPLATE, DUAL_TEMPLATE, CONTROL_TEMPLATE];

/// Renders the HTML pages.
pub struct PageRenderer {
    env: Environment<'static>,
}

impl std::fmt::Debug for PageRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRenderer").finish_non_exhaustive()
    }
}

impl PageRenderer {
    /// Use the templates compiled into the binary.
    pub fn embedded() -> Result<Self, ServerError> {
        let mut env = Environment::new();
        let sources = [
            (DISPLAY_TEMPLATE, include_str!("../templates/display.html")),
            (LOGO_TEMPLATE, include_str!("../templates/logo_only.html")),
            (DUAL_TEMPLATE, include_str!("../templates/dual.html")),
            (CONTROL_TEMPLATE, include_str!("../templates/control.html")),
        ];
        for (name, source) in sources {
            env.add_template(name, source)
                .map_err(|e| ServerError::Template(format!("failed to add {name}: {e}")))?;
        }
        Ok(Self { env })
    }

    /// Load all four templates from `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, ServerError> {
        let mut env = Environment::new();
        for name in TEMPLATE_NAMES {
            let path = dir.join(name);
            let source = std::fs::read_to_string(&path).map_err(|e| {
                ServerError::Template(format!("failed to read {}: {e}", path.display()))
            })?;
            env.add_template_owned(name, source)
                .map_err(|e| ServerError::Template(format!("failed to add {name}: {e}")))?;
        }
        Ok(Self { env })
    }

    /// Template used by `/screen` for a given mode.
    pub const fn screen_template(mode: DisplayMode) -> &'static str {
        match mode {
            DisplayMode::Time => DISPLAY_TEMPLATE,
            DisplayMode::Logo => LOGO_TEMPLATE,
            DisplayMode::Dual => DUAL_TEMPLATE,
        }
    }

    /// Render `name` with the given state.
    pub fn render(&self, name: &str, state: &DisplayState) -> Result<String, ApiError> {
        self.env
            .get_template(name)
            .map_err(|e| ApiError::Template(format!("missing template {name}: {e}")))?
            .render(context! {
                initial => state.wait_minutes,
                offer => &state.offer_text,
                show_offer => state.show_offer,
                auto_offer => state.auto_offer_enabled,
                mode => state.display_mode.as_str(),
            })
            .map_err(|e| ApiError::Template(format!("{name} render failed: {e}")))
    }
}

/// `GET /` -- send screens to `/screen`.
pub async fn root() -> Redirect {
    Redirect::temporary("/screen")
}

/// `GET /screen` -- the one URL a screen needs; the layout follows the
/// current display mode.
pub async fn screen(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.board.snapshot();
    let template = PageRenderer::screen_template(snapshot.display_mode);
    Ok(Html(state.pages.render(template, &snapshot)?))
}

/// `GET /display` -- the wait time page regardless of mode.
pub async fn display(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.board.snapshot();
    Ok(Html(state.pages.render(DISPLAY_TEMPLATE, &snapshot)?))
}

/// `GET /control` -- the control panel.
pub async fn control(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.board.snapshot();
    Ok(Html(state.pages.render(CONTROL_TEMPLATE, &snapshot)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_template_follows_mode() {
        assert_eq!(PageRenderer::screen_template(DisplayMode::Time), DISPLAY_TEMPLATE);
        assert_eq!(PageRenderer::screen_template(DisplayMode::Logo), LOGO_TEMPLATE);
        assert_eq!(PageRenderer::screen_template(DisplayMode::Dual), DUAL_TEMPLATE);
    }

    #[test]
    fn embedded_templates_render_and_escape() {
        let pages = PageRenderer::embedded();
        assert!(pages.is_ok());
        let Ok(pages) = pages else { return };

        let state = DisplayState {
            offer_text: String::from("<b>2 pour 1</b>"),
            ..DisplayState::default()
        };
        for name in TEMPLATE_NAMES {
            let html = pages.render(name, &state);
            assert!(html.is_ok(), "{name}: {html:?}");
        }

        let html = pages.render(DISPLAY_TEMPLATE, &state).unwrap_or_default();
        assert!(html.contains("&lt;b&gt;2 pour 1&lt;/b&gt;"));
        assert!(!html.contains("<b>2 pour 1</b>"));
    }

    #[test]
    fn missing_template_dir_is_reported() {
        let result = PageRenderer::from_dir(Path::new("/nonexistent/waitboard/templates"));
        assert!(matches!(result, Err(ServerError::Template(_))));
    }

    #[test]
    fn templates_load_from_dir() {
        let dir = std::env::temp_dir().join(format!("waitboard-templates-{}", std::process::id()));
        std::fs::create_dir_all(&dir).ok();
        for name in TEMPLATE_NAMES {
            std::fs::write(dir.join(name), "{{ initial }}|{{ offer }}|{{ mode }}").ok();
        }

        let pages = PageRenderer::from_dir(&dir);
        assert!(pages.is_ok());
        if let Ok(pages) = pages {
            let html = pages.render(LOGO_TEMPLATE, &DisplayState::default());
            assert_eq!(html.ok().as_deref(), Some("5|un expresso|time"));
        }
        std::fs::remove_dir_all(&dir).ok();
    }
}

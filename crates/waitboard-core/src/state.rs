//! The display state and its single-writer store.
//!
//! [`StateStore`] owns the one [`DisplayState`] of the process and is the
//! only place where its fields are written. Every mutator normalizes its
//! input (clamping, trimming, case folding) so that readers can never
//! observe an out-of-domain value.
//!
//! The store itself does no locking; [`crate::board::Board`] wraps it in
//! a mutex together with the subscriber registry so that a mutation and
//! its broadcast happen as one step.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InvalidModeError;

/// Upper bound for the advertised wait, in minutes.
pub const MAX_WAIT_MINUTES: u8 = 10;

/// Which page layout the screens should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Wait time only.
    #[default]
    Time,
    /// Brand logo only.
    Logo,
    /// Wait time and logo side by side.
    Dual,
}

impl DisplayMode {
    /// The lowercase name used on the wire and in JSON.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Logo => "logo",
            Self::Dual => "dual",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = InvalidModeError;

    /// Parse a mode, ignoring surrounding whitespace and case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "time" => Ok(Self::Time),
            "logo" => Ok(Self::Logo),
            "dual" => Ok(Self::Dual),
            _ => Err(InvalidModeError::new(s)),
        }
    }
}

/// A snapshot of everything the screens display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayState {
    /// Advertised wait in minutes, always within `0..=MAX_WAIT_MINUTES`.
    pub wait_minutes: u8,
    /// Promotional offer text, trimmed. Empty means no offer.
    pub offer_text: String,
    /// Current page layout.
    pub display_mode: DisplayMode,
    /// Whether the offer banner is visible.
    pub show_offer: bool,
    /// Reserved for offer scheduling; stored but not interpreted.
    pub auto_offer_enabled: bool,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            wait_minutes: 5,
            offer_text: String::from("un expresso"),
            display_mode: DisplayMode::Time,
            show_offer: true,
            auto_offer_enabled: false,
        }
    }
}

/// Clamp an arbitrary integer into the wait-minutes domain.
pub fn clamp_wait(value: i64) -> u8 {
    let clamped = value.clamp(0, i64::from(MAX_WAIT_MINUTES));
    u8::try_from(clamped).unwrap_or(MAX_WAIT_MINUTES)
}

/// Owner of the process-wide [`DisplayState`].
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    state: DisplayState,
}

impl StateStore {
    /// Create a store seeded with `initial`.
    ///
    /// The initial values go through the same normalization as the
    /// mutators, so a hand-built state cannot smuggle in an empty offer
    /// that is still marked visible or an oversized wait.
    pub fn new(initial: DisplayState) -> Self {
        let mut store = Self::default();
        store.set_wait(i64::from(initial.wait_minutes));
        store.set_offer(&initial.offer_text);
        if !store.state.offer_text.is_empty() {
            store.state.show_offer = initial.show_offer;
        }
        store.state.display_mode = initial.display_mode;
        store.state.auto_offer_enabled = initial.auto_offer_enabled;
        store
    }

    /// Current snapshot.
    pub fn get(&self) -> DisplayState {
        self.state.clone()
    }

    /// Borrow the current state without cloning.
    pub const fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Clamp `value` into `0..=10`, store it and return what was stored.
    pub fn set_wait(&mut self, value: i64) -> u8 {
        self.state.wait_minutes = clamp_wait(value);
        self.state.wait_minutes
    }

    /// Store the trimmed offer text. An empty offer also hides the banner.
    ///
    /// Returns the stored text and the resulting visibility.
    pub fn set_offer(&mut self, text: &str) -> (String, bool) {
        text.trim().clone_into(&mut self.state.offer_text);
        if self.state.offer_text.is_empty() {
            self.state.show_offer = false;
        }
        (self.state.offer_text.clone(), self.state.show_offer)
    }

    /// Set banner visibility directly.
    ///
    /// This does not look at the offer text: an empty offer can be marked
    /// visible again, leaving the screens to decide what to draw.
    pub const fn set_offer_visibility(&mut self, enabled: bool) -> bool {
        self.state.show_offer = enabled;
        self.state.show_offer
    }

    /// Parse and store a display mode. Leaves the state untouched on error.
    pub fn set_mode(&mut self, value: &str) -> Result<DisplayMode, InvalidModeError> {
        let mode = value.parse::<DisplayMode>()?;
        self.state.display_mode = mode;
        Ok(mode)
    }

    /// Store the auto-offer flag.
    pub const fn set_auto_offer(&mut self, enabled: bool) -> bool {
        self.state.auto_offer_enabled = enabled;
        self.state.auto_offer_enabled
    }

    /// Serialize the current state into the pipe-delimited wire line.
    ///
    /// The layout is `wait|offer|mode|show` with `show` as `0` or `1`. The
    /// field order is fixed by the display clients. Line breaks inside the
    /// offer are sent as spaces so the line stays a single event.
    pub fn format_payload(&self) -> String {
        let offer = self.state.offer_text.replace(['\r', '\n'], " ");
        format!(
            "{}|{}|{}|{}",
            self.state.wait_minutes,
            offer,
            self.state.display_mode,
            u8::from(self.state.show_offer),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_factory_settings() {
        let store = StateStore::default();
        let state = store.get();
        assert_eq!(state.wait_minutes, 5);
        assert_eq!(state.offer_text, "un expresso");
        assert_eq!(state.display_mode, DisplayMode::Time);
        assert!(state.show_offer);
        assert!(!state.auto_offer_enabled);
    }

    #[test]
    fn set_wait_clamps_into_domain() {
        let mut store = StateStore::default();
        for n in [-1_000, -1, 0, 3, 10, 11, 15, i64::MAX, i64::MIN] {
            let stored = store.set_wait(n);
            let expected = n.clamp(0, 10);
            assert_eq!(i64::from(stored), expected, "input {n}");
            assert_eq!(i64::from(store.get().wait_minutes), expected);
        }
    }

    #[test]
    fn set_offer_trims_and_hides_when_empty() {
        let mut store = StateStore::default();

        let (text, show) = store.set_offer("  café offert \t");
        assert_eq!(text, "café offert");
        assert!(show);

        let (text, show) = store.set_offer("   \n ");
        assert_eq!(text, "");
        assert!(!show);
        assert!(!store.get().show_offer);
    }

    #[test]
    fn non_empty_offer_keeps_previous_visibility() {
        let mut store = StateStore::default();
        store.set_offer_visibility(false);
        let (_, show) = store.set_offer("croissant");
        assert!(!show);
    }

    #[test]
    fn set_mode_normalizes_input() {
        let mut store = StateStore::default();
        assert_eq!(store.set_mode("TIME "), Ok(DisplayMode::Time));
        assert_eq!(store.set_mode(" Dual"), Ok(DisplayMode::Dual));
        assert_eq!(store.get().display_mode, DisplayMode::Dual);
    }

    #[test]
    fn set_mode_rejects_unknown_and_keeps_state() {
        let mut store = StateStore::default();
        store.set_mode("logo").ok();
        let err = store.set_mode("bogus");
        assert_eq!(err, Err(InvalidModeError::new("bogus")));
        assert_eq!(store.get().display_mode, DisplayMode::Logo);
        assert!(store.set_mode("").is_err());
    }

    #[test]
    fn auto_offer_is_stored_only() {
        let mut store = StateStore::default();
        let before = store.format_payload();
        assert!(store.set_auto_offer(true));
        assert!(store.get().auto_offer_enabled);
        assert_eq!(store.format_payload(), before);
    }

    #[test]
    fn payload_layout() {
        let store = StateStore::default();
        assert_eq!(store.format_payload(), "5|un expresso|time|1");
    }

    #[test]
    fn payload_flattens_line_breaks_in_offer() {
        let mut store = StateStore::default();
        store.set_offer("two\r\nlines");
        assert_eq!(store.get().offer_text, "two\r\nlines");
        assert_eq!(store.format_payload(), "5|two  lines|time|1");
    }

    #[test]
    fn new_normalizes_initial_state() {
        let store = StateStore::new(DisplayState {
            wait_minutes: 42,
            offer_text: String::from("   "),
            display_mode: DisplayMode::Logo,
            show_offer: true,
            auto_offer_enabled: true,
        });
        let state = store.get();
        assert_eq!(state.wait_minutes, MAX_WAIT_MINUTES);
        assert_eq!(state.offer_text, "");
        assert!(!state.show_offer);
        assert_eq!(state.display_mode, DisplayMode::Logo);
        assert!(state.auto_offer_enabled);
    }

    #[test]
    fn offer_visibility_scenario() {
        let mut store = StateStore::default();

        assert_eq!(store.set_offer(""), (String::new(), false));

        // Re-showing an empty offer is passed through as-is.
        assert!(store.set_offer_visibility(true));
        let state = store.get();
        assert_eq!(state.offer_text, "");
        assert!(state.show_offer);

        assert_eq!(store.set_wait(15), 10);
        assert_eq!(store.format_payload(), "10||time|1");
    }
}

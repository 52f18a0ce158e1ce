//! Error types for the display state core.
//!
//! Only validation can fail in the core. Delivery failures are absorbed
//! by the registry and transport cancellation is a normal session exit,
//! so neither has an error type.

/// A display mode string that is not one of `time`, `logo`, or `dual`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid display mode: {value:?} (expected time, logo or dual)")]
pub struct InvalidModeError {
    /// The rejected input, as received.
    pub value: String,
}

impl InvalidModeError {
    /// Build the error for a rejected input.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

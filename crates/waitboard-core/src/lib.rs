//! State-broadcast core for the Waitboard display server.
//!
//! This crate holds the shared display state (wait time, offer, display
//! mode, visibility flags) and pushes it to every connected display
//! client:
//!
//! - [`StateStore`] owns the [`DisplayState`] and formats it into the
//!   pipe-delimited wire line.
//! - [`SubscriberRegistry`] tracks connected listeners and fans a payload
//!   out to all of them without ever waiting on a slow one.
//! - [`StreamSession`] drives one client connection: snapshot first,
//!   then pushed updates or heartbeats until the client goes away.
//! - [`Board`] ties a store and a registry together so that a mutation
//!   and its broadcast are one atomic step.
//!
//! Transport concerns (HTTP, event-stream responses, HTML) live in the
//! `waitboard-server` crate.

pub mod board;
pub mod config;
pub mod error;
pub mod registry;
pub mod session;
pub mod state;

// Re-export primary types for convenience.
pub use board::Board;
pub use config::{ConfigError, WaitboardConfig};
pub use error::InvalidModeError;
pub use registry::{BroadcastReport, ListenerHandle, ListenerId, Payload, SubscriberRegistry};
pub use session::{SessionEvent, SessionPhase, StreamSession, StreamSettings};
pub use state::{DisplayMode, DisplayState, StateStore};

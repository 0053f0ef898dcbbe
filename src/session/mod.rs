//! Session-oriented rendering API.

/// Session configuration.
pub mod config;
/// The frame compositor.
pub mod render_session;
/// Shutter state machine.
pub mod shutter;

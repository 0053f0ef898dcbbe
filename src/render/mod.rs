//! Sample-level rendering primitives: frames, accumulation, jitter and sampling policy.

/// Ping-pong accumulation buffer.
pub mod accum;
/// Camera pose provider contract.
pub mod camera;
/// RGBA8 frame type.
pub mod frame;
/// Jitter offset tables.
pub mod jitter;
/// Sample-count policy.
pub mod policy;
/// Procedural demo scene.
pub mod sweep;

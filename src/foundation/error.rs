/// Convenience result type used across the compositor.
pub type RenderResult<T> = Result<T, RenderError>;

/// Error taxonomy for render sessions.
///
/// Configuration and allocation errors are raised while a session is being set up. Sink and camera
/// errors abort a running session; afterwards every call reports [`RenderError::SessionFailed`].
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// Invalid session configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No jitter table is registered for the requested sample count.
    #[error("configuration error: unsupported sample count {0} (no jitter table registered)")]
    UnsupportedSampleCount(u32),

    /// Accumulation storage could not be allocated.
    #[error("resource allocation error: {0}")]
    ResourceAllocation(String),

    /// An operation was called out of order on internal render state.
    #[error("invalid render state: {0}")]
    InvalidState(String),

    /// The frame or audio sink rejected data.
    #[error("sink write error: {0}")]
    SinkWrite(String),

    /// The host renderer failed to produce a sub-sample.
    #[error("camera error: {0}")]
    Camera(String),

    /// The session already reported a fatal error.
    #[error("session failed: no further frames are accepted")]
    SessionFailed,

    /// The session was shut down.
    #[error("session closed")]
    SessionClosed,

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RenderError {
    /// Build a [`RenderError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`RenderError::ResourceAllocation`] value.
    pub fn resource_allocation(msg: impl Into<String>) -> Self {
        Self::ResourceAllocation(msg.into())
    }

    /// Build a [`RenderError::InvalidState`] value.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Build a [`RenderError::SinkWrite`] value.
    pub fn sink_write(msg: impl Into<String>) -> Self {
        Self::SinkWrite(msg.into())
    }

    /// Build a [`RenderError::Camera`] value.
    pub fn camera(msg: impl Into<String>) -> Self {
        Self::Camera(msg.into())
    }

    /// Return `true` for errors caused by an invalid configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::UnsupportedSampleCount(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

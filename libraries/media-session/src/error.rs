//! Error types for session control

use thiserror::Error;

/// Playback session errors
///
/// Navigation and transport commands never fail; these errors only surface
/// from construction and from the engine capability itself.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The engine could not open a session for a track
    #[error("Failed to create engine session: {0}")]
    SessionCreation(String),

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Engine-side failure reported by an adapter
    #[error("Engine error: {0}")]
    Engine(String),
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

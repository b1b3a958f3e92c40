//! Core types for session control

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Opaque reference to a playable resource (URL, file path, stream key...)
///
/// Only equality matters; position in the playlist is the only ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackLocator(String);

impl TrackLocator {
    /// Create a locator from anything string-like
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    /// Borrow the raw locator
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackLocator {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TrackLocator {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    /// No track loaded
    Idle,

    /// Session created, waiting for the engine to become ready
    Buffering,

    /// Currently playing
    Playing,

    /// Paused by the user, by end of track, or after an engine failure
    Paused,
}

/// Play mode
///
/// Governs next/previous resolution and end-of-track auto-advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayMode {
    /// Walk the playlist in order
    Loop,

    /// Restart the current track when it ends
    RepeatOne,

    /// Jump to a random other track
    Shuffle,
}

/// Playback progress and buffered extent of the current track
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingSnapshot {
    /// Current play position
    pub current_time: Duration,

    /// Track duration (zero until the engine reports it)
    pub duration: Duration,

    /// End of the buffered range
    pub available_duration: Duration,
}

/// Configuration for the playback manager
///
/// Host-owned policy, never persisted by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Wrap past either end of the playlist (default: true)
    pub looping_playlist: bool,

    /// Advance automatically when a track ends (default: true)
    pub auto_next_play: bool,

    /// Resume when an audio interruption ends (default: true)
    pub auto_resume_after_interrupt: bool,

    /// Initial play mode (default: Loop)
    pub play_mode: PlayMode,

    /// Periodic time tick interval (default: 1s)
    pub time_tick_interval: Duration,

    /// Seed for shuffle picks; `None` seeds from OS entropy
    pub shuffle_seed: Option<u64>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            looping_playlist: true,
            auto_next_play: true,
            auto_resume_after_interrupt: true,
            play_mode: PlayMode::Loop,
            time_tick_interval: Duration::from_secs(1),
            shuffle_seed: None,
        }
    }
}

impl PlaybackConfig {
    /// Check the configuration before a manager is built from it
    pub fn validate(&self) -> Result<()> {
        if self.time_tick_interval.is_zero() {
            return Err(PlaybackError::InvalidConfig(
                "time_tick_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

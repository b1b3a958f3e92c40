//! Platform-agnostic engine capability
//!
//! Abstracts the media rendering engine (AVPlayer, GStreamer, a CPAL
//! pipeline...) down to what the session controller needs: open a track,
//! play/pause/seek it, and report status, buffering and time progress.
//!
//! Engines report back through the sinks they are handed. Sinks are
//! `Send + Clone`, so a delivery may come from any engine thread; it is
//! queued and only applied when the host pumps
//! [`PlaybackManager::process_events`](crate::PlaybackManager::process_events)
//! on its control context.

use crate::bridge::{EngineEventSink, InterruptionSink, SeekCompletion, TimeTickSink};
use crate::error::Result;
use crate::types::TrackLocator;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Session status reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineStatus {
    /// Media is loaded and can start rendering
    ReadyToPlay,

    /// The track could not be loaded or rendered
    Failed,

    /// The engine lost track of the session state
    Unknown,
}

/// Factory for per-track engine sessions
pub trait MediaEngine: Send {
    /// Open a session for `track`
    ///
    /// The session starts paused; the controller calls `play` once the
    /// engine reports [`EngineStatus::ReadyToPlay`].
    fn create_session(&mut self, track: &TrackLocator) -> Result<Box<dyn EngineSession>>;
}

/// One-track engine instance
///
/// Owned exclusively by the playback manager and dropped on teardown.
pub trait EngineSession: Send {
    /// Start or resume rendering
    fn play(&mut self);

    /// Pause rendering
    fn pause(&mut self);

    /// Seek to `time`
    ///
    /// Completes asynchronously: the engine calls
    /// [`SeekCompletion::complete`] once, with `false` if the seek was
    /// interrupted or failed.
    fn seek(&mut self, time: Duration, completion: SeekCompletion);

    /// Track duration, `None` while unknown
    fn current_duration(&self) -> Option<Duration>;

    /// End of the buffered range
    fn buffered_range_end(&self) -> Duration;

    /// Start delivering status, buffer and end-of-track notifications
    fn observe(&mut self, sink: EngineEventSink);

    /// Stop delivering notifications registered by `observe`
    fn stop_observing(&mut self);

    /// Start a periodic time callback at `interval`
    fn add_periodic_time_observer(&mut self, interval: Duration, sink: TimeTickSink);

    /// Cancel the periodic time callback
    fn remove_periodic_time_observer(&mut self);
}

/// Phase of a system audio interruption (phone call, alarm...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterruptionPhase {
    /// Another client took over audio output
    Began,

    /// Audio output is available again
    Ended,
}

/// Source of begin/end interruption signals
///
/// Subscribed when handed to the manager and unsubscribed when the manager
/// shuts down.
pub trait InterruptionSource: Send {
    /// Start delivering interruptions into `sink`
    fn subscribe(&mut self, sink: InterruptionSink);

    /// Stop delivering interruptions
    fn unsubscribe(&mut self);
}

//! Playback Events
//!
//! Change notifications for the host application. Every observable field
//! change is forwarded synchronously to one registered listener:
//! - Track changes (new track loading, or `None` when stopped)
//! - Time changes (periodic ticks, seek completion, resets)
//! - Duration and buffered-duration changes
//! - Status changes

use crate::types::{PlaybackStatus, TrackLocator};
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Events emitted by the playback manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// A new track started loading (`None` once nothing is loaded)
    TrackChanged {
        /// Locator of the new track
        track: Option<TrackLocator>,
    },

    /// Current play position changed
    TimeChanged {
        /// New play position
        time: Duration,
    },

    /// Track duration changed
    DurationChanged {
        /// New duration
        duration: Duration,
    },

    /// Buffered extent changed
    AvailableDurationChanged {
        /// End of the buffered range
        duration: Duration,
    },

    /// Status changed
    StatusChanged {
        /// The new status
        status: PlaybackStatus,
    },
}

/// Receiver of playback change notifications
///
/// Callbacks run synchronously on the manager's control context. Every
/// method defaults to doing nothing.
pub trait PlaybackListener: Send + Sync {
    /// A new track started loading
    ///
    /// Followed by `None` when the engine cannot open the track or the
    /// manager stops.
    fn on_track_changed(&self, _track: Option<&TrackLocator>) {}

    /// Current play position changed
    fn on_time_changed(&self, _time: Duration) {}

    /// Track duration changed
    fn on_duration_changed(&self, _duration: Duration) {}

    /// Buffered extent changed
    fn on_available_duration_changed(&self, _duration: Duration) {}

    /// Status changed
    fn on_status_changed(&self, _status: PlaybackStatus) {}
}

/// Forwards every notification into a channel as a [`PlaybackEvent`]
///
/// Sends that fail because the receiver is gone are dropped.
impl PlaybackListener for Sender<PlaybackEvent> {
    fn on_track_changed(&self, track: Option<&TrackLocator>) {
        self.send(PlaybackEvent::TrackChanged {
            track: track.cloned(),
        })
        .ok();
    }

    fn on_time_changed(&self, time: Duration) {
        self.send(PlaybackEvent::TimeChanged { time }).ok();
    }

    fn on_duration_changed(&self, duration: Duration) {
        self.send(PlaybackEvent::DurationChanged { duration }).ok();
    }

    fn on_available_duration_changed(&self, duration: Duration) {
        self.send(PlaybackEvent::AvailableDurationChanged { duration })
            .ok();
    }

    fn on_status_changed(&self, status: PlaybackStatus) {
        self.send(PlaybackEvent::StatusChanged { status }).ok();
    }
}

/// Stateless forwarder to the registered listener
///
/// Holds a shared handle only; the host keeps its own and unregisters with
/// `set_listener(None)` before dropping the listener's resources.
#[derive(Default, Clone)]
pub(crate) struct DelegateNotifier {
    listener: Option<Arc<dyn PlaybackListener>>,
}

impl DelegateNotifier {
    pub(crate) fn set_listener(&mut self, listener: Option<Arc<dyn PlaybackListener>>) {
        self.listener = listener;
    }

    pub(crate) fn track_changed(&self, track: Option<&TrackLocator>) {
        if let Some(listener) = &self.listener {
            listener.on_track_changed(track);
        }
    }

    pub(crate) fn time_changed(&self, time: Duration) {
        if let Some(listener) = &self.listener {
            listener.on_time_changed(time);
        }
    }

    pub(crate) fn duration_changed(&self, duration: Duration) {
        if let Some(listener) = &self.listener {
            listener.on_duration_changed(duration);
        }
    }

    pub(crate) fn available_duration_changed(&self, duration: Duration) {
        if let Some(listener) = &self.listener {
            listener.on_available_duration_changed(duration);
        }
    }

    pub(crate) fn status_changed(&self, status: PlaybackStatus) {
        if let Some(listener) = &self.listener {
            listener.on_status_changed(status);
        }
    }
}

impl std::fmt::Debug for DelegateNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegateNotifier")
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

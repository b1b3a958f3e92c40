//! Playback manager - core orchestration
//!
//! Coordinates the playlist navigator, the engine session and its observers,
//! status transitions and listener notifications.
//!
//! ```text
//!            load / set_index / next / previous
//!                           │
//!   Idle ──────────────> Buffering ──ready──> Playing <──> Paused
//!    ^                      ^                    │            ^
//!    │ stop                 │ track change       └─failure────┘
//! ```

use crate::{
    bridge::{Delivery, EngineEvent, EngineObserverBridge, SessionId},
    engine::{EngineSession, EngineStatus, InterruptionPhase, InterruptionSource, MediaEngine},
    error::Result,
    events::{DelegateNotifier, PlaybackListener},
    navigator::PlaylistNavigator,
    shuffle::ShuffleIndexGenerator,
    types::{PlayMode, PlaybackConfig, PlaybackStatus, TimingSnapshot, TrackLocator},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Seek waiting for its engine completion
#[derive(Debug, Clone, Copy)]
struct PendingSeek {
    ticket: u64,
    target: Duration,
    resume: bool,
}

/// The single live engine session
struct ActiveSession {
    id: SessionId,
    index: usize,
    track: TrackLocator,
    handle: Box<dyn EngineSession>,
    pending_seek: Option<PendingSeek>,
}

/// Whether a track is loaded
enum SessionState {
    NoSession,
    Active(ActiveSession),
}

/// Central playback session control
///
/// Owns the playlist cursor, the play-mode policy, the status state machine
/// and the one live engine session. All commands and all engine deliveries
/// run on the caller's control context: commands apply immediately, engine
/// notifications are queued by their sinks and applied by
/// [`process_events`](Self::process_events).
///
/// Commands that cannot apply (empty playlist, out-of-range index without
/// looping, transport with no session) are silent no-ops.
pub struct PlaybackManager {
    // State
    status: PlaybackStatus,
    index: usize,
    session: SessionState,
    timing: TimingSnapshot,
    paused_by_user: bool,

    // Settings
    config: PlaybackConfig,
    navigator: PlaylistNavigator,

    // Collaborators
    engine: Box<dyn MediaEngine>,
    bridge: EngineObserverBridge,
    notifier: DelegateNotifier,
    interruptions: Option<Box<dyn InterruptionSource>>,
}

impl PlaybackManager {
    /// Create new playback manager on top of `engine`
    pub fn new(config: PlaybackConfig, engine: Box<dyn MediaEngine>) -> Result<Self> {
        config.validate()?;

        let shuffle = match config.shuffle_seed {
            Some(seed) => ShuffleIndexGenerator::from_seed(seed),
            None => ShuffleIndexGenerator::new(),
        };

        Ok(Self {
            status: PlaybackStatus::Idle,
            index: 0,
            session: SessionState::NoSession,
            timing: TimingSnapshot::default(),
            paused_by_user: false,
            navigator: PlaylistNavigator::new(config.looping_playlist, shuffle),
            config,
            engine,
            bridge: EngineObserverBridge::new(),
            notifier: DelegateNotifier::default(),
            interruptions: None,
        })
    }

    /// Subscribe to interruption signals for the manager's lifetime
    ///
    /// Replaces (and unsubscribes) any previous source.
    pub fn with_interruption_source(mut self, mut source: Box<dyn InterruptionSource>) -> Self {
        if let Some(previous) = self.interruptions.as_mut() {
            self.bridge.unsubscribe_interruptions(previous.as_mut());
        }
        self.bridge.subscribe_interruptions(source.as_mut());
        self.interruptions = Some(source);
        self
    }

    /// Register the change listener (`None` unregisters)
    pub fn set_listener(&mut self, listener: Option<Arc<dyn PlaybackListener>>) {
        self.notifier.set_listener(listener);
    }

    // ===== Playlist =====

    /// Load a playlist and start at `start`
    ///
    /// An identical playlist is kept and only the index is reconsidered. The
    /// track is (re)loaded unless it is already the loaded one. An empty
    /// playlist stops playback.
    pub fn set_playlist(&mut self, playlist: Vec<TrackLocator>, start: isize) {
        let Some(index) = self.navigator.load(playlist, start) else {
            if self.navigator.is_empty() {
                self.stop();
            }
            return;
        };

        let already_loaded = match &self.session {
            SessionState::Active(active) => {
                active.index == index && self.navigator.get(index) == Some(&active.track)
            }
            SessionState::NoSession => false,
        };
        if already_loaded {
            debug!("Track at index {} already loaded", index);
            self.index = index;
            return;
        }

        self.load_index(index);
    }

    /// Jump to `index` (wrapped or rejected per the looping policy)
    pub fn set_index(&mut self, index: isize) {
        if let Some(resolved) = self.navigator.resolve(index) {
            self.load_index(resolved);
        }
    }

    /// Skip to the next track
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) {
        if let Some(index) = self.navigator.next(self.index, self.config.play_mode) {
            self.load_index(index);
        }
    }

    /// Go back to the previous track
    pub fn previous(&mut self) {
        if let Some(index) = self.navigator.previous(self.index, self.config.play_mode) {
            self.load_index(index);
        }
    }

    /// Check if there is a next track
    pub fn has_next(&self) -> bool {
        self.navigator.has_next(self.index, self.config.play_mode)
    }

    /// Check if there is a previous track
    pub fn has_previous(&self) -> bool {
        self.navigator.has_previous(self.index, self.config.play_mode)
    }

    fn load_index(&mut self, index: usize) {
        self.index = index;
        self.prepare_to_play();
    }

    /// Replace the live session with one for the track under the cursor
    fn prepare_to_play(&mut self) {
        let Some(track) = self.navigator.get(self.index).cloned() else {
            return;
        };

        self.pause_playback();
        self.notifier.track_changed(Some(&track));
        self.teardown_session();
        self.reset_timing();
        self.paused_by_user = false;

        info!("Loading track {} (index {})", track, self.index);
        match self.engine.create_session(&track) {
            Ok(mut handle) => {
                let id = self.bridge.attach(handle.as_mut());
                self.session = SessionState::Active(ActiveSession {
                    id,
                    index: self.index,
                    track,
                    handle,
                    pending_seek: None,
                });
                self.set_status(PlaybackStatus::Buffering);
            }
            Err(e) => {
                warn!("Failed to load {}: {}", track, e);
                self.notifier.track_changed(None);
                self.set_status(PlaybackStatus::Paused);
            }
        }
    }

    /// Detach observers and release the live session, if any
    fn teardown_session(&mut self) {
        let previous = std::mem::replace(&mut self.session, SessionState::NoSession);
        if let SessionState::Active(mut active) = previous {
            active.handle.pause();
            self.bridge.detach(active.handle.as_mut());
            if active.pending_seek.is_some() {
                debug!("Dropping in-flight seek for {}", active.id);
            }
            info!("Released {} ({})", active.id, active.track);
        }
    }

    /// Unload the current track and return to `Idle`
    pub fn stop(&mut self) {
        if !self.has_session() && self.status == PlaybackStatus::Idle {
            return;
        }

        self.pause_playback();
        self.notifier.track_changed(None);
        self.teardown_session();
        self.reset_timing();
        self.set_status(PlaybackStatus::Idle);
    }

    // ===== Playback Control =====

    /// Start or resume playback of the loaded track
    pub fn play(&mut self) {
        let SessionState::Active(active) = &mut self.session else {
            return;
        };

        self.bridge
            .ensure_time_observer(active.handle.as_mut(), self.config.time_tick_interval);
        active.handle.play();
        self.paused_by_user = false;
        self.set_status(PlaybackStatus::Playing);
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if !self.has_session() {
            return;
        }
        self.paused_by_user = true;
        self.pause_playback();
    }

    /// Pause if playing, play otherwise
    pub fn toggle_play_pause(&mut self) {
        if self.status == PlaybackStatus::Playing {
            self.pause();
        } else {
            self.play();
        }
    }

    fn pause_playback(&mut self) {
        let SessionState::Active(active) = &mut self.session else {
            return;
        };
        active.handle.pause();
        self.set_status(PlaybackStatus::Paused);
    }

    // ===== Seek =====

    /// Seek to `time` in the loaded track
    ///
    /// Playback pauses and the time observer stops until the engine
    /// completes the seek; `current_time` is stale meanwhile. A newer seek
    /// supersedes any seek still in flight.
    pub fn seek(&mut self, time: Duration, resume_play: bool) {
        let SessionState::Active(active) = &mut self.session else {
            return;
        };
        self.bridge.stop_time_observer(active.handle.as_mut());
        self.pause_playback();

        let SessionState::Active(active) = &mut self.session else {
            return;
        };
        let Some((ticket, completion)) = self.bridge.seek_completion() else {
            return;
        };
        debug!("Seeking {} to {:?} (ticket {})", active.id, time, ticket);
        active.pending_seek = Some(PendingSeek {
            ticket,
            target: time,
            resume: resume_play,
        });
        active.handle.seek(time, completion);
    }

    /// Seek to a fraction (0.0 - 1.0) of the known duration
    pub fn seek_to_fraction(&mut self, fraction: f32, resume_play: bool) {
        if !fraction.is_finite() || self.timing.duration.is_zero() {
            return;
        }
        let position = self.timing.duration.mul_f32(fraction.clamp(0.0, 1.0));
        self.seek(position, resume_play);
    }

    fn finish_seek(&mut self, ticket: u64, finished: bool) {
        let SessionState::Active(active) = &mut self.session else {
            return;
        };
        let Some(pending) = active.pending_seek.filter(|p| p.ticket == ticket) else {
            debug!("Discarding stale seek completion (ticket {})", ticket);
            return;
        };
        active.pending_seek = None;

        if !finished {
            debug!("Seek to {:?} did not finish", pending.target);
            return;
        }

        self.set_current_time(pending.target);
        if pending.resume {
            self.play();
        }
    }

    // ===== Engine Events =====

    /// Apply every queued engine and interruption delivery
    ///
    /// Deliveries for a superseded session or observer are discarded.
    /// Returns the number of deliveries applied.
    pub fn process_events(&mut self) -> usize {
        let mut applied = 0;
        while let Some(delivery) = self.bridge.try_next() {
            if self.dispatch(delivery) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait up to `timeout` for a delivery, then apply everything queued
    pub fn process_events_timeout(&mut self, timeout: Duration) -> usize {
        let Some(first) = self.bridge.next_timeout(timeout) else {
            return 0;
        };
        usize::from(self.dispatch(first)) + self.process_events()
    }

    fn dispatch(&mut self, delivery: Delivery) -> bool {
        if !self.bridge.admits(&delivery) {
            debug!("Discarding stale delivery {:?}", delivery);
            return false;
        }

        match delivery {
            Delivery::Engine { event, .. } => self.handle_engine_event(event),
            Delivery::Tick { time, .. } => self.set_current_time(time),
            Delivery::SeekFinished {
                ticket, finished, ..
            } => self.finish_seek(ticket, finished),
            Delivery::Interruption(phase) => self.handle_interruption(phase),
        }
        true
    }

    fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Status(EngineStatus::ReadyToPlay) => self.on_ready(),
            EngineEvent::Status(status) => {
                warn!(
                    "Engine reported {:?} for {:?}",
                    status,
                    self.current_track().map(TrackLocator::as_str)
                );
                self.pause_playback();
            }
            EngineEvent::BufferEmpty => {
                if self.status == PlaybackStatus::Playing && self.buffered_ahead() {
                    self.play();
                } else {
                    self.pause_playback();
                }
            }
            EngineEvent::LikelyToKeepUp => {
                if self.status == PlaybackStatus::Buffering && self.buffered_ahead() {
                    self.play();
                }
            }
            EngineEvent::BufferedRangeChanged => {
                if let SessionState::Active(active) = &self.session {
                    let end = active.handle.buffered_range_end();
                    self.set_available_duration(end);
                }
            }
            EngineEvent::EndOfTrack => self.on_end_of_track(),
        }
    }

    fn buffered_ahead(&self) -> bool {
        self.timing.available_duration > self.timing.current_time
    }

    fn on_ready(&mut self) {
        let SessionState::Active(active) = &self.session else {
            return;
        };
        let duration = active.handle.current_duration().unwrap_or_default();
        let seeking = active.pending_seek.is_some();
        self.set_duration(duration);

        // Ticker and resume wait for the seek completion
        if seeking {
            debug!("Ready while a seek is pending, deferring to its completion");
            return;
        }

        if let SessionState::Active(active) = &mut self.session {
            self.bridge
                .restart_time_observer(active.handle.as_mut(), self.config.time_tick_interval);
        }

        if self.paused_by_user {
            debug!("Ready while paused by user, staying paused");
        } else {
            self.play();
        }
    }

    fn on_end_of_track(&mut self) {
        self.pause_playback();

        if !self.has_next() || !self.config.auto_next_play {
            self.seek(Duration::ZERO, false);
            return;
        }

        match self.config.play_mode {
            PlayMode::Loop | PlayMode::Shuffle => self.next(),
            PlayMode::RepeatOne => self.seek(Duration::ZERO, true),
        }
    }

    fn handle_interruption(&mut self, phase: InterruptionPhase) {
        debug!("Audio interruption {:?}", phase);
        match phase {
            InterruptionPhase::Began => {
                if self.status == PlaybackStatus::Playing {
                    self.pause_playback();
                }
            }
            InterruptionPhase::Ended => {
                if self.config.auto_resume_after_interrupt {
                    self.play();
                }
            }
        }
    }

    // ===== Notifying Setters =====

    fn set_status(&mut self, status: PlaybackStatus) {
        if self.status == status {
            return;
        }
        debug!("Status {:?} -> {:?}", self.status, status);
        self.status = status;
        self.notifier.status_changed(status);
    }

    fn set_current_time(&mut self, time: Duration) {
        self.timing.current_time = time;
        self.notifier.time_changed(time);
    }

    fn set_duration(&mut self, duration: Duration) {
        self.timing.duration = duration;
        self.notifier.duration_changed(duration);
    }

    fn set_available_duration(&mut self, duration: Duration) {
        self.timing.available_duration = duration;
        self.notifier.available_duration_changed(duration);
    }

    fn reset_timing(&mut self) {
        self.set_current_time(Duration::ZERO);
        self.set_duration(Duration::ZERO);
        self.set_available_duration(Duration::ZERO);
    }

    // ===== Settings =====

    /// Set play mode
    pub fn set_play_mode(&mut self, mode: PlayMode) {
        self.config.play_mode = mode;
    }

    /// Get current play mode
    pub fn play_mode(&self) -> PlayMode {
        self.config.play_mode
    }

    /// Wrap past the playlist ends or not
    pub fn set_looping_playlist(&mut self, looping: bool) {
        self.config.looping_playlist = looping;
        self.navigator.set_looping(looping);
    }

    /// Advance automatically when a track ends
    pub fn set_auto_next_play(&mut self, enabled: bool) {
        self.config.auto_next_play = enabled;
    }

    /// Resume automatically when an interruption ends
    pub fn set_auto_resume_after_interrupt(&mut self, enabled: bool) {
        self.config.auto_resume_after_interrupt = enabled;
    }

    /// Current configuration
    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    // ===== State Queries =====

    /// Get current status
    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    /// Loaded playlist
    pub fn playlist(&self) -> &[TrackLocator] {
        self.navigator.tracks()
    }

    /// Playlist cursor (`None` while the playlist is empty)
    pub fn index(&self) -> Option<usize> {
        (!self.navigator.is_empty()).then_some(self.index)
    }

    /// Track of the live session
    pub fn current_track(&self) -> Option<&TrackLocator> {
        match &self.session {
            SessionState::Active(active) => Some(&active.track),
            SessionState::NoSession => None,
        }
    }

    /// Whether an engine session is live
    pub fn has_session(&self) -> bool {
        matches!(self.session, SessionState::Active(_))
    }

    /// Current play position
    pub fn current_time(&self) -> Duration {
        self.timing.current_time
    }

    /// Duration of the loaded track (zero until known)
    pub fn duration(&self) -> Duration {
        self.timing.duration
    }

    /// End of the buffered range
    pub fn available_duration(&self) -> Duration {
        self.timing.available_duration
    }

    /// Full timing snapshot
    pub fn timing(&self) -> TimingSnapshot {
        self.timing
    }
}

impl Drop for PlaybackManager {
    fn drop(&mut self) {
        self.teardown_session();
        if let Some(source) = self.interruptions.as_mut() {
            self.bridge.unsubscribe_interruptions(source.as_mut());
        }
        debug!("Playback manager shut down");
    }
}

impl std::fmt::Debug for PlaybackManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackManager")
            .field("status", &self.status)
            .field("index", &self.index())
            .field("track", &self.current_track())
            .field("timing", &self.timing)
            .field("config", &self.config)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}

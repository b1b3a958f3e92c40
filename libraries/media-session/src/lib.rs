//! Media Session - Playback Session Control
//!
//! Platform-agnostic playlist and playback-session control that sits between
//! a host application and a media rendering engine.
//!
//! This crate provides:
//! - Playlist navigation (single-step wrap or strict bounds)
//! - Play modes (Loop, RepeatOne, Shuffle)
//! - Status state machine (Idle, Buffering, Playing, Paused)
//! - Engine event bridging with stale-delivery filtering
//! - Seek with superseded-completion detection
//! - Change notifications to one registered listener
//!
//! # Architecture
//!
//! `media-session` never decodes or renders media:
//! - No dependency on a specific engine (AVPlayer, GStreamer, CPAL...)
//! - No UI, no persistence, no network fetch
//!
//! The engine is provided via the [`MediaEngine`] / [`EngineSession`]
//! traits. Engine callbacks may arrive on any thread; they are queued and
//! applied when the host calls [`PlaybackManager::process_events`] on its
//! control context.
//!
//! # Example: Basic Session
//!
//! ```rust,no_run
//! use media_session::{
//!     EngineEventSink, EngineSession, MediaEngine, PlaybackConfig, PlaybackManager, Result,
//!     SeekCompletion, TimeTickSink, TrackLocator,
//! };
//! use std::time::Duration;
//!
//! // Implement the engine capability for your platform
//! struct MyEngine;
//! struct MySession;
//!
//! impl MediaEngine for MyEngine {
//!     fn create_session(&mut self, _track: &TrackLocator) -> Result<Box<dyn EngineSession>> {
//!         Ok(Box::new(MySession))
//!     }
//! }
//!
//! impl EngineSession for MySession {
//!     fn play(&mut self) {}
//!     fn pause(&mut self) {}
//!     fn seek(&mut self, _time: Duration, completion: SeekCompletion) {
//!         completion.complete(true);
//!     }
//!     fn current_duration(&self) -> Option<Duration> {
//!         Some(Duration::from_secs(180))
//!     }
//!     fn buffered_range_end(&self) -> Duration {
//!         Duration::ZERO
//!     }
//!     fn observe(&mut self, _sink: EngineEventSink) {}
//!     fn stop_observing(&mut self) {}
//!     fn add_periodic_time_observer(&mut self, _interval: Duration, _sink: TimeTickSink) {}
//!     fn remove_periodic_time_observer(&mut self) {}
//! }
//!
//! let mut manager = PlaybackManager::new(PlaybackConfig::default(), Box::new(MyEngine))?;
//!
//! manager.set_playlist(
//!     vec![
//!         TrackLocator::from("https://media.example/a.mp3"),
//!         TrackLocator::from("https://media.example/b.mp3"),
//!     ],
//!     0,
//! );
//!
//! // On the control loop
//! manager.process_events();
//! manager.next();
//! manager.seek(Duration::from_secs(30), true);
//! # Ok::<(), media_session::PlaybackError>(())
//! ```
//!
//! # Example: Observing Changes
//!
//! ```rust
//! use media_session::PlaybackEvent;
//! use std::sync::Arc;
//!
//! let (tx, rx) = crossbeam_channel::unbounded::<PlaybackEvent>();
//! // manager.set_listener(Some(Arc::new(tx)));
//! # let _listener: Arc<dyn media_session::PlaybackListener> = Arc::new(tx);
//! for event in rx.try_iter() {
//!     println!("{:?}", event);
//! }
//! ```

mod bridge;
mod engine;
mod error;
mod events;
mod manager;
pub mod navigator;
pub mod shuffle;
pub mod types;

// Public exports
pub use bridge::{EngineEventSink, InterruptionSink, SeekCompletion, SessionId, TimeTickSink};
pub use engine::{EngineSession, EngineStatus, InterruptionPhase, InterruptionSource, MediaEngine};
pub use error::{PlaybackError, Result};
pub use events::{PlaybackEvent, PlaybackListener};
pub use manager::PlaybackManager;
pub use navigator::PlaylistNavigator;
pub use shuffle::ShuffleIndexGenerator;
pub use types::{PlayMode, PlaybackConfig, PlaybackStatus, TimingSnapshot, TrackLocator};

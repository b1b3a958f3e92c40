//! Shared test helpers: a scripted engine and interruption source
//!
//! The fake engine records every call and keeps the sinks the manager hands
//! it, so tests can fire engine notifications the way a real engine thread
//! would, then pump `process_events()`.

#![allow(dead_code)]

use crossbeam_channel::{unbounded, Receiver};
use media_session::{
    EngineEventSink, EngineSession, EngineStatus, InterruptionSink, InterruptionSource,
    MediaEngine, PlaybackConfig, PlaybackError, PlaybackEvent, PlaybackManager, Result,
    SeekCompletion, TimeTickSink, TrackLocator,
};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Calls the manager made into the engine, tagged with the session number
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Create(TrackLocator),
    Play(usize),
    Pause(usize),
    Seek(usize, Duration),
    Observe(usize),
    StopObserving(usize),
    AddTicker(usize),
    RemoveTicker(usize),
    Release(usize),
}

struct SessionSlot {
    track: TrackLocator,
    events: Option<EngineEventSink>,
    ticker: Option<TimeTickSink>,
    released: bool,
}

struct EngineState {
    calls: Vec<EngineCall>,
    sessions: Vec<SessionSlot>,
    pending_seeks: VecDeque<(Duration, SeekCompletion)>,
    auto_complete_seeks: bool,
    failing: HashSet<TrackLocator>,
    duration: Option<Duration>,
    buffered: Duration,
}

/// Scripted engine shared between the test and the manager
#[derive(Clone)]
pub struct FakeEngine {
    state: Arc<Mutex<EngineState>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(EngineState {
                calls: Vec::new(),
                sessions: Vec::new(),
                pending_seeks: VecDeque::new(),
                auto_complete_seeks: true,
                failing: HashSet::new(),
                duration: Some(Duration::from_secs(180)),
                buffered: Duration::ZERO,
            })),
        }
    }

    /// Hold seek completions until `complete_seek` is called
    pub fn with_manual_seeks(self) -> Self {
        self.state.lock().unwrap().auto_complete_seeks = false;
        self
    }

    /// Make session creation fail for `track`
    pub fn fail_on(&self, track: &TrackLocator) {
        self.state.lock().unwrap().failing.insert(track.clone());
    }

    pub fn set_duration(&self, duration: Option<Duration>) {
        self.state.lock().unwrap().duration = duration;
    }

    pub fn set_buffered(&self, buffered: Duration) {
        self.state.lock().unwrap().buffered = buffered;
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn session_count(&self) -> usize {
        self.state.lock().unwrap().sessions.len()
    }

    /// Sessions created and not yet released
    pub fn live_sessions(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .sessions
            .iter()
            .filter(|s| !s.released)
            .count()
    }

    pub fn track_of(&self, session: usize) -> TrackLocator {
        self.state.lock().unwrap().sessions[session].track.clone()
    }

    /// Event sink of session number `session`, even after it was detached
    pub fn events_for(&self, session: usize) -> EngineEventSink {
        self.state.lock().unwrap().sessions[session]
            .events
            .clone()
            .expect("session never observed")
    }

    /// Event sink of the newest session
    pub fn events(&self) -> EngineEventSink {
        let last = self.session_count() - 1;
        self.events_for(last)
    }

    /// Time tick sink of the newest session, if an observer is registered
    pub fn ticker(&self) -> Option<TimeTickSink> {
        let state = self.state.lock().unwrap();
        state.sessions.last().and_then(|s| s.ticker.clone())
    }

    pub fn is_observing(&self, session: usize) -> bool {
        self.state.lock().unwrap().sessions[session]
            .events
            .as_ref()
            .is_some_and(|s| s.is_attached())
    }

    pub fn pending_seeks(&self) -> usize {
        self.state.lock().unwrap().pending_seeks.len()
    }

    /// Complete the oldest held seek
    pub fn complete_seek(&self, finished: bool) {
        let (_, completion) = self
            .state
            .lock()
            .unwrap()
            .pending_seeks
            .pop_front()
            .expect("no pending seek");
        completion.complete(finished);
    }

    fn record(&self, call: EngineCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl MediaEngine for FakeEngine {
    fn create_session(&mut self, track: &TrackLocator) -> Result<Box<dyn EngineSession>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(EngineCall::Create(track.clone()));
        if state.failing.contains(track) {
            return Err(PlaybackError::SessionCreation(format!("cannot open {}", track)));
        }

        state.sessions.push(SessionSlot {
            track: track.clone(),
            events: None,
            ticker: None,
            released: false,
        });
        Ok(Box::new(FakeSession {
            number: state.sessions.len() - 1,
            engine: self.clone(),
        }))
    }
}

struct FakeSession {
    number: usize,
    engine: FakeEngine,
}

impl EngineSession for FakeSession {
    fn play(&mut self) {
        self.engine.record(EngineCall::Play(self.number));
    }

    fn pause(&mut self) {
        self.engine.record(EngineCall::Pause(self.number));
    }

    fn seek(&mut self, time: Duration, completion: SeekCompletion) {
        let mut state = self.engine.state.lock().unwrap();
        state.calls.push(EngineCall::Seek(self.number, time));
        if state.auto_complete_seeks {
            completion.complete(true);
        } else {
            state.pending_seeks.push_back((time, completion));
        }
    }

    fn current_duration(&self) -> Option<Duration> {
        self.engine.state.lock().unwrap().duration
    }

    fn buffered_range_end(&self) -> Duration {
        self.engine.state.lock().unwrap().buffered
    }

    fn observe(&mut self, sink: EngineEventSink) {
        let mut state = self.engine.state.lock().unwrap();
        state.calls.push(EngineCall::Observe(self.number));
        state.sessions[self.number].events = Some(sink);
    }

    fn stop_observing(&mut self) {
        self.engine.record(EngineCall::StopObserving(self.number));
    }

    fn add_periodic_time_observer(&mut self, _interval: Duration, sink: TimeTickSink) {
        let mut state = self.engine.state.lock().unwrap();
        state.calls.push(EngineCall::AddTicker(self.number));
        state.sessions[self.number].ticker = Some(sink);
    }

    fn remove_periodic_time_observer(&mut self) {
        let mut state = self.engine.state.lock().unwrap();
        state.calls.push(EngineCall::RemoveTicker(self.number));
        state.sessions[self.number].ticker = None;
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        let mut state = self.engine.state.lock().unwrap();
        state.calls.push(EngineCall::Release(self.number));
        state.sessions[self.number].released = true;
    }
}

/// Interruption source driven by the test
#[derive(Clone, Default)]
pub struct FakeInterruptions {
    sink: Arc<Mutex<Option<InterruptionSink>>>,
    unsubscribed: Arc<Mutex<usize>>,
}

impl FakeInterruptions {
    pub fn begin(&self) {
        if let Some(sink) = self.sink.lock().unwrap().as_ref() {
            sink.began();
        }
    }

    pub fn end(&self) {
        if let Some(sink) = self.sink.lock().unwrap().as_ref() {
            sink.ended();
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.sink.lock().unwrap().is_some()
    }

    pub fn unsubscribe_count(&self) -> usize {
        *self.unsubscribed.lock().unwrap()
    }
}

impl InterruptionSource for FakeInterruptions {
    fn subscribe(&mut self, sink: InterruptionSink) {
        *self.sink.lock().unwrap() = Some(sink);
    }

    fn unsubscribe(&mut self) {
        *self.sink.lock().unwrap() = None;
        *self.unsubscribed.lock().unwrap() += 1;
    }
}

// ===== Builders =====

pub fn tracks(count: usize) -> Vec<TrackLocator> {
    (0..count)
        .map(|i| TrackLocator::new(format!("https://media.test/track{}.mp3", i)))
        .collect()
}

pub fn config() -> PlaybackConfig {
    PlaybackConfig {
        shuffle_seed: Some(17),
        ..Default::default()
    }
}

/// Manager wired to a fake engine with a channel listener
pub fn manager_with(
    config: PlaybackConfig,
    engine: &FakeEngine,
) -> (PlaybackManager, Receiver<PlaybackEvent>) {
    let (tx, rx) = unbounded();
    let mut manager = PlaybackManager::new(config, Box::new(engine.clone())).unwrap();
    manager.set_listener(Some(Arc::new(tx)));
    (manager, rx)
}

/// Report ready for the newest session and apply it
pub fn make_ready(manager: &mut PlaybackManager, engine: &FakeEngine) {
    engine.events().status_changed(EngineStatus::ReadyToPlay);
    manager.process_events();
}

/// Load `count` tracks at `start` and bring the session to `Playing`
pub fn playing_manager(
    config: PlaybackConfig,
    count: usize,
    start: isize,
) -> (PlaybackManager, FakeEngine, Receiver<PlaybackEvent>) {
    let engine = FakeEngine::new();
    let (mut manager, rx) = manager_with(config, &engine);
    manager.set_playlist(tracks(count), start);
    make_ready(&mut manager, &engine);
    drain(&rx);
    (manager, engine, rx)
}

pub fn drain(rx: &Receiver<PlaybackEvent>) -> Vec<PlaybackEvent> {
    rx.try_iter().collect()
}

pub fn statuses(events: &[PlaybackEvent]) -> Vec<media_session::PlaybackStatus> {
    events
        .iter()
        .filter_map(|e| match e {
            PlaybackEvent::StatusChanged { status } => Some(*status),
            _ => None,
        })
        .collect()
}

pub fn times(events: &[PlaybackEvent]) -> Vec<Duration> {
    events
        .iter()
        .filter_map(|e| match e {
            PlaybackEvent::TimeChanged { time } => Some(*time),
            _ => None,
        })
        .collect()
}

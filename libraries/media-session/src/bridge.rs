//! Engine observer bridge
//!
//! Subscribes to a session's notifications and marshals every delivery onto
//! the manager's control context.
//!
//! ## Architecture
//!
//! ```text
//! Engine threads                        Control context
//!       │                                     │
//!       │  sink.status_changed(..)            │
//!       │────────┐                            │
//!       │        ▼                            │
//!       │   [ unbounded channel ]  ──────────>│ process_events()
//!       │                                     │   admit? (session id,
//!       │                                     │   observer id, seek ticket)
//! ```
//!
//! Every delivery is tagged with the session id it was issued for. Detach
//! flips the session's liveness flag, so a stale sink stops enqueueing, and
//! anything already queued fails the id check and is dropped.

use crate::engine::{EngineSession, EngineStatus, InterruptionPhase, InterruptionSource};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Identity of one engine session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Notification raised by a session's observers
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum EngineEvent {
    Status(EngineStatus),
    BufferEmpty,
    LikelyToKeepUp,
    BufferedRangeChanged,
    EndOfTrack,
}

/// Anything queued for the control context
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Delivery {
    Engine {
        session: SessionId,
        event: EngineEvent,
    },
    Tick {
        session: SessionId,
        observer: u64,
        time: Duration,
    },
    SeekFinished {
        session: SessionId,
        ticket: u64,
        finished: bool,
    },
    Interruption(InterruptionPhase),
}

/// Sender side shared by all sinks
#[derive(Debug, Clone)]
struct Outlet {
    tx: Sender<Delivery>,
    alive: Arc<AtomicBool>,
}

impl Outlet {
    fn send(&self, delivery: Delivery) {
        if self.alive.load(Ordering::Acquire) {
            // The bridge owns the receiver, so this only fails during teardown
            self.tx.send(delivery).ok();
        }
    }

    fn is_open(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

/// Receives status, buffer and end-of-track notifications for one session
#[derive(Debug, Clone)]
pub struct EngineEventSink {
    session: SessionId,
    outlet: Outlet,
}

impl EngineEventSink {
    /// Session this sink delivers for
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Whether the session is still attached
    pub fn is_attached(&self) -> bool {
        self.outlet.is_open()
    }

    /// Session status changed
    pub fn status_changed(&self, status: EngineStatus) {
        self.emit(EngineEvent::Status(status));
    }

    /// Playback buffer ran empty (or refilled)
    pub fn buffer_empty(&self) {
        self.emit(EngineEvent::BufferEmpty);
    }

    /// Engine expects to keep up with playback
    pub fn likely_to_keep_up(&self) {
        self.emit(EngineEvent::LikelyToKeepUp);
    }

    /// Buffered range grew or moved
    pub fn buffered_range_changed(&self) {
        self.emit(EngineEvent::BufferedRangeChanged);
    }

    /// Track played to its end
    pub fn end_of_track(&self) {
        self.emit(EngineEvent::EndOfTrack);
    }

    fn emit(&self, event: EngineEvent) {
        self.outlet.send(Delivery::Engine {
            session: self.session,
            event,
        });
    }
}

/// Receives periodic time ticks for one observer registration
#[derive(Debug, Clone)]
pub struct TimeTickSink {
    session: SessionId,
    observer: u64,
    outlet: Outlet,
}

impl TimeTickSink {
    /// Report the current play position
    pub fn tick(&self, time: Duration) {
        self.outlet.send(Delivery::Tick {
            session: self.session,
            observer: self.observer,
            time,
        });
    }

    /// Whether the observer is still registered
    pub fn is_active(&self) -> bool {
        self.outlet.is_open()
    }
}

/// One-shot completion handle for a seek
#[derive(Debug)]
pub struct SeekCompletion {
    session: SessionId,
    ticket: u64,
    outlet: Outlet,
}

impl SeekCompletion {
    /// Report the seek outcome
    pub fn complete(self, finished: bool) {
        self.outlet.send(Delivery::SeekFinished {
            session: self.session,
            ticket: self.ticket,
            finished,
        });
    }
}

/// Receives interruption begin/end signals
#[derive(Debug, Clone)]
pub struct InterruptionSink {
    outlet: Outlet,
}

impl InterruptionSink {
    /// Audio interruption began
    pub fn began(&self) {
        self.outlet
            .send(Delivery::Interruption(InterruptionPhase::Began));
    }

    /// Audio interruption ended
    pub fn ended(&self) {
        self.outlet
            .send(Delivery::Interruption(InterruptionPhase::Ended));
    }
}

/// Live subscription set for the current session
#[derive(Debug)]
struct Attachment {
    session: SessionId,
    alive: Arc<AtomicBool>,
    ticker: Option<(u64, Arc<AtomicBool>)>,
}

/// Pairs engine subscriptions with teardown and filters stale deliveries
#[derive(Debug)]
pub(crate) struct EngineObserverBridge {
    tx: Sender<Delivery>,
    rx: Receiver<Delivery>,
    next_id: u64,
    attached: Option<Attachment>,
    interruptions: Option<Arc<AtomicBool>>,
}

impl EngineObserverBridge {
    pub(crate) fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            next_id: 0,
            attached: None,
            interruptions: None,
        }
    }

    fn fresh_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn outlet(&self, alive: &Arc<AtomicBool>) -> Outlet {
        Outlet {
            tx: self.tx.clone(),
            alive: Arc::clone(alive),
        }
    }

    /// Register for every session notification
    ///
    /// Callers detach the previous session first; the manager's single
    /// load/teardown path guarantees it.
    pub(crate) fn attach(&mut self, session: &mut dyn EngineSession) -> SessionId {
        debug_assert!(self.attached.is_none(), "attach without detach");

        let id = SessionId(self.fresh_id());
        let alive = Arc::new(AtomicBool::new(true));
        session.observe(EngineEventSink {
            session: id,
            outlet: self.outlet(&alive),
        });

        debug!("Attached {}", id);
        self.attached = Some(Attachment {
            session: id,
            alive,
            ticker: None,
        });
        id
    }

    /// Unregister everything `attach` and the time observer registered
    pub(crate) fn detach(&mut self, session: &mut dyn EngineSession) {
        let Some(attachment) = self.attached.take() else {
            return;
        };

        if let Some((_, ticking)) = attachment.ticker {
            ticking.store(false, Ordering::Release);
            session.remove_periodic_time_observer();
        }
        session.stop_observing();
        attachment.alive.store(false, Ordering::Release);
        debug!("Detached {}", attachment.session);
    }

    /// Add a periodic time observer unless one is already running
    pub(crate) fn ensure_time_observer(
        &mut self,
        session: &mut dyn EngineSession,
        interval: Duration,
    ) {
        if self.is_ticking() {
            return;
        }
        self.restart_time_observer(session, interval);
    }

    /// Replace any running time observer with a fresh one
    pub(crate) fn restart_time_observer(
        &mut self,
        session: &mut dyn EngineSession,
        interval: Duration,
    ) {
        self.stop_time_observer(session);

        let observer = self.fresh_id();
        let Some(attachment) = self.attached.as_mut() else {
            return;
        };

        let ticking = Arc::new(AtomicBool::new(true));
        let sink = TimeTickSink {
            session: attachment.session,
            observer,
            outlet: Outlet {
                tx: self.tx.clone(),
                alive: Arc::clone(&ticking),
            },
        };
        attachment.ticker = Some((observer, ticking));
        session.add_periodic_time_observer(interval, sink);
    }

    /// Cancel the periodic time observer, if any
    pub(crate) fn stop_time_observer(&mut self, session: &mut dyn EngineSession) {
        let ticker = self.attached.as_mut().and_then(|a| a.ticker.take());
        if let Some((_, ticking)) = ticker {
            ticking.store(false, Ordering::Release);
            session.remove_periodic_time_observer();
        }
    }

    /// Whether a periodic time observer is running
    pub(crate) fn is_ticking(&self) -> bool {
        self.attached
            .as_ref()
            .is_some_and(|a| a.ticker.is_some())
    }

    /// Completion handle for a new seek on the attached session
    pub(crate) fn seek_completion(&mut self) -> Option<(u64, SeekCompletion)> {
        let ticket = self.fresh_id();
        let attachment = self.attached.as_ref()?;
        let completion = SeekCompletion {
            session: attachment.session,
            ticket,
            outlet: self.outlet(&attachment.alive),
        };
        Some((ticket, completion))
    }

    /// Whether a delivery belongs to the live subscriptions
    pub(crate) fn admits(&self, delivery: &Delivery) -> bool {
        let current = self.attached.as_ref();
        match *delivery {
            Delivery::Engine { session, .. } | Delivery::SeekFinished { session, .. } => {
                current.is_some_and(|a| a.session == session)
            }
            Delivery::Tick {
                session, observer, ..
            } => current.is_some_and(|a| {
                a.session == session && a.ticker.as_ref().is_some_and(|(id, _)| *id == observer)
            }),
            Delivery::Interruption(_) => self.interruptions.is_some(),
        }
    }

    /// Hand `source` a sink for interruption signals
    pub(crate) fn subscribe_interruptions(&mut self, source: &mut dyn InterruptionSource) {
        let alive = Arc::new(AtomicBool::new(true));
        source.subscribe(InterruptionSink {
            outlet: self.outlet(&alive),
        });
        self.interruptions = Some(alive);
    }

    /// Stop accepting interruption signals from `source`
    pub(crate) fn unsubscribe_interruptions(&mut self, source: &mut dyn InterruptionSource) {
        if let Some(alive) = self.interruptions.take() {
            alive.store(false, Ordering::Release);
            source.unsubscribe();
        }
    }

    /// Next queued delivery, if any
    pub(crate) fn try_next(&self) -> Option<Delivery> {
        self.rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next delivery
    pub(crate) fn next_timeout(&self, timeout: Duration) -> Option<Delivery> {
        match self.rx.recv_timeout(timeout) {
            Ok(delivery) => Some(delivery),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

//! Playlist navigation
//!
//! Owns the ordered track list and resolves requested indices against the
//! looping policy:
//!
//! ```text
//! looping_playlist = false        looping_playlist = true
//! ─────────────────────────       ─────────────────────────
//! -1      -> rejected             -1      -> len - 1
//! 0..len  -> unchanged            0..len  -> unchanged
//! >= len  -> rejected             >= len  -> 0
//! ```
//!
//! The wrap is a single step: a request far past either end still lands on
//! the first or last track, never on a modulo position.

use crate::shuffle::ShuffleIndexGenerator;
use crate::types::{PlayMode, TrackLocator};

/// Resolve `requested` against a playlist of `len` tracks
///
/// Returns `None` when the request must be ignored (empty playlist, or
/// out of range without looping).
pub fn resolve_index(len: usize, looping: bool, requested: isize) -> Option<usize> {
    if len == 0 {
        return None;
    }

    if requested < 0 {
        return looping.then(|| len - 1);
    }

    let requested = requested as usize;
    if requested < len {
        Some(requested)
    } else if looping {
        Some(0)
    } else {
        None
    }
}

/// Ordered playlist plus the looping and shuffle policy
#[derive(Debug, Clone)]
pub struct PlaylistNavigator {
    tracks: Vec<TrackLocator>,
    looping: bool,
    shuffle: ShuffleIndexGenerator,
}

impl PlaylistNavigator {
    /// Create an empty navigator
    pub fn new(looping: bool, shuffle: ShuffleIndexGenerator) -> Self {
        Self {
            tracks: Vec::new(),
            looping,
            shuffle,
        }
    }

    /// Load a playlist and resolve the start index against it
    ///
    /// The stored list is only replaced when `playlist` differs by value.
    /// An empty playlist is always accepted and yields `None`. A start index
    /// rejected by the policy leaves the navigator untouched.
    pub fn load(&mut self, playlist: Vec<TrackLocator>, start: isize) -> Option<usize> {
        if playlist == self.tracks {
            return self.resolve(start);
        }

        if playlist.is_empty() {
            self.tracks.clear();
            return None;
        }

        let resolved = resolve_index(playlist.len(), self.looping, start)?;
        self.tracks = playlist;
        Some(resolved)
    }

    /// Resolve a requested index against the current playlist
    pub fn resolve(&self, requested: isize) -> Option<usize> {
        resolve_index(self.tracks.len(), self.looping, requested)
    }

    /// Index that follows `current` under `mode`
    pub fn next(&mut self, current: usize, mode: PlayMode) -> Option<usize> {
        self.step(current, mode, 1)
    }

    /// Index that precedes `current` under `mode`
    ///
    /// Shuffle ignores direction and picks a fresh random track.
    pub fn previous(&mut self, current: usize, mode: PlayMode) -> Option<usize> {
        self.step(current, mode, -1)
    }

    fn step(&mut self, current: usize, mode: PlayMode, delta: isize) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }

        match mode {
            PlayMode::Shuffle => Some(self.shuffle.next_index(self.tracks.len(), current)),
            PlayMode::Loop | PlayMode::RepeatOne => self.resolve(current as isize + delta),
        }
    }

    /// Whether a next track exists from `current`
    pub fn has_next(&self, current: usize, mode: PlayMode) -> bool {
        !self.tracks.is_empty()
            && (self.looping || mode == PlayMode::Shuffle || current + 1 < self.tracks.len())
    }

    /// Whether a previous track exists from `current`
    pub fn has_previous(&self, current: usize, mode: PlayMode) -> bool {
        !self.tracks.is_empty() && (self.looping || mode == PlayMode::Shuffle || current > 0)
    }

    /// Track at `index`
    pub fn get(&self, index: usize) -> Option<&TrackLocator> {
        self.tracks.get(index)
    }

    /// The loaded playlist
    pub fn tracks(&self) -> &[TrackLocator] {
        &self.tracks
    }

    /// Number of tracks
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if the playlist is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Change the looping policy
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }
}

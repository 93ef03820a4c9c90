use crate::Locator;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of one opened piece of media.
///
/// Engine notifications carry the id they were produced for so that late
/// callbacks from a superseded load can be told apart from current ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        SessionId(NEXT_ID.fetch_add(1, Ordering::SeqCst))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing loaded.
    Idle,
    Playing,
    Paused,
    Stopped,
    /// The engine reported a failure; only opening new media recovers.
    Errored,
}

impl PlaybackState {
    /// Whether transport commands (play, pause, stop, seek) have any effect.
    pub fn is_live(self) -> bool {
        !matches!(self, PlaybackState::Idle | PlaybackState::Errored)
    }
}

/// The currently loaded media.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    pub(crate) id: SessionId,
    pub(crate) source: Locator,
    pub(crate) duration_ms: u64,
    pub(crate) position_ms: u64,
    pub(crate) state: PlaybackState,
}

impl PlaybackSession {
    pub(crate) fn new(source: Locator) -> Self {
        PlaybackSession {
            id: SessionId::next(),
            source,
            duration_ms: 0,
            position_ms: 0,
            state: PlaybackState::Stopped,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn source(&self) -> &Locator {
        &self.source
    }

    /// Media duration, `0` until the engine reports it.
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn position_ms(&self) -> u64 {
        self.position_ms
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Stores an engine-reported position, keeping it inside a known duration.
    pub(crate) fn set_position(&mut self, position_ms: u64) {
        self.position_ms = if self.duration_ms > 0 {
            position_ms.min(self.duration_ms)
        } else {
            position_ms
        };
    }

    pub(crate) fn set_duration(&mut self, duration_ms: u64) {
        self.duration_ms = duration_ms;
        if duration_ms > 0 {
            self.position_ms = self.position_ms.min(duration_ms);
        }
    }
}

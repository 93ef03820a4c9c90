use crate::{Error, Locator, SessionId};

/// Playback state as reported by a media engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Playing,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    StateChanged(EngineState),
    PositionChanged(u64),
    DurationChanged(u64),
    Error(String),
    EndOfStream,
}

/// An [`EngineEvent`] tagged with the session it was produced for.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineNotification {
    pub session: SessionId,
    pub event: EngineEvent,
}

impl EngineNotification {
    pub fn new(session: SessionId, event: EngineEvent) -> Self {
        EngineNotification { session, event }
    }
}

/// Something that decodes and plays media.
///
/// Commands are fire-and-forget: an engine may accept `play` before the media is
/// ready and is expected to honour it once it is. Progress is reported back as
/// [`EngineNotification`]s delivered on the UI thread.
pub trait MediaEngine {
    /// Replaces the loaded media. Notifications for it must carry `session`.
    fn load(&mut self, session: SessionId, source: &Locator) -> Result<(), Error>;

    /// Drops the loaded media and releases any file handles.
    fn unload(&mut self);

    fn play(&mut self) -> Result<(), Error>;

    fn pause(&mut self) -> Result<(), Error>;

    /// Stops playback and releases the media's resources.
    fn stop(&mut self) -> Result<(), Error>;

    fn seek(&mut self, position_ms: u64) -> Result<(), Error>;

    /// `volume` is in `0..=100`.
    fn set_volume(&mut self, volume: u8) -> Result<(), Error>;

    /// `1.0` is normal speed.
    fn set_rate(&mut self, rate: f64) -> Result<(), Error>;
}

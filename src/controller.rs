use crate::{
    time_label, EngineEvent, EngineNotification, EngineState, Error, Icon, Locator, MediaEngine,
    PlaybackConfig, PlaybackSession, PlaybackState, Prompt, SessionId, View, ViewIntent,
};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};

const NO_MEDIA: &str = "No media loaded";

/// Keeps a [`View`] consistent with a [`MediaEngine`].
///
/// Owns the only mutable playback state in the application: the current
/// [`PlaybackSession`], whether the user is dragging the seek slider, and the
/// volume and rate that carry over from one session to the next.
pub struct PlaybackController<E, V> {
    pub(crate) engine: E,
    pub(crate) view: V,
    pub(crate) session: Option<PlaybackSession>,
    pub(crate) seeking: bool,
    pub(crate) save_target: Option<PathBuf>,
    volume: u8,
    rate: f64,
    min_rate: f64,
    max_rate: f64,
}

impl<E: MediaEngine, V: View> PlaybackController<E, V> {
    /// Create a controller and push the initial volume, rate and empty
    /// playback controls to `engine` and `view`.
    pub fn new(engine: E, view: V, config: &PlaybackConfig) -> Self {
        let mut controller = PlaybackController {
            engine,
            view,
            session: None,
            seeking: false,
            save_target: None,
            volume: config.volume.min(100),
            rate: config.rate,
            min_rate: config.min_rate,
            max_rate: config.max_rate,
        };

        controller.apply_settings();
        controller.view.set_volume(controller.volume);
        controller.view.set_rate(controller.rate);
        controller.reset_view();
        controller
    }

    /// Get the media engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable access to the engine, e.g. to poll it for notifications.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Get the view being kept in sync.
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Mutable access to the view, for presentation-only changes.
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Get the loaded media, if any.
    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    /// Get the playback state; [`PlaybackState::Idle`] when nothing is loaded.
    pub fn state(&self) -> PlaybackState {
        self.session
            .as_ref()
            .map_or(PlaybackState::Idle, |session| session.state)
    }

    /// Whether the user is currently dragging the seek slider.
    pub fn is_seeking(&self) -> bool {
        self.seeking
    }

    /// Get the volume, 0 to 100.
    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Get the playback rate applied to every session.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Destination remembered by the last successful "save as".
    pub fn saved_copy_target(&self) -> Option<&Path> {
        self.save_target.as_deref()
    }

    /// Opens a local file. See [`PlaybackController::open`].
    pub fn open_file(&mut self, path: impl AsRef<Path>) -> Result<SessionId, Error> {
        let source = Locator::local(path)?;
        self.open(source)
    }

    /// Opens user-entered URL text. See [`PlaybackController::open`].
    pub fn open_url(&mut self, text: &str) -> Result<SessionId, Error> {
        let source = Locator::parse(text)?;
        self.open(source)
    }

    /// Replaces the current session with `source` and starts playing it.
    ///
    /// Does not wait for the engine to become ready; `play` is queued behind the
    /// load. Notifications still in flight for the previous session are dropped
    /// from here on.
    pub fn open(&mut self, source: Locator) -> Result<SessionId, Error> {
        let session = PlaybackSession::new(source);
        let id = session.id;
        info!("opening {} as session {id}", session.source);

        let loaded = self.engine.load(id, &session.source);
        let status = format!("Opened: {}", session.source);
        self.session = Some(session);
        self.save_target = None;
        self.seeking = false;
        self.reset_view();

        if let Err(err) = loaded {
            return Err(self.fail_session(err));
        }
        self.apply_settings();
        if let Err(err) = self.engine.play() {
            return Err(self.fail_session(err));
        }

        self.view.show_status(&status);
        Ok(id)
    }

    /// Pause if playing, play otherwise.
    ///
    /// With nothing playable loaded this only reports so in the status line.
    pub fn toggle_play_pause(&mut self) -> Result<(), Error> {
        match self.live_state() {
            Some(PlaybackState::Playing) => self.engine.pause(),
            Some(_) => self.engine.play(),
            None => {
                self.view.show_status(NO_MEDIA);
                Ok(())
            }
        }
    }

    /// Stop playback and rewind the controls to the start.
    pub fn stop(&mut self) -> Result<(), Error> {
        if self.live_state().is_none() {
            self.view.show_status(NO_MEDIA);
            return Ok(());
        }

        self.engine.stop()?;
        self.mark_stopped();
        self.view.show_status("Stopped");
        Ok(())
    }

    /// Asks the engine to jump to `target_ms`, clamped to the media duration.
    pub fn seek(&mut self, target_ms: u64) -> Result<(), Error> {
        let Some(session) = self.session.as_ref().filter(|s| s.state.is_live()) else {
            return Ok(());
        };
        let target_ms = target_ms.min(session.duration_ms);
        self.engine.seek(target_ms)
    }

    /// The user grabbed the seek slider; engine progress stops moving it.
    pub fn slider_drag_started(&mut self) {
        self.seeking = true;
    }

    /// The user moved the seek slider to `value_ms`.
    pub fn slider_dragged(&mut self, value_ms: u64) -> Result<(), Error> {
        if self.live_state().is_none() {
            return Ok(());
        }
        self.view.set_slider_value(value_ms);
        self.seek(value_ms)
    }

    /// The user let go of the seek slider at `value_ms`.
    pub fn slider_drag_ended(&mut self, value_ms: u64) -> Result<(), Error> {
        self.seeking = false;
        self.slider_dragged(value_ms)
    }

    /// Set the volume. Values outside 0 to 100 are rejected.
    pub fn set_volume(&mut self, volume: i32) -> Result<(), Error> {
        let volume = u8::try_from(volume)
            .ok()
            .filter(|v| *v <= 100)
            .ok_or_else(|| {
                Error::InvalidParameter(format!("volume {volume} is outside 0..=100"))
            })?;

        self.engine.set_volume(volume)?;
        self.volume = volume;
        self.view.set_volume(volume);
        Ok(())
    }

    /// Set the playback rate within the configured bounds.
    ///
    /// The engine only hears about it while media is live; otherwise it is
    /// applied on the next open.
    pub fn set_rate(&mut self, rate: f64) -> Result<(), Error> {
        if !rate.is_finite() || rate < self.min_rate || rate > self.max_rate {
            return Err(Error::InvalidParameter(format!(
                "rate {rate} is outside {}..={}",
                self.min_rate, self.max_rate
            )));
        }

        if self.live_state().is_some() {
            self.engine.set_rate(rate)?;
        }
        self.rate = rate;
        self.view.set_rate(rate);
        Ok(())
    }

    /// Carries out a user intent, surfacing any failure in the view.
    pub fn handle_intent(&mut self, intent: ViewIntent, prompt: &mut impl Prompt) {
        let result = match intent {
            ViewIntent::OpenFile(path) => self.open_file(&path).map(drop),
            ViewIntent::OpenUrl(text) => self.open_url(&text).map(drop),
            ViewIntent::PlayPause => self.toggle_play_pause(),
            ViewIntent::Stop => self.stop(),
            ViewIntent::SliderDragStarted => {
                self.slider_drag_started();
                Ok(())
            }
            ViewIntent::SliderDragged(value) => self.slider_dragged(value),
            ViewIntent::SliderDragEnded(value) => self.slider_drag_ended(value),
            ViewIntent::VolumeChanged(volume) => self.set_volume(volume),
            ViewIntent::RateChanged(rate) => self.set_rate(rate),
            ViewIntent::Save => self.save_copy(prompt).map(drop),
            ViewIntent::SaveAs(path) => self.save_copy_as(&path),
            ViewIntent::Delete => self.delete_current_file(prompt).map(drop),
        };

        if let Err(err) = result {
            warn!("{err}");
            self.view.show_error(&err.to_string());
        }
    }

    /// Routes an engine notification to its handler.
    pub fn handle_engine_event(&mut self, notification: EngineNotification) {
        let EngineNotification { session, event } = notification;
        match event {
            EngineEvent::StateChanged(state) => self.on_engine_state_changed(session, state),
            EngineEvent::PositionChanged(ms) => self.on_engine_position_changed(session, ms),
            EngineEvent::DurationChanged(ms) => self.on_engine_duration_changed(session, ms),
            EngineEvent::Error(message) => self.on_engine_error(session, &message),
            EngineEvent::EndOfStream => self.on_engine_end_of_stream(session),
        }
    }

    /// The engine settled into `state`.
    pub fn on_engine_state_changed(&mut self, id: SessionId, state: EngineState) {
        let Some(session) = self.current_session_mut(id, "state change") else {
            return;
        };
        let (state, status) = match state {
            EngineState::Playing => (PlaybackState::Playing, "Playing"),
            EngineState::Paused => (PlaybackState::Paused, "Paused"),
            EngineState::Stopped => (PlaybackState::Stopped, "Stopped"),
        };
        session.state = state;

        debug!("session {id} is now {state:?}");
        self.sync_icon(state);
        self.view.show_status(status);
    }

    /// The engine learned the media duration.
    pub fn on_engine_duration_changed(&mut self, id: SessionId, duration_ms: u64) {
        let Some(session) = self.current_session_mut(id, "duration") else {
            return;
        };
        session.set_duration(duration_ms);
        let position_ms = session.position_ms;

        self.view.set_slider_range(duration_ms);
        self.view.set_time_label(&time_label(position_ms, duration_ms));
    }

    /// Tracks playback progress. While the user drags the slider only the
    /// label follows the engine; the thumb stays where the user holds it.
    pub fn on_engine_position_changed(&mut self, id: SessionId, position_ms: u64) {
        let Some(session) = self.current_session_mut(id, "position") else {
            return;
        };
        session.set_position(position_ms);
        let (position_ms, duration_ms) = (session.position_ms, session.duration_ms);

        if !self.seeking {
            self.view.set_slider_value(position_ms);
        }
        self.view.set_time_label(&time_label(position_ms, duration_ms));
    }

    /// The engine gave up on the session. It stays errored until the next open.
    pub fn on_engine_error(&mut self, id: SessionId, message: &str) {
        let Some(session) = self.current_session_mut(id, "error") else {
            return;
        };
        session.state = PlaybackState::Errored;

        error!("session {id} failed: {message}");
        self.sync_icon(PlaybackState::Errored);
        self.view.show_error(message);
    }

    /// Playback reached the end of the media.
    pub fn on_engine_end_of_stream(&mut self, id: SessionId) {
        let Some(session) = self.current_session_mut(id, "end of stream") else {
            return;
        };
        session.state = PlaybackState::Stopped;

        self.sync_icon(PlaybackState::Stopped);
        self.view.show_status("Finished");
    }

    /// The session a notification for `id` may act on, if any.
    fn current_session_mut(&mut self, id: SessionId, what: &str) -> Option<&mut PlaybackSession> {
        match self.session.as_mut() {
            Some(session) if session.id == id && session.state != PlaybackState::Errored => {
                Some(session)
            }
            Some(session) if session.id == id => {
                debug!("dropping {what} for errored session {id}");
                None
            }
            _ => {
                debug!("dropping stale {what} for session {id}");
                None
            }
        }
    }

    fn live_state(&self) -> Option<PlaybackState> {
        Some(self.state()).filter(|state| state.is_live())
    }

    fn sync_icon(&mut self, state: PlaybackState) {
        self.view.set_icon(match state {
            PlaybackState::Playing => Icon::Pause,
            _ => Icon::Play,
        });
    }

    /// Pushes volume and rate to the engine; neither is worth failing a load over.
    fn apply_settings(&mut self) {
        if let Err(err) = self.engine.set_volume(self.volume) {
            warn!("failed to apply volume {}: {err}", self.volume);
        }
        if let Err(err) = self.engine.set_rate(self.rate) {
            warn!("failed to apply rate {}: {err}", self.rate);
        }
    }

    fn fail_session(&mut self, err: Error) -> Error {
        let message = match err {
            Error::Engine(message) => message,
            other => other.to_string(),
        };
        error!("{message}");
        if let Some(session) = self.session.as_mut() {
            session.state = PlaybackState::Errored;
        }
        self.sync_icon(PlaybackState::Errored);
        Error::Engine(message)
    }

    pub(crate) fn mark_stopped(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.state = PlaybackState::Stopped;
            session.position_ms = 0;
        }
        self.sync_icon(PlaybackState::Stopped);
        self.view.set_slider_value(0);
        self.refresh_label();
    }

    fn refresh_label(&mut self) {
        let (position_ms, duration_ms) = self
            .session
            .as_ref()
            .map_or((0, 0), |s| (s.position_ms, s.duration_ms));
        self.view.set_time_label(&time_label(position_ms, duration_ms));
    }

    /// Back to the empty look: play icon, empty slider, zeroed label.
    pub(crate) fn reset_view(&mut self) {
        self.view.set_icon(Icon::Play);
        self.view.set_slider_range(0);
        self.view.set_slider_value(0);
        self.refresh_label();
    }
}

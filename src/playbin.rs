use crate::{EngineEvent, EngineNotification, EngineState, Error, Locator, MediaEngine, SessionId};
use gstreamer as gst;
use gstreamer_app as gst_app;
use gstreamer_app::prelude::*;
use log::{debug, error, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SINK_NAME: &str = "video_viewer_sink";

/// A decoded video frame, tightly packed RGBA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// One loaded `playbin` and the thread pulling frames out of its appsink.
struct Loaded {
    session: SessionId,
    bus: gst::Bus,
    pipeline: gst::Pipeline,
    alive: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    worker: Option<std::thread::JoinHandle<()>>,

    stopped: bool,
    is_eos: bool,
    rate_pending: bool,
    duration_ms: Option<u64>,
    position_ms: Option<u64>,
}

impl Drop for Loaded {
    fn drop(&mut self) {
        if let Err(err) = self.pipeline.set_state(gst::State::Null) {
            error!("failed to shut down pipeline for session {}: {err}", self.session);
        }

        self.alive.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("frame worker for session {} panicked", self.session);
            }
        }
    }
}

/// [`MediaEngine`] backed by a GStreamer `playbin`.
///
/// Notifications are not pushed; call [`PlaybinEngine::poll`] from the UI
/// thread's timer to drain them.
pub struct PlaybinEngine {
    loaded: Option<Loaded>,
    volume: f64,
    rate: f64,
    frame: Arc<Mutex<Option<Frame>>>,
    upload_frame: Arc<AtomicBool>,
}

impl PlaybinEngine {
    pub fn new() -> Result<Self, Error> {
        gst::init()?;
        Ok(PlaybinEngine {
            loaded: None,
            volume: 0.5,
            rate: 1.0,
            frame: Arc::new(Mutex::new(None)),
            upload_frame: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Drains the bus and samples the playback position.
    pub fn poll(&mut self) -> Vec<EngineNotification> {
        let Some(loaded) = self.loaded.as_mut() else {
            return Vec::new();
        };

        let mut events = Vec::new();
        let mut refresh_duration = false;
        let mut apply_rate = false;

        for msg in loaded.bus.iter() {
            match msg.view() {
                gst::MessageView::StateChanged(changed)
                    if changed.src() == Some(loaded.pipeline.upcast_ref::<gst::Object>()) =>
                {
                    if let Some(state) = settled_state(changed.current(), changed.pending()) {
                        debug!("pipeline for session {} is now {state:?}", loaded.session);
                        events.push(EngineEvent::StateChanged(state));
                    }
                }
                gst::MessageView::DurationChanged(_) => refresh_duration = true,
                gst::MessageView::AsyncDone(_) => {
                    refresh_duration = true;
                    apply_rate = loaded.rate_pending;
                }
                gst::MessageView::Error(err) => {
                    error!("bus returned an error: {err}");
                    events.push(EngineEvent::Error(err.error().to_string()));
                }
                gst::MessageView::Eos(_) => {
                    loaded.is_eos = true;
                    events.push(EngineEvent::EndOfStream);
                }
                _ => {}
            }
        }

        if refresh_duration {
            if let Some(duration) = loaded.pipeline.query_duration::<gst::ClockTime>() {
                let duration = duration.mseconds();
                if loaded.duration_ms != Some(duration) {
                    loaded.duration_ms = Some(duration);
                    events.push(EngineEvent::DurationChanged(duration));
                }
            }
        }

        if !loaded.stopped {
            if let Some(position) = loaded.pipeline.query_position::<gst::ClockTime>() {
                let position = position.mseconds();
                if loaded.position_ms != Some(position) {
                    loaded.position_ms = Some(position);
                    events.push(EngineEvent::PositionChanged(position));
                }
            }
        }

        if apply_rate {
            match seek_with_rate(&loaded.pipeline, self.rate) {
                Ok(applied) => loaded.rate_pending = !applied,
                Err(err) => {
                    warn!("cannot apply playback rate {}: {err}", self.rate);
                    loaded.rate_pending = false;
                }
            }
        }

        let session = loaded.session;
        events
            .into_iter()
            .map(|event| EngineNotification::new(session, event))
            .collect()
    }

    /// Takes the newest decoded frame, if one arrived since the last call.
    pub fn take_frame(&self) -> Option<Frame> {
        if !self.upload_frame.swap(false, Ordering::SeqCst) {
            return None;
        }
        self.frame.lock().ok().and_then(|frame| frame.clone())
    }

    /// Get the underlying GStreamer pipeline, if media is loaded.
    pub fn pipeline(&self) -> Option<gst::Pipeline> {
        self.loaded.as_ref().map(|loaded| loaded.pipeline.clone())
    }
}

impl MediaEngine for PlaybinEngine {
    fn load(&mut self, session: SessionId, source: &Locator) -> Result<(), Error> {
        // the previous pipeline must be gone before its frames can be mistaken for ours
        self.unload();

        let uri = source.uri()?;
        let description = format!(
            "playbin video-sink=\"videoconvert ! videoscale ! appsink name={SINK_NAME} drop=true max-buffers=1 caps=video/x-raw,format=RGBA,pixel-aspect-ratio=1/1\""
        );
        let pipeline = gst::parse::launch(&description)?
            .downcast::<gst::Pipeline>()
            .map_err(|_| Error::Cast)?;
        pipeline.set_property("uri", uri.as_str());
        pipeline.set_property("volume", self.volume);

        let video_sink: gst::Element = pipeline.property("video-sink");
        let app_sink = video_sink
            .downcast::<gst::Bin>()
            .map_err(|_| Error::Cast)?
            .by_name(SINK_NAME)
            .ok_or(Error::Cast)?
            .downcast::<gst_app::AppSink>()
            .map_err(|_| Error::Cast)?;
        let bus = pipeline.bus().ok_or(Error::Bus)?;

        // prerolls in the background; `play` queues behind it
        pipeline.set_state(gst::State::Paused)?;

        let alive = Arc::new(AtomicBool::new(true));
        let paused = Arc::new(AtomicBool::new(true));
        let worker = {
            let alive = Arc::clone(&alive);
            let paused = Arc::clone(&paused);
            let frame = Arc::clone(&self.frame);
            let upload_frame = Arc::clone(&self.upload_frame);
            std::thread::spawn(move || {
                let mut last_pts = None;
                while alive.load(Ordering::Acquire) {
                    match pull_frame(&app_sink, &paused, &frame, &upload_frame, &mut last_pts) {
                        Ok(()) => {}
                        Err(gst::FlowError::Eos) => std::thread::sleep(Duration::from_millis(16)),
                        Err(_) => {
                            error!("error pulling frame");
                            std::thread::sleep(Duration::from_millis(16));
                        }
                    }
                }
            })
        };

        self.loaded = Some(Loaded {
            session,
            bus,
            pipeline,
            alive,
            paused,
            worker: Some(worker),
            stopped: false,
            is_eos: false,
            rate_pending: self.rate != 1.0,
            duration_ms: None,
            position_ms: None,
        });
        Ok(())
    }

    fn unload(&mut self) {
        self.loaded = None;
        if let Ok(mut frame) = self.frame.lock() {
            *frame = None;
        }
        self.upload_frame.store(false, Ordering::SeqCst);
    }

    fn play(&mut self) -> Result<(), Error> {
        let Some(loaded) = self.loaded.as_mut() else {
            return Ok(());
        };

        loaded.pipeline.set_state(gst::State::Playing)?;
        loaded.paused.store(false, Ordering::SeqCst);
        loaded.stopped = false;

        if loaded.is_eos {
            loaded.is_eos = false;
            loaded.pipeline.seek_simple(
                gst::SeekFlags::FLUSH | gst::SeekFlags::KEY_UNIT,
                gst::ClockTime::ZERO,
            )?;
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<(), Error> {
        let Some(loaded) = self.loaded.as_mut() else {
            return Ok(());
        };

        loaded.pipeline.set_state(gst::State::Paused)?;
        loaded.paused.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Error> {
        let Some(loaded) = self.loaded.as_mut() else {
            return Ok(());
        };

        // NULL closes the source, so the file is no longer held open
        loaded.pipeline.set_state(gst::State::Null)?;
        loaded.paused.store(true, Ordering::SeqCst);
        loaded.stopped = true;
        loaded.is_eos = false;
        loaded.rate_pending = self.rate != 1.0;
        loaded.position_ms = None;
        Ok(())
    }

    fn seek(&mut self, position_ms: u64) -> Result<(), Error> {
        let Some(loaded) = self.loaded.as_mut() else {
            return Ok(());
        };
        if loaded.stopped {
            debug!("ignoring seek on stopped pipeline");
            return Ok(());
        }

        // gstreamer complains if the start & end value types aren't the same
        loaded.pipeline.seek(
            self.rate,
            gst::SeekFlags::FLUSH | gst::SeekFlags::KEY_UNIT,
            gst::SeekType::Set,
            gst::ClockTime::from_mseconds(position_ms),
            gst::SeekType::End,
            gst::ClockTime::ZERO,
        )?;
        loaded.is_eos = false;
        Ok(())
    }

    fn set_volume(&mut self, volume: u8) -> Result<(), Error> {
        self.volume = f64::from(volume.min(100)) / 100.0;
        if let Some(loaded) = self.loaded.as_ref() {
            let muted: bool = loaded.pipeline.property("mute");
            loaded.pipeline.set_property("volume", self.volume);
            // for some reason gstreamer unmutes when changing volume
            loaded.pipeline.set_property("mute", muted);
        }
        Ok(())
    }

    fn set_rate(&mut self, rate: f64) -> Result<(), Error> {
        self.rate = rate;
        let Some(loaded) = self.loaded.as_mut() else {
            return Ok(());
        };
        if loaded.stopped {
            loaded.rate_pending = rate != 1.0;
            return Ok(());
        }

        // before preroll there is no position to seek from; retried on AsyncDone
        loaded.rate_pending = !seek_with_rate(&loaded.pipeline, rate)?;
        Ok(())
    }
}

/// Maps a pipeline state change to the state worth reporting.
///
/// Steps taken on the way to another state (preroll, the pause a flushing
/// seek goes through) yield `None`.
fn settled_state(current: gst::State, pending: gst::State) -> Option<EngineState> {
    if pending != gst::State::VoidPending {
        return None;
    }
    match current {
        gst::State::Playing => Some(EngineState::Playing),
        gst::State::Paused => Some(EngineState::Paused),
        gst::State::Ready | gst::State::Null => Some(EngineState::Stopped),
        _ => None,
    }
}

/// Re-seeks to the current position at `rate`. `false` if there is no position yet.
fn seek_with_rate(pipeline: &gst::Pipeline, rate: f64) -> Result<bool, Error> {
    let Some(position) = pipeline.query_position::<gst::ClockTime>() else {
        return Ok(false);
    };
    pipeline.seek(
        rate,
        gst::SeekFlags::FLUSH | gst::SeekFlags::ACCURATE,
        gst::SeekType::Set,
        position,
        gst::SeekType::End,
        gst::ClockTime::ZERO,
    )?;
    Ok(true)
}

fn pull_frame(
    app_sink: &gst_app::AppSink,
    paused: &AtomicBool,
    frame: &Mutex<Option<Frame>>,
    upload_frame: &AtomicBool,
    last_pts: &mut Option<gst::ClockTime>,
) -> Result<(), gst::FlowError> {
    let sample = if paused.load(Ordering::SeqCst) {
        app_sink.try_pull_preroll(gst::ClockTime::from_mseconds(16))
    } else {
        app_sink.try_pull_sample(gst::ClockTime::from_mseconds(16))
    }
    .ok_or(gst::FlowError::Eos)?;

    let buffer = sample.buffer().ok_or(gst::FlowError::Error)?;
    if paused.load(Ordering::SeqCst) && buffer.pts().is_some() && buffer.pts() == *last_pts {
        // the same preroll sample comes back until playback resumes
        return Err(gst::FlowError::Eos);
    }
    *last_pts = buffer.pts();

    let caps = sample.caps().ok_or(gst::FlowError::Error)?;
    let s = caps.structure(0).ok_or(gst::FlowError::Error)?;
    let width = s.get::<i32>("width").map_err(|_| gst::FlowError::Error)?;
    let height = s.get::<i32>("height").map_err(|_| gst::FlowError::Error)?;
    let (width, height) = (width.max(0) as u32, height.max(0) as u32);

    let map = buffer.map_readable().map_err(|_| gst::FlowError::Error)?;
    let len = width as usize * height as usize * 4;
    let pixels = map.as_slice().get(..len).ok_or(gst::FlowError::Error)?;

    let mut frame = frame.lock().map_err(|_| gst::FlowError::Error)?;
    match frame.as_mut() {
        Some(current) if current.width == width && current.height == height => {
            current.pixels.copy_from_slice(pixels);
        }
        _ => {
            *frame = Some(Frame {
                width,
                height,
                pixels: pixels.to_vec(),
            });
        }
    }
    upload_frame.store(true, Ordering::SeqCst);
    Ok(())
}

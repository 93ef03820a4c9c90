//! Playback synchronization core for a desktop video viewer.
//!
//! [`PlaybackController`] sits between a [`MediaEngine`] and a [`View`]: it turns
//! user intents into engine commands, and engine notifications into view updates,
//! without letting engine progress and user drags fight over the seek slider.

mod config;
mod controller;
mod engine;
mod files;
mod locator;
#[cfg(feature = "gstreamer")]
mod playbin;
mod session;
mod time;
mod view;

#[cfg(feature = "gstreamer")]
use gstreamer as gst;
use thiserror::Error;

pub use config::{Config, EngineConfig, PlaybackConfig};
pub use controller::PlaybackController;
pub use engine::{EngineEvent, EngineNotification, EngineState, MediaEngine};
pub use locator::Locator;
#[cfg(feature = "gstreamer")]
pub use playbin::{Frame, PlaybinEngine};
pub use session::{PlaybackSession, PlaybackState, SessionId};
pub use time::{format_time, time_label};
pub use view::{Icon, Prompt, View, ViewIntent, ViewModel};

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid source: {0}")]
    InvalidSource(String),
    #[error("playback failed: {0}")]
    Engine(String),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("the current media is a stream/URL; there is no local file to copy or delete")]
    NoLocalSource,
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("{0}")]
    Config(#[from] toml::de::Error),
    #[cfg(feature = "gstreamer")]
    #[error("{0}")]
    Glib(#[from] glib::Error),
    #[cfg(feature = "gstreamer")]
    #[error("{0}")]
    Bool(#[from] glib::BoolError),
    #[cfg(feature = "gstreamer")]
    #[error("{0}")]
    StateChange(#[from] gst::StateChangeError),
    #[cfg(feature = "gstreamer")]
    #[error("failed to get the gstreamer bus")]
    Bus,
    #[cfg(feature = "gstreamer")]
    #[error("failed to cast gstreamer element")]
    Cast,
    #[error("invalid URI")]
    Uri,
}

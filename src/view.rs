use crate::time_label;
use std::path::{Path, PathBuf};

/// Glyph shown on the play/pause button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Icon {
    #[default]
    Play,
    Pause,
}

/// Widgets the controller keeps in sync with the engine.
pub trait View {
    fn set_icon(&mut self, icon: Icon);
    /// The slider spans `0..=max_ms`.
    fn set_slider_range(&mut self, max_ms: u64);
    fn set_slider_value(&mut self, value_ms: u64);
    fn set_time_label(&mut self, text: &str);
    fn set_volume(&mut self, volume: u8);
    fn set_rate(&mut self, rate: f64);
    fn show_status(&mut self, message: &str);
    fn show_error(&mut self, message: &str);
}

/// Questions that need the user's answer before a file operation goes ahead.
pub trait Prompt {
    /// Picks where a copy should be written; `None` if the user cancelled.
    fn save_destination(&mut self, suggested_name: &str) -> Option<PathBuf>;

    /// Asks whether `path` should really be deleted.
    fn confirm_delete(&mut self, path: &Path) -> bool;
}

/// Something the user asked for through the view.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewIntent {
    OpenFile(PathBuf),
    OpenUrl(String),
    PlayPause,
    Stop,
    SliderDragStarted,
    SliderDragged(u64),
    SliderDragEnded(u64),
    VolumeChanged(i32),
    RateChanged(f64),
    Save,
    SaveAs(PathBuf),
    Delete,
}

/// Retained view state: the last value pushed for every widget.
///
/// Immediate-mode front ends render straight from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub icon: Icon,
    pub slider_max: u64,
    pub slider_value: u64,
    pub time_label: String,
    pub volume: u8,
    pub rate: f64,
    pub status: Option<String>,
    pub error: Option<String>,
}

impl Default for ViewModel {
    fn default() -> Self {
        ViewModel {
            icon: Icon::Play,
            slider_max: 0,
            slider_value: 0,
            time_label: time_label(0, 0),
            volume: 50,
            rate: 1.0,
            status: None,
            error: None,
        }
    }
}

impl ViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets the last error, e.g. after the user dismissed it.
    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}

impl View for ViewModel {
    fn set_icon(&mut self, icon: Icon) {
        self.icon = icon;
    }

    fn set_slider_range(&mut self, max_ms: u64) {
        self.slider_max = max_ms;
        // mirror a slider widget, which clamps its value to the new range
        self.slider_value = self.slider_value.min(max_ms);
    }

    fn set_slider_value(&mut self, value_ms: u64) {
        self.slider_value = value_ms.min(self.slider_max);
    }

    fn set_time_label(&mut self, text: &str) {
        self.time_label = text.to_owned();
    }

    fn set_volume(&mut self, volume: u8) {
        self.volume = volume;
    }

    fn set_rate(&mut self, rate: f64) {
        self.rate = rate;
    }

    fn show_status(&mut self, message: &str) {
        self.status = Some(message.to_owned());
    }

    fn show_error(&mut self, message: &str) {
        self.error = Some(message.to_owned());
    }
}

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use video_viewer::{
    Error, Locator, MediaEngine, PlaybackConfig, PlaybackController, Prompt, SessionId, ViewModel,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Load(SessionId, Locator),
    Unload,
    Play,
    Pause,
    Stop,
    Seek(u64),
    Volume(u8),
    Rate(f64),
}

/// Engine double that records every command it receives.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    pub commands: Vec<Command>,
    pub fail_load: bool,
    /// File whose presence is sampled whenever `stop` is issued.
    pub watch: Option<PathBuf>,
    pub file_present_at_stop: Option<bool>,
}

impl RecordingEngine {
    pub fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }
}

impl MediaEngine for RecordingEngine {
    fn load(&mut self, session: SessionId, source: &Locator) -> Result<(), Error> {
        self.commands.push(Command::Load(session, source.clone()));
        if self.fail_load {
            return Err(Error::Engine("no decoder for this format".into()));
        }
        Ok(())
    }

    fn unload(&mut self) {
        self.commands.push(Command::Unload);
    }

    fn play(&mut self) -> Result<(), Error> {
        self.commands.push(Command::Play);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), Error> {
        self.commands.push(Command::Pause);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Error> {
        self.commands.push(Command::Stop);
        if let Some(path) = &self.watch {
            self.file_present_at_stop = Some(path.exists());
        }
        Ok(())
    }

    fn seek(&mut self, position_ms: u64) -> Result<(), Error> {
        self.commands.push(Command::Seek(position_ms));
        Ok(())
    }

    fn set_volume(&mut self, volume: u8) -> Result<(), Error> {
        self.commands.push(Command::Volume(volume));
        Ok(())
    }

    fn set_rate(&mut self, rate: f64) -> Result<(), Error> {
        self.commands.push(Command::Rate(rate));
        Ok(())
    }
}

/// Prompt double answering from a script and remembering what it was asked.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    pub save_to: Option<PathBuf>,
    pub confirm: bool,
    /// Removes the file itself while "confirming", so the delete that follows fails.
    pub delete_behind_our_back: bool,
    pub save_questions: Vec<String>,
    pub delete_questions: Vec<PathBuf>,
}

impl Prompt for ScriptedPrompt {
    fn save_destination(&mut self, suggested_name: &str) -> Option<PathBuf> {
        self.save_questions.push(suggested_name.to_owned());
        self.save_to.clone()
    }

    fn confirm_delete(&mut self, path: &Path) -> bool {
        self.delete_questions.push(path.to_path_buf());
        if self.delete_behind_our_back {
            fs::remove_file(path).unwrap();
        }
        self.confirm
    }
}

pub type TestController = PlaybackController<RecordingEngine, ViewModel>;

/// A controller with default settings and the construction-time commands cleared.
pub fn controller() -> TestController {
    let mut controller = PlaybackController::new(
        RecordingEngine::default(),
        ViewModel::new(),
        &PlaybackConfig::default(),
    );
    controller.engine_mut().take();
    controller
}

pub fn video_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"\x00\x00\x00\x18ftypmp42").unwrap();
    path.canonicalize().unwrap()
}

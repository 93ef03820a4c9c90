use crate::Error;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use std::{env, fs};

const FILE_NAME: &str = "video-viewer.toml";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub playback: PlaybackConfig,
    pub engine: EngineConfig,
}

impl Config {
    /// Loads the first config file found next to the working directory or the
    /// executable, falling back to defaults when there is none.
    pub fn load() -> Result<Self, Error> {
        for path in candidates() {
            if path.exists() {
                log::info!("loading config from {}", path.display());
                let data = fs::read_to_string(&path)?;
                return Self::from_toml_str(&data);
            }
        }
        Ok(Config::default())
    }

    pub fn from_toml_str(data: &str) -> Result<Self, Error> {
        let doc: ConfigDocument = toml::from_str(data)?;
        Ok(doc.into())
    }
}

fn candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(current_dir) = env::current_dir() {
        candidates.push(current_dir.join(FILE_NAME));
        candidates.push(current_dir.join("config").join(FILE_NAME));
    }
    if let Ok(exe) = env::current_exe() {
        if let Some(dir) = exe.parent() {
            candidates.push(dir.join(FILE_NAME));
            candidates.push(dir.join("config").join(FILE_NAME));
        }
    }
    candidates
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    /// Initial volume, `0..=100`.
    pub volume: u8,
    /// Initial rate, within `min_rate..=max_rate`.
    pub rate: f64,
    pub min_rate: f64,
    pub max_rate: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            volume: 50,
            rate: 1.0,
            min_rate: 0.5,
            max_rate: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// How often the front end polls the engine for notifications.
    pub poll_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            poll_interval: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    playback: PlaybackSection,
    #[serde(default)]
    engine: EngineSection,
}

#[derive(Debug, Default, Deserialize)]
struct PlaybackSection {
    volume: Option<i64>,
    rate: Option<f64>,
    min_rate: Option<f64>,
    max_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct EngineSection {
    poll_interval_ms: Option<u64>,
}

impl From<ConfigDocument> for Config {
    fn from(value: ConfigDocument) -> Self {
        let defaults = PlaybackConfig::default();

        let min_rate = value
            .playback
            .min_rate
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(defaults.min_rate);
        let max_rate = value
            .playback
            .max_rate
            .filter(|r| r.is_finite() && *r >= min_rate)
            .unwrap_or_else(|| defaults.max_rate.max(min_rate));
        let rate = value
            .playback
            .rate
            .filter(|r| r.is_finite())
            .unwrap_or(defaults.rate)
            .clamp(min_rate, max_rate);
        let volume = value
            .playback
            .volume
            .map(|v| v.clamp(0, 100) as u8)
            .unwrap_or(defaults.volume);

        let poll_interval = value
            .engine
            .poll_interval_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or_else(|| EngineConfig::default().poll_interval);

        Config {
            playback: PlaybackConfig {
                volume,
                rate,
                min_rate,
                max_rate,
            },
            engine: EngineConfig { poll_interval },
        }
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::artifacts::DEFAULT_TEMP_EXTENSION;
use super::logging::log_event;
use super::planner::DEFAULT_VIDEO_ENABLE_EPSILON;
use crate::common::paths;
use crate::ui::prelude::Level;

/// Defaults for everything the command line does not set explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuffererConfig {
    /// ffmpeg executable
    pub ffmpeg: String,
    /// ffprobe executable
    pub ffprobe: String,
    pub vcodec: String,
    pub acodec: String,
    pub pixfmt: String,
    /// Spinner image or video overlaid during stalls
    pub spinner: PathBuf,
    pub speed: u32,
    /// avgblur kernel size
    pub blur: u32,
    /// eq brightness, -1.0 to 1.0
    pub brightness: f64,
    /// Seconds cut from the end of each video enable window
    pub video_enable_epsilon: f64,
    pub temp_extension: String,
    pub threads: u32,
}

impl Default for BuffererConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            vcodec: "ffv1".to_string(),
            acodec: "pcm_s16le".to_string(),
            pixfmt: "yuv420p".to_string(),
            spinner: PathBuf::from("spinners/spinner-256-white.png"),
            speed: 2,
            blur: 5,
            brightness: 0.0,
            video_enable_epsilon: DEFAULT_VIDEO_ENABLE_EPSILON,
            temp_extension: DEFAULT_TEMP_EXTENSION.to_string(),
            threads: 1,
        }
    }
}

impl BuffererConfig {
    pub fn load() -> Result<Self> {
        Self::load_from_path(paths::bufferer_config_path()?)
    }

    /// A missing file yields the defaults; nothing is written.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading bufferer config from {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("parsing bufferer config {}", path.display()))?;
        Ok(config.sanitized())
    }

    fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if !self.brightness.is_finite() || !(-1.0..=1.0).contains(&self.brightness) {
            warn_reset("brightness", self.brightness, defaults.brightness);
            self.brightness = defaults.brightness;
        }
        if !self.video_enable_epsilon.is_finite() || self.video_enable_epsilon < 0.0 {
            warn_reset(
                "video_enable_epsilon",
                self.video_enable_epsilon,
                defaults.video_enable_epsilon,
            );
            self.video_enable_epsilon = defaults.video_enable_epsilon;
        }
        if self.threads == 0 {
            warn_reset("threads", self.threads, defaults.threads);
            self.threads = defaults.threads;
        }
        let extension = self.temp_extension.trim_start_matches('.');
        if extension.is_empty() || extension.contains(['/', '\\']) {
            warn_reset("temp_extension", &self.temp_extension, &defaults.temp_extension);
            self.temp_extension = defaults.temp_extension;
        } else {
            self.temp_extension = extension.to_string();
        }

        self
    }
}

fn warn_reset(key: &str, value: impl std::fmt::Debug, default: impl std::fmt::Debug) {
    log_event(
        Level::Warn,
        "config.invalid",
        format!("Invalid config value {key} = {value:?}, using {default:?}"),
    );
}

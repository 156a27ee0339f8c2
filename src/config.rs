use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::session::SessionConfig;
use crate::upload::DEFAULT_UPLOAD_PATH;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub recorder: RecorderConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_name")]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadConfig {
    /// Server the widget belongs to
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_upload_path")]
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct RecorderConfig {
    /// Elapsed-time refresh period
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Fragment period for file capture; unset means one fragment at stop
    #[serde(default)]
    pub timeslice_ms: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            path: default_upload_path(),
        }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            timeslice_ms: None,
        }
    }
}

fn default_name() -> String {
    "voice-drop".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_upload_path() -> String {
    DEFAULT_UPLOAD_PATH.to_string()
}

fn default_tick_interval_ms() -> u64 {
    1000
}

impl Config {
    /// Load from `path` (extension optional); a missing file yields defaults
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .build()
            .with_context(|| format!("Failed to read config {}", path))?;

        settings
            .try_deserialize()
            .with_context(|| format!("Invalid config {}", path))
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            tick_interval: Duration::from_millis(self.recorder.tick_interval_ms.max(1)),
        }
    }

    pub fn timeslice(&self) -> Option<Duration> {
        self.recorder.timeslice_ms.map(Duration::from_millis)
    }
}

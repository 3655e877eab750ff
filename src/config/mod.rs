use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/api/process-audio";

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub pipeline: PipelineConfig,
    pub history: HistoryConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Analysis endpoint receiving the multipart upload.
    pub endpoint: String,
    /// Upper bound for a single analysis call. Transcription of long
    /// recordings is slow, so this is generous.
    pub timeout_seconds: u64,
}

/// Pacing of the progress stages shown around the single analysis call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub analyzing_delay_ms: u64,
    pub saving_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Meetings endpoint. When unset the built-in sample meetings are listed.
    pub endpoint: Option<String>,
    pub timeout_seconds: u64,
    pub sample_latency_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub wrap_width: usize,
    pub lines_per_page: usize,
    pub output_dir: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_seconds: 600,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            analyzing_delay_ms: 2000,
            saving_delay_ms: 1500,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_seconds: 30,
            sample_latency_ms: 1000,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            wrap_width: 90,
            lines_per_page: 56,
            output_dir: None,
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl HistoryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl PipelineConfig {
    pub fn analyzing_delay(&self) -> Duration {
        Duration::from_millis(self.analyzing_delay_ms)
    }

    pub fn saving_delay(&self) -> Duration {
        Duration::from_millis(self.saving_delay_ms)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from an explicit path, writing defaults there if it does not exist.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_sample_size() -> usize {
    20
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("typecoach")
        .to_string_lossy()
        .to_string()
}
fn default_user_id() -> String {
    "local".to_string()
}
fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_size: default_sample_size(),
            tick_interval_ms: default_tick_interval_ms(),
            data_dir: default_data_dir(),
            user_id: default_user_id(),
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("typecoach")
            .join("config.toml")
    }

    /// Clamp out-of-range values left by hand edits.
    pub fn validate(&mut self) {
        self.sample_size = self.sample_size.clamp(1, 200);
        self.tick_interval_ms = self.tick_interval_ms.clamp(100, 10_000);
        if self.user_id.trim().is_empty() {
            self.user_id = default_user_id();
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }
}

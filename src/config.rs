use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schedule_path: PathBuf,
    pub progress_path: PathBuf,
    pub host: String,
    pub port: u16,
    /// Directory for daily rolling log files, stdout when unset
    pub log_dir: Option<PathBuf>,
    pub fetcher: FetcherConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schedule_path: PathBuf::from("schedule.json"),
            progress_path: PathBuf::from("progress.json"),
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_dir: None,
            fetcher: FetcherConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    pub base_url: String,
    pub translation: Option<String>,
    pub timeout_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://bible-api.com".to_string(),
            translation: None,
            timeout_secs: 10,
        }
    }
}

impl Config {
    /// Read a TOML config file; fields it leaves out keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parse config {}", path.display()))
    }
}

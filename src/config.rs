use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::ui::theme::DEFAULT_THEME;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub grader_url: Option<String>,
    #[serde(default = "default_grader_api_key_env")]
    pub grader_api_key_env: String,
    #[serde(default = "default_grader_require_api_key")]
    pub grader_require_api_key: bool,
    #[serde(default = "default_grader_timeout_secs")]
    pub grader_timeout_secs: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    /// Cleared when the file on disk could not be read, so `save` never
    /// replaces it with defaults.
    #[serde(skip, default = "default_writable")]
    writable: bool,
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}
fn default_grader_api_key_env() -> String {
    "BANDR_API_KEY".to_string()
}
fn default_grader_require_api_key() -> bool {
    true
}
fn default_grader_timeout_secs() -> u64 {
    60
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_writable() -> bool {
    true
}
fn default_log_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bandr")
        .join("logs")
        .to_string_lossy()
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            grader_url: None,
            grader_api_key_env: default_grader_api_key_env(),
            grader_require_api_key: default_grader_require_api_key(),
            grader_timeout_secs: default_grader_timeout_secs(),
            log_level: default_log_level(),
            log_dir: default_log_dir(),
            writable: default_writable(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Like [`load`](Config::load), but an unreadable file yields defaults
    /// alongside the error. Such a config refuses to save.
    pub fn load_or_default() -> (Self, Option<anyhow::Error>) {
        Self::load_or_default_from(&Self::config_path())
    }

    pub fn load_or_default_from(path: &Path) -> (Self, Option<anyhow::Error>) {
        match Self::load_from(path) {
            Ok(config) => (config, None),
            Err(err) => {
                let config = Config {
                    writable: false,
                    ..Config::default()
                };
                (config, Some(err))
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if !self.writable {
            bail!("{} could not be read at startup, leaving it untouched", path.display());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bandr")
            .join("config.toml")
    }

    pub fn grader_timeout(&self) -> Duration {
        Duration::from_secs(self.grader_timeout_secs.max(1))
    }

    /// Reset `theme` to the default when it names no known theme.
    pub fn normalize_theme(&mut self, valid: &[String]) {
        if !valid.iter().any(|t| t == &self.theme) {
            self.theme = default_theme();
        }
    }
}

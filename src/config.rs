use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use crate::error::AppError;

/// Top-level configuration, read from `config.toml` in the data directory.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Local reminder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// When false the no-op platform is selected and nothing is ever scheduled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Answer the spool platform gives to a permission request.
    #[serde(default = "default_true")]
    pub allow: bool,
    /// Title shown on every reminder.
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow: true,
            title: default_title(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_title() -> String {
    "Task reminder".to_string()
}

impl Config {
    pub fn path(dir: &Path) -> PathBuf {
        dir.join("config.toml")
    }

    /// Loads `config.toml` from `dir`, falling back to defaults when it is absent.
    ///
    /// Runs before logging is set up, so it reports nothing itself.
    pub fn load(dir: &Path) -> Result<Self, AppError> {
        let path = Self::path(dir);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&content).map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> Result<Self, AppError> {
        toml::from_str(content).map_err(|e| AppError::Config(e.to_string()))
    }
}

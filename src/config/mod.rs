// Flowboard — Terminal workspace for AI/human workflows
// License: Apache-2.0

use crate::editor::EditorTimings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("home directory not found")]
    NoHomeDir,
    #[error("invalid API base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Origin serving `/api/workflows`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

// ---------------------------------------------------------------------------
// Terminal UI
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// How long the "saved" indicator stays up.
    #[serde(default = "default_saved_indicator_ms")]
    pub saved_indicator_ms: u64,
    /// Delay before returning to the list after creating a workflow.
    #[serde(default = "default_auto_return_ms")]
    pub auto_return_ms: u64,
    /// Input poll interval of the dashboard loop.
    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            saved_indicator_ms: default_saved_indicator_ms(),
            auto_return_ms: default_auto_return_ms(),
            tick_rate_ms: default_tick_rate_ms(),
        }
    }
}

fn default_saved_indicator_ms() -> u64 {
    2000
}
fn default_auto_return_ms() -> u64 {
    1000
}
fn default_tick_rate_ms() -> u64 {
    200
}

impl UiConfig {
    pub fn editor_timings(&self) -> EditorTimings {
        EditorTimings {
            saved_indicator: Duration::from_millis(self.saved_indicator_ms),
            auto_return: Duration::from_millis(self.auto_return_ms),
        }
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(10))
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a JSON file, falling back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            serde_json::from_str(&contents)?
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Config::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (prefix: FLOWBOARD_)
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("FLOWBOARD_API_BASE_URL") {
            self.api.base_url = v;
        }
        if let Ok(v) = std::env::var("FLOWBOARD_UI_SAVED_INDICATOR_MS") {
            if let Ok(n) = v.parse() {
                self.ui.saved_indicator_ms = n;
            }
        }
        if let Ok(v) = std::env::var("FLOWBOARD_UI_AUTO_RETURN_MS") {
            if let Ok(n) = v.parse() {
                self.ui.auto_return_ms = n;
            }
        }
    }

    /// Get the default config file path: ~/.flowboard/config.json
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".flowboard").join("config.json"))
    }

    /// Validate configuration for basic correctness.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.api.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.api.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.api.base_url.clone(),
                reason: format!("unsupported scheme {:?}", url.scheme()),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

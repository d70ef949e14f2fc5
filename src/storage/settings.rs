//! Settings file loading.
//!
//! Loads from `config.toml` in the config directory (or the file named by
//! `LLMPROBE_CONFIG`).
//!
//! ## Precedence
//!
//! Settings are resolved with the following precedence (highest first):
//! 1. CLI flags
//! 2. Environment variables
//! 3. Config file
//! 4. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `LLMPROBE_PROXY`: Route requests through the relay (1, true, yes)
//! - `LLMPROBE_PROXY_URL`: Relay base URL
//! - `LLMPROBE_TIMEOUT_MS`: Default request timeout in milliseconds
//! - `LLMPROBE_CONFIG`: Override settings file path

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::paths::AppPaths;
use crate::core::transport::TransportSettings;
use crate::error::{ProbeError, Result};

/// Environment variable to route requests through the relay.
pub const ENV_PROXY: &str = "LLMPROBE_PROXY";
/// Environment variable for the relay base URL.
pub const ENV_PROXY_URL: &str = "LLMPROBE_PROXY_URL";
/// Environment variable for the default timeout in milliseconds.
pub const ENV_TIMEOUT_MS: &str = "LLMPROBE_TIMEOUT_MS";
/// Environment variable to override the settings file path.
pub const ENV_CONFIG: &str = "LLMPROBE_CONFIG";

/// Persisted settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Whether requests go through the relay instead of straight upstream.
    #[serde(default)]
    pub use_proxy: bool,
    /// Relay base URL; `/proxy` is appended per request.
    #[serde(default = "default_proxy_base_url")]
    pub proxy_base_url: String,
    /// Default timeout override, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_proxy: false,
            proxy_base_url: default_proxy_base_url(),
            timeout_ms: None,
        }
    }
}

fn default_proxy_base_url() -> String {
    "http://127.0.0.1:8787".to_string()
}

impl Settings {
    /// Load settings: file (if present), then env overrides.
    ///
    /// # Errors
    ///
    /// Returns a CONFIG error when the file exists but does not parse.
    pub fn load(paths: &AppPaths) -> Result<Self> {
        let path = std::env::var(ENV_CONFIG)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| paths.settings_file(), std::path::PathBuf::from);
        let mut settings = Self::load_file(&path)?;
        settings.apply_env();
        Ok(settings)
    }

    fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| ProbeError::Config(format!("{}: {e}", path.display())))
    }

    /// Apply environment variable overrides in place.
    pub fn apply_env(&mut self) {
        if let Some(flag) = env_bool(ENV_PROXY) {
            self.use_proxy = flag;
        }
        if let Ok(url) = std::env::var(ENV_PROXY_URL) {
            let trimmed = url.trim();
            if !trimmed.is_empty() {
                self.proxy_base_url = trimmed.to_string();
            }
        }
        if let Ok(value) = std::env::var(ENV_TIMEOUT_MS) {
            if let Ok(ms) = value.trim().parse::<u64>() {
                self.timeout_ms = Some(ms);
            }
        }
    }

    /// Write settings to the config directory.
    ///
    /// # Errors
    ///
    /// Returns error when the directory cannot be created or written.
    pub fn save(&self, paths: &AppPaths) -> Result<()> {
        paths.ensure_dirs()?;
        let contents =
            toml::to_string_pretty(self).map_err(|e| ProbeError::Config(e.to_string()))?;
        fs::write(paths.settings_file(), contents)?;
        Ok(())
    }

    /// The transport these settings describe.
    #[must_use]
    pub fn transport(&self) -> TransportSettings {
        TransportSettings {
            use_proxy: self.use_proxy,
            proxy_base_url: self.proxy_base_url.clone(),
        }
    }
}

fn env_bool(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

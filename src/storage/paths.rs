//! Application paths for config files.

use directories::ProjectDirs;
use std::path::PathBuf;

/// Application paths.
pub struct AppPaths {
    /// Configuration directory.
    pub config: PathBuf,
}

impl AppPaths {
    /// Create paths for the llmprobe application.
    #[must_use]
    pub fn new() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "llmprobe") {
            Self {
                config: proj_dirs.config_dir().to_path_buf(),
            }
        } else {
            let home = directories::BaseDirs::new()
                .map_or_else(|| PathBuf::from("."), |d| d.home_dir().to_path_buf());
            Self {
                config: home.join(".config/llmprobe"),
            }
        }
    }

    /// Paths rooted at an explicit directory (tests, `LLMPROBE_CONFIG`).
    #[must_use]
    pub fn at(config: PathBuf) -> Self {
        Self { config }
    }

    /// Path to the settings file.
    #[must_use]
    pub fn settings_file(&self) -> PathBuf {
        self.config.join("config.toml")
    }

    /// Path to the provider overrides file.
    #[must_use]
    pub fn providers_file(&self) -> PathBuf {
        self.config.join("providers.json")
    }

    /// Ensure the config directory exists.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config)
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

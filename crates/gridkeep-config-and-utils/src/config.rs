//! Configuration management.

use crate::{CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

const ENV_LOG_LEVEL: &str = "GRIDKEEP_LOG_LEVEL";
const ENV_ARCHIVE_DIR: &str = "GRIDKEEP_ARCHIVE_DIR";
const ENV_DATABASE_FILE: &str = "GRIDKEEP_DATABASE_FILE";

/// GridKeep configuration, stored as pretty JSON in `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Archive directory; `Paths::archive_dir` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_dir: Option<PathBuf>,
    /// Save-game store; `Paths::database_file` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_file: Option<PathBuf>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            archive_dir: None,
            database_file: None,
        }
    }
}

impl Config {
    /// Load configuration from `paths.config_file()`, falling back to
    /// defaults, then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Archive directory to use, resolved against `paths`.
    pub fn archive_dir(&self, paths: &Paths) -> PathBuf {
        self.archive_dir
            .clone()
            .unwrap_or_else(|| paths.archive_dir())
    }

    /// Save-game store to use, resolved against `paths`.
    pub fn database_file(&self, paths: &Paths) -> PathBuf {
        self.database_file
            .clone()
            .unwrap_or_else(|| paths.database_file())
    }

    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from `lookup`. Empty values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(log_level) = var(ENV_LOG_LEVEL) {
            self.log_level = log_level;
        }
        if let Some(dir) = var(ENV_ARCHIVE_DIR) {
            self.archive_dir = Some(PathBuf::from(dir));
        }
        if let Some(file) = var(ENV_DATABASE_FILE) {
            self.database_file = Some(PathBuf::from(file));
        }
    }
}

//! File system layout.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

const BASE_DIR_NAME: &str = ".gridkeep";
const DATABASE_FILE_NAME: &str = "save_games.sqlite";
const ARCHIVE_DIR_NAME: &str = "puzzles";
const LOG_FILE_NAME: &str = "gridkeep.jsonl";

/// Where GridKeep keeps its files.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory (~/.gridkeep)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.gridkeep`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(BASE_DIR_NAME),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.gridkeep).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.gridkeep/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the save-game store path (~/.gridkeep/save_games.sqlite).
    pub fn database_file(&self) -> PathBuf {
        self.base_dir.join(DATABASE_FILE_NAME)
    }

    /// Get the default archive directory (~/.gridkeep/puzzles).
    pub fn archive_dir(&self) -> PathBuf {
        self.base_dir.join(ARCHIVE_DIR_NAME)
    }

    /// Get the logs directory (~/.gridkeep/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the log file path (~/.gridkeep/logs/gridkeep.jsonl).
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join(LOG_FILE_NAME)
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.archive_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

//! Puzzle library: archives on disk plus the save-game store.

use crate::{LibraryError, LibraryResult};
use gridkeep_archive::{ArchiveError, ArchivePuzzleSource, DATA_EXTENSION, INDEX_EXTENSION};
use gridkeep_config_and_utils::{Config, Paths};
use gridkeep_core::{Difficulty, PuzzleCodec, PuzzleHolder, PuzzleId, PuzzleMemento, PuzzleSource};
use gridkeep_database::{Database, GameStatistics, SavedGameSummary, SourceProgress};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// A puzzle loaded from a source, with any saved progress applied.
#[derive(Debug)]
pub struct OpenedPuzzle<M> {
    pub puzzle_id: PuzzleId,
    pub difficulty: Difficulty,
    pub puzzle: M,
    /// Time already spent, if saved progress was restored.
    pub resumed_elapsed: Option<Duration>,
}

/// Owns the save-game store and knows where archives live.
pub struct Library {
    db: Database,
    archive_dir: PathBuf,
}

impl Library {
    /// Open the store and archive directory named by `config`, creating
    /// the directory layout under `paths` first.
    pub fn open(config: &Config, paths: &Paths) -> LibraryResult<Self> {
        paths.ensure_dirs()?;

        let database_file = config.database_file(paths);
        let archive_dir = config.archive_dir(paths);
        let db = Database::open(&database_file)?;

        info!(
            database = %database_file.display(),
            archives = %archive_dir.display(),
            "Library opened"
        );
        Ok(Self::with_database(db, archive_dir))
    }

    pub fn with_database(db: Database, archive_dir: PathBuf) -> Self {
        Self { db, archive_dir }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    pub fn close(self) -> LibraryResult<()> {
        self.db.close()?;
        Ok(())
    }

    // ==========================================
    // Archives
    // ==========================================

    /// Set ids that have both an index and a data file, sorted.
    pub fn available_archives(&self) -> LibraryResult<Vec<String>> {
        let mut set_ids = Vec::new();
        let entries = std::fs::read_dir(&self.archive_dir).map_err(ArchiveError::from)?;
        for entry in entries {
            let path = entry.map_err(ArchiveError::from)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(INDEX_EXTENSION) {
                continue;
            }
            if !path.with_extension(DATA_EXTENSION).is_file() {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                set_ids.push(stem.to_string());
            }
        }
        set_ids.sort();
        Ok(set_ids)
    }

    /// Open one archive from the archive directory.
    pub fn open_archive<C: PuzzleCodec>(
        &self,
        set_id: &str,
        codec: C,
    ) -> LibraryResult<ArchivePuzzleSource<C>> {
        Ok(ArchivePuzzleSource::open(&self.archive_dir, set_id, codec)?)
    }

    // ==========================================
    // Games
    // ==========================================

    /// Load puzzle `number` from `source`, build it with `build`, and apply
    /// saved progress if any exists.
    pub fn open_puzzle<S, M, F>(
        &self,
        source: &S,
        number: usize,
        build: F,
    ) -> LibraryResult<OpenedPuzzle<M>>
    where
        S: PuzzleSource,
        LibraryError: From<S::Error>,
        M: PuzzleMemento,
        F: FnOnce(PuzzleHolder<S::Puzzle, S::Solution>) -> M,
    {
        let holder = source.load(number)?;
        let difficulty = source.difficulty(number)?;
        let puzzle_id = holder.puzzle_id();

        let mut puzzle = build(holder);
        let resumed_elapsed = self.db.restore_memento(&puzzle_id, &mut puzzle)?;

        debug!(puzzle_id = %puzzle_id, resumed = resumed_elapsed.is_some(), "Puzzle opened");
        Ok(OpenedPuzzle {
            puzzle_id,
            difficulty,
            puzzle,
            resumed_elapsed,
        })
    }

    /// Persist the current state of an opened puzzle.
    pub fn save_progress<M: PuzzleMemento>(
        &self,
        puzzle_id: &PuzzleId,
        puzzle_type: i32,
        puzzle: &M,
        elapsed: Duration,
    ) -> LibraryResult<()> {
        self.db.save_memento(puzzle_id, puzzle_type, puzzle, elapsed)?;
        Ok(())
    }

    pub fn forget(&self, puzzle_id: &PuzzleId) -> LibraryResult<bool> {
        Ok(self.db.delete_game(puzzle_id)?)
    }

    pub fn unfinished_games(&self) -> LibraryResult<Vec<SavedGameSummary>> {
        Ok(self.db.list_unfinished_games()?)
    }

    pub fn progress<S: PuzzleSource>(&self, source: &S) -> LibraryResult<Vec<SourceProgress>> {
        Ok(self.db.list_games_by_source(&source.source_id())?)
    }

    pub fn statistics<S: PuzzleSource>(&self, source: &S) -> LibraryResult<GameStatistics> {
        Ok(self.db.statistics(&source.source_id())?)
    }
}

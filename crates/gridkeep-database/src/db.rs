//! Database connection and save-game operations.

use crate::{
    migrations, queries, DatabaseError, DatabaseResult, GameStatistics, NewSavedGame, SaveOutcome,
    SavedGame, SavedGameSummary, SourceProgress,
};
use chrono::{DateTime, Utc};
use gridkeep_core::{PuzzleId, PuzzleMemento, StateBlob};
use rusqlite::Connection;
use std::cell::Cell;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Save-game store over a single SQLite connection.
///
/// Single owner: `Send` but not `Sync`. Share it through a mutex or use
/// [`crate::AsyncDatabase`].
pub struct Database {
    conn: Connection,
    dropped_saves: Cell<u64>,
}

impl Database {
    /// Open a database at the given path, running migrations if needed.
    pub fn open(path: &Path) -> DatabaseResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -16000;
            PRAGMA temp_store = MEMORY;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        migrations::run_migrations(&conn)?;
        info!(path = %path.display(), "Save-game store opened");

        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory database for testing.
    pub fn open_in_memory() -> DatabaseResult<Self> {
        let conn = Connection::open_in_memory()?;
        // Note: WAL mode doesn't apply to in-memory databases
        conn.execute_batch("PRAGMA temp_store = MEMORY;")?;
        migrations::run_migrations(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            dropped_saves: Cell::new(0),
        }
    }

    /// Get a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Current `user_version` of the open store.
    pub fn schema_version(&self) -> DatabaseResult<i32> {
        migrations::schema_version(&self.conn)
    }

    /// Number of saves since open that touched no rows and were discarded.
    pub fn dropped_save_count(&self) -> u64 {
        self.dropped_saves.get()
    }

    /// Release the connection.
    pub fn close(self) -> DatabaseResult<()> {
        self.conn
            .close()
            .map_err(|(_, e)| DatabaseError::Connection(format!("Failed to close database: {e}")))?;
        debug!("Save-game store closed");
        Ok(())
    }

    // ==========================================
    // Saved games
    // ==========================================

    /// Insert or update the saved game for `puzzle_id`, stamped with the
    /// current time.
    pub fn save_game(&self, puzzle_id: &PuzzleId, game: &NewSavedGame) -> DatabaseResult<()> {
        self.save_game_at(puzzle_id, game, Utc::now())
    }

    /// Like [`Database::save_game`] with an explicit clock value.
    pub fn save_game_at(
        &self,
        puzzle_id: &PuzzleId,
        game: &NewSavedGame,
        now: DateTime<Utc>,
    ) -> DatabaseResult<()> {
        if queries::save_game(&self.conn, puzzle_id, game, now)? == SaveOutcome::Dropped {
            self.dropped_saves.set(self.dropped_saves.get() + 1);
        }
        Ok(())
    }

    pub fn load_game(&self, puzzle_id: &PuzzleId) -> DatabaseResult<Option<SavedGame>> {
        queries::load_game(&self.conn, puzzle_id)
    }

    /// Delete a saved game. Returns whether a row was removed.
    pub fn delete_game(&self, puzzle_id: &PuzzleId) -> DatabaseResult<bool> {
        let removed = queries::delete_game(&self.conn, puzzle_id)?;
        debug!(puzzle_id = %puzzle_id, removed, "Game deleted");
        Ok(removed)
    }

    pub fn list_games(&self) -> DatabaseResult<Vec<SavedGameSummary>> {
        queries::list_games(&self.conn)
    }

    /// Unsolved games, most recently modified first.
    pub fn list_unfinished_games(&self) -> DatabaseResult<Vec<SavedGameSummary>> {
        queries::list_unfinished_games(&self.conn)
    }

    pub fn list_games_by_source(&self, source_id: &str) -> DatabaseResult<Vec<SourceProgress>> {
        queries::list_games_by_source(&self.conn, source_id)
    }

    /// Totals over the solved games of one source.
    pub fn statistics(&self, source_id: &str) -> DatabaseResult<GameStatistics> {
        queries::statistics(&self.conn, source_id)
    }

    pub fn puzzle_id_by_row_id(&self, row_id: i64) -> DatabaseResult<Option<PuzzleId>> {
        queries::puzzle_id_by_row_id(&self.conn, row_id)
    }

    /// Delete every saved game.
    pub fn reset_all(&self) -> DatabaseResult<u64> {
        let removed = queries::reset_all(&self.conn)?;
        info!(removed, "All saved games deleted");
        Ok(removed)
    }

    // ==========================================
    // Mementos
    // ==========================================

    /// Snapshot `memento` into the store.
    pub fn save_memento<M: PuzzleMemento + ?Sized>(
        &self,
        puzzle_id: &PuzzleId,
        puzzle_type: i32,
        memento: &M,
        elapsed: Duration,
    ) -> DatabaseResult<()> {
        let game = NewSavedGame {
            puzzle_type,
            state: StateBlob::encode(&memento.save())?,
            elapsed,
            solved: memento.is_solved(),
        };
        self.save_game(puzzle_id, &game)
    }

    /// Restore `memento` from the store and return the saved elapsed time.
    ///
    /// `None` when nothing usable is stored; `memento` is then untouched
    /// unless its own `restore` partially applied the bytes.
    pub fn restore_memento<M: PuzzleMemento + ?Sized>(
        &self,
        puzzle_id: &PuzzleId,
        memento: &mut M,
    ) -> DatabaseResult<Option<Duration>> {
        let Some(game) = self.load_game(puzzle_id)? else {
            debug!(puzzle_id = %puzzle_id, "No saved game to restore");
            return Ok(None);
        };

        let payload = match StateBlob::decode(&game.state) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(puzzle_id = %puzzle_id, error = %e, "Saved state is unreadable");
                return Ok(None);
            }
        };

        if !memento.restore(payload) {
            warn!(puzzle_id = %puzzle_id, "Puzzle rejected saved state");
            return Ok(None);
        }

        Ok(Some(game.elapsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::tests::{create_v1_store, insert_v1_row};
    use crate::CURRENT_VERSION;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn game(state: &[u8], elapsed_ms: u64, solved: bool) -> NewSavedGame {
        NewSavedGame {
            puzzle_type: 1,
            state: state.to_vec(),
            elapsed: Duration::from_millis(elapsed_ms),
            solved,
        }
    }

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    /// Cell values plus a solved flag.
    #[derive(Default)]
    struct Grid {
        cells: Vec<u8>,
        solved: bool,
    }

    impl PuzzleMemento for Grid {
        fn save(&self) -> Vec<u8> {
            let mut out = self.cells.clone();
            out.push(self.solved as u8);
            out
        }

        fn restore(&mut self, bytes: &[u8]) -> bool {
            let Some((flag, cells)) = bytes.split_last() else {
                return false;
            };
            if *flag > 1 {
                return false;
            }
            self.cells = cells.to_vec();
            self.solved = *flag == 1;
            true
        }

        fn is_solved(&self) -> bool {
            self.solved
        }
    }

    #[test]
    fn test_open_creates_current_schema() {
        let dir = tempdir().unwrap();
        let db = Database::open(&dir.path().join("nested").join("save_games.sqlite")).unwrap();
        assert_eq!(db.schema_version().unwrap(), CURRENT_VERSION);
        db.close().unwrap();
    }

    #[test]
    fn test_save_then_load_keeps_created() {
        let db = Database::open_in_memory().unwrap();
        let id = PuzzleId::new("archive:hard5", 3);

        db.save_game_at(&id, &game(b"first", 1_000, false), at(10_000))
            .unwrap();
        db.save_game_at(&id, &game(b"second", 4_500, true), at(20_000))
            .unwrap();

        let loaded = db.load_game(&id).unwrap().unwrap();
        assert_eq!(loaded.puzzle_id, id);
        assert_eq!(loaded.puzzle_type, 1);
        assert_eq!(loaded.state, b"second");
        assert_eq!(loaded.elapsed, Duration::from_millis(4_500));
        assert!(loaded.solved);
        assert_eq!(loaded.created_at, at(10_000));
        assert_eq!(loaded.modified_at, at(20_000));
    }

    #[test]
    fn test_repeated_saves_keep_one_row() {
        let db = Database::open_in_memory().unwrap();
        let id = PuzzleId::new("pack-a", 7);
        for i in 0..5 {
            db.save_game(&id, &game(&[i], u64::from(i), false)).unwrap();
        }

        let games = db.list_games().unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].puzzle_id, id);
        assert_eq!(db.dropped_save_count(), 0);
    }

    #[test]
    fn test_load_missing_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.load_game(&PuzzleId::new("nowhere", 0)).unwrap().is_none());
    }

    #[test]
    fn test_delete_then_load_is_none() {
        let db = Database::open_in_memory().unwrap();
        let id = PuzzleId::new("pack-a", 1);
        db.save_game(&id, &game(b"x", 1, false)).unwrap();

        assert!(db.delete_game(&id).unwrap());
        assert!(db.load_game(&id).unwrap().is_none());
        assert!(!db.delete_game(&id).unwrap());
    }

    #[test]
    fn test_unfinished_sorted_by_modified_desc() {
        let db = Database::open_in_memory().unwrap();
        db.save_game_at(&PuzzleId::new("s", 1), &game(b"a", 1, false), at(1_000))
            .unwrap();
        db.save_game_at(&PuzzleId::new("s", 2), &game(b"b", 1, true), at(2_000))
            .unwrap();
        db.save_game_at(&PuzzleId::new("s", 3), &game(b"c", 1, false), at(3_000))
            .unwrap();
        db.save_game_at(&PuzzleId::new("t", 1), &game(b"d", 1, false), at(1_500))
            .unwrap();

        let numbers: Vec<(String, u32)> = db
            .list_unfinished_games()
            .unwrap()
            .into_iter()
            .map(|g| (g.puzzle_id.source_id, g.puzzle_id.number))
            .collect();
        assert_eq!(
            numbers,
            vec![
                ("s".to_string(), 3),
                ("t".to_string(), 1),
                ("s".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_list_games_in_insertion_order() {
        let db = Database::open_in_memory().unwrap();
        for n in [5, 2, 9] {
            db.save_game(&PuzzleId::new("s", n), &game(b"", 0, false))
                .unwrap();
        }
        let numbers: Vec<u32> = db
            .list_games()
            .unwrap()
            .iter()
            .map(|g| g.puzzle_id.number)
            .collect();
        assert_eq!(numbers, vec![5, 2, 9]);
    }

    #[test]
    fn test_games_by_source_sorted_by_number() {
        let db = Database::open_in_memory().unwrap();
        db.save_game(&PuzzleId::new("s", 4), &game(b"", 0, true)).unwrap();
        db.save_game(&PuzzleId::new("s", 1), &game(b"", 0, false)).unwrap();
        db.save_game(&PuzzleId::new("other", 2), &game(b"", 0, false)).unwrap();

        let progress = db.list_games_by_source("s").unwrap();
        assert_eq!(
            progress,
            vec![
                SourceProgress { number: 1, solved: false },
                SourceProgress { number: 4, solved: true },
            ]
        );
    }

    #[test]
    fn test_statistics_counts_only_solved() {
        let db = Database::open_in_memory().unwrap();
        let id = PuzzleId::new("pack-a", 3);

        db.save_game(&id, &game(b"", 12_000, false)).unwrap();
        assert_eq!(db.statistics("pack-a").unwrap(), GameStatistics::default());

        db.save_game(&id, &game(b"", 30_000, true)).unwrap();
        let stats = db.statistics("pack-a").unwrap();
        assert_eq!(stats.solved_count, 1);
        assert_eq!(stats.total_time, Duration::from_millis(30_000));
        assert_eq!(stats.min_time, Duration::from_millis(30_000));
        assert_eq!(stats.max_time, Duration::from_millis(30_000));
    }

    #[test]
    fn test_statistics_aggregates_several_games() {
        let db = Database::open_in_memory().unwrap();
        for (n, ms) in [(0, 20_000), (1, 40_000), (2, 30_000)] {
            db.save_game(&PuzzleId::new("pack-b", n), &game(b"", ms, true))
                .unwrap();
        }
        db.save_game(&PuzzleId::new("pack-b", 3), &game(b"", 1, false))
            .unwrap();

        let stats = db.statistics("pack-b").unwrap();
        assert_eq!(stats.solved_count, 3);
        assert_eq!(stats.total_time, Duration::from_millis(90_000));
        assert_eq!(stats.min_time, Duration::from_millis(20_000));
        assert_eq!(stats.max_time, Duration::from_millis(40_000));
        assert_eq!(stats.average_time(), Some(Duration::from_millis(30_000)));
    }

    #[test]
    fn test_puzzle_id_by_row_id() {
        let db = Database::open_in_memory().unwrap();
        let id = PuzzleId::new("s", 8);
        db.save_game(&id, &game(b"", 0, false)).unwrap();
        let row_id = db.load_game(&id).unwrap().unwrap().row_id;

        assert_eq!(db.puzzle_id_by_row_id(row_id).unwrap(), Some(id));
        assert_eq!(db.puzzle_id_by_row_id(row_id + 100).unwrap(), None);
    }

    #[test]
    fn test_reset_all_reports_count() {
        let db = Database::open_in_memory().unwrap();
        for n in 0..3 {
            db.save_game(&PuzzleId::new("s", n), &game(b"", 0, false))
                .unwrap();
        }
        assert_eq!(db.reset_all().unwrap(), 3);
        assert!(db.list_games().unwrap().is_empty());
        assert_eq!(db.reset_all().unwrap(), 0);
    }

    #[test]
    fn test_zero_row_save_is_counted_not_failed() {
        let db = Database::open_in_memory().unwrap();
        let id = PuzzleId::new("s", 1);
        db.save_game_at(&id, &game(b"kept", 5, false), at(1_000))
            .unwrap();

        db.connection()
            .execute_batch(
                "CREATE TRIGGER ignore_updates BEFORE UPDATE ON games
                 BEGIN SELECT RAISE(IGNORE); END;",
            )
            .unwrap();

        db.save_game_at(&id, &game(b"lost", 9, true), at(2_000))
            .unwrap();
        assert_eq!(db.dropped_save_count(), 1);

        let loaded = db.load_game(&id).unwrap().unwrap();
        assert_eq!(loaded.state, b"kept");
        assert_eq!(loaded.modified_at, at(1_000));
    }

    #[test]
    fn test_memento_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let id = PuzzleId::new("archive:medium3", 12);
        let grid = Grid {
            cells: vec![3, 0, 7],
            solved: false,
        };
        db.save_memento(&id, 2, &grid, Duration::from_secs(42)).unwrap();

        let stored = db.load_game(&id).unwrap().unwrap();
        assert_eq!(&stored.state[..4], &StateBlob::MAGIC);
        assert!(!stored.solved);

        let mut restored = Grid::default();
        let elapsed = db.restore_memento(&id, &mut restored).unwrap();
        assert_eq!(elapsed, Some(Duration::from_secs(42)));
        assert_eq!(restored.cells, vec![3, 0, 7]);
    }

    #[test]
    fn test_restore_missing_or_unreadable_is_none() {
        let db = Database::open_in_memory().unwrap();
        let id = PuzzleId::new("s", 1);
        let mut grid = Grid::default();
        assert_eq!(db.restore_memento(&id, &mut grid).unwrap(), None);

        // Raw bytes without the envelope.
        db.save_game(&id, &game(&[1, 2, 0], 5, false)).unwrap();
        assert_eq!(db.restore_memento(&id, &mut grid).unwrap(), None);
        assert!(grid.cells.is_empty());

        // Enveloped but rejected by the puzzle.
        let bad = StateBlob::encode(&[1, 2, 9]).unwrap();
        db.save_game(&id, &NewSavedGame { state: bad, ..game(b"", 5, false) })
            .unwrap();
        assert_eq!(db.restore_memento(&id, &mut grid).unwrap(), None);
    }

    #[derive(Clone, Default)]
    struct CapturedLog(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLog {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_fresh_puzzle_restore_logs_no_warning() {
        let db = Database::open_in_memory().unwrap();
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut grid = Grid::default();
            let fresh = PuzzleId::new("pack-a", 8);
            assert_eq!(db.restore_memento(&fresh, &mut grid).unwrap(), None);
        });
        assert!(!log.text().contains("No saved game"));

        // A real restore problem still warns.
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer({
                let writer = log.clone();
                move || writer.clone()
            })
            .finish();
        let stored = PuzzleId::new("pack-a", 9);
        db.save_game(&stored, &game(&[1, 2, 0], 5, false)).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            let mut grid = Grid::default();
            assert_eq!(db.restore_memento(&stored, &mut grid).unwrap(), None);
        });
        assert!(log.text().contains("Saved state is unreadable"));
    }

    #[test]
    fn test_open_migrates_v1_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("legacy.sqlite");
        {
            let conn = Connection::open(&path).unwrap();
            create_v1_store(&conn);
            insert_v1_row(&conn, 1, "pack-a", 3, b"blob", 9_000, true, 100, 200);
            insert_v1_row(&conn, 2, "pack-a", 4, b"", 1_000, false, 300, 400);
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.schema_version().unwrap(), CURRENT_VERSION);

        let loaded = db.load_game(&PuzzleId::new("pack-a", 3)).unwrap().unwrap();
        assert_eq!(loaded.state, b"blob");
        assert_eq!(loaded.elapsed, Duration::from_millis(9_000));
        assert!(loaded.solved);
        assert_eq!(loaded.created_at, at(100));
        assert_eq!(loaded.modified_at, at(200));
        assert_eq!(db.statistics("pack-a").unwrap().solved_count, 1);
    }
}

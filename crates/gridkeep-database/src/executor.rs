//! Async SQLite executor using a dedicated background thread.
//!
//! Every call is sent to one SQLite thread over a channel and runs in FIFO
//! order, so concurrent tasks can share the store without a mutex.
//!
//! Only SQL and light row mapping belong inside `call()`; encode or decode
//! state blobs before or after it.
//!
//! # Example
//!
//! ```ignore
//! let db = AsyncDatabase::open(&paths.database_file()).await?;
//!
//! let unfinished = db.call(|conn| queries::list_unfinished_games(conn)).await?;
//! ```

use crate::{migrations, queries, DatabaseError, DatabaseResult, NewSavedGame, SaveOutcome, SavedGame};
use chrono::Utc;
use gridkeep_core::PuzzleId;
use std::path::Path;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

/// Convert a tokio_rusqlite::Error to DatabaseError.
fn from_tokio_rusqlite(e: tokio_rusqlite::Error) -> DatabaseError {
    match e {
        tokio_rusqlite::Error::Rusqlite(e) => DatabaseError::Sqlite(e),
        tokio_rusqlite::Error::Close(_) => DatabaseError::Connection("Connection closed".to_string()),
        other => DatabaseError::Connection(other.to_string()),
    }
}

/// Save-game store served from a dedicated executor thread.
///
/// Cloning is cheap; clones share the thread and its connection.
#[derive(Clone)]
pub struct AsyncDatabase {
    conn: Connection,
    path: String,
}

impl AsyncDatabase {
    /// Open a database at the given path.
    ///
    /// Creates the file and its parent directory if needed, applies the
    /// same pragmas as [`crate::Database::open`] and runs pending
    /// migrations before returning.
    pub async fn open(path: &Path) -> DatabaseResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let path_str = path.to_string_lossy().to_string();
        info!(path = %path_str, "Opening async save-game store");

        // Spawns the dedicated background thread
        let conn = Connection::open(&path_str)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        let db = Self {
            conn,
            path: path_str,
        };

        db.call(|conn| {
            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA cache_size = -16000;
                PRAGMA temp_store = MEMORY;
                PRAGMA busy_timeout = 5000;
                ",
            )?;
            migrations::run_migrations(conn)
        })
        .await?;

        info!(path = %db.path, "Async save-game store initialized");
        Ok(db)
    }

    /// Execute a closure on the database connection.
    ///
    /// The closure runs on the dedicated SQLite thread; the calling task is
    /// parked until the result is ready. Typed errors from the closure come
    /// back unchanged.
    pub async fn call<F, T>(&self, f: F) -> DatabaseResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> DatabaseResult<T> + Send + 'static,
        T: Send + 'static,
    {
        // Our result rides inside tokio_rusqlite's Ok so it is not flattened
        // into tokio_rusqlite::Error.
        let outer_result = self.conn.call(move |conn| Ok(f(conn))).await;

        match outer_result {
            Ok(inner) => inner,
            Err(e) => Err(from_tokio_rusqlite(e)),
        }
    }

    /// Execute a closure that returns a rusqlite::Result.
    pub async fn call_sqlite<F, T>(&self, f: F) -> DatabaseResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.conn
            .call(move |conn| Ok(f(conn)?))
            .await
            .map_err(from_tokio_rusqlite)
    }

    /// Get the database file path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Check if the database is healthy by executing a simple query.
    pub async fn health_check(&self) -> DatabaseResult<()> {
        self.call_sqlite(|conn| conn.execute_batch("SELECT 1")).await?;
        debug!("Database health check passed");
        Ok(())
    }

    /// Upsert a saved game stamped with the current time.
    pub async fn save_game(
        &self,
        puzzle_id: PuzzleId,
        game: NewSavedGame,
    ) -> DatabaseResult<SaveOutcome> {
        let now = Utc::now();
        self.call(move |conn| queries::save_game(conn, &puzzle_id, &game, now))
            .await
    }

    pub async fn load_game(&self, puzzle_id: PuzzleId) -> DatabaseResult<Option<SavedGame>> {
        self.call(move |conn| queries::load_game(conn, &puzzle_id)).await
    }

    /// Close the connection once queued calls have finished, then stop the
    /// executor thread.
    pub async fn close(self) -> DatabaseResult<()> {
        self.conn
            .close()
            .await
            .map_err(|e| DatabaseError::Connection(format!("Failed to close database: {e:?}")))?;
        info!(path = %self.path, "Async save-game store closed");
        Ok(())
    }
}

//! Standalone query functions that work with any Connection.
//!
//! `Database` delegates to these; `AsyncDatabase` callers use them inside
//! `call()`. Each function takes a `&Connection` as its first parameter.

use crate::{
    DatabaseResult, GameStatistics, NewSavedGame, SavedGame, SavedGameSummary, SourceProgress,
};
use chrono::{DateTime, Utc};
use gridkeep_core::PuzzleId;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::time::Duration;
use tracing::{debug, warn};

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted { row_id: i64 },
    Updated { row_id: i64 },
    /// The write touched no rows (e.g. the row vanished between lookup and
    /// update). Nothing was committed.
    Dropped,
}

// ==========================================
// Saved games
// ==========================================

/// Find the row id stored for a puzzle.
pub fn find_row_id(conn: &Connection, puzzle_id: &PuzzleId) -> DatabaseResult<Option<i64>> {
    let mut stmt = conn.prepare_cached("SELECT id FROM games WHERE source = ?1 AND number = ?2")?;
    let row_id = stmt
        .query_row(params![puzzle_id.source_id, puzzle_id.number], |row| row.get(0))
        .optional()?;
    Ok(row_id)
}

/// Insert or update the saved game for `puzzle_id`.
///
/// Lookup and write share one IMMEDIATE transaction, so two savers of the
/// same puzzle cannot both insert. `created` is written only on insert.
pub fn save_game(
    conn: &Connection,
    puzzle_id: &PuzzleId,
    game: &NewSavedGame,
    now: DateTime<Utc>,
) -> DatabaseResult<SaveOutcome> {
    let now_ms = now.timestamp_millis();
    let timer = duration_to_millis(game.elapsed);

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    let outcome = match find_row_id(&tx, puzzle_id)? {
        None => {
            let inserted = tx.execute(
                "INSERT INTO games (source, number, type, puzzle, timer, solved, created, modified)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    puzzle_id.source_id,
                    puzzle_id.number,
                    game.puzzle_type,
                    game.state,
                    timer,
                    game.solved,
                    now_ms,
                ],
            )?;
            if inserted == 0 {
                SaveOutcome::Dropped
            } else {
                SaveOutcome::Inserted {
                    row_id: tx.last_insert_rowid(),
                }
            }
        }
        Some(row_id) => {
            let updated = tx.execute(
                "UPDATE games SET puzzle = ?1, timer = ?2, solved = ?3, modified = ?4 WHERE id = ?5",
                params![game.state, timer, game.solved, now_ms, row_id],
            )?;
            if updated == 0 {
                SaveOutcome::Dropped
            } else {
                SaveOutcome::Updated { row_id }
            }
        }
    };

    if outcome == SaveOutcome::Dropped {
        // Dropping `tx` rolls back.
        warn!(puzzle_id = %puzzle_id, "Save touched no rows; nothing written");
        return Ok(outcome);
    }

    tx.commit()?;
    debug!(puzzle_id = %puzzle_id, ?outcome, "Game saved");
    Ok(outcome)
}

/// Load the saved game for a puzzle.
pub fn load_game(conn: &Connection, puzzle_id: &PuzzleId) -> DatabaseResult<Option<SavedGame>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, source, number, type, puzzle, timer, solved, created, modified
         FROM games WHERE source = ?1 AND number = ?2",
    )?;

    let game = stmt
        .query_row(params![puzzle_id.source_id, puzzle_id.number], |row| {
            Ok(SavedGame {
                row_id: row.get(0)?,
                puzzle_id: PuzzleId::new(row.get::<_, String>(1)?, row.get(2)?),
                puzzle_type: row.get(3)?,
                state: row.get::<_, Option<Vec<u8>>>(4)?.unwrap_or_default(),
                elapsed: millis_to_duration(row.get(5)?),
                solved: row.get(6)?,
                created_at: datetime_from_millis(row.get(7)?),
                modified_at: datetime_from_millis(row.get(8)?),
            })
        })
        .optional()?;
    Ok(game)
}

/// Delete the saved game for a puzzle. Returns whether a row was removed.
pub fn delete_game(conn: &Connection, puzzle_id: &PuzzleId) -> DatabaseResult<bool> {
    let count = conn.execute(
        "DELETE FROM games WHERE source = ?1 AND number = ?2",
        params![puzzle_id.source_id, puzzle_id.number],
    )?;
    Ok(count > 0)
}

/// List every saved game in row order.
pub fn list_games(conn: &Connection) -> DatabaseResult<Vec<SavedGameSummary>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, source, number, type, timer, created, modified
         FROM games ORDER BY id",
    )?;
    let games = stmt
        .query_map([], summary_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(games)
}

/// List unsolved games, most recently modified first.
pub fn list_unfinished_games(conn: &Connection) -> DatabaseResult<Vec<SavedGameSummary>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, source, number, type, timer, created, modified
         FROM games WHERE solved = 0 ORDER BY modified DESC",
    )?;
    let games = stmt
        .query_map([], summary_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(games)
}

/// Progress of every saved puzzle from one source, by puzzle number.
pub fn list_games_by_source(
    conn: &Connection,
    source_id: &str,
) -> DatabaseResult<Vec<SourceProgress>> {
    let mut stmt = conn.prepare_cached(
        "SELECT number, solved FROM games WHERE source = ?1 ORDER BY number",
    )?;
    let progress = stmt
        .query_map(params![source_id], |row| {
            Ok(SourceProgress {
                number: row.get(0)?,
                solved: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(progress)
}

/// Aggregate the solved games of one source.
pub fn statistics(conn: &Connection, source_id: &str) -> DatabaseResult<GameStatistics> {
    let mut stmt = conn.prepare_cached(
        "SELECT COUNT(*), COALESCE(SUM(timer), 0), COALESCE(MIN(timer), 0), COALESCE(MAX(timer), 0)
         FROM games WHERE source = ?1 AND solved = 1",
    )?;
    let stats = stmt.query_row(params![source_id], |row| {
        Ok(GameStatistics {
            solved_count: row.get(0)?,
            total_time: millis_to_duration(row.get(1)?),
            min_time: millis_to_duration(row.get(2)?),
            max_time: millis_to_duration(row.get(3)?),
        })
    })?;
    Ok(stats)
}

/// Resolve a storage row id back to its puzzle.
pub fn puzzle_id_by_row_id(conn: &Connection, row_id: i64) -> DatabaseResult<Option<PuzzleId>> {
    let mut stmt = conn.prepare_cached("SELECT source, number FROM games WHERE id = ?1")?;
    let puzzle_id = stmt
        .query_row(params![row_id], |row| {
            Ok(PuzzleId::new(row.get::<_, String>(0)?, row.get(1)?))
        })
        .optional()?;
    Ok(puzzle_id)
}

/// Delete every saved game. Returns the number of rows removed.
pub fn reset_all(conn: &Connection) -> DatabaseResult<u64> {
    let count = conn.execute("DELETE FROM games", [])?;
    Ok(count as u64)
}

// ==========================================
// Row helpers
// ==========================================

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<SavedGameSummary> {
    Ok(SavedGameSummary {
        row_id: row.get(0)?,
        puzzle_id: PuzzleId::new(row.get::<_, String>(1)?, row.get(2)?),
        puzzle_type: row.get(3)?,
        elapsed: millis_to_duration(row.get(4)?),
        created_at: datetime_from_millis(row.get(5)?),
        modified_at: datetime_from_millis(row.get(6)?),
    })
}

fn duration_to_millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

/// Negative timers from corrupt rows clamp to zero.
fn millis_to_duration(ms: i64) -> Duration {
    Duration::from_millis(u64::try_from(ms).unwrap_or(0))
}

fn datetime_from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_default()
}

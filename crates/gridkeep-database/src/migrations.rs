//! Database migrations.
//!
//! The schema version lives in SQLite's `PRAGMA user_version` so stores
//! written by earlier releases are recognised without a side table.
//!
//! SQLite cannot drop or rename a column in place, so column-removing steps
//! rebuild the table: rename it aside, create the current schema, copy every
//! row across positionally, drop the old table. Row ids are not preserved.

use crate::{DatabaseError, DatabaseResult};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Transaction, TransactionBehavior};
use tracing::{debug, info};

/// Current schema version.
pub const CURRENT_VERSION: i32 = 2;

/// Saved games table.
pub const GAMES_TABLE: &str = "games";

/// One version transition.
struct Migration {
    from: i32,
    name: &'static str,
    apply: fn(&Connection) -> DatabaseResult<()>,
}

/// Ordered by `from`; each step moves exactly one version forward.
const MIGRATIONS: &[Migration] = &[Migration {
    from: 1,
    name: "drop_pid_column",
    apply: migrate_v1_drop_pid_column,
}];

/// Read the on-disk schema version (0 for a fresh file).
pub fn schema_version(conn: &Connection) -> DatabaseResult<i32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Bring the store to [`CURRENT_VERSION`].
pub fn run_migrations(conn: &Connection) -> DatabaseResult<()> {
    let current_version = schema_version(conn)?;

    info!(current_version, target_version = CURRENT_VERSION, "Running migrations");

    if current_version == CURRENT_VERSION {
        return Ok(());
    }
    if current_version > CURRENT_VERSION {
        return Err(DatabaseError::Migration(format!(
            "store schema version {current_version} is newer than supported version {CURRENT_VERSION}"
        )));
    }
    if current_version == 0 {
        return create_schema(conn);
    }

    migrate(conn, current_version, CURRENT_VERSION)?;
    info!("Migrations complete");
    Ok(())
}

/// Apply every step with `from <= step.from < to` inside one transaction.
///
/// Any failure rolls back all steps and the version bump.
pub fn migrate(conn: &Connection, from: i32, to: i32) -> DatabaseResult<()> {
    if from < 1 || from > to || to > CURRENT_VERSION {
        return Err(DatabaseError::Migration(format!(
            "cannot migrate from version {from} to {to}"
        )));
    }

    apply_steps(conn, from, to).map_err(|e| match e {
        DatabaseError::Migration(msg) => DatabaseError::Migration(msg),
        other => DatabaseError::Migration(other.to_string()),
    })
}

fn apply_steps(conn: &Connection, from: i32, to: i32) -> DatabaseResult<()> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    // Another connection may have migrated between our version read and
    // taking the write lock.
    let locked_version = schema_version(&tx)?;
    if locked_version >= to {
        debug!(locked_version, to, "Store already migrated");
        return Ok(());
    }
    if locked_version != from {
        return Err(DatabaseError::Migration(format!(
            "expected store at version {from}, found {locked_version}"
        )));
    }

    for step in MIGRATIONS.iter().filter(|m| m.from >= from && m.from < to) {
        info!(from = step.from, to = step.from + 1, name = step.name, "Applying migration");
        (step.apply)(&tx).map_err(|e| {
            DatabaseError::Migration(format!(
                "v{} -> v{} ({}): {e}",
                step.from,
                step.from + 1,
                step.name
            ))
        })?;
        debug!(version = step.from + 1, name = step.name, "Migration applied");
    }

    tx.pragma_update(None, "user_version", to)?;
    tx.commit()?;
    Ok(())
}

/// Fresh store: create the current schema directly.
fn create_schema(conn: &Connection) -> DatabaseResult<()> {
    info!(version = CURRENT_VERSION, "Creating schema");

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let locked_version = schema_version(&tx)?;
    if locked_version != 0 {
        // Created by another connection; migrate from what it left.
        drop(tx);
        return run_migrations(conn);
    }
    create_games_table(&tx)?;
    create_games_indexes(&tx)?;
    tx.pragma_update(None, "user_version", CURRENT_VERSION)?;
    tx.commit()?;
    Ok(())
}

fn create_games_table(conn: &Connection) -> DatabaseResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS games (
            id INTEGER PRIMARY KEY,
            source TEXT,
            number INTEGER,
            type INTEGER,
            puzzle BLOB,
            timer INTEGER,
            solved BOOLEAN,
            created INTEGER,
            modified INTEGER
        );
        ",
    )?;
    Ok(())
}

fn create_games_indexes(conn: &Connection) -> DatabaseResult<()> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_games_source_number
            ON games(source, number);
        CREATE INDEX IF NOT EXISTS idx_games_solved_modified
            ON games(solved, modified);
        ",
    )?;
    Ok(())
}

/// Where a column of the rebuilt table takes its value from.
struct ColumnCopy {
    target: &'static str,
    source: usize,
}

/// Rebuild `table` under the schema produced by `create`, copying each old
/// row positionally. Target columns not listed take their defaults.
///
/// Returns the number of rows copied.
fn rebuild_table(
    conn: &Connection,
    table: &str,
    create: fn(&Connection) -> DatabaseResult<()>,
    copies: &[ColumnCopy],
) -> DatabaseResult<usize> {
    let tmp = format!("{table}_tmp");

    conn.execute_batch(&format!("ALTER TABLE {table} RENAME TO {tmp};"))?;
    create(conn)?;

    let targets = copies
        .iter()
        .map(|c| c.target)
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=copies.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut copied = 0usize;
    {
        let mut insert =
            conn.prepare(&format!("INSERT INTO {table} ({targets}) VALUES ({placeholders})"))?;
        let mut select = conn.prepare(&format!("SELECT * FROM {tmp}"))?;
        let mut rows = select.query([])?;

        while let Some(row) = rows.next()? {
            let values = copies
                .iter()
                .map(|c| row.get::<_, Value>(c.source))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            insert.execute(params_from_iter(values))?;
            copied += 1;
        }
    }

    let original: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {tmp}"), [], |row| {
        row.get(0)
    })?;
    if original as usize != copied {
        return Err(DatabaseError::Migration(format!(
            "copied {copied} of {original} rows from {tmp}"
        )));
    }

    conn.execute_batch(&format!("DROP TABLE {tmp};"))?;
    Ok(copied)
}

/// V2: drop the legacy `pid` column.
///
/// v1 layout: `(id, pid, source, number, type, puzzle, timer, solved, created, modified)`.
fn migrate_v1_drop_pid_column(conn: &Connection) -> DatabaseResult<()> {
    let copied = rebuild_table(
        conn,
        GAMES_TABLE,
        create_games_table,
        &[
            ColumnCopy { target: "source", source: 2 },
            ColumnCopy { target: "number", source: 3 },
            ColumnCopy { target: "type", source: 4 },
            ColumnCopy { target: "puzzle", source: 5 },
            ColumnCopy { target: "timer", source: 6 },
            ColumnCopy { target: "solved", source: 7 },
            ColumnCopy { target: "created", source: 8 },
            ColumnCopy { target: "modified", source: 9 },
        ],
    )?;
    create_games_indexes(conn)?;

    info!(rows = copied, "Dropped pid column from games");
    Ok(())
}

//! SQLite save-game store for GridKeep.
//!
//! This crate provides:
//! - `Database`, a synchronous single-owner handle over the `games` table
//! - Versioned, in-place schema migrations tracked in `PRAGMA user_version`
//! - Model types for saved games, listings and statistics
//! - Query functions that work with any `&Connection`
//! - `AsyncDatabase`, a dedicated-thread executor for callers that need to
//!   share the store across tasks
//!
//! # Architecture
//!
//! ```ignore
//! let db = Database::open(&paths.database_file())?;
//! db.save_game(&PuzzleId::new("archive:hard5", 3), &game)?;
//! let stats = db.statistics("archive:hard5")?;
//! db.close()?;
//! ```
//!
//! Every listing is materialized into a `Vec`; no cursor outlives a call.

mod db;
mod error;
mod executor;
pub mod migrations;
mod models;
pub mod queries;

pub use db::Database;
pub use error::{DatabaseError, DatabaseResult};
pub use executor::AsyncDatabase;
pub use migrations::{run_migrations, CURRENT_VERSION};
pub use models::*;
pub use queries::SaveOutcome;

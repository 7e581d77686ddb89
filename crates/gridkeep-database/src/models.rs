//! Database model types.

use chrono::{DateTime, Utc};
use gridkeep_core::PuzzleId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A saved game row, including the state blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedGame {
    /// Storage handle. Not stable across migrations; never persist it.
    pub row_id: i64,
    pub puzzle_id: PuzzleId,
    /// Puzzle-type ordinal owned by the codec (stored in `type`).
    pub puzzle_type: i32,
    /// `StateBlob` envelope bytes.
    pub state: Vec<u8>,
    pub elapsed: Duration,
    pub solved: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Input for an upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSavedGame {
    pub puzzle_type: i32,
    pub state: Vec<u8>,
    pub elapsed: Duration,
    pub solved: bool,
}

/// Listing projection of a saved game; the blob is left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedGameSummary {
    pub row_id: i64,
    pub puzzle_id: PuzzleId,
    pub puzzle_type: i32,
    pub elapsed: Duration,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Per-puzzle progress within one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceProgress {
    pub number: u32,
    pub solved: bool,
}

/// Aggregates over the solved games of one source.
///
/// When `solved_count` is zero every time field is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatistics {
    pub solved_count: u32,
    pub total_time: Duration,
    pub min_time: Duration,
    pub max_time: Duration,
}

impl GameStatistics {
    pub fn average_time(&self) -> Option<Duration> {
        if self.solved_count == 0 {
            None
        } else {
            Some(self.total_time / self.solved_count)
        }
    }
}

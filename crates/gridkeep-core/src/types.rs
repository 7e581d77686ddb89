//! Value types shared between the archive and the save-game store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one puzzle regardless of which archive or store holds it.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PuzzleId {
    pub source_id: String,
    pub number: u32,
}

impl PuzzleId {
    pub fn new(source_id: impl Into<String>, number: u32) -> Self {
        Self {
            source_id: source_id.into(),
            number,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }
}

impl fmt::Display for PuzzleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.source_id, self.number)
    }
}

/// Difficulty tiers, ordered from easiest to hardest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    VeryEasy,
    Easy,
    Medium,
    Hard,
    VeryHard,
}

impl Difficulty {
    /// All tiers in ascending order.
    pub const ALL: [Difficulty; 5] = [
        Difficulty::VeryEasy,
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::VeryHard,
    ];

    /// Look up a tier by its 1-based level (1 = very easy, 5 = very hard).
    pub fn from_level(level: u32) -> Option<Self> {
        let index = usize::try_from(level).ok()?.checked_sub(1)?;
        Self::ALL.get(index).copied()
    }

    /// Zero-based position in [`Difficulty::ALL`].
    pub fn ordinal(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryEasy => "very_easy",
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::VeryHard => "very_hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded puzzle together with its solution and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleHolder<P, S> {
    pub source_id: String,
    pub number: u32,
    pub puzzle: P,
    pub solution: S,
}

impl<P, S> PuzzleHolder<P, S> {
    /// The save-game key for this puzzle.
    pub fn puzzle_id(&self) -> PuzzleId {
        PuzzleId::new(self.source_id.clone(), self.number)
    }
}

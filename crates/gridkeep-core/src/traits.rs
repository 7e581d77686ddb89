//! Capability traits implemented outside this workspace or by its backends.

use crate::{DecodeError, Difficulty, PuzzleHolder};

/// Turns archive text lines into domain puzzle objects.
pub trait PuzzleCodec {
    type Puzzle;
    type Solution;

    /// Decode a puzzle definition line.
    fn decode(&self, text: &str) -> Result<Self::Puzzle, DecodeError>;

    /// Decode a solution line.
    fn decode_solution(&self, text: &str) -> Result<Self::Solution, DecodeError>;
}

/// Snapshot/restore access to an in-memory puzzle's progress.
///
/// The bytes are opaque to the store; they are wrapped in a
/// [`crate::StateBlob`] envelope before being written.
pub trait PuzzleMemento {
    /// Capture the current puzzle state.
    fn save(&self) -> Vec<u8>;

    /// Restore a previously captured state. Returns `false` if the bytes
    /// do not describe a state this puzzle can adopt.
    fn restore(&mut self, bytes: &[u8]) -> bool;

    /// Whether the puzzle is currently solved.
    fn is_solved(&self) -> bool;
}

/// A numbered collection of puzzles.
///
/// Implemented by the archive-backed source and by
/// [`crate::InMemoryPuzzleSource`].
pub trait PuzzleSource {
    type Puzzle;
    type Solution;
    type Error: std::error::Error;

    /// Stable identifier used as the `source_id` half of a `PuzzleId`.
    fn source_id(&self) -> String;

    fn number_of_puzzles(&self) -> usize;

    fn load(
        &self,
        number: usize,
    ) -> Result<PuzzleHolder<Self::Puzzle, Self::Solution>, Self::Error>;

    fn difficulty(&self, number: usize) -> Result<Difficulty, Self::Error>;
}

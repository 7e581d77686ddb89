//! Puzzle source backed by already-decoded puzzles held in memory.

use crate::{Difficulty, PuzzleHolder, PuzzleSource};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InMemorySourceError {
    #[error("puzzle {number} out of range (source holds {count})")]
    OutOfRange { number: usize, count: usize },
}

/// A fixed list of puzzles with a single difficulty, e.g. a generated or
/// imported set that never touches the archive files.
#[derive(Debug, Clone)]
pub struct InMemoryPuzzleSource<P, S> {
    source_id: String,
    difficulty: Difficulty,
    puzzles: Vec<(P, S)>,
}

impl<P: Clone, S: Clone> InMemoryPuzzleSource<P, S> {
    pub fn new(source_id: impl Into<String>, difficulty: Difficulty, puzzles: Vec<(P, S)>) -> Self {
        Self {
            source_id: source_id.into(),
            difficulty,
            puzzles,
        }
    }

    fn check(&self, number: usize) -> Result<u32, InMemorySourceError> {
        record_number(number, self.puzzles.len())
    }
}

/// `number` as a stored record number, if it addresses one of `count` puzzles.
fn record_number(number: usize, count: usize) -> Result<u32, InMemorySourceError> {
    match u32::try_from(number) {
        Ok(n) if number < count => Ok(n),
        _ => Err(InMemorySourceError::OutOfRange { number, count }),
    }
}

impl<P: Clone, S: Clone> PuzzleSource for InMemoryPuzzleSource<P, S> {
    type Puzzle = P;
    type Solution = S;
    type Error = InMemorySourceError;

    fn source_id(&self) -> String {
        self.source_id.clone()
    }

    fn number_of_puzzles(&self) -> usize {
        self.puzzles.len()
    }

    fn load(&self, number: usize) -> Result<PuzzleHolder<P, S>, InMemorySourceError> {
        let record = self.check(number)?;
        let (puzzle, solution) = self.puzzles[number].clone();
        Ok(PuzzleHolder {
            source_id: self.source_id.clone(),
            number: record,
            puzzle,
            solution,
        })
    }

    fn difficulty(&self, number: usize) -> Result<Difficulty, InMemorySourceError> {
        self.check(number)?;
        Ok(self.difficulty)
    }
}

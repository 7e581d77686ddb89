//! Archive-backed [`PuzzleSource`].

use crate::{ArchiveError, ArchiveReader, ArchiveResult};
use gridkeep_core::{Difficulty, PuzzleCodec, PuzzleHolder, PuzzleSource};
use std::path::Path;
use tracing::warn;

/// Prefix distinguishing archive sources from other source kinds in saved
/// game keys.
pub const ARCHIVE_SOURCE_PREFIX: &str = "archive:";

/// Serves decoded puzzles out of an [`ArchiveReader`].
#[derive(Debug, Clone)]
pub struct ArchivePuzzleSource<C> {
    reader: ArchiveReader,
    codec: C,
}

impl<C: PuzzleCodec> ArchivePuzzleSource<C> {
    /// Open an archive and pair it with a codec.
    pub fn open(dir: &Path, set_id: &str, codec: C) -> ArchiveResult<Self> {
        Ok(Self::new(ArchiveReader::open(dir, set_id)?, codec))
    }

    pub fn new(reader: ArchiveReader, codec: C) -> Self {
        Self { reader, codec }
    }

    pub fn reader(&self) -> &ArchiveReader {
        &self.reader
    }
}

impl<C: PuzzleCodec> PuzzleSource for ArchivePuzzleSource<C> {
    type Puzzle = C::Puzzle;
    type Solution = C::Solution;
    type Error = ArchiveError;

    fn source_id(&self) -> String {
        format!("{ARCHIVE_SOURCE_PREFIX}{}", self.reader.set_id())
    }

    fn number_of_puzzles(&self) -> usize {
        self.reader.record_count()
    }

    fn load(&self, number: usize) -> ArchiveResult<PuzzleHolder<C::Puzzle, C::Solution>> {
        let record = self.reader.load(number)?;

        let decoded = self.codec.decode(&record.puzzle).and_then(|puzzle| {
            self.codec
                .decode_solution(&record.solution)
                .map(|solution| (puzzle, solution))
        });
        let (puzzle, solution) = decoded.map_err(|e| {
            warn!(set_id = %self.reader.set_id(), number, error = %e, "Invalid puzzle in archive");
            ArchiveError::Decode(e)
        })?;

        Ok(PuzzleHolder {
            source_id: self.source_id(),
            number: record_number(number, self.number_of_puzzles())?,
            puzzle,
            solution,
        })
    }

    fn difficulty(&self, _number: usize) -> ArchiveResult<Difficulty> {
        self.reader.difficulty()
    }
}

/// `number` as a stored record number. Indexes hold at most `u32::MAX`
/// records, so this only fails for numbers already out of range.
fn record_number(number: usize, count: usize) -> ArchiveResult<u32> {
    u32::try_from(number).map_err(|_| ArchiveError::OutOfRange { number, count })
}

//! Paired index/data file reader.

use crate::{ArchiveError, ArchiveIndex, ArchiveResult};
use gridkeep_core::Difficulty;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extension of the binary offset table.
pub const INDEX_EXTENSION: &str = "idx";
/// Extension of the line-oriented puzzle data.
pub const DATA_EXTENSION: &str = "adk";

/// Records are short; a small buffer avoids reading far past the two lines.
const READ_BUFFER_SIZE: usize = 512;

/// Longest accepted puzzle or solution line, excluding the LF.
pub const MAX_LINE_LEN: usize = 4096;

/// The two text lines stored for one puzzle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRecord {
    pub puzzle: String,
    pub solution: String,
}

/// An opened archive. The index is immutable, so a reader can be shared
/// across threads; each [`ArchiveReader::load`] opens its own file handle.
#[derive(Debug, Clone)]
pub struct ArchiveReader {
    set_id: String,
    data_path: PathBuf,
    index: ArchiveIndex,
}

impl ArchiveReader {
    /// Open `<dir>/<set_id>.idx` and `<dir>/<set_id>.adk`, validating the
    /// whole index against the data file up front.
    pub fn open(dir: &Path, set_id: &str) -> ArchiveResult<Self> {
        let index_path = dir.join(format!("{set_id}.{INDEX_EXTENSION}"));
        let data_path = dir.join(format!("{set_id}.{DATA_EXTENSION}"));

        let data_len = fs::metadata(&data_path)
            .map_err(|e| not_found_or_io(e, &data_path))?
            .len();
        let raw_index = fs::read(&index_path).map_err(|e| not_found_or_io(e, &index_path))?;

        let index = ArchiveIndex::parse(&raw_index, data_len).map_err(|e| match e {
            ArchiveError::Corrupt(msg) => {
                ArchiveError::Corrupt(format!("{}: {msg}", index_path.display()))
            }
            other => other,
        })?;

        info!(set_id, records = index.len(), data_len, "Archive opened");

        Ok(Self {
            set_id: set_id.to_string(),
            data_path,
            index,
        })
    }

    pub fn set_id(&self) -> &str {
        &self.set_id
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn index(&self) -> &ArchiveIndex {
        &self.index
    }

    /// Number of puzzles in the archive.
    pub fn record_count(&self) -> usize {
        self.index.len()
    }

    /// Read the puzzle and solution lines of record `number`.
    pub fn load(&self, number: usize) -> ArchiveResult<ArchiveRecord> {
        let offset = self.index.offset(number).ok_or(ArchiveError::OutOfRange {
            number,
            count: self.index.len(),
        })?;

        let file = File::open(&self.data_path).map_err(|e| not_found_or_io(e, &self.data_path))?;
        let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);

        // Skip forward by reading; the data source is treated as a stream.
        let skipped = io::copy(&mut (&mut reader).take(offset), &mut io::sink())?;
        if skipped != offset {
            return Err(ArchiveError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("record {number}: data file ended after {skipped} of {offset} bytes"),
            )));
        }

        let puzzle = read_ascii_line(&mut reader, number, "puzzle")?;
        let solution = read_ascii_line(&mut reader, number, "solution")?;

        debug!(set_id = %self.set_id, number, offset, "Archive record loaded");

        Ok(ArchiveRecord { puzzle, solution })
    }

    /// Difficulty encoded in this archive's set id.
    pub fn difficulty(&self) -> ArchiveResult<Difficulty> {
        difficulty(&self.set_id)
    }
}

/// Derive the difficulty from the last character of a set id, read as a
/// 1-based tier (`"hard5"` -> fifth tier).
pub fn difficulty(set_id: &str) -> ArchiveResult<Difficulty> {
    let last = set_id
        .chars()
        .last()
        .ok_or_else(|| ArchiveError::InvalidState("empty set id".to_string()))?;

    last.to_digit(10)
        .and_then(Difficulty::from_level)
        .ok_or_else(|| {
            ArchiveError::InvalidState(format!(
                "set id {set_id:?} does not end in a difficulty level 1-{}",
                Difficulty::ALL.len()
            ))
        })
}

fn read_ascii_line<R: BufRead>(reader: &mut R, number: usize, field: &str) -> ArchiveResult<String> {
    let mut buf = Vec::new();
    reader
        .by_ref()
        .take(MAX_LINE_LEN as u64 + 1)
        .read_until(b'\n', &mut buf)?;

    if buf.len() > MAX_LINE_LEN && buf.last() != Some(&b'\n') {
        return Err(ArchiveError::Corrupt(format!(
            "record {number}: {field} line exceeds {MAX_LINE_LEN} bytes"
        )));
    }
    if buf.pop() != Some(b'\n') {
        return Err(ArchiveError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("record {number}: {field} line missing or not LF-terminated"),
        )));
    }
    if !buf.is_ascii() {
        return Err(ArchiveError::Corrupt(format!(
            "record {number}: {field} line is not ASCII"
        )));
    }

    String::from_utf8(buf)
        .map_err(|e| ArchiveError::Corrupt(format!("record {number}: {field} line: {e}")))
}

fn not_found_or_io(err: io::Error, path: &Path) -> ArchiveError {
    if err.kind() == io::ErrorKind::NotFound {
        ArchiveError::NotFound(path.to_path_buf())
    } else {
        ArchiveError::Io(err)
    }
}

//! Archive error types.

use gridkeep_core::DecodeError;
use std::path::PathBuf;
use thiserror::Error;

/// Archive error type.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Index or data file is missing
    #[error("Archive file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Record number outside the archive
    #[error("Puzzle {number} out of range (archive holds {count})")]
    OutOfRange { number: usize, count: usize },

    /// Index failed structural validation
    #[error("Archive corrupt: {0}")]
    Corrupt(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Set id does not encode a difficulty
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Codec rejected a record
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Result type alias using ArchiveError.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

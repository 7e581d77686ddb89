//! Read-only access to packed puzzle archives.
//!
//! An archive is a pair of files sharing a set id:
//!
//! - `<set>.idx`: big-endian `u32` record count followed by that many
//!   big-endian `u32` byte offsets into the data file
//! - `<set>.adk`: ASCII text; the record at each offset is a puzzle line
//!   followed by a solution line, both LF-terminated
//!
//! The index is parsed and validated once in [`ArchiveReader::open`]; every
//! later [`ArchiveReader::load`] is a bounds check plus one sequential read.

mod error;
mod index;
mod reader;
mod source;

pub use error::{ArchiveError, ArchiveResult};
pub use index::ArchiveIndex;
pub use reader::{difficulty, ArchiveReader, ArchiveRecord, DATA_EXTENSION, INDEX_EXTENSION};
pub use source::{ArchivePuzzleSource, ARCHIVE_SOURCE_PREFIX};

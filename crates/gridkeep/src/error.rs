//! Facade error type.

use gridkeep_archive::ArchiveError;
use gridkeep_config_and_utils::CoreError;
use gridkeep_core::InMemorySourceError;
use gridkeep_database::DatabaseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Source(#[from] InMemorySourceError),
}

pub type LibraryResult<T> = Result<T, LibraryError>;

//! GridKeep puzzle library.
//!
//! Ties the archive reader and the save-game store together:
//!
//! ```ignore
//! let paths = Paths::new()?;
//! let config = Config::load(&paths)?;
//! init_logging(&LogConfig::from_config(&config, &paths))?;
//!
//! let library = Library::open(&config, &paths)?;
//! let source = library.open_archive("hard5", codec)?;
//! let opened = library.open_puzzle(&source, 0, Board::new)?;
//! library.save_progress(&opened.puzzle_id, 0, &opened.puzzle, elapsed)?;
//! ```

mod error;
mod library;

pub use error::{LibraryError, LibraryResult};
pub use library::{Library, OpenedPuzzle};

pub use gridkeep_archive::{ArchiveError, ArchivePuzzleSource};
pub use gridkeep_config_and_utils::{init_logging, Config, LogConfig, Paths};
pub use gridkeep_core::{
    DecodeError, Difficulty, InMemoryPuzzleSource, PuzzleCodec, PuzzleHolder, PuzzleId,
    PuzzleMemento, PuzzleSource,
};
pub use gridkeep_database::{Database, DatabaseError, GameStatistics, SavedGameSummary};

//! Core types and capability traits shared by the GridKeep crates.
//!
//! This crate provides:
//! - `PuzzleId`, the `(source_id, number)` key used by archives and saved games
//! - `Difficulty` tiers
//! - Collaborator traits (`PuzzleCodec`, `PuzzleMemento`, `PuzzleSource`)
//! - `StateBlob`, the versioned envelope stored in the `puzzle` column

mod error;
mod memory;
pub mod state_blob;
mod traits;
mod types;

pub use error::DecodeError;
pub use memory::{InMemoryPuzzleSource, InMemorySourceError};
pub use state_blob::{StateBlob, StateBlobError};
pub use traits::{PuzzleCodec, PuzzleMemento, PuzzleSource};
pub use types::{Difficulty, PuzzleHolder, PuzzleId};

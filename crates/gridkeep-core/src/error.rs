//! Error raised by external puzzle codecs.

use thiserror::Error;

/// A puzzle or solution line could not be decoded.
///
/// Produced by [`crate::PuzzleCodec`] implementations and passed through
/// unchanged by the archive layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Decode error: {message}")]
pub struct DecodeError {
    pub message: String,
}

impl DecodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

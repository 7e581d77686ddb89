//! Versioned envelope for saved puzzle state.
//!
//! Layout (all integers big-endian):
//!
//! ```text
//! +--------+---------+-------------+-----------------+
//! | "GKSB" | version | payload len | payload bytes   |
//! | 4 B    | u16     | u32         | len bytes       |
//! +--------+---------+-------------+-----------------+
//! ```
//!
//! The payload is whatever [`crate::PuzzleMemento::save`] produced. Readers
//! accept every version up to [`StateBlob::CURRENT_VERSION`] and reject
//! anything newer instead of guessing at its layout.

use thiserror::Error;

const HEADER_LEN: usize = 4 + 2 + 4;

/// Errors decoding a stored state blob.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateBlobError {
    #[error("state blob too short: {0} bytes")]
    Truncated(usize),

    #[error("state blob has unknown magic {0:?}")]
    BadMagic([u8; 4]),

    #[error("state blob version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u16, supported: u16 },

    #[error("state blob declares {declared} payload bytes but holds {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("state blob payload of {0} bytes exceeds the u32 length field")]
    PayloadTooLarge(usize),
}

/// Encoder/decoder for the envelope.
pub struct StateBlob;

impl StateBlob {
    pub const MAGIC: [u8; 4] = *b"GKSB";
    pub const CURRENT_VERSION: u16 = 1;

    /// Wrap a memento payload in the current envelope version.
    pub fn encode(payload: &[u8]) -> Result<Vec<u8>, StateBlobError> {
        let len = u32::try_from(payload.len())
            .map_err(|_| StateBlobError::PayloadTooLarge(payload.len()))?;

        let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
        out.extend_from_slice(&Self::MAGIC);
        out.extend_from_slice(&Self::CURRENT_VERSION.to_be_bytes());
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(payload);
        Ok(out)
    }

    /// Validate the envelope and borrow its payload.
    pub fn decode(bytes: &[u8]) -> Result<&[u8], StateBlobError> {
        if bytes.len() < HEADER_LEN {
            return Err(StateBlobError::Truncated(bytes.len()));
        }

        let magic: [u8; 4] = [bytes[0], bytes[1], bytes[2], bytes[3]];
        if magic != Self::MAGIC {
            return Err(StateBlobError::BadMagic(magic));
        }

        let version = u16::from_be_bytes([bytes[4], bytes[5]]);
        if version == 0 || version > Self::CURRENT_VERSION {
            return Err(StateBlobError::UnsupportedVersion {
                found: version,
                supported: Self::CURRENT_VERSION,
            });
        }

        let declared = u32::from_be_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize;
        let payload = &bytes[HEADER_LEN..];
        if payload.len() != declared {
            return Err(StateBlobError::LengthMismatch {
                declared,
                actual: payload.len(),
            });
        }

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_writes_header() {
        let blob = StateBlob::encode(b"abc").unwrap();
        assert_eq!(&blob[..4], b"GKSB");
        assert_eq!(&blob[4..6], &[0, 1]);
        assert_eq!(&blob[6..10], &[0, 0, 0, 3]);
        assert_eq!(&blob[10..], b"abc");
        assert_eq!(StateBlob::decode(&blob).unwrap(), b"abc");
    }

    #[test]
    fn empty_payload_is_valid() {
        let blob = StateBlob::encode(&[]).unwrap();
        assert_eq!(blob.len(), HEADER_LEN);
        assert!(StateBlob::decode(&blob).unwrap().is_empty());
    }

    #[test]
    fn rejects_truncated_header() {
        assert_eq!(
            StateBlob::decode(b"GKSB\0"),
            Err(StateBlobError::Truncated(5))
        );
    }

    #[test]
    fn rejects_foreign_bytes() {
        // A Java serialization stream starts with 0xACED.
        let foreign = [0xAC, 0xED, 0x00, 0x05, 0x73, 0x72, 0, 0, 0, 0];
        assert!(matches!(
            StateBlob::decode(&foreign),
            Err(StateBlobError::BadMagic(_))
        ));
    }

    #[test]
    fn rejects_newer_version() {
        let mut blob = StateBlob::encode(b"x").unwrap();
        blob[5] = 9;
        assert_eq!(
            StateBlob::decode(&blob),
            Err(StateBlobError::UnsupportedVersion {
                found: 9,
                supported: 1
            })
        );
    }

    #[test]
    fn rejects_length_mismatch() {
        let mut blob = StateBlob::encode(b"hello").unwrap();
        blob.pop();
        assert_eq!(
            StateBlob::decode(&blob),
            Err(StateBlobError::LengthMismatch {
                declared: 5,
                actual: 4
            })
        );
    }
}

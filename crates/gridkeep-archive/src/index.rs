//! Binary offset table for an archive.

use crate::{ArchiveError, ArchiveResult};

const WORD: usize = 4;

/// Byte offsets of every record in an archive's data file.
///
/// Guaranteed non-decreasing and inside the data file once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveIndex {
    offsets: Vec<u32>,
}

impl ArchiveIndex {
    /// Parse and validate a raw index file against the length of its data file.
    pub fn parse(bytes: &[u8], data_len: u64) -> ArchiveResult<Self> {
        if bytes.len() < WORD {
            return Err(ArchiveError::Corrupt(format!(
                "index header truncated ({} bytes)",
                bytes.len()
            )));
        }

        let count = read_u32(bytes, 0) as usize;
        let expected = count
            .checked_mul(WORD)
            .and_then(|n| n.checked_add(WORD))
            .ok_or_else(|| ArchiveError::Corrupt(format!("record count {count} overflows")))?;
        if bytes.len() != expected {
            return Err(ArchiveError::Corrupt(format!(
                "index declares {count} records ({expected} bytes) but is {} bytes",
                bytes.len()
            )));
        }

        let mut offsets = Vec::with_capacity(count);
        for number in 0..count {
            let offset = read_u32(bytes, WORD + number * WORD);

            if let Some(&previous) = offsets.last() {
                if offset < previous {
                    return Err(ArchiveError::Corrupt(format!(
                        "offset of record {number} ({offset}) precedes record {} ({previous})",
                        number - 1
                    )));
                }
            }
            if u64::from(offset) >= data_len {
                return Err(ArchiveError::Corrupt(format!(
                    "offset of record {number} ({offset}) is past the end of the data file ({data_len} bytes)"
                )));
            }

            offsets.push(offset);
        }

        Ok(Self { offsets })
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Byte offset of a record, or `None` past the end.
    pub fn offset(&self, number: usize) -> Option<u64> {
        self.offsets.get(number).map(|&o| u64::from(o))
    }

    /// Serialize back to the on-disk layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(WORD + self.offsets.len() * WORD);
        out.extend_from_slice(&(self.offsets.len() as u32).to_be_bytes());
        for offset in &self.offsets {
            out.extend_from_slice(&offset.to_be_bytes());
        }
        out
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

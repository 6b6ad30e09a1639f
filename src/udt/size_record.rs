//! Timestamp size record
//!
//! A dummy WAL record announcing the user-defined timestamp size that the
//! batches following it were written with, for every column family whose
//! size is non-zero. Column families absent from the record have size 0.
//!
//! Format, repeated back to back with no count and no separators:
//! - Column family id (u32 LE)
//! - Timestamp size (u16 LE, never 0)
//!
//! The entry count is the payload length divided by 6. An empty payload
//! is a valid empty record.

use std::fmt;

use super::errors::{UdtError, UdtResult};
use super::TimestampSizeMap;

/// 4 bytes for the column family id, 2 bytes for the timestamp size.
pub const SIZE_PER_COLUMN_FAMILY: usize = 4 + 2;

/// Column family to timestamp size pairs, in log order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimestampSizeRecord {
    entries: Vec<(u32, u16)>,
}

impl TimestampSizeRecord {
    /// Create a record from `(column family, timestamp size)` pairs.
    ///
    /// Every size must be non-zero for the record to be encodable.
    pub fn new(entries: Vec<(u32, u16)>) -> Self {
        Self { entries }
    }

    /// Decode a record from its payload bytes
    pub fn decode(src: &[u8]) -> UdtResult<Self> {
        let mut record = Self::default();
        record.decode_from(src)?;
        Ok(record)
    }

    /// Entries in the order they were encoded
    pub fn entries(&self) -> &[(u32, u16)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append the encoding of every entry to `dst`.
    ///
    /// # Panics
    ///
    /// Panics if an entry has a zero timestamp size. Zero sizes are never
    /// logged, so such a record is a caller bug.
    pub fn encode_to(&self, dst: &mut Vec<u8>) {
        dst.reserve(self.entries.len() * SIZE_PER_COLUMN_FAMILY);
        for &(cf, ts_sz) in &self.entries {
            assert!(
                ts_sz != 0,
                "zero timestamp size for column family {} must not be logged",
                cf
            );
            dst.extend_from_slice(&cf.to_le_bytes());
            dst.extend_from_slice(&ts_sz.to_le_bytes());
        }
    }

    /// Encode the record into a new buffer
    pub fn encode(&self) -> Vec<u8> {
        let mut dst = Vec::new();
        self.encode_to(&mut dst);
        dst
    }

    /// Decode entries from `src` and append them to this record.
    ///
    /// On error nothing is appended.
    pub fn decode_from(&mut self, src: &[u8]) -> UdtResult<()> {
        let total_size = src.len();
        if total_size % SIZE_PER_COLUMN_FAMILY != 0 {
            return Err(UdtError::corruption(format!(
                "User-defined timestamp size record length: {} is not a multiple of {}",
                total_size, SIZE_PER_COLUMN_FAMILY
            )));
        }

        let num_entries = total_size / SIZE_PER_COLUMN_FAMILY;
        let mut decoded = Vec::with_capacity(num_entries);
        let mut input = src;

        for _ in 0..num_entries {
            let (cf, ts_sz) = match (take_fixed::<4>(&mut input), take_fixed::<2>(&mut input)) {
                (Some(cf), Some(ts_sz)) => (u32::from_le_bytes(cf), u16::from_le_bytes(ts_sz)),
                _ => {
                    return Err(UdtError::corruption(
                        "Error decoding user-defined timestamp size record entry",
                    ))
                }
            };
            if ts_sz == 0 {
                return Err(UdtError::corruption(format!(
                    "User-defined timestamp size record has zero size for column family {}",
                    cf
                )));
            }
            decoded.push((cf, ts_sz));
        }

        self.entries.extend(decoded);
        Ok(())
    }

    /// Fold this record into a recorded-size map, overwriting older sizes
    pub fn apply_to(&self, record_ts_sz: &mut TimestampSizeMap) {
        for &(cf, ts_sz) in &self.entries {
            record_ts_sz.insert(cf, usize::from(ts_sz));
        }
    }
}

impl fmt::Display for TimestampSizeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (cf, ts_sz) in &self.entries {
            writeln!(
                f,
                "Column family: {}, user-defined timestamp size: {}",
                cf, ts_sz
            )?;
        }
        Ok(())
    }
}

fn take_fixed<const N: usize>(input: &mut &[u8]) -> Option<[u8; N]> {
    let (head, rest) = input.split_first_chunk::<N>()?;
    *input = rest;
    Some(*head)
}

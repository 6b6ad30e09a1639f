//! WAL record framing
//!
//! Each WAL record contains:
//! - Record Length (u32 LE), total length including this field
//! - Record Type (u8): WRITE_BATCH / TIMESTAMP_SIZE
//! - Sequence Number (u64 LE)
//! - Payload (variable)
//! - Checksum (u32 LE) over everything before it
//!
//! A WRITE_BATCH payload is an encoded [`WriteBatch`]. A TIMESTAMP_SIZE
//! payload is an encoded [`TimestampSizeRecord`] and applies to every
//! batch that follows it.

use std::io;

use crate::batch::WriteBatch;
use crate::udt::TimestampSizeRecord;

use super::checksum::compute_checksum;
use super::errors::{WalError, WalResult};

/// Length (4) + type (1) + sequence (8) + checksum (4), empty payload
pub const MIN_RECORD_SIZE: usize = 4 + 1 + 8 + 4;

const HEADER_SIZE: usize = 4 + 1 + 8;

/// WAL record types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordType {
    /// A batch of mutations
    WriteBatch = 1,
    /// Timestamp sizes for the batches that follow
    TimestampSize = 2,
}

impl RecordType {
    /// Convert from u8, returns None for invalid values
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(RecordType::WriteBatch),
            2 => Some(RecordType::TimestampSize),
            _ => None,
        }
    }

    /// Convert to u8
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::WriteBatch => "WRITE_BATCH",
            RecordType::TimestampSize => "TIMESTAMP_SIZE",
        }
    }
}

/// Decoded payload of a WAL record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalEntry {
    Batch(WriteBatch),
    TimestampSize(TimestampSizeRecord),
}

/// Complete WAL record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalRecord {
    pub record_type: RecordType,
    /// Monotonic record number, starts at 1
    pub sequence_number: u64,
    /// Encoded batch or timestamp size record
    pub payload: Vec<u8>,
}

impl WalRecord {
    pub fn new(record_type: RecordType, sequence_number: u64, payload: Vec<u8>) -> Self {
        Self {
            record_type,
            sequence_number,
            payload,
        }
    }

    /// Create a WRITE_BATCH record
    pub fn write_batch(sequence_number: u64, batch: &WriteBatch) -> Self {
        Self::new(RecordType::WriteBatch, sequence_number, batch.serialize())
    }

    /// Create a TIMESTAMP_SIZE record
    ///
    /// # Panics
    ///
    /// Panics if `record` contains a zero timestamp size.
    pub fn timestamp_size(sequence_number: u64, record: &TimestampSizeRecord) -> Self {
        Self::new(RecordType::TimestampSize, sequence_number, record.encode())
    }

    /// Decode the payload according to the record type
    pub fn entry(&self) -> WalResult<WalEntry> {
        match self.record_type {
            RecordType::WriteBatch => WriteBatch::deserialize(&self.payload)
                .map(WalEntry::Batch)
                .map_err(|e| {
                    WalError::corruption_at_sequence(
                        self.sequence_number,
                        format!("Malformed write batch: {}", e),
                    )
                }),
            RecordType::TimestampSize => TimestampSizeRecord::decode(&self.payload)
                .map(WalEntry::TimestampSize)
                .map_err(|e| WalError::corruption_at_sequence(self.sequence_number, e.message())),
        }
    }

    /// Serialize the complete record to bytes
    pub fn serialize(&self) -> Vec<u8> {
        let record_length = (HEADER_SIZE + self.payload.len() + 4) as u32;

        let mut record = Vec::with_capacity(record_length as usize);
        record.extend_from_slice(&record_length.to_le_bytes());
        record.push(self.record_type.as_u8());
        record.extend_from_slice(&self.sequence_number.to_le_bytes());
        record.extend_from_slice(&self.payload);

        let checksum = compute_checksum(&record);
        record.extend_from_slice(&checksum.to_le_bytes());

        record
    }

    /// Deserialize a record from bytes, verifying checksum
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn deserialize(data: &[u8]) -> io::Result<(Self, usize)> {
        if data.len() < MIN_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Record too short",
            ));
        }

        let record_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;

        if record_length < MIN_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid record length: {}", record_length),
            ));
        }

        if data.len() < record_length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "Record truncated: expected {} bytes, got {}",
                    record_length,
                    data.len()
                ),
            ));
        }

        let checksum_offset = record_length - 4;
        let stored_checksum = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);
        let computed_checksum = compute_checksum(&data[..checksum_offset]);

        if computed_checksum != stored_checksum {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Checksum mismatch: computed {:08x}, stored {:08x}",
                    computed_checksum, stored_checksum
                ),
            ));
        }

        let record_type = RecordType::from_u8(data[4]).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid record type: {}", data[4]),
            )
        })?;

        let mut sequence_buf = [0u8; 8];
        sequence_buf.copy_from_slice(&data[5..HEADER_SIZE]);
        let sequence_number = u64::from_le_bytes(sequence_buf);

        Ok((
            WalRecord {
                record_type,
                sequence_number,
                payload: data[HEADER_SIZE..checksum_offset].to_vec(),
            },
            record_length,
        ))
    }
}

//! WAL writer with fsync enforcement
//!
//! Every append is followed by fsync; a record is not acknowledged before
//! it is durable.
//!
//! Before a batch is appended, the writer makes sure the WAL already
//! holds the timestamp size of every column family the batch touches.
//! Sizes are logged once per column family, and zero sizes are never
//! logged, so replay treats a column family missing from every
//! TIMESTAMP_SIZE record as having size 0.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::batch::WriteBatch;
use crate::udt::{TimestampSizeMap, TimestampSizeRecord};

use super::errors::{WalError, WalResult};
use super::reader::WalReader;
use super::record::{RecordType, WalEntry, WalRecord};

/// Append-only WAL writer.
pub struct WalWriter {
    wal_path: PathBuf,
    file: File,
    /// Next sequence number to assign (starts at 1, never reused)
    next_sequence: u64,
    /// Non-zero timestamp sizes already present in this WAL
    logged_ts_sz: HashMap<u32, u16>,
}

impl WalWriter {
    /// Opens or creates `<data_dir>/wal/wal.log`.
    ///
    /// An existing WAL is scanned to resume the sequence and to learn
    /// which timestamp sizes it already records.
    pub fn open(data_dir: &Path) -> WalResult<Self> {
        let wal_dir = data_dir.join("wal");
        let wal_path = wal_dir.join("wal.log");

        if !wal_dir.exists() {
            fs::create_dir_all(&wal_dir).map_err(|e| {
                WalError::append_failed(
                    format!("Failed to create WAL directory: {}", wal_dir.display()),
                    e,
                )
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&wal_path)
            .map_err(|e| {
                WalError::append_failed(
                    format!("Failed to open WAL file: {}", wal_path.display()),
                    e,
                )
            })?;

        let (next_sequence, logged_ts_sz) = Self::scan_existing(&wal_path)?;

        Ok(Self {
            wal_path,
            file,
            next_sequence,
            logged_ts_sz,
        })
    }

    /// Reads an existing WAL for its last sequence number and the
    /// timestamp sizes it records.
    fn scan_existing(wal_path: &Path) -> WalResult<(u64, HashMap<u32, u16>)> {
        let mut logged_ts_sz = HashMap::new();

        let metadata = match fs::metadata(wal_path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok((1, logged_ts_sz)),
            Err(e) => return Err(WalError::append_failed("Failed to read WAL metadata", e)),
        };

        if metadata.len() == 0 {
            return Ok((1, logged_ts_sz));
        }

        let mut reader = WalReader::open(wal_path)?;
        let mut last_sequence = 0u64;

        while let Some(record) = reader.read_next()? {
            last_sequence = record.sequence_number;
            if record.record_type == RecordType::TimestampSize {
                if let WalEntry::TimestampSize(sizes) = record.entry()? {
                    logged_ts_sz.extend(sizes.entries().iter().copied());
                }
            }
        }

        Ok((last_sequence + 1, logged_ts_sz))
    }

    pub fn path(&self) -> &Path {
        &self.wal_path
    }

    pub fn next_sequence_number(&self) -> u64 {
        self.next_sequence
    }

    /// Returns the last assigned sequence number, or 0 if no records written.
    pub fn last_sequence_number(&self) -> u64 {
        self.next_sequence.saturating_sub(1)
    }

    /// Timestamp size last logged for a column family, if any
    pub fn logged_timestamp_size(&self, cf: u32) -> Option<u16> {
        self.logged_ts_sz.get(&cf).copied()
    }

    /// Appends a batch, preceded by a TIMESTAMP_SIZE record when the batch
    /// touches column families whose non-zero size is not logged yet.
    ///
    /// Column families missing from `running_ts_sz` are logged as size 0.
    ///
    /// Returns the sequence number of the batch record.
    ///
    /// # Errors
    ///
    /// - `TSR_WAL_TIMESTAMP_SIZE` if a size does not fit the record format,
    ///   or a column family logged with a non-zero size is now 0
    /// - `TSR_WAL_APPEND_FAILED` if write fails
    /// - `TSR_WAL_FSYNC_FAILED` if fsync fails (FATAL)
    pub fn append_batch(
        &mut self,
        batch: &WriteBatch,
        running_ts_sz: &TimestampSizeMap,
    ) -> WalResult<u64> {
        let mut pending = Vec::new();

        for cf in batch.column_family_ids() {
            let ts_sz = running_ts_sz.get(&cf).copied().unwrap_or(0);
            let logged = self.logged_ts_sz.get(&cf).copied();

            if ts_sz == 0 {
                if let Some(logged) = logged {
                    return Err(WalError::timestamp_size(format!(
                        "Column family {} was logged with timestamp size {} and cannot be logged as 0",
                        cf, logged
                    )));
                }
                continue;
            }

            let ts_sz = u16::try_from(ts_sz).map_err(|_| {
                WalError::timestamp_size(format!(
                    "Column family {}: timestamp size {} exceeds {}",
                    cf,
                    ts_sz,
                    u16::MAX
                ))
            })?;

            if logged != Some(ts_sz) {
                pending.push((cf, ts_sz));
            }
        }

        if !pending.is_empty() {
            self.append_timestamp_size_record(&TimestampSizeRecord::new(pending))?;
        }

        self.append(RecordType::WriteBatch, batch.serialize())
    }

    /// Appends a TIMESTAMP_SIZE record.
    ///
    /// # Panics
    ///
    /// Panics if `record` contains a zero timestamp size.
    pub fn append_timestamp_size_record(
        &mut self,
        record: &TimestampSizeRecord,
    ) -> WalResult<u64> {
        let sequence_number = self.append(RecordType::TimestampSize, record.encode())?;
        self.logged_ts_sz.extend(record.entries().iter().copied());
        Ok(sequence_number)
    }

    /// Appends a record with fsync enforcement and returns its sequence number.
    fn append(&mut self, record_type: RecordType, payload: Vec<u8>) -> WalResult<u64> {
        let sequence_number = self.next_sequence;
        let serialized = WalRecord::new(record_type, sequence_number, payload).serialize();

        self.file.write_all(&serialized).map_err(|e| {
            WalError::append_failed(
                format!("Failed to write WAL record at sequence {}", sequence_number),
                e,
            )
        })?;

        self.file.sync_all().map_err(|e| {
            WalError::fsync_failed(
                format!("fsync failed after WAL append at sequence {}", sequence_number),
                e,
            )
        })?;

        // Only advance after a successful fsync
        self.next_sequence += 1;

        Ok(sequence_number)
    }
}

//! WAL replay for recovery
//!
//! Replays WAL records sequentially from byte 0:
//! - TIMESTAMP_SIZE records are folded into the recorded size map
//! - WRITE_BATCH records are checked against the running sizes and,
//!   when reconcilable, rewritten before being applied
//! - On ANY corruption or unreconcilable size difference: FATAL, abort

use crate::batch::WriteBatch;
use crate::observability::{log_event_with_fields, Event};
use crate::udt::{
    handle_write_batch_timestamp_size_difference, TimestampSizeConsistencyMode, TimestampSizeMap,
    UdtError,
};
use crate::wal::{WalEntry, WalRecord};

use super::errors::{RecoveryError, RecoveryResult};

/// Trait for applying replayed batches
pub trait BatchApply {
    /// Apply a batch, already reconciled to the running timestamp sizes
    fn apply_batch(&mut self, sequence_number: u64, batch: &WriteBatch) -> RecoveryResult<()>;
}

/// Trait for reading WAL records
pub trait WalRead {
    /// Read the next WAL record
    /// Returns None if at end of WAL
    /// Returns Err if corruption detected
    fn read_next(&mut self) -> RecoveryResult<Option<WalRecord>>;

    /// Get current byte offset in WAL
    fn current_offset(&self) -> u64;

    /// Reset to beginning of WAL
    fn reset(&mut self) -> RecoveryResult<()>;
}

/// Statistics from WAL replay
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ReplayStats {
    /// Number of records replayed
    pub records_replayed: u64,
    /// Number of WRITE_BATCH records
    pub batches_replayed: u64,
    /// Number of TIMESTAMP_SIZE records
    pub timestamp_size_records: u64,
    /// Number of batches rewritten before apply
    pub batches_reconciled: u64,
    /// Number of operations handed to the sink
    pub operations_applied: u64,
    /// Final WAL offset
    pub final_offset: u64,
    /// Final sequence number
    pub final_sequence: u64,
}

/// WAL replayer that processes WAL records sequentially
pub struct WalReplayer;

impl WalReplayer {
    /// Replay all WAL records into `sink`.
    ///
    /// `running_ts_sz` must hold every live column family, zero sizes
    /// included. Each batch is checked against the running sizes of the
    /// column families it references.
    ///
    /// Replay is idempotent: same WAL replayed twice produces identical
    /// batches.
    pub fn replay<W: WalRead, S: BatchApply>(
        wal: &mut W,
        sink: &mut S,
        running_ts_sz: &TimestampSizeMap,
        mode: TimestampSizeConsistencyMode,
    ) -> RecoveryResult<ReplayStats> {
        let running_count = running_ts_sz.len().to_string();
        log_event_with_fields(
            Event::ReplayBegin,
            &[("mode", mode.as_str()), ("running_column_families", running_count.as_str())],
        );

        match Self::replay_records(wal, sink, running_ts_sz, mode) {
            Ok(stats) => {
                let records = stats.records_replayed.to_string();
                let reconciled = stats.batches_reconciled.to_string();
                let final_sequence = stats.final_sequence.to_string();
                log_event_with_fields(
                    Event::ReplayComplete,
                    &[
                        ("records_replayed", records.as_str()),
                        ("batches_reconciled", reconciled.as_str()),
                        ("final_sequence", final_sequence.as_str()),
                    ],
                );
                Ok(stats)
            }
            Err(e) => {
                log_event_with_fields(
                    Event::ReplayFailed,
                    &[("code", e.code().code()), ("message", e.message())],
                );
                Err(e)
            }
        }
    }

    fn replay_records<W: WalRead, S: BatchApply>(
        wal: &mut W,
        sink: &mut S,
        running_ts_sz: &TimestampSizeMap,
        mode: TimestampSizeConsistencyMode,
    ) -> RecoveryResult<ReplayStats> {
        // Reset to beginning of WAL
        wal.reset()?;

        let mut stats = ReplayStats::default();
        // Never cleared within one log
        let mut record_ts_sz = TimestampSizeMap::new();

        loop {
            let offset_before = wal.current_offset();

            let record = match wal.read_next() {
                Ok(Some(r)) => r,
                Ok(None) => break,
                Err(e) => {
                    let offset = offset_before.to_string();
                    log_event_with_fields(
                        Event::WalCorruption,
                        &[("offset", offset.as_str()), ("message", e.message())],
                    );
                    return Err(e);
                }
            };

            let entry = record
                .entry()
                .map_err(|e| RecoveryError::wal_corruption(offset_before, e.to_string()))?;

            stats.records_replayed += 1;
            stats.final_sequence = record.sequence_number;

            match entry {
                WalEntry::TimestampSize(size_record) => {
                    size_record.apply_to(&mut record_ts_sz);
                    stats.timestamp_size_records += 1;

                    let sequence = record.sequence_number.to_string();
                    let count = size_record.len().to_string();
                    log_event_with_fields(
                        Event::TimestampSizeRecord,
                        &[("sequence", sequence.as_str()), ("column_families", count.as_str())],
                    );
                }
                WalEntry::Batch(batch) => {
                    let batch_running = Self::running_sizes_for(&batch, running_ts_sz);

                    let reconciled = handle_write_batch_timestamp_size_difference(
                        &batch,
                        &batch_running,
                        &record_ts_sz,
                        mode,
                    )
                    .map_err(|e| Self::size_difference_error(record.sequence_number, e))?;

                    let to_apply = match &reconciled {
                        Some(new_batch) => {
                            stats.batches_reconciled += 1;
                            let sequence = record.sequence_number.to_string();
                            let ops = new_batch.len().to_string();
                            log_event_with_fields(
                                Event::BatchReconciled,
                                &[("sequence", sequence.as_str()), ("operations", ops.as_str())],
                            );
                            new_batch
                        }
                        None => &batch,
                    };

                    sink.apply_batch(record.sequence_number, to_apply)?;

                    stats.batches_replayed += 1;
                    stats.operations_applied += to_apply.len() as u64;
                }
            }
        }

        stats.final_offset = wal.current_offset();

        Ok(stats)
    }

    /// Running sizes restricted to the column families `batch` references.
    ///
    /// A column family the batch never touches has nothing to reconcile,
    /// even when its size was never logged.
    fn running_sizes_for(batch: &WriteBatch, running_ts_sz: &TimestampSizeMap) -> TimestampSizeMap {
        batch
            .column_family_ids()
            .into_iter()
            .filter_map(|cf| running_ts_sz.get(&cf).map(|&ts_sz| (cf, ts_sz)))
            .collect()
    }

    fn size_difference_error(sequence_number: u64, err: UdtError) -> RecoveryError {
        if err.is_invalid_configuration() {
            let sequence = sequence_number.to_string();
            log_event_with_fields(
                Event::TimestampSizeMismatch,
                &[("sequence", sequence.as_str()), ("message", err.message())],
            );
        }
        RecoveryError::timestamp_size(sequence_number, err)
    }
}

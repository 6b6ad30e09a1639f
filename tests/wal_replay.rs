//! WAL Replay Tests
//!
//! End-to-end: batches are written through `WalWriter` with one set of
//! timestamp sizes and replayed through `WalReplayer` with another.
//!
//! - Size records precede the first batch touching a non-zero column family
//! - Zero sizes are never logged
//! - Reconcilable differences rewrite keys, others halt replay
//! - Any checksum failure halts replay

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use tsreplay::batch::{BatchOp, WriteBatch};
use tsreplay::recovery::{
    RecoveryErrorCode, RecoveryResult, ReplayStats, ReplayedBatches, WalReplayer,
};
use tsreplay::udt::{TimestampSizeConsistencyMode, TimestampSizeMap};
use tsreplay::wal::{RecordType, WalEntry, WalReader, WalWriter};
use tempfile::TempDir;

use TimestampSizeConsistencyMode::{ReconcileInconsistency, VerifyConsistency};

// =============================================================================
// Test Utilities
// =============================================================================

fn create_temp_data_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

fn sizes(pairs: &[(u32, usize)]) -> TimestampSizeMap {
    pairs.iter().copied().collect()
}

fn put(cf: u32, key: &[u8]) -> WriteBatch {
    let mut batch = WriteBatch::new();
    batch.put(cf, key, b"value");
    batch
}

fn replay(
    data_dir: &Path,
    running: &TimestampSizeMap,
    mode: TimestampSizeConsistencyMode,
) -> (RecoveryResult<ReplayStats>, ReplayedBatches) {
    let mut reader = WalReader::open_from_data_dir(data_dir).expect("Failed to open WAL reader");
    let mut sink = ReplayedBatches::new();
    let result = WalReplayer::replay(&mut reader, &mut sink, running, mode);
    (result, sink)
}

fn put_key(batch: &WriteBatch) -> Vec<u8> {
    match &batch.ops()[0] {
        BatchOp::Put { key, .. } => key.clone(),
        other => panic!("unexpected op {:?}", other),
    }
}

// =============================================================================
// Writer: timestamp size records
// =============================================================================

#[test]
fn test_size_record_written_once_per_column_family() {
    let temp_dir = create_temp_data_dir();
    let running = sizes(&[(0, 0), (1, 8)]);

    {
        let mut writer = WalWriter::open(temp_dir.path()).unwrap();
        writer.append_batch(&put(0, b"a"), &running).unwrap();
        writer.append_batch(&put(1, b"b\0\0\0\0\0\0\0\0"), &running).unwrap();
        writer.append_batch(&put(1, b"c\0\0\0\0\0\0\0\0"), &running).unwrap();
    }

    let mut reader = WalReader::open_from_data_dir(temp_dir.path()).unwrap();
    let types: Vec<RecordType> = reader
        .read_all()
        .unwrap()
        .iter()
        .map(|r| r.record_type)
        .collect();

    assert_eq!(
        types,
        vec![
            RecordType::WriteBatch,
            RecordType::TimestampSize,
            RecordType::WriteBatch,
            RecordType::WriteBatch,
        ]
    );
}

#[test]
fn test_zero_sizes_never_logged() {
    let temp_dir = create_temp_data_dir();
    let running = sizes(&[(0, 0), (1, 0)]);

    {
        let mut writer = WalWriter::open(temp_dir.path()).unwrap();
        let mut batch = put(0, b"a");
        batch.delete(1, b"b");
        writer.append_batch(&batch, &running).unwrap();
    }

    let mut reader = WalReader::open_from_data_dir(temp_dir.path()).unwrap();
    let records = reader.read_all().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record_type, RecordType::WriteBatch);
}

#[test]
fn test_logged_sizes_survive_reopen() {
    let temp_dir = create_temp_data_dir();
    let running = sizes(&[(3, 4)]);

    {
        let mut writer = WalWriter::open(temp_dir.path()).unwrap();
        writer.append_batch(&put(3, b"a\0\0\0\0"), &running).unwrap();
    }
    {
        let mut writer = WalWriter::open(temp_dir.path()).unwrap();
        assert_eq!(writer.logged_timestamp_size(3), Some(4));
        assert_eq!(writer.next_sequence_number(), 3);
        writer.append_batch(&put(3, b"b\0\0\0\0"), &running).unwrap();
    }

    let mut reader = WalReader::open_from_data_dir(temp_dir.path()).unwrap();
    let size_records = reader
        .read_all()
        .unwrap()
        .into_iter()
        .filter(|r| matches!(r.entry(), Ok(WalEntry::TimestampSize(_))))
        .count();
    assert_eq!(size_records, 1);
}

// =============================================================================
// Replay: reconciliation
// =============================================================================

#[test]
fn test_replay_with_unchanged_sizes_verifies() {
    let temp_dir = create_temp_data_dir();
    let running = sizes(&[(0, 0), (1, 8)]);

    {
        let mut writer = WalWriter::open(temp_dir.path()).unwrap();
        writer.append_batch(&put(0, b"plain"), &running).unwrap();
        writer.append_batch(&put(1, b"ts\0\0\0\0\0\0\0\x05"), &running).unwrap();
    }

    let (result, sink) = replay(temp_dir.path(), &running, VerifyConsistency);
    let stats = result.unwrap();

    assert_eq!(stats.records_replayed, 3);
    assert_eq!(stats.batches_replayed, 2);
    assert_eq!(stats.batches_reconciled, 0);
    assert_eq!(stats.final_sequence, 3);
    assert_eq!(put_key(&sink.batches()[1].1), b"ts\0\0\0\0\0\0\0\x05");
}

#[test]
fn test_replay_pads_keys_after_enabling_timestamps() {
    let temp_dir = create_temp_data_dir();

    {
        let mut writer = WalWriter::open(temp_dir.path()).unwrap();
        writer.append_batch(&put(1, b"abc"), &sizes(&[(1, 0)])).unwrap();
    }

    let (result, sink) = replay(temp_dir.path(), &sizes(&[(1, 8)]), ReconcileInconsistency);
    let stats = result.unwrap();

    assert_eq!(stats.batches_reconciled, 1);
    assert_eq!(put_key(&sink.batches()[0].1), b"abc\0\0\0\0\0\0\0\0");
}

#[test]
fn test_replay_strips_keys_after_disabling_timestamps() {
    let temp_dir = create_temp_data_dir();

    {
        let mut writer = WalWriter::open(temp_dir.path()).unwrap();
        writer
            .append_batch(&put(2, b"abc\x01\x02\x03\x04\x05\x06\x07\x08"), &sizes(&[(2, 8)]))
            .unwrap();
    }

    let (result, sink) = replay(temp_dir.path(), &sizes(&[(2, 0)]), ReconcileInconsistency);
    result.unwrap();

    assert_eq!(put_key(&sink.batches()[0].1), b"abc");
}

#[test]
fn test_replay_changed_nonzero_size_fails() {
    let temp_dir = create_temp_data_dir();

    {
        let mut writer = WalWriter::open(temp_dir.path()).unwrap();
        writer
            .append_batch(&put(1, b"abc\0\0\0\0\0\0\0\0"), &sizes(&[(1, 8)]))
            .unwrap();
    }

    let (result, sink) = replay(temp_dir.path(), &sizes(&[(1, 4)]), ReconcileInconsistency);
    let err = result.unwrap_err();

    assert_eq!(err.code(), RecoveryErrorCode::TimestampSizeMismatch);
    assert!(sink.is_empty());
}

#[test]
fn test_replay_verify_rejects_enabled_timestamps() {
    let temp_dir = create_temp_data_dir();

    {
        let mut writer = WalWriter::open(temp_dir.path()).unwrap();
        writer.append_batch(&put(1, b"abc"), &sizes(&[(1, 0)])).unwrap();
    }

    let (result, _) = replay(temp_dir.path(), &sizes(&[(1, 8)]), VerifyConsistency);
    assert_eq!(
        result.unwrap_err().code(),
        RecoveryErrorCode::TimestampSizeMismatch
    );
}

#[test]
fn test_replay_dropped_column_family_copied() {
    let temp_dir = create_temp_data_dir();

    {
        let mut writer = WalWriter::open(temp_dir.path()).unwrap();
        writer
            .append_batch(&put(5, b"gone\0\0\0\0"), &sizes(&[(5, 4)]))
            .unwrap();
    }

    let (result, sink) = replay(temp_dir.path(), &sizes(&[(0, 0)]), VerifyConsistency);
    result.unwrap();

    assert_eq!(put_key(&sink.batches()[0].1), b"gone\0\0\0\0");
}

// =============================================================================
// Replay: corruption
// =============================================================================

#[test]
fn test_replay_checksum_flip_aborts() {
    let temp_dir = create_temp_data_dir();
    let running = sizes(&[(0, 0)]);

    {
        let mut writer = WalWriter::open(temp_dir.path()).unwrap();
        writer.append_batch(&put(0, b"first"), &running).unwrap();
        writer.append_batch(&put(0, b"second"), &running).unwrap();
    }

    let wal_path = temp_dir.path().join("wal").join("wal.log");
    let mut bytes = fs::read(&wal_path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(&wal_path, &bytes).unwrap();

    let (result, sink) = replay(temp_dir.path(), &running, ReconcileInconsistency);
    let err = result.unwrap_err();

    assert_eq!(err.code(), RecoveryErrorCode::WalCorruption);
    assert!(err.is_fatal());
    // The intact first batch was applied before the corrupted one
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_replay_truncated_tail_aborts() {
    let temp_dir = create_temp_data_dir();
    let running = sizes(&[(0, 0)]);

    {
        let mut writer = WalWriter::open(temp_dir.path()).unwrap();
        writer.append_batch(&put(0, b"first"), &running).unwrap();
    }

    let wal_path = temp_dir.path().join("wal").join("wal.log");
    {
        let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
        file.write_all(&[0x40, 0x00, 0x00]).unwrap();
    }

    let (result, _) = replay(temp_dir.path(), &running, ReconcileInconsistency);
    assert_eq!(result.unwrap_err().code(), RecoveryErrorCode::WalCorruption);
}

//! Timestamp Size Reconciliation Tests
//!
//! Covers the public surface used by recovery:
//! - Size record decoding and length validation
//! - Per-key reconciliation truth table
//! - Verify vs reconcile dispatch behavior
//! - Preservation of operation kind, column family, order and values

use std::collections::HashMap;

use tsreplay::batch::{BatchOp, WriteBatch};
use tsreplay::udt::{
    handle_write_batch_timestamp_size_difference, TimestampSizeConsistencyMode,
    TimestampSizeMap, TimestampSizeRecord, UdtError, MIN_TIMESTAMP_BYTE,
};

use TimestampSizeConsistencyMode::{ReconcileInconsistency, VerifyConsistency};

// =============================================================================
// Test Utilities
// =============================================================================

fn sizes(pairs: &[(u32, usize)]) -> TimestampSizeMap {
    pairs.iter().copied().collect::<HashMap<_, _>>()
}

fn min_ts(len: usize) -> Vec<u8> {
    vec![MIN_TIMESTAMP_BYTE; len]
}

fn with_ts(key: &[u8], ts: &[u8]) -> Vec<u8> {
    let mut full = key.to_vec();
    full.extend_from_slice(ts);
    full
}

fn reconcile_put(running: usize, recorded: usize, key: &[u8]) -> Result<Vec<u8>, UdtError> {
    let mut batch = WriteBatch::new();
    batch.put(1, key, b"v");

    let running_ts_sz = sizes(&[(1, running)]);
    let record_ts_sz = if recorded == 0 {
        sizes(&[])
    } else {
        sizes(&[(1, recorded)])
    };

    let new_batch = handle_write_batch_timestamp_size_difference(
        &batch,
        &running_ts_sz,
        &record_ts_sz,
        ReconcileInconsistency,
    )?;

    let batch = new_batch.unwrap_or(batch);
    match &batch.ops()[0] {
        BatchOp::Put { key, .. } => Ok(key.clone()),
        other => panic!("unexpected op {:?}", other),
    }
}

// =============================================================================
// Size record codec
// =============================================================================

#[test]
fn test_size_record_decodes_entries_in_order() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&7u32.to_le_bytes());
    bytes.extend_from_slice(&8u16.to_le_bytes());
    bytes.extend_from_slice(&2u32.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());

    let record = TimestampSizeRecord::decode(&bytes).unwrap();
    assert_eq!(record.entries(), &[(7, 8), (2, 16)]);
    assert_eq!(record.encode(), bytes);
}

#[test]
fn test_size_record_empty_payload_is_valid() {
    let record = TimestampSizeRecord::decode(&[]).unwrap();
    assert!(record.is_empty());
}

#[test]
fn test_size_record_bad_length_is_corruption() {
    for len in [1usize, 5, 7, 11, 13] {
        let err = TimestampSizeRecord::decode(&vec![1u8; len]).unwrap_err();
        assert!(err.is_corruption(), "length {} should be rejected", len);
        assert!(err.message().contains(&len.to_string()));
    }
}

#[test]
fn test_size_record_debug_rendering() {
    let record = TimestampSizeRecord::new(vec![(1, 8), (3, 4)]);
    assert_eq!(
        record.to_string(),
        "Column family: 1, user-defined timestamp size: 8\n\
         Column family: 3, user-defined timestamp size: 4\n"
    );
}

// =============================================================================
// Key reconciliation truth table
// =============================================================================

#[test]
fn test_both_zero_unchanged() {
    assert_eq!(reconcile_put(0, 0, b"key").unwrap(), b"key");
}

#[test]
fn test_enable_timestamps_pads_minimum() {
    assert_eq!(reconcile_put(8, 0, b"key").unwrap(), with_ts(b"key", &min_ts(8)));
}

#[test]
fn test_disable_timestamps_strips_suffix() {
    let key = with_ts(b"key", &[9, 9, 9, 9, 9, 9, 9, 9]);
    assert_eq!(reconcile_put(0, 8, &key).unwrap(), b"key");
}

#[test]
fn test_equal_sizes_unchanged() {
    let key = with_ts(b"key", &[1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(reconcile_put(8, 8, &key).unwrap(), key);
}

#[test]
fn test_both_nonzero_different_is_invalid_configuration() {
    let err = reconcile_put(5, 3, b"key\0\0\0").unwrap_err();
    assert!(err.is_invalid_configuration());
    assert_eq!(err.code(), "TSR_UDT_INVALID_CONFIGURATION");
}

#[test]
fn test_dropped_column_family_unchanged() {
    let mut batch = WriteBatch::new();
    batch.put(9, b"key", b"v");
    batch.put(1, b"other", b"v");

    let new_batch = handle_write_batch_timestamp_size_difference(
        &batch,
        &sizes(&[(1, 4)]),
        &sizes(&[(9, 8)]),
        ReconcileInconsistency,
    )
    .unwrap()
    .unwrap();

    assert_eq!(
        new_batch.ops()[0],
        BatchOp::Put {
            cf: 9,
            key: b"key".to_vec(),
            value: b"v".to_vec()
        }
    );
}

// =============================================================================
// Dispatch modes
// =============================================================================

#[test]
fn test_verify_rejects_reconcilable_difference() {
    let mut batch = WriteBatch::new();
    batch.put(1, b"key", b"v");

    let err = handle_write_batch_timestamp_size_difference(
        &batch,
        &sizes(&[(1, 8)]),
        &sizes(&[]),
        VerifyConsistency,
    )
    .unwrap_err();

    assert!(err.is_invalid_configuration());
}

#[test]
fn test_verify_accepts_exact_match() {
    let mut batch = WriteBatch::new();
    batch.put(1, b"key\0\0\0\0\0\0\0\0", b"v");

    let result = handle_write_batch_timestamp_size_difference(
        &batch,
        &sizes(&[(0, 0), (1, 8)]),
        &sizes(&[(1, 8)]),
        VerifyConsistency,
    )
    .unwrap();

    assert!(result.is_none());
}

#[test]
fn test_reconcile_exact_match_produces_no_batch() {
    let mut batch = WriteBatch::new();
    batch.put(1, b"key", b"v");

    let result = handle_write_batch_timestamp_size_difference(
        &batch,
        &sizes(&[(1, 0), (2, 4)]),
        &sizes(&[(2, 4)]),
        ReconcileInconsistency,
    )
    .unwrap();

    assert!(result.is_none());
}

// =============================================================================
// Batch shape preservation
// =============================================================================

#[test]
fn test_reconciled_batch_preserves_kinds_order_and_values() {
    let mut batch = WriteBatch::new();
    batch.put(1, b"a", b"va");
    batch.delete(1, b"b");
    batch.single_delete(1, b"c");
    batch.merge(1, b"d", b"vd");
    batch.put_blob_index(1, b"e", b"blob");
    batch.delete_range(1, b"f", b"g");
    batch.put(0, b"untouched", b"v0");

    let new_batch = handle_write_batch_timestamp_size_difference(
        &batch,
        &sizes(&[(0, 0), (1, 2)]),
        &sizes(&[]),
        ReconcileInconsistency,
    )
    .unwrap()
    .unwrap();

    assert_eq!(new_batch.len(), batch.len());
    for (old, new) in batch.ops().iter().zip(new_batch.ops()) {
        assert_eq!(old.kind(), new.kind());
        assert_eq!(old.column_family(), new.column_family());
    }

    let pad = min_ts(2);
    assert_eq!(
        new_batch.ops()[0],
        BatchOp::Put {
            cf: 1,
            key: with_ts(b"a", &pad),
            value: b"va".to_vec()
        }
    );
    assert_eq!(
        new_batch.ops()[3],
        BatchOp::Merge {
            cf: 1,
            key: with_ts(b"d", &pad),
            value: b"vd".to_vec()
        }
    );
    assert_eq!(
        new_batch.ops()[4],
        BatchOp::PutBlobIndex {
            cf: 1,
            key: with_ts(b"e", &pad),
            value: b"blob".to_vec()
        }
    );
    assert_eq!(
        new_batch.ops()[5],
        BatchOp::DeleteRange {
            cf: 1,
            begin_key: with_ts(b"f", &pad),
            end_key: with_ts(b"g", &pad)
        }
    );
    assert_eq!(new_batch.ops()[6], batch.ops()[6]);
}

#[test]
fn test_transaction_markers_survive_reconciliation() {
    let mut batch = WriteBatch::new();
    batch.mark_begin_prepare(false);
    batch.put(1, b"k", b"v");
    batch.mark_end_prepare(b"xid");
    batch.mark_commit(b"xid");

    let new_batch = handle_write_batch_timestamp_size_difference(
        &batch,
        &sizes(&[(1, 8)]),
        &sizes(&[]),
        ReconcileInconsistency,
    )
    .unwrap()
    .unwrap();

    assert_eq!(new_batch.len(), 4);
    assert_eq!(new_batch.ops()[0], batch.ops()[0]);
    assert_eq!(new_batch.ops()[2], batch.ops()[2]);
    assert_eq!(new_batch.ops()[3], batch.ops()[3]);
}

// =============================================================================
// End-to-end scenarios
// =============================================================================

#[test]
fn test_scenario_enable_timestamps_on_put() {
    let mut batch = WriteBatch::new();
    batch.put(1, b"abc", b"v");

    let new_batch = handle_write_batch_timestamp_size_difference(
        &batch,
        &sizes(&[(1, 8)]),
        &sizes(&[]),
        ReconcileInconsistency,
    )
    .unwrap()
    .expect("a reconciled batch");

    let mut expected = WriteBatch::new();
    expected.put(1, &with_ts(b"abc", &min_ts(8)), b"v");
    assert_eq!(new_batch, expected);
}

#[test]
fn test_scenario_disable_timestamps_on_delete() {
    let mut batch = WriteBatch::new();
    batch.delete(2, b"abcXXXXXXXX");

    let new_batch = handle_write_batch_timestamp_size_difference(
        &batch,
        &sizes(&[(2, 0)]),
        &sizes(&[(2, 8)]),
        ReconcileInconsistency,
    )
    .unwrap()
    .expect("a reconciled batch");

    let mut expected = WriteBatch::new();
    expected.delete(2, b"abc");
    assert_eq!(new_batch, expected);
}

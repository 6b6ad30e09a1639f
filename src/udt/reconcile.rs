//! Best-effort timestamp size reconciliation for a single write batch
//!
//! For the user key of every entry, with `running` the size the column
//! family is configured with now and `recorded` the size the WAL says the
//! key was written with:
//!
//! 1. Column family no longer running: key copied as is.
//! 2. `recorded == running`: key copied as is.
//! 3. `recorded == 0`, `running > 0`: a minimum timestamp of `running`
//!    bytes is appended to the key.
//! 4. `recorded > 0`, `running == 0`: the last `recorded` bytes are
//!    stripped from the key.
//! 5. Both non-zero and different: `InvalidConfiguration`.

use std::borrow::Cow;

use crate::batch::{BatchHandler, BatchOp, WriteBatch};

use super::errors::{UdtError, UdtResult};
use super::TimestampSizeMap;

/// Byte value of the minimum timestamp. A timestamp made of these bytes
/// sorts before every timestamp a user can write.
pub const MIN_TIMESTAMP_BYTE: u8 = 0;

/// Rebuilds a write batch so its keys match the running timestamp sizes.
///
/// Drive it with [`WriteBatch::iterate`], then take the result with
/// [`TimestampRecoveryHandler::transfer_new_batch`] if
/// [`TimestampRecoveryHandler::changed`] reports a difference. The handler
/// is invalid after the transfer.
///
/// Transaction markers carry no key and are copied into the new batch
/// unchanged.
pub struct TimestampRecoveryHandler<'a> {
    /// Every running column family, zero sizes included
    running_ts_sz: &'a TimestampSizeMap,
    /// Recorded non-zero sizes; absent means 0
    record_ts_sz: &'a TimestampSizeMap,
    new_batch: Option<WriteBatch>,
    /// Cleared once `new_batch` has been transferred
    valid: bool,
    /// Set once any key differs from the original batch
    changed: bool,
}

impl<'a> TimestampRecoveryHandler<'a> {
    pub fn new(running_ts_sz: &'a TimestampSizeMap, record_ts_sz: &'a TimestampSizeMap) -> Self {
        Self {
            running_ts_sz,
            record_ts_sz,
            new_batch: Some(WriteBatch::new()),
            valid: true,
            changed: false,
        }
    }

    /// Whether at least one key was rewritten
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Whether the new batch is still held by the handler
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Move the rebuilt batch out of the handler.
    ///
    /// # Panics
    ///
    /// Panics if no key was changed, or if the batch was already
    /// transferred.
    pub fn transfer_new_batch(&mut self) -> WriteBatch {
        assert!(self.valid, "timestamp recovery handler used after transfer");
        assert!(
            self.changed,
            "new batch transferred although it equals the original batch"
        );
        self.valid = false;
        self.new_batch.take().unwrap_or_default()
    }

    /// Reconcile one user key against the sizes of its column family
    pub fn reconcile_key<'k>(&mut self, cf: u32, key: &'k [u8]) -> UdtResult<Cow<'k, [u8]>> {
        let Some(&running) = self.running_ts_sz.get(&cf) else {
            // Dropped column family: entries are copied as is.
            return Ok(Cow::Borrowed(key));
        };
        let recorded = self.record_ts_sz.get(&cf).copied().unwrap_or(0);

        if running == recorded {
            return Ok(Cow::Borrowed(key));
        }

        if recorded == 0 {
            let mut padded = Vec::with_capacity(key.len() + running);
            padded.extend_from_slice(key);
            padded.resize(key.len() + running, MIN_TIMESTAMP_BYTE);
            self.changed = true;
            return Ok(Cow::Owned(padded));
        }

        if running == 0 {
            if key.len() < recorded {
                return Err(UdtError::corruption(format!(
                    "Key of {} bytes in column family {} is shorter than its recorded timestamp size {}",
                    key.len(),
                    cf,
                    recorded
                )));
            }
            self.changed = true;
            return Ok(Cow::Borrowed(&key[..key.len() - recorded]));
        }

        Err(UdtError::invalid_configuration(format!(
            "Column family {}: recorded user-defined timestamp size {} cannot be reconciled with running size {}",
            cf, recorded, running
        )))
    }

    fn batch_mut(&mut self) -> &mut WriteBatch {
        assert!(self.valid, "timestamp recovery handler used after transfer");
        self.new_batch.get_or_insert_with(WriteBatch::new)
    }
}

impl BatchHandler for TimestampRecoveryHandler<'_> {
    type Error = UdtError;

    fn handle(&mut self, op: &BatchOp) -> UdtResult<()> {
        assert!(self.valid, "timestamp recovery handler used after transfer");

        let rebuilt = match op {
            BatchOp::Put { cf, key, value } => BatchOp::Put {
                cf: *cf,
                key: self.reconcile_key(*cf, key)?.into_owned(),
                value: value.clone(),
            },
            BatchOp::Merge { cf, key, value } => BatchOp::Merge {
                cf: *cf,
                key: self.reconcile_key(*cf, key)?.into_owned(),
                value: value.clone(),
            },
            BatchOp::PutBlobIndex { cf, key, value } => BatchOp::PutBlobIndex {
                cf: *cf,
                key: self.reconcile_key(*cf, key)?.into_owned(),
                value: value.clone(),
            },
            BatchOp::Delete { cf, key } => BatchOp::Delete {
                cf: *cf,
                key: self.reconcile_key(*cf, key)?.into_owned(),
            },
            BatchOp::SingleDelete { cf, key } => BatchOp::SingleDelete {
                cf: *cf,
                key: self.reconcile_key(*cf, key)?.into_owned(),
            },
            BatchOp::DeleteRange {
                cf,
                begin_key,
                end_key,
            } => {
                let begin_key = self.reconcile_key(*cf, begin_key)?.into_owned();
                let end_key = self.reconcile_key(*cf, end_key)?.into_owned();
                BatchOp::DeleteRange {
                    cf: *cf,
                    begin_key,
                    end_key,
                }
            }
            BatchOp::BeginPrepare { .. }
            | BatchOp::EndPrepare { .. }
            | BatchOp::Commit { .. }
            | BatchOp::CommitWithTimestamp { .. }
            | BatchOp::Rollback { .. }
            | BatchOp::Noop { .. } => op.clone(),
        };

        self.batch_mut().push(rebuilt);
        Ok(())
    }
}

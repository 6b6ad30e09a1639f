//! Per-batch timestamp size consistency handling during WAL replay

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::batch::WriteBatch;

use super::errors::{UdtError, UdtResult};
use super::reconcile::TimestampRecoveryHandler;
use super::TimestampSizeMap;

/// How a timestamp size difference found in a replayed batch is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampSizeConsistencyMode {
    /// Every running column family must have exactly its recorded size.
    /// Column families that were dropped are ignored.
    #[serde(rename = "verify")]
    VerifyConsistency,
    /// Differences are accepted when a best-effort reconciliation can
    /// resolve them, and a new batch consistent with the running sizes is
    /// produced. Dropped column families are ignored and their entries
    /// copied as is.
    #[serde(rename = "reconcile")]
    ReconcileInconsistency,
}

impl TimestampSizeConsistencyMode {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TimestampSizeConsistencyMode::VerifyConsistency => "verify",
            TimestampSizeConsistencyMode::ReconcileInconsistency => "reconcile",
        }
    }
}

impl fmt::Display for TimestampSizeConsistencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Handle the difference between recorded and running timestamp sizes
/// for one batch read from the WAL.
///
/// `running_ts_sz` holds every running column family, zero sizes
/// included. `record_ts_sz` holds only the non-zero sizes logged ahead of
/// this batch; a column family missing from it was written with size 0.
/// Ids present only in `record_ts_sz` belong to dropped column families
/// and are ignored.
///
/// Returns `Ok(Some(batch))` only in `ReconcileInconsistency` mode when at
/// least one key had to be rewritten. `Ok(None)` means the original batch
/// can be replayed as is. An error means the difference cannot be
/// tolerated under `mode`, and no batch is produced.
pub fn handle_write_batch_timestamp_size_difference(
    batch: &WriteBatch,
    running_ts_sz: &TimestampSizeMap,
    record_ts_sz: &TimestampSizeMap,
    mode: TimestampSizeConsistencyMode,
) -> UdtResult<Option<WriteBatch>> {
    let mut need_recovery = false;

    for (&cf, &running) in running_ts_sz {
        let recorded = record_ts_sz.get(&cf).copied().unwrap_or(0);
        if running == recorded {
            continue;
        }

        match mode {
            TimestampSizeConsistencyMode::VerifyConsistency => {
                return Err(UdtError::invalid_configuration(format!(
                    "Column family {}: recorded user-defined timestamp size {} is inconsistent with running size {}",
                    cf, recorded, running
                )));
            }
            TimestampSizeConsistencyMode::ReconcileInconsistency => {
                if running != 0 && recorded != 0 {
                    return Err(UdtError::invalid_configuration(format!(
                        "Column family {}: recorded user-defined timestamp size {} cannot be reconciled with running size {}",
                        cf, recorded, running
                    )));
                }
                need_recovery = true;
            }
        }
    }

    if !need_recovery {
        return Ok(None);
    }

    let mut handler = TimestampRecoveryHandler::new(running_ts_sz, record_ts_sz);
    batch.iterate(&mut handler)?;

    // The differing column families may not appear in this batch at all.
    if !handler.changed() {
        return Ok(None);
    }

    Ok(Some(handler.transfer_new_batch()))
}

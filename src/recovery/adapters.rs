//! Adapter implementations for recovery traits
//!
//! Connects the replay driver to the file-backed WAL reader, and provides
//! an in-memory sink that keeps every replayed batch.

use crate::batch::WriteBatch;
use crate::wal::{WalReader, WalRecord};

use super::errors::{RecoveryError, RecoveryResult};
use super::replay::{BatchApply, WalRead};

// ============================================================================
// WalRead implementation for WalReader
// ============================================================================

impl WalRead for WalReader {
    fn read_next(&mut self) -> RecoveryResult<Option<WalRecord>> {
        let offset = self.current_offset();
        WalReader::read_next(self).map_err(|e| RecoveryError::wal_corruption(offset, e.to_string()))
    }

    fn current_offset(&self) -> u64 {
        WalReader::current_offset(self)
    }

    fn reset(&mut self) -> RecoveryResult<()> {
        let offset = self.current_offset();
        WalReader::reset(self).map_err(|e| {
            RecoveryError::wal_corruption(offset, format!("Failed to reset WAL reader: {}", e))
        })
    }
}

// ============================================================================
// In-memory sink
// ============================================================================

/// Sink that keeps replayed batches in WAL order
#[derive(Debug, Default)]
pub struct ReplayedBatches {
    batches: Vec<(u64, WriteBatch)>,
}

impl ReplayedBatches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replayed batches with their WAL sequence numbers
    pub fn batches(&self) -> &[(u64, WriteBatch)] {
        &self.batches
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn into_batches(self) -> Vec<(u64, WriteBatch)> {
        self.batches
    }
}

impl BatchApply for ReplayedBatches {
    fn apply_batch(&mut self, sequence_number: u64, batch: &WriteBatch) -> RecoveryResult<()> {
        if let Some((last, _)) = self.batches.last() {
            if sequence_number <= *last {
                return Err(RecoveryError::apply_failed(
                    sequence_number,
                    format!("sequence does not follow {}", last),
                ));
            }
        }
        self.batches.push((sequence_number, batch.clone()));
        Ok(())
    }
}

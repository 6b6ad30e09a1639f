//! User-defined timestamp size handling for WAL replay
//!
//! Column families may carry a fixed-size timestamp suffix on every user
//! key. The WAL records the non-zero sizes in effect when each batch was
//! written (see [`TimestampSizeRecord`]). At replay time the recorded
//! sizes are compared with the running ones and each batch is either
//! accepted as is, rewritten, or rejected
//! (see [`handle_write_batch_timestamp_size_difference`]).
//!
//! # Invariants
//!
//! - Zero timestamp sizes are never logged; absence means 0
//! - Only keys are rewritten, never values
//! - A rejected batch produces no partial output

use std::collections::HashMap;

mod dispatch;
mod errors;
mod reconcile;
mod size_record;

pub use dispatch::{handle_write_batch_timestamp_size_difference, TimestampSizeConsistencyMode};
pub use errors::{Severity, UdtError, UdtResult};
pub use reconcile::{TimestampRecoveryHandler, MIN_TIMESTAMP_BYTE};
pub use size_record::{TimestampSizeRecord, SIZE_PER_COLUMN_FAMILY};

/// Column family id to user-defined timestamp size
pub type TimestampSizeMap = HashMap<u32, usize>;

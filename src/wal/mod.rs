//! Write-Ahead Log (WAL) framing for tsreplay
//!
//! The WAL is a single append-only file of checksummed records. Two record
//! types exist: write batches, and timestamp size records announcing the
//! user-defined timestamp sizes the following batches were written with.
//!
//! # Design Principles
//!
//! - Durability over throughput: fsync after every append
//! - Sequential deterministic replay
//! - Explicit failure over silent recovery: any corruption halts reading

mod checksum;
mod errors;
mod reader;
mod record;
mod writer;

pub use checksum::{compute_checksum, verify_checksum};
pub use errors::{Severity, WalError, WalErrorCode, WalResult};
pub use reader::WalReader;
pub use record::{RecordType, WalEntry, WalRecord, MIN_RECORD_SIZE};
pub use writer::WalWriter;

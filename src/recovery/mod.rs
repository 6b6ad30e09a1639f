//! Recovery subsystem for tsreplay
//!
//! Replays a WAL into a sink, reconciling every batch with the running
//! user-defined timestamp sizes of its column families.
//!
//! # Replay sequence (strict order)
//!
//! 1. Load the replay configuration
//! 2. Open the WAL reader
//! 3. Replay from offset 0 sequentially
//! 4. Fold each TIMESTAMP_SIZE record into the recorded sizes
//! 5. Check, and when allowed rewrite, each WRITE_BATCH before applying it
//!
//! Any corruption or unreconcilable size difference halts replay.

mod adapters;
mod config;
mod errors;
mod replay;

pub use adapters::ReplayedBatches;
pub use config::{KeyspaceConfig, ReplayConfig};
pub use errors::{RecoveryError, RecoveryErrorCode, RecoveryResult, Severity};
pub use replay::{BatchApply, ReplayStats, WalRead, WalReplayer};

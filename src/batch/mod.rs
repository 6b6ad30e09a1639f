//! Write batch model
//!
//! A write batch is the unit logged in the WAL and replayed during
//! recovery. Batches are built through `WriteBatch` and consumed through
//! `WriteBatch::iterate` with a `BatchHandler`.

mod operation;
mod write_batch;

pub use operation::{BatchOp, OpKind};
pub use write_batch::{BatchHandler, WriteBatch};

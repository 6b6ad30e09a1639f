//! tsreplay - WAL replay with user-defined timestamp size reconciliation
//!
//! A column family may switch user-defined timestamps on or off between
//! the run that wrote a WAL and the run that replays it. Replay brings
//! every logged key to the running size: padding it with a minimum
//! timestamp, stripping the logged one, or failing when neither applies.

pub mod batch;
pub mod cli;
pub mod observability;
pub mod recovery;
pub mod udt;
pub mod wal;

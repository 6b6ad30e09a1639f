//! Observable replay events

use std::fmt;

/// Events emitted while replaying a WAL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Replay started
    ReplayBegin,
    /// A timestamp size record was folded into the recorded sizes
    TimestampSizeRecord,
    /// A batch was rewritten to match the running timestamp sizes
    BatchReconciled,
    /// A batch has a timestamp size difference that cannot be tolerated
    TimestampSizeMismatch,
    /// WAL corruption detected (FATAL)
    WalCorruption,
    /// Replay finished
    ReplayComplete,
    /// Replay aborted (FATAL)
    ReplayFailed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ReplayBegin => "REPLAY_BEGIN",
            Event::TimestampSizeRecord => "TIMESTAMP_SIZE_RECORD",
            Event::BatchReconciled => "BATCH_RECONCILED",
            Event::TimestampSizeMismatch => "TIMESTAMP_SIZE_MISMATCH",
            Event::WalCorruption => "WAL_CORRUPTION",
            Event::ReplayComplete => "REPLAY_COMPLETE",
            Event::ReplayFailed => "REPLAY_FAILED",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::WalCorruption | Event::ReplayFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

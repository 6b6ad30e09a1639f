//! Recovery error types
//!
//! Error codes:
//! - TSR_WAL_CORRUPTION (FATAL)
//! - TSR_RECOVERY_TIMESTAMP_SIZE_MISMATCH (FATAL)
//! - TSR_RECOVERY_BATCH_CORRUPTION (FATAL)
//! - TSR_RECOVERY_APPLY_FAILED (FATAL)
//! - TSR_RECOVERY_CONFIG_INVALID (FATAL)

use std::fmt;

use crate::udt::UdtError;

/// Severity levels for recovery errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Replay must halt immediately
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Recovery-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryErrorCode {
    /// WAL data is corrupted
    WalCorruption,
    /// Recorded and running timestamp sizes cannot be reconciled
    TimestampSizeMismatch,
    /// A batch key cannot carry its recorded timestamp
    BatchCorruption,
    /// The sink rejected a replayed batch
    ApplyFailed,
    /// Replay configuration is unreadable or invalid
    ConfigInvalid,
}

impl RecoveryErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            RecoveryErrorCode::WalCorruption => "TSR_WAL_CORRUPTION",
            RecoveryErrorCode::TimestampSizeMismatch => "TSR_RECOVERY_TIMESTAMP_SIZE_MISMATCH",
            RecoveryErrorCode::BatchCorruption => "TSR_RECOVERY_BATCH_CORRUPTION",
            RecoveryErrorCode::ApplyFailed => "TSR_RECOVERY_APPLY_FAILED",
            RecoveryErrorCode::ConfigInvalid => "TSR_RECOVERY_CONFIG_INVALID",
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }
}

impl fmt::Display for RecoveryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Recovery error type with context
#[derive(Debug)]
pub struct RecoveryError {
    code: RecoveryErrorCode,
    message: String,
    offset: Option<u64>,
    sequence: Option<u64>,
}

impl RecoveryError {
    /// Create a WAL corruption error
    pub fn wal_corruption(offset: u64, reason: impl Into<String>) -> Self {
        Self {
            code: RecoveryErrorCode::WalCorruption,
            message: format!("WAL corruption at offset {}: {}", offset, reason.into()),
            offset: Some(offset),
            sequence: None,
        }
    }

    /// Create an error for a batch whose timestamp sizes were rejected
    pub fn timestamp_size(sequence: u64, err: UdtError) -> Self {
        let code = match err {
            UdtError::InvalidConfiguration(_) => RecoveryErrorCode::TimestampSizeMismatch,
            UdtError::Corruption(_) => RecoveryErrorCode::BatchCorruption,
        };
        Self {
            code,
            message: format!("Batch at sequence {}: {}", sequence, err),
            offset: None,
            sequence: Some(sequence),
        }
    }

    /// Create an apply failed error
    pub fn apply_failed(sequence: u64, reason: impl Into<String>) -> Self {
        Self {
            code: RecoveryErrorCode::ApplyFailed,
            message: format!(
                "Failed to apply batch at sequence {}: {}",
                sequence,
                reason.into()
            ),
            offset: None,
            sequence: Some(sequence),
        }
    }

    /// Create a configuration error
    pub fn config_invalid(reason: impl Into<String>) -> Self {
        Self {
            code: RecoveryErrorCode::ConfigInvalid,
            message: reason.into(),
            offset: None,
            sequence: None,
        }
    }

    pub fn code(&self) -> RecoveryErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the WAL byte offset if applicable
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Returns the WAL sequence number if applicable
    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    /// All recovery errors are fatal
    pub fn is_fatal(&self) -> bool {
        true
    }
}

impl fmt::Display for RecoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for RecoveryError {}

/// Result type for recovery operations
pub type RecoveryResult<T> = Result<T, RecoveryError>;

//! WAL error types
//!
//! Error codes:
//! - TSR_WAL_APPEND_FAILED (ERROR severity)
//! - TSR_WAL_FSYNC_FAILED (FATAL severity)
//! - TSR_WAL_CORRUPTION (FATAL severity)
//! - TSR_WAL_TIMESTAMP_SIZE (ERROR severity)

use std::fmt;
use std::io;

/// Severity levels for WAL errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, caller may continue
    Error,
    /// Process must stop using the WAL
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// WAL-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalErrorCode {
    /// WAL write failed
    WalAppendFailed,
    /// WAL fsync failed
    WalFsyncFailed,
    /// WAL record failed validation
    WalCorruption,
    /// Batch cannot be logged with the given timestamp sizes
    WalTimestampSize,
}

impl WalErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            WalErrorCode::WalAppendFailed => "TSR_WAL_APPEND_FAILED",
            WalErrorCode::WalFsyncFailed => "TSR_WAL_FSYNC_FAILED",
            WalErrorCode::WalCorruption => "TSR_WAL_CORRUPTION",
            WalErrorCode::WalTimestampSize => "TSR_WAL_TIMESTAMP_SIZE",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            WalErrorCode::WalAppendFailed => Severity::Error,
            WalErrorCode::WalFsyncFailed => Severity::Fatal,
            WalErrorCode::WalCorruption => Severity::Fatal,
            WalErrorCode::WalTimestampSize => Severity::Error,
        }
    }
}

impl fmt::Display for WalErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// WAL error type with context
#[derive(Debug)]
pub struct WalError {
    code: WalErrorCode,
    message: String,
    /// Where in the WAL the error was detected
    details: Option<String>,
    source: Option<io::Error>,
}

impl WalError {
    /// Create a new WAL append failed error
    pub fn append_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: WalErrorCode::WalAppendFailed,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Create a new WAL fsync failed error
    pub fn fsync_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: WalErrorCode::WalFsyncFailed,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Create a new WAL corruption error
    pub fn corruption(message: impl Into<String>) -> Self {
        Self {
            code: WalErrorCode::WalCorruption,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Create a WAL corruption error with sequence number context
    pub fn corruption_at_sequence(sequence: u64, reason: impl Into<String>) -> Self {
        Self {
            code: WalErrorCode::WalCorruption,
            message: reason.into(),
            details: Some(format!("sequence_number: {}", sequence)),
            source: None,
        }
    }

    /// Create a WAL corruption error with byte offset context
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        Self {
            code: WalErrorCode::WalCorruption,
            message: reason.into(),
            details: Some(format!("byte_offset: {}", offset)),
            source: None,
        }
    }

    /// Create an error for a timestamp size that cannot be logged
    pub fn timestamp_size(message: impl Into<String>) -> Self {
        Self {
            code: WalErrorCode::WalTimestampSize,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    pub fn code(&self) -> WalErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns whether the WAL must not be used any further
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for WalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for WalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for WAL operations
pub type WalResult<T> = Result<T, WalError>;

//! Timestamp size error types
//!
//! Error codes:
//! - TSR_UDT_CORRUPTION (FATAL)
//! - TSR_UDT_INVALID_CONFIGURATION (FATAL)

use std::fmt;

use thiserror::Error;

/// Severity levels for timestamp size errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Replay of the affected batch must not continue
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Errors raised while decoding timestamp size records or reconciling keys
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UdtError {
    /// Malformed timestamp size record or key bytes
    #[error("Corruption: {0}")]
    Corruption(String),

    /// Recorded and running timestamp sizes cannot be reconciled
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl UdtError {
    /// Create a corruption error
    pub fn corruption(message: impl Into<String>) -> Self {
        UdtError::Corruption(message.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        UdtError::InvalidConfiguration(message.into())
    }

    /// Returns the error code string
    pub fn code(&self) -> &'static str {
        match self {
            UdtError::Corruption(_) => "TSR_UDT_CORRUPTION",
            UdtError::InvalidConfiguration(_) => "TSR_UDT_INVALID_CONFIGURATION",
        }
    }

    /// Returns the severity level (always FATAL)
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }

    /// Returns the error message without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            UdtError::Corruption(message) | UdtError::InvalidConfiguration(message) => message,
        }
    }

    pub fn is_corruption(&self) -> bool {
        matches!(self, UdtError::Corruption(_))
    }

    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, UdtError::InvalidConfiguration(_))
    }
}

/// Result type for timestamp size operations
pub type UdtResult<T> = Result<T, UdtError>;

//! Error types for peripheral operations.
//!
//! This module defines the errors a peripheral can report: bus faults,
//! expired busy-wait budgets, ISO14443 protocol failures and flash faults.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during peripheral operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HardwareError {
    /// A busy-wait loop ran past its deadline.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// The bus transaction itself failed (NAK, arbitration loss, abort).
    #[error("Bus error: {message}")]
    Bus { message: String },

    /// The reader flagged a protocol, parity or buffer overflow error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// More than one card answered and the collision was not resolved.
    #[error("Collision detected")]
    Collision,

    /// A response CRC_A did not match.
    #[error("CRC mismatch")]
    CrcMismatch,

    /// MIFARE authentication did not enable Crypto1.
    #[error("Authentication failed for block {block}")]
    AuthenticationFailed { block: u8 },

    /// The card answered with a NAK.
    #[error("Card NAK: {code:#04x}")]
    Nak { code: u8 },

    /// No card answered.
    #[error("No card in field")]
    NoCard,

    /// Response length or content was not what the command expects.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Flash erase or program failed.
    #[error("Flash error at {offset:#010x}: {message}")]
    Flash { offset: u32, message: String },

    /// Device initialization failed.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl HardwareError {
    /// Create a new timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a new bus error.
    pub fn bus(message: impl Into<String>) -> Self {
        Self::Bus {
            message: message.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a new flash error.
    pub fn flash(offset: u32, message: impl Into<String>) -> Self {
        Self::Flash {
            offset,
            message: message.into(),
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

//! Error types for tag acquisition.

use tagstock_hardware::HardwareError;

/// Result type alias for acquisition operations.
pub type Result<T> = std::result::Result<T, RfidError>;

/// Why an acquisition attempt was abandoned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RfidError {
    /// The reader or the card failed during select, authentication or read.
    #[error("Reader error: {0}")]
    Reader(#[from] HardwareError),

    /// The block was read but does not hold a valid payload.
    #[error("Invalid tag payload: {0}")]
    Payload(#[from] tagstock_core::Error),
}

impl RfidError {
    /// Whether the attempt failed at the MIFARE authentication step.
    #[must_use]
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            Self::Reader(HardwareError::AuthenticationFailed { .. })
        )
    }
}

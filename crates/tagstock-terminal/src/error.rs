//! Terminal error taxonomy.
//!
//! Every variant is recoverable: the dispatcher logs it, shows red on the
//! status LED and resets whichever state machine raised it. Nothing here
//! propagates beyond [`SystemState::program`](crate::SystemState::program).

use tagstock_core::{Key, Role};
use tagstock_rfid::RfidError;
use tagstock_storage::LedgerError;
use thiserror::Error;

/// Result type alias for terminal operations.
pub type Result<T> = std::result::Result<T, TerminalError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TerminalError {
    /// Key not valid in the current phase of a role session.
    #[error("Invalid key {key} in {role} session")]
    Input { key: Key, role: Role },

    /// Wrong admin PIN. The session is aborted, there is no retry.
    #[error("Wrong admin PIN")]
    Auth,

    /// Tag authentication, read or decode failed.
    #[error("Tag acquisition failed: {0}")]
    Protocol(#[from] RfidError),

    /// Transaction refused by the ledger (stock, capacity, overflow).
    #[error("Transaction rejected: {0}")]
    Capacity(LedgerError),

    /// Flash erase or program failed; the ledger was rolled back.
    #[error("Persistence failed: {0}")]
    Persistence(LedgerError),

    /// Bad configuration at boot.
    #[error("Configuration error: {0}")]
    Config(#[from] tagstock_core::Error),
}

impl From<LedgerError> for TerminalError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::Flash(_) => Self::Persistence(error),
            _ => Self::Capacity(error),
        }
    }
}

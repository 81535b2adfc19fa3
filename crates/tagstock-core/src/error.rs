use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid product id: {0} (expected 1-5)")]
    InvalidProductId(u8),

    #[error("Invalid key code: {0:#04x}")]
    InvalidKeyCode(u8),

    #[error("Invalid role discriminator: {0:#04x}")]
    InvalidRole(u8),

    #[error("Invalid tag payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid PIN: {0}")]
    InvalidPin(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

//! Common types shared across peripheral implementations.

use std::fmt;

use heapless::Vec;
use serde::{Deserialize, Serialize};
use tagstock_core::constants::FLASH_PAGE_SIZE;

use crate::error::{HardwareError, Result};

/// One flash program unit.
pub type FlashPage = [u8; FLASH_PAGE_SIZE];

/// MIFARE Classic sector key (key A).
pub type MifareKey = [u8; 6];

/// Minimum UID length in bytes (single size, ISO 14443-3).
pub const MIN_UID_LENGTH: usize = 4;

/// Maximum UID length in bytes (triple size, ISO 14443-3).
pub const MAX_UID_LENGTH: usize = 10;

/// Level snapshot of the 4x4 key matrix.
///
/// Bit `n` of `rows` is row `n`, bit `n` of `columns` is column `n`. A line
/// reads 1 while a key on it is pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatrixSnapshot {
    pub rows: u8,
    pub columns: u8,
}

impl MatrixSnapshot {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.rows & 0x0F == 0 && self.columns & 0x0F == 0
    }
}

/// Unique identifier of a selected PICC.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Uid {
    bytes: Vec<u8, MAX_UID_LENGTH>,
    /// Select acknowledge of the last cascade level.
    pub sak: u8,
}

impl Uid {
    /// Build a UID from its bytes.
    ///
    /// # Errors
    ///
    /// Returns an error unless the length is 4, 7 or 10 bytes.
    pub fn new(bytes: &[u8], sak: u8) -> Result<Self> {
        if !matches!(bytes.len(), 4 | 7 | 10) {
            return Err(HardwareError::invalid_data(format!(
                "UID must be 4, 7 or 10 bytes, got {}",
                bytes.len()
            )));
        }
        let bytes = Vec::from_slice(bytes)
            .map_err(|_| HardwareError::invalid_data("UID too long"))?;
        Ok(Self { bytes, sak })
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The four bytes MIFARE Classic authentication mixes into Crypto1.
    #[must_use]
    pub fn auth_bytes(&self) -> [u8; 4] {
        let tail = &self.bytes[self.bytes.len().saturating_sub(4)..];
        let mut out = [0u8; 4];
        out[..tail.len()].copy_from_slice(tail);
        out
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.bytes {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uid_valid_lengths() {
        assert!(Uid::new(&[1, 2, 3, 4], 0x08).is_ok());
        assert!(Uid::new(&[1, 2, 3, 4, 5, 6, 7], 0x08).is_ok());
        assert!(Uid::new(&[0; 10], 0x08).is_ok());
    }

    #[test]
    fn test_uid_invalid_lengths() {
        assert!(Uid::new(&[], 0).is_err());
        assert!(Uid::new(&[1, 2, 3], 0).is_err());
        assert!(Uid::new(&[0; 5], 0).is_err());
    }

    #[test]
    fn test_uid_display_and_auth_bytes() {
        let uid = Uid::new(&[0x04, 0xAB, 0xCD, 0xEF, 0x10, 0x20, 0x30], 0x08).unwrap();
        assert_eq!(uid.to_string(), "04ABCDEF102030");
        assert_eq!(uid.auth_bytes(), [0xEF, 0x10, 0x20, 0x30]);
    }

    #[test]
    fn test_matrix_snapshot_idle() {
        assert!(MatrixSnapshot::default().is_idle());
        assert!(!MatrixSnapshot { rows: 0b0100, columns: 0 }.is_idle());
        // high nibble is not wired
        assert!(MatrixSnapshot { rows: 0xF0, columns: 0xF0 }.is_idle());
    }

    #[test]
    fn test_matrix_snapshot_serialization() {
        let snapshot = MatrixSnapshot { rows: 0b0001, columns: 0b1000 };
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: MatrixSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, back);
    }
}

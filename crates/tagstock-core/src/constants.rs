//! Core constants for the tagstock inventory terminal.
//!
//! This module centralizes the fixed numbers the rest of the workspace agrees
//! on: flash geometry, ledger dimensions, timer periods and reader budgets.
//!
//! # Flash Layout
//!
//! ```text
//! flash:  [ ... firmware ... | last 4 KiB sector ]
//!                              ^ LEDGER_FLASH_OFFSET
//! sector: [ page 0 (256 B) | unused pages ... ]
//! page 0: [ 5 rows x 3 cols x u32 LE = 60 B | 0xFF padding ]
//! ```
//!
//! # Usage
//!
//! ```
//! use tagstock_core::constants::*;
//!
//! assert_eq!(LEDGER_BYTES, PRODUCT_COUNT * LEDGER_COLUMNS * 4);
//! assert_eq!(LEDGER_FLASH_OFFSET % FLASH_SECTOR_SIZE as u32, 0);
//! ```

// ============================================================================
// Inventory
// ============================================================================

/// Number of product slots handled by the terminal.
pub const PRODUCT_COUNT: usize = 5;

/// Columns stored per product: amount, cumulative purchase, cumulative sale.
pub const LEDGER_COLUMNS: usize = 3;

/// Serialized size of the ledger table in bytes.
pub const LEDGER_BYTES: usize = PRODUCT_COUNT * LEDGER_COLUMNS * 4;

// ============================================================================
// Flash Geometry
// ============================================================================

/// Total on-board flash size (2 MiB QSPI part).
pub const FLASH_SIZE: u32 = 2 * 1024 * 1024;

/// Erase granularity.
pub const FLASH_SECTOR_SIZE: usize = 4096;

/// Program granularity.
pub const FLASH_PAGE_SIZE: usize = 256;

/// Offset of the sector reserved for the ledger (last sector of flash).
pub const LEDGER_FLASH_OFFSET: u32 = FLASH_SIZE - FLASH_SECTOR_SIZE as u32;

/// Value of an erased flash byte.
pub const FLASH_ERASED_BYTE: u8 = 0xFF;

// ============================================================================
// Timers (milliseconds)
// ============================================================================

/// Keypad debounce period.
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Tag polling period while no session is open.
pub const DEFAULT_TAG_POLL_MS: u64 = 1000;

/// How long a feedback color stays on the status LED.
pub const DEFAULT_LED_HOLD_MS: u64 = 500;

/// Period between two LCD inventory frames.
pub const DEFAULT_DISPLAY_TICK_MS: u64 = 2000;

// ============================================================================
// Reader
// ============================================================================

/// Busy-wait budget for a single PCD transceive.
pub const TRANSCEIVE_TIMEOUT_MS: u64 = 36;

/// Busy-wait budget for the PCD CRC coprocessor.
pub const CRC_TIMEOUT_MS: u64 = 90;

/// Busy-wait budget for the PCD soft reset to leave power-down.
pub const RESET_TIMEOUT_MS: u64 = 50;

/// 7-bit I2C address of the MFRC522.
pub const MFRC522_I2C_ADDRESS: u8 = 0x28;

/// Data block holding the tag payload (sector 1, block 0).
pub const DEFAULT_TAG_BLOCK: u8 = 4;

/// Factory default MIFARE Classic key A.
pub const DEFAULT_TAG_KEY: [u8; 6] = [0xFF; 6];

/// Size of a MIFARE Classic data block.
pub const TAG_BLOCK_SIZE: usize = 16;

// ============================================================================
// Authentication
// ============================================================================

/// Number of digits in the admin PIN.
pub const PIN_LENGTH: usize = 4;

/// Factory admin PIN.
pub const DEFAULT_ADMIN_PIN: &str = "1234";

// ============================================================================
// Display
// ============================================================================

/// Characters per LCD line.
pub const LCD_COLUMNS: usize = 16;

/// Number of LCD lines.
pub const LCD_LINES: usize = 2;

//! Peripheral trait definitions.
//!
//! These traits establish the contract between the control core and the
//! board. The core in `tagstock-keypad`, `tagstock-rfid`, `tagstock-storage`
//! and `tagstock-terminal` depends only on them, so the same code runs against
//! real drivers and against the [`mock`](crate::mock) peripherals.
//!
//! All methods are plain blocking calls. Interrupt handlers only ever use the
//! non-blocking ones ([`KeyMatrix`] reads and sense switching, [`Clock::now`]).

use tagstock_core::{LedColor, constants::TAG_BLOCK_SIZE};

use crate::error::Result;
use crate::time::Millis;
use crate::types::{FlashPage, MatrixSnapshot, MifareKey, Uid};

/// 4x4 key matrix wiring.
///
/// The matrix is interrupt-driven in two phases: while *column-sensing* the
/// rows are driven and a press shows up as an edge on a column line; while
/// *row-sensing* the columns are driven and the row lines are level-sensed
/// until the key is released.
pub trait KeyMatrix {
    /// Current level of the four row lines (low nibble).
    fn read_rows(&self) -> u8;

    /// Current level of the four column lines (low nibble).
    fn read_columns(&self) -> u8;

    /// Drive the columns and arm the row level interrupt.
    fn sense_rows(&mut self);

    /// Drive the rows and arm the column edge interrupt.
    fn sense_columns(&mut self);

    /// Sample both sides of the matrix.
    fn read(&self) -> MatrixSnapshot {
        MatrixSnapshot {
            rows: self.read_rows() & 0x0F,
            columns: self.read_columns() & 0x0F,
        }
    }
}

/// Byte-wide register access to the MFRC522.
///
/// Implementations hide the transport: I2C (register address as the first
/// data byte) or SPI (address byte `0bRAAAAAA0`). Register numbers passed here
/// are the unshifted datasheet addresses.
pub trait RegisterBus {
    /// Read one register.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus transaction fails.
    fn read_register(&mut self, reg: u8) -> Result<u8>;

    /// Write one register.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus transaction fails.
    fn write_register(&mut self, reg: u8, value: u8) -> Result<()>;

    /// Read `buf.len()` bytes from the same register (FIFO drain).
    ///
    /// # Errors
    ///
    /// Returns an error if any bus transaction fails.
    fn read_fifo(&mut self, reg: u8, buf: &mut [u8]) -> Result<()> {
        for slot in buf.iter_mut() {
            *slot = self.read_register(reg)?;
        }
        Ok(())
    }

    /// Write all of `data` to the same register (FIFO fill).
    ///
    /// # Errors
    ///
    /// Returns an error if any bus transaction fails.
    fn write_fifo(&mut self, reg: u8, data: &[u8]) -> Result<()> {
        for &byte in data {
            self.write_register(reg, byte)?;
        }
        Ok(())
    }
}

/// RFID reader operations needed to acquire a tag.
///
/// Every method is an atomic blocking call bounded by the reader's internal
/// transceive budget.
pub trait TagReader {
    /// Send REQA and report whether any card answered.
    ///
    /// A collision still counts as a card in the field.
    ///
    /// # Errors
    ///
    /// Returns an error only for bus faults; silence is `Ok(false)`.
    fn poll_presence(&mut self) -> Result<bool>;

    /// Run anticollision and select, returning the card UID.
    ///
    /// # Errors
    ///
    /// Returns an error if the card stops answering or the select fails.
    fn select(&mut self) -> Result<Uid>;

    /// Authenticate `block` with key A.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::AuthenticationFailed`](crate::HardwareError::AuthenticationFailed)
    /// if the key is rejected.
    fn authenticate(&mut self, block: u8, key: &MifareKey, uid: &Uid) -> Result<()>;

    /// Read one 16-byte data block.
    ///
    /// # Errors
    ///
    /// Returns an error on timeout, NAK or CRC mismatch.
    fn read_block(&mut self, block: u8) -> Result<[u8; TAG_BLOCK_SIZE]>;

    /// Stop encryption and put the card to sleep (HLTA).
    ///
    /// # Errors
    ///
    /// Returns an error if the bus transaction fails.
    fn halt(&mut self) -> Result<()>;
}

/// On-chip flash.
pub trait FlashDevice {
    /// Copy bytes starting at `offset` into `buf`.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is outside the device.
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<()>;

    /// Erase the sector starting at `offset` to `0xFF`.
    ///
    /// # Errors
    ///
    /// Returns an error if `offset` is not sector aligned or the erase fails.
    fn erase_sector(&mut self, offset: u32) -> Result<()>;

    /// Program one page at `offset`. The page must have been erased.
    ///
    /// # Errors
    ///
    /// Returns an error if `offset` is not page aligned or programming fails.
    fn write_page(&mut self, offset: u32, page: &FlashPage) -> Result<()>;
}

/// RGB status LED.
pub trait StatusLed {
    fn set_color(&mut self, color: LedColor);
}

/// Character LCD.
pub trait TextDisplay {
    /// Replace the contents of `line` (0-based) with `text`.
    ///
    /// # Errors
    ///
    /// Returns an error if the line does not exist or the bus fails.
    fn write_line(&mut self, line: usize, text: &str) -> Result<()>;
}

/// Monotonic millisecond clock.
pub trait Clock {
    fn now(&self) -> Millis;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> Millis {
        (**self).now()
    }
}

//! Transport framing helpers for the two MFRC522 host interfaces.
//!
//! The chip was wired over I2C on some board revisions and SPI on others;
//! drivers for both end up behind [`RegisterBus`](tagstock_hardware::RegisterBus).

pub use tagstock_core::constants::MFRC522_I2C_ADDRESS as I2C_ADDRESS;

/// SPI address byte for a register access: `R/W | address << 1 | 0`.
///
/// # Examples
///
/// ```
/// use tagstock_rfid::bus::spi_address;
///
/// assert_eq!(spi_address(0x37, true), 0xEE);
/// assert_eq!(spi_address(0x01, false), 0x02);
/// ```
#[must_use]
pub const fn spi_address(reg: u8, read: bool) -> u8 {
    let address = (reg << 1) & 0x7E;
    if read { address | 0x80 } else { address }
}

/// Bytes written for an I2C register write: register number, then data.
#[must_use]
pub const fn i2c_write_frame(reg: u8, value: u8) -> [u8; 2] {
    [reg & 0x3F, value]
}

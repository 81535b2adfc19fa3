//! MFRC522 register map and PCD commands (datasheet chapter 9 and 10).
//!
//! Addresses are the unshifted 6-bit register numbers; the transport applies
//! the SPI address-byte shift itself (see [`crate::bus`]).

// Page 0: command and status
pub const COMMAND: u8 = 0x01;
pub const COM_IEN: u8 = 0x02;
pub const COM_IRQ: u8 = 0x04;
pub const DIV_IRQ: u8 = 0x05;
pub const ERROR: u8 = 0x06;
pub const STATUS2: u8 = 0x08;
pub const FIFO_DATA: u8 = 0x09;
pub const FIFO_LEVEL: u8 = 0x0A;
pub const CONTROL: u8 = 0x0C;
pub const BIT_FRAMING: u8 = 0x0D;
pub const COLL: u8 = 0x0E;

// Page 1: communication
pub const MODE: u8 = 0x11;
pub const TX_CONTROL: u8 = 0x14;
pub const TX_ASK: u8 = 0x15;

// Page 2: configuration
pub const CRC_RESULT_H: u8 = 0x21;
pub const CRC_RESULT_L: u8 = 0x22;
pub const MOD_WIDTH: u8 = 0x24;
pub const T_MODE: u8 = 0x2A;
pub const T_PRESCALER: u8 = 0x2B;
pub const T_RELOAD_H: u8 = 0x2C;
pub const T_RELOAD_L: u8 = 0x2D;

// Page 3: test
pub const VERSION: u8 = 0x37;

/// PCD commands written to `CommandReg`.
pub mod command {
    pub const IDLE: u8 = 0x00;
    pub const CALC_CRC: u8 = 0x03;
    pub const TRANSCEIVE: u8 = 0x0C;
    pub const MF_AUTHENT: u8 = 0x0E;
    pub const SOFT_RESET: u8 = 0x0F;
}

/// `CommandReg` bit set while the analog part is powered down.
pub const POWER_DOWN: u8 = 0x10;

/// `ComIrqReg` bits.
pub mod irq {
    pub const TIMER: u8 = 0x01;
    pub const IDLE: u8 = 0x10;
    pub const RX: u8 = 0x20;
    /// Write mask clearing every request bit.
    pub const CLEAR_ALL: u8 = 0x7F;
}

/// `DivIrqReg` CRC-done bit.
pub const CRC_IRQ: u8 = 0x04;

/// `ErrorReg` bits.
pub mod error_bits {
    pub const PROTOCOL: u8 = 0x01;
    pub const PARITY: u8 = 0x02;
    pub const COLLISION: u8 = 0x08;
    pub const BUFFER_OVERFLOW: u8 = 0x10;
    /// Errors that make a response unusable.
    pub const FATAL: u8 = BUFFER_OVERFLOW | PARITY | PROTOCOL;
}

/// `FIFOLevelReg` flush bit.
pub const FLUSH_BUFFER: u8 = 0x80;
/// `BitFramingReg` start-send bit.
pub const START_SEND: u8 = 0x80;
/// `CollReg` bit that clears received bits after a collision when set to 0.
pub const VALUES_AFTER_COLL: u8 = 0x80;
/// `Status2Reg` bit set while Crypto1 is active.
pub const MF_CRYPTO1_ON: u8 = 0x08;
/// `ControlReg` mask of valid bits in the last received byte.
pub const RX_LAST_BITS: u8 = 0x07;
/// `TxControlReg` bits driving TX1 and TX2.
pub const ANTENNA_ON: u8 = 0x03;

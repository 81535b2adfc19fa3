//! MFRC522 driver and RFID tag acquisition.
//!
//! - [`pcd`]: register-level driver for the MFRC522 proximity coupling device,
//!   implementing [`TagReader`](tagstock_hardware::TagReader) over any
//!   [`RegisterBus`](tagstock_hardware::RegisterBus). Every wait on the chip
//!   is a deadline-checked busy loop.
//! - [`picc`] and [`registers`]: ISO14443A / MIFARE command set and register
//!   map.
//! - [`payload`]: layout of the data block carried by Admin, Clerk and User
//!   tags.
//! - [`acquisition`]: the `Idle → Polling → Authenticating → Reading →
//!   Present` state machine run by the dispatcher on every poll tick.

pub mod acquisition;
pub mod bus;
pub mod error;
pub mod payload;
pub mod pcd;
pub mod picc;
pub mod registers;

pub use acquisition::{AcquisitionState, TagAcquisition, TagSession};
pub use error::{Result, RfidError};
pub use payload::{decode_block, encode_block};
pub use pcd::Pcd;

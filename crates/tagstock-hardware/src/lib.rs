//! Peripheral abstraction layer for the tagstock inventory terminal.
//!
//! The event-driven control core never touches registers directly. It talks to
//! the board through the narrow traits in [`traits`]:
//!
//! - [`KeyMatrix`]: read the 4x4 matrix lines and switch which side senses
//!   (rows vs columns).
//! - [`RegisterBus`]: byte-wide register access to the MFRC522 over I2C or SPI.
//! - [`TagReader`]: ISO14443A/MIFARE operations (poll, select, authenticate,
//!   read block, halt).
//! - [`FlashDevice`]: read, sector erase and page program.
//! - [`StatusLed`] and [`TextDisplay`]: user feedback.
//! - [`Clock`]: monotonic milliseconds for alarms and busy-wait deadlines.
//!
//! # Design Philosophy
//!
//! - **Blocking, not async**: there is no scheduler beneath the dispatcher, so
//!   every call returns when the hardware is done. Bounded waits are
//!   deadline-checked loops against a [`Clock`].
//! - **Allocation-free**: UIDs, pages and blocks are fixed-size arrays or
//!   `heapless` buffers.
//! - **Error-aware**: fallible operations return [`Result<T>`] with a
//!   [`HardwareError`].
//!
//! # Example
//!
//! ```
//! use tagstock_core::LedColor;
//! use tagstock_hardware::mock::MockLed;
//! use tagstock_hardware::traits::StatusLed;
//!
//! let (mut led, handle) = MockLed::new();
//! led.set_color(LedColor::Green);
//! assert_eq!(handle.color(), LedColor::Green);
//! ```
//!
//! # Mock Implementations
//!
//! The [`mock`] module provides simulated peripherals with cloneable handles,
//! used by the unit tests, the end-to-end tests and the host simulator.
//!
//! [`KeyMatrix`]: traits::KeyMatrix
//! [`RegisterBus`]: traits::RegisterBus
//! [`TagReader`]: traits::TagReader
//! [`FlashDevice`]: traits::FlashDevice
//! [`StatusLed`]: traits::StatusLed
//! [`TextDisplay`]: traits::TextDisplay
//! [`Clock`]: traits::Clock

pub mod error;
pub mod mock;
pub mod time;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use time::{Alarm, Millis};
pub use traits::{
    Clock, FlashDevice, KeyMatrix, RegisterBus, StatusLed, TagReader, TextDisplay,
};
pub use types::{FlashPage, MatrixSnapshot, MifareKey, Uid};

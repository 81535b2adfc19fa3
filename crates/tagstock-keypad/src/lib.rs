//! Interrupt-driven 4x4 keypad scanning and debouncing.
//!
//! A press is handled in two interrupt phases:
//!
//! 1. While the matrix is *column-sensing*, an edge on a column line makes the
//!    [`KeypadState`] capture both line masks, decode them to a [`Key`] and
//!    flip the matrix to *row-sensing*.
//! 2. The [`DebounceEngine`] then re-samples the rows every period until they
//!    read clear, at which point the matrix goes back to column-sensing and
//!    the decoded key becomes available through [`KeypadState::take_key`].
//!
//! Handlers only sample lines and arm alarms; nothing here blocks.
//!
//! # Example
//!
//! ```
//! use tagstock_core::Key;
//! use tagstock_hardware::Millis;
//! use tagstock_hardware::mock::MockKeyMatrix;
//! use tagstock_keypad::KeypadState;
//!
//! let (mut matrix, finger) = MockKeyMatrix::new();
//! let mut keypad = KeypadState::new(100);
//!
//! finger.press(Key::Digit(7));
//! keypad.on_column_edge(&mut matrix, Millis(0));
//! finger.release();
//!
//! assert!(keypad.on_debounce_timer(&mut matrix, Millis(100)));
//! assert_eq!(keypad.take_key(), Some(Key::Digit(7)));
//! ```
//!
//! [`Key`]: tagstock_core::Key

pub mod debounce;
pub mod scanner;

pub use debounce::{DebounceEngine, DebounceOutcome};
pub use scanner::{KeypadState, ScanPhase, decode};

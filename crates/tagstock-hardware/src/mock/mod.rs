//! Mock peripheral implementations for testing and development.
//!
//! Each mock comes with a cloneable handle sharing its state, so a test or the
//! host simulator can act on the "physical world" (press a key, present a tag,
//! read back the LED) while the control core owns the peripheral itself.

pub mod clock;
pub mod display;
pub mod flash;
pub mod keypad;
pub mod led;
pub mod rfid;

use std::sync::{Mutex, MutexGuard, PoisonError};

// Re-export commonly used types
pub use clock::MockClock;
pub use display::{MockDisplay, MockDisplayHandle};
pub use flash::{MockFlash, MockFlashHandle};
pub use keypad::{MockKeyMatrix, MockKeyMatrixHandle, SenseMode};
pub use led::{MockLed, MockLedHandle};
pub use rfid::{MockTag, MockTagReader, MockTagReaderHandle, ReaderFault};

/// Lock shared mock state, ignoring poisoning from a panicked test thread.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

//! Mock character LCD.

use std::sync::{Arc, Mutex};

use tagstock_core::constants::{LCD_COLUMNS, LCD_LINES};

use super::lock;
use crate::error::{HardwareError, Result};
use crate::traits::TextDisplay;

#[derive(Debug, Default)]
struct DisplayState {
    lines: [String; LCD_LINES],
    writes: usize,
}

/// Mock 2x16 LCD.
///
/// Text longer than a line is truncated like the real controller would
/// drop characters past the visible DDRAM window.
#[derive(Debug)]
pub struct MockDisplay {
    state: Arc<Mutex<DisplayState>>,
}

impl MockDisplay {
    pub fn new() -> (Self, MockDisplayHandle) {
        let state = Arc::new(Mutex::new(DisplayState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockDisplayHandle { state },
        )
    }
}

impl TextDisplay for MockDisplay {
    fn write_line(&mut self, line: usize, text: &str) -> Result<()> {
        let mut state = lock(&self.state);
        let slot = state
            .lines
            .get_mut(line)
            .ok_or_else(|| HardwareError::invalid_data(format!("LCD has no line {line}")))?;
        *slot = text.chars().take(LCD_COLUMNS).collect();
        state.writes += 1;
        Ok(())
    }
}

/// Handle for reading back what the mock LCD shows.
#[derive(Debug, Clone)]
pub struct MockDisplayHandle {
    state: Arc<Mutex<DisplayState>>,
}

impl MockDisplayHandle {
    pub fn line(&self, line: usize) -> String {
        lock(&self.state).lines.get(line).cloned().unwrap_or_default()
    }

    pub fn lines(&self) -> [String; LCD_LINES] {
        lock(&self.state).lines.clone()
    }

    /// Number of `write_line` calls so far.
    pub fn writes(&self) -> usize {
        lock(&self.state).writes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_truncate() {
        let (mut display, handle) = MockDisplay::new();
        display.write_line(0, "hello").unwrap();
        display.write_line(1, "0123456789ABCDEFGHIJ").unwrap();

        assert_eq!(handle.line(0), "hello");
        assert_eq!(handle.line(1), "0123456789ABCDEF");
        assert_eq!(handle.writes(), 2);
    }

    #[test]
    fn test_write_out_of_range_line() {
        let (mut display, _handle) = MockDisplay::new();
        assert!(display.write_line(2, "x").is_err());
    }
}

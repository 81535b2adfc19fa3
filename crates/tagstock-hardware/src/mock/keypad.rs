//! Mock 4x4 key matrix.

use std::sync::{Arc, Mutex};

use tagstock_core::Key;

use super::lock;
use crate::traits::KeyMatrix;

/// Which side of the matrix is currently armed for interrupts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SenseMode {
    /// Rows driven, waiting for a column edge.
    #[default]
    Columns,
    /// Columns driven, level-sensing the rows.
    Rows,
}

#[derive(Debug, Default)]
struct MatrixState {
    rows: u8,
    columns: u8,
    mode: SenseMode,
    mode_switches: usize,
}

/// Mock key matrix.
///
/// A pressed key raises the bit of its row and of its column, so several
/// pressed keys produce the ambiguous masks a real matrix would.
///
/// # Examples
///
/// ```
/// use tagstock_core::Key;
/// use tagstock_hardware::KeyMatrix;
/// use tagstock_hardware::mock::MockKeyMatrix;
///
/// let (matrix, handle) = MockKeyMatrix::new();
/// handle.press(Key::Digit(5));
/// assert_eq!(matrix.read_rows(), 0b0010);
/// assert_eq!(matrix.read_columns(), 0b0010);
/// ```
#[derive(Debug)]
pub struct MockKeyMatrix {
    state: Arc<Mutex<MatrixState>>,
}

impl MockKeyMatrix {
    pub fn new() -> (Self, MockKeyMatrixHandle) {
        let state = Arc::new(Mutex::new(MatrixState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockKeyMatrixHandle { state },
        )
    }
}

impl KeyMatrix for MockKeyMatrix {
    fn read_rows(&self) -> u8 {
        lock(&self.state).rows
    }

    fn read_columns(&self) -> u8 {
        lock(&self.state).columns
    }

    fn sense_rows(&mut self) {
        let mut state = lock(&self.state);
        state.mode = SenseMode::Rows;
        state.mode_switches += 1;
    }

    fn sense_columns(&mut self) {
        let mut state = lock(&self.state);
        state.mode = SenseMode::Columns;
        state.mode_switches += 1;
    }
}

/// Handle acting as the user's finger on the mock matrix.
#[derive(Debug, Clone)]
pub struct MockKeyMatrixHandle {
    state: Arc<Mutex<MatrixState>>,
}

impl MockKeyMatrixHandle {
    /// Hold `key` down. Keys without a matrix position are ignored.
    pub fn press(&self, key: Key) {
        if let Some((row, column)) = key.position() {
            let mut state = lock(&self.state);
            state.rows |= 1 << row;
            state.columns |= 1 << column;
        }
    }

    /// Set raw line levels, for bounce and ghosting scenarios.
    pub fn set_lines(&self, rows: u8, columns: u8) {
        let mut state = lock(&self.state);
        state.rows = rows & 0x0F;
        state.columns = columns & 0x0F;
    }

    /// Release every key.
    pub fn release(&self) {
        let mut state = lock(&self.state);
        state.rows = 0;
        state.columns = 0;
    }

    pub fn sense_mode(&self) -> SenseMode {
        lock(&self.state).mode
    }

    pub fn mode_switches(&self) -> usize {
        lock(&self.state).mode_switches
    }
}

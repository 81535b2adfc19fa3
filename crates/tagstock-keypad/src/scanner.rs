//! Matrix capture and key decoding.

use tagstock_core::{KEYPAD_LAYOUT, Key};
use tagstock_hardware::{KeyMatrix, MatrixSnapshot, Millis};
use tracing::{debug, trace};

use crate::debounce::{DebounceEngine, DebounceOutcome};

/// Which side of the matrix currently raises interrupts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanPhase {
    /// Idle: rows driven, waiting for a column edge.
    #[default]
    ColumnsArmed,
    /// A press was captured; rows are sensed until release.
    RowsArmed,
}

/// Decode a row/column snapshot into a key.
///
/// Exactly one row bit and one column bit must be set. Anything else (no key,
/// two keys, ghosting) yields `None`.
///
/// # Examples
///
/// ```
/// use tagstock_core::Key;
/// use tagstock_hardware::MatrixSnapshot;
/// use tagstock_keypad::decode;
///
/// let snapshot = MatrixSnapshot { rows: 0b1000, columns: 0b1000 };
/// assert_eq!(decode(snapshot), Some(Key::Finish));
/// assert_eq!(decode(MatrixSnapshot { rows: 0b0011, columns: 0b0001 }), None);
/// ```
#[must_use]
pub fn decode(snapshot: MatrixSnapshot) -> Option<Key> {
    let rows = snapshot.rows & 0x0F;
    let columns = snapshot.columns & 0x0F;
    if rows.count_ones() != 1 || columns.count_ones() != 1 {
        return None;
    }
    let code = KEYPAD_LAYOUT[rows.trailing_zeros() as usize][columns.trailing_zeros() as usize];
    Key::from_code(code).ok()
}

/// Keypad scanner state.
///
/// Holds at most one key: the candidate captured on the column edge, which
/// becomes the ready key once the debounce cycle settles. Edges arriving while
/// a cycle is open only restart the debounce timer.
#[derive(Debug, Clone)]
pub struct KeypadState {
    phase: ScanPhase,
    debounce: DebounceEngine,
    raw: MatrixSnapshot,
    candidate: Option<Key>,
    ready: Option<Key>,
}

impl KeypadState {
    #[must_use]
    pub const fn new(debounce_ms: u64) -> Self {
        Self {
            phase: ScanPhase::ColumnsArmed,
            debounce: DebounceEngine::new(debounce_ms),
            raw: MatrixSnapshot { rows: 0, columns: 0 },
            candidate: None,
            ready: None,
        }
    }

    /// Column edge interrupt.
    pub fn on_column_edge<M: KeyMatrix>(&mut self, matrix: &mut M, now: Millis) {
        if self.phase == ScanPhase::RowsArmed {
            // bounce on the column side of a press already captured
            self.debounce.trigger(now);
            return;
        }

        self.raw = matrix.read();
        self.candidate = decode(self.raw);
        trace!(
            rows = self.raw.rows,
            columns = self.raw.columns,
            key = ?self.candidate,
            "keypad capture"
        );

        matrix.sense_rows();
        self.phase = ScanPhase::RowsArmed;
        self.debounce.trigger(now);
    }

    /// Row level interrupt while row-sensing.
    pub fn on_row_edge(&mut self, now: Millis) {
        if self.phase == ScanPhase::RowsArmed {
            self.debounce.trigger(now);
        }
    }

    /// Debounce alarm. Returns `true` when a key became ready.
    pub fn on_debounce_timer<M: KeyMatrix>(&mut self, matrix: &mut M, now: Millis) -> bool {
        match self.debounce.expire(now, matrix.read_rows()) {
            DebounceOutcome::Idle | DebounceOutcome::Waiting => false,
            DebounceOutcome::Held => {
                trace!(restarts = self.debounce.restarts(), "key still held");
                false
            }
            DebounceOutcome::Settled => {
                matrix.sense_columns();
                self.phase = ScanPhase::ColumnsArmed;
                match self.candidate.take() {
                    Some(key) => {
                        debug!(%key, "key ready");
                        self.ready = Some(key);
                        true
                    }
                    None => {
                        debug!(
                            rows = self.raw.rows,
                            columns = self.raw.columns,
                            "ambiguous keypad capture dropped"
                        );
                        false
                    }
                }
            }
        }
    }

    /// Take the debounced key, leaving the slot empty.
    pub fn take_key(&mut self) -> Option<Key> {
        self.ready.take()
    }

    #[must_use]
    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    /// Last raw capture.
    #[must_use]
    pub fn raw(&self) -> MatrixSnapshot {
        self.raw
    }

    #[must_use]
    pub fn is_debouncing(&self) -> bool {
        self.debounce.is_active()
    }

    /// Deadline of the debounce alarm, if armed.
    #[must_use]
    pub fn deadline(&self) -> Option<Millis> {
        self.debounce.deadline()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tagstock_hardware::mock::{MockKeyMatrix, SenseMode};

    use super::*;

    #[rstest]
    #[case(0b0001, 0b0001, Some(Key::Digit(1)))]
    #[case(0b0001, 0b1000, Some(Key::A))]
    #[case(0b0010, 0b1000, Some(Key::B))]
    #[case(0b0100, 0b1000, Some(Key::C))]
    #[case(0b1000, 0b0001, Some(Key::Reset))]
    #[case(0b1000, 0b0010, Some(Key::Digit(0)))]
    #[case(0b1000, 0b0100, Some(Key::Hash))]
    #[case(0b1000, 0b1000, Some(Key::Finish))]
    #[case(0b0000, 0b0001, None)]
    #[case(0b0001, 0b0000, None)]
    #[case(0b0011, 0b0001, None)]
    #[case(0b0001, 0b0110, None)]
    fn test_decode(#[case] rows: u8, #[case] columns: u8, #[case] expected: Option<Key>) {
        assert_eq!(decode(MatrixSnapshot { rows, columns }), expected);
    }

    #[test]
    fn test_every_key_decodes_from_its_position() {
        for code in 0..=0xF {
            let key = Key::from_code(code).unwrap();
            let (row, column) = key.position().unwrap();
            let snapshot = MatrixSnapshot {
                rows: 1 << row,
                columns: 1 << column,
            };
            assert_eq!(decode(snapshot), Some(key));
        }
    }

    #[test]
    fn test_press_release_cycle() {
        let (mut matrix, finger) = MockKeyMatrix::new();
        let mut keypad = KeypadState::new(100);

        finger.press(Key::Digit(4));
        keypad.on_column_edge(&mut matrix, Millis(0));
        assert_eq!(keypad.phase(), ScanPhase::RowsArmed);
        assert_eq!(finger.sense_mode(), SenseMode::Rows);

        // still held at first expiry
        assert!(!keypad.on_debounce_timer(&mut matrix, Millis(100)));
        assert_eq!(keypad.take_key(), None);

        finger.release();
        assert!(!keypad.on_debounce_timer(&mut matrix, Millis(150)));
        assert!(keypad.on_debounce_timer(&mut matrix, Millis(200)));
        assert_eq!(finger.sense_mode(), SenseMode::Columns);
        assert_eq!(keypad.take_key(), Some(Key::Digit(4)));
        assert_eq!(keypad.take_key(), None);
    }

    #[test]
    fn test_edges_during_cycle_fold_into_candidate() {
        let (mut matrix, finger) = MockKeyMatrix::new();
        let mut keypad = KeypadState::new(100);

        finger.press(Key::A);
        keypad.on_column_edge(&mut matrix, Millis(0));
        finger.release();
        finger.press(Key::Digit(9));
        keypad.on_column_edge(&mut matrix, Millis(30));
        keypad.on_row_edge(Millis(50));
        finger.release();

        assert!(!keypad.on_debounce_timer(&mut matrix, Millis(100)));
        assert!(keypad.on_debounce_timer(&mut matrix, Millis(150)));
        assert_eq!(keypad.take_key(), Some(Key::A));
    }

    #[test]
    fn test_ambiguous_press_dropped() {
        let (mut matrix, finger) = MockKeyMatrix::new();
        let mut keypad = KeypadState::new(100);

        finger.press(Key::Digit(1));
        finger.press(Key::Digit(5));
        keypad.on_column_edge(&mut matrix, Millis(0));
        finger.release();

        assert!(!keypad.on_debounce_timer(&mut matrix, Millis(100)));
        assert_eq!(keypad.phase(), ScanPhase::ColumnsArmed);
        assert_eq!(keypad.take_key(), None);
    }

    #[test]
    fn test_row_edge_ignored_when_idle() {
        let mut keypad = KeypadState::new(100);
        keypad.on_row_edge(Millis(10));
        assert!(!keypad.is_debouncing());
        assert_eq!(keypad.deadline(), None);
    }
}

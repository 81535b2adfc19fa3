//! Property-based tests for the keypad debounce cycle.
//!
//! A press is modelled as a hold time plus a list of bounce instants inside
//! it. The driver advances time one millisecond at a time.

use proptest::prelude::*;
use tagstock_core::Key;
use tagstock_hardware::Millis;
use tagstock_hardware::mock::MockKeyMatrix;
use tagstock_keypad::KeypadState;

const PERIOD_MS: u64 = 100;

/// Strategy for keys present on the matrix.
fn any_key() -> impl Strategy<Value = Key> {
    (0u8..=0xF).prop_map(|code| Key::from_code(code).unwrap())
}

/// Strategy for a press: hold time and bounce instants relative to the press.
fn press() -> impl Strategy<Value = (u64, Vec<u64>)> {
    (1u64..600).prop_flat_map(|hold| (Just(hold), prop::collection::vec(0..hold, 0..8)))
}

/// Run one press/release cycle, returning the keys made ready and whether
/// any fired while the key was down.
fn run_cycle(key: Key, hold: u64, mut bounces: Vec<u64>) -> (Vec<Key>, bool) {
    let (mut matrix, finger) = MockKeyMatrix::new();
    let mut keypad = KeypadState::new(PERIOD_MS);
    bounces.sort_unstable();

    finger.press(key);
    keypad.on_column_edge(&mut matrix, Millis(0));

    let mut ready = Vec::new();
    let mut fired_while_held = false;
    let mut t = 0;
    let end = hold + 4 * PERIOD_MS;
    while t <= end {
        if t == hold {
            finger.release();
        }
        for _ in bounces.iter().filter(|&&b| b == t) {
            keypad.on_row_edge(Millis(t));
        }
        if keypad.on_debounce_timer(&mut matrix, Millis(t)) {
            fired_while_held |= t < hold;
            ready.extend(keypad.take_key());
        }
        t += 1;
    }
    (ready, fired_while_held)
}

proptest! {
    /// Property: exactly one key-ready per press/release, never while held.
    #[test]
    fn prop_one_event_per_cycle(key in any_key(), (hold, bounces) in press()) {
        let (ready, fired_while_held) = run_cycle(key, hold, bounces);

        prop_assert!(!fired_while_held);
        prop_assert_eq!(ready, vec![key]);
    }

    /// Property: the event is never earlier than one full period after the
    /// last activity.
    #[test]
    fn prop_settles_after_release(key in any_key(), hold in 1u64..400) {
        let (mut matrix, finger) = MockKeyMatrix::new();
        let mut keypad = KeypadState::new(PERIOD_MS);

        finger.press(key);
        keypad.on_column_edge(&mut matrix, Millis(0));

        let mut settled_at = None;
        for t in 0..=(hold + 3 * PERIOD_MS) {
            if t == hold {
                finger.release();
            }
            if keypad.on_debounce_timer(&mut matrix, Millis(t)) {
                settled_at = Some(t);
                break;
            }
        }

        let settled_at = settled_at.unwrap();
        prop_assert!(settled_at >= hold);
        prop_assert!(settled_at >= PERIOD_MS);
        prop_assert!(settled_at < hold + 2 * PERIOD_MS);
    }
}

//! Mock RGB status LED.

use std::sync::{Arc, Mutex};

use tagstock_core::LedColor;

use super::lock;
use crate::traits::StatusLed;

#[derive(Debug, Default)]
struct LedState {
    color: LedColor,
    history: Vec<LedColor>,
}

/// Mock status LED recording every color it was set to.
#[derive(Debug)]
pub struct MockLed {
    state: Arc<Mutex<LedState>>,
}

impl MockLed {
    /// Create a new mock LED and its inspection handle.
    pub fn new() -> (Self, MockLedHandle) {
        let state = Arc::new(Mutex::new(LedState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockLedHandle { state },
        )
    }
}

impl StatusLed for MockLed {
    fn set_color(&mut self, color: LedColor) {
        let mut state = lock(&self.state);
        state.color = color;
        state.history.push(color);
    }
}

/// Handle for inspecting a mock LED.
#[derive(Debug, Clone)]
pub struct MockLedHandle {
    state: Arc<Mutex<LedState>>,
}

impl MockLedHandle {
    /// Color currently driven.
    pub fn color(&self) -> LedColor {
        lock(&self.state).color
    }

    /// Every color set so far, including `Off`.
    pub fn history(&self) -> Vec<LedColor> {
        lock(&self.state).history.clone()
    }

    /// Last color other than `Off`.
    pub fn last_feedback(&self) -> Option<LedColor> {
        lock(&self.state)
            .history
            .iter()
            .rev()
            .copied()
            .find(|c| *c != LedColor::Off)
    }

    pub fn clear_history(&self) {
        lock(&self.state).history.clear();
    }
}

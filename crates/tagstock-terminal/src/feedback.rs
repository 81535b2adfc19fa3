//! Status LED feedback.
//!
//! A feedback color stays on for the hold period and then the LED goes dark.
//! Showing a new color while one is held replaces it and restarts the hold.

use tagstock_core::LedColor;
use tagstock_hardware::{Alarm, Millis, StatusLed};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedFeedback {
    alarm: Alarm,
    hold_ms: u64,
    color: LedColor,
}

impl LedFeedback {
    #[must_use]
    pub const fn new(hold_ms: u64) -> Self {
        Self {
            alarm: Alarm::new(),
            hold_ms,
            color: LedColor::Off,
        }
    }

    /// Light `color` and arm the auto-off alarm.
    pub fn show(&mut self, led: &mut impl StatusLed, color: LedColor, now: Millis) {
        led.set_color(color);
        self.color = color;
        if color == LedColor::Off {
            self.alarm.cancel();
        } else {
            self.alarm.arm(now, self.hold_ms);
        }
    }

    /// Alarm check for the timer interrupt. `true` once the hold is over.
    pub fn expire(&mut self, now: Millis) -> bool {
        self.alarm.fire(now)
    }

    /// Turn the LED off for an elapsed hold, unless a newer color has armed
    /// a fresh hold since the alarm fired. Returns `true` if it went dark.
    pub fn finish_hold(&mut self, led: &mut impl StatusLed) -> bool {
        if self.alarm.is_armed() {
            return false;
        }
        self.off(led);
        true
    }

    pub fn off(&mut self, led: &mut impl StatusLed) {
        led.set_color(LedColor::Off);
        self.color = LedColor::Off;
        self.alarm.cancel();
    }

    #[must_use]
    pub fn color(&self) -> LedColor {
        self.color
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Millis> {
        self.alarm.deadline()
    }
}

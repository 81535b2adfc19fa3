//! Timer-based contact debouncing.
//!
//! The engine owns one alarm. Any edge while a cycle is open pushes the
//! deadline out again, so a bouncing contact keeps extending the cycle instead
//! of queueing extra events. When the alarm expires the caller hands in a
//! fresh sample of the row lines: asserted rows restart the period, clear rows
//! settle the cycle.

use tagstock_hardware::{Alarm, Millis};

/// Result of feeding the debounce engine a timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceOutcome {
    /// No cycle is open.
    Idle,
    /// The period has not elapsed yet.
    Waiting,
    /// The period elapsed but the key is still down; the timer was restarted.
    Held,
    /// The lines read clear after a full period; the cycle is closed.
    Settled,
}

/// Single-cycle debounce timer.
#[derive(Debug, Clone)]
pub struct DebounceEngine {
    alarm: Alarm,
    period_ms: u64,
    active: bool,
    restarts: u32,
}

impl DebounceEngine {
    #[must_use]
    pub const fn new(period_ms: u64) -> Self {
        Self {
            alarm: Alarm::new(),
            period_ms,
            active: false,
            restarts: 0,
        }
    }

    /// Open a cycle, or restart the timer of the cycle already open.
    pub fn trigger(&mut self, now: Millis) {
        if self.active {
            self.restarts = self.restarts.saturating_add(1);
        } else {
            self.active = true;
            self.restarts = 0;
        }
        self.alarm.arm(now, self.period_ms);
    }

    /// Timer tick with the current row lines (low nibble).
    pub fn expire(&mut self, now: Millis, rows: u8) -> DebounceOutcome {
        if !self.active {
            return DebounceOutcome::Idle;
        }
        if !self.alarm.fire(now) {
            return DebounceOutcome::Waiting;
        }
        if rows & 0x0F != 0 {
            self.restarts = self.restarts.saturating_add(1);
            self.alarm.arm(now, self.period_ms);
            DebounceOutcome::Held
        } else {
            self.active = false;
            DebounceOutcome::Settled
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// When the next tick has work to do.
    #[must_use]
    pub fn deadline(&self) -> Option<Millis> {
        self.alarm.deadline()
    }

    /// Timer restarts in the current (or last) cycle.
    #[must_use]
    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    #[must_use]
    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_engine_ignores_ticks() {
        let mut engine = DebounceEngine::new(100);
        assert_eq!(engine.expire(Millis(500), 0), DebounceOutcome::Idle);
        assert!(!engine.is_active());
    }

    #[test]
    fn test_settles_after_full_period() {
        let mut engine = DebounceEngine::new(100);
        engine.trigger(Millis(0));

        assert_eq!(engine.expire(Millis(99), 0), DebounceOutcome::Waiting);
        assert_eq!(engine.expire(Millis(100), 0), DebounceOutcome::Settled);
        assert!(!engine.is_active());
        assert_eq!(engine.deadline(), None);
    }

    #[test]
    fn test_held_key_restarts_timer() {
        let mut engine = DebounceEngine::new(100);
        engine.trigger(Millis(0));

        assert_eq!(engine.expire(Millis(100), 0b0100), DebounceOutcome::Held);
        assert_eq!(engine.deadline(), Some(Millis(200)));
        assert_eq!(engine.expire(Millis(150), 0), DebounceOutcome::Waiting);
        assert_eq!(engine.expire(Millis(200), 0), DebounceOutcome::Settled);
        assert_eq!(engine.restarts(), 1);
    }

    #[test]
    fn test_retrigger_pushes_deadline() {
        let mut engine = DebounceEngine::new(100);
        engine.trigger(Millis(0));
        engine.trigger(Millis(60));

        assert_eq!(engine.expire(Millis(100), 0), DebounceOutcome::Waiting);
        assert_eq!(engine.expire(Millis(160), 0), DebounceOutcome::Settled);
    }

    #[test]
    fn test_unwired_row_bits_ignored() {
        let mut engine = DebounceEngine::new(10);
        engine.trigger(Millis(0));
        assert_eq!(engine.expire(Millis(10), 0xF0), DebounceOutcome::Settled);
    }
}

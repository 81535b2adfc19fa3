//! Monotonic time and one-shot hardware alarms.
//!
//! Alarms model the microcontroller's timer compare channels: a deadline that
//! the alarm interrupt checks against the current time. Periodic behavior is
//! obtained by re-arming from the handler, exactly like the hardware.

use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Milliseconds since boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Millis(pub u64);

impl Millis {
    pub const ZERO: Millis = Millis(0);

    #[inline]
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Elapsed time since `earlier`, zero if `earlier` is in the future.
    #[inline]
    #[must_use]
    pub fn saturating_since(self, earlier: Millis) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl Add<u64> for Millis {
    type Output = Millis;

    fn add(self, ms: u64) -> Millis {
        Millis(self.0.saturating_add(ms))
    }
}

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// A one-shot alarm.
///
/// # Examples
///
/// ```
/// use tagstock_hardware::{Alarm, Millis};
///
/// let mut alarm = Alarm::new();
/// alarm.arm(Millis(0), 100);
/// assert!(!alarm.fire(Millis(99)));
/// assert!(alarm.fire(Millis(100)));
/// // fired alarms disarm themselves
/// assert!(!alarm.fire(Millis(200)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Alarm {
    deadline: Option<Millis>,
}

impl Alarm {
    #[must_use]
    pub const fn new() -> Self {
        Self { deadline: None }
    }

    /// Arm (or re-arm) the alarm to expire `period_ms` after `now`.
    pub fn arm(&mut self, now: Millis, period_ms: u64) {
        self.deadline = Some(now + period_ms);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Millis> {
        self.deadline
    }

    /// Returns `true` exactly once when `now` reaches the deadline, disarming
    /// the alarm.
    pub fn fire(&mut self, now: Millis) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_arithmetic() {
        assert_eq!(Millis(10) + 5, Millis(15));
        assert_eq!(Millis(u64::MAX) + 1, Millis(u64::MAX));
        assert_eq!(Millis(50).saturating_since(Millis(20)), 30);
        assert_eq!(Millis(20).saturating_since(Millis(50)), 0);
    }

    #[test]
    fn test_alarm_unarmed_never_fires() {
        let mut alarm = Alarm::new();
        assert!(!alarm.is_armed());
        assert!(!alarm.fire(Millis(1_000_000)));
    }

    #[test]
    fn test_alarm_rearm_moves_deadline() {
        let mut alarm = Alarm::new();
        alarm.arm(Millis(0), 100);
        alarm.arm(Millis(80), 100);
        assert_eq!(alarm.deadline(), Some(Millis(180)));
        assert!(!alarm.fire(Millis(120)));
        assert!(alarm.fire(Millis(180)));
    }

    #[test]
    fn test_alarm_cancel() {
        let mut alarm = Alarm::new();
        alarm.arm(Millis(0), 10);
        alarm.cancel();
        assert!(!alarm.fire(Millis(10)));
    }
}

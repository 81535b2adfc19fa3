//! Mock monotonic clock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::time::Millis;
use crate::traits::Clock;

/// Manually driven clock.
///
/// Clones share the same time. With an auto step, every [`Clock::now`] call
/// advances time, which lets busy-wait loops reach their deadline in tests.
///
/// # Examples
///
/// ```
/// use tagstock_hardware::mock::MockClock;
/// use tagstock_hardware::{Clock, Millis};
///
/// let clock = MockClock::new();
/// clock.advance(250);
/// assert_eq!(clock.now(), Millis(250));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    now: Arc<AtomicU64>,
    step: u64,
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock that moves forward `step_ms` on every read.
    pub fn with_auto_step(step_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(0)),
            step: step_ms,
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::Relaxed);
    }

    pub fn set(&self, at: Millis) {
        self.now.store(at.as_u64(), Ordering::Relaxed);
    }
}

impl Clock for MockClock {
    fn now(&self) -> Millis {
        Millis(self.now.fetch_add(self.step, Ordering::Relaxed))
    }
}

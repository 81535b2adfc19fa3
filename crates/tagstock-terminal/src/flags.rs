//! Pending-work flags shared between interrupt handlers and the dispatcher.
//!
//! Handlers only ever set bits; the dispatcher clears a bit right before doing
//! the matching work. Both sides go through atomics, so a handler re-raising a
//! bit in the middle of a dispatcher pass is never lost.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// One named bit of the flag word.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Flag(u8);

impl Flag {
    /// A debounced key is waiting in the keypad state.
    pub const KEY_READY: Flag = Flag(1 << 0);
    /// The reader IRQ pin requested an immediate poll
    /// (switch from tag detection to tag acquisition).
    pub const TAG_IRQ: Flag = Flag(1 << 1);
    /// The periodic poll tick elapsed.
    pub const TAG_POLL: Flag = Flag(1 << 2);
    /// A tag was read and its session can be opened.
    pub const TAG_READY: Flag = Flag(1 << 3);
    /// Time to show the next LCD frame.
    pub const SHOW_INVENTORY: Flag = Flag(1 << 4);
    /// The status LED hold time elapsed.
    pub const LED_EXPIRED: Flag = Flag(1 << 5);

    /// All flags in dispatcher priority order.
    pub const PRIORITY: [Flag; 6] = [
        Flag::KEY_READY,
        Flag::TAG_IRQ,
        Flag::TAG_POLL,
        Flag::TAG_READY,
        Flag::SHOW_INVENTORY,
        Flag::LED_EXPIRED,
    ];

    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    fn name(self) -> &'static str {
        match self {
            Flag::KEY_READY => "key-ready",
            Flag::TAG_IRQ => "tag-irq",
            Flag::TAG_POLL => "tag-poll",
            Flag::TAG_READY => "tag-ready",
            Flag::SHOW_INVENTORY => "show-inventory",
            Flag::LED_EXPIRED => "led-expired",
            _ => "unknown",
        }
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The pending-flags word.
///
/// # Examples
///
/// ```
/// use tagstock_terminal::{Flag, PendingFlags};
///
/// static FLAGS: PendingFlags = PendingFlags::new();
///
/// FLAGS.raise(Flag::KEY_READY);
/// assert!(FLAGS.is_set(Flag::KEY_READY));
/// FLAGS.clear(Flag::KEY_READY);
/// assert!(!FLAGS.any());
/// ```
#[derive(Default)]
pub struct PendingFlags(AtomicU8);

impl PendingFlags {
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    /// Set `flag`. Called from interrupt context.
    #[inline]
    pub fn raise(&self, flag: Flag) {
        self.0.fetch_or(flag.0, Ordering::Release);
    }

    #[inline]
    #[must_use]
    pub fn is_set(&self, flag: Flag) -> bool {
        self.0.load(Ordering::Acquire) & flag.0 != 0
    }

    /// Clear `flag` before handling it. Dispatcher only.
    #[inline]
    pub fn clear(&self, flag: Flag) {
        self.0.fetch_and(!flag.0, Ordering::AcqRel);
    }

    /// Whether any work is pending.
    #[inline]
    #[must_use]
    pub fn any(&self) -> bool {
        self.0.load(Ordering::Acquire) != 0
    }

    /// Raw word, for diagnostics.
    #[must_use]
    pub fn bits(&self) -> u8 {
        self.0.load(Ordering::Acquire)
    }

    /// Highest-priority pending flag.
    #[must_use]
    pub fn next(&self) -> Option<Flag> {
        let bits = self.bits();
        Flag::PRIORITY.into_iter().find(|f| bits & f.0 != 0)
    }
}

impl fmt::Debug for PendingFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits = self.bits();
        f.debug_set()
            .entries(Flag::PRIORITY.iter().filter(|flag| bits & flag.0 != 0))
            .finish()
    }
}

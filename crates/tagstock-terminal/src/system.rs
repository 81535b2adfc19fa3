//! The owned system state and its dispatcher.
//!
//! [`SystemState`] holds every piece of mutable state in the terminal. The
//! `on_*` methods are the interrupt entry points: they sample lines, re-arm
//! alarms and raise [`PendingFlags`] bits, nothing else. [`SystemState::program`]
//! is the main-loop body that turns those bits into work.

use tagstock_core::{LedColor, Role};
use tagstock_hardware::{Alarm, FlashDevice, KeyMatrix, Millis, StatusLed, TagReader, TextDisplay};
use tagstock_keypad::KeypadState;
use tagstock_rfid::{AcquisitionState, TagAcquisition, TagSession};
use tagstock_storage::{InventoryLedger, LedgerError};
use tracing::{debug, info, warn};

use crate::config::TerminalConfig;
use crate::display::{DisplayRotation, Frame};
use crate::error::{Result, TerminalError};
use crate::feedback::LedFeedback;
use crate::flags::{Flag, PendingFlags};
use crate::roles::{Effect, RoleSession, transition};

/// Board peripherals owned by the system.
#[derive(Debug)]
pub struct Peripherals<M, R, L, D> {
    pub matrix: M,
    pub reader: R,
    pub led: L,
    pub display: D,
}

/// All mutable state of the terminal.
pub struct SystemState<M, R, F, L, D> {
    config: TerminalConfig,
    flags: PendingFlags,
    keypad: KeypadState,
    acquisition: TagAcquisition,
    /// Tag read by the last poll, waiting for `TAG_READY`.
    pending_tag: Option<TagSession>,
    /// Tag of the open role session.
    tag: Option<TagSession>,
    session: RoleSession,
    ledger: InventoryLedger<F>,
    feedback: LedFeedback,
    rotation: DisplayRotation,
    poll_alarm: Alarm,
    display_alarm: Alarm,
    peripherals: Peripherals<M, R, L, D>,
}

impl<M, R, F, L, D> SystemState<M, R, F, L, D>
where
    M: KeyMatrix,
    R: TagReader,
    F: FlashDevice,
    L: StatusLed,
    D: TextDisplay,
{
    /// Validate `config` and load the ledger from `flash`.
    ///
    /// # Errors
    ///
    /// Returns [`TerminalError::Config`] for an invalid configuration and
    /// [`TerminalError::Persistence`] if the ledger cannot be read.
    pub fn new(
        config: TerminalConfig,
        peripherals: Peripherals<M, R, L, D>,
        flash: F,
    ) -> Result<Self> {
        config.validate()?;
        let mut ledger = InventoryLedger::open(flash)?;
        ledger.set_capacity(config.capacity);

        Ok(Self {
            keypad: KeypadState::new(config.debounce_ms),
            acquisition: TagAcquisition::new(config.tag_block, config.tag_key),
            feedback: LedFeedback::new(config.led_hold_ms),
            config,
            flags: PendingFlags::new(),
            pending_tag: None,
            tag: None,
            session: RoleSession::None,
            ledger,
            rotation: DisplayRotation::new(),
            poll_alarm: Alarm::new(),
            display_alarm: Alarm::new(),
            peripherals,
        })
    }

    /// Arm the periodic alarms and start looking for tags.
    pub fn start(&mut self, now: Millis) {
        self.acquisition.start();
        self.poll_alarm.arm(now, self.config.tag_poll_ms);
        self.display_alarm.arm(now, self.config.display_tick_ms);
        self.flags.raise(Flag::SHOW_INVENTORY);
        info!(
            tag_poll_ms = self.config.tag_poll_ms,
            debounce_ms = self.config.debounce_ms,
            "terminal started"
        );
    }

    // Interrupt entry points.

    /// Keypad column edge.
    pub fn on_column_edge(&mut self, now: Millis) {
        self.keypad.on_column_edge(&mut self.peripherals.matrix, now);
    }

    /// Keypad row level change.
    pub fn on_row_edge(&mut self, now: Millis) {
        self.keypad.on_row_edge(now);
    }

    /// Reader IRQ pin edge. Ignored while a session is open.
    pub fn on_tag_irq(&mut self) {
        if self.acquisition.is_polling() {
            self.flags.raise(Flag::TAG_IRQ);
        }
    }

    /// Hardware alarm. Checks every deadline against `now`.
    pub fn on_timer(&mut self, now: Millis) {
        if self
            .keypad
            .on_debounce_timer(&mut self.peripherals.matrix, now)
        {
            self.flags.raise(Flag::KEY_READY);
        }
        if self.poll_alarm.fire(now) {
            self.poll_alarm.arm(now, self.config.tag_poll_ms);
            if self.acquisition.is_polling() {
                self.flags.raise(Flag::TAG_POLL);
            }
        }
        if self.feedback.expire(now) {
            self.flags.raise(Flag::LED_EXPIRED);
        }
        if self.display_alarm.fire(now) {
            self.display_alarm.arm(now, self.config.display_tick_ms);
            self.flags.raise(Flag::SHOW_INVENTORY);
        }
    }

    /// Earliest armed deadline, for programming the hardware alarm.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Millis> {
        [
            self.keypad.deadline(),
            self.poll_alarm.deadline(),
            self.feedback.deadline(),
            self.display_alarm.deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    // Dispatcher.

    /// Whether any work is pending.
    #[must_use]
    pub fn check(&self) -> bool {
        self.flags.any()
    }

    /// One dispatcher pass: handle every pending flag in priority order.
    ///
    /// Each bit is cleared immediately before its handler runs, and the
    /// handler always runs right after the clear within this call. An
    /// interrupt raising the same bit meanwhile is therefore kept for the
    /// next pass. Flags raised by a handler further down the order (a poll
    /// producing `TAG_READY`) are picked up in the same pass.
    pub fn program(&mut self, now: Millis) {
        for flag in Flag::PRIORITY {
            if !self.flags.is_set(flag) {
                continue;
            }
            self.flags.clear(flag);
            match flag {
                Flag::KEY_READY => self.handle_key(now),
                Flag::TAG_IRQ | Flag::TAG_POLL => self.poll_tag(now),
                Flag::TAG_READY => self.open_session(),
                Flag::SHOW_INVENTORY => self.show_inventory(),
                Flag::LED_EXPIRED => {
                    self.feedback.finish_hold(&mut self.peripherals.led);
                }
                _ => {}
            }
        }
    }

    /// Drain the flag word.
    pub fn run_pending(&mut self, now: Millis) {
        while self.check() {
            self.program(now);
        }
    }

    fn handle_key(&mut self, now: Millis) {
        let Some(key) = self.keypad.take_key() else {
            return;
        };
        let Some(role) = self.session.role() else {
            debug!(%key, "key outside a tag session ignored");
            return;
        };

        let session = std::mem::take(&mut self.session);
        let (next, effects) = transition(session, key, &self.config.admin_pin);
        debug!(%key, %role, session = ?next, "role input");
        self.session = next;

        for effect in effects {
            self.apply(effect, now);
        }
    }

    fn apply(&mut self, effect: Effect, now: Millis) {
        match effect {
            Effect::Feedback(color) => self.show(color, now),
            Effect::Reject(error) => self.reject(&error, now),
            Effect::ResetInventory => {
                let outcome = self.ledger.reset();
                self.ledger_outcome(outcome, LedColor::Blue, now);
            }
            Effect::SetField {
                product,
                field,
                value,
            } => {
                let outcome = self.ledger.set_field(product, field, value);
                self.ledger_outcome(outcome, LedColor::Green, now);
            }
            Effect::CommitIn(data) => {
                let outcome = self.ledger.commit_in(&data);
                self.ledger_outcome(outcome, LedColor::Green, now);
            }
            Effect::CommitOut(data) => {
                let outcome = self.ledger.commit_out(&data);
                self.ledger_outcome(outcome, LedColor::Green, now);
            }
            Effect::CloseSession => self.close_session(),
        }
    }

    fn ledger_outcome(
        &mut self,
        outcome: std::result::Result<(), LedgerError>,
        ok: LedColor,
        now: Millis,
    ) {
        match outcome {
            Ok(()) => self.show(ok, now),
            Err(error) => self.reject(&TerminalError::from(error), now),
        }
    }

    fn show(&mut self, color: LedColor, now: Millis) {
        self.feedback.show(&mut self.peripherals.led, color, now);
    }

    fn reject(&mut self, error: &TerminalError, now: Millis) {
        warn!(%error, "rejected");
        self.show(LedColor::Red, now);
    }

    fn poll_tag(&mut self, now: Millis) {
        match self.acquisition.poll(&mut self.peripherals.reader) {
            Ok(Some(tag)) => {
                self.pending_tag = Some(tag);
                self.flags.raise(Flag::TAG_READY);
            }
            Ok(None) => {}
            Err(error) => self.reject(&TerminalError::from(error), now),
        }
    }

    fn open_session(&mut self) {
        let Some(tag) = self.pending_tag.take() else {
            return;
        };
        self.session = RoleSession::open(&tag.payload);
        info!(uid = %tag.uid, role = %tag.payload.role(), "role session opened");
        if tag.payload.role() == Role::User {
            self.refresh_display();
        }
        self.tag = Some(tag);
    }

    fn close_session(&mut self) {
        self.session = RoleSession::None;
        if let Some(tag) = self.tag.take() {
            info!(uid = %tag.uid, "role session closed");
        }
        self.acquisition.release();
        self.refresh_display();
    }

    fn show_inventory(&mut self) {
        self.refresh_display();
        if !matches!(self.session, RoleSession::User(_)) {
            self.rotation.advance();
        }
    }

    fn refresh_display(&mut self) {
        let frame = match &self.session {
            RoleSession::User(data) => Frame::tag_box(data),
            _ => self.rotation.current(self.ledger.table(), &self.ledger.today()),
        };
        if let Err(error) = frame.render(&mut self.peripherals.display) {
            warn!(%error, "LCD update failed");
        }
    }

    // Accessors.

    #[must_use]
    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    #[must_use]
    pub fn flags(&self) -> &PendingFlags {
        &self.flags
    }

    #[must_use]
    pub fn session(&self) -> &RoleSession {
        &self.session
    }

    /// Tag of the open session.
    #[must_use]
    pub fn tag(&self) -> Option<&TagSession> {
        self.tag.as_ref()
    }

    #[must_use]
    pub fn acquisition_state(&self) -> AcquisitionState {
        self.acquisition.state()
    }

    #[must_use]
    pub fn keypad(&self) -> &KeypadState {
        &self.keypad
    }

    #[must_use]
    pub fn ledger(&self) -> &InventoryLedger<F> {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut InventoryLedger<F> {
        &mut self.ledger
    }

    #[must_use]
    pub fn peripherals(&self) -> &Peripherals<M, R, L, D> {
        &self.peripherals
    }

    pub fn peripherals_mut(&mut self) -> &mut Peripherals<M, R, L, D> {
        &mut self.peripherals
    }
}

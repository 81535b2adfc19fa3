//! Role input parser.
//!
//! One state machine per tag role, all advanced by the pure function
//! [`transition`]. It never touches the ledger or the LED; it returns the
//! [`Effect`]s the dispatcher must apply, in order.
//!
//! # Admin
//!
//! Collects four digits and compares them with the PIN. A match
//! authenticates (purple); a mismatch aborts the session (red). Once
//! authenticated, `E` resets the inventory. `D` closes the session in any
//! phase (yellow).
//!
//! # Clerk
//!
//! `A`/`B`/`C` selects the field, a digit 1-5 the product, further digits
//! build the value. `D` with all three commits the cell and closes the
//! session; `D` with nothing selected just closes it.
//!
//! # User
//!
//! The box data comes from the tag. `A` books it in, `B` books it out; either
//! closes the session. `D` closes without a transaction.
//!
//! Any key that is not valid in the current phase resets that role's machine
//! to its first phase and shows red.

use heapless::Vec;
use tagstock_core::constants::PIN_LENGTH;
use tagstock_core::{AdminPin, BoxData, Key, LedColor, LedgerField, ProductId, Role, TagPayload};

use crate::error::TerminalError;

/// Most effects a single key can produce.
pub const MAX_EFFECTS: usize = 3;

/// Effects of one key, in application order.
pub type Effects = Vec<Effect, MAX_EFFECTS>;

/// Something the dispatcher must do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Show a status color.
    Feedback(LedColor),
    /// Report a recoverable error (red LED).
    Reject(TerminalError),
    /// Zero the whole ledger. Blue on success.
    ResetInventory,
    /// Overwrite one ledger cell. Green on success.
    SetField {
        product: ProductId,
        field: LedgerField,
        value: u32,
    },
    /// Book a box in. Green on success.
    CommitIn(BoxData),
    /// Book a box out. Green on success.
    CommitOut(BoxData),
    /// End the tag session and resume polling.
    CloseSession,
}

/// Admin sub-state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminPhase {
    EnteringPin { digits: Vec<u8, PIN_LENGTH> },
    Authenticated,
}

impl AdminPhase {
    fn initial() -> Self {
        Self::EnteringPin { digits: Vec::new() }
    }
}

/// Clerk data-entry progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClerkEntry {
    pub field: Option<LedgerField>,
    pub product: Option<ProductId>,
    pub value: u32,
    /// Number of value digits typed.
    pub digits: u8,
}

/// Role session driven by the open tag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RoleSession {
    #[default]
    None,
    Admin(AdminPhase),
    Clerk(ClerkEntry),
    /// Box tag waiting for the transaction direction.
    User(BoxData),
}

impl RoleSession {
    /// Initial state for a freshly read tag.
    #[must_use]
    pub fn open(payload: &TagPayload) -> Self {
        match payload {
            TagPayload::Admin => Self::Admin(AdminPhase::initial()),
            TagPayload::Clerk => Self::Clerk(ClerkEntry::default()),
            TagPayload::User(data) => Self::User(*data),
        }
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        match self {
            Self::None => None,
            Self::Admin(_) => Some(Role::Admin),
            Self::Clerk(_) => Some(Role::Clerk),
            Self::User(_) => Some(Role::User),
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::None)
    }
}

fn effects<const N: usize>(items: [Effect; N]) -> Effects {
    items.into_iter().collect()
}

fn finished() -> (RoleSession, Effects) {
    (
        RoleSession::None,
        effects([Effect::Feedback(LedColor::Yellow), Effect::CloseSession]),
    )
}

fn invalid(reset: RoleSession, key: Key, role: Role) -> (RoleSession, Effects) {
    (reset, effects([Effect::Reject(TerminalError::Input { key, role })]))
}

/// Advance `session` by one key.
///
/// # Examples
///
/// ```
/// use tagstock_core::{AdminPin, Key, LedColor, TagPayload};
/// use tagstock_terminal::{AdminPhase, Effect, RoleSession, transition};
///
/// let pin = AdminPin::default();
/// let mut session = RoleSession::open(&TagPayload::Admin);
/// for digit in [1, 2, 3] {
///     session = transition(session, Key::Digit(digit), &pin).0;
/// }
/// let (session, effects) = transition(session, Key::Digit(4), &pin);
/// assert_eq!(session, RoleSession::Admin(AdminPhase::Authenticated));
/// assert_eq!(effects.as_slice(), &[Effect::Feedback(LedColor::Purple)]);
/// ```
#[must_use]
pub fn transition(session: RoleSession, key: Key, pin: &AdminPin) -> (RoleSession, Effects) {
    match session {
        RoleSession::None => (RoleSession::None, Effects::new()),
        RoleSession::Admin(phase) => admin(phase, key, pin),
        RoleSession::Clerk(entry) => clerk(entry, key),
        RoleSession::User(data) => user(data, key),
    }
}

fn admin(phase: AdminPhase, key: Key, pin: &AdminPin) -> (RoleSession, Effects) {
    let reset = || RoleSession::Admin(AdminPhase::initial());
    match (phase, key) {
        (_, Key::Finish) => finished(),
        (AdminPhase::EnteringPin { mut digits }, Key::Digit(d)) => {
            if digits.push(d).is_err() {
                return invalid(reset(), key, Role::Admin);
            }
            if digits.len() < PIN_LENGTH {
                return (RoleSession::Admin(AdminPhase::EnteringPin { digits }), Effects::new());
            }
            if pin.matches(&digits) {
                (
                    RoleSession::Admin(AdminPhase::Authenticated),
                    effects([Effect::Feedback(LedColor::Purple)]),
                )
            } else {
                (
                    RoleSession::None,
                    effects([Effect::Reject(TerminalError::Auth), Effect::CloseSession]),
                )
            }
        }
        (AdminPhase::Authenticated, Key::Reset) => (
            RoleSession::Admin(AdminPhase::Authenticated),
            effects([Effect::ResetInventory]),
        ),
        (_, key) => invalid(reset(), key, Role::Admin),
    }
}

fn clerk(entry: ClerkEntry, key: Key) -> (RoleSession, Effects) {
    let reset = RoleSession::Clerk(ClerkEntry::default());
    match (entry, key) {
        (
            ClerkEntry {
                field: None,
                product: None,
                ..
            },
            Key::Finish,
        ) => finished(),
        (
            ClerkEntry {
                field: Some(field),
                product: Some(product),
                value,
                digits,
            },
            Key::Finish,
        ) if digits > 0 => (
            RoleSession::None,
            effects([
                Effect::SetField {
                    product,
                    field,
                    value,
                },
                Effect::CloseSession,
            ]),
        ),
        (ClerkEntry { field: None, .. }, key) => match LedgerField::from_key(key) {
            Some(field) => (
                RoleSession::Clerk(ClerkEntry {
                    field: Some(field),
                    ..ClerkEntry::default()
                }),
                Effects::new(),
            ),
            None => invalid(reset, key, Role::Clerk),
        },
        (
            ClerkEntry {
                field: Some(_),
                product: None,
                ..
            },
            Key::Digit(d),
        ) => match ProductId::new(d) {
            Ok(product) => (
                RoleSession::Clerk(ClerkEntry {
                    product: Some(product),
                    ..entry
                }),
                Effects::new(),
            ),
            Err(_) => invalid(reset, key, Role::Clerk),
        },
        (
            ClerkEntry {
                product: Some(_),
                value,
                digits,
                ..
            },
            Key::Digit(d),
        ) => {
            let next = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(u32::from(d)));
            match next {
                Some(value) => (
                    RoleSession::Clerk(ClerkEntry {
                        value,
                        digits: digits.saturating_add(1),
                        ..entry
                    }),
                    Effects::new(),
                ),
                None => invalid(reset, key, Role::Clerk),
            }
        }
        (_, key) => invalid(reset, key, Role::Clerk),
    }
}

fn user(data: BoxData, key: Key) -> (RoleSession, Effects) {
    match key {
        Key::A => (
            RoleSession::None,
            effects([Effect::CommitIn(data), Effect::CloseSession]),
        ),
        Key::B => (
            RoleSession::None,
            effects([Effect::CommitOut(data), Effect::CloseSession]),
        ),
        Key::Finish => finished(),
        key => invalid(RoleSession::User(data), key, Role::User),
    }
}

//! Event-driven control core of the tagstock inventory terminal.
//!
//! Interrupt handlers ([`SystemState::on_column_edge`],
//! [`SystemState::on_row_edge`], [`SystemState::on_tag_irq`],
//! [`SystemState::on_timer`]) only sample lines, re-arm alarms and raise bits
//! in the [`PendingFlags`] word. The dispatcher ([`SystemState::program`])
//! drains those bits in a fixed priority order and does the real work: role
//! input parsing, tag acquisition, ledger commits and user feedback.
//!
//! # Main loop
//!
//! ```ignore
//! loop {
//!     while terminal.check() {
//!         terminal.program(clock.now());
//!     }
//!     wait_for_interrupt();
//! }
//! ```
//!
//! # Modules
//!
//! - [`flags`]: the atomic pending-work bitset.
//! - [`roles`]: Admin, Clerk and User input state machines as a pure
//!   transition function.
//! - [`feedback`]: status LED hold and auto-off.
//! - [`display`]: LCD frame rendering and rotation.
//! - [`config`]: runtime configuration.
//! - [`system`]: the owned system state and dispatcher.

pub mod config;
pub mod display;
pub mod error;
pub mod feedback;
pub mod flags;
pub mod roles;
pub mod system;

pub use config::TerminalConfig;
pub use error::{Result, TerminalError};
pub use flags::{Flag, PendingFlags};
pub use roles::{AdminPhase, ClerkEntry, Effect, RoleSession, transition};
pub use system::{Peripherals, SystemState};

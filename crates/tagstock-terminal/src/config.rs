//! Runtime configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is
//! a valid configuration.
//!
//! ```
//! use tagstock_terminal::TerminalConfig;
//!
//! let config: TerminalConfig = serde_json::from_str(r#"{ "admin_pin": "4321" }"#).unwrap();
//! assert_eq!(config.debounce_ms, 100);
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use tagstock_core::constants::{
    DEFAULT_DEBOUNCE_MS, DEFAULT_DISPLAY_TICK_MS, DEFAULT_LED_HOLD_MS, DEFAULT_TAG_BLOCK,
    DEFAULT_TAG_KEY, DEFAULT_TAG_POLL_MS, PRODUCT_COUNT,
};
use tagstock_core::{AdminPin, Error};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Keypad debounce period.
    pub debounce_ms: u64,
    /// Tag poll period while no session is open.
    pub tag_poll_ms: u64,
    /// How long a feedback color stays on.
    pub led_hold_ms: u64,
    /// LCD frame period.
    pub display_tick_ms: u64,
    pub admin_pin: AdminPin,
    /// Data block holding the tag payload.
    pub tag_block: u8,
    /// Key A of the payload sector.
    pub tag_key: [u8; 6],
    /// Maximum stock per product, by product index.
    pub capacity: Option<[u32; PRODUCT_COUNT]>,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            tag_poll_ms: DEFAULT_TAG_POLL_MS,
            led_hold_ms: DEFAULT_LED_HOLD_MS,
            display_tick_ms: DEFAULT_DISPLAY_TICK_MS,
            admin_pin: AdminPin::default(),
            tag_block: DEFAULT_TAG_BLOCK,
            tag_key: DEFAULT_TAG_KEY,
            capacity: None,
        }
    }
}

impl TerminalConfig {
    /// Check values serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero period or a payload block in the
    /// manufacturer block or a sector trailer.
    pub fn validate(&self) -> Result<(), Error> {
        let periods = [
            ("debounce_ms", self.debounce_ms),
            ("tag_poll_ms", self.tag_poll_ms),
            ("led_hold_ms", self.led_hold_ms),
            ("display_tick_ms", self.display_tick_ms),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, value)| *value == 0) {
            return Err(Error::Config(format!("{name} must be greater than zero")));
        }
        if self.tag_block == 0 {
            return Err(Error::Config("tag_block 0 is the manufacturer block".into()));
        }
        if self.tag_block % 4 == 3 {
            return Err(Error::Config(format!(
                "tag_block {} is a sector trailer",
                self.tag_block
            )));
        }
        Ok(())
    }
}

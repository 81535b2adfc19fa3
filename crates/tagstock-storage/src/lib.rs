//! Flash-backed inventory ledger for the tagstock terminal.
//!
//! The ledger keeps the 5x3 product table in RAM and mirrors every mutation
//! to a dedicated flash sector before returning. Today's totals live in RAM
//! only.
//!
//! # Example
//!
//! ```
//! use tagstock_core::{BoxData, ProductId};
//! use tagstock_hardware::mock::MockFlash;
//! use tagstock_storage::InventoryLedger;
//!
//! let (flash, _handle) = MockFlash::new();
//! let mut ledger = InventoryLedger::open(flash)?;
//!
//! let product = ProductId::new(1)?;
//! ledger.commit_in(&BoxData { product, amount: 12, purchase_value: 3, sale_value: 5 })?;
//! assert_eq!(ledger.record(product).amount, 12);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Interrupt masking around flash programming goes through
//! [`critical_section`]; the final binary must link an implementation (the
//! `std` one on a host).

pub mod codec;
pub mod error;
pub mod ledger;

pub use codec::{InventoryTable, ProductRecord, decode_page, encode_page, is_erased_pattern};
pub use error::{LedgerError, Result};
pub use ledger::{DailyTotals, InventoryLedger};

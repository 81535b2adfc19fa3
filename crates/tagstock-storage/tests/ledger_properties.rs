//! Property-based tests for the inventory ledger.
//!
//! Each case runs against a fresh mock flash sector.

use proptest::prelude::*;
use tagstock_core::constants::PRODUCT_COUNT;
use tagstock_core::{BoxData, LedgerField, ProductId};
use tagstock_hardware::mock::MockFlash;
use tagstock_storage::{
    InventoryLedger, InventoryTable, LedgerError, ProductRecord, is_erased_pattern,
};

/// Strategy for product ids (1-5).
fn product_id() -> impl Strategy<Value = ProductId> {
    (1u8..=5).prop_map(|id| ProductId::new(id).unwrap())
}

/// Strategy for storable tables, full `u32` range per cell.
fn table() -> impl Strategy<Value = InventoryTable> {
    prop::array::uniform5(any::<[u32; 3]>().prop_map(ProductRecord::from_columns))
        .prop_filter("reads back as erased flash", |table| !is_erased_pattern(table))
}

proptest! {
    /// Property: `commit_out` never takes stock below zero and leaves the
    /// ledger untouched when it refuses.
    #[test]
    fn prop_commit_out_never_underflows(
        product in product_id(),
        stock in 0u32..1_000,
        amount in 0u32..2_000,
        sale_value in 0u32..1_000,
    ) {
        let (flash, handle) = MockFlash::new();
        let mut ledger = InventoryLedger::open(flash).unwrap();
        ledger.commit_in(&BoxData { product, amount: stock, purchase_value: 1, sale_value }).unwrap();
        let before = *ledger.table();
        let programs = handle.program_count();

        let result = ledger.commit_out(&BoxData { product, amount, purchase_value: 1, sale_value });

        if amount > stock {
            prop_assert_eq!(
                result,
                Err(LedgerError::InsufficientStock { product, stock, requested: amount })
            );
            prop_assert_eq!(ledger.table(), &before);
            prop_assert_eq!(handle.program_count(), programs);
        } else {
            prop_assert!(result.is_ok());
            prop_assert_eq!(ledger.record(product).amount, stock - amount);
        }
    }

    /// Property: store followed by load reproduces the table exactly.
    #[test]
    fn prop_store_load_identity(table in table(), writes in prop::collection::vec(table(), 0..3)) {
        let (flash, _handle) = MockFlash::new();
        let mut ledger = InventoryLedger::open(flash).unwrap();

        // earlier contents must not leak through the erase
        for earlier in writes {
            for (index, record) in earlier.iter().enumerate() {
                let product = ProductId::from_index(index).unwrap();
                for field in [
                    LedgerField::Amount,
                    LedgerField::Purchase,
                    LedgerField::Sale,
                ] {
                    ledger.set_field(product, field, record.get(field)).unwrap();
                }
            }
        }
        for (index, record) in table.iter().enumerate() {
            let product = ProductId::from_index(index).unwrap();
            ledger.set_field(product, LedgerField::Amount, record.amount).unwrap();
            ledger.set_field(product, LedgerField::Purchase, record.purchase_total).unwrap();
            ledger.set_field(product, LedgerField::Sale, record.sale_total).unwrap();
        }

        ledger.load().unwrap();
        prop_assert_eq!(ledger.table(), &table);
    }

    /// Property: reset followed by load yields an all-zero table.
    #[test]
    fn prop_reset_then_load_is_zero(table in table()) {
        let (flash, _handle) = MockFlash::new();
        let mut ledger = InventoryLedger::open(flash).unwrap();
        for (index, record) in table.iter().enumerate() {
            let product = ProductId::from_index(index).unwrap();
            ledger.set_field(product, LedgerField::Amount, record.amount).unwrap();
        }

        ledger.reset().unwrap();
        ledger.load().unwrap();
        prop_assert_eq!(ledger.table(), &[ProductRecord::default(); PRODUCT_COUNT]);
    }
}

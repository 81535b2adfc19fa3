//! In-memory inventory with synchronous flash persistence.

use serde::{Deserialize, Serialize};
use tagstock_core::constants::{LEDGER_BYTES, LEDGER_FLASH_OFFSET, PRODUCT_COUNT};
use tagstock_core::{BoxData, LedgerField, ProductId};
use tagstock_hardware::FlashDevice;
use tracing::{debug, info, warn};

use crate::codec::{InventoryTable, ProductRecord, decode_page, encode_page, is_erased_pattern};
use crate::error::{LedgerError, Result};

/// Movements since power-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DailyTotals {
    /// Items moved in either direction.
    pub amount_moved: u32,
    /// Value of inbound boxes at purchase price.
    pub purchases_total: u32,
    /// Value of outbound boxes at sale price.
    pub sales_total: u32,
}

/// The 5-product inventory ledger.
///
/// Every mutating operation writes the table to flash before it returns. If
/// the write fails the mutation is undone, so RAM never holds state that a
/// reboot would lose.
#[derive(Debug)]
pub struct InventoryLedger<F> {
    flash: F,
    offset: u32,
    table: InventoryTable,
    today: DailyTotals,
    capacity: Option<[u32; PRODUCT_COUNT]>,
}

impl<F: FlashDevice> InventoryLedger<F> {
    /// Ledger with an empty table at the default sector. Nothing is read.
    pub fn new(flash: F) -> Self {
        Self::with_offset(flash, LEDGER_FLASH_OFFSET)
    }

    /// Ledger stored in the sector at `offset`.
    pub fn with_offset(flash: F, offset: u32) -> Self {
        Self {
            flash,
            offset,
            table: InventoryTable::default(),
            today: DailyTotals::default(),
            capacity: None,
        }
    }

    /// Create the ledger and load the table from flash.
    ///
    /// # Errors
    ///
    /// Returns an error if the flash read fails.
    pub fn open(flash: F) -> Result<Self> {
        let mut ledger = Self::new(flash);
        ledger.load()?;
        Ok(ledger)
    }

    /// Limit the stock of each product accepted by [`commit_in`](Self::commit_in).
    pub fn set_capacity(&mut self, capacity: Option<[u32; PRODUCT_COUNT]>) {
        self.capacity = capacity;
    }

    #[must_use]
    pub fn capacity(&self, product: ProductId) -> Option<u32> {
        self.capacity.map(|c| c[product.index()])
    }

    /// Replace the in-memory table with the flash contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the flash read fails.
    pub fn load(&mut self) -> Result<()> {
        let mut head = [0u8; LEDGER_BYTES];
        self.flash.read(self.offset, &mut head)?;
        self.table = decode_page(&head);
        debug!(offset = self.offset, "ledger loaded");
        Ok(())
    }

    /// Write the table to flash: erase the sector, then program its first
    /// page with interrupts masked.
    ///
    /// A table with every cell at `u32::MAX` is refused before the erase,
    /// since it would load back as the all-zero table of a fresh sector.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ErasedPattern`] for that table, or an error if
    /// the erase or the program step fails.
    pub fn store(&mut self) -> Result<()> {
        if is_erased_pattern(&self.table) {
            return Err(LedgerError::ErasedPattern);
        }
        let page = encode_page(&self.table);
        self.flash.erase_sector(self.offset)?;
        let flash = &mut self.flash;
        let offset = self.offset;
        critical_section::with(|_| flash.write_page(offset, &page))?;
        debug!(offset, "ledger stored");
        Ok(())
    }

    /// Zero every product and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails; the table is left unchanged.
    pub fn reset(&mut self) -> Result<()> {
        self.mutate(|table, _| {
            *table = InventoryTable::default();
            Ok(())
        })?;
        info!("inventory reset");
        Ok(())
    }

    /// Overwrite one cell of the table and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails; the table is left unchanged.
    pub fn set_field(&mut self, product: ProductId, field: LedgerField, value: u32) -> Result<()> {
        self.mutate(|table, _| {
            table[product.index()].set(field, value);
            Ok(())
        })?;
        info!(%product, %field, value, "ledger field set");
        Ok(())
    }

    /// Receive a box: stock grows by its amount, the purchase total by its
    /// purchase value.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::CapacityExceeded`] if the product would go over
    /// its capacity, [`LedgerError::Overflow`] if a counter would wrap, or a
    /// persistence error. The ledger is unchanged in every error case.
    pub fn commit_in(&mut self, data: &BoxData) -> Result<()> {
        let product = data.product;
        let capacity = self.capacity(product);
        self.mutate(|table, today| {
            let overflow = || LedgerError::Overflow { product };
            let record = &mut table[product.index()];
            let value = data.amount.checked_mul(data.purchase_value).ok_or_else(overflow)?;
            let amount = record.amount.checked_add(data.amount).ok_or_else(overflow)?;
            if let Some(capacity) = capacity.filter(|&c| amount > c) {
                return Err(LedgerError::CapacityExceeded {
                    product,
                    capacity,
                    resulting: amount,
                });
            }
            record.amount = amount;
            record.purchase_total = record.purchase_total.checked_add(value).ok_or_else(overflow)?;
            today.amount_moved = today.amount_moved.saturating_add(data.amount);
            today.purchases_total = today.purchases_total.saturating_add(value);
            Ok(())
        })?;
        info!(%product, amount = data.amount, "inbound box committed");
        Ok(())
    }

    /// Ship a box: stock shrinks by its amount, the sale total grows by its
    /// sale value.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientStock`] if the amount exceeds the
    /// stock, [`LedgerError::Overflow`] if a counter would wrap, or a
    /// persistence error. The ledger is unchanged in every error case.
    pub fn commit_out(&mut self, data: &BoxData) -> Result<()> {
        let product = data.product;
        self.mutate(|table, today| {
            let overflow = || LedgerError::Overflow { product };
            let record = &mut table[product.index()];
            if data.amount > record.amount {
                return Err(LedgerError::InsufficientStock {
                    product,
                    stock: record.amount,
                    requested: data.amount,
                });
            }
            let value = data.amount.checked_mul(data.sale_value).ok_or_else(overflow)?;
            record.sale_total = record.sale_total.checked_add(value).ok_or_else(overflow)?;
            record.amount -= data.amount;
            today.amount_moved = today.amount_moved.saturating_add(data.amount);
            today.sales_total = today.sales_total.saturating_add(value);
            Ok(())
        })?;
        info!(%product, amount = data.amount, "outbound box committed");
        Ok(())
    }

    /// Apply `change` to copies of the state, persist, then keep it.
    fn mutate<G>(&mut self, change: G) -> Result<()>
    where
        G: FnOnce(&mut InventoryTable, &mut DailyTotals) -> Result<()>,
    {
        let (table, today) = (self.table, self.today);
        change(&mut self.table, &mut self.today)?;
        if let Err(error) = self.store() {
            warn!(%error, "ledger store failed, rolling back");
            self.table = table;
            self.today = today;
            return Err(error);
        }
        Ok(())
    }

    #[must_use]
    pub fn table(&self) -> &InventoryTable {
        &self.table
    }

    #[must_use]
    pub fn record(&self, product: ProductId) -> ProductRecord {
        self.table[product.index()]
    }

    #[must_use]
    pub fn today(&self) -> DailyTotals {
        self.today
    }

    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }
}

#[cfg(test)]
mod tests {
    use tagstock_hardware::mock::{MockFlash, MockFlashHandle};

    use super::*;

    fn ledger() -> (InventoryLedger<MockFlash>, MockFlashHandle) {
        let (flash, handle) = MockFlash::new();
        (InventoryLedger::open(flash).unwrap(), handle)
    }

    fn pid(id: u8) -> ProductId {
        ProductId::new(id).unwrap()
    }

    fn boxed(id: u8, amount: u32, purchase_value: u32, sale_value: u32) -> BoxData {
        BoxData {
            product: pid(id),
            amount,
            purchase_value,
            sale_value,
        }
    }

    #[test]
    fn test_fresh_flash_loads_empty() {
        let (ledger, handle) = ledger();
        assert_eq!(ledger.table(), &InventoryTable::default());
        assert_eq!(handle.erase_count(), 0);
    }

    #[test]
    fn test_commit_in_updates_stock_and_totals() {
        let (mut ledger, handle) = ledger();
        ledger.commit_in(&boxed(2, 10, 3, 5)).unwrap();

        let record = ledger.record(pid(2));
        assert_eq!(record.amount, 10);
        assert_eq!(record.purchase_total, 30);
        assert_eq!(record.sale_total, 0);
        assert_eq!(
            ledger.today(),
            DailyTotals {
                amount_moved: 10,
                purchases_total: 30,
                sales_total: 0
            }
        );
        assert_eq!(handle.erase_count(), 1);
        assert_eq!(handle.program_count(), 1);
    }

    #[test]
    fn test_commit_out_updates_stock_and_sales() {
        let (mut ledger, _handle) = ledger();
        ledger.commit_in(&boxed(1, 20, 2, 4)).unwrap();
        ledger.commit_out(&boxed(1, 5, 2, 4)).unwrap();

        let record = ledger.record(pid(1));
        assert_eq!(record.amount, 15);
        assert_eq!(record.sale_total, 20);
        assert_eq!(ledger.today().amount_moved, 25);
        assert_eq!(ledger.today().sales_total, 20);
    }

    #[test]
    fn test_commit_out_insufficient_stock_leaves_ledger() {
        let (mut ledger, handle) = ledger();
        ledger.set_field(pid(2), LedgerField::Amount, 4).unwrap();
        let before = *ledger.table();
        let programs = handle.program_count();

        let error = ledger.commit_out(&boxed(2, 10, 3, 5)).unwrap_err();
        assert_eq!(
            error,
            LedgerError::InsufficientStock {
                product: pid(2),
                stock: 4,
                requested: 10
            }
        );
        assert_eq!(ledger.table(), &before);
        assert_eq!(handle.program_count(), programs);
    }

    #[test]
    fn test_capacity_rejects_inbound() {
        let (mut ledger, _handle) = ledger();
        ledger.set_capacity(Some([100, 100, 15, 100, 100]));
        ledger.commit_in(&boxed(3, 10, 1, 1)).unwrap();

        let error = ledger.commit_in(&boxed(3, 6, 1, 1)).unwrap_err();
        assert!(matches!(error, LedgerError::CapacityExceeded { capacity: 15, resulting: 16, .. }));
        assert_eq!(ledger.record(pid(3)).amount, 10);

        // exactly at capacity is fine
        ledger.commit_in(&boxed(3, 5, 1, 1)).unwrap();
        assert_eq!(ledger.record(pid(3)).amount, 15);
    }

    #[test]
    fn test_overflow_rejected() {
        let (mut ledger, _handle) = ledger();
        ledger.set_field(pid(5), LedgerField::Amount, u32::MAX).unwrap();

        let error = ledger.commit_in(&boxed(5, 1, 0, 0)).unwrap_err();
        assert_eq!(error, LedgerError::Overflow { product: pid(5) });

        let error = ledger.commit_in(&boxed(4, 0x1_0000, 0x1_0000, 0)).unwrap_err();
        assert_eq!(error, LedgerError::Overflow { product: pid(4) });
    }

    #[test]
    fn test_flash_failure_rolls_back() {
        let (mut ledger, handle) = ledger();
        ledger.commit_in(&boxed(1, 7, 1, 1)).unwrap();
        let today = ledger.today();

        handle.fail_next_program();
        let error = ledger.commit_in(&boxed(1, 3, 1, 1)).unwrap_err();
        assert!(matches!(error, LedgerError::Flash(_)));
        assert_eq!(ledger.record(pid(1)).amount, 7);
        assert_eq!(ledger.today(), today);

        handle.fail_next_erase();
        assert!(ledger.reset().is_err());
        assert_eq!(ledger.record(pid(1)).amount, 7);
    }

    #[test]
    fn test_reset_persists_zeros() {
        let (mut ledger, _handle) = ledger();
        ledger.commit_in(&boxed(1, 7, 1, 1)).unwrap();
        ledger.reset().unwrap();
        ledger.load().unwrap();
        assert_eq!(ledger.table(), &InventoryTable::default());
    }

    #[test]
    fn test_reload_after_reboot() {
        let (flash, handle) = MockFlash::new();
        let mut ledger = InventoryLedger::open(flash).unwrap();
        ledger.set_field(pid(4), LedgerField::Sale, 999).unwrap();
        drop(ledger);

        // same backing store, new ledger
        let mut rebooted = InventoryLedger::new(SharedFlash(handle));
        rebooted.load().unwrap();
        assert_eq!(rebooted.record(pid(4)).sale_total, 999);
        assert_eq!(rebooted.today(), DailyTotals::default());
    }

    #[test]
    fn test_erased_pattern_never_stored() {
        let (mut ledger, handle) = ledger();
        let fields = [LedgerField::Amount, LedgerField::Purchase, LedgerField::Sale];
        let cells: Vec<_> = ProductId::all()
            .flat_map(|product| fields.map(|field| (product, field)))
            .collect();
        let (last, rest) = cells.split_last().unwrap();
        for &(product, field) in rest {
            ledger.set_field(product, field, u32::MAX).unwrap();
        }
        let before = *ledger.table();
        let erases = handle.erase_count();

        let result = ledger.set_field(last.0, last.1, u32::MAX);

        assert_eq!(result, Err(LedgerError::ErasedPattern));
        assert_eq!(ledger.table(), &before);
        assert_eq!(handle.erase_count(), erases);

        // what is on flash still loads as the last good table
        ledger.load().unwrap();
        assert_eq!(ledger.table(), &before);
    }

    /// Read-only view of a mock flash through its handle.
    struct SharedFlash(MockFlashHandle);

    impl FlashDevice for SharedFlash {
        fn read(&mut self, offset: u32, buf: &mut [u8]) -> tagstock_hardware::Result<()> {
            let data = self
                .0
                .read(offset, buf.len())
                .ok_or_else(|| tagstock_hardware::HardwareError::flash(offset, "unmapped"))?;
            buf.copy_from_slice(&data);
            Ok(())
        }

        fn erase_sector(&mut self, offset: u32) -> tagstock_hardware::Result<()> {
            Err(tagstock_hardware::HardwareError::flash(offset, "read-only"))
        }

        fn write_page(
            &mut self,
            offset: u32,
            _page: &tagstock_hardware::FlashPage,
        ) -> tagstock_hardware::Result<()> {
            Err(tagstock_hardware::HardwareError::flash(offset, "read-only"))
        }
    }
}

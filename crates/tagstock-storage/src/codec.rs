//! Flash page layout of the ledger table.
//!
//! The first 60 bytes of the page hold 5 rows of 3 little-endian `u32`
//! (`[product][amount, purchase_total, sale_total]`, row-major). The rest of
//! the page stays erased. There is no header or checksum.

use serde::{Deserialize, Serialize};
use tagstock_core::LedgerField;
use tagstock_core::constants::{
    FLASH_ERASED_BYTE, FLASH_PAGE_SIZE, LEDGER_BYTES, LEDGER_COLUMNS, PRODUCT_COUNT,
};
use tagstock_hardware::FlashPage;

/// One product row of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Items in stock.
    pub amount: u32,
    /// Cumulative value of inbound boxes at purchase price.
    pub purchase_total: u32,
    /// Cumulative value of outbound boxes at sale price.
    pub sale_total: u32,
}

impl ProductRecord {
    #[must_use]
    pub fn get(&self, field: LedgerField) -> u32 {
        match field {
            LedgerField::Amount => self.amount,
            LedgerField::Purchase => self.purchase_total,
            LedgerField::Sale => self.sale_total,
        }
    }

    pub fn set(&mut self, field: LedgerField, value: u32) {
        match field {
            LedgerField::Amount => self.amount = value,
            LedgerField::Purchase => self.purchase_total = value,
            LedgerField::Sale => self.sale_total = value,
        }
    }

    #[must_use]
    pub fn to_columns(&self) -> [u32; LEDGER_COLUMNS] {
        [self.amount, self.purchase_total, self.sale_total]
    }

    #[must_use]
    pub fn from_columns(columns: [u32; LEDGER_COLUMNS]) -> Self {
        let [amount, purchase_total, sale_total] = columns;
        Self {
            amount,
            purchase_total,
            sale_total,
        }
    }
}

/// The whole table, indexed by [`ProductId::index`](tagstock_core::ProductId::index).
pub type InventoryTable = [ProductRecord; PRODUCT_COUNT];

/// Serialize the table into a page padded with the erased value.
#[must_use]
pub fn encode_page(table: &InventoryTable) -> FlashPage {
    let mut page = [FLASH_ERASED_BYTE; FLASH_PAGE_SIZE];
    let words = table.iter().flat_map(ProductRecord::to_columns);
    for (chunk, word) in page[..LEDGER_BYTES].chunks_exact_mut(4).zip(words) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    page
}

/// Whether `table` encodes to an all-erased area.
///
/// Only the table with every cell at `u32::MAX` does; it would load back as
/// zeros, so it is never stored.
#[must_use]
pub fn is_erased_pattern(table: &InventoryTable) -> bool {
    table
        .iter()
        .all(|record| record.to_columns() == [u32::MAX; LEDGER_COLUMNS])
}

/// Deserialize the table from the start of a page.
///
/// A fully erased table area reads as all zeros; anything else is taken
/// verbatim.
#[must_use]
pub fn decode_page(page: &[u8; LEDGER_BYTES]) -> InventoryTable {
    let mut table = InventoryTable::default();
    if page.iter().all(|&b| b == FLASH_ERASED_BYTE) {
        return table;
    }
    let mut words = page
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]));
    for record in &mut table {
        let mut columns = [0u32; LEDGER_COLUMNS];
        for column in &mut columns {
            *column = words.next().unwrap_or_default();
        }
        *record = ProductRecord::from_columns(columns);
    }
    table
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn sample() -> InventoryTable {
        let mut table = InventoryTable::default();
        table[0] = ProductRecord::from_columns([50, 150, 0]);
        table[4] = ProductRecord::from_columns([u32::MAX, 1, 0x0A0B_0C0D]);
        table
    }

    #[test]
    fn test_layout_is_row_major_le() {
        let page = encode_page(&sample());
        assert_eq!(&page[0..4], &50u32.to_le_bytes());
        assert_eq!(&page[4..8], &150u32.to_le_bytes());
        assert_eq!(&page[48..52], &[0xFF; 4]);
        assert_eq!(&page[56..60], &[0x0D, 0x0C, 0x0B, 0x0A]);
        assert!(page[LEDGER_BYTES..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_decode_inverts_encode() {
        let page = encode_page(&sample());
        let mut head = [0u8; LEDGER_BYTES];
        head.copy_from_slice(&page[..LEDGER_BYTES]);
        assert_eq!(decode_page(&head), sample());
    }

    #[test]
    fn test_erased_page_is_empty_table() {
        assert_eq!(decode_page(&[0xFF; LEDGER_BYTES]), InventoryTable::default());
    }

    #[test]
    fn test_partially_erased_is_verbatim() {
        let mut head = [0xFF; LEDGER_BYTES];
        head[0..4].copy_from_slice(&7u32.to_le_bytes());
        let table = decode_page(&head);
        assert_eq!(table[0].amount, 7);
        assert_eq!(table[0].purchase_total, u32::MAX);
    }

    #[rstest]
    #[case(LedgerField::Amount, [9, 0, 0])]
    #[case(LedgerField::Purchase, [0, 9, 0])]
    #[case(LedgerField::Sale, [0, 0, 9])]
    fn test_record_field_access(#[case] field: LedgerField, #[case] columns: [u32; 3]) {
        let mut record = ProductRecord::default();
        record.set(field, 9);
        assert_eq!(record.get(field), 9);
        assert_eq!(record.to_columns(), columns);
    }

    #[test]
    fn test_erased_pattern_detection() {
        let mut table = [ProductRecord::from_columns([u32::MAX; 3]); PRODUCT_COUNT];
        assert!(is_erased_pattern(&table));
        table[2].sale_total -= 1;
        assert!(!is_erased_pattern(&table));
        assert!(!is_erased_pattern(&InventoryTable::default()));
    }

    #[test]
    fn test_record_serialization() {
        let record = ProductRecord::from_columns([50, 150, 0]);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"amount":50,"purchase_total":150,"sale_total":0}"#);
        let back: ProductRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}

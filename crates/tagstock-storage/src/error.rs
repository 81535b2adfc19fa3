//! Ledger error types.

use tagstock_core::ProductId;
use tagstock_hardware::HardwareError;
use thiserror::Error;

/// Why a ledger operation was refused or could not be persisted.
///
/// Every variant leaves the in-memory table exactly as it was before the
/// call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Outbound box larger than the stock on hand.
    #[error("Insufficient stock for product {product}: {stock} on hand, {requested} requested")]
    InsufficientStock {
        product: ProductId,
        stock: u32,
        requested: u32,
    },

    /// Inbound box would exceed the warehouse capacity for the product.
    #[error("Capacity exceeded for product {product}: {resulting} > {capacity}")]
    CapacityExceeded {
        product: ProductId,
        capacity: u32,
        resulting: u32,
    },

    /// A counter would wrap around.
    #[error("Counter overflow for product {product}")]
    Overflow { product: ProductId },

    /// Every cell would be `u32::MAX`, which reads back as erased flash.
    #[error("Table would read back as erased flash")]
    ErasedPattern,

    /// Erase or program of the ledger sector failed.
    #[error("Persistence error: {0}")]
    Flash(#[from] HardwareError),
}

/// Specialized result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let product = ProductId::new(2).unwrap();
        let error = LedgerError::InsufficientStock {
            product,
            stock: 4,
            requested: 10,
        };
        assert_eq!(
            error.to_string(),
            "Insufficient stock for product 2: 4 on hand, 10 requested"
        );

        let error: LedgerError = HardwareError::flash(0x1F_F000, "program failed").into();
        assert!(error.to_string().starts_with("Persistence error"));
    }
}

//! Data block layout of the terminal's tags.
//!
//! ```text
//! byte  0      role (1 admin, 2 clerk, 3 user)
//! byte  1      product id (1-5, user tags only)
//! bytes 2..6   amount           u32 LE
//! bytes 6..10  unit purchase    u32 LE
//! bytes 10..14 unit sale        u32 LE
//! bytes 14..16 reserved
//! ```
//!
//! Admin and clerk tags only carry the role byte; the rest is ignored.

use tagstock_core::constants::TAG_BLOCK_SIZE;
use tagstock_core::{BoxData, Error, ProductId, Result, Role, TagPayload};

fn read_u32(block: &[u8; TAG_BLOCK_SIZE], at: usize) -> u32 {
    u32::from_le_bytes([block[at], block[at + 1], block[at + 2], block[at + 3]])
}

/// Decode a data block.
///
/// # Errors
///
/// Returns [`Error::InvalidRole`] for an unknown role byte and
/// [`Error::InvalidProductId`] for a user tag naming no product.
///
/// # Examples
///
/// ```
/// use tagstock_core::{Role, TagPayload};
/// use tagstock_rfid::decode_block;
///
/// let mut block = [0u8; 16];
/// block[0] = 1;
/// assert_eq!(decode_block(&block).unwrap(), TagPayload::Admin);
///
/// block[0] = 3;
/// block[1] = 2;
/// block[2] = 10;
/// assert_eq!(decode_block(&block).unwrap().role(), Role::User);
/// ```
pub fn decode_block(block: &[u8; TAG_BLOCK_SIZE]) -> Result<TagPayload> {
    match Role::from_u8(block[0])? {
        Role::Admin => Ok(TagPayload::Admin),
        Role::Clerk => Ok(TagPayload::Clerk),
        Role::User => Ok(TagPayload::User(BoxData {
            product: ProductId::new(block[1])?,
            amount: read_u32(block, 2),
            purchase_value: read_u32(block, 6),
            sale_value: read_u32(block, 10),
        })),
    }
}

/// Encode a payload into a data block, the inverse of [`decode_block`].
///
/// Used to provision tags and to feed simulated readers.
#[must_use]
pub fn encode_block(payload: &TagPayload) -> [u8; TAG_BLOCK_SIZE] {
    let mut block = [0u8; TAG_BLOCK_SIZE];
    block[0] = payload.role().to_u8();
    if let TagPayload::User(data) = payload {
        block[1] = data.product.get();
        block[2..6].copy_from_slice(&data.amount.to_le_bytes());
        block[6..10].copy_from_slice(&data.purchase_value.to_le_bytes());
        block[10..14].copy_from_slice(&data.sale_value.to_le_bytes());
    }
    block
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_decode_user_tag() {
        let mut block = [0u8; 16];
        block[0] = 3;
        block[1] = 2;
        block[2..6].copy_from_slice(&10u32.to_le_bytes());
        block[6..10].copy_from_slice(&3u32.to_le_bytes());
        block[10..14].copy_from_slice(&5u32.to_le_bytes());

        let payload = decode_block(&block).unwrap();
        let TagPayload::User(data) = payload else {
            panic!("expected user payload, got {payload:?}");
        };
        assert_eq!(data.product.get(), 2);
        assert_eq!(data.amount, 10);
        assert_eq!(data.purchase_value, 3);
        assert_eq!(data.sale_value, 5);
    }

    #[rstest]
    #[case(1, TagPayload::Admin)]
    #[case(2, TagPayload::Clerk)]
    fn test_decode_staff_tags_ignore_rest(#[case] role: u8, #[case] expected: TagPayload) {
        let mut block = [0xAB; 16];
        block[0] = role;
        assert_eq!(decode_block(&block).unwrap(), expected);
    }

    #[rstest]
    #[case(0)]
    #[case(4)]
    #[case(0xFF)]
    fn test_decode_unknown_role(#[case] role: u8) {
        let mut block = [0u8; 16];
        block[0] = role;
        assert_eq!(decode_block(&block), Err(Error::InvalidRole(role)));
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    fn test_decode_user_tag_bad_product(#[case] product: u8) {
        let mut block = [0u8; 16];
        block[0] = 3;
        block[1] = product;
        assert_eq!(decode_block(&block), Err(Error::InvalidProductId(product)));
    }

    #[test]
    fn test_encode_matches_layout() {
        let payload = TagPayload::User(BoxData {
            product: ProductId::new(5).unwrap(),
            amount: 0x0102_0304,
            purchase_value: 7,
            sale_value: 9,
        });
        let block = encode_block(&payload);
        assert_eq!(&block[..6], &[3, 5, 0x04, 0x03, 0x02, 0x01]);
        assert_eq!(block[6], 7);
        assert_eq!(block[10], 9);
        assert_eq!(&block[14..], &[0, 0]);
        assert_eq!(decode_block(&block).unwrap(), payload);
    }
}

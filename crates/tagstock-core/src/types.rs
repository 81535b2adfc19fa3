use crate::{
    Result,
    constants::{PIN_LENGTH, PRODUCT_COUNT},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// A decoded keypad key.
///
/// The 4x4 matrix produces a 4-bit code: `0x0..=0x9` are digits, `0xA..=0xC`
/// are the field/transaction letters, `0xD` finishes a session and `0xE`
/// (the `*` key) is the admin-only reset. `0xF` (`#`) is decoded but has no
/// meaning in any role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Numeric digit (0-9).
    Digit(u8),
    /// Letter A: "amount" for clerks, inbound for box tags.
    A,
    /// Letter B: "purchase value" for clerks, outbound for box tags.
    B,
    /// Letter C: "sale value" for clerks.
    C,
    /// Letter D: finish / confirm.
    Finish,
    /// The `*` key, reported as `E`: admin inventory reset.
    Reset,
    /// The `#` key.
    Hash,
}

impl Key {
    /// Decode a 4-bit key code.
    ///
    /// # Errors
    /// Returns `Error::InvalidKeyCode` for codes above `0x0F`.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0x0..=0x9 => Ok(Key::Digit(code)),
            0xA => Ok(Key::A),
            0xB => Ok(Key::B),
            0xC => Ok(Key::C),
            0xD => Ok(Key::Finish),
            0xE => Ok(Key::Reset),
            0xF => Ok(Key::Hash),
            _ => Err(Error::InvalidKeyCode(code)),
        }
    }

    /// The 4-bit key code.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Key::Digit(d) => d,
            Key::A => 0xA,
            Key::B => 0xB,
            Key::C => 0xC,
            Key::Finish => 0xD,
            Key::Reset => 0xE,
            Key::Hash => 0xF,
        }
    }

    /// Parse the legend printed on the keypad (`*` and `E` are the same key).
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            d @ '0'..='9' => Some(Key::Digit(d as u8 - b'0')),
            'A' => Some(Key::A),
            'B' => Some(Key::B),
            'C' => Some(Key::C),
            'D' => Some(Key::Finish),
            '*' | 'E' => Some(Key::Reset),
            '#' | 'F' => Some(Key::Hash),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Key::Digit(d) => (b'0' + d) as char,
            Key::A => 'A',
            Key::B => 'B',
            Key::C => 'C',
            Key::Finish => 'D',
            Key::Reset => '*',
            Key::Hash => '#',
        }
    }

    #[inline]
    #[must_use]
    pub fn as_digit(self) -> Option<u8> {
        match self {
            Key::Digit(d) => Some(d),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Key codes by matrix position, `[row][column]`.
///
/// ```text
///  1 2 3 A
///  4 5 6 B
///  7 8 9 C
///  * 0 # D
/// ```
pub const KEYPAD_LAYOUT: [[u8; 4]; 4] = [
    [0x1, 0x2, 0x3, 0xA],
    [0x4, 0x5, 0x6, 0xB],
    [0x7, 0x8, 0x9, 0xC],
    [0xE, 0x0, 0xF, 0xD],
];

impl Key {
    /// Matrix position `(row, column)` of this key.
    ///
    /// `None` only for a hand-built `Key::Digit` above 9.
    pub fn position(self) -> Option<(usize, usize)> {
        let code = self.code();
        KEYPAD_LAYOUT.iter().enumerate().find_map(|(row, cols)| {
            cols.iter().position(|&c| c == code).map(|col| (row, col))
        })
    }
}

/// Product identifier (1-5).
///
/// Ids are 1-based on tags and keypad; [`ProductId::index`] gives the
/// 0-based ledger row. Every ledger access goes through this type so the
/// two conventions cannot be mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ProductId(u8);

impl ProductId {
    /// Create a product id with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidProductId` if the id is outside 1-5.
    pub fn new(id: u8) -> Result<Self> {
        if id == 0 || id as usize > PRODUCT_COUNT {
            return Err(Error::InvalidProductId(id));
        }
        Ok(ProductId(id))
    }

    /// Create a product id from a 0-based ledger row.
    pub fn from_index(index: usize) -> Option<Self> {
        (index < PRODUCT_COUNT).then(|| ProductId(index as u8 + 1))
    }

    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// 0-based ledger row.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize - 1
    }

    /// All product ids in ascending order.
    pub fn all() -> impl Iterator<Item = ProductId> {
        (1..=PRODUCT_COUNT as u8).map(ProductId)
    }
}

impl TryFrom<u8> for ProductId {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        ProductId::new(value)
    }
}

impl From<ProductId> for u8 {
    fn from(id: ProductId) -> u8 {
        id.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Access class encoded on a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Role {
    /// Main user: PIN entry and inventory reset.
    Admin = 0x01,
    /// Inventory clerk: direct ledger data entry.
    Clerk = 0x02,
    /// Product box: inbound/outbound transactions.
    User = 0x03,
}

impl Role {
    /// Decode the role discriminator stored on a tag.
    ///
    /// # Errors
    /// Returns `Error::InvalidRole` for unknown discriminators.
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Role::Admin),
            0x02 => Ok(Role::Clerk),
            0x03 => Ok(Role::User),
            _ => Err(Error::InvalidRole(value)),
        }
    }

    #[inline]
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "Admin"),
            Role::Clerk => write!(f, "Clerk"),
            Role::User => write!(f, "User"),
        }
    }
}

/// Status LED colors as 3-bit RGB masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedColor {
    #[default]
    Off,
    /// Success.
    Green,
    /// Error.
    Red,
    /// Inventory reset.
    Blue,
    /// PIN accepted.
    Purple,
    /// Session finished.
    Yellow,
}

impl LedColor {
    /// The mask driven onto the three LED lines.
    #[must_use]
    pub fn bits(self) -> u8 {
        match self {
            LedColor::Off => 0b000,
            LedColor::Green => 0b010,
            LedColor::Red => 0b100,
            LedColor::Blue => 0b011,
            LedColor::Purple => 0b101,
            LedColor::Yellow => 0b110,
        }
    }

    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b000 => Some(LedColor::Off),
            0b010 => Some(LedColor::Green),
            0b100 => Some(LedColor::Red),
            0b011 => Some(LedColor::Blue),
            0b101 => Some(LedColor::Purple),
            0b110 => Some(LedColor::Yellow),
            _ => None,
        }
    }
}

/// Ledger column selected by a clerk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerField {
    Amount,
    Purchase,
    Sale,
}

impl LedgerField {
    /// Field selected by a letter key, if any.
    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::A => Some(LedgerField::Amount),
            Key::B => Some(LedgerField::Purchase),
            Key::C => Some(LedgerField::Sale),
            _ => None,
        }
    }

    /// Column in the `[amount, purchase_total, sale_total]` row.
    #[inline]
    #[must_use]
    pub fn column(self) -> usize {
        match self {
            LedgerField::Amount => 0,
            LedgerField::Purchase => 1,
            LedgerField::Sale => 2,
        }
    }
}

impl fmt::Display for LedgerField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LedgerField::Amount => write!(f, "amount"),
            LedgerField::Purchase => write!(f, "purchase"),
            LedgerField::Sale => write!(f, "sale"),
        }
    }
}

/// Contents of a product box tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxData {
    pub product: ProductId,
    /// Items in the box.
    pub amount: u32,
    /// Unit purchase value.
    pub purchase_value: u32,
    /// Unit sale value.
    pub sale_value: u32,
}

/// Decoded tag payload, discriminated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum TagPayload {
    Admin,
    Clerk,
    User(BoxData),
}

impl TagPayload {
    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            TagPayload::Admin => Role::Admin,
            TagPayload::Clerk => Role::Clerk,
            TagPayload::User(_) => Role::User,
        }
    }
}

/// Fixed 4-digit admin PIN.
///
/// # Security
/// Comparison runs in constant time so the digit at which a guess diverges
/// cannot be measured.
#[derive(Clone, Copy, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AdminPin([u8; PIN_LENGTH]);

impl AdminPin {
    /// Parse a PIN from exactly four ASCII digits.
    ///
    /// # Errors
    /// Returns `Error::InvalidPin` for any other input.
    pub fn new(pin: &str) -> Result<Self> {
        let bytes = pin.as_bytes();
        if bytes.len() != PIN_LENGTH || !bytes.iter().all(u8::is_ascii_digit) {
            return Err(Error::InvalidPin(format!(
                "PIN must be exactly {PIN_LENGTH} digits"
            )));
        }
        let mut digits = [0u8; PIN_LENGTH];
        for (slot, b) in digits.iter_mut().zip(bytes) {
            *slot = b - b'0';
        }
        Ok(AdminPin(digits))
    }

    /// Compare a sequence of entered digit values (0-9).
    #[must_use]
    pub fn matches(&self, entered: &[u8]) -> bool {
        entered.len() == PIN_LENGTH && bool::from(self.0.ct_eq(entered))
    }
}

impl Default for AdminPin {
    fn default() -> Self {
        AdminPin([1, 2, 3, 4])
    }
}

impl PartialEq for AdminPin {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl fmt::Debug for AdminPin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("AdminPin(****)")
    }
}

impl TryFrom<String> for AdminPin {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        AdminPin::new(&value)
    }
}

impl From<AdminPin> for String {
    fn from(pin: AdminPin) -> String {
        pin.0.iter().map(|d| (b'0' + d) as char).collect()
    }
}

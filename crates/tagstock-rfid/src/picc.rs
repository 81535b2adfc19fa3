//! ISO14443A and MIFARE Classic commands sent to the card.

/// Request command, type A. Sent as a 7-bit short frame.
pub const REQA: u8 = 0x26;
/// Number of valid bits in the REQA short frame.
pub const REQA_BITS: u8 = 7;

/// Anticollision/select command per cascade level.
pub const SEL_CL: [u8; 3] = [0x93, 0x95, 0x97];
/// NVB for an anticollision frame with no known UID bits.
pub const NVB_ANTICOLLISION: u8 = 0x20;
/// NVB for a full select frame.
pub const NVB_SELECT: u8 = 0x70;
/// First UID byte announcing a further cascade level.
pub const CASCADE_TAG: u8 = 0x88;
/// SAK bit: UID not complete.
pub const SAK_CASCADE: u8 = 0x04;

/// Halt, type A.
pub const HLTA: u8 = 0x50;

/// MIFARE authenticate with key A.
pub const MF_AUTH_KEY_A: u8 = 0x60;
/// MIFARE read one 16-byte block.
pub const MF_READ: u8 = 0x30;

/// 4-bit MIFARE ACK value.
pub const MF_ACK: u8 = 0x0A;

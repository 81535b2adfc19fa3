//! Tag acquisition state machine.
//!
//! # States
//!
//! - `Idle`: not started, the reader is left alone.
//! - `Polling`: every poll tick sends REQA.
//! - `Authenticating` / `Reading`: transient, only observable while
//!   [`TagAcquisition::poll`] runs.
//! - `Present`: a tag session is open; polling is suspended until
//!   [`TagAcquisition::release`].
//!
//! # Valid Transitions
//!
//! - Idle → Polling (start)
//! - Polling → Authenticating → Reading → Present (successful read)
//! - Authenticating/Reading → Polling (any failure)
//! - Present → Polling (release)
//!
//! The whole select/authenticate/read exchange runs inside one `poll` call, so
//! no partially read data survives between ticks.

use std::fmt;

use tagstock_core::TagPayload;
use tagstock_hardware::{MifareKey, TagReader, Uid};
use tracing::{debug, info, warn};

use crate::error::{Result, RfidError};
use crate::payload::decode_block;

/// Acquisition state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcquisitionState {
    #[default]
    Idle,
    Polling,
    Authenticating,
    Reading,
    Present,
}

impl fmt::Display for AcquisitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Polling => "polling",
            Self::Authenticating => "authenticating",
            Self::Reading => "reading",
            Self::Present => "present",
        };
        f.write_str(name)
    }
}

/// The tag currently driving a role session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSession {
    pub uid: Uid,
    pub payload: TagPayload,
    /// Block the payload was read from.
    pub block: u8,
    /// Key A that unlocked it.
    pub key: MifareKey,
}

/// Drives a [`TagReader`] through detection, authentication and read.
#[derive(Debug, Clone)]
pub struct TagAcquisition {
    state: AcquisitionState,
    block: u8,
    key: MifareKey,
}

impl TagAcquisition {
    /// Acquisition reading `block` with key A `key`.
    #[must_use]
    pub const fn new(block: u8, key: MifareKey) -> Self {
        Self {
            state: AcquisitionState::Idle,
            block,
            key,
        }
    }

    #[must_use]
    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    /// Begin polling. No effect unless idle.
    pub fn start(&mut self) {
        if self.state == AcquisitionState::Idle {
            self.transition(AcquisitionState::Polling);
        }
    }

    /// Close the tag session and resume polling.
    pub fn release(&mut self) {
        if self.state == AcquisitionState::Present {
            self.transition(AcquisitionState::Polling);
        }
    }

    /// Whether a poll tick would talk to the reader.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.state == AcquisitionState::Polling
    }

    /// One poll tick.
    ///
    /// Returns `Ok(Some(session))` when a tag was read, `Ok(None)` when there
    /// was nothing to do (field empty, not polling, session already open).
    ///
    /// # Errors
    ///
    /// Returns an error if a tag answered but could not be selected,
    /// authenticated, read or decoded. The machine is back in `Polling` and
    /// the card has been halted.
    pub fn poll<R: TagReader>(&mut self, reader: &mut R) -> Result<Option<TagSession>> {
        if self.state != AcquisitionState::Polling {
            return Ok(None);
        }
        if !reader.poll_presence()? {
            return Ok(None);
        }

        match self.acquire(reader) {
            Ok(session) => {
                info!(uid = %session.uid, role = ?session.payload.role(), "tag session opened");
                self.transition(AcquisitionState::Present);
                Ok(Some(session))
            }
            Err(error) => {
                warn!(%error, state = %self.state, "tag acquisition aborted");
                if let Err(halt_error) = reader.halt() {
                    debug!(%halt_error, "halt after failed acquisition");
                }
                self.transition(AcquisitionState::Polling);
                Err(error)
            }
        }
    }

    fn acquire<R: TagReader>(&mut self, reader: &mut R) -> Result<TagSession> {
        let uid = reader.select()?;

        self.transition(AcquisitionState::Authenticating);
        reader.authenticate(self.block, &self.key, &uid)?;

        self.transition(AcquisitionState::Reading);
        let block = reader.read_block(self.block)?;
        reader.halt()?;

        let payload = decode_block(&block).map_err(RfidError::from)?;
        Ok(TagSession {
            uid,
            payload,
            block: self.block,
            key: self.key,
        })
    }

    fn transition(&mut self, next: AcquisitionState) {
        debug!(from = %self.state, to = %next, "tag acquisition");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use tagstock_core::constants::{DEFAULT_TAG_BLOCK, DEFAULT_TAG_KEY};
    use tagstock_core::{BoxData, ProductId};
    use tagstock_hardware::HardwareError;
    use tagstock_hardware::mock::{MockTag, MockTagReader, ReaderFault};

    use super::*;
    use crate::payload::encode_block;

    const UID: [u8; 4] = [0x04, 0x11, 0x22, 0x33];

    fn user_tag() -> MockTag {
        let payload = TagPayload::User(BoxData {
            product: ProductId::new(2).unwrap(),
            amount: 10,
            purchase_value: 3,
            sale_value: 5,
        });
        MockTag::new(UID, encode_block(&payload))
    }

    fn started() -> TagAcquisition {
        let mut acquisition = TagAcquisition::new(DEFAULT_TAG_BLOCK, DEFAULT_TAG_KEY);
        acquisition.start();
        acquisition
    }

    #[test]
    fn test_idle_does_not_poll() {
        let (mut reader, handle) = MockTagReader::new();
        let mut acquisition = TagAcquisition::new(DEFAULT_TAG_BLOCK, DEFAULT_TAG_KEY);

        assert_eq!(acquisition.poll(&mut reader), Ok(None));
        assert_eq!(handle.poll_count(), 0);
    }

    #[test]
    fn test_empty_field() {
        let (mut reader, _handle) = MockTagReader::new();
        let mut acquisition = started();

        assert_eq!(acquisition.poll(&mut reader), Ok(None));
        assert_eq!(acquisition.state(), AcquisitionState::Polling);
    }

    #[test]
    fn test_successful_read_opens_session() {
        let (mut reader, handle) = MockTagReader::new();
        handle.present(user_tag());
        let mut acquisition = started();

        let session = acquisition.poll(&mut reader).unwrap().unwrap();
        assert_eq!(session.uid.as_bytes(), &UID);
        assert_eq!(session.payload.role(), tagstock_core::Role::User);
        assert_eq!(acquisition.state(), AcquisitionState::Present);
        assert!(handle.is_halted());
    }

    #[test]
    fn test_present_suspends_polling() {
        let (mut reader, handle) = MockTagReader::new();
        handle.present(user_tag());
        let mut acquisition = started();
        acquisition.poll(&mut reader).unwrap();

        // a second tag while the session is open is ignored
        handle.present(user_tag());
        let polls = handle.poll_count();
        assert_eq!(acquisition.poll(&mut reader), Ok(None));
        assert_eq!(handle.poll_count(), polls);

        acquisition.release();
        assert!(acquisition.is_polling());
        assert!(acquisition.poll(&mut reader).unwrap().is_some());
    }

    #[test]
    fn test_wrong_key_returns_to_polling() {
        let (mut reader, handle) = MockTagReader::new();
        handle.present(user_tag().with_key([0x00; 6]));
        let mut acquisition = started();

        let error = acquisition.poll(&mut reader).unwrap_err();
        assert!(error.is_authentication());
        assert_eq!(acquisition.state(), AcquisitionState::Polling);
        assert_eq!(handle.halt_count(), 1);
    }

    #[test]
    fn test_read_fault_returns_to_polling() {
        let (mut reader, handle) = MockTagReader::new();
        handle.present(user_tag());
        handle.fail_next(ReaderFault::Read);
        let mut acquisition = started();

        let error = acquisition.poll(&mut reader).unwrap_err();
        assert_eq!(error, RfidError::Reader(HardwareError::timeout(36)));
        assert_eq!(acquisition.state(), AcquisitionState::Polling);
    }

    #[test]
    fn test_bad_payload_is_an_error() {
        let (mut reader, handle) = MockTagReader::new();
        handle.present(MockTag::new(UID, [0u8; 16]));
        let mut acquisition = started();

        let error = acquisition.poll(&mut reader).unwrap_err();
        assert!(matches!(error, RfidError::Payload(_)));
        assert_eq!(acquisition.state(), AcquisitionState::Polling);
    }

    #[test]
    fn test_poll_fault_propagates_without_state_change() {
        let (mut reader, handle) = MockTagReader::new();
        handle.fail_next(ReaderFault::Poll);
        let mut acquisition = started();

        assert!(acquisition.poll(&mut reader).is_err());
        assert!(acquisition.is_polling());
    }
}

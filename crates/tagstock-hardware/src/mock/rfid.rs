//! Mock MIFARE Classic reader.
//!
//! This module provides a simulated reader whose field can be populated with
//! a tag programmatically, for testing the acquisition state machine without
//! a PCD on the bus.

use std::sync::{Arc, Mutex};

use tagstock_core::constants::{DEFAULT_TAG_KEY, TAG_BLOCK_SIZE};

use super::lock;
use crate::error::{HardwareError, Result};
use crate::traits::TagReader;
use crate::types::{MifareKey, Uid};

/// A tag that can be placed in the mock reader's field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockTag {
    pub uid: Vec<u8>,
    /// Contents of the data block the terminal reads.
    pub data: [u8; TAG_BLOCK_SIZE],
    /// Key A of the sector holding that block.
    pub key: MifareKey,
}

impl MockTag {
    /// Tag with a 4-byte UID and the factory transport key.
    pub fn new(uid: [u8; 4], data: [u8; TAG_BLOCK_SIZE]) -> Self {
        Self {
            uid: uid.to_vec(),
            data,
            key: DEFAULT_TAG_KEY,
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: MifareKey) -> Self {
        self.key = key;
        self
    }
}

/// Step of the acquisition sequence to sabotage once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderFault {
    Poll,
    Select,
    Authenticate,
    Read,
}

#[derive(Debug, Default)]
struct ReaderState {
    tag: Option<MockTag>,
    halted: bool,
    authenticated: bool,
    fault: Option<ReaderFault>,
    halts: usize,
    polls: usize,
}

impl ReaderState {
    fn take_fault(&mut self, step: ReaderFault) -> bool {
        if self.fault == Some(step) {
            self.fault = None;
            true
        } else {
            false
        }
    }

    fn awake_tag(&self) -> Option<&MockTag> {
        self.tag.as_ref().filter(|_| !self.halted)
    }
}

/// Mock tag reader.
///
/// A halted tag stays silent until it is presented again, mirroring a card
/// that has to leave the field before it answers REQA.
///
/// # Examples
///
/// ```
/// use tagstock_hardware::TagReader;
/// use tagstock_hardware::mock::{MockTag, MockTagReader};
///
/// let (mut reader, handle) = MockTagReader::new();
/// assert!(!reader.poll_presence().unwrap());
///
/// handle.present(MockTag::new([0x04, 0xAB, 0xCD, 0xEF], [0; 16]));
/// assert!(reader.poll_presence().unwrap());
/// assert_eq!(reader.select().unwrap().to_string(), "04ABCDEF");
/// ```
#[derive(Debug)]
pub struct MockTagReader {
    state: Arc<Mutex<ReaderState>>,
}

impl MockTagReader {
    pub fn new() -> (Self, MockTagReaderHandle) {
        let state = Arc::new(Mutex::new(ReaderState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockTagReaderHandle { state },
        )
    }
}

impl TagReader for MockTagReader {
    fn poll_presence(&mut self) -> Result<bool> {
        let mut state = lock(&self.state);
        state.polls += 1;
        if state.take_fault(ReaderFault::Poll) {
            return Err(HardwareError::bus("injected poll fault"));
        }
        Ok(state.awake_tag().is_some())
    }

    fn select(&mut self) -> Result<Uid> {
        let mut state = lock(&self.state);
        if state.take_fault(ReaderFault::Select) {
            return Err(HardwareError::Collision);
        }
        let tag = state.awake_tag().ok_or(HardwareError::NoCard)?;
        Uid::new(&tag.uid, 0x08)
    }

    fn authenticate(&mut self, block: u8, key: &MifareKey, uid: &Uid) -> Result<()> {
        let mut state = lock(&self.state);
        let injected = state.take_fault(ReaderFault::Authenticate);
        let accepted = state
            .awake_tag()
            .is_some_and(|tag| tag.uid == uid.as_bytes() && tag.key == *key);
        if injected || !accepted {
            state.authenticated = false;
            return Err(HardwareError::AuthenticationFailed { block });
        }
        state.authenticated = true;
        Ok(())
    }

    fn read_block(&mut self, _block: u8) -> Result<[u8; TAG_BLOCK_SIZE]> {
        let mut state = lock(&self.state);
        if state.take_fault(ReaderFault::Read) {
            return Err(HardwareError::timeout(36));
        }
        if !state.authenticated {
            return Err(HardwareError::Nak { code: 0x04 });
        }
        state
            .awake_tag()
            .map(|tag| tag.data)
            .ok_or(HardwareError::NoCard)
    }

    fn halt(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        state.authenticated = false;
        state.halts += 1;
        if state.tag.is_some() {
            state.halted = true;
        }
        Ok(())
    }
}

/// Handle controlling what is in the mock reader's field.
#[derive(Debug, Clone)]
pub struct MockTagReaderHandle {
    state: Arc<Mutex<ReaderState>>,
}

impl MockTagReaderHandle {
    /// Put `tag` in the field, replacing any tag already there.
    pub fn present(&self, tag: MockTag) {
        let mut state = lock(&self.state);
        state.tag = Some(tag);
        state.halted = false;
        state.authenticated = false;
    }

    /// Take the tag out of the field.
    pub fn remove(&self) {
        let mut state = lock(&self.state);
        state.tag = None;
        state.halted = false;
        state.authenticated = false;
    }

    /// Fail the next call of the given step.
    pub fn fail_next(&self, step: ReaderFault) {
        lock(&self.state).fault = Some(step);
    }

    pub fn is_halted(&self) -> bool {
        lock(&self.state).halted
    }

    pub fn halt_count(&self) -> usize {
        lock(&self.state).halts
    }

    pub fn poll_count(&self) -> usize {
        lock(&self.state).polls
    }
}

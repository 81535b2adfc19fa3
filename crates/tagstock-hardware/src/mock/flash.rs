//! Mock NOR flash.

use std::sync::{Arc, Mutex};

use tagstock_core::constants::{
    FLASH_ERASED_BYTE, FLASH_PAGE_SIZE, FLASH_SECTOR_SIZE, LEDGER_FLASH_OFFSET,
};

use super::lock;
use crate::error::{HardwareError, Result};
use crate::traits::FlashDevice;
use crate::types::FlashPage;

#[derive(Debug)]
struct FlashState {
    base: u32,
    data: Vec<u8>,
    erases: usize,
    programs: usize,
    fail_erase: bool,
    fail_program: bool,
}

impl FlashState {
    fn range(&self, offset: u32, len: usize) -> Result<std::ops::Range<usize>> {
        let start = offset
            .checked_sub(self.base)
            .map(|rel| rel as usize)
            .filter(|rel| rel + len <= self.data.len())
            .ok_or_else(|| HardwareError::flash(offset, "outside mapped region"))?;
        Ok(start..start + len)
    }
}

/// Mock flash with NOR semantics.
///
/// Only a window of the address space is backed. Erase sets a whole sector to
/// `0xFF`; programming can only clear bits, so writing a page that was not
/// erased stores `old & new` exactly like the real part.
#[derive(Debug)]
pub struct MockFlash {
    state: Arc<Mutex<FlashState>>,
}

impl MockFlash {
    /// Mock backing the single sector the ledger lives in.
    pub fn new() -> (Self, MockFlashHandle) {
        Self::with_region(LEDGER_FLASH_OFFSET, FLASH_SECTOR_SIZE)
    }

    /// Mock backing `len` erased bytes starting at `base`.
    pub fn with_region(base: u32, len: usize) -> (Self, MockFlashHandle) {
        let state = Arc::new(Mutex::new(FlashState {
            base,
            data: vec![FLASH_ERASED_BYTE; len],
            erases: 0,
            programs: 0,
            fail_erase: false,
            fail_program: false,
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockFlashHandle { state },
        )
    }
}

impl FlashDevice for MockFlash {
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<()> {
        let state = lock(&self.state);
        let range = state.range(offset, buf.len())?;
        buf.copy_from_slice(&state.data[range]);
        Ok(())
    }

    fn erase_sector(&mut self, offset: u32) -> Result<()> {
        let mut state = lock(&self.state);
        if offset as usize % FLASH_SECTOR_SIZE != 0 {
            return Err(HardwareError::flash(offset, "erase not sector aligned"));
        }
        let range = state.range(offset, FLASH_SECTOR_SIZE)?;
        if std::mem::take(&mut state.fail_erase) {
            return Err(HardwareError::flash(offset, "erase failed"));
        }
        state.data[range].fill(FLASH_ERASED_BYTE);
        state.erases += 1;
        Ok(())
    }

    fn write_page(&mut self, offset: u32, page: &FlashPage) -> Result<()> {
        let mut state = lock(&self.state);
        if offset as usize % FLASH_PAGE_SIZE != 0 {
            return Err(HardwareError::flash(offset, "program not page aligned"));
        }
        let range = state.range(offset, FLASH_PAGE_SIZE)?;
        if std::mem::take(&mut state.fail_program) {
            return Err(HardwareError::flash(offset, "program failed"));
        }
        for (cell, byte) in state.data[range].iter_mut().zip(page) {
            *cell &= *byte;
        }
        state.programs += 1;
        Ok(())
    }
}

/// Handle for inspecting and sabotaging a mock flash.
#[derive(Debug, Clone)]
pub struct MockFlashHandle {
    state: Arc<Mutex<FlashState>>,
}

impl MockFlashHandle {
    /// Copy of `len` bytes at `offset`, `None` outside the backed window.
    pub fn read(&self, offset: u32, len: usize) -> Option<Vec<u8>> {
        let state = lock(&self.state);
        let range = state.range(offset, len).ok()?;
        Some(state.data[range].to_vec())
    }

    /// Overwrite raw bytes, bypassing NOR semantics.
    pub fn preload(&self, offset: u32, data: &[u8]) {
        let mut state = lock(&self.state);
        if let Ok(range) = state.range(offset, data.len()) {
            state.data[range].copy_from_slice(data);
        }
    }

    pub fn erase_count(&self) -> usize {
        lock(&self.state).erases
    }

    pub fn program_count(&self) -> usize {
        lock(&self.state).programs
    }

    /// Make the next erase fail without touching the contents.
    pub fn fail_next_erase(&self) {
        lock(&self.state).fail_erase = true;
    }

    /// Make the next page program fail without touching the contents.
    pub fn fail_next_program(&self) {
        lock(&self.state).fail_program = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_erased() {
        let (mut flash, _handle) = MockFlash::new();
        let mut buf = [0u8; 8];
        flash.read(LEDGER_FLASH_OFFSET, &mut buf).unwrap();
        assert_eq!(buf, [0xFF; 8]);
    }

    #[test]
    fn test_program_only_clears_bits() {
        let (mut flash, handle) = MockFlash::new();
        let mut page = [0xFF; FLASH_PAGE_SIZE];
        page[0] = 0xF0;
        flash.write_page(LEDGER_FLASH_OFFSET, &page).unwrap();
        page[0] = 0x0F;
        flash.write_page(LEDGER_FLASH_OFFSET, &page).unwrap();

        assert_eq!(handle.read(LEDGER_FLASH_OFFSET, 1), Some(vec![0x00]));
        assert_eq!(handle.program_count(), 2);

        flash.erase_sector(LEDGER_FLASH_OFFSET).unwrap();
        assert_eq!(handle.read(LEDGER_FLASH_OFFSET, 1), Some(vec![0xFF]));
        assert_eq!(handle.erase_count(), 1);
    }

    #[test]
    fn test_alignment_and_bounds() {
        let (mut flash, _handle) = MockFlash::new();
        let page = [0u8; FLASH_PAGE_SIZE];

        assert!(flash.erase_sector(LEDGER_FLASH_OFFSET + 1).is_err());
        assert!(flash.write_page(LEDGER_FLASH_OFFSET + 3, &page).is_err());
        assert!(flash.write_page(0, &page).is_err());

        let mut buf = [0u8; 4];
        assert!(flash.read(LEDGER_FLASH_OFFSET - 4, &mut buf).is_err());
    }

    #[test]
    fn test_injected_program_failure_leaves_contents() {
        let (mut flash, handle) = MockFlash::new();
        handle.fail_next_program();

        let page = [0u8; FLASH_PAGE_SIZE];
        let error = flash.write_page(LEDGER_FLASH_OFFSET, &page).unwrap_err();
        assert!(matches!(error, HardwareError::Flash { .. }));
        assert_eq!(handle.read(LEDGER_FLASH_OFFSET, 2), Some(vec![0xFF, 0xFF]));

        // only the next operation fails
        flash.write_page(LEDGER_FLASH_OFFSET, &page).unwrap();
        assert_eq!(handle.read(LEDGER_FLASH_OFFSET, 2), Some(vec![0x00, 0x00]));
    }
}

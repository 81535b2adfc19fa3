//! Host stand-ins for the board peripherals the simulator does not mock.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tagstock_core::LedColor;
use tagstock_core::constants::{
    FLASH_ERASED_BYTE, FLASH_PAGE_SIZE, FLASH_SECTOR_SIZE, LCD_COLUMNS, LCD_LINES,
    LEDGER_FLASH_OFFSET,
};
use tagstock_hardware::{
    Clock, FlashDevice, FlashPage, HardwareError, Millis, Result, StatusLed, TextDisplay,
};
use tracing::{debug, info};

/// The ledger sector, mirrored to a file after every erase and program.
#[derive(Debug)]
pub struct FileFlash {
    path: PathBuf,
    data: Vec<u8>,
}

impl FileFlash {
    /// Open `path`, starting from an erased sector if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut data = match fs::read(&path) {
            Ok(data) => data,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(error) => return Err(error),
        };
        data.resize(FLASH_SECTOR_SIZE, FLASH_ERASED_BYTE);
        debug!(path = %path.display(), "flash image opened");
        Ok(Self { path, data })
    }

    fn range(&self, offset: u32, len: usize) -> Result<Range<usize>> {
        offset
            .checked_sub(LEDGER_FLASH_OFFSET)
            .map(|start| start as usize)
            .filter(|start| start + len <= self.data.len())
            .map(|start| start..start + len)
            .ok_or_else(|| HardwareError::flash(offset, "outside the ledger sector"))
    }

    fn persist(&self, offset: u32) -> Result<()> {
        fs::write(&self.path, &self.data)
            .map_err(|error| HardwareError::flash(offset, error.to_string()))
    }
}

impl FlashDevice for FileFlash {
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<()> {
        let range = self.range(offset, buf.len())?;
        buf.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn erase_sector(&mut self, offset: u32) -> Result<()> {
        if offset as usize % FLASH_SECTOR_SIZE != 0 {
            return Err(HardwareError::flash(offset, "erase not sector aligned"));
        }
        let range = self.range(offset, FLASH_SECTOR_SIZE)?;
        self.data[range].fill(FLASH_ERASED_BYTE);
        self.persist(offset)
    }

    fn write_page(&mut self, offset: u32, page: &FlashPage) -> Result<()> {
        if offset as usize % FLASH_PAGE_SIZE != 0 {
            return Err(HardwareError::flash(offset, "program not page aligned"));
        }
        let range = self.range(offset, FLASH_PAGE_SIZE)?;
        for (cell, byte) in self.data[range].iter_mut().zip(page) {
            *cell &= byte;
        }
        self.persist(offset)
    }
}

/// LED that logs its color.
#[derive(Debug, Default)]
pub struct ConsoleLed {
    color: LedColor,
}

impl StatusLed for ConsoleLed {
    fn set_color(&mut self, color: LedColor) {
        if color != self.color {
            info!(?color, bits = color.bits(), "LED");
            self.color = color;
        }
    }
}

/// LCD drawn on stdout whenever its contents change.
#[derive(Debug, Default)]
pub struct ConsoleDisplay {
    lines: [String; LCD_LINES],
}

impl TextDisplay for ConsoleDisplay {
    fn write_line(&mut self, line: usize, text: &str) -> Result<()> {
        let slot = self
            .lines
            .get_mut(line)
            .ok_or_else(|| HardwareError::invalid_data(format!("LCD has no line {line}")))?;
        let text: String = text.chars().take(LCD_COLUMNS).collect();
        if *slot != text {
            *slot = text;
            if line + 1 == LCD_LINES {
                self.draw();
            }
        }
        Ok(())
    }
}

impl ConsoleDisplay {
    fn draw(&self) {
        let border = "-".repeat(LCD_COLUMNS + 2);
        println!("+{border}+");
        for line in &self.lines {
            println!("| {line:<LCD_COLUMNS$} |");
        }
        println!("+{border}+");
    }
}

/// Milliseconds since the simulator started.
#[derive(Debug, Clone, Copy)]
pub struct HostClock {
    start: Instant,
}

impl HostClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for HostClock {
    fn now(&self) -> Millis {
        Millis(u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let path =
            std::env::temp_dir().join(format!("tagstock-{}-{name}.bin", std::process::id()));
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn test_file_flash_starts_erased() {
        let path = scratch("erased");
        let mut flash = FileFlash::open(&path).unwrap();
        let mut buf = [0u8; 8];
        flash.read(LEDGER_FLASH_OFFSET, &mut buf).unwrap();
        assert_eq!(buf, [FLASH_ERASED_BYTE; 8]);
        assert!(!path.exists());
    }

    #[test]
    fn test_file_flash_survives_reopen() {
        let path = scratch("reopen");
        let mut flash = FileFlash::open(&path).unwrap();
        let mut page = [FLASH_ERASED_BYTE; FLASH_PAGE_SIZE];
        page[..4].copy_from_slice(&[1, 2, 3, 4]);
        flash.erase_sector(LEDGER_FLASH_OFFSET).unwrap();
        flash.write_page(LEDGER_FLASH_OFFSET, &page).unwrap();

        let mut reopened = FileFlash::open(&path).unwrap();
        let mut buf = [0u8; 4];
        reopened.read(LEDGER_FLASH_OFFSET, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_file_flash_rejects_out_of_range() {
        let mut flash = FileFlash::open(scratch("range")).unwrap();
        let mut buf = [0u8; 4];
        assert!(flash.read(0, &mut buf).is_err());
        assert!(flash.erase_sector(LEDGER_FLASH_OFFSET + 1).is_err());
        let page = [0u8; FLASH_PAGE_SIZE];
        assert!(flash.write_page(LEDGER_FLASH_OFFSET + 16, &page).is_err());
    }

    #[test]
    fn test_console_display_checks_line() {
        let mut display = ConsoleDisplay::default();
        assert!(display.write_line(0, "hello").is_ok());
        assert!(display.write_line(LCD_LINES, "nope").is_err());
    }
}

//! LCD frames.
//!
//! The idle display cycles through one frame per product followed by a
//! summary of today's traffic, advancing on every display tick:
//!
//! ```text
//! P1 qty 50          ...    Today moved 12
//! B300 S0                   B36 S60
//! ```
//!
//! While a box tag is open its contents replace the rotation.

use std::fmt::{self, Write};

use tagstock_core::constants::{LCD_COLUMNS, LCD_LINES, PRODUCT_COUNT};
use tagstock_core::{BoxData, ProductId};
use tagstock_hardware::{Result, TextDisplay};
use tagstock_storage::{DailyTotals, ProductRecord};

/// One LCD line, silently cut at the display width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line(heapless::String<LCD_COLUMNS>);

impl Line {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Write for Line {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

fn line(args: fmt::Arguments<'_>) -> Line {
    let mut line = Line::default();
    // Line::write_str never fails
    let _ = line.write_fmt(args);
    line
}

/// Both lines of the LCD.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub lines: [Line; LCD_LINES],
}

impl Frame {
    #[must_use]
    pub fn product(id: ProductId, record: &ProductRecord) -> Self {
        Self {
            lines: [
                line(format_args!("P{id} qty {}", record.amount)),
                line(format_args!("B{} S{}", record.purchase_total, record.sale_total)),
            ],
        }
    }

    #[must_use]
    pub fn today(totals: &DailyTotals) -> Self {
        Self {
            lines: [
                line(format_args!("Today moved {}", totals.amount_moved)),
                line(format_args!("B{} S{}", totals.purchases_total, totals.sales_total)),
            ],
        }
    }

    /// Contents of an open box tag.
    #[must_use]
    pub fn tag_box(data: &BoxData) -> Self {
        Self {
            lines: [
                line(format_args!("Box P{} x{}", data.product, data.amount)),
                line(format_args!("B{} S{} A/B?", data.purchase_value, data.sale_value)),
            ],
        }
    }

    /// Push both lines to the LCD.
    ///
    /// # Errors
    ///
    /// Returns the display's error if a line write fails.
    pub fn render(&self, display: &mut impl TextDisplay) -> Result<()> {
        for (index, text) in self.lines.iter().enumerate() {
            display.write_line(index, text.as_str())?;
        }
        Ok(())
    }
}

/// Position in the idle frame cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayRotation {
    index: usize,
}

impl DisplayRotation {
    /// Product frames plus the summary frame.
    pub const FRAMES: usize = PRODUCT_COUNT + 1;

    #[must_use]
    pub const fn new() -> Self {
        Self { index: 0 }
    }

    /// Frame at the current position. Does not advance.
    #[must_use]
    pub fn current(&self, table: &[ProductRecord; PRODUCT_COUNT], today: &DailyTotals) -> Frame {
        match ProductId::from_index(self.index) {
            Some(id) => Frame::product(id, &table[self.index]),
            None => Frame::today(today),
        }
    }

    pub fn advance(&mut self) {
        self.index = (self.index + 1) % Self::FRAMES;
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use tagstock_hardware::mock::MockDisplay;

    use super::*;

    #[test]
    fn test_line_truncates() {
        let text = line(format_args!("{}", "0123456789ABCDEFGHIJ"));
        assert_eq!(text.as_str(), "0123456789ABCDEF");
    }

    #[test]
    fn test_product_frame() {
        let record = ProductRecord {
            amount: 50,
            purchase_total: 300,
            sale_total: 0,
        };
        let frame = Frame::product(ProductId::new(1).unwrap(), &record);
        assert_eq!(frame.lines[0].as_str(), "P1 qty 50");
        assert_eq!(frame.lines[1].as_str(), "B300 S0");
    }

    #[test]
    fn test_tag_box_frame() {
        let data = BoxData {
            product: ProductId::new(2).unwrap(),
            amount: 10,
            purchase_value: 3,
            sale_value: 5,
        };
        let frame = Frame::tag_box(&data);
        assert_eq!(frame.lines[0].as_str(), "Box P2 x10");
        assert_eq!(frame.lines[1].as_str(), "B3 S5 A/B?");
    }

    #[test]
    fn test_rotation_cycles_through_summary() {
        let table = [ProductRecord::default(); PRODUCT_COUNT];
        let today = DailyTotals {
            amount_moved: 12,
            ..DailyTotals::default()
        };
        let mut rotation = DisplayRotation::new();
        for expected in 1..=PRODUCT_COUNT {
            let frame = rotation.current(&table, &today);
            assert!(frame.lines[0].as_str().starts_with(&format!("P{expected} ")));
            rotation.advance();
        }
        assert_eq!(rotation.current(&table, &today).lines[0].as_str(), "Today moved 12");
        rotation.advance();
        assert_eq!(rotation.index(), 0);
    }

    #[test]
    fn test_render() {
        let (mut display, handle) = MockDisplay::new();
        Frame::today(&DailyTotals::default())
            .render(&mut display)
            .unwrap();
        assert_eq!(handle.lines(), ["Today moved 0".to_string(), "B0 S0".to_string()]);
    }
}

//! Host simulator for the tagstock terminal.
//!
//! Runs the real control core against simulated peripherals. Keys and tags
//! are typed on stdin, the hardware alarm is a 10 ms tokio interval and the
//! ledger sector lives in a file.
//!
//! ```text
//! tagstock [config.json] [flash-image]
//! ```

mod command;
mod host;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tagstock_core::ProductId;
use tagstock_hardware::mock::{
    MockKeyMatrix, MockKeyMatrixHandle, MockTag, MockTagReader, MockTagReaderHandle,
};
use tagstock_hardware::{Clock, Millis};
use tagstock_rfid::encode_block;
use tagstock_terminal::{Peripherals, SystemState, TerminalConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::command::{Command, HELP};
use crate::host::{ConsoleDisplay, ConsoleLed, FileFlash, HostClock};

/// How long a typed key stays pressed.
const KEY_HOLD_MS: u64 = 40;
const TICK: Duration = Duration::from_millis(10);
const DEFAULT_FLASH_IMAGE: &str = "tagstock-flash.bin";

type Terminal = SystemState<MockKeyMatrix, MockTagReader, FileFlash, ConsoleLed, ConsoleDisplay>;

struct Simulator {
    terminal: Terminal,
    clock: HostClock,
    keys: MockKeyMatrixHandle,
    reader: MockTagReaderHandle,
    release_at: Option<Millis>,
    next_uid: u32,
}

impl Simulator {
    /// Hardware alarm tick.
    fn tick(&mut self) {
        let now = self.clock.now();
        if self.release_at.is_some_and(|at| now >= at) {
            self.release_at = None;
            self.keys.release();
            self.terminal.on_row_edge(now);
        }
        self.terminal.on_timer(now);
        self.terminal.run_pending(now);
    }

    /// Returns `false` once the user asked to quit.
    fn execute(&mut self, command: Command) -> bool {
        let now = self.clock.now();
        match command {
            Command::Key(key) => {
                if self.release_at.is_some() {
                    warn!(%key, "previous key still held, ignored");
                    return true;
                }
                self.keys.press(key);
                self.terminal.on_column_edge(now);
                self.release_at = Some(now + KEY_HOLD_MS);
            }
            Command::Tag(payload) => {
                self.next_uid = self.next_uid.wrapping_add(1);
                let tag = MockTag::new(self.next_uid.to_be_bytes(), encode_block(&payload));
                self.reader.present(tag);
                self.terminal.on_tag_irq();
            }
            Command::Remove => self.reader.remove(),
            Command::Dump => self.dump(),
            Command::Help => println!("{HELP}"),
            Command::Quit => return false,
        }
        self.terminal.run_pending(now);
        true
    }

    fn dump(&self) {
        let ledger = self.terminal.ledger();
        println!("{:<8} {:>10} {:>10} {:>10}", "", "amount", "purchases", "sales");
        for product in ProductId::all() {
            let record = ledger.record(product);
            println!(
                "{:<8} {:>10} {:>10} {:>10}",
                format!("P{product}"),
                record.amount,
                record.purchase_total,
                record.sale_total
            );
        }
        let today = ledger.today();
        println!(
            "{:<8} {:>10} {:>10} {:>10}",
            "today", today.amount_moved, today.purchases_total, today.sales_total
        );
        println!("session: {:?}", self.terminal.session());
    }
}

fn load_config(path: &str) -> Result<TerminalConfig> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {path}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => load_config(&path)?,
        None => TerminalConfig::default(),
    };
    let flash_path = args
        .next()
        .map_or_else(|| PathBuf::from(DEFAULT_FLASH_IMAGE), PathBuf::from);

    let flash = FileFlash::open(&flash_path)
        .with_context(|| format!("opening flash image {}", flash_path.display()))?;
    let (matrix, keys) = MockKeyMatrix::new();
    let (reader, reader_handle) = MockTagReader::new();
    let peripherals = Peripherals {
        matrix,
        reader,
        led: ConsoleLed::default(),
        display: ConsoleDisplay::default(),
    };
    let terminal = SystemState::new(config, peripherals, flash)?;

    let clock = HostClock::new();
    let mut sim = Simulator {
        terminal,
        clock,
        keys,
        reader: reader_handle,
        release_at: None,
        next_uid: 0,
    };
    sim.terminal.start(clock.now());
    sim.terminal.run_pending(clock.now());
    info!(flash = %flash_path.display(), "simulator ready, type 'help'");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match Command::parse(&line) {
                    Ok(Some(command)) => {
                        if !sim.execute(command) {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(error) => warn!("{error:#}"),
                }
            }
            _ = ticker.tick() => sim.tick(),
        }
    }

    info!("simulator stopped");
    Ok(())
}

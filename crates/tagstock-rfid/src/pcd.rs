//! MFRC522 proximity coupling device driver.
//!
//! Commands are executed by loading the FIFO, writing `CommandReg` and then
//! busy-polling the interrupt request register until the expected bit shows
//! up, the chip's own timer reports silence, or the host-side deadline runs
//! out. There is no scheduler underneath, so these waits stay as plain loops.

use heapless::Vec;
use tagstock_core::constants::{
    CRC_TIMEOUT_MS, RESET_TIMEOUT_MS, TAG_BLOCK_SIZE, TRANSCEIVE_TIMEOUT_MS,
};
use tagstock_hardware::{
    Clock, HardwareError, MifareKey, RegisterBus, Result, TagReader, Uid,
};
use tracing::{debug, trace, warn};

use crate::picc;
use crate::registers::{self as reg, command, error_bits, irq};

/// FIFO capacity of the chip.
const FIFO_SIZE: usize = 64;

/// Data returned by the card for one exchange.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Response {
    pub data: Vec<u8, FIFO_SIZE>,
    /// Valid bits in the last byte, 0 meaning all eight.
    pub valid_bits: u8,
}

/// MFRC522 driver.
///
/// # Examples
///
/// ```no_run
/// # fn demo<B: tagstock_hardware::RegisterBus, C: tagstock_hardware::Clock>(bus: B, clock: C)
/// # -> tagstock_hardware::Result<()> {
/// use tagstock_hardware::TagReader;
/// use tagstock_rfid::Pcd;
///
/// let mut pcd = Pcd::new(bus, clock);
/// pcd.init()?;
/// if pcd.poll_presence()? {
///     let uid = pcd.select()?;
///     println!("card {uid}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Pcd<B, C> {
    bus: B,
    clock: C,
}

impl<B: RegisterBus, C: Clock> Pcd<B, C> {
    pub fn new(bus: B, clock: C) -> Self {
        Self { bus, clock }
    }

    /// Give the bus back.
    pub fn release(self) -> B {
        self.bus
    }

    /// Soft reset and configure the chip for ISO14443A at 106 kBd.
    ///
    /// The internal timer is set to about 25 ms so that a silent field ends a
    /// transceive on the chip side before the host deadline. The IRQ pin is
    /// enabled for receive events.
    ///
    /// # Errors
    ///
    /// Returns an error if the chip does not leave power-down after the
    /// reset or a bus transaction fails.
    pub fn init(&mut self) -> Result<()> {
        self.bus.write_register(reg::COMMAND, command::SOFT_RESET)?;
        let deadline = self.clock.now() + RESET_TIMEOUT_MS;
        while self.bus.read_register(reg::COMMAND)? & reg::POWER_DOWN != 0 {
            if self.clock.now() >= deadline {
                return Err(HardwareError::initialization_failed(
                    "MFRC522 did not wake from soft reset",
                ));
            }
        }

        self.bus.write_register(reg::T_MODE, 0x80)?;
        self.bus.write_register(reg::T_PRESCALER, 0xA9)?;
        self.bus.write_register(reg::T_RELOAD_H, 0x03)?;
        self.bus.write_register(reg::T_RELOAD_L, 0xE8)?;
        self.bus.write_register(reg::TX_ASK, 0x40)?;
        self.bus.write_register(reg::MODE, 0x3D)?;
        self.bus.write_register(reg::MOD_WIDTH, 0x26)?;
        self.bus.write_register(reg::COM_IEN, 0xA0)?;
        self.antenna_on()?;

        let version = self.version()?;
        debug!("MFRC522 ready, version {version:#04x}");
        Ok(())
    }

    /// Content of `VersionReg` (0x91 or 0x92 for genuine parts).
    ///
    /// # Errors
    ///
    /// Returns an error if the bus transaction fails.
    pub fn version(&mut self) -> Result<u8> {
        self.bus.read_register(reg::VERSION)
    }

    /// Switch the antenna drivers on.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus transaction fails.
    pub fn antenna_on(&mut self) -> Result<()> {
        let value = self.bus.read_register(reg::TX_CONTROL)?;
        if value & reg::ANTENNA_ON != reg::ANTENNA_ON {
            self.bus.write_register(reg::TX_CONTROL, value | reg::ANTENNA_ON)?;
        }
        Ok(())
    }

    fn set_bits(&mut self, register: u8, mask: u8) -> Result<()> {
        let value = self.bus.read_register(register)?;
        self.bus.write_register(register, value | mask)
    }

    fn clear_bits(&mut self, register: u8, mask: u8) -> Result<()> {
        let value = self.bus.read_register(register)?;
        self.bus.write_register(register, value & !mask)
    }

    /// Compute CRC_A over `data` with the coprocessor.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Timeout`] if the coprocessor does not finish
    /// within its budget.
    pub fn calculate_crc(&mut self, data: &[u8]) -> Result<[u8; 2]> {
        self.bus.write_register(reg::COMMAND, command::IDLE)?;
        self.bus.write_register(reg::DIV_IRQ, reg::CRC_IRQ)?;
        self.bus.write_register(reg::FIFO_LEVEL, reg::FLUSH_BUFFER)?;
        self.bus.write_fifo(reg::FIFO_DATA, data)?;
        self.bus.write_register(reg::COMMAND, command::CALC_CRC)?;

        let deadline = self.clock.now() + CRC_TIMEOUT_MS;
        loop {
            if self.bus.read_register(reg::DIV_IRQ)? & reg::CRC_IRQ != 0 {
                self.bus.write_register(reg::COMMAND, command::IDLE)?;
                let low = self.bus.read_register(reg::CRC_RESULT_L)?;
                let high = self.bus.read_register(reg::CRC_RESULT_H)?;
                return Ok([low, high]);
            }
            if self.clock.now() >= deadline {
                return Err(HardwareError::timeout(CRC_TIMEOUT_MS));
            }
        }
    }

    /// Run `cmd` with `send` in the FIFO and wait for one of `wait_irq`.
    fn communicate(
        &mut self,
        cmd: u8,
        wait_irq: u8,
        send: &[u8],
        tx_last_bits: u8,
    ) -> Result<Response> {
        self.bus.write_register(reg::COMMAND, command::IDLE)?;
        self.bus.write_register(reg::COM_IRQ, irq::CLEAR_ALL)?;
        self.bus.write_register(reg::FIFO_LEVEL, reg::FLUSH_BUFFER)?;
        self.bus.write_fifo(reg::FIFO_DATA, send)?;
        self.bus.write_register(reg::BIT_FRAMING, tx_last_bits & 0x07)?;
        self.bus.write_register(reg::COMMAND, cmd)?;
        if cmd == command::TRANSCEIVE {
            self.set_bits(reg::BIT_FRAMING, reg::START_SEND)?;
        }

        let deadline = self.clock.now() + TRANSCEIVE_TIMEOUT_MS;
        loop {
            let irq_bits = self.bus.read_register(reg::COM_IRQ)?;
            if irq_bits & wait_irq != 0 {
                break;
            }
            if irq_bits & irq::TIMER != 0 {
                self.clear_bits(reg::BIT_FRAMING, reg::START_SEND)?;
                return Err(HardwareError::NoCard);
            }
            if self.clock.now() >= deadline {
                self.clear_bits(reg::BIT_FRAMING, reg::START_SEND)?;
                return Err(HardwareError::timeout(TRANSCEIVE_TIMEOUT_MS));
            }
        }
        self.clear_bits(reg::BIT_FRAMING, reg::START_SEND)?;

        let errors = self.bus.read_register(reg::ERROR)?;
        if errors & error_bits::FATAL != 0 {
            return Err(HardwareError::communication(format!(
                "ErrorReg {errors:#04x}"
            )));
        }

        let mut response = Response::default();
        if cmd == command::TRANSCEIVE {
            let level = usize::from(self.bus.read_register(reg::FIFO_LEVEL)?).min(FIFO_SIZE);
            let mut buf = [0u8; FIFO_SIZE];
            self.bus.read_fifo(reg::FIFO_DATA, &mut buf[..level])?;
            response.data = Vec::from_slice(&buf[..level])
                .map_err(|_| HardwareError::invalid_data("FIFO overrun"))?;
            response.valid_bits = self.bus.read_register(reg::CONTROL)? & reg::RX_LAST_BITS;
        }

        if errors & error_bits::COLLISION != 0 {
            return Err(HardwareError::Collision);
        }
        Ok(response)
    }

    /// Transceive a frame, optionally checking and stripping the CRC_A the
    /// card appended.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::NoCard`] if the card stays silent,
    /// [`HardwareError::Nak`] for a 4-bit NAK, [`HardwareError::CrcMismatch`]
    /// for a corrupted response.
    pub fn transceive(&mut self, send: &[u8], tx_last_bits: u8, check_crc: bool) -> Result<Response> {
        let mut response = self.communicate(
            command::TRANSCEIVE,
            irq::RX | irq::IDLE,
            send,
            tx_last_bits,
        )?;
        trace!(sent = ?send, received = ?response.data.as_slice(), "transceive");

        if !check_crc {
            return Ok(response);
        }
        if response.data.len() == 1 && response.valid_bits == 4 {
            return Err(HardwareError::Nak {
                code: response.data[0],
            });
        }
        if response.data.len() < 2 || response.valid_bits != 0 {
            return Err(HardwareError::invalid_data("response too short for CRC_A"));
        }
        let body = response.data.len() - 2;
        let expected = self.calculate_crc(&response.data[..body])?;
        if response.data[body..] != expected {
            return Err(HardwareError::CrcMismatch);
        }
        response.data.truncate(body);
        Ok(response)
    }

    /// Transceive `frame` followed by its CRC_A.
    fn transceive_with_crc(&mut self, frame: &[u8], check_crc: bool) -> Result<Response> {
        let crc = self.calculate_crc(frame)?;
        let mut buf: Vec<u8, 18> = Vec::new();
        buf.extend_from_slice(frame)
            .and_then(|()| buf.extend_from_slice(&crc))
            .map_err(|()| HardwareError::invalid_data("frame too long"))?;
        self.transceive(&buf, 0, check_crc)
    }

    /// Leave the MIFARE encrypted state.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus transaction fails.
    pub fn stop_crypto(&mut self) -> Result<()> {
        self.clear_bits(reg::STATUS2, reg::MF_CRYPTO1_ON)
    }

    fn select_level(&mut self, level: usize) -> Result<([u8; 4], u8)> {
        let sel = picc::SEL_CL[level];

        self.clear_bits(reg::COLL, reg::VALUES_AFTER_COLL)?;
        let answer = self.transceive(&[sel, picc::NVB_ANTICOLLISION], 0, false)?;
        if answer.data.len() != 5 {
            return Err(HardwareError::invalid_data(format!(
                "anticollision answer of {} bytes",
                answer.data.len()
            )));
        }
        let mut part = [0u8; 4];
        part.copy_from_slice(&answer.data[..4]);
        let bcc = part.iter().fold(0u8, |acc, b| acc ^ b);
        if bcc != answer.data[4] {
            return Err(HardwareError::communication("UID check byte mismatch"));
        }

        let frame = [
            sel,
            picc::NVB_SELECT,
            part[0],
            part[1],
            part[2],
            part[3],
            bcc,
        ];
        let sak = self.transceive_with_crc(&frame, true)?;
        let sak = *sak
            .data
            .first()
            .ok_or_else(|| HardwareError::invalid_data("empty SAK"))?;
        Ok((part, sak))
    }
}

impl<B: RegisterBus, C: Clock> TagReader for Pcd<B, C> {
    fn poll_presence(&mut self) -> Result<bool> {
        self.clear_bits(reg::COLL, reg::VALUES_AFTER_COLL)?;
        match self.transceive(&[picc::REQA], picc::REQA_BITS, false) {
            Ok(atqa) => Ok(atqa.data.len() == 2 && atqa.valid_bits == 0),
            Err(HardwareError::Collision) => Ok(true),
            Err(error @ HardwareError::Bus { .. }) => Err(error),
            Err(_) => Ok(false),
        }
    }

    fn select(&mut self) -> Result<Uid> {
        let mut uid: Vec<u8, 12> = Vec::new();
        for level in 0..picc::SEL_CL.len() {
            let (part, sak) = self.select_level(level)?;
            let cascades = sak & picc::SAK_CASCADE != 0;
            let bytes = if cascades && part[0] == picc::CASCADE_TAG {
                &part[1..]
            } else {
                &part[..]
            };
            uid.extend_from_slice(bytes)
                .map_err(|()| HardwareError::invalid_data("UID too long"))?;
            if !cascades {
                return Uid::new(&uid, sak);
            }
        }
        Err(HardwareError::invalid_data("SAK announces a fourth cascade level"))
    }

    fn authenticate(&mut self, block: u8, key: &MifareKey, uid: &Uid) -> Result<()> {
        let mut frame = [0u8; 12];
        frame[0] = picc::MF_AUTH_KEY_A;
        frame[1] = block;
        frame[2..8].copy_from_slice(key);
        frame[8..].copy_from_slice(&uid.auth_bytes());

        match self.communicate(command::MF_AUTHENT, irq::IDLE, &frame, 0) {
            Ok(_) => {}
            Err(error @ HardwareError::Bus { .. }) => return Err(error),
            Err(error) => {
                warn!(block, %error, "MIFARE authentication aborted");
                return Err(HardwareError::AuthenticationFailed { block });
            }
        }
        if self.bus.read_register(reg::STATUS2)? & reg::MF_CRYPTO1_ON == 0 {
            return Err(HardwareError::AuthenticationFailed { block });
        }
        Ok(())
    }

    fn read_block(&mut self, block: u8) -> Result<[u8; TAG_BLOCK_SIZE]> {
        let response = self.transceive_with_crc(&[picc::MF_READ, block], true)?;
        response
            .data
            .as_slice()
            .try_into()
            .map_err(|_| {
                HardwareError::invalid_data(format!(
                    "block {block} read returned {} bytes",
                    response.data.len()
                ))
            })
    }

    fn halt(&mut self) -> Result<()> {
        self.stop_crypto()?;
        match self.transceive_with_crc(&[picc::HLTA, 0x00], false) {
            // a halted card stays silent
            Err(HardwareError::NoCard | HardwareError::Timeout { .. }) => Ok(()),
            Err(error) => Err(error),
            Ok(_) => Err(HardwareError::invalid_data("card answered HLTA")),
        }
    }
}

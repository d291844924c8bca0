//! rcard-dummy - In-memory reader chip emulator for testing
//!
//! This crate provides a dummy bus that emulates an MFRC522-class chip's
//! register file and FIFO behind the `BusTransport` trait. It's useful
//! for exercising the command engine and protocol operations without
//! real hardware.

#![cfg_attr(not(feature = "std"), no_std)]

use heapless::Deque;

use rcard_core::bus::BusTransport;
use rcard_core::command::PcdCommand;
use rcard_core::error::{Error, Result};
use rcard_core::register::{ChipProfile, FIFO_CAPACITY};

const PROFILE: ChipProfile = ChipProfile::MFRC522;

// ComIrqReg bits the emulator raises
const IRQ_TIMER: u8 = 0x01;
const IRQ_IDLE: u8 = 0x10;
const IRQ_RX: u8 = 0x20;

/// Configuration for the emulated chip
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Answer-to-request bytes returned to a presence probe
    pub atqa: [u8; 2],
    /// Whether a tag is in the field; when false the timer expires
    pub tag_present: bool,
    /// Never raise a completion bit, forcing the poll budget to run out
    pub hang: bool,
    /// Error register contents after a command completes
    pub error_bits: u8,
    /// ControlReg RxLastBits after a receive (0 = whole final byte valid)
    pub rx_last_bits: u8,
    /// Override the reported FIFO level instead of the actual count
    pub fifo_level: Option<u8>,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            atqa: [0x04, 0x00], // MIFARE Classic 1K style answer
            tag_present: true,
            hang: false,
            error_bits: 0,
            rx_last_bits: 0,
            fifo_level: None,
        }
    }
}

/// Emulated MFRC522-class chip
///
/// Decodes the two-byte register frames of the wire protocol, keeps a
/// register file and FIFO, and raises completion interrupts the way the
/// real chip does: MFAuthent completes when the command register is
/// written, Transceive when StartSend is set in the bit-framing register.
pub struct DummyPcd {
    config: DummyConfig,
    regs: [u8; 64],
    fifo: Deque<u8, FIFO_CAPACITY>,
    /// Bytes received over transmit-only writes (the shutdown signal)
    shutdown_bytes: heapless::Vec<u8, 16>,
    /// Number of transmit-only writes seen
    write_calls: usize,
}

impl DummyPcd {
    /// Create a new emulated chip with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        Self {
            config,
            regs: [0; 64],
            fifo: Deque::new(),
            shutdown_bytes: heapless::Vec::new(),
            write_calls: 0,
        }
    }

    /// Create a new emulated chip with a tag in the field
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Bytes received over transmit-only writes
    pub fn shutdown_bytes(&self) -> &[u8] {
        &self.shutdown_bytes
    }

    /// Number of transmit-only writes seen
    pub fn write_calls(&self) -> usize {
        self.write_calls
    }

    /// Raw register view, for assertions
    pub fn register(&self, addr: u8) -> u8 {
        self.regs[addr as usize]
    }

    fn read_reg(&mut self, addr: u8) -> u8 {
        if addr == PROFILE.fifo_data_reg {
            self.fifo.pop_front().unwrap_or(0)
        } else if addr == PROFILE.fifo_level_reg {
            self.config.fifo_level.unwrap_or(self.fifo.len() as u8)
        } else {
            self.regs[addr as usize]
        }
    }

    fn write_reg(&mut self, addr: u8, value: u8) {
        if addr == PROFILE.command_reg {
            self.regs[addr as usize] = value;
            if value == PcdCommand::MfAuthent.code() {
                self.finish_authent();
            }
            // Transceive waits for StartSend before anything happens
        } else if addr == PROFILE.bit_framing_reg {
            self.regs[addr as usize] = value;
            let transceive_pending =
                self.regs[PROFILE.command_reg as usize] == PcdCommand::Transceive.code();
            if value & 0x80 != 0 && transceive_pending {
                self.run_transceive();
            }
        } else if addr == PROFILE.fifo_level_reg {
            // bit 7 is FlushBuffer
            if value & 0x80 != 0 {
                self.fifo.clear();
            }
            self.regs[addr as usize] = value & 0x7F;
        } else if addr == PROFILE.fifo_data_reg {
            let _ = self.fifo.push_back(value);
        } else if addr == PROFILE.irq_reg {
            // Set1 semantics: bit 7 set -> raise the masked bits,
            // bit 7 clear -> clear them. Bit 7 itself is never stored.
            if value & 0x80 != 0 {
                self.regs[addr as usize] |= value & 0x7F;
            } else {
                self.regs[addr as usize] &= !(value & 0x7F);
            }
        } else {
            self.regs[addr as usize] = value;
        }
    }

    fn finish_authent(&mut self) {
        if self.config.hang {
            return;
        }
        self.fifo.clear();
        self.regs[PROFILE.error_reg as usize] = self.config.error_bits;
        self.regs[PROFILE.irq_reg as usize] |= IRQ_IDLE;
    }

    fn run_transceive(&mut self) {
        if self.config.hang {
            return;
        }
        // the transmitted frame leaves the FIFO either way
        self.fifo.clear();
        if !self.config.tag_present {
            self.regs[PROFILE.irq_reg as usize] |= IRQ_TIMER;
            return;
        }
        for byte in self.config.atqa {
            let _ = self.fifo.push_back(byte);
        }
        self.regs[PROFILE.control_reg as usize] = self.config.rx_last_bits & 0x07;
        self.regs[PROFILE.error_reg as usize] = self.config.error_bits;
        self.regs[PROFILE.irq_reg as usize] |= IRQ_RX | IRQ_IDLE;
    }
}

impl BusTransport for DummyPcd {
    fn transfer(&mut self, buf: &mut [u8]) -> Result<()> {
        // the wire protocol is strictly [address, data] frames
        if buf.len() != 2 {
            log::warn!("dummy: unexpected frame length {}", buf.len());
            return Err(Error::Transfer);
        }
        let addr = (buf[0] & 0x7E) >> 1;
        if buf[0] & 0x80 != 0 {
            buf[1] = self.read_reg(addr);
        } else {
            self.write_reg(addr, buf[1]);
        }
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.write_calls += 1;
        for &byte in data {
            let _ = self.shutdown_bytes.push(byte);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcard_core::picc;
    use rcard_core::reader::{CardReader, Reader, Status};

    #[test]
    fn test_request_mode_detects_tag() {
        let mut reader = Reader::new(DummyPcd::new_default());
        assert_eq!(reader.request_mode(picc::REQ_IDLE).unwrap(), 16);
    }

    #[test]
    fn test_transact_returns_atqa_bytes() {
        let mut reader = Reader::new(DummyPcd::new_default());
        reader
            .write_register(ChipProfile::MFRC522.bit_framing_reg, 0x07)
            .unwrap();
        let exchange = reader
            .transact(PcdCommand::Transceive, &[picc::REQ_IDLE])
            .unwrap();
        assert_eq!(exchange.status, Status::Ok);
        assert_eq!(exchange.bit_len, 16);
        assert_eq!(exchange.data.as_slice(), [0x04, 0x00]);
    }

    #[test]
    fn test_absent_tag_reports_no_tag() {
        let config = DummyConfig {
            tag_present: false,
            ..Default::default()
        };
        let mut reader = Reader::new(DummyPcd::new(config));
        let exchange = reader
            .transact(PcdCommand::Transceive, &[picc::REQ_IDLE])
            .unwrap();
        assert_eq!(exchange.status, Status::NoTag);
        assert_eq!(reader.request_mode(picc::REQ_IDLE), Err(Error::NoTag));
    }

    #[test]
    fn test_hung_chip_exhausts_poll_budget() {
        let config = DummyConfig {
            hang: true,
            ..Default::default()
        };
        let mut reader = Reader::new(DummyPcd::new(config));
        let exchange = reader
            .transact(PcdCommand::Transceive, &[picc::REQ_IDLE])
            .unwrap();
        assert_eq!(exchange.status, Status::Error);
        assert_eq!(exchange.bit_len, -1);
        assert!(exchange.data.is_empty());
        assert_eq!(reader.request_mode(picc::REQ_IDLE), Err(Error::NoTag));
    }

    #[test]
    fn test_fatal_error_bits_fail_the_command() {
        // collision is inside the fatal mask
        let config = DummyConfig {
            error_bits: 0x08,
            ..Default::default()
        };
        let mut reader = Reader::new(DummyPcd::new(config));
        let exchange = reader
            .transact(PcdCommand::Transceive, &[picc::REQ_IDLE])
            .unwrap();
        assert_eq!(exchange.status, Status::Error);
        assert_eq!(exchange.bit_len, -1);
        assert!(exchange.data.is_empty());
    }

    #[test]
    fn test_crc_error_bit_is_not_fatal() {
        // 0x04 is outside the 0x1B mask; short frames carry no CRC
        let config = DummyConfig {
            error_bits: 0x04,
            ..Default::default()
        };
        let mut reader = Reader::new(DummyPcd::new(config));
        let exchange = reader
            .transact(PcdCommand::Transceive, &[picc::REQ_IDLE])
            .unwrap();
        assert_eq!(exchange.status, Status::Ok);
        assert_eq!(exchange.bit_len, 16);
    }

    #[test]
    fn test_empty_fifo_drains_one_byte() {
        let config = DummyConfig {
            fifo_level: Some(0),
            ..Default::default()
        };
        let mut reader = Reader::new(DummyPcd::new(config));
        let exchange = reader
            .transact(PcdCommand::Transceive, &[picc::REQ_IDLE])
            .unwrap();
        assert_eq!(exchange.status, Status::Ok);
        assert_eq!(exchange.bit_len, 0);
        assert_eq!(exchange.data.len(), 1);
    }

    #[test]
    fn test_drain_stops_at_fifo_depth() {
        // a misbehaving chip reporting more bytes than the FIFO holds
        // must not over-drain
        let config = DummyConfig {
            fifo_level: Some(200),
            ..Default::default()
        };
        let mut reader = Reader::new(DummyPcd::new(config));
        let exchange = reader
            .transact(PcdCommand::Transceive, &[picc::REQ_IDLE])
            .unwrap();
        assert_eq!(exchange.status, Status::Ok);
        assert_eq!(
            exchange.data.len(),
            ChipProfile::MFRC522.fifo_depth as usize
        );
        // the bit length reflects the reported level, not the drain clamp
        assert_eq!(exchange.bit_len, 200 * 8);
    }

    #[test]
    fn test_partial_final_byte_bit_length() {
        let config = DummyConfig {
            rx_last_bits: 4,
            ..Default::default()
        };
        let mut reader = Reader::new(DummyPcd::new(config));
        let exchange = reader
            .transact(PcdCommand::Transceive, &[picc::REQ_IDLE])
            .unwrap();
        assert_eq!(exchange.status, Status::Ok);
        // two bytes received, four valid bits in the second
        assert_eq!(exchange.bit_len, 12);
        // a 12-bit answer is not a valid ATQA
        assert_eq!(reader.request_mode(picc::REQ_IDLE), Err(Error::NoTag));
    }

    #[test]
    fn test_authent_completes_without_response_data() {
        let mut reader = Reader::new(DummyPcd::new_default());
        let exchange = reader
            .transact(PcdCommand::MfAuthent, &[0x60, 0x04])
            .unwrap();
        assert_eq!(exchange.status, Status::Ok);
        assert_eq!(exchange.bit_len, 0);
    }

    #[test]
    fn test_release_shuts_the_bus_down() {
        let mut chip = DummyPcd::new_default();
        let mut reader = Reader::new(&mut chip);
        assert_eq!(reader.request_mode(picc::REQ_IDLE).unwrap(), 16);
        reader.release().unwrap();
        assert_eq!(reader.request_mode(picc::REQ_IDLE), Err(Error::Released));
        drop(reader);
        assert_eq!(chip.write_calls(), 1);
        assert_eq!(chip.shutdown_bytes(), [0x00]);
    }

    #[test]
    fn test_scan_reaches_the_unimplemented_cascade() {
        let mut reader = Reader::new(DummyPcd::new_default());
        assert_eq!(reader.scan(), Err(Error::Unsupported));
    }
}

//! Chip command set and interrupt bit definitions

use bitflags::bitflags;

bitflags! {
    /// Interrupt sources shared by the IRQ enable and IRQ status
    /// registers (bits 0-6; bit 7 has register-specific meaning and is
    /// not part of this set).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ComIrq: u8 {
        /// Timer ran down to zero; for Transceive this means nothing
        /// answered within the configured window.
        const TIMER    = 1 << 0;
        /// Error register has a bit set.
        const ERR      = 1 << 1;
        /// FIFO level dropped below the low-water mark.
        const LO_ALERT = 1 << 2;
        /// FIFO level rose above the high-water mark.
        const HI_ALERT = 1 << 3;
        /// Command terminated and the chip returned to idle.
        const IDLE     = 1 << 4;
        /// Receiver detected the end of a valid data stream.
        const RX       = 1 << 5;
        /// Last bit of the transmission went out.
        const TX       = 1 << 6;
    }
}

bitflags! {
    /// Error register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ErrorFlags: u8 {
        /// SOF/EOF protocol violation
        const PROTOCOL    = 1 << 0;
        /// Parity check failed
        const PARITY      = 1 << 1;
        /// CRC check failed
        const CRC         = 1 << 2;
        /// Bit collision detected
        const COLL        = 1 << 3;
        /// FIFO overflowed
        const BUFFER_OVFL = 1 << 4;
        /// Internal temperature sensor tripped
        const TEMP        = 1 << 6;
        /// FIFO was written during an invalid command phase
        const WR          = 1 << 7;

        /// Bits that abort a command. CRC is intentionally outside this
        /// mask: short frames carry no CRC.
        const FATAL = Self::PROTOCOL.bits()
            | Self::PARITY.bits()
            | Self::COLL.bits()
            | Self::BUFFER_OVFL.bits();
    }
}

/// Commands the chip's command register accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PcdCommand {
    /// Cancel the running command and idle the chip.
    Idle = 0x00,
    /// Store 25 bytes into the internal buffer.
    Mem = 0x01,
    /// Generate a 10-byte random ID number.
    GenerateRandomId = 0x02,
    /// Activate the CRC coprocessor over the FIFO contents.
    CalcCrc = 0x03,
    /// Transmit the FIFO contents.
    Transmit = 0x04,
    /// Modify the command register without changing the command.
    NoCmdChange = 0x07,
    /// Activate the receiver.
    Receive = 0x08,
    /// Transmit the FIFO contents and activate the receiver after the
    /// transmission ends.
    Transceive = 0x0C,
    /// MIFARE Crypto1 authentication as a reader.
    MfAuthent = 0x0E,
    /// Soft reset.
    SoftReset = 0x0F,
}

impl PcdCommand {
    /// The command register value for this command.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// IRQ sources armed while this command runs, and the subset whose
    /// assertion means the command has run to completion.
    pub(crate) fn irq_masks(self) -> (ComIrq, ComIrq) {
        match self {
            // 0x12 / 0x10
            PcdCommand::MfAuthent => (ComIrq::IDLE | ComIrq::ERR, ComIrq::IDLE),
            // 0x77 / 0x30
            PcdCommand::Transceive => (
                ComIrq::TX
                    | ComIrq::RX
                    | ComIrq::IDLE
                    | ComIrq::LO_ALERT
                    | ComIrq::ERR
                    | ComIrq::TIMER,
                ComIrq::RX | ComIrq::IDLE,
            ),
            _ => (ComIrq::empty(), ComIrq::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_irq_masks_match_chip_values() {
        let (en, wait) = PcdCommand::MfAuthent.irq_masks();
        assert_eq!(en.bits(), 0x12);
        assert_eq!(wait.bits(), 0x10);

        let (en, wait) = PcdCommand::Transceive.irq_masks();
        assert_eq!(en.bits(), 0x77);
        assert_eq!(wait.bits(), 0x30);

        let (en, wait) = PcdCommand::Idle.irq_masks();
        assert_eq!(en.bits(), 0x00);
        assert_eq!(wait.bits(), 0x00);
    }

    #[test]
    fn test_fatal_error_mask() {
        assert_eq!(ErrorFlags::FATAL.bits(), 0x1B);
        assert!(!ErrorFlags::FATAL.contains(ErrorFlags::CRC));
    }
}

//! Linux SPI device implementation
//!
//! This module provides the `SpidevBus` struct that implements the
//! `BusTransport` trait using Linux's spidev interface.

use crate::error::{Result, SpidevError};

use rcard_core::bus::BusTransport;
use rcard_core::error::{Error as CoreError, Result as CoreResult};

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;

/// Default SPI clock speed in Hz (1 MHz; the chip tops out at 10 MHz)
const DEFAULT_SPEED_HZ: u32 = 1_000_000;

/// SPI mode constants
pub mod mode {
    /// SPI mode 0: CPOL=0, CPHA=0 (the only mode the MFRC522 speaks)
    pub const MODE_0: u8 = 0;
    /// SPI mode 1: CPOL=0, CPHA=1
    pub const MODE_1: u8 = 1;
    /// SPI mode 2: CPOL=1, CPHA=0
    pub const MODE_2: u8 = 2;
    /// SPI mode 3: CPOL=1, CPHA=1
    pub const MODE_3: u8 = 3;
}

/// Linux spidev ioctl constants
mod ioctl {
    use nix::ioctl_write_ptr;

    // SPI ioctl magic number
    const SPI_IOC_MAGIC: u8 = b'k';

    // SPI ioctl type numbers
    const SPI_IOC_TYPE_MODE: u8 = 1;
    const SPI_IOC_TYPE_BITS_PER_WORD: u8 = 3;
    const SPI_IOC_TYPE_MAX_SPEED_HZ: u8 = 4;

    // Generate ioctl functions
    ioctl_write_ptr!(spi_ioc_wr_mode, SPI_IOC_MAGIC, SPI_IOC_TYPE_MODE, u8);
    ioctl_write_ptr!(
        spi_ioc_wr_bits_per_word,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_BITS_PER_WORD,
        u8
    );
    ioctl_write_ptr!(
        spi_ioc_wr_max_speed_hz,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_MAX_SPEED_HZ,
        u32
    );

    // SPI_IOC_MESSAGE ioctl number calculation
    // This is SPI_IOC_MESSAGE(n) = _IOW(SPI_IOC_MAGIC, 0, char[SPI_MSGSIZE(n)])
    // where SPI_MSGSIZE(n) = (n) * sizeof(struct spi_ioc_transfer)

    /// Size of spi_ioc_transfer struct (for 64-bit systems)
    pub const SPI_IOC_TRANSFER_SIZE: usize = 32;

    /// Calculate ioctl number for SPI_IOC_MESSAGE(n)
    pub fn spi_ioc_message(n: u8) -> libc::c_ulong {
        let size = (n as usize) * SPI_IOC_TRANSFER_SIZE;
        // _IOW = _IOC(_IOC_WRITE, type, nr, size)
        // _IOC_WRITE = 1
        // _IOC(dir, type, nr, size) = ((dir)<<30)|((size)<<16)|((type)<<8)|(nr)
        ((1u32 << 30) | ((size as u32) << 16) | ((SPI_IOC_MAGIC as u32) << 8)) as libc::c_ulong
    }
}

/// SPI transfer structure for ioctl
/// This must match the kernel's struct spi_ioc_transfer layout
#[repr(C)]
#[derive(Debug, Default, Clone)]
struct SpiIocTransfer {
    tx_buf: u64,          // __u64 tx_buf
    rx_buf: u64,          // __u64 rx_buf
    len: u32,             // __u32 len
    speed_hz: u32,        // __u32 speed_hz
    delay_usecs: u16,     // __u16 delay_usecs
    bits_per_word: u8,    // __u8 bits_per_word
    cs_change: u8,        // __u8 cs_change
    tx_nbits: u8,         // __u8 tx_nbits
    rx_nbits: u8,         // __u8 rx_nbits
    word_delay_usecs: u8, // __u8 word_delay_usecs
    _pad: u8,             // padding
}

/// Configuration for opening a Linux SPI device
#[derive(Debug, Clone)]
pub struct SpidevConfig {
    /// Device path (e.g., "/dev/spidev0.0")
    pub device: String,
    /// SPI clock speed in Hz (default: 1 MHz)
    pub speed_hz: u32,
    /// SPI mode (0-3, default: 0)
    pub mode: u8,
}

impl Default for SpidevConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            speed_hz: DEFAULT_SPEED_HZ,
            mode: mode::MODE_0,
        }
    }
}

impl SpidevConfig {
    /// Create a new configuration with the given device path
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }

    /// Set the SPI clock speed in Hz
    pub fn with_speed(mut self, speed_hz: u32) -> Self {
        self.speed_hz = speed_hz;
        self
    }

    /// Set the SPI mode (0-3)
    pub fn with_mode(mut self, mode: u8) -> Self {
        self.mode = mode;
        self
    }
}

/// Linux SPI bus handle using the spidev interface
///
/// This struct implements the `BusTransport` trait for Linux systems
/// using the `/dev/spidevX.Y` device interface. The handle spans one
/// capture/release cycle; dropping it closes the device.
pub struct SpidevBus {
    /// File handle for spidev device
    file: File,
    /// Current speed in Hz
    speed_hz: u32,
}

impl SpidevBus {
    /// Open a Linux SPI device with the given configuration
    pub fn open(config: &SpidevConfig) -> Result<Self> {
        if config.device.is_empty() {
            return Err(SpidevError::NoDevice);
        }
        if config.mode > 3 {
            return Err(SpidevError::InvalidParameter(format!(
                "SPI mode {} out of range (0-3)",
                config.mode
            )));
        }

        log::debug!("spidev: Opening device {}", config.device);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.device)
            .map_err(|e| SpidevError::OpenFailed {
                path: config.device.clone(),
                source: e,
            })?;

        let fd = file.as_raw_fd();

        // Set SPI mode
        let mode = config.mode;
        unsafe {
            ioctl::spi_ioc_wr_mode(fd, &mode).map_err(|e| SpidevError::SetModeFailed {
                mode,
                source: std::io::Error::from_raw_os_error(e as i32),
            })?;
        }

        // Set bits per word (always 8)
        let bits: u8 = 8;
        unsafe {
            ioctl::spi_ioc_wr_bits_per_word(fd, &bits).map_err(|e| {
                SpidevError::SetBitsPerWordFailed {
                    bits,
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }

        // Set clock speed
        let speed = config.speed_hz;
        unsafe {
            ioctl::spi_ioc_wr_max_speed_hz(fd, &speed).map_err(|e| {
                SpidevError::SetSpeedFailed {
                    speed,
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }

        log::info!(
            "spidev: Opened {} (mode={}, speed={} kHz)",
            config.device,
            mode,
            speed / 1000
        );

        Ok(Self {
            file,
            speed_hz: speed,
        })
    }

    /// Open a device with default settings
    pub fn open_device(device: &str) -> Result<Self> {
        Self::open(&SpidevConfig::new(device))
    }

    /// Get current speed setting
    pub fn speed_hz(&self) -> u32 {
        self.speed_hz
    }

    /// Perform a full-duplex SPI transfer
    ///
    /// A single SPI_IOC_MESSAGE transfer with tx and rx pointing at the
    /// same buffer: the bytes received while transmitting overwrite the
    /// buffer in place, which is exactly the echo the register read path
    /// needs.
    fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<()> {
        if buf.is_empty() {
            return Err(SpidevError::InvalidParameter(
                "Transfer buffer cannot be empty".into(),
            ));
        }

        let transfer = SpiIocTransfer {
            tx_buf: buf.as_ptr() as u64,
            rx_buf: buf.as_mut_ptr() as u64,
            len: buf.len() as u32,
            speed_hz: self.speed_hz,
            bits_per_word: 8,
            ..Default::default()
        };

        self.message(&[transfer])
    }

    /// Perform a transmit-only SPI transfer
    fn write_only(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Err(SpidevError::InvalidParameter(
                "Write data cannot be empty".into(),
            ));
        }

        let transfer = SpiIocTransfer {
            tx_buf: data.as_ptr() as u64,
            rx_buf: 0,
            len: data.len() as u32,
            speed_hz: self.speed_hz,
            bits_per_word: 8,
            ..Default::default()
        };

        self.message(&[transfer])
    }

    fn message(&mut self, transfers: &[SpiIocTransfer]) -> Result<()> {
        let fd = self.file.as_raw_fd();
        let ioctl_num = ioctl::spi_ioc_message(transfers.len() as u8);
        let ret = unsafe { libc::ioctl(fd, ioctl_num, transfers.as_ptr()) };

        if ret < 0 {
            return Err(SpidevError::TransferFailed(
                std::io::Error::last_os_error(),
            ));
        }

        Ok(())
    }
}

impl BusTransport for SpidevBus {
    fn transfer(&mut self, buf: &mut [u8]) -> CoreResult<()> {
        self.transfer_in_place(buf).map_err(|e| {
            log::error!("spidev: transfer failed: {}", e);
            CoreError::Transfer
        })
    }

    fn write(&mut self, data: &[u8]) -> CoreResult<()> {
        self.write_only(data).map_err(|e| {
            log::error!("spidev: write failed: {}", e);
            CoreError::Transfer
        })
    }
}

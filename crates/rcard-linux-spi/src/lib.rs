//! rcard-linux-spi - Linux spidev transport
//!
//! This crate connects the rcard driver core to an MFRC522-class reader
//! wired to a Linux SPI controller, exposed through the character devices
//! at `/dev/spidevX.Y` (X is the bus number, Y the chip select).
//!
//! # Example
//!
//! ```no_run
//! use rcard_linux_spi::{SpidevBus, SpidevConfig};
//! use rcard_core::reader::{CardReader, Reader};
//! use rcard_core::picc;
//!
//! // Open with default settings (1 MHz, mode 0)
//! let bus = SpidevBus::open_device("/dev/spidev0.0")?;
//!
//! // Or with custom settings
//! let config = SpidevConfig::new("/dev/spidev0.0")
//!     .with_speed(500_000)
//!     .with_mode(0);
//! let bus = SpidevBus::open(&config)?;
//!
//! let mut reader = Reader::new(bus);
//! match reader.request_mode(picc::REQ_IDLE) {
//!     Ok(bits) => println!("tag answered with {} bits", bits),
//!     Err(e) => println!("no tag: {}", e),
//! }
//! reader.release()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with spidev support enabled (`CONFIG_SPI_SPIDEV`)
//! - Read/write access to the `/dev/spidevX.Y` device
//! - May require adding the user to the `spi` group or a udev rule

pub mod device;
pub mod error;

// Re-exports
pub use device::{mode, SpidevBus, SpidevConfig};
pub use error::{Result, SpidevError};

//! rcard-core - Core driver library for MFRC522-class contactless readers
//!
//! This crate contains the transport-independent half of the driver: the
//! register access primitives, the command execution engine that walks a
//! chip command through its arm/load/execute/poll/drain phases, and the
//! thin protocol operations built on top of it. It is `no_std` compatible
//! so the same engine can run against an embedded SPI peripheral or a
//! Linux spidev handle.
//!
//! # Features
//!
//! - `std` - Enable standard library support (`std::error::Error` impls)
//!
//! # Example
//!
//! ```ignore
//! use rcard_core::picc;
//! use rcard_core::reader::{CardReader, Reader};
//!
//! let bus = rcard_linux_spi::SpidevBus::open_device("/dev/spidev0.0")?;
//! let mut reader = Reader::new(bus);
//!
//! match reader.request_mode(picc::REQ_IDLE) {
//!     Ok(bits) => println!("tag answered with {} bits", bits),
//!     Err(e) => println!("no tag: {}", e),
//! }
//! reader.release()?;
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod bus;
pub mod command;
pub mod error;
pub mod picc;
pub mod reader;
pub mod register;

pub use error::{Error, Result};

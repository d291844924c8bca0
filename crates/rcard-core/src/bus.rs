//! Bus transport trait definition
//!
//! The reader chip sits behind a synchronous serial bus. Everything the
//! driver needs from that bus is captured by [`BusTransport`], so a mock
//! or emulated chip can stand in for the physical device in tests.

use crate::error::Result;

/// A blocking, byte-oriented bus to the reader chip.
///
/// The transport is full duplex: clocking a byte out always clocks a byte
/// in. [`transfer`](BusTransport::transfer) exposes that by overwriting
/// the buffer in place with the concurrently received bytes, which is what
/// the register read path relies on (the value is byte 1 of the echo of a
/// `[address, placeholder]` frame).
///
/// Implementations must fill the whole buffer or fail the call; a partial
/// transfer is an error, never a shorter result.
pub trait BusTransport {
    /// Full-duplex transfer: transmit `buf` and replace its contents with
    /// the bytes received while transmitting.
    fn transfer(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Transmit-only write; received bytes are discarded.
    fn write(&mut self, data: &[u8]) -> Result<()>;
}

impl<B: BusTransport + ?Sized> BusTransport for &mut B {
    fn transfer(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).transfer(buf)
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }
}

//! Command implementations

use rcard_core::bus::BusTransport;
use rcard_core::picc;
use rcard_core::reader::{CardReader, Reader};

/// Probe for tag presence with a REQA (or WUPA) short frame
pub fn run_request<B: BusTransport>(
    reader: &mut Reader<B>,
    all: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mode = if all { picc::REQ_ALL } else { picc::REQ_IDLE };

    match reader.request_mode(mode) {
        Ok(bits) => {
            println!("Tag present:");
            println!("  Answer length: {} bits", bits);
            Ok(())
        }
        Err(e) => {
            eprintln!("Request failed: {}", e);
            Err(Box::new(e))
        }
    }
}

/// Detect a tag and print its UID
pub fn run_scan<B: BusTransport>(
    reader: &mut Reader<B>,
) -> Result<(), Box<dyn std::error::Error>> {
    match reader.scan() {
        Ok(uid) => {
            println!("Tag UID: {}", uid);
            Ok(())
        }
        Err(e) => {
            eprintln!("Scan failed: {}", e);
            Err(Box::new(e))
        }
    }
}

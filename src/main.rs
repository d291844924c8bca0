//! rcard - a contactless card reader tool
//!
//! Drives an MFRC522-class reader chip attached to a Linux SPI
//! controller. The heavy lifting lives in `rcard-core` (register access
//! and the command engine) and `rcard-linux-spi` (the spidev transport);
//! this binary just wires command-line flags to the two of them.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use rcard_core::reader::{CardReader, Reader};
use rcard_linux_spi::{SpidevBus, SpidevConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let config = SpidevConfig::new(&cli.device)
        .with_speed(cli.speed)
        .with_mode(cli.spi_mode);
    let bus = SpidevBus::open(&config)?;
    let mut reader = Reader::new(bus);

    let result = match cli.command {
        Commands::Request { all } => commands::run_request(&mut reader, all),
        Commands::Scan => commands::run_scan(&mut reader),
    };

    // The shutdown byte goes out on every exit path, success or not.
    if let Err(e) = reader.release() {
        log::warn!("release failed: {}", e);
    }

    result
}

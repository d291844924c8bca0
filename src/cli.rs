//! CLI argument parsing

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rcard")]
#[command(author, version, about = "Contactless card reader tool", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// spidev device path
    #[arg(short, long, default_value = "/dev/spidev0.0", global = true)]
    pub device: String,

    /// SPI clock speed in Hz
    #[arg(short, long, default_value_t = 1_000_000, global = true)]
    pub speed: u32,

    /// SPI mode (0-3)
    #[arg(long, default_value_t = 0, global = true)]
    pub spi_mode: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe for tag presence
    Request {
        /// Probe all tags, including halted ones (WUPA instead of REQA)
        #[arg(long)]
        all: bool,
    },

    /// Detect a tag and read its UID
    Scan,
}

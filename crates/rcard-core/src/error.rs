//! Error types for rcard-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Bus transfer or write failed
    Transfer,
    /// Register access was attempted after the bus handle was released
    Released,
    /// No tag answered the request
    NoTag,
    /// Operation is not implemented for this reader
    Unsupported,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transfer => write!(f, "bus transfer failed"),
            Self::Released => write!(f, "bus handle already released"),
            Self::NoTag => write!(f, "no tag detected"),
            Self::Unsupported => write!(f, "operation not supported"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;

//! Error type for the memory-mapped block device.

use std::io;
use thiserror::Error;

/// Errors raised while opening, creating or accessing the backing image file.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// I/O failure opening, growing or memory-mapping the backing file.
    #[error("I/O error on the disk image")]
    Io(#[from] io::Error),
    /// The request fell outside the bounds of the device.
    #[error("invalid device access: {0}")]
    Invalid(&'static str),
}

/// Shorthand result type for the device layer.
pub type Result<T> = std::result::Result<T, DeviceError>;

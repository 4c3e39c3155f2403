//! Memory-mapped block device backing the single-volume filesystem.
//!
//! This crate knows nothing about inodes, directories or paths — it is a
//! fixed-size, byte-addressable file, mapped once and flushed on every
//! write. The filesystem crate built on top of it owns all higher-level
//! structure.

#![deny(missing_docs)]

pub mod device;
pub mod error;

pub use device::{Device, BLOCK_SIZE, IMAGE_SIZE, NUM_BLOCKS};
pub use error::{DeviceError, Result};

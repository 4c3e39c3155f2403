//! A memory-mapped view of the disk image.
//!
//! This is the only I/O primitive the rest of the system is built on: a
//! fixed-size backing file, mapped once at open time, exposing
//! byte-addressable reads and writes. There is no buffering above the
//! mapping and no journal; every write is flushed immediately.

use crate::error::{DeviceError, Result};
use memmap::MmapMut;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Size of a single block, in bytes.
pub const BLOCK_SIZE: u64 = 4096;
/// Total number of blocks the image holds.
pub const NUM_BLOCKS: u64 = 32768;
/// Total size of the backing file, in bytes (128 MiB).
pub const IMAGE_SIZE: u64 = BLOCK_SIZE * NUM_BLOCKS;

/// The byte written at offset 0 of a freshly created image: blocks 0, 1 and
/// 2 (the bitmap itself and the root inode) marked allocated, MSB-first.
const INITIAL_BITMAP_BYTE: u8 = 0b1110_0000;

/// A fixed-size disk image, memory-mapped for the lifetime of the process.
///
/// No locking is performed; two processes mapping the same image
/// concurrently is undefined behavior, as there is no multi-reader support
/// in this system.
#[derive(Debug)]
pub struct Device {
    path: PathBuf,
    mmap: MmapMut,
}

impl Drop for Device {
    fn drop(&mut self) {
        let _ = self.mmap.flush();
    }
}

impl Device {
    /// Create a brand new, zero-filled 128 MiB image at `path`, with byte 0
    /// pre-marked so that blocks 0, 1 and 2 read as allocated.
    ///
    /// Fails if a file already exists at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Device> {
        let path_buf = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path_buf)?;
        file.set_len(IMAGE_SIZE)?;
        let mut mmap = unsafe { memmap::MmapOptions::new().map_mut(&file)? };
        mmap[0] = INITIAL_BITMAP_BYTE;
        mmap.flush()?;
        Ok(Device {
            path: path_buf,
            mmap,
        })
    }

    /// Open an existing image at `path`.
    ///
    /// Fails if the file does not exist, or if its size does not match the
    /// fixed geometry of this filesystem.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Device> {
        let path_buf = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path_buf)?;
        if file.metadata()?.len() != IMAGE_SIZE {
            return Err(DeviceError::Invalid(
                "image file does not match the expected size",
            ));
        }
        let mmap = unsafe { memmap::MmapOptions::new().map_mut(&file)? };
        Ok(Device {
            path: path_buf,
            mmap,
        })
    }

    /// Path to the file backing this device.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the bytes in `[start, end)`.
    pub fn read_bytes(&self, start: u64, end: u64) -> Result<&[u8]> {
        if end < start || end > IMAGE_SIZE {
            return Err(DeviceError::Invalid("read past the end of the device"));
        }
        Ok(&self.mmap[start as usize..end as usize])
    }

    /// Write `data` starting at `offset`, then flush the mapping.
    pub fn write_bytes(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        let end = offset
            .checked_add(data.len() as u64)
            .ok_or(DeviceError::Invalid("write offset overflow"))?;
        if end > IMAGE_SIZE {
            return Err(DeviceError::Invalid("write past the end of the device"));
        }
        let start = offset as usize;
        self.mmap[start..end as usize].copy_from_slice(data);
        self.mmap.flush()?;
        Ok(())
    }

    /// Read exactly one block.
    pub fn read_block(&self, block: u64) -> Result<&[u8]> {
        self.read_bytes(block * BLOCK_SIZE, (block + 1) * BLOCK_SIZE)
    }

    /// Write exactly one block. `data` must be `BLOCK_SIZE` bytes long.
    pub fn write_block(&mut self, block: u64, data: &[u8]) -> Result<()> {
        if data.len() as u64 != BLOCK_SIZE {
            return Err(DeviceError::Invalid("not a block-sized write"));
        }
        self.write_bytes(block * BLOCK_SIZE, data)
    }
}

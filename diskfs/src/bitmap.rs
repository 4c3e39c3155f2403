//! The allocation bitmap: two independently-scanned byte ranges of block 0,
//! one for inode blocks and one for data blocks. Bits are numbered MSB-first
//! within each byte — block `8*B + p` is bit `p` (0 = most significant) of
//! byte `B` — so bit order does not match `bit_field`'s native LSB-first
//! indexing and every access below translates `p` to `7 - p`.

use crate::error::{FsError, Result};
use crate::geometry::{DATA_BITMAP_END, DATA_BITMAP_START, INODE_BITMAP_END, INODE_BITMAP_START};
use bit_field::BitField;
use diskfs_device::Device;

/// Which half of the bitmap an allocation or free applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    /// Blocks `2..2776`, the inode region.
    Inode,
    /// Blocks `2776..32768`, the data region.
    Data,
}

impl Partition {
    fn byte_range(self) -> (u64, u64) {
        match self {
            Partition::Inode => (INODE_BITMAP_START, INODE_BITMAP_END),
            Partition::Data => (DATA_BITMAP_START, DATA_BITMAP_END),
        }
    }
}

/// Find the first unset bit in `partition`, set it, and return the absolute
/// block index it represents. Scans byte by byte; a byte of `0xFF` has no
/// free bit and is skipped outright.
pub fn allocate(device: &mut Device, partition: Partition) -> Result<u64> {
    let (start, end) = partition.byte_range();
    for byte_index in start..end {
        let byte = device.read_bytes(byte_index, byte_index + 1)?[0];
        if byte == 0xFF {
            continue;
        }
        for p in 0u32..8 {
            if !byte.get_bit(7 - p as usize) {
                let mut updated = byte;
                updated.set_bit(7 - p as usize, true);
                device.write_bytes(byte_index, &[updated])?;
                return Ok(8 * byte_index + p as u64);
            }
        }
        unreachable!("a byte other than 0xFF always has a clear bit");
    }
    Err(FsError::NoSpace)
}

/// Clear the bit representing `block`, wherever it falls. The caller is
/// responsible for knowing `block` was actually allocated; clearing an
/// already-free bit is a silent no-op, matching the underlying bit set.
pub fn deallocate(device: &mut Device, block: u64) -> Result<()> {
    let byte_index = block / 8;
    let bit = (block % 8) as usize;
    let byte = device.read_bytes(byte_index, byte_index + 1)?[0];
    let mut updated = byte;
    updated.set_bit(7 - bit, false);
    device.write_bytes(byte_index, &[updated])
}

/// Report whether `block`'s bit is currently set.
pub fn is_allocated(device: &Device, block: u64) -> Result<bool> {
    let byte_index = block / 8;
    let bit = (block % 8) as usize;
    let byte = device.read_bytes(byte_index, byte_index + 1)?[0];
    Ok(byte.get_bit(7 - bit))
}

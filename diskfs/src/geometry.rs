//! Fixed on-disk geometry: block layout, inode encoding sizes and the two
//! bitmap partitions. Every other module in this crate is built against
//! these constants rather than re-deriving them.

pub use diskfs_device::BLOCK_SIZE;

/// Block index of the root directory's inode. Never freed, never renamed.
pub const ROOT_BLOCK: u64 = 2;

/// First block of the inode region (inclusive).
pub const INODE_REGION_START: u64 = 2;
/// One past the last block of the inode region (exclusive).
pub const INODE_REGION_END: u64 = 2778;

/// First block of the data region (inclusive).
pub const DATA_REGION_START: u64 = 2778;
/// One past the last block of the data region (exclusive), i.e. the device.
pub const DATA_REGION_END: u64 = diskfs_device::NUM_BLOCKS;

/// `i_get`-style bounds check on a raw inode block index: valid indices lie
/// in this closed range. This is one past where the inode bitmap partition
/// can actually represent liveness (see `bitmap` module docs) — an
/// inherited quirk from the original layout, preserved rather than fixed.
pub const VALID_INODE_INDEX: std::ops::RangeInclusive<u64> = 2..=2776;

/// Byte offset of the `name` field within an encoded inode block.
pub const NAME_OFFSET: usize = 0;
/// Maximum length in bytes of the `name` field.
pub const NAME_LEN: usize = 128;
/// Byte offset of the `kind` field.
pub const KIND_OFFSET: usize = 128;
/// Byte offset of the `created` timestamp field.
pub const CREATED_OFFSET: usize = 130;
/// Byte offset of the `modified` timestamp field.
pub const MODIFIED_OFFSET: usize = 134;
/// Byte offset of the `owner` field.
pub const OWNER_OFFSET: usize = 138;
/// Maximum length in bytes of the `owner` field.
pub const OWNER_LEN: usize = 30;
/// Byte offset of the child/data block table.
pub const TABLE_OFFSET: usize = 168;
/// Number of bytes given over to the table.
pub const TABLE_BYTES: usize = 3928;
/// Number of physical 16-bit slots in the table (3928 / 2).
pub const TABLE_SLOTS: usize = TABLE_BYTES / 2;
/// Sentinel value marking an unused table slot.
pub const SENTINEL: u16 = 0xFFFF;
/// Maximum number of *live* entries a table may hold. Two of the 1964
/// physical slots are always left as sentinel padding; see the base
/// specification's documented inode-capacity inconsistency.
pub const MAX_TABLE_ENTRIES: usize = 1962;

/// First byte of the bitmap's inode partition (inclusive).
pub const INODE_BITMAP_START: u64 = 0;
/// One past the last byte of the bitmap's inode partition (exclusive).
/// Covers bits, i.e. block indices, `0..2776`.
pub const INODE_BITMAP_END: u64 = 347;
/// First byte of the bitmap's data partition (inclusive). Note this is
/// byte-aligned but does not line up with `INODE_REGION_END`: see the
/// `bitmap` module docs for the consequence.
pub const DATA_BITMAP_START: u64 = 347;
/// One past the last byte of the bitmap's data partition (exclusive),
/// i.e. one past the last byte of block 0. `347 + (BLOCK_SIZE - 347)`
/// bytes between the two partitions cover exactly `NUM_BLOCKS` bits, so the
/// bitmap region's second reserved block (block 1) is never actually
/// scanned by either partition.
pub const DATA_BITMAP_END: u64 = BLOCK_SIZE;

//! The on-disk inode: a fixed `name`/`kind`/timestamps/`owner` header
//! followed by a table of 16-bit block references, encoded big-endian at
//! fixed byte offsets so the layout matches exactly what the geometry module
//! declares — no serde, no bincode, just explicit slices.

use crate::error::{FsError, Result};
use crate::geometry::{
    CREATED_OFFSET, KIND_OFFSET, MAX_TABLE_ENTRIES, MODIFIED_OFFSET, NAME_LEN, NAME_OFFSET,
    OWNER_LEN, OWNER_OFFSET, SENTINEL, TABLE_OFFSET, TABLE_SLOTS,
};
use diskfs_device::BLOCK_SIZE;

/// What an inode's table entries mean: child inode blocks for a directory,
/// file data blocks for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// A directory; `table` holds child inode block indices in sorted order.
    Directory,
    /// A file; `table` holds data block indices in content order.
    File,
}

impl Kind {
    fn to_byte(self) -> u16 {
        match self {
            Kind::Directory => 0,
            Kind::File => 1,
        }
    }

    fn from_byte(value: u16) -> Result<Kind> {
        match value {
            0 => Ok(Kind::Directory),
            1 => Ok(Kind::File),
            other => Err(FsError::BadName(format!("corrupt inode kind byte {}", other))),
        }
    }
}

/// A decoded inode: everything an on-disk inode block holds, in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inode {
    /// The entry's own name, as seen by its parent directory.
    pub name: String,
    /// Directory or file.
    pub kind: Kind,
    /// Unix timestamp set once, at creation.
    pub created: u32,
    /// Unix timestamp of the last content- or name-changing write.
    pub modified: u32,
    /// The user string that created this entry.
    pub owner: String,
    /// Child inode blocks (directory) or data blocks (file), in order.
    pub table: Vec<u16>,
}

/// Encode `inode` into one `BLOCK_SIZE`-byte block.
///
/// Rejects a `name` longer than 128 bytes, an `owner` longer than 30 bytes,
/// or a `table` longer than the 1962 live entries a block can hold. Callers
/// that enforce their own capacity limits up front should never actually
/// trigger the table check; it exists as a last line of defense against a
/// caller bug rather than as a user-facing error path.
pub fn encode(inode: &Inode) -> Result<Vec<u8>> {
    let name_bytes = inode.name.as_bytes();
    if name_bytes.len() > NAME_LEN {
        return Err(FsError::BadName(inode.name.clone()));
    }
    let owner_bytes = inode.owner.as_bytes();
    if owner_bytes.len() > OWNER_LEN {
        return Err(FsError::BadName(inode.owner.clone()));
    }
    if inode.table.len() > MAX_TABLE_ENTRIES {
        return Err(FsError::TooLarge);
    }

    let mut block = vec![0u8; BLOCK_SIZE as usize];
    block[NAME_OFFSET..NAME_OFFSET + name_bytes.len()].copy_from_slice(name_bytes);
    block[KIND_OFFSET..KIND_OFFSET + 2].copy_from_slice(&inode.kind.to_byte().to_be_bytes());
    block[CREATED_OFFSET..CREATED_OFFSET + 4].copy_from_slice(&inode.created.to_be_bytes());
    block[MODIFIED_OFFSET..MODIFIED_OFFSET + 4].copy_from_slice(&inode.modified.to_be_bytes());
    block[OWNER_OFFSET..OWNER_OFFSET + owner_bytes.len()].copy_from_slice(owner_bytes);

    let mut offset = TABLE_OFFSET;
    for &entry in &inode.table {
        block[offset..offset + 2].copy_from_slice(&entry.to_be_bytes());
        offset += 2;
    }
    for _ in inode.table.len()..TABLE_SLOTS {
        block[offset..offset + 2].copy_from_slice(&SENTINEL.to_be_bytes());
        offset += 2;
    }
    Ok(block)
}

/// Decode a `BLOCK_SIZE`-byte block back into an [`Inode`].
///
/// The table is reconstructed by reading every slot in order and dropping
/// sentinels, so the result is exactly the list `encode` was given — holes
/// are never produced or expected.
pub fn decode(block: &[u8]) -> Result<Inode> {
    let name = decode_str(&block[NAME_OFFSET..NAME_OFFSET + NAME_LEN])?;
    let kind_value = u16::from_be_bytes([block[KIND_OFFSET], block[KIND_OFFSET + 1]]);
    let kind = Kind::from_byte(kind_value)?;
    let created = u32::from_be_bytes([
        block[CREATED_OFFSET],
        block[CREATED_OFFSET + 1],
        block[CREATED_OFFSET + 2],
        block[CREATED_OFFSET + 3],
    ]);
    let modified = u32::from_be_bytes([
        block[MODIFIED_OFFSET],
        block[MODIFIED_OFFSET + 1],
        block[MODIFIED_OFFSET + 2],
        block[MODIFIED_OFFSET + 3],
    ]);
    let owner = decode_str(&block[OWNER_OFFSET..OWNER_OFFSET + OWNER_LEN])?;

    let mut table = Vec::new();
    let mut offset = TABLE_OFFSET;
    for _ in 0..TABLE_SLOTS {
        let value = u16::from_be_bytes([block[offset], block[offset + 1]]);
        if value != SENTINEL {
            table.push(value);
        }
        offset += 2;
    }

    Ok(Inode {
        name,
        kind,
        created,
        modified,
        owner,
        table,
    })
}

/// A fixed-width field is NUL-padded; trim at the first NUL and decode the
/// rest as UTF-8.
fn decode_str(field: &[u8]) -> Result<String> {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8(field[..end].to_vec())
        .map_err(|_| FsError::BadName("corrupt inode field is not valid UTF-8".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Inode {
        Inode {
            name: "notes.txt".to_string(),
            kind: Kind::File,
            created: 1_700_000_000,
            modified: 1_700_000_100,
            owner: "ada".to_string(),
            table: vec![2776, 2777, 9000],
        }
    }

    #[test]
    fn round_trips_through_encode_decode() {
        let original = sample();
        let block = encode(&original).unwrap();
        assert_eq!(block.len(), BLOCK_SIZE as usize);
        let decoded = decode(&block).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn empty_table_round_trips_as_empty() {
        let mut original = sample();
        original.table.clear();
        original.kind = Kind::Directory;
        let block = encode(&original).unwrap();
        let decoded = decode(&block).unwrap();
        assert!(decoded.table.is_empty());
    }

    #[test]
    fn rejects_name_over_128_bytes() {
        let mut inode = sample();
        inode.name = "x".repeat(129);
        assert!(matches!(encode(&inode), Err(FsError::BadName(_))));
    }

    #[test]
    fn rejects_owner_over_30_bytes() {
        let mut inode = sample();
        inode.owner = "x".repeat(31);
        assert!(matches!(encode(&inode), Err(FsError::BadName(_))));
    }

    #[test]
    fn rejects_table_over_capacity() {
        let mut inode = sample();
        inode.table = vec![0; MAX_TABLE_ENTRIES + 1];
        assert!(matches!(encode(&inode), Err(FsError::TooLarge)));
    }

    #[test]
    fn accepts_table_at_exact_capacity() {
        let mut inode = sample();
        inode.table = (0..MAX_TABLE_ENTRIES as u16).collect();
        let block = encode(&inode).unwrap();
        let decoded = decode(&block).unwrap();
        assert_eq!(decoded.table.len(), MAX_TABLE_ENTRIES);
    }

    #[test]
    fn rejects_corrupt_kind_byte_on_decode() {
        let block = encode(&sample()).unwrap();
        let mut corrupt = block;
        corrupt[KIND_OFFSET] = 0;
        corrupt[KIND_OFFSET + 1] = 5;
        assert!(matches!(decode(&corrupt), Err(FsError::BadName(_))));
    }
}

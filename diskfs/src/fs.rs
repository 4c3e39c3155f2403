//! The namespace layer: everything that turns a bare block device into a
//! tree of named directories and files. `Filesystem` owns the open device,
//! the active user string, and the current-directory stack; every public
//! method here is one of the shell's eleven commands.

use crate::bitmap::{self, Partition};
use crate::dir;
use crate::error::{FsError, Result};
use crate::geometry::{MAX_TABLE_ENTRIES, ROOT_BLOCK, VALID_INODE_INDEX};
use crate::inode::{self, Inode, Kind};
use crate::path;
use diskfs_device::Device;
use relative_path::RelativePathBuf;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// A mounted filesystem: the backing device plus the session state (the
/// acting user, and where in the tree the session currently stands).
#[derive(Debug)]
pub struct Filesystem {
    device: Device,
    user: String,
    cwd: Vec<u64>,
}

impl Filesystem {
    /// Mount the image at `path`, creating it fresh if it doesn't exist yet.
    ///
    /// A fresh image gets an empty root directory owned by `"system"`,
    /// independent of `user`; an existing image is opened as-is. Either
    /// way, `user` is stamped as the owner of every entry created during
    /// this session from here on.
    pub fn mount<P: AsRef<Path>>(path: P, user: impl Into<String>) -> Result<Filesystem> {
        let path_ref = path.as_ref();
        let fresh = !path_ref.exists();
        let user = user.into();
        let mut device = if fresh {
            Device::create(path_ref)?
        } else {
            Device::open(path_ref)?
        };

        if fresh {
            let now = current_timestamp();
            let root = Inode {
                name: "root".to_string(),
                kind: Kind::Directory,
                created: now,
                modified: now,
                // The root's owner is always "system", independent of
                // whichever user mounts the image first.
                owner: "system".to_string(),
                table: Vec::new(),
            };
            let encoded = inode::encode(&root)?;
            device.write_block(ROOT_BLOCK, &encoded)?;
        }

        Ok(Filesystem {
            device,
            user,
            cwd: vec![ROOT_BLOCK],
        })
    }

    /// The user string new entries are stamped with.
    pub fn user(&self) -> &str {
        &self.user
    }

    fn read_inode(&self, block: u64) -> Result<Inode> {
        if !VALID_INODE_INDEX.contains(&block) {
            return Err(FsError::IndexOutOfRange);
        }
        let bytes = self.device.read_block(block)?;
        inode::decode(bytes)
    }

    fn write_inode(&mut self, block: u64, inode: &Inode) -> Result<()> {
        let encoded = inode::encode(inode)?;
        self.device.write_block(block, &encoded)?;
        Ok(())
    }

    fn lookup_child(&self, dir: &Inode, name: &str) -> Result<(bool, usize)> {
        dir::lookup(&dir.table, name, |block| Ok(self.read_inode(block as u64)?.name))
    }

    fn allocate_inode_block(&mut self) -> Result<u64> {
        bitmap::allocate(&mut self.device, Partition::Inode)
    }

    fn allocate_data_block(&mut self) -> Result<u64> {
        bitmap::allocate(&mut self.device, Partition::Data)
    }

    fn free_block(&mut self, block: u64) -> Result<()> {
        bitmap::deallocate(&mut self.device, block)
    }

    /// Resolve `path` relative to the current directory. See the path
    /// module for the exact token rules (`.`, `..`, leading `/`).
    pub fn resolve(&self, path: &str) -> Result<(u64, Vec<u64>)> {
        path::resolve(
            &self.cwd,
            path,
            |block| Ok(self.read_inode(block)?.kind == Kind::Directory),
            |block, name| {
                let dir = self.read_inode(block)?;
                let (found, pos) = self.lookup_child(&dir, name)?;
                Ok(if found {
                    Some(dir.table[pos] as u64)
                } else {
                    None
                })
            },
        )
    }

    /// The current working directory, as the literal names from root to
    /// tip joined by `/` — root's own name included, so the top level reads
    /// as `root`, not `/`.
    pub fn pwd(&self) -> Result<String> {
        let mut names = Vec::with_capacity(self.cwd.len());
        for &block in &self.cwd {
            names.push(self.read_inode(block)?.name);
        }
        let mut joined = RelativePathBuf::from(names[0].clone());
        for name in &names[1..] {
            joined.push(name);
        }
        Ok(joined.to_string())
    }

    /// Change the current directory to `path`.
    pub fn cd(&mut self, path: &str) -> Result<()> {
        let (block, stack) = self.resolve(path)?;
        let target = self.read_inode(block)?;
        if target.kind != Kind::Directory {
            return Err(FsError::NotDirectory(target.name));
        }
        self.cwd = stack;
        Ok(())
    }

    fn create_entry(&mut self, path: &str, kind: Kind) -> Result<()> {
        let (parent_path, name) = path::split_leaf(path);
        validate_name(name)?;
        let parent_block = self.resolve(parent_path)?.0;
        let mut parent = self.read_inode(parent_block)?;
        if parent.kind != Kind::Directory {
            return Err(FsError::NotDirectory(parent.name));
        }
        if parent.table.len() >= MAX_TABLE_ENTRIES {
            return Err(FsError::Full);
        }
        let (found, pos) = self.lookup_child(&parent, name)?;
        if found {
            return Err(FsError::Exists(name.to_string()));
        }

        let block = self.allocate_inode_block()?;
        let now = current_timestamp();
        let entry = Inode {
            name: name.to_string(),
            kind,
            created: now,
            modified: now,
            owner: self.user.clone(),
            table: Vec::new(),
        };
        self.write_inode(block, &entry)?;
        parent.table.insert(pos, block as u16);
        self.write_inode(parent_block, &parent)?;
        Ok(())
    }

    /// Create an empty directory at `path`.
    pub fn mkdir(&mut self, path: &str) -> Result<()> {
        self.create_entry(path, Kind::Directory)
    }

    /// Create an empty file at `path`.
    pub fn touch(&mut self, path: &str) -> Result<()> {
        self.create_entry(path, Kind::File)
    }

    /// Remove the empty directory `name` from the current directory.
    pub fn rmdir(&mut self, name: &str) -> Result<()> {
        let parent_block = *self.cwd.last().unwrap();
        let mut parent = self.read_inode(parent_block)?;
        let (found, pos) = self.lookup_child(&parent, name)?;
        if !found {
            return Err(FsError::NotFound(name.to_string()));
        }
        let child_block = parent.table[pos] as u64;
        let child = self.read_inode(child_block)?;
        if child.kind != Kind::Directory {
            return Err(FsError::NotDirectory(child.name));
        }
        if !child.table.is_empty() {
            return Err(FsError::Full);
        }

        self.free_block(child_block)?;
        parent.table.remove(pos);
        self.write_inode(parent_block, &parent)?;
        Ok(())
    }

    /// Remove the file `path`, freeing its inode and every data block in
    /// its table.
    pub fn rm(&mut self, path: &str) -> Result<()> {
        let (parent_path, name) = path::split_leaf(path);
        let parent_block = self.resolve(parent_path)?.0;
        let mut parent = self.read_inode(parent_block)?;
        let (found, pos) = self.lookup_child(&parent, name)?;
        if !found {
            return Err(FsError::NotFound(name.to_string()));
        }
        let file_block = parent.table[pos] as u64;
        let file = self.read_inode(file_block)?;
        if file.kind != Kind::File {
            return Err(FsError::NotFile(file.name));
        }

        for &block in &file.table {
            self.free_block(block as u64)?;
        }
        self.free_block(file_block)?;
        parent.table.remove(pos);
        self.write_inode(parent_block, &parent)?;
        Ok(())
    }

    /// Rename the entry at `path` to `new_name`, within its current parent.
    pub fn mv(&mut self, path: &str, new_name: &str) -> Result<()> {
        validate_name(new_name)?;
        let (block, stack) = self.resolve(path)?;
        if block == ROOT_BLOCK {
            return Err(FsError::IsRoot);
        }
        let parent_block = stack[stack.len() - 2];
        let mut parent = self.read_inode(parent_block)?;

        let (new_found, _) = self.lookup_child(&parent, new_name)?;
        if new_found {
            return Err(FsError::Exists(new_name.to_string()));
        }

        let mut node = self.read_inode(block)?;
        let (old_found, old_pos) = self.lookup_child(&parent, &node.name)?;
        if !old_found {
            return Err(FsError::NotFound(node.name));
        }
        parent.table.remove(old_pos);
        let (_, new_pos) = self.lookup_child(&parent, new_name)?;
        parent.table.insert(new_pos, block as u16);

        node.name = new_name.to_string();
        self.write_inode(block, &node)?;
        self.write_inode(parent_block, &parent)?;
        Ok(())
    }

    /// Move the directory at `origin` to become a child of `destination`.
    ///
    /// Only `origin`'s old parent and `destination` are rewritten; `origin`'s
    /// own inode keeps its block and its name. `destination`'s `modified`
    /// timestamp is updated; nothing else's is.
    pub fn mvdir(&mut self, origin: &str, destination: &str) -> Result<()> {
        let (origin_block, origin_stack) = self.resolve(origin)?;
        if origin_stack.len() < 2 {
            return Err(FsError::IsRoot);
        }
        let (dest_block, _) = self.resolve(destination)?;

        let origin_parent_block = origin_stack[origin_stack.len() - 2];
        let mut origin_parent = self.read_inode(origin_parent_block)?;
        let mut dest = self.read_inode(dest_block)?;
        if dest.kind != Kind::Directory {
            return Err(FsError::NotDirectory(dest.name));
        }
        if dest.table.len() >= MAX_TABLE_ENTRIES {
            return Err(FsError::Full);
        }

        let origin_inode = self.read_inode(origin_block)?;
        let (found, pos) = self.lookup_child(&dest, &origin_inode.name)?;
        if found {
            return Err(FsError::Exists(origin_inode.name));
        }

        let (old_found, old_pos) = self.lookup_child(&origin_parent, &origin_inode.name)?;
        if !old_found {
            return Err(FsError::NotFound(origin_inode.name));
        }
        origin_parent.table.remove(old_pos);
        dest.table.insert(pos, origin_block as u16);
        dest.modified = current_timestamp();

        self.write_inode(origin_parent_block, &origin_parent)?;
        self.write_inode(dest_block, &dest)?;
        Ok(())
    }

    /// List the current directory's children, in their on-disk (sorted)
    /// order.
    pub fn ls(&self) -> Result<Vec<(String, Kind)>> {
        let dir_block = *self.cwd.last().unwrap();
        let dir = self.read_inode(dir_block)?;
        if dir.kind != Kind::Directory {
            return Err(FsError::NotDirectory(dir.name));
        }
        dir.table
            .iter()
            .map(|&block| {
                let child = self.read_inode(block as u64)?;
                Ok((child.name, child.kind))
            })
            .collect()
    }

    /// Read the full contents of the file at `path`.
    pub fn cat(&self, path: &str) -> Result<String> {
        let (block, _) = self.resolve(path)?;
        let file = self.read_inode(block)?;
        if file.kind != Kind::File {
            return Err(FsError::NotFile(file.name));
        }
        let mut out = String::new();
        for &data_block in &file.table {
            let raw = self.device.read_block(data_block as u64)?;
            let trimmed = trim_trailing_nul(raw);
            out.push_str(&String::from_utf8_lossy(trimmed));
        }
        Ok(out)
    }

    /// Overwrite the file at `path` with `content`, growing or shrinking
    /// its data block table to match.
    pub fn echo(&mut self, path: &str, content: &str) -> Result<()> {
        let (block, _) = self.resolve(path)?;
        let mut file = self.read_inode(block)?;
        if file.kind != Kind::File {
            return Err(FsError::NotFile(file.name));
        }

        let chunks = chunk_content(content.as_bytes());
        if chunks.len() > MAX_TABLE_ENTRIES {
            return Err(FsError::TooLarge);
        }

        while file.table.len() > chunks.len() {
            let freed = file.table.pop().unwrap();
            self.free_block(freed as u64)?;
        }

        let mut newly_allocated = Vec::new();
        while file.table.len() < chunks.len() {
            match self.allocate_data_block() {
                Ok(new_block) => {
                    file.table.push(new_block as u16);
                    newly_allocated.push(new_block);
                }
                Err(err) => {
                    for leftover in newly_allocated {
                        let _ = self.free_block(leftover);
                    }
                    return Err(err);
                }
            }
        }

        for (data_block, chunk) in file.table.iter().zip(chunks.iter()) {
            self.device.write_block(*data_block as u64, chunk)?;
        }
        self.write_inode(block, &file)?;
        Ok(())
    }

    /// Copy the file at `src` to `dest`.
    ///
    /// If `dest` names an existing directory, the copy is placed inside it
    /// under `src`'s own name. If `dest` names an existing file, that
    /// file's content is replaced. Otherwise `dest` is created as a new
    /// file. Destination data blocks are all pre-allocated before any byte
    /// is copied; if allocation runs out partway through, everything
    /// allocated so far for this copy is freed before the error surfaces.
    pub fn cp(&mut self, src: &str, dest: &str) -> Result<()> {
        let (src_block, _) = self.resolve(src)?;
        let src_inode = self.read_inode(src_block)?;
        if src_inode.kind != Kind::File {
            return Err(FsError::NotFile(src_inode.name));
        }

        let (dest_parent_path, leaf) = path::split_leaf(dest);
        let dest_parent_block = self.resolve(dest_parent_path)?.0;
        let mut dest_parent = self.read_inode(dest_parent_block)?;
        let (found, pos) = self.lookup_child(&dest_parent, leaf)?;

        if !found {
            if dest.ends_with('/') {
                return Err(FsError::NotDirectory(dest.to_string()));
            }
            validate_name(leaf)?;
            if dest_parent.table.len() >= MAX_TABLE_ENTRIES {
                return Err(FsError::Full);
            }
            let table = self.copy_data_blocks(&src_inode)?;
            let now = current_timestamp();
            let new_file = Inode {
                name: leaf.to_string(),
                kind: Kind::File,
                created: now,
                modified: now,
                owner: self.user.clone(),
                table,
            };
            let file_block = self.allocate_inode_block()?;
            self.write_inode(file_block, &new_file)?;
            dest_parent.table.insert(pos, file_block as u16);
            self.write_inode(dest_parent_block, &dest_parent)?;
            return Ok(());
        }

        let existing_block = dest_parent.table[pos] as u64;
        let existing = self.read_inode(existing_block)?;
        if existing.kind == Kind::Directory {
            let mut target_dir = existing;
            let name = src_inode.name.clone();
            let (name_found, name_pos) = self.lookup_child(&target_dir, &name)?;
            if name_found {
                return Err(FsError::Exists(name));
            }
            if target_dir.table.len() >= MAX_TABLE_ENTRIES {
                return Err(FsError::Full);
            }
            let table = self.copy_data_blocks(&src_inode)?;
            let now = current_timestamp();
            let new_file = Inode {
                name,
                kind: Kind::File,
                created: now,
                modified: now,
                owner: self.user.clone(),
                table,
            };
            let file_block = self.allocate_inode_block()?;
            self.write_inode(file_block, &new_file)?;
            target_dir.table.insert(name_pos, file_block as u16);
            self.write_inode(existing_block, &target_dir)?;
        } else {
            let mut target_file = existing;
            let old_blocks = std::mem::take(&mut target_file.table);
            let table = self.copy_data_blocks(&src_inode)?;
            for old_block in old_blocks {
                self.free_block(old_block as u64)?;
            }
            target_file.table = table;
            self.write_inode(existing_block, &target_file)?;
        }
        Ok(())
    }

    fn copy_data_blocks(&mut self, src: &Inode) -> Result<Vec<u16>> {
        let mut allocated = Vec::with_capacity(src.table.len());
        for _ in &src.table {
            match self.allocate_data_block() {
                Ok(block) => allocated.push(block),
                Err(err) => {
                    for leftover in allocated {
                        let _ = self.free_block(leftover);
                    }
                    return Err(err);
                }
            }
        }
        for (&src_block, &dst_block) in src.table.iter().zip(allocated.iter()) {
            let data = self.device.read_block(src_block as u64)?.to_vec();
            self.device.write_block(dst_block, &data)?;
        }
        Ok(allocated.into_iter().map(|b| b as u16).collect())
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') || name.as_bytes().len() > crate::geometry::NAME_LEN {
        return Err(FsError::BadName(name.to_string()));
    }
    Ok(())
}

fn chunk_content(bytes: &[u8]) -> Vec<Vec<u8>> {
    if bytes.is_empty() {
        return Vec::new();
    }
    let block_size = diskfs_device::BLOCK_SIZE as usize;
    bytes
        .chunks(block_size)
        .map(|chunk| {
            let mut buf = vec![0u8; block_size];
            buf[..chunk.len()].copy_from_slice(chunk);
            buf
        })
        .collect()
}

fn trim_trailing_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &bytes[..end]
}

fn current_timestamp() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_secs() as u32
}

//! Error type shared by every namespace operation.

use diskfs_device::DeviceError;
use thiserror::Error;

/// Everything a namespace operation (`mkdir`, `rm`, `cp`, ...) can fail with.
#[derive(Error, Debug)]
pub enum FsError {
    /// A raw device-level failure (I/O, bad image size) surfaced through.
    #[error("disk image error")]
    Device(#[from] DeviceError),

    /// A path component, or a named child, does not exist.
    #[error("{0}: no such file or directory")]
    NotFound(String),

    /// An operation that requires a directory was given something else.
    #[error("{0}: not a directory")]
    NotDirectory(String),

    /// An operation that requires a file was given something else.
    #[error("{0}: not a file")]
    NotFile(String),

    /// The target name already exists where a new entry was about to be
    /// created, renamed to, or moved to.
    #[error("{0}: already exists")]
    Exists(String),

    /// A directory's child table is already at its 1962-entry capacity.
    #[error("directory is full")]
    Full,

    /// The relevant bitmap partition (inode or data) has no free blocks.
    #[error("no space left on device")]
    NoSpace,

    /// File content would require more than 1962 data blocks.
    #[error("file too large")]
    TooLarge,

    /// A name was empty, too long, contained `/`, or otherwise invalid.
    #[error("{0}: invalid name")]
    BadName(String),

    /// An operation that cannot apply to the root directory was attempted
    /// on it (rename, remove).
    #[error("cannot modify the root directory")]
    IsRoot,

    /// A shell command was given the wrong number of arguments.
    #[error("wrong number of arguments")]
    BadArguments,

    /// An inode index fell outside the valid inode region.
    #[error("inode index out of range")]
    IndexOutOfRange,
}

/// Shorthand result type for namespace operations.
pub type Result<T> = std::result::Result<T, FsError>;

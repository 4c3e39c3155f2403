//! A single-volume filesystem laid out on top of one fixed-size memory
//! mapped image, built on [`diskfs_device`].
//!
//! Three pieces sit between the raw device and the namespace operations
//! that matter to a caller: a two-partition allocation bitmap, a fixed
//! byte-offset inode codec, and a binary-search directory index. None of
//! that is exposed directly — [`Filesystem`] is the surface this crate
//! means for callers to use.

#![deny(missing_docs)]

pub mod bitmap;
pub mod dir;
pub mod error;
pub mod fs;
pub mod geometry;
pub mod inode;
pub mod path;

pub use error::{FsError, Result};
pub use fs::Filesystem;
pub use inode::Kind;

//! Hierarchical binary store used to persist datasets.
//!
//! The store is a tree of [`Group`]s. Each group carries named [`Attr`]ibutes, named
//! [`Data`] blocks and named child groups, which is the minimum a field needs to describe
//! itself: a `fieldname` attribute, the array payload, and child groups for nested arrays.
//!
//! # Key Components
//!
//! - [`Group`], [`Attr`], [`Data`] - In-memory representation of the tree
//! - [`codec`] - Deterministic binary encoding with a SHA-1 integrity trailer
//! - [`StoreFile`] - Read-only memory-mapped access to an encoded store on disk
//! - [`Parser`] and the [`io`] helpers - Bounds-checked little-endian primitives
//!
//! # Examples
//!
//! ```rust
//! use obsdata::store::{codec, Data, Group};
//!
//! let mut root = Group::new();
//! let field = root.create_group("epoch");
//! field.set_attr("fieldname", "epoch");
//! field.set_data("seconds", Data::Float { shape: vec![2], values: vec![0.0, 10.0] });
//!
//! let bytes = codec::encode(&root)?;
//! assert_eq!(codec::decode(&bytes)?, root);
//! # Ok::<(), obsdata::Error>(())
//! ```

pub mod codec;
mod group;
pub mod io;
mod parser;

pub use group::{Attr, Data, Group};
pub use parser::Parser;

use memmap2::Mmap;
use std::{fs, path::Path};

use crate::{Error::FileError, Result};

/// A store file on disk, mapped read-only into memory.
///
/// The mapping is only held while the tree is decoded; the decoded [`Group`] owns all of
/// its data and does not borrow from the file.
#[derive(Debug)]
pub struct StoreFile {
    /// Memory-mapped file data
    data: Mmap,
}

impl StoreFile {
    /// Memory-map the store file at `path`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped.
    pub fn open(path: impl AsRef<Path>) -> Result<StoreFile> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(error) => return Err(FileError(error)),
        };

        if file.metadata()?.len() == 0 {
            return Err(malformed_error!("Store file is empty"));
        }

        let mmap = unsafe { Mmap::map(&file) }.map_err(FileError)?;
        Ok(StoreFile { data: mmap })
    }

    /// Returns the raw file contents
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the size of the file in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the file is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decodes the group tree stored in this file.
    ///
    /// # Errors
    /// Returns the decoding errors of [`codec::decode`].
    pub fn root(&self) -> Result<Group> {
        codec::decode(self.data())
    }
}

/// Reads and decodes a store file.
///
/// # Errors
/// Returns [`crate::Error::FileError`] for I/O failures and the decoding errors of
/// [`codec::decode`].
pub fn read_file(path: impl AsRef<Path>) -> Result<Group> {
    StoreFile::open(path)?.root()
}

/// Encodes a group tree and writes it to `path`, replacing any existing file.
///
/// # Errors
/// Returns [`crate::Error::FileError`] if the file cannot be written, and the encoding
/// errors of [`codec::encode`].
pub fn write_file(path: impl AsRef<Path>, root: &Group) -> Result<()> {
    let bytes = codec::encode(root)?;
    fs::write(path, bytes)?;
    Ok(())
}

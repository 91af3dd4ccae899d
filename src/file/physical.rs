//! Physical file backend for writable memory-mapped I/O.
//!
//! The [`crate::file::physical::Physical`] backend maps a file read-write and shared, so patches
//! applied to the mapping land in the file itself once [`crate::file::Backend::flush`] syncs it.
//! Nothing is copied; only the pages the header walk touches are ever loaded.
//!
//! # Examples
//!
//! ```rust,ignore
//! use keeprelocs::file::{Backend, Physical};
//!
//! let mut physical = Physical::new("app.exe")?;
//! assert_eq!(&physical.data()[0..2], b"MZ");
//!
//! physical.data_mut()[0x3C] = 0x80;
//! physical.flush()?;
//! # Ok::<(), keeprelocs::Error>(())
//! ```

use super::Backend;
use crate::{
    Error::{Empty, Error, FileError},
    Result,
};

use memmap2::MmapMut;
use std::{fs, path::Path};

/// A file backend that maps a file on disk read-write.
///
/// Writes through [`crate::file::Backend::data_mut`] modify the page cache of the mapped file
/// directly; [`crate::file::Backend::flush`] waits for them to reach the disk.
#[derive(Debug)]
pub struct Physical {
    /// Memory-mapped file data
    data: MmapMut,
}

impl Physical {
    /// Create a new physical file backend by memory-mapping the specified file read-write.
    ///
    /// # Arguments
    /// * `path` - Path to the PE file on disk. Accepts `&Path`, `&str`, `String`, or `PathBuf`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened for reading and writing,
    /// [`crate::Error::Empty`] if it has no content and [`crate::Error::Error`] if memory mapping
    /// fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = match fs::OpenOptions::new().read(true).write(true).open(path) {
            Ok(file) => file,
            Err(error) => return Err(FileError(error)),
        };

        Self::from_std_file(file)
    }

    /// Creates a new physical file backend from a file handle opened for reading and writing.
    ///
    /// # Arguments
    /// * `file` - An opened file handle
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file metadata cannot be read,
    /// [`crate::Error::Empty`] if it has no content and [`crate::Error::Error`] if memory mapping
    /// fails.
    #[allow(clippy::needless_pass_by_value)]
    pub fn from_std_file(file: fs::File) -> Result<Physical> {
        if file.metadata()?.len() == 0 {
            return Err(Empty);
        }

        let mmap = unsafe { MmapMut::map_mut(&file) }.map_err(|error| Error(error.to_string()))?;

        Ok(Physical { data: mmap })
    }
}

impl Backend for Physical {
    fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn data_mut(&mut self) -> &mut [u8] {
        self.data.as_mut()
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn flush(&mut self) -> Result<()> {
        self.data.flush()?;
        Ok(())
    }

    fn into_data(self: Box<Self>) -> Vec<u8> {
        self.data.as_ref().to_vec()
    }
}

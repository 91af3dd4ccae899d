//! PE image access and in-place persistence.
//!
//! This module hands the patcher its buffer and makes the result durable. It abstracts over
//! where the image lives through the [`crate::file::Backend`] trait:
//!
//! - [`crate::file::Physical`] - Writable memory-mapped file, patches land in the file itself
//! - [`crate::file::Memory`] - Owned buffer, for dry runs and images that are not on disk
//!
//! [`crate::file::File`] wraps either backend and is the only place in the library that logs.
//!
//! # Examples
//!
//! ```rust,no_run
//! use keeprelocs::{File, Patcher};
//! use std::path::Path;
//!
//! let mut file = File::from_file(Path::new("app.exe"))?;
//! let report = file.patch(&Patcher::new())?;
//! file.flush()?;
//! println!("cleared {} of {} sections", report.cleared(), report.matched());
//! # Ok::<(), keeprelocs::Error>(())
//! ```

pub mod io;

mod memory;
mod physical;

use std::path::Path;

use crate::{
    patcher::{PatchReport, Patcher},
    pe::{Layout, SectionHeader},
    Error::Empty,
    Result,
};
pub use memory::Memory;
pub use physical::Physical;

/// Backend trait for file data sources.
///
/// All implementations must be thread-safe. Writes made through [`Backend::data_mut`] are
/// only guaranteed to be durable after [`Backend::flush`].
pub trait Backend: Send + Sync {
    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the entire data buffer for in-place modification.
    fn data_mut(&mut self) -> &mut [u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize;

    /// Persists modifications made through [`Backend::data_mut`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the data cannot be written back.
    fn flush(&mut self) -> Result<()>;

    /// Consumes the backend and returns its content as an owned buffer.
    fn into_data(self: Box<Self>) -> Vec<u8>;
}

/// A loaded PE image.
///
/// Loading only checks that the image is not empty; the headers are validated on every call of
/// [`File::layout`], [`File::sections`] or [`File::patch`], since the buffer may change in
/// between.
pub struct File {
    /// The underlying data source (memory or file).
    data: Box<dyn Backend>,
}

impl File {
    /// Maps the PE file at `file` read-write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened for writing, is empty or cannot be mapped.
    pub fn from_file(file: &Path) -> Result<File> {
        let input = Physical::new(file)?;

        Self::load(input)
    }

    /// Wraps a PE image that is already in memory.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Empty`] if `data` is empty.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        let input = Memory::new(data);

        Self::load(input)
    }

    fn load<T: Backend + 'static>(data: T) -> Result<File> {
        if data.len() == 0 {
            return Err(Empty);
        }

        Ok(File {
            data: Box::new(data),
        })
    }

    /// Returns the total size of the loaded file in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the file has a length of zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the raw image bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    /// Validates the headers and locates the section table.
    ///
    /// # Errors
    ///
    /// Returns the format error [`crate::pe::Layout::parse`] reports.
    pub fn layout(&self) -> Result<Layout> {
        Layout::parse(self.data())
    }

    /// Decodes the section table.
    ///
    /// # Errors
    ///
    /// Returns the format error [`crate::pe::Layout::parse`] reports.
    pub fn sections(&self) -> Result<Vec<SectionHeader>> {
        self.layout()?.sections(self.data())
    }

    /// Runs `patcher` over the image in place.
    ///
    /// Changes are made to the backend buffer only; call [`File::flush`] to make them durable.
    ///
    /// # Errors
    ///
    /// Returns the format error the patcher reports, in which case the image is unchanged.
    pub fn patch(&mut self, patcher: &Patcher) -> Result<PatchReport> {
        if log::log_enabled!(log::Level::Debug) {
            if let Ok(layout) = self.layout() {
                log::debug!(
                    "PE header at 0x{:x}, {} optional header of {} bytes, {} sections at 0x{:x}",
                    layout.pe.offset,
                    layout.optional.kind(),
                    layout.optional.size,
                    layout.section_count(),
                    layout.section_table.start
                );
            }
        }

        let report = patcher.run(self.data.data_mut())?;

        for section in &report.sections {
            log::debug!(
                "section {} '{}' characteristics: {:08x} -> {:08x}",
                section.index,
                section.name(),
                section.characteristics_before,
                section.characteristics_after
            );
        }

        if report.matched() == 0 {
            log::info!("no .reloc section found, nothing to do");
        } else if report.dry_run {
            log::info!(
                "dry run: would clear {} of {} matching sections",
                report.cleared(),
                report.matched()
            );
        } else {
            log::info!(
                "cleared {} of {} matching sections",
                report.cleared(),
                report.matched()
            );
        }

        Ok(report)
    }

    /// Persists all changes to the backing storage.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the data cannot be written back.
    pub fn flush(&mut self) -> Result<()> {
        self.data.flush()
    }

    /// Consumes the file and returns the image bytes.
    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.data.into_data()
    }
}

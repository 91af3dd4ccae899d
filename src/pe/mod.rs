//! PE/COFF header layout.
//!
//! This module walks the headers of a Portable Executable image far enough to locate its
//! section table. Every structure is a short-lived, owned decoding of the caller's buffer;
//! nothing here keeps a reference to the image.
//!
//! # Layout
//!
//! | Structure        | Location                                   | Size       |
//! |------------------|--------------------------------------------|------------|
//! | MS-DOS stub      | 0                                          | 64         |
//! | PE header        | `e_lfanew` (stub offset 60)                | 24         |
//! | Optional header  | PE header + 24                             | declared   |
//! | Section table    | optional header + declared size            | count × 40 |
//!
//! All integers are little-endian. [`Layout::parse`] validates the whole chain, section table
//! bounds included, before anything is allowed to touch the image.
//!
//! # Examples
//!
//! ```rust,no_run
//! use keeprelocs::pe::Layout;
//!
//! let data = std::fs::read("app.exe")?;
//! let layout = Layout::parse(&data)?;
//! for section in layout.sections(&data)? {
//!     println!("{:<8} {:08x}", section.name(), section.characteristics);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod dos;
mod header;
mod optional;
mod section;

use std::ops::Range;

pub use dos::{DosHeader, DOS_HEADER_SIZE};
pub use header::{PeHeader, PE_HEADER_SIZE};
pub use optional::{OptionalHeader, OptionalHeaderKind, MIN_OPTIONAL_HEADER_SIZE};
pub use section::{
    name_matches, SectionCharacteristics, SectionHeader, CHARACTERISTICS_OFFSET,
    RELOC_SECTION_NAME, SECTION_HEADER_SIZE,
};

use crate::{Error::TruncatedSectionTable, Result};

/// The validated header chain of a PE image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// The MS-DOS stub header
    pub dos: DosHeader,
    /// The PE header
    pub pe: PeHeader,
    /// The optional header span
    pub optional: OptionalHeader,
    /// Byte range of the section table, guaranteed to lie inside the image
    pub section_table: Range<usize>,
}

impl Layout {
    /// Validates the headers of `data` and computes the section table bounds.
    ///
    /// # Errors
    /// Returns the first format error found walking from the stub header to the section table:
    /// [`crate::Error::InvalidStubSignature`], [`crate::Error::TruncatedImage`],
    /// [`crate::Error::InvalidPeMagic`], [`crate::Error::MissingOptionalHeader`],
    /// [`crate::Error::InvalidOptionalHeader`] or [`crate::Error::TruncatedSectionTable`].
    pub fn parse(data: &[u8]) -> Result<Layout> {
        let dos = DosHeader::parse(data)?;
        let pe = PeHeader::parse(data, dos.pe_pointer as usize)?;
        let optional = OptionalHeader::parse(data, pe.end(), pe.size_of_optional_header)?;

        let Some(start) = optional.end() else {
            return Err(TruncatedSectionTable);
        };

        let Some(end) = usize::from(pe.number_of_sections)
            .checked_mul(SECTION_HEADER_SIZE)
            .and_then(|size| start.checked_add(size))
        else {
            return Err(TruncatedSectionTable);
        };

        if start > data.len() || end > data.len() {
            return Err(TruncatedSectionTable);
        }

        Ok(Layout {
            dos,
            pe,
            optional,
            section_table: start..end,
        })
    }

    /// Number of entries in the section table.
    #[must_use]
    pub fn section_count(&self) -> usize {
        usize::from(self.pe.number_of_sections)
    }

    /// Absolute offset of section table entry `index`, `None` past the last entry.
    #[must_use]
    pub fn section_offset(&self, index: usize) -> Option<usize> {
        if index >= self.section_count() {
            return None;
        }

        Some(self.section_table.start + index * SECTION_HEADER_SIZE)
    }

    /// Decodes section table entry `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `index` is past the last entry or `data` is not
    /// the image this layout was parsed from.
    pub fn section(&self, data: &[u8], index: usize) -> Result<SectionHeader> {
        let Some(offset) = self.section_offset(index) else {
            return Err(crate::Error::OutOfBounds);
        };

        SectionHeader::parse(data, offset)
    }

    /// Decodes the whole section table.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `data` is not the image this layout was parsed
    /// from.
    pub fn sections(&self, data: &[u8]) -> Result<Vec<SectionHeader>> {
        (0..self.section_count())
            .map(|index| self.section(data, index))
            .collect()
    }
}

//! Optional header location and classification.
//!
//! The section table starts right after the optional header, so its declared size is all the
//! patcher needs. The internal layout differs between PE32 and PE32+ and is not interpreted
//! beyond the magic, which is only reported.

use goblin::pe::optional_header::{MAGIC_32, MAGIC_64};

use crate::{
    file::io::read_le_at,
    Error::{InvalidOptionalHeader, MissingOptionalHeader},
    Result,
};

/// Size of the smallest standard-fields block of any optional header format (PE32+).
///
/// A declared optional header size below this cannot describe a loadable image.
pub const MIN_OPTIONAL_HEADER_SIZE: u16 = 24;

/// Optional header format as identified by its magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionalHeaderKind {
    /// 32-bit image, magic `0x10B`
    Pe32,
    /// 64-bit image, magic `0x20B`
    Pe32Plus,
    /// Any other magic, or a magic that lies outside the image
    Unknown,
}

impl std::fmt::Display for OptionalHeaderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionalHeaderKind::Pe32 => write!(f, "PE32"),
            OptionalHeaderKind::Pe32Plus => write!(f, "PE32+"),
            OptionalHeaderKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// The span of the optional header within the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionalHeader {
    /// Absolute offset of the first optional header byte
    pub offset: usize,
    /// Declared size in bytes, taken from the PE header
    pub size: u16,
    /// The magic, if the first two bytes lie inside the image
    pub magic: Option<u16>,
}

impl OptionalHeader {
    /// Locates the optional header of `size` bytes at `offset`.
    ///
    /// The span is not required to fit into `data`; the section table bounds check that
    /// follows covers it.
    ///
    /// # Errors
    /// Returns [`crate::Error::MissingOptionalHeader`] for a size of zero and
    /// [`crate::Error::InvalidOptionalHeader`] for sizes below [`MIN_OPTIONAL_HEADER_SIZE`].
    pub fn parse(data: &[u8], offset: usize, size: u16) -> Result<OptionalHeader> {
        if size == 0 {
            return Err(MissingOptionalHeader);
        }

        if size < MIN_OPTIONAL_HEADER_SIZE {
            return Err(InvalidOptionalHeader(size));
        }

        let mut cursor = offset;
        let magic = read_le_at::<u16>(data, &mut cursor).ok();

        Ok(OptionalHeader {
            offset,
            size,
            magic,
        })
    }

    /// The format the magic identifies.
    #[must_use]
    pub fn kind(&self) -> OptionalHeaderKind {
        match self.magic {
            Some(MAGIC_32) => OptionalHeaderKind::Pe32,
            Some(MAGIC_64) => OptionalHeaderKind::Pe32Plus,
            _ => OptionalHeaderKind::Unknown,
        }
    }

    /// Absolute offset of the first byte after the optional header, `None` on overflow.
    #[must_use]
    pub fn end(&self) -> Option<usize> {
        self.offset.checked_add(usize::from(self.size))
    }
}

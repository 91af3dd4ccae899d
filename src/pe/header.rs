//! PE signature and COFF file header.

use goblin::pe::header::{PE_MAGIC, SIZEOF_COFF_HEADER, SIZEOF_PE_MAGIC};

use crate::{
    file::io::read_le_at,
    Error::{InvalidPeMagic, MissingOptionalHeader, TruncatedImage},
    Result,
};

/// Size of the `PE\0\0` magic followed by the COFF file header.
pub const PE_HEADER_SIZE: usize = SIZEOF_PE_MAGIC + SIZEOF_COFF_HEADER;

/// The PE header located through [`crate::pe::DosHeader::pe_pointer`].
///
/// Only `number_of_sections` and `size_of_optional_header` drive the layout computation, the
/// remaining fields are decoded for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeHeader {
    /// Absolute file offset of the `PE\0\0` magic
    pub offset: usize,
    /// Target machine type
    pub machine: u16,
    /// Number of entries in the section table
    pub number_of_sections: u16,
    /// Link time stamp
    pub time_date_stamp: u32,
    /// File offset of the COFF symbol table, usually zero for images
    pub pointer_to_symbol_table: u32,
    /// Number of COFF symbols
    pub number_of_symbols: u32,
    /// Size of the optional header that follows, in bytes
    pub size_of_optional_header: u16,
    /// Image characteristics flags
    pub characteristics: u16,
}

impl PeHeader {
    /// Reads the PE header at `offset`.
    ///
    /// ## Arguments
    /// * `data`    - The image
    /// * `offset`  - Absolute offset of the `PE\0\0` magic
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedImage`] if the 24-byte header does not fit into `data`,
    /// [`crate::Error::InvalidPeMagic`] if the magic is wrong and
    /// [`crate::Error::MissingOptionalHeader`] for object files without an optional header.
    pub fn parse(data: &[u8], offset: usize) -> Result<PeHeader> {
        match offset.checked_add(PE_HEADER_SIZE) {
            Some(end) if end <= data.len() => {}
            _ => return Err(TruncatedImage),
        }

        let mut cursor = offset;
        let magic: u32 = read_le_at(data, &mut cursor)?;
        if magic != PE_MAGIC {
            return Err(InvalidPeMagic);
        }

        let header = PeHeader {
            offset,
            machine: read_le_at(data, &mut cursor)?,
            number_of_sections: read_le_at(data, &mut cursor)?,
            time_date_stamp: read_le_at(data, &mut cursor)?,
            pointer_to_symbol_table: read_le_at(data, &mut cursor)?,
            number_of_symbols: read_le_at(data, &mut cursor)?,
            size_of_optional_header: read_le_at(data, &mut cursor)?,
            characteristics: read_le_at(data, &mut cursor)?,
        };

        if header.size_of_optional_header == 0 {
            return Err(MissingOptionalHeader);
        }

        Ok(header)
    }

    /// Absolute offset of the first byte after the COFF file header, where the optional header
    /// begins.
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + PE_HEADER_SIZE
    }
}

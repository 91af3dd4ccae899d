//! Section table entries and their characteristics.

use bitflags::bitflags;
use goblin::pe::section_table::{
    IMAGE_SCN_CNT_CODE, IMAGE_SCN_CNT_INITIALIZED_DATA, IMAGE_SCN_CNT_UNINITIALIZED_DATA,
    IMAGE_SCN_MEM_DISCARDABLE, IMAGE_SCN_MEM_EXECUTE, IMAGE_SCN_MEM_NOT_CACHED,
    IMAGE_SCN_MEM_NOT_PAGED, IMAGE_SCN_MEM_READ, IMAGE_SCN_MEM_SHARED, IMAGE_SCN_MEM_WRITE,
};

use crate::{
    file::io::{read_bytes_at, read_le_at},
    Result,
};

/// Size of one section table entry.
pub const SECTION_HEADER_SIZE: usize = 40;

/// Offset of the characteristics field within a section table entry.
pub const CHARACTERISTICS_OFFSET: usize = 36;

/// Raw name of the base relocation section.
pub const RELOC_SECTION_NAME: &[u8] = b".reloc";

bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    /// Section characteristics flags
    ///
    /// Unnamed bits such as the object-file alignment field are kept when decoding with
    /// [`SectionCharacteristics::from_bits_retain`].
    pub struct SectionCharacteristics : u32 {
        /// The section contains executable code
        const CNT_CODE = IMAGE_SCN_CNT_CODE;
        /// The section contains initialized data
        const CNT_INITIALIZED_DATA = IMAGE_SCN_CNT_INITIALIZED_DATA;
        /// The section contains uninitialized data
        const CNT_UNINITIALIZED_DATA = IMAGE_SCN_CNT_UNINITIALIZED_DATA;
        /// The section can be discarded as needed
        const MEM_DISCARDABLE = IMAGE_SCN_MEM_DISCARDABLE;
        /// The section cannot be cached
        const MEM_NOT_CACHED = IMAGE_SCN_MEM_NOT_CACHED;
        /// The section is not pageable
        const MEM_NOT_PAGED = IMAGE_SCN_MEM_NOT_PAGED;
        /// The section can be shared in memory
        const MEM_SHARED = IMAGE_SCN_MEM_SHARED;
        /// The section can be executed as code
        const MEM_EXECUTE = IMAGE_SCN_MEM_EXECUTE;
        /// The section can be read
        const MEM_READ = IMAGE_SCN_MEM_READ;
        /// The section can be written to
        const MEM_WRITE = IMAGE_SCN_MEM_WRITE;
    }
}

impl SectionCharacteristics {
    /// Names of the set flags, in declaration order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

/// Returns `true` if the first `prefix.len()` bytes of `name` equal `prefix`.
///
/// Section names are fixed 8-byte fields that are only NUL padded when shorter than 8 bytes,
/// so this is a plain byte comparison: `.reloc12` matches the prefix `.reloc`. A prefix longer
/// than the name field never matches.
#[must_use]
pub fn name_matches(name: &[u8; 8], prefix: &[u8]) -> bool {
    name.starts_with(prefix)
}

/// One decoded section table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    /// Absolute offset of the entry within the image
    pub offset: usize,
    /// Raw 8-byte name, not necessarily NUL-terminated
    pub name: [u8; 8],
    /// Size of the section once loaded
    pub virtual_size: u32,
    /// RVA of the section once loaded
    pub virtual_address: u32,
    /// Size of the initialized data on disk
    pub size_of_raw_data: u32,
    /// File offset of the data on disk
    pub pointer_to_raw_data: u32,
    /// File offset of the COFF relocations, zero for images
    pub pointer_to_relocations: u32,
    /// File offset of the COFF line numbers, zero for images
    pub pointer_to_linenumbers: u32,
    /// Number of COFF relocations
    pub number_of_relocations: u16,
    /// Number of COFF line numbers
    pub number_of_linenumbers: u16,
    /// Raw characteristics field
    pub characteristics: u32,
}

impl SectionHeader {
    /// Reads the 40-byte section table entry at `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the entry does not fit into `data`.
    pub fn parse(data: &[u8], offset: usize) -> Result<SectionHeader> {
        let name = read_bytes_at::<8>(data, offset)?;

        let mut cursor = offset + name.len();
        Ok(SectionHeader {
            offset,
            name,
            virtual_size: read_le_at(data, &mut cursor)?,
            virtual_address: read_le_at(data, &mut cursor)?,
            size_of_raw_data: read_le_at(data, &mut cursor)?,
            pointer_to_raw_data: read_le_at(data, &mut cursor)?,
            pointer_to_relocations: read_le_at(data, &mut cursor)?,
            pointer_to_linenumbers: read_le_at(data, &mut cursor)?,
            number_of_relocations: read_le_at(data, &mut cursor)?,
            number_of_linenumbers: read_le_at(data, &mut cursor)?,
            characteristics: read_le_at(data, &mut cursor)?,
        })
    }

    /// Returns `true` if the raw name starts with `prefix`, see [`name_matches`].
    #[must_use]
    pub fn matches(&self, prefix: &[u8]) -> bool {
        name_matches(&self.name, prefix)
    }

    /// The name for display, with trailing NUL padding removed.
    #[must_use]
    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.name)
            .trim_end_matches('\0')
            .to_string()
    }

    /// The characteristics field as typed flags, unnamed bits included.
    #[must_use]
    pub fn flags(&self) -> SectionCharacteristics {
        SectionCharacteristics::from_bits_retain(self.characteristics)
    }

    /// Absolute offset of this entry's characteristics field.
    #[must_use]
    pub fn characteristics_offset(&self) -> usize {
        self.offset + CHARACTERISTICS_OFFSET
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &[u8; 8], characteristics: u32) -> Vec<u8> {
        let mut data = Vec::with_capacity(SECTION_HEADER_SIZE);
        data.extend_from_slice(name);
        for value in [0x0000_0A10_u32, 0x5000, 0x0C00, 0x4200, 0, 0] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data.extend_from_slice(&0_u16.to_le_bytes());
        data.extend_from_slice(&0_u16.to_le_bytes());
        data.extend_from_slice(&characteristics.to_le_bytes());
        data
    }

    #[test]
    fn parse_entry() {
        let data = entry(b".reloc\0\0", 0x4200_0040);
        let section = SectionHeader::parse(&data, 0).unwrap();

        assert_eq!(section.name(), ".reloc");
        assert_eq!(section.virtual_size, 0x0A10);
        assert_eq!(section.virtual_address, 0x5000);
        assert_eq!(section.size_of_raw_data, 0x0C00);
        assert_eq!(section.pointer_to_raw_data, 0x4200);
        assert_eq!(section.characteristics, 0x4200_0040);
        assert_eq!(section.characteristics_offset(), CHARACTERISTICS_OFFSET);
        assert_eq!(
            section.flags(),
            SectionCharacteristics::CNT_INITIALIZED_DATA
                | SectionCharacteristics::MEM_DISCARDABLE
                | SectionCharacteristics::MEM_READ
        );
    }

    #[test]
    fn parse_truncated() {
        let data = entry(b".text\0\0\0", 0x6000_0020);
        assert!(SectionHeader::parse(&data[..SECTION_HEADER_SIZE - 1], 0).is_err());
        assert!(SectionHeader::parse(&data, 1).is_err());
        assert!(SectionHeader::parse(&data, usize::MAX).is_err());
    }

    #[test]
    fn prefix_semantics() {
        assert!(name_matches(b".reloc\0\0", RELOC_SECTION_NAME));
        assert!(name_matches(b".reloc12", RELOC_SECTION_NAME));
        assert!(name_matches(b".relocat", RELOC_SECTION_NAME));
        assert!(!name_matches(b".reloa\0\0", RELOC_SECTION_NAME));
        assert!(!name_matches(b".rel\0\0\0\0", RELOC_SECTION_NAME));
        assert!(!name_matches(b"reloc\0\0\0", RELOC_SECTION_NAME));
        assert!(!name_matches(b".RELOC\0\0", RELOC_SECTION_NAME));
        assert!(!name_matches(b".reloc\0\0", b".reloc\0\0\0"));
    }

    #[test]
    fn unnamed_bits_survive() {
        // IMAGE_SCN_ALIGN_16BYTES lives in the alignment nibble and has no flag of its own
        let flags = SectionCharacteristics::from_bits_retain(0x0050_0000 | IMAGE_SCN_MEM_READ);
        assert_eq!(flags.bits(), 0x4050_0000);
        assert_eq!(flags.names(), vec!["MEM_READ"]);
    }
}

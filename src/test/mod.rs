//! Crafted PE images for unit tests.

use crate::pe::{PE_HEADER_SIZE, SECTION_HEADER_SIZE};

/// Filler for every byte the builder does not give a meaning, so stray writes show up in
/// byte-for-byte comparisons.
const FILLER: u8 = 0xCC;

/// Builds minimal PE images: an MS-DOS stub, a PE header, an optional header of the declared
/// size and a section table. No section data is emitted unless asked for with
/// [`PeImageBuilder::trailing_bytes`].
#[derive(Debug, Clone)]
pub struct PeImageBuilder {
    pe_offset: u32,
    machine: u16,
    optional_magic: u16,
    optional_header_size: u16,
    declared_section_count: Option<u16>,
    sections: Vec<([u8; 8], u32)>,
    trailing_bytes: usize,
}

impl PeImageBuilder {
    /// A 32-bit x86 image with a 224-byte optional header.
    pub fn pe32() -> Self {
        PeImageBuilder {
            pe_offset: 0x80,
            machine: 0x014C,
            optional_magic: 0x010B,
            optional_header_size: 0xE0,
            declared_section_count: None,
            sections: Vec::new(),
            trailing_bytes: 0,
        }
    }

    /// A 64-bit x64 image with a 240-byte optional header.
    pub fn pe32_plus() -> Self {
        PeImageBuilder {
            machine: 0x8664,
            optional_magic: 0x020B,
            optional_header_size: 0xF0,
            ..Self::pe32()
        }
    }

    /// Places the PE header at `offset` instead of `0x80`; must be at least 64.
    pub fn pe_offset(mut self, offset: u32) -> Self {
        self.pe_offset = offset;
        self
    }

    /// Overrides the optional header magic.
    pub fn optional_magic(mut self, magic: u16) -> Self {
        self.optional_magic = magic;
        self
    }

    /// Overrides the declared optional header size; the emitted header follows it.
    pub fn optional_header_size(mut self, size: u16) -> Self {
        self.optional_header_size = size;
        self
    }

    /// Declares `count` sections in the PE header regardless of how many are emitted.
    pub fn declared_section_count(mut self, count: u16) -> Self {
        self.declared_section_count = Some(count);
        self
    }

    /// Appends a section table entry. Names shorter than 8 bytes are NUL padded, longer names
    /// are cut to 8 bytes.
    pub fn section(mut self, name: &[u8], characteristics: u32) -> Self {
        let mut raw = [0u8; 8];
        let len = name.len().min(raw.len());
        raw[..len].copy_from_slice(&name[..len]);

        self.sections.push((raw, characteristics));
        self
    }

    /// Appends `count` filler bytes after the section table.
    pub fn trailing_bytes(mut self, count: usize) -> Self {
        self.trailing_bytes = count;
        self
    }

    /// Absolute offset of section table entry `index`.
    pub fn section_offset(&self, index: usize) -> usize {
        self.pe_offset as usize
            + PE_HEADER_SIZE
            + usize::from(self.optional_header_size)
            + index * SECTION_HEADER_SIZE
    }

    /// Absolute offset of the characteristics field of section table entry `index`.
    pub fn characteristics_offset(&self, index: usize) -> usize {
        self.section_offset(index) + 36
    }

    /// Emits the image.
    pub fn build(&self) -> Vec<u8> {
        let pe_offset = self.pe_offset as usize;
        let table_end = self.section_offset(self.sections.len());
        let mut data = vec![FILLER; table_end + self.trailing_bytes];

        data[0..2].copy_from_slice(b"MZ");
        data[60..64].copy_from_slice(&self.pe_offset.to_le_bytes());

        let section_count = self
            .declared_section_count
            .unwrap_or(u16::try_from(self.sections.len()).unwrap());

        let mut header = Vec::with_capacity(PE_HEADER_SIZE);
        header.extend_from_slice(b"PE\0\0");
        header.extend_from_slice(&self.machine.to_le_bytes());
        header.extend_from_slice(&section_count.to_le_bytes());
        header.extend_from_slice(&0x6502_1A2B_u32.to_le_bytes());
        header.extend_from_slice(&0_u32.to_le_bytes());
        header.extend_from_slice(&0_u32.to_le_bytes());
        header.extend_from_slice(&self.optional_header_size.to_le_bytes());
        header.extend_from_slice(&0x0022_u16.to_le_bytes());
        data[pe_offset..pe_offset + PE_HEADER_SIZE].copy_from_slice(&header);

        let optional_offset = pe_offset + PE_HEADER_SIZE;
        if self.optional_header_size >= 2 {
            data[optional_offset..optional_offset + 2]
                .copy_from_slice(&self.optional_magic.to_le_bytes());
        }

        for (index, (name, characteristics)) in self.sections.iter().enumerate() {
            let offset = self.section_offset(index);
            let index = u32::try_from(index).unwrap();

            let mut entry = Vec::with_capacity(SECTION_HEADER_SIZE);
            entry.extend_from_slice(name);
            entry.extend_from_slice(&0x0000_0800_u32.to_le_bytes());
            entry.extend_from_slice(&(0x1000 * (index + 1)).to_le_bytes());
            entry.extend_from_slice(&0x0000_0200_u32.to_le_bytes());
            entry.extend_from_slice(&(0x0400 + 0x0200 * index).to_le_bytes());
            entry.extend_from_slice(&0_u32.to_le_bytes());
            entry.extend_from_slice(&0_u32.to_le_bytes());
            entry.extend_from_slice(&0_u16.to_le_bytes());
            entry.extend_from_slice(&0_u16.to_le_bytes());
            entry.extend_from_slice(&characteristics.to_le_bytes());
            data[offset..offset + SECTION_HEADER_SIZE].copy_from_slice(&entry);
        }

        data
    }
}

/// Reads the little-endian characteristics of section table entry `index` straight from `data`.
pub fn characteristics_at(builder: &PeImageBuilder, data: &[u8], index: usize) -> u32 {
    let offset = builder.characteristics_offset(index);
    u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap())
}

/// Offsets of all bytes where `before` and `after` differ.
pub fn changed_offsets(before: &[u8], after: &[u8]) -> Vec<usize> {
    assert_eq!(before.len(), after.len());
    before
        .iter()
        .zip(after)
        .enumerate()
        .filter(|(_, (a, b))| a != b)
        .map(|(offset, _)| offset)
        .collect()
}

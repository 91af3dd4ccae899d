//! A complete PE32+ image, laid out the way a linker would, for end-to-end tests.

#![allow(dead_code)]

pub const PE_OFFSET: usize = 0x80;
pub const OPTIONAL_HEADER_SIZE: usize = 0xF0;
pub const FILE_ALIGNMENT: u32 = 0x200;
pub const SECTION_ALIGNMENT: u32 = 0x1000;

pub const TEXT: u32 = 0x6000_0020;
pub const DATA: u32 = 0xC000_0040;
pub const RELOC: u32 = 0x4200_0040;

fn put(data: &mut [u8], offset: usize, bytes: &[u8]) {
    data[offset..offset + bytes.len()].copy_from_slice(bytes);
}

/// Offset of the characteristics field of section `index`.
pub fn characteristics_offset(index: usize) -> usize {
    PE_OFFSET + 24 + OPTIONAL_HEADER_SIZE + index * 40 + 36
}

/// Reads the characteristics of section `index`.
pub fn characteristics(data: &[u8], index: usize) -> u32 {
    let offset = characteristics_offset(index);
    u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap())
}

/// Builds an x64 image with one file-aligned block of raw data per section.
pub fn image(sections: &[(&str, u32)]) -> Vec<u8> {
    let raw_size = FILE_ALIGNMENT as usize;
    let headers_size = 2 * raw_size;
    let mut data = vec![0u8; headers_size + sections.len() * raw_size];

    // MS-DOS stub
    put(&mut data, 0, b"MZ");
    put(&mut data, 0x3C, &(PE_OFFSET as u32).to_le_bytes());

    // COFF header
    let count = u16::try_from(sections.len()).unwrap();
    put(&mut data, PE_OFFSET, b"PE\0\0");
    put(&mut data, PE_OFFSET + 4, &0x8664_u16.to_le_bytes());
    put(&mut data, PE_OFFSET + 6, &count.to_le_bytes());
    put(&mut data, PE_OFFSET + 20, &(OPTIONAL_HEADER_SIZE as u16).to_le_bytes());
    put(&mut data, PE_OFFSET + 22, &0x0022_u16.to_le_bytes());

    // PE32+ optional header
    let optional = PE_OFFSET + 24;
    let image_size = SECTION_ALIGNMENT * (u32::from(count) + 1);
    put(&mut data, optional, &0x020B_u16.to_le_bytes());
    put(&mut data, optional + 24, &0x1_4000_0000_u64.to_le_bytes());
    put(&mut data, optional + 32, &SECTION_ALIGNMENT.to_le_bytes());
    put(&mut data, optional + 36, &FILE_ALIGNMENT.to_le_bytes());
    put(&mut data, optional + 40, &6_u16.to_le_bytes());
    put(&mut data, optional + 48, &6_u16.to_le_bytes());
    put(&mut data, optional + 56, &image_size.to_le_bytes());
    put(&mut data, optional + 60, &(headers_size as u32).to_le_bytes());
    put(&mut data, optional + 68, &3_u16.to_le_bytes());
    put(&mut data, optional + 70, &0x8160_u16.to_le_bytes());
    put(&mut data, optional + 72, &0x10_0000_u64.to_le_bytes());
    put(&mut data, optional + 80, &0x1000_u64.to_le_bytes());
    put(&mut data, optional + 88, &0x10_0000_u64.to_le_bytes());
    put(&mut data, optional + 96, &0x1000_u64.to_le_bytes());
    put(&mut data, optional + 108, &16_u32.to_le_bytes());

    // Section table and raw data
    for (index, (name, characteristics)) in sections.iter().enumerate() {
        let entry = optional + OPTIONAL_HEADER_SIZE + index * 40;
        let raw_offset = headers_size + index * raw_size;
        let rva = SECTION_ALIGNMENT * (u32::try_from(index).unwrap() + 1);

        put(&mut data, entry, name.as_bytes());
        put(&mut data, entry + 8, &0x100_u32.to_le_bytes());
        put(&mut data, entry + 12, &rva.to_le_bytes());
        put(&mut data, entry + 16, &(raw_size as u32).to_le_bytes());
        put(&mut data, entry + 20, &(raw_offset as u32).to_le_bytes());
        put(&mut data, entry + 36, &characteristics.to_le_bytes());

        data[raw_offset..raw_offset + 0x100].fill(0x90);
    }

    data
}

/// A temporary path unique to this process and `name`.
pub fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("keeprelocs_it_{}_{name}", std::process::id()))
}

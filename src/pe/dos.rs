//! MS-DOS stub header.

use goblin::pe::header::{DOS_MAGIC, PE_POINTER_OFFSET};

use crate::{
    file::io::{read_le, read_le_at},
    Error::{InvalidStubSignature, TruncatedImage},
    Result,
};

/// Size of the MS-DOS stub header every PE image starts with.
pub const DOS_HEADER_SIZE: usize = 64;

/// The two fields of the MS-DOS stub header that lead to the PE header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosHeader {
    /// `MZ` signature, `0x5A4D` when read little-endian
    pub signature: u16,
    /// Absolute file offset of the PE header (`e_lfanew`)
    pub pe_pointer: u32,
}

impl DosHeader {
    /// Reads the stub header at the start of `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidStubSignature`] if the image does not start with `MZ`, and
    /// [`crate::Error::TruncatedImage`] if it is too short to hold the signature or the full
    /// 64-byte stub header.
    pub fn parse(data: &[u8]) -> Result<DosHeader> {
        let signature: u16 = read_le(data).map_err(|_| TruncatedImage)?;
        if signature != DOS_MAGIC {
            return Err(InvalidStubSignature);
        }

        if data.len() < DOS_HEADER_SIZE {
            return Err(TruncatedImage);
        }

        let mut offset = PE_POINTER_OFFSET as usize;
        let pe_pointer: u32 = read_le_at(data, &mut offset).map_err(|_| TruncatedImage)?;

        Ok(DosHeader {
            signature,
            pe_pointer,
        })
    }
}

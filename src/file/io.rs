//! Bounds-checked little-endian reading and writing of primitive values.
//!
//! Every header field of a PE image is addressed through an offset that comes out of the image
//! itself, so nothing here trusts an offset. Each accessor checks `offset + size_of::<T>()`
//! against the buffer length with overflow-safe arithmetic and returns
//! [`crate::Error::OutOfBounds`] instead of panicking.
//!
//! # Key Components
//!
//! - [`crate::file::io::PeIO`] - Trait defining the byte conversions for primitive types
//! - [`crate::file::io::read_le`] / [`crate::file::io::read_le_at`] - Little-endian reads
//! - [`crate::file::io::write_le`] / [`crate::file::io::write_le_at`] - Little-endian writes
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use keeprelocs::file::io::{read_le_at, write_le_at};
//!
//! let mut data = [0x4D, 0x5A, 0x90, 0x00];
//! let mut offset = 0;
//!
//! let signature: u16 = read_le_at(&data, &mut offset)?;
//! assert_eq!(signature, 0x5A4D);
//! assert_eq!(offset, 2);
//!
//! write_le_at(&mut data, &mut offset, 0u16)?;
//! assert_eq!(data, [0x4D, 0x5A, 0x00, 0x00]);
//! # Ok::<(), keeprelocs::Error>(())
//! ```

use crate::{Error::OutOfBounds, Result};

/// Trait for implementing type-specific safe binary data reading and writing operations.
///
/// Each implementation defines a `Bytes` associated type that represents the fixed-size
/// byte array required for that particular type (e.g., `[u8; 4]` for `u32`).
pub trait PeIO: Sized {
    /// Associated type representing the byte array type for this numeric type.
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte buffer in little-endian
    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Write T to a byte buffer in little-endian
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_pe_io {
    ($($ty:ty),*) => {
        $(
            impl PeIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }
            }
        )*
    };
}

impl_pe_io!(u8, u16, u32, u64);

/// Returns `offset..offset + len` if the whole range lies inside a buffer of `data_len` bytes.
fn checked_range(data_len: usize, offset: usize, len: usize) -> Result<std::ops::Range<usize>> {
    let Some(end) = offset.checked_add(len) else {
        return Err(OutOfBounds);
    };

    if end > data_len {
        return Err(OutOfBounds);
    }

    Ok(offset..end)
}

/// Safely reads a value of type `T` in little-endian byte order from the start of `data`.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_le<T: PeIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Safely reads a value of type `T` in little-endian byte order at `offset`.
///
/// The offset is advanced by the size of `T` after a successful read and left untouched
/// otherwise.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_le_at<T: PeIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let range = checked_range(data.len(), *offset, std::mem::size_of::<T>())?;
    let end = range.end;

    let Ok(read) = data[range].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;

    Ok(T::from_le_bytes(read))
}

/// Safely writes a value of type `T` in little-endian byte order to the start of `data`.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn write_le<T: PeIO>(data: &mut [u8], value: T) -> Result<()> {
    let mut offset = 0_usize;
    write_le_at(data, &mut offset, value)
}

/// Safely writes a value of type `T` in little-endian byte order at `offset`.
///
/// The offset is advanced by the size of `T` after a successful write. Nothing is written if the
/// value does not fit.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn write_le_at<T: PeIO>(data: &mut [u8], offset: &mut usize, value: T) -> Result<()> {
    let range = checked_range(data.len(), *offset, std::mem::size_of::<T>())?;
    let end = range.end;

    data[range].copy_from_slice(value.to_le_bytes().as_ref());
    *offset = end;

    Ok(())
}

/// Safely borrows the `N` bytes at `offset` as a fixed-size array.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_bytes_at<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    let range = checked_range(data.len(), offset, N)?;

    let Ok(bytes) = <[u8; N]>::try_from(&data[range]) else {
        return Err(OutOfBounds);
    };

    Ok(bytes)
}

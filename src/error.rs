use thiserror::Error;

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The PE format variants are raised while walking the image headers. All of them are detected
/// before the first byte of the image is written, so a failed patch never leaves a partially
/// modified buffer behind.
///
/// # Error Categories
///
/// ## PE Format Errors
/// - [`Error::InvalidStubSignature`] - The image does not start with `MZ`
/// - [`Error::TruncatedImage`] - The image ends before the PE header does
/// - [`Error::InvalidPeMagic`] - The PE header does not start with `PE\0\0`
/// - [`Error::MissingOptionalHeader`] - The image is an object file without an optional header
/// - [`Error::InvalidOptionalHeader`] - The declared optional header size is implausibly small
/// - [`Error::TruncatedSectionTable`] - The section table does not fit into the image
///
/// ## I/O Errors
/// - [`Error::OutOfBounds`] - A primitive read or write crossed the end of the buffer
/// - [`Error::Empty`] - Empty input provided
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::Error`] - Memory mapping and other backend failures
///
/// # Examples
///
/// ```rust
/// use keeprelocs::{patch, Error};
///
/// let mut data = vec![0u8; 64];
/// match patch(&mut data) {
///     Ok(count) => println!("patched {count} sections"),
///     Err(Error::InvalidStubSignature) => eprintln!("not a PE image"),
///     Err(e) => eprintln!("other error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    // PE format errors
    /// The MS-DOS stub header does not carry the `MZ` signature.
    #[error("File has an incorrect MZ header signature")]
    InvalidStubSignature,

    /// The image is too short to hold the MS-DOS stub header, or the PE header the stub points
    /// to would extend beyond the end of the image.
    #[error("File is truncated before the end of the PE header")]
    TruncatedImage,

    /// The PE header does not start with the `PE\0\0` magic.
    #[error("File has an incorrect PE header magic")]
    InvalidPeMagic,

    /// The PE header declares an optional header size of zero.
    ///
    /// This is the layout of a COFF object file rather than a loadable image, which this
    /// library does not patch.
    #[error("File has an empty OptionalHeader")]
    MissingOptionalHeader,

    /// The declared optional header size is smaller than the standard fields of any optional
    /// header format.
    ///
    /// The associated value is the declared size in bytes.
    #[error("File declares an implausible OptionalHeader size - {0}")]
    InvalidOptionalHeader(u16),

    /// The section table, as located by the optional header size and sized by the section count,
    /// does not fit into the image.
    #[error("Section table extends beyond the end of the file")]
    TruncatedSectionTable,

    // I/O errors
    /// An out of bound access was attempted while reading or writing a primitive value.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur while opening, mapping or flushing files.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}

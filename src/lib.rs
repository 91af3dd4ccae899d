// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # keeprelocs
//!
//! Keeps the base relocation section of Windows PE images resident.
//!
//! Linkers mark `.reloc` as discardable, so loaders and tools that honor
//! `IMAGE_SCN_MEM_DISCARDABLE` may free the relocation data once the image has been mapped.
//! Anything that relocates the image again afterwards then has nothing to work with.
//! `keeprelocs` clears that single bit in the section table, in place, and touches nothing
//! else. Checksums and signatures are not recomputed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use keeprelocs::File;
//! use std::path::Path;
//!
//! let mut file = File::from_file(Path::new("driver.sys"))?;
//! let report = file.patch(&keeprelocs::Patcher::new())?;
//! file.flush()?;
//!
//! for section in &report.sections {
//!     println!("{}: {:08x} -> {:08x}", section.name(),
//!              section.characteristics_before, section.characteristics_after);
//! }
//! # Ok::<(), keeprelocs::Error>(())
//! ```
//!
//! Working on a buffer directly:
//!
//! ```rust,no_run
//! let mut data = std::fs::read("driver.sys")?;
//! let count = keeprelocs::patch(&mut data)?;
//! println!("{count} .reloc sections patched");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`pe`] - Bounds-checked decoding of the MS-DOS stub, PE header, optional header span and
//!   section table
//! - [`patcher`] - The validate-then-mutate pass over the section table
//! - [`file`] - Memory and memory-mapped backends that supply the buffer and persist it
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Error Handling
//!
//! Every header offset comes out of the image itself and is checked against the buffer before
//! use. Format errors abort the whole operation before anything is written:
//!
//! ```rust
//! use keeprelocs::{patch, Error};
//!
//! let mut stub_only = vec![0u8; 64];
//! stub_only[0..2].copy_from_slice(b"MZ");
//! assert!(matches!(patch(&mut stub_only), Err(Error::InvalidPeMagic)));
//! assert_eq!(&stub_only[0..2], b"MZ");
//! ```
//!
//! ## Development and Testing
//!
//! ```bash
//! cargo test
//! cargo bench
//! cargo +nightly fuzz run patch --release
//! ```

pub(crate) mod error;

/// Image access and persistence backends
pub mod file;

/// PE/COFF header layout
pub mod pe;

/// Section table patching
pub mod patcher;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// `keeprelocs` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `keeprelocs` Error type
///
/// The main error type for all operations in this crate.
///
/// # Examples
///
/// ```rust,no_run
/// use keeprelocs::{Error, File, Patcher};
///
/// match File::from_file(std::path::Path::new("app.exe")).and_then(|mut f| f.patch(&Patcher::new())) {
///     Ok(report) => println!("{} sections matched", report.matched()),
///     Err(Error::MissingOptionalHeader) => println!("object files are not supported"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
pub use error::Error;

pub use file::File;
pub use patcher::{inspect, patch, PatchReport, PatchedSection, Patcher};

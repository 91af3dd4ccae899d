//! In-place clearing of section characteristics.
//!
//! The [`Patcher`] validates the full header chain of an image through [`crate::pe::Layout`]
//! and only then walks the section table, clearing the configured characteristics bits of
//! every entry whose name starts with the configured prefix. By default that is the
//! discardable flag of the `.reloc` section, which keeps loaders from dropping relocation data
//! after the image has been mapped.
//!
//! Only the 4-byte characteristics fields of matching entries are ever written. A format error
//! is always detected before the first write, so a failed run leaves the buffer untouched.
//!
//! # Examples
//!
//! ```rust,no_run
//! use keeprelocs::Patcher;
//!
//! let mut data = std::fs::read("app.exe")?;
//! let report = Patcher::new().run(&mut data)?;
//! println!("{} matched, {} cleared", report.matched(), report.cleared());
//! std::fs::write("app.exe", &data)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::{
    file::io::write_le_at,
    pe::{Layout, SectionCharacteristics, SectionHeader, RELOC_SECTION_NAME},
    Result,
};

/// One section table entry the patcher matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchedSection {
    /// Index in the section table
    pub index: usize,
    /// Raw 8-byte name
    pub name: [u8; 8],
    /// Absolute offset of the section table entry
    pub offset: usize,
    /// Characteristics before patching
    pub characteristics_before: u32,
    /// Characteristics after patching; equal to `characteristics_before` when nothing needed
    /// clearing
    pub characteristics_after: u32,
}

impl PatchedSection {
    /// The name for display, with trailing NUL padding removed.
    #[must_use]
    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.name)
            .trim_end_matches('\0')
            .to_string()
    }

    /// Returns `true` if the entry was discardable before patching.
    #[must_use]
    pub fn was_discardable(&self) -> bool {
        SectionCharacteristics::from_bits_retain(self.characteristics_before)
            .contains(SectionCharacteristics::MEM_DISCARDABLE)
    }

    /// Returns `true` if patching changed the characteristics.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.characteristics_before != self.characteristics_after
    }
}

/// The outcome of one [`Patcher::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchReport {
    /// Every matched entry, in section table order
    pub sections: Vec<PatchedSection>,
    /// `true` if the run computed the changes without writing them
    pub dry_run: bool,
}

impl PatchReport {
    /// Number of section table entries whose name matched, whether or not a bit was cleared.
    #[must_use]
    pub fn matched(&self) -> usize {
        self.sections.len()
    }

    /// Number of matched entries whose characteristics changed.
    #[must_use]
    pub fn cleared(&self) -> usize {
        self.sections.iter().filter(|section| section.changed()).count()
    }
}

/// Clears characteristics bits on named section table entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patcher {
    name: Vec<u8>,
    clear: SectionCharacteristics,
    dry_run: bool,
}

impl Default for Patcher {
    fn default() -> Self {
        Patcher {
            name: RELOC_SECTION_NAME.to_vec(),
            clear: SectionCharacteristics::MEM_DISCARDABLE,
            dry_run: false,
        }
    }
}

impl Patcher {
    /// A patcher clearing [`SectionCharacteristics::MEM_DISCARDABLE`] on `.reloc`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches entries whose raw name starts with `prefix`.
    ///
    /// A prefix longer than the 8-byte name field matches nothing.
    #[must_use]
    pub fn section_name(mut self, prefix: &[u8]) -> Self {
        self.name = prefix.to_vec();
        self
    }

    /// Clears `flags` instead of the discardable flag.
    #[must_use]
    pub fn clear(mut self, flags: SectionCharacteristics) -> Self {
        self.clear = flags;
        self
    }

    /// Computes the report without writing to the image.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Returns `true` if this patcher never writes.
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Patches `data` in place.
    ///
    /// # Errors
    /// Returns the format error [`crate::pe::Layout::parse`] reports; `data` is unchanged in
    /// that case.
    pub fn run(&self, data: &mut [u8]) -> Result<PatchReport> {
        let layout = Layout::parse(data)?;

        let mut report = PatchReport {
            sections: Vec::new(),
            dry_run: self.dry_run,
        };

        for index in 0..layout.section_count() {
            let section = layout.section(data, index)?;
            if !section.matches(&self.name) {
                continue;
            }

            let before = section.characteristics;
            let after = before & !self.clear.bits();
            if after != before && !self.dry_run {
                let mut offset = section.characteristics_offset();
                write_le_at(data, &mut offset, after)?;
            }

            report.sections.push(PatchedSection {
                index,
                name: section.name,
                offset: section.offset,
                characteristics_before: before,
                characteristics_after: after,
            });
        }

        Ok(report)
    }
}

/// Clears the discardable flag of every `.reloc` section table entry in `data`.
///
/// Returns the number of entries whose name matched. Entries that were not discardable count
/// as well, so patching an already patched image returns the same count without changing a
/// byte. Zero means the image has no `.reloc` section.
///
/// # Errors
/// Returns [`crate::Error::InvalidStubSignature`], [`crate::Error::TruncatedImage`],
/// [`crate::Error::InvalidPeMagic`], [`crate::Error::MissingOptionalHeader`],
/// [`crate::Error::InvalidOptionalHeader`] or [`crate::Error::TruncatedSectionTable`] for
/// malformed images, in which case `data` is unchanged.
///
/// # Examples
///
/// ```rust,no_run
/// let mut data = std::fs::read("app.exe")?;
/// let count = keeprelocs::patch(&mut data)?;
/// assert!(count <= 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn patch(data: &mut [u8]) -> Result<usize> {
    Patcher::default().run(data).map(|report| report.matched())
}

/// Decodes the section table of `data` without modifying anything.
///
/// # Errors
/// Returns the same format errors as [`patch`].
pub fn inspect(data: &[u8]) -> Result<Vec<SectionHeader>> {
    Layout::parse(data)?.sections(data)
}

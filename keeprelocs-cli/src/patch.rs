use std::{fs, path::Path};

use anyhow::Context;
use keeprelocs::{pe::SectionHeader, File, PatchReport, PatchedSection, Patcher};
use serde::Serialize;

use crate::{
    app::Cli,
    output::{print_output, Align, TabWriter},
};

#[derive(Debug, Serialize)]
struct SectionEntry {
    index: usize,
    name: String,
    virtual_address: String,
    raw_size: u32,
    characteristics: String,
    flags: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct PatchedEntry {
    index: usize,
    name: String,
    offset: String,
    characteristics_before: String,
    characteristics_after: String,
    was_discardable: bool,
}

#[derive(Debug, Serialize)]
struct PatchOutput {
    path: String,
    dry_run: bool,
    matched: usize,
    cleared: usize,
    patched: Vec<PatchedEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sections: Vec<SectionEntry>,
}

impl SectionEntry {
    fn new(index: usize, section: &SectionHeader) -> Self {
        Self {
            index,
            name: section.name(),
            virtual_address: format!("0x{:08X}", section.virtual_address),
            raw_size: section.size_of_raw_data,
            characteristics: format!("0x{:08X}", section.characteristics),
            flags: section.flags().names(),
        }
    }
}

impl From<&PatchedSection> for PatchedEntry {
    fn from(section: &PatchedSection) -> Self {
        Self {
            index: section.index,
            name: section.name(),
            offset: format!("0x{:X}", section.offset),
            characteristics_before: format!("0x{:08X}", section.characteristics_before),
            characteristics_after: format!("0x{:08X}", section.characteristics_after),
            was_discardable: section.was_discardable(),
        }
    }
}

/// Open the image at `path`. Dry runs work on a private copy so the file is never opened for
/// writing.
fn load_image(path: &Path, dry_run: bool) -> anyhow::Result<File> {
    let file = if dry_run {
        let data =
            fs::read(path).with_context(|| format!("failed to read file: {}", path.display()))?;
        File::from_mem(data)
    } else {
        File::from_file(path)
    };

    file.with_context(|| format!("failed to load image: {}", path.display()))
}

pub fn run(cli: &Cli) -> anyhow::Result<()> {
    let path = cli.path.as_path();
    let mut file = load_image(path, cli.dry_run)?;

    let sections = if cli.list {
        file.sections()
            .with_context(|| format!("failed to read section table: {}", path.display()))?
            .iter()
            .enumerate()
            .map(|(index, section)| SectionEntry::new(index, section))
            .collect()
    } else {
        Vec::new()
    };

    let report = file
        .patch(&Patcher::new().dry_run(cli.dry_run))
        .with_context(|| format!("failed to patch image: {}", path.display()))?;

    if !report.dry_run {
        file.flush()
            .with_context(|| format!("failed to write image: {}", path.display()))?;
    }

    let output = build_output(path, &report, sections);
    print_output(&output, &cli.global, print_text)
}

fn build_output(path: &Path, report: &PatchReport, sections: Vec<SectionEntry>) -> PatchOutput {
    PatchOutput {
        path: path.display().to_string(),
        dry_run: report.dry_run,
        matched: report.matched(),
        cleared: report.cleared(),
        patched: report.sections.iter().map(PatchedEntry::from).collect(),
        sections,
    }
}

fn print_text(output: &PatchOutput) {
    if !output.sections.is_empty() {
        let mut tw = TabWriter::new(vec![
            ("#", Align::Right),
            ("Name", Align::Left),
            ("VirtAddr", Align::Left),
            ("RawSize", Align::Right),
            ("Characteristics", Align::Left),
            ("Flags", Align::Left),
        ]);
        for section in &output.sections {
            tw.row(vec![
                section.index.to_string(),
                section.name.clone(),
                section.virtual_address.clone(),
                section.raw_size.to_string(),
                section.characteristics.clone(),
                section.flags.join(" | "),
            ]);
        }
        tw.print();
        println!();
    }

    if output.patched.is_empty() {
        println!("No .reloc section found.");
    }

    for section in &output.patched {
        println!(
            "{} section characteristics: {}",
            section.name, section.characteristics_before
        );
        if section.was_discardable {
            if output.dry_run {
                println!("MEM_DISCARDABLE flag found! Would drop it (dry run).");
            } else {
                println!("MEM_DISCARDABLE flag found! Dropping it.");
            }
        }
    }

    println!("Ok!");
}

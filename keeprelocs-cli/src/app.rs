use std::path::PathBuf;

use clap::Parser;

/// keeprelocs - keep the relocation section of a PE image resident by clearing its
/// discardable flag in place
#[derive(Debug, Parser)]
#[command(name = "keeprelocs", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Path to the PE image, modified in place.
    #[arg(value_name = "FILE")]
    pub path: PathBuf,

    /// Report what would change without writing to the file.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the section table before patching.
    #[arg(short, long)]
    pub list: bool,
}

/// Options controlling output and logging.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

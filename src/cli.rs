use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "shuffler", version, about = "Weighted, repeat-free image rotation over a categorized directory tree")]
pub struct Cli {
    /// Configuration file to use instead of the one in the platform config directory.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Library root (overrides the configured one).
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// More logging; repeat for more still.
    #[arg(short, long, global = true, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn log_level(&self) -> tracing::Level {
        match (self.quiet, self.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::WARN,
            (false, 1) => tracing::Level::INFO,
            (false, 2) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Dispense images, printing their paths.
    Next(NextArgs),
    /// Set an image's weight (a positive number, or `not-shown`).
    Rate { file: PathBuf, weight: String },
    /// Add or remove one of an image's tags.
    Tag {
        #[command(subcommand)]
        action: TagAction,
    },
    /// List every tag in the library.
    Tags,
    /// Show an image's name, category and display attributes.
    Info { file: PathBuf },
    /// Show or set an image's scaling: `0` natural, `-1` fit, or a percentage.
    Scaling { file: PathBuf, value: Option<String> },
    /// Show or set an image's alignment: center, top, left, bottom or right.
    Align { file: PathBuf, value: Option<String> },
    /// Move an image into the library's trash directory.
    Trash { file: PathBuf },
    /// Recycle everything shown back into the upcoming pool.
    Flip,
    /// Rescan the library and report what's there.
    Rebuild,
}

#[derive(Debug, Args)]
pub struct NextArgs {
    /// How many images to dispense.
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: usize,

    /// Only consider categories with at least this weight.
    #[arg(long, value_name = "N")]
    pub min_weight: Option<u32>,

    /// Only consider categories carrying this tag (repeatable).
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Never dispense from the not-shown bucket.
    #[arg(long)]
    pub no_not_shown: bool,
}

#[derive(Debug, Subcommand)]
pub enum TagAction {
    Add { file: PathBuf, tag: String },
    Remove { file: PathBuf, tag: String },
}

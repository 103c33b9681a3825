//! Command-line interface definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use mf_core::Classification;

#[derive(Parser, Debug)]
#[command(name = "mediaforge", author, version, about)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Operator-supplied classification for inventoried files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    Film,
    Series,
}

impl From<Kind> for Classification {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Film => Classification::Film,
            Kind::Series => Classification::Series,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inventory every file under a directory
    Scan {
        /// Directory to walk
        dir: PathBuf,
        /// Classify the inventoried files as films or series
        #[arg(long, value_enum)]
        kind: Kind,
    },

    /// Inventory a single file
    Add {
        /// File to probe and record
        file: PathBuf,
        /// Classify the file as a film or a series episode
        #[arg(long, value_enum)]
        kind: Kind,
    },

    /// Convert all candidate jobs with the bounded worker pool
    Run {
        /// Only convert jobs under this directory prefix
        #[arg(long)]
        directory: Option<PathBuf>,
        /// Override the configured pool size
        #[arg(long)]
        max_parallel: Option<usize>,
    },

    /// Convert the single job whose path matches
    Convert {
        /// Path of the managed file
        file: PathBuf,
    },

    /// Probe a file and print its stream layout (does not touch the store)
    Probe {
        /// File to probe
        file: PathBuf,
        /// Print raw JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Print a job's conversion attempts in chronological order
    History {
        /// Path of the managed file
        file: PathBuf,
    },

    /// Report availability of the external tools
    CheckTools,

    /// Mark any attempt still recorded as converting as interrupted
    Sweep,
}

//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Currency rate grabber CLI
#[derive(Parser, Debug)]
#[command(name = "rate-grabber")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List built-in sources
    List,

    /// Print every rate published by a source
    Rates {
        /// Built-in source name or path to a source YAML file
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        source: Option<String>,

        /// Read the document from a file instead of fetching it
        #[arg(short, long, conflicts_with = "all")]
        input: Option<PathBuf>,

        /// Fetch every built-in source concurrently
        #[arg(long)]
        all: bool,
    },

    /// Print the rate of one currency pair
    Find {
        /// Built-in source name or path to a source YAML file
        source: String,

        /// Base currency code (e.g. UAH)
        base: String,

        /// Destination currency code (e.g. USD)
        destination: String,

        /// Read the document from a file instead of fetching it
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Validate a source definition
    Validate {
        /// Path to a source YAML file
        file: PathBuf,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

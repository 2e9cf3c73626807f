//! CLI module
//!
//! Command-line interface for fetching rates.
//!
//! # Commands
//!
//! - `list` - List built-in sources
//! - `rates` - Print every rate a source publishes
//! - `find` - Print the rate of one currency pair
//! - `validate` - Validate a source definition

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Build the log filter from `RUST_LOG` and the `-v` flag
///
/// A valid `RUST_LOG` is kept as is; `-v` only raises it to debug. Without
/// one the level is info, or debug with `-v`.
pub fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    match rust_log.map(EnvFilter::try_new) {
        Some(Ok(filter)) if verbose => filter.add_directive(level.into()),
        Some(Ok(filter)) => filter,
        _ => EnvFilter::default().add_directive(level.into()),
    }
}

// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # rate-grabber
//!
//! Fetch currency buy/sale rates from bank web pages and JSON APIs and keep
//! them in entities that notify observers when a quotation moves.
//!
//! ## Features
//!
//! - **Declarative sources**: describe a publisher in YAML (CSS selectors or JSON paths)
//! - **Strict extraction**: a changed page layout is a schema-drift error, never a silent zero
//! - **Change tracking**: `updated` on every refresh, `changed` only when a rate moved
//! - **Built-in sources**: PrivatBank, NBU, Oschadbank, Ukrgasbank, UKRSIBBANK
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rate_grabber::{rate::{ExchangeRate, LogObserver, ObserverSet}, Registry, SourceId};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> rate_grabber::Result<()> {
//!     let registry = Registry::with_builtin();
//!     let source = registry.source(&SourceId::new("privatbank")?)?;
//!
//!     let mut observers = ObserverSet::new();
//!     observers.attach("log".into(), Arc::new(LogObserver));
//!
//!     let mut rate = ExchangeRate::fetch(source, "UAH", "USD", observers).await?;
//!     rate.refresh().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Rate Entity                           │
//! │   new / fetch      update / refresh      observers           │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │ find_rate
//! ┌──────────────────────────────┴───────────────────────────────┐
//! │                        RateSource                            │
//! │   Transport ──▶ Decoder ──▶ records ──▶ RateExtractor        │
//! ├───────────────┬──────────────┬───────────────────────────────┤
//! │ HTTP (reqwest)│ HTML (CSS)   │ DeclarativeExtractor (YAML)   │
//! │ Static body   │ JSON (paths) │ custom impls                  │
//! └───────────────┴──────────────┴───────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// HTTP client, rate limiting and transports
pub mod http;

/// Response decoders (HTML, JSON)
pub mod decode;

/// Per-record field extraction
pub mod extract;

/// Extraction pipeline
pub mod pipeline;

/// Rate entity and observers
pub mod rate;

/// YAML loader for source definitions
pub mod loader;

/// Template interpolation
pub mod template;

/// Built-in sources and id registry
pub mod registry;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use loader::{load_source, load_source_from_str, SourceDefinition};
pub use pipeline::RateSource;
pub use rate::{ExchangeRate, RateObserver};
pub use registry::Registry;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

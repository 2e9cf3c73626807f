//! Response decoder module
//!
//! Supports: HTML, JSON
//!
//! # Overview
//!
//! The decode module turns a raw response body into a navigable
//! [`Document`]. HTML pages are parsed leniently and queried with CSS
//! selectors; JSON bodies are parsed strictly and queried with dotted paths
//! (`data.items`, `rates[0]`) or JSONPath wildcards (`$.data[*]`). The
//! format is fixed per source and never mixed.

mod decoders;
mod types;

pub use decoders::{decoder_for, HtmlDecoder, JsonDecoder};
pub use types::{DecoderFormat, Document, DocumentDecoder, Query, Record, ValueSource};

#[cfg(test)]
mod tests;

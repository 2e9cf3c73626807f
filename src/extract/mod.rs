//! Field extraction
//!
//! Turns decoded records into validated [`RateTuple`](crate::types::RateTuple)s.
//!
//! # Overview
//!
//! - `RateExtractor` - Per-record accessor contract
//! - `DeclarativeExtractor` - Extractor compiled from YAML field rules
//! - `CodeField` / `NumberField` - Normalisation and validation of one field

mod extractor;
mod fields;

pub use extractor::{DeclarativeExtractor, RateExtractor};
pub use fields::{normalize_code, parse_rate, parse_unit, CodeField, FieldQuery, NumberField};

//! YAML Loader module
//!
//! Parse source definitions from YAML files.
//!
//! # Overview
//!
//! The loader module provides:
//! - `SourceDefinition` - Declarative description of one rate publisher
//! - `FieldsDefinition` - Per-record extraction rules
//! - YAML parsing with validation

mod parser;
mod types;

pub use parser::{load_source, load_source_from_str, validate_source};
pub use types::{
    Cardinality, CodeFieldDefinition, FieldsDefinition, NumberFieldDefinition, RequestDefinition,
    SourceDefinition,
};

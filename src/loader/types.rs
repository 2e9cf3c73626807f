//! Loader types
//!
//! Declarative source definition types for YAML parsing.

use crate::decode::DecoderFormat;
use crate::http::RateLimiterConfig;
use crate::types::ExtractionMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Source Definition
// ============================================================================

/// Top-level source definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SourceDefinition {
    /// Source id (lowercase slug)
    pub name: String,
    /// Human readable name of the publisher
    #[serde(default)]
    pub title: Option<String>,
    /// Document format of the response
    #[serde(default)]
    pub format: DecoderFormat,
    /// How to fetch the document
    pub request: RequestDefinition,
    /// Query selecting the rate records
    pub records: String,
    /// Keep only records containing a match for this query (html)
    #[serde(default)]
    pub record_filter: Option<String>,
    /// Behaviour on malformed records
    #[serde(default)]
    pub mode: ExtractionMode,
    /// Per-record field extraction rules
    pub fields: FieldsDefinition,
}

impl SourceDefinition {
    /// Display title, falling back to the id
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

// ============================================================================
// Request Definition
// ============================================================================

/// Request configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RequestDefinition {
    /// Absolute URL
    pub url: String,
    /// Query parameters (values may contain `{{ vars.* }}`)
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    /// Request headers (values may contain `{{ vars.* }}`)
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// chrono format used for `vars.today`
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Fixed UTC offset of the publisher, used for `vars.today`
    #[serde(default)]
    pub utc_offset_hours: i32,
    /// IANA time zone of the publisher (e.g. `Europe/Kyiv`), used for
    /// `vars.today` instead of `utc_offset_hours`
    #[serde(default)]
    pub timezone: Option<String>,
    /// Optional politeness throttle
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,
    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_timeout() -> u64 {
    30
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

// ============================================================================
// Field Definitions
// ============================================================================

/// Extraction rules for the four rate fields
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FieldsDefinition {
    /// Base currency
    pub base_currency: CodeFieldDefinition,
    /// Destination currency
    pub destination_currency: CodeFieldDefinition,
    /// Buy rate
    pub buy_rate: NumberFieldDefinition,
    /// Sale rate; equals the buy rate when omitted
    #[serde(default)]
    pub sale_rate: Option<NumberFieldDefinition>,
    /// Quantity of destination currency the rates are quoted for
    #[serde(default)]
    pub unit: Option<NumberFieldDefinition>,
}

/// Currency code field
///
/// Either a `constant` or a `query` must be given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CodeFieldDefinition {
    /// Fixed code for every record
    #[serde(default)]
    pub constant: Option<String>,
    /// Query relative to the record
    #[serde(default)]
    pub query: Option<String>,
    /// Read this attribute instead of the text (html)
    #[serde(default)]
    pub attribute: Option<String>,
    /// Read only the element's own text, ignoring nested elements (html)
    #[serde(default)]
    pub own_text: bool,
    /// How many matches are acceptable
    #[serde(default)]
    pub cardinality: Cardinality,
    /// Prefix removed from the raw value
    #[serde(default)]
    pub strip_prefix: Option<String>,
    /// Drop every character outside `A-Z`
    #[serde(default)]
    pub letters_only: bool,
    /// Uppercase the value
    #[serde(default)]
    pub uppercase: bool,
}

/// Numeric field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NumberFieldDefinition {
    /// Query relative to the record
    pub query: String,
    /// Read this attribute instead of the text (html)
    #[serde(default)]
    pub attribute: Option<String>,
    /// Read only the element's own text, ignoring nested elements (html)
    #[serde(default)]
    pub own_text: bool,
    /// How many matches are acceptable
    #[serde(default)]
    pub cardinality: Cardinality,
    /// Value uses `,` as decimal separator
    #[serde(default)]
    pub decimal_comma: bool,
}

/// Number of matches a field query must produce
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// At least one match; the first is used
    #[default]
    First,
    /// Exactly one match
    ExactlyOne,
}

//! Decoder types and traits
//!
//! Defines the decoded document, its records, and the query type used to
//! navigate both.

use crate::error::{Error, Result};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// Format of the response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoderFormat {
    /// HTML page queried with CSS selectors
    #[default]
    Html,
    /// JSON document queried with dotted paths or JSONPath
    Json,
}

impl fmt::Display for DecoderFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Html => f.write_str("html"),
            Self::Json => f.write_str("json"),
        }
    }
}

// ============================================================================
// Query
// ============================================================================

/// A compiled query for one decoder format
#[derive(Debug, Clone)]
pub enum Query {
    /// CSS selector for HTML documents
    Css {
        /// Selector as written in the source definition
        raw: String,
        /// Compiled selector
        selector: Selector,
    },
    /// Dotted path or JSONPath for JSON documents
    Path(String),
}

impl Query {
    /// Compile a CSS selector
    pub fn css(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let selector = Selector::parse(&raw)
            .map_err(|e| Error::config(format!("Invalid CSS selector '{raw}': {e}")))?;
        Ok(Self::Css { raw, selector })
    }

    /// Wrap a JSON path
    pub fn path(raw: impl Into<String>) -> Self {
        Self::Path(raw.into())
    }

    /// Compile a query for the given format
    pub fn for_format(format: DecoderFormat, raw: &str) -> Result<Self> {
        match format {
            DecoderFormat::Html => Self::css(raw),
            DecoderFormat::Json => Ok(Self::path(raw)),
        }
    }

    /// The query as written
    pub fn as_str(&self) -> &str {
        match self {
            Self::Css { raw, .. } => raw,
            Self::Path(raw) => raw,
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Document
// ============================================================================

/// A decoded response body
#[derive(Debug)]
pub enum Document {
    /// Parsed HTML tree
    Markup(Html),
    /// Parsed JSON value
    Structured(Value),
}

impl Document {
    /// Format this document was decoded from
    pub fn format(&self) -> DecoderFormat {
        match self {
            Self::Markup(_) => DecoderFormat::Html,
            Self::Structured(_) => DecoderFormat::Json,
        }
    }

    /// Select the record set, failing when it is empty
    pub fn records(&self, query: &Query) -> Result<Vec<Record<'_>>> {
        let records: Vec<Record<'_>> = match (self, query) {
            (Self::Markup(html), Query::Css { selector, .. }) => {
                html.select(selector).map(Record::Node).collect()
            }
            (Self::Structured(value), Query::Path(path)) => {
                super::decoders::select_records(value, path)?
            }
            _ => return Err(format_mismatch(self.format(), query)),
        };

        if records.is_empty() {
            return Err(Error::schema_drift(format!("{query} was not found")));
        }
        Ok(records)
    }
}

// ============================================================================
// Record
// ============================================================================

/// One decoded unit: a markup node or a JSON item
#[derive(Debug, Clone)]
pub enum Record<'a> {
    /// HTML element (usually a table row)
    Node(ElementRef<'a>),
    /// JSON object (usually an array entry)
    Item(Cow<'a, Value>),
}

impl Record<'_> {
    /// Extract the text values matched by a query within this record
    ///
    /// For markup the query is scoped to the record's descendants and each
    /// match contributes the value selected by `read`. For JSON the query is
    /// a key path inside the item and `read` is ignored; a missing key or
    /// `null` yields no values.
    pub fn values(&self, query: &Query, read: &ValueSource) -> Result<Vec<String>> {
        match (self, query) {
            (Self::Node(node), Query::Css { selector, .. }) => Ok(node
                .select(selector)
                .filter_map(|el| read.read(el))
                .collect()),
            (Self::Item(item), Query::Path(path)) => {
                Ok(super::decoders::lookup(item, path)
                    .and_then(scalar_text)
                    .into_iter()
                    .collect())
            }
            (Self::Node(_), _) => Err(format_mismatch(DecoderFormat::Html, query)),
            (Self::Item(_), _) => Err(format_mismatch(DecoderFormat::Json, query)),
        }
    }

    /// Whether the query matches anything inside this record
    pub fn contains(&self, query: &Query) -> Result<bool> {
        Ok(!self.values(query, &ValueSource::Text)?.is_empty())
    }
}

/// What a matched markup element contributes as its value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ValueSource {
    /// All descendant text, concatenated
    #[default]
    Text,
    /// The first non-empty text node that is a direct child of the element
    ///
    /// `<td>27.50<span>+0.05</span></td>` reads as `27.50`.
    OwnText,
    /// The named attribute; elements without it contribute nothing
    Attribute(String),
}

impl ValueSource {
    /// Read an attribute
    pub fn attribute(name: impl Into<String>) -> Self {
        Self::Attribute(name.into())
    }

    fn read(&self, el: ElementRef<'_>) -> Option<String> {
        match self {
            Self::Text => Some(el.text().collect()),
            Self::OwnText => el
                .children()
                .filter_map(|child| child.value().as_text())
                .map(|text| text.trim())
                .find(|text| !text.is_empty())
                .map(str::to_string),
            Self::Attribute(name) => el.value().attr(name).map(str::to_string),
        }
    }
}

/// Render a JSON scalar as text
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn format_mismatch(format: DecoderFormat, query: &Query) -> Error {
    Error::config(format!(
        "Query '{query}' cannot be applied to a {format} document"
    ))
}

/// Trait for decoding response bodies into documents
pub trait DocumentDecoder: Send + Sync {
    /// Format produced by this decoder
    fn format(&self) -> DecoderFormat;

    /// Decode the response body
    fn decode(&self, body: &str) -> Result<Document>;
}

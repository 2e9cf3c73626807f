//! Decoder implementations
//!
//! Each decoder handles a specific response format.

use super::types::{DecoderFormat, Document, DocumentDecoder, Record};
use crate::error::{Error, Result};
use scraper::Html;
use serde_json::Value;
use std::borrow::Cow;
use tracing::debug;

// ============================================================================
// HTML Decoder
// ============================================================================

/// Lenient HTML decoder
///
/// Malformed markup is repaired by the parser; the recovered errors are
/// only logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlDecoder;

impl HtmlDecoder {
    /// Create a new HTML decoder
    pub fn new() -> Self {
        Self
    }
}

impl DocumentDecoder for HtmlDecoder {
    fn format(&self) -> DecoderFormat {
        DecoderFormat::Html
    }

    fn decode(&self, body: &str) -> Result<Document> {
        if body.trim().is_empty() {
            return Err(Error::schema_drift(
                "HTML decoding failed: document is empty",
            ));
        }

        let html = Html::parse_document(body);
        if !html.errors.is_empty() {
            debug!(
                recovered = html.errors.len(),
                first = %html.errors[0],
                "HTML parsed with recoverable errors"
            );
        }
        Ok(Document::Markup(html))
    }
}

// ============================================================================
// JSON Decoder
// ============================================================================

/// Strict JSON decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl JsonDecoder {
    /// Create a new JSON decoder
    pub fn new() -> Self {
        Self
    }
}

impl DocumentDecoder for JsonDecoder {
    fn format(&self) -> DecoderFormat {
        DecoderFormat::Json
    }

    fn decode(&self, body: &str) -> Result<Document> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| Error::schema_drift(format!("JSON decoding failed. {e}")))?;
        Ok(Document::Structured(value))
    }
}

/// Create the decoder for a format
pub fn decoder_for(format: DecoderFormat) -> Box<dyn DocumentDecoder> {
    match format {
        DecoderFormat::Html => Box::new(HtmlDecoder),
        DecoderFormat::Json => Box::new(JsonDecoder),
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Select the record set of a JSON document
///
/// Arrays yield one record per element, any other value is a single record.
pub(crate) fn select_records<'a>(value: &'a Value, path: &str) -> Result<Vec<Record<'a>>> {
    // Only use jsonpath-rust for wildcard patterns
    if path.contains('*') {
        return Ok(extract_with_jsonpath(value, path)?
            .into_iter()
            .map(|v| Record::Item(Cow::Owned(v)))
            .collect());
    }

    match lookup(value, path) {
        Some(Value::Array(arr)) => Ok(arr.iter().map(|v| Record::Item(Cow::Borrowed(v))).collect()),
        Some(Value::Null) | None => Ok(vec![]),
        Some(v) => Ok(vec![Record::Item(Cow::Borrowed(v))]),
    }
}

/// Look up a value using simple dot-notation path
///
/// An empty path or `$` addresses the value itself.
pub(crate) fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.trim();
    let path = path
        .strip_prefix("$.")
        .or_else(|| path.strip_prefix('$'))
        .unwrap_or(path);
    if path.is_empty() {
        return Some(value);
    }

    let mut current = value;
    for part in path.split('.') {
        // Handle array indexing like "data[0]" or "items[-1]"
        if let Some(bracket_pos) = part.find('[') {
            let name = &part[..bracket_pos];
            let index_str = part[bracket_pos + 1..].strip_suffix(']')?;

            if !name.is_empty() {
                current = current.get(name)?;
            }

            let index = index_str.parse::<i64>().ok()?;
            let arr = current.as_array()?;
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let idx = if index < 0 {
                usize::try_from(arr.len() as i64 + index).ok()?
            } else {
                index as usize
            };
            current = arr.get(idx)?;
        } else {
            current = current.get(part)?;
        }
    }

    Some(current)
}

/// Extract records using jsonpath-rust
fn extract_with_jsonpath(value: &Value, path: &str) -> Result<Vec<Value>> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path)
        .map_err(|e| Error::config(format!("Invalid JSONPath '{path}': {e}")))?;

    match jp.find(value) {
        Value::Array(arr) => Ok(arr),
        Value::Null => Ok(vec![]),
        other => Ok(vec![other]),
    }
}

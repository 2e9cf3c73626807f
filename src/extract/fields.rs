//! Compiled field rules
//!
//! Each field turns the raw values a query matched inside one record into a
//! validated currency code or a positive number.

use crate::decode::{DecoderFormat, Query, Record, ValueSource};
use crate::error::{Error, Result};
use crate::loader::{Cardinality, CodeFieldDefinition, NumberFieldDefinition};
use crate::types::CurrencyCode;

/// A query plus the match-count rule applied to its results
#[derive(Debug, Clone)]
pub struct FieldQuery {
    query: Query,
    read: ValueSource,
    cardinality: Cardinality,
    label: &'static str,
}

impl FieldQuery {
    fn compile(
        format: DecoderFormat,
        raw: &str,
        attribute: Option<&String>,
        own_text: bool,
        cardinality: Cardinality,
        label: &'static str,
    ) -> Result<Self> {
        let read = match (attribute, own_text) {
            (Some(name), false) => ValueSource::attribute(name.as_str()),
            (None, true) => ValueSource::OwnText,
            (None, false) => ValueSource::Text,
            (Some(_), true) => {
                return Err(Error::config(format!(
                    "{label} cannot read both an attribute and own text"
                )))
            }
        };
        Ok(Self {
            query: Query::for_format(format, raw)?,
            read,
            cardinality,
            label,
        })
    }

    /// The single raw value this field reads from a record
    pub fn raw_value(&self, record: &Record<'_>) -> Result<String> {
        let values = record.values(&self.query, &self.read)?;
        match (self.cardinality, values.len()) {
            (_, 0) => Err(Error::schema_drift(format!(
                "`{}` (responsible for {}) was not found",
                self.query, self.label
            ))),
            (Cardinality::ExactlyOne, n) if n > 1 => Err(Error::schema_drift(format!(
                "`{}` (responsible for {}) matched {n} values, expected exactly one",
                self.query, self.label
            ))),
            _ => Ok(values.into_iter().next().unwrap_or_default()),
        }
    }

    /// Field label used in error messages
    pub fn label(&self) -> &'static str {
        self.label
    }
}

// ============================================================================
// Code Field
// ============================================================================

/// Currency code field
#[derive(Debug, Clone)]
pub enum CodeField {
    /// Same code for every record
    Constant(CurrencyCode),
    /// Code read from the record
    Query {
        /// Where to read the raw value
        source: FieldQuery,
        /// Prefix removed before the code; the first word after it is kept
        strip_prefix: Option<String>,
        /// Keep only `A-Z`
        letters_only: bool,
        /// Uppercase the value
        uppercase: bool,
    },
}

impl CodeField {
    /// Compile a code field definition
    pub fn compile(
        format: DecoderFormat,
        def: &CodeFieldDefinition,
        label: &'static str,
    ) -> Result<Self> {
        match (&def.constant, &def.query) {
            (Some(code), None) => Ok(Self::Constant(CurrencyCode::new(code.as_str())?)),
            (None, Some(query)) => Ok(Self::Query {
                source: FieldQuery::compile(
                    format,
                    query,
                    def.attribute.as_ref(),
                    def.own_text,
                    def.cardinality,
                    label,
                )?,
                strip_prefix: def.strip_prefix.clone(),
                letters_only: def.letters_only,
                uppercase: def.uppercase,
            }),
            _ => Err(Error::config(format!(
                "{label} needs exactly one of 'constant' or 'query'"
            ))),
        }
    }

    /// Read and validate the code of one record
    pub fn read(&self, record: &Record<'_>) -> Result<CurrencyCode> {
        match self {
            Self::Constant(code) => Ok(code.clone()),
            Self::Query {
                source,
                strip_prefix,
                letters_only,
                uppercase,
            } => {
                let raw = source.raw_value(record)?;
                let code =
                    normalize_code(&raw, strip_prefix.as_deref(), *letters_only, *uppercase);
                CurrencyCode::new(code.as_str()).map_err(|_| {
                    Error::schema_drift(format!(
                        "{} is invalid: `{}`",
                        capitalize(source.label()),
                        raw.trim()
                    ))
                })
            }
        }
    }
}

/// Apply the code normalisation steps to a raw value
pub fn normalize_code(
    raw: &str,
    strip_prefix: Option<&str>,
    letters_only: bool,
    uppercase: bool,
) -> String {
    let mut value = raw.trim().to_string();

    if let Some(prefix) = strip_prefix {
        value = match value.strip_prefix(prefix) {
            Some(rest) => rest.split_whitespace().next().unwrap_or_default().to_string(),
            None => String::new(),
        };
    }
    if uppercase {
        value = value.to_uppercase();
    }
    if letters_only {
        value.retain(|c| c.is_ascii_uppercase());
    }
    value
}

// ============================================================================
// Number Field
// ============================================================================

/// Positive numeric field
#[derive(Debug, Clone)]
pub struct NumberField {
    source: FieldQuery,
    decimal_comma: bool,
}

impl NumberField {
    /// Compile a number field definition
    pub fn compile(
        format: DecoderFormat,
        def: &NumberFieldDefinition,
        label: &'static str,
    ) -> Result<Self> {
        Ok(Self {
            source: FieldQuery::compile(
                format,
                &def.query,
                def.attribute.as_ref(),
                def.own_text,
                def.cardinality,
                label,
            )?,
            decimal_comma: def.decimal_comma,
        })
    }

    /// Read a finite number greater than zero
    pub fn read_rate(&self, record: &Record<'_>) -> Result<f64> {
        let raw = self.source.raw_value(record)?;
        parse_rate(&raw, self.decimal_comma).ok_or_else(|| self.invalid(&raw))
    }

    /// Read a unit: the leading digits of the value, greater than zero
    pub fn read_unit(&self, record: &Record<'_>) -> Result<u32> {
        let raw = self.source.raw_value(record)?;
        parse_unit(&raw).ok_or_else(|| self.invalid(&raw))
    }

    fn invalid(&self, raw: &str) -> Error {
        Error::schema_drift(format!(
            "{} is invalid: `{}`",
            capitalize(self.source.label()),
            raw.trim()
        ))
    }
}

/// Parse a rate, accepting an optional decimal comma
pub fn parse_rate(raw: &str, decimal_comma: bool) -> Option<f64> {
    let text = raw.trim();
    let value: f64 = if decimal_comma {
        text.replace(',', ".").parse().ok()?
    } else {
        text.parse().ok()?
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Parse the leading digits of a unit cell (`"100 "` → 100, `"10 pcs"` → 10)
pub fn parse_unit(raw: &str) -> Option<u32> {
    let text = raw.trim();
    let end = text
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(text.len(), |(i, _)| i);
    text[..end].parse::<u32>().ok().filter(|unit| *unit > 0)
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

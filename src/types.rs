//! Common types used throughout rate-grabber
//!
//! This module contains the validated value types shared by the
//! extraction pipeline and the rate entity.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Exactly three uppercase ASCII letters
static CURRENCY_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{3}$").unwrap());

/// Lowercase slug used as a source identity
static SOURCE_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").unwrap());

// ============================================================================
// Currency Code
// ============================================================================

/// ISO-4217 style currency code (`USD`, `EUR`, `UAH`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Validate and wrap a currency code
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if CURRENCY_CODE_REGEX.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidCurrencyCode { value })
        }
    }

    /// Check whether a string is a well-formed code
    pub fn is_valid(value: &str) -> bool {
        CURRENCY_CODE_REGEX.is_match(value)
    }

    /// Borrow the code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl PartialEq<str> for CurrencyCode {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for CurrencyCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// ============================================================================
// Source Identity
// ============================================================================

/// Stable identity of a rate source (`privatbank`, `nbu`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceId(String);

impl SourceId {
    /// Validate and wrap a source id
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if SOURCE_ID_REGEX.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidSourceId { value })
        }
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SourceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for SourceId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SourceId> for String {
    fn from(id: SourceId) -> Self {
        id.0
    }
}

// ============================================================================
// Normalized Rate Tuple
// ============================================================================

/// One normalized quotation produced by an extraction step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTuple {
    /// Currency the prices are expressed in
    pub base: CurrencyCode,
    /// Currency being bought and sold
    pub destination: CurrencyCode,
    /// Price the institution pays for one unit of `destination`
    pub buy: f64,
    /// Price the institution asks for one unit of `destination`
    pub sale: f64,
}

impl RateTuple {
    /// Create a new tuple
    pub fn new(base: CurrencyCode, destination: CurrencyCode, buy: f64, sale: f64) -> Self {
        Self {
            base,
            destination,
            buy,
            sale,
        }
    }

    /// Check whether this tuple quotes the given pair (case-sensitive)
    pub fn is_pair(&self, base: &str, destination: &str) -> bool {
        self.base == base && self.destination == destination
    }
}

impl fmt::Display for RateTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} buy={} sale={}",
            self.base, self.destination, self.buy, self.sale
        )
    }
}

// ============================================================================
// Extraction Mode
// ============================================================================

/// What to do with a record whose fields fail validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Abort the whole pass on the first invalid record
    #[default]
    FailFast,
    /// Log and skip invalid records
    SkipInvalid,
}

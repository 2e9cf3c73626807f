//! Template interpolation for source definitions
//!
//! Handles `{{ variable }}` interpolation in request parameters and headers.
//! Supports nested access like `{{ vars.today }}`.

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use serde_json::{json, Value};
use std::fmt::Display;
use std::sync::LazyLock;

/// Regex for matching template variables: {{ variable.path }}
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)\s*\}\}").unwrap()
});

/// Variables every request context provides
pub const REQUEST_VARIABLES: &[&str] = &["vars.today", "vars.now", "vars.timestamp"];

/// Local time zone of a publisher, used to compute `vars.today`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherZone {
    /// Fixed offset with no daylight saving
    Fixed(FixedOffset),
    /// IANA zone, daylight saving included
    Named(Tz),
}

impl Default for PublisherZone {
    fn default() -> Self {
        Self::Fixed(Utc.fix())
    }
}

impl PublisherZone {
    /// Resolve a zone from a request's `timezone` or `utc_offset_hours`
    ///
    /// A named zone wins; setting both with a non-zero offset is rejected.
    pub fn resolve(timezone: Option<&str>, utc_offset_hours: i32) -> Result<Self> {
        match timezone {
            Some(name) if utc_offset_hours != 0 => Err(Error::config(format!(
                "Cannot set both timezone '{name}' and utc_offset_hours {utc_offset_hours}"
            ))),
            Some(name) => name
                .parse::<Tz>()
                .map(Self::Named)
                .map_err(|_| Error::config(format!("Unknown timezone '{name}'"))),
            None => FixedOffset::east_opt(utc_offset_hours * 3600)
                .map(Self::Fixed)
                .ok_or_else(|| {
                    Error::config(format!("Invalid utc_offset_hours: {utc_offset_hours}"))
                }),
        }
    }
}

/// Context for template interpolation
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// Request variables
    pub vars: Value,
}

impl TemplateContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create context with variables
    pub fn with_vars(vars: Value) -> Self {
        Self { vars }
    }

    /// Build the context for one request issued at `now`
    ///
    /// `today` is the publisher's local date rendered with `date_format`.
    pub fn for_request(now: DateTime<Utc>, zone: PublisherZone, date_format: &str) -> Self {
        match zone {
            PublisherZone::Fixed(offset) => Self::local(now, &offset, date_format),
            PublisherZone::Named(tz) => Self::local(now, &tz, date_format),
        }
    }

    fn local<Z>(now: DateTime<Utc>, zone: &Z, date_format: &str) -> Self
    where
        Z: TimeZone,
        Z::Offset: Display,
    {
        let local = now.with_timezone(zone);
        Self::with_vars(json!({
            "today": local.format(date_format).to_string(),
            "now": local.to_rfc3339(),
            "timestamp": now.timestamp(),
        }))
    }

    /// Get a value by path (e.g., "vars.today")
    pub fn get(&self, path: &str) -> Option<&Value> {
        let parts: Vec<&str> = path.split('.').collect();
        match parts.as_slice() {
            [] => None,
            ["vars"] => Some(&self.vars),
            ["vars", rest @ ..] => get_nested_value(&self.vars, rest),
            // Also support top-level access to vars directly
            _ => get_nested_value(&self.vars, &parts),
        }
    }
}

/// Get a nested value from a JSON value by path
fn get_nested_value<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for part in path {
        match current {
            Value::Object(map) => {
                current = map.get(*part)?;
            }
            _ => return None,
        }
    }
    Some(current)
}

/// Render a template string with the given context
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut result = template.to_string();
    let mut errors = Vec::new();

    for cap in TEMPLATE_REGEX.captures_iter(template) {
        let (full_match, [var_path]) = cap.extract();

        match ctx.get(var_path) {
            Some(value) => {
                let replacement = value_to_string(value);
                result = result.replace(full_match, &replacement);
            }
            None => {
                errors.push(var_path.to_string());
            }
        }
    }

    if errors.is_empty() {
        Ok(result)
    } else {
        Err(Error::undefined_var(errors.join(", ")))
    }
}

/// Check if a string contains template variables
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.is_match(s)
}

/// Extract all variable names from a template
pub fn extract_variables(template: &str) -> Vec<String> {
    TEMPLATE_REGEX
        .captures_iter(template)
        .map(|cap| cap.extract::<1>().1[0].to_string())
        .collect()
}

/// Convert a JSON value to a string for template substitution
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        // For complex types, use JSON serialization
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

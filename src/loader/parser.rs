//! YAML parser for source definitions
//!
//! Parses and validates source YAML files.
//! Supports both built-in sources (by name) and custom YAML files (by path).

use crate::decode::{DecoderFormat, Query};
use crate::error::{Error, Result};
use crate::loader::types::{CodeFieldDefinition, NumberFieldDefinition, SourceDefinition};
use crate::registry;
use crate::template::{self, PublisherZone, REQUEST_VARIABLES};
use crate::types::{CurrencyCode, SourceId};
use std::fs;
use std::path::Path;

/// Load a source definition from a name or file path
///
/// This function first checks if the input is a built-in source name (e.g., "nbu"),
/// then falls back to loading from a file path.
///
/// # Examples
///
/// ```ignore
/// // Load built-in source by name
/// let source = load_source("privatbank")?;
///
/// // Load custom source from file
/// let source = load_source("./my-bank.yaml")?;
/// ```
pub fn load_source(path: impl AsRef<Path>) -> Result<SourceDefinition> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy();

    if !path_str.contains('/')
        && !path_str.contains('\\')
        && !path_str.ends_with(".yaml")
        && !path_str.ends_with(".yml")
    {
        if let Some(yaml) = registry::builtin_yaml(&path_str) {
            return load_source_from_str(yaml);
        }
    }

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::config(format!(
                "Source '{}' not found. Built-in sources: {}. Or provide a path to a YAML file.",
                path.display(),
                registry::builtin_names().join(", ")
            ))
        } else {
            Error::config(format!(
                "Failed to read source file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    load_source_from_str(&content)
}

/// Load a source definition from a YAML string
pub fn load_source_from_str(yaml: &str) -> Result<SourceDefinition> {
    let def: SourceDefinition = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse source YAML: {e}")))?;

    validate_source(&def)?;
    Ok(def)
}

/// Validate a source definition
pub fn validate_source(def: &SourceDefinition) -> Result<()> {
    SourceId::new(&def.name)
        .map_err(|_| Error::config(format!("Invalid source name '{}'", def.name)))?;

    url::Url::parse(&def.request.url).map_err(|e| {
        Error::config(format!(
            "Source '{}' has invalid url '{}': {e}",
            def.name, def.request.url
        ))
    })?;

    if def.request.timeout_secs == 0 {
        return Err(Error::config(format!(
            "Source '{}' timeout_secs must be positive",
            def.name
        )));
    }

    PublisherZone::resolve(def.request.timezone.as_deref(), def.request.utc_offset_hours)
        .map_err(|e| match e {
            Error::Config { message } => Error::config(format!("Source '{}': {message}", def.name)),
            other => other,
        })?;

    for value in def.request.params.values().chain(def.request.headers.values()) {
        for var in template::extract_variables(value) {
            if !REQUEST_VARIABLES.contains(&var.as_str()) {
                return Err(Error::config(format!(
                    "Source '{}' uses unknown variable '{var}'. Available: {}",
                    def.name,
                    REQUEST_VARIABLES.join(", ")
                )));
            }
        }
    }

    if def.records.trim().is_empty() && def.format == DecoderFormat::Html {
        return Err(Error::config(format!(
            "Source '{}' records query cannot be empty",
            def.name
        )));
    }
    compile(def, &def.records, "records")?;

    if let Some(filter) = &def.record_filter {
        if def.format != DecoderFormat::Html {
            return Err(Error::config(format!(
                "Source '{}' record_filter is only supported for html",
                def.name
            )));
        }
        compile(def, filter, "record_filter")?;
    }

    let fields = &def.fields;
    validate_code_field(def, &fields.base_currency, "base_currency")?;
    validate_code_field(def, &fields.destination_currency, "destination_currency")?;
    validate_number_field(def, &fields.buy_rate, "buy_rate")?;
    if let Some(sale) = &fields.sale_rate {
        validate_number_field(def, sale, "sale_rate")?;
    }
    if let Some(unit) = &fields.unit {
        validate_number_field(def, unit, "unit")?;
    }

    Ok(())
}

fn compile(def: &SourceDefinition, raw: &str, what: &str) -> Result<Query> {
    Query::for_format(def.format, raw)
        .map_err(|e| Error::config(format!("Source '{}' {what}: {e}", def.name)))
}

fn validate_code_field(
    def: &SourceDefinition,
    field: &CodeFieldDefinition,
    name: &str,
) -> Result<()> {
    match (&field.constant, &field.query) {
        (Some(code), None) => {
            CurrencyCode::new(code.as_str()).map_err(|_| {
                Error::config(format!(
                    "Source '{}' {name} constant '{code}' is not a currency code",
                    def.name
                ))
            })?;
        }
        (None, Some(query)) => {
            compile(def, query, name)?;
            validate_read(def, field.attribute.as_ref(), field.own_text, name)?;
        }
        _ => {
            return Err(Error::config(format!(
                "Source '{}' {name} needs exactly one of 'constant' or 'query'",
                def.name
            )));
        }
    }
    Ok(())
}

fn validate_number_field(
    def: &SourceDefinition,
    field: &NumberFieldDefinition,
    name: &str,
) -> Result<()> {
    if field.query.trim().is_empty() {
        return Err(Error::config(format!(
            "Source '{}' {name} query cannot be empty",
            def.name
        )));
    }
    compile(def, &field.query, name)?;
    validate_read(def, field.attribute.as_ref(), field.own_text, name)
}

fn validate_read(
    def: &SourceDefinition,
    attribute: Option<&String>,
    own_text: bool,
    name: &str,
) -> Result<()> {
    if attribute.is_some() && own_text {
        return Err(Error::config(format!(
            "Source '{}' {name} cannot set both 'attribute' and 'own_text'",
            def.name
        )));
    }
    if own_text && def.format != DecoderFormat::Html {
        return Err(Error::config(format!(
            "Source '{}' {name} own_text is only supported for html",
            def.name
        )));
    }
    Ok(())
}

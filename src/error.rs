//! Error types for rate-grabber
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Errors fall into a small number of kinds (see [`ErrorKind`]) so callers
//! can tell "the bank is unreachable" apart from "the bank changed its page"
//! and from "the bank simply does not quote this pair".

use thiserror::Error;

/// The main error type for rate-grabber
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Open {url} stream failed. Response code {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Open {url} stream failed. Empty response")]
    EmptyResponse { url: String },

    #[error("Request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Extraction Errors
    // ============================================================================
    #[error("Source format changed: {message}")]
    SchemaDrift { message: String },

    #[error("Source '{source_id}' does not quote {base}/{destination}")]
    RateNotFound {
        source_id: String,
        base: String,
        destination: String,
    },

    // ============================================================================
    // Validation Errors
    // ============================================================================
    #[error("Invalid currency code format: '{value}'")]
    InvalidCurrencyCode { value: String },

    #[error("Invalid source id: '{value}'")]
    InvalidSourceId { value: String },

    #[error("Invalid {field}: {value} (must be a finite number greater than zero)")]
    InvalidRate { field: &'static str, value: f64 },

    // ============================================================================
    // Observer Errors
    // ============================================================================
    #[error("{} observer(s) failed: {}", .failures.len(), format_failures(.failures))]
    Observers { failures: Vec<ObserverFailure> },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Undefined variable in template: {variable}")]
    UndefinedVariable { variable: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// A single observer callback that returned an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserverFailure {
    /// Identity the observer was attached under
    pub observer: String,
    /// Event being delivered ("created", "updated" or "changed")
    pub event: &'static str,
    /// Rendered error message
    pub message: String,
}

fn format_failures(failures: &[ObserverFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} on {}: {}", f.observer, f.event, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Broad classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Source unreachable, non-success status or empty response
    Transport,
    /// The source's published format no longer matches its definition
    SchemaDrift,
    /// Extraction succeeded but the requested pair is not quoted
    NotFound,
    /// Malformed input handed directly to the API
    Validation,
    /// One or more observers failed during notification
    Observer,
    /// Source definition, template or filesystem problem
    Config,
    /// Anything else
    Other,
}

impl Error {
    /// Create a schema drift error
    pub fn schema_drift(message: impl Into<String>) -> Self {
        Self::SchemaDrift {
            message: message.into(),
        }
    }

    /// Create a not-found error for a currency pair
    pub fn rate_not_found(
        source_id: impl Into<String>,
        base: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self::RateNotFound {
            source_id: source_id.into(),
            base: base.into(),
            destination: destination.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Create an undefined variable error
    pub fn undefined_var(variable: impl Into<String>) -> Self {
        Self::UndefinedVariable {
            variable: variable.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Http(_)
            | Error::HttpStatus { .. }
            | Error::EmptyResponse { .. }
            | Error::Timeout { .. }
            | Error::InvalidUrl(_) => ErrorKind::Transport,
            Error::SchemaDrift { .. } => ErrorKind::SchemaDrift,
            Error::RateNotFound { .. } => ErrorKind::NotFound,
            Error::InvalidCurrencyCode { .. }
            | Error::InvalidSourceId { .. }
            | Error::InvalidRate { .. } => ErrorKind::Validation,
            Error::Observers { .. } => ErrorKind::Observer,
            Error::Config { .. }
            | Error::YamlParse(_)
            | Error::UndefinedVariable { .. }
            | Error::Io(_) => ErrorKind::Config,
            Error::Other(_) | Error::Anyhow(_) => ErrorKind::Other,
        }
    }

    /// Check if the source could not be reached
    pub fn is_transport(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    /// Check if the source layout no longer matches its definition
    pub fn is_schema_drift(&self) -> bool {
        self.kind() == ErrorKind::SchemaDrift
    }

    /// Check if the requested pair is legitimately absent
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Result type alias for rate-grabber
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

//! Transport abstraction
//!
//! The extraction pipeline obtains raw response text through a single
//! [`Transport::fetch`] call. [`HttpTransport`] performs a real GET request
//! described by a source definition; [`StaticTransport`] serves a fixed
//! body and is used for offline input and tests.

use super::client::{HttpClient, HttpClientConfig, RequestConfig};
use crate::error::{Error, Result};
use crate::loader::RequestDefinition;
use crate::template::{self, PublisherZone, TemplateContext};
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use tracing::debug;

/// Something that can produce the raw text of a source
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the raw response text
    async fn fetch(&self) -> Result<String>;

    /// Short human-readable description (URL or origin) used in logs
    fn describe(&self) -> String;
}

// ============================================================================
// HTTP Transport
// ============================================================================

/// GET request against a fixed URL with templated parameters
#[derive(Debug)]
pub struct HttpTransport {
    client: HttpClient,
    url: String,
    params: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    date_format: String,
    zone: PublisherZone,
}

impl HttpTransport {
    /// Create a transport for a URL using the given client
    pub fn new(client: HttpClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            params: Vec::new(),
            headers: Vec::new(),
            date_format: "%Y-%m-%d".to_string(),
            zone: PublisherZone::default(),
        }
    }

    /// Build a transport from a source's request definition
    pub fn from_definition(def: &RequestDefinition) -> Result<Self> {
        let mut config = HttpClientConfig::builder()
            .timeout(Duration::from_secs(def.timeout_secs))
            .connect_timeout(Duration::from_secs(def.timeout_secs));
        if let Some(agent) = &def.user_agent {
            config = config.user_agent(agent);
        }
        if let Some(limit) = &def.rate_limit {
            config = config.rate_limit(limit.clone());
        }

        let zone = PublisherZone::resolve(def.timezone.as_deref(), def.utc_offset_hours)?;
        let client = HttpClient::with_config(config.build())?;
        debug!(
            url = %def.url,
            ?zone,
            rate_limited = client.has_rate_limiter(),
            "Building transport"
        );

        let transport = def
            .params
            .iter()
            .fold(Self::new(client, &def.url), |t, (k, v)| t.param(k, v));
        let mut transport = def.headers.iter().fold(transport, |t, (k, v)| t.header(k, v));
        transport.date_format.clone_from(&def.date_format);
        transport.zone = zone;
        Ok(transport)
    }

    /// Add a query parameter (may contain `{{ vars.* }}` templates)
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Add a header (may contain `{{ vars.* }}` templates)
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Render parameters and headers for a request issued now
    fn request_config(&self) -> Result<RequestConfig> {
        self.request_config_at(Utc::now())
    }

    pub(super) fn request_config_at(&self, now: chrono::DateTime<Utc>) -> Result<RequestConfig> {
        let ctx = TemplateContext::for_request(now, self.zone, &self.date_format);
        let render = |value: &String| {
            if template::has_templates(value) {
                template::render(value, &ctx)
            } else {
                Ok(value.clone())
            }
        };

        let mut config = RequestConfig::new();
        for (key, value) in &self.params {
            config = config.query(key, render(value)?);
        }
        for (key, value) in &self.headers {
            config = config.header(key, render(value)?);
        }
        Ok(config)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self) -> Result<String> {
        let config = self.request_config()?;
        debug!(url = %self.url, params = config.query.len(), "Fetching source");
        self.client.get_text(&self.url, config).await
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

// ============================================================================
// Static Transport
// ============================================================================

/// Serves a fixed, already-fetched body
#[derive(Debug, Clone)]
pub struct StaticTransport {
    origin: String,
    body: String,
}

impl StaticTransport {
    /// Create a transport that always returns `body`
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            origin: "static".to_string(),
            body: body.into(),
        }
    }

    /// Label the body's origin (e.g. the file it was read from)
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }
}

#[async_trait]
impl Transport for StaticTransport {
    async fn fetch(&self) -> Result<String> {
        if self.body.trim().is_empty() {
            return Err(Error::EmptyResponse {
                url: self.origin.clone(),
            });
        }
        Ok(self.body.clone())
    }

    fn describe(&self) -> String {
        self.origin.clone()
    }
}

//! Extraction pipeline
//!
//! Binds a transport, a decoder and an extractor into one rate source.
//!
//! # Overview
//!
//! The pipeline module provides:
//! - `RateSource` - Fetch, decode and extract the rates of one publisher
//! - `RateIter` - Lazy rate sequence over one decoded document
//!
//! Fetching is the only suspension point. Decoding and extraction run
//! synchronously on the fetched text, so the parsed document never lives
//! across an `.await`.

mod types;

pub use types::RateIter;

use crate::decode::{decoder_for, DecoderFormat, Document, DocumentDecoder, Query};
use crate::error::{Error, Result};
use crate::extract::{DeclarativeExtractor, RateExtractor};
use crate::http::{HttpTransport, Transport};
use crate::loader::{validate_source, SourceDefinition};
use crate::types::{CurrencyCode, ExtractionMode, RateTuple, SourceId};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// One rate publisher: where to fetch, how to decode, how to extract
pub struct RateSource {
    id: SourceId,
    title: String,
    decoder: Box<dyn DocumentDecoder>,
    records: Query,
    record_filter: Option<Query>,
    extractor: Box<dyn RateExtractor>,
    transport: Arc<dyn Transport>,
    mode: ExtractionMode,
}

impl RateSource {
    /// Create a source from its parts
    pub fn new(
        id: SourceId,
        format: DecoderFormat,
        records: Query,
        extractor: impl RateExtractor + 'static,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            title: id.to_string(),
            id,
            decoder: decoder_for(format),
            records,
            record_filter: None,
            extractor: Box::new(extractor),
            transport,
            mode: ExtractionMode::default(),
        }
    }

    /// Build a source from a definition, fetching over HTTP
    pub fn from_definition(def: &SourceDefinition) -> Result<Self> {
        let transport = HttpTransport::from_definition(&def.request)?;
        Self::from_definition_with_transport(def, Arc::new(transport))
    }

    /// Build a source from a definition with a caller-provided transport
    pub fn from_definition_with_transport(
        def: &SourceDefinition,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        validate_source(def)?;

        let id = SourceId::new(&def.name)?;
        let records = Query::for_format(def.format, &def.records)?;
        let extractor = DeclarativeExtractor::compile(def.format, &def.fields)?;

        let mut source = Self::new(id, def.format, records, extractor, transport)
            .with_title(def.display_title())
            .with_mode(def.mode);
        if let Some(filter) = &def.record_filter {
            source = source.with_record_filter(Query::for_format(def.format, filter)?);
        }
        Ok(source)
    }

    /// Set the display title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the extraction mode
    #[must_use]
    pub fn with_mode(mut self, mode: ExtractionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Keep only records containing a match for `filter`
    #[must_use]
    pub fn with_record_filter(mut self, filter: Query) -> Self {
        self.record_filter = Some(filter);
        self
    }

    /// Replace the transport
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Source id
    pub fn id(&self) -> &SourceId {
        &self.id
    }

    /// Display title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Document format
    pub fn format(&self) -> DecoderFormat {
        self.decoder.format()
    }

    /// Extraction mode
    pub fn mode(&self) -> ExtractionMode {
        self.mode
    }

    /// Where the raw text comes from
    pub fn origin(&self) -> String {
        self.transport.describe()
    }

    /// Fetch the raw text through the transport
    pub async fn fetch(&self) -> Result<String> {
        let start = Instant::now();
        let body = self.transport.fetch().await?;
        debug!(
            source = %self.id,
            origin = %self.transport.describe(),
            bytes = body.len(),
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Fetched source"
        );
        Ok(body)
    }

    /// Decode raw text with this source's decoder
    pub fn decode(&self, body: &str) -> Result<Document> {
        self.decoder.decode(body)
    }

    /// Lazy rate sequence over an already decoded document
    ///
    /// Fails with schema drift when the document has no (matching) records.
    pub fn rates<'a>(&'a self, doc: &'a Document) -> Result<RateIter<'a>> {
        let mut records = doc.records(&self.records)?;

        if let Some(filter) = &self.record_filter {
            let mut kept = Vec::with_capacity(records.len());
            for record in records {
                if record.contains(filter)? {
                    kept.push(record);
                }
            }
            if kept.is_empty() {
                return Err(Error::schema_drift(format!(
                    "{} containing {filter} was not found",
                    self.records
                )));
            }
            records = kept;
        }

        debug!(source = %self.id, records = records.len(), "Selected records");
        Ok(RateIter::new(
            records,
            self.extractor.as_ref(),
            &self.id,
            self.mode,
        ))
    }

    /// Extract every rate from raw text
    ///
    /// All-or-nothing: in fail-fast mode one malformed record fails the
    /// whole call.
    pub fn extract_all(&self, body: &str) -> Result<Vec<RateTuple>> {
        let doc = self.decode(body)?;
        let mut iter = self.rates(&doc)?;
        let tuples = iter.by_ref().collect::<Result<Vec<_>>>()?;

        if tuples.is_empty() {
            return Err(Error::schema_drift(format!(
                "{} contained no valid rates",
                self.records
            )));
        }
        info!(
            source = %self.id,
            rates = tuples.len(),
            skipped = iter.skipped(),
            "Extracted rates"
        );
        Ok(tuples)
    }

    /// Find the first rate for a pair in raw text
    ///
    /// Both codes must be three uppercase ASCII letters; anything else
    /// (e.g. `"usd"`) is a validation error raised before `body` is
    /// decoded. A well-formed pair the source does not quote is
    /// [`Error::RateNotFound`].
    pub fn find_in(&self, body: &str, base: &str, destination: &str) -> Result<RateTuple> {
        let base = CurrencyCode::new(base)?;
        let destination = CurrencyCode::new(destination)?;

        let doc = self.decode(body)?;
        for tuple in self.rates(&doc)? {
            let tuple = tuple?;
            if tuple.is_pair(base.as_str(), destination.as_str()) {
                debug!(source = %self.id, rate = %tuple, "Found rate");
                return Ok(tuple);
            }
        }
        Err(Error::rate_not_found(
            self.id.as_str(),
            base.as_str(),
            destination.as_str(),
        ))
    }

    /// Produce every rate, fetching first unless `raw` is given
    pub async fn produce_rates(&self, raw: Option<String>) -> Result<Vec<RateTuple>> {
        let body = match raw {
            Some(body) => body,
            None => self.fetch().await?,
        };
        self.extract_all(&body)
    }

    /// Find the first rate for a pair, fetching first unless `raw` is given
    ///
    /// Malformed codes (e.g. lowercase `"uah"`) fail with a validation
    /// error before anything is fetched. A well-formed pair missing from
    /// the document is [`Error::RateNotFound`], never a validation error.
    pub async fn find_rate(
        &self,
        base: &str,
        destination: &str,
        raw: Option<String>,
    ) -> Result<RateTuple> {
        CurrencyCode::new(base)?;
        CurrencyCode::new(destination)?;

        let body = match raw {
            Some(body) => body,
            None => self.fetch().await?,
        };
        self.find_in(&body, base, destination)
    }
}

impl std::fmt::Debug for RateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateSource")
            .field("id", &self.id)
            .field("format", &self.format())
            .field("records", &self.records.as_str())
            .field("origin", &self.transport.describe())
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;

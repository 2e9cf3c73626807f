//! Tests for the extraction pipeline

use super::*;
use crate::decode::Record;
use crate::http::StaticTransport;
use crate::loader::load_source_from_str;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};

const TABLE_SOURCE: &str = r#"
name: test-bank
title: Test Bank
format: html
request:
  url: https://bank.example/rates
records: "table.currency__table > tbody > tr"
fields:
  base_currency: { constant: UAH }
  destination_currency: { query: "td:nth-child(1)", letters_only: true }
  buy_rate: { query: "td:nth-child(2)" }
  sale_rate: { query: "td:nth-child(3)" }
"#;

const TABLE: &str = r#"
<table class="currency__table"><tbody>
  <tr><td>USD <span>Долар США</span></td><td>27.50</td><td>27.80</td></tr>
  <tr><td>EUR <span>Євро</span></td><td>30.10</td><td>30.50</td></tr>
  <tr><td>PLN <span>Злотий</span></td><td>6.80</td><td>7.10</td></tr>
</tbody></table>
"#;

const BROKEN_TABLE: &str = r#"
<table class="currency__table"><tbody>
  <tr><td>USD</td><td>27.50</td><td>27.80</td></tr>
  <tr><td>EUR</td><td>—</td><td>30.50</td></tr>
  <tr><td>PLN</td><td>6.80</td><td>7.10</td></tr>
</tbody></table>
"#;

/// Transport that counts fetches and serves a fixed body
struct CountingTransport {
    body: String,
    calls: AtomicUsize,
}

impl CountingTransport {
    fn new(body: &str) -> Arc<Self> {
        Arc::new(Self {
            body: body.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for CountingTransport {
    async fn fetch(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.body.clone())
    }

    fn describe(&self) -> String {
        "counting".to_string()
    }
}

fn table_source(transport: Arc<dyn Transport>) -> RateSource {
    let def = load_source_from_str(TABLE_SOURCE).unwrap();
    RateSource::from_definition_with_transport(&def, transport).unwrap()
}

fn pairs(tuples: &[RateTuple]) -> Vec<String> {
    tuples.iter().map(ToString::to_string).collect()
}

// ============================================================================
// produce_rates
// ============================================================================

#[tokio::test]
async fn test_produce_rates_in_source_order() {
    let source = table_source(Arc::new(StaticTransport::new(TABLE)));
    assert_eq!(source.title(), "Test Bank");

    let rates = source.produce_rates(None).await.unwrap();
    assert_eq!(
        pairs(&rates),
        vec![
            "UAH/USD buy=27.5 sale=27.8",
            "UAH/EUR buy=30.1 sale=30.5",
            "UAH/PLN buy=6.8 sale=7.1",
        ]
    );
}

#[tokio::test]
async fn test_produce_rates_with_raw_skips_fetch() {
    let transport = CountingTransport::new("");
    let source = table_source(transport.clone());

    let rates = source.produce_rates(Some(TABLE.to_string())).await.unwrap();
    assert_eq!(rates.len(), 3);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_produce_rates_is_all_or_nothing() {
    let source = table_source(Arc::new(StaticTransport::new(BROKEN_TABLE)));

    let err = source.produce_rates(None).await.unwrap_err();
    assert!(err.is_schema_drift());
    assert!(err.to_string().contains("Buy rate is invalid"));
}

#[tokio::test]
async fn test_produce_rates_skip_invalid_mode() {
    let source = table_source(Arc::new(StaticTransport::new(BROKEN_TABLE)))
        .with_mode(ExtractionMode::SkipInvalid);

    let rates = source.produce_rates(None).await.unwrap();
    assert_eq!(
        pairs(&rates),
        vec!["UAH/USD buy=27.5 sale=27.8", "UAH/PLN buy=6.8 sale=7.1"]
    );
}

#[tokio::test]
async fn test_produce_rates_transport_error_propagates() {
    let source = table_source(Arc::new(StaticTransport::new("")));

    let err = source.produce_rates(None).await.unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_produce_rates_missing_table() {
    let source = table_source(Arc::new(StaticTransport::new(
        "<html><body><p>Maintenance</p></body></html>",
    )));

    let err = source.produce_rates(None).await.unwrap_err();
    assert!(err.is_schema_drift());
    assert!(err
        .to_string()
        .contains("table.currency__table > tbody > tr was not found"));
}

#[tokio::test]
async fn test_each_call_fetches_again() {
    let transport = CountingTransport::new(TABLE);
    let source = table_source(transport.clone());

    source.produce_rates(None).await.unwrap();
    source.produce_rates(None).await.unwrap();
    assert_eq!(transport.calls(), 2);
}

// ============================================================================
// rates (lazy iteration)
// ============================================================================

#[test]
fn test_rates_is_lazy_and_fused() {
    let source = table_source(Arc::new(StaticTransport::new(BROKEN_TABLE)));
    let doc = source.decode(BROKEN_TABLE).unwrap();

    let mut iter = source.rates(&doc).unwrap();
    assert_eq!(iter.remaining(), 3);

    assert!(iter.next().unwrap().is_ok());
    assert_eq!(iter.remaining(), 2);
    assert!(iter.next().unwrap().is_err());
    // fail-fast: nothing after the first error
    assert!(iter.next().is_none());
    assert!(iter.next().is_none());
}

#[test]
fn test_rates_skip_invalid_counts_skipped() {
    let source = table_source(Arc::new(StaticTransport::new(BROKEN_TABLE)))
        .with_mode(ExtractionMode::SkipInvalid);
    let doc = source.decode(BROKEN_TABLE).unwrap();

    let mut iter = source.rates(&doc).unwrap();
    let tuples: Vec<_> = iter.by_ref().collect::<Result<_>>().unwrap();
    assert_eq!(tuples.len(), 2);
    assert_eq!(iter.skipped(), 1);
}

#[test]
fn test_record_filter_drops_header_rows() {
    let yaml = r#"
name: filtered
request:
  url: https://bank.example/kurs/
records: "div.kurs > table tr"
record_filter: td
fields:
  base_currency: { constant: UAH }
  destination_currency: { query: "td:nth-child(1)" }
  buy_rate: { query: "td:nth-child(2)" }
  sale_rate: { query: "td:nth-child(3)" }
"#;
    let body = r#"
<div class="kurs"><table>
  <tr><th>Currency</th><th>Buy</th><th>Sale</th></tr>
  <tr><td>USD</td><td>27.50</td><td>27.80</td></tr>
</table></div>"#;
    let def = load_source_from_str(yaml).unwrap();
    let source =
        RateSource::from_definition_with_transport(&def, Arc::new(StaticTransport::new(body)))
            .unwrap();

    let rates = source.extract_all(body).unwrap();
    assert_eq!(pairs(&rates), vec!["UAH/USD buy=27.5 sale=27.8"]);

    let err = source
        .extract_all("<div class='kurs'><table><tr><th>x</th></tr></table></div>")
        .unwrap_err();
    assert!(err.to_string().contains("containing td was not found"));
}

// ============================================================================
// find_rate
// ============================================================================

#[tokio::test]
async fn test_find_rate() {
    let source = table_source(Arc::new(StaticTransport::new(TABLE)));

    let rate = source.find_rate("UAH", "EUR", None).await.unwrap();
    assert_eq!(rate.to_string(), "UAH/EUR buy=30.1 sale=30.5");
}

#[tokio::test]
async fn test_find_rate_first_match_wins() {
    let body = r#"
<table class="currency__table"><tbody>
  <tr><td>USD</td><td>27.50</td><td>27.80</td></tr>
  <tr><td>USD</td><td>28.00</td><td>28.40</td></tr>
</tbody></table>"#;
    let source = table_source(Arc::new(StaticTransport::new(body)));

    let rate = source.find_rate("UAH", "USD", None).await.unwrap();
    assert_eq!(rate.buy, 27.5);
}

#[tokio::test]
async fn test_find_rate_stops_before_later_malformed_records() {
    let source = table_source(Arc::new(StaticTransport::new(BROKEN_TABLE)));

    let rate = source.find_rate("UAH", "USD", None).await.unwrap();
    assert_eq!(rate.sale, 27.8);
}

#[tokio::test]
async fn test_find_rate_not_found() {
    let source = table_source(Arc::new(StaticTransport::new(TABLE)));

    let err = source.find_rate("UAH", "GBP", None).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(!err.is_schema_drift());
    assert_eq!(err.to_string(), "Source 'test-bank' does not quote UAH/GBP");
}

#[tokio::test]
async fn test_find_rate_rejects_malformed_codes() {
    let transport = CountingTransport::new(TABLE);
    let source = table_source(transport.clone());

    let err = source.find_rate("uah", "USD", None).await.unwrap_err();
    assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    assert_eq!(err.to_string(), "Invalid currency code format: 'uah'");
    assert_eq!(transport.calls(), 0);

    let err = source.find_rate("UAH", "US", None).await.unwrap_err();
    assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    assert_eq!(transport.calls(), 0);

    // raw text is not decoded either
    let err = source.find_in("not even html", "UAH", "usd").unwrap_err();
    assert_eq!(err.kind(), crate::error::ErrorKind::Validation);

    // well-formed but unquoted is a different failure
    let err = source.find_in(TABLE, "UAH", "GBP").unwrap_err();
    assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
}

// ============================================================================
// Custom extractors
// ============================================================================

/// Extractor for a `CODE:BUY:SALE` text format in a `<li>` list
struct ColonExtractor;

impl ColonExtractor {
    fn parts(record: &Record<'_>) -> Result<Vec<String>> {
        let Record::Node(node) = record else {
            return Err(Error::schema_drift("expected a list item"));
        };
        let text = node.text().collect::<String>();
        Ok(text.split(':').map(|s| s.trim().to_string()).collect())
    }

    fn part(record: &Record<'_>, index: usize) -> Result<String> {
        Self::parts(record)?
            .get(index)
            .cloned()
            .ok_or_else(|| Error::schema_drift(format!("part {index} was not found")))
    }
}

impl RateExtractor for ColonExtractor {
    fn base_currency(&self, _record: &Record<'_>) -> Result<CurrencyCode> {
        CurrencyCode::new("UAH")
    }

    fn destination_currency(&self, record: &Record<'_>) -> Result<CurrencyCode> {
        CurrencyCode::new(Self::part(record, 0)?)
    }

    fn buy_rate(&self, record: &Record<'_>) -> Result<f64> {
        Self::part(record, 1)?
            .parse()
            .map_err(|_| Error::schema_drift("Buy rate is invalid"))
    }

    fn sale_rate(&self, record: &Record<'_>) -> Result<f64> {
        Self::part(record, 2)?
            .parse()
            .map_err(|_| Error::schema_drift("Sale rate is invalid"))
    }
}

#[tokio::test]
async fn test_custom_extractor() {
    let body = "<ul id='rates'><li>USD:27.50:27.80</li><li>EUR:30.10:30.50</li></ul>";
    let source = RateSource::new(
        SourceId::new("colon-bank").unwrap(),
        DecoderFormat::Html,
        Query::css("ul#rates > li").unwrap(),
        ColonExtractor,
        Arc::new(StaticTransport::new(body)),
    );

    let rates = source.produce_rates(None).await.unwrap();
    assert_eq!(
        pairs(&rates),
        vec!["UAH/USD buy=27.5 sale=27.8", "UAH/EUR buy=30.1 sale=30.5"]
    );
}

#[test]
fn test_debug_does_not_leak_internals() {
    let source = table_source(Arc::new(StaticTransport::new(TABLE).with_origin("fixture.html")));
    let debug = format!("{source:?}");
    assert!(debug.contains("test-bank"));
    assert!(debug.contains("fixture.html"));
    assert_eq!(source.origin(), "fixture.html");
}

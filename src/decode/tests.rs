//! Tests for decoder module

use super::*;
use serde_json::json;

const RATES_TABLE: &str = r#"
<html><body>
  <table class="currency__table">
    <thead><tr><th>Currency</th><th>Buy</th><th>Sale</th></tr></thead>
    <tbody>
      <tr><td>USD</td><td>27.50</td><td>27.80</td></tr>
      <tr><td>EUR</td><td class="rate" data-rate="30.10">30,10</td><td>30.50</td></tr>
    </tbody>
  </table>
</body></html>
"#;

// ============================================================================
// DecoderFormat / Query Tests
// ============================================================================

#[test]
fn test_decoder_format_serde() {
    let format: DecoderFormat = serde_json::from_str("\"json\"").unwrap();
    assert_eq!(format, DecoderFormat::Json);
    assert_eq!(DecoderFormat::default(), DecoderFormat::Html);
    assert_eq!(DecoderFormat::Html.to_string(), "html");
}

#[test]
fn test_query_css_invalid() {
    let err = Query::css("td:nth-child(").unwrap_err();
    assert!(err.to_string().contains("Invalid CSS selector"));
}

#[test]
fn test_query_for_format() {
    let q = Query::for_format(DecoderFormat::Html, "tbody > tr").unwrap();
    assert!(matches!(q, Query::Css { .. }));
    assert_eq!(q.as_str(), "tbody > tr");

    let q = Query::for_format(DecoderFormat::Json, "$.data").unwrap();
    assert!(matches!(q, Query::Path(_)));
}

#[test]
fn test_decoder_for() {
    assert_eq!(decoder_for(DecoderFormat::Html).format(), DecoderFormat::Html);
    assert_eq!(decoder_for(DecoderFormat::Json).format(), DecoderFormat::Json);
}

// ============================================================================
// HTML Decoder Tests
// ============================================================================

#[test]
fn test_html_decoder_rows() {
    let doc = HtmlDecoder::new().decode(RATES_TABLE).unwrap();
    assert_eq!(doc.format(), DecoderFormat::Html);

    let rows = doc
        .records(&Query::css("table.currency__table > tbody > tr").unwrap())
        .unwrap();
    assert_eq!(rows.len(), 2);

    let first_cell = Query::css("td:nth-child(1)").unwrap();
    assert_eq!(rows[0].values(&first_cell, &ValueSource::Text).unwrap(), vec!["USD"]);
    assert_eq!(rows[1].values(&first_cell, &ValueSource::Text).unwrap(), vec!["EUR"]);
}

#[test]
fn test_html_decoder_attribute() {
    let doc = HtmlDecoder::new().decode(RATES_TABLE).unwrap();
    let rows = doc.records(&Query::css("tbody > tr").unwrap()).unwrap();
    let cell = Query::css("td.rate").unwrap();

    assert_eq!(
        rows[1].values(&cell, &ValueSource::attribute("data-rate")).unwrap(),
        vec!["30.10"]
    );
    assert!(rows[0].values(&cell, &ValueSource::attribute("data-rate")).unwrap().is_empty());
    assert!(rows[1].values(&cell, &ValueSource::attribute("missing")).unwrap().is_empty());
}

#[test]
fn test_html_own_text_skips_nested_elements() {
    let body = r#"<table><tbody>
        <tr><td>27.50<span class="diff">+0.05</span></td><td><b>bold</b></td></tr>
        <tr><td>
            <i class="flag"></i>
            USD
          <small>Долар США</small></td><td>28.10</td></tr>
    </tbody></table>"#;
    let doc = HtmlDecoder::new().decode(body).unwrap();
    let rows = doc.records(&Query::css("tbody > tr").unwrap()).unwrap();
    let first = Query::css("td:nth-child(1)").unwrap();
    let second = Query::css("td:nth-child(2)").unwrap();

    assert_eq!(rows[0].values(&first, &ValueSource::Text).unwrap(), vec!["27.50+0.05"]);
    assert_eq!(rows[0].values(&first, &ValueSource::OwnText).unwrap(), vec!["27.50"]);
    assert!(rows[0].values(&second, &ValueSource::OwnText).unwrap().is_empty());
    assert_eq!(rows[1].values(&first, &ValueSource::OwnText).unwrap(), vec!["USD"]);
}

#[test]
fn test_html_decoder_tolerates_malformed_markup() {
    let body = "<table id='rates'><tr><td>USD<td>27.50</tr><tr><td>EUR</table></div></span>";
    let doc = HtmlDecoder::new().decode(body).unwrap();

    let rows = doc.records(&Query::css("#rates tr").unwrap()).unwrap();
    assert_eq!(rows.len(), 2);
    let cells = Query::css("td").unwrap();
    assert_eq!(rows[0].values(&cells, &ValueSource::Text).unwrap(), vec!["USD", "27.50"]);
}

#[test]
fn test_html_decoder_empty_body() {
    let err = HtmlDecoder::new().decode("   \n").unwrap_err();
    assert!(err.is_schema_drift());
}

#[test]
fn test_html_records_not_found() {
    let doc = HtmlDecoder::new().decode(RATES_TABLE).unwrap();
    let err = doc
        .records(&Query::css("table#exchangeRates > tbody > tr").unwrap())
        .unwrap_err();
    assert!(err.is_schema_drift());
    assert!(err
        .to_string()
        .contains("table#exchangeRates > tbody > tr was not found"));
}

#[test]
fn test_format_mismatch_is_config_error() {
    let doc = HtmlDecoder::new().decode(RATES_TABLE).unwrap();
    let err = doc.records(&Query::path("data")).unwrap_err();
    assert_eq!(err.kind(), crate::error::ErrorKind::Config);
}

// ============================================================================
// JSON Decoder Tests
// ============================================================================

#[test]
fn test_json_decoder_root_array() {
    let body = r#"[
        {"ccy": "EUR", "base_ccy": "UAH", "buy": "30.10", "sale": "30.50"},
        {"ccy": "USD", "base_ccy": "UAH", "buy": "27.50", "sale": "27.80"}
    ]"#;
    let doc = JsonDecoder::new().decode(body).unwrap();
    assert_eq!(doc.format(), DecoderFormat::Json);

    let records = doc.records(&Query::path("")).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].values(&Query::path("ccy"), &ValueSource::Text).unwrap(),
        vec!["EUR"]
    );

    // "$" addresses the root as well
    assert_eq!(doc.records(&Query::path("$")).unwrap().len(), 2);
}

#[test]
fn test_json_decoder_nested_path() {
    let doc = Document::Structured(json!({
        "response": {"rates": [{"code": "USD", "rate": 27.5}], "total": 1}
    }));

    let records = doc.records(&Query::path("response.rates")).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].values(&Query::path("rate"), &ValueSource::Text).unwrap(),
        vec!["27.5"]
    );
}

#[test]
fn test_json_decoder_single_object_is_one_record() {
    let doc = Document::Structured(json!({"data": {"code": "USD"}}));
    let records = doc.records(&Query::path("$.data")).unwrap();
    assert_eq!(records.len(), 1);
}

#[test]
fn test_json_decoder_array_index() {
    let doc = Document::Structured(json!({"data": [{"id": 1}, {"id": 2}, {"id": 3}]}));
    let records = doc.records(&Query::path("data[-1]")).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].values(&Query::path("id"), &ValueSource::Text).unwrap(), vec!["3"]);
}

#[test]
fn test_json_decoder_jsonpath_wildcard() {
    let doc = Document::Structured(json!({
        "data": [{"ccy": "USD"}, {"ccy": "EUR"}]
    }));
    let records = doc.records(&Query::path("$.data[*]")).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[1].values(&Query::path("ccy"), &ValueSource::Text).unwrap(),
        vec!["EUR"]
    );
}

#[test]
fn test_json_decoder_invalid() {
    let err = JsonDecoder::new().decode("<html>not json</html>").unwrap_err();
    assert!(err.is_schema_drift());
    assert!(err.to_string().contains("JSON decoding failed"));

    // Strict: trailing garbage is rejected rather than partially parsed
    assert!(JsonDecoder::new().decode(r#"[{"a": 1}] trailing"#).is_err());
}

#[test]
fn test_json_records_empty_array() {
    let doc = Document::Structured(json!({"data": []}));
    let err = doc.records(&Query::path("data")).unwrap_err();
    assert!(err.is_schema_drift());
}

#[test]
fn test_json_values_missing_and_null() {
    let doc = Document::Structured(json!([{"buy": null}]));
    let records = doc.records(&Query::path("")).unwrap();
    assert!(records[0].values(&Query::path("buy"), &ValueSource::Text).unwrap().is_empty());
    assert!(records[0].values(&Query::path("sale"), &ValueSource::Text).unwrap().is_empty());
}

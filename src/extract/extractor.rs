//! Rate extractors
//!
//! [`RateExtractor`] is the per-record contract every source implements.
//! [`DeclarativeExtractor`] implements it from the `fields` block of a YAML
//! source definition.

use super::fields::{CodeField, NumberField};
use crate::decode::{DecoderFormat, Record};
use crate::error::Result;
use crate::loader::FieldsDefinition;
use crate::types::{CurrencyCode, RateTuple};

/// Turns one record into the four fields of a rate tuple
///
/// Every accessor fails with a schema-drift error naming the query and the
/// field when the record no longer has the expected shape.
pub trait RateExtractor: Send + Sync {
    /// Currency the rates are quoted in
    fn base_currency(&self, record: &Record<'_>) -> Result<CurrencyCode>;

    /// Currency being bought or sold
    fn destination_currency(&self, record: &Record<'_>) -> Result<CurrencyCode>;

    /// Price at which the publisher buys one unit of the destination currency
    fn buy_rate(&self, record: &Record<'_>) -> Result<f64>;

    /// Price at which the publisher sells one unit of the destination currency
    fn sale_rate(&self, record: &Record<'_>) -> Result<f64>;

    /// Extract a complete tuple, calling the accessors in order
    fn extract(&self, record: &Record<'_>) -> Result<RateTuple> {
        let base = self.base_currency(record)?;
        let destination = self.destination_currency(record)?;
        let buy = self.buy_rate(record)?;
        let sale = self.sale_rate(record)?;
        Ok(RateTuple::new(base, destination, buy, sale))
    }
}

/// Extractor compiled from a [`FieldsDefinition`]
#[derive(Debug, Clone)]
pub struct DeclarativeExtractor {
    base: CodeField,
    destination: CodeField,
    buy: NumberField,
    sale: Option<NumberField>,
    unit: Option<NumberField>,
}

impl DeclarativeExtractor {
    /// Compile field rules for documents of `format`
    ///
    /// Malformed selectors and invalid constant codes fail here, before
    /// anything is fetched.
    pub fn compile(format: DecoderFormat, fields: &FieldsDefinition) -> Result<Self> {
        Ok(Self {
            base: CodeField::compile(format, &fields.base_currency, "base currency code")?,
            destination: CodeField::compile(
                format,
                &fields.destination_currency,
                "destination currency code",
            )?,
            buy: NumberField::compile(format, &fields.buy_rate, "buy rate")?,
            sale: fields
                .sale_rate
                .as_ref()
                .map(|def| NumberField::compile(format, def, "sale rate"))
                .transpose()?,
            unit: fields
                .unit
                .as_ref()
                .map(|def| NumberField::compile(format, def, "unit"))
                .transpose()?,
        })
    }

    fn per_unit(&self, record: &Record<'_>, value: f64) -> Result<f64> {
        match &self.unit {
            Some(unit) => Ok(value / f64::from(unit.read_unit(record)?)),
            None => Ok(value),
        }
    }
}

impl RateExtractor for DeclarativeExtractor {
    fn base_currency(&self, record: &Record<'_>) -> Result<CurrencyCode> {
        self.base.read(record)
    }

    fn destination_currency(&self, record: &Record<'_>) -> Result<CurrencyCode> {
        self.destination.read(record)
    }

    fn buy_rate(&self, record: &Record<'_>) -> Result<f64> {
        let buy = self.buy.read_rate(record)?;
        self.per_unit(record, buy)
    }

    fn sale_rate(&self, record: &Record<'_>) -> Result<f64> {
        match &self.sale {
            Some(sale) => {
                let value = sale.read_rate(record)?;
                self.per_unit(record, value)
            }
            // Single official rate
            None => self.buy_rate(record),
        }
    }
}

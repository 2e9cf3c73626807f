//! The exchange rate entity

use super::observer::{ObserverId, ObserverSet, RateObserver};
use super::types::{RateRecord, RateSnapshot};
use crate::error::{Error, ObserverFailure, Result};
use crate::pipeline::RateSource;
use crate::registry::Registry;
use crate::types::{CurrencyCode, SourceId};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// Current quotation of one currency pair from one source
///
/// The pair and the source are fixed at construction. Rates change through
/// [`update`](Self::update) and [`refresh`](Self::refresh), which notify the
/// attached observers.
pub struct ExchangeRate {
    source: Arc<RateSource>,
    base: CurrencyCode,
    destination: CurrencyCode,
    buy: f64,
    sale: f64,
    observed_at: DateTime<Utc>,
    observers: ObserverSet,
}

impl ExchangeRate {
    /// Construct with explicit rates, without touching the network
    ///
    /// Codes and rates are validated before any observer sees the entity.
    /// `created` is then delivered to every observer; if any of them fails
    /// the entity is dropped and the failures are returned.
    pub fn new(
        source: Arc<RateSource>,
        base: &str,
        destination: &str,
        buy: f64,
        sale: f64,
        observed_at: Option<DateTime<Utc>>,
        observers: ObserverSet,
    ) -> Result<Self> {
        let base = CurrencyCode::new(base)?;
        let destination = CurrencyCode::new(destination)?;
        validate_rate("buy rate", buy)?;
        validate_rate("sale rate", sale)?;

        let rate = Self {
            source,
            base,
            destination,
            buy,
            sale,
            observed_at: observed_at.unwrap_or_else(Utc::now),
            observers,
        };

        let current = rate.snapshot();
        let failures = rate
            .observers
            .notify("created", |observer| observer.on_created(&current));
        into_result(failures)?;

        debug!(source = %rate.source.id(), pair = %rate.pair(), "Rate created");
        Ok(rate)
    }

    /// Construct from the latest quotation published by `source`
    pub async fn fetch(
        source: Arc<RateSource>,
        base: &str,
        destination: &str,
        observers: ObserverSet,
    ) -> Result<Self> {
        CurrencyCode::new(base)?;
        CurrencyCode::new(destination)?;

        let tuple = source.find_rate(base, destination, None).await?;
        Self::new(
            source,
            base,
            destination,
            tuple.buy,
            tuple.sale,
            None,
            observers,
        )
    }

    /// Restore an entity from its record, resolving ids through `registry`
    pub fn from_record(record: RateRecord, registry: &Registry) -> Result<Self> {
        let source = registry.source(&record.source)?;
        let mut observers = ObserverSet::new();
        for id in record.observers {
            let observer = registry.observer(&id)?;
            observers.attach(id, observer);
        }

        Self::new(
            source,
            record.base.as_str(),
            record.destination.as_str(),
            record.buy,
            record.sale,
            Some(record.observed_at),
            observers,
        )
    }

    /// Serialisable form of this entity
    pub fn to_record(&self) -> RateRecord {
        RateRecord {
            source: self.source.id().clone(),
            base: self.base.clone(),
            destination: self.destination.clone(),
            buy: self.buy,
            sale: self.sale,
            observed_at: self.observed_at,
            observers: self.observers.ids(),
        }
    }

    /// Value copy of the current quotation
    pub fn snapshot(&self) -> RateSnapshot {
        RateSnapshot {
            source: self.source.id().clone(),
            base: self.base.clone(),
            destination: self.destination.clone(),
            buy: self.buy,
            sale: self.sale,
            observed_at: self.observed_at,
        }
    }

    /// Store new rates and notify observers
    ///
    /// `updated` is always delivered; `changed` follows when either rate
    /// moved by at least `f64::EPSILON`. Observer failures are reported
    /// after the new rates are stored and every observer has run.
    pub fn update(
        &mut self,
        buy: f64,
        sale: f64,
        observed_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        validate_rate("buy rate", buy)?;
        validate_rate("sale rate", sale)?;

        let previous = self.snapshot();
        self.buy = buy;
        self.sale = sale;
        self.observed_at = observed_at.unwrap_or_else(Utc::now);
        let current = self.snapshot();

        let mut failures = self
            .observers
            .notify("updated", |observer| observer.on_updated(&previous, &current));

        let changed = current.differs_from(&previous);
        if changed {
            failures.extend(
                self.observers
                    .notify("changed", |observer| observer.on_changed(&previous, &current)),
            );
        }

        debug!(
            source = %self.source.id(),
            pair = %self.pair(),
            buy,
            sale,
            changed,
            "Rate updated"
        );
        into_result(failures)
    }

    /// Fetch the latest quotation from the source and apply it
    ///
    /// On any fetch or extraction error the entity is left untouched.
    pub async fn refresh(&mut self) -> Result<()> {
        let tuple = self
            .source
            .find_rate(self.base.as_str(), self.destination.as_str(), None)
            .await?;
        self.update(tuple.buy, tuple.sale, None)
    }

    /// Attach an observer, replacing one already attached under `id`
    pub fn attach(&mut self, id: impl Into<ObserverId>, observer: Arc<dyn RateObserver>) {
        self.observers.attach(id.into(), observer);
    }

    /// Attach several observers in order
    pub fn attach_all<I, K>(&mut self, observers: I)
    where
        I: IntoIterator<Item = (K, Arc<dyn RateObserver>)>,
        K: Into<ObserverId>,
    {
        for (id, observer) in observers {
            self.attach(id, observer);
        }
    }

    /// Detach an observer; unknown ids are ignored
    pub fn detach(&mut self, id: impl Into<ObserverId>) {
        self.observers.detach(&id.into());
    }

    /// Detach every observer
    pub fn detach_all(&mut self) {
        self.observers.clear();
    }

    /// Attached observer ids in attachment order
    pub fn observer_ids(&self) -> Vec<ObserverId> {
        self.observers.ids()
    }

    /// Source this entity refreshes from
    pub fn source(&self) -> &Arc<RateSource> {
        &self.source
    }

    /// Id of the source
    pub fn source_id(&self) -> &SourceId {
        self.source.id()
    }

    /// Base currency
    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    /// Destination currency
    pub fn destination(&self) -> &CurrencyCode {
        &self.destination
    }

    /// Current buy rate
    pub fn buy(&self) -> f64 {
        self.buy
    }

    /// Current sale rate
    pub fn sale(&self) -> f64 {
        self.sale
    }

    /// When the current rates were observed
    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    fn pair(&self) -> String {
        format!("{}/{}", self.base, self.destination)
    }
}

impl std::fmt::Debug for ExchangeRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeRate")
            .field("source", self.source.id())
            .field("base", &self.base)
            .field("destination", &self.destination)
            .field("buy", &self.buy)
            .field("sale", &self.sale)
            .field("observed_at", &self.observed_at)
            .field("observers", &self.observers)
            .finish()
    }
}

fn validate_rate(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidRate { field, value })
    }
}

fn into_result(failures: Vec<ObserverFailure>) -> Result<()> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(Error::Observers { failures })
    }
}

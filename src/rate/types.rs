//! Rate entity value types

use super::observer::ObserverId;
use crate::types::{CurrencyCode, SourceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable copy of an entity's quotation at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    /// Source the quotation came from
    pub source: SourceId,
    /// Base currency
    pub base: CurrencyCode,
    /// Destination currency
    pub destination: CurrencyCode,
    /// Buy rate
    pub buy: f64,
    /// Sale rate
    pub sale: f64,
    /// When the quotation was observed
    pub observed_at: DateTime<Utc>,
}

impl RateSnapshot {
    /// Whether either rate moved by at least `f64::EPSILON` relative to `previous`
    pub fn differs_from(&self, previous: &RateSnapshot) -> bool {
        !((self.buy - previous.buy).abs() < f64::EPSILON)
            || !((self.sale - previous.sale).abs() < f64::EPSILON)
    }
}

/// Serialisable form of an entity: its snapshot plus attached observer ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    /// Source id, resolved through a registry on restore
    pub source: SourceId,
    /// Base currency
    pub base: CurrencyCode,
    /// Destination currency
    pub destination: CurrencyCode,
    /// Buy rate
    pub buy: f64,
    /// Sale rate
    pub sale: f64,
    /// When the quotation was observed
    pub observed_at: DateTime<Utc>,
    /// Attached observers, in attachment order
    #[serde(default)]
    pub observers: Vec<ObserverId>,
}

//! Rate entity
//!
//! A mutable record of one currency pair's current quotation with change
//! detection and observer notification.
//!
//! # Overview
//!
//! The rate module provides:
//! - `ExchangeRate` - The entity: construct, update, refresh, serialise
//! - `RateObserver` - Callbacks for `created`, `updated` and `changed`
//! - `ObserverSet` - Ordered, id-keyed observer collection
//! - `RateSnapshot` / `RateRecord` - Value copies for observers and storage

mod entity;
mod observer;
mod types;

pub use entity::ExchangeRate;
pub use observer::{LogObserver, ObserverId, ObserverSet, RateObserver};
pub use types::{RateRecord, RateSnapshot};

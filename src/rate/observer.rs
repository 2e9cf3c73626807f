//! Observer protocol
//!
//! Observers are attached to an entity under an [`ObserverId`] and receive
//! `created`, `updated` and `changed` events in attachment order.

use super::types::RateSnapshot;
use crate::error::ObserverFailure;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Receives rate entity events
///
/// Every callback defaults to a no-op. Errors do not stop delivery to the
/// remaining observers.
pub trait RateObserver: Send + Sync {
    /// The entity was constructed
    fn on_created(&self, _current: &RateSnapshot) -> anyhow::Result<()> {
        Ok(())
    }

    /// The entity received new rates, changed or not
    fn on_updated(&self, _previous: &RateSnapshot, _current: &RateSnapshot) -> anyhow::Result<()> {
        Ok(())
    }

    /// The entity received rates that differ from the previous ones
    fn on_changed(&self, _previous: &RateSnapshot, _current: &RateSnapshot) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Identity an observer is attached under
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObserverId(String);

impl ObserverId {
    /// Create an observer id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObserverId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ObserverId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Ordered set of observers keyed by id
///
/// Attaching an existing id replaces the observer in place.
#[derive(Clone, Default)]
pub struct ObserverSet {
    entries: Vec<(ObserverId, Arc<dyn RateObserver>)>,
}

impl ObserverSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an observer, replacing any observer with the same id
    pub fn attach(&mut self, id: ObserverId, observer: Arc<dyn RateObserver>) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some(entry) => entry.1 = observer,
            None => self.entries.push((id, observer)),
        }
    }

    /// Detach an observer; unknown ids are ignored
    pub fn detach(&mut self, id: &ObserverId) {
        self.entries.retain(|(existing, _)| existing != id);
    }

    /// Detach every observer
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Attached ids in attachment order
    pub fn ids(&self) -> Vec<ObserverId> {
        self.entries.iter().map(|(id, _)| id.clone()).collect()
    }

    /// Check whether an id is attached
    pub fn contains(&self, id: &ObserverId) -> bool {
        self.entries.iter().any(|(existing, _)| existing == id)
    }

    /// Number of attached observers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether no observer is attached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deliver one event to every observer, collecting failures
    pub(crate) fn notify<F>(&self, event: &'static str, deliver: F) -> Vec<ObserverFailure>
    where
        F: Fn(&dyn RateObserver) -> anyhow::Result<()>,
    {
        self.entries
            .iter()
            .filter_map(|(id, observer)| {
                deliver(observer.as_ref()).err().map(|e| ObserverFailure {
                    observer: id.to_string(),
                    event,
                    message: format!("{e:#}"),
                })
            })
            .collect()
    }
}

impl fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(id, _)| id))
            .finish()
    }
}

impl<I: Into<ObserverId>> FromIterator<(I, Arc<dyn RateObserver>)> for ObserverSet {
    fn from_iter<T: IntoIterator<Item = (I, Arc<dyn RateObserver>)>>(iter: T) -> Self {
        let mut set = Self::new();
        for (id, observer) in iter {
            set.attach(id.into(), observer);
        }
        set
    }
}

/// Observer that writes rate changes to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl RateObserver for LogObserver {
    fn on_created(&self, current: &RateSnapshot) -> anyhow::Result<()> {
        info!(
            source = %current.source,
            pair = %format_args!("{}/{}", current.base, current.destination),
            buy = current.buy,
            sale = current.sale,
            "Rate created"
        );
        Ok(())
    }

    fn on_changed(&self, previous: &RateSnapshot, current: &RateSnapshot) -> anyhow::Result<()> {
        info!(
            source = %current.source,
            pair = %format_args!("{}/{}", current.base, current.destination),
            previous_buy = previous.buy,
            previous_sale = previous.sale,
            buy = current.buy,
            sale = current.sale,
            "Rate changed"
        );
        Ok(())
    }
}

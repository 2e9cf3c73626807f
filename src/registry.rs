//! Source and observer registry
//!
//! Maps stable ids to factories so that entities can be restored from a
//! [`RateRecord`](crate::rate::RateRecord). The built-in source definitions
//! are embedded in the binary, allowing `rates nbu` instead of a file path.

use crate::error::{Error, Result};
use crate::loader::{load_source_from_str, validate_source, SourceDefinition};
use crate::pipeline::RateSource;
use crate::rate::{LogObserver, ObserverId, RateObserver};
use crate::types::SourceId;
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

/// Built-in source YAML definitions
pub static BUILTIN_SOURCES: LazyLock<BTreeMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        let mut m = BTreeMap::new();

        // JSON APIs
        m.insert("privatbank", include_str!("../sources/privatbank.yaml"));

        // Regulator
        m.insert("nbu", include_str!("../sources/nbu.yaml"));

        // Bank websites
        m.insert("oschadbank", include_str!("../sources/oschadbank.yaml"));
        m.insert("ukrgasbank", include_str!("../sources/ukrgasbank.yaml"));
        m.insert("ukrsibbank", include_str!("../sources/ukrsibbank.yaml"));

        m
    });

/// Id of the built-in logging observer
pub const LOG_OBSERVER: &str = "log";

/// Get a built-in source definition by name
pub fn builtin_yaml(name: &str) -> Option<&'static str> {
    BUILTIN_SOURCES.get(name).copied()
}

/// Check if a name is a built-in source
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_SOURCES.contains_key(name)
}

/// List all built-in source names
pub fn builtin_names() -> Vec<&'static str> {
    BUILTIN_SOURCES.keys().copied().collect()
}

/// Builds a fresh source
pub type SourceFactory = Arc<dyn Fn() -> Result<RateSource> + Send + Sync>;

/// Builds an observer
pub type ObserverFactory = Arc<dyn Fn() -> Arc<dyn RateObserver> + Send + Sync>;

/// Explicit id → factory maps for sources and observers
#[derive(Clone, Default)]
pub struct Registry {
    sources: BTreeMap<SourceId, SourceFactory>,
    observers: BTreeMap<ObserverId, ObserverFactory>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in sources and the log observer
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for (name, yaml) in BUILTIN_SOURCES.iter() {
            let Ok(id) = SourceId::new(*name) else {
                continue;
            };
            let yaml: &'static str = *yaml;
            registry.register_source(id, move || {
                RateSource::from_definition(&load_source_from_str(yaml)?)
            });
        }
        registry.register_observer(LOG_OBSERVER, || Arc::new(LogObserver) as Arc<dyn RateObserver>);
        registry
    }

    /// Register a source factory, replacing any factory under the same id
    pub fn register_source<F>(&mut self, id: SourceId, factory: F) -> &mut Self
    where
        F: Fn() -> Result<RateSource> + Send + Sync + 'static,
    {
        self.sources.insert(id, Arc::new(factory));
        self
    }

    /// Register a source definition; it is validated now and built on demand
    pub fn register_definition(&mut self, def: SourceDefinition) -> Result<&mut Self> {
        validate_source(&def)?;
        let id = SourceId::new(&def.name)?;
        Ok(self.register_source(id, move || RateSource::from_definition(&def)))
    }

    /// Register an observer factory, replacing any factory under the same id
    pub fn register_observer<F>(&mut self, id: impl Into<ObserverId>, factory: F) -> &mut Self
    where
        F: Fn() -> Arc<dyn RateObserver> + Send + Sync + 'static,
    {
        self.observers.insert(id.into(), Arc::new(factory));
        self
    }

    /// Build the source registered under `id`
    pub fn source(&self, id: &SourceId) -> Result<Arc<RateSource>> {
        let factory = self.sources.get(id).ok_or_else(|| {
            Error::config(format!(
                "Unknown source '{id}'. Registered sources: {}",
                join(self.sources.keys())
            ))
        })?;
        factory().map(Arc::new)
    }

    /// Build the observer registered under `id`
    pub fn observer(&self, id: &ObserverId) -> Result<Arc<dyn RateObserver>> {
        let factory = self.observers.get(id).ok_or_else(|| {
            Error::config(format!(
                "Unknown observer '{id}'. Registered observers: {}",
                join(self.observers.keys())
            ))
        })?;
        Ok(factory())
    }

    /// Check whether a source id is registered
    pub fn has_source(&self, id: &SourceId) -> bool {
        self.sources.contains_key(id)
    }

    /// Registered source ids, sorted
    pub fn source_ids(&self) -> Vec<SourceId> {
        self.sources.keys().cloned().collect()
    }

    /// Registered observer ids, sorted
    pub fn observer_ids(&self) -> Vec<ObserverId> {
        self.observers.keys().cloned().collect()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("sources", &self.sources.keys().collect::<Vec<_>>())
            .field("observers", &self.observers.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn join<T: std::fmt::Display>(ids: impl Iterator<Item = T>) -> String {
    ids.map(|id| id.to_string()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::StaticTransport;

    #[test]
    fn test_builtin_sources_exist() {
        for name in ["privatbank", "nbu", "oschadbank", "ukrgasbank", "ukrsibbank"] {
            assert!(is_builtin(name), "missing {name}");
        }
        assert!(!is_builtin("stripe"));
        assert_eq!(builtin_names().len(), 5);
    }

    #[test]
    fn test_builtin_sources_are_valid() {
        for (name, yaml) in BUILTIN_SOURCES.iter() {
            let def = load_source_from_str(yaml)
                .unwrap_or_else(|e| panic!("{name} failed to load: {e}"));
            assert_eq!(def.name, *name);
        }
    }

    #[test]
    fn test_with_builtin_builds_sources() {
        let registry = Registry::with_builtin();
        let source = registry.source(&SourceId::new("nbu").unwrap()).unwrap();
        assert_eq!(source.id().as_str(), "nbu");
        assert_eq!(source.title(), "National Bank of Ukraine");
        assert!(source.origin().starts_with("https://bank.gov.ua/"));

        assert!(registry
            .observer(&ObserverId::from(LOG_OBSERVER))
            .is_ok());
    }

    #[test]
    fn test_unknown_ids_are_config_errors() {
        let registry = Registry::with_builtin();

        let err = registry
            .source(&SourceId::new("monobank").unwrap())
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
        assert!(err.to_string().contains("nbu"));

        let Err(err) = registry.observer(&ObserverId::from("mailer")) else {
            panic!("expected an error");
        };
        assert!(err.to_string().contains("Unknown observer 'mailer'"));
    }

    #[test]
    fn test_register_source_replaces() {
        let mut registry = Registry::new();
        let id = SourceId::new("privatbank").unwrap();
        registry.register_source(id.clone(), || {
            let def = load_source_from_str(builtin_yaml("privatbank").unwrap())?;
            RateSource::from_definition_with_transport(&def, Arc::new(StaticTransport::new("[]")))
        });
        registry.register_source(id.clone(), || {
            let def = load_source_from_str(builtin_yaml("privatbank").unwrap())?;
            RateSource::from_definition_with_transport(
                &def,
                Arc::new(StaticTransport::new("[]").with_origin("replaced")),
            )
        });

        assert_eq!(registry.source_ids(), vec![id.clone()]);
        assert_eq!(registry.source(&id).unwrap().origin(), "replaced");
    }

    #[test]
    fn test_registered_source_is_fresh_per_call() {
        let mut registry = Registry::new();
        let id = SourceId::new("privatbank").unwrap();
        registry.register_source(id.clone(), || {
            let def = load_source_from_str(builtin_yaml("privatbank").unwrap())?;
            RateSource::from_definition_with_transport(
                &def,
                Arc::new(StaticTransport::new(
                    r#"[{"ccy": "USD", "base_ccy": "UAH", "buy": "27.5", "sale": "27.8"}]"#,
                )),
            )
        });

        let first = registry.source(&id).unwrap();
        let second = registry.source(&id).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        let rates = tokio_test::block_on(first.produce_rates(None));
        let rates = tokio_test::assert_ok!(rates);
        assert_eq!(rates.len(), 1);
        assert!(rates[0].is_pair("UAH", "USD"));
    }

    #[test]
    fn test_register_definition_validates() {
        let mut def = load_source_from_str(builtin_yaml("ukrsibbank").unwrap()).unwrap();
        def.name = "Not A Slug".to_string();

        let mut registry = Registry::new();
        assert!(registry.register_definition(def).is_err());
        assert!(registry.source_ids().is_empty());
    }
}

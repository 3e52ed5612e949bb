//! Source name → adapter lookup.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{AdapterConfig, Config, SourceConfig};
use crate::services::{CrawledAdapter, EnumeratedAdapter, SourceAdapter};

/// Adapters keyed by source name.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: BTreeMap<String, Arc<dyn SourceAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one adapter per configured source.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut registry = Self::new();
        for source in &config.sources {
            registry.register(build_adapter(source)?);
        }
        Ok(registry)
    }

    /// Add or replace an adapter under its own name.
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) {
        self.adapters.insert(adapter.name().to_string(), adapter);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn SourceAdapter>> {
        self.adapters
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::UnknownSource(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }
}

/// Instantiate the adapter variant a source is configured with.
pub fn build_adapter(source: &SourceConfig) -> Result<Arc<dyn SourceAdapter>> {
    let volatile = source.compiled_volatile_patterns()?;
    let adapter: Arc<dyn SourceAdapter> = match &source.adapter {
        AdapterConfig::Enumerated(cfg) => {
            Arc::new(EnumeratedAdapter::new(&source.name, cfg, volatile)?)
        }
        AdapterConfig::Crawled(cfg) => Arc::new(CrawledAdapter::new(&source.name, cfg, volatile)?),
    };
    Ok(adapter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sources_are_registered() {
        let registry = AdapterRegistry::from_config(&Config::default()).unwrap();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(
            names,
            vec!["binance", "bybit", "coinbase", "deribit", "hyperliquid", "kraken", "okx"]
        );
        assert_eq!(registry.get("okx").unwrap().name(), "okx");
        assert!(
            !registry
                .get("hyperliquid")
                .unwrap()
                .volatile_patterns()
                .is_empty()
        );
    }

    #[test]
    fn test_unknown_source() {
        let registry = AdapterRegistry::new();
        assert!(matches!(
            registry.get("nope"),
            Err(AppError::UnknownSource(_))
        ));
    }
}

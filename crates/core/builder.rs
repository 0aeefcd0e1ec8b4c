//! Store builder for flexible configuration
//!
//! Wires a [`Store`] and a [`Config`] into a [`GeoStore`].

use crate::config::Config;
use crate::db::GeoStore;
use crate::error::{GeoTileError, Result};
use crate::storage::{MemoryStore, Store};
use std::sync::Arc;

/// Builder for a [`GeoStore`] with custom configuration and backing store.
#[derive(Debug)]
pub struct GeoStoreBuilder<S: Store = MemoryStore> {
    store: Option<Arc<S>>,
    config: Config,
}

impl GeoStoreBuilder<MemoryStore> {
    /// Create a new builder with default configuration over an in-memory store.
    pub fn new() -> Self {
        Self {
            store: None,
            config: Config::default(),
        }
    }
}

impl<S: Store> GeoStoreBuilder<S> {
    /// Use `store` as the backing store.
    pub fn store<T: Store>(self, store: Arc<T>) -> GeoStoreBuilder<T> {
        GeoStoreBuilder {
            store: Some(store),
            config: self.config,
        }
    }

    /// Set the configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Limit the number of tiles a single item may cover.
    pub fn max_item_index_size(mut self, size: usize) -> Self {
        self.config = self.config.with_max_item_index_size(size);
        self
    }

    /// Set the number of records per store batch call.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config = self.config.with_batch_size(size);
        self
    }
}

impl<S: Store + Default> GeoStoreBuilder<S> {
    /// Build the store. Without an explicit store, a default one is created.
    pub fn build(self) -> Result<GeoStore<S>> {
        self.config
            .validate()
            .map_err(GeoTileError::InvalidInput)?;
        let store = self.store.unwrap_or_default();
        GeoStore::new(store, self.config)
    }
}

impl<S: Store> GeoStoreBuilder<S> {
    /// Build over the store given to [`GeoStoreBuilder::store`].
    pub fn build_with_store(self) -> Result<GeoStore<S>> {
        let Some(store) = self.store else {
            return Err(GeoTileError::InvalidInput(
                "No backing store configured".to_string(),
            ));
        };
        GeoStore::new(store, self.config)
    }
}

impl Default for GeoStoreBuilder<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geotile_types::NewDomain;

    #[test]
    fn test_builder_default() {
        let builder = GeoStoreBuilder::new();
        assert!(builder.store.is_none());
        let db = builder.build().unwrap();
        assert_eq!(db.config(), &Config::default());
    }

    #[test]
    fn test_builder_custom_config() {
        let db = GeoStoreBuilder::new()
            .max_item_index_size(10)
            .batch_size(5)
            .build()
            .unwrap();
        assert_eq!(db.config().max_item_index_size, 10);
        assert_eq!(db.config().batch_size, 5);
    }

    #[test]
    fn test_builder_with_store() {
        let store = Arc::new(MemoryStore::new().with_max_batch_size(3));
        let db = GeoStoreBuilder::new()
            .store(Arc::clone(&store))
            .build_with_store()
            .unwrap();

        db.create_domain("alice", "parks", NewDomain::new("Parks", 8))
            .unwrap();
        assert_eq!(store.stats().unwrap().record_count, 1);
    }

    #[test]
    fn test_build_without_store_fails() {
        assert!(GeoStoreBuilder::new().build_with_store().is_err());
    }

    #[test]
    fn test_invalid_buffer_rejected() {
        let config = Config::default().with_point_buffer_km(-1.0);
        assert!(GeoStoreBuilder::new().config(config).build().is_err());
    }
}

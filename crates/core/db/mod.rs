//! The feature store service.
//!
//! `GeoStore` owns no mutable state: every operation reads and writes through
//! the shared [`Store`], and all coordination between concurrent callers goes
//! through the store's conditional writes.

use crate::builder::GeoStoreBuilder;
use crate::config::Config;
use crate::error::Result;
use crate::storage::{MemoryStore, StorageStats, Store};
use std::sync::Arc;

mod domains;
mod items;
pub mod keys;
mod maintainer;
mod query;
mod versioned;

/// Multi-tenant store of GeoJSON items with a Morton tile index per domain.
pub struct GeoStore<S: Store = MemoryStore> {
    pub(crate) store: Arc<S>,
    pub(crate) config: Config,
}

impl<S: Store> Clone for GeoStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl GeoStore<MemoryStore> {
    /// Create a store backed by a fresh in-memory store with default configuration.
    pub fn memory() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            config: Config::default(),
        }
    }

    pub fn builder() -> GeoStoreBuilder {
        GeoStoreBuilder::new()
    }
}

impl<S: Store> GeoStore<S> {
    /// Wrap an existing store.
    pub fn new(store: Arc<S>, config: Config) -> Result<Self> {
        config
            .validate()
            .map_err(crate::error::GeoTileError::InvalidInput)?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn stats(&self) -> Result<StorageStats> {
        Ok(self.store.stats()?)
    }

    /// Records per batch call: the configured size, capped by the store's ceiling.
    pub(crate) fn batch_size(&self) -> usize {
        self.config.batch_size.min(self.store.max_batch_size()).max(1)
    }
}

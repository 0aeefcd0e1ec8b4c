//! Item lifecycle.
//!
//! Item writes touch three places that the store cannot change atomically:
//! the item record, the domain counters and the item's index records. They
//! are written in that order, and a failure stops the sequence where it is.
//!
//! Each item record stores the number of tiles it adds to `indexSize`, so the
//! counters always describe item records. Index records may lag behind after
//! a failed batch; `reindex_item` catches them up.

use super::GeoStore;
use super::keys::{self, ITEM_PREFIX, Model, TILE_COUNT_ATTR};
use super::versioned::{create_unique, delete_versioned, update_versioned};
use crate::compute::footprint::{build_footprint, diff};
use crate::compute::geojson::to_geo;
use crate::compute::validation::validate_feature_type;
use crate::error::{GeoTileError, Result};
use crate::storage::{Document, SortRange, Store, UpdateExpr};
use geotile_types::{Item, ItemCollection, ItemUpdate, NewItem, QueryEcho};
use serde_json::Value;
use uuid::Uuid;

impl<S: Store> GeoStore<S> {
    /// Store a new feature in a domain and index its footprint.
    pub fn create_item(&self, user: &str, domain_id: &str, request: NewItem) -> Result<Item> {
        let domain = self.owned_domain(user, domain_id)?;
        validate_feature_type(&request.kind)?;
        let Some(geometry) = request.geometry else {
            return Err(GeoTileError::InvalidInput(
                "Item geometry is required".to_string(),
            ));
        };

        let shape = to_geo(&geometry)?;
        let footprint = build_footprint(&shape, domain.zoom, self.config.max_item_index_size)?;

        let item = Item {
            domain_id: domain_id.to_string(),
            item_id: Uuid::new_v4().to_string(),
            kind: request.kind,
            properties: request.properties,
            geometry,
            version: 1,
        };
        let tiles: Vec<_> = footprint.iter().copied().collect();
        let key = keys::item_key(domain_id, &item.item_id);
        let mut doc = keys::to_document(&item, &key, Model::Item)?;
        doc.insert(TILE_COUNT_ATTR.to_string(), Value::from(tiles.len()));
        create_unique(self.store.as_ref(), doc, &format!("Item {}", item.item_id))?;

        if let Err(e) = self.adjust_counters(domain_id, 1, tiles.len() as i64) {
            if let Err(undo) = self.store.delete(&key, None) {
                log::error!(
                    "Failed to remove uncounted item {} from {}: {}",
                    item.item_id,
                    domain_id,
                    undo
                );
            }
            return Err(e);
        }
        self.write_tiles(&domain, &item.item_id, &tiles)?;

        log::debug!(
            "Created item {} in {} with {} tiles",
            item.item_id,
            domain_id,
            tiles.len()
        );
        Ok(item)
    }

    pub fn get_item(&self, user: Option<&str>, domain_id: &str, item_id: &str) -> Result<Item> {
        self.readable_domain(user, domain_id)?;
        match self.store.get(&keys::item_key(domain_id, item_id))? {
            Some(doc) => keys::from_document(doc),
            None => Err(item_not_found(domain_id, item_id)),
        }
    }

    /// Every item in a domain.
    pub fn list_items(&self, user: Option<&str>, domain_id: &str) -> Result<ItemCollection> {
        self.readable_domain(user, domain_id)?;
        let docs = self
            .store
            .query_partition(domain_id, &SortRange::Prefix(ITEM_PREFIX.to_string()))?;
        let items = docs
            .into_iter()
            .map(keys::from_document)
            .collect::<Result<Vec<Item>>>()?;
        Ok(ItemCollection::new(QueryEcho::domain(domain_id), items))
    }

    /// Update an item's properties and/or geometry at `request.version`.
    ///
    /// A new geometry is diffed against the stored footprint, and only the
    /// tiles that changed are written or removed. `indexSize` moves by the
    /// difference between the new footprint and the one the record counted.
    pub fn update_item(
        &self,
        user: &str,
        domain_id: &str,
        item_id: &str,
        request: ItemUpdate,
    ) -> Result<Item> {
        let domain = self.owned_domain(user, domain_id)?;
        validate_feature_type(&request.kind)?;

        let mut update = UpdateExpr::new();
        if let Some(properties) = request.properties {
            update = update.set("properties", Value::Object(properties));
        }

        let key = keys::item_key(domain_id, item_id);
        let changes = match &request.geometry {
            Some(geometry) => {
                let shape = to_geo(geometry)?;
                let max = self.config.max_item_index_size;
                let new = build_footprint(&shape, domain.zoom, max)?;
                let old = self.stored_footprint(domain_id, item_id)?;
                let changes = diff(&old, &new);
                if changes.size_delta() > max as i64 {
                    return Err(GeoTileError::FootprintTooLarge {
                        size: new.len(),
                        max,
                    });
                }

                // The version condition below only passes if this is still the
                // record being replaced.
                let Some(current) = self.store.get(&key)? else {
                    return Err(item_not_found(domain_id, item_id));
                };
                let counted = counted_tiles(&current, old.len());

                update = update
                    .set("geometry", serde_json::to_value(geometry)?)
                    .set(TILE_COUNT_ATTR, Value::from(new.len()));
                Some((changes, new.len() as i64 - counted))
            }
            None => None,
        };

        let doc = update_versioned(
            self.store.as_ref(),
            &key,
            request.version,
            update,
            None,
            &format!("Item {}", item_id),
        )?;

        if let Some((changes, delta)) = changes {
            self.adjust_counters(domain_id, 0, delta)?;
            self.apply_diff(&domain, item_id, &changes)?;
        }

        keys::from_document(doc)
    }

    /// Delete an item and its index records.
    ///
    /// With `expected_version`, the item record is only deleted at that version.
    /// An item without index records is reported as not found. Only the call
    /// that removes the item record adjusts the domain counters; index records
    /// whose item is already gone are cleaned up and reported as not found.
    pub fn delete_item(
        &self,
        user: &str,
        domain_id: &str,
        item_id: &str,
        expected_version: Option<u64>,
    ) -> Result<()> {
        self.owned_domain(user, domain_id)?;

        let footprint = self.stored_footprint(domain_id, item_id)?;
        if footprint.is_empty() {
            return Err(item_not_found(domain_id, item_id));
        }
        let tiles: Vec<_> = footprint.iter().copied().collect();

        let removed = match delete_versioned(
            self.store.as_ref(),
            &keys::item_key(domain_id, item_id),
            expected_version,
            &format!("Item {}", item_id),
        ) {
            Ok(doc) => doc,
            Err(e) if e.is_not_found() => {
                log::debug!(
                    "Removing {} index records of deleted item {} in {}",
                    tiles.len(),
                    item_id,
                    domain_id
                );
                self.remove_tiles(domain_id, item_id, &tiles)?;
                return Err(item_not_found(domain_id, item_id));
            }
            Err(e) => return Err(e),
        };

        self.adjust_counters(domain_id, -1, -counted_tiles(&removed, tiles.len()))?;
        self.remove_tiles(domain_id, item_id, &tiles)?;

        log::debug!(
            "Deleted item {} from {} ({} tiles)",
            item_id,
            domain_id,
            tiles.len()
        );
        Ok(())
    }
}

/// The tiles an item record counts toward `indexSize`. Records written
/// without the attribute count their stored index records.
fn counted_tiles(doc: &Document, stored: usize) -> i64 {
    doc.get(TILE_COUNT_ATTR)
        .and_then(Value::as_i64)
        .unwrap_or(stored as i64)
}

fn item_not_found(domain_id: &str, item_id: &str) -> GeoTileError {
    GeoTileError::NotFound(format!(
        "Item {} not found in domain {}",
        item_id, domain_id
    ))
}

//! Keeps the tile index in step with item geometry.
//!
//! Index records are written and removed in store-sized batches. Batches are
//! independent: a failure part way leaves the earlier batches applied, is
//! logged, and is returned to the caller. `reindex_item` brings such an item
//! back in line with its geometry.

use super::GeoStore;
use super::keys::{self, INDEX_SIZE_ATTR, ITEM_COUNT_ATTR, Model};
use crate::compute::footprint::{Footprint, FootprintDiff, build_footprint, diff};
use crate::compute::geojson::to_geo;
use crate::error::{GeoTileError, Result};
use crate::storage::{Condition, SortRange, Store, StoreError, UpdateExpr, WriteRequest};
use geotile_types::index::owner_key;
use geotile_types::{Domain, IndexRecord, Item, TileKey};

impl<S: Store> GeoStore<S> {
    /// Recompute an item's footprint from its stored geometry and rewrite the
    /// index records to match.
    ///
    /// Domain counters are left alone: they follow item records, which are
    /// counted before their index batches run. Returns the changes applied;
    /// running it again returns an empty diff.
    pub fn reindex_item(&self, user: &str, domain_id: &str, item_id: &str) -> Result<FootprintDiff> {
        let domain = self.owned_domain(user, domain_id)?;
        let item: Item = match self.store.get(&keys::item_key(domain_id, item_id))? {
            Some(doc) => keys::from_document(doc)?,
            None => {
                return Err(GeoTileError::NotFound(format!(
                    "Item {} not found in domain {}",
                    item_id, domain_id
                )));
            }
        };

        let geometry = to_geo(&item.geometry)?;
        let expected = build_footprint(&geometry, domain.zoom, self.config.max_item_index_size)?;
        let stored = self.stored_footprint(domain_id, item_id)?;
        let changes = diff(&stored, &expected);

        if changes.is_empty() {
            log::debug!("Index of {} is current", owner_key(domain_id, item_id));
            return Ok(changes);
        }

        self.apply_diff(&domain, item_id, &changes)?;
        log::info!(
            "Reindexed {}: {} tiles added, {} removed",
            owner_key(domain_id, item_id),
            changes.to_add.len(),
            changes.to_remove.len()
        );
        Ok(changes)
    }

    /// The index records currently stored for an item.
    pub fn item_footprint(
        &self,
        user: Option<&str>,
        domain_id: &str,
        item_id: &str,
    ) -> Result<Footprint> {
        self.readable_domain(user, domain_id)?;
        self.stored_footprint(domain_id, item_id)
    }

    pub(crate) fn stored_footprint(&self, domain_id: &str, item_id: &str) -> Result<Footprint> {
        let docs = self
            .store
            .query_partition(&owner_key(domain_id, item_id), &SortRange::All)?;
        docs.into_iter()
            .map(|doc| keys::from_document::<IndexRecord>(doc).map(|r| r.tile()))
            .collect()
    }

    pub(crate) fn write_tiles(&self, domain: &Domain, item_id: &str, tiles: &[TileKey]) -> Result<()> {
        let requests = tiles
            .iter()
            .map(|tile| self.put_request(domain, item_id, *tile))
            .collect::<Result<Vec<_>>>()?;
        self.run_batches(&domain.domain_id, item_id, &requests)
    }

    pub(crate) fn remove_tiles(&self, domain_id: &str, item_id: &str, tiles: &[TileKey]) -> Result<()> {
        let requests: Vec<WriteRequest> = tiles
            .iter()
            .map(|tile| WriteRequest::Delete(keys::tile_key(domain_id, item_id, tile.morton)))
            .collect();
        self.run_batches(domain_id, item_id, &requests)
    }

    /// Removes first, then puts.
    pub(crate) fn apply_diff(&self, domain: &Domain, item_id: &str, changes: &FootprintDiff) -> Result<()> {
        let mut requests: Vec<WriteRequest> = changes
            .to_remove
            .iter()
            .map(|tile| WriteRequest::Delete(keys::tile_key(&domain.domain_id, item_id, tile.morton)))
            .collect();
        for tile in &changes.to_add {
            requests.push(self.put_request(domain, item_id, *tile)?);
        }
        log::debug!(
            "Applying index diff for {}: +{} -{}",
            owner_key(&domain.domain_id, item_id),
            changes.to_add.len(),
            changes.to_remove.len()
        );
        self.run_batches(&domain.domain_id, item_id, &requests)
    }

    /// Add `items` to `itemCount` and `tiles` to `indexSize`.
    pub(crate) fn adjust_counters(&self, domain_id: &str, items: i64, tiles: i64) -> Result<()> {
        if items == 0 && tiles == 0 {
            return Ok(());
        }

        let mut update = UpdateExpr::new();
        if items != 0 {
            update = update.increment(ITEM_COUNT_ATTR, items);
        }
        if tiles != 0 {
            update = update.increment(INDEX_SIZE_ATTR, tiles);
        }

        match self
            .store
            .update(&keys::domain_key(domain_id), &update, Some(&Condition::Exists))
        {
            Ok(_) => Ok(()),
            Err(StoreError::ConditionFailed) => Err(GeoTileError::NotFound(format!(
                "Domain {} not found",
                domain_id
            ))),
            Err(e) => {
                log::error!(
                    "Failed to adjust counters of domain {} (items {:+}, tiles {:+}): {}",
                    domain_id,
                    items,
                    tiles,
                    e
                );
                Err(e.into())
            }
        }
    }

    fn put_request(&self, domain: &Domain, item_id: &str, tile: TileKey) -> Result<WriteRequest> {
        let record = IndexRecord::new(&domain.domain_id, item_id, domain.zoom, tile);
        let key = keys::tile_key(&domain.domain_id, item_id, tile.morton);
        Ok(WriteRequest::Put(keys::to_document(&record, &key, Model::Tile)?))
    }

    fn run_batches(&self, domain_id: &str, item_id: &str, requests: &[WriteRequest]) -> Result<()> {
        let mut written = 0;
        for chunk in requests.chunks(self.batch_size()) {
            if let Err(e) = self.store.batch_write(chunk) {
                log::error!(
                    "Index maintenance for {} failed after {} of {} writes: {}",
                    owner_key(domain_id, item_id),
                    written,
                    requests.len(),
                    e
                );
                return Err(e.into());
            }
            written += chunk.len();
        }
        Ok(())
    }
}

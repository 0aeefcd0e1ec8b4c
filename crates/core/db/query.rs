//! Two-phase spatial query: a coarse Morton range scan over the tile index,
//! then an exact intersection test on the fetched items.

use super::GeoStore;
use super::keys;
use crate::compute::geojson::to_geo;
use crate::compute::query::{MortonRange, SpatialQuery};
use crate::error::Result;
use crate::storage::{QUERY_BY_ZOOM, RangeFilter, Store};
use geo::Intersects;
use geotile_types::{Item, ItemCollection};
use rustc_hash::FxHashSet;
use serde_json::Value;

impl<S: Store> GeoStore<S> {
    /// Items of a domain whose geometry intersects the query shape.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use geotile::compute::query::SpatialQuery;
    /// use geotile::GeoStore;
    /// use geotile_types::{Access, NewDomain, NewItem};
    ///
    /// let db = GeoStore::memory();
    /// db.create_domain("alice", "test", NewDomain::new("Test", 12).with_access(Access::Public))?;
    ///
    /// let point = geojson::Geometry::new(geojson::Value::Point(vec![0.0, 0.0]));
    /// db.create_item("alice", "test", NewItem::feature(point))?;
    ///
    /// let hits = db.query_items(None, "test", &SpatialQuery::BBox([-1.0, -1.0, 1.0, 1.0]))?;
    /// assert_eq!(hits.len(), 1);
    ///
    /// let misses = db.query_items(None, "test", &SpatialQuery::BBox([10.0, 10.0, 20.0, 20.0]))?;
    /// assert!(misses.is_empty());
    /// # Ok::<(), geotile::GeoTileError>(())
    /// ```
    pub fn query_items(
        &self,
        user: Option<&str>,
        domain_id: &str,
        query: &SpatialQuery,
    ) -> Result<ItemCollection> {
        query.validate()?;
        let domain = self.readable_domain(user, domain_id)?;

        let filter = query.filter_geometry(
            self.config.point_buffer_km,
            self.config.point_buffer_segments,
        );
        let bbox = query.bbox(&filter);
        let range = MortonRange::for_bbox(&bbox, domain.zoom);

        let filters = [
            RangeFilter::new("x", range.min_x as i64, range.max_x as i64),
            RangeFilter::new("y", range.min_y as i64, range.max_y as i64),
        ];
        let records = self.store.query_index(
            QUERY_BY_ZOOM,
            &domain.indexed_domain(),
            range.min..=range.max,
            &filters,
        )?;

        let mut seen = FxHashSet::default();
        let item_ids: Vec<String> = records
            .iter()
            .filter_map(|doc| doc.get("itemId").and_then(Value::as_str))
            .filter(|id| seen.insert(*id))
            .map(str::to_string)
            .collect();

        let item_keys: Vec<_> = item_ids
            .iter()
            .map(|id| keys::item_key(domain_id, id))
            .collect();
        let mut candidates = Vec::with_capacity(item_keys.len());
        for chunk in item_keys.chunks(self.batch_size()) {
            candidates.extend(self.store.batch_get(chunk)?);
        }

        let mut features = Vec::with_capacity(candidates.len());
        for doc in candidates {
            let item: Item = keys::from_document(doc)?;
            match to_geo(&item.geometry) {
                Ok(shape) if filter.intersects(&shape) => features.push(item),
                Ok(_) => {}
                Err(e) => log::warn!("Skipping item {} with unreadable geometry: {}", item.item_id, e),
            }
        }

        log::debug!(
            "Query on {}: {} index records, {} candidates, {} matches",
            domain.indexed_domain(),
            records.len(),
            item_ids.len(),
            features.len()
        );
        Ok(ItemCollection::new(query.echo(domain_id), features))
    }
}

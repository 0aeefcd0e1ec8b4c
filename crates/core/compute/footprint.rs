//! Item footprints: the tile set a geometry occupies, and diffs between two of them.

use super::tiles;
use super::validation::validate_zoom;
use crate::error::{GeoTileError, Result};
use geo::Geometry;
use geotile_types::{IndexRecord, TileKey};
use std::collections::BTreeMap;

/// Set of tiles keyed by Morton code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Footprint {
    tiles: BTreeMap<u64, TileKey>,
}

impl Footprint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a footprint from stored index records.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a IndexRecord>) -> Self {
        records.into_iter().map(IndexRecord::tile).collect()
    }

    pub fn insert(&mut self, tile: TileKey) {
        self.tiles.insert(tile.morton, tile);
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn contains(&self, morton: u64) -> bool {
        self.tiles.contains_key(&morton)
    }

    /// Tiles in ascending Morton order.
    pub fn iter(&self) -> impl Iterator<Item = &TileKey> {
        self.tiles.values()
    }

    pub fn mortons(&self) -> impl Iterator<Item = u64> + '_ {
        self.tiles.keys().copied()
    }
}

impl FromIterator<TileKey> for Footprint {
    fn from_iter<I: IntoIterator<Item = TileKey>>(iter: I) -> Self {
        let mut footprint = Footprint::new();
        for tile in iter {
            footprint.insert(tile);
        }
        footprint
    }
}

impl IntoIterator for Footprint {
    type Item = TileKey;
    type IntoIter = std::collections::btree_map::IntoValues<u64, TileKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.tiles.into_values()
    }
}

/// Compute the footprint of `geometry` at `zoom`.
///
/// Fails with `FootprintTooLarge` as soon as the cover passes `max_tiles`,
/// and with `InvalidInput` when the geometry occupies no tile at all.
pub fn build_footprint(geometry: &Geometry<f64>, zoom: u8, max_tiles: usize) -> Result<Footprint> {
    validate_zoom(zoom)?;

    let cover = tiles::cover_limited(geometry, zoom, max_tiles).map_err(|e| {
        log::warn!(
            "Rejecting footprint of more than {} tiles at zoom {}",
            e.limit,
            zoom
        );
        GeoTileError::FootprintTooLarge {
            size: e.limit.saturating_add(1),
            max: e.limit,
        }
    })?;
    let footprint: Footprint = cover.into_iter().map(|t| t.key()).collect();

    if footprint.is_empty() {
        return Err(GeoTileError::InvalidInput(
            "Geometry does not cover any tile".to_string(),
        ));
    }

    log::debug!("Built footprint of {} tiles at zoom {}", footprint.len(), zoom);
    Ok(footprint)
}

/// Index changes needed to move from one footprint to another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FootprintDiff {
    pub to_add: Vec<TileKey>,
    pub to_remove: Vec<TileKey>,
}

impl FootprintDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Change in the domain's index size once the diff is applied.
    pub fn size_delta(&self) -> i64 {
        self.to_add.len() as i64 - self.to_remove.len() as i64
    }
}

/// Tiles only in `new` go to `to_add`, tiles only in `old` go to `to_remove`.
/// Both lists are in ascending Morton order.
pub fn diff(old: &Footprint, new: &Footprint) -> FootprintDiff {
    FootprintDiff {
        to_add: new
            .iter()
            .filter(|t| !old.contains(t.morton))
            .copied()
            .collect(),
        to_remove: old
            .iter()
            .filter(|t| !new.contains(t.morton))
            .copied()
            .collect(),
    }
}

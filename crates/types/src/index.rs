use serde::{Deserialize, Serialize};

/// One tile of an item's footprint: grid coordinates and their Morton key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileKey {
    pub morton: u64,
    pub x: u32,
    pub y: u32,
}

/// Secondary index entry tying one tile to one item.
///
/// Records are derived from item geometry and have no lifecycle of their own.
/// The set stored under an `owner_key` is always the footprint of that item's
/// current geometry at the domain's zoom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRecord {
    pub owner_key: String,
    pub morton_key: String,
    pub indexed_domain: String,
    pub item_id: String,
    pub morton: u64,
    pub x: u32,
    pub y: u32,
}

impl IndexRecord {
    pub fn new(domain_id: &str, item_id: &str, zoom: u8, tile: TileKey) -> Self {
        Self {
            owner_key: owner_key(domain_id, item_id),
            morton_key: tile.morton.to_string(),
            indexed_domain: indexed_domain(domain_id, zoom),
            item_id: item_id.to_string(),
            morton: tile.morton,
            x: tile.x,
            y: tile.y,
        }
    }

    pub fn tile(&self) -> TileKey {
        TileKey {
            morton: self.morton,
            x: self.x,
            y: self.y,
        }
    }
}

/// `domainId:itemId`, the partition holding an item's footprint.
pub fn owner_key(domain_id: &str, item_id: &str) -> String {
    format!("{}:{}", domain_id, item_id)
}

/// `domainId:zoom`, the partition of the zoom-ordered secondary index.
pub fn indexed_domain(domain_id: &str, zoom: u8) -> String {
    format!("{}:{}", domain_id, zoom)
}

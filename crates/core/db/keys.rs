//! Record keys and document conversion for domains, items and index records.

use crate::error::{GeoTileError, Result};
use crate::storage::{Document, Key, PARTITION_ATTR, SORT_ATTR};
use geotile_types::index::owner_key;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Partition holding every domain record.
pub const DOMAIN_PARTITION: &str = "_domain";

/// Sort-key prefix of item records inside a domain partition.
pub const ITEM_PREFIX: &str = "item:";

pub const MODEL_ATTR: &str = "model";
pub const VERSION_ATTR: &str = "version";
pub const OWNERS_ATTR: &str = "owners";
pub const ITEM_COUNT_ATTR: &str = "itemCount";
pub const INDEX_SIZE_ATTR: &str = "indexSize";
/// Tiles an item record contributes to its domain's `indexSize`.
pub const TILE_COUNT_ATTR: &str = "tileCount";

/// Record kinds, stored in the `model` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    Domain,
    Item,
    Tile,
}

impl Model {
    pub fn as_str(&self) -> &'static str {
        match self {
            Model::Domain => "domain",
            Model::Item => "item",
            Model::Tile => "tile",
        }
    }
}

pub fn domain_key(domain_id: &str) -> Key {
    Key::new(DOMAIN_PARTITION, domain_id)
}

pub fn item_key(domain_id: &str, item_id: &str) -> Key {
    Key::new(domain_id, format!("{}{}", ITEM_PREFIX, item_id))
}

pub fn tile_key(domain_id: &str, item_id: &str, morton: u64) -> Key {
    Key::new(owner_key(domain_id, item_id), morton.to_string())
}

/// Serialize `value` into a stored document under `key`.
pub fn to_document<T: Serialize>(value: &T, key: &Key, model: Model) -> Result<Document> {
    let mut doc = match serde_json::to_value(value)? {
        Value::Object(map) => map,
        other => {
            return Err(GeoTileError::Serialization(format!(
                "Expected a JSON object, got: {}",
                other
            )));
        }
    };
    key.stamp(&mut doc);
    doc.insert(MODEL_ATTR.to_string(), Value::from(model.as_str()));
    Ok(doc)
}

/// Deserialize a stored document, ignoring the key and model attributes.
pub fn from_document<T: DeserializeOwned>(mut doc: Document) -> Result<T> {
    doc.remove(PARTITION_ATTR);
    doc.remove(SORT_ATTR);
    doc.remove(MODEL_ATTR);
    Ok(serde_json::from_value(Value::Object(doc))?)
}

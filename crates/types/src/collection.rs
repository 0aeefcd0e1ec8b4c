use crate::item::Item;
use serde::{Deserialize, Serialize};

pub const FEATURE_COLLECTION_TYPE: &str = "FeatureCollection";

/// Echo of the request that produced a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEcho {
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<[f64; 2]>,
}

impl QueryEcho {
    pub fn domain(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            bbox: None,
            point: None,
        }
    }
}

/// GeoJSON `FeatureCollection` of items plus the query that selected them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCollection {
    pub query: QueryEcho,
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Item>,
}

impl ItemCollection {
    pub fn new(query: QueryEcho, features: Vec<Item>) -> Self {
        Self {
            query,
            kind: FEATURE_COLLECTION_TYPE.to_string(),
            features,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn item_ids(&self) -> Vec<&str> {
        self.features.iter().map(|i| i.item_id.as_str()).collect()
    }
}

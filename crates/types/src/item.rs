use geojson::{Feature, Geometry, JsonObject};
use serde::{Deserialize, Serialize};

/// The only GeoJSON object type accepted as an item.
pub const FEATURE_TYPE: &str = "Feature";

/// A stored GeoJSON feature owned by exactly one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub domain_id: String,
    pub item_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub properties: Option<JsonObject>,
    pub geometry: Geometry,
    pub version: u64,
}

impl Item {
    /// Convert into a plain GeoJSON feature, using the item id as feature id.
    pub fn to_feature(&self) -> Feature {
        Feature {
            bbox: None,
            geometry: Some(self.geometry.clone()),
            id: Some(geojson::feature::Id::String(self.item_id.clone())),
            properties: self.properties.clone(),
            foreign_members: None,
        }
    }
}

/// Request body for creating an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub properties: Option<JsonObject>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

impl NewItem {
    pub fn feature(geometry: Geometry) -> Self {
        Self {
            kind: FEATURE_TYPE.to_string(),
            properties: None,
            geometry: Some(geometry),
        }
    }

    pub fn with_properties(mut self, properties: JsonObject) -> Self {
        self.properties = Some(properties);
        self
    }
}

impl From<Feature> for NewItem {
    fn from(feature: Feature) -> Self {
        Self {
            kind: FEATURE_TYPE.to_string(),
            properties: feature.properties,
            geometry: feature.geometry,
        }
    }
}

/// Request body for updating an item.
///
/// Absent fields are left untouched. `version` must match the stored version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemUpdate {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<JsonObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    pub version: u64,
}

impl ItemUpdate {
    pub fn new(version: u64) -> Self {
        Self {
            kind: FEATURE_TYPE.to_string(),
            properties: None,
            geometry: None,
            version,
        }
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_properties(mut self, properties: JsonObject) -> Self {
        self.properties = Some(properties);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::Value;

    #[test]
    fn test_item_wire_shape() {
        let item = Item {
            domain_id: "parks".to_string(),
            item_id: "abc".to_string(),
            kind: FEATURE_TYPE.to_string(),
            properties: None,
            geometry: Geometry::new(Value::Point(vec![1.0, 2.0])),
            version: 3,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "Feature");
        assert_eq!(json["itemId"], "abc");
        assert_eq!(json["geometry"]["type"], "Point");
        assert_eq!(json["version"], 3);

        let feature = item.to_feature();
        assert_eq!(feature.id, Some(geojson::feature::Id::String("abc".into())));
    }

    #[test]
    fn test_item_update_rejects_unknown_fields() {
        let ok: ItemUpdate =
            serde_json::from_str(r#"{"type":"Feature","properties":{"a":1},"version":2}"#)
                .unwrap();
        assert_eq!(ok.version, 2);
        assert!(ok.geometry.is_none());

        let err = serde_json::from_str::<ItemUpdate>(
            r#"{"type":"Feature","version":2,"itemId":"x"}"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_new_item_from_feature() {
        let feature: Feature = serde_json::from_str(
            r#"{"type":"Feature","properties":{"name":"a"},"geometry":{"type":"Point","coordinates":[0,0]}}"#,
        )
        .unwrap();
        let item = NewItem::from(feature);
        assert_eq!(item.kind, FEATURE_TYPE);
        assert!(item.geometry.is_some());
        assert_eq!(item.properties.unwrap()["name"], "a");
    }
}

#[cfg(test)]
mod tests {
    use geotile::prelude::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_store_from_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("geotile.json");
        fs::write(
            &path,
            r#"{"max_item_index_size": 3, "point_buffer_km": 1.5}"#,
        )
        .unwrap();

        let config = Config::from_json(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.max_item_index_size, 3);
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.point_buffer_km, 1.5);
        assert_eq!(config.point_buffer_segments, 64);

        let db = GeoStore::builder().config(config).build().unwrap();
        db.create_domain("alice", "small", NewDomain::new("Small", 12))
            .unwrap();
        let long_line = geojson::Geometry::new(geojson::Value::LineString(vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
        ]));
        let err = db
            .create_item("alice", "small", NewItem::feature(long_line))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_config_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("geotile.json");
        let config = Config::default().with_batch_size(10);
        fs::write(&path, config.to_json().unwrap()).unwrap();

        let loaded = Config::from_json(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_file_rejects_bad_values() {
        assert!(Config::from_json(r#"{"batch_size": 0}"#).is_err());
        assert!(Config::from_json(r#"{"zoom": 12}"#).is_err());
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("geotile.toml");
        fs::write(&path, "max_item_index_size = 500\nbatch_size = 10\n").unwrap();

        let config = Config::from_toml(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.max_item_index_size, 500);
        assert_eq!(config.batch_size, 10);
    }
}

#[cfg(test)]
mod tests {
    use geojson::{Geometry, Value};
    use geotile::prelude::*;
    use geotile::{MortonRange, Tile};

    fn point(x: f64, y: f64) -> Geometry {
        Geometry::new(Value::Point(vec![x, y]))
    }

    fn line(coords: &[(f64, f64)]) -> Geometry {
        Geometry::new(Value::LineString(
            coords.iter().map(|&(x, y)| vec![x, y]).collect(),
        ))
    }

    fn square(min: f64, max: f64) -> Geometry {
        Geometry::new(Value::Polygon(vec![vec![
            vec![min, min],
            vec![max, min],
            vec![max, max],
            vec![min, max],
            vec![min, min],
        ]]))
    }

    fn public_domain(db: &GeoStore, id: &str, zoom: u8) {
        db.create_domain(
            "alice",
            id,
            NewDomain::new("Test", zoom).with_access(Access::Public),
        )
        .unwrap();
    }

    #[test]
    fn test_point_scenario() {
        let db = GeoStore::memory();
        public_domain(&db, "test", 12);
        let item = db
            .create_item("alice", "test", NewItem::feature(point(0.0, 0.0)))
            .unwrap();

        let hits = db
            .query_items(None, "test", &SpatialQuery::BBox([-1.0, -1.0, 1.0, 1.0]))
            .unwrap();
        assert_eq!(hits.item_ids(), vec![item.item_id.as_str()]);
        assert_eq!(hits.query.bbox, Some([-1.0, -1.0, 1.0, 1.0]));

        let misses = db
            .query_items(None, "test", &SpatialQuery::BBox([10.0, 10.0, 20.0, 20.0]))
            .unwrap();
        assert!(misses.is_empty());
        assert_eq!(misses.kind, "FeatureCollection");
    }

    #[test]
    fn test_result_wire_shape() {
        let db = GeoStore::memory();
        public_domain(&db, "test", 12);
        db.create_item("alice", "test", NewItem::feature(point(0.0, 0.0)))
            .unwrap();

        let hits = db
            .query_items(None, "test", &SpatialQuery::Point([0.0, 0.0]))
            .unwrap();
        let json = serde_json::to_value(&hits).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["query"]["domain"], "test");
        assert_eq!(json["query"]["point"], serde_json::json!([0.0, 0.0]));
        assert!(json["query"].get("bbox").is_none());
        assert_eq!(json["features"][0]["type"], "Feature");
        assert_eq!(json["features"][0]["version"], 1);
    }

    #[test]
    fn test_coarse_matches_are_filtered() {
        let db = GeoStore::memory();
        public_domain(&db, "coarse", 8);

        // Same zoom-8 tile as the query box, but outside it
        db.create_item("alice", "coarse", NewItem::feature(point(0.001, 0.001)))
            .unwrap();
        let footprint_tile = Tile::new(128, 127);
        let range = MortonRange::for_bbox(&[0.5, 0.5, 1.0, 1.0], 8);
        assert!(range.contains(footprint_tile.x, footprint_tile.y));

        let result = db
            .query_items(None, "coarse", &SpatialQuery::BBox([0.5, 0.5, 1.0, 1.0]))
            .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_every_intersecting_item_is_returned() {
        let db = GeoStore::memory();
        public_domain(&db, "mixed", 8);

        let inside = db
            .create_item("alice", "mixed", NewItem::feature(point(0.5, 0.5)))
            .unwrap();
        // Crosses the box without a vertex inside it
        let crossing = db
            .create_item(
                "alice",
                "mixed",
                NewItem::feature(line(&[(-5.0, 0.2), (5.0, 0.2)])),
            )
            .unwrap();
        // Contains the whole box
        let covering = db
            .create_item("alice", "mixed", NewItem::feature(square(-3.0, 3.0)))
            .unwrap();
        let far = db
            .create_item("alice", "mixed", NewItem::feature(point(40.0, 40.0)))
            .unwrap();

        let result = db
            .query_items(None, "mixed", &SpatialQuery::BBox([-1.0, -1.0, 1.0, 1.0]))
            .unwrap();
        let mut ids = result.item_ids();
        ids.sort();
        let mut expected = vec![
            inside.item_id.as_str(),
            crossing.item_id.as_str(),
            covering.item_id.as_str(),
        ];
        expected.sort();
        assert_eq!(ids, expected);
        assert!(!result.item_ids().contains(&far.item_id.as_str()));
    }

    #[test]
    fn test_each_item_returned_once() {
        let db = GeoStore::memory();
        public_domain(&db, "dups", 8);
        let big = db
            .create_item("alice", "dups", NewItem::feature(square(-4.0, 4.0)))
            .unwrap();
        assert!(db.item_footprint(None, "dups", &big.item_id).unwrap().len() > 1);

        let result = db
            .query_items(None, "dups", &SpatialQuery::BBox([-2.0, -2.0, 2.0, 2.0]))
            .unwrap();
        assert_eq!(result.item_ids(), vec![big.item_id.as_str()]);
    }

    #[test]
    fn test_point_query_radius() {
        let db = GeoStore::memory();
        public_domain(&db, "radius", 14);
        let near = db
            .create_item("alice", "radius", NewItem::feature(point(13.4050, 52.5200)))
            .unwrap();
        // About 2 km east
        db.create_item("alice", "radius", NewItem::feature(point(13.4345, 52.5200)))
            .unwrap();

        let result = db
            .query_items(None, "radius", &SpatialQuery::Point([13.4060, 52.5205]))
            .unwrap();
        assert_eq!(result.item_ids(), vec![near.item_id.as_str()]);
    }

    #[test]
    fn test_invalid_query_rejected_before_store_access() {
        let db = GeoStore::memory();
        let before = db.stats().unwrap().operations_count;

        let err = db
            .query_items(None, "anything", &SpatialQuery::BBox([-200.0, 0.0, 0.0, 1.0]))
            .unwrap_err();
        assert!(err.is_validation());
        let err = db
            .query_items(None, "anything", &SpatialQuery::Point([0.0, f64::NAN]))
            .unwrap_err();
        assert!(err.is_validation());

        assert_eq!(db.stats().unwrap().operations_count, before);
    }

    #[test]
    fn test_query_access() {
        let db = GeoStore::memory();
        db.create_domain("alice", "private", NewDomain::new("Private", 10))
            .unwrap();
        let q = SpatialQuery::BBox([-1.0, -1.0, 1.0, 1.0]);

        assert!(db.query_items(None, "private", &q).unwrap_err().is_forbidden());
        assert!(db.query_items(Some("bob"), "private", &q).unwrap_err().is_forbidden());
        assert!(db.query_items(Some("alice"), "private", &q).unwrap().is_empty());
        assert!(db.query_items(None, "missing", &q).unwrap_err().is_not_found());
    }

    #[test]
    fn test_query_fetches_in_chunks() {
        let db = GeoStoreBuilder::new()
            .store(std::sync::Arc::new(MemoryStore::new().with_max_batch_size(2)))
            .build_with_store()
            .unwrap();
        public_domain(&db, "many", 10);

        for i in 0..7 {
            let offset = i as f64 * 0.01;
            db.create_item("alice", "many", NewItem::feature(point(offset, offset)))
                .unwrap();
        }

        let result = db
            .query_items(None, "many", &SpatialQuery::BBox([-0.5, -0.5, 0.5, 0.5]))
            .unwrap();
        assert_eq!(result.len(), 7);
    }
}

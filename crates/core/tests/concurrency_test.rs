use geojson::{Geometry, Value};
use geotile::compute::footprint::build_footprint;
use geotile::compute::geojson::to_geo;
use geotile::prelude::*;
use std::sync::{Arc, Barrier};
use std::thread;

fn point(x: f64, y: f64) -> Geometry {
    Geometry::new(Value::Point(vec![x, y]))
}

#[test]
fn test_concurrent_updates_one_winner() {
    let db = GeoStore::memory();
    db.create_domain("alice", "race", NewDomain::new("Race", 10))
        .unwrap();
    let item = db
        .create_item("alice", "race", NewItem::feature(point(0.0, 0.0)))
        .unwrap();

    let writers = 8;
    let barrier = Arc::new(Barrier::new(writers));
    let handles: Vec<_> = (0..writers)
        .map(|i| {
            let db = db.clone();
            let barrier = Arc::clone(&barrier);
            let item_id = item.item_id.clone();
            thread::spawn(move || {
                let geometry = point(5.0 + i as f64, 5.0);
                barrier.wait();
                let result = db.update_item(
                    "alice",
                    "race",
                    &item_id,
                    ItemUpdate::new(1).with_geometry(geometry.clone()),
                );
                (geometry, result)
            })
        })
        .collect();

    let mut winners = Vec::new();
    for handle in handles {
        let (geometry, result) = handle.join().unwrap();
        match result {
            Ok(updated) => winners.push((geometry, updated)),
            Err(e) => assert!(e.is_conflict(), "unexpected error: {}", e),
        }
    }

    assert_eq!(winners.len(), 1);
    let (geometry, updated) = &winners[0];
    assert_eq!(updated.version, 2);

    let current = db.get_item(Some("alice"), "race", &item.item_id).unwrap();
    assert_eq!(&current.geometry, geometry);

    let expected = build_footprint(&to_geo(geometry).unwrap(), 10, 1000).unwrap();
    let stored = db
        .item_footprint(Some("alice"), "race", &item.item_id)
        .unwrap();
    assert_eq!(stored, expected);

    let domain = db.get_domain(Some("alice"), "race").unwrap();
    assert_eq!(domain.index_size, stored.len() as i64);
}

#[test]
fn test_concurrent_domain_creates_one_winner() {
    let db = GeoStore::memory();
    let writers = 6;
    let barrier = Arc::new(Barrier::new(writers));

    let handles: Vec<_> = (0..writers)
        .map(|i| {
            let db = db.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let user = format!("user-{}", i);
                barrier.wait();
                db.create_domain(&user, "shared", NewDomain::new("Shared", 8))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let created: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(created.len(), 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(GeoTileError::is_conflict)
    );

    let owner = created[0].owners.iter().next().unwrap().clone();
    let stored = db.get_domain(Some(&owner), "shared").unwrap();
    assert_eq!(&stored, created[0]);
}

#[test]
fn test_concurrent_creates_keep_counters() {
    let db = GeoStore::memory();
    db.create_domain("alice", "busy", NewDomain::new("Busy", 12))
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let db = db.clone();
            thread::spawn(move || {
                for i in 0..10 {
                    let x = t as f64 + i as f64 * 0.05;
                    db.create_item("alice", "busy", NewItem::feature(point(x, 1.0)))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let domain = db.get_domain(Some("alice"), "busy").unwrap();
    assert_eq!(domain.item_count, 40);
    assert_eq!(domain.index_size, 40);
    assert_eq!(db.stats().unwrap().index_entry_count, 40);
}

#[test]
fn test_concurrent_deletes_count_once() {
    let db = GeoStore::memory();
    db.create_domain("alice", "gone", NewDomain::new("Gone", 12))
        .unwrap();
    let line = Geometry::new(Value::LineString(vec![vec![0.0, 0.0], vec![0.3, 0.2]]));

    for _ in 0..50 {
        let item = db
            .create_item("alice", "gone", NewItem::feature(line.clone()))
            .unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let db = db.clone();
                let barrier = Arc::clone(&barrier);
                let item_id = item.item_id.clone();
                thread::spawn(move || {
                    barrier.wait();
                    db.delete_item("alice", "gone", &item_id, None)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        for result in &results {
            if let Err(e) = result {
                assert!(e.is_not_found(), "unexpected error: {}", e);
            }
        }

        let domain = db.get_domain(Some("alice"), "gone").unwrap();
        assert_eq!(domain.item_count, 0);
        assert_eq!(domain.index_size, 0);
    }
    assert_eq!(db.stats().unwrap().index_entry_count, 0);
}

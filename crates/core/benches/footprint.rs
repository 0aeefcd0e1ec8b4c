use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use geo::{Geometry, LineString, Polygon};
use geotile::compute::footprint::{build_footprint, diff};
use geotile::compute::query::SpatialQuery;
use geotile::compute::{morton, tiles};
use geotile::{Access, GeoStore, NewDomain, NewItem};

fn square(min: f64, max: f64) -> Geometry<f64> {
    Geometry::Polygon(Polygon::new(
        LineString::from(vec![(min, min), (max, min), (max, max), (min, max), (min, min)]),
        vec![],
    ))
}

fn bench_morton(c: &mut Criterion) {
    c.bench_function("morton_encode", |b| {
        b.iter(|| {
            for x in 0..256u32 {
                black_box(morton::encode(black_box(x), black_box(255 - x)));
            }
        })
    });
}

fn bench_cover(c: &mut Criterion) {
    let mut group = c.benchmark_group("cover");

    for zoom in [8u8, 12, 16].iter() {
        let polygon = square(-0.2, 0.2);
        let line = Geometry::LineString(LineString::from(vec![(-0.2, -0.1), (0.2, 0.15)]));

        group.bench_with_input(BenchmarkId::new("polygon", zoom), zoom, |b, &z| {
            b.iter(|| tiles::cover(black_box(&polygon), z))
        });
        group.bench_with_input(BenchmarkId::new("line", zoom), zoom, |b, &z| {
            b.iter(|| tiles::cover(black_box(&line), z))
        });
    }

    group.finish();
}

fn bench_footprint_diff(c: &mut Criterion) {
    let old = build_footprint(&square(0.0, 0.5), 12, 10_000).unwrap();
    let new = build_footprint(&square(0.25, 0.75), 12, 10_000).unwrap();

    let mut group = c.benchmark_group("footprint_diff");
    group.throughput(Throughput::Elements((old.len() + new.len()) as u64));
    group.bench_function("overlapping_squares", |b| {
        b.iter(|| diff(black_box(&old), black_box(&new)))
    });
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let db = GeoStore::memory();
    db.create_domain(
        "bench",
        "points",
        NewDomain::new("Points", 12).with_access(Access::Public),
    )
    .unwrap();
    for i in 0..1000 {
        let x = (i % 40) as f64 * 0.05;
        let y = (i / 40) as f64 * 0.05;
        let geometry = geojson::Geometry::new(geojson::Value::Point(vec![x, y]));
        db.create_item("bench", "points", NewItem::feature(geometry))
            .unwrap();
    }

    let mut group = c.benchmark_group("query");
    for size in [0.1, 0.5, 1.0].iter() {
        let query = SpatialQuery::BBox([0.0, 0.0, *size, *size]);
        group.bench_with_input(BenchmarkId::new("bbox", size), &query, |b, q| {
            b.iter(|| db.query_items(None, "points", q).unwrap())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_morton,
    bench_cover,
    bench_footprint_diff,
    bench_query
);
criterion_main!(benches);

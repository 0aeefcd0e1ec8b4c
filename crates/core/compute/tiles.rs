//! Web-Mercator tile covering.
//!
//! Lists the grid tiles a geometry touches at one zoom level. Lines are walked
//! cell by cell along each segment; polygons cover their rings the same way and
//! then fill each scan line between ring crossings.

use super::morton;
use geo::{Coord, Geometry, LineString, Polygon};
use geotile_types::TileKey;
use std::collections::BTreeSet;
use std::f64::consts::PI;

/// Highest zoom the grid supports (24 bits per axis).
pub const MAX_ZOOM: u8 = 24;

/// Latitude limit of the Web-Mercator projection.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// A grid cell at some zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
}

impl Tile {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub fn morton(&self) -> u64 {
        morton::encode(self.x, self.y)
    }

    pub fn key(&self) -> TileKey {
        TileKey {
            morton: self.morton(),
            x: self.x,
            y: self.y,
        }
    }
}

/// Fractional tile position of a longitude/latitude. Latitude is clamped to
/// the projection limit, so the result always lies within `[0, 2^zoom]`.
pub fn point_to_tile_fraction(lon: f64, lat: f64, zoom: u8) -> (f64, f64) {
    let n = grid_size(zoom) as f64;
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let sin = lat.to_radians().sin();
    let x = n * (lon / 360.0 + 0.5);
    let y = n * (0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI);
    (x, y)
}

/// Tile containing a longitude/latitude. Points on a tile edge belong to the
/// tile whose lower edge they sit on; longitude 180 maps to the last column.
pub fn point_to_tile(lon: f64, lat: f64, zoom: u8) -> Tile {
    let (x, y) = point_to_tile_fraction(lon, lat, zoom);
    Tile::new(
        clamp_index(x.floor() as i64, zoom),
        clamp_index(y.floor() as i64, zoom),
    )
}

/// Returned by [`cover_limited`] once a cover grows past its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitExceeded {
    pub limit: usize,
}

/// Every tile `geometry` touches at `zoom`, ordered by (x, y).
pub fn cover(geometry: &Geometry<f64>, zoom: u8) -> BTreeSet<Tile> {
    cover_limited(geometry, zoom, usize::MAX).unwrap_or_default()
}

/// Like [`cover`], but stops as soon as more than `limit` tiles are found.
pub fn cover_limited(
    geometry: &Geometry<f64>,
    zoom: u8,
    limit: usize,
) -> Result<BTreeSet<Tile>, LimitExceeded> {
    let mut cover = Cover {
        tiles: BTreeSet::new(),
        limit,
    };
    cover.geometry(geometry, zoom)?;
    Ok(cover.tiles)
}

type Step = Result<(), LimitExceeded>;

struct Cover {
    tiles: BTreeSet<Tile>,
    limit: usize,
}

impl Cover {
    fn insert(&mut self, tile: Tile) -> Step {
        self.tiles.insert(tile);
        self.check(0)
    }

    /// Fails if `more` new tiles would not fit.
    fn check(&self, more: usize) -> Step {
        if self.tiles.len().saturating_add(more) > self.limit {
            Err(LimitExceeded { limit: self.limit })
        } else {
            Ok(())
        }
    }

    fn geometry(&mut self, geometry: &Geometry<f64>, zoom: u8) -> Step {
        match geometry {
            Geometry::Point(p) => self.insert(point_to_tile(p.x(), p.y(), zoom)),
            Geometry::MultiPoint(mp) => {
                for p in mp {
                    self.insert(point_to_tile(p.x(), p.y(), zoom))?;
                }
                Ok(())
            }
            Geometry::Line(line) => {
                self.line_string(&LineString::from(vec![line.start, line.end]), zoom)
            }
            Geometry::LineString(ls) => self.line_string(ls, zoom),
            Geometry::MultiLineString(mls) => {
                for ls in mls {
                    self.line_string(ls, zoom)?;
                }
                Ok(())
            }
            Geometry::Polygon(polygon) => self.polygon(polygon, zoom),
            Geometry::MultiPolygon(mp) => {
                for polygon in mp {
                    self.polygon(polygon, zoom)?;
                }
                Ok(())
            }
            Geometry::Rect(rect) => self.polygon(&rect.to_polygon(), zoom),
            Geometry::Triangle(triangle) => self.polygon(&triangle.to_polygon(), zoom),
            Geometry::GeometryCollection(gc) => {
                for g in gc {
                    self.geometry(g, zoom)?;
                }
                Ok(())
            }
        }
    }

    fn line_string(&mut self, ls: &LineString<f64>, zoom: u8) -> Step {
        // Degenerate lines (one coordinate, or all equal) still occupy their start tile
        if let Some(first) = ls.0.first() {
            self.insert(point_to_tile(first.x, first.y, zoom))?;
        }
        self.line(&ls.0, zoom, None)
    }

    fn polygon(&mut self, polygon: &Polygon<f64>, zoom: u8) -> Step {
        let mut crossings: Vec<(i64, i64)> = Vec::new();

        for ring_line in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            if let Some(first) = ring_line.0.first() {
                self.insert(point_to_tile(first.x, first.y, zoom))?;
            }

            let mut ring = Vec::new();
            self.line(&ring_line.0, zoom, Some(&mut ring))?;

            let len = ring.len();
            for j in 0..len {
                let k = (j + len - 1) % len;
                let m = (j + 1) % len;
                let y = ring[j].1;
                let not_local_min = y > ring[k].1 || y > ring[m].1;
                let not_local_max = y < ring[k].1 || y < ring[m].1;
                if not_local_min && not_local_max && y != ring[m].1 {
                    crossings.push(ring[j]);
                }
            }
        }

        crossings.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));

        for pair in crossings.chunks_exact(2) {
            let y = pair[0].1;
            let span = (pair[1].0 - pair[0].0 - 1).max(0) as usize;
            // The whole span ends up in the set, so a span wider than the
            // limit can never fit
            if span > self.limit {
                return Err(LimitExceeded { limit: self.limit });
            }
            for x in (pair[0].0 + 1)..pair[1].0 {
                self.insert(Tile::new(clamp_index(x, zoom), clamp_index(y, zoom)))?;
            }
        }
        Ok(())
    }

    /// Grid traversal along each segment. When `ring` is given, records the
    /// tile every time the walk enters a new row, for the polygon scan-line fill.
    fn line(
        &mut self,
        coords: &[Coord<f64>],
        zoom: u8,
        mut ring: Option<&mut Vec<(i64, i64)>>,
    ) -> Step {
        let mut prev: Option<(i64, i64)> = None;

        for segment in coords.windows(2) {
            let (x0, y0) = point_to_tile_fraction(segment[0].x, segment[0].y, zoom);
            let (x1, y1) = point_to_tile_fraction(segment[1].x, segment[1].y, zoom);
            let (dx, dy) = (x1 - x0, y1 - y0);

            if dx == 0.0 && dy == 0.0 {
                continue;
            }

            let sx: i64 = if dx > 0.0 { 1 } else { -1 };
            let sy: i64 = if dy > 0.0 { 1 } else { -1 };
            let mut x = x0.floor() as i64;
            let mut y = y0.floor() as i64;

            let mut t_max_x = if dx == 0.0 {
                f64::INFINITY
            } else {
                ((if dx > 0.0 { 1.0 } else { 0.0 }) + x as f64 - x0).abs() / dx.abs()
            };
            let mut t_max_y = if dy == 0.0 {
                f64::INFINITY
            } else {
                ((if dy > 0.0 { 1.0 } else { 0.0 }) + y as f64 - y0).abs() / dy.abs()
            };
            let t_dx = 1.0 / dx.abs();
            let t_dy = 1.0 / dy.abs();

            if prev != Some((x, y)) {
                self.visit(ring.as_deref_mut(), &mut prev, x, y, zoom)?;
            }

            while t_max_x < 1.0 || t_max_y < 1.0 {
                if t_max_x < t_max_y {
                    t_max_x += t_dx;
                    x += sx;
                } else {
                    t_max_y += t_dy;
                    y += sy;
                }
                self.visit(ring.as_deref_mut(), &mut prev, x, y, zoom)?;
            }
        }

        // A closed ring ends in the row it started in; drop the repeat
        if let Some(ring) = ring
            && let (Some(&(_, first_y)), Some((_, last_y))) = (ring.first(), prev)
            && first_y == last_y
        {
            ring.pop();
        }
        Ok(())
    }

    fn visit(
        &mut self,
        ring: Option<&mut Vec<(i64, i64)>>,
        prev: &mut Option<(i64, i64)>,
        x: i64,
        y: i64,
        zoom: u8,
    ) -> Step {
        self.insert(Tile::new(clamp_index(x, zoom), clamp_index(y, zoom)))?;
        if let Some(ring) = ring
            && prev.map(|(_, py)| py) != Some(y)
        {
            ring.push((x, y));
        }
        *prev = Some((x, y));
        Ok(())
    }
}

fn grid_size(zoom: u8) -> u64 {
    1u64 << zoom.min(MAX_ZOOM)
}

fn clamp_index(v: i64, zoom: u8) -> u32 {
    let max = grid_size(zoom) as i64 - 1;
    v.clamp(0, max) as u32
}

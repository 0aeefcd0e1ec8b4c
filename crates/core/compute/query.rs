//! Spatial query shapes and the Morton range they scan.

use super::morton;
use super::tiles::point_to_tile;
use super::validation::{validate_bbox, validate_geographic_point};
use crate::error::{GeoTileError, Result};
use geo::{BoundingRect, Coord, Destination, Geometry, Haversine, LineString, Point, Polygon, Rect};
use geotile_types::QueryEcho;

/// A bounding box or a point to search around.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpatialQuery {
    /// `[minX, minY, maxX, maxY]` in degrees
    BBox([f64; 4]),
    /// `[x, y]` in degrees, buffered into a small circle
    Point([f64; 2]),
}

impl SpatialQuery {
    /// Parse the comma-separated query-string forms, `bbox=minX,minY,maxX,maxY`
    /// or `point=x,y`. A bbox wins when both are given.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use geotile::compute::query::SpatialQuery;
    ///
    /// let q = SpatialQuery::from_params(Some("-1,-1,1,1"), None).unwrap();
    /// assert_eq!(q, SpatialQuery::BBox([-1.0, -1.0, 1.0, 1.0]));
    ///
    /// assert!(SpatialQuery::from_params(None, Some("0,abc")).is_err());
    /// ```
    pub fn from_params(bbox: Option<&str>, point: Option<&str>) -> Result<Self> {
        let query = match (bbox, point) {
            (Some(bbox), _) => {
                let values = parse_numbers(bbox, 4, "bbox")?;
                SpatialQuery::BBox([values[0], values[1], values[2], values[3]])
            }
            (None, Some(point)) => {
                let values = parse_numbers(point, 2, "point")?;
                SpatialQuery::Point([values[0], values[1]])
            }
            (None, None) => {
                return Err(GeoTileError::InvalidInput(
                    "A bbox or point parameter is required".to_string(),
                ));
            }
        };
        query.validate()?;
        Ok(query)
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            SpatialQuery::BBox(bbox) => validate_bbox(bbox),
            SpatialQuery::Point([x, y]) => validate_geographic_point(&Point::new(*x, *y)),
        }
    }

    /// Geometry that candidates must intersect to be returned.
    ///
    /// A point becomes a geodesic circle of `buffer_km` radius with `segments` vertices.
    pub fn filter_geometry(&self, buffer_km: f64, segments: usize) -> Geometry<f64> {
        match self {
            SpatialQuery::BBox([min_x, min_y, max_x, max_y]) => Geometry::Rect(Rect::new(
                Coord { x: *min_x, y: *min_y },
                Coord { x: *max_x, y: *max_y },
            )),
            SpatialQuery::Point([x, y]) => {
                Geometry::Polygon(circle(Point::new(*x, *y), buffer_km, segments))
            }
        }
    }

    /// Bounding box of the filter geometry.
    pub fn bbox(&self, filter: &Geometry<f64>) -> [f64; 4] {
        match (self, filter.bounding_rect()) {
            (SpatialQuery::BBox(bbox), _) => *bbox,
            (SpatialQuery::Point(_), Some(rect)) => [
                rect.min().x.max(-180.0),
                rect.min().y.max(-90.0),
                rect.max().x.min(180.0),
                rect.max().y.min(90.0),
            ],
            (SpatialQuery::Point([x, y]), None) => [*x, *y, *x, *y],
        }
    }

    /// Echo of this query as returned alongside results.
    pub fn echo(&self, domain_id: &str) -> QueryEcho {
        let mut echo = QueryEcho::domain(domain_id);
        match self {
            SpatialQuery::BBox(bbox) => echo.bbox = Some(*bbox),
            SpatialQuery::Point(point) => echo.point = Some(*point),
        }
        echo
    }
}

fn parse_numbers(text: &str, expected: usize, name: &str) -> Result<Vec<f64>> {
    let values = text
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| GeoTileError::InvalidInput(format!("{} must be numeric: {}", name, text)))?;

    if values.len() != expected {
        return Err(GeoTileError::InvalidInput(format!(
            "{} must have {} values, got {}",
            name,
            expected,
            values.len()
        )));
    }
    Ok(values)
}

/// Closed polygon approximating a circle of `radius_km` around `center`.
///
/// The circle does not wrap around the antimeridian: vertices past it are
/// clipped to longitude ±180, so the ring stays on the center's side.
pub fn circle(center: Point<f64>, radius_km: f64, segments: usize) -> Polygon<f64> {
    let segments = segments.max(3);
    let meters = radius_km * 1000.0;
    let mut ring: Vec<Coord<f64>> = (0..segments)
        .map(|i| {
            let bearing = 360.0 * i as f64 / segments as f64;
            let vertex = Haversine.destination(center, bearing, meters);
            let mut x = vertex.x();
            if x - center.x() > 180.0 {
                x -= 360.0;
            } else if center.x() - x > 180.0 {
                x += 360.0;
            }
            Coord {
                x: x.clamp(-180.0, 180.0),
                y: vertex.y(),
            }
        })
        .collect();
    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }
    Polygon::new(LineString::new(ring), vec![])
}

/// Morton key range plus the tile rectangle it approximates.
///
/// Every tile in `[min_x, max_x] x [min_y, max_y]` has a key in `[min, max]`;
/// the converse does not hold, so scans must also filter on x and y.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MortonRange {
    pub min: u64,
    pub max: u64,
    pub min_x: u32,
    pub max_x: u32,
    pub min_y: u32,
    pub max_y: u32,
}

impl MortonRange {
    /// Tiles of the top-left and bottom-right corners of `bbox` at `zoom`.
    pub fn for_bbox(bbox: &[f64; 4], zoom: u8) -> Self {
        let [min_lon, min_lat, max_lon, max_lat] = *bbox;
        let top_left = point_to_tile(min_lon, max_lat, zoom);
        let bottom_right = point_to_tile(max_lon, min_lat, zoom);

        Self {
            min: morton::encode(top_left.x, top_left.y),
            max: morton::encode(bottom_right.x, bottom_right.y),
            min_x: top_left.x,
            max_x: bottom_right.x,
            min_y: top_left.y,
            max_y: bottom_right.y,
        }
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }
}

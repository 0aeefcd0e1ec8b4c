//! Validation for coordinates, geometries, bounding boxes and domain fields.

use super::tiles::MAX_ZOOM;
use crate::error::{GeoTileError, Result};
use geo::{CoordsIter, Geometry, Point};
use geotile_types::item::FEATURE_TYPE;

/// Longest domain name accepted.
pub const MAX_DOMAIN_NAME_LEN: usize = 64;

/// Validates a 2D point has valid longitude and latitude.
///
/// Longitude: [-180.0, 180.0], Latitude: [-90.0, 90.0]
///
/// # Examples
///
/// ```
/// use geotile::compute::validation::validate_geographic_point;
/// use geo::Point;
///
/// assert!(validate_geographic_point(&Point::new(-74.0060, 40.7128)).is_ok());
/// assert!(validate_geographic_point(&Point::new(200.0, 40.0)).is_err());
/// assert!(validate_geographic_point(&Point::new(-74.0, 95.0)).is_err());
/// ```
pub fn validate_geographic_point(point: &Point) -> Result<()> {
    let (x, y) = (point.x(), point.y());

    if !x.is_finite() {
        return Err(GeoTileError::InvalidInput(format!(
            "Longitude must be finite, got: {}",
            x
        )));
    }

    if !y.is_finite() {
        return Err(GeoTileError::InvalidInput(format!(
            "Latitude must be finite, got: {}",
            y
        )));
    }

    if !(-180.0..=180.0).contains(&x) {
        return Err(GeoTileError::InvalidInput(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            x
        )));
    }

    if !(-90.0..=90.0).contains(&y) {
        return Err(GeoTileError::InvalidInput(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            y
        )));
    }

    Ok(())
}

/// Validates every coordinate of a geometry and rejects geometries without any.
pub fn validate_geometry(geometry: &Geometry<f64>) -> Result<()> {
    let mut count = 0usize;
    for (idx, coord) in geometry.coords_iter().enumerate() {
        validate_geographic_point(&Point::from(coord)).map_err(|e| {
            GeoTileError::InvalidInput(format!("Coordinate at index {}: {}", idx, e))
        })?;
        count += 1;
    }

    if count == 0 {
        return Err(GeoTileError::InvalidInput(
            "Geometry has no coordinates".to_string(),
        ));
    }

    Ok(())
}

/// Validates a `[minX, minY, maxX, maxY]` bounding box.
///
/// Degenerate boxes (min == max) are accepted; they select a line or a point.
///
/// # Examples
///
/// ```
/// use geotile::compute::validation::validate_bbox;
///
/// assert!(validate_bbox(&[-10.0, -10.0, 10.0, 10.0]).is_ok());
/// assert!(validate_bbox(&[10.0, -10.0, -10.0, 10.0]).is_err()); // min > max
/// ```
pub fn validate_bbox(bbox: &[f64; 4]) -> Result<()> {
    let [min_x, min_y, max_x, max_y] = *bbox;
    validate_geographic_point(&Point::new(min_x, min_y))?;
    validate_geographic_point(&Point::new(max_x, max_y))?;

    if min_x > max_x {
        return Err(GeoTileError::InvalidInput(format!(
            "min_lon ({}) must be <= max_lon ({})",
            min_x, max_x
        )));
    }
    if min_y > max_y {
        return Err(GeoTileError::InvalidInput(format!(
            "min_lat ({}) must be <= max_lat ({})",
            min_y, max_y
        )));
    }

    Ok(())
}

/// Zoom must be an integer in 1..=24.
pub fn validate_zoom(zoom: u8) -> Result<()> {
    if !(1..=MAX_ZOOM).contains(&zoom) {
        return Err(GeoTileError::InvalidInput(format!(
            "Zoom must be between 1 and {}, got: {}",
            MAX_ZOOM, zoom
        )));
    }
    Ok(())
}

/// Domain ids are non-empty ASCII letters, digits and dashes.
///
/// ```
/// use geotile::compute::validation::validate_domain_id;
///
/// assert!(validate_domain_id("city-parks-2").is_ok());
/// assert!(validate_domain_id("parks:12").is_err());
/// assert!(validate_domain_id("").is_err());
/// ```
pub fn validate_domain_id(domain_id: &str) -> Result<()> {
    if domain_id.is_empty()
        || !domain_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(GeoTileError::InvalidInput(format!(
            "Domain id must match [a-zA-Z0-9-]+, got: {:?}",
            domain_id
        )));
    }
    Ok(())
}

/// Names are at most 64 characters and may not start with an underscore.
pub fn validate_domain_name(name: &str) -> Result<()> {
    if name.chars().count() > MAX_DOMAIN_NAME_LEN {
        return Err(GeoTileError::InvalidInput(format!(
            "Domain name longer than {} characters",
            MAX_DOMAIN_NAME_LEN
        )));
    }
    if name.starts_with('_') {
        return Err(GeoTileError::InvalidInput(
            "Domain name may not start with \"_\"".to_string(),
        ));
    }
    Ok(())
}

/// Only GeoJSON `Feature` objects are stored as items.
pub fn validate_feature_type(kind: &str) -> Result<()> {
    if kind != FEATURE_TYPE {
        return Err(GeoTileError::InvalidInput(format!(
            "Only GeoJSON \"Feature\" is supported, got: {:?}",
            kind
        )));
    }
    Ok(())
}

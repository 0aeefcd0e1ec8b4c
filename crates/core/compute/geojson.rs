//! GeoJSON conversion between wire geometries and `geo` geometries.

use super::validation::validate_geometry;
use crate::error::{GeoTileError, Result};
use geo::Geometry;

/// Converts a GeoJSON geometry into a validated `geo` geometry.
///
/// Every coordinate must be a finite longitude/latitude in range.
pub fn to_geo(geometry: &geojson::Geometry) -> Result<Geometry<f64>> {
    let geo_geometry = Geometry::<f64>::try_from(geometry.clone())
        .map_err(|e| GeoTileError::InvalidInput(format!("Unsupported GeoJSON geometry: {}", e)))?;
    validate_geometry(&geo_geometry)?;
    Ok(geo_geometry)
}

/// Converts a `geo` geometry into GeoJSON.
pub fn from_geo(geometry: &Geometry<f64>) -> geojson::Geometry {
    geojson::Geometry::new(geojson::Value::from(geometry))
}

/// Parses a GeoJSON geometry string into a validated `geo` geometry.
pub fn parse_geometry(geojson: &str) -> Result<Geometry<f64>> {
    let geometry: geojson::Geometry = serde_json::from_str(geojson)
        .map_err(|e| GeoTileError::InvalidInput(format!("Failed to parse GeoJSON: {}", e)))?;
    to_geo(&geometry)
}

/// Parses a GeoJSON document (`FeatureCollection`, `Feature` or bare geometry)
/// into its features. A bare geometry becomes a feature without properties.
pub fn parse_features(geojson: &str) -> Result<Vec<geojson::Feature>> {
    let parsed: geojson::GeoJson = geojson
        .parse()
        .map_err(|e| GeoTileError::InvalidInput(format!("Failed to parse GeoJSON: {}", e)))?;

    Ok(match parsed {
        geojson::GeoJson::FeatureCollection(fc) => fc.features,
        geojson::GeoJson::Feature(feature) => vec![feature],
        geojson::GeoJson::Geometry(geometry) => vec![geojson::Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: None,
            foreign_members: None,
        }],
    })
}

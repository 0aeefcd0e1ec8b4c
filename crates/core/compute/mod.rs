//! Tile covering, Morton keys, footprints, query shapes, validation and GeoJSON conversion.

pub mod footprint;
pub mod geojson;
pub mod morton;
pub mod query;
pub mod tiles;
pub mod validation;

//! Error types for geotile.

use crate::storage::StoreError;
use thiserror::Error;

/// Errors surfaced by domain, item and query operations.
#[derive(Error, Debug)]
pub enum GeoTileError {
    /// Malformed geometry, bounding box, point, or request field.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Geometry covers more tiles than the configured maximum. Covering stops
    /// early, so `size` is a lower bound.
    #[error("Footprint of at least {size} tiles exceeds the maximum of {max}")]
    FootprintTooLarge { size: usize, max: usize },

    /// Version mismatch on update, or a create hitting an existing key.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Acting user is not allowed to read or modify the domain.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GeoTileError {
    /// HTTP status code for this error, for callers fronting the engine with HTTP.
    pub fn status_code(&self) -> u16 {
        match self {
            GeoTileError::InvalidInput(_) | GeoTileError::FootprintTooLarge { .. } => 400,
            GeoTileError::Forbidden(_) => 403,
            GeoTileError::NotFound(_) => 404,
            GeoTileError::Conflict(_) | GeoTileError::Store(StoreError::ConditionFailed) => 409,
            GeoTileError::Store(_) | GeoTileError::Serialization(_) => 500,
        }
    }

    /// True for errors caused by the request itself rather than the store.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            GeoTileError::InvalidInput(_) | GeoTileError::FootprintTooLarge { .. }
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            GeoTileError::Conflict(_) | GeoTileError::Store(StoreError::ConditionFailed)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GeoTileError::NotFound(_))
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, GeoTileError::Forbidden(_))
    }
}

impl From<serde_json::Error> for GeoTileError {
    fn from(e: serde_json::Error) -> Self {
        GeoTileError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GeoTileError>;

//! Configuration for geotile.
//!
//! Values the engine consumes globally: the footprint size ceiling, the store
//! batch size, and the buffer used to turn point queries into polygons.
use serde::de::Error;

/// Store batch-size ceiling used by index writes and query fetches.
pub const DEFAULT_BATCH_SIZE: usize = 25;

/// Most vertices a point query circle may have.
pub const MAX_POINT_BUFFER_SEGMENTS: usize = 1024;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Largest footprint (in tiles) a single item may have
    #[serde(default = "Config::default_max_item_index_size")]
    pub max_item_index_size: usize,

    /// Records per store batch call
    #[serde(default = "Config::default_batch_size")]
    pub batch_size: usize,

    /// Radius of the circle a point query is expanded into, in kilometres
    #[serde(default = "Config::default_point_buffer_km")]
    pub point_buffer_km: f64,

    /// Vertices of the circle polygon used for point queries
    #[serde(default = "Config::default_point_buffer_segments")]
    pub point_buffer_segments: usize,
}

impl Config {
    const fn default_max_item_index_size() -> usize {
        1000
    }

    const fn default_batch_size() -> usize {
        DEFAULT_BATCH_SIZE
    }

    const fn default_point_buffer_km() -> f64 {
        0.5
    }

    const fn default_point_buffer_segments() -> usize {
        64
    }

    pub fn with_max_item_index_size(mut self, size: usize) -> Self {
        assert!(size > 0, "Max item index size must be greater than zero");
        self.max_item_index_size = size;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        assert!(batch_size > 0, "Batch size must be greater than zero");
        self.batch_size = batch_size;
        self
    }

    pub fn with_point_buffer_km(mut self, km: f64) -> Self {
        self.point_buffer_km = km;
        self
    }

    pub fn with_point_buffer_segments(mut self, segments: usize) -> Self {
        self.point_buffer_segments = segments;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_item_index_size == 0 {
            return Err("Max item index size must be greater than zero".to_string());
        }

        if self.batch_size == 0 {
            return Err("Batch size must be greater than zero".to_string());
        }

        if !self.point_buffer_km.is_finite() || self.point_buffer_km <= 0.0 {
            return Err(format!(
                "Point buffer must be a positive distance, got: {}",
                self.point_buffer_km
            ));
        }

        if !(3..=MAX_POINT_BUFFER_SEGMENTS).contains(&self.point_buffer_segments) {
            return Err(format!(
                "Point buffer segments must be between 3 and {}, got: {}",
                MAX_POINT_BUFFER_SEGMENTS, self.point_buffer_segments
            ));
        }

        Ok(())
    }

    /// Read overrides from `GEOTILE_MAX_ITEM_INDEX_SIZE`, `GEOTILE_BATCH_SIZE`
    /// and `GEOTILE_POINT_BUFFER_KM`, falling back to defaults.
    pub fn from_env() -> Result<Self, String> {
        let mut config = Config::default();

        if let Some(value) = env_var("GEOTILE_MAX_ITEM_INDEX_SIZE") {
            config.max_item_index_size = value
                .parse()
                .map_err(|e| format!("GEOTILE_MAX_ITEM_INDEX_SIZE: {}", e))?;
        }

        if let Some(value) = env_var("GEOTILE_BATCH_SIZE") {
            config.batch_size = value
                .parse()
                .map_err(|e| format!("GEOTILE_BATCH_SIZE: {}", e))?;
        }

        if let Some(value) = env_var("GEOTILE_POINT_BUFFER_KM") {
            config.point_buffer_km = value
                .parse()
                .map_err(|e| format!("GEOTILE_POINT_BUFFER_KM: {}", e))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_item_index_size: Self::default_max_item_index_size(),
            batch_size: Self::default_batch_size(),
            point_buffer_km: Self::default_point_buffer_km(),
            point_buffer_segments: Self::default_point_buffer_segments(),
        }
    }
}

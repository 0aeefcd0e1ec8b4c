//! Multi-tenant GeoJSON feature store with a Morton-ordered tile index.
//!
//! ## Features
//! - **Domains**: named, owner-controlled collections of items with a fixed tile zoom
//! - **Tile index**: every item's footprint is stored as Morton-keyed index records
//! - **Spatial queries**: bounding box or point search via a coarse Morton range scan
//!   followed by an exact intersection test
//! - **Optimistic concurrency**: every domain and item write is guarded by its version
//! - **Pluggable storage**: any key-range store implementing [`Store`]
//!
//! ## Consistency
//! An item write touches the item record, its index records and the domain
//! counters in separate store calls:
//! - A failure between calls leaves the earlier writes in place
//! - Index batch failures are logged and returned, never swallowed
//! - `reindex_item` rebuilds an item's index records from its geometry
//!
//! ```rust
//! use geotile::prelude::*;
//!
//! let db = GeoStore::memory();
//! db.create_domain("alice", "parks", NewDomain::new("Parks", 12).with_access(Access::Public))?;
//!
//! let geometry = geojson::Geometry::new(geojson::Value::Point(vec![-74.0060, 40.7128]));
//! let item = db.create_item("alice", "parks", NewItem::feature(geometry))?;
//!
//! let nearby = db.query_items(None, "parks", &SpatialQuery::Point([-74.0060, 40.7128]))?;
//! assert_eq!(nearby.item_ids(), vec![item.item_id.as_str()]);
//!
//! db.delete_item("alice", "parks", &item.item_id, Some(item.version))?;
//! # Ok::<(), geotile::GeoTileError>(())
//! ```

pub mod builder;
pub mod compute;
pub mod config;
pub mod db;
pub mod error;
pub mod storage;

pub use builder::GeoStoreBuilder;
pub use config::Config;
pub use db::GeoStore;
pub use error::{GeoTileError, Result};

pub use compute::footprint::{Footprint, FootprintDiff};
pub use compute::query::{MortonRange, SpatialQuery};
pub use compute::tiles::{MAX_ZOOM, Tile};

pub use storage::{MemoryStore, StorageStats, Store, StoreError};

pub use geotile_types::{
    Access, Domain, DomainUpdate, IndexRecord, Item, ItemCollection, ItemUpdate, NewDomain,
    NewItem, QueryEcho, TileKey,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{GeoStore, GeoStoreBuilder, GeoTileError, Result};

    pub use crate::{Config, Footprint, FootprintDiff, SpatialQuery};

    pub use crate::{MemoryStore, Store};

    pub use crate::{Access, Domain, DomainUpdate, Item, ItemCollection, ItemUpdate, NewDomain, NewItem};
}

//! # geotile-types
//!
//! Wire types for the geotile feature store.
//!
//! - **Domains**: `Domain`, `NewDomain`, `DomainUpdate`, `Access`
//! - **Items**: `Item`, `NewItem`, `ItemUpdate` (GeoJSON `Feature` superset)
//! - **Tile index**: `TileKey`, `IndexRecord`
//! - **Results**: `ItemCollection`, `QueryEcho`
//!
//! All types serialize with Serde using the camelCase JSON shapes clients see.
//!
//! ## Examples
//!
//! ```rust
//! use geotile_types::domain::{Access, NewDomain};
//! use geotile_types::index::{IndexRecord, TileKey};
//!
//! let request = NewDomain::new("Parks", 12).with_access(Access::Public);
//! assert_eq!(request.zoom, 12);
//!
//! let tile = TileKey { morton: 3, x: 1, y: 1 };
//! let record = IndexRecord::new("parks", "item-1", 12, tile);
//! assert_eq!(record.indexed_domain, "parks:12");
//! ```

pub mod collection;
pub mod domain;
pub mod index;
pub mod item;

pub use collection::{ItemCollection, QueryEcho};
pub use domain::{Access, Domain, DomainUpdate, NewDomain};
pub use index::{IndexRecord, TileKey};
pub use item::{Item, ItemUpdate, NewItem};

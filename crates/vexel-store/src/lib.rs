//! Compact object storage for the Vexel drawing engine.
//!
//! Every primitive type lives in its own densely packed record table with a
//! fixed 24-byte style block per record. Variable-length data (polygon
//! vertices, text, path commands) is kept in shared arenas. A dense
//! directory maps each [`Handle`](vexel_types::Handle) to its `(type, slot)`
//! pair for O(1) lookup.
//!
//! # Components
//!
//! - [`ObjectStore`] -- record tables, handle directory, setters, deletion
//! - Group hierarchy -- ordered child lists with an acyclic invariant
//! - Spatial queries -- [`ObjectStore::find_at_point`] and [`ObjectStore::find_in_rect`]
//! - [`Transform`] -- translate / scale / rotate applied per record
//!
//! # Design Rules
//!
//! 1. Handles are issued in increasing order and never reused.
//! 2. Deletion tombstones a slot; tables are never compacted.
//! 3. Multi-handle setters resolve every handle before writing anything.
//! 4. Group bounding boxes are computed on demand, never cached.
//! 5. Queries are full scans; there is no spatial index.

pub mod config;
pub mod error;
pub mod geometry;
pub mod query;
pub mod transform;

mod extensions;
mod group;
mod record;
mod store;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use query::HitResolution;
pub use store::ObjectStore;
pub use transform::Transform;

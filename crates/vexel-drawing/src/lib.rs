//! # vexel-drawing
//!
//! The drawing-level API: a canvas, its render layers, and the object
//! store they index.
//!
//! # Key Types
//!
//! - [`Drawing`] -- canvas, layers, store; the entry point for applications
//! - [`Layer`] -- display state and the top-level handles it owns
//! - [`DrawingConfig`] -- canvas defaults and the layer cap
//!
//! # Design Rules
//!
//! 1. Every drawing starts with one layer, [`LayerId::DEFAULT`].
//! 2. A top-level object is listed by exactly one layer; group members are
//!    listed by none.
//! 3. Layers render by ascending z-index, ties in insertion order.

pub mod config;
pub mod drawing;
pub mod error;
pub mod layer;

pub use config::{DrawingConfig, MAX_LAYERS};
pub use drawing::Drawing;
pub use error::{DrawingError, DrawingResult};
pub use layer::Layer;

pub use vexel_batch::{BatchStats, Collision};
pub use vexel_store::{HitResolution, ObjectStore, StoreError, Transform};
pub use vexel_types::{
    BoundingBox, Color, Handle, LayerId, ObjectType, Point, Shape, Style,
};

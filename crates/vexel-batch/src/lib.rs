//! # vexel-batch
//!
//! Operations over many handles at once, run against an
//! [`ObjectStore`](vexel_store::ObjectStore).
//!
//! # Operations
//!
//! - [`transform`] -- translate, scale, rotate
//! - [`align`] -- edge and center alignment, distribution
//! - [`analysis`] -- combined bounding box, distances, collision pairs
//! - [`pattern`] -- grid and ring generators
//!
//! # Design Rules
//!
//! 1. A call resolves every id and validates every parameter before the
//!    first write. An unknown handle fails the whole call with the store
//!    unchanged.
//! 2. Group ids expand to their leaves; a leaf reached twice moves once.
//! 3. Mutating calls return [`BatchStats`].

pub mod align;
pub mod analysis;
pub mod error;
pub mod pattern;
mod plan;
pub mod stats;
pub mod transform;

pub use align::{
    align_bottom, align_center_horizontal, align_center_vertical, align_left, align_right,
    align_top, distribute_horizontally, distribute_vertically,
};
pub use analysis::{calculate_bounding_box, distances_to_point, find_collisions, Collision};
pub use error::{BatchError, BatchResult};
pub use pattern::{create_circular_pattern, create_grid};
pub use stats::BatchStats;
pub use transform::{rotate, scale, translate};

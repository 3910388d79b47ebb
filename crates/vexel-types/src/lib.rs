//! Foundation types for the Vexel drawing engine.
//!
//! This crate provides the value types shared by every other Vexel crate:
//! object handles, points and bounding boxes, packed colors, the compact
//! style block carried by every record, and the owned shape payloads used to
//! create, inspect, and serialize objects.
//!
//! # Key Types
//!
//! - [`Handle`] -- Stable, never-reused identifier for one stored object
//! - [`ObjectType`] -- Closed type tag for the ten primitive kinds
//! - [`Point`] / [`BoundingBox`] -- Single-precision geometry primitives
//! - [`Color`] -- 4-byte RGBA color
//! - [`Style`] -- Fixed-width style block (colors, stroke, opacity, flags, extension ids)
//! - [`Shape`] -- Tagged owned payload for every primitive kind
//! - [`PathCommand`] -- Normalized absolute path command; SVG path data is parsed with kurbo

pub mod color;
pub mod error;
pub mod geometry;
pub mod gradient;
pub mod handle;
pub mod path;
pub mod shape;
pub mod style;

pub use color::Color;
pub use error::TypeError;
pub use geometry::{BoundingBox, Point};
pub use gradient::{Gradient, GradientKind, GradientStop};
pub use handle::{Handle, ObjectType};
pub use path::{parse_svg_path, to_bez_path, PathCommand};
pub use shape::{
    Arc, Circle, Ellipse, Group, Line, LineStyle, Path, Polygon, Polyline, Rectangle, Shape,
    Text, TextAlign, VerticalAlign,
};
pub use style::{GradientId, LayerId, ObjectFlags, PatternId, Style};

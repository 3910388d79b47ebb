//! Binary layout constants.
//!
//! A file is a fixed header followed by counted sections in this order:
//! layers, one section per primitive kind, groups (children first),
//! gradients, patterns, names, metadata. All integers and floats are
//! big-endian; strings are a `u32` byte length followed by UTF-8.

use vexel_types::ObjectType;

pub const MAGIC: &[u8; 4] = b"VXDR";
pub const VERSION: u32 = 1;

/// Magic, version, width, height, background, next handle.
pub const HEADER_LEN: usize = 4 + 4 + 8 + 8 + 4 + 8;

/// Encoded size of a style block.
pub const STYLE_LEN: usize = 24;

/// Primitive sections in file order. Groups follow separately.
pub const PRIMITIVE_SECTIONS: [ObjectType; 9] = [
    ObjectType::Line,
    ObjectType::Circle,
    ObjectType::Ellipse,
    ObjectType::Rectangle,
    ObjectType::Arc,
    ObjectType::Polygon,
    ObjectType::Polyline,
    ObjectType::Text,
    ObjectType::Path,
];

pub const TEXT_BOLD: u8 = 0b01;
pub const TEXT_ITALIC: u8 = 0b10;

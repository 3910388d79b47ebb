//! Owned shape payloads.
//!
//! These are the exchange form of stored geometry: callers build them to
//! create objects and receive them when inspecting a handle. The store keeps
//! its own packed representation and converts at the boundary.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::handle::{Handle, ObjectType};
use crate::path::PathCommand;

/// Stroke dash pattern for open shapes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LineStyle {
    #[default]
    Solid = 0,
    Dashed = 1,
    Dotted = 2,
    DashDot = 3,
}

impl LineStyle {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Solid),
            1 => Some(Self::Dashed),
            2 => Some(Self::Dotted),
            3 => Some(Self::DashDot),
            _ => None,
        }
    }
}

/// Horizontal anchor of a text label relative to its position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TextAlign {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

impl TextAlign {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Left),
            1 => Some(Self::Center),
            2 => Some(Self::Right),
            _ => None,
        }
    }
}

/// Vertical anchor of a text label. `Bottom` places the position on the
/// baseline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum VerticalAlign {
    Top = 0,
    Middle = 1,
    #[default]
    Bottom = 2,
}

impl VerticalAlign {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Top),
            1 => Some(Self::Middle),
            2 => Some(Self::Bottom),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Point,
    pub end: Point,
    pub line_style: LineStyle,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point,
    pub radius: f32,
}

/// Ellipse with semi-axes `rx`, `ry`; `rotation` is radians.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub center: Point,
    pub rx: f32,
    pub ry: f32,
    pub rotation: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub top_left: Point,
    pub width: f32,
    pub height: f32,
    pub corner_radius: f32,
}

/// Circular arc. Angles are radians, measured from +x towards +y.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub center: Point,
    pub radius: f32,
    pub start_angle: f32,
    pub end_angle: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub points: Vec<Point>,
    pub closed: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub points: Vec<Point>,
    pub line_style: LineStyle,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub position: Point,
    pub content: String,
    pub font_family: String,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub align: TextAlign,
    pub vertical_align: VerticalAlign,
}

impl Text {
    /// Plain text in the default font family at `font_size`.
    pub fn new(position: Point, content: impl Into<String>, font_size: f32) -> Self {
        Self {
            position,
            content: content.into(),
            font_family: "Arial".to_string(),
            font_size,
            bold: false,
            italic: false,
            align: TextAlign::Left,
            vertical_align: VerticalAlign::Bottom,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub commands: Vec<PathCommand>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub children: Vec<Handle>,
}

/// Owned geometry of any primitive kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Line(Line),
    Circle(Circle),
    Ellipse(Ellipse),
    Rectangle(Rectangle),
    Polygon(Polygon),
    Polyline(Polyline),
    Arc(Arc),
    Text(Text),
    Path(Path),
    Group(Group),
}

impl Shape {
    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::Line(_) => ObjectType::Line,
            Self::Circle(_) => ObjectType::Circle,
            Self::Ellipse(_) => ObjectType::Ellipse,
            Self::Rectangle(_) => ObjectType::Rectangle,
            Self::Polygon(_) => ObjectType::Polygon,
            Self::Polyline(_) => ObjectType::Polyline,
            Self::Arc(_) => ObjectType::Arc,
            Self::Text(_) => ObjectType::Text,
            Self::Path(_) => ObjectType::Path,
            Self::Group(_) => ObjectType::Group,
        }
    }
}

//! Serde model of the interchange JSON document.
//!
//! Field names and defaults follow the interchange schema: angles are
//! degrees, colors carry a unit-interval alpha, and every object records its
//! `type` inline next to its common attributes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use vexel_types::{Color, LineStyle, Point, TextAlign, VerticalAlign};

fn default_name() -> String {
    "Untitled Drawing".to_string()
}

fn default_true() -> bool {
    true
}

fn default_one() -> f32 {
    1.0
}

fn default_alpha() -> f64 {
    1.0
}

fn default_stroke() -> Option<ColorDoc> {
    Some(Color::BLACK.into())
}

fn default_font_family() -> String {
    "Arial".to_string()
}

fn default_font_size() -> f32 {
    12.0
}

fn default_normal() -> String {
    "normal".to_string()
}

fn default_background() -> ColorDoc {
    Color::WHITE.into()
}

/// Whole-drawing document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrawingDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default = "default_name")]
    pub name: String,
    pub width: f64,
    pub height: f64,
    #[serde(alias = "background", default = "default_background")]
    pub background_color: ColorDoc,
    #[serde(default)]
    pub layers: Vec<LayerDoc>,
    /// Accepted on input but not stored.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorDoc {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Alpha in `[0, 1]`.
    #[serde(default = "default_alpha")]
    pub a: f64,
}

impl From<Color> for ColorDoc {
    fn from(c: Color) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: f64::from(c.alpha_unit()),
        }
    }
}

impl From<ColorDoc> for Color {
    fn from(c: ColorDoc) -> Self {
        Color::with_unit_alpha(c.r, c.g, c.b, c.a)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointDoc {
    pub x: f32,
    pub y: f32,
}

impl From<Point> for PointDoc {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<PointDoc> for Point {
    fn from(p: PointDoc) -> Self {
        Point::new(p.x, p.y)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_one")]
    pub opacity: f32,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default)]
    pub objects: Vec<ObjectDoc>,
}

/// One object: common attributes plus its tagged geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectDoc {
    #[serde(flatten)]
    pub common: CommonDoc,
    #[serde(flatten)]
    pub shape: ShapeDoc,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommonDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Absent means black; `null` means no stroke.
    #[serde(default = "default_stroke")]
    pub stroke_color: Option<ColorDoc>,
    #[serde(default = "default_one")]
    pub stroke_width: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<FillDoc>,
    #[serde(default = "default_one")]
    pub opacity: f32,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FillDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<GradientDoc>,
    /// Pattern name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientTypeDoc {
    Linear,
    Radial,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientDoc {
    #[serde(rename = "type")]
    pub kind: GradientTypeDoc,
    pub stops: Vec<StopDoc>,
    /// Linear direction, degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<PointDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StopDoc {
    pub offset: f32,
    pub color: ColorDoc,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathCommandDoc {
    /// SVG command letter; relative and shorthand letters are accepted.
    pub command: String,
    #[serde(default)]
    pub params: Vec<f32>,
}

/// Geometry by object type. Angles are degrees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeDoc {
    Line {
        start_point: PointDoc,
        end_point: PointDoc,
        #[serde(default)]
        line_style: LineStyle,
    },
    Circle {
        center: PointDoc,
        radius: f32,
    },
    Ellipse {
        center: PointDoc,
        rx: f32,
        ry: f32,
        #[serde(default)]
        rotation: f32,
    },
    Rectangle {
        top_left: PointDoc,
        width: f32,
        height: f32,
        #[serde(default)]
        corner_radius: f32,
    },
    Polygon {
        points: Vec<PointDoc>,
        #[serde(default = "default_true")]
        closed: bool,
    },
    Polyline {
        points: Vec<PointDoc>,
        #[serde(default)]
        line_style: LineStyle,
    },
    Arc {
        center: PointDoc,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
    },
    Text {
        position: PointDoc,
        content: String,
        #[serde(default = "default_font_family")]
        font_family: String,
        #[serde(default = "default_font_size")]
        font_size: f32,
        #[serde(default = "default_normal")]
        font_weight: String,
        #[serde(default = "default_normal")]
        font_style: String,
        #[serde(default)]
        text_alignment: TextAlign,
        #[serde(default)]
        vertical_alignment: VerticalAlign,
    },
    Path {
        commands: Vec<PathCommandDoc>,
    },
    Group {
        #[serde(default)]
        objects: Vec<ObjectDoc>,
    },
}

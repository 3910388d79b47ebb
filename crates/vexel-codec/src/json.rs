//! Conversion between drawings and the interchange JSON document.
//!
//! Export walks each layer's top-level objects and nests group members
//! under their group. Import rebuilds the drawing from scratch: handles are
//! assigned afresh, identical gradients share one table entry, and patterns
//! are looked up by name.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;
use vexel_drawing::{Drawing, DrawingConfig, Layer};
use vexel_store::ObjectStore;
use vexel_types::{
    Arc, Circle, Ellipse, Gradient, GradientId, GradientKind, GradientStop, Handle, LayerId,
    Line, ObjectFlags, PatternId, Polygon, Polyline, Rectangle, Shape, Style, Text,
};

use crate::config::CodecConfig;
use crate::document::{
    ColorDoc, CommonDoc, DrawingDoc, FillDoc, GradientDoc, GradientTypeDoc, LayerDoc, ObjectDoc,
    PathCommandDoc, PointDoc, ShapeDoc, StopDoc,
};
use crate::error::{CodecError, CodecResult};

const OBJECT_ID_PREFIX: u64 = 0x7665_7865_6c5f_6f62;
const LAYER_ID_PREFIX: u64 = 0x7665_7865_6c5f_6c79;

/// Stable document id for a handle.
pub fn object_uuid(handle: Handle) -> Uuid {
    Uuid::from_u64_pair(OBJECT_ID_PREFIX, handle.get())
}

/// Stable document id for a layer.
pub fn layer_uuid(layer: LayerId) -> Uuid {
    Uuid::from_u64_pair(LAYER_ID_PREFIX, u64::from(layer.0))
}

// ----------------------------------------------------------------------
// Export
// ----------------------------------------------------------------------

/// Build the interchange document for `drawing`.
///
/// An object that belongs to several groups is written once under each.
pub fn to_document(drawing: &Drawing) -> CodecResult<DrawingDoc> {
    let store = drawing.store();
    let mut layers = Vec::with_capacity(drawing.layers().len());
    for layer in drawing.layers() {
        let owner = layer_uuid(layer.id);
        let objects = layer
            .objects
            .iter()
            .map(|&h| export_object(store, h, owner))
            .collect::<CodecResult<Vec<_>>>()?;
        layers.push(LayerDoc {
            id: Some(owner),
            name: layer.name.clone(),
            visible: layer.visible,
            locked: layer.locked,
            opacity: layer.opacity,
            z_index: layer.z_index,
            objects,
        });
    }
    Ok(DrawingDoc {
        id: None,
        name: drawing.name().to_string(),
        width: drawing.width(),
        height: drawing.height(),
        background_color: drawing.background().into(),
        layers,
        metadata: BTreeMap::new(),
    })
}

fn export_object(store: &ObjectStore, handle: Handle, owner: Uuid) -> CodecResult<ObjectDoc> {
    let style = store.style(handle)?;
    let shape = match store.shape(handle)? {
        Shape::Group(g) => ShapeDoc::Group {
            objects: g
                .children
                .iter()
                .map(|&c| export_object(store, c, owner))
                .collect::<CodecResult<Vec<_>>>()?,
        },
        other => export_shape(other),
    };

    let gradient = style
        .gradient
        .and_then(|id| store.gradient(id))
        .map(export_gradient);
    let pattern = style
        .pattern
        .and_then(|id| store.pattern(id))
        .map(str::to_string);
    let fill_color = style.fill_color().map(ColorDoc::from);
    let fill = (fill_color.is_some() || gradient.is_some() || pattern.is_some()).then(|| {
        FillDoc {
            color: fill_color,
            gradient,
            pattern,
        }
    });

    let metadata: BTreeMap<String, Value> = store
        .all_metadata(handle)
        .map(|m| {
            m.iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect()
        })
        .unwrap_or_default();

    Ok(ObjectDoc {
        common: CommonDoc {
            id: Some(object_uuid(handle)),
            name: store.name(handle).map(str::to_string),
            stroke_color: style.stroke_color().map(ColorDoc::from),
            stroke_width: style.stroke_width,
            fill,
            opacity: style.opacity,
            visible: style.is_visible(),
            locked: style.is_locked(),
            layer_id: Some(owner),
            metadata,
        },
        shape,
    })
}

fn export_shape(shape: Shape) -> ShapeDoc {
    match shape {
        Shape::Line(l) => ShapeDoc::Line {
            start_point: l.start.into(),
            end_point: l.end.into(),
            line_style: l.line_style,
        },
        Shape::Circle(c) => ShapeDoc::Circle {
            center: c.center.into(),
            radius: c.radius,
        },
        Shape::Ellipse(e) => ShapeDoc::Ellipse {
            center: e.center.into(),
            rx: e.rx,
            ry: e.ry,
            rotation: e.rotation.to_degrees(),
        },
        Shape::Rectangle(r) => ShapeDoc::Rectangle {
            top_left: r.top_left.into(),
            width: r.width,
            height: r.height,
            corner_radius: r.corner_radius,
        },
        Shape::Polygon(p) => ShapeDoc::Polygon {
            points: p.points.into_iter().map(PointDoc::from).collect(),
            closed: p.closed,
        },
        Shape::Polyline(p) => ShapeDoc::Polyline {
            points: p.points.into_iter().map(PointDoc::from).collect(),
            line_style: p.line_style,
        },
        Shape::Arc(a) => ShapeDoc::Arc {
            center: a.center.into(),
            radius: a.radius,
            start_angle: a.start_angle.to_degrees(),
            end_angle: a.end_angle.to_degrees(),
        },
        Shape::Text(t) => ShapeDoc::Text {
            position: t.position.into(),
            content: t.content,
            font_family: t.font_family,
            font_size: t.font_size,
            font_weight: if t.bold { "bold" } else { "normal" }.to_string(),
            font_style: if t.italic { "italic" } else { "normal" }.to_string(),
            text_alignment: t.align,
            vertical_alignment: t.vertical_align,
        },
        Shape::Path(p) => ShapeDoc::Path {
            commands: p
                .commands
                .iter()
                .map(|c| PathCommandDoc {
                    command: c.letter().to_string(),
                    params: c.params(),
                })
                .collect(),
        },
        // Groups are expanded by the caller.
        Shape::Group(_) => ShapeDoc::Group {
            objects: Vec::new(),
        },
    }
}

fn export_gradient(gradient: &Gradient) -> GradientDoc {
    let stops = gradient
        .stops
        .iter()
        .map(|s| StopDoc {
            offset: s.offset,
            color: s.color.into(),
        })
        .collect();
    match gradient.kind {
        GradientKind::Linear { angle } => GradientDoc {
            kind: GradientTypeDoc::Linear,
            stops,
            angle: Some(angle.to_degrees()),
            center: None,
            radius: None,
        },
        GradientKind::Radial { center, radius } => GradientDoc {
            kind: GradientTypeDoc::Radial,
            stops,
            angle: None,
            center: Some(center.into()),
            radius: Some(radius),
        },
    }
}

// ----------------------------------------------------------------------
// Import
// ----------------------------------------------------------------------

/// Rebuild a drawing from an interchange document.
///
/// Layers take ids in document order. A document without layers gets the
/// default layer. Object `id` and `layer_id` fields are not consulted:
/// containment decides membership.
pub fn from_document(doc: DrawingDoc) -> CodecResult<Drawing> {
    if !doc.metadata.is_empty() {
        warn!(
            keys = doc.metadata.len(),
            "drawing-level metadata is not stored; ignoring"
        );
    }
    let config = DrawingConfig {
        name: doc.name,
        width: doc.width,
        height: doc.height,
        background: doc.background_color.into(),
        ..DrawingConfig::default()
    };

    let mut importer = Importer::default();
    let mut layers = Vec::with_capacity(doc.layers.len().max(1));
    for (index, layer_doc) in doc.layers.iter().enumerate() {
        let id = u8::try_from(index)
            .map(LayerId)
            .map_err(|_| invalid(format!("too many layers ({})", doc.layers.len())))?;
        let mut layer = Layer::new(id, layer_doc.name.clone());
        layer.visible = layer_doc.visible;
        layer.locked = layer_doc.locked;
        layer.opacity = unit(layer_doc.opacity);
        layer.z_index = layer_doc.z_index;
        for object in &layer_doc.objects {
            let handle = importer.object(object, id)?;
            layer.objects.push(handle);
        }
        layers.push(layer);
    }
    if layers.is_empty() {
        layers.push(Layer::new(LayerId::DEFAULT, config.default_layer_name.clone()));
    }

    let drawing = Drawing::from_parts(config, importer.store, layers)?;
    debug!(
        layers = drawing.layers().len(),
        objects = drawing.total_objects(),
        "drawing imported"
    );
    Ok(drawing)
}

#[derive(Default)]
struct Importer {
    store: ObjectStore,
    gradients: Vec<(Gradient, GradientId)>,
    patterns: HashMap<String, PatternId>,
}

impl Importer {
    fn object(&mut self, doc: &ObjectDoc, layer: LayerId) -> CodecResult<Handle> {
        let style = self.style(&doc.common, layer)?;
        let handle = match &doc.shape {
            ShapeDoc::Group { objects } => {
                let children = objects
                    .iter()
                    .map(|o| self.object(o, layer))
                    .collect::<CodecResult<Vec<_>>>()?;
                self.store.add_group(&children, style)?
            }
            other => self.store.add(import_shape(other)?, style)?,
        };
        if let Some(name) = &doc.common.name {
            self.store.set_name(&[handle], name)?;
        }
        for (key, value) in &doc.common.metadata {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            self.store.set_metadata(&[handle], key, &text)?;
        }
        Ok(handle)
    }

    fn style(&mut self, doc: &CommonDoc, layer: LayerId) -> CodecResult<Style> {
        if !(doc.stroke_width.is_finite() && doc.stroke_width >= 0.0) {
            return Err(invalid(format!(
                "stroke width must be non-negative, got {}",
                doc.stroke_width
            )));
        }
        let mut style = Style::default().on_layer(layer);
        style.stroke_width = doc.stroke_width;
        style.set_opacity(doc.opacity);
        match doc.stroke_color {
            Some(c) => style.stroke = c.into(),
            None => style.flags.remove(ObjectFlags::HAS_STROKE),
        }
        style.flags.set(ObjectFlags::VISIBLE, doc.visible);
        style.flags.set(ObjectFlags::LOCKED, doc.locked);

        if let Some(fill) = &doc.fill {
            if let Some(c) = fill.color {
                style = style.with_fill(c.into());
            }
            if let Some(g) = &fill.gradient {
                style.gradient = Some(self.gradient(g)?);
            }
            if let Some(p) = &fill.pattern {
                style.pattern = Some(self.pattern(p)?);
            }
        }
        Ok(style)
    }

    fn gradient(&mut self, doc: &GradientDoc) -> CodecResult<GradientId> {
        let stops = doc
            .stops
            .iter()
            .map(|s| GradientStop::new(s.offset, s.color.into()))
            .collect();
        let gradient = match doc.kind {
            GradientTypeDoc::Linear => {
                Gradient::linear(stops, doc.angle.unwrap_or(0.0).to_radians())
            }
            GradientTypeDoc::Radial => {
                let (Some(center), Some(radius)) = (doc.center, doc.radius) else {
                    return Err(invalid("radial gradient needs a center and a radius"));
                };
                Gradient::radial(stops, center.into(), radius)
            }
        };
        if let Some((_, id)) = self.gradients.iter().find(|(g, _)| *g == gradient) {
            return Ok(*id);
        }
        let id = match gradient.kind {
            GradientKind::Linear { angle } => self
                .store
                .add_linear_gradient(gradient.stops.clone(), angle)?,
            GradientKind::Radial { center, radius } => {
                self.store
                    .add_radial_gradient(gradient.stops.clone(), center, radius)?
            }
        };
        self.gradients.push((gradient, id));
        Ok(id)
    }

    fn pattern(&mut self, name: &str) -> CodecResult<PatternId> {
        if let Some(id) = self.patterns.get(name) {
            return Ok(*id);
        }
        let id = self.store.add_pattern(name)?;
        self.patterns.insert(name.to_string(), id);
        Ok(id)
    }
}

fn import_shape(doc: &ShapeDoc) -> CodecResult<Shape> {
    let shape = match doc {
        ShapeDoc::Line {
            start_point,
            end_point,
            line_style,
        } => Shape::Line(Line {
            start: (*start_point).into(),
            end: (*end_point).into(),
            line_style: *line_style,
        }),
        ShapeDoc::Circle { center, radius } => Shape::Circle(Circle {
            center: (*center).into(),
            radius: *radius,
        }),
        ShapeDoc::Ellipse {
            center,
            rx,
            ry,
            rotation,
        } => Shape::Ellipse(Ellipse {
            center: (*center).into(),
            rx: *rx,
            ry: *ry,
            rotation: rotation.to_radians(),
        }),
        ShapeDoc::Rectangle {
            top_left,
            width,
            height,
            corner_radius,
        } => Shape::Rectangle(Rectangle {
            top_left: (*top_left).into(),
            width: *width,
            height: *height,
            corner_radius: *corner_radius,
        }),
        ShapeDoc::Polygon { points, closed } => Shape::Polygon(Polygon {
            points: points.iter().map(|&p| p.into()).collect(),
            closed: *closed,
        }),
        ShapeDoc::Polyline { points, line_style } => Shape::Polyline(Polyline {
            points: points.iter().map(|&p| p.into()).collect(),
            line_style: *line_style,
        }),
        ShapeDoc::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        } => Shape::Arc(Arc {
            center: (*center).into(),
            radius: *radius,
            start_angle: start_angle.to_radians(),
            end_angle: end_angle.to_radians(),
        }),
        ShapeDoc::Text {
            position,
            content,
            font_family,
            font_size,
            font_weight,
            font_style,
            text_alignment,
            vertical_alignment,
        } => Shape::Text(Text {
            position: (*position).into(),
            content: content.clone(),
            font_family: font_family.clone(),
            font_size: *font_size,
            bold: is_bold(font_weight),
            italic: matches!(font_style.as_str(), "italic" | "oblique"),
            align: *text_alignment,
            vertical_align: *vertical_alignment,
        }),
        ShapeDoc::Path { commands } => Shape::Path(vexel_types::Path {
            commands: vexel_types::parse_svg_path(&path_data(commands)?)?,
        }),
        ShapeDoc::Group { .. } => {
            return Err(invalid("group geometry is built from its members"));
        }
    };
    Ok(shape)
}

/// Reassemble command records as SVG path data so relative and shorthand
/// commands resolve against the running point.
fn path_data(commands: &[PathCommandDoc]) -> CodecResult<String> {
    let mut data = String::new();
    for cmd in commands {
        let mut letters = cmd.command.chars();
        match (letters.next(), letters.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => data.push(c),
            _ => {
                return Err(invalid(format!(
                    "path command must be one letter, got {:?}",
                    cmd.command
                )));
            }
        }
        for v in &cmd.params {
            if !v.is_finite() {
                return Err(invalid(format!("non-finite path parameter {v}")));
            }
            data.push(' ');
            data.push_str(&v.to_string());
        }
        data.push(' ');
    }
    Ok(data)
}

fn is_bold(weight: &str) -> bool {
    match weight {
        "bold" | "bolder" => true,
        w => w.parse::<u16>().is_ok_and(|n| n >= 600),
    }
}

fn unit(v: f32) -> f32 {
    if v.is_nan() {
        1.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

fn invalid(reason: impl Into<String>) -> CodecError {
    CodecError::InvalidDocument(reason.into())
}

// ----------------------------------------------------------------------
// Text and files
// ----------------------------------------------------------------------

pub fn to_json(drawing: &Drawing, config: &CodecConfig) -> CodecResult<String> {
    let doc = to_document(drawing)?;
    let text = if config.pretty_json {
        serde_json::to_string_pretty(&doc)?
    } else {
        serde_json::to_string(&doc)?
    };
    Ok(text)
}

pub fn from_json(text: &str) -> CodecResult<Drawing> {
    let doc: DrawingDoc = serde_json::from_str(text)?;
    from_document(doc)
}

pub fn save_json(drawing: &Drawing, path: &Path, config: &CodecConfig) -> CodecResult<()> {
    let text = to_json(drawing, config)?;
    std::fs::write(path, text)?;
    debug!(path = %path.display(), "drawing saved as JSON");
    Ok(())
}

pub fn load_json(path: &Path) -> CodecResult<Drawing> {
    let text = std::fs::read_to_string(path)?;
    from_json(&text)
}

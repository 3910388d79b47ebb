use std::collections::{BTreeMap, HashMap};
use std::mem::size_of;

use tracing::debug;
use vexel_types::{
    Arc, BoundingBox, Circle, Color, Ellipse, Gradient, GradientId, GradientStop, Handle, LayerId,
    Line, ObjectFlags, ObjectType, Path, PathCommand, PatternId, Point, Polygon, Polyline,
    Rectangle, Shape, Style, Text,
};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::extensions::ExtensionTables;
use crate::geometry;
use crate::record::{
    ArcRecord, CircleRecord, Column, EllipseRecord, GroupRecord, LineRecord, Locator,
    PathRecord, PolygonRecord, PolylineRecord, RectRecord, Span, Table, TextRecord, TEXT_BOLD,
    TEXT_ITALIC,
};

/// Type-partitioned object store.
///
/// Each primitive type has its own dense record table. A directory indexed
/// by handle maps every live handle to its `(type, slot)` pair, so lookups
/// are O(1) and handles stay valid across unrelated inserts and deletes.
/// Deleted slots are tombstoned and never reused.
///
/// All multi-handle setters validate every handle before writing anything.
#[derive(Debug)]
pub struct ObjectStore {
    pub(crate) config: StoreConfig,
    pub(crate) directory: Vec<Option<Locator>>,
    pub(crate) next_handle: Handle,

    pub(crate) lines: Table<LineRecord>,
    pub(crate) circles: Table<CircleRecord>,
    pub(crate) ellipses: Table<EllipseRecord>,
    pub(crate) rects: Table<RectRecord>,
    pub(crate) polygons: Table<PolygonRecord>,
    pub(crate) polylines: Table<PolylineRecord>,
    pub(crate) arcs: Table<ArcRecord>,
    pub(crate) texts: Table<TextRecord>,
    pub(crate) paths: Table<PathRecord>,
    pub(crate) groups: Table<GroupRecord>,

    /// Shared arena for polygon and polyline vertices.
    pub(crate) points: Vec<Point>,
    /// Concatenated text content.
    pub(crate) text: String,
    pub(crate) fonts: Vec<String>,
    font_ids: HashMap<String, u16>,
    font_bytes: usize,
    pub(crate) commands: Vec<PathCommand>,

    /// Reverse edges of the group hierarchy: child -> containing groups.
    pub(crate) parents: HashMap<Handle, Vec<Handle>>,
    pub(crate) child_links: usize,

    pub(crate) ext: ExtensionTables,
}

impl Default for ObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Flags the store owns; callers cannot set them through a style.
const DERIVED_FLAGS: ObjectFlags = ObjectFlags::HAS_NAME
    .union(ObjectFlags::HAS_METADATA)
    .union(ObjectFlags::GROUPED);

fn check_finite(p: Point, what: &str) -> StoreResult<()> {
    if p.is_finite() {
        Ok(())
    } else {
        Err(StoreError::InvalidGeometry(format!("{what} is not finite")))
    }
}

fn check_positive(v: f32, what: &str) -> StoreResult<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(StoreError::InvalidGeometry(format!(
            "{what} must be positive, got {v}"
        )))
    }
}

fn check_scalar(v: f32, what: &str) -> StoreResult<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(StoreError::InvalidGeometry(format!("{what} is not finite")))
    }
}

fn check_stroke_width(width: f32) -> StoreResult<()> {
    if width.is_finite() && width >= 0.0 {
        Ok(())
    } else {
        Err(StoreError::InvalidGeometry(format!(
            "stroke width must be non-negative, got {width}"
        )))
    }
}

fn check_points(points: &[Point], min: usize, what: &str) -> StoreResult<()> {
    if points.len() < min {
        return Err(StoreError::InvalidGeometry(format!(
            "{what} needs at least {min} points, got {}",
            points.len()
        )));
    }
    points.iter().try_for_each(|p| check_finite(*p, what))
}

/// Reject geometry the store cannot represent.
pub(crate) fn validate_shape(shape: &Shape) -> StoreResult<()> {
    match shape {
        Shape::Line(l) => {
            check_finite(l.start, "line start")?;
            check_finite(l.end, "line end")
        }
        Shape::Circle(c) => {
            check_finite(c.center, "circle center")?;
            check_positive(c.radius, "circle radius")
        }
        Shape::Ellipse(e) => {
            check_finite(e.center, "ellipse center")?;
            check_positive(e.rx, "ellipse rx")?;
            check_positive(e.ry, "ellipse ry")?;
            check_scalar(e.rotation, "ellipse rotation")
        }
        Shape::Rectangle(r) => {
            check_finite(r.top_left, "rectangle corner")?;
            check_positive(r.width, "rectangle width")?;
            check_positive(r.height, "rectangle height")?;
            if !(r.corner_radius.is_finite() && r.corner_radius >= 0.0) {
                return Err(StoreError::InvalidGeometry(format!(
                    "corner radius must be non-negative, got {}",
                    r.corner_radius
                )));
            }
            Ok(())
        }
        Shape::Polygon(p) => check_points(&p.points, 3, "polygon"),
        Shape::Polyline(p) => check_points(&p.points, 2, "polyline"),
        Shape::Arc(a) => {
            check_finite(a.center, "arc center")?;
            check_positive(a.radius, "arc radius")?;
            check_scalar(a.start_angle, "arc start angle")?;
            check_scalar(a.end_angle, "arc end angle")
        }
        Shape::Text(t) => {
            check_finite(t.position, "text position")?;
            check_positive(t.font_size, "font size")
        }
        Shape::Path(p) => {
            if p.commands.is_empty() {
                return Err(StoreError::InvalidGeometry("path has no commands".into()));
            }
            if !matches!(p.commands[0], PathCommand::MoveTo(_)) {
                return Err(StoreError::InvalidGeometry(
                    "path must begin with a moveto".into(),
                ));
            }
            if p.commands.iter().all(PathCommand::is_finite) {
                Ok(())
            } else {
                Err(StoreError::InvalidGeometry("path parameter is not finite".into()))
            }
        }
        Shape::Group(_) => Ok(()),
    }
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        let n = config.initial_capacity;
        Self {
            directory: Vec::with_capacity(n),
            next_handle: Handle::FIRST,
            lines: Table::with_capacity(n),
            circles: Table::with_capacity(n),
            ellipses: Table::with_capacity(n),
            rects: Table::with_capacity(n),
            polygons: Table::with_capacity(n),
            polylines: Table::with_capacity(n),
            arcs: Table::with_capacity(n),
            texts: Table::with_capacity(n),
            paths: Table::with_capacity(n),
            groups: Table::with_capacity(n),
            points: Vec::new(),
            text: String::new(),
            fonts: Vec::new(),
            font_ids: HashMap::new(),
            font_bytes: 0,
            commands: Vec::new(),
            parents: HashMap::new(),
            child_links: 0,
            ext: ExtensionTables::default(),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The configured default style.
    pub fn default_style(&self) -> Style {
        self.config.default_style
    }

    // ------------------------------------------------------------------
    // Handles and lookup
    // ------------------------------------------------------------------

    /// The handle the next insert will receive.
    pub fn next_handle(&self) -> Handle {
        self.next_handle
    }

    /// Advance the handle counter so the next insert receives at least
    /// `next`. Never moves the counter backwards.
    pub fn resume_handles_at(&mut self, next: Handle) {
        if next > self.next_handle {
            self.next_handle = next;
        }
    }

    pub(crate) fn allocate(&mut self) -> StoreResult<Handle> {
        let handle = self.next_handle;
        if handle.get() == u64::MAX {
            return Err(StoreError::CapacityExceeded("handle space exhausted".into()));
        }
        self.next_handle = handle.next();
        Ok(handle)
    }

    fn check_handle_room(&self, additional: usize) -> StoreResult<()> {
        let fits = u64::try_from(additional)
            .ok()
            .and_then(|n| self.next_handle.get().checked_add(n))
            .is_some();
        if fits {
            Ok(())
        } else {
            Err(StoreError::CapacityExceeded(format!(
                "{additional} more handles exceed the handle space"
            )))
        }
    }

    pub(crate) fn locate(&self, handle: Handle) -> StoreResult<Locator> {
        self.directory
            .get(handle.index())
            .copied()
            .flatten()
            .ok_or(StoreError::NotFound(handle))
    }

    /// Resolve every handle up front, failing on the first unknown one.
    pub(crate) fn locate_all(&self, handles: &[Handle]) -> StoreResult<Vec<Locator>> {
        handles.iter().map(|h| self.locate(*h)).collect()
    }

    pub(crate) fn bind(&mut self, handle: Handle, loc: Locator) {
        let idx = handle.index();
        if idx >= self.directory.len() {
            self.directory.resize(idx + 1, None);
        }
        self.directory[idx] = Some(loc);
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.locate(handle).is_ok()
    }

    pub fn get_type(&self, handle: Handle) -> StoreResult<ObjectType> {
        self.locate(handle).map(|loc| loc.kind)
    }

    /// Every live handle in ascending order.
    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.directory
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .filter_map(|(i, _)| Handle::from_raw(i as u64 + 1))
    }

    /// Live handles of one type, in insertion order.
    pub fn handles_of(&self, kind: ObjectType) -> Vec<Handle> {
        macro_rules! live {
            ($table:expr) => {
                $table.iter_live().map(|(h, _, _)| h).collect()
            };
        }
        match kind {
            ObjectType::Line => live!(self.lines),
            ObjectType::Circle => live!(self.circles),
            ObjectType::Ellipse => live!(self.ellipses),
            ObjectType::Rectangle => live!(self.rects),
            ObjectType::Polygon => live!(self.polygons),
            ObjectType::Polyline => live!(self.polylines),
            ObjectType::Arc => live!(self.arcs),
            ObjectType::Text => live!(self.texts),
            ObjectType::Path => live!(self.paths),
            ObjectType::Group => live!(self.groups),
        }
    }

    pub(crate) fn column(&self, kind: ObjectType) -> &dyn Column {
        match kind {
            ObjectType::Line => &self.lines,
            ObjectType::Circle => &self.circles,
            ObjectType::Ellipse => &self.ellipses,
            ObjectType::Rectangle => &self.rects,
            ObjectType::Polygon => &self.polygons,
            ObjectType::Polyline => &self.polylines,
            ObjectType::Arc => &self.arcs,
            ObjectType::Text => &self.texts,
            ObjectType::Path => &self.paths,
            ObjectType::Group => &self.groups,
        }
    }

    pub(crate) fn column_mut(&mut self, kind: ObjectType) -> &mut dyn Column {
        match kind {
            ObjectType::Line => &mut self.lines,
            ObjectType::Circle => &mut self.circles,
            ObjectType::Ellipse => &mut self.ellipses,
            ObjectType::Rectangle => &mut self.rects,
            ObjectType::Polygon => &mut self.polygons,
            ObjectType::Polyline => &mut self.polylines,
            ObjectType::Arc => &mut self.arcs,
            ObjectType::Text => &mut self.texts,
            ObjectType::Path => &mut self.paths,
            ObjectType::Group => &mut self.groups,
        }
    }

    /// Number of live objects of every type.
    pub fn total_objects(&self) -> usize {
        ObjectType::ALL.iter().map(|k| self.count(*k)).sum()
    }

    /// Number of live objects of one type.
    pub fn count(&self, kind: ObjectType) -> usize {
        self.column(kind).live_len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_objects() == 0
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// Store a new object and return its handle.
    ///
    /// Group payloads are linked to their children with the usual cycle and
    /// existence checks; see [`ObjectStore::add_group`].
    pub fn add(&mut self, shape: Shape, style: Style) -> StoreResult<Handle> {
        if let Shape::Group(g) = shape {
            return self.add_group(&g.children, style);
        }
        validate_shape(&shape)?;
        let style = self.admit_style(style)?;
        let handle = self.allocate()?;
        let loc = self.place(handle, shape, style)?;
        self.bind(handle, loc);
        Ok(handle)
    }

    /// Make room for `additional` new records of `kind`.
    ///
    /// Fails with [`StoreError::CapacityExceeded`] when the type table or
    /// the handle space cannot take that many more records.
    pub fn reserve(&mut self, kind: ObjectType, additional: usize) -> StoreResult<()> {
        self.check_handle_room(additional)?;
        self.column_mut(kind).try_reserve(additional)?;
        self.directory
            .try_reserve(additional)
            .map_err(|e| StoreError::CapacityExceeded(e.to_string()))
    }

    /// Add every shape with one shared style.
    ///
    /// All shapes are validated and room for them is reserved before the
    /// first record is written, so a rejected shape adds nothing. Groups
    /// must go through [`ObjectStore::add_group`].
    pub fn add_all(&mut self, shapes: Vec<Shape>, style: Style) -> StoreResult<Vec<Handle>> {
        let mut counts: BTreeMap<ObjectType, usize> = BTreeMap::new();
        for shape in &shapes {
            if matches!(shape, Shape::Group(_)) {
                return Err(StoreError::InvalidGeometry(
                    "groups cannot be added in bulk".into(),
                ));
            }
            validate_shape(shape)?;
            *counts.entry(shape.object_type()).or_default() += 1;
        }
        let style = self.admit_style(style)?;
        self.check_handle_room(shapes.len())?;
        for (kind, n) in counts {
            self.reserve(kind, n)?;
        }
        let mut out = Vec::with_capacity(shapes.len());
        for shape in shapes {
            let handle = self.allocate()?;
            let loc = self.place(handle, shape, style)?;
            self.bind(handle, loc);
            out.push(handle);
        }
        Ok(out)
    }

    pub fn add_line(&mut self, line: Line, style: Style) -> StoreResult<Handle> {
        self.add(Shape::Line(line), style)
    }

    pub fn add_circle(&mut self, circle: Circle, style: Style) -> StoreResult<Handle> {
        self.add(Shape::Circle(circle), style)
    }

    pub fn add_ellipse(&mut self, ellipse: Ellipse, style: Style) -> StoreResult<Handle> {
        self.add(Shape::Ellipse(ellipse), style)
    }

    pub fn add_rectangle(&mut self, rect: Rectangle, style: Style) -> StoreResult<Handle> {
        self.add(Shape::Rectangle(rect), style)
    }

    pub fn add_polygon(&mut self, polygon: Polygon, style: Style) -> StoreResult<Handle> {
        self.add(Shape::Polygon(polygon), style)
    }

    pub fn add_polyline(&mut self, polyline: Polyline, style: Style) -> StoreResult<Handle> {
        self.add(Shape::Polyline(polyline), style)
    }

    pub fn add_arc(&mut self, arc: Arc, style: Style) -> StoreResult<Handle> {
        self.add(Shape::Arc(arc), style)
    }

    pub fn add_text(&mut self, text: Text, style: Style) -> StoreResult<Handle> {
        self.add(Shape::Text(text), style)
    }

    pub fn add_path(&mut self, path: Path, style: Style) -> StoreResult<Handle> {
        self.add(Shape::Path(path), style)
    }

    /// Parse SVG path data and store the normalized path.
    pub fn add_path_data(&mut self, data: &str, style: Style) -> StoreResult<Handle> {
        let commands = vexel_types::parse_svg_path(data)?;
        self.add_path(Path { commands }, style)
    }

    /// Store an object under a caller-chosen handle. Used when restoring a
    /// saved drawing; the handle counter advances past `handle`.
    ///
    /// A group payload's children must already be present.
    pub fn insert_with_handle(
        &mut self,
        handle: Handle,
        shape: Shape,
        style: Style,
    ) -> StoreResult<()> {
        if self.contains(handle) {
            return Err(StoreError::DuplicateHandle(handle));
        }
        if handle.get() == u64::MAX {
            return Err(StoreError::CapacityExceeded("handle space exhausted".into()));
        }
        let children = match &shape {
            Shape::Group(g) => {
                self.locate_all(&g.children)?;
                g.children.clone()
            }
            other => {
                validate_shape(other)?;
                Vec::new()
            }
        };
        let style = self.admit_style(style)?;
        let loc = self.place(handle, shape, style)?;
        self.bind(handle, loc);
        self.resume_handles_at(handle.next());
        for child in children {
            self.add_to_group(handle, child)?;
        }
        Ok(())
    }

    /// Strip store-owned flags and check the stroke width and extension
    /// references.
    pub(crate) fn admit_style(&self, mut style: Style) -> StoreResult<Style> {
        check_stroke_width(style.stroke_width)?;
        self.ext.check_gradient(style.gradient)?;
        self.ext.check_pattern(style.pattern)?;
        style.flags.remove(DERIVED_FLAGS);
        let opacity = style.opacity;
        style.set_opacity(opacity);
        Ok(style)
    }

    /// Append a record to its table. The directory is not touched.
    pub(crate) fn place(
        &mut self,
        handle: Handle,
        shape: Shape,
        style: Style,
    ) -> StoreResult<Locator> {
        let kind = shape.object_type();
        let slot = match shape {
            Shape::Line(l) => self.lines.push(
                handle,
                LineRecord {
                    start: l.start,
                    end: l.end,
                    line_style: l.line_style,
                },
                style,
            )?,
            Shape::Circle(c) => self.circles.push(
                handle,
                CircleRecord {
                    center: c.center,
                    radius: c.radius,
                },
                style,
            )?,
            Shape::Ellipse(e) => self.ellipses.push(
                handle,
                EllipseRecord {
                    center: e.center,
                    rx: e.rx,
                    ry: e.ry,
                    rotation: e.rotation,
                },
                style,
            )?,
            Shape::Rectangle(r) => self.rects.push(
                handle,
                RectRecord {
                    top_left: r.top_left,
                    width: r.width,
                    height: r.height,
                    corner_radius: r.corner_radius,
                },
                style,
            )?,
            Shape::Arc(a) => self.arcs.push(
                handle,
                ArcRecord {
                    center: a.center,
                    radius: a.radius,
                    start_angle: a.start_angle,
                    end_angle: a.end_angle,
                },
                style,
            )?,
            Shape::Polygon(p) => {
                let points = self.push_points(&p.points)?;
                self.polygons.push(
                    handle,
                    PolygonRecord {
                        points,
                        closed: p.closed,
                    },
                    style,
                )?
            }
            Shape::Polyline(p) => {
                let points = self.push_points(&p.points)?;
                self.polylines.push(
                    handle,
                    PolylineRecord {
                        points,
                        line_style: p.line_style,
                    },
                    style,
                )?
            }
            Shape::Text(t) => {
                let content = Span::new(self.text.len(), t.content.len())?;
                let font = self.intern_font(&t.font_family)?;
                self.text.push_str(&t.content);
                let mut weight_style = 0;
                if t.bold {
                    weight_style |= TEXT_BOLD;
                }
                if t.italic {
                    weight_style |= TEXT_ITALIC;
                }
                self.texts.push(
                    handle,
                    TextRecord {
                        position: t.position,
                        font_size: t.font_size,
                        content,
                        font,
                        weight_style,
                        align: t.align,
                        vertical_align: t.vertical_align,
                    },
                    style,
                )?
            }
            Shape::Path(p) => {
                let commands = Span::new(self.commands.len(), p.commands.len())?;
                self.commands.extend_from_slice(&p.commands);
                self.paths.push(handle, PathRecord { commands }, style)?
            }
            Shape::Group(_) => self.groups.push(handle, GroupRecord::default(), style)?,
        };
        Ok(Locator { kind, slot })
    }

    fn push_points(&mut self, points: &[Point]) -> StoreResult<Span> {
        let span = Span::new(self.points.len(), points.len())?;
        self.points.extend_from_slice(points);
        Ok(span)
    }

    fn intern_font(&mut self, family: &str) -> StoreResult<u16> {
        if let Some(&id) = self.font_ids.get(family) {
            return Ok(id);
        }
        let id = u16::try_from(self.fonts.len())
            .map_err(|_| StoreError::CapacityExceeded("font table is full".into()))?;
        self.fonts.push(family.to_string());
        self.font_ids.insert(family.to_string(), id);
        self.font_bytes += family.len();
        Ok(id)
    }

    /// Move a live handle's record to a different table, keeping its style
    /// and extensions. Used when a transform changes an object's type.
    pub(crate) fn replace_record(&mut self, handle: Handle, shape: Shape) -> StoreResult<()> {
        let old = self.locate(handle)?;
        let style = *self.column(old.kind).style(old.slot);
        let loc = self.place(handle, shape, style)?;
        self.column_mut(old.kind).kill(old.slot);
        self.bind(handle, loc);
        debug!(
            handle = %handle,
            from = %old.kind,
            to = %loc.kind,
            "record changed type"
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    pub(crate) fn point_slice(&self, span: Span) -> &[Point] {
        &self.points[span.range()]
    }

    pub(crate) fn text_slice(&self, span: Span) -> &str {
        &self.text[span.range()]
    }

    pub(crate) fn command_slice(&self, span: Span) -> &[PathCommand] {
        &self.commands[span.range()]
    }

    /// Owned copy of the object's geometry.
    pub fn shape(&self, handle: Handle) -> StoreResult<Shape> {
        let loc = self.locate(handle)?;
        Ok(self.shape_at(loc))
    }

    pub(crate) fn shape_at(&self, loc: Locator) -> Shape {
        let slot = loc.slot as usize;
        match loc.kind {
            ObjectType::Line => {
                let r = &self.lines.geom[slot];
                Shape::Line(Line {
                    start: r.start,
                    end: r.end,
                    line_style: r.line_style,
                })
            }
            ObjectType::Circle => {
                let r = &self.circles.geom[slot];
                Shape::Circle(Circle {
                    center: r.center,
                    radius: r.radius,
                })
            }
            ObjectType::Ellipse => {
                let r = &self.ellipses.geom[slot];
                Shape::Ellipse(Ellipse {
                    center: r.center,
                    rx: r.rx,
                    ry: r.ry,
                    rotation: r.rotation,
                })
            }
            ObjectType::Rectangle => {
                let r = &self.rects.geom[slot];
                Shape::Rectangle(Rectangle {
                    top_left: r.top_left,
                    width: r.width,
                    height: r.height,
                    corner_radius: r.corner_radius,
                })
            }
            ObjectType::Arc => {
                let r = &self.arcs.geom[slot];
                Shape::Arc(Arc {
                    center: r.center,
                    radius: r.radius,
                    start_angle: r.start_angle,
                    end_angle: r.end_angle,
                })
            }
            ObjectType::Polygon => {
                let r = &self.polygons.geom[slot];
                Shape::Polygon(Polygon {
                    points: self.point_slice(r.points).to_vec(),
                    closed: r.closed,
                })
            }
            ObjectType::Polyline => {
                let r = &self.polylines.geom[slot];
                Shape::Polyline(Polyline {
                    points: self.point_slice(r.points).to_vec(),
                    line_style: r.line_style,
                })
            }
            ObjectType::Text => {
                let r = &self.texts.geom[slot];
                Shape::Text(Text {
                    position: r.position,
                    content: self.text_slice(r.content).to_string(),
                    font_family: self.fonts[r.font as usize].clone(),
                    font_size: r.font_size,
                    bold: r.weight_style & TEXT_BOLD != 0,
                    italic: r.weight_style & TEXT_ITALIC != 0,
                    align: r.align,
                    vertical_align: r.vertical_align,
                })
            }
            ObjectType::Path => {
                let r = &self.paths.geom[slot];
                Shape::Path(Path {
                    commands: self.command_slice(r.commands).to_vec(),
                })
            }
            ObjectType::Group => Shape::Group(vexel_types::Group {
                children: self.groups.geom[slot].children.clone(),
            }),
        }
    }

    pub fn style(&self, handle: Handle) -> StoreResult<Style> {
        let loc = self.locate(handle)?;
        Ok(*self.column(loc.kind).style(loc.slot))
    }

    pub(crate) fn style_at(&self, loc: Locator) -> &Style {
        self.column(loc.kind).style(loc.slot)
    }

    /// Bounding box of one object. Groups report the union of their leaves.
    pub fn bounding_box(&self, handle: Handle) -> StoreResult<BoundingBox> {
        let loc = self.locate(handle)?;
        Ok(self.bbox_at(handle, loc))
    }

    pub(crate) fn bbox_at(&self, handle: Handle, loc: Locator) -> BoundingBox {
        if loc.kind == ObjectType::Group {
            self.group_bbox(handle)
        } else {
            self.leaf_bbox(loc)
        }
    }

    /// Bounding box of a non-group record.
    pub(crate) fn leaf_bbox(&self, loc: Locator) -> BoundingBox {
        let slot = loc.slot as usize;
        match loc.kind {
            ObjectType::Line => {
                let r = &self.lines.geom[slot];
                BoundingBox::at_point(r.start).union(&BoundingBox::at_point(r.end))
            }
            ObjectType::Circle => {
                let r = &self.circles.geom[slot];
                BoundingBox::around(r.center, r.radius, r.radius)
            }
            ObjectType::Ellipse => {
                let r = &self.ellipses.geom[slot];
                geometry::ellipse_bbox(r.center, r.rx, r.ry, r.rotation)
            }
            ObjectType::Rectangle => {
                let r = &self.rects.geom[slot];
                BoundingBox::new(
                    r.top_left.x,
                    r.top_left.y,
                    r.top_left.x + r.width,
                    r.top_left.y + r.height,
                )
            }
            ObjectType::Arc => {
                let r = &self.arcs.geom[slot];
                geometry::arc_bbox(r.center, r.radius, r.start_angle, r.end_angle)
            }
            ObjectType::Polygon => {
                let r = &self.polygons.geom[slot];
                BoundingBox::from_points(self.point_slice(r.points)).unwrap_or(BoundingBox::ZERO)
            }
            ObjectType::Polyline => {
                let r = &self.polylines.geom[slot];
                BoundingBox::from_points(self.point_slice(r.points)).unwrap_or(BoundingBox::ZERO)
            }
            ObjectType::Text => {
                let r = &self.texts.geom[slot];
                geometry::text_bbox(
                    r.position,
                    self.text_slice(r.content).chars().count(),
                    r.font_size,
                    r.align,
                    r.vertical_align,
                )
            }
            ObjectType::Path => {
                let r = &self.paths.geom[slot];
                geometry::path_bbox(self.command_slice(r.commands)).unwrap_or(BoundingBox::ZERO)
            }
            ObjectType::Group => BoundingBox::ZERO,
        }
    }

    pub fn name(&self, handle: Handle) -> Option<&str> {
        self.ext.names.get(&handle).map(String::as_str)
    }

    pub fn metadata(&self, handle: Handle, key: &str) -> Option<&str> {
        self.ext
            .metadata
            .get(&handle)
            .and_then(|m| m.get(key))
            .map(String::as_str)
    }

    pub fn all_metadata(&self, handle: Handle) -> Option<&BTreeMap<String, String>> {
        self.ext.metadata.get(&handle)
    }

    /// Every named handle, ascending.
    pub fn named(&self) -> Vec<(Handle, &str)> {
        let mut out: Vec<_> = self
            .ext
            .names
            .iter()
            .map(|(h, n)| (*h, n.as_str()))
            .collect();
        out.sort_by_key(|(h, _)| *h);
        out
    }

    /// Every handle carrying metadata, ascending.
    pub fn with_metadata(&self) -> Vec<(Handle, &BTreeMap<String, String>)> {
        let mut out: Vec<_> = self.ext.metadata.iter().map(|(h, m)| (*h, m)).collect();
        out.sort_by_key(|(h, _)| *h);
        out
    }

    // ------------------------------------------------------------------
    // Gradient and pattern tables
    // ------------------------------------------------------------------

    pub fn add_gradient(&mut self, gradient: Gradient) -> StoreResult<GradientId> {
        if !gradient.has_valid_stops() {
            return Err(StoreError::InvalidGeometry(
                "gradient stops must be ordered offsets in [0, 1]".into(),
            ));
        }
        self.ext.add_gradient(gradient)
    }

    /// Linear gradient at `angle` radians.
    pub fn add_linear_gradient(
        &mut self,
        stops: Vec<GradientStop>,
        angle: f32,
    ) -> StoreResult<GradientId> {
        check_scalar(angle, "gradient angle")?;
        self.add_gradient(Gradient::linear(stops, angle))
    }

    pub fn add_radial_gradient(
        &mut self,
        stops: Vec<GradientStop>,
        center: Point,
        radius: f32,
    ) -> StoreResult<GradientId> {
        check_finite(center, "gradient center")?;
        check_positive(radius, "gradient radius")?;
        self.add_gradient(Gradient::radial(stops, center, radius))
    }

    pub fn add_pattern(&mut self, name: &str) -> StoreResult<PatternId> {
        self.ext.add_pattern(name.to_string())
    }

    pub fn gradient(&self, id: GradientId) -> Option<&Gradient> {
        self.ext.gradients.get(id.index())
    }

    pub fn gradients(&self) -> &[Gradient] {
        &self.ext.gradients
    }

    pub fn pattern(&self, id: PatternId) -> Option<&str> {
        self.ext.patterns.get(id.index()).map(String::as_str)
    }

    pub fn patterns(&self) -> &[String] {
        &self.ext.patterns
    }

    // ------------------------------------------------------------------
    // Batch setters (all-or-nothing)
    // ------------------------------------------------------------------

    fn update_styles(
        &mut self,
        handles: &[Handle],
        mut f: impl FnMut(&mut Style),
    ) -> StoreResult<()> {
        let locs = self.locate_all(handles)?;
        for loc in locs {
            f(self.column_mut(loc.kind).style_mut(loc.slot));
        }
        Ok(())
    }

    pub fn set_fill_color(&mut self, handles: &[Handle], color: Color) -> StoreResult<()> {
        self.update_styles(handles, |s| {
            s.fill = color;
            s.flags.insert(ObjectFlags::HAS_FILL);
        })
    }

    pub fn clear_fill(&mut self, handles: &[Handle]) -> StoreResult<()> {
        self.update_styles(handles, |s| s.flags.remove(ObjectFlags::HAS_FILL))
    }

    pub fn set_stroke_color(&mut self, handles: &[Handle], color: Color) -> StoreResult<()> {
        self.update_styles(handles, |s| {
            s.stroke = color;
            s.flags.insert(ObjectFlags::HAS_STROKE);
        })
    }

    pub fn clear_stroke(&mut self, handles: &[Handle]) -> StoreResult<()> {
        self.update_styles(handles, |s| s.flags.remove(ObjectFlags::HAS_STROKE))
    }

    pub fn set_stroke_width(&mut self, handles: &[Handle], width: f32) -> StoreResult<()> {
        check_stroke_width(width)?;
        self.update_styles(handles, |s| s.stroke_width = width)
    }

    /// Opacity is clamped into `[0, 1]`.
    pub fn set_opacity(&mut self, handles: &[Handle], opacity: f32) -> StoreResult<()> {
        self.update_styles(handles, |s| s.set_opacity(opacity))
    }

    pub fn set_visible(&mut self, handles: &[Handle], visible: bool) -> StoreResult<()> {
        self.update_styles(handles, |s| s.flags.set(ObjectFlags::VISIBLE, visible))
    }

    pub fn set_locked(&mut self, handles: &[Handle], locked: bool) -> StoreResult<()> {
        self.update_styles(handles, |s| s.flags.set(ObjectFlags::LOCKED, locked))
    }

    /// Record layer membership. The store does not know which layers exist.
    pub fn set_layer(&mut self, handles: &[Handle], layer: LayerId) -> StoreResult<()> {
        self.update_styles(handles, |s| s.layer = layer)
    }

    /// Attach a gradient, or detach with `None`.
    pub fn set_gradient(
        &mut self,
        handles: &[Handle],
        gradient: Option<GradientId>,
    ) -> StoreResult<()> {
        self.ext.check_gradient(gradient)?;
        self.update_styles(handles, |s| s.gradient = gradient)
    }

    /// Attach a pattern, or detach with `None`.
    pub fn set_pattern(
        &mut self,
        handles: &[Handle],
        pattern: Option<PatternId>,
    ) -> StoreResult<()> {
        self.ext.check_pattern(pattern)?;
        self.update_styles(handles, |s| s.pattern = pattern)
    }

    pub fn set_name(&mut self, handles: &[Handle], name: &str) -> StoreResult<()> {
        let locs = self.locate_all(handles)?;
        for (handle, loc) in handles.iter().zip(locs) {
            self.ext.set_name(*handle, name);
            self.column_mut(loc.kind)
                .style_mut(loc.slot)
                .flags
                .insert(ObjectFlags::HAS_NAME);
        }
        Ok(())
    }

    pub fn set_metadata(&mut self, handles: &[Handle], key: &str, value: &str) -> StoreResult<()> {
        let locs = self.locate_all(handles)?;
        for (handle, loc) in handles.iter().zip(locs) {
            self.ext.set_metadata(*handle, key, value);
            self.column_mut(loc.kind)
                .style_mut(loc.slot)
                .flags
                .insert(ObjectFlags::HAS_METADATA);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Deletion
    // ------------------------------------------------------------------

    /// Tombstone an object.
    ///
    /// The handle is removed from every group that lists it; a deleted
    /// group's children stay live and lose this group as a parent. Name
    /// and metadata entries are released. The handle is never reissued.
    pub fn delete(&mut self, handle: Handle) -> StoreResult<()> {
        let loc = self.locate(handle)?;

        if let Some(parents) = self.parents.remove(&handle) {
            for parent in parents {
                if let Ok(ploc) = self.locate(parent) {
                    let children = &mut self.groups.geom[ploc.slot as usize].children;
                    let before = children.len();
                    children.retain(|c| *c != handle);
                    self.child_links -= before - children.len();
                }
            }
        }

        if loc.kind == ObjectType::Group {
            let children = std::mem::take(&mut self.groups.geom[loc.slot as usize].children);
            self.child_links -= children.len();
            for child in children {
                self.unlink_parent(child, handle);
            }
        }

        self.column_mut(loc.kind).kill(loc.slot);
        self.directory[handle.index()] = None;
        self.ext.release(handle);
        debug!(handle = %handle, kind = %loc.kind, "object deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accounting
    // ------------------------------------------------------------------

    /// Approximate bytes held by records, arenas, hierarchy, and tables.
    ///
    /// Computed from running counters, so the cost is independent of the
    /// number of objects.
    pub fn memory_usage(&self) -> usize {
        let tables: usize = ObjectType::ALL
            .iter()
            .map(|k| self.column(*k).bytes())
            .sum();
        let directory = self.directory.len() * size_of::<Option<Locator>>();
        let arenas = self.points.len() * size_of::<Point>()
            + self.text.len()
            + self.commands.len() * size_of::<PathCommand>()
            + self.fonts.len() * (2 * size_of::<String>() + size_of::<u16>())
            + 2 * self.font_bytes;
        let hierarchy = 2 * self.child_links * size_of::<Handle>()
            + self.parents.len() * (size_of::<Handle>() + size_of::<Vec<Handle>>());
        tables + directory + arenas + hierarchy + self.ext.bytes()
    }
}

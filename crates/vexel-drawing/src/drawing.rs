use std::collections::{HashMap, HashSet};
use std::mem::size_of;

use tracing::{debug, info};
use vexel_batch::{self as batch, BatchStats, Collision};
use vexel_store::{HitResolution, ObjectStore, StoreError};
use vexel_types::{
    Arc, BoundingBox, Circle, Color, Ellipse, GradientId, GradientStop, Handle, LayerId, Line,
    ObjectType, Path, PatternId, Point, Polygon, Polyline, Rectangle, Shape, Style, Text,
};

use crate::config::DrawingConfig;
use crate::error::{DrawingError, DrawingResult};
use crate::layer::Layer;

fn check_canvas(width: f64, height: f64) -> DrawingResult<()> {
    if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
        Ok(())
    } else {
        Err(DrawingError::InvalidCanvas(format!(
            "canvas must be positive, got {width} x {height}"
        )))
    }
}

fn invalid(msg: String) -> DrawingError {
    DrawingError::Store(StoreError::InvalidReference(msg))
}

/// A canvas, its layers, and the object store behind them.
///
/// Every live object that no group contains is listed by exactly one layer,
/// the one recorded in its style. Group members are reached through their
/// group. All structural changes go through `Drawing` so the layer lists
/// stay in step with the store.
#[derive(Debug)]
pub struct Drawing {
    name: String,
    width: f64,
    height: f64,
    background: Color,
    layers: Vec<Layer>,
    max_layers: usize,
    store: ObjectStore,
}

impl Drawing {
    /// A drawing with the default configuration and the given canvas size.
    pub fn new(width: f64, height: f64) -> DrawingResult<Self> {
        Self::with_config(DrawingConfig::canvas(width, height))
    }

    pub fn with_config(config: DrawingConfig) -> DrawingResult<Self> {
        check_canvas(config.width, config.height)?;
        let default_layer = Layer::new(LayerId::DEFAULT, config.default_layer_name.clone());
        Ok(Self {
            max_layers: config.layer_limit(),
            name: config.name,
            width: config.width,
            height: config.height,
            background: config.background,
            layers: vec![default_layer],
            store: ObjectStore::with_config(config.store),
        })
    }

    /// Assemble a drawing from a populated store and its layers, as a
    /// decoder does. `config.default_layer_name` and `config.store` are
    /// ignored.
    ///
    /// Fails with `InvalidReference` unless every top-level object is listed
    /// by exactly one layer that matches its style, and nothing else is
    /// listed.
    pub fn from_parts(
        config: DrawingConfig,
        store: ObjectStore,
        layers: Vec<Layer>,
    ) -> DrawingResult<Self> {
        check_canvas(config.width, config.height)?;
        let max_layers = config.layer_limit();
        if layers.len() > max_layers {
            return Err(StoreError::CapacityExceeded(format!(
                "{} layers exceed the limit of {max_layers}",
                layers.len()
            ))
            .into());
        }

        let mut ids = HashSet::new();
        let mut listed = HashSet::new();
        for layer in &layers {
            if !ids.insert(layer.id) {
                return Err(invalid(format!("{} appears twice", layer.id)));
            }
            for &handle in &layer.objects {
                let style = store.style(handle)?;
                if store.is_grouped(handle) {
                    return Err(invalid(format!(
                        "{handle} is grouped but listed by {}",
                        layer.id
                    )));
                }
                if style.layer != layer.id {
                    return Err(invalid(format!(
                        "{handle} is listed by {} but styled for {}",
                        layer.id, style.layer
                    )));
                }
                if !listed.insert(handle) {
                    return Err(invalid(format!("{handle} is listed more than once")));
                }
            }
        }
        if let Some(orphan) = store.roots().into_iter().find(|h| !listed.contains(h)) {
            return Err(invalid(format!("{orphan} is not listed by any layer")));
        }

        debug!(
            layers = layers.len(),
            objects = store.total_objects(),
            "drawing assembled"
        );
        Ok(Self {
            name: config.name,
            width: config.width,
            height: config.height,
            background: config.background,
            layers,
            max_layers,
            store,
        })
    }

    // ------------------------------------------------------------------
    // Canvas
    // ------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    pub fn set_canvas_size(&mut self, width: f64, height: f64) -> DrawingResult<()> {
        check_canvas(width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    // ------------------------------------------------------------------
    // Layers
    // ------------------------------------------------------------------

    /// Append a layer and return its id.
    pub fn add_layer(&mut self, name: &str) -> DrawingResult<LayerId> {
        if self.layers.len() >= self.max_layers {
            return Err(StoreError::CapacityExceeded(format!(
                "drawing already has {} layers",
                self.layers.len()
            ))
            .into());
        }
        let id = (0..=u8::MAX)
            .map(LayerId)
            .find(|id| self.layers.iter().all(|l| l.id != *id))
            .ok_or_else(|| StoreError::CapacityExceeded("no free layer id".into()))?;
        self.layers.push(Layer::new(id, name));
        info!(layer = %id, name, "layer added");
        Ok(id)
    }

    /// Layers in insertion order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    fn layer_index(&self, id: LayerId) -> DrawingResult<usize> {
        self.layers
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| invalid(format!("{id} does not exist")))
    }

    fn layer_mut(&mut self, id: LayerId) -> DrawingResult<&mut Layer> {
        let idx = self.layer_index(id)?;
        Ok(&mut self.layers[idx])
    }

    pub fn set_layer_visible(&mut self, id: LayerId, visible: bool) -> DrawingResult<()> {
        self.layer_mut(id)?.visible = visible;
        Ok(())
    }

    pub fn set_layer_locked(&mut self, id: LayerId, locked: bool) -> DrawingResult<()> {
        self.layer_mut(id)?.locked = locked;
        Ok(())
    }

    /// Opacity is clamped into `[0, 1]`; NaN resets it to opaque.
    pub fn set_layer_opacity(&mut self, id: LayerId, opacity: f32) -> DrawingResult<()> {
        self.layer_mut(id)?.opacity = if opacity.is_nan() {
            1.0
        } else {
            opacity.clamp(0.0, 1.0)
        };
        Ok(())
    }

    pub fn set_layer_z_index(&mut self, id: LayerId, z_index: i32) -> DrawingResult<()> {
        self.layer_mut(id)?.z_index = z_index;
        Ok(())
    }

    /// Layers sorted by ascending z-index; ties keep insertion order.
    pub fn layers_in_render_order(&self) -> Vec<&Layer> {
        let mut ordered: Vec<&Layer> = self.layers.iter().collect();
        ordered.sort_by_key(|l| l.z_index);
        ordered
    }

    /// The layer recorded for `handle`. For a group member this is the layer
    /// it rejoins if released.
    pub fn layer_of(&self, handle: Handle) -> DrawingResult<LayerId> {
        Ok(self.store.style(handle)?.layer)
    }

    /// Drop `handles` from their layers' lists. Each affected layer is
    /// rewritten once, however many handles it loses.
    fn detach(&mut self, handles: &[Handle]) -> DrawingResult<()> {
        let mut by_layer: HashMap<LayerId, HashSet<Handle>> = HashMap::new();
        for &handle in handles {
            let layer = self.store.style(handle)?.layer;
            by_layer.entry(layer).or_default().insert(handle);
        }
        for (layer, gone) in by_layer {
            if let Ok(idx) = self.layer_index(layer) {
                self.layers[idx].release(&gone);
            }
        }
        Ok(())
    }

    /// List a newly top-level `handle` on its recorded layer, or on
    /// `fallback` when the recorded one no longer exists.
    fn attach(&mut self, handle: Handle, fallback: LayerId) -> DrawingResult<()> {
        let recorded = self.store.style(handle)?.layer;
        let layer = if self.layer(recorded).is_some() {
            recorded
        } else {
            self.store.set_layer(&[handle], fallback)?;
            fallback
        };
        let idx = self.layer_index(layer)?;
        self.layers[idx].objects.push(handle);
        Ok(())
    }

    /// Move a handle to another layer. A top-level object changes lists; a
    /// group member only changes the layer it would rejoin.
    pub fn move_to_layer(&mut self, handle: Handle, layer: LayerId) -> DrawingResult<()> {
        let target = self.layer_index(layer)?;
        let current = self.layer_of(handle)?;
        if current == layer {
            return Ok(());
        }
        if !self.store.is_grouped(handle) {
            self.detach(&[handle])?;
            self.layers[target].objects.push(handle);
        }
        self.store.set_layer(&[handle], layer)?;
        debug!(handle = %handle, from = %current, to = %layer, "object moved");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------

    /// Add a shape on `layer` with the store's default style.
    pub fn add(&mut self, shape: Shape, layer: LayerId) -> DrawingResult<Handle> {
        let style = self.store.default_style().on_layer(layer);
        self.add_styled(shape, style)
    }

    /// Add a shape with an explicit style; `style.layer` picks the layer.
    pub fn add_styled(&mut self, shape: Shape, style: Style) -> DrawingResult<Handle> {
        let idx = self.layer_index(style.layer)?;
        let children = match &shape {
            Shape::Group(g) => g.children.clone(),
            _ => Vec::new(),
        };
        let handle = self.store.add(shape, style)?;
        self.detach(&children)?;
        self.layers[idx].objects.push(handle);
        Ok(handle)
    }

    pub fn add_line(&mut self, line: Line, layer: LayerId) -> DrawingResult<Handle> {
        self.add(Shape::Line(line), layer)
    }

    pub fn add_circle(&mut self, circle: Circle, layer: LayerId) -> DrawingResult<Handle> {
        self.add(Shape::Circle(circle), layer)
    }

    pub fn add_ellipse(&mut self, ellipse: Ellipse, layer: LayerId) -> DrawingResult<Handle> {
        self.add(Shape::Ellipse(ellipse), layer)
    }

    pub fn add_rectangle(&mut self, rect: Rectangle, layer: LayerId) -> DrawingResult<Handle> {
        self.add(Shape::Rectangle(rect), layer)
    }

    pub fn add_polygon(&mut self, polygon: Polygon, layer: LayerId) -> DrawingResult<Handle> {
        self.add(Shape::Polygon(polygon), layer)
    }

    pub fn add_polyline(&mut self, polyline: Polyline, layer: LayerId) -> DrawingResult<Handle> {
        self.add(Shape::Polyline(polyline), layer)
    }

    pub fn add_arc(&mut self, arc: Arc, layer: LayerId) -> DrawingResult<Handle> {
        self.add(Shape::Arc(arc), layer)
    }

    pub fn add_text(&mut self, text: Text, layer: LayerId) -> DrawingResult<Handle> {
        self.add(Shape::Text(text), layer)
    }

    pub fn add_path(&mut self, path: Path, layer: LayerId) -> DrawingResult<Handle> {
        self.add(Shape::Path(path), layer)
    }

    /// Add a path from SVG path data.
    pub fn add_path_data(&mut self, data: &str, layer: LayerId) -> DrawingResult<Handle> {
        let path = Path {
            commands: vexel_types::parse_svg_path(data).map_err(StoreError::from)?,
        };
        self.add_path(path, layer)
    }

    /// Group `children` on `layer`. Children that were top-level leave
    /// their layer lists.
    pub fn add_group(&mut self, children: &[Handle], layer: LayerId) -> DrawingResult<Handle> {
        let idx = self.layer_index(layer)?;
        let style = self.store.default_style().on_layer(layer);
        let handle = self.store.add_group(children, style)?;
        self.detach(children)?;
        self.layers[idx].objects.push(handle);
        Ok(handle)
    }

    /// Add `child` to `group`; see [`ObjectStore::add_to_group`].
    pub fn add_to_group(&mut self, group: Handle, child: Handle) -> DrawingResult<bool> {
        let added = self.store.add_to_group(group, child)?;
        if added {
            self.detach(&[child])?;
        }
        Ok(added)
    }

    /// Remove `child` from `group`. A child left with no parent becomes
    /// top-level again on its recorded layer.
    pub fn remove_from_group(&mut self, group: Handle, child: Handle) -> DrawingResult<bool> {
        let group_layer = self.layer_of(group)?;
        let removed = self.store.remove_from_group(group, child)?;
        if removed && !self.store.is_grouped(child) {
            self.attach(child, group_layer)?;
        }
        Ok(removed)
    }

    /// Delete an object. A deleted group's children stay live; any left
    /// with no parent become top-level again.
    pub fn remove_object(&mut self, handle: Handle) -> DrawingResult<()> {
        let layer = self.layer_of(handle)?;
        let children = match self.store.get_type(handle)? {
            ObjectType::Group => self.store.children(handle)?.to_vec(),
            _ => Vec::new(),
        };
        if !self.store.is_grouped(handle) {
            self.detach(&[handle])?;
        }
        self.store.delete(handle)?;
        for child in children {
            if self.store.contains(child) && !self.store.is_grouped(child) {
                self.attach(child, layer)?;
            }
        }
        Ok(())
    }

    /// Top-level handles, layer by layer in insertion order.
    pub fn top_level_objects(&self) -> impl Iterator<Item = Handle> + '_ {
        self.layers.iter().flat_map(|l| l.objects.iter().copied())
    }

    pub fn total_objects(&self) -> usize {
        self.store.total_objects()
    }

    /// Union of every top-level object's box; the zero box when nothing
    /// has extent.
    pub fn get_bounding_box(&self) -> BoundingBox {
        let tops: Vec<Handle> = self.top_level_objects().collect();
        batch::calculate_bounding_box(&self.store, &tops).unwrap_or(BoundingBox::ZERO)
    }

    /// Approximate bytes held by the store, layer lists, and canvas.
    pub fn memory_usage(&self) -> usize {
        size_of::<Self>()
            + self.name.capacity()
            + self.layers.iter().map(Layer::bytes).sum::<usize>()
            + self.store.memory_usage()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Top-level hits at `point`; see [`HitResolution::TopLevel`].
    pub fn find_at_point(&self, point: Point, tolerance: f32) -> Vec<Handle> {
        self.store
            .find_at_point(point, tolerance, HitResolution::TopLevel)
    }

    pub fn find_at_point_with(
        &self,
        point: Point,
        tolerance: f32,
        resolution: HitResolution,
    ) -> Vec<Handle> {
        self.store.find_at_point(point, tolerance, resolution)
    }

    pub fn find_in_rect(&self, rect: &BoundingBox) -> Vec<Handle> {
        self.store.find_in_rect(rect)
    }

    // ------------------------------------------------------------------
    // Style and extension setters
    // ------------------------------------------------------------------

    pub fn set_fill_color(&mut self, handles: &[Handle], color: Color) -> DrawingResult<()> {
        Ok(self.store.set_fill_color(handles, color)?)
    }

    pub fn clear_fill(&mut self, handles: &[Handle]) -> DrawingResult<()> {
        Ok(self.store.clear_fill(handles)?)
    }

    pub fn set_stroke_color(&mut self, handles: &[Handle], color: Color) -> DrawingResult<()> {
        Ok(self.store.set_stroke_color(handles, color)?)
    }

    pub fn clear_stroke(&mut self, handles: &[Handle]) -> DrawingResult<()> {
        Ok(self.store.clear_stroke(handles)?)
    }

    pub fn set_stroke_width(&mut self, handles: &[Handle], width: f32) -> DrawingResult<()> {
        Ok(self.store.set_stroke_width(handles, width)?)
    }

    pub fn set_opacity(&mut self, handles: &[Handle], opacity: f32) -> DrawingResult<()> {
        Ok(self.store.set_opacity(handles, opacity)?)
    }

    pub fn set_visible(&mut self, handles: &[Handle], visible: bool) -> DrawingResult<()> {
        Ok(self.store.set_visible(handles, visible)?)
    }

    pub fn set_locked(&mut self, handles: &[Handle], locked: bool) -> DrawingResult<()> {
        Ok(self.store.set_locked(handles, locked)?)
    }

    pub fn set_object_name(&mut self, handles: &[Handle], name: &str) -> DrawingResult<()> {
        Ok(self.store.set_name(handles, name)?)
    }

    pub fn set_metadata(&mut self, handles: &[Handle], key: &str, value: &str) -> DrawingResult<()> {
        Ok(self.store.set_metadata(handles, key, value)?)
    }

    pub fn add_linear_gradient(
        &mut self,
        stops: Vec<GradientStop>,
        angle: f32,
    ) -> DrawingResult<GradientId> {
        Ok(self.store.add_linear_gradient(stops, angle)?)
    }

    pub fn add_radial_gradient(
        &mut self,
        stops: Vec<GradientStop>,
        center: Point,
        radius: f32,
    ) -> DrawingResult<GradientId> {
        Ok(self.store.add_radial_gradient(stops, center, radius)?)
    }

    pub fn add_pattern(&mut self, name: &str) -> DrawingResult<PatternId> {
        Ok(self.store.add_pattern(name)?)
    }

    pub fn set_gradient(
        &mut self,
        handles: &[Handle],
        gradient: Option<GradientId>,
    ) -> DrawingResult<()> {
        Ok(self.store.set_gradient(handles, gradient)?)
    }

    pub fn set_pattern(
        &mut self,
        handles: &[Handle],
        pattern: Option<PatternId>,
    ) -> DrawingResult<()> {
        Ok(self.store.set_pattern(handles, pattern)?)
    }

    // ------------------------------------------------------------------
    // Batch operations
    // ------------------------------------------------------------------

    pub fn translate(&mut self, ids: &[Handle], dx: f32, dy: f32) -> DrawingResult<BatchStats> {
        Ok(batch::translate(&mut self.store, ids, dx, dy)?)
    }

    pub fn scale(
        &mut self,
        ids: &[Handle],
        sx: f32,
        sy: f32,
        center: Option<Point>,
    ) -> DrawingResult<BatchStats> {
        Ok(batch::scale(&mut self.store, ids, sx, sy, center)?)
    }

    pub fn rotate(
        &mut self,
        ids: &[Handle],
        angle: f32,
        center: Option<Point>,
    ) -> DrawingResult<BatchStats> {
        Ok(batch::rotate(&mut self.store, ids, angle, center)?)
    }

    pub fn align_left(&mut self, ids: &[Handle]) -> DrawingResult<BatchStats> {
        Ok(batch::align_left(&mut self.store, ids)?)
    }

    pub fn align_right(&mut self, ids: &[Handle]) -> DrawingResult<BatchStats> {
        Ok(batch::align_right(&mut self.store, ids)?)
    }

    pub fn align_top(&mut self, ids: &[Handle]) -> DrawingResult<BatchStats> {
        Ok(batch::align_top(&mut self.store, ids)?)
    }

    pub fn align_bottom(&mut self, ids: &[Handle]) -> DrawingResult<BatchStats> {
        Ok(batch::align_bottom(&mut self.store, ids)?)
    }

    pub fn align_center_horizontal(&mut self, ids: &[Handle]) -> DrawingResult<BatchStats> {
        Ok(batch::align_center_horizontal(&mut self.store, ids)?)
    }

    pub fn align_center_vertical(&mut self, ids: &[Handle]) -> DrawingResult<BatchStats> {
        Ok(batch::align_center_vertical(&mut self.store, ids)?)
    }

    pub fn distribute_horizontally(
        &mut self,
        ids: &[Handle],
        spacing: Option<f32>,
    ) -> DrawingResult<BatchStats> {
        Ok(batch::distribute_horizontally(&mut self.store, ids, spacing)?)
    }

    pub fn distribute_vertically(
        &mut self,
        ids: &[Handle],
        spacing: Option<f32>,
    ) -> DrawingResult<BatchStats> {
        Ok(batch::distribute_vertically(&mut self.store, ids, spacing)?)
    }

    pub fn calculate_bounding_box(&self, ids: &[Handle]) -> DrawingResult<BoundingBox> {
        Ok(batch::calculate_bounding_box(&self.store, ids)?)
    }

    pub fn distances_to_point(&self, ids: &[Handle], point: Point) -> DrawingResult<Vec<f32>> {
        Ok(batch::distances_to_point(&self.store, ids, point)?)
    }

    pub fn find_collisions(&self, ids: &[Handle]) -> DrawingResult<Vec<Collision>> {
        Ok(batch::find_collisions(&self.store, ids)?)
    }

    /// Generate a grid on `layer`; see [`vexel_batch::create_grid`].
    #[allow(clippy::too_many_arguments)]
    pub fn create_grid(
        &mut self,
        kind: ObjectType,
        rows: usize,
        cols: usize,
        cell_width: f32,
        cell_height: f32,
        offset: Point,
        layer: LayerId,
    ) -> DrawingResult<Vec<Handle>> {
        let idx = self.layer_index(layer)?;
        let style = self.store.default_style().on_layer(layer);
        let ids = batch::create_grid(
            &mut self.store,
            kind,
            rows,
            cols,
            cell_width,
            cell_height,
            offset,
            style,
        )?;
        self.layers[idx].objects.extend_from_slice(&ids);
        Ok(ids)
    }

    /// Generate a ring on `layer`; see [`vexel_batch::create_circular_pattern`].
    pub fn create_circular_pattern(
        &mut self,
        kind: ObjectType,
        count: usize,
        radius: f32,
        center: Point,
        layer: LayerId,
    ) -> DrawingResult<Vec<Handle>> {
        let idx = self.layer_index(layer)?;
        let style = self.store.default_style().on_layer(layer);
        let ids = batch::create_circular_pattern(&mut self.store, kind, count, radius, center, style)?;
        self.layers[idx].objects.extend_from_slice(&ids);
        Ok(ids)
    }
}

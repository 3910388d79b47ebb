//! Per-record affine transforms.
//!
//! Transforms are applied to leaves; a group handle transforms every leaf
//! beneath it exactly once. Some shapes cannot represent every result in
//! their own table and change type while keeping their handle:
//!
//! - a circle under non-uniform scale becomes an ellipse;
//! - a rectangle under a non-trivial rotation becomes a closed polygon.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};
use vexel_types::{Ellipse, Handle, ObjectType, Point, Polygon, Shape};

use crate::error::{StoreError, StoreResult};
use crate::geometry;
use crate::store::ObjectStore;

/// An affine operation on drawing space. Angles are radians.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Transform {
    Translate { dx: f32, dy: f32 },
    Scale { sx: f32, sy: f32, center: Point },
    Rotate { angle: f32, center: Point },
}

impl Transform {
    /// Reject non-finite parameters and zero scale factors.
    pub fn validate(&self) -> StoreResult<()> {
        let ok = match *self {
            Self::Translate { dx, dy } => dx.is_finite() && dy.is_finite(),
            Self::Scale { sx, sy, center } => {
                sx.is_finite() && sy.is_finite() && sx != 0.0 && sy != 0.0 && center.is_finite()
            }
            Self::Rotate { angle, center } => angle.is_finite() && center.is_finite(),
        };
        if ok {
            Ok(())
        } else {
            Err(StoreError::InvalidGeometry(format!(
                "unusable transform {self:?}"
            )))
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        match *self {
            Self::Translate { dx, dy } => p.translated(dx, dy),
            Self::Scale { sx, sy, center } => p.scaled_about(center, sx, sy),
            Self::Rotate { angle, center } => {
                let (sin, cos) = angle.sin_cos();
                p.rotated_about(center, sin, cos)
            }
        }
    }

    /// The same operation about a different center. Translation ignores it.
    pub fn about(self, new_center: Point) -> Self {
        match self {
            Self::Translate { .. } => self,
            Self::Scale { sx, sy, .. } => Self::Scale {
                sx,
                sy,
                center: new_center,
            },
            Self::Rotate { angle, .. } => Self::Rotate {
                angle,
                center: new_center,
            },
        }
    }

    /// Geometric-mean length factor, used for sizes with no direction.
    fn length_factor(&self) -> f32 {
        match *self {
            Self::Scale { sx, sy, .. } => (sx * sy).abs().sqrt(),
            _ => 1.0,
        }
    }
}

/// Image of an angle under `diag(sx, sy)`.
fn scale_angle(angle: f32, sx: f32, sy: f32) -> f32 {
    let (sin, cos) = angle.sin_cos();
    (sy * sin).atan2(sx * cos)
}

/// Semi-axes and rotation of an ellipse after `diag(sx, sy)`, via the closed
/// form singular value decomposition of the 2x2 shape matrix.
fn scale_ellipse(rx: f32, ry: f32, rotation: f32, sx: f32, sy: f32) -> (f32, f32, f32) {
    let (s, c) = rotation.sin_cos();
    let a = sx * c * rx;
    let b = -sx * s * ry;
    let cc = sy * s * rx;
    let d = sy * c * ry;
    let e = (a + d) * 0.5;
    let f = (a - d) * 0.5;
    let g = (cc + b) * 0.5;
    let h = (cc - b) * 0.5;
    let q = e.hypot(h);
    let r = f.hypot(g);
    let phi = (h.atan2(e) + g.atan2(f)) * 0.5;
    (q + r, (q - r).abs(), phi)
}

impl ObjectStore {
    /// Apply `transform` to one object. Groups apply it to every leaf.
    pub fn transform(&mut self, handle: Handle, transform: &Transform) -> StoreResult<()> {
        transform.validate()?;
        for leaf in self.leaves(handle)? {
            self.transform_leaf(leaf, transform)?;
        }
        Ok(())
    }

    /// Apply a validated transform to a single non-group record.
    pub(crate) fn transform_leaf(&mut self, handle: Handle, t: &Transform) -> StoreResult<()> {
        let loc = self.locate(handle)?;
        let slot = loc.slot as usize;
        match loc.kind {
            ObjectType::Line => {
                let r = &mut self.lines.geom[slot];
                r.start = t.apply(r.start);
                r.end = t.apply(r.end);
            }
            ObjectType::Circle => {
                let r = self.circles.geom[slot];
                let center = t.apply(r.center);
                match *t {
                    Transform::Scale { sx, sy, .. } if sx.abs() != sy.abs() => {
                        let ellipse = Ellipse {
                            center,
                            rx: r.radius * sx.abs(),
                            ry: r.radius * sy.abs(),
                            rotation: 0.0,
                        };
                        self.replace_record(handle, Shape::Ellipse(ellipse))?;
                    }
                    Transform::Scale { sx, .. } => {
                        let rec = &mut self.circles.geom[slot];
                        rec.center = center;
                        rec.radius *= sx.abs();
                    }
                    _ => self.circles.geom[slot].center = center,
                }
            }
            ObjectType::Ellipse => {
                let r = &mut self.ellipses.geom[slot];
                r.center = t.apply(r.center);
                match *t {
                    Transform::Rotate { angle, .. } => r.rotation += angle,
                    Transform::Scale { sx, sy, .. } if r.rotation == 0.0 => {
                        r.rx *= sx.abs();
                        r.ry *= sy.abs();
                    }
                    Transform::Scale { sx, sy, .. } => {
                        let (rx, ry, rotation) = scale_ellipse(r.rx, r.ry, r.rotation, sx, sy);
                        r.rx = rx;
                        r.ry = ry;
                        r.rotation = rotation;
                    }
                    Transform::Translate { .. } => {}
                }
            }
            ObjectType::Rectangle => {
                let r = self.rects.geom[slot];
                let corners = [
                    r.top_left,
                    Point::new(r.top_left.x + r.width, r.top_left.y),
                    Point::new(r.top_left.x + r.width, r.top_left.y + r.height),
                    Point::new(r.top_left.x, r.top_left.y + r.height),
                ];
                match *t {
                    Transform::Rotate { angle, .. } if angle.rem_euclid(TAU) != 0.0 => {
                        let polygon = Polygon {
                            points: corners.iter().map(|c| t.apply(*c)).collect(),
                            closed: true,
                        };
                        self.replace_record(handle, Shape::Polygon(polygon))?;
                    }
                    Transform::Scale { sx, sy, .. } => {
                        let a = t.apply(corners[0]);
                        let b = t.apply(corners[2]);
                        let rec = &mut self.rects.geom[slot];
                        rec.top_left = Point::new(a.x.min(b.x), a.y.min(b.y));
                        rec.width *= sx.abs();
                        rec.height *= sy.abs();
                        rec.corner_radius *= sx.abs().min(sy.abs());
                    }
                    _ => self.rects.geom[slot].top_left = t.apply(r.top_left),
                }
            }
            ObjectType::Arc => {
                let factor = t.length_factor();
                let r = &mut self.arcs.geom[slot];
                r.center = t.apply(r.center);
                match *t {
                    Transform::Rotate { angle, .. } => {
                        r.start_angle += angle;
                        r.end_angle += angle;
                    }
                    Transform::Scale { sx, sy, .. } if !(sx == sy && sx > 0.0) => {
                        let full = geometry::arc_sweep(r.start_angle, r.end_angle) >= TAU;
                        let mut start = scale_angle(r.start_angle, sx, sy);
                        let mut end = scale_angle(r.end_angle, sx, sy);
                        if sx * sy < 0.0 {
                            std::mem::swap(&mut start, &mut end);
                        }
                        if full {
                            end = start + TAU;
                        }
                        r.start_angle = start;
                        r.end_angle = end;
                        r.radius *= factor;
                    }
                    Transform::Scale { .. } => r.radius *= factor,
                    Transform::Translate { .. } => {}
                }
            }
            ObjectType::Polygon => {
                let span = self.polygons.geom[slot].points;
                for p in &mut self.points[span.range()] {
                    *p = t.apply(*p);
                }
            }
            ObjectType::Polyline => {
                let span = self.polylines.geom[slot].points;
                for p in &mut self.points[span.range()] {
                    *p = t.apply(*p);
                }
            }
            ObjectType::Text => {
                let factor = t.length_factor();
                let r = &mut self.texts.geom[slot];
                r.position = t.apply(r.position);
                r.font_size *= factor;
            }
            ObjectType::Path => {
                let span = self.paths.geom[slot].commands;
                for cmd in &mut self.commands[span.range()] {
                    cmd.map_points(|p| t.apply(p));
                }
            }
            ObjectType::Group => {}
        }
        Ok(())
    }
}

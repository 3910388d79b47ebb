//! Spatial queries.
//!
//! Both queries are full scans over the live records. Results are always in
//! ascending handle order.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use vexel_types::{BoundingBox, Handle, ObjectType, Point};

use crate::geometry;
use crate::record::Locator;
use crate::store::ObjectStore;

/// How a point hit inside a group is reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitResolution {
    /// Report the outermost group; its members are not reported.
    #[default]
    TopLevel,
    /// Report matching non-group objects, wherever they sit in the tree.
    Leaf,
}

impl ObjectStore {
    /// Handles whose shape lies within `tolerance` of `point`.
    pub fn find_at_point(
        &self,
        point: Point,
        tolerance: f32,
        resolution: HitResolution,
    ) -> Vec<Handle> {
        let tolerance = tolerance.max(0.0);
        match resolution {
            HitResolution::Leaf => self
                .handles()
                .filter(|h| {
                    self.locate(*h).is_ok_and(|loc| {
                        loc.kind != ObjectType::Group && self.leaf_hit(loc, point, tolerance)
                    })
                })
                .collect(),
            HitResolution::TopLevel => self
                .handles()
                .filter(|h| !self.is_grouped(*h))
                .filter(|h| self.hits(*h, point, tolerance))
                .collect(),
        }
    }

    /// Handles whose bounding box intersects `rect`, groups and grouped
    /// members included. Groups without leaves have no extent and never
    /// match.
    pub fn find_in_rect(&self, rect: &BoundingBox) -> Vec<Handle> {
        self.handles()
            .filter(|h| {
                let Ok(loc) = self.locate(*h) else {
                    return false;
                };
                if loc.kind == ObjectType::Group {
                    let mut leaves = Vec::new();
                    self.collect_leaves(*h, &mut leaves, &mut HashSet::new());
                    !leaves.is_empty() && self.group_bbox(*h).intersects(rect)
                } else {
                    self.leaf_bbox(loc).intersects(rect)
                }
            })
            .collect()
    }

    /// Hit test for one handle; a group hits when any leaf under it does.
    pub fn hits(&self, handle: Handle, point: Point, tolerance: f32) -> bool {
        let Ok(loc) = self.locate(handle) else {
            return false;
        };
        if loc.kind != ObjectType::Group {
            return self.leaf_hit(loc, point, tolerance);
        }
        let mut leaves = Vec::new();
        self.collect_leaves(handle, &mut leaves, &mut HashSet::new());
        leaves.into_iter().any(|leaf| {
            self.locate(leaf)
                .is_ok_and(|l| self.leaf_hit(l, point, tolerance))
        })
    }

    pub(crate) fn leaf_hit(&self, loc: Locator, p: Point, tol: f32) -> bool {
        let slot = loc.slot as usize;
        match loc.kind {
            ObjectType::Line => {
                let r = &self.lines.geom[slot];
                geometry::segment_distance_sq(p, r.start, r.end) <= tol * tol
            }
            ObjectType::Circle => {
                let r = &self.circles.geom[slot];
                p.distance(r.center) <= r.radius + tol
            }
            ObjectType::Ellipse => {
                let r = &self.ellipses.geom[slot];
                geometry::ellipse_hit(p, r.center, r.rx, r.ry, r.rotation, tol)
            }
            ObjectType::Rectangle => {
                let r = &self.rects.geom[slot];
                geometry::rect_hit(p, r.top_left, r.width, r.height, r.corner_radius, tol)
            }
            ObjectType::Polygon => {
                let r = &self.polygons.geom[slot];
                let pts = self.point_slice(r.points);
                geometry::point_in_polygon(p, pts)
                    || geometry::chain_distance(p, pts, r.closed) <= tol
            }
            ObjectType::Polyline => {
                let r = &self.polylines.geom[slot];
                geometry::chain_distance(p, self.point_slice(r.points), false) <= tol
            }
            ObjectType::Arc => {
                let r = &self.arcs.geom[slot];
                geometry::arc_hit(p, r.center, r.radius, r.start_angle, r.end_angle, tol)
            }
            ObjectType::Text | ObjectType::Path => self.leaf_bbox(loc).inflated(tol).contains(p),
            ObjectType::Group => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use vexel_types::{Arc, Circle, Line, LineStyle, Polygon, Rectangle, Style, Text};

    use super::*;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    fn circle(store: &mut ObjectStore, x: f32, y: f32, r: f32) -> Handle {
        store
            .add_circle(
                Circle {
                    center: p(x, y),
                    radius: r,
                },
                Style::default(),
            )
            .unwrap()
    }

    #[test]
    fn circle_hit_includes_tolerance() {
        let mut store = ObjectStore::new();
        let c = circle(&mut store, 0.0, 0.0, 10.0);
        assert_eq!(store.find_at_point(p(5.0, 5.0), 0.0, HitResolution::TopLevel), vec![c]);
        assert!(store
            .find_at_point(p(11.0, 0.0), 0.5, HitResolution::TopLevel)
            .is_empty());
        assert_eq!(store.find_at_point(p(11.0, 0.0), 1.0, HitResolution::TopLevel), vec![c]);
    }

    #[test]
    fn line_hit_uses_segment_distance() {
        let mut store = ObjectStore::new();
        let l = store
            .add_line(
                Line {
                    start: p(0.0, 0.0),
                    end: p(100.0, 0.0),
                    line_style: LineStyle::Solid,
                },
                Style::default(),
            )
            .unwrap();
        assert_eq!(store.find_at_point(p(50.0, 2.0), 2.5, HitResolution::Leaf), vec![l]);
        assert!(store
            .find_at_point(p(50.0, 2.0), 1.0, HitResolution::Leaf)
            .is_empty());
        assert!(store
            .find_at_point(p(104.0, 0.0), 3.0, HitResolution::Leaf)
            .is_empty());
    }

    #[test]
    fn filled_shapes_hit_inside_and_near_edge() {
        let mut store = ObjectStore::new();
        let r = store
            .add_rectangle(
                Rectangle {
                    top_left: p(0.0, 0.0),
                    width: 10.0,
                    height: 10.0,
                    corner_radius: 0.0,
                },
                Style::default(),
            )
            .unwrap();
        let tri = store
            .add_polygon(
                Polygon {
                    points: vec![p(100.0, 0.0), p(110.0, 0.0), p(100.0, 10.0)],
                    closed: true,
                },
                Style::default(),
            )
            .unwrap();
        assert_eq!(store.find_at_point(p(5.0, 5.0), 0.0, HitResolution::Leaf), vec![r]);
        assert_eq!(store.find_at_point(p(11.0, 5.0), 1.5, HitResolution::Leaf), vec![r]);
        assert_eq!(store.find_at_point(p(102.0, 2.0), 0.0, HitResolution::Leaf), vec![tri]);
        assert!(store
            .find_at_point(p(109.0, 9.0), 0.5, HitResolution::Leaf)
            .is_empty());
    }

    #[test]
    fn rounded_rectangle_corner_is_empty() {
        let mut store = ObjectStore::new();
        let r = store
            .add_rectangle(
                Rectangle {
                    top_left: p(0.0, 0.0),
                    width: 40.0,
                    height: 20.0,
                    corner_radius: 8.0,
                },
                Style::default(),
            )
            .unwrap();
        assert!(store
            .find_at_point(p(1.0, 1.0), 0.5, HitResolution::Leaf)
            .is_empty());
        assert_eq!(store.find_at_point(p(20.0, 1.0), 0.0, HitResolution::Leaf), vec![r]);
        assert_eq!(store.find_at_point(p(1.0, 1.0), 3.0, HitResolution::Leaf), vec![r]);
    }

    #[test]
    fn arc_hit_respects_angular_span() {
        let mut store = ObjectStore::new();
        let a = store
            .add_arc(
                Arc {
                    center: p(0.0, 0.0),
                    radius: 10.0,
                    start_angle: 0.0,
                    end_angle: PI,
                },
                Style::default(),
            )
            .unwrap();
        assert_eq!(store.find_at_point(p(0.0, 10.0), 0.5, HitResolution::Leaf), vec![a]);
        assert!(store
            .find_at_point(p(0.0, -10.0), 0.5, HitResolution::Leaf)
            .is_empty());
    }

    #[test]
    fn text_hits_its_estimated_box() {
        let mut store = ObjectStore::new();
        let t = store
            .add_text(Text::new(p(0.0, 20.0), "abcd", 10.0), Style::default())
            .unwrap();
        assert_eq!(store.find_at_point(p(20.0, 15.0), 0.0, HitResolution::Leaf), vec![t]);
        assert!(store
            .find_at_point(p(20.0, 25.0), 0.0, HitResolution::Leaf)
            .is_empty());
    }

    #[test]
    fn group_resolution_modes() {
        let mut store = ObjectStore::new();
        let a = circle(&mut store, 0.0, 0.0, 5.0);
        let b = circle(&mut store, 100.0, 0.0, 5.0);
        let inner = store.add_group(&[a], Style::default()).unwrap();
        let outer = store.add_group(&[inner, b], Style::default()).unwrap();
        let lone = circle(&mut store, 1.0, 0.0, 5.0);

        assert_eq!(
            store.find_at_point(p(0.0, 0.0), 0.0, HitResolution::TopLevel),
            vec![outer, lone]
        );
        assert_eq!(
            store.find_at_point(p(0.0, 0.0), 0.0, HitResolution::Leaf),
            vec![a, lone]
        );
        assert!(store
            .find_at_point(p(50.0, 0.0), 0.0, HitResolution::TopLevel)
            .is_empty());
    }

    #[test]
    fn find_in_rect_matches_brute_force() {
        let mut store = ObjectStore::new();
        let mut all = Vec::new();
        for i in 0..20 {
            let x = (i * 37 % 100) as f32;
            let y = (i * 53 % 100) as f32;
            all.push(circle(&mut store, x, y, 1.0 + (i % 4) as f32));
        }
        let g = store.add_group(&all[0..3], Style::default()).unwrap();
        let empty = store.add_group(&[], Style::default()).unwrap();
        all.push(g);

        let rect = BoundingBox::new(20.0, 20.0, 60.0, 70.0);
        let expected: Vec<Handle> = all
            .iter()
            .copied()
            .filter(|h| store.bounding_box(*h).unwrap().intersects(&rect))
            .collect();
        let found = store.find_in_rect(&rect);
        assert_eq!(found, expected);
        assert!(!found.contains(&empty));
    }
}

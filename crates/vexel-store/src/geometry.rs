//! Geometric helpers: distances, containment, and shape bounds.
//!
//! Curved outlines go through kurbo in `f64`; records stay `f32` and are
//! widened at this boundary.

use std::f32::consts::TAU;

use kurbo::{BezPath, Ellipse, ParamCurveNearest, Rect, Shape};
use vexel_types::{to_bez_path, BoundingBox, PathCommand, Point, TextAlign, VerticalAlign};

/// Average glyph advance as a fraction of the font size.
pub const TEXT_ADVANCE: f32 = 0.6;
/// Line height as a multiple of the font size.
pub const TEXT_LINE_HEIGHT: f32 = 1.2;

/// Flattening and nearest-point accuracy for curved outlines.
const CURVE_ACCURACY: f64 = 1e-4;

pub fn segment_distance_sq(p: Point, a: Point, b: Point) -> f32 {
    kurbo::Line::new(a, b).nearest(p.into(), CURVE_ACCURACY).distance_sq as f32
}

/// Smallest distance from `p` to the chain `points`, optionally closing the
/// last point back to the first.
pub fn chain_distance(p: Point, points: &[Point], closed: bool) -> f32 {
    if let [only] = points {
        return p.distance(*only);
    }
    let mut best = f32::INFINITY;
    for w in points.windows(2) {
        best = best.min(segment_distance_sq(p, w[0], w[1]));
    }
    if closed && points.len() > 2 {
        if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
            best = best.min(segment_distance_sq(p, last, first));
        }
    }
    best.sqrt()
}

/// Nonzero-winding point-in-polygon test. The outline is always closed.
pub fn point_in_polygon(p: Point, points: &[Point]) -> bool {
    if points.len() < 3 {
        return false;
    }
    let mut path = BezPath::new();
    path.move_to(points[0]);
    for &pt in &points[1..] {
        path.line_to(pt);
    }
    path.close_path();
    path.contains(p.into())
}

/// Distance from `p` to the outline of `shape`.
fn outline_distance(shape: &impl Shape, p: kurbo::Point) -> f64 {
    shape
        .path_segments(CURVE_ACCURACY)
        .map(|seg| seg.nearest(p, CURVE_ACCURACY).distance_sq)
        .fold(f64::INFINITY, f64::min)
        .sqrt()
}

/// Inside the shape, or within `tolerance` of its outline.
fn filled_hit(shape: &impl Shape, p: Point, tolerance: f32) -> bool {
    let p = kurbo::Point::from(p);
    shape.contains(p) || outline_distance(shape, p) <= f64::from(tolerance)
}

/// Bounds of the drawn segments of `path`, or `None` when it draws nothing.
fn drawn_bounds(path: &BezPath) -> Option<BoundingBox> {
    path.segments().next()?;
    Some(path.bounding_box().into())
}

fn ellipse(center: Point, rx: f32, ry: f32, rotation: f32) -> Ellipse {
    Ellipse::new(
        center,
        (f64::from(rx), f64::from(ry)),
        f64::from(rotation),
    )
}

/// Axis-aligned bounds of an ellipse rotated by `rotation` radians.
pub fn ellipse_bbox(center: Point, rx: f32, ry: f32, rotation: f32) -> BoundingBox {
    ellipse(center, rx, ry, rotation).bounding_box().into()
}

pub fn ellipse_hit(p: Point, center: Point, rx: f32, ry: f32, rotation: f32, tolerance: f32) -> bool {
    filled_hit(&ellipse(center, rx, ry, rotation), p, tolerance)
}

/// Rectangle hit test; a positive `corner_radius` rounds the corners.
pub fn rect_hit(
    p: Point,
    top_left: Point,
    width: f32,
    height: f32,
    corner_radius: f32,
    tolerance: f32,
) -> bool {
    let rect = Rect::from_origin_size(top_left, (f64::from(width), f64::from(height)));
    if corner_radius > 0.0 {
        filled_hit(&rect.to_rounded_rect(f64::from(corner_radius)), p, tolerance)
    } else {
        filled_hit(&rect, p, tolerance)
    }
}

/// Angular extent of an arc, always in `[0, TAU]`.
///
/// Arcs run from `start` towards increasing angle. A difference of a full
/// turn or more is a complete circle.
pub fn arc_sweep(start: f32, end: f32) -> f32 {
    let d = end - start;
    if d.abs() >= TAU {
        TAU
    } else {
        d.rem_euclid(TAU)
    }
}

pub fn arc_point(center: Point, radius: f32, angle: f32) -> Point {
    let (sin, cos) = angle.sin_cos();
    Point::new(center.x + radius * cos, center.y + radius * sin)
}

fn arc(center: Point, radius: f32, start: f32, end: f32) -> kurbo::Arc {
    let r = f64::from(radius);
    kurbo::Arc::new(
        center,
        (r, r),
        f64::from(start),
        f64::from(arc_sweep(start, end)),
        0.0,
    )
}

pub fn arc_bbox(center: Point, radius: f32, start: f32, end: f32) -> BoundingBox {
    let path = arc(center, radius, start, end).to_path(CURVE_ACCURACY);
    drawn_bounds(&path)
        .unwrap_or_else(|| BoundingBox::at_point(arc_point(center, radius, start)))
}

pub fn arc_hit(p: Point, center: Point, radius: f32, start: f32, end: f32, tolerance: f32) -> bool {
    let arc = arc(center, radius, start, end);
    let p = kurbo::Point::from(p);
    let d = if arc.sweep_angle == 0.0 {
        p.distance(arc_point(center, radius, start).into())
    } else {
        outline_distance(&arc, p)
    };
    d <= f64::from(tolerance)
}

/// Estimated text extent from font metrics, anchored by alignment.
pub fn text_bbox(
    position: Point,
    char_count: usize,
    font_size: f32,
    align: TextAlign,
    vertical_align: VerticalAlign,
) -> BoundingBox {
    let width = char_count as f32 * font_size * TEXT_ADVANCE;
    let height = font_size * TEXT_LINE_HEIGHT;
    let min_x = match align {
        TextAlign::Left => position.x,
        TextAlign::Center => position.x - width * 0.5,
        TextAlign::Right => position.x - width,
    };
    let min_y = match vertical_align {
        VerticalAlign::Top => position.y,
        VerticalAlign::Middle => position.y - height * 0.5,
        VerticalAlign::Bottom => position.y - height,
    };
    BoundingBox::new(min_x, min_y, min_x + width, min_y + height)
}

/// Tight bounds of a path's curves. A path that only moves the pen is
/// bounded by its pen positions. `None` when the path has no points.
pub fn path_bbox(commands: &[PathCommand]) -> Option<BoundingBox> {
    drawn_bounds(&to_bez_path(commands)).or_else(|| {
        let pens: Vec<Point> = commands.iter().filter_map(PathCommand::end_point).collect();
        BoundingBox::from_points(&pens)
    })
}

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_2, PI};

    use super::*;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let a = p(0.0, 0.0);
        let b = p(10.0, 0.0);
        assert!((segment_distance_sq(p(5.0, 3.0), a, b) - 9.0).abs() < 1e-4);
        assert!((segment_distance_sq(p(-4.0, 3.0), a, b) - 25.0).abs() < 1e-4);
        assert!((segment_distance_sq(p(1.0, 1.0), a, a) - 2.0).abs() < 1e-4);
    }

    #[test]
    fn polygon_containment() {
        let tri = [p(0.0, 0.0), p(10.0, 0.0), p(0.0, 10.0)];
        assert!(point_in_polygon(p(2.0, 2.0), &tri));
        assert!(!point_in_polygon(p(8.0, 8.0), &tri));
        assert!(!point_in_polygon(p(1.0, 1.0), &tri[..2]));
    }

    #[test]
    fn closed_chain_includes_closing_edge() {
        let sq = [p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)];
        assert!((chain_distance(p(-1.0, 5.0), &sq, true) - 1.0).abs() < 1e-4);
        assert!(chain_distance(p(-1.0, 5.0), &sq, false) > 1.0);
    }

    #[test]
    fn rotated_ellipse_bounds() {
        let b = ellipse_bbox(p(0.0, 0.0), 10.0, 5.0, FRAC_PI_2);
        assert!(b.approx_eq(&BoundingBox::new(-5.0, -10.0, 5.0, 10.0), 1e-4));
    }

    #[test]
    fn ellipse_tolerance_is_measured_from_the_outline() {
        let c = p(0.0, 0.0);
        assert!(ellipse_hit(p(3.0, 1.0), c, 10.0, 2.0, 0.0, 0.0));
        assert!(ellipse_hit(p(10.5, 0.0), c, 10.0, 2.0, 0.0, 0.6));
        assert!(!ellipse_hit(p(10.5, 0.0), c, 10.0, 2.0, 0.0, 0.4));
        assert!(ellipse_hit(p(0.0, 2.5), c, 10.0, 2.0, 0.0, 0.6));
    }

    #[test]
    fn rounded_corners_are_not_hit() {
        let tl = p(0.0, 0.0);
        assert!(rect_hit(p(0.5, 0.5), tl, 20.0, 20.0, 0.0, 0.0));
        assert!(!rect_hit(p(0.5, 0.5), tl, 20.0, 20.0, 5.0, 0.0));
        assert!(rect_hit(p(10.0, 0.5), tl, 20.0, 20.0, 5.0, 0.0));
        assert!(rect_hit(p(21.0, 10.0), tl, 20.0, 20.0, 5.0, 1.5));
        assert!(!rect_hit(p(21.0, 10.0), tl, 20.0, 20.0, 5.0, 0.5));
    }

    #[test]
    fn quarter_arc_bounds_and_hits() {
        let b = arc_bbox(p(0.0, 0.0), 10.0, 0.0, FRAC_PI_2);
        assert!(b.approx_eq(&BoundingBox::new(0.0, 0.0, 10.0, 10.0), 1e-3));
        assert!(arc_hit(p(7.07, 7.07), p(0.0, 0.0), 10.0, 0.0, FRAC_PI_2, 0.1));
        assert!(!arc_hit(p(-7.07, -7.07), p(0.0, 0.0), 10.0, 0.0, FRAC_PI_2, 0.1));
        assert!(!arc_hit(p(3.0, 3.0), p(0.0, 0.0), 10.0, 0.0, FRAC_PI_2, 0.1));
    }

    #[test]
    fn half_arc_reaches_the_bottom_quadrant() {
        let b = arc_bbox(p(0.0, 0.0), 10.0, 0.0, PI);
        assert!(b.approx_eq(&BoundingBox::new(-10.0, 0.0, 10.0, 10.0), 1e-3));
    }

    #[test]
    fn arc_sweep_wraps() {
        assert!((arc_sweep(0.0, -FRAC_PI_2) - 3.0 * FRAC_PI_2).abs() < 1e-5);
        assert_eq!(arc_sweep(0.0, TAU), TAU);
    }

    #[test]
    fn text_anchoring() {
        let b = text_bbox(p(100.0, 50.0), 5, 10.0, TextAlign::Left, VerticalAlign::Bottom);
        assert!(b.approx_eq(&BoundingBox::new(100.0, 38.0, 130.0, 50.0), 1e-4));
        let c = text_bbox(p(100.0, 50.0), 5, 10.0, TextAlign::Center, VerticalAlign::Top);
        assert!(c.approx_eq(&BoundingBox::new(85.0, 50.0, 115.0, 62.0), 1e-4));
    }

    #[test]
    fn path_bounds_follow_the_curve() {
        let cmds = vexel_types::parse_svg_path("M 0 0 A 10 10 0 0 1 20 0").unwrap();
        let b = path_bbox(&cmds).unwrap();
        assert!(b.approx_eq(&BoundingBox::new(0.0, -10.0, 20.0, 0.0), 1e-2));

        let cmds = vexel_types::parse_svg_path("M 0 0 Q 10 20 20 0").unwrap();
        let b = path_bbox(&cmds).unwrap();
        assert!(b.approx_eq(&BoundingBox::new(0.0, 0.0, 20.0, 10.0), 1e-4));
    }

    #[test]
    fn pen_only_path_is_bounded_by_its_moves() {
        let cmds = vexel_types::parse_svg_path("M 1 2").unwrap();
        assert_eq!(path_bbox(&cmds), Some(BoundingBox::new(1.0, 2.0, 1.0, 2.0)));
        assert_eq!(path_bbox(&[]), None);
    }
}

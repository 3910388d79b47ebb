use serde::{Deserialize, Serialize};

/// A point in drawing space (8 bytes).
///
/// The y axis points down, matching SVG: "top" means smaller y.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance_sq(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(self, other: Self) -> f32 {
        self.distance_sq(other).sqrt()
    }

    pub fn translated(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Scale this point's offset from `center` by `(sx, sy)`.
    pub fn scaled_about(self, center: Self, sx: f32, sy: f32) -> Self {
        Self::new(
            center.x + (self.x - center.x) * sx,
            center.y + (self.y - center.y) * sy,
        )
    }

    /// Rotate about `center` given a precomputed `(sin, cos)` pair.
    pub fn rotated_about(self, center: Self, sin: f32, cos: f32) -> Self {
        let dx = self.x - center.x;
        let dy = self.y - center.y;
        Self::new(
            center.x + dx * cos - dy * sin,
            center.y + dx * sin + dy * cos,
        )
    }

    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}

impl From<Point> for kurbo::Point {
    fn from(p: Point) -> Self {
        kurbo::Point::new(f64::from(p.x), f64::from(p.y))
    }
}

impl From<kurbo::Point> for Point {
    fn from(p: kurbo::Point) -> Self {
        Self::new(p.x as f32, p.y as f32)
    }
}

/// Axis-aligned rectangle `(min_x, min_y, max_x, max_y)` (16 bytes).
///
/// The all-zero box is the conventional result for "no geometry": empty id
/// sets, empty groups, and empty drawings all report it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl From<kurbo::Rect> for BoundingBox {
    fn from(r: kurbo::Rect) -> Self {
        let r = r.abs();
        Self::new(r.x0 as f32, r.y0 as f32, r.x1 as f32, r.y1 as f32)
    }
}

impl From<BoundingBox> for kurbo::Rect {
    fn from(b: BoundingBox) -> Self {
        kurbo::Rect::new(
            f64::from(b.min_x),
            f64::from(b.min_y),
            f64::from(b.max_x),
            f64::from(b.max_y),
        )
    }
}

impl BoundingBox {
    /// The degenerate zero box.
    pub const ZERO: Self = Self {
        min_x: 0.0,
        min_y: 0.0,
        max_x: 0.0,
        max_y: 0.0,
    };

    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// A zero-area box located at `p`.
    pub const fn at_point(p: Point) -> Self {
        Self::new(p.x, p.y, p.x, p.y)
    }

    /// Box centered on `center` with the given half extents.
    pub fn around(center: Point, half_w: f32, half_h: f32) -> Self {
        Self::new(
            center.x - half_w,
            center.y - half_h,
            center.x + half_w,
            center.y + half_h,
        )
    }

    /// Smallest box enclosing every point. Returns `None` for an empty slice.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bbox = Self::at_point(*first);
        for p in rest {
            bbox.expand_point(*p);
        }
        Some(bbox)
    }

    /// Union of an iterator of boxes, or [`BoundingBox::ZERO`] when empty.
    pub fn union_all<I: IntoIterator<Item = Self>>(boxes: I) -> Self {
        let mut iter = boxes.into_iter();
        let Some(mut acc) = iter.next() else {
            return Self::ZERO;
        };
        for b in iter {
            acc.expand(&b);
        }
        acc
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Inclusive overlap test: boxes that touch along an edge intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        !(self.max_x < other.min_x
            || self.min_x > other.max_x
            || self.max_y < other.min_y
            || self.min_y > other.max_y)
    }

    pub fn expand_point(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn expand(&mut self, other: &Self) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    pub fn union(mut self, other: &Self) -> Self {
        self.expand(other);
        self
    }

    /// Grow every side by `amount`.
    pub fn inflated(&self, amount: f32) -> Self {
        Self::new(
            self.min_x - amount,
            self.min_y - amount,
            self.max_x + amount,
            self.max_y + amount,
        )
    }

    /// Component-wise comparison within `eps`.
    pub fn approx_eq(&self, other: &Self, eps: f32) -> bool {
        (self.min_x - other.min_x).abs() <= eps
            && (self.min_y - other.min_y).abs() <= eps
            && (self.max_x - other.max_x).abs() <= eps
            && (self.max_y - other.max_y).abs() <= eps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_of_nothing_is_zero() {
        assert_eq!(BoundingBox::union_all(Vec::new()), BoundingBox::ZERO);
    }

    #[test]
    fn union_covers_both() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, -5.0, 20.0, 3.0);
        assert_eq!(a.union(&b), BoundingBox::new(0.0, -5.0, 20.0, 10.0));
    }

    #[test]
    fn touching_boxes_intersect() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(10.0, 10.0, 20.0, 20.0);
        let c = BoundingBox::new(10.1, 0.0, 20.0, 20.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn from_points_spans_extremes() {
        let pts = [
            Point::new(3.0, 1.0),
            Point::new(-2.0, 4.0),
            Point::new(1.0, -6.0),
        ];
        assert_eq!(
            BoundingBox::from_points(&pts).unwrap(),
            BoundingBox::new(-2.0, -6.0, 3.0, 4.0)
        );
        assert!(BoundingBox::from_points(&[]).is_none());
    }

    #[test]
    fn quarter_turn_about_center() {
        let (sin, cos) = std::f32::consts::FRAC_PI_2.sin_cos();
        let p = Point::new(2.0, 1.0).rotated_about(Point::new(1.0, 1.0), sin, cos);
        assert!((p.x - 1.0).abs() < 1e-6);
        assert!((p.y - 2.0).abs() < 1e-6);
    }

    #[test]
    fn scaled_about_keeps_center_fixed() {
        let c = Point::new(5.0, 5.0);
        assert_eq!(c.scaled_about(c, 3.0, 0.5), c);
        assert_eq!(
            Point::new(6.0, 7.0).scaled_about(c, 2.0, 0.5),
            Point::new(7.0, 6.0)
        );
    }
}

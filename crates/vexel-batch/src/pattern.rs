//! Grid and ring generators.
//!
//! Each generated element fills 80% of its cell: circles get a radius of
//! 0.4 of the smaller cell side, rectangles are 0.8 of the cell and
//! centered in it. Only circles and rectangles can be generated.

use std::f32::consts::TAU;
use std::time::Instant;

use tracing::debug;
use vexel_store::{ObjectStore, StoreError};
use vexel_types::{Circle, Handle, ObjectType, Point, Rectangle, Shape, Style};

use crate::error::{BatchError, BatchResult};

const FILL: f32 = 0.8;

fn check_kind(kind: ObjectType) -> BatchResult<()> {
    match kind {
        ObjectType::Circle | ObjectType::Rectangle => Ok(()),
        other => Err(BatchError::UnsupportedKind(other)),
    }
}

fn positive(what: &str, v: f32) -> BatchResult<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(StoreError::InvalidGeometry(format!("{what} must be positive, got {v}")).into())
    }
}

/// One element of `kind` centered on `center` inside a `w` x `h` cell.
fn cell_shape(kind: ObjectType, center: Point, w: f32, h: f32) -> Shape {
    match kind {
        ObjectType::Circle => Shape::Circle(Circle {
            center,
            radius: w.min(h) * FILL / 2.0,
        }),
        _ => Shape::Rectangle(Rectangle {
            top_left: Point::new(center.x - w * FILL / 2.0, center.y - h * FILL / 2.0),
            width: w * FILL,
            height: h * FILL,
            corner_radius: 0.0,
        }),
    }
}

/// Room for `count` cells in the store and in the staging list.
fn stage(store: &mut ObjectStore, kind: ObjectType, count: usize) -> BatchResult<Vec<Shape>> {
    store.reserve(kind, count)?;
    let mut shapes = Vec::new();
    shapes
        .try_reserve(count)
        .map_err(|e| StoreError::CapacityExceeded(e.to_string()))?;
    Ok(shapes)
}

/// Fill a `rows` x `cols` grid whose top-left cell starts at `offset`.
///
/// Handles are returned row by row. Every cell is checked before the first
/// one is added, so a failed grid adds nothing.
#[allow(clippy::too_many_arguments)]
pub fn create_grid(
    store: &mut ObjectStore,
    kind: ObjectType,
    rows: usize,
    cols: usize,
    cell_width: f32,
    cell_height: f32,
    offset: Point,
    style: Style,
) -> BatchResult<Vec<Handle>> {
    check_kind(kind)?;
    positive("cell width", cell_width)?;
    positive("cell height", cell_height)?;
    if !offset.is_finite() {
        return Err(StoreError::InvalidGeometry("grid offset is not finite".into()).into());
    }
    let count = rows.checked_mul(cols).ok_or_else(|| {
        StoreError::CapacityExceeded(format!("a {rows} x {cols} grid overflows the cell count"))
    })?;

    let started = Instant::now();
    let mut shapes = stage(store, kind, count)?;
    for row in 0..rows {
        for col in 0..cols {
            let center = Point::new(
                offset.x + col as f32 * cell_width + cell_width / 2.0,
                offset.y + row as f32 * cell_height + cell_height / 2.0,
            );
            shapes.push(cell_shape(kind, center, cell_width, cell_height));
        }
    }
    let out = store.add_all(shapes, style)?;
    debug!(
        kind = %kind,
        rows,
        cols,
        elapsed_us = started.elapsed().as_micros() as u64,
        "grid created"
    );
    Ok(out)
}

/// Place `count` elements evenly around a circle, the first at angle zero.
///
/// Element size follows the arc length between neighbours.
pub fn create_circular_pattern(
    store: &mut ObjectStore,
    kind: ObjectType,
    count: usize,
    radius: f32,
    center: Point,
    style: Style,
) -> BatchResult<Vec<Handle>> {
    check_kind(kind)?;
    positive("pattern radius", radius)?;
    if !center.is_finite() {
        return Err(StoreError::InvalidGeometry("pattern center is not finite".into()).into());
    }
    if count == 0 {
        return Ok(Vec::new());
    }

    let started = Instant::now();
    let step = TAU / count as f32;
    let cell = radius * step;
    let mut shapes = stage(store, kind, count)?;
    for i in 0..count {
        let (sin, cos) = (step * i as f32).sin_cos();
        let at = Point::new(center.x + radius * cos, center.y + radius * sin);
        shapes.push(cell_shape(kind, at, cell, cell));
    }
    let out = store.add_all(shapes, style)?;
    debug!(
        kind = %kind,
        count,
        elapsed_us = started.elapsed().as_micros() as u64,
        "circular pattern created"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use vexel_types::BoundingBox;

    use super::*;

    #[test]
    fn grid_cells_are_row_major() {
        let mut store = ObjectStore::new();
        let ids = create_grid(
            &mut store,
            ObjectType::Circle,
            2,
            3,
            10.0,
            20.0,
            Point::new(100.0, 0.0),
            Style::default(),
        )
        .unwrap();
        assert_eq!(ids.len(), 6);
        match store.shape(ids[4]).unwrap() {
            Shape::Circle(c) => {
                assert_eq!(c.center, Point::new(115.0, 30.0));
                assert_eq!(c.radius, 4.0);
            }
            other => panic!("expected circle, got {other:?}"),
        }
    }

    #[test]
    fn grid_rectangles_fill_most_of_the_cell() {
        let mut store = ObjectStore::new();
        let ids = create_grid(
            &mut store,
            ObjectType::Rectangle,
            1,
            2,
            10.0,
            10.0,
            Point::ORIGIN,
            Style::default(),
        )
        .unwrap();
        assert!(store
            .bounding_box(ids[1])
            .unwrap()
            .approx_eq(&BoundingBox::new(11.0, 1.0, 19.0, 9.0), 1e-5));
    }

    #[test]
    fn unsupported_kind_creates_nothing() {
        let mut store = ObjectStore::new();
        let err = create_grid(
            &mut store,
            ObjectType::Text,
            2,
            2,
            10.0,
            10.0,
            Point::ORIGIN,
            Style::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BatchError::UnsupportedKind(ObjectType::Text)));
        assert!(store.is_empty());
    }

    #[test]
    fn bad_cell_size_is_invalid_geometry() {
        let mut store = ObjectStore::new();
        let err = create_grid(
            &mut store,
            ObjectType::Circle,
            1,
            1,
            0.0,
            10.0,
            Point::ORIGIN,
            Style::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BatchError::Store(StoreError::InvalidGeometry(_))));
    }

    #[test]
    fn ring_places_elements_on_the_circle() {
        let mut store = ObjectStore::new();
        let center = Point::new(50.0, 50.0);
        let ids =
            create_circular_pattern(&mut store, ObjectType::Circle, 4, 20.0, center, Style::default())
                .unwrap();
        assert_eq!(ids.len(), 4);
        for id in &ids {
            let c = store.bounding_box(*id).unwrap().center();
            assert!((c.distance(center) - 20.0).abs() < 1e-3);
        }
        let first = store.bounding_box(ids[0]).unwrap().center();
        assert!(first.distance(Point::new(70.0, 50.0)) < 1e-4);
        assert!(create_circular_pattern(&mut store, ObjectType::Circle, 0, 20.0, center, Style::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn oversized_grid_is_refused_before_anything_is_added() {
        let mut store = ObjectStore::new();
        for (rows, cols) in [(usize::MAX, 2), (1 << 20, 1 << 13)] {
            let err = create_grid(
                &mut store,
                ObjectType::Circle,
                rows,
                cols,
                1.0,
                1.0,
                Point::ORIGIN,
                Style::default(),
            )
            .unwrap_err();
            assert!(
                matches!(err, BatchError::Store(StoreError::CapacityExceeded(_))),
                "{rows} x {cols}: {err:?}"
            );
        }
        assert!(store.is_empty());
        assert_eq!(store.next_handle(), Handle::FIRST);
    }

    #[test]
    fn grid_with_an_overflowing_cell_adds_nothing() {
        let mut store = ObjectStore::new();
        let err = create_grid(
            &mut store,
            ObjectType::Rectangle,
            1,
            3,
            f32::MAX / 2.0,
            1.0,
            Point::ORIGIN,
            Style::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BatchError::Store(StoreError::InvalidGeometry(_))));
        assert!(store.is_empty());
        assert_eq!(store.next_handle(), Handle::FIRST);
    }
}

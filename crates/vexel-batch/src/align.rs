//! Alignment and distribution.
//!
//! Every operation measures the ids' bounding boxes once, then moves each id
//! by a pure translation. Y grows downward, so "top" is the smallest `min_y`.
//! Groups without leaves have no extent: they are left out of the
//! measurement and never move.

use vexel_store::{ObjectStore, Transform};
use vexel_types::{BoundingBox, Handle};

use crate::error::BatchResult;
use crate::plan::Plan;
use crate::stats::BatchStats;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn min(self, b: &BoundingBox) -> f32 {
        match self {
            Self::X => b.min_x,
            Self::Y => b.min_y,
        }
    }

    fn max(self, b: &BoundingBox) -> f32 {
        match self {
            Self::X => b.max_x,
            Self::Y => b.max_y,
        }
    }

    fn center(self, b: &BoundingBox) -> f32 {
        (self.min(b) + self.max(b)) / 2.0
    }

    fn extent(self, b: &BoundingBox) -> f32 {
        self.max(b) - self.min(b)
    }

    fn shift(self, delta: f32) -> Transform {
        match self {
            Self::X => Transform::Translate { dx: delta, dy: 0.0 },
            Self::Y => Transform::Translate { dx: 0.0, dy: delta },
        }
    }
}

/// Split `ids` into the ones with extent and their bounding boxes.
fn measure(store: &ObjectStore, ids: &[Handle]) -> BatchResult<(Vec<Handle>, Vec<BoundingBox>)> {
    let mut kept = Vec::with_capacity(ids.len());
    let mut boxes = Vec::with_capacity(ids.len());
    for &id in ids {
        let bbox = store.bounding_box(id)?;
        if !store.leaves(id)?.is_empty() {
            kept.push(id);
            boxes.push(bbox);
        }
    }
    Ok((kept, boxes))
}

/// Move each id along `axis` so that `edge(bbox)` lands on `target`.
fn align_to(
    store: &mut ObjectStore,
    ids: &[Handle],
    axis: Axis,
    target: impl Fn(&[BoundingBox]) -> f32,
    edge: impl Fn(&BoundingBox) -> f32,
    op: &'static str,
) -> BatchResult<BatchStats> {
    let (ids, boxes) = measure(store, ids)?;
    let target = target(&boxes);
    let mut plan = Plan::default();
    for (id, bbox) in ids.iter().zip(&boxes) {
        let delta = target - edge(bbox);
        if delta != 0.0 {
            plan.push(store, *id, axis.shift(delta))?;
        }
    }
    plan.execute(store, op)
}

fn fold_min(values: impl Iterator<Item = f32>) -> f32 {
    values.fold(f32::INFINITY, f32::min)
}

fn fold_max(values: impl Iterator<Item = f32>) -> f32 {
    values.fold(f32::NEG_INFINITY, f32::max)
}

pub fn align_left(store: &mut ObjectStore, ids: &[Handle]) -> BatchResult<BatchStats> {
    let x = Axis::X;
    align_to(store, ids, x, |b| fold_min(b.iter().map(|b| x.min(b))), |b| x.min(b), "align_left")
}

pub fn align_right(store: &mut ObjectStore, ids: &[Handle]) -> BatchResult<BatchStats> {
    let x = Axis::X;
    align_to(store, ids, x, |b| fold_max(b.iter().map(|b| x.max(b))), |b| x.max(b), "align_right")
}

pub fn align_top(store: &mut ObjectStore, ids: &[Handle]) -> BatchResult<BatchStats> {
    let y = Axis::Y;
    align_to(store, ids, y, |b| fold_min(b.iter().map(|b| y.min(b))), |b| y.min(b), "align_top")
}

pub fn align_bottom(store: &mut ObjectStore, ids: &[Handle]) -> BatchResult<BatchStats> {
    let y = Axis::Y;
    align_to(store, ids, y, |b| fold_max(b.iter().map(|b| y.max(b))), |b| y.max(b), "align_bottom")
}

/// Center every id horizontally on the center of the ids' combined box.
pub fn align_center_horizontal(store: &mut ObjectStore, ids: &[Handle]) -> BatchResult<BatchStats> {
    let x = Axis::X;
    align_to(
        store,
        ids,
        x,
        |b| x.center(&BoundingBox::union_all(b.iter().copied())),
        |b| x.center(b),
        "align_center_horizontal",
    )
}

/// Center every id vertically on the center of the ids' combined box.
pub fn align_center_vertical(store: &mut ObjectStore, ids: &[Handle]) -> BatchResult<BatchStats> {
    let y = Axis::Y;
    align_to(
        store,
        ids,
        y,
        |b| y.center(&BoundingBox::union_all(b.iter().copied())),
        |b| y.center(b),
        "align_center_vertical",
    )
}

/// Lay ids out left to right in order of their current `min_x`.
///
/// With `spacing`, each id starts `spacing` after the previous one ends and
/// the leftmost stays put. Without it, the leftmost and rightmost stay put
/// and the gaps between neighbours are made equal.
pub fn distribute_horizontally(
    store: &mut ObjectStore,
    ids: &[Handle],
    spacing: Option<f32>,
) -> BatchResult<BatchStats> {
    distribute(store, ids, Axis::X, spacing, "distribute_horizontally")
}

/// Vertical counterpart of [`distribute_horizontally`], ordered by `min_y`.
pub fn distribute_vertically(
    store: &mut ObjectStore,
    ids: &[Handle],
    spacing: Option<f32>,
) -> BatchResult<BatchStats> {
    distribute(store, ids, Axis::Y, spacing, "distribute_vertically")
}

fn distribute(
    store: &mut ObjectStore,
    ids: &[Handle],
    axis: Axis,
    spacing: Option<f32>,
    op: &'static str,
) -> BatchResult<BatchStats> {
    let (ids, boxes) = measure(store, ids)?;
    let mut order: Vec<usize> = (0..ids.len()).collect();
    order.sort_by(|a, b| axis.min(&boxes[*a]).total_cmp(&axis.min(&boxes[*b])));

    let mut plan = Plan::default();
    let (Some(&first), Some(&last)) = (order.first(), order.last()) else {
        return plan.execute(store, op);
    };
    let gap = match spacing {
        Some(s) => s,
        None if order.len() > 2 => {
            let span = axis.max(&boxes[last]) - axis.min(&boxes[first]);
            let occupied: f32 = order.iter().map(|i| axis.extent(&boxes[*i])).sum();
            (span - occupied) / (order.len() - 1) as f32
        }
        None => return plan.execute(store, op),
    };

    let mut cursor = axis.max(&boxes[first]) + gap;
    for &i in &order[1..] {
        let delta = cursor - axis.min(&boxes[i]);
        if delta != 0.0 {
            plan.push(store, ids[i], axis.shift(delta))?;
        }
        cursor += axis.extent(&boxes[i]) + gap;
    }
    plan.execute(store, op)
}

#[cfg(test)]
mod tests {
    use vexel_types::{Point, Rectangle, Style};

    use super::*;

    fn rect(store: &mut ObjectStore, x: f32, y: f32, w: f32, h: f32) -> Handle {
        store
            .add_rectangle(
                Rectangle {
                    top_left: Point::new(x, y),
                    width: w,
                    height: h,
                    corner_radius: 0.0,
                },
                Style::default(),
            )
            .unwrap()
    }

    fn bbox(store: &ObjectStore, h: Handle) -> BoundingBox {
        store.bounding_box(h).unwrap()
    }

    // ------------------------------------------------------------------
    // edges
    // ------------------------------------------------------------------

    #[test]
    fn align_left_uses_smallest_min_x() {
        let mut store = ObjectStore::new();
        let a = rect(&mut store, 10.0, 0.0, 5.0, 5.0);
        let b = rect(&mut store, 40.0, 20.0, 10.0, 5.0);
        let stats = align_left(&mut store, &[a, b]).unwrap();
        assert_eq!(stats.objects_processed, 1);
        assert_eq!(bbox(&store, b), BoundingBox::new(10.0, 20.0, 20.0, 25.0));
        assert_eq!(bbox(&store, a), BoundingBox::new(10.0, 0.0, 15.0, 5.0));
    }

    #[test]
    fn align_right_top_bottom() {
        let mut store = ObjectStore::new();
        let a = rect(&mut store, 0.0, 0.0, 10.0, 10.0);
        let b = rect(&mut store, 50.0, 30.0, 20.0, 5.0);

        align_right(&mut store, &[a, b]).unwrap();
        assert_eq!(bbox(&store, a).max_x, 70.0);

        align_top(&mut store, &[a, b]).unwrap();
        assert_eq!(bbox(&store, b).min_y, 0.0);

        align_bottom(&mut store, &[a, b]).unwrap();
        assert_eq!(bbox(&store, a).max_y, 10.0);
        assert_eq!(bbox(&store, b).max_y, 10.0);
    }

    #[test]
    fn align_centers_on_combined_box() {
        let mut store = ObjectStore::new();
        let a = rect(&mut store, 0.0, 0.0, 10.0, 10.0);
        let b = rect(&mut store, 90.0, 40.0, 10.0, 60.0);
        align_center_horizontal(&mut store, &[a, b]).unwrap();
        assert_eq!(bbox(&store, a).center().x, 50.0);
        assert_eq!(bbox(&store, b).center().x, 50.0);

        align_center_vertical(&mut store, &[a, b]).unwrap();
        assert_eq!(bbox(&store, a).center().y, 50.0);
        assert_eq!(bbox(&store, b).center().y, 50.0);
    }

    #[test]
    fn aligning_moves_group_leaves() {
        let mut store = ObjectStore::new();
        let a = rect(&mut store, 20.0, 0.0, 5.0, 5.0);
        let b = rect(&mut store, 30.0, 0.0, 5.0, 5.0);
        let g = store.add_group(&[a, b], Style::default()).unwrap();
        let c = rect(&mut store, 0.0, 50.0, 5.0, 5.0);
        align_left(&mut store, &[g, c]).unwrap();
        assert_eq!(bbox(&store, a).min_x, 0.0);
        assert_eq!(bbox(&store, b).min_x, 10.0);
    }

    #[test]
    fn empty_groups_neither_anchor_nor_move() {
        let mut store = ObjectStore::new();
        let empty = store.add_group(&[], Style::default()).unwrap();
        let a = rect(&mut store, 100.0, 0.0, 10.0, 10.0);
        let b = rect(&mut store, 200.0, 30.0, 10.0, 10.0);

        let stats = align_left(&mut store, &[empty, a, b]).unwrap();
        assert_eq!(stats.objects_processed, 1);
        assert_eq!(bbox(&store, a).min_x, 100.0);
        assert_eq!(bbox(&store, b).min_x, 100.0);
        assert_eq!(bbox(&store, empty), BoundingBox::ZERO);

        align_bottom(&mut store, &[a, empty, b]).unwrap();
        assert_eq!(bbox(&store, a).max_y, 40.0);

        let c = rect(&mut store, 160.0, 0.0, 10.0, 10.0);
        distribute_horizontally(&mut store, &[empty, a, c, b], Some(5.0)).unwrap();
        assert_eq!(bbox(&store, b).min_x, 115.0);
        assert_eq!(bbox(&store, c).min_x, 130.0);
    }

    // ------------------------------------------------------------------
    // distribution
    // ------------------------------------------------------------------

    #[test]
    fn distribute_equalizes_gaps_between_extremes() {
        let mut store = ObjectStore::new();
        let a = rect(&mut store, 0.0, 0.0, 10.0, 10.0);
        let c = rect(&mut store, 90.0, 0.0, 10.0, 10.0);
        let b = rect(&mut store, 15.0, 0.0, 20.0, 10.0);
        distribute_horizontally(&mut store, &[a, c, b], None).unwrap();
        assert_eq!(bbox(&store, a).min_x, 0.0);
        assert_eq!(bbox(&store, b).min_x, 40.0);
        assert_eq!(bbox(&store, c).min_x, 90.0);
    }

    #[test]
    fn distribute_with_fixed_spacing_packs_from_first() {
        let mut store = ObjectStore::new();
        let a = rect(&mut store, 0.0, 100.0, 10.0, 10.0);
        let b = rect(&mut store, 0.0, 0.0, 10.0, 20.0);
        let c = rect(&mut store, 0.0, 50.0, 10.0, 5.0);
        distribute_vertically(&mut store, &[a, b, c], Some(4.0)).unwrap();
        assert_eq!(bbox(&store, b).min_y, 0.0);
        assert_eq!(bbox(&store, c).min_y, 24.0);
        assert_eq!(bbox(&store, a).min_y, 33.0);
    }

    #[test]
    fn distributing_two_without_spacing_changes_nothing() {
        let mut store = ObjectStore::new();
        let a = rect(&mut store, 0.0, 0.0, 10.0, 10.0);
        let b = rect(&mut store, 70.0, 0.0, 10.0, 10.0);
        let stats = distribute_horizontally(&mut store, &[a, b], None).unwrap();
        assert_eq!(stats.objects_processed, 0);
        assert_eq!(bbox(&store, b).min_x, 70.0);
    }
}

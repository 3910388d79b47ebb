//! Batch translate, scale, and rotate.
//!
//! With no explicit center, scale and rotate pivot each id about the center
//! of that id's own bounding box.

use vexel_store::{ObjectStore, Transform};
use vexel_types::{Handle, Point};

use crate::error::BatchResult;
use crate::plan::Plan;
use crate::stats::BatchStats;

pub fn translate(store: &mut ObjectStore, ids: &[Handle], dx: f32, dy: f32) -> BatchResult<BatchStats> {
    let t = Transform::Translate { dx, dy };
    Plan::per_object(store, ids, |_, _| Some(t))?.execute(store, "translate")
}

pub fn scale(
    store: &mut ObjectStore,
    ids: &[Handle],
    sx: f32,
    sy: f32,
    center: Option<Point>,
) -> BatchResult<BatchStats> {
    Plan::per_object(store, ids, |_, bbox| {
        Some(Transform::Scale {
            sx,
            sy,
            center: center.unwrap_or_else(|| bbox.center()),
        })
    })?
    .execute(store, "scale")
}

/// Rotate by `angle` radians.
pub fn rotate(
    store: &mut ObjectStore,
    ids: &[Handle],
    angle: f32,
    center: Option<Point>,
) -> BatchResult<BatchStats> {
    Plan::per_object(store, ids, |_, bbox| {
        Some(Transform::Rotate {
            angle,
            center: center.unwrap_or_else(|| bbox.center()),
        })
    })?
    .execute(store, "rotate")
}

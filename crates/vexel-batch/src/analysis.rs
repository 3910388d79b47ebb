//! Read-only measurements over sets of handles.

use serde::{Deserialize, Serialize};
use vexel_store::ObjectStore;
use vexel_types::{BoundingBox, Handle, Point};

use crate::error::BatchResult;

/// Two ids whose bounding boxes overlap or touch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collision {
    pub first: Handle,
    pub second: Handle,
}

/// Union of the ids' bounding boxes; the zero box for an empty set.
///
/// Groups without leaves have no extent and are skipped.
pub fn calculate_bounding_box(store: &ObjectStore, ids: &[Handle]) -> BatchResult<BoundingBox> {
    let mut boxes = Vec::with_capacity(ids.len());
    for &id in ids {
        let bbox = store.bounding_box(id)?;
        if !store.leaves(id)?.is_empty() {
            boxes.push(bbox);
        }
    }
    Ok(BoundingBox::union_all(boxes))
}

/// Distance from `point` to the center of each id's bounding box, in input
/// order.
pub fn distances_to_point(store: &ObjectStore, ids: &[Handle], point: Point) -> BatchResult<Vec<f32>> {
    ids.iter()
        .map(|id| Ok(store.bounding_box(*id)?.center().distance(point)))
        .collect()
}

/// Every pair of ids whose bounding boxes intersect, in input order.
pub fn find_collisions(store: &ObjectStore, ids: &[Handle]) -> BatchResult<Vec<Collision>> {
    let boxes = ids
        .iter()
        .map(|id| store.bounding_box(*id))
        .collect::<Result<Vec<_>, _>>()?;
    let mut out = Vec::new();
    for i in 0..ids.len() {
        for j in i + 1..ids.len() {
            if ids[i] != ids[j] && boxes[i].intersects(&boxes[j]) {
                out.push(Collision {
                    first: ids[i],
                    second: ids[j],
                });
            }
        }
    }
    Ok(out)
}

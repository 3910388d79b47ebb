//! Two-phase execution: every id is resolved and every transform validated
//! before the first record is written.

use std::collections::HashSet;
use std::time::Instant;

use tracing::debug;
use vexel_store::{ObjectStore, Transform};
use vexel_types::{BoundingBox, Handle};

use crate::error::BatchResult;
use crate::stats::BatchStats;

/// Leaf writes scheduled by a batch call.
#[derive(Debug, Default)]
pub(crate) struct Plan {
    steps: Vec<(Handle, Transform)>,
    seen: HashSet<Handle>,
}

impl Plan {
    /// Build a plan by asking `choose` for a transform per id, given the
    /// id's current bounding box. `None` leaves the id untouched.
    pub(crate) fn per_object<F>(store: &ObjectStore, ids: &[Handle], mut choose: F) -> BatchResult<Self>
    where
        F: FnMut(Handle, BoundingBox) -> Option<Transform>,
    {
        let mut plan = Self::default();
        for &id in ids {
            let bbox = store.bounding_box(id)?;
            if let Some(t) = choose(id, bbox) {
                plan.push(store, id, t)?;
            }
        }
        Ok(plan)
    }

    /// Schedule `t` for every leaf under `id` that no earlier step claimed.
    pub(crate) fn push(&mut self, store: &ObjectStore, id: Handle, t: Transform) -> BatchResult<()> {
        t.validate()?;
        for leaf in store.leaves(id)? {
            if self.seen.insert(leaf) {
                self.steps.push((leaf, t));
            }
        }
        Ok(())
    }

    pub(crate) fn execute(self, store: &mut ObjectStore, op: &'static str) -> BatchResult<BatchStats> {
        let started = Instant::now();
        let count = self.steps.len();
        for (leaf, t) in &self.steps {
            store.transform(*leaf, t)?;
        }
        let stats = BatchStats::finish(count, started);
        debug!(
            op,
            objects = stats.objects_processed,
            elapsed_us = stats.elapsed.as_micros() as u64,
            "batch complete"
        );
        Ok(stats)
    }
}

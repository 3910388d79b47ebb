use std::collections::HashSet;
use std::mem::size_of;

use serde::{Deserialize, Serialize};
use vexel_types::{Handle, LayerId};

/// A render layer: display state plus the ordered top-level handles it owns.
///
/// Group members are owned by their group, not by a layer, so they never
/// appear in `objects`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    pub opacity: f32,
    /// Render order key; lower draws first.
    pub z_index: i32,
    pub objects: Vec<Handle>,
}

impl Layer {
    pub fn new(id: LayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            visible: true,
            locked: false,
            opacity: 1.0,
            z_index: 0,
            objects: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.objects.contains(&handle)
    }

    /// Remove every listed handle in one pass, keeping the order of the
    /// rest. Returns how many were removed.
    pub(crate) fn release(&mut self, handles: &HashSet<Handle>) -> usize {
        let before = self.objects.len();
        self.objects.retain(|h| !handles.contains(h));
        before - self.objects.len()
    }

    pub(crate) fn bytes(&self) -> usize {
        size_of::<Self>()
            + self.name.capacity()
            + self.objects.capacity() * size_of::<Handle>()
    }
}

//! Group hierarchy over the object store.
//!
//! Groups hold ordered child handles; the reverse edges live in
//! `ObjectStore::parents`. The containment graph is kept acyclic by
//! refusing any link whose child can already reach the group.

use std::collections::{HashSet, VecDeque};

use tracing::debug;
use vexel_types::{BoundingBox, Group, Handle, ObjectFlags, ObjectType, Shape, Style};

use crate::error::{StoreError, StoreResult};
use crate::record::Locator;
use crate::store::ObjectStore;

impl ObjectStore {
    /// Create a group containing `children`, in order. Duplicate entries are
    /// linked once.
    pub fn add_group(&mut self, children: &[Handle], style: Style) -> StoreResult<Handle> {
        self.locate_all(children)?;
        let style = self.admit_style(style)?;
        let handle = self.allocate()?;
        let loc = self.place(handle, Shape::Group(Group::default()), style)?;
        self.bind(handle, loc);
        let mut seen = HashSet::with_capacity(children.len());
        for &child in children {
            // A brand-new group has no ancestors, so no cycle check is needed.
            if seen.insert(child) {
                self.link(loc, handle, child);
            }
        }
        debug!(group = %handle, children = children.len(), "group created");
        Ok(handle)
    }

    fn group_locator(&self, group: Handle) -> StoreResult<Locator> {
        let loc = self.locate(group)?;
        if loc.kind != ObjectType::Group {
            return Err(StoreError::NotAGroup(group));
        }
        Ok(loc)
    }

    fn link(&mut self, group_loc: Locator, group: Handle, child: Handle) {
        self.groups.geom[group_loc.slot as usize].children.push(child);
        self.parents.entry(child).or_default().push(group);
        self.child_links += 1;
        if let Ok(cloc) = self.locate(child) {
            self.column_mut(cloc.kind)
                .style_mut(cloc.slot)
                .flags
                .insert(ObjectFlags::GROUPED);
        }
    }

    /// Drop `parent` from `child`'s reverse edges, clearing the grouped
    /// flag once no parent remains. Does not touch the group's child list.
    pub(crate) fn unlink_parent(&mut self, child: Handle, parent: Handle) {
        let Some(parents) = self.parents.get_mut(&child) else {
            return;
        };
        parents.retain(|p| *p != parent);
        if parents.is_empty() {
            self.parents.remove(&child);
            if let Ok(cloc) = self.locate(child) {
                self.column_mut(cloc.kind)
                    .style_mut(cloc.slot)
                    .flags
                    .remove(ObjectFlags::GROUPED);
            }
        }
    }

    /// Append `child` to `group`.
    ///
    /// Returns `Ok(false)` when `child` is already a direct member. Fails
    /// with [`StoreError::Cycle`] if `child` is `group` itself or one of its
    /// ancestors.
    pub fn add_to_group(&mut self, group: Handle, child: Handle) -> StoreResult<bool> {
        let gloc = self.group_locator(group)?;
        self.locate(child)?;
        if child == group || self.reaches(child, group) {
            return Err(StoreError::Cycle { group, child });
        }
        if self.groups.geom[gloc.slot as usize].children.contains(&child) {
            return Ok(false);
        }
        self.link(gloc, group, child);
        debug!(group = %group, child = %child, "child added to group");
        Ok(true)
    }

    /// Remove `child` from `group`. Returns `Ok(false)` if it was not a
    /// direct member.
    pub fn remove_from_group(&mut self, group: Handle, child: Handle) -> StoreResult<bool> {
        let gloc = self.group_locator(group)?;
        let children = &mut self.groups.geom[gloc.slot as usize].children;
        let Some(pos) = children.iter().position(|c| *c == child) else {
            return Ok(false);
        };
        children.remove(pos);
        self.child_links -= 1;
        self.unlink_parent(child, group);
        debug!(group = %group, child = %child, "child removed from group");
        Ok(true)
    }

    /// Direct children of a group, in order.
    pub fn children(&self, group: Handle) -> StoreResult<&[Handle]> {
        let gloc = self.group_locator(group)?;
        Ok(&self.groups.geom[gloc.slot as usize].children)
    }

    /// Groups that directly contain `handle`.
    pub fn parents(&self, handle: Handle) -> &[Handle] {
        self.parents.get(&handle).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_grouped(&self, handle: Handle) -> bool {
        self.parents.contains_key(&handle)
    }

    /// True if `target` is reachable from `from` by following child edges.
    fn reaches(&self, from: Handle, target: Handle) -> bool {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(from);
        queue.push_back(from);
        while let Some(current) = queue.pop_front() {
            let Ok(loc) = self.locate(current) else {
                continue;
            };
            if loc.kind != ObjectType::Group {
                continue;
            }
            for &child in &self.groups.geom[loc.slot as usize].children {
                if child == target {
                    return true;
                }
                if visited.insert(child) {
                    queue.push_back(child);
                }
            }
        }
        false
    }

    /// Non-group objects under `handle`, depth-first in child order, each
    /// reported once. A non-group handle is its own only leaf.
    pub fn leaves(&self, handle: Handle) -> StoreResult<Vec<Handle>> {
        self.locate(handle)?;
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        self.collect_leaves(handle, &mut out, &mut seen);
        Ok(out)
    }

    /// Leaves of every handle in `handles`, deduplicated, in first-seen order.
    pub fn expand_leaves(&self, handles: &[Handle]) -> StoreResult<Vec<Handle>> {
        self.locate_all(handles)?;
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for &h in handles {
            self.collect_leaves(h, &mut out, &mut seen);
        }
        Ok(out)
    }

    pub(crate) fn collect_leaves(
        &self,
        handle: Handle,
        out: &mut Vec<Handle>,
        seen: &mut HashSet<Handle>,
    ) {
        let mut stack = vec![handle];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            let Ok(loc) = self.locate(current) else {
                continue;
            };
            if loc.kind == ObjectType::Group {
                let children = &self.groups.geom[loc.slot as usize].children;
                stack.extend(children.iter().rev().copied());
            } else {
                out.push(current);
            }
        }
    }

    /// Union of the leaf bounding boxes under a group, or the zero box when
    /// the group has no leaves.
    pub(crate) fn group_bbox(&self, group: Handle) -> BoundingBox {
        let mut leaves = Vec::new();
        self.collect_leaves(group, &mut leaves, &mut HashSet::new());
        BoundingBox::union_all(leaves.into_iter().filter_map(|h| {
            self.locate(h).ok().map(|loc| self.leaf_bbox(loc))
        }))
    }

    /// Live handles that no group contains, ascending.
    pub fn roots(&self) -> Vec<Handle> {
        self.handles().filter(|h| !self.is_grouped(*h)).collect()
    }
}

#[cfg(test)]
mod tests {
    use vexel_types::{Circle, Point};

    use super::*;

    fn circle(store: &mut ObjectStore, x: f32, y: f32, r: f32) -> Handle {
        store
            .add_circle(
                Circle {
                    center: Point::new(x, y),
                    radius: r,
                },
                Style::default(),
            )
            .unwrap()
    }

    #[test]
    fn empty_group_has_zero_bbox() {
        let mut store = ObjectStore::new();
        let g = store.add_group(&[], Style::default()).unwrap();
        assert_eq!(store.bounding_box(g).unwrap(), BoundingBox::ZERO);
    }

    #[test]
    fn group_bbox_is_union_of_children() {
        let mut store = ObjectStore::new();
        let a = circle(&mut store, 0.0, 0.0, 1.0);
        let b = circle(&mut store, 10.0, 10.0, 2.0);
        let g = store.add_group(&[a, b], Style::default()).unwrap();
        assert_eq!(
            store.bounding_box(g).unwrap(),
            BoundingBox::new(-1.0, -1.0, 12.0, 12.0)
        );
    }

    #[test]
    fn three_level_nesting_unions_all_leaves() {
        let mut store = ObjectStore::new();
        let a = circle(&mut store, 0.0, 0.0, 1.0);
        let b = circle(&mut store, 50.0, 0.0, 1.0);
        let c = circle(&mut store, 0.0, -30.0, 5.0);
        let inner = store.add_group(&[a], Style::default()).unwrap();
        let middle = store.add_group(&[inner, b], Style::default()).unwrap();
        let outer = store.add_group(&[middle, c], Style::default()).unwrap();
        assert_eq!(
            store.bounding_box(outer).unwrap(),
            BoundingBox::new(-5.0, -35.0, 51.0, 1.0)
        );
        assert_eq!(store.leaves(outer).unwrap(), vec![a, b, c]);
    }

    #[test]
    fn self_link_is_a_cycle() {
        let mut store = ObjectStore::new();
        let g = store.add_group(&[], Style::default()).unwrap();
        assert!(matches!(
            store.add_to_group(g, g),
            Err(StoreError::Cycle { .. })
        ));
    }

    #[test]
    fn mutual_link_is_a_cycle() {
        let mut store = ObjectStore::new();
        let g1 = store.add_group(&[], Style::default()).unwrap();
        let g2 = store.add_group(&[], Style::default()).unwrap();
        assert!(store.add_to_group(g1, g2).unwrap());
        assert!(matches!(
            store.add_to_group(g2, g1),
            Err(StoreError::Cycle { group, child }) if group == g2 && child == g1
        ));
        // Deeper ancestor.
        let g3 = store.add_group(&[], Style::default()).unwrap();
        store.add_to_group(g2, g3).unwrap();
        assert!(store.add_to_group(g3, g1).is_err());
    }

    #[test]
    fn non_group_parent_is_rejected() {
        let mut store = ObjectStore::new();
        let a = circle(&mut store, 0.0, 0.0, 1.0);
        let b = circle(&mut store, 0.0, 0.0, 1.0);
        assert!(matches!(
            store.add_to_group(a, b),
            Err(StoreError::NotAGroup(_))
        ));
    }

    #[test]
    fn membership_order_and_grouped_flag() {
        let mut store = ObjectStore::new();
        let a = circle(&mut store, 0.0, 0.0, 1.0);
        let b = circle(&mut store, 1.0, 0.0, 1.0);
        let c = circle(&mut store, 2.0, 0.0, 1.0);
        let g = store.add_group(&[c, a], Style::default()).unwrap();
        store.add_to_group(g, b).unwrap();
        assert!(!store.add_to_group(g, b).unwrap());
        assert_eq!(store.children(g).unwrap(), &[c, a, b]);
        assert!(store.style(a).unwrap().is_grouped());

        assert!(store.remove_from_group(g, a).unwrap());
        assert!(!store.remove_from_group(g, a).unwrap());
        assert!(!store.style(a).unwrap().is_grouped());
        assert_eq!(store.children(g).unwrap(), &[c, b]);
    }

    #[test]
    fn deleting_group_releases_children() {
        let mut store = ObjectStore::new();
        let a = circle(&mut store, 0.0, 0.0, 1.0);
        let g = store.add_group(&[a], Style::default()).unwrap();
        store.delete(g).unwrap();
        assert!(store.contains(a));
        assert!(!store.is_grouped(a));
        assert_eq!(store.roots(), vec![a]);
    }

    #[test]
    fn deleting_child_removes_it_from_group() {
        let mut store = ObjectStore::new();
        let a = circle(&mut store, 0.0, 0.0, 1.0);
        let b = circle(&mut store, 5.0, 0.0, 1.0);
        let g = store.add_group(&[a, b], Style::default()).unwrap();
        store.delete(a).unwrap();
        assert_eq!(store.children(g).unwrap(), &[b]);
        assert_eq!(store.child_links, 1);
    }
}

// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage: allocation, topology and dirty edges.

use alloc::vec::Vec;

use understory_dirty::{Channel, CycleHandling, DirtyTracker, EagerPolicy};

use crate::dirty;

use super::id::{INVALID, NodeId};
use super::state::ProjectionNode;
use super::traverse::Children;

/// Storage for every node of one projection tree.
///
/// Nodes are addressed by [`NodeId`] handles. Topology lives in parallel
/// index arrays, per-node projection state in one slot per node. Unmounted
/// slots are recycled via a free list, and generation counters prevent
/// stale handle access.
#[derive(Debug)]
pub(crate) struct NodeStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,
    pub(crate) depth: Vec<u32>,

    // -- State --
    nodes: Vec<Option<ProjectionNode>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    free_list: Vec<u32>,
    len: u32,

    // -- Dirty tracking --
    dirty: DirtyTracker<u32>,
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore {
    pub(crate) fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            depth: Vec::new(),
            nodes: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
        }
    }

    // -- Allocation --

    /// Stores `node` as the last child of `parent` and returns its handle.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is stale.
    pub(crate) fn create(&mut self, parent: Option<NodeId>, node: ProjectionNode) -> NodeId {
        if let Some(parent) = parent {
            self.validate(parent);
        }
        let idx = if let Some(idx) = self.free_list.pop() {
            self.generation[idx as usize] += 1;
            self.parent[idx as usize] = INVALID;
            self.first_child[idx as usize] = INVALID;
            self.next_sibling[idx as usize] = INVALID;
            self.prev_sibling[idx as usize] = INVALID;
            self.depth[idx as usize] = 0;
            self.nodes[idx as usize] = Some(node);
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.depth.push(0);
            self.nodes.push(Some(node));
            self.generation.push(0);
            idx
        };

        if let Some(parent) = parent {
            self.link_child(parent.idx, idx);
        }

        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Frees the slot of `id` and returns its state.
    ///
    /// # Panics
    ///
    /// Panics if the node has children (unmount them first) or if the handle
    /// is stale.
    pub(crate) fn destroy(&mut self, id: NodeId) -> ProjectionNode {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy node with children"
        );

        let p = self.parent[idx as usize];
        if p != INVALID {
            self.unlink_from_parent(idx);
            self.dirty.remove_dependency(idx, p, dirty::PROJECTION);
            self.dirty.remove_dependency(idx, p, dirty::TRANSFORM);
        }
        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;
        self.free_list.push(idx);

        match self.nodes[idx as usize].take() {
            Some(node) => node,
            None => unreachable!("validated slot holds a node"),
        }
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub(crate) fn is_alive(&self, id: NodeId) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && self.nodes[id.idx as usize].is_some()
    }

    // -- Topology --

    /// Returns the parent of a node, if any.
    #[must_use]
    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.id_at(p))
    }

    /// Returns an iterator over the direct children of a node.
    #[must_use]
    pub(crate) fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the number of ancestors of a node.
    #[must_use]
    pub(crate) fn depth(&self, id: NodeId) -> u32 {
        self.validate(id);
        self.depth[id.idx as usize]
    }

    /// Returns the handle currently living in slot `idx`.
    #[inline]
    pub(crate) fn id_at(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    // -- State --

    /// Returns the state of a node.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub(crate) fn get(&self, id: NodeId) -> &ProjectionNode {
        self.validate(id);
        match &self.nodes[id.idx as usize] {
            Some(node) => node,
            None => unreachable!("validated slot holds a node"),
        }
    }

    /// Returns the mutable state of a node.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut ProjectionNode {
        self.validate(id);
        match &mut self.nodes[id.idx as usize] {
            Some(node) => node,
            None => unreachable!("validated slot holds a node"),
        }
    }

    /// Returns the state of a node, or `None` for a stale handle.
    #[must_use]
    pub(crate) fn try_get(&self, id: NodeId) -> Option<&ProjectionNode> {
        if !self.is_alive(id) {
            return None;
        }
        self.nodes[id.idx as usize].as_ref()
    }

    /// Returns the mutable state of a node, or `None` for a stale handle.
    pub(crate) fn try_get_mut(&mut self, id: NodeId) -> Option<&mut ProjectionNode> {
        if !self.is_alive(id) {
            return None;
        }
        self.nodes[id.idx as usize].as_mut()
    }

    // -- Dirty tracking --

    /// Marks `id` and its whole subtree dirty on `channel`.
    pub(crate) fn mark_subtree(&mut self, id: NodeId, channel: Channel) {
        self.validate(id);
        self.dirty.mark_with(id.idx, channel, &EagerPolicy);
    }

    /// Drains `channel`, returning every node marked directly or through an
    /// ancestor.
    pub(crate) fn drain(&mut self, channel: Channel) -> Vec<NodeId> {
        let affected: Vec<u32> = self
            .dirty
            .drain(channel)
            .affected()
            .deterministic()
            .run()
            .collect();
        affected
            .into_iter()
            .filter(|&idx| idx < self.len && self.nodes[idx as usize].is_some())
            .map(|idx| self.id_at(idx))
            .collect()
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    fn validate(&self, id: NodeId) {
        assert!(
            self.is_alive(id),
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Appends `c` to the child list of `p` and records the dirty edges.
    fn link_child(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;
        self.depth[c as usize] = self.depth[p as usize] + 1;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }

        // Child depends on parent for both channels.
        let _ = self.dirty.add_dependency(c, p, dirty::PROJECTION);
        let _ = self.dirty.add_dependency(c, p, dirty::TRANSFORM);
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::node::NodeOptions;
    use crate::values::Values;

    fn node(serial: u64) -> ProjectionNode {
        ProjectionNode::new(serial, NodeOptions::default(), Values::new(), Vec::new())
    }

    #[test]
    fn create_and_destroy() {
        let mut store = NodeStore::new();
        let id = store.create(None, node(0));
        assert!(store.is_alive(id));
        let state = store.destroy(id);
        assert_eq!(state.serial, 0);
        assert!(!store.is_alive(id));
        assert!(store.try_get(id).is_none());
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut store = NodeStore::new();
        let id1 = store.create(None, node(0));
        let _ = store.destroy(id1);
        let id2 = store.create(None, node(1));
        assert!(!store.is_alive(id1));
        assert!(store.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
        assert_eq!(store.get(id2).serial, 1);
    }

    #[test]
    fn children_in_insertion_order_with_depth() {
        let mut store = NodeStore::new();
        let root = store.create(None, node(0));
        let a = store.create(Some(root), node(1));
        let b = store.create(Some(root), node(2));
        let c = store.create(Some(a), node(3));

        let kids: Vec<_> = store.children(root).collect();
        assert_eq!(kids, vec![a, b]);
        assert_eq!(store.parent(c), Some(a));
        assert_eq!(store.depth(root), 0);
        assert_eq!(store.depth(c), 2);
    }

    #[test]
    fn destroy_unlinks_from_parent() {
        let mut store = NodeStore::new();
        let root = store.create(None, node(0));
        let a = store.create(Some(root), node(1));
        let b = store.create(Some(root), node(2));
        let _ = store.destroy(a);
        let kids: Vec<_> = store.children(root).collect();
        assert_eq!(kids, vec![b]);
    }

    #[test]
    fn eager_mark_reaches_descendants_only() {
        let mut store = NodeStore::new();
        let root = store.create(None, node(0));
        let a = store.create(Some(root), node(1));
        let b = store.create(Some(root), node(2));
        let c = store.create(Some(a), node(3));

        store.mark_subtree(a, dirty::PROJECTION);
        let drained = store.drain(dirty::PROJECTION);
        assert!(drained.contains(&a), "marked node is drained");
        assert!(drained.contains(&c), "descendant inherits the mark");
        assert!(!drained.contains(&b), "sibling stays clean");
        assert!(!drained.contains(&root), "ancestor stays clean");
        assert!(store.drain(dirty::PROJECTION).is_empty());
    }

    #[test]
    #[should_panic(expected = "cannot destroy node with children")]
    fn destroy_with_children_panics() {
        let mut store = NodeStore::new();
        let root = store.create(None, node(0));
        let _child = store.create(Some(root), node(1));
        let _ = store.destroy(root);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn destroyed_handle_panics_on_get() {
        let mut store = NodeStore::new();
        let id = store.create(None, node(0));
        let _ = store.destroy(id);
        let _ = store.get(id);
    }
}

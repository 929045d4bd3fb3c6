// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Depth-ordered flat listing of every node in a tree.

use alloc::vec::Vec;

use crate::node::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Entry {
    node: NodeId,
    depth: u32,
}

/// Every node of a tree, sorted lazily so that ancestors come before their
/// descendants.
///
/// The sort is stable: nodes of equal depth keep their insertion order.
#[derive(Clone, Debug, Default)]
pub struct FlatTree {
    children: Vec<Entry>,
    is_dirty: bool,
}

impl FlatTree {
    /// Creates an empty listing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `node` at `depth` unless already present.
    pub fn add(&mut self, node: NodeId, depth: u32) {
        if self.children.iter().any(|e| e.node == node) {
            return;
        }
        self.children.push(Entry { node, depth });
        self.is_dirty = true;
    }

    /// Removes `node`.
    pub fn remove(&mut self, node: NodeId) {
        self.children.retain(|e| e.node != node);
        self.is_dirty = true;
    }

    /// Number of listed nodes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns whether no nodes are listed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Writes the depth-sorted order into `out`, replacing its contents.
    ///
    /// Passes iterate this copy, so nodes may be added or removed while a
    /// pass is running.
    pub fn order_into(&mut self, out: &mut Vec<NodeId>) {
        if self.is_dirty {
            self.children.sort_by_key(|e| e.depth);
            self.is_dirty = false;
        }
        out.clear();
        out.extend(self.children.iter().map(|e| e.node));
    }
}

// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handles for projection nodes and the host elements they mirror.

use core::fmt;

/// Marks an empty parent, child or sibling link in the node store.
pub const INVALID: u32 = u32::MAX;

/// Identifies a projection node of a
/// [`ProjectionTree`](crate::tree::ProjectionTree).
///
/// Unmounting a node frees its slot for the next
/// [`create_node`](crate::tree::ProjectionTree::create_node). The generation
/// tells the two apart, so an id kept past unmount is recognised as stale
/// and tree operations given one do nothing.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    /// Position of the node in the store.
    pub(crate) idx: u32,
    /// Bumped each time the slot is freed.
    pub(crate) generation: u32,
}

impl NodeId {
    /// Position of the node in the store, useful in logs.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// How many nodes held this slot before this one.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}@gen{})", self.idx, self.generation)
    }
}

/// An opaque reference to a host element.
///
/// The host hands one to [`mount`](crate::tree::ProjectionTree::mount) and
/// receives it back in every [`ProjectionHost`](crate::host::ProjectionHost)
/// call about that node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;

    use super::*;

    #[test]
    fn reused_slot_is_a_different_node() {
        let first = NodeId {
            idx: 3,
            generation: 0,
        };
        let reused = NodeId {
            idx: 3,
            generation: 1,
        };
        assert_eq!(first.index(), reused.index());
        assert_ne!(first, reused);
        assert_eq!(format!("{reused:?}"), "NodeId(3@gen1)");
        assert_eq!(format!("{:?}", InstanceId(7)), "InstanceId(7)");
    }
}

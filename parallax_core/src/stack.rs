// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lead/follow bookkeeping for nodes that share a layout id.
//!
//! A [`NodeStack`] only records membership and leadership. Changing the lead
//! has side effects on the nodes themselves (visibility, snapshot handover,
//! render scheduling); those are applied by the tree from the returned
//! [`Promotion`].

use alloc::vec::Vec;

use crate::node::NodeId;

/// A change of lead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Promotion {
    /// The new lead.
    pub lead: NodeId,
    /// The lead it replaced, if any.
    pub prev_lead: Option<NodeId>,
}

/// Outcome of [`NodeStack::relegate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relegation {
    /// No earlier present member could take over.
    Unhandled,
    /// An earlier member was promoted.
    Handled(Promotion),
}

/// The ordered members of one layout-id group.
///
/// Holds exactly one lead while non-empty, and none once empty.
#[derive(Clone, Debug, Default)]
pub struct NodeStack {
    members: Vec<NodeId>,
    lead: Option<NodeId>,
    prev_lead: Option<NodeId>,
}

impl NodeStack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Members in insertion order.
    #[inline]
    #[must_use]
    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    /// The visible member.
    #[inline]
    #[must_use]
    pub fn lead(&self) -> Option<NodeId> {
        self.lead
    }

    /// The member that led before the current lead.
    #[inline]
    #[must_use]
    pub fn prev_lead(&self) -> Option<NodeId> {
        self.prev_lead
    }

    /// Returns whether the stack has no members.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns whether `node` is a member.
    #[inline]
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.members.contains(&node)
    }

    /// Returns whether a transition between members can crossfade, which
    /// needs at least two of them.
    #[inline]
    #[must_use]
    pub fn can_crossfade(&self) -> bool {
        self.members.len() > 1
    }

    /// Appends `node` if it is not yet a member. The first member of an
    /// empty stack becomes its lead.
    pub fn add(&mut self, node: NodeId) -> Option<Promotion> {
        if !self.members.contains(&node) {
            self.members.push(node);
        }
        if self.lead.is_none() {
            self.lead = Some(node);
            return Some(Promotion {
                lead: node,
                prev_lead: None,
            });
        }
        None
    }

    /// Makes `node` the lead. Returns `None` if it already leads or is not a
    /// member.
    pub fn promote(&mut self, node: NodeId) -> Option<Promotion> {
        let prev_lead = self.lead;
        if prev_lead == Some(node) || !self.contains(node) {
            return None;
        }
        self.prev_lead = prev_lead;
        self.lead = Some(node);
        Some(Promotion {
            lead: node,
            prev_lead,
        })
    }

    /// Hands leadership back to the nearest earlier member that is still
    /// present.
    pub fn relegate(&mut self, node: NodeId, is_present: impl Fn(NodeId) -> bool) -> Relegation {
        let Some(index) = self.members.iter().position(|m| *m == node) else {
            return Relegation::Unhandled;
        };
        let candidate = self.members[..index]
            .iter()
            .rev()
            .copied()
            .find(|m| is_present(*m));
        match candidate {
            Some(member) => match self.promote(member) {
                Some(promotion) => Relegation::Handled(promotion),
                None => Relegation::Handled(Promotion {
                    lead: member,
                    prev_lead: self.prev_lead,
                }),
            },
            None => Relegation::Unhandled,
        }
    }

    /// Removes `node`. If it led, the last remaining member is promoted and
    /// the returned promotion names `node` as the lead it replaced, so the
    /// new lead can take over its snapshot.
    pub fn remove(&mut self, node: NodeId) -> Option<Promotion> {
        self.members.retain(|m| *m != node);
        if self.prev_lead == Some(node) {
            self.prev_lead = None;
        }
        if self.lead != Some(node) {
            return None;
        }
        self.lead = None;
        let Some(&next) = self.members.last() else {
            self.prev_lead = None;
            return None;
        };
        self.prev_lead = Some(node);
        self.lead = Some(next);
        Some(Promotion {
            lead: next,
            prev_lead: Some(node),
        })
    }
}

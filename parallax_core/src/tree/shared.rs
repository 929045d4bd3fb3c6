// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared-element stacks: membership, promotion and presence.

use alloc::string::String;

use crate::animation::Transition;
use crate::events::NodeEvent;
use crate::frameloop::Step;
use crate::host::ProjectionHost;
use crate::node::NodeId;
use crate::stack::{NodeStack, Promotion, Relegation};

use super::{FrameTask, ProjectionTree};

/// Options for [`ProjectionTree::promote`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PromoteOptions {
    /// Clears the projection of the new lead and resets its styles on the
    /// next render.
    pub needs_reset: bool,
    /// Transition for the next layout animation of the new lead.
    pub transition: Option<Transition>,
    /// Keeps the previous lead at its own opacity instead of fading it out.
    pub preserve_follow_opacity: bool,
}

impl ProjectionTree {
    /// Returns the stack `id` belongs to.
    pub(super) fn get_stack(&self, id: NodeId) -> Option<&NodeStack> {
        let layout_id = self.store.try_get(id)?.options.layout_id.as_ref()?;
        self.shared_nodes.get(layout_id)
    }

    /// Returns the lead of the stack `id` belongs to, or `id` itself.
    pub(super) fn get_lead(&self, id: NodeId) -> NodeId {
        self.get_stack(id)
            .and_then(NodeStack::lead)
            .unwrap_or(id)
    }

    /// Returns whether `node` leads its stack. Live nodes without a layout
    /// id always lead.
    #[must_use]
    pub fn is_lead(&self, node: NodeId) -> bool {
        self.store.is_alive(node) && self.get_lead(node) == node
    }

    /// Returns the lead of the stack `node` belongs to.
    #[must_use]
    pub fn lead(&self, node: NodeId) -> Option<NodeId> {
        self.store.is_alive(node).then(|| self.get_lead(node))
    }

    /// Returns the members of the stack `node` belongs to, oldest first.
    #[must_use]
    pub fn stack_members(&self, node: NodeId) -> &[NodeId] {
        self.get_stack(node)
            .map(NodeStack::members)
            .unwrap_or_default()
    }

    pub(super) fn register_shared_node(&mut self, layout_id: String, id: NodeId) {
        let added = self.shared_nodes.entry(layout_id).or_default().add(id);
        self.set_visibility(id, true);
        if let Some(promotion) = added {
            self.apply_promotion(promotion, false);
        }
        self.promote_node(id, PromoteOptions::default());
        self.schedule_render(id, true);
    }

    pub(super) fn remove_from_stack(&mut self, id: NodeId, layout_id: &str) {
        let Some(stack) = self.shared_nodes.get_mut(layout_id) else {
            return;
        };
        let promotion = stack.remove(id);
        if stack.is_empty() {
            self.shared_nodes.remove(layout_id);
        }
        if let Some(promotion) = promotion {
            self.apply_promotion(promotion, false);
        }
    }

    /// Makes `node` the lead of its stack. Unmounted nodes are ignored.
    pub fn promote(&mut self, node: NodeId, options: PromoteOptions) {
        if self.node_mut(node).is_none() {
            return;
        }
        self.promote_node(node, options);
    }

    fn promote_node(&mut self, id: NodeId, options: PromoteOptions) {
        let state = self.store.get(id);
        if state.instance.is_none() {
            tracing::debug!(?id, "ignoring promotion of an unmounted node");
            return;
        }
        let Some(layout_id) = state.options.layout_id.clone() else {
            return;
        };
        let promotion = self
            .shared_nodes
            .get_mut(&layout_id)
            .and_then(|stack| stack.promote(id));
        if let Some(promotion) = promotion {
            self.apply_promotion(promotion, options.preserve_follow_opacity);
        }

        let node = self.store.get_mut(id);
        if options.needs_reset {
            node.projection_delta = None;
            node.needs_reset = true;
        }
        if let Some(transition) = options.transition {
            node.options.transition = Some(transition);
        }
    }

    /// Hands leadership of the stack of `node` back to the most recent
    /// earlier member that is still present.
    ///
    /// Returns whether another member took over.
    pub fn relegate(&mut self, node: NodeId) -> bool {
        let Some(layout_id) = self
            .store
            .try_get(node)
            .and_then(|n| n.options.layout_id.clone())
        else {
            return false;
        };
        let Some(stack) = self.shared_nodes.get_mut(&layout_id) else {
            return false;
        };
        let store = &self.store;
        let relegation = stack.relegate(node, |member| store.try_get(member).is_some_and(|n| n.is_present));
        match relegation {
            Relegation::Handled(promotion) => {
                self.apply_promotion(promotion, false);
                true
            }
            Relegation::Unhandled => false,
        }
    }

    /// Side effects of a change of lead.
    ///
    /// The new lead resumes from the previous one and inherits its snapshot,
    /// carrying the values the previous lead was rendering.
    fn apply_promotion(&mut self, promotion: Promotion, preserve_follow_opacity: bool) {
        let lead = promotion.lead;
        self.set_visibility(lead, true);
        let Some(prev) = promotion.prev_lead else {
            return;
        };
        if prev == lead {
            return;
        }

        self.schedule_render(prev, true);
        self.schedule_render(lead, true);

        let is_updating = self.is_updating;
        let inherited = self.store.try_get_mut(prev).map(|prev_node| {
            if preserve_follow_opacity {
                prev_node.preserve_opacity = true;
            }
            prev_node.snapshot.clone().map(|mut snapshot| {
                snapshot.latest_values = prev_node
                    .animation_values
                    .clone()
                    .unwrap_or_else(|| prev_node.latest_values.clone());
                snapshot
            })
        });

        let Some(node) = self.store.try_get_mut(lead) else {
            return;
        };
        node.resume_from = Some(prev);
        if let Some(Some(snapshot)) = inherited {
            node.snapshot = Some(snapshot);
        }
        if is_updating {
            node.is_layout_dirty = true;
        }
        let crossfade = node.options.crossfade;
        if !crossfade {
            if let Some(prev_node) = self.store.try_get_mut(prev) {
                prev_node.is_visible = false;
            }
        }
        tracing::debug!(?lead, ?prev, "promoted");
    }

    /// Drops the snapshot held by the lead of every stack.
    pub(super) fn remove_lead_snapshots(&mut self) {
        for stack in self.shared_nodes.values() {
            let Some(lead) = stack.lead() else {
                continue;
            };
            if let Some(node) = self.store.try_get_mut(lead) {
                node.snapshot = None;
            }
        }
    }

    /// Shows or hides `node`.
    pub fn set_visible(&mut self, node: NodeId, visible: bool) {
        if self.node_mut(node).is_none() {
            return;
        }
        self.set_visibility(node, visible);
        self.schedule_render(node, false);
    }

    fn set_visibility(&mut self, id: NodeId, visible: bool) {
        if let Some(node) = self.store.try_get_mut(id) {
            node.is_visible = visible;
        }
    }

    // -----------------------------------------------------------------------
    // Presence
    // -----------------------------------------------------------------------

    /// Marks `node` as entering or leaving.
    ///
    /// Starts a layout update. An entering node is promoted. A leaving node
    /// hands its stack back to an earlier present member; with nobody to
    /// take over, [`ExitComplete`](NodeEvent::ExitComplete) follows on the
    /// next post-render step if the node has no stack.
    pub fn set_present(&mut self, host: &mut dyn ProjectionHost, node: NodeId, present: bool) {
        let Some(state) = self.node_mut(node) else {
            return;
        };
        if state.is_present == present {
            return;
        }
        state.is_present = present;
        self.will_update_node(host, node, true);

        if present {
            self.promote_node(node, PromoteOptions::default());
        } else if !self.relegate(node) {
            self.frame
                .schedule(Step::PostRender, FrameTask::CheckExit(node), false, false);
        }
    }

    pub(super) fn check_exit(&mut self, id: NodeId) {
        let has_members = self.get_stack(id).is_some_and(|stack| !stack.is_empty());
        if !has_members {
            self.notify(id, &NodeEvent::ExitComplete);
        }
    }

    /// Reports [`ExitComplete`](NodeEvent::ExitComplete) to every member of
    /// the stack of `id`, and to the members they resume from.
    pub(super) fn exit_animation_complete(&mut self, id: NodeId) {
        let Some(members) = self.get_stack(id).map(|stack| stack.members().to_vec()) else {
            return;
        };
        for member in members {
            self.notify(member, &NodeEvent::ExitComplete);
            if let Some(from) = self.store.try_get(member).and_then(|n| n.resuming_from) {
                self.notify(from, &NodeEvent::ExitComplete);
            }
        }
    }
}

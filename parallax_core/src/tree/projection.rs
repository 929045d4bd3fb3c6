// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame projection passes.
//!
//! Four passes run over the mounted nodes in depth order whenever a
//! projection update is scheduled:
//!
//! 1. **Propagate dirty**: projection and transform dirtiness flows from
//!    each dirty node to its whole subtree.
//! 2. **Resolve targets**: every dirty node works out the box it should
//!    appear in this frame.
//! 3. **Calc projection**: every dirty node computes the delta that maps
//!    its corrected layout onto its lead's target.
//! 4. **Clean dirty**: all three dirty flags are cleared.

use alloc::vec::Vec;

use crate::delta::{
    TreeDeltaLayer, apply_box_delta, apply_tree_deltas, calc_box_delta, calc_relative_box,
    calc_relative_position,
};
use crate::dirty;
use crate::events::NodeEvent;
use crate::frameloop::Step;
use crate::geometry::{Bounds, Delta};
use crate::node::NodeId;
use crate::trace::{PassEvent, PassKind, Tracer};
use crate::values::{has_2d_translate, has_scale};

use super::{FrameTask, ProjectionTree};

impl ProjectionTree {
    pub(super) fn schedule_update_projection(&mut self) {
        if self.projection_update_scheduled {
            return;
        }
        self.projection_update_scheduled = true;
        self.frame
            .schedule(Step::PreRender, FrameTask::UpdateProjection, false, true);
    }

    pub(super) fn update_projection(&mut self, tracer: &mut Tracer<'_>) {
        self.projection_update_scheduled = false;
        let order = self.ordered_nodes();

        for pass in PassKind::ALL {
            match pass {
                PassKind::PropagateDirty => self.propagate_dirty_nodes(&order),
                PassKind::ResolveTargets => {
                    for &id in &order {
                        self.resolve_target_delta(id, false);
                    }
                }
                PassKind::CalcProjection => {
                    for &id in &order {
                        self.calc_projection(id);
                    }
                }
                PassKind::CleanDirty => {
                    for &id in &order {
                        let node = self.store.get_mut(id);
                        node.is_projection_dirty = false;
                        node.is_shared_projection_dirty = false;
                        node.is_transform_dirty = false;
                    }
                }
            }
            tracer.pass(&PassEvent {
                frame_index: self.frame_index,
                pass,
                nodes: u32::try_from(order.len()).unwrap_or(u32::MAX),
            });
            if let Some(summary) = &mut self.summary {
                summary.pass();
            }
        }
    }

    // -----------------------------------------------------------------------
    // Propagate dirty
    // -----------------------------------------------------------------------

    fn propagate_dirty_nodes(&mut self, order: &[NodeId]) {
        for &id in order {
            let node = self.store.get(id);
            let (projection, transform) = (node.is_projection_dirty, node.is_transform_dirty);
            if projection {
                self.store.mark_subtree(id, dirty::PROJECTION);
            }
            if transform {
                self.store.mark_subtree(id, dirty::TRANSFORM);
            }
        }
        for id in self.store.drain(dirty::PROJECTION) {
            self.store.get_mut(id).is_projection_dirty = true;
        }
        for id in self.store.drain(dirty::TRANSFORM) {
            self.store.get_mut(id).is_transform_dirty = true;
        }

        for &id in order {
            let Some(parent) = self.store.parent(id) else {
                continue;
            };
            let parent = self.store.get(parent);
            let parent_dirty = parent.is_projection_dirty || parent.is_shared_projection_dirty;
            let node = self.store.get_mut(id);
            node.is_shared_projection_dirty |= node.is_projection_dirty || parent_dirty;
        }
    }

    // -----------------------------------------------------------------------
    // Resolve targets
    // -----------------------------------------------------------------------

    /// Returns the nearest ancestor that is projecting, stopping at the
    /// first ancestor with a scale or 2D translate of its own.
    pub(super) fn closest_projecting_parent(&self, id: NodeId) -> Option<NodeId> {
        let parent_id = self.store.parent(id)?;
        let parent = self.store.get(parent_id);
        if has_scale(&parent.latest_values) || has_2d_translate(&parent.latest_values) {
            return None;
        }
        if parent.is_projecting() {
            Some(parent_id)
        } else {
            self.closest_projecting_parent(parent_id)
        }
    }

    fn force_relative_parent_to_resolve_target(&mut self, id: NodeId) {
        let timestamp = self.frame.data().timestamp;
        let Some(parent) = self.store.get(id).relative_parent else {
            return;
        };
        let resolved = self
            .store
            .try_get(parent)
            .map(|p| p.resolved_relative_target_at);
        if resolved.is_some_and(|at| at != Some(timestamp)) {
            self.resolve_target_delta(parent, true);
        }
    }

    fn relative_parent_target(&self, id: NodeId) -> Option<Bounds> {
        self.store
            .get(id)
            .relative_parent
            .and_then(|parent| self.store.try_get(parent))
            .and_then(|parent| parent.target)
    }

    /// Resolves the box `id` should appear in this frame.
    fn resolve_target_delta(&mut self, id: NodeId, force: bool) {
        let timestamp = self.frame.data().timestamp;
        let lead = self.get_lead(id);
        if lead != id {
            let lead_node = self.store.get(lead);
            let flags = (
                lead_node.is_projection_dirty,
                lead_node.is_transform_dirty,
                lead_node.is_shared_projection_dirty,
            );
            let node = self.store.get_mut(id);
            node.is_projection_dirty |= flags.0;
            node.is_transform_dirty |= flags.1;
            node.is_shared_projection_dirty |= flags.2;
        }

        let node = self.store.get(id);
        let is_shared = node.resuming_from.is_some() || lead != id;
        let parent_dirty = self
            .store
            .parent(id)
            .is_some_and(|parent| self.store.get(parent).is_projection_dirty);
        let must_resolve = force
            || (is_shared && node.is_shared_projection_dirty)
            || node.is_projection_dirty
            || parent_dirty
            || node.attempt_to_resolve_relative_target;
        if !must_resolve {
            return;
        }
        let Some(layout_box) = node.layout.as_ref().map(|l| l.layout_box) else {
            return;
        };
        if !node.options.tracks_layout() {
            return;
        }
        self.store.get_mut(id).resolved_relative_target_at = Some(timestamp);

        // Without anything to animate towards, try to follow a projecting
        // ancestor instead.
        let node = self.store.get(id);
        if node.target_delta.is_none() && node.relative_target.is_none() {
            let in_progress = node.animation_progress != 1.0;
            let parent = self.closest_projecting_parent(id).and_then(|parent| {
                let layout = self.store.get(parent).layout.as_ref()?;
                Some((parent, layout.layout_box))
            });
            match parent {
                Some((parent, parent_layout)) if in_progress => {
                    self.store.get_mut(id).relative_parent = Some(parent);
                    self.force_relative_parent_to_resolve_target(id);
                    let mut origin = Bounds::ZERO;
                    calc_relative_position(&mut origin, &layout_box, &parent_layout);
                    let node = self.store.get_mut(id);
                    node.relative_target_origin = Some(origin);
                    node.relative_target = Some(origin);
                }
                _ => {
                    let node = self.store.get_mut(id);
                    node.relative_parent = None;
                    node.relative_target = None;
                }
            }
        }

        let node = self.store.get(id);
        if node.relative_target.is_none() && node.target_delta.is_none() {
            return;
        }
        let had_target = node.target.is_some();

        let target = if let (Some(_), Some(_), Some(_)) = (
            node.relative_target,
            node.relative_target_origin,
            self.relative_parent_target(id),
        ) {
            self.force_relative_parent_to_resolve_target(id);
            let node = self.store.get(id);
            match (node.relative_target, self.relative_parent_target(id)) {
                (Some(relative), Some(parent_target)) => {
                    let mut target = Bounds::ZERO;
                    calc_relative_box(&mut target, &relative, &parent_target);
                    target
                }
                _ => layout_box,
            }
        } else if let Some(target_delta) = node.target_delta {
            let mut target = if node.resuming_from.is_some() {
                self.apply_transform(id, &layout_box, false)
            } else {
                layout_box
            };
            apply_box_delta(&mut target, &target_delta);
            target
        } else {
            layout_box
        };

        let node = self.store.get_mut(id);
        node.target = Some(target);
        if !had_target {
            node.target_with_transforms = Some(Bounds::ZERO);
        }

        if node.attempt_to_resolve_relative_target {
            node.attempt_to_resolve_relative_target = false;
            self.attach_to_relative_parent(id, &target);
        }
    }

    /// Re-expresses a freshly resolved target relative to the closest
    /// projecting parent, so the node follows that parent from now on.
    fn attach_to_relative_parent(&mut self, id: NodeId, target: &Bounds) {
        let node = self.store.get(id);
        let resuming = node.resuming_from.is_some();
        let in_progress = node.animation_progress != 1.0;
        let parent = self.closest_projecting_parent(id).and_then(|parent_id| {
            let parent = self.store.get(parent_id);
            let eligible = parent.resuming_from.is_some() == resuming
                && !parent.options.layout_scroll
                && in_progress;
            eligible.then_some(parent_id).zip(parent.target)
        });

        match parent {
            Some((parent, parent_target)) => {
                self.store.get_mut(id).relative_parent = Some(parent);
                self.force_relative_parent_to_resolve_target(id);
                let parent_target = self.store.get(parent).target.unwrap_or(parent_target);
                let mut origin = Bounds::ZERO;
                calc_relative_position(&mut origin, target, &parent_target);
                let node = self.store.get_mut(id);
                node.relative_target_origin = Some(origin);
                node.relative_target = Some(origin);
            }
            None => {
                let node = self.store.get_mut(id);
                node.relative_parent = None;
                node.relative_target = None;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Calc projection
    // -----------------------------------------------------------------------

    fn calc_projection(&mut self, id: NodeId) {
        let timestamp = self.frame.data().timestamp;
        let lead = self.get_lead(id);
        let parent = self.store.parent(id);
        let node = self.store.get(id);
        let is_shared = node.resuming_from.is_some() || lead != id;

        let parent_dirty = parent.is_some_and(|p| self.store.get(p).is_projection_dirty);
        let must_calc = node.is_projection_dirty
            || parent_dirty
            || (is_shared && (node.is_shared_projection_dirty || node.is_transform_dirty))
            || node.resolved_relative_target_at == Some(timestamp);
        if !must_calc {
            return;
        }

        let parent_animating = parent.is_some_and(|p| self.store.get(p).is_tree_animating);
        let node = self.store.get_mut(id);
        node.is_tree_animating = parent_animating
            || node.current_animation.is_some()
            || node.pending_animation.is_some();
        if !node.is_tree_animating {
            node.target_delta = None;
            node.relative_target = None;
        }

        let Some(layout_box) = node.layout.as_ref().map(|l| l.layout_box) else {
            return;
        };
        if !node.options.tracks_layout() {
            return;
        }

        let prev_tree_scale = node.tree_scale;
        let mut tree_scale = prev_tree_scale;
        let mut corrected = layout_box;
        let path: Vec<NodeId> = node.path.clone();
        {
            let root = self.root;
            let store = &self.store;
            let layers = path.iter().map(|&ancestor_id| {
                let ancestor = store.get(ancestor_id);
                let scroll_offset = ancestor
                    .scroll
                    .filter(|_| ancestor.options.layout_scroll && Some(ancestor_id) != root)
                    .map(|scroll| scroll.offset);
                TreeDeltaLayer {
                    delta: ancestor.projection_delta.as_ref(),
                    display_contents: ancestor.options.display_contents,
                    scroll_offset,
                    values: &ancestor.latest_values,
                }
            });
            apply_tree_deltas(&mut corrected, &mut tree_scale, layers, is_shared);
        }
        let node = self.store.get_mut(id);
        node.layout_corrected = corrected;
        node.tree_scale = tree_scale;

        // A lead inside a scaled tree projects onto its own layout.
        if tree_scale.x != 1.0 || tree_scale.y != 1.0 {
            if let Some(lead_node) = self.store.try_get_mut(lead) {
                if lead_node.target.is_none() {
                    if let Some(lead_layout) = lead_node.layout.as_ref().map(|l| l.layout_box) {
                        lead_node.target = Some(lead_layout);
                        lead_node.target_with_transforms = Some(Bounds::ZERO);
                    }
                }
            }
        }

        let lead_target = self.store.try_get(lead).and_then(|l| l.target);
        let node = self.store.get_mut(id);
        let Some(target) = lead_target else {
            if node.prev_projection_delta.is_some() {
                node.create_projection_deltas();
                self.schedule_render(id, true);
            }
            return;
        };

        let prev_delta = match (node.projection_delta, node.prev_projection_delta) {
            (Some(current), Some(_)) => current,
            _ => {
                node.create_projection_deltas();
                Delta::IDENTITY
            }
        };
        node.prev_projection_delta = Some(prev_delta);

        let mut delta = prev_delta;
        calc_box_delta(&mut delta, &node.layout_corrected, &target, Some(&node.latest_values));
        node.projection_delta = Some(delta);

        if tree_scale != prev_tree_scale || !delta.equals(&prev_delta) {
            node.has_projected = true;
            self.schedule_render(id, true);
            self.notify(id, &NodeEvent::ProjectionUpdate(target));
            #[cfg(feature = "trace-rich")]
            self.record_change(id, crate::trace::ProjectionField::Delta);
        }
    }
}

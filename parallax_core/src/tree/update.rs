// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layout update protocol: snapshots, measurement and diffing.

use crate::delta::{calc_box_delta, calc_relative_position, remove_box_transforms, transform_box, translate_box};
use crate::events::{EventKind, LayoutUpdate, NodeEvent};
use crate::frameloop::Step;
use crate::geometry::{AxisKind, Bounds, Delta};
use crate::host::ProjectionHost;
use crate::node::{LayoutAnimation, Measurements, NodeId, ProjectionNode, ScrollPhase, ScrollState};
use crate::trace::Tracer;
use crate::values::{Values, has_scale, has_transform};

use super::{FrameTask, ProjectionTree};

impl ProjectionTree {
    // -----------------------------------------------------------------------
    // Update cycle
    // -----------------------------------------------------------------------

    /// Snapshots `node` ahead of a layout change.
    ///
    /// Starts an update cycle if none is running. Ancestors get their
    /// transforms reset on the next update and their scroll offsets
    /// recorded. Calling this again for the same node within one cycle
    /// does nothing.
    pub fn will_update(&mut self, host: &mut dyn ProjectionHost, node: NodeId) {
        if self.node_mut(node).is_none() {
            return;
        }
        self.will_update_node(host, node, true);
    }

    pub(super) fn will_update_node(&mut self, host: &mut dyn ProjectionHost, id: NodeId, notify: bool) {
        self.has_tree_animated = true;
        if self.update_blocked {
            self.notify(id, &NodeEvent::ExitComplete);
            return;
        }
        if !self.is_updating {
            self.start_update();
        }

        let node = self.store.get_mut(id);
        if node.is_layout_dirty {
            return;
        }
        node.is_layout_dirty = true;

        let path = node.path.clone();
        for ancestor in path {
            self.store.get_mut(ancestor).should_reset_transform = true;
            self.update_scroll(host, ancestor, ScrollPhase::Snapshot);
            if self.store.get(ancestor).options.layout_root {
                self.will_update_node(host, ancestor, false);
            }
        }

        let node = self.store.get_mut(id);
        if !node.options.tracks_layout() {
            return;
        }
        node.prev_transform_template_value = node.transform_template_value(&node.latest_values, "");
        self.update_snapshot(host, id);
        if notify {
            self.notify(id, &NodeEvent::WillUpdate);
        }
    }

    fn start_update(&mut self) {
        if self.update_blocked {
            return;
        }
        self.is_updating = true;
        self.animation_id += 1;
        tracing::debug!(animation_id = self.animation_id, "start update");
    }

    /// Queues the root update on the microtask queue.
    ///
    /// Calling this several times before the queue is flushed runs the
    /// update once.
    pub fn did_update(&mut self) {
        if self.update_scheduled {
            return;
        }
        self.update_scheduled = true;
        self.microtasks
            .schedule(Step::Read, FrameTask::RootUpdate, false, false);
    }

    /// Blocks layout updates until the next [`update`](Self::update).
    ///
    /// While blocked, [`will_update`](Self::will_update) reports
    /// [`ExitComplete`](NodeEvent::ExitComplete) instead of snapshotting, and
    /// the next update discards every measurement.
    pub fn block_update(&mut self) {
        self.update_blocked = true;
    }

    /// Lifts a [`block_update`](Self::block_update).
    pub fn unblock_update(&mut self) {
        self.update_blocked = false;
    }

    /// Returns whether layout updates are blocked.
    #[inline]
    #[must_use]
    pub fn is_update_blocked(&self) -> bool {
        self.update_blocked
    }

    /// Runs the root update immediately.
    ///
    /// Resets transforms, measures every dirty layout, notifies listeners
    /// and starts animations, then flushes the update, pre-render and
    /// render steps synchronously.
    pub fn update(&mut self, host: &mut dyn ProjectionHost) {
        self.update_traced(host, &mut Tracer::none());
    }

    /// Like [`update`](Self::update), reporting the synchronous flush to
    /// `tracer`.
    pub fn update_traced(&mut self, host: &mut dyn ProjectionHost, tracer: &mut Tracer<'_>) {
        self.update_scheduled = false;

        if self.update_blocked {
            tracing::debug!("update blocked, discarding measurements");
            self.unblock_update();
            self.clear_all_snapshots();
            for id in self.ordered_nodes() {
                self.store.get_mut(id).clear_measurements();
            }
            return;
        }

        let order = self.ordered_nodes();
        if !self.is_updating {
            for &id in &order {
                self.store.get_mut(id).is_layout_dirty = false;
            }
        }
        self.is_updating = false;

        for &id in &order {
            self.reset_transform(host, id);
        }
        for &id in &order {
            self.update_layout(host, id);
        }
        for &id in &order {
            self.notify_layout_update(id);
        }
        self.clear_all_snapshots();

        self.flush_sync(host, tracer);
    }

    pub(super) fn check_update_failed(&mut self) {
        if self.is_updating {
            tracing::debug!("update never completed, discarding snapshots");
            self.is_updating = false;
            self.clear_all_snapshots();
        }
    }

    fn clear_all_snapshots(&mut self) {
        for id in self.ordered_nodes() {
            let node = self.store.get_mut(id);
            node.snapshot = None;
            node.resume_from = None;
        }
        self.remove_lead_snapshots();
    }

    // -----------------------------------------------------------------------
    // Measurement
    // -----------------------------------------------------------------------

    pub(super) fn update_snapshot(&mut self, host: &mut dyn ProjectionHost, id: NodeId) {
        let node = self.store.get(id);
        if node.snapshot.is_some() || node.instance.is_none() {
            return;
        }
        let snapshot = self.measure(host, id, true);
        let has_size = snapshot.measured_box.x.length() != 0.0 || snapshot.measured_box.y.length() != 0.0;
        self.store.get_mut(id).snapshot = has_size.then_some(snapshot);
    }

    fn update_layout(&mut self, host: &mut dyn ProjectionHost, id: NodeId) {
        if self.store.get(id).instance.is_none() {
            return;
        }
        self.update_scroll(host, id, ScrollPhase::Measure);

        let node = self.store.get(id);
        let always_measure = node.options.always_measure_layout && self.is_lead(id);
        if !always_measure && !node.is_layout_dirty {
            return;
        }

        let lost_resume_from = node
            .resume_from
            .is_some_and(|from| self.store.try_get(from).is_none_or(|n| n.instance.is_none()));
        if lost_resume_from {
            for ancestor in node.path.clone() {
                self.update_scroll(host, ancestor, ScrollPhase::Measure);
            }
        }

        let layout = self.measure(host, id, false);
        let layout_box = layout.layout_box;
        let node = self.store.get_mut(id);
        node.layout = Some(layout);
        node.layout_corrected = Bounds::ZERO;
        node.is_layout_dirty = false;
        node.projection_delta = None;
        self.notify(id, &NodeEvent::Measure(layout_box));
    }

    fn update_scroll(&mut self, host: &mut dyn ProjectionHost, id: NodeId, phase: ScrollPhase) {
        let animation_id = self.animation_id;
        let node = self.store.get(id);
        let Some(instance) = node.instance else {
            return;
        };
        if !node.options.layout_scroll {
            return;
        }
        if node
            .scroll
            .is_some_and(|s| s.animation_id == animation_id && s.phase == phase)
        {
            return;
        }

        let is_root = host.is_scroll_root(instance);
        let offset = host.measure_scroll(instance);
        let node = self.store.get_mut(id);
        let was_root = node.scroll.map_or(is_root, |s| s.is_root);
        node.scroll = Some(ScrollState {
            animation_id,
            phase,
            is_root,
            offset,
            was_root,
        });
    }

    fn reset_transform(&mut self, host: &mut dyn ProjectionHost, id: NodeId) {
        let node = self.store.get(id);
        let Some(instance) = node.instance else {
            return;
        };
        let reset_requested =
            node.is_layout_dirty || node.should_reset_transform || node.options.always_measure_layout;
        let has_projection = node.projection_delta.as_ref().is_some_and(|d| !d.is_zero());
        let template_value = node.transform_template_value(&node.latest_values, "");
        let template_changed = template_value != node.prev_transform_template_value;

        if reset_requested && (has_projection || has_transform(&node.latest_values) || template_changed) {
            host.reset_transform(instance, template_value.as_deref());
            self.store.get_mut(id).should_reset_transform = false;
            self.schedule_render(id, true);
        }
    }

    fn measure(&mut self, host: &mut dyn ProjectionHost, id: NodeId, remove_transform: bool) -> Measurements {
        let page_box = self.measure_page_box(host, id);
        let mut layout_box = self.remove_element_scroll(id, &page_box);
        if remove_transform {
            layout_box = self.remove_transform(host, id, &layout_box);
        }
        layout_box.round();
        Measurements {
            animation_id: self.animation_id,
            measured_box: page_box,
            layout_box,
            latest_values: Values::new(),
            source: self.store.get(id).serial,
        }
    }

    /// Measures the viewport box and converts it to page space.
    fn measure_page_box(&mut self, host: &mut dyn ProjectionHost, id: NodeId) -> Bounds {
        let Some(instance) = self.store.get(id).instance else {
            return Bounds::ZERO;
        };
        let mut bounds = match host.measure_viewport_box(instance) {
            Ok(rect) => Bounds::from_rect(rect),
            Err(err) => {
                tracing::warn!(?id, %err, "measurement failed");
                Bounds::ZERO
            }
        };

        let node = self.store.get(id);
        let in_scroll_root = node.scroll.is_some_and(|s| s.was_root)
            || node.path.iter().any(|&a| self.was_nested_scroll_root(a));
        if !in_scroll_root {
            if let Some(scroll) = self.root.and_then(|root| self.store.get(root).scroll) {
                translate_box(&mut bounds, scroll.offset);
            }
        }
        bounds
    }

    fn was_nested_scroll_root(&self, id: NodeId) -> bool {
        Some(id) != self.root && self.store.get(id).scroll.is_some_and(|s| s.was_root)
    }

    /// Adds the scroll offsets of scrolling ancestors to a page box.
    fn remove_element_scroll(&self, id: NodeId, page_box: &Bounds) -> Bounds {
        let node = self.store.get(id);
        let mut bounds = *page_box;
        if node.scroll.is_some_and(|s| s.was_root) {
            return bounds;
        }
        for &ancestor in &node.path {
            if Some(ancestor) == self.root {
                continue;
            }
            let ancestor = self.store.get(ancestor);
            let Some(scroll) = ancestor.scroll else {
                continue;
            };
            if !ancestor.options.layout_scroll {
                continue;
            }
            if scroll.was_root {
                bounds = *page_box;
            }
            translate_box(&mut bounds, scroll.offset);
        }
        bounds
    }

    /// Applies the transforms of every ancestor, then of `id` itself.
    pub(super) fn apply_transform(&self, id: NodeId, bounds: &Bounds, transform_only: bool) -> Bounds {
        let node = self.store.get(id);
        let mut transformed = *bounds;
        for &ancestor_id in &node.path {
            let ancestor = self.store.get(ancestor_id);
            if !transform_only && ancestor.options.layout_scroll && Some(ancestor_id) != self.root {
                if let Some(scroll) = ancestor.scroll {
                    translate_box(&mut transformed, -scroll.offset);
                }
            }
            if has_transform(&ancestor.latest_values) {
                transform_box(&mut transformed, &ancestor.latest_values);
            }
        }
        if has_transform(&node.latest_values) {
            transform_box(&mut transformed, &node.latest_values);
        }
        transformed
    }

    /// Removes the transforms of every ancestor, then of `id` itself.
    fn remove_transform(&mut self, host: &mut dyn ProjectionHost, id: NodeId, bounds: &Bounds) -> Bounds {
        let mut untransformed = *bounds;
        let path = self.store.get(id).path.clone();
        for ancestor in path {
            let state = self.store.get(ancestor);
            if state.instance.is_none() || !has_transform(&state.latest_values) {
                continue;
            }
            if has_scale(&state.latest_values) {
                self.update_snapshot(host, ancestor);
            }
            let source = self.measure_page_box(host, ancestor);
            let state = self.store.get(ancestor);
            let origin = state.snapshot.as_ref().map(|s| s.layout_box);
            remove_box_transforms(&mut untransformed, &state.latest_values, origin.as_ref(), Some(&source));
        }

        let node = self.store.get(id);
        if has_transform(&node.latest_values) {
            remove_box_transforms(&mut untransformed, &node.latest_values, None, None);
        }
        untransformed
    }

    // -----------------------------------------------------------------------
    // Diffing
    // -----------------------------------------------------------------------

    fn notify_layout_update(&mut self, id: NodeId) {
        let Some(node) = self.store.try_get(id) else {
            return;
        };
        let is_lead = self.is_lead(id);
        let snapshot = node
            .resume_from
            .and_then(|from| self.store.try_get(from))
            .and_then(|from| from.snapshot.clone())
            .or_else(|| node.snapshot.clone());
        let listens = node.listeners.has(EventKind::DidUpdate) || animates_layout(node);
        let layout = node.layout.clone();

        match (layout, snapshot) {
            (Some(layout), Some(snapshot)) if is_lead && listens => {
                let update = self.resolve_layout_update(id, &layout, snapshot);
                let animates = animates_layout(self.store.get(id));
                self.notify(id, &NodeEvent::DidUpdate(update.clone()));
                if animates {
                    self.animate_layout_update(id, &update);
                }
            }
            _ if is_lead => self.notify(id, &NodeEvent::ExitComplete),
            _ => {}
        }

        if let Some(node) = self.store.try_get_mut(id) {
            node.options.transition = None;
        }
    }

    /// Diffs the new layout of `id` against `snapshot`.
    fn resolve_layout_update(&mut self, id: NodeId, layout: &Measurements, mut snapshot: Measurements) -> LayoutUpdate {
        let layout_box = layout.layout_box;
        let is_shared = snapshot.source != layout.source;
        let node = self.store.get(id);
        let mode = node.options.layout;

        let mut fit_relative_target = false;
        if mode == LayoutAnimation::Size {
            for axis in AxisKind::BOTH {
                let snapshot_axis = if is_shared {
                    snapshot.measured_box.axis_mut(axis)
                } else {
                    snapshot.layout_box.axis_mut(axis)
                };
                let length = snapshot_axis.length();
                snapshot_axis.min = layout_box.axis(axis).min;
                snapshot_axis.max = snapshot_axis.min + length;
            }
        } else if mode.animates_position_only(&snapshot.layout_box, &layout_box) {
            for axis in AxisKind::BOTH {
                let snapshot_axis = if is_shared {
                    snapshot.measured_box.axis_mut(axis)
                } else {
                    snapshot.layout_box.axis_mut(axis)
                };
                snapshot_axis.max = snapshot_axis.min + layout_box.axis(axis).length();
            }
            fit_relative_target = node.relative_target.is_some() && node.current_animation.is_none();
        }

        if fit_relative_target {
            let node = self.store.get_mut(id);
            node.is_projection_dirty = true;
            if let Some(relative) = node.relative_target.as_mut() {
                for axis in AxisKind::BOTH {
                    let relative_axis = relative.axis_mut(axis);
                    relative_axis.max = relative_axis.min + layout_box.axis(axis).length();
                }
            }
        }

        let mut layout_delta = Delta::IDENTITY;
        calc_box_delta(&mut layout_delta, &layout_box, &snapshot.layout_box, None);

        let mut delta = Delta::IDENTITY;
        if is_shared {
            let measured = self.apply_transform(id, &layout.measured_box, true);
            calc_box_delta(&mut delta, &measured, &snapshot.measured_box, None);
        } else {
            calc_box_delta(&mut delta, &layout_box, &snapshot.layout_box, None);
        }

        let has_layout_changed = !layout_delta.is_zero();
        let has_relative_layout_changed = self.track_relative_layout(id, &layout_box, &snapshot.layout_box);

        LayoutUpdate {
            layout: layout_box,
            snapshot,
            delta,
            layout_delta,
            has_layout_changed,
            has_relative_layout_changed,
        }
    }

    /// Compares the position of `id` relative to its closest projecting
    /// parent before and after the update. Under a layout root, the
    /// relative target is seeded from the comparison.
    fn track_relative_layout(&mut self, id: NodeId, layout_box: &Bounds, snapshot_box: &Bounds) -> bool {
        if self.store.get(id).resume_from.is_some() {
            return false;
        }
        let Some(parent_id) = self.closest_projecting_parent(id) else {
            return false;
        };
        let parent = self.store.get(parent_id);
        if parent.resume_from.is_some() {
            return false;
        }
        let (Some(parent_snapshot), Some(parent_layout)) = (parent.snapshot.as_ref(), parent.layout.as_ref()) else {
            return false;
        };

        let mut relative_snapshot = Bounds::ZERO;
        calc_relative_position(&mut relative_snapshot, snapshot_box, &parent_snapshot.layout_box);
        let mut relative_layout = Bounds::ZERO;
        calc_relative_position(&mut relative_layout, layout_box, &parent_layout.layout_box);
        let changed = !relative_snapshot.equals_rounded(&relative_layout);

        if parent.options.layout_root {
            let node = self.store.get_mut(id);
            node.relative_target = Some(relative_layout);
            node.relative_target_origin = Some(relative_snapshot);
            node.relative_parent = Some(parent_id);
        }
        changed
    }

    /// The built-in response to a layout update: start a layout animation,
    /// or settle the node when nothing moved.
    fn animate_layout_update(&mut self, id: NodeId, update: &LayoutUpdate) {
        if self.is_tree_animation_blocked(id) {
            let node = self.store.get_mut(id);
            node.target = None;
            node.relative_target = None;
            return;
        }

        let node = self.store.get(id);
        let layout_root = node.options.layout_root;
        let has_target_changed = node
            .target_layout
            .is_none_or(|target| !target.equals_rounded(&update.layout));
        let only_relative_changed = !update.has_layout_changed && update.has_relative_layout_changed;

        let starts = layout_root
            || node.resume_from.is_some()
            || only_relative_changed
            || (update.has_layout_changed && (has_target_changed || node.current_animation.is_none()));

        if starts {
            if let Some(from) = node.resume_from {
                self.store.get_mut(id).resuming_from = Some(from);
                if let Some(from) = self.store.try_get_mut(from) {
                    from.resuming_from = None;
                }
            }
            let transition = if layout_root {
                crate::animation::Transition::Instant
            } else {
                self.config
                    .effective_transition(self.store.get(id).options.transition)
            };
            self.start_animation(id, transition);
            self.set_animation_origin(id, &update.delta, only_relative_changed);
        } else {
            if !update.has_layout_changed {
                self.finish_and_settle(id);
            }
            if self.is_lead(id) {
                self.notify(id, &NodeEvent::ExitComplete);
            }
        }

        self.store.get_mut(id).target_layout = Some(update.layout);
    }

    pub(super) fn is_tree_animation_blocked(&self, id: NodeId) -> bool {
        let node = self.store.get(id);
        node.is_animation_blocked
            || self
                .store
                .parent(id)
                .is_some_and(|parent| self.is_tree_animation_blocked(parent))
    }

    /// Blocks or unblocks layout animations of `node` and its subtree.
    pub fn set_animation_blocked(&mut self, node: NodeId, blocked: bool) {
        if let Some(state) = self.node_mut(node) {
            state.is_animation_blocked = blocked;
        }
    }
}

/// Whether the built-in layout animation handles `DidUpdate` for `node`.
fn animates_layout(node: &ProjectionNode) -> bool {
    node.instance.is_some() && node.options.animate && node.options.tracks_layout()
}

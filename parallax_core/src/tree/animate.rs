// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout animations: origin capture, per-frame mixing and completion.

use crate::animation::{PROGRESS_END, PROGRESS_START, Sample, Transition, ValueAnimation};
use crate::delta::calc_relative_position;
use crate::events::NodeEvent;
use crate::frameloop::Step;
use crate::geometry::{Bounds, Delta, mix_axis_delta, mix_box};
use crate::mix::mix_values;
use crate::node::{AnimationSlot, MixState, NodeId};
use crate::values::{Values, keys};

use super::{FrameTask, ProjectionTree};

impl ProjectionTree {
    /// Captures everything the animation of `id` mixes between and applies
    /// its first frame.
    pub(super) fn set_animation_origin(&mut self, id: NodeId, delta: &Delta, only_relative_changed: bool) {
        let is_only_member = self.get_stack(id).is_none_or(|stack| stack.members().len() <= 1);
        let node = self.store.get(id);

        let snapshot_latest_values = node
            .snapshot
            .as_ref()
            .map_or_else(Values::new, |s| s.latest_values.clone());
        let is_shared_layout_animation =
            node.snapshot.as_ref().map(|s| s.source) != node.layout.as_ref().map(|l| l.source);
        let ancestor_crossfading = node.path.iter().any(|&ancestor| {
            self.store
                .get(ancestor)
                .animation_values
                .as_ref()
                .is_some_and(|values| values.contains(keys::OPACITY_EXIT))
        });
        let should_crossfade_opacity = is_shared_layout_animation
            && !is_only_member
            && node.options.crossfade
            && !ancestor_crossfading;
        let keeps_relative_target = node
            .relative_parent
            .and_then(|parent| self.store.try_get(parent))
            .is_some_and(|parent| parent.options.layout_root);
        let layout_root = node.options.layout_root;

        let node = self.store.get_mut(id);
        if !keeps_relative_target {
            node.relative_target = None;
            node.relative_target_origin = None;
        }
        node.attempt_to_resolve_relative_target = !only_relative_changed;
        node.animation_progress = 0.0;
        node.mix = Some(MixState {
            delta: *delta,
            target_delta: Delta::IDENTITY,
            relative_layout: Bounds::ZERO,
            prev_relative_target: None,
            is_shared_layout_animation,
            should_crossfade_opacity,
            is_only_member,
            snapshot_latest_values,
            mixed_values: node.latest_values.clone(),
        });

        self.mix_target_delta(id, if layout_root { PROGRESS_END } else { PROGRESS_START });
    }

    /// Applies the animation of `id` at `latest`, on the 0..=1000 progress
    /// scale.
    fn mix_target_delta(&mut self, id: NodeId, latest: f64) {
        let progress = latest / PROGRESS_END;
        let relative_parent_layout = self
            .store
            .get(id)
            .relative_parent
            .and_then(|parent| self.store.try_get(parent))
            .and_then(|parent| parent.layout.as_ref().map(|l| l.layout_box));

        let node = self.store.get_mut(id);
        let Some(mix) = node.mix.as_mut() else {
            return;
        };
        mix_axis_delta(&mut mix.target_delta.x, &mix.delta.x, progress);
        mix_axis_delta(&mut mix.target_delta.y, &mix.delta.y, progress);
        node.target_delta = Some(mix.target_delta);
        node.is_projection_dirty = true;

        if let (Some(relative_target), Some(origin), Some(layout), Some(parent_layout)) = (
            node.relative_target.as_mut(),
            node.relative_target_origin,
            node.layout.as_ref(),
            relative_parent_layout,
        ) {
            calc_relative_position(&mut mix.relative_layout, &layout.layout_box, &parent_layout);
            mix_box(relative_target, &origin, &mix.relative_layout, progress);
            if mix
                .prev_relative_target
                .is_some_and(|prev| prev.equals(relative_target))
            {
                node.is_projection_dirty = false;
            }
            mix.prev_relative_target = Some(*relative_target);
        }

        if mix.is_shared_layout_animation {
            mix_values(
                &mut mix.mixed_values,
                &mix.snapshot_latest_values,
                &node.latest_values,
                progress,
                mix.should_crossfade_opacity,
                mix.is_only_member,
            );
            node.animation_values = Some(mix.mixed_values.clone());
        }

        node.animation_progress = progress;
        self.schedule_update_projection();
        self.schedule_render(id, true);
    }

    /// Requests a layout animation. It is created on the next update step,
    /// once the animation origin has been captured.
    pub(super) fn start_animation(&mut self, id: NodeId, transition: Transition) {
        self.notify(id, &NodeEvent::AnimationStart);
        self.stop_animation(id);
        if let Some(from) = self.store.get(id).resuming_from {
            self.stop_animation(from);
        }

        self.frame.cancel(FrameTask::StartAnimation(id));
        self.store.get_mut(id).pending_animation = Some(transition);
        self.frame
            .schedule(Step::Update, FrameTask::StartAnimation(id), false, false);
        tracing::debug!(?id, ?transition, "layout animation requested");
    }

    /// Stops whatever animation drives `id`.
    fn stop_animation(&mut self, id: NodeId) {
        let owner = match self.store.try_get(id).and_then(|n| n.current_animation.as_ref()) {
            Some(AnimationSlot::Owned(_)) => id,
            Some(AnimationSlot::Shared(owner)) => *owner,
            None => return,
        };
        if let Some(AnimationSlot::Owned(animation)) = self
            .store
            .try_get_mut(owner)
            .and_then(|n| n.current_animation.as_mut())
        {
            animation.stop();
        }
    }

    /// Creates the pending animation of `id` and applies its first frame.
    pub(super) fn start_pending_animation(&mut self, id: NodeId) {
        let now = self.frame.data().timestamp;
        let Some(node) = self.store.try_get_mut(id) else {
            return;
        };
        let Some(transition) = node.pending_animation.take() else {
            return;
        };
        let mut animation = ValueAnimation::progress(transition, now);
        let sample = animation.tick(now);
        node.current_animation = Some(AnimationSlot::Owned(animation));
        if let Some(from) = node.resuming_from {
            if let Some(from) = self.store.try_get_mut(from) {
                from.current_animation = Some(AnimationSlot::Shared(id));
            }
        }

        self.frame
            .schedule(Step::Update, FrameTask::Animate(id), true, false);
        self.apply_sample(id, sample);
    }

    /// Advances the animation of `id` to the current frame.
    pub(super) fn tick_animation(&mut self, id: NodeId) {
        let now = self.frame.data().timestamp;
        let sample = match self
            .store
            .try_get_mut(id)
            .and_then(|n| n.current_animation.as_mut())
        {
            Some(AnimationSlot::Owned(animation)) if animation.is_running() => animation.tick(now),
            _ => {
                self.frame.cancel(FrameTask::Animate(id));
                return;
            }
        };
        self.apply_sample(id, sample);
    }

    fn apply_sample(&mut self, id: NodeId, sample: Sample) {
        self.mix_target_delta(id, sample.value);
        if sample.completed {
            self.frame.cancel(FrameTask::Animate(id));
            self.complete_animation(id);
        }
    }

    /// Reports the end of the animation of `id`. Does nothing when there is
    /// nothing left to complete.
    fn complete_animation(&mut self, id: NodeId) {
        let Some(node) = self.store.try_get(id) else {
            return;
        };
        if node.current_animation.is_none() && node.resuming_from.is_none() && node.animation_values.is_none() {
            return;
        }

        if let Some(from) = node.resuming_from {
            if let Some(from) = self.store.try_get_mut(from) {
                from.current_animation = None;
                from.preserve_opacity = false;
            }
        }
        self.exit_animation_complete(id);

        let node = self.store.get_mut(id);
        node.resuming_from = None;
        node.current_animation = None;
        node.animation_values = None;
        self.notify(id, &NodeEvent::AnimationComplete);
        tracing::debug!(?id, "layout animation complete");
        #[cfg(feature = "trace-rich")]
        self.record_change(id, crate::trace::ProjectionField::AnimationComplete);
    }

    /// Snaps the animation of `id` to its end and completes it.
    pub(super) fn finish_animation_node(&mut self, id: NodeId) {
        let owned = matches!(
            self.store.try_get(id).and_then(|n| n.current_animation.as_ref()),
            Some(AnimationSlot::Owned(_))
        );
        if owned {
            self.mix_target_delta(id, PROGRESS_END);
            if let Some(AnimationSlot::Owned(animation)) = self
                .store
                .get_mut(id)
                .current_animation
                .as_mut()
            {
                animation.stop();
            }
            self.frame.cancel(FrameTask::Animate(id));
        }
        self.complete_animation(id);
    }

    /// Finishes the animation of `id` and drops every target, leaving the
    /// node resting on its layout.
    pub(super) fn finish_and_settle(&mut self, id: NodeId) {
        self.finish_animation_node(id);
        let node = self.store.get_mut(id);
        node.target_delta = None;
        node.relative_target = None;
        node.target = None;
        node.is_projection_dirty = true;
    }

    /// Snaps the layout animation of `node` to its end and completes it.
    pub fn finish_animation(&mut self, node: NodeId) {
        if self.node_mut(node).is_none() {
            return;
        }
        self.finish_animation_node(node);
    }
}

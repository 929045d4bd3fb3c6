// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node projection state.

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Point, Vec2};

use crate::animation::{Transition, ValueAnimation};
use crate::events::Listeners;
use crate::geometry::{Bounds, Delta};
use crate::values::Values;

use super::id::{InstanceId, NodeId};
use super::options::NodeOptions;

/// The result of measuring a node.
#[derive(Clone, Debug, PartialEq)]
pub struct Measurements {
    /// Update cycle the measurement belongs to.
    pub animation_id: u64,
    /// Page box as reported by the host, before scroll and transform removal.
    pub measured_box: Bounds,
    /// Untransformed layout box.
    pub layout_box: Bounds,
    /// Values rendered at snapshot time. Filled in when a snapshot is handed
    /// to a new lead.
    pub latest_values: Values,
    /// Serial of the node that was measured.
    pub source: u64,
}

/// When a scroll offset was measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScrollPhase {
    /// Ahead of an update, alongside the snapshot.
    Snapshot,
    /// Alongside the new layout.
    Measure,
}

/// Cached scroll offset of a `layout_scroll` node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollState {
    /// Update cycle of the measurement.
    pub animation_id: u64,
    /// Phase of the measurement.
    pub phase: ScrollPhase,
    /// Whether the element is the document scroll root.
    pub is_root: bool,
    /// Scroll offset.
    pub offset: Vec2,
    /// Whether the element was the scroll root at the previous measurement.
    pub was_root: bool,
}

/// Everything a running layout animation needs to recompute its frame.
///
/// Captured when the animation origin is set and reused on every tick.
#[derive(Clone, Debug)]
pub(crate) struct MixState {
    /// Visual delta from the new layout back to the snapshot.
    pub(crate) delta: Delta,
    /// Interpolated delta for the current progress.
    pub(crate) target_delta: Delta,
    /// Scratch for the current relative layout.
    pub(crate) relative_layout: Bounds,
    /// Relative target of the previous tick.
    pub(crate) prev_relative_target: Option<Bounds>,
    pub(crate) is_shared_layout_animation: bool,
    pub(crate) should_crossfade_opacity: bool,
    pub(crate) is_only_member: bool,
    pub(crate) snapshot_latest_values: Values,
    pub(crate) mixed_values: Values,
}

/// A node's hold on a running animation.
#[derive(Clone, Debug)]
pub(crate) enum AnimationSlot {
    /// The node drives this animation.
    Owned(ValueAnimation),
    /// The node is being resumed from, and shares the animation of the
    /// given node.
    Shared(NodeId),
}

/// State of one projection node.
///
/// Geometry fields are per-node scratch buffers updated in place every
/// frame. `snapshot`, `layout` and `target_layout` are read-only records
/// and are copied, never aliased.
#[derive(Debug)]
pub(crate) struct ProjectionNode {
    // -- Identity --
    pub(crate) serial: u64,
    pub(crate) instance: Option<InstanceId>,
    pub(crate) options: NodeOptions,
    pub(crate) latest_values: Values,
    /// Ancestors, root first.
    pub(crate) path: Vec<NodeId>,
    pub(crate) listeners: Listeners,

    // -- Geometry --
    pub(crate) layout: Option<Measurements>,
    pub(crate) snapshot: Option<Measurements>,
    pub(crate) target: Option<Bounds>,
    pub(crate) target_with_transforms: Option<Bounds>,
    pub(crate) layout_corrected: Bounds,
    pub(crate) projection_delta: Option<Delta>,
    pub(crate) prev_projection_delta: Option<Delta>,
    pub(crate) projection_delta_with_transform: Delta,
    pub(crate) tree_scale: Point,
    pub(crate) relative_target: Option<Bounds>,
    pub(crate) relative_target_origin: Option<Bounds>,
    pub(crate) relative_parent: Option<NodeId>,
    pub(crate) target_delta: Option<Delta>,
    pub(crate) target_layout: Option<Bounds>,
    pub(crate) resolved_relative_target_at: Option<f64>,
    pub(crate) attempt_to_resolve_relative_target: bool,
    pub(crate) scroll: Option<ScrollState>,
    pub(crate) prev_transform_template_value: Option<String>,

    // -- Dirty flags --
    pub(crate) is_layout_dirty: bool,
    pub(crate) is_projection_dirty: bool,
    pub(crate) is_shared_projection_dirty: bool,
    pub(crate) is_transform_dirty: bool,
    pub(crate) should_reset_transform: bool,

    // -- Animation --
    pub(crate) current_animation: Option<AnimationSlot>,
    pub(crate) pending_animation: Option<Transition>,
    pub(crate) animation_progress: f64,
    pub(crate) mix: Option<MixState>,
    pub(crate) animation_values: Option<Values>,
    pub(crate) resume_from: Option<NodeId>,
    pub(crate) resuming_from: Option<NodeId>,
    pub(crate) preserve_opacity: bool,
    pub(crate) is_tree_animating: bool,

    // -- Visibility and presence --
    pub(crate) is_visible: bool,
    pub(crate) is_present: bool,
    pub(crate) is_animation_blocked: bool,
    pub(crate) needs_reset: bool,
    pub(crate) has_projected: bool,
}

impl ProjectionNode {
    pub(crate) fn new(serial: u64, options: NodeOptions, latest_values: Values, path: Vec<NodeId>) -> Self {
        Self {
            serial,
            instance: None,
            options,
            latest_values,
            path,
            listeners: Listeners::default(),
            layout: None,
            snapshot: None,
            target: None,
            target_with_transforms: None,
            layout_corrected: Bounds::ZERO,
            projection_delta: None,
            prev_projection_delta: None,
            projection_delta_with_transform: Delta::IDENTITY,
            tree_scale: Point::new(1.0, 1.0),
            relative_target: None,
            relative_target_origin: None,
            relative_parent: None,
            target_delta: None,
            target_layout: None,
            resolved_relative_target_at: None,
            attempt_to_resolve_relative_target: false,
            scroll: None,
            prev_transform_template_value: None,
            is_layout_dirty: false,
            is_projection_dirty: false,
            is_shared_projection_dirty: false,
            is_transform_dirty: false,
            should_reset_transform: false,
            current_animation: None,
            pending_animation: None,
            animation_progress: 0.0,
            mix: None,
            animation_values: None,
            resume_from: None,
            resuming_from: None,
            preserve_opacity: false,
            is_tree_animating: false,
            is_visible: true,
            is_present: true,
            is_animation_blocked: false,
            needs_reset: false,
            has_projected: false,
        }
    }

    /// A node projects once it has a layout and something to project to.
    #[inline]
    pub(crate) fn is_projecting(&self) -> bool {
        (self.relative_target.is_some() || self.target_delta.is_some() || self.options.layout_root)
            && self.layout.is_some()
    }

    /// Returns whether the node's own animation is still producing values.
    pub(crate) fn owns_running_animation(&self) -> bool {
        matches!(&self.current_animation, Some(AnimationSlot::Owned(a)) if a.is_running())
    }

    /// Evaluates the transform template against `values`.
    pub(crate) fn transform_template_value(&self, values: &Values, generated: &str) -> Option<String> {
        self.options
            .transform_template
            .as_ref()
            .map(|template| template(values, generated))
    }

    /// Forgets everything measured about the node.
    pub(crate) fn clear_measurements(&mut self) {
        self.scroll = None;
        self.layout = None;
        self.snapshot = None;
        self.prev_transform_template_value = None;
        self.target_delta = None;
        self.target = None;
        self.is_layout_dirty = false;
    }

    pub(crate) fn create_projection_deltas(&mut self) {
        self.prev_projection_delta = Some(Delta::IDENTITY);
        self.projection_delta = Some(Delta::IDENTITY);
        self.projection_delta_with_transform = Delta::IDENTITY;
    }
}

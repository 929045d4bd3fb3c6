// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Turning projection state into style patches.

use alloc::string::{String, ToString};

use crate::correct::CorrectionContext;
use crate::delta::{calc_box_delta, transform_box};
use crate::frameloop::Step;
use crate::geometry::{AxisKind, Bounds, Delta};
use crate::host::ProjectionHost;
use crate::node::NodeId;
use crate::styles::{ProjectionStyles, Visibility, build_projection_transform, transform_origin};
use crate::values::{Value, Values, has_transform, keys};

use super::{FrameTask, ProjectionTree};

impl ProjectionTree {
    /// Queues a render of `id`, and with `notify_all` of every other member
    /// of its stack.
    pub(super) fn schedule_render(&mut self, id: NodeId, notify_all: bool) {
        let Some(node) = self.store.try_get(id) else {
            return;
        };
        if node.instance.is_some() {
            self.frame
                .schedule(Step::Render, FrameTask::Render(id), false, false);
        }
        if notify_all {
            let members = self
                .get_stack(id)
                .map(|stack| stack.members().to_vec())
                .unwrap_or_default();
            for member in members {
                let mounted = self.store.try_get(member).is_some_and(|n| n.instance.is_some());
                if member != id && mounted {
                    self.frame
                        .schedule(Step::Render, FrameTask::Render(member), false, false);
                }
            }
        }

        let node = self.store.get(id);
        let lost_resuming_from = node
            .resuming_from
            .is_some_and(|from| self.store.try_get(from).is_none_or(|n| n.instance.is_none()));
        if lost_resuming_from {
            self.store.get_mut(id).resuming_from = None;
        }
    }

    /// Writes the styles of `id` to the host.
    pub(super) fn render(&mut self, host: &mut dyn ProjectionHost, id: NodeId) {
        let Some(node) = self.store.try_get(id) else {
            return;
        };
        let Some(instance) = node.instance else {
            return;
        };
        let pointer_events = node
            .latest_values
            .get(keys::POINTER_EVENTS)
            .map(ToString::to_string);
        let Some(styles) = self.projection_styles(id, pointer_events.as_deref()) else {
            return;
        };
        host.apply_styles(instance, &styles);
        #[cfg(feature = "trace-rich")]
        self.record_change(id, crate::trace::ProjectionField::Styles);
    }

    /// Computes the style patch of `node` for the current frame.
    ///
    /// `pointer_events` is the node's own pointer event setting; followers of
    /// a shared transition get `"none"`. Returns `None` for unmounted nodes.
    pub fn get_projection_styles(&mut self, node: NodeId, pointer_events: Option<&str>) -> Option<ProjectionStyles> {
        if self.node_mut(node).is_none() {
            return None;
        }
        self.projection_styles(node, pointer_events)
    }

    fn projection_styles(&mut self, id: NodeId, pointer_events: Option<&str>) -> Option<ProjectionStyles> {
        let node = self.store.get(id);
        node.instance?;
        if !node.is_visible {
            return Some(ProjectionStyles::hidden());
        }
        let own_pointer_events = || String::from(pointer_events.unwrap_or(""));

        if node.needs_reset {
            let transform = node
                .transform_template_value(&node.latest_values, "")
                .unwrap_or_else(|| String::from("none"));
            self.store.get_mut(id).needs_reset = false;
            return Some(ProjectionStyles {
                visibility: Some(Visibility::Visible),
                opacity: Some(Value::Text(String::new())),
                pointer_events: Some(own_pointer_events()),
                transform: Some(transform),
                ..ProjectionStyles::default()
            });
        }

        let lead = self.get_lead(id);
        let lead_node = self.store.get(lead);
        let is_lead = lead == id;
        let (Some(projection_delta), Some(_), Some(lead_target)) =
            (node.projection_delta, node.layout.as_ref(), lead_node.target)
        else {
            return Some(self.unprojected_styles(id, pointer_events));
        };

        let values_to_render: Values = lead_node
            .animation_values
            .clone()
            .unwrap_or_else(|| lead_node.latest_values.clone());
        let lead_animating = lead_node.animation_values.is_some();
        let lead_tree_scale = lead_node.tree_scale;
        let lead_delta = lead_node.projection_delta.unwrap_or(Delta::IDENTITY);

        self.apply_transforms_to_target(id);

        let node = self.store.get(id);
        let mut transform = build_projection_transform(
            &node.projection_delta_with_transform,
            node.tree_scale,
            Some(&values_to_render),
        );
        if let Some(templated) = node.transform_template_value(&values_to_render, &transform) {
            transform = templated;
        }

        let opacity = if lead_animating {
            if is_lead {
                values_to_render
                    .get(keys::OPACITY)
                    .or_else(|| node.latest_values.get(keys::OPACITY))
                    .cloned()
                    .unwrap_or(Value::Number(1.0))
            } else if node.preserve_opacity {
                node.latest_values
                    .get(keys::OPACITY)
                    .cloned()
                    .unwrap_or(Value::Number(1.0))
            } else {
                values_to_render
                    .get(keys::OPACITY_EXIT)
                    .cloned()
                    .unwrap_or(Value::Number(0.0))
            }
        } else if is_lead {
            values_to_render
                .get(keys::OPACITY)
                .cloned()
                .unwrap_or_else(|| Value::Text(String::new()))
        } else {
            values_to_render
                .get(keys::OPACITY_EXIT)
                .cloned()
                .unwrap_or(Value::Number(0.0))
        };

        let mut corrected = Values::new();
        let ctx = CorrectionContext {
            target: Some(&lead_target),
            tree_scale: lead_tree_scale,
            projection_delta: &lead_delta,
        };
        for (key, corrector, apply_to) in self.scale_correctors.iter() {
            let Some(value) = values_to_render.get(key) else {
                continue;
            };
            let value = if transform == "none" {
                value.clone()
            } else {
                corrector.correct(value, &ctx)
            };
            if apply_to.is_empty() {
                corrected.set(key, value);
            } else {
                for target_key in apply_to {
                    corrected.set(target_key.as_str(), value.clone());
                }
            }
        }

        let pointer_events = node.options.layout_id.is_some().then(|| {
            if is_lead {
                own_pointer_events()
            } else {
                String::from("none")
            }
        });

        Some(ProjectionStyles {
            visibility: Some(Visibility::Visible),
            transform: Some(transform),
            transform_origin: Some(transform_origin(&projection_delta)),
            opacity: Some(opacity),
            pointer_events,
            corrected,
        })
    }

    /// Styles of a node that is not being projected.
    fn unprojected_styles(&mut self, id: NodeId, pointer_events: Option<&str>) -> ProjectionStyles {
        let node = self.store.get_mut(id);
        let mut styles = ProjectionStyles::default();
        if node.options.layout_id.is_some() {
            styles.opacity = Some(
                node.latest_values
                    .get(keys::OPACITY)
                    .cloned()
                    .unwrap_or(Value::Number(1.0)),
            );
            styles.pointer_events = Some(String::from(pointer_events.unwrap_or("")));
        }
        if node.has_projected && !has_transform(&node.latest_values) {
            styles.transform = Some(
                node.transform_template_value(&Values::new(), "")
                    .unwrap_or_else(|| String::from("none")),
            );
            node.has_projected = false;
        }
        styles
    }

    /// Resolves the lead's target with its own transforms applied and the
    /// delta that maps the corrected layout of `id` onto it.
    fn apply_transforms_to_target(&mut self, id: NodeId) {
        let lead = self.get_lead(id);
        let lead_node = self.store.get(lead);
        let (Some(_), Some(lead_target), Some(lead_layout)) = (
            lead_node.target_with_transforms,
            lead_node.target,
            lead_node.layout.as_ref().map(|l| l.layout_box),
        ) else {
            return;
        };

        let node = self.store.get(id);
        let mut target = lead_target;
        let mut follows_position = false;
        if id != lead {
            if let Some(own_layout) = node.layout.as_ref().map(|l| l.layout_box) {
                if node.options.layout.animates_position_only(&own_layout, &lead_layout) {
                    target = node.target.unwrap_or(Bounds::ZERO);
                    for axis in AxisKind::BOTH {
                        let length = own_layout.axis(axis).length();
                        let target_axis = target.axis_mut(axis);
                        target_axis.min = lead_target.axis(axis).min;
                        target_axis.max = target_axis.min + length;
                    }
                    follows_position = true;
                }
            }
        }

        let mut with_transforms = target;
        transform_box(&mut with_transforms, &lead_node.latest_values);
        let mut delta = node.projection_delta_with_transform;
        calc_box_delta(
            &mut delta,
            &node.layout_corrected,
            &with_transforms,
            Some(&lead_node.latest_values),
        );

        self.store.get_mut(lead).target_with_transforms = Some(with_transforms);
        let node = self.store.get_mut(id);
        node.projection_delta_with_transform = delta;
        if follows_position {
            node.target = Some(target);
        }
    }
}

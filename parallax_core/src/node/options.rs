// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node configuration.

use alloc::rc::Rc;
use alloc::string::String;
use core::fmt;

use crate::animation::Transition;
use crate::delta::is_near;
use crate::geometry::Bounds;
use crate::values::Values;

/// Which aspects of a layout change a node animates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayoutAnimation {
    /// Layout changes are not animated.
    #[default]
    None,
    /// Position and size are animated.
    Both,
    /// Only position is animated; the size snaps.
    Position,
    /// Only size is animated; the position snaps.
    Size,
    /// Size is animated unless the aspect ratio changes noticeably, in
    /// which case only position is.
    PreserveAspect,
}

/// Aspect ratio change beyond which [`LayoutAnimation::PreserveAspect`]
/// falls back to animating position only.
const ASPECT_RATIO_TOLERANCE: f64 = 0.2;

impl LayoutAnimation {
    /// Returns whether layout changes are tracked at all.
    #[inline]
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Returns whether a change from `snapshot` to `layout` should animate
    /// position only.
    #[must_use]
    pub fn animates_position_only(self, snapshot: &Bounds, layout: &Bounds) -> bool {
        match self {
            Self::Position => true,
            Self::PreserveAspect => !is_near(
                snapshot.aspect_ratio(),
                layout.aspect_ratio(),
                ASPECT_RATIO_TOLERANCE,
            ),
            _ => false,
        }
    }
}

/// Builds the final transform string from the latest values and the
/// generated projection transform.
pub type TransformTemplate = Rc<dyn Fn(&Values, &str) -> String>;

/// Options of one projection node.
#[derive(Clone)]
pub struct NodeOptions {
    /// Groups nodes across mounts for shared-element transitions.
    pub layout_id: Option<String>,
    /// Which layout changes are animated.
    pub layout: LayoutAnimation,
    /// Animates independently of ancestors: jumps to its final state and
    /// serves as the relative parent of its descendants.
    pub layout_root: bool,
    /// The element scrolls its content; its scroll offset is measured.
    pub layout_scroll: bool,
    /// Whether shared-element transitions crossfade. When `false`, the
    /// previous lead is hidden on promotion.
    pub crossfade: bool,
    /// One-shot override of the layout transition, cleared after the next
    /// layout update.
    pub transition: Option<Transition>,
    /// Whether layout changes start animations.
    pub animate: bool,
    /// Measure layout on every update while leading, even when not dirty.
    pub always_measure_layout: bool,
    /// The element generates no box of its own.
    pub display_contents: bool,
    /// Custom transform composition.
    pub transform_template: Option<TransformTemplate>,
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            layout_id: None,
            layout: LayoutAnimation::None,
            layout_root: false,
            layout_scroll: false,
            crossfade: true,
            transition: None,
            animate: true,
            always_measure_layout: false,
            display_contents: false,
            transform_template: None,
        }
    }
}

impl fmt::Debug for NodeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeOptions")
            .field("layout_id", &self.layout_id)
            .field("layout", &self.layout)
            .field("layout_root", &self.layout_root)
            .field("layout_scroll", &self.layout_scroll)
            .field("crossfade", &self.crossfade)
            .field("transition", &self.transition)
            .field("animate", &self.animate)
            .field("always_measure_layout", &self.always_measure_layout)
            .field("display_contents", &self.display_contents)
            .field("transform_template", &self.transform_template.is_some())
            .finish()
    }
}

impl NodeOptions {
    /// Options for a node that animates position and size changes.
    #[must_use]
    pub fn layout() -> Self {
        Self {
            layout: LayoutAnimation::Both,
            ..Self::default()
        }
    }

    /// Sets the layout id.
    #[must_use]
    pub fn with_layout_id(mut self, layout_id: impl Into<String>) -> Self {
        self.layout_id = Some(layout_id.into());
        self
    }

    /// Sets which layout changes animate.
    #[must_use]
    pub fn with_layout(mut self, layout: LayoutAnimation) -> Self {
        self.layout = layout;
        self
    }

    /// Marks the node as a layout root.
    #[must_use]
    pub fn with_layout_root(mut self, layout_root: bool) -> Self {
        self.layout_root = layout_root;
        self
    }

    /// Marks the node as a scroll container.
    #[must_use]
    pub fn with_layout_scroll(mut self, layout_scroll: bool) -> Self {
        self.layout_scroll = layout_scroll;
        self
    }

    /// Enables or disables crossfading.
    #[must_use]
    pub fn with_crossfade(mut self, crossfade: bool) -> Self {
        self.crossfade = crossfade;
        self
    }

    /// Overrides the next layout transition.
    #[must_use]
    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transition = Some(transition);
        self
    }

    /// Enables or disables layout animations.
    #[must_use]
    pub fn with_animate(mut self, animate: bool) -> Self {
        self.animate = animate;
        self
    }

    /// Always measure layout while leading.
    #[must_use]
    pub fn with_always_measure_layout(mut self, always: bool) -> Self {
        self.always_measure_layout = always;
        self
    }

    /// Marks the element as generating no box.
    #[must_use]
    pub fn with_display_contents(mut self, display_contents: bool) -> Self {
        self.display_contents = display_contents;
        self
    }

    /// Installs a transform template.
    #[must_use]
    pub fn with_transform_template(
        mut self,
        template: impl Fn(&Values, &str) -> String + 'static,
    ) -> Self {
        self.transform_template = Some(Rc::new(template));
        self
    }

    /// Returns whether the node takes part in layout projection, either
    /// through `layout` or a layout id.
    #[inline]
    #[must_use]
    pub fn tracks_layout(&self) -> bool {
        self.layout.is_enabled() || self.layout_id.is_some()
    }
}

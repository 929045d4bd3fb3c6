// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract.
//!
//! Parallax never touches real elements. Everything it needs from the
//! rendering layer goes through a [`ProjectionHost`]:
//!
//! - **Measurement**: the viewport box of an element, with the element's
//!   current transform applied, and the scroll offset of scroll containers.
//! - **Transform reset**: clearing an element's transform ahead of a layout
//!   measurement, so the measured box is the untransformed layout.
//! - **Style output**: the [`ProjectionStyles`] patch computed for each
//!   rendered node.
//! - **Clock**: the current time in milliseconds, used to start animations
//!   and to timestamp synchronous flushes.
//!
//! # Crate boundaries
//!
//! `parallax_core` owns the node tree, the math, the scheduling and this
//! contract module. Hosts depend on `parallax_core` and provide element
//! glue; the embedder wires them together around its own frame callback.

use kurbo::{Rect, Vec2};

use crate::error::MeasureError;
use crate::node::InstanceId;
use crate::styles::ProjectionStyles;

/// The rendering layer behind a [`ProjectionTree`](crate::tree::ProjectionTree).
///
/// # Update pseudocode
///
/// A layout change is wrapped like this:
///
/// ```rust,ignore
/// // Snapshot every node whose layout is about to change.
/// tree.will_update(&mut host, card);
///
/// // Mutate the real layout.
/// host.move_card_to_sidebar();
///
/// // Measure, diff and start animations.
/// tree.did_update();
/// tree.flush_microtasks(&mut host);
///
/// // Then, once per display frame while frames are requested:
/// while tree.process_frame(&mut host, host.now()) {
///     host.wait_for_vsync();
/// }
/// ```
pub trait ProjectionHost {
    /// Returns the element's box relative to the viewport, including its
    /// current transform.
    fn measure_viewport_box(&mut self, instance: InstanceId) -> Result<Rect, MeasureError>;

    /// Returns the scroll offset of a scroll container.
    fn measure_scroll(&mut self, instance: InstanceId) -> Vec2;

    /// Returns whether the element is the document scroll root.
    fn is_scroll_root(&mut self, instance: InstanceId) -> bool {
        _ = instance;
        false
    }

    /// Clears the element's transform, replacing it with the transform
    /// template output when one is given.
    fn reset_transform(&mut self, instance: InstanceId, template: Option<&str>);

    /// Writes a style patch to the element.
    fn apply_styles(&mut self, instance: InstanceId, styles: &ProjectionStyles);

    /// Returns the current time in milliseconds.
    fn now(&self) -> f64;
}

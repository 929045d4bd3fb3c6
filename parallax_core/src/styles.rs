// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style patches emitted by the render step.

use alloc::format;
use alloc::string::String;
use core::fmt::Write as _;

use kurbo::Point;

use crate::geometry::Delta;
use crate::values::{Value, Values, keys};

/// Element visibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Clear any visibility override.
    Visible,
    /// Hide the element.
    Hidden,
}

/// A style patch for one element.
///
/// `None` fields are left untouched by the host. An empty
/// [`Value::Text`] opacity clears the property back to the stylesheet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectionStyles {
    /// Visibility override.
    pub visibility: Option<Visibility>,
    /// The full `transform` string, or `"none"`.
    pub transform: Option<String>,
    /// The `transform-origin` string.
    pub transform_origin: Option<String>,
    /// Opacity.
    pub opacity: Option<Value>,
    /// Pointer event handling.
    pub pointer_events: Option<String>,
    /// Scale-corrected values, keyed by style property.
    pub corrected: Values,
}

impl ProjectionStyles {
    /// The patch for a hidden element.
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            visibility: Some(Visibility::Hidden),
            ..Self::default()
        }
    }

    /// Returns whether the patch hides the element.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.visibility == Some(Visibility::Hidden)
    }

    /// Returns the numeric opacity, if one is set.
    #[must_use]
    pub fn opacity_number(&self) -> Option<f64> {
        self.opacity.as_ref().and_then(Value::as_number)
    }
}

/// Formats the transform origin of a projection delta.
#[must_use]
pub fn transform_origin(delta: &Delta) -> String {
    format!("{}% {}% 0", delta.x.origin * 100.0, delta.y.origin * 100.0)
}

/// Builds the CSS transform that projects an element by `delta` under a
/// parent scale of `tree_scale`.
///
/// Translation is divided by the tree scale and the tree scale itself is
/// undone before the element's own rotation, skew and scale are applied.
/// Returns `"none"` when the result is the identity.
#[must_use]
pub fn build_projection_transform(
    delta: &Delta,
    tree_scale: Point,
    latest: Option<&Values>,
) -> String {
    let mut transform = String::new();

    let x_translate = delta.x.translate / tree_scale.x;
    let y_translate = delta.y.translate / tree_scale.y;
    let z_translate = latest.and_then(|v| v.number(keys::Z)).unwrap_or(0.0);
    if x_translate != 0.0 || y_translate != 0.0 || z_translate != 0.0 {
        let _ = write!(
            transform,
            "translate3d({x_translate}px, {y_translate}px, {z_translate}px) "
        );
    }

    if tree_scale.x != 1.0 || tree_scale.y != 1.0 {
        let _ = write!(
            transform,
            "scale({}, {}) ",
            1.0 / tree_scale.x,
            1.0 / tree_scale.y
        );
    }

    if let Some(latest) = latest {
        if let Some(perspective) = latest
            .number(keys::TRANSFORM_PERSPECTIVE)
            .filter(|p| *p != 0.0)
        {
            transform = format!("perspective({perspective}px) {transform}");
        }
        for (key, function) in [
            (keys::ROTATE, "rotate"),
            (keys::ROTATE_X, "rotateX"),
            (keys::ROTATE_Y, "rotateY"),
            (keys::SKEW_X, "skewX"),
            (keys::SKEW_Y, "skewY"),
        ] {
            if let Some(angle) = latest.number(key).filter(|a| *a != 0.0) {
                let _ = write!(transform, "{function}({angle}deg) ");
            }
        }
    }

    let element_scale_x = delta.x.scale * tree_scale.x;
    let element_scale_y = delta.y.scale * tree_scale.y;
    if element_scale_x != 1.0 || element_scale_y != 1.0 {
        let _ = write!(transform, "scale({element_scale_x}, {element_scale_y})");
    }

    let trimmed = transform.trim_end();
    if trimmed.is_empty() {
        String::from("none")
    } else {
        String::from(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::AxisDelta;

    fn delta(tx: f64, sx: f64, ty: f64, sy: f64) -> Delta {
        Delta {
            x: AxisDelta {
                translate: tx,
                scale: sx,
                ..AxisDelta::IDENTITY
            },
            y: AxisDelta {
                translate: ty,
                scale: sy,
                ..AxisDelta::IDENTITY
            },
        }
    }

    const UNIT: Point = Point::new(1.0, 1.0);

    #[test]
    fn identity_is_none() {
        assert_eq!(
            build_projection_transform(&Delta::IDENTITY, UNIT, None),
            "none"
        );
    }

    #[test]
    fn translate_then_scale() {
        let t = build_projection_transform(&delta(-200.0, 2.0, 0.0, 1.0), UNIT, None);
        assert_eq!(t, "translate3d(-200px, 0px, 0px) scale(2, 1)");
    }

    #[test]
    fn tree_scale_is_undone() {
        let t = build_projection_transform(&delta(100.0, 1.0, 0.0, 1.0), Point::new(2.0, 2.0), None);
        assert_eq!(
            t,
            "translate3d(50px, 0px, 0px) scale(0.5, 0.5) scale(2, 2)"
        );
    }

    #[test]
    fn rotation_and_perspective() {
        let values: Values = [
            (keys::ROTATE, 45.0),
            (keys::TRANSFORM_PERSPECTIVE, 500.0),
        ]
        .into_iter()
        .collect();
        let t = build_projection_transform(&Delta::IDENTITY, UNIT, Some(&values));
        assert_eq!(t, "perspective(500px) rotate(45deg)");
    }

    #[test]
    fn origin_formats_as_percent() {
        let mut d = Delta::IDENTITY;
        d.x.origin = 0.5;
        d.y.origin = 0.0;
        assert_eq!(transform_origin(&d), "50% 0% 0");
    }

    #[test]
    fn hidden_patch() {
        let styles = ProjectionStyles::hidden();
        assert!(styles.is_hidden());
        assert!(styles.transform.is_none());
    }
}

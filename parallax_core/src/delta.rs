// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Box transform math.
//!
//! Functions here compute the [`Delta`] between two boxes, apply or remove
//! deltas and value-driven transforms, and accumulate the deltas of an
//! ancestor chain. Everything operates in place on caller-owned values.
//!
//! # Delta direction
//!
//! A delta computed with [`calc_box_delta`]`(delta, source, target)` maps
//! `source` onto `target`: applying it to `source` with
//! [`apply_box_delta`] reproduces `target`.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Vec2};

use crate::geometry::{Axis, AxisDelta, Bounds, Delta, mix_number};
use crate::values::{Value, Values, keys};

const SCALE_PRECISION: f64 = 0.0001;
const SCALE_MIN: f64 = 1.0 - SCALE_PRECISION;
const SCALE_MAX: f64 = 1.0 + SCALE_PRECISION;
const TRANSLATE_PRECISION: f64 = 0.01;
const TRANSLATE_MIN: f64 = -TRANSLATE_PRECISION;
const TRANSLATE_MAX: f64 = TRANSLATE_PRECISION;

const TREE_SCALE_SNAP_MIN: f64 = 0.999_999_999_999;
const TREE_SCALE_SNAP_MAX: f64 = 1.000_000_000_000_1;

/// Length of an axis.
#[inline]
#[must_use]
pub fn calc_length(axis: Axis) -> f64 {
    axis.max - axis.min
}

/// Returns whether `value` lies within `max_distance` of `target`.
#[inline]
#[must_use]
pub fn is_near(value: f64, target: f64, max_distance: f64) -> bool {
    (value - target).abs() <= max_distance
}

// ---------------------------------------------------------------------------
// Delta calculation
// ---------------------------------------------------------------------------

/// Computes the delta that maps `source` onto `target`, pivoting about the
/// point `origin` of the way along `source`.
///
/// Scale snaps to exactly 1 within `[0.9999, 1.0001]` and translate to
/// exactly 0 within `[-0.01, 0.01]`, so imperceptible jitter never causes a
/// repaint.
pub fn calc_axis_delta(delta: &mut AxisDelta, source: Axis, target: Axis, origin: f64) {
    delta.origin = origin;
    delta.origin_point = mix_number(source.min, source.max, origin);
    delta.scale = calc_length(target) / calc_length(source);
    delta.translate = mix_number(target.min, target.max, origin) - delta.origin_point;

    if (SCALE_MIN..=SCALE_MAX).contains(&delta.scale) || delta.scale.is_nan() {
        delta.scale = 1.0;
    }
    if (TRANSLATE_MIN..=TRANSLATE_MAX).contains(&delta.translate) || delta.translate.is_nan() {
        delta.translate = 0.0;
    }
}

/// Computes the delta that maps `source` onto `target` on both axes.
///
/// The origin is read from `originX` / `originY` in `origin` and defaults to
/// the center.
pub fn calc_box_delta(delta: &mut Delta, source: &Bounds, target: &Bounds, origin: Option<&Values>) {
    let (origin_x, origin_y) = origin.map_or((0.5, 0.5), |values| {
        (
            values.number(keys::ORIGIN_X).unwrap_or(0.5),
            values.number(keys::ORIGIN_Y).unwrap_or(0.5),
        )
    });
    calc_axis_delta(&mut delta.x, source.x, target.x, origin_x);
    calc_axis_delta(&mut delta.y, source.y, target.y, origin_y);
}

/// Resolves a box expressed relative to `parent` into absolute space.
#[inline]
pub fn calc_relative_axis(target: &mut Axis, relative: Axis, parent: Axis) {
    target.min = parent.min + relative.min;
    target.max = target.min + calc_length(relative);
}

/// Resolves a box expressed relative to `parent` into absolute space.
#[inline]
pub fn calc_relative_box(target: &mut Bounds, relative: &Bounds, parent: &Bounds) {
    calc_relative_axis(&mut target.x, relative.x, parent.x);
    calc_relative_axis(&mut target.y, relative.y, parent.y);
}

/// Expresses `layout` relative to the start of `parent`.
#[inline]
pub fn calc_relative_axis_position(target: &mut Axis, layout: Axis, parent: Axis) {
    target.min = layout.min - parent.min;
    target.max = target.min + calc_length(layout);
}

/// Expresses `layout` relative to the top-left corner of `parent`.
#[inline]
pub fn calc_relative_position(target: &mut Bounds, layout: &Bounds, parent: &Bounds) {
    calc_relative_axis_position(&mut target.x, layout.x, parent.x);
    calc_relative_axis_position(&mut target.y, layout.y, parent.y);
}

// ---------------------------------------------------------------------------
// Applying deltas
// ---------------------------------------------------------------------------

/// Scales `point` about `origin_point`.
#[inline]
#[must_use]
pub fn scale_point(point: f64, scale: f64, origin_point: f64) -> f64 {
    let distance_from_origin = point - origin_point;
    let scaled = scale * distance_from_origin;
    origin_point + scaled
}

/// Applies an optional box scale, then `scale` about `origin_point`, then
/// `translate`.
#[inline]
#[must_use]
pub fn apply_point_delta(
    mut point: f64,
    translate: f64,
    scale: f64,
    origin_point: f64,
    box_scale: Option<f64>,
) -> f64 {
    if let Some(box_scale) = box_scale {
        point = scale_point(point, box_scale, origin_point);
    }
    scale_point(point, scale, origin_point) + translate
}

/// Applies a translate and scale to both ends of `axis`.
#[inline]
pub fn apply_axis_delta(
    axis: &mut Axis,
    translate: f64,
    scale: f64,
    origin_point: f64,
    box_scale: Option<f64>,
) {
    axis.min = apply_point_delta(axis.min, translate, scale, origin_point, box_scale);
    axis.max = apply_point_delta(axis.max, translate, scale, origin_point, box_scale);
}

/// Applies `delta` to both axes of `bounds`.
#[inline]
pub fn apply_box_delta(bounds: &mut Bounds, delta: &Delta) {
    apply_axis_delta(
        &mut bounds.x,
        delta.x.translate,
        delta.x.scale,
        delta.x.origin_point,
        None,
    );
    apply_axis_delta(
        &mut bounds.y,
        delta.y.translate,
        delta.y.scale,
        delta.y.origin_point,
        None,
    );
}

/// Shifts an axis by `distance`.
#[inline]
pub fn translate_axis(axis: &mut Axis, distance: f64) {
    axis.min += distance;
    axis.max += distance;
}

/// Shifts a box by `offset`.
#[inline]
pub fn translate_box(bounds: &mut Bounds, offset: Vec2) {
    translate_axis(&mut bounds.x, offset.x);
    translate_axis(&mut bounds.y, offset.y);
}

/// Applies a value-driven translate and scale to `axis`, pivoting about the
/// point `origin` of the way along it.
#[inline]
pub fn transform_axis(
    axis: &mut Axis,
    translate: f64,
    scale: f64,
    box_scale: Option<f64>,
    origin: f64,
) {
    let origin_point = mix_number(axis.min, axis.max, origin);
    apply_axis_delta(axis, translate, scale, origin_point, box_scale);
}

/// Applies the transform described by `values` (`x`, `y`, `scaleX`,
/// `scaleY`, `scale`, `originX`, `originY`) to `bounds`.
pub fn transform_box(bounds: &mut Bounds, values: &Values) {
    let box_scale = values.number(keys::SCALE);
    transform_axis(
        &mut bounds.x,
        values.number(keys::X).unwrap_or(0.0),
        values.number(keys::SCALE_X).unwrap_or(1.0),
        box_scale,
        values.number(keys::ORIGIN_X).unwrap_or(0.5),
    );
    transform_axis(
        &mut bounds.y,
        values.number(keys::Y).unwrap_or(0.0),
        values.number(keys::SCALE_Y).unwrap_or(1.0),
        box_scale,
        values.number(keys::ORIGIN_Y).unwrap_or(0.5),
    );
}

// ---------------------------------------------------------------------------
// Tree deltas
// ---------------------------------------------------------------------------

/// One ancestor's contribution to [`apply_tree_deltas`].
#[derive(Clone, Copy, Debug)]
pub struct TreeDeltaLayer<'a> {
    /// The ancestor's resolved projection delta, if it has one.
    pub delta: Option<&'a Delta>,
    /// Whether the ancestor generates no box (`display: contents`).
    pub display_contents: bool,
    /// Scroll offset of a non-root layout-scroll ancestor.
    pub scroll_offset: Option<Vec2>,
    /// The ancestor's latest values.
    pub values: &'a Values,
}

/// Accumulates the projection deltas of `path` (root first) into `bounds`
/// and `tree_scale`.
///
/// `tree_scale` is reset to 1 only when `path` is non-empty. For shared
/// transitions, non-root scroll offsets are removed and each ancestor's own
/// value transform is applied as well. The resulting scale snaps to 1 when
/// it is within floating point noise of it.
pub fn apply_tree_deltas<'a, I>(
    bounds: &mut Bounds,
    tree_scale: &mut Point,
    path: I,
    is_shared_transition: bool,
) where
    I: IntoIterator<Item = TreeDeltaLayer<'a>>,
{
    let mut path = path.into_iter().peekable();
    if path.peek().is_none() {
        return;
    }
    tree_scale.x = 1.0;
    tree_scale.y = 1.0;

    for layer in path {
        if layer.display_contents {
            continue;
        }
        if is_shared_transition {
            if let Some(offset) = layer.scroll_offset {
                translate_box(bounds, -offset);
            }
        }
        if let Some(delta) = layer.delta {
            tree_scale.x *= delta.x.scale;
            tree_scale.y *= delta.y.scale;
            apply_box_delta(bounds, delta);
        }
        if is_shared_transition && crate::values::has_transform(layer.values) {
            transform_box(bounds, layer.values);
        }
    }

    if tree_scale.x < TREE_SCALE_SNAP_MAX && tree_scale.x > TREE_SCALE_SNAP_MIN {
        tree_scale.x = 1.0;
    }
    if tree_scale.y < TREE_SCALE_SNAP_MAX && tree_scale.y > TREE_SCALE_SNAP_MIN {
        tree_scale.y = 1.0;
    }
}

// ---------------------------------------------------------------------------
// Removing deltas
// ---------------------------------------------------------------------------

/// Inverse of [`apply_point_delta`].
#[inline]
#[must_use]
pub fn remove_point_delta(
    mut point: f64,
    translate: f64,
    scale: f64,
    origin_point: f64,
    box_scale: Option<f64>,
) -> f64 {
    point -= translate;
    point = scale_point(point, 1.0 / scale, origin_point);
    if let Some(box_scale) = box_scale {
        point = scale_point(point, 1.0 / box_scale, origin_point);
    }
    point
}

/// Removes a translate and scale from `axis`.
///
/// A percentage translate resolves against `source_axis`. When no
/// `origin_axis` is given, the origin is taken from `axis` itself and shifted
/// by the translate being removed.
pub fn remove_axis_delta(
    axis: &mut Axis,
    translate: Option<&Value>,
    scale: f64,
    origin: f64,
    box_scale: Option<f64>,
    origin_axis: Option<Axis>,
    source_axis: Option<Axis>,
) {
    let translate = match translate {
        None => 0.0,
        Some(Value::Number(n)) => *n,
        Some(Value::Percent(p)) => {
            let source = source_axis.unwrap_or(*axis);
            mix_number(source.min, source.max, *p / 100.0) - source.min
        }
        Some(Value::Text(_)) => return,
    };

    let origin_point = match origin_axis {
        Some(origin_axis) => mix_number(origin_axis.min, origin_axis.max, origin),
        None => mix_number(axis.min, axis.max, origin) - translate,
    };

    axis.min = remove_point_delta(axis.min, translate, scale, origin_point, box_scale);
    axis.max = remove_point_delta(axis.max, translate, scale, origin_point, box_scale);
}

/// Removes the transform described by `values` from `bounds`.
pub fn remove_box_transforms(
    bounds: &mut Bounds,
    values: &Values,
    origin_box: Option<&Bounds>,
    source_box: Option<&Bounds>,
) {
    let box_scale = values.number(keys::SCALE);
    remove_axis_delta(
        &mut bounds.x,
        values.get(keys::X),
        values.number(keys::SCALE_X).unwrap_or(1.0),
        values.number(keys::ORIGIN_X).unwrap_or(0.5),
        box_scale,
        origin_box.map(|b| b.x),
        source_box.map(|b| b.x),
    );
    remove_axis_delta(
        &mut bounds.y,
        values.get(keys::Y),
        values.number(keys::SCALE_Y).unwrap_or(1.0),
        values.number(keys::ORIGIN_Y).unwrap_or(0.5),
        box_scale,
        origin_box.map(|b| b.y),
        source_box.map(|b| b.y),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_axis_near(actual: Axis, expected: Axis) {
        assert!(
            (actual.min - expected.min).abs() < EPS && (actual.max - expected.max).abs() < EPS,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn delta_round_trip_reproduces_target() {
        let cases = [
            (Axis::new(0.0, 100.0), Axis::new(200.0, 300.0)),
            (Axis::new(10.0, 60.0), Axis::new(-40.0, 160.0)),
            (Axis::new(-5.0, 5.0), Axis::new(3.0, 4.0)),
        ];
        for origin in [0.0, 0.5, 1.0] {
            for (source, target) in cases {
                let mut delta = AxisDelta::IDENTITY;
                calc_axis_delta(&mut delta, source, target, origin);
                let mut axis = source;
                apply_axis_delta(&mut axis, delta.translate, delta.scale, delta.origin_point, None);
                assert_axis_near(axis, target);
            }
        }
    }

    #[test]
    fn scale_and_translate_snap_to_identity() {
        let mut delta = AxisDelta::IDENTITY;
        // Scale 1.00005, translate 0.005.
        calc_axis_delta(
            &mut delta,
            Axis::new(0.0, 100_000.0),
            Axis::new(-2.495, 100_002.505),
            0.5,
        );
        assert_eq!(delta.scale, 1.0);
        assert_eq!(delta.translate, 0.0);

        calc_axis_delta(&mut delta, Axis::new(0.0, 100.0), Axis::new(0.005, 100.005), 0.5);
        assert_eq!(delta.translate, 0.0);
        calc_axis_delta(&mut delta, Axis::new(0.0, 100.0), Axis::new(0.02, 100.02), 0.5);
        assert!(delta.translate > 0.0);
    }

    #[test]
    fn empty_source_snaps_nan_scale() {
        let mut delta = AxisDelta::IDENTITY;
        calc_axis_delta(&mut delta, Axis::new(0.0, 0.0), Axis::new(0.0, 0.0), 0.5);
        assert_eq!(delta.scale, 1.0);
        assert_eq!(delta.translate, 0.0);
    }

    #[test]
    fn simple_move_delta() {
        let snapshot = Bounds::from_edges(0.0, 0.0, 100.0, 50.0);
        let layout = Bounds::from_edges(200.0, 0.0, 300.0, 50.0);
        let mut delta = Delta::IDENTITY;
        calc_box_delta(&mut delta, &layout, &snapshot, None);
        assert_eq!(delta.x.translate, -200.0);
        assert_eq!(delta.x.scale, 1.0);
        assert_eq!(delta.y.translate, 0.0);
    }

    #[test]
    fn scale_change_delta() {
        let snapshot = Bounds::from_edges(0.0, 0.0, 100.0, 50.0);
        let layout = Bounds::from_edges(0.0, 0.0, 50.0, 50.0);
        let mut delta = Delta::IDENTITY;
        calc_box_delta(&mut delta, &layout, &snapshot, None);
        assert_eq!(delta.x.scale, 2.0);
        assert_eq!(delta.y.scale, 1.0);
    }

    #[test]
    fn box_delta_reads_origin_from_values() {
        let mut values = Values::new();
        values.set(keys::ORIGIN_X, 0.0);
        let mut delta = Delta::IDENTITY;
        calc_box_delta(
            &mut delta,
            &Bounds::from_edges(10.0, 0.0, 20.0, 10.0),
            &Bounds::from_edges(10.0, 0.0, 30.0, 10.0),
            Some(&values),
        );
        assert_eq!(delta.x.origin, 0.0);
        assert_eq!(delta.x.origin_point, 10.0);
        assert_eq!(delta.x.translate, 0.0);
        assert_eq!(delta.y.origin, 0.5);
    }

    #[test]
    fn tree_scale_composes_across_three_levels() {
        let half = AxisDelta {
            translate: 0.0,
            scale: 0.5,
            origin: 0.5,
            origin_point: 0.0,
        };
        let delta = Delta { x: half, y: half };
        let values = Values::new();
        let layer = TreeDeltaLayer {
            delta: Some(&delta),
            display_contents: false,
            scroll_offset: None,
            values: &values,
        };
        let mut bounds = Bounds::from_edges(-80.0, -80.0, 80.0, 80.0);
        let mut tree_scale = Point::new(1.0, 1.0);
        apply_tree_deltas(&mut bounds, &mut tree_scale, [layer; 3], false);
        assert!((tree_scale.x - 0.125).abs() < EPS);
        assert!((tree_scale.y - 0.125).abs() < EPS);
        assert_axis_near(bounds.x, Axis::new(-10.0, 10.0));
    }

    #[test]
    fn tree_deltas_skip_display_contents_and_empty_paths() {
        let delta = Delta {
            x: AxisDelta {
                translate: 0.0,
                scale: 2.0,
                origin: 0.5,
                origin_point: 0.0,
            },
            y: AxisDelta::IDENTITY,
        };
        let values = Values::new();
        let mut tree_scale = Point::new(3.0, 3.0);
        let mut bounds = Bounds::from_edges(0.0, 0.0, 10.0, 10.0);
        apply_tree_deltas(&mut bounds, &mut tree_scale, [], false);
        // Empty path leaves the previous tree scale untouched.
        assert_eq!(tree_scale, Point::new(3.0, 3.0));

        let skipped = TreeDeltaLayer {
            delta: Some(&delta),
            display_contents: true,
            scroll_offset: None,
            values: &values,
        };
        apply_tree_deltas(&mut bounds, &mut tree_scale, [skipped], false);
        assert_eq!(tree_scale, Point::new(1.0, 1.0));
        assert_eq!(bounds, Bounds::from_edges(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn shared_transition_removes_scroll_and_applies_values() {
        let mut values = Values::new();
        values.set(keys::X, 5.0);
        let layer = TreeDeltaLayer {
            delta: None,
            display_contents: false,
            scroll_offset: Some(Vec2::new(20.0, 0.0)),
            values: &values,
        };
        let mut bounds = Bounds::from_edges(100.0, 0.0, 110.0, 10.0);
        let mut tree_scale = Point::new(1.0, 1.0);
        apply_tree_deltas(&mut bounds, &mut tree_scale, [layer], false);
        assert_eq!(bounds.x, Axis::new(100.0, 110.0));
        apply_tree_deltas(&mut bounds, &mut tree_scale, [layer], true);
        assert_eq!(bounds.x, Axis::new(85.0, 95.0));
    }

    #[test]
    fn remove_undoes_transform() {
        let mut values = Values::new();
        values.set(keys::X, 30.0);
        values.set(keys::SCALE_X, 2.0);
        let layout = Bounds::from_edges(0.0, 0.0, 100.0, 100.0);
        let mut transformed = layout;
        transform_box(&mut transformed, &values);
        assert_axis_near(transformed.x, Axis::new(-20.0, 180.0));

        let mut restored = transformed;
        remove_box_transforms(&mut restored, &values, Some(&layout), None);
        assert_axis_near(restored.x, layout.x);
        assert_axis_near(restored.y, layout.y);
    }

    #[test]
    fn remove_without_origin_axis_offsets_origin() {
        let mut values = Values::new();
        values.set(keys::X, 30.0);
        values.set(keys::SCALE_X, 2.0);
        let layout = Bounds::from_edges(0.0, 0.0, 100.0, 100.0);
        let mut transformed = layout;
        transform_box(&mut transformed, &values);
        remove_box_transforms(&mut transformed, &values, None, None);
        assert_axis_near(transformed.x, layout.x);
    }

    #[test]
    fn percent_translate_resolves_against_source() {
        let mut axis = Axis::new(50.0, 150.0);
        remove_axis_delta(
            &mut axis,
            Some(&Value::Percent(50.0)),
            1.0,
            0.5,
            None,
            None,
            Some(Axis::new(0.0, 100.0)),
        );
        assert_axis_near(axis, Axis::new(0.0, 100.0));
    }

    #[test]
    fn relative_boxes_round_trip() {
        let parent = Bounds::from_edges(100.0, 100.0, 300.0, 300.0);
        let layout = Bounds::from_edges(150.0, 120.0, 200.0, 170.0);
        let mut relative = Bounds::ZERO;
        calc_relative_position(&mut relative, &layout, &parent);
        assert_eq!(relative, Bounds::from_edges(50.0, 20.0, 100.0, 70.0));
        let mut absolute = Bounds::ZERO;
        calc_relative_box(&mut absolute, &relative, &parent);
        assert_eq!(absolute, layout);
    }

    #[test]
    fn is_near_is_inclusive() {
        assert!(is_near(1.0, 1.2, 0.2 + EPS));
        assert!(!is_near(1.0, 1.5, 0.2));
    }
}

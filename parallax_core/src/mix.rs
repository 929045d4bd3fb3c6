// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visual value mixing for shared-element transitions.
//!
//! While one layout-id member hands over to another, the incoming lead's
//! opacity, corner radii and rotation are interpolated from the outgoing
//! follow's values. Opacity uses two asymmetric eased windows so the
//! incoming element settles during the first half of the animation while
//! the outgoing element fades over the second half.

use crate::easing::{Easing, compress};
use crate::geometry::mix_number;
use crate::values::{Value, Values, keys};

/// Eased progress for the incoming element's opacity.
#[inline]
#[must_use]
pub fn ease_crossfade_in(p: f64) -> f64 {
    compress(0.0, 0.5, Easing::CircOut, p)
}

/// Eased progress for the outgoing element's opacity.
#[inline]
#[must_use]
pub fn ease_crossfade_out(p: f64) -> f64 {
    compress(0.5, 0.95, Easing::Linear, p)
}

fn opacity_of(values: &Values) -> f64 {
    values.number(keys::OPACITY).unwrap_or(1.0)
}

fn radius_of<'a>(values: &'a Values, key: &str) -> Option<&'a Value> {
    values.get(key).or_else(|| values.get(keys::BORDER_RADIUS))
}

/// Writes the mix of `follow` and `lead` at `progress` into `target`.
///
/// With `crossfade`, `opacity` moves from the follow's opacity to the lead's
/// along [`ease_crossfade_in`] and `opacityExit` fades the follow out along
/// [`ease_crossfade_out`]. A lone member blends opacity linearly instead.
pub fn mix_values(
    target: &mut Values,
    follow: &Values,
    lead: &Values,
    progress: f64,
    crossfade: bool,
    is_only_member: bool,
) {
    let follow_opacity = opacity_of(follow);
    let lead_opacity = opacity_of(lead);
    if crossfade {
        target.set(
            keys::OPACITY,
            mix_number(follow_opacity, lead_opacity, ease_crossfade_in(progress)),
        );
        target.set(
            keys::OPACITY_EXIT,
            mix_number(follow_opacity, 0.0, ease_crossfade_out(progress)),
        );
    } else if is_only_member {
        target.set(
            keys::OPACITY,
            mix_number(follow_opacity, lead_opacity, progress),
        );
    }

    for key in keys::CORNER_RADII {
        let follow_radius = radius_of(follow, key);
        let lead_radius = radius_of(lead, key);
        if follow_radius.is_none() && lead_radius.is_none() {
            continue;
        }
        let zero = Value::Number(0.0);
        let follow_radius = follow_radius.unwrap_or(&zero);
        let lead_radius = lead_radius.unwrap_or(&zero);

        let is_zero = |v: &Value| v.as_number() == Some(0.0);
        let can_mix = is_zero(follow_radius)
            || is_zero(lead_radius)
            || follow_radius.is_px() == lead_radius.is_px();

        match (follow_radius.as_number(), lead_radius.as_number()) {
            (Some(from), Some(to)) if can_mix => {
                let mixed = mix_number(from, to, progress).max(0.0);
                let value = if follow_radius.is_percent() || lead_radius.is_percent() {
                    Value::Percent(mixed)
                } else {
                    Value::Number(mixed)
                };
                target.set(key, value);
            }
            _ => {
                target.set(key, lead_radius.clone());
            }
        }
    }

    let follow_rotate = follow.number(keys::ROTATE).unwrap_or(0.0);
    let lead_rotate = lead.number(keys::ROTATE).unwrap_or(0.0);
    if follow_rotate != 0.0 || lead_rotate != 0.0 {
        target.set(
            keys::ROTATE,
            mix_number(follow_rotate, lead_rotate, progress),
        );
    }
}

#[cfg(test)]
mod tests {
    #[cfg(not(feature = "std"))]
    use kurbo::common::FloatFuncs as _;

    use super::*;

    fn opacity(values: &Values, key: &str) -> f64 {
        values.number(key).unwrap_or(f64::NAN)
    }

    #[test]
    fn crossfade_starts_at_follow_and_ends_at_lead() {
        let follow: Values = [(keys::OPACITY, 0.6)].into_iter().collect();
        let lead: Values = [(keys::OPACITY, 0.9)].into_iter().collect();
        let mut target = Values::new();

        mix_values(&mut target, &follow, &lead, 0.0, true, false);
        assert_eq!(opacity(&target, keys::OPACITY), 0.6);
        assert_eq!(opacity(&target, keys::OPACITY_EXIT), 0.6);

        mix_values(&mut target, &follow, &lead, 1.0, true, false);
        assert!((opacity(&target, keys::OPACITY) - 0.9).abs() < 1e-12);
        assert_eq!(opacity(&target, keys::OPACITY_EXIT), 0.0);
    }

    #[test]
    fn crossfade_windows_do_not_overlap() {
        // Lead has settled before the follow starts fading.
        assert_eq!(ease_crossfade_in(0.5), 1.0);
        assert_eq!(ease_crossfade_out(0.5), 0.0);
        assert!(ease_crossfade_out(0.75) > 0.0);
    }

    #[test]
    fn only_member_blends_linearly() {
        let follow: Values = [(keys::OPACITY, 0.0)].into_iter().collect();
        let lead = Values::new();
        let mut target = Values::new();
        mix_values(&mut target, &follow, &lead, 0.25, false, true);
        assert_eq!(opacity(&target, keys::OPACITY), 0.25);
        assert!(!target.contains(keys::OPACITY_EXIT));
    }

    #[test]
    fn radii_mix_and_fall_back_to_shorthand() {
        let follow: Values = [(keys::BORDER_RADIUS, 10.0)].into_iter().collect();
        let lead: Values = [(keys::BORDER_TOP_LEFT_RADIUS, 30.0)].into_iter().collect();
        let mut target = Values::new();
        mix_values(&mut target, &follow, &lead, 0.5, false, false);
        assert_eq!(target.get(keys::BORDER_TOP_LEFT_RADIUS), Some(&Value::Number(20.0)));
        // Lead has no other corners; they mix toward zero.
        assert_eq!(target.get(keys::BORDER_TOP_RIGHT_RADIUS), Some(&Value::Number(5.0)));
    }

    #[test]
    fn mixed_units_jump_to_lead() {
        let follow: Values = [(keys::BORDER_RADIUS, 10.0)].into_iter().collect();
        let lead: Values = [(keys::BORDER_RADIUS, "50%")].into_iter().collect();
        let mut target = Values::new();
        mix_values(&mut target, &follow, &lead, 0.5, false, false);
        assert_eq!(target.get(keys::BORDER_TOP_LEFT_RADIUS), Some(&Value::Percent(50.0)));
    }

    #[test]
    fn percent_radius_mixes_as_percent() {
        let follow: Values = [(keys::BORDER_RADIUS, 0.0)].into_iter().collect();
        let lead: Values = [(keys::BORDER_RADIUS, "50%")].into_iter().collect();
        let mut target = Values::new();
        mix_values(&mut target, &follow, &lead, 0.5, false, false);
        assert_eq!(target.get(keys::BORDER_BOTTOM_RIGHT_RADIUS), Some(&Value::Percent(25.0)));
    }

    #[test]
    fn rotation_mixes() {
        let follow = Values::new();
        let lead: Values = [(keys::ROTATE, 90.0)].into_iter().collect();
        let mut target = Values::new();
        mix_values(&mut target, &follow, &lead, 0.5, false, false);
        assert_eq!(target.number(keys::ROTATE), Some(45.0));
    }
}

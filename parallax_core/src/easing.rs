// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Easing curves.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::geometry::progress;

/// Maps linear progress (0..1) to eased progress.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Easing {
    /// No easing.
    #[default]
    Linear,
    /// CSS-style cubic bezier with control points `(x1, y1, x2, y2)`.
    CubicBezier(f64, f64, f64, f64),
    /// Circular ease-out.
    CircOut,
}

impl Easing {
    /// `ease-in` from CSS.
    pub const EASE_IN: Self = Self::CubicBezier(0.42, 0.0, 1.0, 1.0);
    /// `ease-out` from CSS.
    pub const EASE_OUT: Self = Self::CubicBezier(0.0, 0.0, 0.58, 1.0);
    /// `ease-in-out` from CSS.
    pub const EASE_IN_OUT: Self = Self::CubicBezier(0.42, 0.0, 0.58, 1.0);
    /// The curve used for layout transitions by default.
    pub const LAYOUT: Self = Self::CubicBezier(0.4, 0.0, 0.1, 1.0);

    /// Evaluates the curve at `t`, clamped to 0..1.
    #[must_use]
    pub fn ease(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::CubicBezier(x1, y1, x2, y2) => bezier_ease(t, x1, y1, x2, y2),
            Self::CircOut => circ_out(t),
        }
    }
}

#[inline]
fn cubic_bezier(p1: f64, p2: f64, t: f64) -> f64 {
    let u = 1.0 - t;
    3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t
}

/// Inverts the x curve by bisection, then samples y.
fn bezier_ease(t: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    if x1 == y1 && x2 == y2 {
        return t;
    }
    let mut lo = 0.0;
    let mut hi = 1.0;
    let mut mid = t;
    for _ in 0..24 {
        let x = cubic_bezier(x1, x2, mid);
        if (x - t).abs() < 1e-7 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(y1, y2, mid)
}

/// `sqrt(1 - (1 - p)^2)`.
#[inline]
#[must_use]
pub fn circ_out(p: f64) -> f64 {
    let inv = 1.0 - p;
    (1.0 - inv * inv).max(0.0).sqrt()
}

/// Squeezes `easing` into the `min..max` window of progress: 0 before it,
/// 1 after it.
#[inline]
#[must_use]
pub fn compress(min: f64, max: f64, easing: Easing, p: f64) -> f64 {
    if p < min {
        return 0.0;
    }
    if p > max {
        return 1.0;
    }
    easing.ease(progress(min, max, p))
}

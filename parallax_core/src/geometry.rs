// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometric primitives: axes, boxes and the deltas between them.
//!
//! All types are small `Copy` values. Nodes keep long-lived instances of them
//! as per-frame scratch buffers and update them in place; taking a snapshot
//! of one is a plain copy.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::Rect;

/// Linear interpolation between two numbers.
#[inline]
#[must_use]
pub fn mix_number(from: f64, to: f64, progress: f64) -> f64 {
    from + (to - from) * progress
}

/// Returns the fraction of the way `value` sits between `from` and `to`.
///
/// Returns 1 when the range is empty.
#[inline]
#[must_use]
pub fn progress(from: f64, to: f64, value: f64) -> f64 {
    let range = to - from;
    if range == 0.0 { 1.0 } else { (value - from) / range }
}

// ---------------------------------------------------------------------------
// Axis / Bounds
// ---------------------------------------------------------------------------

/// A one-dimensional interval.
///
/// `max >= min` is expected but not enforced.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Axis {
    /// Start of the interval.
    pub min: f64,
    /// End of the interval.
    pub max: f64,
}

impl Axis {
    /// Creates an axis from its endpoints.
    #[inline]
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns `max - min`.
    #[inline]
    #[must_use]
    pub fn length(self) -> f64 {
        self.max - self.min
    }

    /// Returns the point `origin` of the way along the axis.
    #[inline]
    #[must_use]
    pub fn point_at(self, origin: f64) -> f64 {
        mix_number(self.min, self.max, origin)
    }

    /// Returns whether both endpoints are identical.
    #[inline]
    #[must_use]
    pub fn equals(self, other: Self) -> bool {
        self.min == other.min && self.max == other.max
    }

    /// Returns whether both endpoints are identical after rounding.
    #[inline]
    #[must_use]
    pub fn equals_rounded(self, other: Self) -> bool {
        self.min.round() == other.min.round() && self.max.round() == other.max.round()
    }

    /// Rounds both endpoints to the nearest whole pixel.
    #[inline]
    pub fn round(&mut self) {
        self.min = self.min.round();
        self.max = self.max.round();
    }
}

/// An axis-aligned rectangle expressed as two [`Axis`] intervals.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    /// Horizontal extent.
    pub x: Axis,
    /// Vertical extent.
    pub y: Axis,
}

impl Bounds {
    /// A zero-sized box at the origin.
    pub const ZERO: Self = Self {
        x: Axis::new(0.0, 0.0),
        y: Axis::new(0.0, 0.0),
    };

    /// Creates a box from its two axes.
    #[inline]
    #[must_use]
    pub const fn new(x: Axis, y: Axis) -> Self {
        Self { x, y }
    }

    /// Creates a box from edge coordinates.
    #[inline]
    #[must_use]
    pub const fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            x: Axis::new(left, right),
            y: Axis::new(top, bottom),
        }
    }

    /// Converts a `kurbo` rectangle.
    #[inline]
    #[must_use]
    pub fn from_rect(rect: Rect) -> Self {
        Self::from_edges(rect.x0, rect.y0, rect.x1, rect.y1)
    }

    /// Converts to a `kurbo` rectangle.
    #[inline]
    #[must_use]
    pub fn to_rect(self) -> Rect {
        Rect::new(self.x.min, self.y.min, self.x.max, self.y.max)
    }

    /// Returns the axis selected by `which`.
    #[inline]
    #[must_use]
    pub fn axis(&self, which: AxisKind) -> Axis {
        match which {
            AxisKind::X => self.x,
            AxisKind::Y => self.y,
        }
    }

    /// Returns a mutable reference to the axis selected by `which`.
    #[inline]
    pub fn axis_mut(&mut self, which: AxisKind) -> &mut Axis {
        match which {
            AxisKind::X => &mut self.x,
            AxisKind::Y => &mut self.y,
        }
    }

    /// Returns whether both axes are identical.
    #[inline]
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        self.x.equals(other.x) && self.y.equals(other.y)
    }

    /// Returns whether both axes are identical after rounding.
    #[inline]
    #[must_use]
    pub fn equals_rounded(&self, other: &Self) -> bool {
        self.x.equals_rounded(other.x) && self.y.equals_rounded(other.y)
    }

    /// Width divided by height.
    #[inline]
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        self.x.length() / self.y.length()
    }

    /// Rounds every edge to the nearest whole pixel.
    #[inline]
    pub fn round(&mut self) {
        self.x.round();
        self.y.round();
    }
}

impl From<Rect> for Bounds {
    fn from(rect: Rect) -> Self {
        Self::from_rect(rect)
    }
}

/// Selects one of the two axes of a [`Bounds`] or [`Delta`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AxisKind {
    /// Horizontal axis.
    X,
    /// Vertical axis.
    Y,
}

impl AxisKind {
    /// Both axes, horizontal first.
    pub const BOTH: [Self; 2] = [Self::X, Self::Y];
}

// ---------------------------------------------------------------------------
// Deltas
// ---------------------------------------------------------------------------

/// Translate and scale about an origin point along one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisDelta {
    /// Translation applied after scaling.
    pub translate: f64,
    /// Scale factor about `origin_point`.
    pub scale: f64,
    /// Origin as a fraction (0..1) of the source axis.
    pub origin: f64,
    /// Absolute coordinate of the origin on the source axis.
    pub origin_point: f64,
}

impl AxisDelta {
    /// The identity delta.
    pub const IDENTITY: Self = Self {
        translate: 0.0,
        scale: 1.0,
        origin: 0.0,
        origin_point: 0.0,
    };

    /// Returns whether this delta leaves every point in place.
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.translate == 0.0 && self.scale == 1.0
    }

    /// Compares translate, scale and origin point.
    #[inline]
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        self.translate == other.translate
            && self.scale == other.scale
            && self.origin_point == other.origin_point
    }
}

impl Default for AxisDelta {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A per-axis [`AxisDelta`] pair.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Delta {
    /// Horizontal delta.
    pub x: AxisDelta,
    /// Vertical delta.
    pub y: AxisDelta,
}

impl Delta {
    /// The identity delta.
    pub const IDENTITY: Self = Self {
        x: AxisDelta::IDENTITY,
        y: AxisDelta::IDENTITY,
    };

    /// Returns the axis delta selected by `which`.
    #[inline]
    #[must_use]
    pub fn axis(&self, which: AxisKind) -> AxisDelta {
        match which {
            AxisKind::X => self.x,
            AxisKind::Y => self.y,
        }
    }

    /// Returns whether both axes are identity.
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.x.is_zero() && self.y.is_zero()
    }

    /// Compares both axes with [`AxisDelta::equals`].
    #[inline]
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        self.x.equals(&other.x) && self.y.equals(&other.y)
    }
}

// ---------------------------------------------------------------------------
// Mixing
// ---------------------------------------------------------------------------

/// Interpolates `output` between two axes.
#[inline]
pub fn mix_axis(output: &mut Axis, from: Axis, to: Axis, progress: f64) {
    output.min = mix_number(from.min, to.min, progress);
    output.max = mix_number(from.max, to.max, progress);
}

/// Interpolates `output` between two boxes.
#[inline]
pub fn mix_box(output: &mut Bounds, from: &Bounds, to: &Bounds, progress: f64) {
    mix_axis(&mut output.x, from.x, to.x, progress);
    mix_axis(&mut output.y, from.y, to.y, progress);
}

/// Interpolates `delta` toward identity: translate toward 0 and scale
/// toward 1. The origin is carried over unchanged.
#[inline]
pub fn mix_axis_delta(output: &mut AxisDelta, delta: &AxisDelta, progress: f64) {
    output.translate = mix_number(delta.translate, 0.0, progress);
    output.scale = mix_number(delta.scale, 1.0, progress);
    output.origin = delta.origin;
    output.origin_point = delta.origin_point;
}

// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Latest style values.
//!
//! Every node carries a [`Values`] map mirroring the style properties the
//! host last rendered for its element: transform components, opacity,
//! radii, shadows and so on. The projection engine reads transform keys to
//! undo or re-apply user transforms while measuring and projecting, and
//! mixes visual keys during shared-element transitions.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use core::fmt;

/// Well-known value keys.
pub mod keys {
    /// Horizontal translation in pixels.
    pub const X: &str = "x";
    /// Vertical translation in pixels.
    pub const Y: &str = "y";
    /// Depth translation in pixels.
    pub const Z: &str = "z";
    /// Uniform scale.
    pub const SCALE: &str = "scale";
    /// Horizontal scale.
    pub const SCALE_X: &str = "scaleX";
    /// Vertical scale.
    pub const SCALE_Y: &str = "scaleY";
    /// Rotation in degrees.
    pub const ROTATE: &str = "rotate";
    /// Rotation about the horizontal axis in degrees.
    pub const ROTATE_X: &str = "rotateX";
    /// Rotation about the vertical axis in degrees.
    pub const ROTATE_Y: &str = "rotateY";
    /// Horizontal skew in degrees.
    pub const SKEW_X: &str = "skewX";
    /// Vertical skew in degrees.
    pub const SKEW_Y: &str = "skewY";
    /// Horizontal transform origin (0..1).
    pub const ORIGIN_X: &str = "originX";
    /// Vertical transform origin (0..1).
    pub const ORIGIN_Y: &str = "originY";
    /// Perspective applied before the transform, in pixels.
    pub const TRANSFORM_PERSPECTIVE: &str = "transformPerspective";
    /// Opacity (0..1).
    pub const OPACITY: &str = "opacity";
    /// Opacity of an outgoing shared element during a crossfade.
    pub const OPACITY_EXIT: &str = "opacityExit";
    /// Shorthand radius applied to every corner.
    pub const BORDER_RADIUS: &str = "borderRadius";
    /// Top-left corner radius.
    pub const BORDER_TOP_LEFT_RADIUS: &str = "borderTopLeftRadius";
    /// Top-right corner radius.
    pub const BORDER_TOP_RIGHT_RADIUS: &str = "borderTopRightRadius";
    /// Bottom-left corner radius.
    pub const BORDER_BOTTOM_LEFT_RADIUS: &str = "borderBottomLeftRadius";
    /// Bottom-right corner radius.
    pub const BORDER_BOTTOM_RIGHT_RADIUS: &str = "borderBottomRightRadius";
    /// Box shadow.
    pub const BOX_SHADOW: &str = "boxShadow";
    /// Pointer event handling.
    pub const POINTER_EVENTS: &str = "pointerEvents";

    /// The four corner radius keys in mixing order.
    pub const CORNER_RADII: [&str; 4] = [
        BORDER_TOP_LEFT_RADIUS,
        BORDER_TOP_RIGHT_RADIUS,
        BORDER_BOTTOM_LEFT_RADIUS,
        BORDER_BOTTOM_RIGHT_RADIUS,
    ];
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A single style value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A unitless number, or a length in pixels.
    Number(f64),
    /// A percentage, stored without the `%` sign.
    Percent(f64),
    /// Anything else, kept verbatim.
    Text(String),
}

impl Value {
    /// Parses a CSS-like string: `"12px"` and `"12"` become numbers, `"50%"`
    /// becomes a percentage, everything else is kept as text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if let Some(n) = trimmed.strip_suffix('%').and_then(|n| n.parse::<f64>().ok()) {
            return Self::Percent(n);
        }
        let number = trimmed.strip_suffix("px").unwrap_or(trimmed);
        match number.parse::<f64>() {
            Ok(n) => Self::Number(n),
            Err(_) => Self::Text(s.to_string()),
        }
    }

    /// Returns the numeric magnitude of a number or percentage.
    #[inline]
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) | Self::Percent(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// Returns whether this is a plain number (a pixel length).
    #[inline]
    #[must_use]
    pub fn is_px(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    /// Returns whether this is a percentage.
    #[inline]
    #[must_use]
    pub fn is_percent(&self) -> bool {
        matches!(self, Self::Percent(_))
    }

    /// Returns whether the value would count as set: non-zero numbers and
    /// non-empty text.
    #[inline]
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Number(n) | Self::Percent(n) => *n != 0.0 && !n.is_nan(),
            Self::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Percent(n) => write!(f, "{n}%"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// An ordered map of style keys to [`Value`]s.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Values {
    entries: BTreeMap<String, Value>,
}

impl Values {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns the value under `key` if it is a plain number.
    #[inline]
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.entries.get(key) {
            Some(Value::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// Returns whether the value under `key` is set and truthy.
    #[inline]
    #[must_use]
    pub fn is_truthy(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(Value::is_truthy)
    }

    /// Stores a value, returning the previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Removes a value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    /// Returns whether `key` is present.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of stored values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no values are stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Values {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Transform predicates
// ---------------------------------------------------------------------------

fn is_identity_scale(value: Option<&Value>) -> bool {
    match value {
        None => true,
        Some(v) => v.as_number() == Some(1.0),
    }
}

/// Returns whether any of `scale`, `scaleX` or `scaleY` is set to something
/// other than 1.
#[must_use]
pub fn has_scale(values: &Values) -> bool {
    !is_identity_scale(values.get(keys::SCALE))
        || !is_identity_scale(values.get(keys::SCALE_X))
        || !is_identity_scale(values.get(keys::SCALE_Y))
}

/// Returns whether `x` or `y` translate the element.
#[must_use]
pub fn has_2d_translate(values: &Values) -> bool {
    values.is_truthy(keys::X) || values.is_truthy(keys::Y)
}

/// Returns whether the values describe any transform at all.
#[must_use]
pub fn has_transform(values: &Values) -> bool {
    has_scale(values)
        || has_2d_translate(values)
        || [
            keys::Z,
            keys::ROTATE,
            keys::ROTATE_X,
            keys::ROTATE_Y,
            keys::SKEW_X,
            keys::SKEW_Y,
        ]
        .into_iter()
        .any(|key| values.is_truthy(key))
}

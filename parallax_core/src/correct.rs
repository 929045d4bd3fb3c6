// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scale correction for styles distorted by projection.
//!
//! A projection transform scales an element non-uniformly, which would also
//! stretch its corner radii and shadows. Scale correctors rewrite those
//! values every frame so that, once scaled, they look the way the latest
//! values describe.

use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use kurbo::Point;

use crate::geometry::{Axis, Bounds, Delta, mix_number};
use crate::values::{Value, keys};

/// What a [`ScaleCorrector`] may read about the node being rendered.
#[derive(Clone, Copy, Debug)]
pub struct CorrectionContext<'a> {
    /// The box the lead node is currently projected into.
    pub target: Option<&'a Bounds>,
    /// Accumulated ancestor scale.
    pub tree_scale: Point,
    /// The node's resolved projection delta.
    pub projection_delta: &'a Delta,
}

/// Rewrites one style value to counter the projection's scale.
pub trait ScaleCorrector {
    /// Returns the corrected value.
    fn correct(&self, value: &Value, ctx: &CorrectionContext<'_>) -> Value;
}

// ---------------------------------------------------------------------------
// Border radius
// ---------------------------------------------------------------------------

fn pixels_to_percent(pixels: f64, axis: Axis) -> f64 {
    if axis.max == axis.min {
        return 0.0;
    }
    pixels / (axis.max - axis.min) * 100.0
}

/// Expresses pixel radii as percentages of the target box, which stay
/// correct however the box is scaled.
#[derive(Clone, Copy, Debug, Default)]
pub struct CorrectBorderRadius;

impl ScaleCorrector for CorrectBorderRadius {
    fn correct(&self, value: &Value, ctx: &CorrectionContext<'_>) -> Value {
        let Some(target) = ctx.target else {
            return value.clone();
        };
        let Value::Number(pixels) = value else {
            return value.clone();
        };
        let x = pixels_to_percent(*pixels, target.x);
        let y = pixels_to_percent(*pixels, target.y);
        Value::Text(format!("{x}% {y}%"))
    }
}

// ---------------------------------------------------------------------------
// Box shadow
// ---------------------------------------------------------------------------

/// Splits a shadow on whitespace outside parentheses.
fn shadow_tokens(shadow: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0_u32;
    let mut start = None;
    for (i, c) in shadow.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if c.is_whitespace() && depth == 0 {
            if let Some(s) = start.take() {
                tokens.push(&shadow[s..i]);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push(&shadow[s..]);
    }
    tokens
}

/// Divides shadow offsets by the on-screen scale of each axis, and blur and
/// spread by the average of the two.
///
/// The color may come first or last. Shadows with more than five parts
/// (multiple shadows, `inset`) are left alone.
#[derive(Clone, Copy, Debug, Default)]
pub struct CorrectBoxShadow;

impl ScaleCorrector for CorrectBoxShadow {
    fn correct(&self, value: &Value, ctx: &CorrectionContext<'_>) -> Value {
        let Value::Text(shadow) = value else {
            return value.clone();
        };
        let tokens = shadow_tokens(shadow);
        if tokens.len() > 5 {
            return value.clone();
        }

        let x_scale = ctx.projection_delta.x.scale * ctx.tree_scale.x;
        let y_scale = ctx.projection_delta.y.scale * ctx.tree_scale.y;
        let average_scale = mix_number(x_scale, y_scale, 0.5);

        let mut numeric_index = 0;
        let parts: Vec<String> = tokens
            .into_iter()
            .map(|token| match Value::parse(token) {
                Value::Number(n) => {
                    let divisor = match numeric_index {
                        0 => x_scale,
                        1 => y_scale,
                        _ => average_scale,
                    };
                    numeric_index += 1;
                    format!("{}px", n / divisor)
                }
                _ => token.to_owned(),
            })
            .collect();
        Value::Text(parts.join(" "))
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

struct Entry {
    key: String,
    corrector: Box<dyn ScaleCorrector>,
    apply_to: Vec<String>,
}

/// The set of keys that are scale corrected, and how.
///
/// [`with_defaults`](Self::with_defaults) registers border radii (the
/// `borderRadius` shorthand fans out to the four corners) and box shadow.
pub struct ScaleCorrectors {
    entries: Vec<Entry>,
}

impl fmt::Debug for ScaleCorrectors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| &e.key))
            .finish()
    }
}

impl Default for ScaleCorrectors {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ScaleCorrectors {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates a registry with the border radius and box shadow correctors.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut correctors = Self::new();
        correctors.add(keys::BORDER_RADIUS, CorrectBorderRadius, &keys::CORNER_RADII);
        for corner in keys::CORNER_RADII {
            correctors.add(corner, CorrectBorderRadius, &[]);
        }
        correctors.add(keys::BOX_SHADOW, CorrectBoxShadow, &[]);
        correctors
    }

    /// Registers `corrector` for `key`, replacing any existing entry.
    ///
    /// When `apply_to` is non-empty the corrected value is written to those
    /// keys instead of `key` itself.
    pub fn add(
        &mut self,
        key: &str,
        corrector: impl ScaleCorrector + 'static,
        apply_to: &[&str],
    ) {
        let entry = Entry {
            key: key.to_owned(),
            corrector: Box::new(corrector),
            apply_to: apply_to.iter().map(|k| (*k).to_owned()).collect(),
        };
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Returns whether `key` is corrected.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    /// Iterates `(key, corrector, apply_to)` in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn ScaleCorrector, &[String])> {
        self.entries
            .iter()
            .map(|e| (e.key.as_str(), e.corrector.as_ref(), e.apply_to.as_slice()))
    }
}

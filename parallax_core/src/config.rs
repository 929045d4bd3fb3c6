// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree-wide configuration.

use crate::animation::Transition;

/// Frame length assumed after the frame loop wakes up, in milliseconds.
pub const DEFAULT_ELAPSED_MS: f64 = 1000.0 / 60.0;

/// Upper bound on the elapsed time between kept-alive frames, in
/// milliseconds.
pub const MAX_ELAPSED_MS: f64 = 40.0;

/// Configuration of a [`ProjectionTree`](crate::tree::ProjectionTree).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionConfig {
    /// Transition used by layout animations without their own.
    pub layout_transition: Transition,
    /// Forces every layout animation to complete instantly.
    pub reduced_motion: bool,
    /// Clamp for the elapsed time between frames.
    pub max_elapsed_ms: f64,
    /// Elapsed time reported for the first frame after a wake.
    pub default_elapsed_ms: f64,
}

impl ProjectionConfig {
    /// The default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            layout_transition: Transition::LAYOUT,
            reduced_motion: false,
            max_elapsed_ms: MAX_ELAPSED_MS,
            default_elapsed_ms: DEFAULT_ELAPSED_MS,
        }
    }

    /// The default configuration with reduced motion enabled.
    #[must_use]
    pub const fn reduced_motion() -> Self {
        Self {
            reduced_motion: true,
            ..Self::new()
        }
    }

    /// Replaces the default layout transition.
    #[must_use]
    pub const fn with_layout_transition(mut self, transition: Transition) -> Self {
        self.layout_transition = transition;
        self
    }

    /// Returns the transition to run, honoring reduced motion.
    #[must_use]
    pub fn effective_transition(&self, requested: Option<Transition>) -> Transition {
        if self.reduced_motion {
            Transition::Instant
        } else {
            requested.unwrap_or(self.layout_transition)
        }
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self::new()
    }
}

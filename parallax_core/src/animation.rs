// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Numeric animation driver.
//!
//! Layout animations drive a single scalar from 0 to 1000; the projection
//! engine converts it back to 0..1 progress. The wide integer-like range
//! keeps spring rest thresholds meaningful near the start.
//!
//! A [`ValueAnimation`] is sampled once per frame with [`tick`]. It reports
//! completion exactly once, and [`stop`] cancels it synchronously so that no
//! completion is ever reported afterwards.
//!
//! [`tick`]: ValueAnimation::tick
//! [`stop`]: ValueAnimation::stop

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::easing::Easing;
use crate::geometry::mix_number;

/// Start of the progress range driven by layout animations.
pub const PROGRESS_START: f64 = 0.0;
/// End of the progress range driven by layout animations.
pub const PROGRESS_END: f64 = 1000.0;

/// Upper bound on a single spring integration step, in seconds.
const MAX_SPRING_STEP: f64 = 0.001;

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

/// Physical parameters of a damped spring.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringConfig {
    /// Spring constant.
    pub stiffness: f64,
    /// Damping coefficient.
    pub damping: f64,
    /// Mass of the animated value.
    pub mass: f64,
    /// The spring may rest once its speed (units per second) is below this.
    pub rest_speed: f64,
    /// The spring may rest once it is this close to the target.
    pub rest_delta: f64,
}

impl SpringConfig {
    /// A soft spring with little overshoot.
    pub const GENTLE: Self = Self::new(120.0, 14.0);
    /// A bouncy spring.
    pub const WOBBLY: Self = Self::new(180.0, 12.0);
    /// A firm spring.
    pub const STIFF: Self = Self::new(210.0, 20.0);
    /// A fast, critically damped feel.
    pub const SNAPPY: Self = Self::new(400.0, 30.0);

    /// Creates a unit-mass spring with default rest thresholds.
    #[must_use]
    pub const fn new(stiffness: f64, damping: f64) -> Self {
        Self {
            stiffness,
            damping,
            mass: 1.0,
            rest_speed: 10.0,
            rest_delta: 0.5,
        }
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::new(100.0, 10.0)
    }
}

/// How an animation moves from its start to its end value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Transition {
    /// Time-based interpolation along an easing curve.
    Tween {
        /// Duration in milliseconds.
        duration_ms: f64,
        /// Delay before the tween starts, in milliseconds.
        delay_ms: f64,
        /// Easing curve.
        easing: Easing,
    },
    /// Physics-based spring.
    Spring {
        /// Spring parameters.
        config: SpringConfig,
        /// Delay before the spring starts, in milliseconds.
        delay_ms: f64,
    },
    /// Jump straight to the end value on the first frame.
    Instant,
}

impl Transition {
    /// The default layout transition: 450ms along `cubic-bezier(0.4, 0, 0.1, 1)`.
    pub const LAYOUT: Self = Self::Tween {
        duration_ms: 450.0,
        delay_ms: 0.0,
        easing: Easing::LAYOUT,
    };

    /// Creates an undelayed tween.
    #[must_use]
    pub const fn tween(duration_ms: f64, easing: Easing) -> Self {
        Self::Tween {
            duration_ms,
            delay_ms: 0.0,
            easing,
        }
    }

    /// Creates an undelayed spring.
    #[must_use]
    pub const fn spring(config: SpringConfig) -> Self {
        Self::Spring {
            config,
            delay_ms: 0.0,
        }
    }
}

impl Default for Transition {
    fn default() -> Self {
        Self::LAYOUT
    }
}

// ---------------------------------------------------------------------------
// ValueAnimation
// ---------------------------------------------------------------------------

/// Lifecycle of a [`ValueAnimation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayState {
    /// Still producing values.
    Running,
    /// Reached its end value; completion has been reported.
    Finished,
    /// Cancelled with [`ValueAnimation::stop`].
    Stopped,
}

/// One frame's output of [`ValueAnimation::tick`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// Current value.
    pub value: f64,
    /// Set on exactly one sample: the one where the animation finished.
    pub completed: bool,
}

/// A scalar animation sampled once per frame.
#[derive(Clone, Debug)]
pub struct ValueAnimation {
    from: f64,
    to: f64,
    transition: Transition,
    start_time: f64,
    last_time: f64,
    value: f64,
    velocity: f64,
    state: PlayState,
}

impl ValueAnimation {
    /// Creates an animation from `from` to `to` starting at `start_time`
    /// (milliseconds).
    #[must_use]
    pub fn new(from: f64, to: f64, transition: Transition, start_time: f64) -> Self {
        Self {
            from,
            to,
            transition,
            start_time,
            last_time: start_time,
            value: from,
            velocity: 0.0,
            state: PlayState::Running,
        }
    }

    /// Creates the 0 to 1000 progress animation used by layout animations.
    #[must_use]
    pub fn progress(transition: Transition, start_time: f64) -> Self {
        Self::new(PROGRESS_START, PROGRESS_END, transition, start_time)
    }

    /// Returns the most recent value.
    #[inline]
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Returns the lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> PlayState {
        self.state
    }

    /// Returns whether the animation still produces values.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == PlayState::Running
    }

    /// Cancels the animation. Completion will never be reported.
    pub fn stop(&mut self) {
        if self.state == PlayState::Running {
            self.state = PlayState::Stopped;
        }
    }

    /// Samples the animation at `now` (milliseconds).
    pub fn tick(&mut self, now: f64) -> Sample {
        if self.state != PlayState::Running {
            return Sample {
                value: self.value,
                completed: false,
            };
        }

        let done = match self.transition {
            Transition::Instant => {
                self.value = self.to;
                true
            }
            Transition::Tween {
                duration_ms,
                delay_ms,
                easing,
            } => {
                let elapsed = now - self.start_time - delay_ms;
                let t = if duration_ms <= 0.0 {
                    if elapsed >= 0.0 { 1.0 } else { 0.0 }
                } else {
                    (elapsed / duration_ms).clamp(0.0, 1.0)
                };
                self.value = mix_number(self.from, self.to, easing.ease(t));
                t >= 1.0
            }
            Transition::Spring { config, delay_ms } => self.step_spring(config, delay_ms, now),
        };
        self.last_time = now;

        if done {
            self.value = self.to;
            self.state = PlayState::Finished;
        }
        Sample {
            value: self.value,
            completed: done,
        }
    }

    /// Integrates the spring from the previous sample up to `now`.
    fn step_spring(&mut self, config: SpringConfig, delay_ms: f64, now: f64) -> bool {
        let active_from = self.start_time + delay_ms;
        if now <= active_from {
            return false;
        }
        let begin = self.last_time.max(active_from);
        let mut remaining = ((now - begin) / 1000.0).max(0.0);
        let mass = config.mass.max(1.0e-4);
        let inv_mass = 1.0 / mass;
        while remaining > 0.0 {
            let dt = remaining.min(MAX_SPRING_STEP);
            let displacement = self.value - self.to;
            let spring_force = -config.stiffness * displacement;
            let damping_force = -config.damping * self.velocity;
            let acceleration = (spring_force + damping_force) * inv_mass;
            self.velocity += acceleration * dt;
            self.value += self.velocity * dt;
            remaining -= dt;
        }
        self.velocity.abs() <= config.rest_speed && (self.to - self.value).abs() <= config.rest_delta
    }
}

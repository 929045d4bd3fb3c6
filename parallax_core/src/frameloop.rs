// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Step-ordered frame batching.
//!
//! A [`Batcher`] owns one [`RenderStep`] queue per [`Step`]. Work is
//! scheduled as plain task values; the owner drives a frame by running the
//! steps in order and pulling tasks with [`Batcher::next_task`]. Keeping
//! tasks as data lets the owner hold `&mut` access to everything a task
//! touches while it runs.
//!
//! Scheduling rules:
//!
//! - A task is queued at most once per frame.
//! - An `immediate` task scheduled while its step is running joins the
//!   current pass; anything else waits for the next frame.
//! - A keep-alive task is rescheduled for the next frame every time it runs,
//!   until it is [cancelled](Batcher::cancel).
//! - Starting a step that is already running is deferred: the step runs
//!   again once the active pass ends.

use alloc::vec::Vec;

/// The six frame steps, in processing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    /// Read from the host (measurements).
    Read,
    /// Resolve animation keyframes.
    ResolveKeyframes,
    /// Advance animations.
    Update,
    /// Compute projections.
    PreRender,
    /// Write styles to the host.
    Render,
    /// Clean up after rendering.
    PostRender,
}

impl Step {
    /// All steps, in processing order.
    pub const ALL: [Self; 6] = [
        Self::Read,
        Self::ResolveKeyframes,
        Self::Update,
        Self::PreRender,
        Self::Render,
        Self::PostRender,
    ];

    #[inline]
    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Read => 0,
            Self::ResolveKeyframes => 1,
            Self::Update => 2,
            Self::PreRender => 3,
            Self::Render => 4,
            Self::PostRender => 5,
        }
    }
}

/// Timing data shared by every task of one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameData {
    /// Milliseconds since the previous frame.
    pub delta: f64,
    /// Timestamp of this frame in milliseconds.
    pub timestamp: f64,
    /// Whether a frame is being processed right now.
    pub is_processing: bool,
}

// ---------------------------------------------------------------------------
// RenderStep
// ---------------------------------------------------------------------------

/// The queue of one [`Step`].
#[derive(Clone, Debug)]
pub struct RenderStep<T> {
    this_frame: Vec<T>,
    next_frame: Vec<T>,
    keep_alive: Vec<T>,
    cursor: usize,
    is_processing: bool,
    flush_next_frame: bool,
}

impl<T> Default for RenderStep<T> {
    fn default() -> Self {
        Self {
            this_frame: Vec::new(),
            next_frame: Vec::new(),
            keep_alive: Vec::new(),
            cursor: 0,
            is_processing: false,
            flush_next_frame: false,
        }
    }
}

impl<T: Copy + PartialEq> RenderStep<T> {
    /// Queues `task`. Returns `false` if it was already queued.
    fn schedule(&mut self, task: T, keep_alive: bool, immediate: bool) -> bool {
        if keep_alive && !self.keep_alive.contains(&task) {
            self.keep_alive.push(task);
        }
        let queue = if immediate && self.is_processing {
            &mut self.this_frame
        } else {
            &mut self.next_frame
        };
        if queue.contains(&task) {
            return false;
        }
        queue.push(task);
        true
    }

    fn cancel(&mut self, task: T) {
        self.next_frame.retain(|t| *t != task);
        self.keep_alive.retain(|t| *t != task);
    }

    fn begin(&mut self) -> bool {
        if self.is_processing {
            self.flush_next_frame = true;
            return false;
        }
        self.is_processing = true;
        core::mem::swap(&mut self.this_frame, &mut self.next_frame);
        self.cursor = 0;
        true
    }

    fn end(&mut self) -> bool {
        self.this_frame.clear();
        self.cursor = 0;
        self.is_processing = false;
        core::mem::take(&mut self.flush_next_frame)
    }

    /// Returns whether this step is mid-pass.
    #[inline]
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    /// Number of tasks waiting for the next frame.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.next_frame.len()
    }
}

// ---------------------------------------------------------------------------
// Batcher
// ---------------------------------------------------------------------------

/// Six step queues plus the frame clock that drives them.
#[derive(Clone, Debug)]
pub struct Batcher<T> {
    steps: [RenderStep<T>; 6],
    data: FrameData,
    run_next_frame: bool,
    use_default_elapsed: bool,
    allow_keep_alive: bool,
    default_elapsed_ms: f64,
    max_elapsed_ms: f64,
}

impl<T: Copy + PartialEq> Batcher<T> {
    /// Creates a batcher.
    ///
    /// Without `allow_keep_alive` the batcher behaves like a microtask
    /// queue: it never asks for a follow-up frame on its own.
    #[must_use]
    pub fn new(allow_keep_alive: bool, default_elapsed_ms: f64, max_elapsed_ms: f64) -> Self {
        Self {
            steps: core::array::from_fn(|_| RenderStep::default()),
            data: FrameData::default(),
            run_next_frame: false,
            use_default_elapsed: true,
            allow_keep_alive,
            default_elapsed_ms,
            max_elapsed_ms,
        }
    }

    /// Returns the current frame data.
    #[inline]
    #[must_use]
    pub fn data(&self) -> FrameData {
        self.data
    }

    /// Returns the queue of `step`.
    #[inline]
    #[must_use]
    pub fn step(&self, step: Step) -> &RenderStep<T> {
        &self.steps[step.index()]
    }

    /// Returns whether work is waiting for another frame.
    #[inline]
    #[must_use]
    pub fn needs_frame(&self) -> bool {
        self.run_next_frame
    }

    fn wake(&mut self) {
        self.run_next_frame = true;
        self.use_default_elapsed = true;
    }

    /// Queues `task` in `step`.
    pub fn schedule(&mut self, step: Step, task: T, keep_alive: bool, immediate: bool) {
        if !self.run_next_frame {
            self.wake();
        }
        self.steps[step.index()].schedule(task, keep_alive, immediate);
    }

    /// Removes `task` from every pending queue and stops keeping it alive.
    pub fn cancel(&mut self, task: T) {
        for step in &mut self.steps {
            step.cancel(task);
        }
    }

    /// Starts a frame at `timestamp`.
    ///
    /// The elapsed time is the default frame length after a wake, and the
    /// measured gap clamped to `1..=max_elapsed_ms` while kept alive.
    pub fn begin_frame(&mut self, timestamp: f64) -> FrameData {
        self.run_next_frame = false;
        self.data.delta = if self.use_default_elapsed {
            self.default_elapsed_ms
        } else {
            (timestamp - self.data.timestamp).clamp(1.0, self.max_elapsed_ms)
        };
        self.data.timestamp = timestamp;
        self.data.is_processing = true;
        self.data
    }

    /// Ends a frame. Returns whether another frame was requested.
    pub fn end_frame(&mut self) -> bool {
        self.data.is_processing = false;
        if self.run_next_frame && self.allow_keep_alive {
            self.use_default_elapsed = false;
        }
        self.run_next_frame
    }

    /// Starts a synchronous flush outside the frame loop.
    ///
    /// The elapsed time is clamped to `0..=default_elapsed_ms`.
    pub fn begin_sync(&mut self, now: f64) -> FrameData {
        self.data.delta = (now - self.data.timestamp).clamp(0.0, self.default_elapsed_ms);
        self.data.timestamp = now;
        self.data.is_processing = true;
        self.data
    }

    /// Ends a synchronous flush.
    pub fn end_sync(&mut self) {
        self.data.is_processing = false;
    }

    /// Starts a pass over `step`.
    ///
    /// Returns `false` if the step is already running; the pass is then
    /// repeated once the active one ends.
    pub fn begin_step(&mut self, step: Step) -> bool {
        self.steps[step.index()].begin()
    }

    /// Takes the next task of the active pass over `step`.
    ///
    /// Keep-alive tasks are rescheduled for the next frame as they are taken.
    pub fn next_task(&mut self, step: Step) -> Option<T> {
        let queue = &mut self.steps[step.index()];
        let task = *queue.this_frame.get(queue.cursor)?;
        queue.cursor += 1;
        if queue.keep_alive.contains(&task) {
            queue.schedule(task, false, false);
            self.run_next_frame = true;
        }
        Some(task)
    }

    /// Ends the active pass over `step`. Returns whether a deferred pass
    /// should run now.
    pub fn end_step(&mut self, step: Step) -> bool {
        self.steps[step.index()].end()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn batcher() -> Batcher<u32> {
        Batcher::new(true, 1000.0 / 60.0, 40.0)
    }

    fn drain(b: &mut Batcher<u32>, step: Step) -> Vec<u32> {
        let mut out = Vec::new();
        if b.begin_step(step) {
            while let Some(t) = b.next_task(step) {
                out.push(t);
            }
            let _ = b.end_step(step);
        }
        out
    }

    #[test]
    fn tasks_are_unique_per_frame() {
        let mut b = batcher();
        b.schedule(Step::Update, 1, false, false);
        b.schedule(Step::Update, 1, false, false);
        b.schedule(Step::Update, 2, false, false);
        assert!(b.needs_frame());
        let _ = b.begin_frame(0.0);
        assert_eq!(drain(&mut b, Step::Update), vec![1, 2]);
        assert!(!b.end_frame());
    }

    #[test]
    fn immediate_joins_current_pass_only_while_processing() {
        let mut b = batcher();
        b.schedule(Step::Render, 1, false, true);
        let _ = b.begin_frame(0.0);
        assert!(b.begin_step(Step::Render));
        assert_eq!(b.next_task(Step::Render), Some(1));
        b.schedule(Step::Render, 2, false, true);
        b.schedule(Step::Render, 3, false, false);
        assert_eq!(b.next_task(Step::Render), Some(2));
        assert_eq!(b.next_task(Step::Render), None);
        let _ = b.end_step(Step::Render);
        assert!(b.end_frame());
        let _ = b.begin_frame(16.0);
        assert_eq!(drain(&mut b, Step::Render), vec![3]);
    }

    #[test]
    fn keep_alive_repeats_until_cancelled() {
        let mut b = batcher();
        b.schedule(Step::Update, 7, true, false);
        for t in [0.0, 16.0, 32.0] {
            let _ = b.begin_frame(t);
            assert_eq!(drain(&mut b, Step::Update), vec![7]);
            assert!(b.end_frame());
        }
        b.cancel(7);
        let _ = b.begin_frame(48.0);
        assert!(drain(&mut b, Step::Update).is_empty());
        assert!(!b.end_frame());
    }

    #[test]
    fn elapsed_is_default_after_wake_and_clamped_while_alive() {
        let mut b = batcher();
        b.schedule(Step::Update, 1, true, false);
        let data = b.begin_frame(100.0);
        assert_eq!(data.delta, 1000.0 / 60.0);
        let _ = drain(&mut b, Step::Update);
        assert!(b.end_frame());

        let data = b.begin_frame(300.0);
        assert_eq!(data.delta, 40.0);
        let _ = drain(&mut b, Step::Update);
        assert!(b.end_frame());

        let data = b.begin_frame(300.2);
        assert_eq!(data.delta, 1.0);
    }

    #[test]
    fn reentrant_pass_is_deferred() {
        let mut b = batcher();
        b.schedule(Step::Read, 1, false, false);
        let _ = b.begin_frame(0.0);
        assert!(b.begin_step(Step::Read));
        assert!(!b.begin_step(Step::Read));
        assert_eq!(b.next_task(Step::Read), Some(1));
        assert!(b.end_step(Step::Read), "deferred pass should be requested");
        assert!(!b.end_step(Step::Read));
    }

    #[test]
    fn sync_flush_clamps_elapsed() {
        let mut b = batcher();
        let data = b.begin_sync(500.0);
        assert_eq!(data.delta, 1000.0 / 60.0);
        assert!(data.is_processing);
        b.end_sync();
        assert!(!b.data().is_processing);
    }

    #[test]
    fn microtask_batcher_never_switches_to_measured_elapsed() {
        let mut b = Batcher::new(false, 1000.0 / 60.0, 40.0);
        b.schedule(Step::Read, 1, true, false);
        let _ = b.begin_frame(0.0);
        let _ = drain(&mut b, Step::Read);
        assert!(b.end_frame());
        let data = b.begin_frame(5.0);
        assert_eq!(data.delta, 1000.0 / 60.0);
    }
}

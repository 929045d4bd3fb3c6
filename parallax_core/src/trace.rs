// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the frame loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! the projection tree calls as it runs frame steps and projection passes.
//! All method bodies default to no-ops, so implementing only the events you
//! care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! [`FrameSummaryBuilder`] collects step timestamps during a frame and
//! produces a [`FrameSummary`] at the end.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) gates [`ProjectionChange`] events and
//!   the corresponding `TraceSink` method.

use crate::frameloop::Step;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// One of the full-tree passes of a projection update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Dirty flags are inherited from ancestors.
    PropagateDirty,
    /// Target boxes are resolved.
    ResolveTargets,
    /// Projection deltas are computed.
    CalcProjection,
    /// Dirty flags are cleared.
    CleanDirty,
}

impl PassKind {
    /// All passes, in execution order.
    pub const ALL: [Self; 4] = [
        Self::PropagateDirty,
        Self::ResolveTargets,
        Self::CalcProjection,
        Self::CleanDirty,
    ];
}

/// What changed about a node during a frame.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProjectionField {
    /// The projection delta changed.
    Delta,
    /// A style patch was written to the host.
    Styles,
    /// The layout animation completed.
    AnimationComplete,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a frame, or a synchronous flush, starts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameBeginEvent {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// Frame timestamp in milliseconds.
    pub timestamp: f64,
    /// Elapsed time since the previous frame, after clamping.
    pub delta: f64,
    /// Whether this is a synchronous flush run by an update.
    pub is_sync: bool,
}

/// Marks the beginning of a frame step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepBeginEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which step is starting.
    pub step: Step,
    /// Host time at the start of the step.
    pub timestamp: f64,
}

/// Marks the end of a frame step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepEndEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which step is ending.
    pub step: Step,
    /// Host time at the end of the step.
    pub timestamp: f64,
    /// Number of tasks run.
    pub tasks: u32,
}

/// Emitted after each projection pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which pass ran.
    pub pass: PassKind,
    /// Number of nodes visited.
    pub nodes: u32,
}

/// Per-frame summary produced by [`FrameSummaryBuilder`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Frame timestamp in milliseconds.
    pub timestamp: f64,
    /// Elapsed time since the previous frame.
    pub delta: f64,
    /// Whether this was a synchronous flush.
    pub is_sync: bool,
    /// Duration of each step in milliseconds, in [`Step::ALL`] order
    /// (0 if the step did not run).
    pub step_ms: [f64; 6],
    /// Tasks run by each step, in [`Step::ALL`] order.
    pub step_tasks: [u32; 6],
    /// Number of projection passes run.
    pub passes: u32,
    /// Whether another frame was requested.
    pub requested_frame: bool,
}

impl FrameSummary {
    /// Returns the duration of `step` in milliseconds.
    #[must_use]
    pub fn step_duration(&self, step: Step) -> f64 {
        self.step_ms[step.index()]
    }

    /// Returns the total number of tasks run.
    #[must_use]
    pub fn total_tasks(&self) -> u32 {
        self.step_tasks.iter().sum()
    }
}

/// A per-frame node change record.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProjectionChange {
    /// Slot index of the node that changed.
    pub node_index: u32,
    /// What changed.
    pub field: ProjectionField,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the projection tree.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a frame or synchronous flush begins.
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        _ = e;
    }

    /// Called at the beginning of a frame step.
    fn on_step_begin(&mut self, e: &StepBeginEvent) {
        _ = e;
    }

    /// Called at the end of a frame step.
    fn on_step_end(&mut self, e: &StepEndEvent) {
        _ = e;
    }

    /// Called after each projection pass.
    fn on_pass(&mut self, e: &PassEvent) {
        _ = e;
    }

    /// Called with a per-frame summary.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }

    /// Called with per-frame node changes (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_projection_changes(&mut self, frame_index: u64, changes: &[ProjectionChange]) {
        _ = (frame_index, changes);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Returns whether events reach a sink.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        #[cfg(feature = "trace")]
        {
            self.sink.is_some()
        }
        #[cfg(not(feature = "trace"))]
        {
            false
        }
    }

    /// Emits a [`FrameBeginEvent`].
    #[inline]
    pub fn frame_begin(&mut self, e: &FrameBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`StepBeginEvent`].
    #[inline]
    pub fn step_begin(&mut self, e: &StepBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_step_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`StepEndEvent`].
    #[inline]
    pub fn step_end(&mut self, e: &StepEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_step_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PassEvent`].
    #[inline]
    pub fn pass(&mut self, e: &PassEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_frame_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits node changes (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn projection_changes(&mut self, frame_index: u64, changes: &[ProjectionChange]) {
        if let Some(s) = &mut self.sink {
            s.on_projection_changes(frame_index, changes);
        }
    }
}

// ---------------------------------------------------------------------------
// FrameSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects step timestamps and counts during a frame and produces a
/// [`FrameSummary`].
#[derive(Debug)]
pub struct FrameSummaryBuilder {
    begin: FrameBeginEvent,
    step_starts: [Option<f64>; 6],
    step_ends: [Option<f64>; 6],
    step_tasks: [u32; 6],
    passes: u32,
    requested_frame: bool,
}

impl FrameSummaryBuilder {
    /// Starts building a summary for the given frame.
    #[must_use]
    pub fn new(begin: &FrameBeginEvent) -> Self {
        Self {
            begin: *begin,
            step_starts: [None; 6],
            step_ends: [None; 6],
            step_tasks: [0; 6],
            passes: 0,
            requested_frame: false,
        }
    }

    /// Records the start of a step.
    pub fn step_begin(&mut self, step: Step, t: f64) {
        let idx = step.index();
        if self.step_starts[idx].is_none() {
            self.step_starts[idx] = Some(t);
        }
    }

    /// Records the end of a step and the tasks it ran.
    ///
    /// A step that runs again in the same frame accumulates.
    pub fn step_end(&mut self, step: Step, t: f64, tasks: u32) {
        let idx = step.index();
        self.step_ends[idx] = Some(t);
        self.step_tasks[idx] += tasks;
    }

    /// Records a projection pass.
    pub fn pass(&mut self) {
        self.passes += 1;
    }

    /// Sets whether another frame was requested.
    pub fn set_requested_frame(&mut self, requested: bool) {
        self.requested_frame = requested;
    }

    /// Consumes the builder and produces the final [`FrameSummary`].
    #[must_use]
    pub fn finish(self) -> FrameSummary {
        FrameSummary {
            frame_index: self.begin.frame_index,
            timestamp: self.begin.timestamp,
            delta: self.begin.delta,
            is_sync: self.begin.is_sync,
            step_ms: core::array::from_fn(|idx| self.step_duration(idx)),
            step_tasks: self.step_tasks,
            passes: self.passes,
            requested_frame: self.requested_frame,
        }
    }

    fn step_duration(&self, idx: usize) -> f64 {
        match (self.step_starts[idx], self.step_ends[idx]) {
            (Some(start), Some(end)) => (end - start).max(0.0),
            _ => 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are milliseconds, as reported by the projection host.

use std::io::Write;

use parallax_core::frameloop::Step;
use parallax_core::trace::{
    FrameBeginEvent, FrameSummary, PassEvent, PassKind, ProjectionChange, StepBeginEvent,
    StepEndEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its destination.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

pub(crate) fn step_name(step: Step) -> &'static str {
    match step {
        Step::Read => "read",
        Step::ResolveKeyframes => "keyframes",
        Step::Update => "update",
        Step::PreRender => "pre-render",
        Step::Render => "render",
        Step::PostRender => "post-render",
    }
}

pub(crate) fn pass_name(pass: PassKind) -> &'static str {
    match pass {
        PassKind::PropagateDirty => "propagate",
        PassKind::ResolveTargets => "resolve",
        PassKind::CalcProjection => "project",
        PassKind::CleanDirty => "clean",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        let kind = if e.is_sync { "sync" } else { "frame" };
        let _ = writeln!(
            self.writer,
            "[{kind}] frame={} at {:.1}ms delta={:.1}ms",
            e.frame_index, e.timestamp, e.delta,
        );
    }

    fn on_step_begin(&mut self, e: &StepBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[step:begin] frame={} {} at {:.3}ms",
            e.frame_index,
            step_name(e.step),
            e.timestamp,
        );
    }

    fn on_step_end(&mut self, e: &StepEndEvent) {
        let _ = writeln!(
            self.writer,
            "[step:end] frame={} {} at {:.3}ms tasks={}",
            e.frame_index,
            step_name(e.step),
            e.timestamp,
            e.tasks,
        );
    }

    fn on_pass(&mut self, e: &PassEvent) {
        let _ = writeln!(
            self.writer,
            "[pass] frame={} {} nodes={}",
            e.frame_index,
            pass_name(e.pass),
            e.nodes,
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let more = if s.requested_frame { "more" } else { "idle" };
        let _ = writeln!(
            self.writer,
            "[summary] frame={} update={:.3}ms pre-render={:.3}ms render={:.3}ms \
             tasks={} passes={} next={more}",
            s.frame_index,
            s.step_duration(Step::Update),
            s.step_duration(Step::PreRender),
            s.step_duration(Step::Render),
            s.total_tasks(),
            s.passes,
        );
    }

    fn on_projection_changes(&mut self, frame_index: u64, changes: &[ProjectionChange]) {
        let _ = writeln!(
            self.writer,
            "[changes] frame={frame_index} count={}",
            changes.len(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_print_frame_begin() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_frame_begin(&FrameBeginEvent {
            frame_index: 1,
            timestamp: 16.0,
            delta: 16.0,
            is_sync: false,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("[frame]"), "got: {output}");
        assert!(output.contains("frame=1"), "got: {output}");
    }

    #[test]
    fn pretty_print_summary() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_frame_summary(&FrameSummary {
            frame_index: 3,
            timestamp: 48.0,
            delta: 16.0,
            is_sync: true,
            step_ms: [0.0, 0.0, 0.5, 0.25, 1.0, 0.0],
            step_tasks: [0, 0, 1, 1, 2, 0],
            passes: 4,
            requested_frame: false,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("tasks=4"), "got: {output}");
        assert!(output.contains("next=idle"), "got: {output}");
    }
}

// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Driving the task queues.

use crate::frameloop::{FrameData, Step};
use crate::host::ProjectionHost;
use crate::node::NodeId;
use crate::trace::{FrameBeginEvent, FrameSummaryBuilder, StepBeginEvent, StepEndEvent, Tracer};

use super::ProjectionTree;

/// Work queued on the frame or microtask batcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FrameTask {
    /// The root update: measure, diff, animate.
    RootUpdate,
    /// The four projection passes.
    UpdateProjection,
    /// Create the pending layout animation of a node.
    StartAnimation(NodeId),
    /// Advance the running layout animation of a node.
    Animate(NodeId),
    /// Write the styles of a node to the host.
    Render(NodeId),
    /// Finish or abandon the update an unmount took part in.
    CheckAfterUnmount {
        /// Whether the unmounted node was layout-dirty.
        layout_dirty: bool,
    },
    /// Report the exit of a node that nobody took over from.
    CheckExit(NodeId),
}

/// Steps flushed by a synchronous update.
const SYNC_STEPS: [Step; 3] = [Step::Update, Step::PreRender, Step::Render];

impl ProjectionTree {
    /// Processes one display frame at `timestamp` milliseconds, then drains
    /// the microtask queue.
    ///
    /// Returns whether another frame is needed.
    pub fn process_frame(&mut self, host: &mut dyn ProjectionHost, timestamp: f64) -> bool {
        self.process_frame_traced(host, timestamp, &mut Tracer::none())
    }

    /// Like [`process_frame`](Self::process_frame), reporting to `tracer`.
    pub fn process_frame_traced(
        &mut self,
        host: &mut dyn ProjectionHost,
        timestamp: f64,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        let data = self.frame.begin_frame(timestamp);
        let summarizing = self.begin_summary(data, false, tracer);
        for step in Step::ALL {
            self.run_step(host, step, tracer);
        }
        let requested = self.frame.end_frame();
        self.end_summary(summarizing, requested, tracer);

        self.flush_microtasks_traced(host, tracer);
        requested || self.frame.needs_frame()
    }

    /// Returns whether work is waiting for the next frame.
    #[inline]
    #[must_use]
    pub fn needs_frame(&self) -> bool {
        self.frame.needs_frame()
    }

    /// Runs every queued microtask, including ones queued while flushing.
    pub fn flush_microtasks(&mut self, host: &mut dyn ProjectionHost) {
        self.flush_microtasks_traced(host, &mut Tracer::none());
    }

    /// Like [`flush_microtasks`](Self::flush_microtasks), reporting any
    /// synchronous flush to `tracer`.
    pub fn flush_microtasks_traced(&mut self, host: &mut dyn ProjectionHost, tracer: &mut Tracer<'_>) {
        while self.microtasks.step(Step::Read).pending() > 0 {
            if !self.microtasks.begin_step(Step::Read) {
                return;
            }
            while let Some(task) = self.microtasks.next_task(Step::Read) {
                self.run_task(host, task, tracer);
            }
            let _ = self.microtasks.end_step(Step::Read);
        }
    }

    /// Flushes the update, pre-render and render steps outside the frame
    /// loop, timestamped with the host clock.
    pub(super) fn flush_sync(&mut self, host: &mut dyn ProjectionHost, tracer: &mut Tracer<'_>) {
        let data = self.frame.begin_sync(host.now());
        let summarizing = self.begin_summary(data, true, tracer);
        for step in SYNC_STEPS {
            self.run_step(host, step, tracer);
        }
        self.frame.end_sync();
        let requested = self.frame.needs_frame();
        self.end_summary(summarizing, requested, tracer);
    }

    fn run_step(&mut self, host: &mut dyn ProjectionHost, step: Step, tracer: &mut Tracer<'_>) {
        loop {
            if !self.frame.begin_step(step) {
                return;
            }
            let start = if tracer.is_active() { host.now() } else { 0.0 };
            tracer.step_begin(&StepBeginEvent {
                frame_index: self.frame_index,
                step,
                timestamp: start,
            });
            if let Some(summary) = &mut self.summary {
                summary.step_begin(step, start);
            }

            let mut tasks = 0_u32;
            while let Some(task) = self.frame.next_task(step) {
                self.run_task(host, task, tracer);
                tasks = tasks.saturating_add(1);
            }
            let rerun = self.frame.end_step(step);

            let end = if tracer.is_active() { host.now() } else { 0.0 };
            tracer.step_end(&StepEndEvent {
                frame_index: self.frame_index,
                step,
                timestamp: end,
                tasks,
            });
            if let Some(summary) = &mut self.summary {
                summary.step_end(step, end, tasks);
            }
            if !rerun {
                return;
            }
        }
    }

    fn run_task(&mut self, host: &mut dyn ProjectionHost, task: FrameTask, tracer: &mut Tracer<'_>) {
        match task {
            FrameTask::RootUpdate => self.update_traced(host, tracer),
            FrameTask::UpdateProjection => self.update_projection(tracer),
            FrameTask::StartAnimation(id) => self.start_pending_animation(id),
            FrameTask::Animate(id) => self.tick_animation(id),
            FrameTask::Render(id) => self.render(host, id),
            FrameTask::CheckAfterUnmount { layout_dirty } => {
                if layout_dirty {
                    self.did_update();
                } else {
                    self.check_update_failed();
                }
            }
            FrameTask::CheckExit(id) => self.check_exit(id),
        }
    }

    // -----------------------------------------------------------------------
    // Frame summaries
    // -----------------------------------------------------------------------

    /// Starts a frame. Returns whether this frame owns the summary being
    /// built.
    fn begin_summary(&mut self, data: FrameData, is_sync: bool, tracer: &mut Tracer<'_>) -> bool {
        self.frame_index += 1;
        let event = FrameBeginEvent {
            frame_index: self.frame_index,
            timestamp: data.timestamp,
            delta: data.delta,
            is_sync,
        };
        tracer.frame_begin(&event);
        if !tracer.is_active() || self.summary.is_some() {
            return false;
        }
        self.summary = Some(FrameSummaryBuilder::new(&event));
        true
    }

    fn end_summary(&mut self, summarizing: bool, requested: bool, tracer: &mut Tracer<'_>) {
        #[cfg(feature = "trace-rich")]
        if !self.changes.is_empty() {
            tracer.projection_changes(self.frame_index, &self.changes);
            self.changes.clear();
        }
        if !summarizing {
            return;
        }
        if let Some(mut summary) = self.summary.take() {
            summary.set_requested_frame(requested);
            tracer.frame_summary(&summary.finish());
        }
    }
}

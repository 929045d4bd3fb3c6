// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Projection changes ([`on_projection_changes`](TraceSink::on_projection_changes))
//! store only the count.

use parallax_core::frameloop::Step;
use parallax_core::trace::{
    FrameBeginEvent, FrameSummary, PassEvent, PassKind, ProjectionChange, StepBeginEvent,
    StepEndEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_FRAME_BEGIN: u8 = 1;
const TAG_STEP_BEGIN: u8 = 2;
const TAG_STEP_END: u8 = 3;
const TAG_PASS: u8 = 4;
const TAG_FRAME_SUMMARY: u8 = 5;
const TAG_PROJECTION_CHANGES_COUNT: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_step(&mut self, step: Step) {
        self.write_u8(step_code(step));
    }
}

fn step_code(step: Step) -> u8 {
    match step {
        Step::Read => 0,
        Step::ResolveKeyframes => 1,
        Step::Update => 2,
        Step::PreRender => 3,
        Step::Render => 4,
        Step::PostRender => 5,
    }
}

fn pass_code(pass: PassKind) -> u8 {
    match pass {
        PassKind::PropagateDirty => 0,
        PassKind::ResolveTargets => 1,
        PassKind::CalcProjection => 2,
        PassKind::CleanDirty => 3,
    }
}

impl TraceSink for RecorderSink {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.write_u8(TAG_FRAME_BEGIN);
        self.write_u64(e.frame_index);
        self.write_f64(e.timestamp);
        self.write_f64(e.delta);
        self.write_bool(e.is_sync);
    }

    fn on_step_begin(&mut self, e: &StepBeginEvent) {
        self.write_u8(TAG_STEP_BEGIN);
        self.write_u64(e.frame_index);
        self.write_step(e.step);
        self.write_f64(e.timestamp);
    }

    fn on_step_end(&mut self, e: &StepEndEvent) {
        self.write_u8(TAG_STEP_END);
        self.write_u64(e.frame_index);
        self.write_step(e.step);
        self.write_f64(e.timestamp);
        self.write_u32(e.tasks);
    }

    fn on_pass(&mut self, e: &PassEvent) {
        self.write_u8(TAG_PASS);
        self.write_u64(e.frame_index);
        self.write_u8(pass_code(e.pass));
        self.write_u32(e.nodes);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.write_u8(TAG_FRAME_SUMMARY);
        self.write_u64(s.frame_index);
        self.write_f64(s.timestamp);
        self.write_f64(s.delta);
        self.write_bool(s.is_sync);
        for ms in s.step_ms {
            self.write_f64(ms);
        }
        for tasks in s.step_tasks {
            self.write_u32(tasks);
        }
        self.write_u32(s.passes);
        self.write_bool(s.requested_frame);
    }

    fn on_projection_changes(&mut self, frame_index: u64, changes: &[ProjectionChange]) {
        self.write_u8(TAG_PROJECTION_CHANGES_COUNT);
        self.write_u64(frame_index);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "projection change count capped at u32::MAX for recording"
        )]
        self.write_u32(changes.len().min(u32::MAX as usize) as u32);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`FrameBeginEvent`].
    FrameBegin(FrameBeginEvent),
    /// A [`StepBeginEvent`].
    StepBegin(StepBeginEvent),
    /// A [`StepEndEvent`].
    StepEnd(StepEndEvent),
    /// A [`PassEvent`].
    Pass(PassEvent),
    /// A [`FrameSummary`].
    FrameSummary(FrameSummary),
    /// Projection-change count for a frame.
    ProjectionChangesCount {
        /// Frame counter.
        frame_index: u64,
        /// Number of projection changes.
        count: u32,
    },
}

/// Replays the bytes of a [`RecorderSink`].
///
/// Decoding stops at the first unknown tag or truncated record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator returned by [`decode`].
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.read_array::<1>().map(|[v]| v)
    }

    fn read_bool(&mut self) -> Option<bool> {
        self.read_u8().map(|v| v != 0)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.read_array().map(f64::from_le_bytes)
    }

    fn read_step(&mut self) -> Option<Step> {
        Some(match self.read_u8()? {
            0 => Step::Read,
            1 => Step::ResolveKeyframes,
            2 => Step::Update,
            3 => Step::PreRender,
            4 => Step::Render,
            _ => Step::PostRender,
        })
    }

    fn read_pass(&mut self) -> Option<PassKind> {
        Some(match self.read_u8()? {
            0 => PassKind::PropagateDirty,
            1 => PassKind::ResolveTargets,
            2 => PassKind::CalcProjection,
            _ => PassKind::CleanDirty,
        })
    }

    fn decode_frame_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameBegin(FrameBeginEvent {
            frame_index: self.read_u64()?,
            timestamp: self.read_f64()?,
            delta: self.read_f64()?,
            is_sync: self.read_bool()?,
        }))
    }

    fn decode_step_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::StepBegin(StepBeginEvent {
            frame_index: self.read_u64()?,
            step: self.read_step()?,
            timestamp: self.read_f64()?,
        }))
    }

    fn decode_step_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::StepEnd(StepEndEvent {
            frame_index: self.read_u64()?,
            step: self.read_step()?,
            timestamp: self.read_f64()?,
            tasks: self.read_u32()?,
        }))
    }

    fn decode_pass(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Pass(PassEvent {
            frame_index: self.read_u64()?,
            pass: self.read_pass()?,
            nodes: self.read_u32()?,
        }))
    }

    fn decode_frame_summary(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let timestamp = self.read_f64()?;
        let delta = self.read_f64()?;
        let is_sync = self.read_bool()?;
        let mut step_ms = [0.0; 6];
        for ms in &mut step_ms {
            *ms = self.read_f64()?;
        }
        let mut step_tasks = [0; 6];
        for tasks in &mut step_tasks {
            *tasks = self.read_u32()?;
        }
        Some(RecordedEvent::FrameSummary(FrameSummary {
            frame_index,
            timestamp,
            delta,
            is_sync,
            step_ms,
            step_tasks,
            passes: self.read_u32()?,
            requested_frame: self.read_bool()?,
        }))
    }

    fn decode_projection_changes_count(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let count = self.read_u32()?;
        Some(RecordedEvent::ProjectionChangesCount { frame_index, count })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_FRAME_BEGIN => self.decode_frame_begin(),
            TAG_STEP_BEGIN => self.decode_step_begin(),
            TAG_STEP_END => self.decode_step_end(),
            TAG_PASS => self.decode_pass(),
            TAG_FRAME_SUMMARY => self.decode_frame_summary(),
            TAG_PROJECTION_CHANGES_COUNT => self.decode_projection_changes_count(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use parallax_core::trace::ProjectionField;

    fn replay(rec: &RecorderSink) -> Vec<RecordedEvent> {
        decode(rec.as_bytes()).collect()
    }

    fn sample_summary() -> FrameSummary {
        FrameSummary {
            frame_index: 7,
            timestamp: 116.0,
            delta: 16.0,
            is_sync: false,
            step_ms: [0.0, 0.0, 0.25, 0.5, 1.0, 0.0],
            step_tasks: [0, 0, 2, 1, 3, 0],
            passes: 4,
            requested_frame: true,
        }
    }

    #[test]
    fn frame_summary_survives_recording() {
        let mut rec = RecorderSink::new();
        let orig = sample_summary();
        rec.on_frame_summary(&orig);

        let events = replay(&rec);
        assert_eq!(events.len(), 1, "one record");
        match &events[0] {
            RecordedEvent::FrameSummary(s) => assert_eq!(*s, orig, "summary"),
            other => panic!("expected FrameSummary, got {other:?}"),
        }
    }

    #[test]
    fn step_events_keep_their_step() {
        let mut rec = RecorderSink::new();
        rec.on_step_begin(&StepBeginEvent {
            frame_index: 5,
            step: Step::PreRender,
            timestamp: 20.0,
        });
        rec.on_step_end(&StepEndEvent {
            frame_index: 5,
            step: Step::PreRender,
            timestamp: 21.5,
            tasks: 1,
        });

        let events = replay(&rec);
        assert_eq!(events.len(), 2, "two records");
        match &events[0] {
            RecordedEvent::StepBegin(e) => {
                assert_eq!(e.step, Step::PreRender, "begin step");
                assert_eq!(e.timestamp, 20.0, "begin time");
            }
            other => panic!("expected StepBegin, got {other:?}"),
        }
        match &events[1] {
            RecordedEvent::StepEnd(e) => {
                assert_eq!(e.step, Step::PreRender, "end step");
                assert_eq!(e.tasks, 1, "task count");
            }
            other => panic!("expected StepEnd, got {other:?}"),
        }
    }

    #[test]
    fn mixed_events_decode_in_order() {
        let mut rec = RecorderSink::new();
        rec.on_frame_begin(&FrameBeginEvent {
            frame_index: 1,
            timestamp: 16.0,
            delta: 16.0,
            is_sync: true,
        });
        for pass in PassKind::ALL {
            rec.on_pass(&PassEvent {
                frame_index: 1,
                pass,
                nodes: 3,
            });
        }
        rec.on_frame_summary(&sample_summary());

        let events = replay(&rec);
        assert_eq!(events.len(), 6, "every record decoded");
        assert!(
            matches!(events[0], RecordedEvent::FrameBegin(e) if e.is_sync),
            "frame begin first"
        );
        assert!(
            matches!(events[4], RecordedEvent::Pass(e) if e.pass == PassKind::CleanDirty),
            "passes in order"
        );
        assert!(
            matches!(events[5], RecordedEvent::FrameSummary(_)),
            "summary last"
        );
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_frame_summary(&sample_summary());
        let bytes = rec.into_bytes();

        let events: Vec<_> = decode(&bytes[..bytes.len() - 1]).collect();
        assert!(events.is_empty(), "partial record is dropped");
    }

    #[test]
    fn fresh_recorder_replays_nothing() {
        assert!(replay(&RecorderSink::new()).is_empty(), "nothing recorded");
    }

    #[test]
    fn projection_changes_count() {
        let mut rec = RecorderSink::new();
        let changes = vec![
            ProjectionChange {
                node_index: 0,
                field: ProjectionField::Delta,
            },
            ProjectionChange {
                node_index: 1,
                field: ProjectionField::Styles,
            },
        ];
        rec.on_projection_changes(42, &changes);

        let events = replay(&rec);
        assert_eq!(events.len(), 1, "one record");
        match &events[0] {
            RecordedEvent::ProjectionChangesCount { frame_index, count } => {
                assert_eq!(*frame_index, 42, "frame");
                assert_eq!(*count, 2, "count");
            }
            other => panic!("expected ProjectionChangesCount, got {other:?}"),
        }
    }
}

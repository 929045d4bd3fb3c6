// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::pretty::{pass_name, step_name};
use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Steps become duration slices; frames, passes and summaries become
/// instant events. Synchronous flushes are placed on their own thread row.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut tid = 0;
    let mut last_ts = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::FrameBegin(e) => {
                tid = u8::from(e.is_sync);
                last_ts = e.timestamp;
                events.push(json!({
                    "ph": "i",
                    "name": if e.is_sync { "SyncFlush" } else { "Frame" },
                    "cat": "Frame",
                    "ts": ms_to_us(e.timestamp),
                    "pid": 0,
                    "tid": tid,
                    "s": "g",
                    "args": {
                        "frame_index": e.frame_index,
                        "delta_ms": e.delta,
                    }
                }));
            }
            RecordedEvent::StepBegin(e) => {
                last_ts = e.timestamp;
                events.push(json!({
                    "ph": "B",
                    "name": step_name(e.step),
                    "cat": "Step",
                    "ts": ms_to_us(e.timestamp),
                    "pid": 0,
                    "tid": tid,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::StepEnd(e) => {
                last_ts = e.timestamp;
                events.push(json!({
                    "ph": "E",
                    "name": step_name(e.step),
                    "cat": "Step",
                    "ts": ms_to_us(e.timestamp),
                    "pid": 0,
                    "tid": tid,
                    "args": {
                        "frame_index": e.frame_index,
                        "tasks": e.tasks,
                    }
                }));
            }
            RecordedEvent::Pass(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": pass_name(e.pass),
                    "cat": "Projection",
                    "ts": ms_to_us(last_ts),
                    "pid": 0,
                    "tid": tid,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "nodes": e.nodes,
                    }
                }));
            }
            RecordedEvent::FrameSummary(s) => {
                events.push(json!({
                    "ph": "i",
                    "name": "FrameSummary",
                    "cat": "Summary",
                    "ts": ms_to_us(s.timestamp),
                    "pid": 0,
                    "tid": u8::from(s.is_sync),
                    "s": "g",
                    "args": {
                        "frame_index": s.frame_index,
                        "step_ms": s.step_ms,
                        "step_tasks": s.step_tasks,
                        "passes": s.passes,
                        "requested_frame": s.requested_frame,
                    }
                }));
            }
            RecordedEvent::ProjectionChangesCount { frame_index, count } => {
                events.push(json!({
                    "ph": "i",
                    "name": "ProjectionChanges",
                    "cat": "Rich",
                    "ts": ms_to_us(last_ts),
                    "pid": 0,
                    "tid": tid,
                    "s": "p",
                    "args": {
                        "frame_index": frame_index,
                        "count": count,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn ms_to_us(ms: f64) -> f64 {
    ms * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use parallax_core::frameloop::Step;
    use parallax_core::trace::{FrameBeginEvent, StepBeginEvent, StepEndEvent, TraceSink};

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_frame_begin(&FrameBeginEvent {
            frame_index: 0,
            timestamp: 16.0,
            delta: 16.0,
            is_sync: false,
        });
        rec.on_step_begin(&StepBeginEvent {
            frame_index: 0,
            step: Step::Update,
            timestamp: 16.0,
        });
        rec.on_step_end(&StepEndEvent {
            frame_index: 0,
            step: Step::Update,
            timestamp: 16.5,
            tasks: 2,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 3, "one event per record");

        assert_eq!(parsed[0]["ph"], "i", "frame is an instant");
        assert_eq!(parsed[0]["name"], "Frame");

        assert_eq!(parsed[1]["ph"], "B", "step opens a slice");
        assert_eq!(parsed[1]["name"], "update");

        assert_eq!(parsed[2]["ph"], "E", "step closes the slice");
        assert_eq!(parsed[2]["ts"], 16_500.0);
    }

    #[test]
    fn sync_flushes_get_their_own_row() {
        let mut rec = RecorderSink::new();
        rec.on_frame_begin(&FrameBeginEvent {
            frame_index: 4,
            timestamp: 0.0,
            delta: 16.0,
            is_sync: true,
        });
        rec.on_step_begin(&StepBeginEvent {
            frame_index: 4,
            step: Step::Render,
            timestamp: 0.0,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed[0]["name"], "SyncFlush");
        assert_eq!(parsed[1]["tid"], 1, "step follows its flush");
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty(), "no events");
    }
}

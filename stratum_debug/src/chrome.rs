// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format export.
//!
//! [`ChromeTraceSink`] implements [`TraceSink`] and collects events as
//! [Chrome Trace Event Format][format] objects. [`ChromeTraceSink::write`]
//! emits them as a JSON array, suitable for loading into `chrome://tracing`
//! or [Perfetto](https://ui.perfetto.dev/).
//!
//! Frame phases become duration events on thread 0; per-target phases use
//! the target id as the thread id.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use kurbo::Rect;
use serde_json::{Value, json};

use stratum_core::time::{HostTime, Timebase};
use stratum_core::trace::{
    BatchAppliedEvent, FrameBeginEvent, FrameSummary, PhaseBeginEvent, PhaseEndEvent, TraceSink,
};
use stratum_core::visual::TargetId;

/// Collects trace events as Chrome Trace Event Format JSON.
#[derive(Debug)]
pub struct ChromeTraceSink {
    events: Vec<Value>,
    timebase: Timebase,
}

impl ChromeTraceSink {
    /// Creates an empty sink converting ticks with `timebase`.
    #[must_use]
    pub fn new(timebase: Timebase) -> Self {
        Self {
            events: Vec::new(),
            timebase,
        }
    }

    /// The collected events.
    #[must_use]
    pub fn events(&self) -> &[Value] {
        &self.events
    }

    /// Writes the collected events as a pretty-printed JSON array.
    pub fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(writer, &self.events)?;
        Ok(())
    }

    fn us(&self, t: HostTime) -> f64 {
        ticks_to_us(t.ticks(), self.timebase)
    }
}

fn tid(target: Option<TargetId>) -> u64 {
    target.map_or(0, |t| t.0)
}

impl TraceSink for ChromeTraceSink {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.events.push(json!({
            "ph": "i",
            "name": "FrameBegin",
            "cat": "Frame",
            "ts": self.us(e.now),
            "pid": 0,
            "tid": 0,
            "s": "g",
            "args": {
                "frame_index": e.frame_index,
            }
        }));
    }

    fn on_batch_applied(&mut self, e: &BatchAppliedEvent) {
        self.events.push(json!({
            "ph": "i",
            "name": "BatchApplied",
            "cat": "Batch",
            "ts": self.us(e.committed_at),
            "pid": 0,
            "tid": 0,
            "s": "t",
            "args": {
                "frame_index": e.frame_index,
                "sequence_id": e.sequence_id.0,
                "records": e.records,
            }
        }));
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.events.push(json!({
            "ph": "B",
            "name": format!("{:?}", e.phase),
            "cat": "Frame",
            "ts": self.us(e.timestamp),
            "pid": 0,
            "tid": tid(e.target),
            "args": {
                "frame_index": e.frame_index,
            }
        }));
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.events.push(json!({
            "ph": "E",
            "name": format!("{:?}", e.phase),
            "cat": "Frame",
            "ts": self.us(e.timestamp),
            "pid": 0,
            "tid": tid(e.target),
            "args": {
                "frame_index": e.frame_index,
            }
        }));
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.events.push(json!({
            "ph": "i",
            "name": "FrameSummary",
            "cat": "Summary",
            "ts": self.us(s.now),
            "pid": 0,
            "tid": 0,
            "s": "g",
            "args": {
                "frame_index": s.frame_index,
                "batches_applied": s.batches_applied,
                "visuals_updated": s.visuals_updated,
                "dirty_rects": s.dirty_rects,
                "apply_us": ticks_to_us(s.apply_ticks, self.timebase),
                "update_us": ticks_to_us(s.update_ticks, self.timebase),
                "render_us": ticks_to_us(s.render_ticks, self.timebase),
            }
        }));
    }

    fn on_dirty_rects(&mut self, frame_index: u64, target: TargetId, rects: &[Rect]) {
        let rects: Vec<Value> = rects
            .iter()
            .map(|r| json!([r.x0, r.y0, r.x1, r.y1]))
            .collect();
        self.events.push(json!({
            "ph": "i",
            "name": "DirtyRects",
            "cat": "Rich",
            "ts": 0,
            "pid": 0,
            "tid": target.0,
            "s": "t",
            "args": {
                "frame_index": frame_index,
                "rects": rects,
            }
        }));
    }
}

fn ticks_to_us(ticks: u64, timebase: Timebase) -> f64 {
    timebase.ticks_to_nanos(ticks) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_core::trace::PhaseKind;

    #[test]
    fn write_produces_valid_json() {
        let mut sink = ChromeTraceSink::new(Timebase::NANOS);
        sink.on_frame_begin(&FrameBeginEvent {
            frame_index: 0,
            now: HostTime(1_000_000),
        });
        sink.on_phase_begin(&PhaseBeginEvent {
            frame_index: 0,
            phase: PhaseKind::Update,
            target: Some(TargetId(3)),
            timestamp: HostTime(1_000_000),
        });
        sink.on_phase_end(&PhaseEndEvent {
            frame_index: 0,
            phase: PhaseKind::Update,
            target: Some(TargetId(3)),
            timestamp: HostTime(1_000_100),
        });

        let mut out = Vec::new();
        sink.write(&mut out).expect("write to vec");
        let json_str = String::from_utf8(out).expect("utf-8 json");

        let parsed: Vec<Value> = serde_json::from_str(&json_str).expect("valid json");
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0]["ph"], "i");
        assert_eq!(parsed[0]["name"], "FrameBegin");
        assert_eq!(parsed[0]["ts"], 1000.0);
        assert_eq!(parsed[1]["ph"], "B");
        assert_eq!(parsed[1]["name"], "Update");
        assert_eq!(parsed[1]["tid"], 3);
        assert_eq!(parsed[2]["ph"], "E");
        assert_eq!(parsed[2]["ts"], 1000.1);
    }

    #[test]
    fn dirty_rects_carry_coordinates() {
        let mut sink = ChromeTraceSink::new(Timebase::NANOS);
        sink.on_dirty_rects(5, TargetId(1), &[Rect::new(10.0, 10.0, 60.0, 60.0)]);
        let event = &sink.events()[0];
        assert_eq!(event["args"]["rects"], json!([[10.0, 10.0, 60.0, 60.0]]));
    }

    #[test]
    fn empty_sink_writes_empty_array() {
        let mut out = Vec::new();
        ChromeTraceSink::new(Timebase::NANOS)
            .write(&mut out)
            .expect("write to vec");
        let parsed: Vec<Value> = serde_json::from_str(&String::from_utf8(out).expect("utf-8 json"))
                .expect("valid json");
        assert!(parsed.is_empty());
    }
}

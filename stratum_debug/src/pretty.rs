// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are converted to microseconds using a [`Timebase`].

use std::io::Write;

use kurbo::Rect;

use stratum_core::time::{HostTime, Timebase};
use stratum_core::trace::{
    BatchAppliedEvent, FrameBeginEvent, FrameSummary, PhaseBeginEvent, PhaseEndEvent, TraceSink,
};
use stratum_core::visual::TargetId;

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            timebase,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }

    /// Consumes the sink and returns its writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn ticks_to_us(&self, ticks: u64) -> f64 {
        self.timebase.ticks_to_nanos(ticks) as f64 / 1000.0
    }

    fn host_us(&self, t: HostTime) -> f64 {
        self.ticks_to_us(t.ticks())
    }
}

fn target_label(target: Option<TargetId>) -> String {
    target.map_or_else(String::new, |t| format!(" target={}", t.0))
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[frame] frame={} now={:.1}µs",
            e.frame_index,
            self.host_us(e.now),
        );
    }

    fn on_batch_applied(&mut self, e: &BatchAppliedEvent) {
        let _ = writeln!(
            self.writer,
            "[batch] frame={} seq={} records={} committed={:.1}µs",
            e.frame_index,
            e.sequence_id.0,
            e.records,
            self.host_us(e.committed_at),
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {}{} at {:.1}µs",
            e.frame_index,
            e.phase.name(),
            target_label(e.target),
            self.host_us(e.timestamp),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {}{} at {:.1}µs",
            e.frame_index,
            e.phase.name(),
            target_label(e.target),
            self.host_us(e.timestamp),
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] frame={} batches={} visuals={} dirty={} apply={:.1}µs \
             update={:.1}µs render={:.1}µs",
            s.frame_index,
            s.batches_applied,
            s.visuals_updated,
            s.dirty_rects,
            self.ticks_to_us(s.apply_ticks),
            self.ticks_to_us(s.update_ticks),
            self.ticks_to_us(s.render_ticks),
        );
    }

    fn on_dirty_rects(&mut self, frame_index: u64, target: TargetId, rects: &[Rect]) {
        let _ = writeln!(
            self.writer,
            "[dirty] frame={frame_index} target={} rects={}",
            target.0,
            rects.len(),
        );
    }
}

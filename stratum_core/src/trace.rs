// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the compositor frame.
//!
//! A frame runs three phases: apply the pending change batches, update every
//! target's visual tree, render. [`TraceSink`] has one method per event with
//! a no-op default body, so sinks only override what they care about.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. With the `trace`
//! feature **off** every `Tracer` method compiles to nothing; with it **on**
//! each method is a single `Option` branch.
//!
//! [`FrameSummaryBuilder`] collects phase timestamps and counters during a
//! frame and produces a [`FrameSummary`] at the end.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies.
//! - `trace-rich` (implies `trace`) gates the per-target dirty rectangle
//!   event.

use crate::batch::SequenceId;
use crate::time::HostTime;
use crate::visual::TargetId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of the frame is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Deserializing pending change batches into the visual tree.
    Apply,
    /// Recomputing transforms, visibility and dirty rectangles.
    Update,
    /// Walking the tree and issuing draw calls.
    Render,
}

impl PhaseKind {
    /// Short lowercase name, used by text and JSON sinks.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Apply => "apply",
            Self::Update => "update",
            Self::Render => "render",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Apply => 0,
            Self::Update => 1,
            Self::Render => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when the compositor starts a frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameBeginEvent {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// Server clock for this frame; animations evaluate against it.
    pub now: HostTime,
}

/// Emitted after one change batch has been applied.
#[derive(Clone, Copy, Debug)]
pub struct BatchAppliedEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Sequence id of the batch.
    pub sequence_id: SequenceId,
    /// Client time the batch was committed at.
    pub committed_at: HostTime,
    /// Number of object records in the batch.
    pub records: u32,
}

/// Marks the beginning of a frame phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Target being processed, for per-target phases.
    pub target: Option<TargetId>,
    /// Host time at the start of the phase.
    pub timestamp: HostTime,
}

/// Marks the end of a frame phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Target being processed, for per-target phases.
    pub target: Option<TargetId>,
    /// Host time at the end of the phase.
    pub timestamp: HostTime,
}

/// Per-frame summary produced by [`FrameSummaryBuilder`].
#[derive(Clone, Copy, Debug)]
pub struct FrameSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Server clock for the frame.
    pub now: HostTime,
    /// Number of batches applied.
    pub batches_applied: u32,
    /// Number of visuals visited by the update pass.
    pub visuals_updated: u32,
    /// Number of dirty rectangles drained across all targets.
    pub dirty_rects: u32,
    /// Apply phase duration in ticks (0 if not measured).
    pub apply_ticks: u64,
    /// Update phase duration in ticks (0 if not measured).
    pub update_ticks: u64,
    /// Render phase duration in ticks (0 if not measured).
    pub render_ticks: u64,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the compositor.
///
/// All methods have default no-op implementations.
pub trait TraceSink {
    /// Called when a frame starts.
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        _ = e;
    }

    /// Called after each applied batch.
    fn on_batch_applied(&mut self, e: &BatchAppliedEvent) {
        _ = e;
    }

    /// Called at the beginning of a phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called with the per-frame summary.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }

    /// Called with the dirty rectangles drained from a target (requires
    /// `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_dirty_rects(&mut self, frame_index: u64, target: TargetId, rects: &[kurbo::Rect]) {
        _ = (frame_index, target, rects);
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

    /// Emits a [`BatchAppliedEvent`].
    #[inline]
    pub fn batch_applied(&mut self, e: &BatchAppliedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_batch_applied(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
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

    /// Emits a target's drained dirty rectangles (requires `trace-rich`
    /// feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn dirty_rects(&mut self, frame_index: u64, target: TargetId, rects: &[kurbo::Rect]) {
        if let Some(s) = &mut self.sink {
            s.on_dirty_rects(frame_index, target, rects);
        }
    }
}

// ---------------------------------------------------------------------------
// FrameSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects phase timestamps and counters during a frame.
#[derive(Debug)]
pub struct FrameSummaryBuilder {
    frame_index: u64,
    now: HostTime,
    phase_starts: [Option<HostTime>; 3],
    phase_ticks: [u64; 3],
    batches_applied: u32,
    visuals_updated: u32,
    dirty_rects: u32,
}

impl FrameSummaryBuilder {
    /// Starts building a summary for the given frame.
    #[must_use]
    pub fn new(begin: &FrameBeginEvent) -> Self {
        Self {
            frame_index: begin.frame_index,
            now: begin.now,
            phase_starts: [None; 3],
            phase_ticks: [0; 3],
            batches_applied: 0,
            visuals_updated: 0,
            dirty_rects: 0,
        }
    }

    /// Records the start of a phase.
    pub fn phase_begin(&mut self, phase: PhaseKind, t: HostTime) {
        self.phase_starts[phase.index()] = Some(t);
    }

    /// Records the end of a phase.
    ///
    /// Per-target phases run several times a frame; their durations add up.
    pub fn phase_end(&mut self, phase: PhaseKind, t: HostTime) {
        if let Some(start) = self.phase_starts[phase.index()].take() {
            self.phase_ticks[phase.index()] += t.saturating_duration_since(start).ticks();
        }
    }

    /// Counts one applied batch.
    pub fn batch_applied(&mut self) {
        self.batches_applied += 1;
    }

    /// Adds to the number of visuals visited by the update pass.
    pub fn visuals_updated(&mut self, count: u32) {
        self.visuals_updated += count;
    }

    /// Adds to the number of drained dirty rectangles.
    pub fn dirty_rects(&mut self, count: u32) {
        self.dirty_rects += count;
    }

    /// Consumes the builder and produces the final [`FrameSummary`].
    #[must_use]
    pub fn finish(self) -> FrameSummary {
        FrameSummary {
            frame_index: self.frame_index,
            now: self.now,
            batches_applied: self.batches_applied,
            visuals_updated: self.visuals_updated,
            dirty_rects: self.dirty_rects,
            apply_ticks: self.phase_ticks[PhaseKind::Apply.index()],
            update_ticks: self.phase_ticks[PhaseKind::Update.index()],
            render_ticks: self.phase_ticks[PhaseKind::Render.index()],
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_begin() -> FrameBeginEvent {
        FrameBeginEvent {
            frame_index: 42,
            now: HostTime(1_000_000),
        }
    }

    #[test]
    fn noop_sink_accepts_everything() {
        let mut sink = NoopSink;
        sink.on_frame_begin(&sample_begin());
        sink.on_batch_applied(&BatchAppliedEvent {
            frame_index: 42,
            sequence_id: SequenceId(7),
            committed_at: HostTime(900),
            records: 3,
        });
        sink.on_frame_summary(&FrameSummaryBuilder::new(&sample_begin()).finish());
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.frame_begin(&sample_begin());
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index: 42,
            phase: PhaseKind::Apply,
            target: None,
            timestamp: HostTime(0),
        });
    }

    #[test]
    fn summary_builder_sums_per_target_phases() {
        let mut builder = FrameSummaryBuilder::new(&sample_begin());

        builder.phase_begin(PhaseKind::Apply, HostTime(1_000_000));
        builder.phase_end(PhaseKind::Apply, HostTime(1_000_100));
        builder.batch_applied();
        builder.batch_applied();

        // Two targets, each updated and rendered.
        builder.phase_begin(PhaseKind::Update, HostTime(1_000_100));
        builder.phase_end(PhaseKind::Update, HostTime(1_000_300));
        builder.phase_begin(PhaseKind::Update, HostTime(1_000_300));
        builder.phase_end(PhaseKind::Update, HostTime(1_000_500));
        builder.visuals_updated(10);
        builder.visuals_updated(5);
        builder.dirty_rects(2);

        builder.phase_begin(PhaseKind::Render, HostTime(1_000_500));
        builder.phase_end(PhaseKind::Render, HostTime(1_002_000));

        let summary = builder.finish();
        assert_eq!(summary.apply_ticks, 100);
        assert_eq!(summary.update_ticks, 400, "both targets' update time");
        assert_eq!(summary.render_ticks, 1500);
        assert_eq!(summary.batches_applied, 2);
        assert_eq!(summary.visuals_updated, 15);
        assert_eq!(summary.dirty_rects, 2);
        assert_eq!(summary.frame_index, 42);
    }

    #[test]
    fn summary_builder_unmatched_end_is_ignored() {
        let mut builder = FrameSummaryBuilder::new(&sample_begin());
        builder.phase_end(PhaseKind::Render, HostTime(5_000_000));
        let summary = builder.finish();
        assert_eq!(summary.render_ticks, 0, "end without begin measures nothing");
        assert_eq!(summary.apply_ticks, 0);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        struct RecordingSink {
            batches: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_batch_applied(&mut self, e: &BatchAppliedEvent) {
                self.batches.push(e.sequence_id.0);
            }
        }

        let mut sink = RecordingSink {
            batches: Vec::new(),
        };
        let mut tracer = Tracer::new(&mut sink);
        tracer.batch_applied(&BatchAppliedEvent {
            frame_index: 1,
            sequence_id: SequenceId(5),
            committed_at: HostTime(0),
            records: 1,
        });
        drop(tracer);
        assert_eq!(sink.batches, &[5]);
    }
}

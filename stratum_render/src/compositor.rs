// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame driver.

use std::collections::BTreeSet;
use std::time::Instant;

use stratum_core::batch::{Batch, BatchError};
use stratum_core::time::HostTime;
use stratum_core::trace::{
    BatchAppliedEvent, FrameBeginEvent, FrameSummary, FrameSummaryBuilder, PhaseBeginEvent,
    PhaseEndEvent, PhaseKind, Tracer,
};
use stratum_core::visual::{DEFAULT_MAX_EVAL_DEPTH, TargetId, UpdateStats, VisualStore};

use crate::context::DrawingContext;
use crate::damage::DamageRegion;
use crate::render::render_target;

/// Runtime knobs of a [`Compositor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositorOptions {
    /// Nesting limit for expression animations reading other animated
    /// properties. Deeper reads see the property's direct value.
    pub max_eval_depth: u32,
    /// Report the first frame of every target as fully damaged.
    pub full_redraw_on_first_frame: bool,
}

impl Default for CompositorOptions {
    fn default() -> Self {
        Self {
            max_eval_depth: DEFAULT_MAX_EVAL_DEPTH,
            full_redraw_on_first_frame: true,
        }
    }
}

/// Update results for one target.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetFrame {
    /// The target.
    pub target: TargetId,
    /// What must be repainted.
    pub damage: DamageRegion,
    /// What the update pass did.
    pub stats: UpdateStats,
}

/// An updated frame, ready to render.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Monotonic frame counter, starting at 1.
    pub index: u64,
    /// Clock the frame's animations were evaluated at.
    pub now: HostTime,
    /// One entry per target, in target id order.
    pub targets: Vec<TargetFrame>,
}

/// Owns the visual tree and drives it through the frame phases.
///
/// A frame is [`update`](Self::update), then [`render`](Self::render) per
/// target, then [`finish`](Self::finish). Update runs to completion for
/// every target before any rendering starts.
#[derive(Debug)]
pub struct Compositor {
    store: VisualStore,
    options: CompositorOptions,
    frame_index: u64,
    /// Targets that have been through at least one update.
    seen: BTreeSet<TargetId>,
    summary: Option<FrameSummaryBuilder>,
    epoch: Instant,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(CompositorOptions::default())
    }
}

impl Compositor {
    /// Creates a compositor with an empty visual tree.
    #[must_use]
    pub fn new(options: CompositorOptions) -> Self {
        let mut store = VisualStore::new();
        store.set_max_eval_depth(options.max_eval_depth);
        Self {
            store,
            options,
            frame_index: 0,
            seen: BTreeSet::new(),
            summary: None,
            epoch: Instant::now(),
        }
    }

    /// The visual tree.
    #[must_use]
    pub fn store(&self) -> &VisualStore {
        &self.store
    }

    /// The visual tree, mutably.
    pub fn store_mut(&mut self) -> &mut VisualStore {
        &mut self.store
    }

    /// The options the compositor was created with.
    #[must_use]
    pub fn options(&self) -> CompositorOptions {
        self.options
    }

    /// Index of the most recent frame; zero before the first.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Applies `batches`, advances animations to `now` and updates every
    /// target, draining its damage.
    ///
    /// A [`BatchError`] aborts the frame after closing the apply phase,
    /// without advancing the animation clock. The store keeps every record
    /// applied before the failing one; the caller must not feed it further
    /// batches from the same client.
    pub fn update(
        &mut self,
        now: HostTime,
        batches: &[Batch],
        tracer: &mut Tracer<'_>,
    ) -> Result<Frame, BatchError> {
        self.frame_index += 1;
        let frame_index = self.frame_index;
        let begin = FrameBeginEvent { frame_index, now };
        tracer.frame_begin(&begin);
        let mut summary = FrameSummaryBuilder::new(&begin);

        self.phase_begin(PhaseKind::Apply, None, &mut summary, tracer);
        let applied = self.apply_batches(batches, &mut summary, tracer);
        if applied.is_ok() {
            self.store.tick(now);
        }
        self.phase_end(PhaseKind::Apply, None, &mut summary, tracer);
        applied?;

        let mut targets = Vec::new();
        for id in self.store.target_ids() {
            self.phase_begin(PhaseKind::Update, Some(id), &mut summary, tracer);
            let Some(stats) = self.store.update_target(id) else {
                self.phase_end(PhaseKind::Update, Some(id), &mut summary, tracer);
                continue;
            };
            let first = self.seen.insert(id) && self.options.full_redraw_on_first_frame;
            let (rects, redraw) = self
                .store
                .target_mut(id)
                .map(|target| target.drain_damage())
                .unwrap_or_default();
            #[cfg(feature = "trace-rich")]
            tracer.dirty_rects(frame_index, id, &rects);
            summary.visuals_updated(stats.visuals);
            summary.dirty_rects(stats.dirty_rects);
            self.phase_end(PhaseKind::Update, Some(id), &mut summary, tracer);
            targets.push(TargetFrame {
                target: id,
                damage: DamageRegion::from_dirty(rects, redraw || first),
                stats,
            });
        }
        // Forget disposed targets so a recreated one counts as new.
        self.seen.retain(|id| self.store.target(*id).is_some());

        self.summary = Some(summary);
        Ok(Frame {
            index: frame_index,
            now,
            targets,
        })
    }

    /// Renders one target of the current frame, returning the number of
    /// visuals drawn.
    pub fn render(
        &mut self,
        target: &TargetFrame,
        ctx: &mut dyn DrawingContext,
        tracer: &mut Tracer<'_>,
    ) -> u32 {
        let mut summary = self.summary.take();
        if let Some(summary) = &mut summary {
            self.phase_begin(PhaseKind::Render, Some(target.target), summary, tracer);
        }
        let drawn = render_target(&self.store, target.target, &target.damage, ctx);
        if let Some(summary) = &mut summary {
            self.phase_end(PhaseKind::Render, Some(target.target), summary, tracer);
        }
        self.summary = summary;
        drawn
    }

    /// Ends the current frame, reporting its summary.
    ///
    /// Returns `None` if no frame was updated since the last call.
    pub fn finish(&mut self, tracer: &mut Tracer<'_>) -> Option<FrameSummary> {
        let summary = self.summary.take()?.finish();
        tracer.frame_summary(&summary);
        Some(summary)
    }

    fn apply_batches(
        &mut self,
        batches: &[Batch],
        summary: &mut FrameSummaryBuilder,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), BatchError> {
        for batch in batches {
            let records = self.store.apply_batch(batch)?;
            summary.batch_applied();
            tracer.batch_applied(&BatchAppliedEvent {
                frame_index: self.frame_index,
                sequence_id: batch.sequence_id,
                committed_at: batch.committed_at,
                records,
            });
        }
        Ok(())
    }

    /// Wall-clock time since the compositor was created, in nanosecond
    /// ticks.
    fn timestamp(&self) -> HostTime {
        HostTime(u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX))
    }

    fn phase_begin(
        &self,
        phase: PhaseKind,
        target: Option<TargetId>,
        summary: &mut FrameSummaryBuilder,
        tracer: &mut Tracer<'_>,
    ) {
        let timestamp = self.timestamp();
        summary.phase_begin(phase, timestamp);
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index: self.frame_index,
            phase,
            target,
            timestamp,
        });
    }

    fn phase_end(
        &self,
        phase: PhaseKind,
        target: Option<TargetId>,
        summary: &mut FrameSummaryBuilder,
        tracer: &mut Tracer<'_>,
    ) {
        let timestamp = self.timestamp();
        summary.phase_end(phase, timestamp);
        tracer.phase_end(&PhaseEndEvent {
            frame_index: self.frame_index,
            phase,
            target,
            timestamp,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingContext;
    use kurbo::{Rect, Vec2};
    use stratum_core::animation::KeyFrameAnimation;
    use stratum_core::batch::{
        BatchBuilder, BatchSender, ChildOp, TargetChanges, VisualChanges, batch_channel,
    };
    use stratum_core::expr::Variant;
    use stratum_core::time::Duration;
    use stratum_core::transform::Vector3;
    use stratum_core::visual::{Color, VisualField, VisualId, VisualKind};

    fn commit(tx: &mut BatchSender, build: impl FnOnce(&mut BatchBuilder)) {
        let mut b = BatchBuilder::new();
        build(&mut b);
        tx.commit(b, HostTime(0)).expect("channel open");
    }

    fn scene(tx: &mut BatchSender) {
        commit(tx, |b| {
            b.create_visual(VisualId(1), VisualKind::Container)
                .create_visual(VisualId(2), VisualKind::SolidColor)
                .children(VisualId(1), &[ChildOp::Add(VisualId(2))])
                .create_target(TargetId(1));
            let mut t = TargetChanges::new(TargetId(1));
            t.root = Some(Some(VisualId(1)));
            b.target_changes(&t);
            let mut c = VisualChanges::new(VisualId(2));
            c.set_value(VisualField::Offset, Vector3::new(10.0, 10.0, 0.0))
                .set_value(VisualField::Size, Vec2::new(50.0, 50.0))
                .set_value(VisualField::Color, Color::WHITE);
            b.visual_changes(c);
        });
    }

    #[test]
    fn hiding_a_child_damages_its_last_bounds_once() {
        let (mut tx, rx) = batch_channel();
        let mut compositor = Compositor::default();
        let mut tracer = Tracer::none();
        scene(&mut tx);

        let frame = compositor
            .update(HostTime(0), &rx.drain().expect("channel open"), &mut tracer)
            .expect("valid batch");
        assert_eq!(frame.index, 1);
        assert_eq!(frame.targets.len(), 1);
        assert_eq!(frame.targets[0].damage, DamageRegion::Full, "first frame");
        let mut ctx = RecordingContext::new();
        assert_eq!(compositor.render(&frame.targets[0], &mut ctx, &mut tracer), 2);
        let summary = compositor.finish(&mut tracer).expect("summary enabled");
        assert_eq!(summary.batches_applied, 1);
        assert_eq!(summary.visuals_updated, 2);

        commit(&mut tx, |b| {
            let mut c = VisualChanges::new(VisualId(2));
            c.visible = Some(false);
            b.visual_changes(c);
        });
        let frame = compositor
            .update(HostTime(16), &rx.drain().expect("channel open"), &mut tracer)
            .expect("valid batch");
        assert_eq!(
            frame.targets[0].damage,
            DamageRegion::Rects(vec![Rect::new(10.0, 10.0, 60.0, 60.0)])
        );
        let mut ctx = RecordingContext::new();
        compositor.render(&frame.targets[0], &mut ctx, &mut tracer);
        assert_eq!(ctx.draws().count(), 0);

        let frame = compositor
            .update(HostTime(32), &[], &mut tracer)
            .expect("empty frame");
        assert_eq!(frame.targets[0].damage, DamageRegion::None);
        assert!(compositor.finish(&mut tracer).is_some());
        assert!(compositor.finish(&mut tracer).is_none(), "summary is taken once");
    }

    #[test]
    fn first_frame_redraw_can_be_disabled() {
        let (mut tx, rx) = batch_channel();
        let mut compositor = Compositor::new(CompositorOptions {
            full_redraw_on_first_frame: false,
            ..CompositorOptions::default()
        });
        scene(&mut tx);
        let frame = compositor
            .update(HostTime(0), &rx.drain().expect("channel open"), &mut Tracer::none())
            .expect("valid batch");
        assert_eq!(
            frame.targets[0].damage,
            DamageRegion::Rects(vec![Rect::new(10.0, 10.0, 60.0, 60.0)])
        );
    }

    #[test]
    fn scaling_change_forces_full_redraw() {
        let (mut tx, rx) = batch_channel();
        let mut compositor = Compositor::default();
        scene(&mut tx);
        compositor
            .update(HostTime(0), &rx.drain().expect("channel open"), &mut Tracer::none())
            .expect("valid batch");
        commit(&mut tx, |b| {
            let mut t = TargetChanges::new(TargetId(1));
            t.scaling = Some(2.0);
            b.target_changes(&t);
        });
        let frame = compositor
            .update(HostTime(16), &rx.drain().expect("channel open"), &mut Tracer::none())
            .expect("valid batch");
        assert_eq!(frame.targets[0].damage, DamageRegion::Full);
        let child = compositor.store().visual(VisualId(2)).expect("live visual");
        assert_eq!(child.transformed_bounds(), Rect::new(20.0, 20.0, 120.0, 120.0));
    }

    #[test]
    fn animations_advance_with_frame_clock() {
        let (mut tx, rx) = batch_channel();
        let mut compositor = Compositor::default();
        scene(&mut tx);
        commit(&mut tx, |b| {
            let mut c = VisualChanges::new(VisualId(2));
            c.set_animation(
                VisualField::Opacity,
                Some(
                    KeyFrameAnimation::interpolation(
                        Variant::Scalar(0.0),
                        Variant::Scalar(1.0),
                        Duration(100),
                    )
                    .into(),
                ),
            );
            b.visual_changes(c);
        });
        compositor
            .update(HostTime(50), &rx.drain().expect("channel open"), &mut Tracer::none())
            .expect("valid batch");
        assert_eq!(compositor.store().running_animations(), 1);
        let child = compositor.store().visual(VisualId(2)).expect("live visual");
        assert_eq!(child.opacity(), 0.5);

        let frame = compositor
            .update(HostTime(150), &[], &mut Tracer::none())
            .expect("empty frame");
        assert_eq!(compositor.store().running_animations(), 0, "finished");
        assert_eq!(
            frame.targets[0].damage,
            DamageRegion::Rects(vec![Rect::new(10.0, 10.0, 60.0, 60.0)])
        );
    }

    #[test]
    fn batch_errors_abort_the_frame() {
        let (mut tx, rx) = batch_channel();
        let mut compositor = Compositor::default();
        commit(&mut tx, |b| {
            b.children(VisualId(9), &[ChildOp::Clear]);
        });
        assert_eq!(
            compositor.update(HostTime(0), &rx.drain().expect("channel open"), &mut Tracer::none()),
            Err(BatchError::UnknownVisual(VisualId(9)))
        );
    }

    #[cfg(feature = "trace")]
    #[test]
    fn aborted_frames_close_the_apply_phase() {
        use stratum_core::trace::TraceSink;

        #[derive(Default)]
        struct Phases(Vec<(PhaseKind, bool)>);

        impl TraceSink for Phases {
            fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
                self.0.push((e.phase, true));
            }

            fn on_phase_end(&mut self, e: &PhaseEndEvent) {
                self.0.push((e.phase, false));
            }
        }

        let (mut tx, rx) = batch_channel();
        let mut compositor = Compositor::default();
        commit(&mut tx, |b| {
            b.children(VisualId(9), &[ChildOp::Clear]);
        });
        let mut phases = Phases::default();
        let result = compositor.update(
            HostTime(0),
            &rx.drain().expect("channel open"),
            &mut Tracer::new(&mut phases),
        );
        assert!(result.is_err());
        assert_eq!(
            phases.0,
            vec![(PhaseKind::Apply, true), (PhaseKind::Apply, false)]
        );
    }
}

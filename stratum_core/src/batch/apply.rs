// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Applying decoded records to the visual store.

use super::codec::BatchReader;
use super::{Batch, BatchError, ChildOp, Record, SequenceId, TargetChanges, VisualChanges};
use crate::time::HostTime;
use crate::visual::{CompositionTarget, INVALID, TargetId, VisualField, VisualId, VisualStore};

impl VisualStore {
    /// Applies `batch`, returning the number of records it carried.
    ///
    /// Records are decoded one at a time and each is validated in full
    /// before any of it is applied, so a failing record leaves its object
    /// untouched. Records before it remain applied. Any error means the
    /// client and server disagree: stop feeding the store.
    pub fn apply_batch(&mut self, batch: &Batch) -> Result<u32, BatchError> {
        if let Some(last) = self.last_sequence
            && batch.sequence_id <= last
        {
            return Err(BatchError::OutOfOrder {
                last,
                got: batch.sequence_id,
            });
        }
        self.last_sequence = Some(batch.sequence_id);

        let mut reader = BatchReader::new(&batch.data);
        let mut records = 0;
        while let Some(record) = Record::decode_next(&mut reader, &batch.objects)? {
            self.apply_record(record, batch.sequence_id, batch.committed_at)?;
            records += 1;
        }
        Ok(records)
    }

    fn apply_record(
        &mut self,
        record: Record,
        sequence: SequenceId,
        committed_at: HostTime,
    ) -> Result<(), BatchError> {
        match record {
            Record::CreateVisual { id, kind } => {
                let slot = self.create_visual(id, kind)?;
                self.last_changed_by[slot as usize] = Some(sequence);
            }
            Record::Visual(changes) => self.apply_visual_changes(changes, sequence, committed_at)?,
            Record::Children { parent, ops } => {
                let slot = self.apply_child_ops(parent, &ops)?;
                self.last_changed_by[slot as usize] = Some(sequence);
            }
            Record::CreateTarget(id) => {
                if self.targets.contains_key(&id) {
                    return Err(BatchError::DuplicateTarget(id));
                }
                let mut target = CompositionTarget::new(id);
                target.last_changed_by = Some(sequence);
                self.targets.insert(id, target);
            }
            Record::Target(changes) => self.apply_target_changes(&changes, sequence)?,
        }
        Ok(())
    }

    fn apply_visual_changes(
        &mut self,
        mut changes: VisualChanges,
        sequence: SequenceId,
        committed_at: HostTime,
    ) -> Result<(), BatchError> {
        let slot = self.slot_of(changes.id())?;
        if let Some(Some(adorned)) = changes.adorned_visual
            && !self.contains(adorned)
        {
            return Err(BatchError::UnknownVisual(adorned));
        }

        let i = slot as usize;
        self.last_changed_by[i] = Some(sequence);
        for field in VisualField::ALL {
            if let Some(value) = changes.value(field) {
                self.set_direct(slot, field, value);
            }
            if let Some(animation) = changes.take_animation(field) {
                self.set_animation(slot, field, animation, committed_at);
            }
        }

        let mut touched = false;
        if let Some(visible) = changes.visible {
            self.flags[i].visible = visible;
            touched = true;
        }
        if let Some(clip_to_bounds) = changes.clip_to_bounds {
            self.flags[i].clip_to_bounds = clip_to_bounds;
            touched = true;
        }
        if let Some(clip) = changes.clip {
            self.clip[i] = clip;
            touched = true;
        }
        if let Some(mask) = changes.opacity_mask.take() {
            self.opacity_mask[i] = mask;
            touched = true;
        }
        if let Some(adorned) = changes.adorned_visual {
            self.adorned[i] = adorned;
            touched = true;
        }
        if let Some(draw_list) = changes.draw_list.take() {
            self.draw_list[i] = draw_list;
            touched = true;
        }
        if touched {
            self.values_invalidated(slot);
        }

        if changes.dispose {
            self.dispose_visual(slot);
        }
        Ok(())
    }

    /// Validates `ops` against a staged copy of `parent`'s child list, then
    /// relinks the children and updates target membership.
    fn apply_child_ops(&mut self, parent: VisualId, ops: &[ChildOp]) -> Result<u32, BatchError> {
        let p = self.slot_of(parent)?;
        let old: Vec<u32> = self.child_slots(p).collect();
        let mut staged = old.clone();
        for &op in ops {
            match op {
                ChildOp::Add(child) => {
                    let c = self.check_new_child(p, parent, child, &staged)?;
                    staged.push(c);
                }
                ChildOp::Insert { index, child } => {
                    let c = self.check_new_child(p, parent, child, &staged)?;
                    if index as usize > staged.len() {
                        return Err(BatchError::IndexOutOfRange { parent, index });
                    }
                    staged.insert(index as usize, c);
                }
                ChildOp::Remove(child) => {
                    let c = self.slot_of(child)?;
                    let pos = staged
                        .iter()
                        .position(|&s| s == c)
                        .ok_or(BatchError::NotAChild { parent, child })?;
                    staged.remove(pos);
                }
                ChildOp::Clear => staged.clear(),
            }
        }

        let target = self.root[p as usize];
        for &c in &old {
            self.unlink_from_parent(c);
            if !staged.contains(&c) && target.is_some() {
                self.detach_subtree(c);
            }
        }
        for (pos, &c) in staged.iter().enumerate() {
            self.link_child(p, c);
            if !old.contains(&c) {
                if let Some(target) = target {
                    self.attach_subtree(c, target);
                }
                self.values_invalidated(c);
            } else if old.get(pos) != Some(&c) {
                // Paint order changed.
                self.values_invalidated(c);
            }
        }
        Ok(p)
    }

    fn check_new_child(
        &self,
        p: u32,
        parent: VisualId,
        child: VisualId,
        staged: &[u32],
    ) -> Result<u32, BatchError> {
        let c = self.slot_of(child)?;
        if self.is_self_or_ancestor(c, p) {
            return Err(BatchError::Cycle { parent, child });
        }
        let current_parent = self.parent[c as usize];
        if staged.contains(&c) || (current_parent != INVALID && current_parent != p) {
            return Err(BatchError::AlreadyParented(child));
        }
        if current_parent == INVALID && self.root[c as usize].is_some() {
            return Err(BatchError::IsTargetRoot(child));
        }
        Ok(c)
    }

    fn apply_target_changes(
        &mut self,
        changes: &TargetChanges,
        sequence: SequenceId,
    ) -> Result<(), BatchError> {
        let id = changes.id();
        let target = self.targets.get(&id).ok_or(BatchError::UnknownTarget(id))?;
        let old_root = target.root;
        let new_root = match changes.root {
            Some(Some(root)) if Some(root) != old_root => {
                let slot = self.slot_of(root)?;
                let i = slot as usize;
                if self.parent[i] != INVALID || self.root[i].is_some() {
                    return Err(BatchError::InvalidRoot(root));
                }
                Some(Some(slot))
            }
            Some(None) if old_root.is_some() => Some(None),
            _ => None,
        };

        if let Some(new_root) = new_root {
            if let Some(old) = old_root.and_then(|r| self.slots.get(&r).copied()) {
                self.detach_subtree(old);
            }
            if let Some(slot) = new_root {
                self.attach_subtree(slot, id);
            }
            if let Some(target) = self.targets.get_mut(&id) {
                target.root = new_root.map(|slot| self.ids[slot as usize]);
            }
        }

        let Some(target) = self.targets.get_mut(&id) else {
            return Ok(());
        };
        target.last_changed_by = Some(sequence);
        if let Some(scaling) = changes.scaling
            && scaling != target.scaling
        {
            target.scaling = scaling;
            target.request_redraw();
        }
        if changes.invalidate {
            target.request_redraw();
        }
        if changes.dispose {
            if let Some(root) = target.root.take()
                && let Some(&slot) = self.slots.get(&root)
            {
                self.detach_subtree(slot);
            }
            self.targets.remove(&id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::BatchBuilder;
    use super::*;
    use crate::animation::KeyFrameAnimation;
    use crate::expr::{Variant, VariantKind};
    use crate::time::Duration;
    use crate::transform::Vector3;
    use crate::visual::{ClipShape, Color, VisualKind};
    use kurbo::{Rect, Vec2};

    fn batch(seq: u64, build: impl FnOnce(&mut BatchBuilder)) -> Batch {
        let mut b = BatchBuilder::new();
        build(&mut b);
        b.finish(SequenceId(seq), HostTime(seq * 100))
    }

    fn store_with(ids: &[u64]) -> VisualStore {
        let mut store = VisualStore::new();
        store
            .apply_batch(&batch(1, |b| {
                for &id in ids {
                    b.create_visual(VisualId(id), VisualKind::Container);
                }
            }))
            .expect("valid batch");
        store
    }

    #[test]
    fn last_changed_by_tracks_latest_batch() {
        let mut store = store_with(&[1]);
        for seq in [5, 6] {
            let applied = store.apply_batch(&batch(seq, |b| {
                let mut c = VisualChanges::new(VisualId(1));
                c.set_value(VisualField::Opacity, 0.5);
                b.visual_changes(c);
            }));
            assert_eq!(applied, Ok(1));
        }
        let v = store.visual(VisualId(1)).expect("live visual");
        assert_eq!(v.last_changed_by(), Some(SequenceId(6)));
        assert_eq!(store.last_sequence(), Some(SequenceId(6)));
    }

    #[test]
    fn applied_values_round_trip() {
        let mut store = store_with(&[1]);
        let mut c = VisualChanges::new(VisualId(1));
        c.set_value(VisualField::Offset, Vector3::new(1.0, 2.0, 3.0))
            .set_value(VisualField::Size, Vec2::new(4.0, 5.0))
            .set_value(VisualField::AnchorPoint, Vec2::new(0.5, 0.5))
            .set_value(VisualField::RotationAngle, 0.25)
            .set_value(VisualField::Opacity, 0.75)
            .set_value(VisualField::Color, Color::rgba(1.0, 0.5, 0.25, 1.0));
        c.visible = Some(false);
        c.clip_to_bounds = Some(true);
        c.clip = Some(Some(ClipShape::Rect(Rect::new(0.0, 0.0, 2.0, 2.0))));
        let expected = c.clone();
        store
            .apply_batch(&batch(2, |b| {
                b.visual_changes(c);
            }))
            .expect("valid batch");

        let v = store.visual(VisualId(1)).expect("live visual");
        for field in VisualField::ALL {
            let want = expected.value(field).unwrap_or(field.default_value());
            assert_eq!(v.value(field), want, "{field:?}");
        }
        assert!(!v.flags().visible);
        assert!(v.flags().clip_to_bounds);
        assert_eq!(v.clip(), Some(ClipShape::Rect(Rect::new(0.0, 0.0, 2.0, 2.0))));
        assert_eq!(v.last_changed_by(), Some(SequenceId(2)));
    }

    #[test]
    fn value_of_the_wrong_kind_is_rejected() {
        let mut store = store_with(&[1]);
        let mut c = VisualChanges::new(VisualId(1));
        c.set_value(VisualField::Offset, Vec2::new(10.0, 20.0));
        assert_eq!(
            store.apply_batch(&batch(2, |b| {
                b.visual_changes(c);
            })),
            Err(BatchError::ValueKindMismatch {
                field: VisualField::Offset,
                expected: VariantKind::Vector3,
                found: VariantKind::Vector2,
            })
        );
        let v = store.visual(VisualId(1)).expect("live visual");
        assert_eq!(v.offset(), Vector3::ZERO);
        assert_eq!(v.last_changed_by(), Some(SequenceId(1)));
    }

    #[test]
    fn out_of_order_batches_are_fatal() {
        let mut store = store_with(&[1]);
        assert_eq!(
            store.apply_batch(&batch(1, |_| {})),
            Err(BatchError::OutOfOrder {
                last: SequenceId(1),
                got: SequenceId(1)
            })
        );
    }

    #[test]
    fn unknown_visual_is_fatal_and_record_is_not_applied() {
        let mut store = store_with(&[1]);
        let result = store.apply_batch(&batch(2, |b| {
            let mut c = VisualChanges::new(VisualId(1));
            c.set_value(VisualField::Opacity, 0.5);
            c.adorned_visual = Some(Some(VisualId(99)));
            b.visual_changes(c);
        }));
        assert_eq!(result, Err(BatchError::UnknownVisual(VisualId(99))));
        let v = store.visual(VisualId(1)).expect("live visual");
        assert_eq!(v.opacity(), 1.0, "the failing record left the visual untouched");
        assert_eq!(v.last_changed_by(), Some(SequenceId(1)));
    }

    #[test]
    fn failing_child_ops_leave_children_untouched() {
        let mut store = store_with(&[1, 2, 3]);
        let result = store.apply_batch(&batch(2, |b| {
            b.children(
                VisualId(1),
                &[ChildOp::Add(VisualId(2)), ChildOp::Remove(VisualId(3))],
            );
        }));
        assert_eq!(
            result,
            Err(BatchError::NotAChild {
                parent: VisualId(1),
                child: VisualId(3)
            })
        );
        let parent = store.visual(VisualId(1)).expect("live visual");
        assert_eq!(parent.children().count(), 0);
        assert_eq!(store.visual(VisualId(2)).and_then(|v| v.parent()), None);
    }

    #[test]
    fn cycles_are_rejected() {
        let mut store = store_with(&[1, 2]);
        store
            .apply_batch(&batch(2, |b| {
                b.children(VisualId(1), &[ChildOp::Add(VisualId(2))]);
            }))
            .expect("valid batch");
        assert_eq!(
            store.apply_batch(&batch(3, |b| {
                b.children(VisualId(2), &[ChildOp::Add(VisualId(1))]);
            })),
            Err(BatchError::Cycle {
                parent: VisualId(2),
                child: VisualId(1)
            })
        );
        assert_eq!(
            store.apply_batch(&batch(4, |b| {
                b.children(VisualId(2), &[ChildOp::Add(VisualId(2))]);
            })),
            Err(BatchError::Cycle {
                parent: VisualId(2),
                child: VisualId(2)
            })
        );
    }

    #[test]
    fn double_parenting_is_rejected() {
        let mut store = store_with(&[1, 2, 3]);
        store
            .apply_batch(&batch(2, |b| {
                b.children(VisualId(1), &[ChildOp::Add(VisualId(3))]);
            }))
            .expect("valid batch");
        assert_eq!(
            store.apply_batch(&batch(3, |b| {
                b.children(VisualId(2), &[ChildOp::Add(VisualId(3))]);
            })),
            Err(BatchError::AlreadyParented(VisualId(3)))
        );
    }

    #[test]
    fn move_within_one_record() {
        let mut store = store_with(&[1, 2, 3]);
        store
            .apply_batch(&batch(2, |b| {
                b.children(VisualId(1), &[ChildOp::Add(VisualId(2)), ChildOp::Add(VisualId(3))]);
            }))
            .expect("valid batch");
        store
            .apply_batch(&batch(3, |b| {
                b.children(
                    VisualId(1),
                    &[
                        ChildOp::Remove(VisualId(3)),
                        ChildOp::Insert {
                            index: 0,
                            child: VisualId(3),
                        },
                    ],
                );
            }))
            .expect("valid batch");
        let order: Vec<_> = store
            .visual(VisualId(1))
            .expect("live visual")
            .children()
            .map(|c| c.id())
            .collect();
        assert_eq!(order, vec![VisualId(3), VisualId(2)]);
    }

    #[test]
    fn insert_past_end_is_rejected() {
        let mut store = store_with(&[1, 2]);
        assert_eq!(
            store.apply_batch(&batch(2, |b| {
                b.children(
                    VisualId(1),
                    &[ChildOp::Insert {
                        index: 1,
                        child: VisualId(2),
                    }],
                );
            })),
            Err(BatchError::IndexOutOfRange {
                parent: VisualId(1),
                index: 1
            })
        );
    }

    #[test]
    fn duplicate_objects_are_rejected() {
        let mut store = store_with(&[1]);
        assert_eq!(
            store.apply_batch(&batch(2, |b| {
                b.create_visual(VisualId(1), VisualKind::Container);
            })),
            Err(BatchError::DuplicateVisual(VisualId(1)))
        );
        assert_eq!(
            store.apply_batch(&batch(3, |b| {
                b.create_target(TargetId(1)).create_target(TargetId(1));
            })),
            Err(BatchError::DuplicateTarget(TargetId(1)))
        );
    }

    #[test]
    fn target_roots_must_be_free() {
        let mut store = store_with(&[1, 2]);
        store
            .apply_batch(&batch(2, |b| {
                b.create_target(TargetId(1))
                    .create_target(TargetId(2))
                    .children(VisualId(1), &[ChildOp::Add(VisualId(2))]);
            }))
            .expect("valid batch");
        let mut t = TargetChanges::new(TargetId(1));
        t.root = Some(Some(VisualId(2)));
        assert_eq!(
            store.apply_batch(&batch(3, |b| {
                b.target_changes(&t);
            })),
            Err(BatchError::InvalidRoot(VisualId(2))),
            "parented visuals cannot be roots"
        );

        t.root = Some(Some(VisualId(1)));
        store
            .apply_batch(&batch(4, |b| {
                b.target_changes(&t);
            }))
            .expect("valid batch");
        let mut other = TargetChanges::new(TargetId(2));
        other.root = Some(Some(VisualId(1)));
        assert_eq!(
            store.apply_batch(&batch(5, |b| {
                b.target_changes(&other);
            })),
            Err(BatchError::InvalidRoot(VisualId(1))),
            "a root belongs to one target"
        );
        assert_eq!(
            store.apply_batch(&batch(6, |b| {
                b.create_visual(VisualId(5), VisualKind::Container)
                    .children(VisualId(5), &[ChildOp::Add(VisualId(1))]);
            })),
            Err(BatchError::IsTargetRoot(VisualId(1)))
        );
    }

    #[test]
    fn disposing_a_target_detaches_its_tree() {
        let mut store = store_with(&[1]);
        let mut t = TargetChanges::new(TargetId(1));
        t.root = Some(Some(VisualId(1)));
        store
            .apply_batch(&batch(2, |b| {
                b.create_target(TargetId(1)).target_changes(&t);
            }))
            .expect("valid batch");
        let mut dispose = TargetChanges::new(TargetId(1));
        dispose.dispose = true;
        store
            .apply_batch(&batch(3, |b| {
                b.target_changes(&dispose);
            }))
            .expect("valid batch");
        assert!(store.target(TargetId(1)).is_none());
        let v = store.visual(VisualId(1)).expect("visual survives its target");
        assert_eq!(v.target(), None);
        assert!(!v.is_active());
    }

    #[test]
    fn animations_start_at_commit_time() {
        let mut store = store_with(&[1]);
        store
            .apply_batch(&batch(2, |b| {
                let mut c = VisualChanges::new(VisualId(1));
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
            }))
            .expect("valid batch");
        // Committed at 200.
        store.tick(HostTime(225));
        let v = store.visual(VisualId(1)).expect("live visual");
        assert_eq!(v.opacity(), 0.25);
        assert!(v.is_animated(VisualField::Opacity));
    }
}

// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame update pass.
//!
//! [`VisualStore::update_target`] walks one target's tree depth-first in
//! child order. For every visual it:
//!
//! 1. Composes the combined local transform from the animated transform
//!    properties and multiplies it onto the parent's global transform.
//! 2. If the global transform moved, recomputes the backface flag by pushing
//!    `(0, 0, +∞)` through the *previous* global transform. The test lags one
//!    move behind; a visual that flips is culled on its next move.
//! 3. Recomputes `visible_in_frame = visible && opacity > 0 && !backface`.
//! 4. Reports damage: the old bounds of a visual that moved while visible,
//!    and the new bounds of a visible visual that is dirty. Invisible
//!    visuals drop their dirty flag without reporting.
//! 5. Writes the target's current readback slot.
//!
//! Adorners are skipped during the walk and updated afterwards with the
//! adorned visual's global transform as their parent transform.

use kurbo::Rect;

use super::id::{INVALID, TargetId};
use super::store::VisualStore;
use crate::readback::ReadbackData;
use crate::transform::{Transform3d, Vector3, compose_visual_transform};

/// What one update pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateStats {
    /// Visuals visited.
    pub visuals: u32,
    /// Damage rectangles recorded on the target.
    pub dirty_rects: u32,
}

struct UpdatePass {
    target: TargetId,
    revision: u64,
    write_index: usize,
    damage: Vec<Rect>,
    /// Adorners found during the walk, with their tree parent's transform.
    adorners: Vec<(u32, Transform3d)>,
    visuals: u32,
}

impl VisualStore {
    /// Runs the update pass for target `id`, returning `None` if the target
    /// does not exist.
    ///
    /// Damage lands on the target, to be drained with
    /// [`CompositionTarget::drain_damage`](super::CompositionTarget::drain_damage);
    /// the target's revision advances and the readback slot written by the
    /// pass is published.
    pub fn update_target(&mut self, id: TargetId) -> Option<UpdateStats> {
        let target = self.targets.get(&id)?;
        let mut pass = UpdatePass {
            target: id,
            revision: target.revision + 1,
            write_index: target.writer.write_index(),
            damage: Vec::new(),
            adorners: Vec::new(),
            visuals: 0,
        };
        let scaling = target.scaling;
        if let Some(root) = target.root.and_then(|r| self.slots.get(&r).copied()) {
            self.update_visual(root, Transform3d::from_scale(scaling, scaling, 1.0), &mut pass);
            let mut next = 0;
            while let Some(&(slot, tree_parent)) = pass.adorners.get(next) {
                next += 1;
                let parent = self.adorned_parent(slot).unwrap_or(tree_parent);
                self.update_visual(slot, parent, &mut pass);
            }
        }

        let target = self.targets.get_mut(&id)?;
        let mut dirty_rects = 0;
        for rect in pass.damage {
            if target.dirty.push(rect) {
                dirty_rects += 1;
            }
        }
        target.revision = pass.revision;
        target.writer.complete_write(&target.readback, pass.revision);
        Some(UpdateStats {
            visuals: pass.visuals,
            dirty_rects,
        })
    }

    /// Global transform of the visual adorned by the adorner at `slot`.
    fn adorned_parent(&self, slot: u32) -> Option<Transform3d> {
        let adorned = self.adorned[slot as usize]?;
        let adorned = *self.slots.get(&adorned)?;
        Some(self.global_transform[adorned as usize])
    }

    fn update_visual(&mut self, slot: u32, parent: Transform3d, pass: &mut UpdatePass) {
        let i = slot as usize;
        let mut inputs = self.transform_inputs(slot);
        if self.adorned[i].is_some() {
            inputs.transform_matrix = Transform3d::IDENTITY;
        }
        let combined = compose_visual_transform(&inputs);
        let global = parent * combined;

        let old_global = self.global_transform[i];
        let position_changed = global != old_global;
        if position_changed {
            let far = old_global.transform_point3(Vector3::new(0.0, 0.0, f64::INFINITY));
            self.backface[i] = far.z <= 0.0;
        }

        let was_visible = self.visible_in_frame[i];
        let visible = self.flags[i].visible && self.opacity_at(slot) > 0.0 && !self.backface[i];
        self.visible_in_frame[i] = visible;

        if position_changed {
            if was_visible {
                pass.damage.push(self.transformed_bounds[i]);
            }
            if visible {
                self.dirty[i] = true;
            }
        }

        let local = Rect::new(0.0, 0.0, inputs.size.x, inputs.size.y);
        self.combined_transform[i] = combined;
        self.global_transform[i] = global;
        self.transformed_bounds[i] = global.transform_rect_bbox(local);

        if !visible {
            self.dirty[i] = false;
        } else if self.dirty[i] {
            pass.damage.push(self.transformed_bounds[i]);
            self.dirty[i] = false;
        }

        self.readback[i].slot(pass.write_index).write(&ReadbackData {
            matrix: combined,
            revision: pass.revision,
            target: pass.target,
            visible,
        });
        pass.visuals += 1;

        let mut child = self.first_child[i];
        while child != INVALID {
            if self.adorned[child as usize].is_some() {
                pass.adorners.push((child, global));
            } else {
                self.update_visual(child, global, pass);
            }
            child = self.next_sibling[child as usize];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::ExpressionAnimation;
    use crate::batch::{BatchBuilder, ChildOp, SequenceId, TargetChanges, VisualChanges};
    use crate::expr::parse;
    use crate::time::HostTime;
    use crate::visual::{VisualField, VisualId, VisualKind};
    use kurbo::Vec2;

    const TARGET: TargetId = TargetId(1);

    struct Scene {
        store: VisualStore,
        seq: u64,
    }

    impl Scene {
        /// Container 1 as the target root with a 50×50 child 2 at (10, 10).
        fn new() -> Self {
            let mut scene = Self {
                store: VisualStore::new(),
                seq: 0,
            };
            scene.apply(|b| {
                b.create_target(TARGET)
                    .create_visual(VisualId(1), VisualKind::Container)
                    .create_visual(VisualId(2), VisualKind::SolidColor)
                    .children(VisualId(1), &[ChildOp::Add(VisualId(2))]);
                let mut c = VisualChanges::new(VisualId(2));
                c.set_value(VisualField::Offset, Vector3::new(10.0, 10.0, 0.0))
                    .set_value(VisualField::Size, Vec2::new(50.0, 50.0));
                b.visual_changes(c);
                let mut t = TargetChanges::new(TARGET);
                t.root = Some(Some(VisualId(1)));
                b.target_changes(&t);
            });
            scene
        }

        fn apply(&mut self, build: impl FnOnce(&mut BatchBuilder)) {
            self.seq += 1;
            let mut b = BatchBuilder::new();
            build(&mut b);
            self.store
                .apply_batch(&b.finish(SequenceId(self.seq), HostTime(0)))
                .expect("valid batch");
        }

        fn change(&mut self, id: u64, edit: impl FnOnce(&mut VisualChanges)) {
            self.apply(|b| {
                let mut c = VisualChanges::new(VisualId(id));
                edit(&mut c);
                b.visual_changes(c);
            });
        }

        /// Runs one update and drains the target's damage.
        fn frame(&mut self) -> Vec<Rect> {
            self.store.update_target(TARGET).expect("target exists");
            self.store
                .target_mut(TARGET)
                .expect("target exists")
                .drain_damage()
                .0
        }

        fn bounds(&self, id: u64) -> Rect {
            self.store
                .visual(VisualId(id))
                .expect("live visual")
                .transformed_bounds()
        }
    }

    #[test]
    fn child_bounds_in_target_space() {
        let mut scene = Scene::new();
        let damage = scene.frame();
        assert_eq!(scene.bounds(2), Rect::new(10.0, 10.0, 60.0, 60.0));
        assert_eq!(damage, vec![Rect::new(10.0, 10.0, 60.0, 60.0)]);
        assert_eq!(scene.bounds(1), Rect::ZERO, "a sizeless container has empty bounds");
    }

    #[test]
    fn global_is_parent_times_combined() {
        let mut scene = Scene::new();
        scene.change(1, |c| {
            c.set_value(VisualField::Scale, Vector3::new(2.0, 2.0, 1.0));
        });
        scene.frame();
        let parent = scene.store.visual(VisualId(1)).expect("live visual");
        let child = scene.store.visual(VisualId(2)).expect("live visual");
        assert_eq!(
            child.global_transform(),
            parent.global_transform() * child.combined_transform()
        );
        assert_eq!(scene.bounds(2), Rect::new(20.0, 20.0, 120.0, 120.0));
    }

    #[test]
    fn repeated_updates_are_idempotent() {
        let mut scene = Scene::new();
        scene.frame();
        let global = scene
            .store
            .visual(VisualId(2))
            .expect("live visual")
            .global_transform();
        for _ in 0..5 {
            assert!(scene.frame().is_empty(), "no change, no damage");
        }
        let child = scene.store.visual(VisualId(2)).expect("live visual");
        assert_eq!(child.global_transform(), global, "no drift");
        assert_eq!(scene.bounds(2), Rect::new(10.0, 10.0, 60.0, 60.0));
    }

    #[test]
    fn expression_animations_do_not_drift() {
        let mut scene = Scene::new();
        let anim = ExpressionAnimation::new(
            parse("this.CurrentValue + Vector3(1, 0, 0)").expect("valid expression"),
        );
        scene.change(2, |c| {
            c.set_animation(VisualField::Offset, Some(anim.into()));
        });
        assert_eq!(scene.frame(), vec![Rect::new(11.0, 10.0, 61.0, 60.0)]);
        for _ in 0..3 {
            assert!(scene.frame().is_empty(), "re-evaluation without changes");
            assert_eq!(scene.bounds(2), Rect::new(11.0, 10.0, 61.0, 60.0));
        }
    }

    #[test]
    fn hiding_damages_previous_bounds_once() {
        let mut scene = Scene::new();
        scene.frame();
        scene.change(2, |c| c.visible = Some(false));
        assert_eq!(scene.frame(), vec![Rect::new(10.0, 10.0, 60.0, 60.0)]);
        assert!(scene.frame().is_empty(), "nothing on the following frame");
        assert!(!scene
            .store
            .visual(VisualId(2))
            .expect("live visual")
            .visible_in_frame());
    }

    #[test]
    fn zero_opacity_hides() {
        let mut scene = Scene::new();
        scene.frame();
        scene.change(2, |c| {
            c.set_value(VisualField::Opacity, 0.0);
        });
        assert_eq!(scene.frame(), vec![Rect::new(10.0, 10.0, 60.0, 60.0)]);
        assert!(scene.frame().is_empty());

        scene.change(2, |c| {
            c.set_value(VisualField::Opacity, 0.5);
        });
        assert_eq!(scene.frame(), vec![Rect::new(10.0, 10.0, 60.0, 60.0)], "shown again");
    }

    #[test]
    fn moving_damages_old_and_new_bounds() {
        let mut scene = Scene::new();
        scene.frame();
        scene.change(2, |c| {
            c.set_value(VisualField::Offset, Vector3::new(100.0, 10.0, 0.0));
        });
        assert_eq!(
            scene.frame(),
            vec![
                Rect::new(10.0, 10.0, 60.0, 60.0),
                Rect::new(100.0, 10.0, 150.0, 60.0)
            ]
        );
    }

    #[test]
    fn backface_is_tested_against_previous_transform() {
        let mut scene = Scene::new();
        scene.frame();
        let flipped = Transform3d::from_scale(1.0, 1.0, -1.0);
        scene.change(2, |c| {
            c.set_value(VisualField::TransformMatrix, flipped);
        });
        scene.frame();
        let child = scene.store.visual(VisualId(2)).expect("live visual");
        assert!(
            !child.is_backface(),
            "the flip is judged against the unflipped transform of the last frame"
        );
        assert!(child.visible_in_frame());

        scene.change(2, |c| {
            c.set_value(VisualField::Offset, Vector3::new(11.0, 10.0, 0.0));
        });
        scene.frame();
        let child = scene.store.visual(VisualId(2)).expect("live visual");
        assert!(child.is_backface(), "culled on the next move");
        assert!(!child.visible_in_frame());
    }

    #[test]
    fn scaling_applies_above_the_root() {
        let mut scene = Scene::new();
        scene.apply(|b| {
            let mut t = TargetChanges::new(TARGET);
            t.scaling = Some(2.0);
            b.target_changes(&t);
        });
        scene.frame();
        assert_eq!(scene.bounds(2), Rect::new(20.0, 20.0, 120.0, 120.0));
    }

    #[test]
    fn adorners_follow_the_adorned_visual() {
        let mut scene = Scene::new();
        scene.apply(|b| {
            b.create_visual(VisualId(3), VisualKind::Container)
                .create_visual(VisualId(4), VisualKind::SolidColor)
                .children(VisualId(1), &[ChildOp::Add(VisualId(3))])
                .children(VisualId(3), &[ChildOp::Add(VisualId(4))]);
            let mut layer = VisualChanges::new(VisualId(3));
            layer.set_value(VisualField::Offset, Vector3::new(500.0, 500.0, 0.0));
            b.visual_changes(layer);
            let mut adorner = VisualChanges::new(VisualId(4));
            adorner
                .set_value(VisualField::Size, Vec2::new(5.0, 5.0))
                .set_value(
                    VisualField::TransformMatrix,
                    Transform3d::from_translation(1_000.0, 0.0, 0.0),
                );
            adorner.adorned_visual = Some(Some(VisualId(2)));
            b.visual_changes(adorner);
        });
        scene.frame();
        assert_eq!(
            scene.bounds(4),
            Rect::new(10.0, 10.0, 15.0, 15.0),
            "placed by the adorned visual, ignoring its own matrix and tree parent"
        );
    }

    #[test]
    fn readback_publishes_each_pass() {
        let mut scene = Scene::new();
        let handle = scene.store.readback(VisualId(2)).expect("attached visual");
        assert_eq!(handle.read(), None, "nothing published before the first pass");
        scene.frame();
        let data = handle.read().expect("published");
        assert_eq!(data.revision, 1);
        assert_eq!(data.target, TARGET);
        assert!(data.visible);
        assert_eq!(data.matrix, Transform3d::from_translation(10.0, 10.0, 0.0));

        scene.change(2, |c| c.visible = Some(false));
        scene.frame();
        let data = handle.read().expect("published");
        assert_eq!(data.revision, 2);
        assert!(!data.visible);
    }

    #[test]
    fn detaching_damages_visible_bounds() {
        let mut scene = Scene::new();
        scene.frame();
        scene.apply(|b| {
            b.children(VisualId(1), &[ChildOp::Remove(VisualId(2))]);
        });
        assert_eq!(scene.frame(), vec![Rect::new(10.0, 10.0, 60.0, 60.0)]);
    }
}

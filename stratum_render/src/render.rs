// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render pass.
//!
//! Rendering reads the state the update pass left behind: every visual draws
//! under its global transform, so the pass itself carries no transform
//! stack. Paint order is tree order, with a visual's own content below its
//! children and later siblings above earlier ones.

use kurbo::Rect;

use stratum_core::transform::Transform3d;
use stratum_core::visual::{Brush, DrawOp, TargetId, VisualKind, VisualRef, VisualStore};

use crate::context::DrawingContext;
use crate::damage::DamageRegion;

/// Renders the tree of target `id` into `ctx`, limited to `damage`.
///
/// Partial damage is applied as a clip to the union of the damaged
/// rectangles, in target space. Returns the number of visuals drawn; zero
/// when the target is unknown, has no root or nothing is damaged.
pub fn render_target(
    store: &VisualStore,
    id: TargetId,
    damage: &DamageRegion,
    ctx: &mut dyn DrawingContext,
) -> u32 {
    let Some(root) = store
        .target(id)
        .and_then(|t| t.root())
        .and_then(|r| store.visual(r))
    else {
        return 0;
    };
    match damage {
        DamageRegion::None => 0,
        DamageRegion::Full => render_visual(root, ctx),
        DamageRegion::Rects(_) => {
            let Some(bounds) = damage.bounds() else {
                return 0;
            };
            ctx.set_transform(&Transform3d::IDENTITY);
            ctx.push_clip(bounds);
            let drawn = render_visual(root, ctx);
            ctx.set_transform(&Transform3d::IDENTITY);
            ctx.pop_clip();
            drawn
        }
    }
}

/// Renders `visual` and its subtree, returning the number of visuals drawn.
///
/// Only the visible flag and opacity prune a subtree. Backface culling
/// affects damage, not drawing.
pub fn render_visual(visual: VisualRef<'_>, ctx: &mut dyn DrawingContext) -> u32 {
    let opacity = visual.opacity();
    if !visual.flags().visible || opacity == 0.0 {
        return 0;
    }

    let transform = visual.global_transform();
    let bounds = visual.local_bounds();
    ctx.set_transform(&transform);

    let pushed_opacity = opacity != 1.0;
    if pushed_opacity {
        ctx.push_opacity(opacity);
    }
    let clip_to_bounds = visual.flags().clip_to_bounds;
    if clip_to_bounds {
        ctx.push_clip(bounds);
    }
    let clip = visual.clip();
    if let Some(shape) = &clip {
        ctx.push_geometry_clip(shape);
    }
    let mask = visual.opacity_mask();
    if let Some(mask) = mask {
        ctx.push_opacity_mask(mask, bounds);
    }

    draw_content(visual, bounds, ctx);
    let mut drawn = 1;
    for child in visual.children() {
        drawn += render_visual(child, ctx);
    }

    // Children left their own transform current.
    ctx.set_transform(&transform);
    if mask.is_some() {
        ctx.pop_opacity_mask();
    }
    if clip.is_some() {
        ctx.pop_geometry_clip();
    }
    if clip_to_bounds {
        ctx.pop_clip();
    }
    if pushed_opacity {
        ctx.pop_opacity();
    }
    drawn
}

fn draw_content(visual: VisualRef<'_>, bounds: Rect, ctx: &mut dyn DrawingContext) {
    match visual.kind() {
        VisualKind::Container => {}
        VisualKind::SolidColor => {
            let color = visual.color();
            if bounds.area() > 0.0 && color.a != 0.0 {
                ctx.draw_rectangle(&Brush::Solid(color), bounds);
            }
        }
        VisualKind::Content => {
            for op in visual.draw_list().map(|l| l.ops.as_slice()).unwrap_or_default() {
                match op {
                    DrawOp::Rectangle { brush, rect } => ctx.draw_rectangle(brush, *rect),
                    DrawOp::RoundedRectangle { brush, rect } => {
                        ctx.draw_rounded_rectangle(brush, *rect);
                    }
                    DrawOp::Surface { surface, rect } => ctx.draw_surface(*surface, *rect),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{DrawCommand, RecordingContext};
    use kurbo::Vec2;
    use stratum_core::batch::{BatchBuilder, ChildOp, SequenceId, TargetChanges, VisualChanges};
    use stratum_core::time::HostTime;
    use stratum_core::transform::Vector3;
    use stratum_core::visual::{ClipShape, Color, DrawList, SurfaceId, VisualField, VisualId};

    const RED: Color = Color::rgba(1.0, 0.0, 0.0, 1.0);

    struct Scene {
        store: VisualStore,
        next_sequence: u64,
    }

    impl Scene {
        /// Target 1 rooted at container 1, with solid-color children 2 and 3.
        fn new() -> Self {
            let mut scene = Self {
                store: VisualStore::new(),
                next_sequence: 1,
            };
            scene.apply(|b| {
                b.create_visual(VisualId(1), VisualKind::Container)
                    .create_visual(VisualId(2), VisualKind::SolidColor)
                    .create_visual(VisualId(3), VisualKind::SolidColor)
                    .children(VisualId(1), &[ChildOp::Add(VisualId(2)), ChildOp::Add(VisualId(3))])
                    .create_target(TargetId(1));
                let mut t = TargetChanges::new(TargetId(1));
                t.root = Some(Some(VisualId(1)));
                b.target_changes(&t);
                for (id, x) in [(2, 10.0), (3, 100.0)] {
                    let mut c = VisualChanges::new(VisualId(id));
                    c.set_value(VisualField::Offset, Vector3::new(x, 10.0, 0.0))
                        .set_value(VisualField::Size, Vec2::new(50.0, 50.0))
                        .set_value(VisualField::Color, RED);
                    b.visual_changes(c);
                }
            });
            scene
        }

        fn apply(&mut self, build: impl FnOnce(&mut BatchBuilder)) {
            let mut b = BatchBuilder::new();
            build(&mut b);
            let batch = b.finish(SequenceId(self.next_sequence), HostTime(0));
            self.next_sequence += 1;
            self.store.apply_batch(&batch).expect("valid batch");
        }

        fn change(&mut self, id: u64, edit: impl FnOnce(&mut VisualChanges)) {
            self.apply(|b| {
                let mut c = VisualChanges::new(VisualId(id));
                edit(&mut c);
                b.visual_changes(c);
            });
        }

        fn render(&mut self) -> RecordingContext {
            self.store.update_target(TargetId(1)).expect("target exists");
            let mut ctx = RecordingContext::new();
            render_target(&self.store, TargetId(1), &DamageRegion::Full, &mut ctx);
            assert_eq!(ctx.open_groups(), 0, "every push was popped");
            ctx
        }

        fn global(&self, id: u64) -> Transform3d {
            self.store.visual(VisualId(id)).expect("live visual").global_transform()
        }
    }

    #[test]
    fn children_paint_in_order_over_parent() {
        let mut scene = Scene::new();
        let ctx = scene.render();
        let local = Rect::new(0.0, 0.0, 50.0, 50.0);
        assert_eq!(
            ctx.commands(),
            &[
                DrawCommand::SetTransform(scene.global(1)),
                DrawCommand::SetTransform(scene.global(2)),
                DrawCommand::Rectangle {
                    brush: RED.into(),
                    rect: local
                },
                DrawCommand::SetTransform(scene.global(2)),
                DrawCommand::SetTransform(scene.global(3)),
                DrawCommand::Rectangle {
                    brush: RED.into(),
                    rect: local
                },
                DrawCommand::SetTransform(scene.global(3)),
                DrawCommand::SetTransform(scene.global(1)),
            ]
        );
    }

    #[test]
    fn hidden_and_transparent_visuals_are_skipped() {
        let mut scene = Scene::new();
        scene.change(2, |c| c.visible = Some(false));
        scene.change(3, |c| {
            c.set_value(VisualField::Opacity, 0.0);
        });
        let ctx = scene.render();
        assert_eq!(ctx.draws().count(), 0);
    }

    #[test]
    fn backface_culled_visuals_still_paint() {
        let mut scene = Scene::new();
        scene.render();
        scene.change(2, |c| {
            c.set_value(VisualField::TransformMatrix, Transform3d::from_scale(1.0, 1.0, -1.0));
        });
        scene.render();
        scene.change(2, |c| {
            c.set_value(VisualField::Offset, Vector3::new(11.0, 10.0, 0.0));
        });
        let ctx = scene.render();
        let two = scene.store.visual(VisualId(2)).expect("live visual");
        assert!(two.is_backface());
        assert!(!two.visible_in_frame());
        assert_eq!(ctx.draws().count(), 2);
    }

    #[test]
    fn zero_size_solid_color_draws_nothing() {
        let mut scene = Scene::new();
        scene.change(2, |c| {
            c.set_value(VisualField::Size, Vec2::ZERO);
        });
        let ctx = scene.render();
        assert_eq!(ctx.draws().count(), 1, "only visual 3 paints");
    }

    #[test]
    fn effects_push_in_order_and_pop_in_reverse() {
        let mut scene = Scene::new();
        let shape = ClipShape::Rect(Rect::new(5.0, 5.0, 20.0, 20.0));
        scene.change(1, |c| {
            c.set_value(VisualField::Opacity, 0.5)
                .set_value(VisualField::Size, Vec2::new(200.0, 100.0));
            c.clip_to_bounds = Some(true);
            c.clip = Some(Some(shape));
            c.opacity_mask = Some(Some(Color::BLACK.into()));
        });
        let ctx = scene.render();
        let bounds = Rect::new(0.0, 0.0, 200.0, 100.0);
        let commands = ctx.commands();
        assert_eq!(
            &commands[..5],
            &[
                DrawCommand::SetTransform(scene.global(1)),
                DrawCommand::PushOpacity(0.5),
                DrawCommand::PushClip(bounds),
                DrawCommand::PushGeometryClip(shape),
                DrawCommand::PushOpacityMask {
                    mask: Color::BLACK.into(),
                    bounds
                },
            ]
        );
        assert_eq!(
            &commands[commands.len() - 5..],
            &[
                DrawCommand::SetTransform(scene.global(1)),
                DrawCommand::PopOpacityMask,
                DrawCommand::PopGeometryClip,
                DrawCommand::PopClip,
                DrawCommand::PopOpacity,
            ]
        );
    }

    #[test]
    fn content_replays_draw_list() {
        let mut scene = Scene::new();
        let mut list = DrawList::new();
        list.push(DrawOp::Surface {
            surface: SurfaceId(7),
            rect: Rect::new(0.0, 0.0, 8.0, 8.0),
        });
        list.push(DrawOp::RoundedRectangle {
            brush: Color::WHITE.into(),
            rect: Rect::new(0.0, 0.0, 4.0, 4.0).to_rounded_rect(1.0),
        });
        scene.apply(|b| {
            b.create_visual(VisualId(4), VisualKind::Content)
                .children(VisualId(1), &[ChildOp::Add(VisualId(4))]);
            let mut c = VisualChanges::new(VisualId(4));
            c.draw_list = Some(Some(list));
            b.visual_changes(c);
        });
        let ctx = scene.render();
        let draws: Vec<_> = ctx.draws().skip(2).cloned().collect();
        assert_eq!(
            draws,
            vec![
                DrawCommand::Surface {
                    surface: SurfaceId(7),
                    rect: Rect::new(0.0, 0.0, 8.0, 8.0)
                },
                DrawCommand::RoundedRectangle {
                    brush: Color::WHITE.into(),
                    rect: Rect::new(0.0, 0.0, 4.0, 4.0).to_rounded_rect(1.0)
                },
            ]
        );
    }

    #[test]
    fn partial_damage_clips_to_union() {
        let mut scene = Scene::new();
        scene.store.update_target(TargetId(1)).expect("target exists");
        let damage = DamageRegion::Rects(vec![
            Rect::new(10.0, 10.0, 60.0, 60.0),
            Rect::new(100.0, 10.0, 150.0, 60.0),
        ]);
        let mut ctx = RecordingContext::new();
        let drawn = render_target(&scene.store, TargetId(1), &damage, &mut ctx);
        assert_eq!(drawn, 3);
        let commands = ctx.commands();
        assert_eq!(commands[0], DrawCommand::SetTransform(Transform3d::IDENTITY));
        assert_eq!(commands[1], DrawCommand::PushClip(Rect::new(10.0, 10.0, 150.0, 60.0)));
        assert_eq!(commands.last(), Some(&DrawCommand::PopClip));

        let mut idle = RecordingContext::new();
        assert_eq!(render_target(&scene.store, TargetId(1), &DamageRegion::None, &mut idle), 0);
        assert!(idle.commands().is_empty());
    }
}

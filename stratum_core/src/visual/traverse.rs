// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-only visual views and tree traversal.

use std::sync::Arc;

use kurbo::{Rect, Vec2};

use super::brush::{Brush, Color};
use super::clip::ClipShape;
use super::field::VisualField;
use super::id::{INVALID, TargetId, VisualId};
use super::kind::{DrawList, VisualKind};
use super::store::{VisualFlags, VisualStore};
use crate::batch::SequenceId;
use crate::expr::Variant;
use crate::readback::ReadbackRing;
use crate::transform::{Quaternion, Transform3d, Vector3};

/// A read-only view of one visual.
///
/// Property getters return animated values at the store's current time.
#[derive(Clone, Copy)]
pub struct VisualRef<'a> {
    store: &'a VisualStore,
    slot: u32,
}

impl core::fmt::Debug for VisualRef<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VisualRef")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

impl<'a> VisualRef<'a> {
    pub(crate) fn new(store: &'a VisualStore, slot: u32) -> Self {
        Self { store, slot }
    }

    #[inline]
    fn i(&self) -> usize {
        self.slot as usize
    }

    /// The visual's id.
    #[must_use]
    pub fn id(&self) -> VisualId {
        self.store.ids[self.i()]
    }

    /// What the visual draws itself.
    #[must_use]
    pub fn kind(&self) -> VisualKind {
        self.store.kind[self.i()]
    }

    /// The parent visual, if any.
    #[must_use]
    pub fn parent(&self) -> Option<VisualId> {
        let p = self.store.parent[self.i()];
        (p != INVALID).then(|| self.store.ids[p as usize])
    }

    /// The direct children in paint order.
    #[must_use]
    pub fn children(&self) -> Children<'a> {
        Children {
            store: self.store,
            current: self.store.first_child[self.i()],
        }
    }

    /// The target the visual is attached to, if any.
    #[must_use]
    pub fn target(&self) -> Option<TargetId> {
        self.store.root[self.i()]
    }

    /// Is the visual attached to a target (and its animations running)?
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.store.activation[self.i()] > 0
    }

    /// Sequence id of the last batch that touched the visual.
    #[must_use]
    pub fn last_changed_by(&self) -> Option<SequenceId> {
        self.store.last_changed_by[self.i()]
    }

    // -- Properties --

    /// Current value of `field`.
    #[must_use]
    pub fn value(&self, field: VisualField) -> Variant {
        self.store.animated(self.slot, field)
    }

    /// Is an animation attached to `field`?
    #[must_use]
    pub fn is_animated(&self, field: VisualField) -> bool {
        self.store.fields[self.i()][field.index()].animation.is_some()
    }

    /// Translation applied last.
    #[must_use]
    pub fn offset(&self) -> Vector3 {
        self.store.offset_at(self.slot)
    }

    /// Width and height.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.store.size_at(self.slot)
    }

    /// Scale about the center point.
    #[must_use]
    pub fn scale(&self) -> Vector3 {
        self.store.scale_at(self.slot)
    }

    /// Rotation about Z, in radians.
    #[must_use]
    pub fn rotation_angle(&self) -> f64 {
        self.store.rotation_angle_at(self.slot)
    }

    /// 3-D orientation.
    #[must_use]
    pub fn orientation(&self) -> Quaternion {
        self.store.orientation_at(self.slot)
    }

    /// Opacity multiplier.
    #[must_use]
    pub fn opacity(&self) -> f64 {
        self.store.opacity_at(self.slot)
    }

    /// Fill color of a solid-color visual.
    #[must_use]
    pub fn color(&self) -> Color {
        self.store.color_at(self.slot)
    }

    /// Visibility and clipping flags.
    #[must_use]
    pub fn flags(&self) -> VisualFlags {
        self.store.flags[self.i()]
    }

    /// Geometry clip in local space.
    #[must_use]
    pub fn clip(&self) -> Option<ClipShape> {
        self.store.clip[self.i()]
    }

    /// Opacity-mask brush.
    #[must_use]
    pub fn opacity_mask(&self) -> Option<&'a Brush> {
        self.store.opacity_mask[self.i()].as_ref()
    }

    /// The visual this adorner follows, if it is one.
    #[must_use]
    pub fn adorned_visual(&self) -> Option<VisualId> {
        self.store.adorned[self.i()]
    }

    /// Recorded content of a content visual.
    #[must_use]
    pub fn draw_list(&self) -> Option<&'a DrawList> {
        self.store.draw_list[self.i()].as_ref()
    }

    // -- Computed by update --

    /// Combined local transform from the last update.
    #[must_use]
    pub fn combined_transform(&self) -> Transform3d {
        self.store.combined_transform[self.i()]
    }

    /// Target-space transform from the last update.
    #[must_use]
    pub fn global_transform(&self) -> Transform3d {
        self.store.global_transform[self.i()]
    }

    /// Target-space bounding box from the last update.
    #[must_use]
    pub fn transformed_bounds(&self) -> Rect {
        self.store.transformed_bounds[self.i()]
    }

    /// Local-space bounds, `(0, 0)` to the current size.
    #[must_use]
    pub fn local_bounds(&self) -> Rect {
        let size = self.size();
        Rect::new(0.0, 0.0, size.x, size.y)
    }

    /// Was the visual visible in the last update?
    #[must_use]
    pub fn visible_in_frame(&self) -> bool {
        self.store.visible_in_frame[self.i()]
    }

    /// Was the visual facing away in the last backface test?
    #[must_use]
    pub fn is_backface(&self) -> bool {
        self.store.backface[self.i()]
    }

    /// The visual's readback ring.
    #[must_use]
    pub fn readback_ring(&self) -> &'a Arc<ReadbackRing> {
        &self.store.readback[self.i()]
    }
}

/// An iterator over the direct children of a visual.
///
/// Created by [`VisualRef::children`].
#[derive(Debug)]
pub struct Children<'a> {
    store: &'a VisualStore,
    current: u32,
}

impl<'a> Iterator for Children<'a> {
    type Item = VisualRef<'a>;

    fn next(&mut self) -> Option<VisualRef<'a>> {
        if self.current == INVALID {
            return None;
        }
        let slot = self.current;
        self.current = self.store.next_sibling[slot as usize];
        Some(VisualRef::new(self.store, slot))
    }
}

// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays visual storage with allocation, topology and invalidation.

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use kurbo::Rect;

use super::brush::Brush;
use super::clip::ClipShape;
use super::field::VisualField;
use super::id::{INVALID, TargetId, VisualId};
use super::kind::{DrawList, VisualKind};
use super::target::CompositionTarget;
use super::traverse::VisualRef;
use crate::animation::{AnimatedProperty, AnimationId, AnimationInstance};
use crate::batch::{BatchError, SequenceId};
use crate::readback::{ReadbackHandle, ReadbackRing};
use crate::time::HostTime;
use crate::transform::Transform3d;

/// Default limit on nested expression evaluations.
pub const DEFAULT_MAX_EVAL_DEPTH: u32 = 16;

/// Per-visual boolean flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VisualFlags {
    /// Whether the visual (and its subtree) is shown.
    pub visible: bool,
    /// Whether content and children are clipped to the visual's bounds.
    pub clip_to_bounds: bool,
}

impl Default for VisualFlags {
    fn default() -> Self {
        Self {
            visible: true,
            clip_to_bounds: false,
        }
    }
}

/// Struct-of-arrays storage for the server-side visual tree.
///
/// Visuals are addressed by client-allocated [`VisualId`]s, mapped to slots
/// in parallel arrays. Disposed visuals free their slot for reuse; because
/// ids are never reused, a stale id simply fails to resolve.
///
/// The store is mutated only by [`apply_batch`](Self::apply_batch), advanced
/// by [`tick`](Self::tick) and walked by
/// [`update_target`](Self::update_target).
#[derive(Debug)]
pub struct VisualStore {
    // -- Identity --
    pub(crate) ids: Vec<VisualId>,
    pub(crate) slots: BTreeMap<VisualId, u32>,
    pub(crate) free_list: Vec<u32>,

    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,
    pub(crate) root: Vec<Option<TargetId>>,

    // -- Properties (set by batches) --
    pub(crate) kind: Vec<VisualKind>,
    pub(crate) fields: Vec<[AnimatedProperty; VisualField::COUNT]>,
    pub(crate) flags: Vec<VisualFlags>,
    pub(crate) clip: Vec<Option<ClipShape>>,
    pub(crate) opacity_mask: Vec<Option<Brush>>,
    pub(crate) adorned: Vec<Option<VisualId>>,
    pub(crate) draw_list: Vec<Option<DrawList>>,
    pub(crate) last_changed_by: Vec<Option<SequenceId>>,
    pub(crate) activation: Vec<u32>,

    // -- Computed (written by update) --
    pub(crate) combined_transform: Vec<Transform3d>,
    pub(crate) global_transform: Vec<Transform3d>,
    pub(crate) transformed_bounds: Vec<Rect>,
    pub(crate) visible_in_frame: Vec<bool>,
    pub(crate) backface: Vec<bool>,
    pub(crate) dirty: Vec<bool>,
    pub(crate) readback: Vec<Arc<ReadbackRing>>,

    // -- Animations --
    pub(crate) animations: BTreeMap<AnimationId, AnimationInstance>,
    pub(crate) next_animation: u64,
    pub(crate) clock: BTreeSet<AnimationId>,

    // -- Targets --
    pub(crate) targets: BTreeMap<TargetId, CompositionTarget>,

    // -- Frame state --
    pub(crate) now: HostTime,
    pub(crate) last_sequence: Option<SequenceId>,
    pub(crate) eval_depth: Cell<u32>,
    pub(crate) max_eval_depth: u32,
}

impl Default for VisualStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VisualStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: Vec::new(),
            slots: BTreeMap::new(),
            free_list: Vec::new(),
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            root: Vec::new(),
            kind: Vec::new(),
            fields: Vec::new(),
            flags: Vec::new(),
            clip: Vec::new(),
            opacity_mask: Vec::new(),
            adorned: Vec::new(),
            draw_list: Vec::new(),
            last_changed_by: Vec::new(),
            activation: Vec::new(),
            combined_transform: Vec::new(),
            global_transform: Vec::new(),
            transformed_bounds: Vec::new(),
            visible_in_frame: Vec::new(),
            backface: Vec::new(),
            dirty: Vec::new(),
            readback: Vec::new(),
            animations: BTreeMap::new(),
            next_animation: 1,
            clock: BTreeSet::new(),
            targets: BTreeMap::new(),
            now: HostTime(0),
            last_sequence: None,
            eval_depth: Cell::new(0),
            max_eval_depth: DEFAULT_MAX_EVAL_DEPTH,
        }
    }

    // -- Read API --

    /// Number of live visuals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Are there no live visuals?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Does `id` name a live visual?
    #[must_use]
    pub fn contains(&self, id: VisualId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Returns a read-only view of visual `id`.
    #[must_use]
    pub fn visual(&self, id: VisualId) -> Option<VisualRef<'_>> {
        self.slots.get(&id).map(|&slot| VisualRef::new(self, slot))
    }

    /// Returns target `id`.
    #[must_use]
    pub fn target(&self, id: TargetId) -> Option<&CompositionTarget> {
        self.targets.get(&id)
    }

    /// Returns target `id` for draining damage or requesting redraws.
    pub fn target_mut(&mut self, id: TargetId) -> Option<&mut CompositionTarget> {
        self.targets.get_mut(&id)
    }

    /// Iterates over every target in id order.
    pub fn targets(&self) -> impl Iterator<Item = &CompositionTarget> {
        self.targets.values()
    }

    /// Ids of every target, in id order.
    #[must_use]
    pub fn target_ids(&self) -> Vec<TargetId> {
        self.targets.keys().copied().collect()
    }

    /// The time animations are evaluated at.
    #[inline]
    #[must_use]
    pub fn now(&self) -> HostTime {
        self.now
    }

    /// Sequence id of the last applied batch.
    #[inline]
    #[must_use]
    pub fn last_sequence(&self) -> Option<SequenceId> {
        self.last_sequence
    }

    /// Limit on nested expression evaluations.
    #[inline]
    #[must_use]
    pub fn max_eval_depth(&self) -> u32 {
        self.max_eval_depth
    }

    /// Sets the limit on nested expression evaluations.
    ///
    /// Evaluation past the limit returns the property's direct value, which
    /// breaks reference cycles between expressions.
    pub fn set_max_eval_depth(&mut self, depth: u32) {
        self.max_eval_depth = depth;
    }

    /// Returns a handle the UI thread can use to read visual `id`'s last
    /// rendered state, or `None` if the visual is unknown or not attached to
    /// a target.
    ///
    /// The handle stays bound to the target the visual belonged to when it
    /// was created.
    #[must_use]
    pub fn readback(&self, id: VisualId) -> Option<ReadbackHandle> {
        let slot = *self.slots.get(&id)? as usize;
        let target = self.targets.get(&self.root[slot]?)?;
        Some(ReadbackHandle::new(
            Arc::clone(&self.readback[slot]),
            target.readback_indices(),
        ))
    }

    // -- Allocation --

    pub(crate) fn slot_of(&self, id: VisualId) -> Result<u32, BatchError> {
        self.slots
            .get(&id)
            .copied()
            .ok_or(BatchError::UnknownVisual(id))
    }

    /// Creates visual `id` with default properties and no parent.
    pub(crate) fn create_visual(&mut self, id: VisualId, kind: VisualKind) -> Result<u32, BatchError> {
        if id.0 == 0 {
            return Err(BatchError::UnknownVisual(id));
        }
        if self.slots.contains_key(&id) {
            return Err(BatchError::DuplicateVisual(id));
        }
        let fields = VisualField::ALL.map(|f| AnimatedProperty::new(f.default_value()));
        let slot = if let Some(slot) = self.free_list.pop() {
            // Reuse a freed slot.
            let i = slot as usize;
            self.ids[i] = id;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.root[i] = None;
            self.kind[i] = kind;
            self.fields[i] = fields;
            self.flags[i] = VisualFlags::default();
            self.clip[i] = None;
            self.opacity_mask[i] = None;
            self.adorned[i] = None;
            self.draw_list[i] = None;
            self.last_changed_by[i] = None;
            self.activation[i] = 0;
            self.combined_transform[i] = Transform3d::IDENTITY;
            self.global_transform[i] = Transform3d::ZERO;
            self.transformed_bounds[i] = Rect::ZERO;
            self.visible_in_frame[i] = false;
            self.backface[i] = false;
            self.dirty[i] = true;
            self.readback[i] = Arc::new(ReadbackRing::default());
            slot
        } else {
            // Allocate a new slot.
            let Ok(slot) = u32::try_from(self.ids.len()) else {
                panic!("visual slot count exceeds u32");
            };
            self.ids.push(id);
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.root.push(None);
            self.kind.push(kind);
            self.fields.push(fields);
            self.flags.push(VisualFlags::default());
            self.clip.push(None);
            self.opacity_mask.push(None);
            self.adorned.push(None);
            self.draw_list.push(None);
            self.last_changed_by.push(None);
            self.activation.push(0);
            self.combined_transform.push(Transform3d::IDENTITY);
            self.global_transform.push(Transform3d::ZERO);
            self.transformed_bounds.push(Rect::ZERO);
            self.visible_in_frame.push(false);
            self.backface.push(false);
            self.dirty.push(true);
            self.readback.push(Arc::new(ReadbackRing::default()));
            slot
        };
        self.slots.insert(id, slot);
        Ok(slot)
    }

    /// Disposes the visual at `slot`.
    ///
    /// The visual is unlinked from its parent and detached from its target,
    /// its children become parentless and its animations are dropped.
    pub(crate) fn dispose_visual(&mut self, slot: u32) {
        let i = slot as usize;
        let id = self.ids[i];
        if self.parent[i] != INVALID {
            self.unlink_from_parent(slot);
        }
        if self.root[i].is_some() {
            self.detach_subtree(slot);
        }
        for target in self.targets.values_mut() {
            if target.root == Some(id) {
                target.root = None;
            }
        }
        let children: Vec<u32> = self.child_slots(slot).collect();
        for child in children {
            self.unlink_from_parent(child);
        }
        for field in VisualField::ALL {
            if let Some(animation) = self.fields[i][field.index()].animation.take() {
                self.remove_animation(animation);
            }
        }
        self.slots.remove(&id);
        self.free_list.push(slot);
    }

    // -- Topology --

    /// Iterates over the child slots of `slot` in paint order.
    pub(crate) fn child_slots(&self, slot: u32) -> impl Iterator<Item = u32> + '_ {
        let mut current = self.first_child[slot as usize];
        core::iter::from_fn(move || {
            if current == INVALID {
                return None;
            }
            let idx = current;
            current = self.next_sibling[idx as usize];
            Some(idx)
        })
    }

    /// Is `ancestor` the visual at `slot` or one of its ancestors?
    pub(crate) fn is_self_or_ancestor(&self, ancestor: u32, slot: u32) -> bool {
        let mut current = slot;
        while current != INVALID {
            if current == ancestor {
                return true;
            }
            current = self.parent[current as usize];
        }
        false
    }

    /// Appends `child` as the last child of `parent` without touching
    /// target membership.
    pub(crate) fn link_child(&mut self, parent: u32, child: u32) {
        let (p, c) = (parent as usize, child as usize);
        self.parent[c] = parent;
        self.prev_sibling[c] = INVALID;
        self.next_sibling[c] = INVALID;

        if self.first_child[p] == INVALID {
            self.first_child[p] = child;
        } else {
            // Walk to last child.
            let mut last = self.first_child[p];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = child;
            self.prev_sibling[c] = last;
        }
    }

    /// Removes `slot` from its parent's child list without touching target
    /// membership.
    pub(crate) fn unlink_from_parent(&mut self, slot: u32) {
        let i = slot as usize;
        let p = self.parent[i];
        let prev = self.prev_sibling[i];
        let next = self.next_sibling[i];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else if p != INVALID {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[i] = INVALID;
        self.prev_sibling[i] = INVALID;
        self.next_sibling[i] = INVALID;
    }

    /// Makes `target` the root target of the subtree at `slot` and activates
    /// every visual in it.
    pub(crate) fn attach_subtree(&mut self, slot: u32, target: TargetId) {
        let mut stack = vec![slot];
        while let Some(s) = stack.pop() {
            let i = s as usize;
            debug_assert!(self.root[i].is_none(), "visual attached to two targets");
            self.root[i] = Some(target);
            self.dirty[i] = true;
            self.activate_visual(s);
            stack.extend(self.child_slots(s));
        }
    }

    /// Detaches the subtree at `slot` from its target, damaging the area it
    /// was last painted at and deactivating every visual in it.
    pub(crate) fn detach_subtree(&mut self, slot: u32) {
        let mut stack = vec![slot];
        while let Some(s) = stack.pop() {
            let i = s as usize;
            if let Some(target) = self.root[i].take() {
                if self.visible_in_frame[i]
                    && let Some(target) = self.targets.get_mut(&target)
                {
                    target.dirty.push(self.transformed_bounds[i]);
                }
                self.deactivate_visual(s);
            }
            self.visible_in_frame[i] = false;
            // The next attach counts as a move.
            self.global_transform[i] = Transform3d::ZERO;
            stack.extend(self.child_slots(s));
        }
    }

    // -- Invalidation --

    /// Records that something about the visual at `slot` changed.
    ///
    /// A visual visible in the last frame damages its old bounds right away,
    /// so the area repaints even if the visual is hidden by the change. The
    /// update pass reports the new bounds.
    pub(crate) fn values_invalidated(&mut self, slot: u32) {
        let i = slot as usize;
        if self.visible_in_frame[i]
            && let Some(target) = self.root[i].and_then(|t| self.targets.get_mut(&t))
        {
            target.dirty.push(self.transformed_bounds[i]);
        }
        self.dirty[i] = true;
    }

    /// Records that `field` of the visual at `slot` changed and cascades the
    /// invalidation through every expression subscribed to it.
    pub(crate) fn property_changed(&mut self, slot: u32, field: VisualField) {
        let mut pending = vec![(slot, field)];
        while let Some((slot, field)) = pending.pop() {
            self.values_invalidated(slot);
            let store = &self.fields[slot as usize][field.index()].subscriptions;
            if !store.invalidate() {
                continue;
            }
            for animation in store.subscribers() {
                if let Some(instance) = self.animations.get(&animation)
                    && let Some(&owner) = self.slots.get(&instance.target)
                {
                    pending.push((owner, instance.field));
                }
            }
        }
    }
}

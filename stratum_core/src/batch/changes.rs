// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-object change records.
//!
//! The client fills in a [`VisualChanges`] or [`TargetChanges`] with only the
//! properties it touched and hands it to a
//! [`BatchBuilder`](super::BatchBuilder). The server decodes the same types,
//! so a record is fully staged before any of it is applied.

use super::codec::{BatchReader, BatchWriter};
use super::error::BatchError;
use super::BatchObject;
use crate::animation::Animation;
use crate::expr::Variant;
use crate::visual::{Brush, ClipShape, DrawList, TargetId, VisualField, VisualId};

pub(crate) const VISIBLE_BIT: u32 = 1 << 20;
pub(crate) const CLIP_TO_BOUNDS_BIT: u32 = 1 << 21;
pub(crate) const CLIP_BIT: u32 = 1 << 22;
pub(crate) const OPACITY_MASK_BIT: u32 = 1 << 23;
pub(crate) const ADORNED_VISUAL_BIT: u32 = 1 << 24;
pub(crate) const DRAW_LIST_BIT: u32 = 1 << 25;
const KNOWN_VISUAL_BITS: u32 = (1 << 26) - 1;

const TARGET_ROOT_BIT: u8 = 1 << 0;
const TARGET_SCALING_BIT: u8 = 1 << 1;
const TARGET_INVALIDATE_BIT: u8 = 1 << 2;
const KNOWN_TARGET_BITS: u8 = (1 << 3) - 1;

/// Object-table index meaning "none".
const NO_OBJECT: u32 = u32::MAX;

/// Property changes of one visual within a batch.
///
/// Unset entries are left untouched by the server. For optional properties
/// `Some(None)` clears the property.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualChanges {
    id: VisualId,
    /// Dispose the visual after applying the other changes.
    pub dispose: bool,
    values: [Option<Variant>; VisualField::COUNT],
    animations: [Option<Option<Animation>>; VisualField::COUNT],
    /// New visibility flag.
    pub visible: Option<bool>,
    /// New clip-to-bounds flag.
    pub clip_to_bounds: Option<bool>,
    /// New geometry clip.
    pub clip: Option<Option<ClipShape>>,
    /// New opacity mask.
    pub opacity_mask: Option<Option<Brush>>,
    /// New adorned visual.
    pub adorned_visual: Option<Option<VisualId>>,
    /// New recorded content.
    pub draw_list: Option<Option<DrawList>>,
}

impl VisualChanges {
    /// An empty change set for `id`.
    #[must_use]
    pub fn new(id: VisualId) -> Self {
        Self {
            id,
            dispose: false,
            values: [None; VisualField::COUNT],
            animations: [const { None }; VisualField::COUNT],
            visible: None,
            clip_to_bounds: None,
            clip: None,
            opacity_mask: None,
            adorned_visual: None,
            draw_list: None,
        }
    }

    /// The visual these changes apply to.
    #[inline]
    #[must_use]
    pub fn id(&self) -> VisualId {
        self.id
    }

    /// Sets the direct value of `field`.
    ///
    /// The value must be of the field's [kind](VisualField::kind); the
    /// server rejects the record otherwise.
    pub fn set_value(&mut self, field: VisualField, value: impl Into<Variant>) -> &mut Self {
        self.values[field.index()] = Some(value.into());
        self
    }

    /// The direct value set for `field`, if any.
    #[must_use]
    pub fn value(&self, field: VisualField) -> Option<Variant> {
        self.values[field.index()]
    }

    /// Attaches `animation` to `field`, or detaches the current one with
    /// `None`.
    pub fn set_animation(&mut self, field: VisualField, animation: Option<Animation>) -> &mut Self {
        self.animations[field.index()] = Some(animation);
        self
    }

    /// The animation change for `field`, if any.
    #[must_use]
    pub fn animation(&self, field: VisualField) -> Option<Option<&Animation>> {
        self.animations[field.index()].as_ref().map(Option::as_ref)
    }

    pub(crate) fn take_animation(&mut self, field: VisualField) -> Option<Option<Animation>> {
        self.animations[field.index()].take()
    }

    /// The change mask announcing which entries are present.
    #[must_use]
    pub fn mask(&self) -> u32 {
        let mut mask = 0;
        for field in VisualField::ALL {
            if self.values[field.index()].is_some() {
                mask |= field.value_bit();
            }
            if self.animations[field.index()].is_some() {
                mask |= field.animation_bit();
            }
        }
        let optional = [
            (self.visible.is_some(), VISIBLE_BIT),
            (self.clip_to_bounds.is_some(), CLIP_TO_BOUNDS_BIT),
            (self.clip.is_some(), CLIP_BIT),
            (self.opacity_mask.is_some(), OPACITY_MASK_BIT),
            (self.adorned_visual.is_some(), ADORNED_VISUAL_BIT),
            (self.draw_list.is_some(), DRAW_LIST_BIT),
        ];
        for (present, bit) in optional {
            if present {
                mask |= bit;
            }
        }
        mask
    }

    /// Does the record change nothing?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.dispose && self.mask() == 0
    }

    pub(crate) fn encode(self, w: &mut BatchWriter, objects: &mut Vec<BatchObject>) {
        let mask = self.mask();
        w.u64(self.id.0);
        w.marker(self.dispose);
        w.u32(mask);
        for (field, (value, animation)) in VisualField::ALL
            .into_iter()
            .zip(self.values.into_iter().zip(self.animations))
        {
            if let Some(value) = value {
                w.field_value(value);
            }
            if let Some(animation) = animation {
                w.u32(push_object(objects, animation.map(BatchObject::Animation)));
            }
        }
        if let Some(visible) = self.visible {
            w.marker(visible);
        }
        if let Some(clip_to_bounds) = self.clip_to_bounds {
            w.marker(clip_to_bounds);
        }
        if let Some(clip) = self.clip {
            w.u32(push_object(objects, clip.map(BatchObject::Clip)));
        }
        if let Some(mask) = self.opacity_mask {
            w.u32(push_object(objects, mask.map(BatchObject::Brush)));
        }
        if let Some(adorned) = self.adorned_visual {
            w.u64(VisualId::encode(adorned));
        }
        if let Some(draw_list) = self.draw_list {
            w.u32(push_object(objects, draw_list.map(BatchObject::DrawList)));
        }
    }

    pub(crate) fn decode(r: &mut BatchReader<'_>, objects: &[BatchObject]) -> Result<Self, BatchError> {
        let mut changes = Self::new(VisualId(r.u64()?));
        changes.dispose = r.marker()?;
        let mask = r.u32()?;
        if mask & !KNOWN_VISUAL_BITS != 0 {
            return Err(BatchError::UnknownMaskBits(mask & !KNOWN_VISUAL_BITS));
        }
        for field in VisualField::ALL {
            if mask & field.value_bit() != 0 {
                changes.values[field.index()] = Some(r.field_value(field)?);
            }
            if mask & field.animation_bit() != 0 {
                let animation = lookup(objects, r.u32()?, "an animation", |o| match o {
                    BatchObject::Animation(a) => Some(a.clone()),
                    _ => None,
                })?;
                changes.animations[field.index()] = Some(animation);
            }
        }
        if mask & VISIBLE_BIT != 0 {
            changes.visible = Some(r.marker()?);
        }
        if mask & CLIP_TO_BOUNDS_BIT != 0 {
            changes.clip_to_bounds = Some(r.marker()?);
        }
        if mask & CLIP_BIT != 0 {
            changes.clip = Some(lookup(objects, r.u32()?, "a clip shape", |o| match o {
                BatchObject::Clip(c) => Some(*c),
                _ => None,
            })?);
        }
        if mask & OPACITY_MASK_BIT != 0 {
            changes.opacity_mask = Some(lookup(objects, r.u32()?, "a brush", |o| match o {
                BatchObject::Brush(b) => Some(b.clone()),
                _ => None,
            })?);
        }
        if mask & ADORNED_VISUAL_BIT != 0 {
            changes.adorned_visual = Some(VisualId::decode(r.u64()?));
        }
        if mask & DRAW_LIST_BIT != 0 {
            changes.draw_list = Some(lookup(objects, r.u32()?, "a draw list", |o| match o {
                BatchObject::DrawList(d) => Some(d.clone()),
                _ => None,
            })?);
        }
        Ok(changes)
    }
}

/// Property changes of one composition target within a batch.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetChanges {
    id: TargetId,
    /// Dispose the target after applying the other changes.
    pub dispose: bool,
    /// New root visual.
    pub root: Option<Option<VisualId>>,
    /// New scaling factor.
    pub scaling: Option<f64>,
    /// Request a full redraw.
    pub invalidate: bool,
}

impl TargetChanges {
    /// An empty change set for `id`.
    #[must_use]
    pub fn new(id: TargetId) -> Self {
        Self {
            id,
            dispose: false,
            root: None,
            scaling: None,
            invalidate: false,
        }
    }

    /// The target these changes apply to.
    #[inline]
    #[must_use]
    pub fn id(&self) -> TargetId {
        self.id
    }

    pub(crate) fn encode(&self, w: &mut BatchWriter) {
        let mut mask = 0;
        if self.root.is_some() {
            mask |= TARGET_ROOT_BIT;
        }
        if self.scaling.is_some() {
            mask |= TARGET_SCALING_BIT;
        }
        if self.invalidate {
            mask |= TARGET_INVALIDATE_BIT;
        }
        w.u64(self.id.0);
        w.marker(self.dispose);
        w.u8(mask);
        if let Some(root) = self.root {
            w.u64(VisualId::encode(root));
        }
        if let Some(scaling) = self.scaling {
            w.f64(scaling);
        }
    }

    pub(crate) fn decode(r: &mut BatchReader<'_>) -> Result<Self, BatchError> {
        let mut changes = Self::new(TargetId(r.u64()?));
        changes.dispose = r.marker()?;
        let mask = r.u8()?;
        if mask & !KNOWN_TARGET_BITS != 0 {
            return Err(BatchError::UnknownMaskBits(u32::from(mask & !KNOWN_TARGET_BITS)));
        }
        if mask & TARGET_ROOT_BIT != 0 {
            changes.root = Some(VisualId::decode(r.u64()?));
        }
        if mask & TARGET_SCALING_BIT != 0 {
            changes.scaling = Some(r.f64()?);
        }
        changes.invalidate = mask & TARGET_INVALIDATE_BIT != 0;
        Ok(changes)
    }
}

/// One edit of a visual's child collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildOp {
    /// Append a child.
    Add(VisualId),
    /// Insert a child before position `index`.
    Insert {
        /// Position in the child list, at most its length.
        index: u32,
        /// The new child.
        child: VisualId,
    },
    /// Remove a child.
    Remove(VisualId),
    /// Remove every child.
    Clear,
}

impl ChildOp {
    pub(crate) fn encode(self, w: &mut BatchWriter) {
        match self {
            Self::Add(child) => {
                w.u8(0);
                w.u64(child.0);
            }
            Self::Insert { index, child } => {
                w.u8(1);
                w.u32(index);
                w.u64(child.0);
            }
            Self::Remove(child) => {
                w.u8(2);
                w.u64(child.0);
            }
            Self::Clear => w.u8(3),
        }
    }

    pub(crate) fn decode(r: &mut BatchReader<'_>) -> Result<Self, BatchError> {
        Ok(match r.u8()? {
            0 => Self::Add(VisualId(r.u64()?)),
            1 => {
                let index = r.u32()?;
                Self::Insert {
                    index,
                    child: VisualId(r.u64()?),
                }
            }
            2 => Self::Remove(VisualId(r.u64()?)),
            3 => Self::Clear,
            op => return Err(BatchError::UnknownChildOp(op)),
        })
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "a batch never carries 2^32 objects"
)]
fn push_object(objects: &mut Vec<BatchObject>, object: Option<BatchObject>) -> u32 {
    match object {
        Some(object) => {
            objects.push(object);
            (objects.len() - 1) as u32
        }
        None => NO_OBJECT,
    }
}

fn lookup<T>(
    objects: &[BatchObject],
    index: u32,
    expected: &'static str,
    extract: impl FnOnce(&BatchObject) -> Option<T>,
) -> Result<Option<T>, BatchError> {
    if index == NO_OBJECT {
        return Ok(None);
    }
    let object = objects
        .get(index as usize)
        .ok_or(BatchError::UnknownObject(index))?;
    extract(object)
        .map(Some)
        .ok_or(BatchError::ObjectKindMismatch { index, expected })
}

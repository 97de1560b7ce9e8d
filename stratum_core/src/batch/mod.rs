// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Serialized change batches.
//!
//! A [`Batch`] carries every mutation the client made since its previous
//! commit: a byte stream of tagged records plus an out-of-band table of
//! heap objects (animations, clip shapes, brushes, draw lists) that records
//! refer to by index.
//!
//! # Record layout
//!
//! Every record starts with a one-byte tag:
//!
//! | Tag | Record            | Payload                                        |
//! |-----|-------------------|------------------------------------------------|
//! | 1   | create visual     | id `u64`, kind `u8`                            |
//! | 2   | visual changes    | id `u64`, dispose `u8`, mask `u32`, values     |
//! | 3   | child changes     | parent `u64`, count `u32`, operations          |
//! | 4   | create target     | id `u64`                                       |
//! | 5   | target changes    | id `u64`, dispose `u8`, mask `u8`, values      |
//!
//! Values follow their mask in field order. Object references are `u32`
//! indices into the object table, `u32::MAX` meaning none; visual references
//! are `u64` ids, zero meaning none. Markers are a single byte that must be
//! 0 or 1.
//!
//! The server applies batches in sequence-id order with
//! [`VisualStore::apply_batch`](crate::visual::VisualStore::apply_batch).

mod apply;
mod changes;
mod codec;
mod error;
mod transport;

use core::fmt;

pub use changes::{ChildOp, TargetChanges, VisualChanges};
pub use error::BatchError;
pub use transport::{BatchReceiver, BatchSender, TransportError, batch_channel};

pub(crate) use changes::{
    ADORNED_VISUAL_BIT, CLIP_BIT, CLIP_TO_BOUNDS_BIT, DRAW_LIST_BIT, OPACITY_MASK_BIT,
    VISIBLE_BIT,
};

use codec::{BatchReader, BatchWriter};

use crate::animation::Animation;
use crate::time::HostTime;
use crate::visual::{Brush, ClipShape, DrawList, TargetId, VisualId, VisualKind};

const TAG_CREATE_VISUAL: u8 = 1;
const TAG_VISUAL_CHANGES: u8 = 2;
const TAG_CHILDREN: u8 = 3;
const TAG_CREATE_TARGET: u8 = 4;
const TAG_TARGET_CHANGES: u8 = 5;

/// Monotonic batch number assigned at commit.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceId(pub u64);

impl fmt::Debug for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SequenceId({})", self.0)
    }
}

/// A heap object referenced from the byte stream by index.
#[derive(Clone, Debug, PartialEq)]
pub enum BatchObject {
    /// An animation to attach to a property.
    Animation(Animation),
    /// A geometry clip.
    Clip(ClipShape),
    /// An opacity-mask brush.
    Brush(Brush),
    /// Recorded content.
    DrawList(DrawList),
}

/// One committed set of client mutations.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    /// Position in the client's commit order.
    pub sequence_id: SequenceId,
    /// When the client committed; animations started by this batch measure
    /// time from here.
    pub committed_at: HostTime,
    /// Tagged records.
    pub data: Vec<u8>,
    /// Objects referenced by the records.
    pub objects: Vec<BatchObject>,
}

impl Batch {
    /// Does the batch carry no records?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Accumulates records on the client side.
#[derive(Debug, Default)]
pub struct BatchBuilder {
    writer: BatchWriter,
    objects: Vec<BatchObject>,
    records: u32,
}

impl BatchBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records written so far.
    #[inline]
    #[must_use]
    pub fn records(&self) -> u32 {
        self.records
    }

    /// Is no record written yet?
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    /// Creates visual `id` of `kind`.
    pub fn create_visual(&mut self, id: VisualId, kind: VisualKind) -> &mut Self {
        self.writer.u8(TAG_CREATE_VISUAL);
        self.writer.u64(id.0);
        self.writer.u8(kind as u8);
        self.records += 1;
        self
    }

    /// Records property changes of one visual.
    pub fn visual_changes(&mut self, changes: VisualChanges) -> &mut Self {
        self.writer.u8(TAG_VISUAL_CHANGES);
        changes.encode(&mut self.writer, &mut self.objects);
        self.records += 1;
        self
    }

    /// Records edits of `parent`'s child collection, applied in order.
    ///
    /// # Panics
    ///
    /// Panics if `ops` has more than `u32::MAX` entries.
    pub fn children(&mut self, parent: VisualId, ops: &[ChildOp]) -> &mut Self {
        let Ok(count) = u32::try_from(ops.len()) else {
            panic!("too many child operations in one record");
        };
        self.writer.u8(TAG_CHILDREN);
        self.writer.u64(parent.0);
        self.writer.u32(count);
        for op in ops {
            op.encode(&mut self.writer);
        }
        self.records += 1;
        self
    }

    /// Creates target `id`.
    pub fn create_target(&mut self, id: TargetId) -> &mut Self {
        self.writer.u8(TAG_CREATE_TARGET);
        self.writer.u64(id.0);
        self.records += 1;
        self
    }

    /// Records property changes of one target.
    pub fn target_changes(&mut self, changes: &TargetChanges) -> &mut Self {
        self.writer.u8(TAG_TARGET_CHANGES);
        changes.encode(&mut self.writer);
        self.records += 1;
        self
    }

    /// Seals the records into a batch.
    #[must_use]
    pub fn finish(self, sequence_id: SequenceId, committed_at: HostTime) -> Batch {
        Batch {
            sequence_id,
            committed_at,
            data: self.writer.into_bytes(),
            objects: self.objects,
        }
    }
}

/// A fully decoded record, staged before it is applied.
#[derive(Debug)]
pub(crate) enum Record {
    CreateVisual { id: VisualId, kind: VisualKind },
    Visual(VisualChanges),
    Children { parent: VisualId, ops: Vec<ChildOp> },
    CreateTarget(TargetId),
    Target(TargetChanges),
}

impl Record {
    /// Decodes the next record, or returns `None` at the end of the stream.
    pub(crate) fn decode_next(
        r: &mut BatchReader<'_>,
        objects: &[BatchObject],
    ) -> Result<Option<Self>, BatchError> {
        if r.is_empty() {
            return Ok(None);
        }
        let offset = r.offset();
        let record = match r.u8()? {
            TAG_CREATE_VISUAL => {
                let id = VisualId(r.u64()?);
                let tag = r.u8()?;
                let kind = VisualKind::from_tag(tag).ok_or(BatchError::UnknownKind(tag))?;
                Self::CreateVisual { id, kind }
            }
            TAG_VISUAL_CHANGES => Self::Visual(VisualChanges::decode(r, objects)?),
            TAG_CHILDREN => {
                let parent = VisualId(r.u64()?);
                let count = r.u32()?;
                // Bounded by the remaining bytes rather than the declared count.
                let mut ops = Vec::new();
                for _ in 0..count {
                    ops.push(ChildOp::decode(r)?);
                }
                Self::Children { parent, ops }
            }
            TAG_CREATE_TARGET => Self::CreateTarget(TargetId(r.u64()?)),
            TAG_TARGET_CHANGES => Self::Target(TargetChanges::decode(r)?),
            tag => return Err(BatchError::UnknownTag { tag, offset }),
        };
        Ok(Some(record))
    }
}

// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composition targets.

use std::sync::Arc;

use kurbo::Rect;

use super::id::{TargetId, VisualId};
use crate::batch::SequenceId;
use crate::dirty::DirtyRects;
use crate::readback::{ReadbackIndices, ReadbackWriter};

/// The root of one rendered visual tree, typically a window.
///
/// A target owns the damage accumulated for its tree, the revision counter
/// bumped by every update pass and the readback indices shared with the UI
/// thread.
#[derive(Debug)]
pub struct CompositionTarget {
    id: TargetId,
    pub(crate) root: Option<VisualId>,
    pub(crate) scaling: f64,
    pub(crate) revision: u64,
    pub(crate) dirty: DirtyRects,
    pub(crate) readback: Arc<ReadbackIndices>,
    pub(crate) writer: ReadbackWriter,
    pub(crate) redraw_requested: bool,
    pub(crate) last_changed_by: Option<SequenceId>,
}

impl CompositionTarget {
    pub(crate) fn new(id: TargetId) -> Self {
        Self {
            id,
            root: None,
            scaling: 1.0,
            revision: 0,
            dirty: DirtyRects::new(),
            readback: Arc::new(ReadbackIndices::default()),
            writer: ReadbackWriter::default(),
            redraw_requested: false,
            last_changed_by: None,
        }
    }

    /// This target's id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> TargetId {
        self.id
    }

    /// The root visual, if any.
    #[inline]
    #[must_use]
    pub fn root(&self) -> Option<VisualId> {
        self.root
    }

    /// Device pixels per layout unit, applied above the root visual.
    #[inline]
    #[must_use]
    pub fn scaling(&self) -> f64 {
        self.scaling
    }

    /// Number of completed update passes.
    #[inline]
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Sequence id of the last batch that touched this target.
    #[inline]
    #[must_use]
    pub fn last_changed_by(&self) -> Option<SequenceId> {
        self.last_changed_by
    }

    /// Damage accumulated since the last drain.
    #[inline]
    #[must_use]
    pub fn dirty_rects(&self) -> &[Rect] {
        self.dirty.as_slice()
    }

    /// Readback indices to pair with a visual's readback ring.
    #[must_use]
    pub fn readback_indices(&self) -> Arc<ReadbackIndices> {
        Arc::clone(&self.readback)
    }

    /// Has a full redraw been requested since the last drain?
    #[inline]
    #[must_use]
    pub fn redraw_requested(&self) -> bool {
        self.redraw_requested
    }

    /// Requests that the next frame repaints the whole target.
    pub fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }

    /// Takes the accumulated damage and the redraw flag, leaving both clear.
    pub fn drain_damage(&mut self) -> (Vec<Rect>, bool) {
        let redraw = core::mem::replace(&mut self.redraw_requested, false);
        (self.dirty.drain(), redraw)
    }
}

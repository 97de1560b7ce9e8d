// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lock-free readback of last-rendered visual state.
//!
//! Every visual owns a [`ReadbackRing`] of three [`ReadbackSlot`]s. During
//! the update pass the render thread writes one slot per visual, always the
//! target's current *write* slot, and after the pass publishes that slot as
//! the *read* slot through the target's [`ReadbackIndices`]. The next frame
//! writes the following slot, which is never the published one nor the one
//! published just before it.
//!
//! Each slot is a sequence lock built from atomics: the writer makes the
//! sequence odd, stores the payload, then makes it even again. A reader that
//! sees an odd sequence, or a different sequence after reading the payload,
//! has observed a write in progress and retries against the currently
//! published slot. Neither side ever blocks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering, fence};

use crate::transform::Transform3d;
use crate::visual::TargetId;

/// Number of slots per ring.
pub const READBACK_SLOTS: usize = 3;

/// How often [`ReadbackRing::read`] retries after a torn read.
const MAX_READ_ATTEMPTS: usize = 8;

/// A snapshot of one visual as of a completed update pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReadbackData {
    /// The visual's combined local transform.
    pub matrix: Transform3d,
    /// Target revision of the pass that wrote the snapshot.
    pub revision: u64,
    /// Target the visual belonged to.
    pub target: TargetId,
    /// Whether the visual was visible in that frame.
    pub visible: bool,
}

/// One sequence-locked readback slot.
#[derive(Debug, Default)]
pub struct ReadbackSlot {
    seq: AtomicU64,
    matrix: [AtomicU64; 16],
    revision: AtomicU64,
    target: AtomicU64,
    visible: AtomicBool,
}

impl ReadbackSlot {
    /// Stores a snapshot. Only the render thread writes.
    pub(crate) fn write(&self, data: &ReadbackData) {
        let seq = self.seq.load(Ordering::Relaxed);
        self.seq.store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        for (dst, src) in self.matrix.iter().zip(data.matrix.cols.iter().flatten()) {
            dst.store(src.to_bits(), Ordering::Relaxed);
        }
        self.revision.store(data.revision, Ordering::Relaxed);
        self.target.store(data.target.0, Ordering::Relaxed);
        self.visible.store(data.visible, Ordering::Relaxed);

        self.seq.store(seq.wrapping_add(2), Ordering::Release);
    }

    /// Reads a consistent snapshot, or `None` if the slot was never written
    /// or a write overlapped the read.
    #[must_use]
    pub fn try_read(&self) -> Option<ReadbackData> {
        let before = self.seq.load(Ordering::Acquire);
        if before == 0 || before % 2 == 1 {
            return None;
        }

        let mut cols = [[0.0_f64; 4]; 4];
        for (dst, src) in cols.iter_mut().flatten().zip(self.matrix.iter()) {
            *dst = f64::from_bits(src.load(Ordering::Relaxed));
        }
        let revision = self.revision.load(Ordering::Relaxed);
        let target = TargetId(self.target.load(Ordering::Relaxed));
        let visible = self.visible.load(Ordering::Relaxed);

        fence(Ordering::Acquire);
        let after = self.seq.load(Ordering::Relaxed);
        (before == after).then_some(ReadbackData {
            matrix: Transform3d::from_cols_array_2d(cols),
            revision,
            target,
            visible,
        })
    }
}

/// The three readback slots of one visual.
#[derive(Debug, Default)]
pub struct ReadbackRing {
    slots: [ReadbackSlot; READBACK_SLOTS],
}

impl ReadbackRing {
    /// Returns slot `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= READBACK_SLOTS`.
    #[inline]
    #[must_use]
    pub fn slot(&self, index: usize) -> &ReadbackSlot {
        &self.slots[index]
    }

    /// Reads the snapshot published through `indices`, retrying on torn
    /// reads. Returns `None` before the first publish or if every attempt
    /// raced a writer.
    #[must_use]
    pub fn read(&self, indices: &ReadbackIndices) -> Option<ReadbackData> {
        (0..MAX_READ_ATTEMPTS).find_map(|_| self.slots[indices.read_index()].try_read())
    }
}

/// Which slot readers should use, shared between a target's render-thread
/// writer and any number of readers.
#[derive(Debug)]
pub struct ReadbackIndices {
    read_index: AtomicUsize,
    revision: AtomicU64,
}

impl Default for ReadbackIndices {
    fn default() -> Self {
        Self {
            read_index: AtomicUsize::new(READBACK_SLOTS - 1),
            revision: AtomicU64::new(0),
        }
    }
}

impl ReadbackIndices {
    /// The most recently published slot.
    #[inline]
    #[must_use]
    pub fn read_index(&self) -> usize {
        self.read_index.load(Ordering::Acquire)
    }

    /// Revision of the most recently published pass; zero before the first.
    #[inline]
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    fn publish(&self, index: usize, revision: u64) {
        self.revision.store(revision, Ordering::Release);
        self.read_index.store(index, Ordering::Release);
    }
}

/// A cloneable, `Send` reader for one visual's readback ring.
///
/// Handles stay valid after the visual is disposed; they keep returning the
/// last snapshot published for it.
#[derive(Clone, Debug)]
pub struct ReadbackHandle {
    ring: Arc<ReadbackRing>,
    indices: Arc<ReadbackIndices>,
}

impl ReadbackHandle {
    pub(crate) fn new(ring: Arc<ReadbackRing>, indices: Arc<ReadbackIndices>) -> Self {
        Self { ring, indices }
    }

    /// The visual as of the last completed update pass of its target.
    #[must_use]
    pub fn read(&self) -> Option<ReadbackData> {
        self.ring.read(&self.indices)
    }

    /// Revision of the last completed update pass of the target.
    #[inline]
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.indices.revision()
    }
}

/// Render-thread side of a target's readback rotation.
#[derive(Debug, Default)]
pub(crate) struct ReadbackWriter {
    write_index: usize,
}

impl ReadbackWriter {
    /// Slot the current pass writes into.
    #[inline]
    pub(crate) fn write_index(&self) -> usize {
        self.write_index
    }

    /// Publishes the slot just written and advances to the next one.
    pub(crate) fn complete_write(&mut self, indices: &ReadbackIndices, revision: u64) {
        indices.publish(self.write_index, revision);
        self.write_index = (self.write_index + 1) % READBACK_SLOTS;
    }
}

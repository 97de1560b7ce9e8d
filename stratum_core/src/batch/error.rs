// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batch decode and apply errors.

use thiserror::Error;

use super::SequenceId;
use crate::expr::VariantKind;
use crate::visual::{TargetId, VisualField, VisualId};

/// A malformed or inconsistent change batch.
///
/// Every variant means the client and server disagree about the protocol or
/// the object graph. The caller must stop feeding the server instead of
/// retrying: later batches were encoded against state this batch failed to
/// produce.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum BatchError {
    /// The batch does not follow the last applied one.
    #[error("batch {got:?} is not after last applied batch {last:?}")]
    OutOfOrder {
        /// Last applied sequence id.
        last: SequenceId,
        /// Offending sequence id.
        got: SequenceId,
    },
    /// The stream ended inside a record.
    #[error("batch truncated at offset {offset}: {needed} more bytes needed")]
    Truncated {
        /// Byte offset of the read.
        offset: usize,
        /// Bytes the read needed.
        needed: usize,
    },
    /// A record started with an unknown tag.
    #[error("unknown record tag {tag} at offset {offset}")]
    UnknownTag {
        /// The tag byte.
        tag: u8,
        /// Byte offset of the tag.
        offset: usize,
    },
    /// A boolean marker was neither 0 nor 1.
    #[error("invalid marker value {value} at offset {offset}")]
    InvalidMarker {
        /// The marker byte.
        value: u8,
        /// Byte offset of the marker.
        offset: usize,
    },
    /// A visual kind tag was not recognized.
    #[error("unknown visual kind {0}")]
    UnknownKind(u8),
    /// A change mask set bits no field is assigned to.
    #[error("unknown change mask bits {0:#x}")]
    UnknownMaskBits(u32),
    /// A value kind tag was not recognized.
    #[error("unknown value kind {0}")]
    UnknownValueKind(u8),
    /// A field value was encoded with a kind the field cannot hold.
    #[error("{field:?} holds {expected:?} values, got {found:?}")]
    ValueKindMismatch {
        /// The field.
        field: VisualField,
        /// The field's kind.
        expected: VariantKind,
        /// The encoded kind.
        found: VariantKind,
    },
    /// A child operation code was not recognized.
    #[error("unknown child operation {0}")]
    UnknownChildOp(u8),
    /// An object-table index was out of range.
    #[error("object index {0} out of range")]
    UnknownObject(u32),
    /// An object-table entry had the wrong type for its use.
    #[error("object {index} is not {expected}")]
    ObjectKindMismatch {
        /// The object-table index.
        index: u32,
        /// What the record expected.
        expected: &'static str,
    },
    /// A record referenced a visual that does not exist.
    #[error("unknown visual {0:?}")]
    UnknownVisual(VisualId),
    /// A record created a visual that already exists.
    #[error("visual {0:?} already exists")]
    DuplicateVisual(VisualId),
    /// A record referenced a target that does not exist.
    #[error("unknown target {0:?}")]
    UnknownTarget(TargetId),
    /// A record created a target that already exists.
    #[error("target {0:?} already exists")]
    DuplicateTarget(TargetId),
    /// A visual was added while it still had a parent.
    #[error("visual {0:?} already has a parent")]
    AlreadyParented(VisualId),
    /// A target's root visual was added as a child.
    #[error("visual {0:?} is the root of a target")]
    IsTargetRoot(VisualId),
    /// A visual was made the root of a target while parented or rooted
    /// elsewhere.
    #[error("visual {0:?} cannot become a target root")]
    InvalidRoot(VisualId),
    /// Adding the child would make a visual its own ancestor.
    #[error("adding {child:?} under {parent:?} would create a cycle")]
    Cycle {
        /// The would-be parent.
        parent: VisualId,
        /// The would-be child.
        child: VisualId,
    },
    /// A removal named a visual that is not a child of the parent.
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild {
        /// The parent.
        parent: VisualId,
        /// The missing child.
        child: VisualId,
    },
    /// An insertion index was past the end of the child list.
    #[error("child index {index} out of range for {parent:?}")]
    IndexOutOfRange {
        /// The parent.
        parent: VisualId,
        /// The offending index.
        index: u32,
    },
}

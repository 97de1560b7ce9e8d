// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visual kinds and recorded drawing content.

use kurbo::{Rect, RoundedRect};

use super::brush::Brush;
use super::id::SurfaceId;

/// What a visual draws before its children.
///
/// Every kind may have children; they paint on top of the visual's own
/// content in child order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum VisualKind {
    /// Draws nothing itself.
    #[default]
    Container = 0,
    /// Fills its bounds with its `Color` property.
    SolidColor = 1,
    /// Replays a recorded [`DrawList`].
    Content = 2,
}

impl VisualKind {
    /// Decodes a wire tag.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Container),
            1 => Some(Self::SolidColor),
            2 => Some(Self::Content),
            _ => None,
        }
    }

    /// Short lowercase name for diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::SolidColor => "solid-color",
            Self::Content => "content",
        }
    }
}

/// One recorded drawing operation, in the visual's local space.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// Fill a rectangle.
    Rectangle {
        /// Paint.
        brush: Brush,
        /// Area to fill.
        rect: Rect,
    },
    /// Fill a rounded rectangle.
    RoundedRectangle {
        /// Paint.
        brush: Brush,
        /// Area to fill.
        rect: RoundedRect,
    },
    /// Draw an external surface scaled into a rectangle.
    Surface {
        /// The surface.
        surface: SurfaceId,
        /// Destination rectangle.
        rect: Rect,
    },
}

/// Recorded content of a [`VisualKind::Content`] visual.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawList {
    /// Operations in paint order.
    pub ops: Vec<DrawOp>,
}

impl DrawList {
    /// Creates an empty draw list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an operation.
    pub fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    /// Are there no operations?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

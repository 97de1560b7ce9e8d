// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial damage tracking for partial re-rendering.

use kurbo::Rect;

/// A region of a target that needs re-rendering.
///
/// Backends can use this to only redraw areas that changed since the last
/// frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DamageRegion {
    /// The entire target needs redrawing.
    #[default]
    Full,
    /// Axis-aligned rectangles in target pixels.
    Rects(Vec<Rect>),
    /// Nothing changed; the previous frame can be reused.
    None,
}

impl DamageRegion {
    /// Builds a region from drained dirty rectangles and a full-redraw
    /// request.
    #[must_use]
    pub fn from_dirty(rects: Vec<Rect>, full: bool) -> Self {
        if full {
            Self::Full
        } else if rects.is_empty() {
            Self::None
        } else {
            Self::Rects(rects)
        }
    }

    /// Returns `true` if no region needs redrawing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Union of the damaged rectangles, or `None` for [`Full`](Self::Full)
    /// and [`None`](Self::None).
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Self::Rects(rects) => rects.iter().copied().reduce(|a, b| a.union(b)),
            Self::Full | Self::None => None,
        }
    }

    /// Merges another damage region into this one.
    pub fn merge(&mut self, other: &Self) {
        match (&mut *self, other) {
            (Self::Full, _) | (_, Self::Full) => *self = Self::Full,
            (Self::None, _) => *self = other.clone(),
            (_, Self::None) => {}
            (Self::Rects(a), Self::Rects(b)) => a.extend_from_slice(b),
        }
    }
}

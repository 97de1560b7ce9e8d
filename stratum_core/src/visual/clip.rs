// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clip geometry for visuals.

use kurbo::{Rect, RoundedRect};

/// A shape used to clip a visual's content and descendants, in the visual's
/// local coordinate space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClipShape {
    /// An axis-aligned rectangle.
    Rect(Rect),
    /// A rectangle with rounded corners.
    RoundedRect(RoundedRect),
}

impl ClipShape {
    /// The axis-aligned bounds of the shape.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        match self {
            Self::Rect(r) => *r,
            Self::RoundedRect(r) => r.rect(),
        }
    }
}

// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-rectangle accumulation.
//!
//! Every [`CompositionTarget`](crate::visual::CompositionTarget) owns one
//! [`DirtyRects`] accumulator, fed from two places:
//!
//! - **Invalidation**: when a property of a visible visual changes, the
//!   bounds it was last painted at are reported immediately, so a visual that
//!   turns invisible still repaints the area it used to cover.
//! - **The update pass**: a visual whose global transform moved reports its
//!   old bounds (if it was visible) and a visible dirty visual reports its
//!   new bounds.
//!
//! Rectangles are in target space. The render driver drains them into a
//! damage region once per frame, after the update pass and before render.

use kurbo::Rect;

/// An append-only list of target-space damage rectangles.
///
/// Degenerate input is dropped on the way in: empty or zero-area rects, rects
/// with non-finite coordinates and exact duplicates of an already recorded
/// rect.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DirtyRects {
    rects: Vec<Rect>,
}

impl DirtyRects {
    /// Creates an empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self { rects: Vec::new() }
    }

    /// Records `rect`. Returns whether it was kept.
    pub fn push(&mut self, rect: Rect) -> bool {
        let finite = rect.x0.is_finite()
            && rect.y0.is_finite()
            && rect.x1.is_finite()
            && rect.y1.is_finite();
        if !finite || rect.abs().area() <= 0.0 || self.rects.contains(&rect) {
            return false;
        }
        self.rects.push(rect);
        true
    }

    /// Records every rect from `rects`.
    pub fn extend(&mut self, rects: impl IntoIterator<Item = Rect>) {
        for rect in rects {
            self.push(rect);
        }
    }

    /// Number of recorded rects.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// Is nothing recorded?
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// The recorded rects in insertion order.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Rect] {
        &self.rects
    }

    /// Removes and returns every recorded rect.
    pub fn drain(&mut self) -> Vec<Rect> {
        core::mem::take(&mut self.rects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_rects_are_dropped() {
        let mut dirty = DirtyRects::new();
        assert!(!dirty.push(Rect::ZERO));
        assert!(!dirty.push(Rect::new(5.0, 5.0, 5.0, 20.0)), "zero width");
        assert!(!dirty.push(Rect::new(0.0, 0.0, f64::INFINITY, 1.0)));
        assert!(!dirty.push(Rect::new(0.0, f64::NAN, 1.0, 1.0)));
        assert!(dirty.is_empty());
    }

    #[test]
    fn duplicates_are_recorded_once() {
        let mut dirty = DirtyRects::new();
        let r = Rect::new(10.0, 10.0, 60.0, 60.0);
        assert!(dirty.push(r));
        assert!(!dirty.push(r));
        assert!(dirty.push(Rect::new(0.0, 0.0, 1.0, 1.0)));
        assert_eq!(dirty.len(), 2);
    }

    #[test]
    fn drain_empties() {
        let mut dirty = DirtyRects::new();
        dirty.extend([Rect::new(0.0, 0.0, 2.0, 2.0), Rect::new(1.0, 1.0, 3.0, 3.0)]);
        let drained = dirty.drain();
        assert_eq!(drained.len(), 2);
        assert!(dirty.is_empty());
        assert!(dirty.drain().is_empty());
    }
}

// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The backend drawing interface.

use kurbo::{Rect, RoundedRect};

use stratum_core::transform::Transform3d;
use stratum_core::visual::{Brush, ClipShape, SurfaceId};

/// A rendering backend the render pass issues calls against.
///
/// Geometry is given in the local space of the current transform. Every
/// `push_*` call is matched by the corresponding `pop_*` call, nested in
/// reverse order.
pub trait DrawingContext {
    /// Replaces the current transform.
    fn set_transform(&mut self, transform: &Transform3d);

    /// Starts a group composited at `opacity`.
    fn push_opacity(&mut self, opacity: f64);

    /// Ends the innermost opacity group.
    fn pop_opacity(&mut self);

    /// Clips subsequent drawing to an axis-aligned rectangle.
    fn push_clip(&mut self, rect: Rect);

    /// Ends the innermost rectangle clip.
    fn pop_clip(&mut self);

    /// Clips subsequent drawing to a shape.
    fn push_geometry_clip(&mut self, shape: &ClipShape);

    /// Ends the innermost shape clip.
    fn pop_geometry_clip(&mut self);

    /// Starts a group whose alpha is multiplied by `mask` painted over
    /// `bounds`.
    fn push_opacity_mask(&mut self, mask: &Brush, bounds: Rect);

    /// Ends the innermost opacity mask group.
    fn pop_opacity_mask(&mut self);

    /// Fills a rectangle.
    fn draw_rectangle(&mut self, brush: &Brush, rect: Rect);

    /// Fills a rounded rectangle.
    fn draw_rounded_rectangle(&mut self, brush: &Brush, rect: RoundedRect);

    /// Draws an external surface scaled into `rect`.
    fn draw_surface(&mut self, surface: SurfaceId, rect: Rect);
}

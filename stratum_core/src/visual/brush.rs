// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Colors and brushes.

use bytemuck::{Pod, Zeroable};
use kurbo::Point;

/// A straight-alpha RGBA color with `f32` components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);

    /// Creates a color from components.
    #[inline]
    #[must_use]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Component-wise blend `self + (to - self) * t`.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "color channels are stored at f32 precision"
    )]
    pub fn lerp(self, to: Self, t: f64) -> Self {
        let t = t as f32;
        Self::rgba(
            self.r + (to.r - self.r) * t,
            self.g + (to.g - self.g) * t,
            self.b + (to.b - self.b) * t,
            self.a + (to.a - self.a) * t,
        )
    }
}

/// A color stop of a gradient brush.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient, `0.0..=1.0`.
    pub offset: f64,
    /// Color at this position.
    pub color: Color,
}

/// Paint used for fills and opacity masks.
#[derive(Clone, Debug, PartialEq)]
pub enum Brush {
    /// A single color.
    Solid(Color),
    /// A linear gradient between two points in the visual's local space.
    LinearGradient {
        /// Gradient start point.
        start: Point,
        /// Gradient end point.
        end: Point,
        /// Color stops, ordered by offset.
        stops: Vec<GradientStop>,
    },
}

impl Brush {
    /// Is this brush guaranteed to paint nothing?
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        match self {
            Self::Solid(c) => c.a == 0.0,
            Self::LinearGradient { stops, .. } => stops.iter().all(|s| s.color.a == 0.0),
        }
    }
}

impl From<Color> for Brush {
    fn from(color: Color) -> Self {
        Self::Solid(color)
    }
}

// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Easing curves mapping linear progress to eased progress.

use core::f64::consts::FRAC_PI_2;

/// An easing curve over `0.0..=1.0`.
///
/// Every curve maps 0 to 0 and 1 to 1; elastic curves overshoot in between.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Easing {
    /// Identity.
    #[default]
    Linear,
    /// `p⁴`.
    QuarticEaseIn,
    /// `(p − 1)³(1 − p) + 1`.
    QuarticEaseOut,
    /// `4p³` then mirrored.
    CubicEaseInOut,
    /// `1 − √(1 − p²)`.
    CircularEaseIn,
    /// Damped sine, oscillating at both ends.
    ElasticEaseInOut,
    /// CSS-style cubic Bézier through `(0,0)`, `(x1,y1)`, `(x2,y2)`, `(1,1)`.
    CubicBezier {
        /// First control point x (clamped to `0.0..=1.0`).
        x1: f64,
        /// First control point y.
        y1: f64,
        /// Second control point x (clamped to `0.0..=1.0`).
        x2: f64,
        /// Second control point y.
        y2: f64,
    },
}

impl Easing {
    /// Maps linear progress `p` to eased progress.
    #[must_use]
    pub fn ease(self, p: f64) -> f64 {
        match self {
            Self::Linear => p,
            Self::QuarticEaseIn => p * p * p * p,
            Self::QuarticEaseOut => {
                let f = p - 1.0;
                f * f * f * (1.0 - p) + 1.0
            }
            Self::CubicEaseInOut => {
                if p < 0.5 {
                    4.0 * p * p * p
                } else {
                    let f = 2.0 * p - 2.0;
                    0.5 * f * f * f + 1.0
                }
            }
            Self::CircularEaseIn => 1.0 - (1.0 - p * p).sqrt(),
            Self::ElasticEaseInOut => {
                if p < 0.5 {
                    let t = 2.0 * p;
                    0.5 * (13.0 * FRAC_PI_2 * t).sin() * 2.0_f64.powf(10.0 * (t - 1.0))
                } else {
                    let t = 2.0 * p - 1.0;
                    0.5 * ((-13.0 * FRAC_PI_2 * (t + 1.0)).sin() * 2.0_f64.powf(-10.0 * t) + 2.0)
                }
            }
            Self::CubicBezier { x1, y1, x2, y2 } => {
                cubic_bezier(x1.clamp(0.0, 1.0), y1, x2.clamp(0.0, 1.0), y2, p)
            }
        }
    }
}

/// Solves the Bézier's x(s) = p for s, then returns y(s).
fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, p: f64) -> f64 {
    let coord = |a: f64, b: f64, s: f64| {
        let inv = 1.0 - s;
        3.0 * inv * inv * s * a + 3.0 * inv * s * s * b + s * s * s
    };
    // x(s) is monotonic for clamped control points; bisect.
    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    let mut s = p.clamp(0.0, 1.0);
    for _ in 0..48 {
        let x = coord(x1, x2, s);
        if (x - p).abs() < 1e-9 {
            break;
        }
        if x < p {
            lo = s;
        } else {
            hi = s;
        }
        s = 0.5 * (lo + hi);
    }
    coord(y1, y2, s)
}

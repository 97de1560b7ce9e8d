// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Key-frame animations.

use super::easing::Easing;
use crate::expr::Variant;
use crate::time::Duration;

/// A value pinned to a point of normalized progress.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyFrame {
    /// Position within one iteration, `0.0..=1.0`.
    pub progress: f64,
    /// Value at this position.
    pub value: Variant,
    /// Easing of the segment that ends at this key frame.
    pub easing: Easing,
}

/// How many times an animation runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IterationCount {
    /// A fixed number of iterations; zero behaves like one.
    Count(u32),
    /// Loops until replaced.
    Forever,
}

/// Direction of successive iterations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackDirection {
    /// Every iteration runs forwards.
    #[default]
    Normal,
    /// Every iteration runs backwards.
    Reverse,
    /// Even iterations forwards, odd iterations backwards.
    Alternate,
    /// Even iterations backwards, odd iterations forwards.
    AlternateReverse,
}

/// A key-frame animation description, as shipped in a change batch.
///
/// When the first key frame is after progress 0, the property's value at
/// the moment the animation starts acts as an implicit key frame at 0.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyFrameAnimation {
    /// Key frames ordered by progress.
    pub key_frames: Vec<KeyFrame>,
    /// Length of one iteration.
    pub duration: Duration,
    /// Time between the commit and the first iteration.
    pub delay: Duration,
    /// Number of iterations.
    pub iterations: IterationCount,
    /// Direction of iterations.
    pub direction: PlaybackDirection,
}

/// Where an animation is at a given elapsed time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progress {
    /// Direction-adjusted progress within the current iteration.
    pub progress: f64,
    /// Has the last iteration completed?
    pub finished: bool,
}

impl KeyFrameAnimation {
    /// A single-iteration linear blend from `from` to `to`.
    #[must_use]
    pub fn interpolation(from: Variant, to: Variant, duration: Duration) -> Self {
        Self {
            key_frames: vec![
                KeyFrame {
                    progress: 0.0,
                    value: from,
                    easing: Easing::Linear,
                },
                KeyFrame {
                    progress: 1.0,
                    value: to,
                    easing: Easing::Linear,
                },
            ],
            duration,
            delay: Duration::ZERO,
            iterations: IterationCount::Count(1),
            direction: PlaybackDirection::Normal,
        }
    }

    /// A single-iteration blend from the property's current value to `to`.
    #[must_use]
    pub fn to(to: Variant, duration: Duration, easing: Easing) -> Self {
        Self {
            key_frames: vec![KeyFrame {
                progress: 1.0,
                value: to,
                easing,
            }],
            duration,
            delay: Duration::ZERO,
            iterations: IterationCount::Count(1),
            direction: PlaybackDirection::Normal,
        }
    }

    /// Sets the easing of every segment.
    #[must_use]
    pub fn with_easing(mut self, easing: Easing) -> Self {
        for frame in &mut self.key_frames {
            frame.easing = easing;
        }
        self
    }

    /// Maps elapsed time since the commit to iteration progress.
    #[must_use]
    pub fn progress_at(&self, elapsed: Duration) -> Progress {
        let Some(active) = elapsed.ticks().checked_sub(self.delay.ticks()) else {
            return Progress {
                progress: self.directed(0, 0.0),
                finished: false,
            };
        };
        let total = Duration(active).fraction_of(self.duration);
        let (iteration, local, finished) = match self.iterations {
            IterationCount::Count(n) if total >= f64::from(n.max(1)) => (n.max(1) - 1, 1.0, true),
            _ if self.duration.is_zero() => (0, 1.0, true),
            _ => {
                let whole = total.floor();
                (saturate_u32(whole), total - whole, false)
            }
        };
        Progress {
            progress: self.directed(iteration, local),
            finished,
        }
    }

    fn directed(&self, iteration: u32, local: f64) -> f64 {
        let odd = iteration % 2 == 1;
        let forwards = match self.direction {
            PlaybackDirection::Normal => true,
            PlaybackDirection::Reverse => false,
            PlaybackDirection::Alternate => !odd,
            PlaybackDirection::AlternateReverse => odd,
        };
        if forwards { local } else { 1.0 - local }
    }

    /// Samples the key frames at `progress`.
    ///
    /// `progress` may already be eased by the caller; per-segment easing is
    /// applied on top.
    #[must_use]
    pub fn evaluate_at_progress(&self, progress: f64, starting_value: Variant) -> Variant {
        let implicit_start = KeyFrame {
            progress: 0.0,
            value: starting_value,
            easing: Easing::Linear,
        };
        let mut prev = &implicit_start;
        for frame in &self.key_frames {
            if frame.progress > progress {
                let span = frame.progress - prev.progress;
                let t = if span <= 0.0 {
                    1.0
                } else {
                    (progress - prev.progress) / span
                };
                return prev.value.lerp(frame.value, frame.easing.ease(t));
            }
            prev = frame;
        }
        prev.value
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "iteration counts beyond u32::MAX saturate"
)]
fn saturate_u32(v: f64) -> u32 {
    v.min(f64::from(u32::MAX)) as u32
}

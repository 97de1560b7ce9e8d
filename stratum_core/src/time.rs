// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositor clock types.
//!
//! [`HostTime`] is a monotonic point in time in clock ticks. Batches are
//! stamped with the `HostTime` they were committed at and the server advances
//! its own `HostTime` once per frame; animations measure elapsed time as the
//! difference of the two.
//!
//! [`Duration`] uses the same tick units. [`Timebase`] converts ticks to
//! nanoseconds for display in diagnostics.

use core::fmt;
use core::ops::{Add, Sub};

/// A point in time expressed as monotonic clock ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Converts this time to nanoseconds using the given timebase.
    #[inline]
    #[must_use]
    pub const fn to_nanos(self, timebase: Timebase) -> u64 {
        timebase.ticks_to_nanos(self.0)
    }

    /// Returns the time elapsed since `earlier`, or zero if `earlier` is
    /// in the future.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }

    /// Checked addition of a duration.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, duration: Duration) -> Option<Self> {
        match self.0.checked_add(duration.0) {
            Some(t) => Some(Self(t)),
            None => None,
        }
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for HostTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Self) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({})", self.0)
    }
}

/// Rational conversion factor from ticks to nanoseconds.
///
/// `nanoseconds = ticks * numer / denom`
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timebase {
    /// Numerator of the ticks-to-nanoseconds ratio.
    pub numer: u32,
    /// Denominator of the ticks-to-nanoseconds ratio.
    pub denom: u32,
}

impl Timebase {
    /// A timebase where ticks are already nanoseconds.
    pub const NANOS: Self = Self { numer: 1, denom: 1 };

    /// Creates a new timebase.
    ///
    /// # Panics
    ///
    /// Panics if `denom` is zero.
    #[inline]
    #[must_use]
    pub const fn new(numer: u32, denom: u32) -> Self {
        assert!(denom != 0, "timebase denominator must not be zero");
        Self { numer, denom }
    }

    /// Converts a tick count to nanoseconds.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "u128 intermediate avoids overflow; truncation back to u64 is intentional"
    )]
    pub const fn ticks_to_nanos(self, ticks: u64) -> u64 {
        (ticks as u128 * self.numer as u128 / self.denom as u128) as u64
    }

    /// Converts nanoseconds to a tick count.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "u128 intermediate avoids overflow; truncation back to u64 is intentional"
    )]
    pub const fn nanos_to_ticks(self, nanos: u64) -> u64 {
        (nanos as u128 * self.denom as u128 / self.numer as u128) as u64
    }
}

impl fmt::Debug for Timebase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timebase({}/{})", self.numer, self.denom)
    }
}

/// A duration in clock ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// A zero-length duration.
    pub const ZERO: Self = Self(0);

    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Is this duration zero?
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Creates a duration from nanoseconds using the given timebase.
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: u64, timebase: Timebase) -> Self {
        Self(timebase.nanos_to_ticks(nanos))
    }

    /// Returns `self / whole` as a floating-point fraction.
    ///
    /// A zero `whole` yields `1.0`: a zero-length span is always complete.
    #[inline]
    #[must_use]
    pub fn fraction_of(self, whole: Self) -> f64 {
        if whole.0 == 0 {
            1.0
        } else {
            self.0 as f64 / whole.0 as f64
        }
    }

    /// Saturating subtraction.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Add for Duration {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Duration {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_saturates_before_start() {
        let start = HostTime(1_000);
        assert_eq!(HostTime(1_500).saturating_duration_since(start), Duration(500));
        assert_eq!(
            HostTime(900).saturating_duration_since(start),
            Duration::ZERO,
            "a clock behind the commit time counts as no elapsed time"
        );
    }

    #[test]
    fn fraction_of_whole() {
        assert_eq!(Duration(50).fraction_of(Duration(100)), 0.5);
        assert_eq!(Duration(250).fraction_of(Duration(100)), 2.5);
        assert_eq!(Duration(7).fraction_of(Duration::ZERO), 1.0, "zero span");
    }

    #[test]
    fn timebase_conversion_round_trip() {
        let tb = Timebase::new(125, 3);
        let ticks = 24_000_000_u64;
        assert_eq!(tb.ticks_to_nanos(ticks), 1_000_000_000, "24 MHz → 1s");
        assert_eq!(Duration::from_nanos(1_000_000_000, tb).ticks(), ticks);
        assert_eq!(HostTime(ticks).to_nanos(tb), 1_000_000_000);
    }

    #[test]
    #[should_panic(expected = "timebase denominator must not be zero")]
    fn zero_denominator_panics() {
        let _ = Timebase::new(1, 0);
    }

    #[test]
    fn host_time_arithmetic() {
        let t = HostTime(1_000) + Duration(200);
        assert_eq!(t, HostTime(1_200));
        assert_eq!(t - HostTime(1_000), Duration(200));
        assert_eq!(HostTime(u64::MAX).checked_add(Duration(1)), None);
    }
}

// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property animations.
//!
//! An [`Animation`] is attached to one animatable property of a visual by a
//! change batch. On the server it becomes an instance that is initialized
//! with the batch's commit time and the property's value at that moment,
//! then evaluated whenever the property is read.
//!
//! - [`KeyFrameAnimation`]s are driven by the clock: while active and not
//!   finished they invalidate their property every frame.
//! - [`ExpressionAnimation`]s are driven by their inputs: on activation they
//!   subscribe to every property their expression references and are
//!   re-evaluated when one of those changes.
//!
//! Activation is reference counted and only the 0 → 1 and 1 → 0 edges
//! subscribe or unsubscribe.

mod easing;
mod instance;
mod keyframes;
mod store;

pub use easing::Easing;
pub use instance::{Animation, ExpressionAnimation};
pub use keyframes::{IterationCount, KeyFrame, KeyFrameAnimation, PlaybackDirection, Progress};

pub(crate) use instance::AnimationInstance;
pub(crate) use store::AnimatedProperty;

/// Server-side identity of an animation instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct AnimationId(pub(crate) u64);

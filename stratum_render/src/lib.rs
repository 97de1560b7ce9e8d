// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render pass, damage regions and frame driver for stratum.
//!
//! This crate turns an updated [`stratum_core`] visual tree into drawing
//! calls. It defines:
//!
//! - [`DrawingContext`]: the backend interface the render pass draws into
//! - [`render_target`]: the render pass over one composition target
//! - [`DamageRegion`]: what part of a target must be repainted
//! - [`RecordingContext`]: a [`DrawingContext`] that records every call
//! - [`Compositor`]: the per-frame driver (apply, tick, update, render)

#![cfg_attr(docsrs, feature(doc_cfg))]

mod compositor;
mod context;
mod damage;
mod recording;
mod render;

pub use compositor::{Compositor, CompositorOptions, Frame, TargetFrame};
pub use context::DrawingContext;
pub use damage::DamageRegion;
pub use recording::{DrawCommand, RecordingContext};
pub use render::{render_target, render_visual};

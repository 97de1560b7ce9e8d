// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Server-side visual tree.
//!
//! A *visual* is a node in a retained compositing tree. Each visual has:
//!
//! - An identity ([`VisualId`]) allocated by the client and never reused.
//! - Topology: parent, first-child and sibling links forming an ordered
//!   tree, plus the [`CompositionTarget`] the tree is attached to.
//! - **Animatable properties** ([`VisualField`]): offset, size, anchor point,
//!   center point, scale, rotation, orientation, transform matrix, opacity
//!   and color. Each holds a direct value and optionally an animation.
//! - **Plain properties**: visibility and clip-to-bounds flags, a geometry
//!   clip, an opacity mask, recorded content and the visual it adorns.
//! - **Computed state** produced by [`update_target`](VisualStore::update_target):
//!   combined and global transforms, target-space bounds, and the
//!   visible-in-frame and backface flags.
//!
//! Visuals are stored in struct-of-arrays layout and only mutated by change
//! batches (see [`batch`](crate::batch)).
//!
//! # Activation
//!
//! A visual is *active* while it is attached to a target. Activation is a
//! counter that forwards to the visual's animations on its 0 → 1 and 1 → 0
//! edges, so detached subtrees cost nothing per frame.

mod animate;
mod brush;
mod clip;
mod field;
mod id;
mod kind;
mod store;
mod target;
mod traverse;
mod update;

pub use brush::{Brush, Color, GradientStop};
pub use clip::ClipShape;
pub use field::VisualField;
pub(crate) use id::INVALID;
pub use id::{SurfaceId, TargetId, VisualId, VisualIdAllocator};
pub use kind::{DrawList, DrawOp, VisualKind};
pub use store::{DEFAULT_MAX_EVAL_DEPTH, VisualFlags, VisualStore};
pub use target::CompositionTarget;
pub use traverse::{Children, VisualRef};
pub use update::UpdateStats;

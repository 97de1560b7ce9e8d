// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visual tree, change batches, animations and readback for retained-mode
//! compositing.
//!
//! `stratum_core` is the server half of a compositor. Clients describe a tree
//! of visuals as binary change batches; the server applies them, evaluates
//! animations, computes transforms and dirty rectangles, and publishes the
//! result for lock-free readback. Visuals live in struct-of-arrays storage
//! addressed by client-chosen ids.
//!
//! # Architecture
//!
//! ```text
//!   Client thread                    Render thread
//!
//!   BatchBuilder ──► BatchSender ═══► BatchReceiver::drain()
//!                                          │
//!                                          ▼
//!                              VisualStore::apply_batch()
//!                                          │
//!                              VisualStore::tick(now)
//!                                          │
//!                              VisualStore::update_target() ──► dirty rects
//!                                          │
//!   ReadbackHandle::read() ◄══════ readback rings
//! ```
//!
//! **[`batch`]**: Change batch encoding, decoding, transport and apply.
//!
//! **[`visual`]**: The [`VisualStore`](visual::VisualStore), visual
//! properties, composition targets and the update pass.
//!
//! **[`animation`]**: Key-frame and expression animations, easing curves.
//!
//! **[`expr`]**: The expression language driving expression animations.
//!
//! **[`dirty`]**: Dirty rectangle accumulation.
//!
//! **[`readback`]**: Triple-buffered sequence-locked readback of rendered
//! visual state.
//!
//! **[`transform`]**: 3D vector, quaternion and matrix types, and the visual
//! transform composition.
//!
//! **[`time`]**: Host time in ticks.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! frame instrumentation, with a zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one
//!   branch per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates the
//!   per-target dirty rectangle event.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod animation;
pub mod batch;
pub mod dirty;
pub mod expr;
pub mod readback;
pub mod time;
pub mod trace;
pub mod transform;
pub mod visual;

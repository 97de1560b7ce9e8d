// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing, Chrome trace export and tree dumps for stratum
//! diagnostics.
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`chrome::ChromeTraceSink`]: collects events as Chrome Trace Event
//!   Format JSON.
//! - [`dump::dump_tree`]: an indented listing of a target's visual tree.

pub mod chrome;
pub mod dump;
pub mod pretty;

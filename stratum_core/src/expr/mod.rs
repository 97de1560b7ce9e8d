// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The expression language used by expression animations.
//!
//! An expression such as `this.Target.Offset.X + other.Size.X * 0.5` is
//! parsed once on the client into an [`Expr`] tree, shipped to the server in
//! a change batch, and evaluated every time one of the properties it
//! [references](Expr::references) changes.
//!
//! Values are dynamically typed [`Variant`]s. Type mismatches evaluate to
//! [`Variant::None`] instead of failing, and the animated property then
//! falls back to its type's default.

mod ast;
mod builtins;
mod parse;
mod variant;

pub use ast::{
    BinaryOp, EvalContext, Expr, ObjectRef, Parameter, Parameters, PropertyReference,
    PropertySource, UnaryOp,
};
pub use builtins::Builtin;
pub use parse::{ParseError, parse};
pub use variant::{FromVariant, Variant, VariantKind};

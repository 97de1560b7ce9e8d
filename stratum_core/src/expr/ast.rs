// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Expression trees, their evaluation and reference collection.

use std::collections::{BTreeMap, BTreeSet};

use super::builtins::Builtin;
use super::variant::Variant;
use crate::visual::VisualId;

/// A unary operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-x`
    Negate,
    /// `!x`
    Not,
}

/// A binary operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `%`
    Remainder,
    /// `<`
    Less,
    /// `<=`
    LessOrEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEqual,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `&&`
    And,
    /// `||`
    Or,
}

/// A parsed expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A literal value.
    Constant(Variant),
    /// A named entry of the animation's [`Parameters`].
    Parameter(String),
    /// `this.Target`: the visual the animation is attached to.
    Target,
    /// `this.StartingValue`: the property value when the animation started.
    StartingValue,
    /// `this.FinalValue`: the declared end value, or the starting value.
    FinalValue,
    /// `this.CurrentValue`: the property's direct value.
    CurrentValue,
    /// `object.Name`: a visual property when `object` names a visual,
    /// otherwise a value component.
    Member {
        /// The expression whose member is read.
        object: Box<Self>,
        /// Member name.
        name: String,
    },
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Self>,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Self>,
        /// Right operand.
        rhs: Box<Self>,
    },
    /// `condition ? if_true : if_false`
    Conditional {
        /// Condition; anything other than `true` selects `if_false`.
        condition: Box<Self>,
        /// Result when the condition holds.
        if_true: Box<Self>,
        /// Result otherwise.
        if_false: Box<Self>,
    },
    /// A call to a built-in function.
    Call {
        /// The function.
        function: Builtin,
        /// Arguments, in order.
        args: Vec<Self>,
    },
}

/// A named animation parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Parameter {
    /// A plain value.
    Value(Variant),
    /// A visual whose properties the expression may read.
    Object(VisualId),
}

/// The named parameters of an expression animation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Parameters {
    entries: BTreeMap<String, Parameter>,
}

impl Parameters {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value parameter.
    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<Variant>) {
        self.entries.insert(name.into(), Parameter::Value(value.into()));
    }

    /// Sets an object parameter.
    pub fn set_object(&mut self, name: impl Into<String>, object: VisualId) {
        self.entries.insert(name.into(), Parameter::Object(object));
    }

    /// Looks up a parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.entries.get(name)
    }

    /// Iterates over all parameters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Are there no parameters?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves the object an expression names, if it names one.
    #[must_use]
    pub fn resolve_object(&self, object: &ObjectRef, target: VisualId) -> Option<VisualId> {
        match object {
            ObjectRef::Target => Some(target),
            ObjectRef::Parameter(name) => match self.get(name) {
                Some(Parameter::Object(id)) => Some(*id),
                _ => None,
            },
        }
    }
}

/// The object side of a property reference.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectRef {
    /// The animation's own target.
    Target,
    /// A named parameter (resolved against [`Parameters`] at activation).
    Parameter(String),
}

/// An `(object, property)` pair an expression reads.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyReference {
    /// The object read from.
    pub object: ObjectRef,
    /// The property name.
    pub property: String,
}

/// Access to visual properties during evaluation.
pub trait PropertySource {
    /// Returns the current (animated) value of `object.property`, or
    /// [`Variant::None`] if either is unknown.
    fn property(&self, object: VisualId, property: &str) -> Variant;
}

/// Everything an expression can observe while evaluating.
pub struct EvalContext<'a> {
    /// Named parameters.
    pub parameters: &'a Parameters,
    /// The animation's target visual.
    pub target: VisualId,
    /// Property reads for `this.Target.X` and object parameters.
    pub properties: &'a dyn PropertySource,
    /// Value of the animated property when the animation started.
    pub starting_value: Variant,
    /// Declared final value (the starting value if none was given).
    pub final_value: Variant,
    /// The most recent animated value.
    pub current_value: Variant,
}

impl core::fmt::Debug for EvalContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EvalContext")
            .field("parameters", &self.parameters)
            .field("target", &self.target)
            .field("starting_value", &self.starting_value)
            .field("final_value", &self.final_value)
            .field("current_value", &self.current_value)
            .finish_non_exhaustive()
    }
}

impl Expr {
    /// Evaluates the expression.
    #[must_use]
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Variant {
        match self {
            Self::Constant(v) => *v,
            Self::Parameter(name) => match ctx.parameters.get(name) {
                Some(Parameter::Value(v)) => *v,
                _ => Variant::None,
            },
            Self::Target => Variant::None,
            Self::StartingValue => ctx.starting_value,
            Self::FinalValue => ctx.final_value,
            Self::CurrentValue => ctx.current_value,
            Self::Member { object, name } => match object
                .object_ref()
                .and_then(|o| ctx.parameters.resolve_object(&o, ctx.target))
            {
                Some(visual) => ctx.properties.property(visual, name),
                None => object.evaluate(ctx).component(name),
            },
            Self::Unary { op, operand } => {
                let v = operand.evaluate(ctx);
                match op {
                    UnaryOp::Negate => v.neg(),
                    UnaryOp::Not => v.as_bool().map_or(Variant::None, |b| Variant::Bool(!b)),
                }
            }
            Self::Binary { op, lhs, rhs } => match op {
                // Short-circuit.
                BinaryOp::And => match lhs.evaluate(ctx).as_bool() {
                    Some(false) => Variant::Bool(false),
                    Some(true) => rhs.evaluate(ctx).as_bool().map_or(Variant::None, Variant::Bool),
                    None => Variant::None,
                },
                BinaryOp::Or => match lhs.evaluate(ctx).as_bool() {
                    Some(true) => Variant::Bool(true),
                    Some(false) => rhs.evaluate(ctx).as_bool().map_or(Variant::None, Variant::Bool),
                    None => Variant::None,
                },
                op => binary(*op, lhs.evaluate(ctx), rhs.evaluate(ctx)),
            },
            Self::Conditional {
                condition,
                if_true,
                if_false,
            } => {
                if condition.evaluate(ctx) == Variant::Bool(true) {
                    if_true.evaluate(ctx)
                } else {
                    if_false.evaluate(ctx)
                }
            }
            Self::Call { function, args } => {
                let args: Vec<Variant> = args.iter().map(|a| a.evaluate(ctx)).collect();
                function.call(&args)
            }
        }
    }

    /// Collects every `(object, property)` pair this expression reads.
    #[must_use]
    pub fn references(&self) -> BTreeSet<PropertyReference> {
        let mut out = BTreeSet::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references(&self, out: &mut BTreeSet<PropertyReference>) {
        match self {
            Self::Constant(_)
            | Self::Parameter(_)
            | Self::Target
            | Self::StartingValue
            | Self::FinalValue
            | Self::CurrentValue => {}
            Self::Member { object, name } => {
                if let Some(object) = object.object_ref() {
                    out.insert(PropertyReference {
                        object,
                        property: name.clone(),
                    });
                } else {
                    object.collect_references(out);
                }
            }
            Self::Unary { operand, .. } => operand.collect_references(out),
            Self::Binary { lhs, rhs, .. } => {
                lhs.collect_references(out);
                rhs.collect_references(out);
            }
            Self::Conditional {
                condition,
                if_true,
                if_false,
            } => {
                condition.collect_references(out);
                if_true.collect_references(out);
                if_false.collect_references(out);
            }
            Self::Call { args, .. } => {
                for arg in args {
                    arg.collect_references(out);
                }
            }
        }
    }

    /// The object this expression denotes, when used as a member target.
    fn object_ref(&self) -> Option<ObjectRef> {
        match self {
            Self::Target => Some(ObjectRef::Target),
            Self::Parameter(name) => Some(ObjectRef::Parameter(name.clone())),
            _ => None,
        }
    }
}

fn binary(op: BinaryOp, a: Variant, b: Variant) -> Variant {
    let compare = |f: fn(f64, f64) -> bool| match (a, b) {
        (Variant::Scalar(x), Variant::Scalar(y)) => Variant::Bool(f(x, y)),
        _ => Variant::None,
    };
    match op {
        BinaryOp::Add => a.add(b),
        BinaryOp::Subtract => a.sub(b),
        BinaryOp::Multiply => a.mul(b),
        BinaryOp::Divide => a.div(b),
        BinaryOp::Remainder => a.rem(b),
        BinaryOp::Less => compare(|x, y| x < y),
        BinaryOp::LessOrEqual => compare(|x, y| x <= y),
        BinaryOp::Greater => compare(|x, y| x > y),
        BinaryOp::GreaterOrEqual => compare(|x, y| x >= y),
        BinaryOp::Equal => Variant::Bool(a == b),
        BinaryOp::NotEqual => Variant::Bool(a != b),
        BinaryOp::And | BinaryOp::Or => Variant::None,
    }
}

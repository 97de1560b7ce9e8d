// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Server-side animation instances.

use super::keyframes::KeyFrameAnimation;
use crate::expr::{EvalContext, Expr, Parameters, PropertySource, Variant};
use crate::time::HostTime;
use crate::visual::{VisualField, VisualId};

/// An expression animation description, as shipped in a change batch.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpressionAnimation {
    /// The expression evaluated every time a referenced property changes.
    pub expression: Expr,
    /// Named parameters visible to the expression.
    pub parameters: Parameters,
    /// Value exposed as `this.FinalValue`; defaults to the starting value.
    pub final_value: Option<Variant>,
}

impl ExpressionAnimation {
    /// Creates an expression animation without parameters.
    #[must_use]
    pub fn new(expression: Expr) -> Self {
        Self {
            expression,
            parameters: Parameters::new(),
            final_value: None,
        }
    }
}

/// Either kind of animation, as shipped in a change batch.
#[derive(Clone, Debug, PartialEq)]
pub enum Animation {
    /// Time-driven key frames.
    KeyFrames(KeyFrameAnimation),
    /// Property-driven expression.
    Expression(ExpressionAnimation),
}

impl From<KeyFrameAnimation> for Animation {
    fn from(a: KeyFrameAnimation) -> Self {
        Self::KeyFrames(a)
    }
}

impl From<ExpressionAnimation> for Animation {
    fn from(a: ExpressionAnimation) -> Self {
        Self::Expression(a)
    }
}

/// An [`Animation`] bound to one property of one visual.
#[derive(Debug)]
pub(crate) struct AnimationInstance {
    animation: Animation,
    pub(crate) target: VisualId,
    pub(crate) field: VisualField,
    started_at: HostTime,
    starting_value: Variant,
    final_value: Variant,
    /// Resolved `(visual, field)` pairs whose changes re-trigger evaluation.
    pub(crate) references: Vec<(VisualId, VisualField)>,
    activation: u32,
}

impl AnimationInstance {
    /// Binds `animation` to `target.field`, capturing the commit time and the
    /// property's value at that moment.
    pub(crate) fn initialize(
        animation: Animation,
        target: VisualId,
        field: VisualField,
        started_at: HostTime,
        starting_value: Variant,
    ) -> Self {
        let (final_value, references) = match &animation {
            Animation::KeyFrames(_) => (starting_value, Vec::new()),
            Animation::Expression(e) => {
                let references = e
                    .expression
                    .references()
                    .into_iter()
                    .filter_map(|r| {
                        let visual = e.parameters.resolve_object(&r.object, target)?;
                        let field = VisualField::from_name(&r.property)?;
                        Some((visual, field))
                    })
                    .collect();
                (e.final_value.unwrap_or(starting_value), references)
            }
        };
        Self {
            animation,
            target,
            field,
            started_at,
            starting_value,
            final_value,
            references,
            activation: 0,
        }
    }

    /// Does this animation need re-evaluation on every frame?
    pub(crate) fn is_clock_driven(&self) -> bool {
        matches!(self.animation, Animation::KeyFrames(_))
    }

    /// Has a clock-driven animation reached its end at `now`?
    pub(crate) fn is_finished(&self, now: HostTime) -> bool {
        match &self.animation {
            Animation::KeyFrames(k) => {
                k.progress_at(now.saturating_duration_since(self.started_at))
                    .finished
            }
            Animation::Expression(_) => false,
        }
    }

    /// Computes the animated value at `now`.
    pub(crate) fn evaluate(
        &self,
        now: HostTime,
        current_value: Variant,
        properties: &dyn PropertySource,
    ) -> Variant {
        match &self.animation {
            Animation::KeyFrames(k) => {
                let p = k.progress_at(now.saturating_duration_since(self.started_at));
                k.evaluate_at_progress(p.progress, self.starting_value)
            }
            Animation::Expression(e) => e.expression.evaluate(&EvalContext {
                parameters: &e.parameters,
                target: self.target,
                properties,
                starting_value: self.starting_value,
                final_value: self.final_value,
                current_value,
            }),
        }
    }

    /// Increments the activation count; returns `true` on the 0 → 1
    /// transition.
    pub(crate) fn activate(&mut self) -> bool {
        self.activation += 1;
        self.activation == 1
    }

    /// Decrements the activation count; returns `true` on the 1 → 0
    /// transition.
    pub(crate) fn deactivate(&mut self) -> bool {
        debug_assert!(self.activation != 0, "animation deactivated more often than activated");
        if self.activation == 0 {
            return false;
        }
        self.activation -= 1;
        self.activation == 0
    }

    pub(crate) fn is_active(&self) -> bool {
        self.activation > 0
    }
}

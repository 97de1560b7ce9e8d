// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Animated property reads, animation lifecycle and the animation clock.

use kurbo::Vec2;

use super::brush::Color;
use super::field::VisualField;
use super::store::VisualStore;
use crate::animation::{Animation, AnimationId, AnimationInstance};
use crate::expr::{PropertySource, Variant};
use crate::time::HostTime;
use crate::transform::{Quaternion, Transform3d, TransformInputs, Vector3};

impl VisualStore {
    /// Returns the current value of `field` of the visual at `slot`.
    ///
    /// Without an animation this is the direct value. With one, the
    /// animation is evaluated at [`now`](Self::now) against the direct value
    /// and the result cached as the starting point of a replacing animation.
    /// Reads past the evaluation depth limit see the direct value. Every read
    /// marks the field's subscription store valid.
    pub(crate) fn animated(&self, slot: u32, field: VisualField) -> Variant {
        let prop = &self.fields[slot as usize][field.index()];
        prop.subscriptions.mark_valid();
        let Some(instance) = prop.animation.and_then(|a| self.animations.get(&a)) else {
            return prop.direct;
        };
        let depth = self.eval_depth.get();
        if depth >= self.max_eval_depth {
            return prop.direct;
        }
        self.eval_depth.set(depth + 1);
        let value = instance.evaluate(self.now, prop.direct, self);
        self.eval_depth.set(depth);
        prop.last_animated.set(Some(value));
        value
    }

    pub(crate) fn offset_at(&self, slot: u32) -> Vector3 {
        self.animated(slot, VisualField::Offset)
            .cast()
            .unwrap_or(Vector3::ZERO)
    }

    pub(crate) fn size_at(&self, slot: u32) -> Vec2 {
        self.animated(slot, VisualField::Size)
            .cast()
            .unwrap_or(Vec2::ZERO)
    }

    pub(crate) fn anchor_point_at(&self, slot: u32) -> Vec2 {
        self.animated(slot, VisualField::AnchorPoint)
            .cast()
            .unwrap_or(Vec2::ZERO)
    }

    pub(crate) fn center_point_at(&self, slot: u32) -> Vector3 {
        self.animated(slot, VisualField::CenterPoint)
            .cast()
            .unwrap_or(Vector3::ZERO)
    }

    pub(crate) fn scale_at(&self, slot: u32) -> Vector3 {
        self.animated(slot, VisualField::Scale)
            .cast()
            .unwrap_or(Vector3::ONE)
    }

    pub(crate) fn rotation_angle_at(&self, slot: u32) -> f64 {
        self.animated(slot, VisualField::RotationAngle)
            .as_scalar()
            .unwrap_or(0.0)
    }

    pub(crate) fn orientation_at(&self, slot: u32) -> Quaternion {
        self.animated(slot, VisualField::Orientation)
            .cast()
            .unwrap_or(Quaternion::IDENTITY)
    }

    pub(crate) fn transform_matrix_at(&self, slot: u32) -> Transform3d {
        self.animated(slot, VisualField::TransformMatrix)
            .cast()
            .unwrap_or(Transform3d::IDENTITY)
    }

    pub(crate) fn opacity_at(&self, slot: u32) -> f64 {
        self.animated(slot, VisualField::Opacity)
            .as_scalar()
            .unwrap_or(1.0)
    }

    pub(crate) fn color_at(&self, slot: u32) -> Color {
        self.animated(slot, VisualField::Color)
            .cast()
            .unwrap_or(Color::TRANSPARENT)
    }

    /// Gathers the inputs of the visual's combined local transform.
    pub(crate) fn transform_inputs(&self, slot: u32) -> TransformInputs {
        TransformInputs {
            size: self.size_at(slot),
            anchor_point: self.anchor_point_at(slot),
            center_point: self.center_point_at(slot),
            transform_matrix: self.transform_matrix_at(slot),
            scale: self.scale_at(slot),
            rotation_angle: self.rotation_angle_at(slot),
            orientation: self.orientation_at(slot),
            offset: self.offset_at(slot),
        }
    }

    // -- Animation lifecycle --

    /// Stores a new direct value for `field`, dropping its animation.
    pub(crate) fn set_direct(&mut self, slot: u32, field: VisualField, value: Variant) {
        let i = slot as usize;
        if let Some(old) = self.fields[i][field.index()].animation.take() {
            self.remove_animation(old);
        }
        let prop = &mut self.fields[i][field.index()];
        prop.last_animated.set(None);
        prop.direct = value;
        self.property_changed(slot, field);
    }

    /// Replaces the animation of `field`, or removes it with `None`.
    ///
    /// The new animation starts from the property's current value and
    /// measures time from `started_at`.
    pub(crate) fn set_animation(
        &mut self,
        slot: u32,
        field: VisualField,
        animation: Option<Animation>,
        started_at: HostTime,
    ) {
        let i = slot as usize;
        let starting_value = self.fields[i][field.index()].last_value();
        if let Some(old) = self.fields[i][field.index()].animation.take() {
            self.remove_animation(old);
        }
        let prop = &mut self.fields[i][field.index()];
        prop.last_animated.set(None);
        if let Some(animation) = animation {
            let id = AnimationId(self.next_animation);
            self.next_animation += 1;
            self.animations.insert(
                id,
                AnimationInstance::initialize(
                    animation,
                    self.ids[i],
                    field,
                    started_at,
                    starting_value,
                ),
            );
            prop.animation = Some(id);
            if self.activation[i] > 0 {
                self.activate_animation(id);
            }
        }
        self.property_changed(slot, field);
    }

    /// Deactivates (if needed) and drops an animation instance.
    pub(crate) fn remove_animation(&mut self, id: AnimationId) {
        while self
            .animations
            .get(&id)
            .is_some_and(AnimationInstance::is_active)
        {
            self.deactivate_animation(id);
        }
        self.animations.remove(&id);
        self.clock.remove(&id);
    }

    /// Increments the activation count of the visual at `slot`; the first
    /// activation activates its animations.
    pub(crate) fn activate_visual(&mut self, slot: u32) {
        let i = slot as usize;
        self.activation[i] += 1;
        if self.activation[i] != 1 {
            return;
        }
        for field in VisualField::ALL {
            if let Some(animation) = self.fields[i][field.index()].animation {
                self.activate_animation(animation);
            }
        }
    }

    /// Decrements the activation count of the visual at `slot`; the last
    /// deactivation deactivates its animations.
    pub(crate) fn deactivate_visual(&mut self, slot: u32) {
        let i = slot as usize;
        debug_assert!(
            self.activation[i] != 0,
            "visual deactivated more often than activated"
        );
        if self.activation[i] == 0 {
            return;
        }
        self.activation[i] -= 1;
        if self.activation[i] != 0 {
            return;
        }
        for field in VisualField::ALL {
            if let Some(animation) = self.fields[i][field.index()].animation {
                self.deactivate_animation(animation);
            }
        }
    }

    /// On the first activation, subscribes to every referenced property and
    /// starts the clock for time-driven animations.
    pub(crate) fn activate_animation(&mut self, id: AnimationId) {
        let Some(instance) = self.animations.get_mut(&id) else {
            return;
        };
        if !instance.activate() {
            return;
        }
        if instance.is_clock_driven() {
            self.clock.insert(id);
        }
        for &(visual, field) in &instance.references {
            if let Some(&slot) = self.slots.get(&visual) {
                self.fields[slot as usize][field.index()]
                    .subscriptions
                    .subscribe(id);
            }
        }
    }

    /// On the last deactivation, undoes [`activate_animation`](Self::activate_animation).
    pub(crate) fn deactivate_animation(&mut self, id: AnimationId) {
        let Some(instance) = self.animations.get_mut(&id) else {
            return;
        };
        if !instance.deactivate() {
            return;
        }
        self.clock.remove(&id);
        for &(visual, field) in &instance.references {
            if let Some(&slot) = self.slots.get(&visual) {
                self.fields[slot as usize][field.index()]
                    .subscriptions
                    .unsubscribe(id);
            }
        }
    }

    /// Advances the animation clock to `now`.
    ///
    /// Every running time-driven animation invalidates its property. An
    /// animation that has finished invalidates one last time, then leaves
    /// the clock and holds its final value.
    pub fn tick(&mut self, now: HostTime) {
        self.now = now;
        let running: Vec<AnimationId> = self.clock.iter().copied().collect();
        for id in running {
            let Some(instance) = self.animations.get(&id) else {
                self.clock.remove(&id);
                continue;
            };
            let finished = instance.is_finished(now);
            let (target, field) = (instance.target, instance.field);
            if let Some(&slot) = self.slots.get(&target) {
                self.property_changed(slot, field);
            }
            if finished {
                self.clock.remove(&id);
            }
        }
    }

    /// Number of animations currently driven by the clock.
    #[must_use]
    pub fn running_animations(&self) -> usize {
        self.clock.len()
    }
}

impl PropertySource for VisualStore {
    fn property(&self, object: crate::visual::VisualId, property: &str) -> Variant {
        let Some(&slot) = self.slots.get(&object) else {
            return Variant::None;
        };
        if let Some(field) = VisualField::from_name(property) {
            return self.animated(slot, field);
        }
        let flags = self.flags[slot as usize];
        match property {
            "Visible" => Variant::Bool(flags.visible),
            "ClipToBounds" => Variant::Bool(flags.clip_to_bounds),
            _ => Variant::None,
        }
    }
}

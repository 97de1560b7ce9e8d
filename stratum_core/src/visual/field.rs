// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Animatable visual properties.

use kurbo::Vec2;

use super::brush::Color;
use crate::expr::{Variant, VariantKind};
use crate::transform::{Quaternion, Transform3d, Vector3};

/// An animatable property of a visual.
///
/// The discriminant indexes the per-visual property array and determines the
/// property's bits in a change mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum VisualField {
    /// Translation applied last.
    Offset,
    /// Width and height of the visual's bounds.
    Size,
    /// Fraction of `Size` placed at `Offset`.
    AnchorPoint,
    /// Pivot for scale and rotations.
    CenterPoint,
    /// Scale about the center point.
    Scale,
    /// Rotation about Z, in radians.
    RotationAngle,
    /// 3-D orientation about the center point.
    Orientation,
    /// Arbitrary local transform.
    TransformMatrix,
    /// Opacity multiplier.
    Opacity,
    /// Fill color of solid-color visuals.
    Color,
}

impl VisualField {
    /// Number of animatable fields.
    pub const COUNT: usize = 10;

    /// Every field, in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Offset,
        Self::Size,
        Self::AnchorPoint,
        Self::CenterPoint,
        Self::Scale,
        Self::RotationAngle,
        Self::Orientation,
        Self::TransformMatrix,
        Self::Opacity,
        Self::Color,
    ];

    /// Index into per-visual property arrays.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The property name used by expressions.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Offset => "Offset",
            Self::Size => "Size",
            Self::AnchorPoint => "AnchorPoint",
            Self::CenterPoint => "CenterPoint",
            Self::Scale => "Scale",
            Self::RotationAngle => "RotationAngle",
            Self::Orientation => "Orientation",
            Self::TransformMatrix => "TransformMatrix",
            Self::Opacity => "Opacity",
            Self::Color => "Color",
        }
    }

    /// Looks up a field by its expression name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// The value type of this field.
    #[must_use]
    pub const fn kind(self) -> VariantKind {
        match self {
            Self::Offset | Self::CenterPoint | Self::Scale => VariantKind::Vector3,
            Self::Size | Self::AnchorPoint => VariantKind::Vector2,
            Self::RotationAngle | Self::Opacity => VariantKind::Scalar,
            Self::Orientation => VariantKind::Quaternion,
            Self::TransformMatrix => VariantKind::Matrix,
            Self::Color => VariantKind::Color,
        }
    }

    /// The value a new visual starts with.
    #[must_use]
    pub const fn default_value(self) -> Variant {
        match self {
            Self::Offset | Self::CenterPoint => Variant::Vector3(Vector3::ZERO),
            Self::Scale => Variant::Vector3(Vector3::ONE),
            Self::Size | Self::AnchorPoint => Variant::Vector2(Vec2::ZERO),
            Self::RotationAngle => Variant::Scalar(0.0),
            Self::Opacity => Variant::Scalar(1.0),
            Self::Orientation => Variant::Quaternion(Quaternion::IDENTITY),
            Self::TransformMatrix => Variant::Matrix(Transform3d::IDENTITY),
            Self::Color => Variant::Color(Color::TRANSPARENT),
        }
    }

    /// Change-mask bit announcing a new direct value.
    #[inline]
    #[must_use]
    pub const fn value_bit(self) -> u32 {
        1 << (2 * self.index())
    }

    /// Change-mask bit announcing a new animation.
    #[inline]
    #[must_use]
    pub const fn animation_bit(self) -> u32 {
        1 << (2 * self.index() + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_in_index_order() {
        for (i, field) in VisualField::ALL.into_iter().enumerate() {
            assert_eq!(field.index(), i);
            assert_eq!(VisualField::from_name(field.name()), Some(field));
            assert_eq!(field.default_value().kind(), field.kind(), "{field:?}");
        }
    }

    #[test]
    fn mask_bits_are_disjoint() {
        let mut seen = 0_u32;
        for field in VisualField::ALL {
            for bit in [field.value_bit(), field.animation_bit()] {
                assert_eq!(seen & bit, 0, "{field:?} reuses a bit");
                seen |= bit;
            }
        }
        assert!(seen < 1 << 20, "animatable fields fit in the low 20 bits");
    }
}

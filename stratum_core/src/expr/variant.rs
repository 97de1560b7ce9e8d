// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dynamically typed values flowing through expressions and animations.

use kurbo::Vec2;

use crate::transform::{Quaternion, Transform3d, Vector3};
use crate::visual::Color;

/// The type tag of a [`Variant`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VariantKind {
    /// No value.
    None,
    /// Boolean.
    Bool,
    /// Scalar.
    Scalar,
    /// 2-component vector.
    Vector2,
    /// 3-component vector.
    Vector3,
    /// 4-component vector.
    Vector4,
    /// Rotation quaternion.
    Quaternion,
    /// 4×4 matrix.
    Matrix,
    /// RGBA color.
    Color,
}

/// A value of one of the types expressions and animations operate on.
///
/// Operations between mismatched types produce [`Variant::None`] rather than
/// failing; a `None` result is then cast to the target field's default.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Variant {
    /// No value.
    #[default]
    None,
    /// Boolean.
    Bool(bool),
    /// Scalar.
    Scalar(f64),
    /// 2-component vector.
    Vector2(Vec2),
    /// 3-component vector.
    Vector3(Vector3),
    /// 4-component vector.
    Vector4([f64; 4]),
    /// Rotation quaternion.
    Quaternion(Quaternion),
    /// 4×4 matrix.
    Matrix(Transform3d),
    /// RGBA color.
    Color(Color),
}

impl Variant {
    /// Returns this value's type tag.
    #[must_use]
    pub const fn kind(&self) -> VariantKind {
        match self {
            Self::None => VariantKind::None,
            Self::Bool(_) => VariantKind::Bool,
            Self::Scalar(_) => VariantKind::Scalar,
            Self::Vector2(_) => VariantKind::Vector2,
            Self::Vector3(_) => VariantKind::Vector3,
            Self::Vector4(_) => VariantKind::Vector4,
            Self::Quaternion(_) => VariantKind::Quaternion,
            Self::Matrix(_) => VariantKind::Matrix,
            Self::Color(_) => VariantKind::Color,
        }
    }

    /// Is this [`Variant::None`]?
    #[inline]
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Converts to `T`, or `T::default()` on a type mismatch.
    #[must_use]
    pub fn cast_or_default<T: FromVariant + Default>(self) -> T {
        T::from_variant(self).unwrap_or_default()
    }

    /// Converts to `T` if the types match.
    #[must_use]
    pub fn cast<T: FromVariant>(self) -> Option<T> {
        T::from_variant(self)
    }

    /// Returns the scalar payload, if any.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the boolean payload, if any.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Reads a named component: `X`/`Y`/`Z`/`W` on vectors and quaternions,
    /// `XY` on 3- and 4-vectors, `A`/`R`/`G`/`B` on colors and `M11`..`M44`
    /// (row-vector numbering) on matrices.
    #[must_use]
    pub fn component(&self, name: &str) -> Self {
        let scalar = |v: f64| Self::Scalar(v);
        match (self, name) {
            (Self::Vector2(v), "X") => scalar(v.x),
            (Self::Vector2(v), "Y") => scalar(v.y),
            (Self::Vector3(v), "X") => scalar(v.x),
            (Self::Vector3(v), "Y") => scalar(v.y),
            (Self::Vector3(v), "Z") => scalar(v.z),
            (Self::Vector3(v), "XY") => Self::Vector2(Vec2::new(v.x, v.y)),
            (Self::Vector4(v), "X") => scalar(v[0]),
            (Self::Vector4(v), "Y") => scalar(v[1]),
            (Self::Vector4(v), "Z") => scalar(v[2]),
            (Self::Vector4(v), "W") => scalar(v[3]),
            (Self::Vector4(v), "XY") => Self::Vector2(Vec2::new(v[0], v[1])),
            (Self::Vector4(v), "XYZ") => Self::Vector3(Vector3::new(v[0], v[1], v[2])),
            (Self::Quaternion(q), "X") => scalar(q.x),
            (Self::Quaternion(q), "Y") => scalar(q.y),
            (Self::Quaternion(q), "Z") => scalar(q.z),
            (Self::Quaternion(q), "W") => scalar(q.w),
            (Self::Color(c), "A") => scalar(f64::from(c.a)),
            (Self::Color(c), "R") => scalar(f64::from(c.r)),
            (Self::Color(c), "G") => scalar(f64::from(c.g)),
            (Self::Color(c), "B") => scalar(f64::from(c.b)),
            (Self::Matrix(m), name) => matrix_element(m, name).map_or(Self::None, scalar),
            _ => Self::None,
        }
    }

    /// Blends `self` towards `to` by `t`. Quaternions use spherical
    /// interpolation; booleans switch at the end of the span.
    #[must_use]
    pub fn lerp(self, to: Self, t: f64) -> Self {
        let mix = |a: f64, b: f64| a + (b - a) * t;
        match (self, to) {
            (Self::Scalar(a), Self::Scalar(b)) => Self::Scalar(mix(a, b)),
            (Self::Vector2(a), Self::Vector2(b)) => Self::Vector2(a.lerp(b, t)),
            (Self::Vector3(a), Self::Vector3(b)) => {
                Self::Vector3(Vector3::new(mix(a.x, b.x), mix(a.y, b.y), mix(a.z, b.z)))
            }
            (Self::Vector4(a), Self::Vector4(b)) => Self::Vector4(core::array::from_fn(|i| mix(a[i], b[i]))),
            (Self::Quaternion(a), Self::Quaternion(b)) => Self::Quaternion(a.slerp(b, t)),
            (Self::Matrix(a), Self::Matrix(b)) => Self::Matrix(a.lerp(b, t)),
            (Self::Color(a), Self::Color(b)) => Self::Color(a.lerp(b, t)),
            (Self::Bool(a), Self::Bool(b)) => Self::Bool(if t < 1.0 { a } else { b }),
            _ => Self::None,
        }
    }

    /// Applies `f` to every numeric component, for vector-shaped values.
    #[must_use]
    pub(crate) fn map_components(self, f: impl Fn(f64) -> f64) -> Self {
        match self {
            Self::Scalar(v) => Self::Scalar(f(v)),
            Self::Vector2(v) => Self::Vector2(Vec2::new(f(v.x), f(v.y))),
            Self::Vector3(v) => Self::Vector3(Vector3::new(f(v.x), f(v.y), f(v.z))),
            Self::Vector4(v) => Self::Vector4(v.map(f)),
            _ => Self::None,
        }
    }

    /// Combines the numeric components of two same-shaped values, or a
    /// scalar with every component of a vector.
    #[must_use]
    pub(crate) fn zip_components(self, other: Self, f: impl Fn(f64, f64) -> f64) -> Self {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => Self::Scalar(f(a, b)),
            (Self::Vector2(a), Self::Vector2(b)) => Self::Vector2(Vec2::new(f(a.x, b.x), f(a.y, b.y))),
            (Self::Vector3(a), Self::Vector3(b)) => {
                Self::Vector3(Vector3::new(f(a.x, b.x), f(a.y, b.y), f(a.z, b.z)))
            }
            (Self::Vector4(a), Self::Vector4(b)) => Self::Vector4(core::array::from_fn(|i| f(a[i], b[i]))),
            (v, Self::Scalar(s)) if v.is_vector() => v.map_components(|c| f(c, s)),
            (Self::Scalar(s), v) if v.is_vector() => v.map_components(|c| f(s, c)),
            _ => Self::None,
        }
    }

    const fn is_vector(&self) -> bool {
        matches!(self, Self::Vector2(_) | Self::Vector3(_) | Self::Vector4(_))
    }

    /// Sum; colors add per channel and matrices element-wise.
    #[must_use]
    pub fn add(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::Color(a), Self::Color(b)) => {
                Self::Color(Color::rgba(a.r + b.r, a.g + b.g, a.b + b.b, a.a + b.a))
            }
            (Self::Matrix(a), Self::Matrix(b)) => {
                let mut cols = a.cols;
                for (col, b_col) in cols.iter_mut().zip(b.cols) {
                    for (v, bv) in col.iter_mut().zip(b_col) {
                        *v += bv;
                    }
                }
                Self::Matrix(Transform3d::from_cols_array_2d(cols))
            }
            (a, b) if a.kind() == b.kind() => a.zip_components(b, |x, y| x + y),
            _ => Self::None,
        }
    }

    /// Difference of same-shaped values.
    #[must_use]
    pub fn sub(self, rhs: Self) -> Self {
        match (self, rhs) {
            (a, b) if a.kind() == b.kind() => a.zip_components(b, |x, y| x - y),
            _ => Self::None,
        }
    }

    /// Product: component-wise for vectors, scalar broadcasting, matrix and
    /// quaternion composition.
    #[must_use]
    pub fn mul(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::Matrix(a), Self::Matrix(b)) => Self::Matrix(a * b),
            (Self::Matrix(m), Self::Scalar(s)) | (Self::Scalar(s), Self::Matrix(m)) => {
                Self::Matrix(Transform3d::from_cols_array_2d(m.cols.map(|c| c.map(|v| v * s))))
            }
            (Self::Quaternion(a), Self::Quaternion(b)) => Self::Quaternion(Quaternion::new(
                a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
                a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
                a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
                a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
            )),
            (Self::Color(c), Self::Scalar(s)) | (Self::Scalar(s), Self::Color(c)) => {
                // Scales every channel, alpha included.
                Self::Color(Color::TRANSPARENT.lerp(c, s))
            }
            (a, b) => a.zip_components(b, |x, y| x * y),
        }
    }

    /// Quotient with scalar broadcasting on the right.
    #[must_use]
    pub fn div(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::Scalar(_), v) if v.is_vector() => Self::None,
            (a, b) => a.zip_components(b, |x, y| x / y),
        }
    }

    /// Floating-point remainder of scalars.
    #[must_use]
    pub fn rem(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::Scalar(a), Self::Scalar(b)) => Self::Scalar(a % b),
            _ => Self::None,
        }
    }

    /// Negation of numeric values.
    #[must_use]
    pub fn neg(self) -> Self {
        self.map_components(|v| -v)
    }
}

fn matrix_element(m: &Transform3d, name: &str) -> Option<f64> {
    let digits = name.strip_prefix('M')?.as_bytes();
    if digits.len() != 2 {
        return None;
    }
    let row = usize::from(digits[0].checked_sub(b'1')?);
    let col = usize::from(digits[1].checked_sub(b'1')?);
    // Row-vector `Mrc` is column-vector element (c, r), i.e. `cols[r][c]`.
    (row < 4 && col < 4).then(|| m.cols[row][col])
}

/// Types that can be extracted from a [`Variant`] of matching kind.
pub trait FromVariant: Sized {
    /// Returns the payload if `v` holds this type.
    fn from_variant(v: Variant) -> Option<Self>;
}

macro_rules! variant_conversions {
    ($($ty:ty => $arm:ident),* $(,)?) => {
        $(
            impl FromVariant for $ty {
                #[inline]
                fn from_variant(v: Variant) -> Option<Self> {
                    match v {
                        Variant::$arm(x) => Some(x),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for Variant {
                #[inline]
                fn from(x: $ty) -> Self {
                    Self::$arm(x)
                }
            }
        )*
    };
}

variant_conversions! {
    bool => Bool,
    f64 => Scalar,
    Vec2 => Vector2,
    Vector3 => Vector3,
    [f64; 4] => Vector4,
    Quaternion => Quaternion,
    Transform3d => Matrix,
    Color => Color,
}

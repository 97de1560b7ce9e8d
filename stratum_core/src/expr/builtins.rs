// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Built-in functions callable from expressions.

use kurbo::Vec2;

use super::variant::Variant;
use crate::transform::{Quaternion, Transform3d, Vector3};
use crate::visual::Color;

macro_rules! builtins {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// A function callable from an expression.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum Builtin {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )*
        }

        impl Builtin {
            /// Every built-in, in declaration order.
            pub const ALL: &[Self] = &[$(Self::$variant),*];

            /// The name used to call this function.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }
        }
    };
}

builtins! {
    Abs => "Abs",
    Acos => "Acos",
    Asin => "Asin",
    Atan => "Atan",
    Ceil => "Ceil",
    Clamp => "Clamp",
    ColorLerp => "ColorLerp",
    ColorRgb => "ColorRgb",
    Cos => "Cos",
    Distance => "Distance",
    Floor => "Floor",
    Length => "Length",
    Lerp => "Lerp",
    Ln => "Ln",
    Log10 => "Log10",
    Max => "Max",
    Min => "Min",
    Mod => "Mod",
    Normalize => "Normalize",
    Pow => "Pow",
    Quaternion => "Quaternion",
    Round => "Round",
    Scale => "Scale",
    Sin => "Sin",
    Slerp => "Slerp",
    Sqrt => "Sqrt",
    Square => "Square",
    Tan => "Tan",
    ToDegrees => "ToDegrees",
    ToRadians => "ToRadians",
    Translation => "Translation",
    Vector2 => "Vector2",
    Vector3 => "Vector3",
    Vector4 => "Vector4",
}

impl Builtin {
    /// Looks up a function by name, ignoring ASCII case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|b| b.name().eq_ignore_ascii_case(name))
    }

    /// Calls the function. Wrong arity or argument types yield
    /// [`Variant::None`].
    #[must_use]
    pub fn call(self, args: &[Variant]) -> Variant {
        match (self, args) {
            (Self::Abs, [v]) => v.map_components(f64::abs),
            (Self::Acos, [v]) => v.map_components(f64::acos),
            (Self::Asin, [v]) => v.map_components(f64::asin),
            (Self::Atan, [v]) => v.map_components(f64::atan),
            (Self::Ceil, [v]) => v.map_components(f64::ceil),
            (Self::Cos, [v]) => v.map_components(f64::cos),
            (Self::Floor, [v]) => v.map_components(f64::floor),
            (Self::Ln, [v]) => v.map_components(f64::ln),
            (Self::Log10, [v]) => v.map_components(f64::log10),
            (Self::Round, [v]) => v.map_components(f64::round),
            (Self::Sin, [v]) => v.map_components(f64::sin),
            (Self::Sqrt, [v]) => v.map_components(f64::sqrt),
            (Self::Square, [v]) => v.map_components(|x| x * x),
            (Self::Tan, [v]) => v.map_components(f64::tan),
            (Self::ToDegrees, [v]) => v.map_components(f64::to_degrees),
            (Self::ToRadians, [v]) => v.map_components(f64::to_radians),
            (Self::Max, [a, b]) => a.zip_components(*b, f64::max),
            (Self::Min, [a, b]) => a.zip_components(*b, f64::min),
            (Self::Mod, [a, b]) => a.rem(*b),
            (Self::Pow, [a, b]) => a.zip_components(*b, f64::powf),
            (Self::Clamp, [v, lo, hi]) => v.zip_components(*lo, f64::max).zip_components(*hi, f64::min),
            (Self::Lerp | Self::ColorLerp | Self::Slerp, [a, b, Variant::Scalar(t)]) => a.lerp(*b, *t),
            (Self::Length, [v]) => length(*v).map_or(Variant::None, Variant::Scalar),
            (Self::Distance, [a, b]) => length(b.sub(*a)).map_or(Variant::None, Variant::Scalar),
            (Self::Normalize, [Variant::Quaternion(q)]) => Variant::Quaternion(q.normalize()),
            (Self::Normalize, [v]) => match length(*v) {
                Some(len) if len != 0.0 => v.map_components(|x| x / len),
                _ => Variant::None,
            },
            (Self::Vector2, [x, y]) => match (x.as_scalar(), y.as_scalar()) {
                (Some(x), Some(y)) => Variant::Vector2(Vec2::new(x, y)),
                _ => Variant::None,
            },
            (Self::Vector3, [x, y, z]) => match scalars::<3>(&[*x, *y, *z]) {
                Some([x, y, z]) => Variant::Vector3(Vector3::new(x, y, z)),
                None => Variant::None,
            },
            (Self::Vector4, [x, y, z, w]) => {
                scalars::<4>(&[*x, *y, *z, *w]).map_or(Variant::None, Variant::Vector4)
            }
            (Self::Quaternion, [x, y, z, w]) => match scalars::<4>(&[*x, *y, *z, *w]) {
                Some([x, y, z, w]) => Variant::Quaternion(Quaternion::new(x, y, z, w)),
                None => Variant::None,
            },
            (Self::ColorRgb, [a, r, g, b]) => match scalars::<4>(&[*a, *r, *g, *b]) {
                Some(argb) => Variant::Color(color_from_argb(argb)),
                None => Variant::None,
            },
            (Self::Scale, [Variant::Vector3(s)]) => {
                Variant::Matrix(Transform3d::from_scale(s.x, s.y, s.z))
            }
            (Self::Translation, [Variant::Vector3(t)]) => {
                Variant::Matrix(Transform3d::from_translation(t.x, t.y, t.z))
            }
            _ => Variant::None,
        }
    }
}

fn length(v: Variant) -> Option<f64> {
    match v {
        Variant::Scalar(x) => Some(x.abs()),
        Variant::Vector2(v) => Some(v.hypot()),
        Variant::Vector3(v) => Some(v.length()),
        Variant::Vector4(v) => Some(v.iter().map(|x| x * x).sum::<f64>().sqrt()),
        Variant::Quaternion(q) => Some(q.dot(q).sqrt()),
        _ => None,
    }
}

fn scalars<const N: usize>(args: &[Variant; N]) -> Option<[f64; N]> {
    let mut out = [0.0; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg.as_scalar()?;
    }
    Some(out)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "color channels are stored at f32 precision"
)]
fn color_from_argb([a, r, g, b]: [f64; 4]) -> Color {
    // Channels are given as 0..=255 bytes.
    Color::rgba(
        (r / 255.0) as f32,
        (g / 255.0) as f32,
        (b / 255.0) as f32,
        (a / 255.0) as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(Builtin::from_name("lerp"), Some(Builtin::Lerp));
        assert_eq!(Builtin::from_name("VECTOR3"), Some(Builtin::Vector3));
        assert_eq!(Builtin::from_name("Frobnicate"), None);
    }

    #[test]
    fn names_are_unique() {
        for (i, a) in Builtin::ALL.iter().enumerate() {
            for b in &Builtin::ALL[i + 1..] {
                assert_ne!(a.name(), b.name(), "duplicate builtin name");
            }
        }
    }

    #[test]
    fn scalar_math() {
        assert_eq!(Builtin::Abs.call(&[Variant::Scalar(-2.0)]), Variant::Scalar(2.0));
        assert_eq!(
            Builtin::Clamp.call(&[Variant::Scalar(12.0), Variant::Scalar(0.0), Variant::Scalar(10.0)]),
            Variant::Scalar(10.0)
        );
        assert_eq!(
            Builtin::Lerp.call(&[Variant::Scalar(0.0), Variant::Scalar(10.0), Variant::Scalar(0.25)]),
            Variant::Scalar(2.5)
        );
    }

    #[test]
    fn constructors() {
        assert_eq!(
            Builtin::Vector3.call(&[Variant::Scalar(1.0), Variant::Scalar(2.0), Variant::Scalar(3.0)]),
            Variant::Vector3(Vector3::new(1.0, 2.0, 3.0))
        );
        assert_eq!(
            Builtin::ColorRgb.call(&[
                Variant::Scalar(255.0),
                Variant::Scalar(255.0),
                Variant::Scalar(0.0),
                Variant::Scalar(0.0),
            ]),
            Variant::Color(Color::rgba(1.0, 0.0, 0.0, 1.0))
        );
    }

    #[test]
    fn vector_length_and_distance() {
        let a = Variant::Vector2(Vec2::new(3.0, 4.0));
        assert_eq!(Builtin::Length.call(&[a]), Variant::Scalar(5.0));
        assert_eq!(
            Builtin::Distance.call(&[Variant::Vector2(Vec2::ZERO), a]),
            Variant::Scalar(5.0)
        );
    }

    #[test]
    fn wrong_arity_is_none() {
        assert!(Builtin::Sin.call(&[]).is_none());
        assert!(Builtin::Vector2.call(&[Variant::Scalar(1.0)]).is_none());
        assert!(Builtin::Pow.call(&[Variant::Bool(true), Variant::Scalar(2.0)]).is_none());
    }
}

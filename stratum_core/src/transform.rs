// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Column-major 4×4 transforms and the visual transform composition.
//!
//! [`Transform3d`] uses column vectors: `a * b` applies `b` first. A visual's
//! global transform is therefore `parent_global * combined`, which is the
//! same product a row-vector formulation writes as `combined * parent_global`.

use core::ops::Mul;

use bytemuck::{Pod, Zeroable};
use kurbo::{Rect, Vec2};

/// A 3-component vector used for offsets, center points and scales.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vector3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vector3 {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    /// The all-ones vector (unit scale).
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    /// Creates a vector from components.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length.
    #[inline]
    #[must_use]
    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// A rotation quaternion `(x, y, z, w)`.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Quaternion {
    /// X component of the vector part.
    pub x: f64,
    /// Y component of the vector part.
    pub y: f64,
    /// Z component of the vector part.
    pub z: f64,
    /// Scalar part.
    pub w: f64,
}

impl Quaternion {
    /// The identity rotation.
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Creates a quaternion from components.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// A rotation of `radians` about a unit `axis`.
    #[must_use]
    pub fn from_axis_angle(axis: Vector3, radians: f64) -> Self {
        let (s, c) = (radians * 0.5).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    /// Four-component dot product.
    #[inline]
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// Returns the quaternion scaled to unit length, or identity for a zero
    /// quaternion.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.dot(self).sqrt();
        if len == 0.0 {
            Self::IDENTITY
        } else {
            Self::new(self.x / len, self.y / len, self.z / len, self.w / len)
        }
    }

    /// Spherical interpolation along the shorter arc.
    #[must_use]
    pub fn slerp(self, to: Self, t: f64) -> Self {
        let mut cos = self.dot(to);
        let mut to = to;
        if cos < 0.0 {
            cos = -cos;
            to = Self::new(-to.x, -to.y, -to.z, -to.w);
        }
        let (a, b) = if cos > 1.0 - 1e-6 {
            // Nearly parallel: fall back to linear blending.
            (1.0 - t, t)
        } else {
            let omega = cos.acos();
            let inv_sin = 1.0 / omega.sin();
            (((1.0 - t) * omega).sin() * inv_sin, (t * omega).sin() * inv_sin)
        };
        Self::new(
            a * self.x + b * to.x,
            a * self.y + b * to.y,
            a * self.z + b * to.z,
            a * self.w + b * to.w,
        )
    }
}

impl Default for Quaternion {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A column-major 4×4 transform stored as `[[f64; 4]; 4]`.
///
/// Each inner array is one *column* of the matrix.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Transform3d {
    /// Four columns, each a 4-element array `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl Transform3d {
    /// The 4×4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// The all-zero matrix.
    ///
    /// Visuals start with a zero global transform so that their first update
    /// always counts as a position change.
    pub const ZERO: Self = Self {
        cols: [[0.0; 4]; 4],
    };

    /// Creates a transform from a column-major 2-D array.
    #[inline]
    #[must_use]
    pub const fn from_cols_array_2d(cols: [[f64; 4]; 4]) -> Self {
        Self { cols }
    }

    /// Returns column `i` (0-based).
    ///
    /// # Panics
    ///
    /// Panics if `i >= 4`.
    #[inline]
    #[must_use]
    pub const fn col(self, i: usize) -> [f64; 4] {
        self.cols[i]
    }

    /// Creates a pure translation transform.
    #[inline]
    #[must_use]
    pub const fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [x, y, z, 1.0],
            ],
        }
    }

    /// Creates a non-uniform scale transform.
    #[inline]
    #[must_use]
    pub const fn from_scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            cols: [
                [sx, 0.0, 0.0, 0.0],
                [0.0, sy, 0.0, 0.0],
                [0.0, 0.0, sz, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation around the Z axis (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation_z(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self {
            cols: [
                [c, s, 0.0, 0.0],
                [-s, c, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation from a unit quaternion.
    #[must_use]
    pub fn from_quaternion(q: Quaternion) -> Self {
        let Quaternion { x, y, z, w } = q;
        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);
        let (wx, wy, wz) = (w * x, w * y, w * z);
        Self {
            cols: [
                [1.0 - 2.0 * (yy + zz), 2.0 * (xy + wz), 2.0 * (xz - wy), 0.0],
                [2.0 * (xy - wz), 1.0 - 2.0 * (xx + zz), 2.0 * (yz + wx), 0.0],
                [2.0 * (xz + wy), 2.0 * (yz - wx), 1.0 - 2.0 * (xx + yy), 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Conjugates `self` by a translation to `center`, so the transform
    /// pivots around that point instead of the origin.
    #[must_use]
    pub fn about(self, center: Vector3) -> Self {
        if center == Vector3::ZERO {
            return self;
        }
        Self::from_translation(center.x, center.y, center.z)
            * self
            * Self::from_translation(-center.x, -center.y, -center.z)
    }

    /// Is this the identity matrix?
    #[inline]
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Is every element [finite]?
    ///
    /// [finite]: f64::is_finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }

    /// Returns the element-wise blend `self + (to - self) * t`.
    #[must_use]
    pub fn lerp(self, to: Self, t: f64) -> Self {
        let mut out = self.cols;
        for (col, to_col) in out.iter_mut().zip(to.cols) {
            for (v, to_v) in col.iter_mut().zip(to_col) {
                *v += (to_v - *v) * t;
            }
        }
        Self { cols: out }
    }

    /// Transforms a 3-D point, treating it as `(x, y, z, 1)` without a
    /// perspective divide.
    ///
    /// Infinite inputs propagate IEEE-754 style: a zero coefficient times an
    /// infinite component yields NaN.
    #[must_use]
    pub fn transform_point3(&self, p: Vector3) -> Vector3 {
        let c = &self.cols;
        Vector3::new(
            p.x * c[0][0] + p.y * c[1][0] + p.z * c[2][0] + c[3][0],
            p.x * c[0][1] + p.y * c[1][1] + p.z * c[2][1] + c[3][1],
            p.x * c[0][2] + p.y * c[1][2] + p.z * c[2][2] + c[3][2],
        )
    }

    /// Returns the axis-aligned bounding box of `rect` after projecting its
    /// corners onto the XY plane.
    #[must_use]
    pub fn transform_rect_bbox(&self, rect: Rect) -> Rect {
        let c = &self.cols;
        let map = |x: f64, y: f64| {
            (
                x * c[0][0] + y * c[1][0] + c[3][0],
                x * c[0][1] + y * c[1][1] + c[3][1],
            )
        };
        let corners = [
            map(rect.x0, rect.y0),
            map(rect.x1, rect.y0),
            map(rect.x0, rect.y1),
            map(rect.x1, rect.y1),
        ];
        let (mut x0, mut y0) = corners[0];
        let (mut x1, mut y1) = corners[0];
        for &(x, y) in &corners[1..] {
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
        }
        Rect::new(x0, y0, x1, y1)
    }
}

impl Default for Transform3d {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform3d {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut out = [[0.0_f64; 4]; 4];
        for (j, col) in out.iter_mut().enumerate() {
            for (i, v) in col.iter_mut().enumerate() {
                *v = a[0][i] * b[j][0] + a[1][i] * b[j][1] + a[2][i] * b[j][2] + a[3][i] * b[j][3];
            }
        }
        Self { cols: out }
    }
}

/// Inputs of the per-visual local transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformInputs {
    /// Visual size; the anchor point is relative to it.
    pub size: Vec2,
    /// Anchor point as a fraction of `size`.
    pub anchor_point: Vec2,
    /// Pivot for scale, rotation and orientation.
    pub center_point: Vector3,
    /// Arbitrary local transform, applied right after the anchor shift.
    pub transform_matrix: Transform3d,
    /// Scale about `center_point`.
    pub scale: Vector3,
    /// Rotation about Z through `center_point`, in radians.
    pub rotation_angle: f64,
    /// 3-D orientation about `center_point`.
    pub orientation: Quaternion,
    /// Final translation.
    pub offset: Vector3,
}

impl Default for TransformInputs {
    fn default() -> Self {
        Self {
            size: Vec2::ZERO,
            anchor_point: Vec2::ZERO,
            center_point: Vector3::ZERO,
            transform_matrix: Transform3d::IDENTITY,
            scale: Vector3::ONE,
            rotation_angle: 0.0,
            orientation: Quaternion::IDENTITY,
            offset: Vector3::ZERO,
        }
    }
}

/// Composes a visual's combined local transform.
///
/// Applied to a point in order: shift by `-(size * anchor_point)`, the local
/// transform matrix, scale, Z rotation, orientation (each about the center
/// point), then the offset. Steps whose input is neutral are skipped so that
/// a default visual composes to exactly the identity.
#[must_use]
pub fn compose_visual_transform(inputs: &TransformInputs) -> Transform3d {
    let anchor_x = inputs.size.x * inputs.anchor_point.x;
    let anchor_y = inputs.size.y * inputs.anchor_point.y;
    let mut m = if anchor_x == 0.0 && anchor_y == 0.0 {
        Transform3d::IDENTITY
    } else {
        Transform3d::from_translation(-anchor_x, -anchor_y, 0.0)
    };
    if !inputs.transform_matrix.is_identity() {
        m = inputs.transform_matrix * m;
    }
    if inputs.scale != Vector3::ONE {
        let s = inputs.scale;
        m = Transform3d::from_scale(s.x, s.y, s.z).about(inputs.center_point) * m;
    }
    if inputs.rotation_angle != 0.0 {
        m = Transform3d::from_rotation_z(inputs.rotation_angle).about(inputs.center_point) * m;
    }
    if inputs.orientation != Quaternion::IDENTITY {
        m = Transform3d::from_quaternion(inputs.orientation).about(inputs.center_point) * m;
    }
    if inputs.offset != Vector3::ZERO {
        let o = inputs.offset;
        m = Transform3d::from_translation(o.x, o.y, o.z) * m;
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::{FRAC_PI_2, PI};

    const EPS: f64 = 1e-9;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn identity_multiply() {
        let t = Transform3d::from_translation(1.0, 2.0, 3.0);
        assert_eq!(Transform3d::IDENTITY * t, t);
        assert_eq!(t * Transform3d::IDENTITY, t);
    }

    #[test]
    fn scale_then_translate() {
        let combined = Transform3d::from_translation(3.0, 4.0, 0.0) * Transform3d::from_scale(2.0, 2.0, 2.0);
        assert_eq!(combined.col(0), [2.0, 0.0, 0.0, 0.0]);
        assert_eq!(combined.col(3), [3.0, 4.0, 0.0, 1.0]);
    }

    #[test]
    fn quaternion_about_z_matches_rotation_z() {
        let q = Quaternion::from_axis_angle(Vector3::new(0.0, 0.0, 1.0), FRAC_PI_2);
        let a = Transform3d::from_quaternion(q);
        let b = Transform3d::from_rotation_z(FRAC_PI_2);
        for (ca, cb) in a.cols.iter().zip(b.cols.iter()) {
            for (x, y) in ca.iter().zip(cb.iter()) {
                assert!(approx(*x, *y), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn half_turn_about_y_faces_away() {
        let q = Quaternion::from_axis_angle(Vector3::new(0.0, 1.0, 0.0), PI);
        let m = Transform3d::from_quaternion(q);
        let z = m.transform_point3(Vector3::new(0.0, 0.0, f64::INFINITY)).z;
        assert!(z <= 0.0, "+Z should map to -inf, got {z}");
    }

    #[test]
    fn infinite_point_through_zero_matrix_is_nan() {
        let z = Transform3d::ZERO
            .transform_point3(Vector3::new(0.0, 0.0, f64::INFINITY))
            .z;
        assert!(z.is_nan(), "0 * inf must stay NaN");
    }

    #[test]
    fn default_inputs_compose_to_identity() {
        assert_eq!(
            compose_visual_transform(&TransformInputs::default()),
            Transform3d::IDENTITY
        );
    }

    #[test]
    fn offset_and_anchor() {
        let m = compose_visual_transform(&TransformInputs {
            size: Vec2::new(100.0, 50.0),
            anchor_point: Vec2::new(0.5, 0.5),
            offset: Vector3::new(200.0, 100.0, 0.0),
            ..TransformInputs::default()
        });
        // Anchor (50, 25) lands on the offset.
        let p = m.transform_point3(Vector3::new(50.0, 25.0, 0.0));
        assert_eq!(p, Vector3::new(200.0, 100.0, 0.0));
    }

    #[test]
    fn scale_about_center_point_keeps_center_fixed() {
        let m = compose_visual_transform(&TransformInputs {
            center_point: Vector3::new(10.0, 10.0, 0.0),
            scale: Vector3::new(2.0, 3.0, 1.0),
            ..TransformInputs::default()
        });
        assert_eq!(
            m.transform_point3(Vector3::new(10.0, 10.0, 0.0)),
            Vector3::new(10.0, 10.0, 0.0)
        );
        assert_eq!(
            m.transform_point3(Vector3::new(11.0, 11.0, 0.0)),
            Vector3::new(12.0, 13.0, 0.0)
        );
    }

    #[test]
    fn rotation_applies_before_offset() {
        let m = compose_visual_transform(&TransformInputs {
            rotation_angle: FRAC_PI_2,
            offset: Vector3::new(5.0, 0.0, 0.0),
            ..TransformInputs::default()
        });
        let p = m.transform_point3(Vector3::new(1.0, 0.0, 0.0));
        assert!(approx(p.x, 5.0) && approx(p.y, 1.0), "got {p:?}");
    }

    #[test]
    fn bbox_of_rotated_rect() {
        let m = Transform3d::from_translation(10.0, 0.0, 0.0) * Transform3d::from_rotation_z(FRAC_PI_2);
        let r = m.transform_rect_bbox(Rect::new(0.0, 0.0, 4.0, 2.0));
        assert!(approx(r.x0, 8.0) && approx(r.x1, 10.0), "got {r:?}");
        assert!(approx(r.y0, 0.0) && approx(r.y1, 4.0), "got {r:?}");
    }

    #[test]
    fn slerp_endpoints_and_midpoint() {
        let a = Quaternion::IDENTITY;
        let b = Quaternion::from_axis_angle(Vector3::new(0.0, 0.0, 1.0), FRAC_PI_2);
        assert!(approx(a.slerp(b, 0.0).w, 1.0));
        assert!(approx(a.slerp(b, 1.0).z, b.z));
        let mid = a.slerp(b, 0.5);
        let expected = Quaternion::from_axis_angle(Vector3::new(0.0, 0.0, 1.0), FRAC_PI_2 / 2.0);
        assert!(approx(mid.z, expected.z) && approx(mid.w, expected.w), "got {mid:?}");
    }

    #[test]
    fn lerp_is_elementwise() {
        let a = Transform3d::from_translation(0.0, 0.0, 0.0);
        let b = Transform3d::from_translation(10.0, 20.0, 0.0);
        assert_eq!(a.lerp(b, 0.5).col(3), [5.0, 10.0, 0.0, 1.0]);
    }
}

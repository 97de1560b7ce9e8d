// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Plain-old-data reading and writing for batch streams.

use bytemuck::Pod;
use kurbo::Vec2;

use super::error::BatchError;
use crate::expr::{Variant, VariantKind};
use crate::transform::{Quaternion, Transform3d, Vector3};
use crate::visual::{Color, VisualField};

/// Wire tags of [`VariantKind`], indexed by tag byte.
const VALUE_KINDS: [VariantKind; 9] = [
    VariantKind::None,
    VariantKind::Bool,
    VariantKind::Scalar,
    VariantKind::Vector2,
    VariantKind::Vector3,
    VariantKind::Vector4,
    VariantKind::Quaternion,
    VariantKind::Matrix,
    VariantKind::Color,
];

fn kind_tag(kind: VariantKind) -> u8 {
    match kind {
        VariantKind::None => 0,
        VariantKind::Bool => 1,
        VariantKind::Scalar => 2,
        VariantKind::Vector2 => 3,
        VariantKind::Vector3 => 4,
        VariantKind::Vector4 => 5,
        VariantKind::Quaternion => 6,
        VariantKind::Matrix => 7,
        VariantKind::Color => 8,
    }
}

/// Appends plain-old-data values to a byte buffer.
#[derive(Debug, Default)]
pub(crate) struct BatchWriter {
    data: Vec<u8>,
}

impl BatchWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn pod<T: Pod>(&mut self, value: &T) {
        self.data.extend_from_slice(bytemuck::bytes_of(value));
    }

    pub(crate) fn u8(&mut self, v: u8) {
        self.data.push(v);
    }

    pub(crate) fn u32(&mut self, v: u32) {
        self.pod(&v.to_le());
    }

    pub(crate) fn u64(&mut self, v: u64) {
        self.pod(&v.to_le());
    }

    pub(crate) fn f64(&mut self, v: f64) {
        self.u64(v.to_bits());
    }

    pub(crate) fn marker(&mut self, v: bool) {
        self.u8(u8::from(v));
    }

    /// Writes `value` as a kind tag followed by its payload.
    ///
    /// Only the kinds fields can hold carry a payload; the reader rejects
    /// any tag that does not match the field.
    pub(crate) fn field_value(&mut self, value: Variant) {
        self.u8(kind_tag(value.kind()));
        match value {
            Variant::Scalar(v) => self.f64(v),
            Variant::Vector2(v) => {
                self.f64(v.x);
                self.f64(v.y);
            }
            Variant::Vector3(v) => self.pod(&v),
            Variant::Quaternion(q) => self.pod(&q),
            Variant::Matrix(m) => self.pod(&m),
            Variant::Color(c) => self.pod(&c),
            Variant::None | Variant::Bool(_) | Variant::Vector4(_) => {}
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// Reads plain-old-data values from a byte slice, failing on truncation.
#[derive(Debug)]
pub(crate) struct BatchReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BatchReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[inline]
    pub(crate) fn offset(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub(crate) fn pod<T: Pod>(&mut self) -> Result<T, BatchError> {
        let size = size_of::<T>();
        let bytes = self
            .data
            .get(self.pos..)
            .and_then(|rest| rest.get(..size))
            .ok_or(BatchError::Truncated {
                offset: self.pos,
                needed: size,
            })?;
        self.pos += size;
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    pub(crate) fn u8(&mut self) -> Result<u8, BatchError> {
        self.pod()
    }

    pub(crate) fn u32(&mut self) -> Result<u32, BatchError> {
        self.pod().map(u32::from_le)
    }

    pub(crate) fn u64(&mut self) -> Result<u64, BatchError> {
        self.pod().map(u64::from_le)
    }

    pub(crate) fn f64(&mut self) -> Result<f64, BatchError> {
        self.u64().map(f64::from_bits)
    }

    /// Reads a 0/1 marker byte; any other value is an error.
    pub(crate) fn marker(&mut self) -> Result<bool, BatchError> {
        let offset = self.pos;
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(BatchError::InvalidMarker { value, offset }),
        }
    }

    /// Reads a value of `field`, failing if it was written with another kind.
    pub(crate) fn field_value(&mut self, field: VisualField) -> Result<Variant, BatchError> {
        let tag = self.u8()?;
        let found = VALUE_KINDS
            .get(usize::from(tag))
            .copied()
            .ok_or(BatchError::UnknownValueKind(tag))?;
        if found != field.kind() {
            return Err(BatchError::ValueKindMismatch {
                field,
                expected: field.kind(),
                found,
            });
        }
        Ok(match found {
            VariantKind::Scalar => Variant::Scalar(self.f64()?),
            VariantKind::Vector2 => Variant::Vector2(Vec2::new(self.f64()?, self.f64()?)),
            VariantKind::Vector3 => Variant::Vector3(self.pod::<Vector3>()?),
            VariantKind::Quaternion => Variant::Quaternion(self.pod::<Quaternion>()?),
            VariantKind::Matrix => Variant::Matrix(self.pod::<Transform3d>()?),
            VariantKind::Color => Variant::Color(self.pod::<Color>()?),
            VariantKind::None | VariantKind::Bool | VariantKind::Vector4 => Variant::None,
        })
    }
}

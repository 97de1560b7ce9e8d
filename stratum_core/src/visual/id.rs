// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visual, target and surface identity types.

use core::fmt;

/// Sentinel value indicating "no slot" in index fields.
pub(crate) const INVALID: u32 = u32::MAX;

/// Identifies a visual across the client/server boundary.
///
/// Ids are allocated by the client and never reused, so a stale id simply
/// fails to resolve once its visual is disposed. Zero is reserved as the wire
/// encoding of "no visual".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VisualId(pub u64);

impl VisualId {
    /// Wire encoding of `Option<VisualId>`.
    #[inline]
    #[must_use]
    pub(crate) const fn encode(id: Option<Self>) -> u64 {
        match id {
            Some(id) => id.0,
            None => 0,
        }
    }

    /// Inverse of [`encode`](Self::encode).
    #[inline]
    #[must_use]
    pub(crate) const fn decode(raw: u64) -> Option<Self> {
        if raw == 0 { None } else { Some(Self(raw)) }
    }
}

impl fmt::Debug for VisualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VisualId({})", self.0)
    }
}

/// Identifies a composition target (a window or offscreen surface root).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetId(pub u64);

impl fmt::Debug for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TargetId({})", self.0)
    }
}

/// An opaque reference to an externally managed content surface.
///
/// Content visuals draw surfaces by id; the drawing context resolves them.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u32);

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({})", self.0)
    }
}

/// Allocates fresh [`VisualId`]s on the client side.
#[derive(Debug)]
pub struct VisualIdAllocator {
    next: u64,
}

impl Default for VisualIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl VisualIdAllocator {
    /// Creates an allocator whose first id is 1.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Returns a new, never-before-returned id.
    pub fn allocate(&mut self) -> VisualId {
        let id = VisualId(self.next);
        self.next += 1;
        id
    }
}

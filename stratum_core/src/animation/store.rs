// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-property animated value and subscription storage.

use std::cell::Cell;
use std::collections::BTreeMap;

use super::AnimationId;
use crate::expr::Variant;

/// Tracks which animation instances depend on one property.
///
/// The store is *valid* once someone has read the property since its last
/// change. Only a valid store notifies on invalidation, so a burst of writes
/// without an intervening read produces a single notification.
#[derive(Debug, Default)]
pub(crate) struct SubscriptionStore {
    valid: Cell<bool>,
    /// Subscriber → reference count.
    subscribers: BTreeMap<AnimationId, u32>,
}

impl SubscriptionStore {
    /// Marks the property as observed.
    #[inline]
    pub(crate) fn mark_valid(&self) {
        self.valid.set(true);
    }

    #[inline]
    pub(crate) fn is_valid(&self) -> bool {
        self.valid.get()
    }

    /// Clears the valid flag. Returns `true` when subscribers must be
    /// notified (the store was valid).
    pub(crate) fn invalidate(&self) -> bool {
        self.valid.replace(false)
    }

    pub(crate) fn subscribe(&mut self, animation: AnimationId) {
        *self.subscribers.entry(animation).or_insert(0) += 1;
    }

    pub(crate) fn unsubscribe(&mut self, animation: AnimationId) {
        if let Some(count) = self.subscribers.get_mut(&animation) {
            *count -= 1;
            if *count == 0 {
                self.subscribers.remove(&animation);
            }
        }
    }

    pub(crate) fn subscribers(&self) -> impl Iterator<Item = AnimationId> + '_ {
        self.subscribers.keys().copied()
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// One animatable property of a visual.
#[derive(Debug)]
pub(crate) struct AnimatedProperty {
    /// Value set directly by the client.
    pub(crate) direct: Variant,
    /// Attached animation, if any; overrides `direct` while present.
    pub(crate) animation: Option<AnimationId>,
    /// Result of the most recent evaluation of `animation`.
    pub(crate) last_animated: Cell<Option<Variant>>,
    pub(crate) subscriptions: SubscriptionStore,
}

impl AnimatedProperty {
    pub(crate) fn new(direct: Variant) -> Self {
        Self {
            direct,
            animation: None,
            last_animated: Cell::new(None),
            subscriptions: SubscriptionStore::default(),
        }
    }

    /// The value a replacing animation starts from.
    pub(crate) fn last_value(&self) -> Variant {
        match self.animation {
            Some(_) => self.last_animated.get().unwrap_or(self.direct),
            None => self.direct,
        }
    }
}

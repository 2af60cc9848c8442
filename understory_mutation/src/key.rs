// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mutation keys and events.

use core::fmt;
use std::sync::Arc;

use understory_property::{Category, WATCH_ALL};
use understory_value::Value;

/// Identifies one watched property: `origin/category/property`.
///
/// The property name may be [`WATCH_ALL`], in which case the key is the *group* key that
/// stands for every property of the category.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MutationKey<K> {
    /// The element whose property changed.
    pub origin: K,
    /// The category of the property.
    pub category: Category,
    /// The property name.
    pub property: Arc<str>,
}

impl<K: Copy> MutationKey<K> {
    /// Creates a key for one property.
    pub fn new(origin: K, category: Category, property: impl Into<Arc<str>>) -> Self {
        Self {
            origin,
            category,
            property: property.into(),
        }
    }

    /// Creates the group key for every property of `category` on `origin`.
    pub fn group(origin: K, category: Category) -> Self {
        Self::new(origin, category, WATCH_ALL)
    }

    /// Returns the group key of this key's category.
    #[must_use]
    pub fn to_group(&self) -> Self {
        Self::group(self.origin, self.category)
    }

    /// Returns `true` if this is a group key.
    #[must_use]
    pub fn is_group(&self) -> bool {
        &*self.property == WATCH_ALL
    }

    /// Returns the keys a mutation of this key is dispatched to, in order.
    ///
    /// The specific key comes first and the group key second. A group key dispatches to
    /// itself only.
    pub fn dispatch_order(&self) -> impl Iterator<Item = Self> + use<K> {
        let group = (!self.is_group()).then(|| self.to_group());
        core::iter::once(self.clone()).chain(group)
    }
}

impl<K: fmt::Display> fmt::Display for MutationKey<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.origin, self.category, self.property)
    }
}

/// A property change delivered to watchers.
#[derive(Clone, Debug, PartialEq)]
pub struct MutationEvent<K> {
    /// Which property changed.
    pub key: MutationKey<K>,
    /// The value after the change.
    pub new_value: Value,
    /// The value the written tier held before, if any.
    pub old_value: Option<Value>,
}

impl<K: Copy> MutationEvent<K> {
    /// Creates an event.
    pub fn new(key: MutationKey<K>, new_value: Value, old_value: Option<Value>) -> Self {
        Self {
            key,
            new_value,
            old_value,
        }
    }

    /// The element whose property changed.
    #[must_use]
    #[inline]
    pub fn origin(&self) -> K {
        self.key.origin
    }

    /// The category of the changed property.
    #[must_use]
    #[inline]
    pub fn category(&self) -> Category {
        self.key.category
    }

    /// The name of the changed property.
    #[must_use]
    #[inline]
    pub fn property(&self) -> &str {
        &self.key.property
    }
}

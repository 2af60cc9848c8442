// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-element property storage across every category.
//!
//! This module provides [`PropertyStore`], which holds one [`Properties`] per
//! [`Category`] for an owning element.
//!
//! # Implementation
//!
//! Following the `WinUI` approach, each tier is a sorted vector with binary search rather
//! than a hash map. This provides:
//!
//! - Better cache locality (contiguous memory)
//! - Lower memory overhead (no hash buckets)
//! - O(log n) lookup, which is fast for typical property counts (5-20)
//! - Inline storage for small property sets via `SmallVec`
//!
//! Categories are a dense array indexed by [`Category::index`], so selecting a category
//! never hashes.

use std::sync::Arc;

use understory_value::Value;

use crate::category::Category;
use crate::properties::Properties;
use crate::tier::Tier;

/// Per-element storage for categorized, tiered property values.
///
/// # Precedence
///
/// Within each category, [`PropertyStore::get`] returns Inheritable → Local → Inherited →
/// Default.
///
/// # Example
///
/// ```rust
/// use understory_property::{Category, PropertyStore};
/// use understory_value::Value;
///
/// let mut parent = PropertyStore::<u32>::new(1);
/// parent.set(Category::Ui, "theme", Value::from("dark"), true);
///
/// let mut child = PropertyStore::<u32>::new(2);
/// child.inherit(&parent);
/// assert_eq!(child.get(Category::Ui, "theme"), Some(&Value::from("dark")));
///
/// // Categories are independent namespaces.
/// assert_eq!(child.get(Category::Data, "theme"), None);
/// ```
#[derive(Clone, Debug)]
pub struct PropertyStore<K> {
    categories: [Properties<K>; Category::COUNT],
    owner: K,
}

impl<K: Copy + Eq> PropertyStore<K> {
    /// Creates an empty property store for the given owner key.
    #[must_use]
    pub fn new(owner: K) -> Self {
        Self {
            categories: core::array::from_fn(|_| Properties::new()),
            owner,
        }
    }

    /// Returns the owner key of this store.
    #[must_use]
    #[inline]
    pub fn owner(&self) -> K {
        self.owner
    }

    /// Returns the properties of one category.
    #[must_use]
    #[inline]
    pub fn category(&self, category: Category) -> &Properties<K> {
        &self.categories[category.index()]
    }

    /// Returns the properties of one category, mutably.
    #[inline]
    pub fn category_mut(&mut self, category: Category) -> &mut Properties<K> {
        &mut self.categories[category.index()]
    }

    /// Returns `true` if no category holds any value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.iter().all(Properties::is_empty)
    }

    /// Returns the effective value of `name` in `category`.
    #[must_use]
    pub fn get(&self, category: Category, name: &str) -> Option<&Value> {
        self.category(category).get(name)
    }

    /// Returns the effective value of `name` in `category` and its tier.
    #[must_use]
    pub fn resolve(&self, category: Category, name: &str) -> Option<(Tier, &Value)> {
        self.category(category).resolve(name)
    }

    /// Stores a Local (or, if `inheritable`, Inheritable) value.
    ///
    /// Returns the value previously held by that tier. The store does not notify watchers.
    pub fn set(
        &mut self,
        category: Category,
        name: impl Into<Arc<str>>,
        value: Value,
        inheritable: bool,
    ) -> Option<Value> {
        self.category_mut(category).set(name, value, inheritable)
    }

    /// Stores a value in an explicit tier.
    pub fn set_in(
        &mut self,
        category: Category,
        tier: Tier,
        name: impl Into<Arc<str>>,
        value: Value,
    ) -> Option<Value> {
        self.category_mut(category).set_in(tier, name, value)
    }

    /// Stores a fallback value.
    pub fn set_default(
        &mut self,
        category: Category,
        name: impl Into<Arc<str>>,
        value: Value,
    ) -> Option<Value> {
        self.category_mut(category).set_default(name, value)
    }

    /// Clears `name` from the Local and Inheritable tiers of `category`.
    pub fn delete(&mut self, category: Category, name: &str) -> bool {
        self.category_mut(category).delete(name)
    }

    /// Snapshots every Inheritable tier of `source` into this store's Inherited tiers.
    pub fn inherit(&mut self, source: &Self) {
        for (ours, theirs) in self.categories.iter_mut().zip(&source.categories) {
            ours.inherit_from(theirs);
        }
    }

    /// Registers `watcher` for `name` in `category`. Returns `false` if already present.
    pub fn new_watcher(&mut self, category: Category, name: &str, watcher: K) -> bool {
        self.category_mut(category).new_watcher(name, watcher)
    }

    /// Unregisters `watcher` from `name` in `category`.
    pub fn remove_watcher(&mut self, category: Category, name: &str, watcher: K) -> bool {
        self.category_mut(category).remove_watcher(name, watcher)
    }

    /// Returns the watchers of `name` in `category`.
    #[must_use]
    pub fn watchers(&self, category: Category, name: &str) -> &[K] {
        self.category(category).watchers(name)
    }

    /// Iterates over every `(category, name, watchers)` triple.
    pub fn all_watchers(&self) -> impl Iterator<Item = (Category, &str, &[K])> + '_ {
        Category::ALL.into_iter().flat_map(move |category| {
            self.category(category)
                .watched()
                .map(move |(name, list)| (category, name, list))
        })
    }

    /// Unregisters `watcher` from every property of every category.
    ///
    /// Returns the `(category, name)` pairs it was removed from.
    pub fn remove_watcher_everywhere(&mut self, watcher: K) -> Vec<(Category, Arc<str>)> {
        let mut removed = Vec::new();
        for category in Category::ALL {
            removed.extend(
                self.category_mut(category)
                    .remove_watcher_everywhere(watcher)
                    .into_iter()
                    .map(|name| (category, name)),
            );
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WATCH_ALL;

    #[test]
    fn store_new() {
        let store = PropertyStore::<u32>::new(1);
        assert!(store.is_empty());
        assert_eq!(store.owner(), 1);
    }

    #[test]
    fn set_then_get_per_category() {
        let mut store = PropertyStore::<u32>::new(1);
        store.set(Category::Data, "title", Value::from("a"), false);
        store.set(Category::Ui, "title", Value::from("b"), false);
        assert_eq!(store.get(Category::Data, "title"), Some(&Value::from("a")));
        assert_eq!(store.get(Category::Ui, "title"), Some(&Value::from("b")));
        assert_eq!(store.get(Category::Event, "title"), None);
        assert!(!store.is_empty());
    }

    #[test]
    fn inheritable_wins_over_local() {
        let mut store = PropertyStore::<u32>::new(1);
        store.set(Category::Ui, "k", Value::from(1), false);
        store.set(Category::Ui, "k", Value::from(2), true);
        assert_eq!(
            store.resolve(Category::Ui, "k"),
            Some((Tier::Inheritable, &Value::from(2)))
        );
    }

    #[test]
    fn inherit_covers_every_category() {
        let mut parent = PropertyStore::<u32>::new(1);
        for category in Category::ALL {
            parent.set(category, "shared", Value::from(category.as_str()), true);
        }
        let mut child = PropertyStore::<u32>::new(2);
        child.set(Category::Ui, "shared", Value::from("own"), false);
        child.inherit(&parent);

        for category in Category::ALL {
            assert_eq!(
                child.category(category).get_in(Tier::Inherited, "shared"),
                Some(&Value::from(category.as_str()))
            );
        }
        // Local still shadows the inherited snapshot.
        assert_eq!(child.get(Category::Ui, "shared"), Some(&Value::from("own")));
    }

    #[test]
    fn default_is_the_last_resort() {
        let mut store = PropertyStore::<u32>::new(1);
        store.set_default(Category::Ui, "opacity", Value::from(1));
        assert_eq!(store.get(Category::Ui, "opacity"), Some(&Value::from(1)));
        store.set(Category::Ui, "opacity", Value::from(0.5), false);
        assert!(store.delete(Category::Ui, "opacity"));
        assert_eq!(store.get(Category::Ui, "opacity"), Some(&Value::from(1)));
    }

    #[test]
    fn watcher_cascade() {
        let mut store = PropertyStore::<u32>::new(1);
        store.new_watcher(Category::Data, "a", 5);
        store.new_watcher(Category::Ui, WATCH_ALL, 5);
        store.new_watcher(Category::Ui, WATCH_ALL, 6);
        assert_eq!(store.all_watchers().count(), 2);

        let mut removed = store.remove_watcher_everywhere(5);
        removed.sort();
        assert_eq!(
            removed,
            [
                (Category::Data, Arc::<str>::from("a")),
                (Category::Ui, Arc::<str>::from(WATCH_ALL)),
            ]
        );
        assert_eq!(store.watchers(Category::Ui, WATCH_ALL), &[6]);
        assert!(store.watchers(Category::Data, "a").is_empty());
    }
}

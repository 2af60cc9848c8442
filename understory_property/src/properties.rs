// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tiered values and watcher lists for one category.

use std::sync::Arc;

use hashbrown::HashMap;
use smallvec::SmallVec;
use understory_value::Value;

use crate::tier::{Tier, TierMap};

/// Synthetic property name under which a watcher registers for every property of a
/// category.
pub const WATCH_ALL: &str = "existifallpropertieswatched";

/// The properties of one category: four precedence tiers plus watcher lists.
///
/// `Properties` is plain storage. Writes return the value they displaced but never notify
/// anyone; the owning element reads the old value, writes the new one, and dispatches the
/// mutation itself.
///
/// # Example
///
/// ```rust
/// use understory_property::{Properties, Tier};
/// use understory_value::Value;
///
/// let mut props = Properties::<u32>::new();
/// props.set_default("color", Value::from("black"));
/// props.set("color", Value::from("red"), false);
/// props.set("color", Value::from("blue"), true);
///
/// // Inheritable > Local > Inherited > Default
/// assert_eq!(props.resolve("color"), Some((Tier::Inheritable, &Value::from("blue"))));
/// ```
#[derive(Clone, Debug)]
pub struct Properties<K> {
    default: TierMap,
    inherited: TierMap,
    local: TierMap,
    inheritable: TierMap,
    /// Watchers per property name, in registration order.
    watchers: HashMap<Arc<str>, SmallVec<[K; 4]>>,
}

impl<K> Default for Properties<K> {
    fn default() -> Self {
        Self {
            default: TierMap::default(),
            inherited: TierMap::default(),
            local: TierMap::default(),
            inheritable: TierMap::default(),
            watchers: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq> Properties<K> {
    /// Creates empty properties.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn tier(&self, tier: Tier) -> &TierMap {
        match tier {
            Tier::Default => &self.default,
            Tier::Inherited => &self.inherited,
            Tier::Local => &self.local,
            Tier::Inheritable => &self.inheritable,
        }
    }

    #[inline]
    fn tier_mut(&mut self, tier: Tier) -> &mut TierMap {
        match tier {
            Tier::Default => &mut self.default,
            Tier::Inherited => &mut self.inherited,
            Tier::Local => &mut self.local,
            Tier::Inheritable => &mut self.inheritable,
        }
    }

    // =========================================================================
    // Values
    // =========================================================================

    /// Returns the effective value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.resolve(name).map(|(_, value)| value)
    }

    /// Returns the effective value of `name` and the tier that supplied it.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<(Tier, &Value)> {
        Tier::PRECEDENCE
            .into_iter()
            .find_map(|tier| self.tier(tier).get(name).map(|v| (tier, v)))
    }

    /// Returns the value of `name` in a single tier.
    #[must_use]
    pub fn get_in(&self, tier: Tier, name: &str) -> Option<&Value> {
        self.tier(tier).get(name)
    }

    /// Returns `true` if any tier holds `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Stores `value` in the Inheritable tier if `inheritable`, else in the Local tier.
    ///
    /// Returns the value previously held by that tier.
    pub fn set(
        &mut self,
        name: impl Into<Arc<str>>,
        value: Value,
        inheritable: bool,
    ) -> Option<Value> {
        let tier = if inheritable {
            Tier::Inheritable
        } else {
            Tier::Local
        };
        self.set_in(tier, name, value)
    }

    /// Stores `value` in `tier`, returning the value that tier held before.
    pub fn set_in(&mut self, tier: Tier, name: impl Into<Arc<str>>, value: Value) -> Option<Value> {
        self.tier_mut(tier).insert(name.into(), value)
    }

    /// Stores a fallback value.
    pub fn set_default(&mut self, name: impl Into<Arc<str>>, value: Value) -> Option<Value> {
        self.set_in(Tier::Default, name, value)
    }

    /// Clears `name` from the Local and Inheritable tiers.
    ///
    /// Defaults and inherited snapshots are left alone, so the property may still resolve
    /// afterwards. Returns `true` if anything was removed.
    pub fn delete(&mut self, name: &str) -> bool {
        let local = self.local.remove(name).is_some();
        let inheritable = self.inheritable.remove(name).is_some();
        local || inheritable
    }

    /// Removes `name` from a single tier.
    pub fn remove_in(&mut self, tier: Tier, name: &str) -> Option<Value> {
        self.tier_mut(tier).remove(name)
    }

    /// Removes every entry of `tier`.
    pub fn clear_tier(&mut self, tier: Tier) {
        self.tier_mut(tier).clear();
    }

    /// Iterates over the entries of one tier in name order.
    pub fn entries(&self, tier: Tier) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.tier(tier).iter()
    }

    /// Number of entries in one tier.
    #[must_use]
    pub fn tier_len(&self, tier: Tier) -> usize {
        self.tier(tier).len()
    }

    /// Returns `true` if every tier is empty. Watchers are not considered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        Tier::PRECEDENCE.into_iter().all(|t| self.tier(t).is_empty())
    }

    /// Replaces this Inherited tier with a copy of `source`'s Inheritable tier.
    ///
    /// This is a snapshot: later writes to `source` are not reflected here, and values
    /// inherited from an earlier source are dropped.
    pub fn inherit_from(&mut self, source: &Self) {
        self.inherited.clone_from(&source.inheritable);
    }

    // =========================================================================
    // Watchers
    // =========================================================================

    /// Registers `watcher` for `name`. Use [`WATCH_ALL`] to watch every property.
    ///
    /// Returns `false` if the watcher was already registered.
    pub fn new_watcher(&mut self, name: &str, watcher: K) -> bool {
        if let Some(list) = self.watchers.get_mut(name) {
            if list.contains(&watcher) {
                return false;
            }
            list.push(watcher);
        } else {
            let mut list = SmallVec::new();
            list.push(watcher);
            self.watchers.insert(name.into(), list);
        }
        true
    }

    /// Unregisters `watcher` from `name`.
    ///
    /// Returns `false` if it was not registered.
    pub fn remove_watcher(&mut self, name: &str, watcher: K) -> bool {
        let Some(list) = self.watchers.get_mut(name) else {
            return false;
        };
        let Some(pos) = list.iter().position(|w| *w == watcher) else {
            return false;
        };
        list.remove(pos);
        if list.is_empty() {
            self.watchers.remove(name);
        }
        true
    }

    /// Returns the watchers of `name`, in registration order.
    #[must_use]
    pub fn watchers(&self, name: &str) -> &[K] {
        self.watchers
            .get(name)
            .map(|list| list.as_slice())
            .unwrap_or_default()
    }

    /// Iterates over every watched name with its watchers.
    pub fn watched(&self) -> impl Iterator<Item = (&str, &[K])> + '_ {
        self.watchers
            .iter()
            .map(|(name, list)| (&**name, list.as_slice()))
    }

    /// Unregisters `watcher` from every name it watches.
    ///
    /// Returns the names it was removed from.
    pub fn remove_watcher_everywhere(&mut self, watcher: K) -> Vec<Arc<str>> {
        let mut removed = Vec::new();
        self.watchers.retain(|name, list| {
            if let Some(pos) = list.iter().position(|w| *w == watcher) {
                list.remove(pos);
                removed.push(Arc::clone(name));
            }
            !list.is_empty()
        });
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get() {
        let mut props = Properties::<u32>::new();
        assert_eq!(props.set("a", Value::from(1), false), None);
        assert_eq!(props.get("a"), Some(&Value::from(1)));
        assert_eq!(props.set("a", Value::from(2), false), Some(Value::from(1)));
        assert_eq!(props.get("a"), Some(&Value::from(2)));
    }

    #[test]
    fn inheritable_shadows_local() {
        let mut props = Properties::<u32>::new();
        props.set("a", Value::from("local"), false);
        props.set("a", Value::from("inheritable"), true);
        assert_eq!(props.get("a"), Some(&Value::from("inheritable")));
        assert_eq!(props.get_in(Tier::Local, "a"), Some(&Value::from("local")));
    }

    #[test]
    fn precedence_walks_down_the_tiers() {
        let mut props = Properties::<u32>::new();
        props.set_default("a", Value::from(0));
        assert_eq!(props.resolve("a").map(|(t, _)| t), Some(Tier::Default));
        props.set_in(Tier::Inherited, "a", Value::from(1));
        assert_eq!(props.resolve("a").map(|(t, _)| t), Some(Tier::Inherited));
        props.set("a", Value::from(2), false);
        assert_eq!(props.resolve("a").map(|(t, _)| t), Some(Tier::Local));
        props.set("a", Value::from(3), true);
        assert_eq!(props.resolve("a").map(|(t, _)| t), Some(Tier::Inheritable));
    }

    #[test]
    fn delete_exposes_lower_tiers() {
        let mut props = Properties::<u32>::new();
        props.set_default("a", Value::from(0));
        props.set("a", Value::from(1), false);
        props.set("a", Value::from(2), true);
        assert!(props.delete("a"));
        assert_eq!(props.get("a"), Some(&Value::from(0)));
        assert!(!props.delete("a"));
    }

    #[test]
    fn inheritance_is_a_snapshot() {
        let mut parent = Properties::<u32>::new();
        parent.set("theme", Value::from("dark"), true);
        parent.set("private", Value::from(true), false);

        let mut child = Properties::<u32>::new();
        child.inherit_from(&parent);
        assert_eq!(child.get("theme"), Some(&Value::from("dark")));
        assert_eq!(child.get("private"), None);

        parent.set("theme", Value::from("light"), true);
        assert_eq!(child.get("theme"), Some(&Value::from("dark")));
    }

    #[test]
    fn inheriting_again_replaces_the_snapshot() {
        let mut first = Properties::<u32>::new();
        first.set("theme", Value::from("dark"), true);
        first.set("lang", Value::from("en"), true);
        let mut second = Properties::<u32>::new();
        second.set("lang", Value::from("fr"), true);

        let mut child = Properties::<u32>::new();
        child.set_default("theme", Value::from("light"));
        child.inherit_from(&first);
        assert_eq!(child.get("theme"), Some(&Value::from("dark")));

        child.inherit_from(&second);
        assert_eq!(child.get("theme"), Some(&Value::from("light")));
        assert_eq!(child.get("lang"), Some(&Value::from("fr")));
        assert_eq!(child.tier_len(Tier::Inherited), 1);
    }

    #[test]
    fn watchers_are_idempotent_and_ordered() {
        let mut props = Properties::<u32>::new();
        assert!(props.new_watcher("a", 3));
        assert!(props.new_watcher("a", 1));
        assert!(!props.new_watcher("a", 3));
        assert_eq!(props.watchers("a"), &[3, 1]);

        assert!(props.remove_watcher("a", 3));
        assert!(!props.remove_watcher("a", 3));
        assert_eq!(props.watchers("a"), &[1]);
        assert!(props.remove_watcher("a", 1));
        assert_eq!(props.watched().count(), 0);
    }

    #[test]
    fn remove_watcher_everywhere_reports_names() {
        let mut props = Properties::<u32>::new();
        props.new_watcher("a", 7);
        props.new_watcher(WATCH_ALL, 7);
        props.new_watcher("b", 8);
        let mut removed = props.remove_watcher_everywhere(7);
        removed.sort();
        assert_eq!(removed, [Arc::<str>::from("a"), Arc::from(WATCH_ALL)]);
        assert_eq!(props.watchers("b"), &[8]);
        assert!(props.watchers(WATCH_ALL).is_empty());
    }
}

// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handler lists keyed by [`MutationKey`].

use core::hash::Hash;

use hashbrown::HashMap;

use crate::key::{MutationEvent, MutationKey};

/// Identifier of a registered handler, unique within one [`DispatchTable`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

#[derive(Clone, Debug)]
struct Slot<K, H> {
    id: HandlerId,
    owner: K,
    handler: H,
}

/// One key's handlers in registration order. Removed handlers leave a `None` tombstone
/// until the next full traversal compacts them.
#[derive(Clone, Debug)]
struct HandlerList<K, H> {
    slots: Vec<Option<Slot<K, H>>>,
    tombstones: usize,
}

impl<K, H> HandlerList<K, H> {
    fn live(&self) -> usize {
        self.slots.len() - self.tombstones
    }

    fn tombstone(&mut self, pos: usize) -> Option<Slot<K, H>> {
        let slot = self.slots[pos].take();
        if slot.is_some() {
            self.tombstones += 1;
        }
        slot
    }

    fn compact(&mut self) {
        if self.tombstones > 0 {
            self.slots.retain(Option::is_some);
            self.tombstones = 0;
        }
    }

    fn iter(&self) -> impl Iterator<Item = &Slot<K, H>> + '_ {
        self.slots.iter().flatten()
    }
}

/// Ordered, short-circuiting mutation handlers.
///
/// Handlers registered for the same key run in registration order. A handler that returns
/// `true` stops dispatch *for that key* only; the remaining handlers stay registered and run
/// again on the next dispatch.
///
/// Removal is O(1) amortized: the slot becomes a tombstone and the list is compacted
/// during the next traversal that visits every slot.
///
/// # Example
///
/// ```rust
/// use understory_mutation::{DispatchTable, MutationEvent, MutationKey};
/// use understory_property::Category;
/// use understory_value::Value;
///
/// let mut table = DispatchTable::<u32, &str>::new();
/// let key = MutationKey::new(1, Category::Data, "title");
/// table.add(key.clone(), 2, "first");
/// table.add(key.clone(), 3, "second");
///
/// let event = MutationEvent::new(key, Value::from("hi"), None);
/// let mut seen = Vec::new();
/// table.dispatch(&event, |handler, _| {
///     seen.push(*handler);
///     true // stop after the first handler
/// });
/// assert_eq!(seen, ["first"]);
/// ```
#[derive(Clone, Debug)]
pub struct DispatchTable<K, H> {
    lists: HashMap<MutationKey<K>, HandlerList<K, H>>,
    index: HashMap<HandlerId, MutationKey<K>>,
    next_id: u64,
}

impl<K, H> Default for DispatchTable<K, H> {
    fn default() -> Self {
        Self {
            lists: HashMap::new(),
            index: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<K: Copy + Eq + Hash, H> DispatchTable<K, H> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handler` to the list for `key`, on behalf of `owner`.
    pub fn add(&mut self, key: MutationKey<K>, owner: K, handler: H) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.lists
            .entry(key.clone())
            .or_insert_with(|| HandlerList {
                slots: Vec::new(),
                tombstones: 0,
            })
            .slots
            .push(Some(Slot { id, owner, handler }));
        self.index.insert(id, key);
        id
    }

    /// Unregisters a handler. Returns `false` if it was not registered.
    pub fn remove(&mut self, id: HandlerId) -> bool {
        let Some(key) = self.index.remove(&id) else {
            return false;
        };
        let Some(list) = self.lists.get_mut(&key) else {
            return false;
        };
        if let Some(pos) = list
            .slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| s.id == id))
        {
            list.tombstone(pos);
        }
        if list.live() == 0 {
            self.lists.remove(&key);
        }
        true
    }

    /// Unregisters every handler `owner` registered, on every key.
    ///
    /// Returns the number of handlers removed.
    pub fn remove_owner(&mut self, owner: K) -> usize {
        self.remove_matching(|_, slot_owner| slot_owner == owner)
    }

    /// Unregisters the handlers `owner` registered for `key`.
    pub fn remove_owner_from(&mut self, key: &MutationKey<K>, owner: K) -> usize {
        self.remove_matching(|k, slot_owner| slot_owner == owner && k == key)
    }

    fn remove_matching(&mut self, mut matches: impl FnMut(&MutationKey<K>, K) -> bool) -> usize {
        let mut removed = 0;
        let index = &mut self.index;
        self.lists.retain(|key, list| {
            for pos in 0..list.slots.len() {
                let hit = list.slots[pos]
                    .as_ref()
                    .is_some_and(|s| matches(key, s.owner));
                if hit && let Some(slot) = list.tombstone(pos) {
                    index.remove(&slot.id);
                    removed += 1;
                }
            }
            list.live() > 0
        });
        removed
    }

    /// Returns `true` if `id` is still registered.
    #[must_use]
    pub fn contains(&self, id: HandlerId) -> bool {
        self.index.contains_key(&id)
    }

    /// Number of live handlers for `key`.
    #[must_use]
    pub fn handler_count(&self, key: &MutationKey<K>) -> usize {
        self.lists.get(key).map_or(0, HandlerList::live)
    }

    /// Number of live handlers `owner` registered for `key`.
    #[must_use]
    pub fn owner_count(&self, key: &MutationKey<K>, owner: K) -> usize {
        self.lists
            .get(key)
            .map_or(0, |l| l.iter().filter(|s| s.owner == owner).count())
    }

    /// Returns the key `id` was registered for.
    #[must_use]
    pub fn key_of(&self, id: HandlerId) -> Option<&MutationKey<K>> {
        self.index.get(&id)
    }

    /// Number of tombstoned slots awaiting compaction for `key`.
    #[must_use]
    pub fn tombstones(&self, key: &MutationKey<K>) -> usize {
        self.lists.get(key).map_or(0, |l| l.tombstones)
    }

    /// Total number of live handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Iterates over every key with at least one live handler.
    pub fn keys(&self) -> impl Iterator<Item = &MutationKey<K>> + '_ {
        self.lists.keys()
    }

    /// Dispatches `event` to its key and then to the group key of its category.
    ///
    /// `invoke` is called once per live handler in registration order. Returning `true`
    /// stops the remaining handlers of the current key; the group key is still
    /// dispatched. Every key whose list was fully traversed is compacted.
    ///
    /// Returns the number of handlers invoked.
    pub fn dispatch(
        &mut self,
        event: &MutationEvent<K>,
        mut invoke: impl FnMut(&H, &MutationEvent<K>) -> bool,
    ) -> usize {
        let mut invoked = 0;
        for key in event.key.dispatch_order() {
            invoked += self.dispatch_key(&key, event, &mut invoke);
        }
        invoked
    }

    fn dispatch_key(
        &mut self,
        key: &MutationKey<K>,
        event: &MutationEvent<K>,
        invoke: &mut impl FnMut(&H, &MutationEvent<K>) -> bool,
    ) -> usize {
        let Some(list) = self.lists.get_mut(key) else {
            return 0;
        };
        let mut invoked = 0;
        let mut stopped = false;
        for slot in list.iter() {
            invoked += 1;
            if invoke(&slot.handler, event) {
                stopped = true;
                break;
            }
        }
        if !stopped {
            list.compact();
        }
        invoked
    }

    /// Returns a compacted copy of `key`'s live handlers, in order.
    ///
    /// Callers that need to mutate the table (or its owner) while handlers run take a
    /// snapshot first and check [`DispatchTable::contains`] before each call, so handlers
    /// removed by an earlier handler are skipped.
    pub fn snapshot(&mut self, key: &MutationKey<K>) -> Vec<(HandlerId, H)>
    where
        H: Clone,
    {
        let Some(list) = self.lists.get_mut(key) else {
            return Vec::new();
        };
        list.compact();
        list.iter().map(|s| (s.id, s.handler.clone())).collect()
    }

    /// Returns the owner that registered `id`.
    #[must_use]
    pub fn owner_of(&self, id: HandlerId) -> Option<K> {
        let key = self.index.get(&id)?;
        self.lists
            .get(key)?
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.owner)
    }
}

#[cfg(test)]
mod tests {
    use understory_property::Category;
    use understory_value::Value;

    use super::*;

    type Table = DispatchTable<u32, &'static str>;

    fn event(property: &str) -> MutationEvent<u32> {
        MutationEvent::new(
            MutationKey::new(1, Category::Data, property),
            Value::from(1),
            None,
        )
    }

    fn run(table: &mut Table, event: &MutationEvent<u32>, stop_on: &[&str]) -> Vec<&'static str> {
        let mut seen = Vec::new();
        table.dispatch(event, |h, _| {
            seen.push(*h);
            stop_on.contains(h)
        });
        seen
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let mut table = Table::new();
        let key = MutationKey::new(1, Category::Data, "a");
        for name in ["h1", "h2", "h3"] {
            table.add(key.clone(), 2, name);
        }
        assert_eq!(run(&mut table, &event("a"), &[]), ["h1", "h2", "h3"]);
    }

    #[test]
    fn stop_skips_later_handlers_for_this_dispatch_only() {
        let mut table = Table::new();
        let key = MutationKey::new(1, Category::Data, "a");
        table.add(key.clone(), 2, "h1");
        table.add(key.clone(), 3, "h2");

        assert_eq!(run(&mut table, &event("a"), &["h1"]), ["h1"]);
        assert_eq!(table.handler_count(&key), 2);
        assert_eq!(run(&mut table, &event("a"), &[]), ["h1", "h2"]);
    }

    #[test]
    fn specific_key_runs_before_group_key() {
        let mut table = Table::new();
        table.add(MutationKey::group(1, Category::Data), 2, "all");
        table.add(MutationKey::new(1, Category::Data, "a"), 3, "a");
        table.add(MutationKey::new(1, Category::Data, "b"), 4, "b");
        table.add(MutationKey::group(1, Category::Ui), 5, "ui");

        assert_eq!(run(&mut table, &event("a"), &[]), ["a", "all"]);
        assert_eq!(run(&mut table, &event("c"), &[]), ["all"]);
    }

    #[test]
    fn stop_on_specific_key_does_not_suppress_group() {
        let mut table = Table::new();
        table.add(MutationKey::new(1, Category::Data, "a"), 2, "a1");
        table.add(MutationKey::new(1, Category::Data, "a"), 2, "a2");
        table.add(MutationKey::group(1, Category::Data), 3, "all");
        assert_eq!(run(&mut table, &event("a"), &["a1"]), ["a1", "all"]);
    }

    #[test]
    fn removal_tombstones_until_full_traversal() {
        let mut table = Table::new();
        let key = MutationKey::new(1, Category::Data, "a");
        let h1 = table.add(key.clone(), 2, "h1");
        table.add(key.clone(), 3, "h2");
        table.add(key.clone(), 4, "h3");

        assert!(table.remove(h1));
        assert!(!table.remove(h1));
        assert!(!table.contains(h1));
        assert_eq!(table.tombstones(&key), 1);
        assert_eq!(table.handler_count(&key), 2);

        // A stopped dispatch leaves the tombstone in place.
        assert_eq!(run(&mut table, &event("a"), &["h2"]), ["h2"]);
        assert_eq!(table.tombstones(&key), 1);

        // A full traversal compacts.
        assert_eq!(run(&mut table, &event("a"), &[]), ["h2", "h3"]);
        assert_eq!(table.tombstones(&key), 0);
    }

    #[test]
    fn empty_lists_are_dropped() {
        let mut table = Table::new();
        let key = MutationKey::new(1, Category::Data, "a");
        let id = table.add(key.clone(), 2, "h1");
        assert!(table.remove(id));
        assert_eq!(table.keys().count(), 0);
        assert!(table.is_empty());
    }

    #[test]
    fn remove_owner_cascades_across_keys() {
        let mut table = Table::new();
        let a = MutationKey::new(1, Category::Data, "a");
        let all = MutationKey::group(1, Category::Ui);
        table.add(a.clone(), 7, "a7");
        table.add(a.clone(), 8, "a8");
        table.add(all.clone(), 7, "all7");

        assert_eq!(table.remove_owner(7), 2);
        assert_eq!(table.handler_count(&a), 1);
        assert_eq!(table.handler_count(&all), 0);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn remove_owner_from_one_key() {
        let mut table = Table::new();
        let a = MutationKey::new(1, Category::Data, "a");
        let b = MutationKey::new(1, Category::Data, "b");
        table.add(a.clone(), 7, "a7");
        let b7 = table.add(b.clone(), 7, "b7");
        assert_eq!(table.remove_owner_from(&a, 7), 1);
        assert!(table.contains(b7));
        assert_eq!(table.owner_of(b7), Some(7));
        assert_eq!(table.key_of(b7), Some(&b));
        assert_eq!(table.owner_count(&a, 7), 0);
        assert_eq!(table.owner_count(&b, 7), 1);
    }

    #[test]
    fn snapshot_is_compacted_and_ordered() {
        let mut table = Table::new();
        let key = MutationKey::new(1, Category::Data, "a");
        let h1 = table.add(key.clone(), 2, "h1");
        let h2 = table.add(key.clone(), 3, "h2");
        table.remove(h1);

        let snapshot = table.snapshot(&key);
        assert_eq!(snapshot, [(h2, "h2")]);
        assert_eq!(table.tombstones(&key), 0);
        assert!(table.snapshot(&MutationKey::new(1, Category::Ui, "a")).is_empty());
    }
}

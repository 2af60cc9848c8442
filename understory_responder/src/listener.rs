// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node listener storage.

use alloc::sync::Arc;
use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::types::ListenerFlags;

/// Identifier of a registered listener, unique within one [`ListenerTable`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// A registered listener.
#[derive(Clone, Debug)]
pub struct Listener<H> {
    /// Its identifier.
    pub id: ListenerId,
    /// Its options.
    pub flags: ListenerFlags,
    /// The handler.
    pub handler: H,
}

/// Listeners snapshotted for one node and event type.
pub type Listeners<H> = SmallVec<[Listener<H>; 4]>;

/// The listeners of one node, grouped by event type in registration order.
#[derive(Clone, Debug)]
pub struct ListenerTable<H> {
    by_type: Vec<(Arc<str>, Vec<Listener<H>>)>,
    next_id: u64,
}

impl<H> Default for ListenerTable<H> {
    fn default() -> Self {
        Self {
            by_type: Vec::new(),
            next_id: 0,
        }
    }
}

impl<H> ListenerTable<H> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, event_type: &str) -> Result<usize, usize> {
        self.by_type
            .binary_search_by(|(name, _)| (**name).cmp(event_type))
    }

    /// Registers `handler` for `event_type`.
    pub fn add(
        &mut self,
        event_type: impl Into<Arc<str>>,
        flags: ListenerFlags,
        handler: H,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        let event_type = event_type.into();
        let listener = Listener { id, flags, handler };
        match self.find(&event_type) {
            Ok(idx) => self.by_type[idx].1.push(listener),
            Err(idx) => self.by_type.insert(idx, (event_type, alloc::vec![listener])),
        }
        id
    }

    /// Unregisters a listener. Returns `false` if it was not registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        for idx in 0..self.by_type.len() {
            let list = &mut self.by_type[idx].1;
            if let Some(pos) = list.iter().position(|l| l.id == id) {
                list.remove(pos);
                if list.is_empty() {
                    self.by_type.remove(idx);
                }
                return true;
            }
        }
        false
    }

    /// Returns `true` if `id` is still registered.
    #[must_use]
    pub fn contains(&self, id: ListenerId) -> bool {
        self.by_type
            .iter()
            .any(|(_, list)| list.iter().any(|l| l.id == id))
    }

    /// Returns the listeners registered for `event_type`, in order.
    #[must_use]
    pub fn get(&self, event_type: &str) -> &[Listener<H>] {
        match self.find(event_type) {
            Ok(idx) => &self.by_type[idx].1,
            Err(_) => &[],
        }
    }

    /// Returns a copy of the listeners for `event_type`, so they can run while the table
    /// is being edited.
    #[must_use]
    pub fn snapshot(&self, event_type: &str) -> Listeners<H>
    where
        H: Clone,
    {
        self.get(event_type).iter().cloned().collect()
    }

    /// Iterates over event types with at least one listener.
    pub fn event_types(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_type.iter().map(|(name, _)| &**name)
    }

    /// Total number of listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_type.iter().map(|(_, list)| list.len()).sum()
    }

    /// Returns `true` if no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listeners_keep_registration_order() {
        let mut table = ListenerTable::new();
        table.add("click", ListenerFlags::empty(), 'a');
        table.add("key", ListenerFlags::empty(), 'k');
        table.add("click", ListenerFlags::CAPTURE, 'b');

        let handlers: Vec<_> = table.get("click").iter().map(|l| l.handler).collect();
        assert_eq!(handlers, ['a', 'b']);
        assert_eq!(table.event_types().collect::<Vec<_>>(), ["click", "key"]);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn remove_drops_empty_types() {
        let mut table = ListenerTable::new();
        let id = table.add("click", ListenerFlags::ONCE, ());
        assert!(table.contains(id));
        assert!(table.remove(id));
        assert!(!table.remove(id));
        assert!(table.is_empty());
        assert!(table.get("click").is_empty());
    }

    #[test]
    fn snapshot_is_detached() {
        let mut table = ListenerTable::new();
        let a = table.add("click", ListenerFlags::empty(), 1);
        table.add("click", ListenerFlags::empty(), 2);
        let snapshot = table.snapshot("click");
        table.remove(a);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(table.get("click").len(), 1);
    }
}

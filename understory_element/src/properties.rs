// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property access and watching.

use std::rc::Rc;
use std::sync::Arc;

use tracing::trace;
use understory_mutation::{HandlerId, MutationEvent, MutationKey};
use understory_property::{Category, Tier, WATCH_ALL};
use understory_value::Value;

use crate::id::ElementId;
use crate::tree::Tree;

impl Tree {
    /// Resolves `name` in `category` of `id`: Inheritable, then Local, Inherited and
    /// Default.
    #[must_use]
    pub fn get(&self, id: ElementId, category: Category, name: &str) -> Option<&Value> {
        self.element(id).store.get(category, name)
    }

    /// Like [`get`](Self::get), also reporting which tier answered.
    #[must_use]
    pub fn resolve(
        &self,
        id: ElementId,
        category: Category,
        name: &str,
    ) -> Option<(Tier, &Value)> {
        self.element(id).store.resolve(category, name)
    }

    /// Sets a Local value and notifies watchers.
    ///
    /// Watchers receive a [`MutationEvent`] whose old value is what [`get`](Self::get)
    /// returned before the write.
    pub fn set(&mut self, id: ElementId, category: Category, name: &str, value: Value) {
        self.write(id, category, name, value, false);
    }

    /// Sets an Inheritable value and notifies watchers.
    ///
    /// Children attached afterwards snapshot it into their Inherited tier.
    pub fn set_inheritable(&mut self, id: ElementId, category: Category, name: &str, value: Value) {
        self.write(id, category, name, value, true);
    }

    fn write(
        &mut self,
        id: ElementId,
        category: Category,
        name: &str,
        value: Value,
        inheritable: bool,
    ) {
        let store = &mut self.element_mut(id).store;
        let old = store.get(category, name).cloned();
        store.set(category, name, value.clone(), inheritable);
        let event = MutationEvent::new(MutationKey::new(id, category, name), value, old);
        self.dispatch_mutation(&event);
    }

    /// Sets a fallback value. Does not notify watchers.
    pub fn set_default(&mut self, id: ElementId, category: Category, name: &str, value: Value) {
        self.element_mut(id).store.set_default(category, name, value);
    }

    /// Clears the Local and Inheritable values of `name`. Does not notify watchers.
    ///
    /// Returns `true` if either tier held a value.
    pub fn delete_property(&mut self, id: ElementId, category: Category, name: &str) -> bool {
        self.element_mut(id).store.delete(category, name)
    }

    /// Runs the handlers for `event`: the property key first, then the category's
    /// [`WATCH_ALL`] key.
    ///
    /// Handlers run against a snapshot, so they may watch, unwatch or set properties. A
    /// handler removed by an earlier one in the same dispatch is skipped. Returns the number
    /// of handlers invoked.
    pub fn dispatch_mutation(&mut self, event: &MutationEvent<ElementId>) -> usize {
        let origin = event.origin();
        let mut invoked = 0;
        for key in event.key.dispatch_order() {
            let Some(element) = self.try_element_mut(origin) else {
                break;
            };
            let handlers = element.mutations.snapshot(&key);
            for (handler_id, handler) in handlers {
                let live = self
                    .try_element(origin)
                    .is_some_and(|el| el.mutations.contains(handler_id));
                if !live {
                    continue;
                }
                invoked += 1;
                if handler(self, event) {
                    trace!(key = %key, "mutation dispatch stopped");
                    break;
                }
            }
        }
        invoked
    }

    /// Registers `handler` to run when `name` in `category` of `target` is set.
    ///
    /// `watcher` is recorded in the target's watcher list (once, however many handlers it
    /// registers). Deleting either element removes the watch.
    ///
    /// # Panics
    ///
    /// Panics if either id is stale.
    pub fn watch(
        &mut self,
        watcher: ElementId,
        target: ElementId,
        category: Category,
        name: &str,
        handler: impl Fn(&mut Self, &MutationEvent<ElementId>) -> bool + 'static,
    ) -> HandlerId {
        self.assert_alive(watcher);
        let target_el = self.element_mut(target);
        let key = MutationKey::new(target, category, name);
        let id = target_el.mutations.add(key, watcher, Rc::new(handler));
        if target_el.store.new_watcher(category, name, watcher) {
            self.element_mut(watcher)
                .watching
                .push((target, category, Arc::from(name)));
        }
        id
    }

    /// Registers `handler` to run when any property in `category` of `target` is set.
    ///
    /// # Panics
    ///
    /// Panics if either id is stale.
    pub fn watch_all(
        &mut self,
        watcher: ElementId,
        target: ElementId,
        category: Category,
        handler: impl Fn(&mut Self, &MutationEvent<ElementId>) -> bool + 'static,
    ) -> HandlerId {
        self.watch(watcher, target, category, WATCH_ALL, handler)
    }

    /// Removes every handler `watcher` registered for `name` in `category` of `target`.
    ///
    /// Pass [`WATCH_ALL`] to undo [`watch_all`](Self::watch_all). Returns `false` if
    /// `watcher` was not watching.
    ///
    /// # Panics
    ///
    /// Panics if `target` is stale.
    pub fn unwatch(
        &mut self,
        watcher: ElementId,
        target: ElementId,
        category: Category,
        name: &str,
    ) -> bool {
        let target_el = self.element_mut(target);
        let removed = target_el.store.remove_watcher(category, name, watcher);
        target_el
            .mutations
            .remove_owner_from(&MutationKey::new(target, category, name), watcher);
        if removed && let Some(watcher_el) = self.try_element_mut(watcher) {
            watcher_el
                .watching
                .retain(|(t, c, n)| !(*t == target && *c == category && &**n == name));
        }
        removed
    }

    /// Removes a single handler registered on `target`.
    ///
    /// When it was the watcher's last handler for that property, the watcher is also
    /// dropped from the target's watcher list. Returns `false` if `handler` was not
    /// registered on `target`.
    ///
    /// # Panics
    ///
    /// Panics if `target` is stale.
    pub fn remove_watch(&mut self, target: ElementId, handler: HandlerId) -> bool {
        let target_el = self.element_mut(target);
        let Some(watcher) = target_el.mutations.owner_of(handler) else {
            return false;
        };
        let Some(key) = target_el.mutations.key_of(handler).cloned() else {
            return false;
        };
        target_el.mutations.remove(handler);
        if target_el.mutations.owner_count(&key, watcher) == 0 {
            self.unwatch(watcher, target, key.category, &key.property);
        }
        true
    }

    /// The elements watching `name` in `category` of `id`, in registration order.
    #[must_use]
    pub fn watchers(&self, id: ElementId, category: Category, name: &str) -> &[ElementId] {
        self.element(id).store.watchers(category, name)
    }

    /// The `(target, category, property)` watches registered by `id`.
    #[must_use]
    pub fn watching(&self, id: ElementId) -> &[(ElementId, Category, Arc<str>)] {
        &self.element(id).watching
    }
}

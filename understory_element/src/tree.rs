// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The element arena and its structure operations.

use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, trace};
use understory_mutation::{DispatchTable, MutationEvent, MutationKey};
use understory_property::{Category, PropertyStore};
use understory_responder::{Event, ListenerTable, PathCache};
use understory_transition::{TransitionEvent, TransitionTable};
use understory_value::Value;
use understory_work_queue::{CancelToken, Runtime};

use crate::bridge::{NativeBridge, NoopBridge};
use crate::fetch::FetchState;
use crate::id::ElementId;

/// Called with the tree and the change when a watched property is set.
///
/// Returning `true` stops the remaining handlers of the same key.
pub type MutationHandler = Rc<dyn Fn(&mut Tree, &MutationEvent<ElementId>) -> bool>;

/// Called with the tree and the event at each step of propagation.
pub type EventHandler = Rc<dyn Fn(&mut Tree, &mut Event<ElementId, Value>)>;

/// Called with the tree and the transition event when a transition changes phase.
pub type TransitionHandler = Rc<dyn Fn(&mut Tree, &TransitionEvent<ElementId>)>;

pub(crate) struct Element {
    pub(crate) parent: Option<ElementId>,
    pub(crate) children: Vec<ElementId>,
    pub(crate) store: PropertyStore<ElementId>,
    pub(crate) mutations: DispatchTable<ElementId, MutationHandler>,
    pub(crate) listeners: ListenerTable<EventHandler>,
    pub(crate) transitions: TransitionTable<ElementId, TransitionHandler, CancelToken>,
    pub(crate) path: PathCache<ElementId>,
    /// `(target, category, property)` of every watch this element registered elsewhere.
    pub(crate) watching: Vec<(ElementId, Category, Arc<str>)>,
    pub(crate) fetch: FetchState,
}

impl Element {
    fn new(id: ElementId) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            store: PropertyStore::new(id),
            mutations: DispatchTable::new(),
            listeners: ListenerTable::new(),
            transitions: TransitionTable::new(id),
            path: PathCache::new(),
            watching: Vec::new(),
            fetch: FetchState::default(),
        }
    }
}

struct Slot {
    generation: u32,
    element: Option<Element>,
}

/// An arena of elements and the single place their state can be changed.
///
/// A `Tree` holds `Rc` callbacks and is therefore neither `Send` nor `Sync`: it lives on
/// its owner thread, and other threads reach it only through a
/// [`WorkQueue`](understory_work_queue::WorkQueue). Callbacks receive `&mut Tree`, so they
/// may freely read and change the tree while they run.
///
/// ## Ids
///
/// Elements are addressed by generational [`ElementId`]s. Passing an id that was never
/// issued by this tree, or whose element was deleted, is a programmer error: every
/// method taking an id panics on it unless documented otherwise. Use
/// [`is_alive`](Self::is_alive) when an id may be stale, such as in a late callback.
///
/// ## Structure
///
/// Attaching a child (with [`append_child`](Self::append_child) and friends) detaches it
/// from its previous parent, informs the [`NativeBridge`], snapshots the new parent's
/// Inheritable properties into the child's Inherited tier, and invalidates the cached
/// propagation paths of the moved subtree.
///
/// ```rust
/// use understory_element::Tree;
/// use understory_property::Category;
/// use understory_value::Value;
///
/// let mut tree = Tree::new();
/// let root = tree.create();
/// let child = tree.create();
///
/// tree.set_inheritable(root, Category::Ui, "theme", Value::from("dark"));
/// tree.append_child(root, child);
///
/// assert_eq!(tree.parent(child), Some(root));
/// assert_eq!(tree.get(child, Category::Ui, "theme"), Some(&Value::from("dark")));
/// ```
pub struct Tree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    bridge: Box<dyn NativeBridge>,
    pub(crate) runtime: Option<Runtime<Self>>,
}

impl core::fmt::Debug for Tree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tree")
            .field("live", &self.live)
            .field("slots", &self.slots.len())
            .field("runtime", &self.runtime.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Creates an empty tree with no bridge and no runtime.
    ///
    /// Without a runtime, [`fetch`](Self::fetch) is unavailable.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            bridge: Box::new(NoopBridge),
            runtime: None,
        }
    }

    /// Creates an empty tree that runs background work on `runtime`.
    ///
    /// Typically called from [`Owner::with_runtime`](understory_work_queue::Owner::with_runtime)
    /// or [`spawn_owner`](understory_work_queue::spawn_owner).
    #[must_use]
    pub fn with_runtime(runtime: Runtime<Self>) -> Self {
        Self {
            runtime: Some(runtime),
            ..Self::new()
        }
    }

    /// Replaces the native bridge.
    #[must_use]
    pub fn with_bridge(mut self, bridge: impl NativeBridge + 'static) -> Self {
        self.bridge = Box::new(bridge);
        self
    }

    /// The runtime, if any.
    #[must_use]
    pub fn runtime(&self) -> Option<&Runtime<Self>> {
        self.runtime.as_ref()
    }

    pub(crate) fn bridge_mut(&mut self) -> &mut dyn NativeBridge {
        &mut *self.bridge
    }

    // =========================================================================
    // Arena
    // =========================================================================

    /// Allocates a detached element.
    pub fn create(&mut self) -> ElementId {
        let id = match self.free.pop() {
            Some(idx) => {
                let slot = &mut self.slots[idx as usize];
                slot.generation += 1;
                ElementId::new(idx, slot.generation)
            }
            None => {
                let idx = u32::try_from(self.slots.len()).unwrap_or_else(|_| {
                    panic!("element arena exhausted");
                });
                self.slots.push(Slot {
                    generation: 1,
                    element: None,
                });
                ElementId::new(idx, 1)
            }
        };
        self.slots[id.idx()].element = Some(Element::new(id));
        self.live += 1;
        trace!(%id, "created element");
        id
    }

    /// Returns `true` if `id` refers to a live element of this tree.
    #[must_use]
    pub fn is_alive(&self, id: ElementId) -> bool {
        self.try_element(id).is_some()
    }

    /// Number of live elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if the tree has no live elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub(crate) fn try_element(&self, id: ElementId) -> Option<&Element> {
        let slot = self.slots.get(id.idx())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.element.as_ref()
    }

    pub(crate) fn try_element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        let slot = self.slots.get_mut(id.idx())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.element.as_mut()
    }

    #[track_caller]
    pub(crate) fn element(&self, id: ElementId) -> &Element {
        match self.try_element(id) {
            Some(element) => element,
            None => panic!("element {id} is stale or was never created"),
        }
    }

    #[track_caller]
    pub(crate) fn assert_alive(&self, id: ElementId) {
        assert!(self.is_alive(id), "element {id} is stale or was never created");
    }

    #[track_caller]
    pub(crate) fn element_mut(&mut self, id: ElementId) -> &mut Element {
        match self.try_element_mut(id) {
            Some(element) => element,
            None => panic!("element {id} is stale or was never created"),
        }
    }

    /// Iterates over every live element id.
    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            slot.element.as_ref()?;
            let idx = u32::try_from(idx).ok()?;
            Some(ElementId::new(idx, slot.generation))
        })
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// The parent of `id`, if attached.
    #[must_use]
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.element(id).parent
    }

    /// The children of `id`, in order.
    #[must_use]
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        &self.element(id).children
    }

    /// Returns `true` if `ancestor` is `id` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor_or_self(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.element(node).parent;
        }
        false
    }

    /// Appends `child` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either id is stale, or if `child` is `parent` or one of its ancestors.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) {
        self.prepare_attach(parent, child);
        self.element_mut(parent).children.push(child);
        self.finish_attach(parent, child);
        self.bridge.append_child(parent, child);
    }

    /// Inserts `child` as the first child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either id is stale, or if `child` is `parent` or one of its ancestors.
    pub fn prepend_child(&mut self, parent: ElementId, child: ElementId) {
        self.prepare_attach(parent, child);
        self.element_mut(parent).children.insert(0, child);
        self.finish_attach(parent, child);
        self.bridge.prepend_child(parent, child);
    }

    /// Inserts `child` at `index` among the children of `parent`.
    ///
    /// The index is taken after `child` was detached from its previous parent.
    ///
    /// # Panics
    ///
    /// Panics if either id is stale, if `child` is `parent` or one of its ancestors, or if
    /// `index` is greater than the number of children.
    pub fn insert_child(&mut self, parent: ElementId, index: usize, child: ElementId) {
        let len = self
            .element(parent)
            .children
            .iter()
            .filter(|&&c| c != child)
            .count();
        assert!(index <= len, "insert index {index} out of range for {len} children");
        self.prepare_attach(parent, child);
        self.element_mut(parent).children.insert(index, child);
        self.finish_attach(parent, child);
        self.bridge.insert_child(parent, index, child);
    }

    /// Puts `new` in the place of `old` among the children of `parent`, detaching `old`.
    ///
    /// # Panics
    ///
    /// Panics if any id is stale, if `old` is not a child of `parent`, or if `new` is
    /// `parent` or one of its ancestors.
    pub fn replace_child(&mut self, parent: ElementId, old: ElementId, new: ElementId) {
        assert!(
            self.element(old).parent == Some(parent),
            "{old} is not a child of {parent}"
        );
        if old == new {
            return;
        }
        self.prepare_attach(parent, new);
        let children = &mut self.element_mut(parent).children;
        let Some(index) = children.iter().position(|&c| c == old) else {
            unreachable!("parent link and child list disagree for {old}");
        };
        children[index] = new;
        self.element_mut(old).parent = None;
        self.invalidate_paths(old);
        self.finish_attach(parent, new);
        self.bridge.replace_child(parent, old, new);
        debug!(%parent, %old, %new, "replaced child");
    }

    /// Detaches `child` from `parent`. The child stays alive.
    ///
    /// Returns `false` if `child` was not a child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either id is stale.
    pub fn remove_child(&mut self, parent: ElementId, child: ElementId) -> bool {
        self.assert_alive(parent);
        if self.element(child).parent != Some(parent) {
            return false;
        }
        self.detach(child);
        true
    }

    /// Checks the attach preconditions and detaches `child` from its current parent.
    #[track_caller]
    fn prepare_attach(&mut self, parent: ElementId, child: ElementId) {
        self.assert_alive(child);
        assert!(
            !self.is_ancestor_or_self(child, parent),
            "cannot attach {child} under {parent}: it would become its own ancestor"
        );
        if self.element(child).parent.is_some() {
            self.detach(child);
        }
    }

    fn finish_attach(&mut self, parent: ElementId, child: ElementId) {
        self.element_mut(child).parent = Some(parent);
        let [parent_el, child_el] = self.pair_mut(parent, child);
        child_el.store.inherit(&parent_el.store);
        self.invalidate_paths(child);
        debug!(%parent, %child, "attached child");
    }

    fn detach(&mut self, child: ElementId) {
        let Some(parent) = self.element_mut(child).parent.take() else {
            return;
        };
        self.element_mut(parent).children.retain(|&c| c != child);
        self.invalidate_paths(child);
        self.bridge.remove_child(parent, child);
        debug!(%parent, %child, "detached child");
    }

    /// Two distinct live elements, mutably.
    fn pair_mut(&mut self, a: ElementId, b: ElementId) -> [&mut Element; 2] {
        self.assert_alive(a);
        self.assert_alive(b);
        match self.slots.get_disjoint_mut([a.idx(), b.idx()]) {
            Ok(
                [
                    Slot {
                        element: Some(a_el),
                        ..
                    },
                    Slot {
                        element: Some(b_el),
                        ..
                    },
                ],
            ) => [a_el, b_el],
            _ => panic!("pair_mut needs two distinct elements, got {a} and {b}"),
        }
    }

    /// Drops the cached propagation path of `root` and all of its descendants.
    fn invalidate_paths(&mut self, root: ElementId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let element = self.element_mut(id);
            element.path.invalidate();
            stack.extend_from_slice(&element.children);
        }
    }

    /// Returns `id` and all of its descendants, parents before children.
    #[must_use]
    pub fn subtree(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.element(node).children.iter().rev());
        }
        out
    }

    /// Deletes `id` and its whole subtree.
    ///
    /// For every deleted element: everything it watched is unwatched, every watch
    /// registered on it is dropped, and the cancellation handles of its transitions are
    /// fired so background work stops. Returns the number of deleted elements.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn delete(&mut self, id: ElementId) -> usize {
        self.detach(id);
        let doomed = self.subtree(id);
        for &node in doomed.iter().rev() {
            self.release(node);
        }
        debug!(%id, count = doomed.len(), "deleted subtree");
        doomed.len()
    }

    fn release(&mut self, id: ElementId) {
        let Some(mut element) = self.slots[id.idx()].element.take() else {
            return;
        };
        self.free.push(id.slot());
        self.live -= 1;

        for (target, category, property) in element.watching.drain(..) {
            if let Some(target_el) = self.try_element_mut(target) {
                target_el.store.remove_watcher(category, &property, id);
                target_el
                    .mutations
                    .remove_owner_from(&MutationKey::new(target, category, property), id);
            }
        }
        for (_, _, watchers) in element.store.all_watchers() {
            for &watcher in watchers {
                if let Some(watcher_el) = self.try_element_mut(watcher) {
                    watcher_el.watching.retain(|(target, _, _)| *target != id);
                }
            }
        }
        for token in element.transitions.detach_all() {
            token.cancel();
        }
        trace!(%id, "released element");
    }
}

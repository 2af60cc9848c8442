// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element-level transitions.

use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, trace};
use understory_transition::{Firing, TransitionCallbacks, TransitionEvent, TransitionPhase};
use understory_value::Value;
use understory_work_queue::CancelToken;

use crate::id::ElementId;
use crate::tree::{Tree, TransitionHandler};

/// Callbacks for [`Tree::define_transition`].
///
/// Unset callbacks do nothing.
///
/// ```rust
/// use understory_element::{Tree, TransitionHooks};
/// use understory_property::Category;
/// use understory_value::Value;
///
/// let mut tree = Tree::new();
/// let el = tree.create();
/// tree.define_transition(
///     el,
///     "load",
///     TransitionHooks::new().on_end(move |tree, event| {
///         let payload = event.payload().clone();
///         tree.set(el, Category::Data, "loaded", payload);
///     }),
/// );
///
/// tree.start_transition(el, "load", Value::from(true));
/// tree.end_transition(el, "load", Value::from(3));
/// assert_eq!(tree.get(el, Category::Data, "loaded"), Some(&Value::from(3)));
/// ```
#[derive(Clone)]
pub struct TransitionHooks {
    callbacks: TransitionCallbacks<TransitionHandler>,
}

impl core::fmt::Debug for TransitionHooks {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TransitionHooks").finish_non_exhaustive()
    }
}

impl Default for TransitionHooks {
    fn default() -> Self {
        Self::new()
    }
}

fn noop() -> TransitionHandler {
    Rc::new(|_: &mut Tree, _: &TransitionEvent<ElementId>| {})
}

impl TransitionHooks {
    /// Hooks that do nothing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            callbacks: TransitionCallbacks {
                on_start: noop(),
                on_error: noop(),
                on_cancel: noop(),
                on_end: noop(),
            },
        }
    }

    /// Runs when the transition becomes Pending.
    #[must_use]
    pub fn on_start(
        mut self,
        handler: impl Fn(&mut Tree, &TransitionEvent<ElementId>) + 'static,
    ) -> Self {
        self.callbacks.on_start = Rc::new(handler);
        self
    }

    /// Runs when the transition errors.
    #[must_use]
    pub fn on_error(
        mut self,
        handler: impl Fn(&mut Tree, &TransitionEvent<ElementId>) + 'static,
    ) -> Self {
        self.callbacks.on_error = Rc::new(handler);
        self
    }

    /// Runs when the transition is cancelled.
    #[must_use]
    pub fn on_cancel(
        mut self,
        handler: impl Fn(&mut Tree, &TransitionEvent<ElementId>) + 'static,
    ) -> Self {
        self.callbacks.on_cancel = Rc::new(handler);
        self
    }

    /// Runs when the transition ends, including when an aggregate completes.
    #[must_use]
    pub fn on_end(
        mut self,
        handler: impl Fn(&mut Tree, &TransitionEvent<ElementId>) + 'static,
    ) -> Self {
        self.callbacks.on_end = Rc::new(handler);
        self
    }
}

impl Tree {
    /// Defines the transition `name` on `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale or `name` is already defined on it.
    #[track_caller]
    pub fn define_transition(
        &mut self,
        id: ElementId,
        name: impl Into<Arc<str>>,
        hooks: TransitionHooks,
    ) {
        if let Err(err) = self.element_mut(id).transitions.define(name, hooks.callbacks) {
            panic!("element {id}: {err}");
        }
    }

    /// Returns `true` if `name` is defined on `id`.
    #[must_use]
    pub fn has_transition(&self, id: ElementId, name: &str) -> bool {
        self.element(id).transitions.is_defined(name)
    }

    /// Starts `name`, firing `on_start`.
    ///
    /// Returns `false` if the transition was already pending.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale or `name` is undefined.
    #[track_caller]
    pub fn start_transition(&mut self, id: ElementId, name: &str, payload: Value) -> bool {
        let firing = match self.element_mut(id).transitions.start(name, payload) {
            Ok(firing) => firing,
            Err(err) => panic!("element {id}: {err}"),
        };
        if firing.is_empty() {
            return false;
        }
        debug!(%id, name, "transition started");
        self.fire(firing);
        true
    }

    /// Resolves a pending `name` as Errored, firing `on_error`.
    ///
    /// Returns `false` if `name` was not pending. The attached cancel token is dropped
    /// without firing.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale or `name` is undefined.
    #[track_caller]
    pub fn error_transition(&mut self, id: ElementId, name: &str, payload: Value) -> bool {
        self.resolve_transition(id, name, TransitionPhase::Errored, payload)
    }

    /// Resolves a pending `name` as Cancelled, firing `on_cancel`.
    ///
    /// The attached cancel token is fired first so background work can stop. Returns
    /// `false` if `name` was not pending.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale or `name` is undefined.
    #[track_caller]
    pub fn cancel_transition(&mut self, id: ElementId, name: &str, payload: Value) -> bool {
        self.resolve_transition(id, name, TransitionPhase::Cancelled, payload)
    }

    /// Resolves a pending `name` as Ended, firing `on_end`.
    ///
    /// If this was the last pending child of an aggregate, the aggregate ends too and its
    /// `on_end` follows. Returns `false` if `name` was not pending.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale or `name` is undefined.
    #[track_caller]
    pub fn end_transition(&mut self, id: ElementId, name: &str, payload: Value) -> bool {
        self.resolve_transition(id, name, TransitionPhase::Ended, payload)
    }

    #[track_caller]
    fn resolve_transition(
        &mut self,
        id: ElementId,
        name: &str,
        phase: TransitionPhase,
        payload: Value,
    ) -> bool {
        let transitions = &mut self.element_mut(id).transitions;
        match transitions.phase(name) {
            None => panic!("element {id}: transition `{name}` is not defined"),
            Some(TransitionPhase::Pending) => {}
            Some(current) => {
                debug!(
                    %id,
                    name,
                    %current,
                    requested = %phase,
                    "ignored late transition resolution"
                );
                return false;
            }
        }
        if let Some(token) = transitions.detach(name)
            && phase == TransitionPhase::Cancelled
        {
            token.cancel();
        }
        let result = match phase {
            TransitionPhase::Errored => transitions.error(name, payload),
            TransitionPhase::Cancelled => transitions.cancel(name, payload),
            _ => transitions.end(name, payload),
        };
        match result {
            Ok(firing) => {
                debug!(%id, name, %phase, "transition resolved");
                self.fire(firing);
                true
            }
            Err(err) => {
                debug!(%id, name, %err, "transition resolution failed");
                false
            }
        }
    }

    /// Resets an Ended `name` (and Ended aggregates above it) to Idle.
    ///
    /// Returns `false` if `name` had not ended.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale or `name` is undefined.
    #[track_caller]
    pub fn invalidate_transition(&mut self, id: ElementId, name: &str) -> bool {
        match self.element_mut(id).transitions.invalidate(name) {
            Ok(reset) => reset,
            Err(err) => panic!("element {id}: {err}"),
        }
    }

    /// Makes `child` part of `parent`'s aggregate on `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale, either name is undefined, `child` is already linked, or
    /// the link would form a cycle.
    #[track_caller]
    pub fn link_transitions(&mut self, id: ElementId, parent: &str, child: &str) {
        if let Err(err) = self.element_mut(id).transitions.link(parent, child) {
            panic!("element {id}: {err}");
        }
    }

    /// The phase of `name`, or `None` if it is not defined.
    #[must_use]
    pub fn transition_phase(&self, id: ElementId, name: &str) -> Option<TransitionPhase> {
        self.element(id).transitions.phase(name)
    }

    /// The payload persisted by the last resolution of `name`.
    #[must_use]
    pub fn transition_payload(&self, id: ElementId, name: &str) -> Option<&Value> {
        self.element(id).transitions.payload(name)
    }

    /// Returns `true` if `name` was cancelled, or its attached token has fired.
    #[must_use]
    pub fn is_transition_cancelled(&self, id: ElementId, name: &str) -> bool {
        let transitions = &self.element(id).transitions;
        transitions.phase(name) == Some(TransitionPhase::Cancelled)
            || transitions
                .attachment(name)
                .is_some_and(CancelToken::is_cancelled)
    }

    /// Stores the cancel token of the work `name` tracks, cancelling the one it replaces.
    pub(crate) fn attach_token(&mut self, id: ElementId, name: &str, token: CancelToken) {
        match self.element_mut(id).transitions.attach(name, token) {
            Ok(Some(previous)) => previous.cancel(),
            Ok(None) => {}
            Err(err) => debug!(%id, %err, "no transition to attach a token to"),
        }
    }

    /// Runs fired callbacks in order.
    /// Runs `firing` in order, stopping once a callback deletes the owning element.
    fn fire(&mut self, firing: Firing<ElementId, TransitionHandler>) {
        for fire in firing {
            if !self.is_alive(fire.event.origin()) {
                trace!(id = %fire.event.origin(), "transition owner deleted mid-firing");
                break;
            }
            (fire.handler)(self, &fire.event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use understory_property::Category;

    use super::*;

    type Log = Rc<RefCell<Vec<(String, TransitionPhase, Value)>>>;

    fn logging_hooks(log: &Log) -> TransitionHooks {
        let push = |log: &Log| {
            let log = Rc::clone(log);
            move |_: &mut Tree, event: &TransitionEvent<ElementId>| {
                log.borrow_mut()
                    .push((event.name().to_owned(), event.phase, event.payload().clone()));
            }
        };
        TransitionHooks::new()
            .on_start(push(log))
            .on_error(push(log))
            .on_cancel(push(log))
            .on_end(push(log))
    }

    #[test]
    fn load_cycle_fires_start_then_end() {
        let mut tree = Tree::new();
        let el = tree.create();
        let log = Log::default();
        tree.define_transition(el, "load-x", logging_hooks(&log));

        assert_eq!(tree.transition_phase(el, "load-x"), Some(TransitionPhase::Idle));
        assert!(tree.start_transition(el, "load-x", Value::from(true)));
        assert!(tree.end_transition(el, "load-x", Value::from("done")));
        assert_eq!(
            *log.borrow(),
            [
                ("load-x".to_owned(), TransitionPhase::Pending, Value::from(true)),
                ("load-x".to_owned(), TransitionPhase::Ended, Value::from("done")),
            ]
        );
        assert_eq!(tree.transition_payload(el, "load-x"), Some(&Value::from("done")));
    }

    #[test]
    fn start_while_pending_is_a_no_op() {
        let mut tree = Tree::new();
        let el = tree.create();
        let log = Log::default();
        tree.define_transition(el, "load", logging_hooks(&log));
        assert!(tree.start_transition(el, "load", Value::from(1)));
        assert!(!tree.start_transition(el, "load", Value::from(2)));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn late_resolutions_return_false() {
        let mut tree = Tree::new();
        let el = tree.create();
        tree.define_transition(el, "load", TransitionHooks::new());
        assert!(!tree.end_transition(el, "load", Value::from(1)));
        tree.start_transition(el, "load", Value::from(true));
        assert!(tree.cancel_transition(el, "load", Value::from(false)));
        assert!(!tree.end_transition(el, "load", Value::from(1)));
        assert!(tree.is_transition_cancelled(el, "load"));
        assert_eq!(tree.transition_phase(el, "load"), Some(TransitionPhase::Cancelled));
    }

    #[test]
    fn errored_transitions_can_be_retried() {
        let mut tree = Tree::new();
        let el = tree.create();
        tree.define_transition(el, "load", TransitionHooks::new());
        tree.start_transition(el, "load", Value::from(true));
        assert!(tree.error_transition(el, "load", Value::from("boom")));
        assert!(tree.start_transition(el, "load", Value::from(true)));
        assert_eq!(tree.transition_payload(el, "load"), None);
        assert!(tree.end_transition(el, "load", Value::from(1)));
    }

    #[test]
    fn aggregate_ends_after_all_children() {
        let mut tree = Tree::new();
        let el = tree.create();
        let log = Log::default();
        for name in ["all", "a", "b"] {
            tree.define_transition(el, name, logging_hooks(&log));
        }
        tree.link_transitions(el, "all", "a");
        tree.link_transitions(el, "all", "b");
        for name in ["all", "a", "b"] {
            tree.start_transition(el, name, Value::from(true));
        }

        tree.end_transition(el, "a", Value::from(1));
        tree.error_transition(el, "b", Value::from("nope"));
        assert_eq!(tree.transition_phase(el, "all"), Some(TransitionPhase::Pending));

        tree.start_transition(el, "b", Value::from(true));
        tree.end_transition(el, "b", Value::from(2));
        assert_eq!(tree.transition_phase(el, "all"), Some(TransitionPhase::Ended));
        let payload = tree.transition_payload(el, "all").unwrap();
        let object = payload.as_object().unwrap();
        assert_eq!(object.get("a"), Some(&Value::from(1)));
        assert_eq!(object.get("b"), Some(&Value::from(2)));
        assert_eq!(log.borrow().last().unwrap().0, "all");

        assert!(tree.invalidate_transition(el, "a"));
        assert_eq!(tree.transition_phase(el, "all"), Some(TransitionPhase::Idle));
    }

    #[test]
    fn cancel_fires_the_attached_token() {
        let mut tree = Tree::new();
        let el = tree.create();
        tree.define_transition(el, "load", TransitionHooks::new());
        tree.start_transition(el, "load", Value::from(true));
        let token = CancelToken::new();
        tree.attach_token(el, "load", token.clone());
        assert!(!tree.is_transition_cancelled(el, "load"));
        tree.cancel_transition(el, "load", Value::from(false));
        assert!(token.is_cancelled());
    }

    #[test]
    fn end_drops_the_token_without_cancelling() {
        let mut tree = Tree::new();
        let el = tree.create();
        tree.define_transition(el, "load", TransitionHooks::new());
        tree.start_transition(el, "load", Value::from(true));
        let token = CancelToken::new();
        tree.attach_token(el, "load", token.clone());
        tree.end_transition(el, "load", Value::from(1));
        assert!(!token.is_cancelled());
    }

    #[test]
    fn deleting_the_element_cancels_tokens() {
        let mut tree = Tree::new();
        let el = tree.create();
        tree.define_transition(el, "load", TransitionHooks::new());
        tree.start_transition(el, "load", Value::from(true));
        let token = CancelToken::new();
        tree.attach_token(el, "load", token.clone());
        tree.delete(el);
        assert!(token.is_cancelled());
    }

    #[test]
    fn callbacks_may_mutate_the_tree() {
        let mut tree = Tree::new();
        let el = tree.create();
        tree.define_transition(
            el,
            "load",
            TransitionHooks::new().on_start(move |tree, event| {
                tree.set(el, Category::Ui, "busy", event.payload().clone());
            }),
        );
        tree.start_transition(el, "load", Value::from(true));
        assert_eq!(tree.get(el, Category::Ui, "busy"), Some(&Value::from(true)));
    }

    #[test]
    fn deleting_the_owner_stops_the_remaining_callbacks() {
        let mut tree = Tree::new();
        let el = tree.create();
        let log = Log::default();
        tree.define_transition(el, "all", logging_hooks(&log));
        tree.define_transition(
            el,
            "part",
            TransitionHooks::new().on_end(move |tree, _| {
                tree.delete(el);
            }),
        );
        tree.link_transitions(el, "all", "part");
        tree.start_transition(el, "all", Value::from(true));
        tree.start_transition(el, "part", Value::from(true));
        log.borrow_mut().clear();

        assert!(tree.end_transition(el, "part", Value::from(1)));
        assert!(!tree.is_alive(el));
        assert!(log.borrow().is_empty());
    }

    #[test]
    #[should_panic(expected = "already defined")]
    fn redefinition_panics() {
        let mut tree = Tree::new();
        let el = tree.create();
        tree.define_transition(el, "load", TransitionHooks::new());
        tree.define_transition(el, "load", TransitionHooks::new());
    }

    #[test]
    #[should_panic(expected = "not defined")]
    fn starting_an_undefined_transition_panics() {
        let mut tree = Tree::new();
        let el = tree.create();
        tree.start_transition(el, "missing", Value::from(true));
    }
}

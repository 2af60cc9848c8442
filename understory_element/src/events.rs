// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event listeners and three-phase dispatch.

use std::rc::Rc;

use understory_responder::{Event, ListenerFlags, ListenerId, dispatcher};
use understory_value::Value;

use crate::id::ElementId;
use crate::tree::Tree;

impl Tree {
    /// Registers `handler` for `event_type` on `target`.
    ///
    /// The first listener for an event type on an element is reported to the
    /// [`NativeBridge`](crate::NativeBridge) with `listen`.
    ///
    /// # Panics
    ///
    /// Panics if `target` is stale.
    pub fn add_event_listener(
        &mut self,
        target: ElementId,
        event_type: &str,
        flags: ListenerFlags,
        handler: impl Fn(&mut Self, &mut Event<ElementId, Value>) + 'static,
    ) -> ListenerId {
        let listeners = &mut self.element_mut(target).listeners;
        let first = listeners.get(event_type).is_empty();
        let id = listeners.add(event_type, flags, Rc::new(handler));
        if first {
            self.bridge_mut().listen(target, event_type);
        }
        id
    }

    /// Unregisters a listener. Returns `false` if it was not registered on `target`.
    ///
    /// # Panics
    ///
    /// Panics if `target` is stale.
    pub fn remove_event_listener(&mut self, target: ElementId, listener: ListenerId) -> bool {
        self.element_mut(target).listeners.remove(listener)
    }

    /// The root-to-`id` path, cached until the structure above `id` changes.
    pub(crate) fn path_to(&mut self, id: ElementId) -> Rc<[ElementId]> {
        let mut cache = core::mem::take(&mut self.element_mut(id).path);
        let path = cache.get_or_compute(id, &|node: ElementId| self.parent(node));
        self.element_mut(id).path = cache;
        path
    }

    /// Propagates `event` from the root to its target and back.
    ///
    /// Capture listeners run on the way down, every listener on the target, and
    /// non-capture listeners on the way up if the event bubbles. Listeners run from a
    /// snapshot: one removed by an earlier listener is skipped, one added is not run in
    /// this dispatch. [`ListenerFlags::ONCE`] listeners are removed before they run.
    ///
    /// Returns `false` if a listener prevented the default action.
    ///
    /// # Panics
    ///
    /// Panics if the event's target is stale.
    pub fn dispatch_event(&mut self, event: &mut Event<ElementId, Value>) -> bool {
        let path = self.path_to(event.target());
        let seq = dispatcher::sequence(&path, event.bubbles());
        dispatcher::run(&seq, event, |step, event| {
            let node = step.node;
            let Some(element) = self.try_element(node) else {
                return;
            };
            let listeners = element.listeners.snapshot(event.name());
            dispatcher::invoke_listeners(&listeners, event, |listener, event| {
                let Some(element) = self.try_element_mut(node) else {
                    return;
                };
                if !element.listeners.contains(listener.id) {
                    return;
                }
                if listener.flags.contains(ListenerFlags::ONCE) {
                    element.listeners.remove(listener.id);
                }
                (listener.handler)(self, event);
            });
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use understory_responder::{EventFlags, Phase};

    use super::*;

    type Log = Rc<RefCell<Vec<(&'static str, Phase, ElementId)>>>;

    fn chain(tree: &mut Tree) -> [ElementId; 3] {
        let a = tree.create();
        let b = tree.create();
        let c = tree.create();
        tree.append_child(a, b);
        tree.append_child(b, c);
        [a, b, c]
    }

    fn record(
        tree: &mut Tree,
        log: &Log,
        node: ElementId,
        label: &'static str,
        flags: ListenerFlags,
    ) -> ListenerId {
        let log = Rc::clone(log);
        tree.add_event_listener(node, "press", flags, move |_, event| {
            let current = event.current_target().unwrap();
            log.borrow_mut().push((label, event.phase(), current));
        })
    }

    fn press(target: ElementId, flags: EventFlags) -> Event<ElementId, Value> {
        Event::new("press", target, flags, Value::from(true))
    }

    #[test]
    fn capture_target_bubble_order() {
        let mut tree = Tree::new();
        let [a, b, c] = chain(&mut tree);
        let log = Log::default();
        record(&mut tree, &log, a, "a-bubble", ListenerFlags::empty());
        record(&mut tree, &log, a, "a-capture", ListenerFlags::CAPTURE);
        record(&mut tree, &log, b, "b-capture", ListenerFlags::CAPTURE);
        record(&mut tree, &log, c, "c", ListenerFlags::empty());

        assert!(tree.dispatch_event(&mut press(c, EventFlags::BUBBLES)));
        assert_eq!(
            *log.borrow(),
            [
                ("a-capture", Phase::Capture, a),
                ("b-capture", Phase::Capture, b),
                ("c", Phase::Target, c),
                ("a-bubble", Phase::Bubble, a),
            ]
        );
    }

    #[test]
    fn non_bubbling_events_skip_the_bubble_phase() {
        let mut tree = Tree::new();
        let [a, _, c] = chain(&mut tree);
        let log = Log::default();
        record(&mut tree, &log, a, "a-bubble", ListenerFlags::empty());
        record(&mut tree, &log, c, "c", ListenerFlags::empty());
        tree.dispatch_event(&mut press(c, EventFlags::empty()));
        assert_eq!(*log.borrow(), [("c", Phase::Target, c)]);
    }

    #[test]
    fn stop_propagation_finishes_the_current_node() {
        let mut tree = Tree::new();
        let [a, b, c] = chain(&mut tree);
        let log = Log::default();
        tree.add_event_listener(b, "press", ListenerFlags::empty(), |_, event| {
            event.stop_propagation();
        });
        record(&mut tree, &log, b, "b-second", ListenerFlags::empty());
        record(&mut tree, &log, a, "a", ListenerFlags::empty());
        tree.dispatch_event(&mut press(c, EventFlags::BUBBLES));
        assert_eq!(*log.borrow(), [("b-second", Phase::Bubble, b)]);
    }

    #[test]
    fn stop_immediate_propagation_skips_remaining_listeners() {
        let mut tree = Tree::new();
        let [_, _, c] = chain(&mut tree);
        let log = Log::default();
        let phases = Rc::new(RefCell::new(None));
        let seen = Rc::clone(&phases);
        tree.add_event_listener(c, "press", ListenerFlags::empty(), move |_, event| {
            let before = event.phase();
            event.stop_immediate_propagation();
            *seen.borrow_mut() = Some((before, event.phase()));
        });
        record(&mut tree, &log, c, "c-second", ListenerFlags::empty());
        tree.dispatch_event(&mut press(c, EventFlags::BUBBLES));
        assert!(log.borrow().is_empty());
        assert_eq!(*phases.borrow(), Some((Phase::Target, Phase::None)));
    }

    #[test]
    fn once_listeners_run_once() {
        let mut tree = Tree::new();
        let [a, _, c] = chain(&mut tree);
        let log = Log::default();
        record(
            &mut tree,
            &log,
            a,
            "once",
            ListenerFlags::ONCE | ListenerFlags::CAPTURE,
        );
        tree.dispatch_event(&mut press(c, EventFlags::BUBBLES));
        tree.dispatch_event(&mut press(c, EventFlags::BUBBLES));
        assert_eq!(*log.borrow(), [("once", Phase::Capture, a)]);
    }

    #[test]
    fn prevent_default_only_on_cancelable_events() {
        let mut tree = Tree::new();
        let [_, _, c] = chain(&mut tree);
        tree.add_event_listener(c, "press", ListenerFlags::empty(), |_, event| {
            event.prevent_default();
        });
        assert!(tree.dispatch_event(&mut press(c, EventFlags::BUBBLES)));
        assert!(!tree.dispatch_event(&mut press(c, EventFlags::CANCELABLE)));
    }

    #[test]
    fn listeners_removed_mid_dispatch_do_not_run() {
        let mut tree = Tree::new();
        let [a, _, c] = chain(&mut tree);
        let log = Log::default();
        let victim = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&victim);
        tree.add_event_listener(c, "press", ListenerFlags::empty(), move |tree, _| {
            if let Some(id) = slot.borrow_mut().take() {
                tree.remove_event_listener(a, id);
            }
        });
        let id = record(&mut tree, &log, a, "a", ListenerFlags::empty());
        *victim.borrow_mut() = Some(id);
        tree.dispatch_event(&mut press(c, EventFlags::BUBBLES));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn listeners_can_mutate_properties() {
        let mut tree = Tree::new();
        let [a, _, c] = chain(&mut tree);
        tree.add_event_listener(a, "press", ListenerFlags::empty(), move |tree, event| {
            let detail = event.detail.clone();
            tree.set(a, understory_property::Category::Event, "last", detail);
        });
        tree.dispatch_event(&mut press(c, EventFlags::BUBBLES));
        assert_eq!(
            tree.get(a, understory_property::Category::Event, "last"),
            Some(&Value::from(true))
        );
    }

    #[test]
    fn paths_follow_reparenting() {
        let mut tree = Tree::new();
        let [a, b, c] = chain(&mut tree);
        let log = Log::default();
        record(&mut tree, &log, b, "b", ListenerFlags::empty());
        tree.dispatch_event(&mut press(c, EventFlags::BUBBLES));
        tree.append_child(a, c);
        tree.dispatch_event(&mut press(c, EventFlags::BUBBLES));
        assert_eq!(log.borrow().len(), 1);
    }
}

// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The event carried through a propagation sequence.

use alloc::sync::Arc;

use crate::types::{EventFlags, Phase};

/// An event travelling from the root to a target and back.
///
/// The event records where it currently is (node and phase) and the propagation
/// decisions listeners made. `D` is the caller's payload.
#[derive(Clone, Debug)]
pub struct Event<K, D = ()> {
    name: Arc<str>,
    flags: EventFlags,
    target: K,
    current: Option<K>,
    phase: Phase,
    propagation_stopped: bool,
    immediate_stopped: bool,
    default_prevented: bool,
    /// Caller-defined payload.
    pub detail: D,
}

impl<K: Copy, D> Event<K, D> {
    /// Creates an event named `name` aimed at `target`.
    pub fn new(name: impl Into<Arc<str>>, target: K, flags: EventFlags, detail: D) -> Self {
        Self {
            name: name.into(),
            flags,
            target,
            current: None,
            phase: Phase::None,
            propagation_stopped: false,
            immediate_stopped: false,
            default_prevented: false,
            detail,
        }
    }

    /// The event type, used to select listeners.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The event type as a shared string.
    #[must_use]
    pub fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    /// The node the event is aimed at.
    #[must_use]
    pub fn target(&self) -> K {
        self.target
    }

    /// The node whose listeners are currently running.
    #[must_use]
    pub fn current_target(&self) -> Option<K> {
        self.current
    }

    /// The current phase. [`Phase::None`] outside dispatch and after an immediate stop.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the event runs a bubble phase.
    #[must_use]
    pub fn bubbles(&self) -> bool {
        self.flags.contains(EventFlags::BUBBLES)
    }

    /// Whether listeners may prevent the default action.
    #[must_use]
    pub fn cancelable(&self) -> bool {
        self.flags.contains(EventFlags::CANCELABLE)
    }

    /// Finishes the listeners of the current node, then stops.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Stops at once, skipping the remaining listeners of the current node.
    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_stopped = true;
        self.phase = Phase::None;
    }

    /// Marks the default action as prevented. Ignored if the event is not cancelable.
    pub fn prevent_default(&mut self) {
        if self.cancelable() {
            self.default_prevented = true;
        }
    }

    /// Returns `true` once any stop was requested.
    #[must_use]
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    /// Returns `true` once an immediate stop was requested.
    #[must_use]
    pub fn is_immediate_propagation_stopped(&self) -> bool {
        self.immediate_stopped
    }

    /// Returns `true` if a listener prevented the default action.
    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub(crate) fn enter(&mut self, node: K, phase: Phase) {
        self.current = Some(node);
        self.phase = phase;
    }

    pub(crate) fn leave(&mut self) {
        self.current = None;
        self.phase = Phase::None;
    }
}

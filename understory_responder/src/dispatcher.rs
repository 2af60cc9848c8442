// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatcher helper: build and walk a capture → target → bubble sequence.
//!
//! The dispatcher applies the propagation rules and leaves listener storage to the caller:
//!
//! - [`sequence`] turns a root → target path into dispatch steps.
//! - [`run`] walks the steps, moving the event's cursor and stopping between nodes once
//!   propagation was stopped.
//! - [`invoke_listeners`] runs one node's listeners that match the current phase,
//!   aborting on an immediate stop.
//!
//! ## Minimal example
//!
//! ```
//! use understory_responder::dispatcher;
//! use understory_responder::{Event, EventFlags, Phase};
//!
//! // Root → target path 1 → 2 → 3.
//! let seq = dispatcher::sequence(&[1_u32, 2, 3], true);
//!
//! let mut event = Event::new("click", 3, EventFlags::BUBBLES, ());
//! let mut handled: Vec<(Phase, u32)> = Vec::new();
//! let not_prevented = dispatcher::run(&seq, &mut event, |d, _| {
//!     handled.push((d.phase, d.node));
//! });
//!
//! assert!(not_prevented);
//! assert_eq!(handled, vec![
//!     (Phase::Capture, 1), (Phase::Capture, 2),
//!     (Phase::Target, 3),
//!     (Phase::Bubble, 2), (Phase::Bubble, 1),
//! ]);
//! ```

use alloc::vec::Vec;

use crate::event::Event;
use crate::listener::Listener;
use crate::types::Dispatch;

/// Builds the dispatch sequence for a root → target `path`.
///
/// Capture runs from the root to the target's parent, then the target, then (if
/// `bubbles`) the bubble phase from the target's parent back to the root. An empty path
/// yields an empty sequence.
#[must_use]
pub fn sequence<K: Copy>(path: &[K], bubbles: bool) -> Vec<Dispatch<K>> {
    let Some((&target, ancestors)) = path.split_last() else {
        return Vec::new();
    };
    let mut seq = Vec::with_capacity(ancestors.len() * 2 + 1);
    seq.extend(ancestors.iter().copied().map(Dispatch::capture));
    seq.push(Dispatch::target(target));
    if bubbles {
        seq.extend(ancestors.iter().rev().copied().map(Dispatch::bubble));
    }
    seq
}

/// Run a handler over a dispatch sequence and honor stop requests.
///
/// ## Usage
///
/// - Inputs:
///   - `seq`: a sequence from [`sequence`]; `run` assumes capture → target → bubble order.
///   - `event`: the event, whose cursor (`current_target`, `phase`) is moved to each step
///     before `handler` is called.
///   - `handler`: your per-step callback, typically [`invoke_listeners`] over the node's
///     listeners.
/// - Semantics:
///   - Before moving to the next step, `run` stops if propagation was stopped. The rest of
///     the current step is up to `handler`.
/// - Return:
///   - `false` if a listener prevented the default action, otherwise `true`.
///
/// ### stop propagation in capture (no target/bubble)
///
/// ```
/// use understory_responder::dispatcher::{run, sequence};
/// use understory_responder::{Event, EventFlags, Phase};
///
/// let seq = sequence(&[1_u32, 2], true);
/// let mut event = Event::new("click", 2, EventFlags::BUBBLES, ());
/// let mut seen: Vec<(Phase, u32)> = Vec::new();
/// run(&seq, &mut event, |d, e| {
///     seen.push((d.phase, d.node));
///     if d.phase == Phase::Capture && d.node == 1 {
///         e.stop_propagation();
///     }
/// });
///
/// // Propagation aborted after the first capture.
/// assert_eq!(seen, vec![(Phase::Capture, 1)]);
/// ```
pub fn run<K: Copy, D>(
    seq: &[Dispatch<K>],
    event: &mut Event<K, D>,
    mut handler: impl FnMut(&Dispatch<K>, &mut Event<K, D>),
) -> bool {
    for d in seq {
        if event.is_propagation_stopped() {
            break;
        }
        event.enter(d.node, d.phase);
        handler(d, event);
    }
    event.leave();
    !event.default_prevented()
}

/// Runs the listeners of the current node that match the event's phase.
///
/// Stops before the next listener once an immediate stop was requested. `call` receives
/// each matching listener; callers that honor [`ListenerFlags::ONCE`] remove it from their
/// table before invoking the handler.
///
/// Returns the number of listeners invoked.
///
/// [`ListenerFlags::ONCE`]: crate::ListenerFlags::ONCE
pub fn invoke_listeners<K: Copy, D, H>(
    listeners: &[Listener<H>],
    event: &mut Event<K, D>,
    mut call: impl FnMut(&Listener<H>, &mut Event<K, D>),
) -> usize {
    let mut invoked = 0;
    for listener in listeners {
        if event.is_immediate_propagation_stopped() {
            break;
        }
        if listener.flags.matches(event.phase()) {
            invoked += 1;
            call(listener, event);
        }
    }
    invoked
}

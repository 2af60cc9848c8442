// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Responder: deterministic, `no_std` three-phase event propagation.
//!
//! ## Overview
//!
//! This crate propagates an [`Event`] along a root → target path:
//!
//! 1. **Capture**: root → parent of target, running only [`ListenerFlags::CAPTURE`]
//!    listeners.
//! 2. **Target**: every listener on the target.
//! 3. **Bubble**: parent of target → root, running only non-capture listeners. Skipped
//!    entirely when the event does not carry [`EventFlags::BUBBLES`].
//!
//! It does not own a tree. Provide paths through a [`ParentLookup`] and keep them in a
//! [`PathCache`] until the structure changes.
//!
//! ## Stopping
//!
//! - [`Event::stop_propagation`] lets the remaining listeners of the current node run and
//!   then stops.
//! - [`Event::stop_immediate_propagation`] also skips the remaining listeners of the
//!   current node, and resets the phase to [`Phase::None`].
//! - [`Event::prevent_default`] is ignored unless the event is
//!   [`EventFlags::CANCELABLE`]; [`dispatcher::run`] returns `false` when it took effect.
//!
//! ## Layering
//!
//! [`dispatcher::run`] only moves the event along the sequence. The caller decides what
//! runs at each step, usually [`dispatcher::invoke_listeners`] over a
//! [`ListenerTable::snapshot`], so listeners may add or remove listeners (including
//! [`ListenerFlags::ONCE`] self-removal) while the event is in flight.
//!
//! ```
//! use understory_responder::{
//!     dispatcher, Event, EventFlags, ListenerFlags, ListenerTable, PathCache,
//! };
//!
//! let parent = |node: u32| (node > 1).then(|| node - 1);
//! let mut listeners = ListenerTable::new();
//! listeners.add("click", ListenerFlags::ONCE, "once");
//!
//! let mut cache = PathCache::new();
//! let path = cache.get_or_compute(3, &parent);
//! let seq = dispatcher::sequence(&path, true);
//!
//! let mut event = Event::new("click", 3, EventFlags::BUBBLES, ());
//! let mut fired = Vec::new();
//! dispatcher::run(&seq, &mut event, |d, e| {
//!     if d.node != 1 {
//!         return;
//!     }
//!     let snapshot = listeners.snapshot(e.name());
//!     dispatcher::invoke_listeners(&snapshot, e, |l, _| {
//!         if l.flags.contains(ListenerFlags::ONCE) {
//!             listeners.remove(l.id);
//!         }
//!         fired.push(l.handler);
//!     });
//! });
//!
//! assert_eq!(fired, ["once"]);
//! assert!(listeners.is_empty());
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod dispatcher;
mod event;
mod listener;
mod path;
mod types;

pub use event::Event;
pub use listener::{Listener, ListenerId, ListenerTable, Listeners};
pub use path::{ParentLookup, PathCache, ancestor_path};
pub use types::{Dispatch, EventFlags, ListenerFlags, Phase};

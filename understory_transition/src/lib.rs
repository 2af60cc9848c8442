// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Transition: named state machines for asynchronous work.
//!
//! A transition tracks one piece of work an element started, such as loading a resource:
//! it is defined once with four callbacks, then moves through
//! [`TransitionPhase`]s as the work starts and resolves.
//!
//! - Starting a pending transition is a no-op, so duplicate requests coalesce.
//! - Errored and cancelled transitions can be started again.
//! - Resolving a transition that is not pending is an error ([`TransitionError::NotPending`]),
//!   which lets late results from cancelled work be dropped.
//! - Transitions can be linked into aggregates whose parent ends once every child has.
//!
//! [`TransitionTable`] holds the transitions of one owner. It never calls callbacks
//! itself: each operation returns a [`Firing`] list that the owner invokes once it has
//! released its own borrows. Callback arguments are [`TransitionEvent`]s, shaped like
//! property mutations in the internals category.

mod error;
mod event;
mod phase;
mod table;

pub use error::TransitionError;
pub use event::{Fire, Firing, TransitionCallbacks, TransitionEvent};
pub use phase::TransitionPhase;
pub use table::TransitionTable;

// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Mutation: ordered, short-circuiting dispatch of property changes.
//!
//! ## Overview
//!
//! A [`MutationKey`] names one watched property as `origin/category/property`. A
//! [`DispatchTable`] keeps, per key, an ordered list of handlers together with the element
//! that registered each one (its *owner*).
//!
//! Dispatching a [`MutationEvent`]:
//!
//! 1. runs the handlers of the event's own key in registration order,
//! 2. then runs the handlers of the category's group key
//!    (`origin/category/existifallpropertieswatched`).
//!
//! A handler returning `true` stops the rest of *its* key's list for this dispatch.
//! It does not suppress the group key, and it does not unregister anything.
//!
//! ## Removal
//!
//! Removing a handler turns its slot into a tombstone. The next traversal that visits the
//! whole list (an unstopped dispatch, or a [`DispatchTable::snapshot`]) compacts it. A key
//! whose last live handler is removed is dropped from the table.
//!
//! ## Reentrancy
//!
//! [`DispatchTable::dispatch`] borrows the table for the whole call. Owners that must hand
//! themselves mutably to handlers take a [`DispatchTable::snapshot`] of each key in
//! [`MutationKey::dispatch_order`] instead, and skip entries for which
//! [`DispatchTable::contains`] turned `false` mid-dispatch.

mod key;
mod table;

pub use key::{MutationEvent, MutationKey};
pub use table::{DispatchTable, HandlerId};

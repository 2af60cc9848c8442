// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Element: a reactive element tree.
//!
//! [`Tree`] is an arena of elements addressed by generational [`ElementId`]s. Each element
//! bundles the lower-level Understory pieces:
//!
//! - a property store with per-category tiers and inheritance on attach,
//! - watchers notified of property mutations, run specific-name first then whole-category,
//! - event listeners with capture, target and bubble phases,
//! - named transitions, including the background fetch engine in [`Tree::fetch`].
//!
//! Handlers receive `&mut Tree`, so they can freely read and change the tree. Handler
//! lists are snapshotted before each dispatch: a handler removed by an earlier one does
//! not run, and one added does not run until the next dispatch.
//!
//! # Threading
//!
//! `Tree` is `!Send`. It lives on the thread of the [`Owner`] that drives it; other
//! threads reach it by submitting jobs through a [`WorkQueue`]. Build the tree with
//! [`Tree::with_runtime`] to give it worker threads for fetches:
//!
//! ```rust
//! use std::time::Duration;
//!
//! use understory_element::{FetchError, Tree};
//! use understory_property::Category;
//! use understory_transition::TransitionPhase;
//! use understory_value::Value;
//! use understory_work_queue::{CancelToken, Owner, RuntimeConfig};
//!
//! let config = RuntimeConfig::default().with_worker_threads(1);
//! let mut owner = Owner::with_runtime(&config, Tree::with_runtime).unwrap();
//!
//! let tree = owner.state_mut();
//! let page = tree.create();
//! tree.register_fetch(page, "title", |_: &CancelToken| {
//!     Ok::<_, FetchError>(Value::from("Hello"))
//! });
//! tree.fetch(page).unwrap();
//!
//! let loaded = owner.run_until(
//!     |tree| tree.fetch_phase(page) == Some(TransitionPhase::Ended),
//!     Duration::from_secs(5),
//! );
//! assert!(loaded);
//! assert_eq!(
//!     owner.state().get(page, Category::Data, "title"),
//!     Some(&Value::from("Hello"))
//! );
//! ```
//!
//! [`Owner`]: understory_work_queue::Owner
//! [`WorkQueue`]: understory_work_queue::WorkQueue

mod bridge;
mod events;
mod fetch;
mod id;
pub mod logging;
mod properties;
mod snapshot;
mod transitions;
mod tree;

pub use bridge::{NativeBridge, NoopBridge};
pub use fetch::{FETCH_TRANSITION, FetchError, Fetcher};
pub use id::ElementId;
pub use snapshot::SnapshotError;
pub use transitions::TransitionHooks;
pub use tree::{EventHandler, MutationHandler, Tree, TransitionHandler};

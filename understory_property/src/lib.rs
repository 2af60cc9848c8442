// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Property: per-element property storage with precedence tiers.
//!
//! This crate provides the storage layer of the element runtime. It holds values and the
//! lists of who watches them; it never notifies anyone. Dispatching mutations belongs to
//! the element layer, which reads the old value, writes the new one, and then dispatches.
//!
//! ## Core Concepts
//!
//! ### Categories
//!
//! Every property lives in a [`Category`] namespace (`data`, `ui`, `internals`, `event`,
//! `navigation`). Categories are fully independent.
//!
//! ### Tiers
//!
//! Each category holds four [`Tier`]s, consulted from highest to lowest precedence:
//!
//! - **Inheritable** - set on this element and offered to descendants
//! - **Local** - set on this element only
//! - **Inherited** - snapshotted from the parent's Inheritable tier on attach
//! - **Default** - fallback values
//!
//! ### Watchers
//!
//! A category also records which elements watch which property, without duplicates and in
//! registration order. The synthetic name [`WATCH_ALL`] registers interest in every
//! property of the category.
//!
//! ## Quick Start
//!
//! ```rust
//! use understory_property::{Category, PropertyStore, Tier, WATCH_ALL};
//! use understory_value::Value;
//!
//! let mut store = PropertyStore::<u32>::new(1);
//!
//! // Set and get local values
//! store.set(Category::Data, "title", Value::from("hello"), false);
//! assert_eq!(store.get(Category::Data, "title"), Some(&Value::from("hello")));
//!
//! // Inheritable shadows Local
//! store.set(Category::Data, "title", Value::from("shared"), true);
//! let (tier, _) = store.resolve(Category::Data, "title").unwrap();
//! assert_eq!(tier, Tier::Inheritable);
//!
//! // Watch registration is idempotent
//! assert!(store.new_watcher(Category::Data, WATCH_ALL, 7));
//! assert!(!store.new_watcher(Category::Data, WATCH_ALL, 7));
//! ```
//!
//! ## Memory Optimizations
//!
//! | Optimization | Description |
//! |--------------|-------------|
//! | **Sparse storage** | Tiers only allocate for properties that are set |
//! | **Inline storage** | `SmallVec` for small property and watcher counts |
//! | **Dense categories** | One array slot per category, no hashing |
//! | **Shared values** | Container values share storage until edited |

mod category;
mod properties;
mod store;
mod tier;

pub use category::{Category, UnknownCategory};
pub use properties::{Properties, WATCH_ALL};
pub use store::PropertyStore;
pub use tier::{Tier, UnknownTier};

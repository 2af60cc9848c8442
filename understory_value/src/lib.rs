// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Value: the closed value model shared by every Understory runtime layer.
//!
//! ## Overview
//!
//! A [`Value`] is one of five kinds: `Bool`, `String`, `Number`, `Object`, or `List`.
//! Values are immutable by convention. The two container kinds, [`Object`] and [`List`],
//! are backed by reference-counted storage so cloning a value is cheap and snapshots can be
//! handed to many readers (including other threads) without copying.
//!
//! ## Copy-on-write
//!
//! Containers are edited through temp handles:
//!
//! - [`Object::make_copy`] returns a [`TempObject`] that shares storage with its source.
//! - The first mutation through the handle performs the physical copy; later mutations
//!   edit that private copy in place.
//! - [`TempObject::commit`] turns the handle back into an immutable [`Object`].
//!
//! Committing never mutates the snapshot the handle was copied from:
//!
//! ```rust
//! use understory_value::{TempObject, Value};
//!
//! let a = TempObject::new().set("k", 1).commit();
//! let b = a.make_copy().set("k", 2).commit();
//!
//! assert_eq!(a.get("k"), Some(&Value::Number(1.0)));
//! assert_eq!(b.get("k"), Some(&Value::Number(2.0)));
//! ```
//!
//! ## Wire form
//!
//! [`Value::raw_value`] emits a JSON tree in which every node carries an explicit type tag
//! and payload (`{"type": "Number", "value": 1.0}`), and [`Value::decode`] inverts it for
//! every kind, including objects nested in objects and lists of values. Decoding never
//! coerces: a payload that does not match its tag is a [`DecodeError`].
//!
//! ```rust
//! use understory_value::{TempList, TempObject, Value};
//!
//! let value = Value::from(
//!     TempObject::new()
//!         .set("title", "hello")
//!         .set("tags", TempList::new().append(true).append(2).commit())
//!         .commit(),
//! );
//!
//! let raw = value.raw_value();
//! assert_eq!(raw["type"], "Object");
//! assert_eq!(Value::decode(&raw).unwrap(), value);
//! ```

mod error;
mod kind;
mod list;
mod object;
mod raw;
mod value;

pub use error::{DecodeError, ValueError};
pub use kind::ValueKind;
pub use list::{List, TempList};
pub use object::{Object, TempObject};
pub use raw::{TYPE_KEY, VALUE_KEY};
pub use value::Value;

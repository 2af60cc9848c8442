// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Copy-on-write lists.

use core::fmt;
use std::sync::Arc;

use crate::error::ValueError;
use crate::value::Value;

/// An immutable sequence of values.
///
/// Like [`Object`](crate::Object), cloning shares storage and edits go through a
/// [`TempList`] handle from [`List::make_copy`].
#[derive(Clone, Default)]
pub struct List {
    items: Arc<Vec<Value>>,
}

impl List {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The elements as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }

    /// Iterates over the elements in order.
    pub fn iter(&self) -> core::slice::Iter<'_, Value> {
        self.items.iter()
    }

    /// Returns an editable handle that shares storage with `self` until its first edit.
    #[must_use]
    pub fn make_copy(&self) -> TempList {
        TempList {
            items: Arc::clone(&self.items),
        }
    }

    /// Returns `true` if both lists point at the same storage.
    #[must_use]
    pub fn shares_storage(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }
}

impl PartialEq for List {
    fn eq(&self, other: &Self) -> bool {
        self.shares_storage(other) || self.items == other.items
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Value;
    type IntoIter = core::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V: Into<Value>> FromIterator<V> for List {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self {
            items: Arc::new(iter.into_iter().map(Into::into).collect()),
        }
    }
}

impl From<Vec<Value>> for List {
    fn from(items: Vec<Value>) -> Self {
        Self {
            items: Arc::new(items),
        }
    }
}

/// An editable list handle.
#[derive(Clone, Default)]
pub struct TempList {
    items: Arc<Vec<Value>>,
}

impl TempList {
    /// Creates an empty handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value`, returning the handle for chaining.
    #[must_use]
    pub fn append(mut self, value: impl Into<Value>) -> Self {
        self.push(value);
        self
    }

    /// Appends `value` in place.
    pub fn push(&mut self, value: impl Into<Value>) {
        Arc::make_mut(&mut self.items).push(value.into());
    }

    /// Replaces the element at `index` and returns the old one.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::IndexOutOfRange`] if `index` is past the end.
    pub fn replace(&mut self, index: usize, value: impl Into<Value>) -> Result<Value, ValueError> {
        self.check(index)?;
        let slot = &mut Arc::make_mut(&mut self.items)[index];
        Ok(core::mem::replace(slot, value.into()))
    }

    /// Removes the element at `index`, shifting later elements down.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::IndexOutOfRange`] if `index` is past the end.
    pub fn remove(&mut self, index: usize) -> Result<Value, ValueError> {
        self.check(index)?;
        Ok(Arc::make_mut(&mut self.items).remove(index))
    }

    /// Returns the element currently at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the handle is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns `true` if this handle still shares storage with `list`.
    #[must_use]
    pub fn shares_storage(&self, list: &List) -> bool {
        Arc::ptr_eq(&self.items, &list.items)
    }

    /// Freezes the handle into an immutable [`List`].
    #[must_use]
    pub fn commit(self) -> List {
        List { items: self.items }
    }

    fn check(&self, index: usize) -> Result<(), ValueError> {
        let len = self.items.len();
        if index < len {
            Ok(())
        } else {
            Err(ValueError::IndexOutOfRange { index, len })
        }
    }
}

impl fmt::Debug for TempList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

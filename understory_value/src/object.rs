// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Copy-on-write objects.

use core::fmt;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::value::Value;

type Fields = BTreeMap<Arc<str>, Value>;

/// An immutable map from names to values.
///
/// Cloning an `Object` shares its storage. Edits go through [`Object::make_copy`], which
/// returns a [`TempObject`] that copies the storage on its first mutation.
#[derive(Clone, Default)]
pub struct Object {
    fields: Arc<Fields>,
}

impl Object {
    /// Creates an empty object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns `true` if the object has a field called `name`.
    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the object has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.fields.iter().map(|(k, v)| (&**k, v))
    }

    /// Iterates over field names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.keys().map(|k| &**k)
    }

    /// Returns an editable handle that shares storage with `self` until its first edit.
    #[must_use]
    pub fn make_copy(&self) -> TempObject {
        TempObject {
            fields: Arc::clone(&self.fields),
        }
    }

    /// Returns `true` if both objects point at the same storage.
    #[must_use]
    pub fn shares_storage(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.fields, &other.fields)
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.shares_storage(other) || self.fields == other.fields
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> FromIterator<(K, V)> for Object
where
    K: Into<Arc<str>>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: Arc::new(
                iter.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

/// An editable object handle.
///
/// A handle obtained from [`Object::make_copy`] shares storage with its source until the
/// first edit that actually changes something; at that point the fields are copied once and
/// every later edit happens in place.
#[derive(Clone, Default)]
pub struct TempObject {
    fields: Arc<Fields>,
}

impl TempObject {
    /// Creates an empty handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, returning the handle for chaining.
    #[must_use]
    pub fn set(mut self, name: impl Into<Arc<str>>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Removes `name`, returning the handle for chaining.
    #[must_use]
    pub fn delete(mut self, name: &str) -> Self {
        self.remove(name);
        self
    }

    /// Sets `name` to `value` in place and returns the previous value.
    pub fn insert(&mut self, name: impl Into<Arc<str>>, value: impl Into<Value>) -> Option<Value> {
        Arc::make_mut(&mut self.fields).insert(name.into(), value.into())
    }

    /// Removes `name` in place and returns its value.
    ///
    /// Removing a missing field does not copy shared storage.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        if !self.fields.contains_key(name) {
            return None;
        }
        Arc::make_mut(&mut self.fields).remove(name)
    }

    /// Returns the value currently stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the handle has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns `true` if this handle still shares storage with `object`.
    #[must_use]
    pub fn shares_storage(&self, object: &Object) -> bool {
        Arc::ptr_eq(&self.fields, &object.fields)
    }

    /// Freezes the handle into an immutable [`Object`].
    #[must_use]
    pub fn commit(self) -> Object {
        Object {
            fields: self.fields,
        }
    }
}

impl fmt::Debug for TempObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.fields.iter().map(|(k, v)| (&**k, v)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn committed_copy_leaves_source_alone() {
        let a = TempObject::new().set("k", 1).commit();
        let b = a.make_copy().set("k", 2).commit();
        assert_eq!(a.get("k"), Some(&Value::Number(1.0)));
        assert_eq!(b.get("k"), Some(&Value::Number(2.0)));
        assert!(!a.shares_storage(&b));
    }

    #[test]
    fn copy_is_deferred_until_first_edit() {
        let a = TempObject::new().set("k", 1).commit();
        let mut temp = a.make_copy();
        assert!(temp.shares_storage(&a));

        assert_eq!(temp.remove("missing"), None);
        assert!(temp.shares_storage(&a), "no-op removal must not copy");

        temp.insert("j", true);
        assert!(!temp.shares_storage(&a));
        assert_eq!(a.len(), 1);
        assert_eq!(temp.len(), 2);
    }

    #[test]
    fn unedited_copy_commits_to_shared_storage() {
        let a = TempObject::new().set("k", "v").commit();
        let b = a.make_copy().commit();
        assert!(a.shares_storage(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn delete_removes_fields() {
        let a = TempObject::new().set("a", 1).set("b", 2).commit();
        let b = a.make_copy().delete("a").commit();
        assert!(a.contains_key("a"));
        assert!(!b.contains_key("a"));
        assert_eq!(b.keys().collect::<Vec<_>>(), ["b"]);
    }

    #[test]
    fn insert_reports_previous_value() {
        let mut temp = TempObject::new();
        assert_eq!(temp.insert("x", 1), None);
        assert_eq!(temp.insert("x", 2), Some(Value::Number(1.0)));
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let a = TempObject::new().set("a", 1).set("b", 2).commit();
        let b = TempObject::new().set("b", 2).set("a", 1).commit();
        assert_eq!(a, b);
        let c: Object = [("a", 1), ("b", 3)].into_iter().collect();
        assert_ne!(a, c);
    }
}

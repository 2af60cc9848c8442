// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`Value`] sum type.

use std::sync::Arc;

use crate::error::ValueError;
use crate::kind::ValueKind;
use crate::list::List;
use crate::object::Object;

/// A dynamically typed, immutable-by-convention value.
///
/// Equality is structural: two values are equal when they have the same kind and equal
/// payloads, recursively for containers. Numbers compare with IEEE semantics except that
/// every `NaN` equals every other `NaN`, which keeps equality reflexive for shared and
/// unshared copies alike.
#[derive(Clone, Debug)]
pub enum Value {
    /// A boolean.
    Bool(bool),
    /// A shared, immutable string.
    String(Arc<str>),
    /// A double-precision number.
    Number(f64),
    /// A copy-on-write map of named values.
    Object(Object),
    /// A copy-on-write sequence of values.
    List(List),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::Object(a), Self::Object(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Returns the kind of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::String(_) => ValueKind::String,
            Self::Number(_) => ValueKind::Number,
            Self::Object(_) => ValueKind::Object,
            Self::List(_) => ValueKind::List,
        }
    }

    /// Returns the boolean payload, if this is a `Bool`.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the string payload, if this is a `String`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric payload, if this is a `Number`.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the object payload, if this is an `Object`.
    #[must_use]
    pub const fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Returns the list payload, if this is a `List`.
    #[must_use]
    pub const fn as_list(&self) -> Option<&List> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    /// Checks that this value has the `expected` kind.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::KindMismatch`] when the kinds differ.
    pub fn expect_kind(&self, expected: ValueKind) -> Result<&Self, ValueError> {
        let found = self.kind();
        if found == expected {
            Ok(self)
        } else {
            Err(ValueError::KindMismatch { expected, found })
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value.into())
    }
}

impl From<Arc<str>> for Value {
    fn from(value: Arc<str>) -> Self {
        Self::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Number(value.into())
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Self::Object(value)
    }
}

impl From<List> for Value {
    fn from(value: List) -> Self {
        Self::List(value)
    }
}

macro_rules! try_from_value {
    ($ty:ty, $kind:ident, $bind:ident => $out:expr) => {
        impl TryFrom<Value> for $ty {
            type Error = ValueError;

            fn try_from(value: Value) -> Result<Self, Self::Error> {
                match value {
                    Value::$kind($bind) => Ok($out),
                    other => Err(ValueError::KindMismatch {
                        expected: ValueKind::$kind,
                        found: other.kind(),
                    }),
                }
            }
        }
    };
}

try_from_value!(bool, Bool, b => b);
try_from_value!(f64, Number, n => n);
try_from_value!(Arc<str>, String, s => s);
try_from_value!(String, String, s => String::from(&*s));
try_from_value!(Object, Object, o => o);
try_from_value!(List, List, l => l);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TempList, TempObject};

    #[test]
    fn kinds_follow_constructors() {
        assert_eq!(Value::from(true).kind(), ValueKind::Bool);
        assert_eq!(Value::from("x").kind(), ValueKind::String);
        assert_eq!(Value::from(3).kind(), ValueKind::Number);
        assert_eq!(Value::from(Object::new()).kind(), ValueKind::Object);
        assert_eq!(Value::from(List::new()).kind(), ValueKind::List);
    }

    #[test]
    fn typed_access_reports_mismatch() {
        let err = f64::try_from(Value::from("1")).unwrap_err();
        assert_eq!(
            err,
            ValueError::KindMismatch {
                expected: ValueKind::Number,
                found: ValueKind::String,
            }
        );
        assert_eq!(f64::try_from(Value::from(1.5)), Ok(1.5));
        assert_eq!(String::try_from(Value::from("hi")).unwrap(), "hi");
        assert!(Value::from(false).expect_kind(ValueKind::List).is_err());
    }

    #[test]
    fn equal_objects_compare_structurally() {
        let a = TempObject::new().set("a", 1).commit();
        let b = TempObject::new().set("a", 1).commit();
        let c = TempObject::new().set("a", 2).commit();
        assert_eq!(Value::from(a.clone()), Value::from(b));
        assert_ne!(Value::from(a), Value::from(c));
    }

    #[test]
    fn nan_equality_does_not_depend_on_sharing() {
        assert_eq!(Value::from(f64::NAN), Value::from(f64::NAN));
        assert_ne!(Value::from(f64::NAN), Value::from(0.0));
        assert_eq!(Value::from(0.0), Value::from(-0.0));

        let shared = TempList::new().append(f64::NAN).commit();
        let copy = TempList::new().append(f64::NAN).commit();
        assert!(shared.shares_storage(&shared.clone()));
        assert_eq!(shared, shared.clone());
        assert_eq!(shared, copy);

        let object = TempObject::new().set("n", f64::NAN).commit();
        let rebuilt = TempObject::new().set("n", f64::NAN).commit();
        assert_eq!(Value::from(object), Value::from(rebuilt));
    }

    #[test]
    fn kind_differs_before_payload() {
        assert_ne!(Value::from(1), Value::from("1"));
        assert_ne!(
            Value::from(List::new()),
            Value::from(Object::new()),
        );
    }

    #[test]
    fn nested_containers_compare_deeply() {
        let inner = |n: i32| TempList::new().append(n).append("x").commit();
        let a = TempObject::new().set("l", inner(1)).commit();
        let b = TempObject::new().set("l", inner(1)).commit();
        let c = TempObject::new().set("l", inner(2)).commit();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}

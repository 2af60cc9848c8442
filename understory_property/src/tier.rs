// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Precedence tiers and their sparse storage.

use core::fmt;
use core::str::FromStr;
use std::sync::Arc;

use smallvec::SmallVec;
use thiserror::Error;
use understory_value::Value;

/// Default inline capacity for tier entries.
///
/// Most elements set only a handful of properties per category, so this avoids heap
/// allocation in the common case.
const INLINE_CAPACITY: usize = 8;

/// A precedence tier of a property category.
///
/// Resolution consults tiers in [`Tier::PRECEDENCE`] order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Fallback values, lowest precedence.
    Default,
    /// Values snapshotted from the parent's [`Tier::Inheritable`] tier on attach.
    Inherited,
    /// Values set on this element only.
    Local,
    /// Values set on this element and offered to descendants. Highest precedence.
    Inheritable,
}

impl Tier {
    /// Tiers from highest to lowest precedence.
    pub const PRECEDENCE: [Self; 4] = [
        Self::Inheritable,
        Self::Local,
        Self::Inherited,
        Self::Default,
    ];

    /// Returns the stable name of this tier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Inherited => "inherited",
            Self::Local => "local",
            Self::Inheritable => "inheritable",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown tier name.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown property tier `{0}`")]
pub struct UnknownTier(pub String);

impl FromStr for Tier {
    type Err = UnknownTier;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::PRECEDENCE
            .into_iter()
            .find(|t| t.as_str() == name)
            .ok_or_else(|| UnknownTier(name.to_owned()))
    }
}

/// Sparse storage for one tier, sorted by name for binary search lookup.
#[derive(Clone, Debug, Default)]
pub(crate) struct TierMap {
    entries: SmallVec<[(Arc<str>, Value); INLINE_CAPACITY]>,
}

impl TierMap {
    #[inline]
    fn find(&self, name: &str) -> Result<usize, usize> {
        self.entries.binary_search_by(|(k, _)| (**k).cmp(name))
    }

    #[inline]
    pub(crate) fn get(&self, name: &str) -> Option<&Value> {
        self.find(name).ok().map(|idx| &self.entries[idx].1)
    }

    pub(crate) fn insert(&mut self, name: Arc<str>, value: Value) -> Option<Value> {
        match self.find(&name) {
            Ok(idx) => Some(core::mem::replace(&mut self.entries[idx].1, value)),
            Err(idx) => {
                self.entries.insert(idx, (name, value));
                None
            }
        }
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.find(name).ok()?;
        Some(self.entries.remove(idx).1)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.entries.iter().map(|(k, v)| (&**k, v))
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_is_highest_first() {
        assert_eq!(Tier::PRECEDENCE[0], Tier::Inheritable);
        assert_eq!(Tier::PRECEDENCE[3], Tier::Default);
        assert_eq!("local".parse::<Tier>(), Ok(Tier::Local));
        assert!("animation".parse::<Tier>().is_err());
    }

    #[test]
    fn entries_stay_sorted() {
        let mut map = TierMap::default();
        for name in ["m", "c", "x", "a", "q"] {
            map.insert(name.into(), Value::from(name));
        }
        let names: Vec<_> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["a", "c", "m", "q", "x"]);
    }

    #[test]
    fn binary_search_correctness() {
        let mut map = TierMap::default();
        for i in (0..40).step_by(2) {
            map.insert(format!("p{i:02}").into(), Value::from(i));
        }
        for i in 0..40 {
            let found = map.get(&format!("p{i:02}"));
            if i % 2 == 0 {
                assert_eq!(found, Some(&Value::from(i)));
            } else {
                assert!(found.is_none());
            }
        }
        assert_eq!(map.len(), 20);
    }

    #[test]
    fn insert_and_remove_report_previous() {
        let mut map = TierMap::default();
        assert_eq!(map.insert("a".into(), Value::from(1)), None);
        assert_eq!(map.insert("a".into(), Value::from(2)), Some(Value::from(1)));
        assert_eq!(map.remove("a"), Some(Value::from(2)));
        assert_eq!(map.remove("a"), None);
        assert!(map.is_empty());
    }
}

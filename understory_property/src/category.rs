// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property namespaces.

use core::fmt;
use core::str::FromStr;

use thiserror::Error;

/// A property namespace.
///
/// Every element keeps one independent set of tiers and watchers per category.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Application data, typically written by fetches.
    Data,
    /// Presentation state.
    Ui,
    /// Runtime bookkeeping such as transition state.
    Internals,
    /// Event-related state.
    Event,
    /// Routing and navigation state.
    Navigation,
}

impl Category {
    /// Number of categories.
    pub const COUNT: usize = 5;

    /// Every category, in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Data,
        Self::Ui,
        Self::Internals,
        Self::Event,
        Self::Navigation,
    ];

    /// Returns the stable name of this category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Ui => "ui",
            Self::Internals => "internals",
            Self::Event => "event",
            Self::Navigation => "navigation",
        }
    }

    /// Returns the dense index of this category, in `0..COUNT`.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown category name.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown property category `{0}`")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == name)
            .ok_or_else(|| UnknownCategory(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
            assert_eq!(Category::ALL[category.index()], category);
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(
            "Data".parse::<Category>(),
            Err(UnknownCategory("Data".into()))
        );
    }
}

// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Value kind tags.

use core::fmt;
use core::str::FromStr;

use crate::error::DecodeError;

/// The kind of a [`Value`](crate::Value).
///
/// The string form of a kind is the type tag used by the wire format.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    /// A boolean.
    Bool,
    /// A UTF-8 string.
    String,
    /// A double-precision number.
    Number,
    /// A string-keyed map of values.
    Object,
    /// An ordered sequence of values.
    List,
}

impl ValueKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Bool,
        Self::String,
        Self::Number,
        Self::Object,
        Self::List,
    ];

    /// Returns the wire tag for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::String => "String",
            Self::Number => "Number",
            Self::Object => "Object",
            Self::List => "List",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = DecodeError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == tag)
            .ok_or_else(|| DecodeError::UnknownTag(tag.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_parse_back() {
        for kind in ValueKind::ALL {
            assert_eq!(kind.as_str().parse::<ValueKind>().unwrap(), kind);
        }
    }

    #[test]
    fn tags_are_case_sensitive() {
        assert!(matches!(
            "number".parse::<ValueKind>(),
            Err(DecodeError::UnknownTag(tag)) if tag == "number"
        ));
    }
}

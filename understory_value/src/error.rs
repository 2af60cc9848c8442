// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for typed access and wire decoding.

use thiserror::Error;

use crate::kind::ValueKind;

/// Error returned by typed access to a [`Value`](crate::Value) or a list edit.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The value is of a different kind than the caller asked for.
    #[error("expected a {expected} value, found {found}")]
    KindMismatch {
        /// The kind the caller asked for.
        expected: ValueKind,
        /// The kind the value actually has.
        found: ValueKind,
    },
    /// A list index was past the end of the list.
    #[error("index {index} is out of range for a list of length {len}")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The length of the list.
        len: usize,
    },
}

/// Error returned when a raw (wire-form) value cannot be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The raw node is not a JSON object carrying a type tag.
    #[error("raw value must be a tagged JSON object, found {found}")]
    NotTagged {
        /// The JSON type that was found instead.
        found: &'static str,
    },
    /// The raw node lacks one of the required keys.
    #[error("raw value is missing the `{0}` key")]
    MissingKey(&'static str),
    /// The type tag is not one of the known [`ValueKind`] tags.
    #[error("unknown value type tag `{0}`")]
    UnknownTag(String),
    /// The payload does not have the JSON shape the tag requires.
    #[error("{expected} value carries a {found} payload")]
    PayloadMismatch {
        /// The kind named by the tag.
        expected: ValueKind,
        /// The JSON type of the payload.
        found: &'static str,
    },
    /// A nested field or element failed to decode.
    #[error("at `{path}`: {source}")]
    Nested {
        /// Dotted path from the decoded root to the failing node.
        path: String,
        /// The underlying failure.
        source: Box<DecodeError>,
    },
    /// The input was not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl DecodeError {
    /// Wraps this error with one more path segment, outermost first.
    pub(crate) fn within(self, segment: &str) -> Self {
        match self {
            Self::Nested { path, source } => Self::Nested {
                path: format!("{segment}.{path}"),
                source,
            },
            other => Self::Nested {
                path: segment.to_owned(),
                source: Box::new(other),
            },
        }
    }

    /// Returns the innermost error, skipping any path annotations.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Nested { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The type-tagged JSON wire form.
//!
//! Every node is a JSON object with exactly two keys:
//!
//! - [`TYPE_KEY`]: the [`ValueKind`] tag,
//! - [`VALUE_KEY`]: the payload. Objects carry a JSON object of raw nodes and lists a JSON
//!   array of raw nodes.
//!
//! JSON has no spelling for non-finite numbers, so those travel as the string payloads
//! `"NaN"`, `"inf"` and `"-inf"`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value as Json};

use crate::error::DecodeError;
use crate::kind::ValueKind;
use crate::list::List;
use crate::object::Object;
use crate::value::Value;

/// Key holding the type tag of a raw node.
pub const TYPE_KEY: &str = "type";
/// Key holding the payload of a raw node.
pub const VALUE_KEY: &str = "value";

const NAN: &str = "NaN";
const INFINITY: &str = "inf";
const NEG_INFINITY: &str = "-inf";

impl Value {
    /// Encodes this value into its tagged JSON form.
    #[must_use]
    pub fn raw_value(&self) -> Json {
        let payload = match self {
            Self::Bool(b) => Json::Bool(*b),
            Self::String(s) => Json::String(s.to_string()),
            Self::Number(n) => encode_number(*n),
            Self::Object(o) => Json::Object(
                o.iter()
                    .map(|(k, v)| (k.to_owned(), v.raw_value()))
                    .collect(),
            ),
            Self::List(l) => Json::Array(l.iter().map(Self::raw_value).collect()),
        };
        let mut node = Map::with_capacity(2);
        node.insert(TYPE_KEY.to_owned(), Json::String(self.kind().as_str().to_owned()));
        node.insert(VALUE_KEY.to_owned(), payload);
        Json::Object(node)
    }

    /// Decodes a tagged JSON node produced by [`Value::raw_value`].
    ///
    /// # Errors
    ///
    /// Fails when the node is not tagged, a key is missing, the tag is unknown, or a payload
    /// does not have the shape its tag requires. Failures inside containers are wrapped in
    /// [`DecodeError::Nested`] with the path to the offending node.
    pub fn decode(raw: &Json) -> Result<Self, DecodeError> {
        let node = raw.as_object().ok_or(DecodeError::NotTagged {
            found: json_type(raw),
        })?;
        let tag = node
            .get(TYPE_KEY)
            .ok_or(DecodeError::MissingKey(TYPE_KEY))?;
        let kind: ValueKind = match tag {
            Json::String(tag) => tag.parse()?,
            other => return Err(DecodeError::UnknownTag(other.to_string())),
        };
        let payload = node
            .get(VALUE_KEY)
            .ok_or(DecodeError::MissingKey(VALUE_KEY))?;
        let mismatch = || DecodeError::PayloadMismatch {
            expected: kind,
            found: json_type(payload),
        };

        match (kind, payload) {
            (ValueKind::Bool, Json::Bool(b)) => Ok(Self::Bool(*b)),
            (ValueKind::String, Json::String(s)) => Ok(Self::from(s.as_str())),
            (ValueKind::Number, Json::Number(n)) => {
                n.as_f64().map(Self::Number).ok_or_else(mismatch)
            }
            (ValueKind::Number, Json::String(s)) => match s.as_str() {
                NAN => Ok(Self::Number(f64::NAN)),
                INFINITY => Ok(Self::Number(f64::INFINITY)),
                NEG_INFINITY => Ok(Self::Number(f64::NEG_INFINITY)),
                _ => Err(mismatch()),
            },
            (ValueKind::Object, Json::Object(fields)) => fields
                .iter()
                .map(|(k, v)| {
                    Self::decode(v)
                        .map(|v| (k.as_str(), v))
                        .map_err(|e| e.within(k))
                })
                .collect::<Result<Object, _>>()
                .map(Self::Object),
            (ValueKind::List, Json::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, v)| Self::decode(v).map_err(|e| e.within(&i.to_string())))
                .collect::<Result<List, _>>()
                .map(Self::List),
            _ => Err(mismatch()),
        }
    }

    /// Encodes this value as tagged JSON text.
    #[must_use]
    pub fn to_json(&self) -> String {
        self.raw_value().to_string()
    }

    /// Parses tagged JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Json`] for malformed text and any [`Value::decode`] error for
    /// well-formed text that is not a valid raw node.
    pub fn from_json(text: &str) -> Result<Self, DecodeError> {
        let raw: Json = serde_json::from_str(text)?;
        Self::decode(&raw)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Json::deserialize(deserializer)?;
        Self::decode(&raw).map_err(D::Error::custom)
    }
}

fn encode_number(n: f64) -> Json {
    match Number::from_f64(n) {
        Some(n) => Json::Number(n),
        None if n.is_nan() => Json::String(NAN.to_owned()),
        None if n > 0.0 => Json::String(INFINITY.to_owned()),
        None => Json::String(NEG_INFINITY.to_owned()),
    }
}

fn json_type(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

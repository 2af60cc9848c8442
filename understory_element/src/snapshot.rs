// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element property snapshots in the tagged wire form.
//!
//! A snapshot nests category, tier and property names:
//!
//! ```json
//! { "ui": { "local": { "color": { "type": "String", "value": "red" } } } }
//! ```
//!
//! Empty tiers and categories are omitted.

use std::sync::Arc;

use serde_json::{Map, Value as Json};
use thiserror::Error;
use tracing::debug;
use understory_property::{Category, Tier, UnknownCategory, UnknownTier};
use understory_value::{DecodeError, Value};

use crate::id::ElementId;
use crate::tree::Tree;

/// Error returned by [`Tree::restore`].
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// A property value is not a valid tagged value.
    #[error("invalid value at `{path}`: {source}")]
    Decode {
        /// Where the value sits, as `category/tier/name`.
        path: String,
        /// The decoding failure.
        source: DecodeError,
    },
    /// A key is not a category name.
    #[error(transparent)]
    Category(#[from] UnknownCategory),
    /// A key is not a tier name.
    #[error(transparent)]
    Tier(#[from] UnknownTier),
    /// A level of the snapshot is not a JSON object.
    #[error("expected an object at `{path}`, found {found}")]
    Shape {
        /// The offending level; empty for the root.
        path: String,
        /// The JSON type that was found.
        found: &'static str,
    },
}

fn json_type(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

fn object<'a>(json: &'a Json, path: &str) -> Result<&'a Map<String, Json>, SnapshotError> {
    json.as_object().ok_or_else(|| SnapshotError::Shape {
        path: path.to_owned(),
        found: json_type(json),
    })
}

impl Tree {
    /// Encodes the non-empty property tiers of `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    #[must_use]
    pub fn raw_value(&self, id: ElementId) -> Json {
        let store = &self.element(id).store;
        let mut categories = Map::new();
        for category in Category::ALL {
            let properties = store.category(category);
            let mut tiers = Map::new();
            for tier in Tier::PRECEDENCE {
                let entries: Map<String, Json> = properties
                    .entries(tier)
                    .map(|(name, value)| (name.to_owned(), value.raw_value()))
                    .collect();
                if !entries.is_empty() {
                    tiers.insert(tier.as_str().to_owned(), Json::Object(entries));
                }
            }
            if !tiers.is_empty() {
                categories.insert(category.as_str().to_owned(), Json::Object(tiers));
            }
        }
        Json::Object(categories)
    }

    /// Replaces every property value of `id` with the contents of `raw`.
    ///
    /// `raw` has the shape produced by [`raw_value`](Self::raw_value). It is validated
    /// completely before anything changes, so a failed restore leaves the element as it
    /// was. Watchers are kept but not notified.
    ///
    /// # Errors
    ///
    /// Fails on an unknown category or tier name, a level that is not an object, or a
    /// property that does not decode.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn restore(&mut self, id: ElementId, raw: &Json) -> Result<(), SnapshotError> {
        self.assert_alive(id);
        let mut staged: Vec<(Category, Tier, Arc<str>, Value)> = Vec::new();
        for (category_name, tiers) in object(raw, "")? {
            let category: Category = category_name.parse()?;
            for (tier_name, entries) in object(tiers, category_name)? {
                let tier: Tier = tier_name.parse()?;
                let tier_path = format!("{category_name}/{tier_name}");
                for (name, raw_value) in object(entries, &tier_path)? {
                    let value =
                        Value::decode(raw_value).map_err(|source| SnapshotError::Decode {
                            path: format!("{tier_path}/{name}"),
                            source,
                        })?;
                    staged.push((category, tier, name.as_str().into(), value));
                }
            }
        }

        let store = &mut self.element_mut(id).store;
        for category in Category::ALL {
            let properties = store.category_mut(category);
            for tier in Tier::PRECEDENCE {
                properties.clear_tier(tier);
            }
        }
        let count = staged.len();
        for (category, tier, name, value) in staged {
            store.set_in(category, tier, name, value);
        }
        debug!(%id, count, "restored properties");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn raw_value_lists_non_empty_tiers() {
        let mut tree = Tree::new();
        let el = tree.create();
        tree.set(el, Category::Ui, "color", Value::from("red"));
        tree.set_default(el, Category::Data, "count", Value::from(0));
        assert_eq!(
            tree.raw_value(el),
            json!({
                "data": { "default": { "count": { "type": "Number", "value": 0.0 } } },
                "ui": { "local": { "color": { "type": "String", "value": "red" } } },
            })
        );
    }

    #[test]
    fn empty_elements_encode_as_an_empty_object() {
        let mut tree = Tree::new();
        let el = tree.create();
        assert_eq!(tree.raw_value(el), json!({}));
    }

    #[test]
    fn restore_replaces_every_tier() {
        let mut tree = Tree::new();
        let source = tree.create();
        tree.set_inheritable(source, Category::Ui, "theme", Value::from("dark"));
        tree.set(source, Category::Data, "n", Value::from(3));
        let raw = tree.raw_value(source);

        let target = tree.create();
        tree.set(target, Category::Data, "stale", Value::from(true));
        tree.restore(target, &raw).unwrap();

        assert_eq!(tree.get(target, Category::Data, "stale"), None);
        assert_eq!(tree.get(target, Category::Data, "n"), Some(&Value::from(3)));
        assert_eq!(
            tree.resolve(target, Category::Ui, "theme"),
            Some((Tier::Inheritable, &Value::from("dark")))
        );
        assert_eq!(tree.raw_value(target), raw);
    }

    #[test]
    fn restore_does_not_notify_watchers() {
        let mut tree = Tree::new();
        let watcher = tree.create();
        let target = tree.create();
        let calls = std::rc::Rc::new(std::cell::Cell::new(0));
        let seen = std::rc::Rc::clone(&calls);
        tree.watch(watcher, target, Category::Data, "n", move |_, _| {
            seen.set(seen.get() + 1);
            false
        });
        let raw = json!({ "data": { "local": { "n": { "type": "Number", "value": 1.0 } } } });
        tree.restore(target, &raw).unwrap();
        assert_eq!(calls.get(), 0);
        assert_eq!(tree.watchers(target, Category::Data, "n"), [watcher]);
    }

    #[test]
    fn malformed_snapshots_leave_the_element_untouched() {
        let mut tree = Tree::new();
        let el = tree.create();
        tree.set(el, Category::Data, "keep", Value::from(1));

        let cases = [
            (json!([]), "expected an object at ``, found an array"),
            (json!({ "bogus": {} }), "unknown property category `bogus`"),
            (json!({ "data": { "local": 1 } }), "expected an object at `data/local`"),
            (json!({ "data": { "top": {} } }), "unknown property tier `top`"),
            (
                json!({ "data": { "local": { "x": { "type": "blob", "value": 1 } } } }),
                "invalid value at `data/local/x`",
            ),
        ];
        for (raw, message) in cases {
            let err = tree.restore(el, &raw).unwrap_err();
            assert!(
                err.to_string().starts_with(message),
                "{err} does not start with {message}"
            );
        }
        assert_eq!(tree.get(el, Category::Data, "keep"), Some(&Value::from(1)));
    }
}

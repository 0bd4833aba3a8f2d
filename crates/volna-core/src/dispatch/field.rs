//! Field-expression filters.
//!
//! A small expression type over the raw JSON of object-shaped updates:
//! a dotted field path, a comparator, and a literal. Covers the common
//! "match on a payload field" registrations without a hand-written
//! predicate closure:
//!
//! ```rust,ignore
//! use volna_core::dispatch::field;
//!
//! let ping = field("object.message.text").eq("ping");
//! let has_payload = field("object.message.payload").exists();
//! ```
//!
//! Array-shaped user updates carry no raw JSON document and are always
//! rejected by field filters.

use async_trait::async_trait;
use serde_json::Value;

use crate::context::Context;
use crate::event::Event;

use super::filter::{Filter, Verdict};

#[derive(Debug, Clone)]
enum Comparator {
    Eq(Value),
    Ne(Value),
    Contains(String),
    StartsWith(String),
    OneOf(Vec<Value>),
    Exists,
}

/// A dotted path into an update's raw JSON, awaiting a comparator.
#[derive(Debug, Clone)]
pub struct FieldRef {
    path: String,
}

/// Starts a field expression rooted at the update's raw JSON.
///
/// Path segments are separated by `.`; a numeric segment indexes into an
/// array.
pub fn field(path: impl Into<String>) -> FieldRef {
    FieldRef { path: path.into() }
}

impl FieldRef {
    /// Passes when the field equals the literal.
    pub fn eq(self, value: impl Into<Value>) -> FieldFilter {
        self.compare(Comparator::Eq(value.into()))
    }

    /// Passes when the field is absent or differs from the literal.
    pub fn ne(self, value: impl Into<Value>) -> FieldFilter {
        self.compare(Comparator::Ne(value.into()))
    }

    /// Passes when a string field contains the needle, or an array field
    /// contains it as a string element.
    pub fn contains(self, needle: impl Into<String>) -> FieldFilter {
        self.compare(Comparator::Contains(needle.into()))
    }

    /// Passes when a string field starts with the prefix.
    pub fn starts_with(self, prefix: impl Into<String>) -> FieldFilter {
        self.compare(Comparator::StartsWith(prefix.into()))
    }

    /// Passes when the field equals any of the literals.
    pub fn one_of(self, values: impl IntoIterator<Item = impl Into<Value>>) -> FieldFilter {
        self.compare(Comparator::OneOf(values.into_iter().map(Into::into).collect()))
    }

    /// Passes when the field is present, whatever its value.
    pub fn exists(self) -> FieldFilter {
        self.compare(Comparator::Exists)
    }

    fn compare(self, comparator: Comparator) -> FieldFilter {
        FieldFilter { path: self.path, comparator }
    }
}

/// A complete field expression, usable as a [`Filter`].
#[derive(Debug, Clone)]
pub struct FieldFilter {
    path: String,
    comparator: Comparator,
}

fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

impl FieldFilter {
    fn evaluate(&self, root: &Value) -> bool {
        let resolved = resolve(root, &self.path);
        match &self.comparator {
            Comparator::Eq(literal) => resolved == Some(literal),
            Comparator::Ne(literal) => resolved != Some(literal),
            Comparator::Contains(needle) => match resolved {
                Some(Value::String(text)) => text.contains(needle.as_str()),
                Some(Value::Array(items)) => {
                    items.iter().any(|item| item.as_str() == Some(needle.as_str()))
                }
                _ => false,
            },
            Comparator::StartsWith(prefix) => resolved
                .and_then(Value::as_str)
                .is_some_and(|text| text.starts_with(prefix.as_str())),
            Comparator::OneOf(literals) => {
                resolved.is_some_and(|value| literals.iter().any(|literal| literal == value))
            }
            Comparator::Exists => resolved.is_some(),
        }
    }
}

#[async_trait]
impl Filter for FieldFilter {
    async fn check(&self, event: &Event, _context: &Context) -> Verdict {
        match event.raw_json() {
            Some(root) => self.evaluate(root).into(),
            None => Verdict::Reject,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::event::{decode_group_update, decode_user_update};

    fn ping_event() -> Event {
        let raw = json!({
            "type": "message_new",
            "group_id": 1,
            "object": {"message": {"peer_id": 5, "text": "ping", "id": 1}},
        });
        Event::Group(decode_group_update(&raw, 1).unwrap())
    }

    #[tokio::test]
    async fn comparators_follow_dotted_paths() {
        let event = ping_event();
        let context = Context::new();

        assert!(field("object.message.text").eq("ping").check(&event, &context).await.is_accept());
        assert!(!field("object.message.text").eq("pong").check(&event, &context).await.is_accept());
        assert!(field("object.message.text").starts_with("pi").check(&event, &context).await.is_accept());
        assert!(field("object.message.payload").ne("x").check(&event, &context).await.is_accept());
        assert!(field("object.message.id").one_of([1, 2]).check(&event, &context).await.is_accept());
        assert!(field("object.message").exists().check(&event, &context).await.is_accept());
        assert!(!field("object.client_info").exists().check(&event, &context).await.is_accept());
    }

    #[tokio::test]
    async fn contains_handles_strings_and_arrays() {
        let event = ping_event();
        let context = Context::new();
        assert!(field("object.message.text").contains("in").check(&event, &context).await.is_accept());

        let raw = json!({
            "type": "message_new",
            "group_id": 1,
            "object": {"message": {"peer_id": 5, "tags": ["a", "b"]}},
        });
        let tagged = Event::Group(decode_group_update(&raw, 1).unwrap());
        assert!(field("object.message.tags").contains("b").check(&tagged, &context).await.is_accept());
        assert!(field("object.message.tags.1").eq("b").check(&tagged, &context).await.is_accept());
    }

    #[tokio::test]
    async fn array_shaped_updates_are_always_rejected() {
        let event = Event::User(decode_user_update(&json!([80, 3])).unwrap());
        let verdict = field("object").exists().check(&event, &Context::new()).await;
        assert_eq!(verdict, Verdict::Reject);
    }
}

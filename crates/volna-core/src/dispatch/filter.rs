//! Filter chains.
//!
//! Filters gate handler entries and, optionally, enrich the dispatch
//! context. Rejection is communicated by value, never by error: a chain
//! stops at the first [`Verdict::Reject`] and the gated handler is skipped.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::context::{Context, Flags};
use crate::event::Event;

/// What a filter decided about one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Let the event through unchanged.
    Accept,
    /// Stop the chain; the gated handler is skipped.
    Reject,
    /// Let the event through and merge the patch into the context seen by
    /// every later filter in the chain and by the handler itself.
    AcceptWith(Map<String, Value>),
}

impl Verdict {
    /// Whether the chain continues past this verdict.
    pub fn is_accept(&self) -> bool {
        !matches!(self, Self::Reject)
    }
}

impl From<bool> for Verdict {
    fn from(accepted: bool) -> Self {
        if accepted { Self::Accept } else { Self::Reject }
    }
}

impl From<Map<String, Value>> for Verdict {
    fn from(patch: Map<String, Value>) -> Self {
        Self::AcceptWith(patch)
    }
}

/// A gate over `(event, context)` pairs.
///
/// `update_handler_flags` runs once at registration time and lets a filter
/// contribute to the gated handler's metadata flags, independently of its
/// runtime verdicts.
#[async_trait]
pub trait Filter: Send + Sync {
    /// Decide whether the event passes this filter.
    async fn check(&self, event: &Event, context: &Context) -> Verdict;

    /// Contribute registration-time metadata to the gated handler.
    fn update_handler_flags(&self, _flags: &mut Flags) {}
}

/// A shared, type-erased filter.
pub type BoxedFilter = Arc<dyn Filter>;

/// A filter built from a plain predicate closure.
///
/// The closure runs inline on the dispatch path and must not block.
pub struct FnFilter<F> {
    predicate: F,
}

#[async_trait]
impl<F, V> Filter for FnFilter<F>
where
    F: Fn(&Event, &Context) -> V + Send + Sync,
    V: Into<Verdict> + Send,
{
    async fn check(&self, event: &Event, context: &Context) -> Verdict {
        (self.predicate)(event, context).into()
    }
}

/// Wraps a predicate closure as a [`Filter`].
///
/// The closure may return `bool` (pure gate), a JSON map (gate plus
/// context patch), or a [`Verdict`] directly.
pub fn filter_fn<F, V>(predicate: F) -> FnFilter<F>
where
    F: Fn(&Event, &Context) -> V + Send + Sync,
    V: Into<Verdict> + Send,
{
    FnFilter { predicate }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::event::decode_user_update;

    fn counter_event() -> Event {
        Event::User(decode_user_update(&json!([80, 3])).unwrap())
    }

    #[tokio::test]
    async fn bool_predicates_become_gates() {
        let pass = filter_fn(|_: &Event, _: &Context| true);
        let block = filter_fn(|_: &Event, _: &Context| false);
        let event = counter_event();
        let context = Context::new();

        assert_eq!(pass.check(&event, &context).await, Verdict::Accept);
        assert_eq!(block.check(&event, &context).await, Verdict::Reject);
    }

    #[tokio::test]
    async fn map_predicates_carry_a_context_patch() {
        let enrich = filter_fn(|_: &Event, _: &Context| {
            let mut patch = Map::new();
            patch.insert("x".to_owned(), json!(1));
            patch
        });
        let verdict = enrich.check(&counter_event(), &Context::new()).await;
        let Verdict::AcceptWith(patch) = verdict else { panic!() };
        assert_eq!(patch["x"], json!(1));
    }
}

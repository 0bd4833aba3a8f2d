//! Observers: ordered handler lists behind filter chains.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, trace};

use crate::context::{Context, Flags};
use crate::event::Event;

use super::Outcome;
use super::filter::{BoxedFilter, Filter, Verdict};
use super::handler::{
    BoxedHandler, BoxedLifecycleHandler, Handler, LifecycleHandler, into_handler,
    into_lifecycle_handler,
};

// =============================================================================
// HandlerEntry
// =============================================================================

/// One registered handler with its filter chain and metadata flags.
///
/// Built fluently and handed to [`Observer::register`]:
///
/// ```rust,ignore
/// router.message().register(
///     HandlerEntry::new(on_ping)
///         .filter(field("object.message.text").eq("ping"))
///         .flag("needs_text", true),
/// );
/// ```
pub struct HandlerEntry {
    callback: BoxedHandler,
    filters: Vec<BoxedFilter>,
    flags: Flags,
}

impl HandlerEntry {
    /// Wraps an async handler function.
    pub fn new<F, T>(handler: F) -> Self
    where
        F: Handler<T> + Send + Sync + 'static,
        T: 'static,
    {
        Self::boxed(into_handler(handler))
    }

    /// Wraps an already erased handler, e.g. one built by
    /// [`blocking`](super::handler::blocking).
    pub fn boxed(callback: BoxedHandler) -> Self {
        Self { callback, filters: Vec::new(), flags: Flags::new() }
    }

    /// Appends a filter to this entry's chain. Order is significant.
    pub fn filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Appends a shared filter to this entry's chain.
    pub fn filter_boxed(mut self, filter: BoxedFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Sets a metadata flag on this entry.
    pub fn flag(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.flags.insert(key.into(), value.into());
        self
    }

    /// The entry's metadata flags.
    pub fn flags(&self) -> &Flags {
        &self.flags
    }
}

/// Runs a filter chain over a scoped context, merging patches in place.
///
/// Returns `false` at the first rejecting filter.
async fn run_chain(filters: &[BoxedFilter], event: &Event, scoped: &mut Context) -> bool {
    for filter in filters {
        let verdict = filter.check(event, scoped).await;
        match verdict {
            Verdict::Reject => return false,
            Verdict::Accept => {}
            Verdict::AcceptWith(patch) => scoped.merge(patch),
        }
    }
    true
}

// =============================================================================
// Observer
// =============================================================================

/// An ordered list of handler entries for one update category, gated as a
/// whole by root filters.
///
/// Registration appends; entries are never removed at runtime. First
/// registered, first matched.
pub struct Observer {
    category: &'static str,
    root_filters: RwLock<Vec<BoxedFilter>>,
    handlers: RwLock<Vec<Arc<HandlerEntry>>>,
}

impl Observer {
    pub(crate) fn new(category: &'static str) -> Self {
        Self {
            category,
            root_filters: RwLock::new(Vec::new()),
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// The update category this observer serves.
    pub fn category(&self) -> &'static str {
        self.category
    }

    /// Registers a handler entry.
    ///
    /// Each filter in the entry's chain gets its registration-time chance
    /// to contribute to the entry's metadata flags.
    pub fn register(&self, mut entry: HandlerEntry) {
        for filter in &entry.filters {
            filter.update_handler_flags(&mut entry.flags);
        }
        self.handlers.write().push(Arc::new(entry));
    }

    /// Registers a bare handler with no filters, shorthand for
    /// `register(HandlerEntry::new(handler))`.
    pub fn handle<F, T>(&self, handler: F)
    where
        F: Handler<T> + Send + Sync + 'static,
        T: 'static,
    {
        self.register(HandlerEntry::new(handler));
    }

    /// Appends a root filter gating every entry of this observer.
    pub fn root_filter(&self, filter: impl Filter + 'static) {
        self.root_filters.write().push(Arc::new(filter));
    }

    /// Whether any handler entry is registered.
    pub fn has_handlers(&self) -> bool {
        !self.handlers.read().is_empty()
    }

    /// Number of registered handler entries.
    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Evaluates the root filters, short-circuiting on the first rejection.
    ///
    /// `None` means the observer's own handlers are unreachable for this
    /// event. `Some` carries the context with any filter patches merged in.
    pub async fn check_root(&self, event: &Event, context: &Context) -> Option<Context> {
        let filters: Vec<BoxedFilter> = self.root_filters.read().clone();
        let mut scoped = context.clone();
        if run_chain(&filters, event, &mut scoped).await {
            Some(scoped)
        } else {
            trace!(category = self.category, "root filters rejected event");
            None
        }
    }

    /// Runs the first handler entry whose full filter chain accepts.
    ///
    /// A callback error is caught and logged, and the walk over this
    /// observer stops: the event is reported unhandled so sibling routers
    /// still get their chance.
    pub async fn trigger(&self, event: &Arc<Event>, context: &Context) -> Outcome {
        let entries: Vec<Arc<HandlerEntry>> = self.handlers.read().clone();
        for entry in &entries {
            let mut scoped = context.clone();
            if !run_chain(&entry.filters, event, &mut scoped).await {
                continue;
            }
            debug!(category = self.category, "handler matched");
            return match (entry.callback)(Arc::clone(event), scoped).await {
                Ok(()) => Outcome::Handled,
                Err(err) => {
                    error!(category = self.category, "handler error: {err:#}");
                    Outcome::Unhandled
                }
            };
        }
        Outcome::Unhandled
    }
}

// =============================================================================
// LifecycleObserver
// =============================================================================

/// Startup/shutdown hooks of one router node.
///
/// Lifecycle handlers carry no filters; every registered handler runs on
/// each emit, in registration order, and errors are logged without
/// interrupting the rest.
pub struct LifecycleObserver {
    stage: &'static str,
    handlers: RwLock<Vec<BoxedLifecycleHandler>>,
}

impl LifecycleObserver {
    pub(crate) fn new(stage: &'static str) -> Self {
        Self { stage, handlers: RwLock::new(Vec::new()) }
    }

    /// Registers a lifecycle handler.
    pub fn register<F, T>(&self, handler: F)
    where
        F: LifecycleHandler<T> + Send + Sync + 'static,
        T: 'static,
    {
        self.handlers.write().push(into_lifecycle_handler(handler));
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Runs every registered handler in order.
    pub async fn trigger(&self, context: &Context) {
        let handlers: Vec<BoxedLifecycleHandler> = self.handlers.read().clone();
        for handler in &handlers {
            if let Err(err) = handler(context.clone()).await {
                error!(stage = self.stage, "lifecycle handler error: {err:#}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::{Map, json};

    use super::*;
    use crate::dispatch::filter_fn;
    use crate::event::decode_group_update;

    fn message_event(text: &str) -> Arc<Event> {
        let raw = json!({
            "type": "message_new",
            "group_id": 1,
            "object": {"message": {"peer_id": 5, "text": text}},
        });
        Arc::new(Event::Group(decode_group_update(&raw, 1).unwrap()))
    }

    fn counting_handler(hits: Arc<AtomicUsize>) -> impl Handler<(Arc<Event>, ())> {
        move |_event: Arc<Event>| {
            let hits = Arc::clone(&hits);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[tokio::test]
    async fn first_matching_entry_wins() {
        let observer = Observer::new("message_new");
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        observer.register(
            HandlerEntry::new(counting_handler(Arc::clone(&first)))
                .filter(filter_fn(|_: &Event, _: &Context| false)),
        );
        observer.register(HandlerEntry::new(counting_handler(Arc::clone(&second))));

        let outcome = observer.trigger(&message_event("hi"), &Context::new()).await;
        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn filter_patches_reach_later_filters_and_the_handler() {
        let observer = Observer::new("message_new");
        let seen = Arc::new(AtomicUsize::new(0));

        let enrich = filter_fn(|_: &Event, _: &Context| {
            let mut patch = Map::new();
            patch.insert("x".to_owned(), json!(1));
            patch
        });
        let requires_x =
            filter_fn(|_: &Event, context: &Context| context.get_i64("x") == Some(1));

        let handler = {
            let seen = Arc::clone(&seen);
            move |_event: Arc<Event>, context: Context| {
                let seen = Arc::clone(&seen);
                async move {
                    if context.get_i64("x") == Some(1) {
                        seen.fetch_add(1, Ordering::SeqCst);
                    }
                }
            }
        };

        observer.register(HandlerEntry::new(handler).filter(enrich).filter(requires_x));
        let outcome = observer.trigger(&message_event("hi"), &Context::new()).await;
        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handler_error_is_absorbed_as_unhandled() {
        let observer = Observer::new("message_new");
        observer.handle(|_event: Arc<Event>| async {
            Err::<(), anyhow::Error>(anyhow::anyhow!("boom"))
        });

        let outcome = observer.trigger(&message_event("hi"), &Context::new()).await;
        assert_eq!(outcome, Outcome::Unhandled);
    }

    #[tokio::test]
    async fn root_filters_gate_and_enrich() {
        let observer = Observer::new("message_new");
        observer.root_filter(filter_fn(|_: &Event, _: &Context| {
            let mut patch = Map::new();
            patch.insert("scope".to_owned(), json!("root"));
            patch
        }));

        let enriched =
            observer.check_root(&message_event("hi"), &Context::new()).await.unwrap();
        assert_eq!(enriched.get_str("scope"), Some("root"));

        observer.root_filter(filter_fn(|_: &Event, _: &Context| false));
        assert!(observer.check_root(&message_event("hi"), &Context::new()).await.is_none());
    }

    #[tokio::test]
    async fn filters_contribute_flags_at_registration() {
        struct NeedsText;

        #[async_trait::async_trait]
        impl Filter for NeedsText {
            async fn check(&self, _event: &Event, _context: &Context) -> Verdict {
                Verdict::Accept
            }

            fn update_handler_flags(&self, flags: &mut Flags) {
                flags.insert("needs_text".to_owned(), json!(true));
            }
        }

        let observer = Observer::new("message_new");
        let hits = Arc::new(AtomicUsize::new(0));
        observer.register(HandlerEntry::new(counting_handler(Arc::clone(&hits))).filter(NeedsText));

        let entries = observer.handlers.read();
        assert_eq!(entries[0].flags().get("needs_text"), Some(&json!(true)));
    }
}

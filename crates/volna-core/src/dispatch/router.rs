//! The router tree.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use futures::future::BoxFuture;
use parking_lot::RwLock;
use tracing::trace;

use crate::context::Context;
use crate::error::StructuralError;
use crate::event::Event;

use super::Outcome;
use super::observer::{LifecycleObserver, Observer};

/// Category served by the message observer.
pub const MESSAGE_CATEGORY: &str = "message_new";

/// Category served by the callback-query observer.
pub const CALLBACK_QUERY_CATEGORY: &str = "message_event";

static ROUTER_SEQ: AtomicUsize = AtomicUsize::new(0);

/// One node of the dispatch tree.
///
/// A router owns one observer per supported update category plus a pair of
/// lifecycle observers, and any number of child routers. The tree is built
/// once during setup via [`Router::include_router`]; a node has at most one
/// parent, set exactly once, and the parent/child relation never cycles.
///
/// Routers are handled through `Arc`:
///
/// ```rust,ignore
/// let root = Router::named("root");
/// let admin = Router::named("admin");
/// root.include_router(&admin)?;
/// ```
pub struct Router {
    name: String,
    parent: RwLock<Weak<Router>>,
    children: RwLock<Vec<Arc<Router>>>,
    message: Observer,
    callback_query: Observer,
    startup: LifecycleObserver,
    shutdown: LifecycleObserver,
}

impl Router {
    /// Creates a router with a generated name.
    pub fn new() -> Arc<Self> {
        let seq = ROUTER_SEQ.fetch_add(1, Ordering::Relaxed);
        Self::named(format!("router-{seq}"))
    }

    /// Creates a router with an explicit name, used in logs and
    /// structural error messages.
    pub fn named(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            parent: RwLock::new(Weak::new()),
            children: RwLock::new(Vec::new()),
            message: Observer::new(MESSAGE_CATEGORY),
            callback_query: Observer::new(CALLBACK_QUERY_CATEGORY),
            startup: LifecycleObserver::new("startup"),
            shutdown: LifecycleObserver::new("shutdown"),
        })
    }

    /// This router's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Observer for incoming messages.
    pub fn message(&self) -> &Observer {
        &self.message
    }

    /// Observer for interactive callback queries.
    pub fn callback_query(&self) -> &Observer {
        &self.callback_query
    }

    /// Startup lifecycle observer.
    pub fn startup(&self) -> &LifecycleObserver {
        &self.startup
    }

    /// Shutdown lifecycle observer.
    pub fn shutdown(&self) -> &LifecycleObserver {
        &self.shutdown
    }

    /// Resolves the observer serving a category, when this node has one.
    pub fn observer(&self, category: &str) -> Option<&Observer> {
        match category {
            MESSAGE_CATEGORY => Some(&self.message),
            CALLBACK_QUERY_CATEGORY => Some(&self.callback_query),
            _ => None,
        }
    }

    fn observers(&self) -> [&Observer; 2] {
        [&self.message, &self.callback_query]
    }

    /// Attached child routers, in attach order.
    pub fn children(&self) -> Vec<Arc<Router>> {
        self.children.read().clone()
    }

    // =========================================================================
    // Tree construction
    // =========================================================================

    /// Attaches `child` under this router.
    ///
    /// Rejected, leaving both trees unchanged, when the child already has
    /// a parent, when the child is this router itself, or when the child
    /// is an ancestor of this router.
    pub fn include_router(self: &Arc<Self>, child: &Arc<Router>) -> Result<(), StructuralError> {
        if let Some(current) = child.parent.read().upgrade() {
            return Err(StructuralError::AlreadyAttached {
                child: child.name.clone(),
                parent: current.name.clone(),
            });
        }
        if Arc::ptr_eq(self, child) {
            return Err(StructuralError::SelfReference(child.name.clone()));
        }
        let mut ancestor = self.parent.read().upgrade();
        while let Some(node) = ancestor {
            if Arc::ptr_eq(&node, child) {
                return Err(StructuralError::Cycle {
                    child: child.name.clone(),
                    parent: self.name.clone(),
                });
            }
            ancestor = node.parent.read().upgrade();
        }

        *child.parent.write() = Arc::downgrade(self);
        self.children.write().push(Arc::clone(child));
        trace!(parent = %self.name, child = %child.name, "router attached");
        Ok(())
    }

    /// Attaches several routers in order.
    ///
    /// An empty list is a structural error. Attaches are applied one by
    /// one; a failing attach leaves the earlier ones in place.
    pub fn include_routers(
        self: &Arc<Self>,
        children: &[Arc<Router>],
    ) -> Result<(), StructuralError> {
        if children.is_empty() {
            return Err(StructuralError::EmptyInclude);
        }
        for child in children {
            self.include_router(child)?;
        }
        Ok(())
    }

    // =========================================================================
    // Propagation
    // =========================================================================

    /// Walks the subtree rooted here with one event.
    ///
    /// The node's own observer runs first: root filters gate its handlers
    /// (a rejection scopes only this node, children still see the event),
    /// then the first handler entry whose chain accepts runs. `Handled`
    /// stops the walk immediately; otherwise children are visited in
    /// attach order, stopping at the first child that reports anything
    /// other than `Unhandled`.
    pub fn propagate_event<'a>(
        self: &'a Arc<Self>,
        category: &'a str,
        event: &'a Arc<Event>,
        context: Context,
    ) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            let mut node_outcome = Outcome::Unhandled;
            let mut enriched: Option<Context> = None;

            if let Some(observer) = self.observer(category) {
                match observer.check_root(event, &context).await {
                    None => node_outcome = Outcome::Rejected,
                    Some(scoped) => {
                        node_outcome = observer.trigger(event, &scoped).await;
                        enriched = Some(scoped);
                    }
                }
            }
            if node_outcome == Outcome::Handled {
                trace!(router = %self.name, category, "event handled");
                return Outcome::Handled;
            }

            // A root-filter rejection hides this node's handlers only; the
            // children still get the original context.
            let child_context = match node_outcome {
                Outcome::Rejected => context,
                _ => enriched.unwrap_or(context),
            };

            let children = self.children();
            for child in &children {
                let outcome =
                    child.propagate_event(category, event, child_context.clone()).await;
                if outcome != Outcome::Unhandled {
                    return outcome;
                }
            }

            match node_outcome {
                Outcome::Rejected => Outcome::Unhandled,
                other => other,
            }
        })
    }

    /// Triggers every startup handler in the subtree, parent before
    /// children, regardless of individual handler results.
    pub fn emit_startup<'a>(self: &'a Arc<Self>, context: Context) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            self.startup.trigger(&context).await;
            let children = self.children();
            for child in &children {
                child.emit_startup(context.clone()).await;
            }
        })
    }

    /// Triggers every shutdown handler in the subtree, parent before
    /// children, regardless of individual handler results.
    pub fn emit_shutdown<'a>(self: &'a Arc<Self>, context: Context) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            self.shutdown.trigger(&context).await;
            let children = self.children();
            for child in &children {
                child.emit_shutdown(context.clone()).await;
            }
        })
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Collects the categories that have at least one handler anywhere in
    /// the subtree, sorted and deduplicated, minus the skip set.
    ///
    /// Callers use this to subscribe only to the update kinds the tree
    /// actually consumes.
    pub fn resolve_used_categories(&self, skip: &[&str]) -> Vec<String> {
        let mut used = BTreeSet::new();
        self.collect_used_categories(&mut used);
        for category in skip {
            used.remove(*category);
        }
        used.into_iter().collect()
    }

    fn collect_used_categories(&self, used: &mut BTreeSet<String>) {
        for observer in self.observers() {
            if observer.has_handlers() {
                used.insert(observer.category().to_owned());
            }
        }
        for child in self.children.read().iter() {
            child.collect_used_categories(used);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::dispatch::{HandlerEntry, filter_fn};
    use crate::event::decode_group_update;

    fn message_event(text: &str) -> Arc<Event> {
        let raw = json!({
            "type": "message_new",
            "group_id": 1,
            "object": {"message": {"peer_id": 5, "text": text}},
        });
        Arc::new(Event::Group(decode_group_update(&raw, 1).unwrap()))
    }

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    fn counting(hits: Arc<AtomicUsize>) -> impl Fn(Arc<Event>) -> BoxFuture<'static, ()> + Clone {
        move |_event| {
            let hits = Arc::clone(&hits);
            Box::pin(async move {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        }
    }

    #[test]
    fn reparenting_is_rejected() {
        let a = Router::named("a");
        let b = Router::named("b");
        let c = Router::named("c");
        a.include_router(&c).unwrap();

        let err = b.include_router(&c).unwrap_err();
        assert!(matches!(err, StructuralError::AlreadyAttached { .. }));
        assert_eq!(a.children().len(), 1);
        assert_eq!(b.children().len(), 0);
    }

    #[test]
    fn self_attach_is_rejected() {
        let a = Router::named("a");
        let err = a.include_router(&a).unwrap_err();
        assert!(matches!(err, StructuralError::SelfReference(_)));
        assert_eq!(a.children().len(), 0);
    }

    #[test]
    fn cycles_are_rejected_and_trees_unchanged() {
        let a = Router::named("a");
        let b = Router::named("b");
        a.include_router(&b).unwrap();

        let err = b.include_router(&a).unwrap_err();
        assert!(matches!(err, StructuralError::Cycle { .. }));
        assert_eq!(b.children().len(), 0);
        assert_eq!(a.children().len(), 1);
        assert!(a.parent.read().upgrade().is_none());
    }

    #[test]
    fn empty_include_is_rejected() {
        let a = Router::named("a");
        assert!(matches!(a.include_routers(&[]), Err(StructuralError::EmptyInclude)));
    }

    #[tokio::test]
    async fn empty_subtree_is_unhandled() {
        let root = Router::named("root");
        let outcome =
            root.propagate_event(MESSAGE_CATEGORY, &message_event("hi"), Context::new()).await;
        assert_eq!(outcome, Outcome::Unhandled);
    }

    #[tokio::test]
    async fn first_handling_node_stops_the_walk() {
        let root = Router::named("root");
        let first = Router::named("first");
        let second = Router::named("second");
        root.include_routers(&[Arc::clone(&first), Arc::clone(&second)]).unwrap();

        let first_hits = counter();
        let second_hits = counter();
        first.message().handle(counting(Arc::clone(&first_hits)));
        second.message().handle(counting(Arc::clone(&second_hits)));

        let outcome =
            root.propagate_event(MESSAGE_CATEGORY, &message_event("hi"), Context::new()).await;
        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(first_hits.load(Ordering::SeqCst), 1);
        assert_eq!(second_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn root_filter_rejection_still_descends() {
        let root = Router::named("root");
        let child = Router::named("child");
        root.include_router(&child).unwrap();

        let root_hits = counter();
        let child_hits = counter();
        root.message().root_filter(filter_fn(|_: &Event, _: &Context| false));
        root.message().handle(counting(Arc::clone(&root_hits)));
        child.message().handle(counting(Arc::clone(&child_hits)));

        let outcome =
            root.propagate_event(MESSAGE_CATEGORY, &message_event("hi"), Context::new()).await;
        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(root_hits.load(Ordering::SeqCst), 0);
        assert_eq!(child_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failing_handler_lets_a_sibling_subtree_handle() {
        let root = Router::named("root");
        let broken = Router::named("broken");
        let healthy = Router::named("healthy");
        root.include_routers(&[Arc::clone(&broken), Arc::clone(&healthy)]).unwrap();

        broken.message().handle(|_event: Arc<Event>| async {
            Err::<(), anyhow::Error>(anyhow::anyhow!("boom"))
        });
        let healthy_hits = counter();
        healthy.message().handle(counting(Arc::clone(&healthy_hits)));

        let outcome =
            root.propagate_event(MESSAGE_CATEGORY, &message_event("hi"), Context::new()).await;
        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(healthy_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn root_filter_patch_reaches_children() {
        let root = Router::named("root");
        let child = Router::named("child");
        root.include_router(&child).unwrap();

        root.message().root_filter(filter_fn(|_: &Event, _: &Context| {
            let mut patch = serde_json::Map::new();
            patch.insert("x".to_owned(), json!(1));
            patch
        }));

        let seen = counter();
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
        child.message().register(HandlerEntry::new(handler));

        let outcome =
            root.propagate_event(MESSAGE_CATEGORY, &message_event("hi"), Context::new()).await;
        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn lifecycle_emits_run_the_whole_subtree() {
        let root = Router::named("root");
        let child = Router::named("child");
        root.include_router(&child).unwrap();

        let started = counter();
        root.startup().register({
            let started = Arc::clone(&started);
            move || {
                let started = Arc::clone(&started);
                async move {
                    started.fetch_add(1, Ordering::SeqCst);
                }
            }
        });
        child.startup().register({
            let started = Arc::clone(&started);
            move |_context: Context| {
                let started = Arc::clone(&started);
                async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    anyhow::Ok(())
                }
            }
        });

        root.emit_startup(Context::new()).await;
        assert_eq!(started.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn used_categories_are_sorted_and_skippable() {
        let root = Router::named("root");
        let child = Router::named("child");
        root.include_router(&child).unwrap();

        let hits = counter();
        child.message().handle(counting(Arc::clone(&hits)));
        root.callback_query().handle(counting(Arc::clone(&hits)));

        assert_eq!(
            root.resolve_used_categories(&[]),
            vec!["message_event".to_owned(), "message_new".to_owned()],
        );
        assert_eq!(
            root.resolve_used_categories(&["message_event"]),
            vec!["message_new".to_owned()],
        );
    }
}

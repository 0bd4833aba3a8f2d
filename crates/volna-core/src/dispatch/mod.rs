//! Event dispatch tree.
//!
//! Routers form a single-rooted tree; each node owns one observer per
//! supported update category plus startup/shutdown lifecycle observers.
//! An observer is an ordered list of handler entries gated by filter
//! chains, with first-match-wins semantics: the first entry whose whole
//! chain accepts runs its callback and stops the walk.
//!
//! # Example
//!
//! ```rust,ignore
//! use volna_core::dispatch::{HandlerEntry, Router, field};
//!
//! async fn pong(event: Arc<Event>) -> anyhow::Result<()> {
//!     event.as_group().unwrap().answer("pong").await?;
//!     Ok(())
//! }
//!
//! let root = Router::named("root");
//! root.message().register(
//!     HandlerEntry::new(pong).filter(field("object.message.text").eq("ping")),
//! );
//! ```

mod field;
mod filter;
mod handler;
mod observer;
mod router;

pub use field::{FieldFilter, FieldRef, field};
pub use filter::{BoxedFilter, Filter, FnFilter, Verdict, filter_fn};
pub use handler::{
    BoxedHandler, BoxedLifecycleHandler, Handler, HandlerResult, IntoHandlerResult,
    LifecycleHandler, blocking, into_handler, into_lifecycle_handler,
};
pub use observer::{HandlerEntry, LifecycleObserver, Observer};
pub use router::Router;

/// Result of propagating one event through a router subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A handler entry matched and its callback succeeded.
    Handled,
    /// A root filter vetoed the node's own handlers.
    ///
    /// Transient: [`Router::propagate_event`] converts it to `Unhandled`
    /// before returning, after the node's children had their chance.
    Rejected,
    /// No handler matched.
    Unhandled,
}

impl Outcome {
    /// Whether a handler ran to completion.
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled)
    }
}

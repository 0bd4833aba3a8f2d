//! Handler calling conventions.
//!
//! The calling convention is fixed at registration time. Async callables
//! over `(Arc<Event>, Context)` register directly (a context-ignoring
//! arity is also accepted); synchronous callables go through the explicit
//! [`blocking`] adapter, which runs them on the runtime's blocking pool so
//! they cannot stall the dispatch loop.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::context::Context;
use crate::event::Event;

/// What a handler callback reports back to the dispatcher.
pub type HandlerResult = anyhow::Result<()>;

// =============================================================================
// Return-value conversion
// =============================================================================

/// Types a handler body may return.
pub trait IntoHandlerResult {
    /// Convert the return value into the dispatcher-facing result.
    fn into_result(self) -> HandlerResult;
}

impl IntoHandlerResult for () {
    fn into_result(self) -> HandlerResult {
        Ok(())
    }
}

impl IntoHandlerResult for HandlerResult {
    fn into_result(self) -> HandlerResult {
        self
    }
}

// =============================================================================
// Handler trait
// =============================================================================

/// An async callable registrable as an event handler.
///
/// Implemented for `async fn(Arc<Event>, Context)` and `async fn(Arc<Event>)`
/// returning `()` or `anyhow::Result<()>`. The marker parameter `T` keeps
/// the blanket implementations apart.
#[async_trait]
pub trait Handler<T>: Clone + Send + Sync + 'static {
    /// Call the handler for one event.
    async fn call(self, event: Arc<Event>, context: Context) -> HandlerResult;
}

#[async_trait]
impl<F, Fut, Res> Handler<(Arc<Event>, Context, Res)> for F
where
    F: FnOnce(Arc<Event>, Context) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Res> + Send + 'static,
    Res: IntoHandlerResult + 'static,
{
    async fn call(self, event: Arc<Event>, context: Context) -> HandlerResult {
        (self)(event, context).await.into_result()
    }
}

#[async_trait]
impl<F, Fut, Res> Handler<(Arc<Event>, Res)> for F
where
    F: FnOnce(Arc<Event>) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Res> + Send + 'static,
    Res: IntoHandlerResult + 'static,
{
    async fn call(self, event: Arc<Event>, _context: Context) -> HandlerResult {
        (self)(event).await.into_result()
    }
}

// =============================================================================
// Type erasure
// =============================================================================

/// A type-erased handler stored inside an observer.
///
/// Internally a closure that captures the original handler and calls a
/// cloned copy on each invocation.
pub type BoxedHandler =
    Arc<dyn Fn(Arc<Event>, Context) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Converts a handler function into a boxed handler.
pub fn into_handler<F, T>(f: F) -> BoxedHandler
where
    F: Handler<T> + Send + Sync + 'static,
    T: 'static,
{
    Arc::new(move |event, context| f.clone().call(event, context))
}

/// Adapts a synchronous callable into a handler.
///
/// The callable runs on the blocking pool via [`tokio::task::spawn_blocking`]
/// so a slow call cannot hold up event processing. Per-batch ordering is
/// preserved: the dispatcher still awaits the offloaded call before moving
/// to the next event.
pub fn blocking<F, Res>(f: F) -> BoxedHandler
where
    F: Fn(Arc<Event>, Context) -> Res + Send + Sync + 'static,
    Res: IntoHandlerResult + Send + 'static,
{
    let f = Arc::new(f);
    Arc::new(move |event, context| {
        let f = Arc::clone(&f);
        Box::pin(async move {
            tokio::task::spawn_blocking(move || f(event, context).into_result())
                .await
                .map_err(anyhow::Error::from)?
        })
    })
}

// =============================================================================
// Lifecycle handlers
// =============================================================================

/// An async callable registrable on a startup/shutdown observer.
///
/// Lifecycle handlers see only the context; there is no event yet (or any
/// more) when they run.
#[async_trait]
pub trait LifecycleHandler<T>: Clone + Send + Sync + 'static {
    /// Call the handler for one lifecycle transition.
    async fn call(self, context: Context) -> HandlerResult;
}

#[async_trait]
impl<F, Fut, Res> LifecycleHandler<(Context, Res)> for F
where
    F: FnOnce(Context) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Res> + Send + 'static,
    Res: IntoHandlerResult + 'static,
{
    async fn call(self, context: Context) -> HandlerResult {
        (self)(context).await.into_result()
    }
}

#[async_trait]
impl<F, Fut, Res> LifecycleHandler<((), Res)> for F
where
    F: FnOnce() -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Res> + Send + 'static,
    Res: IntoHandlerResult + 'static,
{
    async fn call(self, _context: Context) -> HandlerResult {
        (self)().await.into_result()
    }
}

/// A type-erased lifecycle handler.
pub type BoxedLifecycleHandler =
    Arc<dyn Fn(Context) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Converts a lifecycle handler function into its boxed form.
pub fn into_lifecycle_handler<F, T>(f: F) -> BoxedLifecycleHandler
where
    F: LifecycleHandler<T> + Send + Sync + 'static,
    T: 'static,
{
    Arc::new(move |context| f.clone().call(context))
}

//! The polling dispatch loop.
//!
//! A [`Dispatcher`] ties a router tree to a transport and drives a bot
//! poll session until a shutdown signal arrives. Every decoded update gets
//! the transport attached and is walked through the tree in arrival order;
//! poll failures are logged and retried after a configurable delay.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use volna_runtime::Dispatcher;
//!
//! let config = volna_runtime::load_config()?;
//! let transport: BoxedTransport = Arc::new(config.api.build_transport()?);
//! let session = config.longpoll.bot_session(Arc::clone(&transport));
//!
//! Dispatcher::new(router, transport).run_polling(session).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing::{debug, error, info, span, warn};

use volna_core::{BoxedTransport, Context, Event, GroupEvent, Outcome, Router};
use volna_longpoll::BotPollSession;

use crate::error::RuntimeResult;

const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Drives events from a poll session through a router tree.
///
/// The dispatcher owns the transport handle it attaches to every event,
/// so handlers can reply via [`GroupEvent::answer`] without further
/// wiring. Events delivered by other means, e.g. replayed from a log,
/// go through [`Dispatcher::propagate`] and take the same path.
pub struct Dispatcher {
    router: Arc<Router>,
    transport: BoxedTransport,
    retry_delay: Duration,
}

impl Dispatcher {
    /// Creates a dispatcher over a router tree and a transport.
    pub fn new(router: Arc<Router>, transport: BoxedTransport) -> Self {
        Self { router, transport, retry_delay: DEFAULT_RETRY_DELAY }
    }

    /// Sets the delay between retries after a failed acquisition or poll.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// The router tree this dispatcher feeds.
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Walks one event through the tree.
    ///
    /// Attaches the transport, derives the category from the update kind
    /// and propagates from the root with a fresh context.
    pub async fn propagate(&self, mut event: GroupEvent) -> Outcome {
        event.attach_transport(Arc::clone(&self.transport));
        let category = event.kind.as_str().to_owned();

        let span = span!(tracing::Level::DEBUG, "dispatch", category = %category);
        let _enter = span.enter();

        let event = Arc::new(Event::Group(event));
        let outcome = self.router.propagate_event(&category, &event, Context::new()).await;
        debug!(outcome = ?outcome, "event propagated");
        outcome
    }

    /// Polls until Ctrl+C or SIGTERM, dispatching every batch in order.
    ///
    /// Startup handlers run before the first acquisition, shutdown
    /// handlers after the signal. Acquisition and poll failures are
    /// retried indefinitely after the configured delay; the loop never
    /// gives up on its own.
    pub async fn run_polling(&self, mut session: BotPollSession) -> RuntimeResult<()> {
        self.router.emit_startup(Context::new()).await;

        let categories = self.router.resolve_used_categories(&[]);
        info!(categories = ?categories, "dispatch tree ready");

        tokio::select! {
            _ = self.poll_loop(&mut session) => {}
            _ = shutdown_signal() => {}
        }

        self.router.emit_shutdown(Context::new()).await;
        Ok(())
    }

    async fn poll_loop(&self, session: &mut BotPollSession) {
        while let Err(err) = session.acquire_server(false).await {
            error!(error = %err, "server acquisition failed, retrying");
            tokio::time::sleep(self.retry_delay).await;
        }
        info!(group_id = session.group_id(), "long-poll loop running");

        loop {
            match session.poll_once().await {
                Ok(events) => {
                    for event in events {
                        self.propagate(event).await;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "poll cycle failed, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }
}

/// Waits for shutdown signals (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to register SIGTERM handler");

        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("received Ctrl+C, shutting down");
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("received Ctrl+C, shutting down");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use volna_core::error::TransportResult;
    use volna_core::{HandlerEntry, VkTransport, decode_group_update, field};

    use super::*;

    struct NullTransport;

    #[async_trait]
    impl VkTransport for NullTransport {
        async fn call(&self, _method: &str, _params: Value) -> TransportResult<Value> {
            Ok(json!({"response": 1}))
        }

        async fn poll(
            &self,
            _url: &str,
            _params: Value,
            _timeout: Duration,
        ) -> TransportResult<Value> {
            Ok(json!({"ts": "1", "updates": []}))
        }
    }

    fn message_update(text: &str) -> GroupEvent {
        let raw = json!({
            "type": "message_new",
            "group_id": 1,
            "object": {"message": {"peer_id": 5, "text": text}},
        });
        decode_group_update(&raw, 1).unwrap()
    }

    #[tokio::test]
    async fn propagation_attaches_the_transport() {
        let router = Router::new();
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let hits = Arc::clone(&hits);
            router.message().handle(move |event: Arc<Event>| {
                let hits = Arc::clone(&hits);
                async move {
                    if let Event::Group(group) = event.as_ref()
                        && group.has_transport()
                    {
                        hits.fetch_add(1, Ordering::SeqCst);
                    }
                }
            });
        }

        let dispatcher = Dispatcher::new(router, Arc::new(NullTransport));
        let outcome = dispatcher.propagate(message_update("ping")).await;
        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unmatched_events_come_back_unhandled() {
        let router = Router::new();
        router.message().register(
            HandlerEntry::new(|_event: Arc<Event>| async {})
                .filter(field("object.message.text").eq("ping")),
        );

        let dispatcher = Dispatcher::new(router, Arc::new(NullTransport));
        assert_eq!(dispatcher.propagate(message_update("pong")).await, Outcome::Unhandled);
        assert_eq!(dispatcher.propagate(message_update("ping")).await, Outcome::Handled);
    }
}

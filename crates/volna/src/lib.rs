//! # Volna
//!
//! Long-poll event ingestion and routed dispatch for VK communities.
//!
//! ## Overview
//!
//! Volna turns the VK long-poll wire protocol into a tree of routers with
//! filter-gated handlers. The poll session owns the server/key/cursor
//! lifecycle and its failure recovery; decoded events flow through the
//! router tree in arrival order, and the first accepting handler wins.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐    ┌──────────────────┐    ┌─────────────────────────┐
//! │ HttpTransport │───▶│ BotPollSession   │───▶│ Router tree             │
//! │ (reqwest)     │    │ acquire/poll/    │    │ root ─▶ observer ─▶     │
//! │               │◀───│ recover          │    │ children  filter chains │
//! └───────────────┘    └──────────────────┘    └─────────────────────────┘
//!        ▲                                                  │
//!        └────────────────── event.answer(...) ◀────────────┘
//! ```
//!
//! - **Transport** (`volna-transport`): authenticated API calls and raw
//!   long-poll GETs over reqwest, with per-token call pacing
//! - **Sessions** (`volna-longpoll`): bot and user poll state machines,
//!   failure-code recovery, message preloading
//! - **Dispatch** (`volna-core`): routers, observers, handler entries and
//!   short-circuiting filter chains
//! - **Runtime** (`volna-runtime`): configuration, logging and the polling
//!   dispatch loop
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use volna::prelude::*;
//!
//! async fn echo(event: Arc<Event>) -> anyhow::Result<()> {
//!     if let Event::Group(group) = event.as_ref()
//!         && let Some(text) = group.text()
//!     {
//!         group.answer(text).await?;
//!     }
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = volna::runtime::load_config()?;
//!     volna::runtime::init_from_config(&config.logging);
//!
//!     let transport: BoxedTransport = Arc::new(config.api.build_transport()?);
//!     let session = config.longpoll.bot_session(Arc::clone(&transport));
//!
//!     let router = Router::new();
//!     router.message().handle(echo);
//!
//!     Dispatcher::new(router, transport).run_polling(session).await?;
//!     Ok(())
//! }
//! ```

pub use volna_core as core;
pub use volna_longpoll as longpoll;
pub use volna_runtime as runtime;
pub use volna_transport as transport;

/// Prelude module for convenient imports.
///
/// This module provides all commonly used types for building bots:
///
/// ```rust,ignore
/// use volna::prelude::*;
/// ```
pub mod prelude {
    // Dispatch tree - routers, handler entries, filters
    pub use volna_core::{
        Context, Event, Filter, Flags, GroupEvent, HandlerEntry, MessageSource, Outcome, Router,
        UpdateKind, UserEvent, Verdict, blocking, field, filter_fn,
    };

    // Transport seam - for handlers that call the API directly
    pub use volna_core::{BoxedTransport, VkTransport};

    // Poll sessions - acquisition, polling, recovery
    pub use volna_longpoll::{BotPollSession, LongPollMode, UserPollSession};

    // Runtime - configuration and the dispatch loop
    pub use volna_runtime::{ConfigLoader, Dispatcher, VolnaConfig, load_config};

    // HTTP transport - the reqwest-backed implementation
    #[cfg(feature = "http-client")]
    pub use volna_transport::{HttpTransport, HttpTransportBuilder};

    // Logging macros
    pub use volna_runtime::prelude::*;
}

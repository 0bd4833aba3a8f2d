//! # Volna Core
//!
//! The event model and dispatch tree of the volna framework.
//!
//! This crate holds everything between a raw long-poll update and a user
//! handler: the typed event families for both wire shapes, the router tree
//! with its filter-gated observers, and the transport trait the rest of the
//! workspace implements.
//!
//! ## Layers
//!
//! - **Event model** ([`event`]): the object-shaped group family keyed by a
//!   category string ([`GroupEvent`], [`UpdateKind`]) and the array-shaped
//!   user family keyed by a numeric code ([`UserEvent`]), unified under
//!   [`Event`]. Decoders never reject unknown categories or codes.
//! - **Dispatch tree** ([`dispatch`]): [`Router`] nodes with per-category
//!   [`Observer`]s, ordered first-match-wins [`HandlerEntry`] lists, and
//!   short-circuiting [`Filter`] chains that may enrich the [`Context`].
//! - **Transport seam** ([`transport`]): the [`VkTransport`] trait consumed
//!   by sessions and by [`GroupEvent::answer`]; implemented over HTTP in
//!   `volna-transport`.
//!
//! ## Data flow
//!
//! ```text
//! ┌───────────┐      ┌─────────────┐      ┌─────────────────┐
//! │ Transport │─────▶│ PollSession │─────▶│ Router tree     │
//! │  (HTTP)   │      │  (decode)   │      │ observer→entry  │
//! └───────────┘      └─────────────┘      └─────────────────┘
//! ```

pub mod context;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod transport;

// Re-export context types
pub use context::{Context, Flags};

// Re-export dispatch types
pub use dispatch::{
    BoxedFilter, BoxedHandler, Filter, FnFilter, HandlerEntry, LifecycleObserver, Observer,
    Outcome, Router, Verdict, blocking, field, filter_fn,
};

// Re-export error types
pub use error::{
    DecodeError, DecodeResult, StructuralError, TransportError, TransportResult,
};

// Re-export event types
pub use event::{
    CHAT_START_ID, Event, GroupEvent, MessageFlags, MessageSource, UpdateKind, UserEvent,
    decode_group_update, decode_user_update,
};

// Re-export transport seam
pub use transport::{BoxedTransport, VkTransport};

/// Prelude for common imports.
pub mod prelude {
    pub use super::context::{Context, Flags};
    pub use super::dispatch::{
        Filter, HandlerEntry, Outcome, Router, Verdict, blocking, field, filter_fn,
    };
    pub use super::event::{Event, GroupEvent, MessageSource, UpdateKind, UserEvent};
    pub use super::transport::{BoxedTransport, VkTransport};
}

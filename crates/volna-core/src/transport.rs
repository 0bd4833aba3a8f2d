//! Transport interface consumed by poll sessions and reply helpers.
//!
//! The core never talks HTTP itself. Everything it needs from the outside
//! world is two calls: a named API method invocation and a raw long-poll
//! GET. volna-transport provides the reqwest-backed implementation;
//! tests provide scripted mocks.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportResult;

/// Client-side access to the platform API.
///
/// Implementations attach authentication (access token, API version) on
/// their own; callers pass only the method-specific parameters.
#[async_trait]
pub trait VkTransport: Send + Sync {
    /// Invokes a named API method with the given parameters.
    ///
    /// Returns the decoded response envelope verbatim: a successful call
    /// carries a `response` member, a failed one an `error` member. The
    /// caller decides which members it requires.
    async fn call(&self, method: &str, params: Value) -> TransportResult<Value>;

    /// Performs a raw long-poll GET against `url`.
    ///
    /// `params` is an object serialized into the query string; `timeout`
    /// bounds the whole request and must exceed the server-side `wait` so
    /// an idle poll can complete normally.
    async fn poll(&self, url: &str, params: Value, timeout: Duration) -> TransportResult<Value>;
}

/// A shared transport handle, as attached to events and sessions.
pub type BoxedTransport = Arc<dyn VkTransport>;

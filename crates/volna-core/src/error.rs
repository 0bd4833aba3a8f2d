//! Unified error types for the volna core.
//!
//! This module provides the error types shared across the event model and the
//! dispatch tree. Session-level errors (server acquisition, poll protocol)
//! are defined in volna-longpoll.

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur while talking to the platform API.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The HTTP request could not be performed.
    #[error("request failed: {0}")]
    Request(String),

    /// The request did not complete within the allowed time.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The response body was not valid JSON.
    #[error("failed to decode response body: {0}")]
    InvalidBody(String),

    /// Invalid transport configuration.
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),
}

// =============================================================================
// Decode Errors
// =============================================================================

/// Errors that can occur while decoding a single raw update.
///
/// These are per-record errors: a malformed update is reported and skipped
/// without poisoning the rest of its batch.
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    /// An array-shaped update carried no fields at all.
    #[error("update list is empty")]
    EmptyUpdate,

    /// A required field is missing or has the wrong type.
    #[error("invalid update payload: {0}")]
    InvalidPayload(String),
}

impl DecodeError {
    /// Creates an invalid-payload error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidPayload(msg.into())
    }
}

// =============================================================================
// Structural Errors
// =============================================================================

/// Errors raised when an `include_router` call would corrupt the tree.
///
/// Every variant is rejected at attach time and leaves both trees unchanged.
#[derive(Debug, Clone, Error)]
pub enum StructuralError {
    /// The child is already attached to some parent.
    #[error("router `{child}` is already attached to `{parent}`")]
    AlreadyAttached {
        /// Name of the router being attached.
        child: String,
        /// Name of its current parent.
        parent: String,
    },

    /// A router cannot be attached to itself.
    #[error("router `{0}` cannot be attached to itself")]
    SelfReference(String),

    /// Attaching would create a cycle through the ancestor chain.
    #[error("attaching `{child}` under `{parent}` would create a cycle")]
    Cycle {
        /// Name of the router being attached.
        child: String,
        /// Name of the intended parent.
        parent: String,
    },

    /// `include_routers` was called with nothing to attach.
    #[error("at least one router must be provided")]
    EmptyInclude,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for update decoding.
pub type DecodeResult<T> = Result<T, DecodeError>;

//! Session-level errors.

use thiserror::Error;
use volna_core::error::TransportError;

/// Errors surfaced by a poll session to its driving loop.
///
/// Failure codes 1–3 never appear here; the session repairs those itself
/// and returns an empty batch instead.
#[derive(Debug, Clone, Error)]
pub enum PollError {
    /// `poll_once` was called before any successful server acquisition.
    #[error("long-poll server has not been acquired yet")]
    NotInitialized,

    /// The acquisition call returned no usable response body.
    #[error("server acquisition failed: {0}")]
    ServerAcquisition(String),

    /// The poll response is missing expected fields.
    #[error("malformed long-poll response: {0}")]
    Protocol(String),

    /// The server signaled a failure code outside the recoverable set.
    #[error("unrecognized long-poll failure code {0}")]
    UnknownFailureCode(i64),

    /// The underlying transport call failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl PollError {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}

/// Convenience alias for session operations.
pub type PollResult<T> = Result<T, PollError>;

//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors produced while setting up or driving the runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Configuration loading or validation failed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The API transport could not be constructed or reached.
    #[error("transport error: {0}")]
    Transport(#[from] volna_core::error::TransportError),

    /// A poll session failed beyond what the loop retries.
    #[error("poll session error: {0}")]
    Poll(#[from] volna_longpoll::PollError),
}

/// Result alias for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

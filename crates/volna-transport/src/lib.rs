//! # Volna Transport
//!
//! Network transport implementations for the Volna framework.
//!
//! The [`VkTransport`](volna_core::transport::VkTransport) contract is
//! defined in `volna-core`; this crate provides the concrete clients.
//!
//! ## Features
//!
//! - `http-client` (default): reqwest-backed [`HttpTransport`]

#[cfg(feature = "http-client")]
pub mod http;

#[cfg(feature = "http-client")]
pub use http::{DEFAULT_API_VERSION, HttpTransport, HttpTransportBuilder};

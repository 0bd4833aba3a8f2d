//! # Volna Runtime
//!
//! The orchestration layer of the volna framework.
//!
//! This crate provides:
//! - Layered configuration loading (`VolnaConfig`, `ConfigLoader`)
//! - Logging setup over `tracing-subscriber` (`LoggingBuilder`)
//! - The polling dispatch loop (`Dispatcher`)
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use volna_core::{BoxedTransport, Router};
//! use volna_runtime::{Dispatcher, load_config, logging};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     logging::init_from_config(&config.logging);
//!
//!     let transport: BoxedTransport = Arc::new(config.api.build_transport()?);
//!     let session = config.longpoll.bot_session(Arc::clone(&transport));
//!
//!     let router = Router::new();
//!     // register handlers on router.message() ...
//!
//!     Dispatcher::new(router, transport).run_polling(session).await?;
//!     Ok(())
//! }
//! ```
//!
//! Configuration is read from `volna.toml` (or `config.toml`) in the
//! current directory and the user configuration directory, then overlaid
//! with `VOLNA_`-prefixed environment variables. See [`config`] for the
//! full precedence rules.

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

// Re-exports
pub use config::{
    ApiConfig, ConfigError, ConfigLoader, ConfigResult, LoggingConfig, LongPollConfig,
    VolnaConfig, load_config,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, init_from_config};
pub use runtime::Dispatcher;

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}

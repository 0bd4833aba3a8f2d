//! Configuration for the Volna runtime.
//!
//! TOML files plus `VOLNA_`-prefixed environment variables, merged through
//! figment. There is no global configuration value: the loaded
//! [`VolnaConfig`] is handed to whatever builds transports and sessions.

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, load_config};
pub use schema::{
    ApiConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, LongPollConfig, VolnaConfig,
};

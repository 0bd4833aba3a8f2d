//! Configuration loader using figment.
//!
//! Sources, lowest to highest precedence:
//!
//! 1. Built-in defaults
//! 2. `volna.toml` / `config.toml` from the search paths, or a specific
//!    file given with [`ConfigLoader::file`]
//! 3. `VOLNA_`-prefixed environment variables, with `__` separating
//!    nesting levels (`VOLNA_LOGGING__LEVEL=debug` → `logging.level`)
//!
//! # Example
//!
//! ```rust,ignore
//! use volna_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new().with_current_dir().load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::VolnaConfig;

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    /// Programmatic overrides merged above the defaults.
    figment: Figment,
    /// Search paths for configuration files.
    search_paths: Vec<PathBuf>,
    /// Whether to load environment variables.
    load_env: bool,
    /// Specific config file to load (overrides search).
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader with defaults.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds the current directory to the search paths.
    pub fn with_current_dir(self) -> Self {
        if let Ok(cwd) = std::env::current_dir() {
            self.search_path(cwd)
        } else {
            self
        }
    }

    /// Adds the user configuration directory to the search paths.
    pub fn with_user_config_dir(self) -> Self {
        if let Some(config_dir) = dirs::config_dir() {
            self.search_path(config_dir.join("volna"))
        } else {
            self
        }
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges additional configuration programmatically.
    ///
    /// ```rust,ignore
    /// let config = ConfigLoader::new()
    ///     .merge(VolnaConfig {
    ///         longpoll: LongPollConfig { group_id: 218, ..Default::default() },
    ///         ..Default::default()
    ///     })
    ///     .load()?;
    /// ```
    pub fn merge(mut self, config: VolnaConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<VolnaConfig> {
        let figment = self.build_figment()?;
        let config: VolnaConfig =
            figment.extract().map_err(|e| ConfigError::Extract(e.to_string()))?;
        debug!(logging_level = %config.logging.level, "configuration loaded");
        Ok(config)
    }

    /// Builds the figment instance with all sources.
    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(VolnaConfig::default()));

        let user_figment = std::mem::take(&mut self.figment);
        figment = figment.merge(user_figment);

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            info!(path = %path.display(), "loading configuration file");
            figment = figment.merge(Toml::file(path));
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!("loading environment variables with VOLNA_ prefix");
            figment = figment.merge(Env::prefixed("VOLNA_").split("__"));
        }

        Ok(figment)
    }

    /// Resolves the effective list of search paths.
    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if self.search_paths.is_empty() {
            let mut paths = Vec::new();
            if let Ok(cwd) = std::env::current_dir() {
                paths.push(cwd);
            }
            if let Some(config_dir) = dirs::config_dir() {
                paths.push(config_dir.join("volna"));
            }
            paths
        } else {
            self.search_paths.clone()
        }
    }

    /// Searches for and loads the first configuration file found.
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        for search_path in self.resolve_search_paths() {
            for name in ["volna.toml", "config.toml"] {
                let path = search_path.join(name);
                if path.exists() {
                    info!(path = %path.display(), "loading configuration file");
                    figment = figment.merge(Toml::file(&path));
                    return figment;
                }
            }
        }
        warn!("no configuration file found, using defaults");
        figment
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<VolnaConfig> {
    ConfigLoader::new().load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::super::schema::{LogLevel, LongPollConfig};
    use super::*;

    #[test]
    fn defaults_load_without_any_sources() {
        let config = ConfigLoader::new().without_env().load().unwrap();

        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.api.version, "5.199");
        assert!(config.api.group_token);
        assert_eq!(config.longpoll.wait_secs, 25);
        assert_eq!(config.longpoll.poll_retry_delay_secs, 3);
        assert!(!config.longpoll.preload_messages);
    }

    #[test]
    fn programmatic_merge_overrides_defaults() {
        let config = ConfigLoader::new()
            .without_env()
            .merge(VolnaConfig {
                longpoll: LongPollConfig { group_id: 218, ..Default::default() },
                ..Default::default()
            })
            .load()
            .unwrap();

        assert_eq!(config.longpoll.group_id, 218);
        assert_eq!(config.longpoll.wait_secs, 25);
    }

    #[test]
    fn environment_overrides_defaults() {
        // SAFETY: no other test in this module touches these variables
        unsafe {
            std::env::set_var("VOLNA_LOGGING__LEVEL", "debug");
            std::env::set_var("VOLNA_LONGPOLL__GROUP_ID", "99");
        }
        let config = ConfigLoader::new().load().unwrap();
        unsafe {
            std::env::remove_var("VOLNA_LOGGING__LEVEL");
            std::env::remove_var("VOLNA_LONGPOLL__GROUP_ID");
        }

        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.longpoll.group_id, 99);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = ConfigLoader::new()
            .file("/nonexistent/volna.toml")
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}

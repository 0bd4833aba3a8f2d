//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use volna_core::error::{TransportError, TransportResult};
use volna_core::transport::BoxedTransport;
use volna_longpoll::{BotPollSession, DEFAULT_WAIT_SECS, LongPollMode, UserPollSession};
use volna_transport::HttpTransport;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VolnaConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// API client settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Long-poll session settings.
    #[serde(default)]
    pub longpoll: LongPollConfig,
}

// =============================================================================
// API client
// =============================================================================

/// API client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Access token sent with every method call.
    #[serde(default)]
    pub token: String,

    /// API version sent as `v`.
    #[serde(default = "default_api_version")]
    pub version: String,

    /// Optional proxy URL for all requests.
    #[serde(default)]
    pub proxy: Option<String>,

    /// Whether the token belongs to a community. Drives call pacing.
    #[serde(default = "default_group_token")]
    pub group_token: bool,
}

impl ApiConfig {
    /// Builds an [`HttpTransport`] from these settings.
    pub fn build_transport(&self) -> TransportResult<HttpTransport> {
        if self.token.is_empty() {
            return Err(TransportError::InvalidConfig("api.token is not set".into()));
        }
        let mut builder = HttpTransport::builder(&self.token).version(&self.version);
        if !self.group_token {
            builder = builder.user_token();
        }
        if let Some(proxy) = &self.proxy {
            builder = builder.proxy(proxy);
        }
        builder.build()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            version: default_api_version(),
            proxy: None,
            group_token: default_group_token(),
        }
    }
}

fn default_api_version() -> String {
    volna_transport::DEFAULT_API_VERSION.to_string()
}

fn default_group_token() -> bool {
    true
}

// =============================================================================
// Long-poll sessions
// =============================================================================

/// Long-poll session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LongPollConfig {
    /// Community to poll for.
    #[serde(default)]
    pub group_id: i64,

    /// Seconds the server holds each poll open.
    #[serde(default = "default_wait_secs")]
    pub wait_secs: u64,

    /// User long-poll `mode` bitmask; unset keeps the full default mask.
    #[serde(default)]
    pub mode: Option<u32>,

    /// Whether user sessions fetch full message bodies for each batch.
    #[serde(default)]
    pub preload_messages: bool,

    /// Delay before retrying after a failed poll cycle, in seconds.
    #[serde(default = "default_poll_retry_delay_secs")]
    pub poll_retry_delay_secs: u64,
}

impl LongPollConfig {
    /// Builds a community session over `transport`.
    pub fn bot_session(&self, transport: BoxedTransport) -> BotPollSession {
        BotPollSession::new(transport, self.group_id).wait(self.wait_secs)
    }

    /// Builds a user-account session over `transport`.
    pub fn user_session(&self, transport: BoxedTransport) -> UserPollSession {
        let mut session = UserPollSession::new(transport)
            .wait(self.wait_secs)
            .preload_messages(self.preload_messages);
        if let Some(bits) = self.mode {
            session = session.mode(LongPollMode::from_bits_truncate(bits));
        }
        if self.group_id != 0 {
            session = session.group_id(self.group_id);
        }
        session
    }
}

impl Default for LongPollConfig {
    fn default() -> Self {
        Self {
            group_id: 0,
            wait_secs: default_wait_secs(),
            mode: None,
            preload_messages: false,
            poll_retry_delay_secs: default_poll_retry_delay_secs(),
        }
    }
}

fn default_wait_secs() -> u64 {
    DEFAULT_WAIT_SECS
}

fn default_poll_retry_delay_secs() -> u64 {
    3
}

// =============================================================================
// Logging
// =============================================================================

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Base log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Line format.
    #[serde(default)]
    pub format: LogFormat,

    /// Output destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Log file path, used when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Per-module level overrides, e.g. `volna_core = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,

    /// Include thread ids in log lines.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line in log lines.
    #[serde(default)]
    pub file_location: bool,
}

/// Log verbosity threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything, including per-update traces.
    Trace,
    /// Diagnostic detail.
    Debug,
    /// Normal operation (default).
    #[default]
    Info,
    /// Recoverable problems.
    Warn,
    /// Failures.
    Error,
}

impl LogLevel {
    /// The level as a filter directive string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to the tracing level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line, abbreviated (default).
    #[default]
    Compact,
    /// Single-line with full metadata.
    Full,
    /// Multi-line, human-oriented.
    Pretty,
}

/// Log output destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    /// Standard output (default).
    #[default]
    Stdout,
    /// Standard error.
    Stderr,
    /// A log file; requires `file_path`.
    File,
}

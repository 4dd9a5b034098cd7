//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use adloop_config::ConfigError;
use adloop_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the AdLoop backend at {url}")]
    #[diagnostic(
        code(adloop::connection_failed),
        help(
            "Check that the backend is running and reachable from this display.\n\
             URL: {url}"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out")]
    #[diagnostic(
        code(adloop::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout,

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(adloop::not_found),
        help("Run: adloop {list_command} to see what is available")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(adloop::api_error))]
    ApiError { message: String },

    // ── Playback ─────────────────────────────────────────────────────
    #[error("Playback error: {message}")]
    #[diagnostic(
        code(adloop::playback),
        help("Check player_program and player_args in the config file.")
    )]
    Playback { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(adloop::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No backend URL configured")]
    #[diagnostic(
        code(adloop::no_api_url),
        help(
            "Pass --api-url, set ADLOOP_API_BASE_URL, or create a config file with: adloop config init\n\
             Expected at: {path}"
        )
    )]
    NoApiUrl { path: String },

    #[error("Configuration file already exists at {path}")]
    #[diagnostic(
        code(adloop::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(adloop::config))]
    Config(Box<ConfigError>),

    #[error("Configuration error: {message}")]
    #[diagnostic(code(adloop::invalid_config))]
    InvalidConfig { message: String },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize output: {0}")]
    #[diagnostic(code(adloop::json))]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(adloop::internal))]
    Internal(String),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout => exit_code::CONNECTION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            Self::NoApiUrl { .. } | Self::Config(_) | Self::InvalidConfig { .. } => {
                exit_code::CONFIG
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::Timeout => CliError::Timeout,

            CoreError::Api { message, .. } => CliError::ApiError { message },

            CoreError::Playback(e) => CliError::Playback {
                message: e.to_string(),
            },

            CoreError::Config { message } => CliError::InvalidConfig { message },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<adloop_api::Error> for CliError {
    fn from(err: adloop_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

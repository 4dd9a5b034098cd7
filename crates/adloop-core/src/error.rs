// ── Core error types ──
//
// User-facing errors from adloop-core. Consumers never see reqwest or
// serde errors directly; the `From<adloop_api::Error>` impl translates
// transport-layer errors into these variants.

use thiserror::Error;

use crate::player::SinkError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Backend request timed out")]
    Timeout,

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Playback errors ──────────────────────────────────────────────
    #[error("Playback error: {0}")]
    Playback(#[from] SinkError),

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<adloop_api::Error> for CoreError {
    fn from(err: adloop_api::Error) -> Self {
        match err {
            adloop_api::Error::MissingBaseUrl => CoreError::Config {
                message: "API base URL not set".into(),
            },
            adloop_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            adloop_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            adloop_api::Error::ClientBuild(msg) => CoreError::Config { message: msg },
            err @ adloop_api::Error::Status { .. } => CoreError::Api {
                status: err.status(),
                message: err.to_string(),
            },
            adloop_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

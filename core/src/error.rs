//! Error types for the request pipeline.
//!
//! # Design
//! Only HTTP-level failures and timeouts become `ClientError`. Anything the
//! transport rejects with (DNS, refused connections, TLS, caller
//! cancellation) is carried through untouched in `Error::Transport` so
//! callers can downcast to the transport's own error type.

use serde_json::Value;
use thiserror::Error;

use crate::http::TransportError;

/// Status used for requests that exceed their timeout.
pub const TIMEOUT_STATUS: u16 = 408;

/// A non-2xx response or a timed-out request.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ClientError {
    pub status: u16,
    pub status_text: String,
    /// Localized, user-facing message.
    pub message: String,
    /// Response body, JSON-parsed when the server declared JSON. `None` when
    /// empty, unparseable or timed out.
    pub body: Option<Value>,
    pub timeout: bool,
}

impl ClientError {
    pub fn timed_out(message: String) -> Self {
        Self {
            status: TIMEOUT_STATUS,
            status_text: "Request Timeout".to_string(),
            message,
            body: None,
            timeout: true,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.timeout
    }
}

/// Construction-time configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("base URL '{url}' must use http or https")]
    UnsupportedScheme { url: String },

    #[error("unknown locale '{0}'")]
    UnknownLocale(String),

    #[error("invalid timeout '{0}'")]
    InvalidTimeout(String),

    #[error("invalid client settings: {0}")]
    InvalidSettings(#[from] serde_json::Error),

    #[error("missing setting '{0}'")]
    MissingSetting(&'static str),

    #[error("failed to initialise default transport: {0}")]
    Transport(#[source] TransportError),
}

/// Everything `ApiClient` can fail with.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Transport rejection, unmodified.
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid request path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("request body serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("response deserialization failed: {0}")]
    Decode(#[source] serde_json::Error),
}

impl Error {
    pub fn as_client_error(&self) -> Option<&ClientError> {
        match self {
            Error::Client(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.as_client_error().is_some_and(ClientError::is_timeout)
    }
}

use std::fmt;

use thiserror::Error;

/// Top-level error type for the `initai-api` crate.
///
/// Every request operation settles with either its typed result or one of
/// these variants. Validation and configuration failures are raised before
/// any network I/O happens; [`Error::Api`] carries the HTTP status of a
/// non-200 response.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// The client configuration was rejected at construction time.
    ///
    /// The message always ends with a pointer to the documentation.
    #[error("{message}")]
    Configuration { message: String },

    // ── Validation ──────────────────────────────────────────────────
    /// Arguments to a request operation failed local validation.
    /// No request was sent; the detailed reason was logged.
    #[error("{message}")]
    Validation { message: String },

    // ── API ─────────────────────────────────────────────────────────
    /// The API answered with something other than HTTP 200.
    #[error("{message} (HTTP {status} {status_text})")]
    Api {
        status: u16,
        status_text: String,
        message: String,
    },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

/// Coarse classification attached to locally-raised request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    ValidationFailure,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailure => f.write_str("Validation failure"),
        }
    }
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// The error classification, if this failure was raised locally.
    pub fn error_type(&self) -> Option<ErrorType> {
        match self {
            Self::Validation { .. } => Some(ErrorType::ValidationFailure),
            _ => None,
        }
    }

    /// Returns `true` if the request never left the process.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// HTTP status code of a rejected request, if there was a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the API rejected the bearer token.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

/// A message-level validation failure with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

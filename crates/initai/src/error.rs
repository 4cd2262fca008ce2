//! CLI error types with miette diagnostics.
//!
//! Maps library errors into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use initai_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the API at {url}")]
    #[diagnostic(
        code(initai::connection_failed),
        help("Check the base URL and your network.\nURL: {url}")
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out")]
    #[diagnostic(
        code(initai::timeout),
        help("Increase the timeout with --timeout or INITAI_TIMEOUT.")
    )]
    Timeout,

    #[error("Realtime connection failed: {message}")]
    #[diagnostic(code(initai::realtime))]
    Realtime { message: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("No API token configured")]
    #[diagnostic(
        code(initai::no_token),
        help("Pass --token, set INITAI_TOKEN, or add `token` to {path}")
    )]
    NoToken { path: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(code(initai::auth_failed), help("Verify your API token."))]
    AuthFailed { message: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(code(initai::not_found))]
    NotFound { message: String },

    #[error("API error (HTTP {status}): {message}")]
    #[diagnostic(code(initai::api_error))]
    ApiError { status: u16, message: String },

    #[error("{message}")]
    #[diagnostic(
        code(initai::rejected),
        help("The request failed local validation and was not sent. Run with -v for details.")
    )]
    Rejected { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(initai::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(code(initai::config))]
    Config(Box<figment::Error>),

    #[error("Configuration file already exists")]
    #[diagnostic(code(initai::config_exists), help("Use --force to overwrite {path}"))]
    ConfigExists { path: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(initai::json))]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Realtime { .. } => exit_code::CONNECTION,
            Self::NoToken { .. } | Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::Rejected { .. } | Self::ConfigExists { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── Library error mapping ────────────────────────────────────────────

impl From<initai_api::Error> for CliError {
    fn from(err: initai_api::Error) -> Self {
        use initai_api::Error;

        match err {
            Error::Configuration { message } => Self::Validation {
                field: "token".into(),
                reason: message,
            },
            Error::Validation { message } => Self::Rejected { message },
            Error::Api {
                status: 401 | 403,
                message,
                ..
            } => Self::AuthFailed { message },
            Error::Api {
                status: 404,
                message,
                ..
            } => Self::NotFound { message },
            Error::Api {
                status, message, ..
            } => Self::ApiError { status, message },
            Error::Transport(e) if e.is_timeout() => Self::Timeout,
            Error::Transport(e) => Self::ConnectionFailed {
                url: e
                    .url()
                    .map_or_else(|| "(unknown)".into(), ToString::to_string),
                source: Box::new(e),
            },
            Error::InvalidUrl(e) => Self::Validation {
                field: "base_url".into(),
                reason: e.to_string(),
            },
            Error::Deserialization { message, .. } => Self::ApiError {
                status: 200,
                message: format!("unexpected response body: {message}"),
            },
        }
    }
}

impl From<initai_monitor::Error> for CliError {
    fn from(err: initai_monitor::Error) -> Self {
        use initai_monitor::Error;

        match err {
            Error::Api(e) => e.into(),
            Error::Configuration { message } => Self::Validation {
                field: "monitor".into(),
                reason: message,
            },
            Error::Bus { message } => Self::Validation {
                field: "event".into(),
                reason: message.into(),
            },
            Error::ChannelAuthorization { message, .. } => Self::AuthFailed { message },
            other => Self::Realtime {
                message: other.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoToken { path } => Self::NoToken { path },
            ConfigError::Figment(e) => Self::Config(e),
            ConfigError::Serialization(e) => Self::Validation {
                field: "config".into(),
                reason: format!("failed to serialize config: {e}"),
            },
            ConfigError::Io(e) => Self::Io(e),
        }
    }
}

use thiserror::Error;

/// Top-level error type for the `initai-monitor` crate.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// The monitor configuration was rejected by the factory.
    #[error("{message}")]
    Configuration { message: String },

    // ── Event bus ───────────────────────────────────────────────────
    /// Misuse of the local event bus (e.g. an empty event name).
    #[error("{message}")]
    Bus { message: &'static str },

    // ── Channel authorization ───────────────────────────────────────
    /// The API refused to authorize the realtime channel subscription.
    #[error("{message} (HTTP {status} {status_text})")]
    ChannelAuthorization {
        status: u16,
        status_text: String,
        message: String,
    },

    // ── API ─────────────────────────────────────────────────────────
    /// A conversation API call failed.
    #[error(transparent)]
    Api(#[from] initai_api::Error),

    /// HTTP transport error during channel authorization.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection failed or broke while in use.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),
}

impl Error {
    /// Returns `true` if the error was caused by invalid configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

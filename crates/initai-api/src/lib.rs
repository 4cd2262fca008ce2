// initai-api: Async Rust client for the Init.ai conversation API

pub mod client;
pub mod error;
pub mod message;
pub mod profile;
pub mod transport;
pub mod types;
pub mod validate;

/// SDK version reported in user agents and realtime handshakes.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use client::{ApiClient, ClientConfig, ConversationApi};
pub use error::{Error, ErrorType, ValidationError};
pub use message::{
    ContentType, ImageContent, MessageConfig, PostbackContent, SenderRole, validate_message,
};
pub use profile::ApiProfile;
pub use transport::TransportConfig;
pub use types::{
    ConversationMessage, FetchMessagesResult, InboundEvent, Pagination, SendMessageResult,
    Suggestion, SuggestionsResult, TriggerEventResult, parse_timestamp,
};
pub use validate::{DOCS_URL, Validation, validate_client_config};

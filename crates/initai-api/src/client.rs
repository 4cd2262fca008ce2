// Conversation API HTTP client
//
// Wraps `reqwest::Client` with bearer authentication, endpoint URL
// construction, local argument validation and HTTP status interpretation.
// Every operation validates first and never touches the network when the
// arguments are malformed.

use std::future::Future;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error};
use url::Url;

use crate::error::Error;
use crate::message::{MessageConfig, is_structured, validate_message};
use crate::profile::ApiProfile;
use crate::transport::TransportConfig;
use crate::types::{
    FetchMessagesResult, InboundEvent, SendMessageResult, SuggestionsResult, TriggerEventResult,
    WireInboundEvent,
};
use crate::validate::{Validation, validate_client_config};

// ── Configuration ────────────────────────────────────────────────────

/// Configuration required to build an [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bearer token issued for the application.
    pub token: SecretString,
    /// API root. Defaults to the staging deployment when unset.
    pub base_url: Option<String>,
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

// ── Capability seam ──────────────────────────────────────────────────

/// What a realtime monitor needs from an API client.
///
/// The monitor authorizes its channel with the base URL and auth headers,
/// and refreshes suggestions through `fetch_suggestions`. [`ApiClient`] is
/// the production implementation; tests substitute their own.
pub trait ConversationApi: Send + Sync + 'static {
    fn base_url(&self) -> &str;

    fn auth_headers(&self) -> HeaderMap;

    fn fetch_suggestions(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<SuggestionsResult, Error>> + Send;
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the Init.ai conversation API.
///
/// Holds only immutable configuration, so one instance can be shared
/// (behind an `Arc`) by any number of callers and monitors.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: SecretString,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Validate `config` and build a client with the default transport.
    ///
    /// Fails with [`Error::Configuration`] when the token is empty.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        Self::with_transport(config, &TransportConfig::default())
    }

    /// Validate `config` and build a client from a custom transport config.
    pub fn with_transport(
        config: ClientConfig,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let (base_url, token) = Self::validated(config)?;
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    /// Validate `config` and wrap an existing `reqwest::Client`.
    pub fn with_client(config: ClientConfig, http: reqwest::Client) -> Result<Self, Error> {
        let (base_url, token) = Self::validated(config)?;
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    fn validated(config: ClientConfig) -> Result<(String, SecretString), Error> {
        if let Validation::Invalid { message } = validate_client_config(Some(&config)) {
            return Err(Error::Configuration { message });
        }

        let base_url = config
            .base_url
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| ApiProfile::default().base_url().to_owned());

        Ok((base_url.trim_end_matches('/').to_owned(), config.token))
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// The API root requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Headers that authenticate a request: `authorization: Bearer {token}`.
    pub fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        // A token with bytes that cannot go in a header simply yields no
        // header; the API then answers 401.
        if let Ok(mut value) =
            HeaderValue::from_str(&format!("Bearer {}", self.token.expose_secret()))
        {
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn conversation_endpoint(&self, user_id: &str, rest: &[&str]) -> Result<Url, Error> {
        let mut segments = vec!["v1", "users", user_id, "conversations", "current"];
        segments.extend_from_slice(rest);
        self.endpoint(&segments)
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Send a message into the user's current conversation.
    pub async fn send_message(&self, message: &MessageConfig) -> Result<SendMessageResult, Error> {
        if let Some(err) = validate_message(message) {
            error!("{}", err.message);
            return Err(Error::validation("Could not send message"));
        }

        let url = self.conversation_endpoint(&message.user_id, &["messages"])?;
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .headers(self.auth_headers())
            .json(&message.to_wire())
            .send()
            .await?;

        read_json(resp, || "Your message could not be sent at this time".into()).await
    }

    /// Fetch the messages of the user's current conversation.
    pub async fn fetch_messages(&self, user_id: &str) -> Result<FetchMessagesResult, Error> {
        if user_id.is_empty() {
            error!("Invalid fetchMessages argument\n\nA valid userId String is required");
            return Err(Error::validation("Could not fetch messages"));
        }

        let url = self.conversation_endpoint(user_id, &["messages"])?;
        debug!("GET {url}");

        let resp = self.http.get(url).headers(self.auth_headers()).send().await?;

        read_json(resp, || format!("Could not fetch messages for user {user_id}")).await
    }

    /// Fetch the current suggestion set for the user's conversation.
    pub async fn fetch_suggestions(&self, user_id: &str) -> Result<SuggestionsResult, Error> {
        if user_id.is_empty() {
            error!("Invalid fetchSuggestions argument\n\nA valid userId String is required");
            return Err(Error::validation("Could not fetch suggestions"));
        }

        let url = self.conversation_endpoint(user_id, &["suggestions", "current"])?;
        debug!("GET {url}");

        let resp = self.http.get(url).headers(self.auth_headers()).send().await?;

        read_json(resp, || format!("Could not fetch suggestions for user {user_id}")).await
    }

    /// Deliver an inbound event to the user's conversation logic.
    pub async fn trigger_inbound_event(
        &self,
        event: &InboundEvent,
    ) -> Result<TriggerEventResult, Error> {
        let data_ok = event
            .data
            .as_ref()
            .is_none_or(|data| data.is_null() || is_structured(data));

        if event.user_id.is_empty() || event.event_type.is_empty() || !data_ok {
            error!(
                "Invalid triggerInboundEvent configuration\n\n\
                 A valid eventConfig Object is required\n\n\
                 • eventConfig.userId must be a valid String\n\
                 • eventConfig.eventType must be a valid String\n\
                 • eventConfig.data must be a valid Object (if present)"
            );
            return Err(Error::validation("Could not trigger inbound event"));
        }

        let url = self.endpoint(&["api", "v1", "webhook", "event"])?;
        debug!("POST {url}");

        let body = WireInboundEvent {
            app_user_id: &event.user_id,
            event_type: &event.event_type,
            data: event.data.as_ref(),
        };

        let resp = self
            .http
            .post(url)
            .headers(self.auth_headers())
            .json(&body)
            .send()
            .await?;

        read_json(resp, || "Your event could not be sent at this time".into()).await
    }
}

impl ConversationApi for ApiClient {
    fn base_url(&self) -> &str {
        ApiClient::base_url(self)
    }

    fn auth_headers(&self) -> HeaderMap {
        ApiClient::auth_headers(self)
    }

    fn fetch_suggestions(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<SuggestionsResult, Error>> + Send {
        ApiClient::fetch_suggestions(self, user_id)
    }
}

// ── Response handling ────────────────────────────────────────────────

/// Parse a 200 response as JSON; anything else becomes [`Error::Api`]
/// with the operation's fixed message.
async fn read_json<T: DeserializeOwned>(
    resp: reqwest::Response,
    failure: impl FnOnce() -> String,
) -> Result<T, Error> {
    let status = resp.status();

    if status != StatusCode::OK {
        return Err(Error::Api {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_owned(),
            message: failure(),
        });
    }

    let body = resp.text().await?;

    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}

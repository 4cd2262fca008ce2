// Channel authorization handshake.
//
// Presence channels are signed by the conversation API: the socket id and
// channel name are posted to `/v1/users/{userId}/auth_pusher_channel` and the
// JSON answer is forwarded to the push service unchanged.

use std::future::Future;
use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use tracing::debug;
use url::Url;

use initai_api::{ConversationApi, TransportConfig};

use crate::error::Error;
use crate::protocol::ChannelAuth;

/// Produces the signature a private or presence channel subscription needs.
pub trait ChannelAuthorizer: Send + Sync + 'static {
    fn authorize(
        &self,
        socket_id: &str,
        channel_name: &str,
    ) -> impl Future<Output = Result<ChannelAuth, Error>> + Send;
}

/// Authorizes channels for one user through the conversation API.
pub struct ApiChannelAuthorizer<A> {
    api: Arc<A>,
    user_id: String,
    http: reqwest::Client,
}

impl<A: ConversationApi> ApiChannelAuthorizer<A> {
    pub fn new(api: Arc<A>, user_id: impl Into<String>) -> Result<Self, Error> {
        let http = TransportConfig::default().build_client()?;
        Ok(Self::with_client(api, user_id, http))
    }

    pub fn with_client(api: Arc<A>, user_id: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            api,
            user_id: user_id.into(),
            http,
        }
    }

    fn endpoint(&self) -> Result<Url, Error> {
        let mut url = Url::parse(self.api.base_url())?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(["v1", "users", self.user_id.as_str(), "auth_pusher_channel"]);
        Ok(url)
    }

    async fn request(&self, socket_id: &str, channel_name: &str) -> Result<ChannelAuth, Error> {
        let url = self.endpoint()?;
        debug!(channel = channel_name, "POST {url}");

        let mut headers = self.api.auth_headers();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );

        let resp = self
            .http
            .post(url)
            .headers(headers)
            .form(&[("socket_id", socket_id), ("channel_name", channel_name)])
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(Error::ChannelAuthorization {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_owned(),
                message: "Could not authenticate channel subscription".into(),
            });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}

impl<A: ConversationApi> ChannelAuthorizer for ApiChannelAuthorizer<A> {
    fn authorize(
        &self,
        socket_id: &str,
        channel_name: &str,
    ) -> impl Future<Output = Result<ChannelAuth, Error>> + Send {
        self.request(socket_id, channel_name)
    }
}

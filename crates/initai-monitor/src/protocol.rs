//! Pusher wire protocol (version 7) frames.
//!
//! Every frame is a JSON object `{ "event", "channel"?, "data" }`. Servers
//! usually double-encode `data` as a JSON string; [`PusherEvent::payload`]
//! undoes that.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use url::Url;

// ── Event names ──────────────────────────────────────────────────────

pub const CONNECTION_ESTABLISHED: &str = "pusher:connection_established";
pub const ERROR: &str = "pusher:error";
pub const PING: &str = "pusher:ping";
pub const PONG: &str = "pusher:pong";
pub const SUBSCRIBE: &str = "pusher:subscribe";
pub const UNSUBSCRIBE: &str = "pusher:unsubscribe";
pub const SUBSCRIPTION_ERROR: &str = "pusher:subscription_error";
pub const SUBSCRIPTION_SUCCEEDED: &str = "pusher_internal:subscription_succeeded";

const PROTOCOL_VERSION: u8 = 7;
const CLIENT_NAME: &str = "initai-rs";

// ── Frames ───────────────────────────────────────────────────────────

/// A single frame received from (or sent to) the push service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PusherEvent {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl PusherEvent {
    pub fn new(event: impl Into<String>, channel: Option<&str>, data: Value) -> Self {
        Self {
            event: event.into(),
            channel: channel.map(String::from),
            data,
        }
    }

    /// The decoded payload. String data that holds JSON is parsed; anything
    /// else is returned as-is.
    pub fn payload(&self) -> Value {
        match &self.data {
            Value::String(raw) => serde_json::from_str(raw).unwrap_or_else(|_| self.data.clone()),
            other => other.clone(),
        }
    }

    pub fn is_on(&self, channel: &str) -> bool {
        self.channel.as_deref() == Some(channel)
    }
}

/// Payload of `pusher:connection_established`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionEstablished {
    pub socket_id: String,
    #[serde(default)]
    pub activity_timeout: Option<u64>,
}

/// Signed authorization for a private or presence channel.
///
/// Returned by the API's channel-auth endpoint and echoed back to the push
/// service in the subscribe frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAuth {
    pub auth: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_data: Option<String>,
}

/// Parse a text frame. Malformed frames are logged and skipped.
pub fn parse_frame(text: &str) -> Option<PusherEvent> {
    match serde_json::from_str(text) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!(error = %e, "Failed to parse Pusher frame");
            None
        }
    }
}

/// Private and presence channels must be authorized before subscribing.
pub fn requires_auth(channel: &str) -> bool {
    channel.starts_with("private-") || channel.starts_with("presence-")
}

pub fn subscribe_frame(channel: &str, auth: Option<&ChannelAuth>) -> String {
    let mut data = json!({ "channel": channel });
    if let (Some(auth), Some(map)) = (auth, data.as_object_mut()) {
        map.insert("auth".into(), Value::String(auth.auth.clone()));
        if let Some(channel_data) = &auth.channel_data {
            map.insert("channel_data".into(), Value::String(channel_data.clone()));
        }
    }
    json!({ "event": SUBSCRIBE, "data": data }).to_string()
}

pub fn unsubscribe_frame(channel: &str) -> String {
    json!({ "event": UNSUBSCRIBE, "data": { "channel": channel } }).to_string()
}

pub fn pong_frame() -> String {
    json!({ "event": PONG, "data": {} }).to_string()
}

/// WebSocket endpoint for an app key on `host`.
///
/// `encrypted` selects `wss` over `ws`.
pub fn socket_url(host: &str, app_key: &str, encrypted: bool) -> Result<Url, url::ParseError> {
    let scheme = if encrypted { "wss" } else { "ws" };
    let mut url = Url::parse(&format!("{scheme}://{host}/app/{app_key}"))?;
    url.query_pairs_mut()
        .append_pair("protocol", &PROTOCOL_VERSION.to_string())
        .append_pair("client", CLIENT_NAME)
        .append_pair("version", initai_api::VERSION)
        .append_pair("flash", "false");
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_double_encoded_payload() {
        let raw = r#"{"event":"pusher:connection_established","data":"{\"socket_id\":\"123.456\",\"activity_timeout\":120}"}"#;
        let event = parse_frame(raw).unwrap();
        assert_eq!(event.event, CONNECTION_ESTABLISHED);

        let established: ConnectionEstablished = serde_json::from_value(event.payload()).unwrap();
        assert_eq!(established.socket_id, "123.456");
        assert_eq!(established.activity_timeout, Some(120));
    }

    #[test]
    fn keeps_plain_string_payload() {
        let event = PusherEvent::new("custom", Some("c"), Value::String("hello".into()));
        assert_eq!(event.payload(), Value::String("hello".into()));
        assert!(event.is_on("c"));
        assert!(!event.is_on("d"));
    }

    #[test]
    fn malformed_frame_is_skipped() {
        assert!(parse_frame("not json at all").is_none());
        assert!(parse_frame(r#"{"data":{}}"#).is_none());
    }

    #[test]
    fn subscribe_frame_carries_auth() {
        let auth = ChannelAuth {
            auth: "key:signature".into(),
            channel_data: Some(r#"{"user_id":"u1"}"#.into()),
        };
        let frame: Value =
            serde_json::from_str(&subscribe_frame("presence-app_user-u1", Some(&auth))).unwrap();
        assert_eq!(
            frame,
            json!({
                "event": "pusher:subscribe",
                "data": {
                    "channel": "presence-app_user-u1",
                    "auth": "key:signature",
                    "channel_data": "{\"user_id\":\"u1\"}"
                }
            })
        );
    }

    #[test]
    fn public_channels_skip_auth() {
        assert!(requires_auth("presence-app_user-u1"));
        assert!(requires_auth("private-x"));
        assert!(!requires_auth("news"));

        let frame: Value = serde_json::from_str(&subscribe_frame("news", None)).unwrap();
        assert_eq!(frame["data"], json!({ "channel": "news" }));
    }

    #[test]
    fn socket_url_has_protocol_query() {
        let url = socket_url("ws.pusherapp.com", "abc", true).unwrap();
        assert_eq!(url.scheme(), "wss");
        assert_eq!(url.path(), "/app/abc");
        assert!(url.query().unwrap().starts_with("protocol=7&client=initai-rs&version="));

        let plain = socket_url("127.0.0.1:9000", "abc", false).unwrap();
        assert_eq!(plain.scheme(), "ws");
        assert_eq!(plain.port(), Some(9000));
    }
}

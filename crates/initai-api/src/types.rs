// Request and response models for the conversation API.
//
// Response structs are lenient: every field the API may omit has a default,
// and anything not modelled here lands in `extra` so nothing is dropped.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Requests ─────────────────────────────────────────────────────────

/// An inbound event to deliver to a user's conversation logic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEvent {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub event_type: String,
    /// Event payload. Must be a JSON object or array when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl InboundEvent {
    pub fn new(user_id: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            event_type: event_type.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Snake-case body for `POST /api/v1/webhook/event`.
#[derive(Debug, Serialize)]
pub(crate) struct WireInboundEvent<'a> {
    pub app_user_id: &'a str,
    pub event_type: &'a str,
    pub data: Option<&'a Value>,
}

// ── Lenient field decoding ───────────────────────────────────────────

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn render(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }

    /// Any scalar as a string; `null` and absence become empty.
    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(render(Value::deserialize(d)?).unwrap_or_default())
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(render(Value::deserialize(d)?))
    }

    /// Values of an unexpected shape decode as `None`.
    pub fn opt<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: serde::de::DeserializeOwned,
    {
        Ok(serde_json::from_value(Value::deserialize(d)?).ok())
    }

    pub fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
    }
}

/// Parse an API timestamp. Accepts RFC 3339 and the naive
/// `YYYY-MM-DD HH:MM:SS[.f]` form, read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .map(|t| t.and_utc())
        })
}

// ── Messages ─────────────────────────────────────────────────────────

/// The stored message returned by a successful send.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SendMessageResult {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    /// `in` or `out` today; kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "lenient::opt_string")]
    pub direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "lenient::opt_string")]
    pub sender_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "lenient::opt_string")]
    pub sender_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "lenient::opt_string")]
    pub content_type: Option<String>,
    /// Message content as stored by the API (usually a JSON-encoded string).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "lenient::opt_string")]
    pub source_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "lenient::opt_string")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "lenient::opt_string")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SendMessageResult {
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }
}

/// One message of a conversation transcript.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "lenient::opt_string")]
    pub direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "lenient::opt_string")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "lenient::opt_string")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "lenient::opt_string")]
    pub sender_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "lenient::opt_string")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "lenient::opt_string")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConversationMessage {
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }
}

/// Cursor links for paging through a transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub current_page_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub first_page_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub next_page_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub next_page_before_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt")]
    pub page_size: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt")]
    pub remaining_page_count: Option<u32>,
}

/// Result of fetching the current conversation's messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchMessagesResult {
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub messages: Vec<ConversationMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "lenient::opt")]
    pub pagination: Option<Pagination>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Suggestions ──────────────────────────────────────────────────────

/// A server-computed candidate reply for a human agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(default, deserialize_with = "lenient::string")]
    pub suggestion_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "lenient::opt_string")]
    pub suggestion_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "lenient::opt_string")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub content: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nlp_metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Suggestion {
    /// The suggested reply text, when the content carries one.
    pub fn text(&self) -> Option<&str> {
        self.content.get("text").and_then(Value::as_str)
    }
}

/// The current suggestion set for a user's conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionsResult {
    #[serde(default, deserialize_with = "lenient::string")]
    pub conversation_id: String,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub suggestions: Vec<Suggestion>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Events ───────────────────────────────────────────────────────────

/// Acknowledgement of a triggered inbound event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerEventResult {
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn send_result_keeps_unknown_fields() {
        let raw = json!({
            "id": "e5f7608d-3117-4d26-6194-cc8540227f87",
            "direction": "in",
            "sender_role": "end-user",
            "content_type": "text",
            "content": "Test message",
            "created_at": "2017-06-21T15:01:09.612765Z",
            "conversation_id": "c1"
        });

        let result: SendMessageResult = serde_json::from_value(raw).unwrap();
        assert_eq!(result.direction.as_deref(), Some("in"));
        assert_eq!(result.extra["conversation_id"], "c1");
        assert!(result.created().is_some());
    }

    #[test]
    fn off_model_fields_still_decode() {
        let raw = json!({
            "id": null,
            "direction": "outbound",
            "sender_role": 7,
            "created_at": "2017-06-21 15:01:09",
        });

        let result: SendMessageResult = serde_json::from_value(raw).unwrap();
        assert_eq!(result.id, "");
        assert_eq!(result.direction.as_deref(), Some("outbound"));
        assert_eq!(result.sender_role.as_deref(), Some("7"));
        assert_eq!(
            result.created().unwrap().to_rfc3339(),
            "2017-06-21T15:01:09+00:00"
        );
    }

    #[test]
    fn null_collections_decode_empty() {
        let raw = json!({ "conversation_id": 42, "suggestions": null });
        let result: SuggestionsResult = serde_json::from_value(raw).unwrap();
        assert_eq!(result.conversation_id, "42");
        assert!(result.suggestions.is_empty());

        let raw = json!({ "messages": null, "pagination": "none" });
        let result: FetchMessagesResult = serde_json::from_value(raw).unwrap();
        assert!(result.messages.is_empty());
        assert!(result.pagination.is_none());
    }

    #[test]
    fn timestamps_parse_in_both_forms() {
        assert!(parse_timestamp("2017-06-21T15:01:09.612765Z").is_some());
        assert!(parse_timestamp("2017-06-21 15:01:09.612765").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn suggestions_deserialize() {
        let raw = json!({
            "conversation_id": "c1",
            "suggestions": [{
                "suggestion_id": "s1",
                "suggestion_type": "message",
                "content_type": "text",
                "content": { "text": "Some message content" },
                "metadata": {},
                "nlp_metadata": {},
                "data": {}
            }]
        });

        let result: SuggestionsResult = serde_json::from_value(raw).unwrap();
        assert_eq!(result.suggestions.len(), 1);
        assert_eq!(result.suggestions[0].text(), Some("Some message content"));
    }
}

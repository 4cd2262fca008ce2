//! Outbound message configuration and its structural validation.
//!
//! A [`MessageConfig`] keeps the local camel-case shape callers work with
//! (`userId`, `contentType`, `imageUrl`, ...). [`validate_message`] checks
//! it before anything is serialized, and [`MessageConfig::to_wire`] maps it
//! to the snake-case body the API expects.

use std::borrow::Cow;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::ValidationError;

// ── Enumerations ─────────────────────────────────────────────────────

/// The declared shape of a message's `content`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ContentType {
    Text,
    Image,
    PostbackAction,
}

/// Who a message is attributed to.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SenderRole {
    Agent,
    App,
    #[default]
    EndUser,
}

// ── Content payloads ─────────────────────────────────────────────────

/// Content of an `image` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageContent {
    pub image_url: String,
    pub mime_type: String,
    pub alternative_text: Option<String>,
}

/// Content of a `postback-action` message.
#[derive(Debug, Clone, PartialEq)]
pub struct PostbackContent {
    pub text: String,
    pub stream: String,
    /// Arbitrary payload handed to the named stream (string, object or array).
    pub data: Option<Value>,
}

// ── MessageConfig ────────────────────────────────────────────────────

/// Everything needed to send one message on behalf of a user.
///
/// `content` stays dynamic JSON: its required shape depends on
/// `content_type`, and [`validate_message`] is what enforces it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageConfig {
    #[serde(default)]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub content: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_role: Option<String>,
}

impl MessageConfig {
    /// A plain text message.
    pub fn text(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            content_type: Some(ContentType::Text.to_string()),
            content: Value::String(text.into()),
            sender_role: None,
        }
    }

    /// An image message. Field names are kept camel-case until send time.
    pub fn image(user_id: impl Into<String>, content: ImageContent) -> Self {
        let mut body = Map::new();
        body.insert("imageUrl".into(), Value::String(content.image_url));
        body.insert("mimeType".into(), Value::String(content.mime_type));
        if let Some(alt) = content.alternative_text {
            body.insert("alternativeText".into(), Value::String(alt));
        }

        Self {
            user_id: user_id.into(),
            content_type: Some(ContentType::Image.to_string()),
            content: Value::Object(body),
            sender_role: None,
        }
    }

    /// A postback-action message that routes `data` to `stream`.
    pub fn postback(user_id: impl Into<String>, content: PostbackContent) -> Self {
        let mut body = json!({
            "text": content.text,
            "stream": content.stream,
        });
        if let (Some(data), Some(map)) = (content.data, body.as_object_mut()) {
            map.insert("data".into(), data);
        }

        Self {
            user_id: user_id.into(),
            content_type: Some(ContentType::PostbackAction.to_string()),
            content: body,
            sender_role: None,
        }
    }

    pub fn with_sender_role(mut self, role: SenderRole) -> Self {
        self.sender_role = Some(role.to_string());
        self
    }

    /// Leniently read a message configuration from arbitrary JSON.
    ///
    /// Only a non-object is rejected here. Fields of the wrong JSON type are
    /// treated as absent so that [`validate_message`] reports them with its
    /// usual messages.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let Some(obj) = value.as_object() else {
            return Err(compose_error(
                "A valid message configuration Object is required",
            ));
        };

        let string_field = |key: &str| obj.get(key).and_then(Value::as_str).map(String::from);

        Ok(Self {
            user_id: string_field("userId").unwrap_or_default(),
            content_type: string_field("contentType"),
            content: obj.get("content").cloned().unwrap_or(Value::Null),
            sender_role: string_field("senderRole"),
        })
    }

    /// The declared content type, ignoring an empty string.
    fn declared_content_type(&self) -> Option<&str> {
        self.content_type.as_deref().filter(|ct| !ct.is_empty())
    }

    /// Build the request body sent to the messages endpoint.
    ///
    /// A missing content type goes out as `text` and a missing sender role
    /// as `end-user`. Image content keys are converted to snake-case.
    pub fn to_wire(&self) -> WireMessage<'_> {
        let content_type = self
            .declared_content_type()
            .unwrap_or(ContentType::Text.as_ref());

        let content = if content_type == ContentType::Image.as_ref() {
            Cow::Owned(decamelize_keys(&self.content))
        } else {
            Cow::Borrowed(&self.content)
        };

        let sender_role = self
            .sender_role
            .as_deref()
            .filter(|role| !role.is_empty())
            .unwrap_or(SenderRole::EndUser.as_ref());

        WireMessage {
            content_type,
            content,
            sender_role,
        }
    }
}

/// Snake-case request body for `POST .../messages`.
#[derive(Debug, Serialize)]
pub struct WireMessage<'a> {
    pub content_type: &'a str,
    pub content: Cow<'a, Value>,
    pub sender_role: &'a str,
}

// ── Validation ───────────────────────────────────────────────────────

fn compose_error(reason: &str) -> ValidationError {
    ValidationError::new(format!("Invalid sendMessage configuration\n\n{reason}"))
}

pub(crate) fn is_valid_string(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty())
}

fn is_present(value: Option<&Value>) -> bool {
    value.is_some_and(|v| !v.is_null())
}

/// Check a message against the rules of its declared content type.
///
/// Rules run in order and stop at the first failure. A message without a
/// content type gets no content check at all, although it is sent as
/// `text`.
pub fn validate_message(config: &MessageConfig) -> Option<ValidationError> {
    if config.user_id.is_empty() {
        return Some(compose_error("A valid userId string is required"));
    }

    let declared = config.declared_content_type()?;

    let Ok(content_type) = ContentType::from_str(declared) else {
        return Some(compose_error(
            r#"A valid contentType is required. Use: "text", "image", or "postback-action""#,
        ));
    };

    match content_type {
        ContentType::Text => validate_text(config),
        ContentType::Image => validate_image(&config.content),
        ContentType::PostbackAction => validate_postback(&config.content),
    }
}

fn validate_text(config: &MessageConfig) -> Option<ValidationError> {
    if !is_valid_string(Some(&config.content)) {
        return Some(compose_error(
            r#"Message type of "text" requires a valid String for "content""#,
        ));
    }

    if let Some(role) = config.sender_role.as_deref() {
        if SenderRole::from_str(role).is_err() {
            return Some(compose_error(
                r#"A valid "senderRole" is required. Use: "agent", "app", or "end-user""#,
            ));
        }
    }

    None
}

fn validate_image(content: &Value) -> Option<ValidationError> {
    let valid = content.as_object().is_some_and(|obj| {
        is_valid_string(obj.get("imageUrl"))
            && is_valid_string(obj.get("mimeType"))
            && (!is_present(obj.get("alternativeText"))
                || is_valid_string(obj.get("alternativeText")))
    });

    if valid {
        return None;
    }

    Some(compose_error(
        "Message type of \"image\" requires a valid \"content\" Object\n\n\
         • content.imageURL must be a valid String\n\
         • content.alternativeText must be a valid String\n\
         • content.mimeType must be a valid String",
    ))
}

/// Objects and arrays both count as structured payloads.
pub(crate) fn is_structured(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

fn validate_postback(content: &Value) -> Option<ValidationError> {
    let valid = content.as_object().is_some_and(|obj| {
        let data = obj.get("data");
        is_valid_string(obj.get("text"))
            && is_valid_string(obj.get("stream"))
            && (!is_present(data) || is_valid_string(data) || data.is_some_and(is_structured))
    });

    if valid {
        return None;
    }

    Some(compose_error(
        "Message type of \"postback-action\" requires a valid \"content\" Object\n\n\
         • content.text must be a valid String\n\
         • content.data must be a valid String or Object\n\
         • content.stream must be a valid String",
    ))
}

// ── Key case conversion ──────────────────────────────────────────────

/// Convert a single camel-case key to snake-case (`imageUrl` -> `image_url`).
///
/// Every upper-case letter after the first character starts a new word.
fn decamelize(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Recursively convert every object key in `value` to snake-case.
pub fn decamelize_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (decamelize(k), decamelize_keys(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(decamelize_keys).collect()),
        other => other.clone(),
    }
}

// ── Tests ────────────────────────────────────────────────────────────

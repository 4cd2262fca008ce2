//! Conversation commands: send, messages, suggestions, event.

use serde_json::Value;

use initai_api::{ImageContent, InboundEvent, MessageConfig, PostbackContent};

use crate::cli::{ContentKind, EventArgs, GlobalOpts, SendArgs};
use crate::commands::Session;
use crate::error::CliError;
use crate::output;

fn parse_json(field: &str, raw: &str) -> Result<Value, CliError> {
    serde_json::from_str(raw).map_err(|e| CliError::Validation {
        field: field.into(),
        reason: e.to_string(),
    })
}

/// Build the outbound message. Missing pieces are left empty so the
/// library's validation reports them.
fn build_message(args: SendArgs) -> MessageConfig {
    let text = args.text.unwrap_or_default();

    let message = match args.kind {
        ContentKind::Text => MessageConfig::text(args.user_id, text),
        ContentKind::Image => MessageConfig::image(
            args.user_id,
            ImageContent {
                image_url: args.image_url.unwrap_or_default(),
                mime_type: args.mime_type.unwrap_or_default(),
                alternative_text: args.alt_text,
            },
        ),
        ContentKind::Postback => {
            // Plain strings are accepted as-is; anything that parses is sent as JSON.
            let data = args
                .data
                .map(|raw| serde_json::from_str(&raw).unwrap_or(Value::String(raw)));
            MessageConfig::postback(
                args.user_id,
                PostbackContent {
                    text,
                    stream: args.stream.unwrap_or_default(),
                    data,
                },
            )
        }
    };

    match args.role {
        Some(role) => message.with_sender_role(role),
        None => message,
    }
}

pub async fn send(session: &Session, args: SendArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let message = build_message(args);
    let result = session.api.send_message(&message).await?;
    output::print(&result, global.output)
}

pub async fn messages(
    session: &Session,
    user_id: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let result = session.api.fetch_messages(user_id).await?;
    output::print(&result, global.output)
}

pub async fn suggestions(
    session: &Session,
    user_id: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let result = session.api.fetch_suggestions(user_id).await?;
    output::print(&result, global.output)
}

pub async fn event(
    session: &Session,
    args: EventArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut event = InboundEvent::new(args.user_id, args.event_type);
    if let Some(raw) = args.data {
        event = event.with_data(parse_json("data", &raw)?);
    }

    let result = session.api.trigger_inbound_event(&event).await?;
    output::print(&result, global.output)
}

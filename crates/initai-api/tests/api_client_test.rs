#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use initai_api::{
    ApiClient, ClientConfig, Error, ErrorType, ImageContent, InboundEvent, MessageConfig,
    PostbackContent, SenderRole,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup(token: &str) -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::new(ClientConfig::new(token).with_base_url(server.uri())).unwrap();
    (server, client)
}

fn messages_path(user_id: &str) -> String {
    format!("/v1/users/{user_id}/conversations/current/messages")
}

fn suggestions_path(user_id: &str) -> String {
    format!("/v1/users/{user_id}/conversations/current/suggestions/current")
}

async fn assert_no_requests(server: &MockServer) {
    let received = server.received_requests().await.unwrap();
    assert!(received.is_empty(), "expected no requests, got {}", received.len());
}

// ── Construction ────────────────────────────────────────────────────

#[test]
fn test_construction_rejects_empty_token() {
    let result = ApiClient::new(ClientConfig::new(""));
    let Err(Error::Configuration { message }) = result else {
        panic!("expected Configuration error");
    };
    assert!(message.contains("A valid `token` string is required."));
    assert!(message.ends_with("See: https://docs.init.ai"));
}

#[test]
fn test_auth_headers_for_any_token() {
    for _ in 0..5 {
        let token = Uuid::new_v4().to_string();
        let client = ApiClient::new(ClientConfig::new(&token)).unwrap();
        let headers = client.auth_headers();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers["authorization"], format!("Bearer {token}").as_str());
    }
}

// ── sendMessage ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_send_text_message() {
    let (server, client) = setup("abc").await;

    Mock::given(method("POST"))
        .and(path(messages_path("u1")))
        .and(header("authorization", "Bearer abc"))
        .and(body_string(
            r#"{"content_type":"text","content":"hi","sender_role":"end-user"}"#,
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "m1" })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client
        .send_message(&MessageConfig::text("u1", "hi"))
        .await
        .unwrap();

    assert_eq!(result.id, "m1");
    assert!(result.extra.is_empty());
}

#[tokio::test]
async fn test_send_message_defaults_to_text() {
    let (server, client) = setup("abc").await;

    Mock::given(method("POST"))
        .and(path(messages_path("u1")))
        .and(body_json(json!({
            "content_type": "text",
            "content": "Test message",
            "sender_role": "end-user",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "m2" })))
        .expect(1)
        .mount(&server)
        .await;

    let message = MessageConfig::from_value(&json!({
        "userId": "u1",
        "content": "Test message",
    }))
    .unwrap();

    let result = client.send_message(&message).await.unwrap();
    assert_eq!(result.id, "m2");
}

#[tokio::test]
async fn test_send_image_message_snake_cases_content() {
    let (server, client) = setup("abc").await;

    Mock::given(method("POST"))
        .and(path(messages_path("u1")))
        .and(body_json(json!({
            "content_type": "image",
            "content": {
                "alternative_text": "Holy cow!",
                "image_url": "http://some.img",
                "mime_type": "image/png",
            },
            "sender_role": "end-user",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "0d9dcf10-3adb-4c66-5173-fde5728418d0",
            "content_type": "image",
            "direction": "in",
            "created_at": "2017-06-21T15:06:08.71557Z",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let message = MessageConfig::image(
        "u1",
        ImageContent {
            image_url: "http://some.img".into(),
            mime_type: "image/png".into(),
            alternative_text: Some("Holy cow!".into()),
        },
    );

    let result = client.send_message(&message).await.unwrap();
    assert_eq!(result.content_type.as_deref(), Some("image"));
}

#[tokio::test]
async fn test_send_postback_message_keeps_data_keys() {
    let (server, client) = setup("abc").await;

    Mock::given(method("POST"))
        .and(path(messages_path("u1")))
        .and(body_json(json!({
            "content_type": "postback-action",
            "content": {
                "text": "Order accepted",
                "data": { "orderNumber": 123, "status": "accepted" },
                "stream": "handleCompletedOrder",
            },
            "sender_role": "end-user",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "m3" })))
        .expect(1)
        .mount(&server)
        .await;

    let message = MessageConfig::postback(
        "u1",
        PostbackContent {
            text: "Order accepted".into(),
            stream: "handleCompletedOrder".into(),
            data: Some(json!({ "orderNumber": 123, "status": "accepted" })),
        },
    );

    client.send_message(&message).await.unwrap();
}

#[tokio::test]
async fn test_send_message_respects_sender_role() {
    for role in [SenderRole::App, SenderRole::Agent] {
        let (server, client) = setup("abc").await;

        Mock::given(method("POST"))
            .and(path(messages_path("u1")))
            .and(body_json(json!({
                "content_type": "text",
                "content": "Test message",
                "sender_role": role.to_string(),
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let message = MessageConfig::text("u1", "Test message").with_sender_role(role);
        client.send_message(&message).await.unwrap();
    }
}

#[tokio::test]
async fn test_send_message_unauthorized() {
    let (server, client) = setup("abc").await;

    Mock::given(method("POST"))
        .and(path(messages_path("u1")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.send_message(&MessageConfig::text("u1", "hi")).await;

    let Err(Error::Api {
        status,
        status_text,
        message,
    }) = result
    else {
        panic!("expected Api error, got: {result:?}");
    };
    assert_eq!(status, 401);
    assert_eq!(status_text, "Unauthorized");
    assert_eq!(message, "Your message could not be sent at this time");
}

#[tokio::test]
async fn test_send_message_validation_failures_skip_network() {
    let (server, client) = setup("abc").await;

    let invalid = [
        json!({}),
        json!({ "userId": "u1", "contentType": "text", "content": 12 }),
        json!({ "userId": "u1", "contentType": "text", "content": null }),
        json!({ "userId": "u1", "contentType": "image", "content": "http://some.img" }),
        json!({ "userId": "u1", "contentType": "postback-action", "content": { "text": "t" } }),
        json!({ "userId": "u1", "contentType": "gif", "content": "x" }),
    ];

    for value in invalid {
        let message = MessageConfig::from_value(&value).unwrap();
        let err = client.send_message(&message).await.unwrap_err();
        assert_eq!(err.to_string(), "Could not send message");
        assert_eq!(err.error_type(), Some(ErrorType::ValidationFailure));
    }

    assert_no_requests(&server).await;
}

// ── fetchMessages / fetchSuggestions ────────────────────────────────

#[tokio::test]
async fn test_fetch_messages() {
    let (server, client) = setup("abc").await;

    Mock::given(method("GET"))
        .and(path(messages_path("u1")))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{
                "id": "e5f7608d-3117-4d26-6194-cc8540227f87",
                "direction": "in",
                "content": "Test message",
                "content_type": "text",
                "sender_role": "end-user",
                "created_at": "2017-06-21T15:01:09.612765Z",
                "updated_at": "2017-06-21T15:01:09.612765Z"
            }],
            "pagination": {
                "current_page_url": "/v1/users/u1/conversations/current/messages",
                "first_page_url": "/v1/users/u1/conversations/current/messages",
                "page_size": 25
            }
        })))
        .mount(&server)
        .await;

    let result = client.fetch_messages("u1").await.unwrap();
    assert_eq!(result.messages.len(), 1);
    assert_eq!(result.messages[0].sender_role.as_deref(), Some("end-user"));
    assert_eq!(result.pagination.unwrap().page_size, Some(25));
}

#[tokio::test]
async fn test_fetch_messages_failure() {
    let (server, client) = setup("abc").await;

    Mock::given(method("GET"))
        .and(path(messages_path("u1")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.fetch_messages("u1").await.unwrap_err();
    assert!(
        matches!(
            &err,
            Error::Api { status: 404, message, .. } if message == "Could not fetch messages for user u1"
        ),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn test_fetch_rejects_empty_user_id() {
    let (server, client) = setup("abc").await;

    let err = client.fetch_messages("").await.unwrap_err();
    assert_eq!(err.to_string(), "Could not fetch messages");
    assert!(err.is_validation());

    let err = client.fetch_suggestions("").await.unwrap_err();
    assert_eq!(err.to_string(), "Could not fetch suggestions");
    assert!(err.is_validation());

    assert_no_requests(&server).await;
}

#[tokio::test]
async fn test_fetch_suggestions() {
    let (server, client) = setup("abc").await;

    Mock::given(method("GET"))
        .and(path(suggestions_path("u1")))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversation_id": "c1",
            "suggestions": [{
                "suggestion_id": "s1",
                "suggestion_type": "message",
                "content_type": "text",
                "content": { "text": "Some message content" }
            }]
        })))
        .mount(&server)
        .await;

    let result = client.fetch_suggestions("u1").await.unwrap();
    assert_eq!(result.conversation_id, "c1");
    assert_eq!(result.suggestions[0].text(), Some("Some message content"));
}

#[tokio::test]
async fn test_fetch_suggestions_failure() {
    let (server, client) = setup("abc").await;

    Mock::given(method("GET"))
        .and(path(suggestions_path("u1")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client.fetch_suggestions("u1").await.unwrap_err();
    let Error::Api {
        status,
        status_text,
        message,
    } = err
    else {
        panic!("expected Api error");
    };
    assert_eq!(status, 500);
    assert_eq!(status_text, "Internal Server Error");
    assert_eq!(message, "Could not fetch suggestions for user u1");
}

#[tokio::test]
async fn test_off_model_success_bodies_resolve() {
    let (server, client) = setup("abc").await;

    Mock::given(method("POST"))
        .and(path(messages_path("u1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": null,
            "direction": "outbound",
            "created_at": "2017-06-21 15:01:09",
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(messages_path("u1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{ "id": 7, "direction": "sideways", "created_at": "2017-06-21 15:01:09" }],
            "pagination": { "page_size": "25" },
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(suggestions_path("u1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversation_id": null,
            "suggestions": [{ "suggestion_id": null, "content": "plain", "score": 0.9 }],
        })))
        .mount(&server)
        .await;

    let sent = client
        .send_message(&MessageConfig::text("u1", "hi"))
        .await
        .unwrap();
    assert_eq!(sent.id, "");
    assert_eq!(sent.direction.as_deref(), Some("outbound"));
    assert!(sent.created().is_some());

    let fetched = client.fetch_messages("u1").await.unwrap();
    assert_eq!(fetched.messages[0].id, "7");
    assert_eq!(fetched.messages[0].direction.as_deref(), Some("sideways"));
    assert_eq!(fetched.pagination.unwrap().page_size, None);

    let suggestions = client.fetch_suggestions("u1").await.unwrap();
    assert_eq!(suggestions.conversation_id, "");
    assert_eq!(suggestions.suggestions[0].content, json!("plain"));
    assert_eq!(suggestions.suggestions[0].extra["score"], json!(0.9));
}

#[tokio::test]
async fn test_malformed_success_body() {
    let (server, client) = setup("abc").await;

    Mock::given(method("GET"))
        .and(path(suggestions_path("u1")))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client.fetch_suggestions("u1").await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { ref body, .. } if body == "not json"));
}

// ── triggerInboundEvent ─────────────────────────────────────────────

#[tokio::test]
async fn test_trigger_inbound_event() {
    let (server, client) = setup("abc").await;

    Mock::given(method("POST"))
        .and(path("/api/v1/webhook/event"))
        .and(header("authorization", "Bearer abc"))
        .and(body_json(json!({
            "app_user_id": "u1",
            "event_type": "order:completed",
            "data": { "order_number": 123 },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "body": "ok",
            "error": null,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let event =
        InboundEvent::new("u1", "order:completed").with_data(json!({ "order_number": 123 }));
    let result = client.trigger_inbound_event(&event).await.unwrap();
    assert_eq!(result.body, Some(json!("ok")));
}

#[tokio::test]
async fn test_trigger_inbound_event_with_array_data() {
    let (server, client) = setup("abc").await;

    Mock::given(method("POST"))
        .and(path("/api/v1/webhook/event"))
        .and(body_json(json!({
            "app_user_id": "u1",
            "event_type": "ping",
            "data": [1, 2],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "body": { "ok": true } })))
        .expect(1)
        .mount(&server)
        .await;

    let event = InboundEvent::new("u1", "ping").with_data(json!([1, 2]));
    let result = client.trigger_inbound_event(&event).await.unwrap();
    assert_eq!(result.body, Some(json!({ "ok": true })));
}

#[tokio::test]
async fn test_trigger_inbound_event_failure() {
    let (server, client) = setup("abc").await;

    Mock::given(method("POST"))
        .and(path("/api/v1/webhook/event"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let err = client
        .trigger_inbound_event(&InboundEvent::new("u1", "ping"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().starts_with("Your event could not be sent at this time"));
}

#[tokio::test]
async fn test_trigger_inbound_event_validation() {
    let (server, client) = setup("abc").await;

    let invalid = [
        InboundEvent::new("", "ping"),
        InboundEvent::new("u1", ""),
        InboundEvent::new("u1", "ping").with_data(json!("not an object")),
    ];

    for event in &invalid {
        let err = client.trigger_inbound_event(event).await.unwrap_err();
        assert_eq!(err.to_string(), "Could not trigger inbound event");
        assert!(err.is_validation());
    }

    assert_no_requests(&server).await;
}

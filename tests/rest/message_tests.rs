//! Message create/edit over REST.

use std::time::Duration;

use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gateway_client::application::services::{
    HttpMessageService, MessageError, MessageService, RestConfig,
};
use gateway_client::domain::value_objects::Snowflake;

fn service(server: &MockServer) -> HttpMessageService {
    HttpMessageService::new(RestConfig {
        base_url: server.uri(),
        api_version: 6,
        token: "secret".into(),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn message_body(id: &str, content: &str) -> serde_json::Value {
    json!({
        "id": id,
        "channel_id": "10",
        "content": content,
        "author": {"id": "42", "username": "bot", "bot": true},
        "timestamp": "2017-07-11T17:27:07.299000+00:00",
        "edited_timestamp": null
    })
}

#[tokio::test]
async fn test_send_message_posts_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v6/channels/10/messages"))
        .and(header("authorization", "Bot secret"))
        .and(header_exists("user-agent"))
        .and(body_json(json!({"content": "hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_body("500", "hello")))
        .expect(1)
        .mount(&server)
        .await;

    let message = assert_ok!(
        service(&server)
            .send_message(Snowflake::new(10), "hello", None)
            .await
    );

    assert_eq!(message.id, Snowflake::new(500));
    assert_eq!(message.channel_id, Snowflake::new(10));
    assert_eq!(message.content, "hello");
}

#[tokio::test]
async fn test_edit_message_patches_existing() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/v6/channels/10/messages/500"))
        .and(body_json(json!({"content": "edited"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_body("500", "edited")))
        .expect(1)
        .mount(&server)
        .await;

    let message = assert_ok!(
        service(&server)
            .send_message(Snowflake::new(10), "edited", Some(Snowflake::new(500)))
            .await
    );

    assert_eq!(message.content, "edited");
}

#[tokio::test]
async fn test_error_status_is_reported_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v6/channels/10/messages"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"message": "Missing Access", "code": 50001})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = assert_err!(
        service(&server)
            .send_message(Snowflake::new(10), "hello", None)
            .await
    );

    match err {
        MessageError::Status { status, body } => {
            assert_eq!(status, 403);
            assert!(body.contains("Missing Access"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_unparseable_response_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = assert_err!(
        service(&server)
            .send_message(Snowflake::new(10), "hello", None)
            .await
    );

    assert!(matches!(err, MessageError::Http(_)));
}

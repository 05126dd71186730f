//! Reconnects, resume eligibility and connect retries.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::time::Instant;

use gateway_client::gateway::{Closure, ConnectionState, ClientEvent};
use gateway_client::shared::GatewayError;

use crate::common::*;

/// Handshake, READY and one more dispatch, so the session is resumable
/// at sequence 2.
async fn establish_session(client: &mut RunningClient, server: &mut ServerEnd) {
    server.handshake().await;
    server.ready(1, "session-1", json!([]));
    server.dispatch(2, "MESSAGE_CREATE", json!({"content": "hello"}));
    client
        .wait_for(|e| matches!(e, ClientEvent::Dispatch { name, .. } if name == "MESSAGE_CREATE"))
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_recoverable_close_resumes_with_last_sequence() {
    let (transport, mut gateway) = mock_gateway();
    let mut client = spawn_client(transport);
    let mut server = gateway.accept().await;
    establish_session(&mut client, &mut server).await;

    server.close(1006, "going away");

    let mut server = gateway.accept().await;
    let resume = server.handshake().await;
    assert_eq!(
        resume,
        json!({
            "op": 6,
            "d": {"session_id": "session-1", "seq": 2, "token": TOKEN}
        })
    );

    server.dispatch(3, "RESUMED", json!({}));
    client
        .wait_for(|e| matches!(e, ClientEvent::Resumed))
        .await;

    let (client, result, events) = client.stop().await;
    assert!(result.is_ok());
    assert_eq!(count(&events, |e| matches!(e, ClientEvent::Ready { .. })), 0);
    assert_eq!(client.session().session_id(), Some("session-1"));
    assert_eq!(client.session().last_sequence(), Some(3));
    assert_eq!(gateway.opens(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_without_session_identifies() {
    let (transport, mut gateway) = mock_gateway();
    let client = spawn_client(transport);
    let mut server = gateway.accept().await;

    server.handshake().await;
    server.close(1000, "");

    let mut server = gateway.accept().await;
    assert_eq!(server.handshake().await["op"], 2);
    client.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_rejected_resume_falls_back_to_identify() {
    let (transport, mut gateway) = mock_gateway();
    let mut client = spawn_client(transport);
    let mut server = gateway.accept().await;
    establish_session(&mut client, &mut server).await;

    server.close(4009, "Session timed out");

    let mut server = gateway.accept().await;
    assert_eq!(server.handshake().await["op"], 6);
    server.invalid_session();
    assert_eq!(server.next_payload().await["op"], 2);

    server.ready(1, "session-2", json!([]));
    client
        .wait_for(|e| matches!(e, ClientEvent::Ready { session_id, .. } if session_id == "session-2"))
        .await;
    client.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_invalid_token_is_fatal() {
    let (transport, mut gateway) = mock_gateway();
    let client = spawn_client(transport);
    let mut server = gateway.accept().await;

    server.handshake().await;
    server.close(4004, "Authentication failed.");

    let (client, result, events) = client.finish().await;
    assert!(matches!(
        result,
        Err(GatewayError::Authentication { code: 4004 })
    ));
    assert_eq!(
        count(&events, |e| matches!(e, ClientEvent::Error { fatal: true, .. })),
        1
    );
    assert_eq!(
        count(&events, |e| matches!(e, ClientEvent::Reconnecting { .. })),
        0
    );
    assert_eq!(client.state(), ConnectionState::Closed(Closure::Fatal));
    assert_eq!(gateway.opens(), 1);
    assert!(gateway.try_accept().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_request_closes_and_resumes() {
    let (transport, mut gateway) = mock_gateway();
    let mut client = spawn_client(transport);
    let mut server = gateway.accept().await;
    establish_session(&mut client, &mut server).await;

    server.request_reconnect();
    let (code, _) = server.expect_close().await;
    assert_eq!(code, 4000);

    let mut server = gateway.accept().await;
    assert_eq!(server.handshake().await["op"], 6);
    client.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_reconnects() {
    let (transport, mut gateway) = mock_gateway();
    let mut client = spawn_client(transport);
    let mut server = gateway.accept().await;

    server.handshake().await;
    server.fail("connection reset by peer");
    client
        .wait_for(|e| matches!(e, ClientEvent::Error { fatal: false, .. }))
        .await;

    let mut server = gateway.accept().await;
    assert_eq!(server.handshake().await["op"], 2);
    client.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_attempts_are_counted() {
    let (transport, mut gateway) = mock_gateway();
    let mut client = spawn_client(transport);

    for expected in 1..=3 {
        let mut server = gateway.accept().await;
        server.handshake().await;
        server.close(1001, "");
        let event = client
            .wait_for(|e| matches!(e, ClientEvent::Reconnecting { .. }))
            .await;
        assert!(matches!(event, ClientEvent::Reconnecting { attempt } if attempt == expected));
    }

    let mut server = gateway.accept().await;
    server.handshake().await;
    let (client, _, _) = client.stop().await;
    assert_eq!(client.reconnect_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_connect_failure_retries_after_fixed_pause() {
    let (transport, mut gateway) = mock_gateway();
    gateway.fail_next(GatewayError::TransportEstablish("connection refused".into()));
    let start = Instant::now();
    let client = spawn_client(transport);

    let mut server = gateway.accept().await;
    assert_eq!(start.elapsed(), Duration::from_secs(5));
    assert_eq!(server.handshake().await["op"], 2);

    let (_, _, events) = client.stop().await;
    assert_eq!(
        count(&events, |e| matches!(e, ClientEvent::Error { fatal: false, .. })),
        1
    );
    assert_eq!(gateway.opens(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_closing_stream_race_is_retried_quietly() {
    let (transport, mut gateway) = mock_gateway();
    gateway.fail_next(GatewayError::StreamClosing);
    let start = Instant::now();
    let client = spawn_client(transport);

    let _server = gateway.accept().await;
    assert_eq!(start.elapsed(), Duration::from_secs(5));

    let (_, _, events) = client.stop().await;
    assert_eq!(count(&events, |e| matches!(e, ClientEvent::Error { .. })), 0);
    assert_eq!(gateway.opens(), 2);
}

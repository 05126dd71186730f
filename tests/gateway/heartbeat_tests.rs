//! Heartbeat cadence and the acknowledgement watchdog.

use std::time::Duration;

use tokio::time::Instant;

use gateway_client::gateway::ClientEvent;
use gateway_client::infrastructure::transport::TransportCommand;

use crate::common::*;

const INTERVAL_MS: u64 = 1_000;

#[tokio::test(start_paused = true)]
async fn test_acknowledged_heartbeats_keep_the_connection() {
    let (transport, mut gateway) = mock_gateway();
    let mut client = spawn_client(transport);
    let mut server = gateway.accept().await;

    server.hello_with(INTERVAL_MS);
    assert_eq!(server.next_json().await["op"], 2);

    let start = Instant::now();
    for _ in 0..5 {
        server.next_heartbeat().await;
        server.ack();
    }

    // Initial beat plus four periodic ones.
    assert_eq!(start.elapsed(), Duration::from_millis(4 * INTERVAL_MS));
    client
        .wait_for(|e| matches!(e, ClientEvent::HeartbeatAck { .. }))
        .await;

    let (_, result, events) = client.stop().await;
    assert!(result.is_ok());
    assert_eq!(gateway.opens(), 1);
    assert_eq!(
        count(&events, |e| matches!(e, ClientEvent::Reconnecting { .. })),
        0
    );
}

#[tokio::test(start_paused = true)]
async fn test_missing_ack_closes_and_reconnects() {
    let (transport, mut gateway) = mock_gateway();
    let mut client = spawn_client(transport);
    let mut server = gateway.accept().await;

    server.hello_with(INTERVAL_MS);
    assert_eq!(server.next_json().await["op"], 2);
    let start = Instant::now();
    server.next_heartbeat().await;

    let (code, _) = server.expect_close().await;
    assert_eq!(code, 1001);
    assert_eq!(start.elapsed(), Duration::from_millis(INTERVAL_MS));

    let attempt = client
        .wait_for(|e| matches!(e, ClientEvent::Reconnecting { .. }))
        .await;
    assert!(matches!(attempt, ClientEvent::Reconnecting { attempt: 1 }));

    // Nothing to resume yet, so the new connection identifies.
    let mut server = gateway.accept().await;
    assert_eq!(server.handshake().await["op"], 2);
    assert_eq!(gateway.opens(), 2);

    client.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_requested_heartbeat_gets_its_own_deadline() {
    let (transport, mut gateway) = mock_gateway();
    let client = spawn_client(transport);
    let mut server = gateway.accept().await;

    server.hello_with(INTERVAL_MS);
    assert_eq!(server.next_json().await["op"], 2);
    server.next_heartbeat().await;
    server.ack();
    let start = Instant::now();

    tokio::time::advance(Duration::from_millis(600)).await;
    server.request_heartbeat();
    server.next_heartbeat().await;
    assert_eq!(start.elapsed(), Duration::from_millis(600));

    // The periodic beat still goes out on schedule instead of a close.
    match server.next_command().await {
        Some(TransportCommand::Send(text)) => assert!(text.contains("\"op\":1")),
        other => panic!("expected the periodic heartbeat, got {other:?}"),
    }
    assert_eq!(start.elapsed(), Duration::from_millis(INTERVAL_MS));

    // Acknowledged 500ms after the requested beat, inside its deadline.
    tokio::time::advance(Duration::from_millis(100)).await;
    server.ack();

    match server.next_command().await {
        Some(TransportCommand::Send(text)) => assert!(text.contains("\"op\":1")),
        other => panic!("expected the next heartbeat, got {other:?}"),
    }
    assert_eq!(start.elapsed(), Duration::from_millis(2 * INTERVAL_MS));

    let (_, result, events) = client.stop().await;
    assert!(result.is_ok());
    assert_eq!(gateway.opens(), 1);
    assert_eq!(
        count(&events, |e| matches!(e, ClientEvent::Disconnected { code: 1001, .. })),
        0
    );
}

#[tokio::test(start_paused = true)]
async fn test_late_ack_after_reconnect_is_harmless() {
    let (transport, mut gateway) = mock_gateway();
    let client = spawn_client(transport);
    let mut first = gateway.accept().await;

    first.hello_with(INTERVAL_MS);
    first.expect_close().await;

    let mut second = gateway.accept().await;
    first.ack();
    second.hello_with(INTERVAL_MS);
    assert_eq!(second.next_payload().await["op"], 2);
    second.next_heartbeat().await;
    second.ack();

    let (_, result, _) = client.stop().await;
    assert!(result.is_ok());
    assert_eq!(gateway.opens(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_latency_is_reported() {
    let (transport, mut gateway) = mock_gateway();
    let mut client = spawn_client(transport);
    let mut server = gateway.accept().await;

    server.hello_with(INTERVAL_MS);
    server.next_heartbeat().await;
    tokio::time::advance(Duration::from_millis(120)).await;
    server.ack();

    let event = client
        .wait_for(|e| matches!(e, ClientEvent::HeartbeatAck { .. }))
        .await;
    match event {
        ClientEvent::HeartbeatAck { latency } => {
            assert_eq!(latency, Duration::from_millis(120))
        }
        other => panic!("unexpected event {other:?}"),
    }

    client.stop().await;
}

//! Readiness after initial guild synchronization.

use serde_json::json;

use gateway_client::domain::value_objects::Snowflake;
use gateway_client::gateway::ClientEvent;

use crate::common::*;

/// Collect events up to and including the first one matching `last`.
async fn collect_until<F>(client: &mut RunningClient, last: F) -> Vec<ClientEvent>
where
    F: Fn(&ClientEvent) -> bool,
{
    let mut seen = Vec::new();
    loop {
        let event = client.wait_for(|_| true).await;
        let done = last(&event);
        seen.push(event);
        if done {
            return seen;
        }
    }
}

fn is_dispatch(event: &ClientEvent, expected: &str) -> bool {
    matches!(event, ClientEvent::Dispatch { name, .. } if name == expected)
}

#[tokio::test(start_paused = true)]
async fn test_ready_without_guilds_signals_immediately() {
    let (transport, mut gateway) = mock_gateway();
    let mut client = spawn_client(transport);
    let mut server = gateway.accept().await;

    server.handshake().await;
    server.ready(1, "session-1", json!([]));

    let ready = client
        .wait_for(|e| matches!(e, ClientEvent::Ready { .. }))
        .await;
    match ready {
        ClientEvent::Ready {
            session_id,
            user_id,
            guilds,
        } => {
            assert_eq!(session_id, "session-1");
            assert_eq!(user_id, Some(Snowflake::new(42)));
            assert_eq!(guilds, 0);
        }
        other => panic!("unexpected event {other:?}"),
    }

    let (client, _, _) = client.stop().await;
    assert!(client.session().is_ready());
}

#[tokio::test(start_paused = true)]
async fn test_ready_waits_for_every_unavailable_guild() {
    let (transport, mut gateway) = mock_gateway();
    let mut client = spawn_client(transport);
    let mut server = gateway.accept().await;

    server.handshake().await;
    server.ready(
        1,
        "session-1",
        json!([{"id": "1", "unavailable": true}, {"id": "2", "unavailable": true}]),
    );
    server.dispatch(2, "GUILD_CREATE", json!({"id": "1", "name": "A"}));
    server.dispatch(3, "GUILD_CREATE", json!({"id": "2", "name": "B"}));

    let seen = collect_until(&mut client, |e| matches!(e, ClientEvent::Ready { .. })).await;
    let dispatches: Vec<_> = seen
        .iter()
        .filter_map(|e| match e {
            ClientEvent::Dispatch { name, data } => Some((name.as_str(), data["id"].clone())),
            _ => None,
        })
        .collect();

    assert_eq!(
        dispatches,
        vec![
            ("READY", serde_json::Value::Null),
            ("GUILD_CREATE", json!("1")),
            ("GUILD_CREATE", json!("2")),
        ]
    );
    assert!(matches!(seen.last(), Some(ClientEvent::Ready { guilds: 2, .. })));

    // A later guild never re-signals readiness.
    server.dispatch(4, "GUILD_CREATE", json!({"id": "3", "unavailable": true}));
    server.dispatch(5, "TYPING_START", json!({}));
    let rest = collect_until(&mut client, |e| is_dispatch(e, "TYPING_START")).await;
    assert_eq!(count(&rest, |e| matches!(e, ClientEvent::Ready { .. })), 0);

    let (client, _, _) = client.stop().await;
    assert_eq!(client.session().guilds().len(), 3);
    assert!(client.session().is_ready());
}

#[tokio::test(start_paused = true)]
async fn test_guild_create_before_ready_does_not_signal() {
    let (transport, mut gateway) = mock_gateway();
    let mut client = spawn_client(transport);
    let mut server = gateway.accept().await;

    server.handshake().await;
    server.dispatch(1, "GUILD_CREATE", json!({"id": "1"}));
    server.dispatch(2, "TYPING_START", json!({}));

    let early = collect_until(&mut client, |e| is_dispatch(e, "TYPING_START")).await;
    assert_eq!(count(&early, |e| matches!(e, ClientEvent::Ready { .. })), 0);

    server.ready(3, "session-1", json!([{"id": "1", "unavailable": false}]));
    client
        .wait_for(|e| matches!(e, ClientEvent::Ready { guilds: 1, .. }))
        .await;

    client.stop().await;
}

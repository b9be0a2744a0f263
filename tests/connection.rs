//! End-to-end tests against an in-process mock playback server.
//!
//! Each test binds a real listener, accepts the client's WebSocket, and
//! plays the server side of the protocol by hand.

use std::time::Duration;

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};

use musicbox_remote::{
    Client, ClientMessage, Command, Connection, ConnectionState, Error, Event,
};

const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// Mock server plumbing
// ============================================================================

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let url = format!("ws://{}", listener.local_addr().expect("local addr"));
    (listener, url)
}

async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = timeout(WAIT, listener.accept())
        .await
        .expect("client should connect")
        .expect("accept");
    accept_async(stream).await.expect("websocket upgrade")
}

async fn next_text(server: &mut WebSocketStream<TcpStream>) -> String {
    loop {
        match timeout(WAIT, server.next()).await.expect("frame should arrive") {
            Some(Ok(Message::Text(text))) => return text.to_string(),
            Some(Ok(_)) => continue,
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

async fn send_json(server: &mut WebSocketStream<TcpStream>, frame: Value) {
    server
        .send(Message::Text(frame.to_string().into()))
        .await
        .expect("send frame");
}

// ============================================================================
// Request/response correlation
// ============================================================================

#[tokio::test]
async fn state_request_resolves_typed_app_state() -> Result<()> {
    let (listener, url) = bind().await;
    let client = Client::connect(&url)?;
    let mut server = accept(&listener).await;

    let fetch = tokio::spawn({
        let client = client.clone();
        async move { client.app_state().await }
    });

    let frame: Value = serde_json::from_str(&next_text(&mut server).await)?;
    assert_eq!(frame["type"], "Request");
    assert_eq!(frame["path"], "state");
    assert_eq!(frame["id"], 0);

    send_json(
        &mut server,
        json!({
            "type": "Response",
            "id": frame["id"],
            "response": {"storedPlaylists": {}, "playlist": [], "volume": 50}
        }),
    )
    .await;

    let state = timeout(WAIT, fetch).await??.expect("state resolves");
    assert!(state.stored_playlists.is_empty());
    assert!(state.playlist.is_empty());
    assert_eq!(state.play_state, None);
    assert_eq!(state.volume, 50.0);
    Ok(())
}

#[tokio::test]
async fn correlation_ids_increase_across_requests() -> Result<()> {
    let (listener, url) = bind().await;
    let connection = Connection::connect(&url)?;
    let mut server = accept(&listener).await;

    for expected_id in 0..3u64 {
        let request = tokio::spawn({
            let connection = connection.clone();
            async move { connection.request("state", None).await }
        });

        let frame: Value = serde_json::from_str(&next_text(&mut server).await)?;
        assert_eq!(frame["id"], expected_id);

        send_json(
            &mut server,
            json!({"type": "Response", "id": expected_id, "response": {}}),
        )
        .await;
        timeout(WAIT, request).await??.expect("request resolves");
    }
    Ok(())
}

#[tokio::test]
async fn responses_settle_callers_out_of_order() -> Result<()> {
    let (listener, url) = bind().await;
    let connection = Connection::connect(&url)?;
    let mut server = accept(&listener).await;

    let first = tokio::spawn({
        let connection = connection.clone();
        async move { connection.request("state", None).await }
    });
    let first_frame: Value = serde_json::from_str(&next_text(&mut server).await)?;

    let second = tokio::spawn({
        let connection = connection.clone();
        async move { connection.request("state", None).await }
    });
    let second_frame: Value = serde_json::from_str(&next_text(&mut server).await)?;

    // Reply to the second request first.
    send_json(
        &mut server,
        json!({"type": "Response", "id": second_frame["id"], "response": {"order": "second"}}),
    )
    .await;
    let second_payload = timeout(WAIT, second).await??.expect("second resolves");
    assert_eq!(second_payload["order"], "second");

    send_json(
        &mut server,
        json!({"type": "Response", "id": first_frame["id"], "response": {"order": "first"}}),
    )
    .await;
    let first_payload = timeout(WAIT, first).await??.expect("first resolves");
    assert_eq!(first_payload["order"], "first");
    Ok(())
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test]
async fn pushed_event_reaches_subscriber_without_touching_requests() -> Result<()> {
    let (listener, url) = bind().await;
    let client = Client::connect(&url)?;
    let mut events = client.events();
    let mut server = accept(&listener).await;

    send_json(
        &mut server,
        json!({"type": "Event", "event": {"type": "PlaybackPosition", "duration": 120}}),
    )
    .await;

    let event = timeout(WAIT, events.recv()).await?.expect("event delivered");
    assert_eq!(event, Event::PlaybackPosition { duration: 120.0 });
    assert_eq!(client.connection().pending_count(), 0);
    Ok(())
}

#[tokio::test]
async fn events_fan_out_to_every_subscriber() -> Result<()> {
    let (listener, url) = bind().await;
    let client = Client::connect(&url)?;
    let mut first = client.events();
    let mut second = client.events();
    let mut server = accept(&listener).await;

    send_json(
        &mut server,
        json!({"type": "Event", "event": {"type": "PlaybackStarted"}}),
    )
    .await;

    let from_first = timeout(WAIT, first.recv()).await?.expect("first subscriber");
    let from_second = timeout(WAIT, second.recv()).await?.expect("second subscriber");
    assert_eq!(from_first, Event::PlaybackStarted);
    assert_eq!(from_second, Event::PlaybackStarted);
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

#[tokio::test]
async fn command_round_trips_structurally() -> Result<()> {
    let (listener, url) = bind().await;
    let client = Client::connect(&url)?;
    let mut server = accept(&listener).await;

    client.start_playlist("morning", true)?;

    let frame = next_text(&mut server).await;
    let decoded: ClientMessage = serde_json::from_str(&frame)?;
    assert_eq!(
        decoded,
        ClientMessage::Command {
            command: Command::StartPlaylist {
                name: "morning".to_string(),
                force: true,
            }
        }
    );
    Ok(())
}

#[tokio::test]
async fn commands_carry_no_correlation_id() -> Result<()> {
    let (listener, url) = bind().await;
    let client = Client::connect(&url)?;
    let mut server = accept(&listener).await;

    client.play_pause()?;

    let frame: Value = serde_json::from_str(&next_text(&mut server).await)?;
    assert_eq!(frame["type"], "Command");
    assert!(frame.get("id").is_none());
    assert_eq!(client.connection().pending_count(), 0);
    Ok(())
}

// ============================================================================
// Resilience
// ============================================================================

#[tokio::test]
async fn unmatched_response_id_is_harmless() -> Result<()> {
    let (listener, url) = bind().await;
    let connection = Connection::connect(&url)?;
    let mut server = accept(&listener).await;

    send_json(
        &mut server,
        json!({"type": "Response", "id": 99, "response": {}}),
    )
    .await;

    // The channel still works afterwards.
    let request = tokio::spawn({
        let connection = connection.clone();
        async move { connection.request("state", None).await }
    });
    let frame: Value = serde_json::from_str(&next_text(&mut server).await)?;
    send_json(
        &mut server,
        json!({"type": "Response", "id": frame["id"], "response": {"ok": true}}),
    )
    .await;

    let payload = timeout(WAIT, request).await??.expect("request resolves");
    assert_eq!(payload["ok"], true);
    Ok(())
}

#[tokio::test]
async fn unknown_envelope_tag_keeps_connection_open() -> Result<()> {
    let (listener, url) = bind().await;
    let connection = Connection::connect(&url)?;
    let mut server = accept(&listener).await;

    send_json(&mut server, json!({"type": "Broadcast", "data": {}})).await;

    let request = tokio::spawn({
        let connection = connection.clone();
        async move { connection.request("state", None).await }
    });
    let frame: Value = serde_json::from_str(&next_text(&mut server).await)?;
    send_json(
        &mut server,
        json!({"type": "Response", "id": frame["id"], "response": {}}),
    )
    .await;

    timeout(WAIT, request).await??.expect("request resolves");
    Ok(())
}

#[tokio::test]
async fn pending_request_rejected_before_replacement_socket_sends() -> Result<()> {
    let (listener, url) = bind().await;
    let connection = Connection::connect(&url)?;
    let mut server = accept(&listener).await;

    let pending = tokio::spawn({
        let connection = connection.clone();
        async move { connection.request("state", None).await }
    });

    // The request is on the wire; kill the socket without replying.
    let frame: Value = serde_json::from_str(&next_text(&mut server).await)?;
    assert_eq!(frame["id"], 0);
    drop(server);

    let result = timeout(WAIT, pending).await??;
    assert!(matches!(result, Err(Error::ConnectionClosed)));

    // The client reconnects; the rejected id never reappears and new
    // requests use fresh ids.
    let mut replacement = accept(&listener).await;
    assert_eq!(connection.pending_count(), 0);

    let retry = tokio::spawn({
        let connection = connection.clone();
        async move { connection.request("state", None).await }
    });
    let frame: Value = serde_json::from_str(&next_text(&mut replacement).await)?;
    assert_eq!(frame["id"], 1);

    send_json(
        &mut replacement,
        json!({"type": "Response", "id": 1, "response": {}}),
    )
    .await;
    timeout(WAIT, retry).await??.expect("retry resolves");
    Ok(())
}

#[tokio::test]
async fn connection_reports_lifecycle_states() -> Result<()> {
    let (listener, url) = bind().await;
    let connection = Connection::connect(&url)?;
    assert_eq!(connection.state(), ConnectionState::Connecting);

    let server = accept(&listener).await;
    timeout(WAIT, connection.wait_until_open()).await??;
    assert_eq!(connection.state(), ConnectionState::Open);

    drop(server);
    let _replacement = accept(&listener).await;
    timeout(WAIT, connection.wait_until_open()).await??;
    assert_eq!(connection.state(), ConnectionState::Open);
    Ok(())
}

#[tokio::test]
async fn shutdown_settles_future_requests_immediately() -> Result<()> {
    let (listener, url) = bind().await;
    let connection = Connection::connect(&url)?;
    let _server = accept(&listener).await;
    timeout(WAIT, connection.wait_until_open()).await??;

    connection.shutdown();

    // Commands and the shutdown share one ordered queue, so anything
    // issued afterwards settles with a rejection instead of hanging.
    let result = timeout(WAIT, connection.request("state", None)).await?;
    assert!(matches!(result, Err(Error::ConnectionClosed)));
    Ok(())
}

//! Integration tests for the full server: handshake auth, event relay,
//! and subscription teardown over real WebSockets.

use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::{SinkExt, StreamExt};
use plaza::prelude::*;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Test video provider
// =========================================================================

struct StaticVideo;

impl VideoTokenSource for StaticVideo {
    fn mint<'a>(
        &'a self,
        town: &'a TownId,
        player: &'a PlayerId,
    ) -> BoxFuture<'a, Result<String, SessionError>> {
        Box::pin(async move { Ok(format!("video-{town}-{player}")) })
    }
}

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port; returns its service handle and addr.
async fn start_server() -> (TownsService, String) {
    let server = PlazaServer::builder()
        .bind("127.0.0.1:0")
        .build(StaticVideo)
        .await
        .expect("server should build");

    let service = server.service();
    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    (service, addr)
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

fn encode(event: &ClientEvent) -> Message {
    let bytes = serde_json::to_vec(event).expect("encode");
    Message::Binary(bytes.into())
}

/// Receives the next server event, failing the test after two seconds.
async fn recv_event(ws: &mut ClientWs) -> ServerEvent {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for event")
        .expect("stream ended unexpectedly")
        .expect("websocket error");
    serde_json::from_slice(&msg.into_data()).expect("decode server event")
}

/// Sends the subscribe handshake and returns the server's first reply.
async fn subscribe(ws: &mut ClientWs, town_id: &TownId, session_token: &str) -> ServerEvent {
    ws.send(encode(&ClientEvent::Subscribe {
        town_id: town_id.clone(),
        session_token: session_token.into(),
    }))
    .await
    .expect("send subscribe");
    recv_event(ws).await
}

/// Creates a town and joins one player; returns (townId, join response).
async fn town_with_player(
    service: &TownsService,
    user_name: &str,
) -> (TownId, TownJoinResponse) {
    let created = service.create_town("Socket Town", true).await;
    let joined = service
        .join_town(&created.town_id, user_name)
        .await
        .expect("join should succeed");
    (created.town_id, joined)
}

// =========================================================================
// Handshake
// =========================================================================

#[tokio::test]
async fn test_subscribe_unknown_town_rejected() {
    let (_service, addr) = start_server().await;
    let mut ws = connect(&addr).await;

    let reply = subscribe(&mut ws, &TownId::new("no-such-town"), "token").await;

    assert_eq!(reply, ServerEvent::Disconnect { reason: true });
}

#[tokio::test]
async fn test_subscribe_bad_session_token_rejected() {
    let (service, addr) = start_server().await;
    let (town_id, _joined) = town_with_player(&service, "ada").await;
    let mut ws = connect(&addr).await;

    let reply = subscribe(&mut ws, &town_id, "forged-token").await;

    assert_eq!(reply, ServerEvent::Disconnect { reason: true });
}

#[tokio::test]
async fn test_subscribe_non_subscribe_first_event_rejected() {
    let (_service, addr) = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(encode(&ClientEvent::PlayerMovement {
        location: UserLocation::default(),
    }))
    .await
    .expect("send");

    assert_eq!(
        recv_event(&mut ws).await,
        ServerEvent::Disconnect { reason: true }
    );
}

#[tokio::test]
async fn test_subscribe_valid_credentials_acked() {
    let (service, addr) = start_server().await;
    let (town_id, joined) = town_with_player(&service, "ada").await;
    let mut ws = connect(&addr).await;

    let reply = subscribe(&mut ws, &town_id, &joined.session_token).await;

    match reply {
        ServerEvent::SubscribeAck { player } => {
            assert_eq!(player.id, joined.user_id);
            assert_eq!(player.user_name, "ada");
        }
        other => panic!("expected SubscribeAck, got {other:?}"),
    }
}

// =========================================================================
// Event relay
// =========================================================================

#[tokio::test]
async fn test_join_broadcast_to_subscribers() {
    let (service, addr) = start_server().await;
    let (town_id, ada) = town_with_player(&service, "ada").await;

    let mut ws = connect(&addr).await;
    subscribe(&mut ws, &town_id, &ada.session_token).await;

    let grace = service.join_town(&town_id, "grace").await.unwrap();

    match recv_event(&mut ws).await {
        ServerEvent::NewPlayer { player } => {
            assert_eq!(player.id, grace.user_id);
            assert_eq!(player.user_name, "grace");
        }
        other => panic!("expected NewPlayer, got {other:?}"),
    }
}

#[tokio::test]
async fn test_movement_relayed_to_other_subscriber() {
    let (service, addr) = start_server().await;
    let (town_id, ada) = town_with_player(&service, "ada").await;

    let mut ada_ws = connect(&addr).await;
    subscribe(&mut ada_ws, &town_id, &ada.session_token).await;

    let grace = service.join_town(&town_id, "grace").await.unwrap();
    let mut grace_ws = connect(&addr).await;
    subscribe(&mut grace_ws, &town_id, &grace.session_token).await;

    // Ada first sees grace join, then her movement.
    assert!(matches!(
        recv_event(&mut ada_ws).await,
        ServerEvent::NewPlayer { .. }
    ));

    grace_ws
        .send(encode(&ClientEvent::PlayerMovement {
            location: UserLocation::at(5.0, 7.0),
        }))
        .await
        .expect("send movement");

    match recv_event(&mut ada_ws).await {
        ServerEvent::PlayerMoved { player } => {
            assert_eq!(player.id, grace.user_id);
            assert_eq!(player.location.x, 5.0);
            assert_eq!(player.location.y, 7.0);
        }
        other => panic!("expected PlayerMoved, got {other:?}"),
    }
}

#[tokio::test]
async fn test_conversation_area_events_relayed() {
    let (service, addr) = start_server().await;
    let (town_id, ada) = town_with_player(&service, "ada").await;

    let mut ws = connect(&addr).await;
    subscribe(&mut ws, &town_id, &ada.session_token).await;

    let accepted = service
        .create_conversation_area(
            &town_id,
            ConversationAreaInfo {
                label: "fountain".into(),
                topic: "weather".into(),
                bounding_box: BoundingBox::new(40.0, 40.0, 6.0, 6.0),
                occupants_by_id: vec![],
            },
        )
        .await;
    assert!(accepted);

    match recv_event(&mut ws).await {
        ServerEvent::ConversationUpdated { area } => {
            assert_eq!(area.label, "fountain");
            assert_eq!(area.topic, "weather");
        }
        other => panic!("expected ConversationUpdated, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rejected_area_emits_no_event() {
    let (service, addr) = start_server().await;
    let (town_id, ada) = town_with_player(&service, "ada").await;

    let mut ws = connect(&addr).await;
    subscribe(&mut ws, &town_id, &ada.session_token).await;

    let accepted = service
        .create_conversation_area(
            &town_id,
            ConversationAreaInfo {
                label: "pending".into(),
                topic: NO_TOPIC.into(),
                bounding_box: BoundingBox::new(40.0, 40.0, 6.0, 6.0),
                occupants_by_id: vec![],
            },
        )
        .await;
    assert!(!accepted);

    // Nothing should arrive; verify with a short quiet window.
    let quiet = tokio::time::timeout(Duration::from_millis(200), ws.next()).await;
    assert!(quiet.is_err(), "no event expected, got {quiet:?}");
}

// =========================================================================
// Teardown
// =========================================================================

#[tokio::test]
async fn test_socket_close_destroys_session_and_notifies() {
    let (service, addr) = start_server().await;
    let (town_id, ada) = town_with_player(&service, "ada").await;

    let mut ada_ws = connect(&addr).await;
    subscribe(&mut ada_ws, &town_id, &ada.session_token).await;

    let grace = service.join_town(&town_id, "grace").await.unwrap();
    let mut grace_ws = connect(&addr).await;
    subscribe(&mut grace_ws, &town_id, &grace.session_token).await;
    assert!(matches!(
        recv_event(&mut ada_ws).await,
        ServerEvent::NewPlayer { .. }
    ));

    grace_ws.close(None).await.expect("close");

    match recv_event(&mut ada_ws).await {
        ServerEvent::PlayerDisconnect { player } => {
            assert_eq!(player.id, grace.user_id);
        }
        other => panic!("expected PlayerDisconnect, got {other:?}"),
    }

    // The session died with the socket: its token no longer subscribes.
    let mut retry_ws = connect(&addr).await;
    let reply = subscribe(&mut retry_ws, &town_id, &grace.session_token).await;
    assert_eq!(reply, ServerEvent::Disconnect { reason: true });
}

#[tokio::test]
async fn test_client_disconnect_event_tears_down() {
    let (service, addr) = start_server().await;
    let (town_id, ada) = town_with_player(&service, "ada").await;

    let mut ws = connect(&addr).await;
    subscribe(&mut ws, &town_id, &ada.session_token).await;

    ws.send(encode(&ClientEvent::Disconnect))
        .await
        .expect("send disconnect");
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut retry_ws = connect(&addr).await;
    let reply = subscribe(&mut retry_ws, &town_id, &ada.session_token).await;
    assert_eq!(reply, ServerEvent::Disconnect { reason: true });
}

#[tokio::test]
async fn test_delete_town_sends_town_closing_and_closes_socket() {
    let (service, addr) = start_server().await;
    let created = service.create_town("Doomed", true).await;
    let joined = service.join_town(&created.town_id, "ada").await.unwrap();

    let mut ws = connect(&addr).await;
    subscribe(&mut ws, &created.town_id, &joined.session_token).await;

    assert!(
        service
            .delete_town(&created.town_id, &created.town_update_password)
            .await
    );

    assert_eq!(recv_event(&mut ws).await, ServerEvent::TownClosing);

    // After townClosing the server closes the socket.
    let next = tokio::time::timeout(Duration::from_secs(2), ws.next()).await;
    match next {
        Ok(Some(Ok(Message::Close(_)))) | Ok(None) => {}
        Ok(Some(Err(_))) => {}
        other => panic!("expected close, got {other:?}"),
    }
}

// =========================================================================
// Request surface
// =========================================================================

#[tokio::test]
async fn test_join_response_carries_video_token_and_roster() {
    let (service, _addr) = start_server().await;
    let created = service.create_town("Roster", true).await;

    let ada = service.join_town(&created.town_id, "ada").await.unwrap();
    let grace = service.join_town(&created.town_id, "grace").await.unwrap();

    let expected = format!("video-{}-{}", created.town_id, grace.user_id);
    assert_eq!(grace.video_token, expected);
    assert_eq!(grace.friendly_name, "Roster");
    assert!(grace.is_publicly_listed);

    let roster: Vec<_> = grace.current_players.iter().map(|p| p.id.clone()).collect();
    assert_eq!(roster, vec![ada.user_id, grace.user_id]);
}

#[tokio::test]
async fn test_join_unknown_town_errors() {
    let (service, _addr) = start_server().await;
    let result = service.join_town(&TownId::new("missing"), "ada").await;
    assert!(matches!(result, Err(TownError::UnknownTown(_))));
}

#[tokio::test]
async fn test_listing_excludes_private_towns_and_passwords() {
    let (service, _addr) = start_server().await;
    service.create_town("Public", true).await;
    service.create_town("Private", false).await;

    let listings = service.list_towns().await;

    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].friendly_name, "Public");
    let json = serde_json::to_string(&listings[0]).unwrap();
    assert!(!json.to_lowercase().contains("password"));
}

#[tokio::test]
async fn test_update_town_renames_listing() {
    let (service, _addr) = start_server().await;
    let created = service.create_town("Before", true).await;

    let ok = service
        .update_town(
            &created.town_id,
            &created.town_update_password,
            Some("After".into()),
            None,
        )
        .await;
    assert!(ok);

    let listings = service.list_towns().await;
    assert_eq!(listings[0].friendly_name, "After");
}

//! Per-socket subscription handler: handshake, bridging listener, relay.
//!
//! Each accepted socket gets its own task running [`handle_subscription`].
//! The flow is:
//!   1. Receive `subscribe { townId, sessionToken }` (5-second deadline)
//!   2. Resolve the town, then the session; either miss rejects the socket
//!      with `disconnect { reason: true }`
//!   3. Ack, install a bridging [`TownListener`], then relay both ways
//!      until either end hangs up
//!
//! The bridge never touches the controller: it pushes events into an
//! unbounded channel that this task drains between inbound frames, so
//! listener dispatch inside the controller stays lock-free and synchronous.

use std::sync::Arc;
use std::time::Duration;

use plaza_protocol::{
    ClientEvent, ConversationAreaInfo, PlayerInfo, ServerEvent, TownId,
};
use plaza_session::PlayerSession;
use plaza_town::{TownController, TownListener};
use plaza_transport::EventSocket;
use tokio::sync::mpsc;
use tokio::sync::Mutex;

use crate::server::ServerState;
use crate::PlazaError;

/// How long a fresh socket has to present its `subscribe` handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Translates town events into outbound socket messages.
///
/// Sends are infallible fire-and-forget: when the socket task is already
/// gone the channel is closed, and the event is dropped with a debug log.
/// A failing subscriber never disturbs the other listeners.
struct SocketBridge {
    tx: mpsc::UnboundedSender<ServerEvent>,
}

impl SocketBridge {
    fn forward(&self, event: ServerEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("subscriber channel closed, dropping event");
        }
    }
}

impl TownListener for SocketBridge {
    fn on_player_joined(&self, player: &PlayerInfo) {
        self.forward(ServerEvent::NewPlayer {
            player: player.clone(),
        });
    }

    fn on_player_moved(&self, player: &PlayerInfo) {
        self.forward(ServerEvent::PlayerMoved {
            player: player.clone(),
        });
    }

    fn on_player_disconnected(&self, player: &PlayerInfo) {
        self.forward(ServerEvent::PlayerDisconnect {
            player: player.clone(),
        });
    }

    fn on_conversation_area_updated(&self, area: &ConversationAreaInfo) {
        self.forward(ServerEvent::ConversationUpdated { area: area.clone() });
    }

    fn on_conversation_area_destroyed(&self, area: &ConversationAreaInfo) {
        self.forward(ServerEvent::ConversationDestroyed { area: area.clone() });
    }

    fn on_town_destroyed(&self) {
        self.forward(ServerEvent::TownClosing);
    }
}

/// Handles one socket from accept to teardown.
pub(crate) async fn handle_subscription(
    socket: EventSocket,
    state: Arc<ServerState>,
) -> Result<(), PlazaError> {
    let socket_id = socket.id();

    // --- Step 1: handshake ---
    let (town_id, session_token) = match receive_handshake(&socket).await {
        Some(credentials) => credentials,
        None => {
            reject(&socket).await;
            return Ok(());
        }
    };

    // --- Step 2: authenticate against the store, then the controller ---
    let Some(controller) = state.store.lock().await.town(&town_id) else {
        tracing::info!(%socket_id, %town_id, "subscription rejected: unknown town");
        reject(&socket).await;
        return Ok(());
    };

    let (session, player) = {
        let town = controller.lock().await;
        let Some(session) = town.session_by_token(&session_token).cloned() else {
            drop(town);
            tracing::info!(%socket_id, %town_id, "subscription rejected: unknown session");
            reject(&socket).await;
            return Ok(());
        };
        let player = town
            .player(session.player_id())
            .map(PlayerInfo::from)
            .ok_or(plaza_town::TownError::InvalidSessionToken)?;
        (session, player)
    };

    tracing::info!(
        %socket_id,
        %town_id,
        player_id = %player.id,
        "subscription accepted"
    );

    // --- Step 3: install the bridge, ack, then relay ---
    // The bridge goes in before the ack so an event fired the instant the
    // client sees the ack is already being captured.
    let (tx, mut rx) = mpsc::unbounded_channel();
    let bridge: Arc<dyn TownListener> = Arc::new(SocketBridge { tx });
    controller.lock().await.add_town_listener(bridge.clone());

    if socket
        .send(&ServerEvent::SubscribeAck { player })
        .await
        .is_ok()
    {
        relay(&socket, &controller, &session, &mut rx).await;
    }

    // --- Teardown (idempotent on both controller ops) ---
    {
        let mut town = controller.lock().await;
        town.remove_town_listener(&bridge);
        town.destroy_session(session.session_token());
    }
    let _ = socket.close().await;
    tracing::info!(%socket_id, %town_id, "subscription closed");
    Ok(())
}

/// Waits for the opening `subscribe` event. Returns `None` on timeout, a
/// different first event, or a closed/broken socket.
async fn receive_handshake(socket: &EventSocket) -> Option<(TownId, String)> {
    let first = tokio::time::timeout(HANDSHAKE_TIMEOUT, socket.recv()).await;
    match first {
        Ok(Ok(Some(ClientEvent::Subscribe {
            town_id,
            session_token,
        }))) => Some((town_id, session_token)),
        Ok(Ok(Some(_))) => {
            tracing::debug!(id = %socket.id(), "first event was not subscribe");
            None
        }
        Ok(Ok(None)) | Ok(Err(_)) => None,
        Err(_) => {
            tracing::debug!(id = %socket.id(), "handshake timed out");
            None
        }
    }
}

/// Pumps events both ways until either side disconnects.
async fn relay(
    socket: &EventSocket,
    controller: &Arc<Mutex<TownController>>,
    session: &PlayerSession,
    rx: &mut mpsc::UnboundedReceiver<ServerEvent>,
) {
    loop {
        tokio::select! {
            outbound = rx.recv() => {
                match outbound {
                    Some(ServerEvent::TownClosing) => {
                        // Forward the closing notice, then drop the socket.
                        let _ = socket.send(&ServerEvent::TownClosing).await;
                        break;
                    }
                    Some(event) => {
                        if socket.send(&event).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Ok(Some(ClientEvent::PlayerMovement { location })) => {
                        controller
                            .lock()
                            .await
                            .update_player_location(session.player_id(), location);
                    }
                    Ok(Some(ClientEvent::Subscribe { .. })) => {
                        tracing::debug!(id = %socket.id(), "ignoring repeated subscribe");
                    }
                    Ok(Some(ClientEvent::Disconnect)) | Ok(None) => break,
                    Err(e) => {
                        tracing::debug!(id = %socket.id(), error = %e, "recv error");
                        break;
                    }
                }
            }
        }
    }
}

/// Rejects a socket: `disconnect { reason: true }`, then close.
async fn reject(socket: &EventSocket) {
    let _ = socket.send(&ServerEvent::Disconnect { reason: true }).await;
    let _ = socket.close().await;
}

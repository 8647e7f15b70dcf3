//! WebSocket transport carrying typed town events.
//!
//! Unlike a raw byte transport, sockets here speak the protocol crate's
//! event enums directly: [`EventSocket::send`] takes a [`ServerEvent`] and
//! [`EventSocket::recv`] yields [`ClientEvent`]s, with the JSON codec
//! applied at the boundary. The stream is split into independent halves so
//! one task can `tokio::select!` over inbound frames and an outbound event
//! queue without the two directions blocking each other.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use plaza_protocol::{ClientEvent, Codec, JsonCodec, ServerEvent};

use crate::TransportError;

/// Counter for generating unique socket IDs.
static NEXT_SOCKET_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = WebSocketStream<TcpStream>;

/// Opaque identifier for one accepted socket, for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketId(u64);

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sock-{}", self.0)
    }
}

/// Listens for incoming WebSocket connections.
pub struct WsListener {
    listener: TcpListener,
}

impl WsListener {
    /// Binds to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener })
    }

    /// The locally bound address (useful with port 0).
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Waits for and upgrades the next incoming connection.
    pub async fn accept(&self) -> Result<EventSocket, TransportError> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let ws = tokio_tungstenite::accept_async(stream).await.map_err(|e| {
            TransportError::AcceptFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                e,
            ))
        })?;

        let id = SocketId(NEXT_SOCKET_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %peer, "accepted WebSocket connection");

        let (sink, stream) = ws.split();
        Ok(EventSocket {
            id,
            codec: JsonCodec,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        })
    }
}

/// One accepted client connection, speaking typed events.
pub struct EventSocket {
    id: SocketId,
    codec: JsonCodec,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl EventSocket {
    /// This socket's identifier.
    pub fn id(&self) -> SocketId {
        self.id
    }

    /// Encodes and sends one server event.
    pub async fn send(&self, event: &ServerEvent) -> Result<(), TransportError> {
        let bytes = self.codec.encode(event)?;
        self.sink
            .lock()
            .await
            .send(Message::Binary(bytes.into()))
            .await
            .map_err(|e| {
                TransportError::SendFailed(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    e,
                ))
            })
    }

    /// Receives the next client event.
    ///
    /// Returns `Ok(None)` when the peer closed cleanly. Frames that fail
    /// to decode are logged and skipped rather than killing the
    /// connection; ping/pong housekeeping frames are skipped silently.
    pub async fn recv(&self) -> Result<Option<ClientEvent>, TransportError> {
        loop {
            let msg = self.stream.lock().await.next().await;
            let data: Vec<u8> = match msg {
                Some(Ok(Message::Binary(data))) => data.into(),
                Some(Ok(Message::Text(text))) => text.as_bytes().to_vec(),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            };
            match self.codec.decode(&data) {
                Ok(event) => return Ok(Some(event)),
                Err(e) => {
                    tracing::debug!(id = %self.id, error = %e, "skipping undecodable frame");
                }
            }
        }
    }

    /// Closes the connection.
    pub async fn close(&self) -> Result<(), TransportError> {
        self.sink.lock().await.close().await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }
}

//! WebSocket transport for plaza.
//!
//! [`WsListener`] accepts connections; each accepted [`EventSocket`]
//! exchanges the protocol crate's typed events (JSON on the wire). The
//! subscription layer above never touches raw frames.

mod error;
mod websocket;

pub use error::TransportError;
pub use websocket::{EventSocket, SocketId, WsListener};

//! Error types for the transport layer.

use plaza_protocol::ProtocolError;

/// Errors that can occur on the WebSocket transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// Sending a frame failed; the peer is gone.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving a frame failed mid-stream.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Encoding an outbound event failed.
    #[error(transparent)]
    Codec(#[from] ProtocolError),
}

//! Unified error type for the plaza server.

use plaza_protocol::ProtocolError;
use plaza_session::SessionError;
use plaza_town::TownError;
use plaza_transport::TransportError;

/// Top-level error that wraps all layer-specific errors.
///
/// The `#[from]` attributes let `?` convert layer errors automatically,
/// so the server and handler code deals with one type.
#[derive(Debug, thiserror::Error)]
pub enum PlazaError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (video token mint).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A town-level error (unknown town, invalid session token).
    #[error(transparent)]
    Town(#[from] TownError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use plaza_protocol::TownId;

    #[test]
    fn test_from_town_error() {
        let err: PlazaError = TownError::UnknownTown(TownId::new("t1")).into();
        assert!(matches!(err, PlazaError::Town(_)));
        assert!(err.to_string().contains("t1"));
    }

    #[test]
    fn test_from_session_error() {
        let err: PlazaError = SessionError::TokenMint("down".into()).into();
        assert!(matches!(err, PlazaError::Session(_)));
        assert!(err.to_string().contains("down"));
    }
}

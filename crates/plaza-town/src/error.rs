//! Error types for the town layer.

use plaza_protocol::TownId;
use plaza_session::SessionError;

/// Errors that can occur during town operations.
///
/// Deliberately small: area admission and password-gated store mutations
/// report rejection as `false` returns (no state changed, nothing to
/// propagate), so only genuine failures become errors.
#[derive(Debug, thiserror::Error)]
pub enum TownError {
    /// No town with this id exists.
    #[error("town {0} not found")]
    UnknownTown(TownId),

    /// The session token did not match any live session in the town.
    #[error("invalid session token")]
    InvalidSessionToken,

    /// The session layer failed, i.e. the video token mint.
    #[error(transparent)]
    Session(#[from] SessionError),
}

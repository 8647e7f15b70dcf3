//! Session types: the server's record of one player's membership in a town.
//!
//! A session is minted when a player joins a town and destroyed when their
//! socket goes away (or the town does). It carries two credentials:
//!
//! - `session_token` — the secret the client presents in its socket
//!   handshake to prove it is the player it claims to be.
//! - `video_token` — a capability for the external video provider, scoped
//!   to (town, player) by the [`VideoTokenSource`](crate::VideoTokenSource)
//!   that minted it.

use plaza_protocol::PlayerId;
use rand::Rng;

/// One player's binding to one town.
///
/// The town controller owns the canonical copy; the subscription handler
/// keeps a clone so it can tear the session down when the socket closes.
#[derive(Debug, Clone)]
pub struct PlayerSession {
    /// Opaque unguessable token identifying this session.
    ///
    /// 32 lowercase hex characters (128 bits of randomness). Guessing a
    /// valid token is the only way to hijack a session, so 128 bits it is.
    session_token: String,

    /// The player this session authenticates.
    player_id: PlayerId,

    /// Capability token for the third-party video service.
    video_token: String,
}

impl PlayerSession {
    /// Creates a session with a freshly generated token.
    pub fn new(player_id: PlayerId, video_token: impl Into<String>) -> Self {
        Self {
            session_token: generate_token(),
            player_id,
            video_token: video_token.into(),
        }
    }

    /// The opaque session token.
    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    /// The player this session belongs to.
    pub fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    /// The video capability token minted for this session.
    pub fn video_token(&self) -> &str {
        &self.video_token
    }
}

/// Generates a random 32-character hex string (128 bits of entropy).
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

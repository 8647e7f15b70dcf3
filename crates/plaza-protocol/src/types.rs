//! Core wire types for the plaza town protocol.
//!
//! Everything in this module either travels on the socket, is returned by
//! the HTTP-facing glue, or is handed to listeners as a snapshot. These are
//! plain data shapes: the state machine that produces them lives in
//! `plaza-town`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel topic meaning "this area has not been activated yet".
///
/// An area carrying this topic can never be installed in a town.
pub const NO_TOPIC: &str = "(No topic)";

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Opaque string newtype. IDs are generated server-side (128-bit hex) and
/// never reused. `#[serde(transparent)]` makes `PlayerId("ab12")` serialize
/// as just `"ab12"`, not `{"0": "ab12"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Wraps an existing id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for a town.
///
/// Same newtype pattern as [`PlayerId`]. Town IDs are unguessable: knowing
/// one is the first half of the credential pair used to subscribe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TownId(pub String);

impl TownId {
    /// Wraps an existing id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TownId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

/// The direction a player's avatar is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Front,
    Back,
    Left,
    Right,
}

/// A player's reported position on the town grid.
///
/// `conversation_label` is the client's claim about which conversation area
/// it is in. The server trusts the label (or its absence) over the
/// coordinates when resolving area membership; it never substitutes a
/// spatial guess for a missing label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLocation {
    pub x: f64,
    pub y: f64,
    pub rotation: Direction,
    pub moving: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_label: Option<String>,
}

impl UserLocation {
    /// A stationary location at the given coordinates, facing front.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }
}

/// The spawn point: origin, facing front, not moving, in no conversation.
impl Default for UserLocation {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: Direction::Front,
            moving: false,
            conversation_label: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Bounding boxes
// ---------------------------------------------------------------------------

/// An axis-aligned rectangle describing a conversation area's footprint.
///
/// `(x, y)` is the CENTER of the rectangle, not a corner. The area covers
/// the open rectangle `(x - w/2, x + w/2) × (y - h/2, y + h/2)`: points on
/// the boundary are outside. That convention is what lets two areas share
/// an edge without being considered overlapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Creates a bounding box centered at `(x, y)`.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    fn left(&self) -> f64 {
        self.x - self.width / 2.0
    }

    fn right(&self) -> f64 {
        self.x + self.width / 2.0
    }

    fn top(&self) -> f64 {
        self.y - self.height / 2.0
    }

    fn bottom(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Returns `true` if `(x, y)` lies strictly inside the open rectangle.
    ///
    /// Boundary points (including corners) are outside.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x > self.left() && x < self.right() && y > self.top() && y < self.bottom()
    }

    /// Returns `true` if the two open rectangles intersect.
    ///
    /// Rectangles that merely share an edge or a corner do NOT overlap.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }
}

// ---------------------------------------------------------------------------
// Snapshots carried by events
// ---------------------------------------------------------------------------

/// A snapshot of one player, as delivered to listeners and clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub user_name: String,
    pub location: UserLocation,
}

/// A snapshot of one conversation area.
///
/// `occupants_by_id` preserves enrollment order and never contains
/// duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationAreaInfo {
    pub label: String,
    pub topic: String,
    pub bounding_box: BoundingBox,
    pub occupants_by_id: Vec<PlayerId>,
}

// ---------------------------------------------------------------------------
// Socket events
// ---------------------------------------------------------------------------

/// Messages a client sends over its subscription socket.
///
/// Internally tagged: `{ "type": "playerMovement", "location": { ... } }`.
/// The first message on a fresh socket must be `subscribe`; everything else
/// is rejected until the handshake completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Handshake: authenticate this socket against a town.
    #[serde(rename_all = "camelCase")]
    Subscribe {
        town_id: TownId,
        session_token: String,
    },

    /// The player moved (or turned, or claimed a conversation area).
    PlayerMovement { location: UserLocation },

    /// Orderly goodbye. Equivalent to closing the socket.
    Disconnect,
}

/// Messages the server pushes to a subscribed client.
///
/// These are one-to-one translations of the town listener callbacks, plus
/// the two handshake outcomes (`subscribeAck` / `disconnect`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Handshake accepted; events for this town will follow.
    SubscribeAck { player: PlayerInfo },

    /// A new player joined the town.
    NewPlayer { player: PlayerInfo },

    /// A player's location changed.
    PlayerMoved { player: PlayerInfo },

    /// A player left the town.
    PlayerDisconnect { player: PlayerInfo },

    /// The town is being destroyed; the socket closes after this event.
    TownClosing,

    /// A conversation area's occupants (or existence) changed.
    ConversationUpdated { area: ConversationAreaInfo },

    /// A conversation area emptied out and was destroyed.
    ConversationDestroyed { area: ConversationAreaInfo },

    /// The server is closing this socket. `reason: true` means the
    /// subscription was rejected (bad town id or session token) or the
    /// close was server-initiated.
    Disconnect { reason: bool },
}

// ---------------------------------------------------------------------------
// HTTP-facing response shapes
// ---------------------------------------------------------------------------

/// One row in the public town listing.
///
/// Note what is absent: the update password is never part of any read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TownListing {
    pub town_id: TownId,
    pub friendly_name: String,
    pub current_occupancy: usize,
    pub maximum_occupancy: usize,
}

/// Response to a create-town request.
///
/// This is the only place the update password ever leaves the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TownCreateResponse {
    pub town_id: TownId,
    pub town_update_password: String,
}

/// Response to a join-town request: everything a client needs to open its
/// subscription socket and its video connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TownJoinResponse {
    pub user_id: PlayerId,
    pub session_token: String,
    pub video_token: String,
    pub current_players: Vec<PlayerInfo>,
    pub friendly_name: String,
    pub is_publicly_listed: bool,
}

// =========================================================================
// Tests
// =========================================================================

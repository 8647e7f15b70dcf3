//! Observer interfaces for town and area events.
//!
//! Two independent registries exist on purpose. Town listeners see global
//! traffic (joins, movement, area lifecycle); area listeners see only one
//! area's occupant list. A sidebar widget watching a single conversation
//! should not have to filter the whole town's event stream.
//!
//! Callbacks receive snapshots ([`PlayerInfo`] / [`ConversationAreaInfo`]),
//! never live references into the controller, so a listener can stash or
//! forward them without borrowing anything.
//!
//! Dispatch contract (upheld by the controller):
//! - synchronous, in registration order;
//! - the notifications prescribed by one mutating call are delivered
//!   before that call returns;
//! - the listener list is snapshotted before iteration, so a listener may
//!   remove itself (or others) while being invoked.

use plaza_protocol::{ConversationAreaInfo, PlayerId, PlayerInfo};

/// An observer subscribed to one town's event stream.
///
/// Implemented by the per-socket bridge and by test doubles. All methods
/// have empty defaults so an implementation only overrides what it needs.
pub trait TownListener: Send + Sync {
    /// A player joined the town. Fired after the player is observable.
    fn on_player_joined(&self, _player: &PlayerInfo) {}

    /// A player's location was committed.
    ///
    /// Within one movement update, any conversation-area events caused by
    /// the move are delivered before this one.
    fn on_player_moved(&self, _player: &PlayerInfo) {}

    /// A player's session was destroyed and the player removed.
    fn on_player_disconnected(&self, _player: &PlayerInfo) {}

    /// A conversation area was created or its occupants changed.
    fn on_conversation_area_updated(&self, _area: &ConversationAreaInfo) {}

    /// A conversation area emptied out and was removed.
    fn on_conversation_area_destroyed(&self, _area: &ConversationAreaInfo) {}

    /// The town itself is going away. Subscribers are expected to tear
    /// down their sockets; no further events will follow.
    fn on_town_destroyed(&self) {}
}

/// An observer subscribed to a single conversation area.
pub trait AreaListener: Send + Sync {
    /// The area's occupant list changed. `None` signals that the area was
    /// destroyed; no further notifications will arrive.
    fn on_occupants_change(&self, new_occupants: Option<&[PlayerId]>);
}

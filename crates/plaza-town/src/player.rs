//! The server-side record of one player in a town.

use plaza_protocol::{BoundingBox, PlayerId, PlayerInfo, UserLocation};

use crate::ids::random_hex;

/// One player: identity, current location, and their current conversation
/// area (by label).
///
/// The back-reference to the area is just the label; the area object
/// itself lives in the controller's registry. Holding a label instead of
/// a reference is what keeps player and area from owning each other.
#[derive(Debug, Clone)]
pub struct Player {
    id: PlayerId,
    user_name: String,
    location: UserLocation,
    active_conversation: Option<String>,
}

impl Player {
    /// Creates a player with a fresh unique id at the spawn location.
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            id: PlayerId::new(random_hex(16)),
            user_name: user_name.into(),
            location: UserLocation::default(),
            active_conversation: None,
        }
    }

    /// The player's immutable unique id.
    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    /// The player's display name.
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// The player's last committed location.
    pub fn location(&self) -> &UserLocation {
        &self.location
    }

    /// The label of the conversation area the player is in, if any.
    pub fn active_conversation(&self) -> Option<&str> {
        self.active_conversation.as_deref()
    }

    /// Returns `true` if the player's location is strictly inside `bounds`.
    pub fn is_within(&self, bounds: &BoundingBox) -> bool {
        bounds.contains(self.location.x, self.location.y)
    }

    pub(crate) fn set_location(&mut self, location: UserLocation) {
        self.location = location;
    }

    pub(crate) fn set_active_conversation(&mut self, label: Option<String>) {
        self.active_conversation = label;
    }
}

impl From<&Player> for PlayerInfo {
    fn from(player: &Player) -> Self {
        PlayerInfo {
            id: player.id.clone(),
            user_name: player.user_name.clone(),
            location: player.location.clone(),
        }
    }
}

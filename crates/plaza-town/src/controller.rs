//! The town controller: one town's authoritative state machine.
//!
//! A controller owns everything that lives inside one town (players,
//! sessions, conversation areas, listeners) and is the single
//! serialization domain for all of it. Callers wrap the controller in an
//! `Arc<tokio::sync::Mutex<_>>`; every mutating operation runs to
//! completion, including its listener notifications, before the lock is
//! released. No listener ever observes a half-applied transition.

use std::sync::Arc;

use plaza_protocol::{ConversationAreaInfo, PlayerId, PlayerInfo, TownId, UserLocation, NO_TOPIC};
use plaza_session::{PlayerSession, VideoTokenSource};

use crate::ids::random_hex;
use crate::{AreaListener, ConversationArea, Player, TownError, TownListener};

/// Default maximum occupancy reported in town listings.
const DEFAULT_CAPACITY: usize = 50;

/// Authoritative state for one town.
pub struct TownController {
    town_id: TownId,
    friendly_name: String,
    update_password: String,
    is_publicly_listed: bool,
    capacity: usize,
    players: Vec<Player>,
    sessions: Vec<PlayerSession>,
    areas: Vec<ConversationArea>,
    listeners: Vec<Arc<dyn TownListener>>,
    video: Arc<dyn VideoTokenSource>,
}

impl TownController {
    /// Creates an empty town with a fresh unguessable id and update
    /// password.
    pub fn new(
        friendly_name: impl Into<String>,
        is_publicly_listed: bool,
        video: Arc<dyn VideoTokenSource>,
    ) -> Self {
        let town_id = TownId::new(random_hex(16));
        tracing::info!(%town_id, "town created");
        Self {
            town_id,
            friendly_name: friendly_name.into(),
            update_password: random_hex(24),
            is_publicly_listed,
            capacity: DEFAULT_CAPACITY,
            players: Vec::new(),
            sessions: Vec::new(),
            areas: Vec::new(),
            listeners: Vec::new(),
            video,
        }
    }

    // -- Metadata ---------------------------------------------------------

    /// The town's unique id.
    pub fn town_id(&self) -> &TownId {
        &self.town_id
    }

    /// The town's display name.
    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    /// Renames the town.
    pub fn set_friendly_name(&mut self, name: impl Into<String>) {
        self.friendly_name = name.into();
    }

    /// Whether the town appears in public listings.
    pub fn is_publicly_listed(&self) -> bool {
        self.is_publicly_listed
    }

    /// Changes the town's listing visibility.
    pub fn set_publicly_listed(&mut self, listed: bool) {
        self.is_publicly_listed = listed;
    }

    /// The password gating update/delete operations. Never serialized.
    pub fn update_password(&self) -> &str {
        &self.update_password
    }

    /// Maximum occupancy reported in listings. Not enforced on join.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of players currently in the town.
    pub fn occupancy(&self) -> usize {
        self.players.len()
    }

    // -- Lookups ----------------------------------------------------------

    /// All players currently in the town.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Snapshots of all players, in join order.
    pub fn player_infos(&self) -> Vec<PlayerInfo> {
        self.players.iter().map(PlayerInfo::from).collect()
    }

    /// Looks up a player by id.
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id() == id)
    }

    /// All live conversation areas, in creation order.
    pub fn conversation_areas(&self) -> &[ConversationArea] {
        &self.areas
    }

    /// Looks up a live conversation area by label.
    pub fn conversation_area(&self, label: &str) -> Option<&ConversationArea> {
        self.areas.iter().find(|a| a.label() == label)
    }

    /// Resolves a session token to its session, if it is still live.
    pub fn session_by_token(&self, session_token: &str) -> Option<&PlayerSession> {
        self.sessions
            .iter()
            .find(|s| s.session_token() == session_token)
    }

    // -- Listener registries ----------------------------------------------

    /// Subscribes a listener to this town's events. Adding the same
    /// listener twice is a no-op.
    pub fn add_town_listener(&mut self, listener: Arc<dyn TownListener>) {
        if !self.listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            self.listeners.push(listener);
        }
    }

    /// Unsubscribes a listener, matching by identity. Unknown listeners
    /// are ignored.
    pub fn remove_town_listener(&mut self, listener: &Arc<dyn TownListener>) {
        self.listeners.retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// Subscribes a listener to one area's occupant changes.
    ///
    /// Returns `false` if no live area carries `label`.
    pub fn add_area_listener(&mut self, label: &str, listener: Arc<dyn AreaListener>) -> bool {
        match self.areas.iter_mut().find(|a| a.label() == label) {
            Some(area) => {
                area.add_listener(listener);
                true
            }
            None => false,
        }
    }

    /// Unsubscribes an area listener by identity.
    ///
    /// Returns `false` if no live area carries `label`.
    pub fn remove_area_listener(
        &mut self,
        label: &str,
        listener: &Arc<dyn AreaListener>,
    ) -> bool {
        match self.areas.iter_mut().find(|a| a.label() == label) {
            Some(area) => {
                area.remove_listener(listener);
                true
            }
            None => false,
        }
    }

    // -- Mutating operations ----------------------------------------------

    /// Admits a new player to the town.
    ///
    /// Mints the video token first (the only await in the controller);
    /// only after the mint succeeds are the player and session committed
    /// and `on_player_joined` fired. A failed mint leaves no trace.
    ///
    /// # Errors
    /// Propagates the token source's failure as [`TownError::Session`].
    pub async fn add_player(
        &mut self,
        user_name: impl Into<String>,
    ) -> Result<PlayerSession, TownError> {
        let player = Player::new(user_name);
        let video_token = self.video.mint(&self.town_id, player.id()).await?;
        let session = PlayerSession::new(player.id().clone(), video_token);

        let snapshot = PlayerInfo::from(&player);
        self.players.push(player);
        self.sessions.push(session.clone());
        tracing::info!(
            town_id = %self.town_id,
            player_id = %snapshot.id,
            occupancy = self.players.len(),
            "player joined"
        );

        self.notify(|l| l.on_player_joined(&snapshot));
        Ok(session)
    }

    /// Destroys a session and removes its player from the town.
    ///
    /// If the player occupied a conversation area they are evicted first,
    /// which may destroy the area. Unknown tokens are a no-op, so a
    /// second teardown after a socket race is harmless.
    pub fn destroy_session(&mut self, session_token: &str) {
        let Some(pos) = self
            .sessions
            .iter()
            .position(|s| s.session_token() == session_token)
        else {
            return;
        };
        let session = self.sessions.remove(pos);

        let Some(player_pos) = self
            .players
            .iter()
            .position(|p| p.id() == session.player_id())
        else {
            return;
        };
        let player = self.players.remove(player_pos);

        if let Some(label) = player.active_conversation() {
            let label = label.to_string();
            self.remove_player_from_area(&label, player.id());
        }

        tracing::info!(
            town_id = %self.town_id,
            player_id = %player.id(),
            occupancy = self.players.len(),
            "player disconnected"
        );
        let snapshot = PlayerInfo::from(&player);
        self.notify(|l| l.on_player_disconnected(&snapshot));
    }

    /// Applies a movement update: the central state machine.
    ///
    /// The intended conversation area is resolved purely from the
    /// location's `conversation_label`. A present label naming a live area
    /// wins regardless of coordinates; an absent, empty, or stale label
    /// means "no area". The server never substitutes a spatial guess.
    ///
    /// Any area transition (leave, join, or both) runs its occupant
    /// bookkeeping and fires its area events BEFORE the location is
    /// committed and `on_player_moved` goes out.
    ///
    /// Returns `false` (and does nothing) for an unknown player.
    pub fn update_player_location(
        &mut self,
        player_id: &PlayerId,
        location: UserLocation,
    ) -> bool {
        let Some(player_pos) = self.players.iter().position(|p| p.id() == player_id) else {
            return false;
        };

        let intended = location
            .conversation_label
            .as_deref()
            .filter(|label| !label.is_empty())
            .filter(|label| self.areas.iter().any(|a| a.label() == *label))
            .map(str::to_string);
        let current = self.players[player_pos]
            .active_conversation()
            .map(str::to_string);

        if intended != current {
            if let Some(old_label) = &current {
                self.players[player_pos].set_active_conversation(None);
                self.remove_player_from_area(old_label, player_id);
            }
            if let Some(new_label) = &intended {
                self.players[player_pos].set_active_conversation(Some(new_label.clone()));
                if let Some(area_pos) =
                    self.areas.iter().position(|a| a.label() == *new_label)
                {
                    self.areas[area_pos].add_occupant(player_id.clone());
                    let snapshot = self.areas[area_pos].to_info();
                    self.notify(|l| l.on_conversation_area_updated(&snapshot));
                    self.areas[area_pos].notify_occupants_change();
                }
            }
        }

        self.players[player_pos].set_location(location);
        let snapshot = PlayerInfo::from(&self.players[player_pos]);
        self.notify(|l| l.on_player_moved(&snapshot));
        true
    }

    /// Installs a new conversation area.
    ///
    /// Returns `false` with no state change and no events if the topic is
    /// the inactive sentinel (or empty), the label collides with a live
    /// area, or the footprint overlaps a live area (open rectangles;
    /// shared edges are fine).
    ///
    /// On success every player standing strictly inside the new footprint
    /// with no current area is enrolled, and exactly one
    /// `on_conversation_area_updated` fires, enrollments or not.
    pub fn add_conversation_area(&mut self, info: ConversationAreaInfo) -> bool {
        if info.topic.is_empty() || info.topic == NO_TOPIC {
            return false;
        }
        if self.areas.iter().any(|a| a.label() == info.label) {
            return false;
        }
        if self
            .areas
            .iter()
            .any(|a| a.bounding_box().overlaps(&info.bounding_box))
        {
            return false;
        }

        let mut area = ConversationArea::new(info.label, info.topic, info.bounding_box);
        for player in &mut self.players {
            if player.active_conversation().is_none() && player.is_within(area.bounding_box()) {
                area.add_occupant(player.id().clone());
                player.set_active_conversation(Some(area.label().to_string()));
            }
        }

        let snapshot = area.to_info();
        self.areas.push(area);
        tracing::info!(
            town_id = %self.town_id,
            label = %snapshot.label,
            occupants = snapshot.occupants_by_id.len(),
            "conversation area created"
        );
        self.notify(|l| l.on_conversation_area_updated(&snapshot));
        true
    }

    /// Tears the town down: announces `on_town_destroyed` to every town
    /// listener, signals destruction to every area's listeners, and clears
    /// all players, sessions, and areas.
    ///
    /// The store calls this just before evicting the controller from its
    /// registry; socket bridges react to the announcement by closing.
    pub fn disconnect_all_players(&mut self) {
        tracing::info!(town_id = %self.town_id, "town closing");
        self.notify(|l| l.on_town_destroyed());
        for area in &self.areas {
            area.notify_destroyed();
        }
        self.players.clear();
        self.sessions.clear();
        self.areas.clear();
    }

    // -- Internals --------------------------------------------------------

    /// Removes a player from an area, destroying the area if it empties.
    ///
    /// Fires the area-updated or area-destroyed event to town listeners
    /// and the matching occupant-change to the area's own listeners. The
    /// caller is responsible for clearing the player's back-reference.
    fn remove_player_from_area(&mut self, label: &str, player_id: &PlayerId) {
        let Some(area_pos) = self.areas.iter().position(|a| a.label() == label) else {
            return;
        };
        if !self.areas[area_pos].remove_occupant(player_id) {
            return;
        }

        if self.areas[area_pos].is_empty() {
            let area = self.areas.remove(area_pos);
            tracing::info!(
                town_id = %self.town_id,
                label = %area.label(),
                "conversation area destroyed"
            );
            let snapshot = area.to_info();
            self.notify(|l| l.on_conversation_area_destroyed(&snapshot));
            area.notify_destroyed();
        } else {
            let snapshot = self.areas[area_pos].to_info();
            self.notify(|l| l.on_conversation_area_updated(&snapshot));
            self.areas[area_pos].notify_occupants_change();
        }
    }

    /// Invokes `f` on every town listener, in registration order.
    ///
    /// Iterates over a snapshot of the registry so a callback removing a
    /// listener cannot disturb the traversal.
    fn notify(&self, f: impl Fn(&dyn TownListener)) {
        let listeners = self.listeners.clone();
        for listener in &listeners {
            f(listener.as_ref());
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

//! The request-handler surface: thin glue over the towns store.
//!
//! Each method maps one HTTP/RPC endpoint onto the store's and
//! controllers' public operations. No policy lives here; routing,
//! serialization of request bodies, and status codes belong to whatever
//! web framework hosts the service.

use std::sync::Arc;

use plaza_protocol::{
    ConversationAreaInfo, TownCreateResponse, TownId, TownJoinResponse, TownListing,
};
use plaza_town::TownError;

use crate::server::ServerState;

/// Handle onto one server's towns store.
///
/// Cheap to clone; every clone talks to the same store.
#[derive(Clone)]
pub struct TownsService {
    state: Arc<ServerState>,
}

impl TownsService {
    pub(crate) fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }

    /// Creates a town and returns its id and update password.
    pub async fn create_town(
        &self,
        friendly_name: &str,
        is_publicly_listed: bool,
    ) -> TownCreateResponse {
        let controller = self
            .state
            .store
            .lock()
            .await
            .create_town(friendly_name, is_publicly_listed);
        let town = controller.lock().await;
        TownCreateResponse {
            town_id: town.town_id().clone(),
            town_update_password: town.update_password().to_string(),
        }
    }

    /// Lists the publicly visible towns.
    pub async fn list_towns(&self) -> Vec<TownListing> {
        self.state.store.lock().await.list_towns().await
    }

    /// Joins a player to a town: mints their session and returns
    /// everything the client needs to connect its socket and video.
    ///
    /// # Errors
    /// [`TownError::UnknownTown`] if no such town exists; a failed video
    /// token mint propagates as [`TownError::Session`].
    pub async fn join_town(
        &self,
        town_id: &TownId,
        user_name: &str,
    ) -> Result<TownJoinResponse, TownError> {
        let controller = self
            .state
            .store
            .lock()
            .await
            .town(town_id)
            .ok_or_else(|| TownError::UnknownTown(town_id.clone()))?;

        let mut town = controller.lock().await;
        let session = town.add_player(user_name).await?;
        Ok(TownJoinResponse {
            user_id: session.player_id().clone(),
            session_token: session.session_token().to_string(),
            video_token: session.video_token().to_string(),
            current_players: town.player_infos(),
            friendly_name: town.friendly_name().to_string(),
            is_publicly_listed: town.is_publicly_listed(),
        })
    }

    /// Updates a town's name and/or visibility. Password-gated; returns
    /// `false` on unknown town or wrong password.
    pub async fn update_town(
        &self,
        town_id: &TownId,
        password: &str,
        friendly_name: Option<String>,
        is_publicly_listed: Option<bool>,
    ) -> bool {
        self.state
            .store
            .lock()
            .await
            .update_town(town_id, password, friendly_name, is_publicly_listed)
            .await
    }

    /// Deletes a town, disconnecting everyone in it. Password-gated;
    /// returns `false` on unknown town or wrong password.
    pub async fn delete_town(&self, town_id: &TownId, password: &str) -> bool {
        self.state
            .store
            .lock()
            .await
            .delete_town(town_id, password)
            .await
    }

    /// Installs a conversation area in a town.
    ///
    /// Returns `false` for an unknown town or a rejected area (inactive
    /// topic, duplicate label, overlap).
    pub async fn create_conversation_area(
        &self,
        town_id: &TownId,
        area: ConversationAreaInfo,
    ) -> bool {
        let Some(controller) = self.state.store.lock().await.town(town_id) else {
            return false;
        };
        let added = controller.lock().await.add_conversation_area(area);
        added
    }
}

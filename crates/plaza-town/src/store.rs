//! The towns store: the process-wide registry of town controllers.
//!
//! One store exists per server process, constructed explicitly and handed
//! to whoever needs it (no global lookup; tests build their own). The
//! store is its own serialization domain: callers wrap it in a mutex and
//! go through each controller's own lock for anything beyond lookup.

use std::sync::Arc;

use plaza_protocol::{TownId, TownListing};
use plaza_session::VideoTokenSource;
use tokio::sync::Mutex;

use crate::TownController;

/// Registry of all live towns, in creation order.
///
/// Handing out a controller transfers no ownership: the `Arc` keeps the
/// controller alive even after `delete_town` evicts it, so in-flight
/// socket handlers can finish their teardown against a drained town.
pub struct TownsStore {
    towns: Vec<(TownId, Arc<Mutex<TownController>>)>,
    video: Arc<dyn VideoTokenSource>,
}

impl TownsStore {
    /// Creates an empty store. Every town created through it will mint
    /// video tokens from `video`.
    pub fn new(video: Arc<dyn VideoTokenSource>) -> Self {
        Self {
            towns: Vec::new(),
            video,
        }
    }

    /// Creates a town and registers it.
    ///
    /// The returned controller carries the freshly generated town id and
    /// update password; read them under its lock.
    pub fn create_town(
        &mut self,
        friendly_name: impl Into<String>,
        is_publicly_listed: bool,
    ) -> Arc<Mutex<TownController>> {
        let controller =
            TownController::new(friendly_name, is_publicly_listed, self.video.clone());
        let town_id = controller.town_id().clone();
        let shared = Arc::new(Mutex::new(controller));
        self.towns.push((town_id, shared.clone()));
        shared
    }

    /// Looks up a town by id.
    pub fn town(&self, town_id: &TownId) -> Option<Arc<Mutex<TownController>>> {
        self.towns
            .iter()
            .find(|(id, _)| id == town_id)
            .map(|(_, controller)| controller.clone())
    }

    /// Lists the publicly visible towns, in creation order.
    ///
    /// Listings carry occupancy numbers only; passwords never appear in
    /// any read operation.
    pub async fn list_towns(&self) -> Vec<TownListing> {
        let mut listings = Vec::new();
        for (town_id, controller) in &self.towns {
            let town = controller.lock().await;
            if town.is_publicly_listed() {
                listings.push(TownListing {
                    town_id: town_id.clone(),
                    friendly_name: town.friendly_name().to_string(),
                    current_occupancy: town.occupancy(),
                    maximum_occupancy: town.capacity(),
                });
            }
        }
        listings
    }

    /// Updates a town's friendly name and/or visibility.
    ///
    /// Returns `false` for an unknown town or a wrong password; fields
    /// passed as `None` are left untouched.
    pub async fn update_town(
        &self,
        town_id: &TownId,
        password: &str,
        friendly_name: Option<String>,
        is_publicly_listed: Option<bool>,
    ) -> bool {
        let Some(controller) = self.town(town_id) else {
            return false;
        };
        let mut town = controller.lock().await;
        if town.update_password() != password {
            return false;
        }
        if let Some(name) = friendly_name {
            town.set_friendly_name(name);
        }
        if let Some(listed) = is_publicly_listed {
            town.set_publicly_listed(listed);
        }
        tracing::info!(%town_id, "town updated");
        true
    }

    /// Deletes a town: disconnects everyone, then removes it from the
    /// registry.
    ///
    /// Returns `false` for an unknown town or a wrong password.
    pub async fn delete_town(&mut self, town_id: &TownId, password: &str) -> bool {
        let Some(controller) = self.town(town_id) else {
            return false;
        };
        {
            let mut town = controller.lock().await;
            if town.update_password() != password {
                return false;
            }
            town.disconnect_all_players();
        }
        self.towns.retain(|(id, _)| id != town_id);
        tracing::info!(%town_id, "town deleted");
        true
    }

    /// Number of registered towns.
    pub fn town_count(&self) -> usize {
        self.towns.len()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::BoxFuture;
    use plaza_protocol::PlayerId;
    use plaza_session::SessionError;

    struct StaticVideo;

    impl VideoTokenSource for StaticVideo {
        fn mint<'a>(
            &'a self,
            _town: &'a TownId,
            _player: &'a PlayerId,
        ) -> BoxFuture<'a, Result<String, SessionError>> {
            Box::pin(async move { Ok("video".into()) })
        }
    }

    fn store() -> TownsStore {
        TownsStore::new(Arc::new(StaticVideo))
    }

    #[tokio::test]
    async fn test_create_town_assigns_unique_ids_and_passwords() {
        let mut store = store();
        let t1 = store.create_town("One", true);
        let t2 = store.create_town("Two", true);

        let (t1, t2) = (t1.lock().await, t2.lock().await);
        assert_ne!(t1.town_id(), t2.town_id());
        assert_ne!(t1.update_password(), t2.update_password());
        assert_eq!(store.town_count(), 2);
    }

    #[tokio::test]
    async fn test_town_lookup_by_id() {
        let mut store = store();
        let created = store.create_town("One", true);
        let town_id = created.lock().await.town_id().clone();

        let found = store.town(&town_id).expect("town should exist");
        assert_eq!(found.lock().await.friendly_name(), "One");
        assert!(store.town(&TownId::new("missing")).is_none());
    }

    #[tokio::test]
    async fn test_list_towns_filters_private_preserves_order() {
        let mut store = store();
        store.create_town("Alpha", true);
        store.create_town("Hidden", false);
        store.create_town("Beta", true);

        let listings = store.list_towns().await;

        let names: Vec<_> = listings.iter().map(|l| l.friendly_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
    }

    #[tokio::test]
    async fn test_list_towns_reports_occupancy() {
        let mut store = store();
        let town = store.create_town("Alpha", true);
        town.lock().await.add_player("ada").await.unwrap();

        let listings = store.list_towns().await;

        assert_eq!(listings[0].current_occupancy, 1);
        assert_eq!(listings[0].maximum_occupancy, 50);
    }

    #[tokio::test]
    async fn test_update_town_wrong_password_rejected() {
        let mut store = store();
        let town = store.create_town("Before", true);
        let town_id = town.lock().await.town_id().clone();

        let ok = store
            .update_town(&town_id, "wrong", Some("After".into()), None)
            .await;

        assert!(!ok);
        assert_eq!(town.lock().await.friendly_name(), "Before");
    }

    #[tokio::test]
    async fn test_update_town_changes_requested_fields_only() {
        let mut store = store();
        let town = store.create_town("Before", true);
        let (town_id, password) = {
            let t = town.lock().await;
            (t.town_id().clone(), t.update_password().to_string())
        };

        let ok = store
            .update_town(&town_id, &password, Some("After".into()), None)
            .await;

        assert!(ok);
        let t = town.lock().await;
        assert_eq!(t.friendly_name(), "After");
        assert!(t.is_publicly_listed(), "visibility should be untouched");
    }

    #[tokio::test]
    async fn test_update_town_unknown_id_returns_false() {
        let store = store();
        assert!(
            !store
                .update_town(&TownId::new("missing"), "pw", None, None)
                .await
        );
    }

    #[tokio::test]
    async fn test_delete_town_wrong_password_keeps_town() {
        let mut store = store();
        let town = store.create_town("Alpha", true);
        let town_id = town.lock().await.town_id().clone();

        assert!(!store.delete_town(&town_id, "wrong").await);
        assert_eq!(store.town_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_town_disconnects_players_and_unregisters() {
        let mut store = store();
        let town = store.create_town("Alpha", true);
        let (town_id, password) = {
            let t = town.lock().await;
            (t.town_id().clone(), t.update_password().to_string())
        };
        town.lock().await.add_player("ada").await.unwrap();

        assert!(store.delete_town(&town_id, &password).await);

        assert!(store.town(&town_id).is_none());
        // The retained handle sees the drained town.
        assert_eq!(town.lock().await.occupancy(), 0);
    }
}

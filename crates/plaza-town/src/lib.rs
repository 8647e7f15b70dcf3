//! Town state management for plaza.
//!
//! The heart of the server. Each town is an isolated world with its own
//! [`TownController`] owning players, sessions, conversation areas, and
//! listener registries; the [`TownsStore`] is the process-wide registry
//! of controllers.
//!
//! # Concurrency model
//!
//! A controller is one serialization domain: all access goes through an
//! `Arc<tokio::sync::Mutex<TownController>>`, and every mutating call
//! dispatches its listener notifications synchronously before returning.
//! Listeners therefore observe a total order of events per town and never
//! see torn state. The store is a second, independent domain with the
//! same discipline.

mod area;
mod controller;
mod error;
mod ids;
mod listener;
mod player;
mod store;

pub use area::ConversationArea;
pub use controller::TownController;
pub use error::TownError;
pub use listener::{AreaListener, TownListener};
pub use player::Player;
pub use store::TownsStore;

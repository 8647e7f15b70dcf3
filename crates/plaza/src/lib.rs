//! # plaza
//!
//! Authoritative server for a multiplayer 2D town. Players move on a
//! shared grid, dynamically form spatially bounded conversation areas,
//! and receive each other's state changes over long-lived WebSocket
//! subscriptions. Video-chat credentials are minted per (town, player)
//! through a pluggable provider seam.
//!
//! The layers, bottom up: `plaza-protocol` (wire shapes), `plaza-session`
//! (sessions + video tokens), `plaza-town` (the per-town state machine
//! and the towns store), `plaza-transport` (typed WebSockets), and this
//! crate (server assembly, the socket subscription handler, and the
//! request-handler surface).
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use plaza::prelude::*;
//!
//! // Implement VideoTokenSource for your provider, then:
//! // let server = PlazaServer::builder()
//! //     .bind("0.0.0.0:8080")
//! //     .build(my_video_provider)
//! //     .await?;
//! // let service = server.service(); // create/join/list/update/delete
//! // server.run().await
//! ```

mod error;
mod requests;
mod server;
mod subscription;

pub use error::PlazaError;
pub use requests::TownsService;
pub use server::{PlazaServer, PlazaServerBuilder};

/// Re-exports everything an embedding application needs.
pub mod prelude {
    // Meta-crate
    pub use crate::{PlazaError, PlazaServer, PlazaServerBuilder, TownsService};

    // Protocol types
    pub use plaza_protocol::{
        BoundingBox, ClientEvent, Codec, ConversationAreaInfo, Direction, JsonCodec,
        PlayerId, PlayerInfo, ProtocolError, ServerEvent, TownCreateResponse, TownId,
        TownJoinResponse, TownListing, UserLocation, NO_TOPIC,
    };

    // Session types
    pub use plaza_session::{PlayerSession, SessionError, VideoTokenSource};

    // Town types
    pub use plaza_town::{
        AreaListener, ConversationArea, Player, TownController, TownError, TownListener,
        TownsStore,
    };

    // Transport types
    pub use plaza_transport::{EventSocket, SocketId, TransportError, WsListener};
}

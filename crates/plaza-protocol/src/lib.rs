//! Wire protocol for plaza.
//!
//! This crate defines the language that clients and the town server speak:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`UserLocation`],
//!   [`BoundingBox`], id newtypes) — the shapes that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those shapes are
//!   converted to and from bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer knows nothing about towns, sessions, or sockets; it
//! only knows shapes. [`BoundingBox`] additionally owns the open-rectangle
//! geometry (strict containment, edge-sharing allowed) because every layer
//! above agrees on it by construction instead of by convention.

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    BoundingBox, ClientEvent, ConversationAreaInfo, Direction, PlayerId, PlayerInfo,
    ServerEvent, TownCreateResponse, TownId, TownJoinResponse, TownListing, UserLocation,
    NO_TOPIC,
};

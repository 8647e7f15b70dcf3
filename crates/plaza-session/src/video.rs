//! The video-token seam.
//!
//! plaza does not talk to a video provider itself. It defines the
//! [`VideoTokenSource`] trait: one async method that mints a capability
//! token bound to a (town, player) pair. Production wires in an adapter
//! for the real provider; tests use stubs that succeed or fail on demand.

use futures_util::future::BoxFuture;
use plaza_protocol::{PlayerId, TownId};

use crate::SessionError;

/// Mints video-chat capability tokens scoped to one player in one town.
///
/// The returned future is boxed so the trait stays object-safe: the town
/// layer stores a shared `Arc<dyn VideoTokenSource>` and injects it into
/// every controller it creates.
///
/// # Example
///
/// ```rust
/// use futures_util::future::BoxFuture;
/// use plaza_protocol::{PlayerId, TownId};
/// use plaza_session::{SessionError, VideoTokenSource};
///
/// /// Hands out predictable tokens. Development only.
/// struct DevTokens;
///
/// impl VideoTokenSource for DevTokens {
///     fn mint<'a>(
///         &'a self,
///         town: &'a TownId,
///         player: &'a PlayerId,
///     ) -> BoxFuture<'a, Result<String, SessionError>> {
///         Box::pin(async move { Ok(format!("dev-{town}-{player}")) })
///     }
/// }
/// ```
pub trait VideoTokenSource: Send + Sync + 'static {
    /// Mints a token granting `player` access to `town`'s video room.
    ///
    /// # Errors
    /// Returns [`SessionError::TokenMint`] if the provider rejects the
    /// request or is unreachable. The caller must not register the player
    /// when this fails.
    fn mint<'a>(
        &'a self,
        town: &'a TownId,
        player: &'a PlayerId,
    ) -> BoxFuture<'a, Result<String, SessionError>>;
}

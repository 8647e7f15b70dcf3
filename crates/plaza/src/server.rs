//! `PlazaServer` builder and accept loop.
//!
//! Ties the layers together: transport accepts sockets, the subscription
//! handler authenticates them against the towns store, and the store's
//! controllers do the rest.

use std::sync::Arc;

use plaza_session::VideoTokenSource;
use plaza_town::TownsStore;
use plaza_transport::WsListener;
use tokio::sync::Mutex;

use crate::subscription::handle_subscription;
use crate::{PlazaError, TownsService};

/// Shared server state handed to every connection task.
///
/// The store is its own serialization domain; each town controller inside
/// it carries its own lock.
pub(crate) struct ServerState {
    pub(crate) store: Mutex<TownsStore>,
}

/// Builder for configuring and starting a plaza server.
///
/// # Example
///
/// ```rust,ignore
/// use plaza::prelude::*;
///
/// // Implement VideoTokenSource for your provider, then:
/// let server = PlazaServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(my_video_provider)
///     .await?;
/// server.run().await
/// ```
pub struct PlazaServerBuilder {
    bind_addr: String,
}

impl PlazaServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }

    /// Sets the address to bind the WebSocket listener to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the listener and assembles the server around a fresh towns
    /// store that mints video tokens from `video`.
    pub async fn build(
        self,
        video: impl VideoTokenSource,
    ) -> Result<PlazaServer, PlazaError> {
        let listener = WsListener::bind(&self.bind_addr).await?;
        let state = Arc::new(ServerState {
            store: Mutex::new(TownsStore::new(Arc::new(video))),
        });
        Ok(PlazaServer { listener, state })
    }
}

impl Default for PlazaServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running plaza server.
///
/// Call [`run()`](Self::run) to start accepting subscription sockets; use
/// [`service()`](Self::service) for the request-handler surface (create /
/// join / list / update / delete towns).
pub struct PlazaServer {
    listener: WsListener,
    state: Arc<ServerState>,
}

impl PlazaServer {
    /// Creates a new builder.
    pub fn builder() -> PlazaServerBuilder {
        PlazaServerBuilder::new()
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Returns the request-handler surface over this server's store.
    pub fn service(&self) -> TownsService {
        TownsService::new(self.state.clone())
    }

    /// Runs the accept loop, spawning one handler task per socket. Runs
    /// until the process is terminated.
    pub async fn run(self) -> Result<(), PlazaError> {
        tracing::info!("plaza server running");

        loop {
            match self.listener.accept().await {
                Ok(socket) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_subscription(socket, state).await {
                            tracing::debug!(error = %e, "subscription ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

//! `RelayServer` builder and accept loop.
//!
//! This is the entry point for running the relay. It ties the layers
//! together: transport → protocol → hub.

use std::future::Future;
use std::sync::Arc;

use catrelay_hub::{HubConfig, RelayHandle, spawn_relay};
use catrelay_protocol::{Codec, JsonCodec};
use catrelay_transport::{Transport, WebSocketTransport};

use crate::CatrelayError;
use crate::config::ServerConfig;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) relay: RelayHandle,
    pub(crate) codec: C,
    /// Capacity of each connection's outbound queue.
    pub(crate) outbound_buffer: usize,
}

/// Builder for configuring and starting a relay server.
///
/// # Example
///
/// ```rust,no_run
/// use catrelay::prelude::*;
///
/// # async fn start() -> Result<(), CatrelayError> {
/// let server = RelayServer::builder()
///     .config(ServerConfig::from_env())
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct RelayServerBuilder {
    config: ServerConfig,
    /// Explicit listen address from [`bind`](Self::bind); wins over `config`.
    addr: Option<String>,
    hub_config: HubConfig,
}

impl RelayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            addr: None,
            hub_config: HubConfig::default(),
        }
    }

    /// Sets the listen host and port.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self.addr = None;
        self
    }

    /// Overrides the listen address, e.g. `"127.0.0.1:0"` in tests.
    ///
    /// The address is only resolved by [`build`](Self::build), which fails
    /// if it is not a valid `host:port`.
    pub fn bind(mut self, addr: &str) -> Self {
        self.addr = Some(addr.to_string());
        self
    }

    /// Sets the relay configuration.
    pub fn hub_config(mut self, config: HubConfig) -> Self {
        self.hub_config = config;
        self
    }

    /// Binds the listener and starts the relay actor.
    pub async fn build(self) -> Result<RelayServer<JsonCodec>, CatrelayError> {
        let addr = self.addr.unwrap_or_else(|| self.config.bind_addr());
        let transport = WebSocketTransport::bind(&addr).await?;

        let outbound_buffer = self.hub_config.outbound_buffer.max(1);
        let state = Arc::new(ServerState {
            relay: spawn_relay(self.hub_config),
            codec: JsonCodec,
            outbound_buffer,
        });

        Ok(RelayServer { transport, state })
    }
}

impl Default for RelayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound relay server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RelayServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl RelayServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> RelayServerBuilder {
        RelayServerBuilder::new()
    }
}

impl<C: Codec> RelayServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns a handle to the relay actor.
    pub fn relay(&self) -> RelayHandle {
        self.state.relay.clone()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), CatrelayError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` resolves, then stops the
    /// relay actor. Open connections see their outbound queues close.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), CatrelayError> {
        let addr = self.local_addr().ok();
        tracing::info!(?addr, "relay server running");

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                accepted = self.transport.accept() => match accepted {
                    Ok(pending) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            let peer = pending.peer_addr();
                            let conn = match WebSocketTransport::upgrade(pending).await {
                                Ok(conn) => conn,
                                Err(e) => {
                                    tracing::debug!(%peer, error = %e, "upgrade failed");
                                    return;
                                }
                            };
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(
                                    error = %e,
                                    "connection ended with error"
                                );
                            }
                        });
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                    }
                },
                () = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
            }
        }

        self.state.relay.shutdown().await?;
        Ok(())
    }
}

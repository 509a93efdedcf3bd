//! Error types for the hub layer.

use catrelay_protocol::ConnectionId;

/// Errors that can occur when talking to the relay actor.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// A connection with this id is already attached to the relay.
    #[error("connection {0} is already attached")]
    AlreadyConnected(ConnectionId),

    /// The relay's command channel is closed (the actor has shut down).
    #[error("relay is unavailable")]
    Unavailable,
}

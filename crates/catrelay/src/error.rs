//! Unified error type for catrelay.

use catrelay_hub::HubError;
use catrelay_protocol::ProtocolError;
use catrelay_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert layer errors
/// automatically.
#[derive(Debug, thiserror::Error)]
pub enum CatrelayError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The relay actor rejected a command or is gone.
    #[error(transparent)]
    Hub(#[from] HubError),
}

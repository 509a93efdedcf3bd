//! # catrelay
//!
//! Realtime multiplayer relay for the cat platformer.
//!
//! Game clients connect over WebSocket, register a display name, and from
//! then on see every other player's movement, animations, meows, sprung
//! traps, wins and departures. The relay keeps the player registry and the
//! hazard log in memory and runs no simulation of its own.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use catrelay::prelude::*;
//!
//! # async fn start() -> Result<(), CatrelayError> {
//! let server = RelayServer::builder()
//!     .bind("0.0.0.0:9208")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{DEFAULT_PORT, ServerConfig};
pub use error::CatrelayError;
pub use server::{RelayServer, RelayServerBuilder};

/// Everything needed to run a relay or talk to one in tests.
pub mod prelude {
    pub use crate::{CatrelayError, RelayServer, RelayServerBuilder, ServerConfig};
    pub use catrelay_hub::{HubConfig, RelayHandle, RelayInfo};
    pub use catrelay_protocol::{
        ClientEvent, Codec, ConnectionId, Flip, HazardActivation, JsonCodec, PlayerRecord,
        Recipient, ServerEvent, Vec2,
    };
}

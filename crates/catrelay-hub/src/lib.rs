//! The session relay at the heart of catrelay.
//!
//! The relay tracks which connections have registered as players, keeps the
//! log of hazards sprung during the match, and fans events out to the right
//! audience. It performs no simulation.
//!
//! # Key types
//!
//! - [`RelayState`] — the registry and hazard log; turns one inbound event
//!   into the list of `(Recipient, ServerEvent)` pairs to deliver
//! - [`RelayHandle`] — send commands to the running relay actor
//! - [`HubConfig`] — fallback names and channel sizing
//!
//! # Concurrency
//!
//! A single actor task owns the [`RelayState`] and every connection's
//! outbound queue. Commands are applied one at a time, so no operation ever
//! observes a half-applied registry. Fan-out only enqueues; each connection
//! drains its own queue, so a slow client never holds up the others.

mod actor;
mod config;
mod error;
mod state;

pub use actor::{ConnectionSender, RelayHandle, RelayInfo, spawn_relay};
pub use config::{DEFAULT_PLAYER_NAME, HubConfig, UNKNOWN_WINNER_NAME};
pub use error::HubError;
pub use state::{Outbound, RelayState};

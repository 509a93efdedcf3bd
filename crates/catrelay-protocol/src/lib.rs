//! Wire protocol for catrelay.
//!
//! This crate defines the events that game clients and the relay exchange:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`Recipient`], the
//!   player and hazard records) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those events are
//!   converted to and from text frames.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! Every frame is a JSON object of the form
//! `{"event": "<name>", "data": <payload>}`; payload-less events omit
//! `data`.
//!
//! ```text
//! Transport (frames) → Protocol (ClientEvent) → Hub (relay state)
//! ```

mod codec;
mod error;
mod types;

pub use catrelay_transport::ConnectionId;
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientEvent, Flip, HazardActivation, PlayerRecord, Recipient, ServerEvent,
    Vec2,
};

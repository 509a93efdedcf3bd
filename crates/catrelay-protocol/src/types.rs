//! Event types for catrelay's wire format.
//!
//! [`ClientEvent`] is everything a game client may send, [`ServerEvent`] is
//! everything the relay sends back. Both use adjacent tagging so a frame
//! reads as `{"event": "player:move", "data": {...}}`, which keeps the
//! event names the browser client already listens for.

use std::collections::BTreeMap;

use catrelay_transport::ConnectionId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A world position in engine pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Sprite mirroring flags, one per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flip {
    pub x: bool,
    pub y: bool,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A registered player as tracked by the relay.
///
/// `progress` is whatever the client last reported. The relay does not
/// cross-check it against the reported position, so a modified client can
/// claim any value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: ConnectionId,
    pub name: String,
    pub progress: f64,
}

/// A hazard that some player has sprung. Once recorded it stays sprung for
/// everyone who joins later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardActivation {
    /// Hazard category, e.g. `"death"` for spike traps.
    pub kind: String,
    pub position: Vec2,
}

// ---------------------------------------------------------------------------
// Recipient — who should receive an event?
// ---------------------------------------------------------------------------

/// Selects the audience of an outbound event among the open connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every open connection, registered or not.
    All,

    /// A single connection.
    Only(ConnectionId),

    /// Every open connection except the given one (usually the sender).
    AllExcept(ConnectionId),
}

impl Recipient {
    /// Returns `true` if `conn` is part of this audience.
    pub fn includes(&self, conn: ConnectionId) -> bool {
        match *self {
            Recipient::All => true,
            Recipient::Only(target) => target == conn,
            Recipient::AllExcept(excluded) => excluded != conn,
        }
    }
}

// ---------------------------------------------------------------------------
// ClientEvent — client → relay
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}

/// Events a game client sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Become a tracked player under the given display name.
    #[serde(rename = "player:register")]
    Register {
        #[serde(default)]
        name: Option<String>,
    },

    /// Local player moved. A missing `progress` counts as 0.
    #[serde(rename = "player:move")]
    Move {
        position: Vec2,
        flip: Flip,
        #[serde(default)]
        progress: Option<f64>,
    },

    /// Local player switched animation.
    #[serde(rename = "player:animate", rename_all = "camelCase")]
    Animate {
        animation_key: String,
        #[serde(default = "default_true")]
        state: bool,
    },

    #[serde(rename = "player:meow")]
    Meow,

    /// Local player sprang a hazard at `position`.
    #[serde(rename = "player:trap")]
    Trap { kind: String, position: Vec2 },

    /// Local player reached the goal.
    #[serde(rename = "player:winning")]
    Winning,
}

impl ClientEvent {
    /// The wire name of this event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Register { .. } => "player:register",
            ClientEvent::Move { .. } => "player:move",
            ClientEvent::Animate { .. } => "player:animate",
            ClientEvent::Meow => "player:meow",
            ClientEvent::Trap { .. } => "player:trap",
            ClientEvent::Winning => "player:winning",
        }
    }
}

// ---------------------------------------------------------------------------
// ServerEvent — relay → client(s)
// ---------------------------------------------------------------------------

/// Events the relay sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// A player registered (or re-registered).
    #[serde(rename = "player:spawn")]
    Spawn { id: ConnectionId, name: String },

    /// Registration reply: every registered player, keyed by id.
    #[serde(rename = "player:all")]
    All(BTreeMap<ConnectionId, PlayerRecord>),

    /// Registration reply: every hazard sprung so far, oldest first.
    #[serde(rename = "traps:all")]
    TrapsAll(Vec<HazardActivation>),

    #[serde(rename = "player:moved")]
    Moved {
        id: ConnectionId,
        position: Vec2,
        flip: Flip,
        progress: f64,
    },

    #[serde(rename = "player:animated", rename_all = "camelCase")]
    Animated {
        id: ConnectionId,
        animation_key: String,
        state: bool,
    },

    #[serde(rename = "player:meow")]
    Meow { id: ConnectionId },

    #[serde(rename = "player:trapped")]
    Trapped {
        id: ConnectionId,
        kind: String,
        position: Vec2,
    },

    #[serde(rename = "player:winned")]
    Winned { id: ConnectionId, name: String },

    /// A registered player's connection closed.
    #[serde(rename = "player:unspawn")]
    Unspawn { id: ConnectionId },
}

impl ServerEvent {
    /// The wire name of this event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Spawn { .. } => "player:spawn",
            ServerEvent::All(_) => "player:all",
            ServerEvent::TrapsAll(_) => "traps:all",
            ServerEvent::Moved { .. } => "player:moved",
            ServerEvent::Animated { .. } => "player:animated",
            ServerEvent::Meow { .. } => "player:meow",
            ServerEvent::Trapped { .. } => "player:trapped",
            ServerEvent::Winned { .. } => "player:winned",
            ServerEvent::Unspawn { .. } => "player:unspawn",
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

//! The relay's authoritative state: player registry and hazard log.
//!
//! [`RelayState`] is plain synchronous data. Each operation mutates the
//! state and returns the events to deliver, tagged with their audience.
//! Delivery is the actor's job, which keeps this module trivially testable.

use std::collections::{BTreeMap, HashMap};

use catrelay_protocol::{
    ClientEvent, ConnectionId, Flip, HazardActivation, PlayerRecord, Recipient,
    ServerEvent, Vec2,
};

use crate::HubConfig;

/// Events produced by one operation, in delivery order.
pub type Outbound = Vec<(Recipient, ServerEvent)>;

/// Registry of registered players plus the match's hazard log.
///
/// A record exists for a connection exactly while that connection is open
/// and has registered. The hazard log only ever grows.
#[derive(Debug)]
pub struct RelayState {
    players: HashMap<ConnectionId, PlayerRecord>,
    hazards: Vec<HazardActivation>,
    config: HubConfig,
}

impl RelayState {
    /// Creates an empty relay state.
    pub fn new(config: HubConfig) -> Self {
        Self {
            players: HashMap::new(),
            hazards: Vec::new(),
            config,
        }
    }

    /// Applies one inbound event from `sender` and returns what to deliver.
    pub fn handle(&mut self, sender: ConnectionId, event: ClientEvent) -> Outbound {
        match event {
            ClientEvent::Register { name } => self.register(sender, name),
            ClientEvent::Move {
                position,
                flip,
                progress,
            } => self.move_player(sender, position, flip, progress.unwrap_or(0.0)),
            ClientEvent::Animate {
                animation_key,
                state,
            } => self.animate(sender, animation_key, state),
            ClientEvent::Meow => self.meow(sender),
            ClientEvent::Trap { kind, position } => self.report_trap(sender, kind, position),
            ClientEvent::Winning => self.declare_win(sender),
        }
    }

    /// Registers `conn` as a player, replacing any previous record for it.
    ///
    /// Emits, in order: `player:spawn` to everyone (the caller included),
    /// then the registry snapshot and the hazard log to the caller only.
    pub fn register(&mut self, conn: ConnectionId, name: Option<String>) -> Outbound {
        // Whitespace only decides blankness; a real name is kept as sent.
        let name = match name {
            Some(n) if !n.trim().is_empty() => n,
            _ => self.config.fallback_name.clone(),
        };

        let replaced = self
            .players
            .insert(
                conn,
                PlayerRecord {
                    id: conn,
                    name: name.clone(),
                    progress: 0.0,
                },
            )
            .is_some();

        tracing::info!(%conn, %name, replaced, "player registered");

        vec![
            (Recipient::All, ServerEvent::Spawn { id: conn, name }),
            (Recipient::Only(conn), ServerEvent::All(self.snapshot())),
            (
                Recipient::Only(conn),
                ServerEvent::TrapsAll(self.hazards.clone()),
            ),
        ]
    }

    /// Records the sender's progress and relays its movement to the others.
    /// Dropped if the sender has not registered.
    pub fn move_player(
        &mut self,
        conn: ConnectionId,
        position: Vec2,
        flip: Flip,
        progress: f64,
    ) -> Outbound {
        let Some(record) = self.players.get_mut(&conn) else {
            tracing::debug!(%conn, "move from unregistered connection dropped");
            return Vec::new();
        };
        record.progress = progress;

        vec![(
            Recipient::AllExcept(conn),
            ServerEvent::Moved {
                id: conn,
                position,
                flip,
                progress,
            },
        )]
    }

    /// Relays an animation change to the others. Dropped if the sender has
    /// not registered.
    pub fn animate(&mut self, conn: ConnectionId, animation_key: String, state: bool) -> Outbound {
        if !self.players.contains_key(&conn) {
            tracing::debug!(%conn, "animate from unregistered connection dropped");
            return Vec::new();
        }
        vec![(
            Recipient::AllExcept(conn),
            ServerEvent::Animated {
                id: conn,
                animation_key,
                state,
            },
        )]
    }

    pub fn meow(&mut self, conn: ConnectionId) -> Outbound {
        if !self.players.contains_key(&conn) {
            tracing::debug!(%conn, "meow from unregistered connection dropped");
            return Vec::new();
        }
        vec![(Recipient::AllExcept(conn), ServerEvent::Meow { id: conn })]
    }

    /// Appends a hazard to the log and tells the others about it.
    ///
    /// Every report is kept, including repeats at the same position.
    pub fn report_trap(&mut self, conn: ConnectionId, kind: String, position: Vec2) -> Outbound {
        self.hazards.push(HazardActivation {
            kind: kind.clone(),
            position,
        });
        tracing::debug!(%conn, %kind, x = position.x, y = position.y, "hazard activated");

        vec![(
            Recipient::AllExcept(conn),
            ServerEvent::Trapped {
                id: conn,
                kind,
                position,
            },
        )]
    }

    /// Announces the sender's win to everyone.
    pub fn declare_win(&mut self, conn: ConnectionId) -> Outbound {
        let name = self
            .players
            .get(&conn)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| self.config.unknown_winner_name.clone());

        tracing::info!(%conn, %name, "player won the game");

        vec![(Recipient::All, ServerEvent::Winned { id: conn, name })]
    }

    /// Forgets `conn`. Registered players are announced with
    /// `player:unspawn`; unregistered connections leave silently.
    pub fn disconnect(&mut self, conn: ConnectionId) -> Outbound {
        match self.players.remove(&conn) {
            Some(record) => {
                tracing::info!(%conn, name = %record.name, "player disconnected");
                vec![(Recipient::All, ServerEvent::Unspawn { id: conn })]
            }
            None => {
                tracing::info!(%conn, name = "Unknown", "connection closed");
                Vec::new()
            }
        }
    }

    /// Returns the record for `conn`, if it has registered.
    pub fn player(&self, conn: &ConnectionId) -> Option<&PlayerRecord> {
        self.players.get(conn)
    }

    /// Returns every registered player, ordered by connection id.
    pub fn snapshot(&self) -> BTreeMap<ConnectionId, PlayerRecord> {
        self.players
            .iter()
            .map(|(id, record)| (*id, record.clone()))
            .collect()
    }

    /// The hazard log, oldest first.
    pub fn hazards(&self) -> &[HazardActivation] {
        &self.hazards
    }

    /// Number of registered players.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

impl Default for RelayState {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}

// =========================================================================
// Tests
// =========================================================================

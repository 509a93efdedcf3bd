//! Relay configuration.

/// Display name given to players who register with a blank name.
pub const DEFAULT_PLAYER_NAME: &str = "Anonymous Cat";

/// Name announced when a connection without a record declares a win.
pub const UNKNOWN_WINNER_NAME: &str = "Unknown Player";

/// Settings for a relay instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Name used when `player:register` carries no usable name.
    pub fallback_name: String,
    /// Name used in `player:winned` for unregistered connections.
    pub unknown_winner_name: String,
    /// Capacity of the actor's command channel. Connection handlers wait
    /// when it is full.
    pub command_buffer: usize,
    /// Capacity of each connection's outbound queue. A connection whose
    /// queue fills up is detached as if it had disconnected.
    pub outbound_buffer: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            fallback_name: DEFAULT_PLAYER_NAME.to_string(),
            unknown_winner_name: UNKNOWN_WINNER_NAME.to_string(),
            command_buffer: 1024,
            outbound_buffer: 256,
        }
    }
}

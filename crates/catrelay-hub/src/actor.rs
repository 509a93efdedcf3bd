//! Relay actor: a Tokio task that owns the [`RelayState`] and every
//! connection's outbound queue.
//!
//! Connection handlers talk to it through a [`RelayHandle`]. Commands are
//! processed strictly one at a time, which is what makes each operation's
//! read/mutate/enqueue step atomic with respect to every other connection.

use std::collections::HashMap;

use catrelay_protocol::{ClientEvent, ConnectionId, PlayerRecord, Recipient, ServerEvent};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};

use crate::{HubConfig, HubError, Outbound, RelayState};

/// Channel sender for delivering outbound events to one connection.
///
/// Bounded (see [`HubConfig::outbound_buffer`]). The actor never waits on
/// it: a connection whose queue is full is detached instead.
pub type ConnectionSender = mpsc::Sender<ServerEvent>;

/// Commands sent to the relay actor through its channel.
pub(crate) enum RelayCommand {
    /// Attach a newly opened connection's outbound queue.
    Connect {
        conn: ConnectionId,
        sender: ConnectionSender,
        reply: oneshot::Sender<Result<(), HubError>>,
    },

    /// Apply an inbound client event.
    Event {
        conn: ConnectionId,
        event: ClientEvent,
    },

    /// The connection's transport closed.
    Disconnect { conn: ConnectionId },

    /// Request a diagnostic snapshot.
    GetInfo { reply: oneshot::Sender<RelayInfo> },

    /// Stop the actor. Dropping the outbound senders ends every writer.
    Shutdown,
}

/// A point-in-time view of the relay.
#[derive(Debug, Clone)]
pub struct RelayInfo {
    /// Open connections, registered or not.
    pub connections: usize,
    /// Registered players, ordered by connection id.
    pub players: Vec<PlayerRecord>,
    /// Length of the hazard log.
    pub hazards: usize,
}

/// Handle to the running relay actor.
///
/// Cheap to clone: every connection handler holds one.
#[derive(Clone)]
pub struct RelayHandle {
    sender: mpsc::Sender<RelayCommand>,
}

impl RelayHandle {
    /// Attaches a connection. Events addressed to it are pushed onto
    /// `sender` from now on, including its own registration replies.
    pub async fn connect(
        &self,
        conn: ConnectionId,
        sender: ConnectionSender,
    ) -> Result<(), HubError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RelayCommand::Connect {
                conn,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| HubError::Unavailable)?;
        reply_rx.await.map_err(|_| HubError::Unavailable)?
    }

    /// Submits an inbound event (fire-and-forget).
    pub async fn send_event(
        &self,
        conn: ConnectionId,
        event: ClientEvent,
    ) -> Result<(), HubError> {
        self.sender
            .send(RelayCommand::Event { conn, event })
            .await
            .map_err(|_| HubError::Unavailable)
    }

    /// Detaches a connection and forgets its player record.
    ///
    /// Detaching an unknown connection is a no-op, so calling this more
    /// than once for the same id is harmless.
    pub async fn disconnect(&self, conn: ConnectionId) -> Result<(), HubError> {
        self.sender
            .send(RelayCommand::Disconnect { conn })
            .await
            .map_err(|_| HubError::Unavailable)
    }

    /// Requests a snapshot of the relay.
    pub async fn info(&self) -> Result<RelayInfo, HubError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RelayCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| HubError::Unavailable)?;
        reply_rx.await.map_err(|_| HubError::Unavailable)
    }

    /// Tells the relay to shut down.
    pub async fn shutdown(&self) -> Result<(), HubError> {
        self.sender
            .send(RelayCommand::Shutdown)
            .await
            .map_err(|_| HubError::Unavailable)
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct RelayActor {
    state: RelayState,
    /// Outbound queue of every open connection.
    senders: HashMap<ConnectionId, ConnectionSender>,
    receiver: mpsc::Receiver<RelayCommand>,
}

impl RelayActor {
    async fn run(mut self) {
        tracing::info!("relay actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RelayCommand::Connect {
                    conn,
                    sender,
                    reply,
                } => {
                    let result = self.handle_connect(conn, sender);
                    let _ = reply.send(result);
                }
                RelayCommand::Event { conn, event } => {
                    self.handle_event(conn, event);
                }
                RelayCommand::Disconnect { conn } => {
                    self.handle_disconnect(conn);
                }
                RelayCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                RelayCommand::Shutdown => {
                    tracing::info!(
                        connections = self.senders.len(),
                        "relay shutting down"
                    );
                    break;
                }
            }
        }

        tracing::info!("relay actor stopped");
    }

    fn handle_connect(
        &mut self,
        conn: ConnectionId,
        sender: ConnectionSender,
    ) -> Result<(), HubError> {
        if self.senders.contains_key(&conn) {
            return Err(HubError::AlreadyConnected(conn));
        }
        self.senders.insert(conn, sender);
        tracing::info!(%conn, connections = self.senders.len(), "connection attached");
        Ok(())
    }

    fn handle_event(&mut self, conn: ConnectionId, event: ClientEvent) {
        if !self.senders.contains_key(&conn) {
            tracing::warn!(%conn, event = event.name(), "event from detached connection, ignoring");
            return;
        }
        let out = self.state.handle(conn, event);
        self.dispatch(out);
    }

    fn handle_disconnect(&mut self, conn: ConnectionId) {
        if self.senders.remove(&conn).is_none() {
            return;
        }
        let out = self.state.disconnect(conn);
        self.dispatch(out);
    }

    /// Enqueues each event for every open connection in its audience, then
    /// detaches any connection that could not keep up.
    fn dispatch(&mut self, out: Outbound) {
        let mut lagging = Vec::new();
        for (recipient, event) in out {
            match recipient {
                Recipient::Only(conn) => {
                    if !self.send_to(conn, event) {
                        lagging.push(conn);
                    }
                }
                audience => {
                    for (conn, sender) in &self.senders {
                        if audience.includes(*conn) && !try_enqueue(sender, event.clone()) {
                            lagging.push(*conn);
                        }
                    }
                }
            }
        }

        lagging.sort_unstable();
        lagging.dedup();
        for conn in lagging {
            tracing::warn!(%conn, "outbound queue full, detaching slow connection");
            self.handle_disconnect(conn);
        }
    }

    /// Sends to a single connection. Returns `false` if its queue is full.
    fn send_to(&self, conn: ConnectionId, event: ServerEvent) -> bool {
        match self.senders.get(&conn) {
            Some(sender) => try_enqueue(sender, event),
            None => true,
        }
    }

    fn info(&self) -> RelayInfo {
        RelayInfo {
            connections: self.senders.len(),
            players: self.state.snapshot().into_values().collect(),
            hazards: self.state.hazards().len(),
        }
    }
}

/// Pushes without waiting. A closed queue counts as delivered: its writer is
/// gone and the disconnect that follows cleans up.
fn try_enqueue(sender: &ConnectionSender, event: ServerEvent) -> bool {
    !matches!(sender.try_send(event), Err(TrySendError::Full(_)))
}

/// Spawns the relay actor and returns a handle to it.
pub fn spawn_relay(config: HubConfig) -> RelayHandle {
    let (tx, rx) = mpsc::channel(config.command_buffer.max(1));

    let actor = RelayActor {
        state: RelayState::new(config),
        senders: HashMap::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RelayHandle { sender: tx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catrelay_protocol::Vec2;

    fn id(n: u64) -> ConnectionId {
        ConnectionId::new(n)
    }

    #[tokio::test]
    async fn test_connect_twice_is_rejected() {
        let relay = spawn_relay(HubConfig::default());
        let (tx, _rx) = mpsc::channel(16);
        relay.connect(id(1), tx.clone()).await.unwrap();

        let err = relay.connect(id(1), tx).await.unwrap_err();
        assert!(matches!(err, HubError::AlreadyConnected(c) if c == id(1)));
    }

    #[tokio::test]
    async fn test_info_counts_unregistered_connections() {
        let relay = spawn_relay(HubConfig::default());
        let (tx1, _rx1) = mpsc::channel(16);
        let (tx2, _rx2) = mpsc::channel(16);
        relay.connect(id(1), tx1).await.unwrap();
        relay.connect(id(2), tx2).await.unwrap();
        relay
            .send_event(id(1), ClientEvent::Register { name: Some("Alice".into()) })
            .await
            .unwrap();

        let info = relay.info().await.unwrap();
        assert_eq!(info.connections, 2);
        assert_eq!(info.players.len(), 1);
        assert_eq!(info.players[0].name, "Alice");
    }

    #[tokio::test]
    async fn test_event_from_detached_connection_is_ignored() {
        let relay = spawn_relay(HubConfig::default());
        relay
            .send_event(
                id(4),
                ClientEvent::Trap {
                    kind: "death".into(),
                    position: Vec2::default(),
                },
            )
            .await
            .unwrap();

        let info = relay.info().await.unwrap();
        assert_eq!(info.hazards, 0);
        assert!(info.players.is_empty());
    }

    #[tokio::test]
    async fn test_unregistered_connection_still_hears_broadcasts() {
        let relay = spawn_relay(HubConfig::default());
        let (tx1, mut rx1) = mpsc::channel(16);
        let (tx2, mut rx2) = mpsc::channel(16);
        relay.connect(id(1), tx1).await.unwrap();
        relay.connect(id(2), tx2).await.unwrap();

        relay
            .send_event(id(1), ClientEvent::Register { name: Some("Alice".into()) })
            .await
            .unwrap();
        relay.info().await.unwrap();

        assert_eq!(
            rx2.try_recv().unwrap(),
            ServerEvent::Spawn {
                id: id(1),
                name: "Alice".into()
            }
        );
        assert!(rx2.try_recv().is_err(), "snapshot is unicast to the caller");
        assert!(matches!(rx1.try_recv().unwrap(), ServerEvent::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_full_outbound_queue_detaches_connection() {
        let relay = spawn_relay(HubConfig {
            outbound_buffer: 4,
            ..HubConfig::default()
        });
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);
        relay.connect(id(1), tx1).await.unwrap();
        relay.connect(id(2), tx2).await.unwrap();

        // Alice's three replies plus Bob's spawn fill her queue.
        relay
            .send_event(id(1), ClientEvent::Register { name: Some("Alice".into()) })
            .await
            .unwrap();
        relay
            .send_event(id(2), ClientEvent::Register { name: Some("Bob".into()) })
            .await
            .unwrap();
        relay.info().await.unwrap();
        while rx2.try_recv().is_ok() {}

        // Alice never reads, so the meow overflows her queue.
        relay.send_event(id(2), ClientEvent::Meow).await.unwrap();

        let info = relay.info().await.unwrap();
        assert_eq!(info.connections, 1);
        assert_eq!(info.players.len(), 1);
        assert_eq!(info.players[0].name, "Bob");
        assert_eq!(rx2.try_recv().unwrap(), ServerEvent::Unspawn { id: id(1) });

        // Bob keeps being served.
        relay
            .send_event(
                id(2),
                ClientEvent::Trap {
                    kind: "death".into(),
                    position: Vec2::default(),
                },
            )
            .await
            .unwrap();
        relay.send_event(id(2), ClientEvent::Winning).await.unwrap();
        assert_eq!(
            rx2.recv().await.unwrap(),
            ServerEvent::Winned {
                id: id(2),
                name: "Bob".into()
            }
        );

        // Alice's queue holds what fit, then ends.
        let mut buffered = 0;
        while rx1.recv().await.is_some() {
            buffered += 1;
        }
        assert_eq!(buffered, 4);
    }

    #[tokio::test]
    async fn test_shutdown_closes_outbound_queues() {
        let relay = spawn_relay(HubConfig::default());
        let (tx, mut rx) = mpsc::channel(16);
        relay.connect(id(1), tx).await.unwrap();

        relay.shutdown().await.unwrap();

        assert!(rx.recv().await.is_none());
        assert!(matches!(relay.info().await, Err(HubError::Unavailable)));
    }
}

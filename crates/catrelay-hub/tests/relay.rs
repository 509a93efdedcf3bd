//! Integration tests for the relay actor, driven through `RelayHandle` with
//! in-memory outbound queues standing in for sockets.

use catrelay_hub::{HubConfig, RelayHandle, spawn_relay};
use catrelay_protocol::{
    ClientEvent, ConnectionId, Flip, HazardActivation, ServerEvent, Vec2,
};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

struct Client {
    id: ConnectionId,
    rx: mpsc::Receiver<ServerEvent>,
}

impl Client {
    /// Everything queued for this client so far.
    fn drain(&mut self) -> Vec<ServerEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = self.rx.try_recv() {
            out.push(ev);
        }
        out
    }
}

async fn attach(relay: &RelayHandle, n: u64) -> Client {
    let id = ConnectionId::new(n);
    let (tx, rx) = mpsc::channel(64);
    relay.connect(id, tx).await.expect("connect");
    Client { id, rx }
}

async fn send(relay: &RelayHandle, client: &Client, event: ClientEvent) {
    relay.send_event(client.id, event).await.expect("send");
}

/// Round-trips through the actor so every earlier command has been applied.
async fn settle(relay: &RelayHandle) {
    relay.info().await.expect("info");
}

fn register(name: &str) -> ClientEvent {
    ClientEvent::Register {
        name: Some(name.into()),
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_alice_bob_move_then_disconnect() {
    let relay = spawn_relay(HubConfig::default());
    let mut a = attach(&relay, 1).await;
    let mut b = attach(&relay, 2).await;

    send(&relay, &a, register("Alice")).await;
    send(&relay, &b, register("Bob")).await;
    settle(&relay).await;
    a.drain();
    b.drain();

    send(
        &relay,
        &a,
        ClientEvent::Move {
            position: Vec2::new(10.0, 20.0),
            flip: Flip { x: false, y: false },
            progress: Some(5.0),
        },
    )
    .await;
    settle(&relay).await;

    assert_eq!(
        b.drain(),
        vec![ServerEvent::Moved {
            id: a.id,
            position: Vec2::new(10.0, 20.0),
            flip: Flip { x: false, y: false },
            progress: 5.0,
        }]
    );
    assert!(a.drain().is_empty(), "sender hears nothing of its own move");

    relay.disconnect(a.id).await.unwrap();
    settle(&relay).await;
    assert_eq!(b.drain(), vec![ServerEvent::Unspawn { id: a.id }]);

    let mut c = attach(&relay, 3).await;
    send(&relay, &c, register("Carol")).await;
    settle(&relay).await;

    let events = c.drain();
    match &events[1] {
        ServerEvent::All(players) => {
            let names: Vec<_> = players.values().map(|p| p.name.as_str()).collect();
            assert_eq!(names, vec!["Bob", "Carol"]);
            assert!(!players.contains_key(&a.id));
        }
        other => panic!("expected player:all, got {other:?}"),
    }
}

#[tokio::test]
async fn test_late_joiner_receives_sprung_traps() {
    let relay = spawn_relay(HubConfig::default());
    let a = attach(&relay, 1).await;
    send(&relay, &a, register("Alice")).await;
    send(
        &relay,
        &a,
        ClientEvent::Trap {
            kind: "death".into(),
            position: Vec2::new(100.0, 50.0),
        },
    )
    .await;

    let mut b = attach(&relay, 2).await;
    send(&relay, &b, register("Bob")).await;
    settle(&relay).await;

    let events = b.drain();
    assert_eq!(
        events.last(),
        Some(&ServerEvent::TrapsAll(vec![HazardActivation {
            kind: "death".into(),
            position: Vec2::new(100.0, 50.0),
        }]))
    );
}

#[tokio::test]
async fn test_register_reply_order_for_caller() {
    let relay = spawn_relay(HubConfig::default());
    let mut a = attach(&relay, 1).await;
    send(&relay, &a, register("Alice")).await;
    settle(&relay).await;

    let events = a.drain();
    assert_eq!(events.len(), 3);
    assert_eq!(
        events[0],
        ServerEvent::Spawn {
            id: a.id,
            name: "Alice".into()
        }
    );
    match &events[1] {
        ServerEvent::All(players) => assert_eq!(players[&a.id].name, "Alice"),
        other => panic!("expected player:all, got {other:?}"),
    }
    assert_eq!(events[2], ServerEvent::TrapsAll(Vec::new()));
}

#[tokio::test]
async fn test_audiences_per_event_kind() {
    let relay = spawn_relay(HubConfig::default());
    let mut a = attach(&relay, 1).await;
    let mut b = attach(&relay, 2).await;
    send(&relay, &a, register("Alice")).await;
    send(&relay, &b, register("Bob")).await;
    settle(&relay).await;
    a.drain();
    b.drain();

    send(
        &relay,
        &a,
        ClientEvent::Animate {
            animation_key: "jump".into(),
            state: true,
        },
    )
    .await;
    send(&relay, &a, ClientEvent::Meow).await;
    send(
        &relay,
        &a,
        ClientEvent::Trap {
            kind: "death".into(),
            position: Vec2::new(1.0, 2.0),
        },
    )
    .await;
    send(&relay, &a, ClientEvent::Winning).await;
    settle(&relay).await;

    let to_a = a.drain();
    let to_b = b.drain();

    // Only the win comes back to the sender.
    assert_eq!(
        to_a,
        vec![ServerEvent::Winned {
            id: a.id,
            name: "Alice".into()
        }]
    );
    let names: Vec<_> = to_b.iter().map(ServerEvent::name).collect();
    assert_eq!(
        names,
        vec![
            "player:animated",
            "player:meow",
            "player:trapped",
            "player:winned"
        ]
    );
}

#[tokio::test]
async fn test_move_before_register_is_dropped() {
    let relay = spawn_relay(HubConfig::default());
    let a = attach(&relay, 1).await;
    let mut b = attach(&relay, 2).await;
    send(&relay, &b, register("Bob")).await;
    settle(&relay).await;
    b.drain();

    send(
        &relay,
        &a,
        ClientEvent::Move {
            position: Vec2::new(1.0, 1.0),
            flip: Flip::default(),
            progress: Some(50.0),
        },
    )
    .await;
    let info = relay.info().await.unwrap();

    assert!(b.drain().is_empty());
    assert_eq!(info.players.len(), 1);
    assert_eq!(info.players[0].id, b.id);
}

#[tokio::test]
async fn test_hazard_count_matches_trap_reports() {
    let relay = spawn_relay(HubConfig::default());
    let a = attach(&relay, 1).await;
    let b = attach(&relay, 2).await;

    let mut last = 0;
    for i in 0..5 {
        let who = if i % 2 == 0 { &a } else { &b };
        send(
            &relay,
            who,
            ClientEvent::Trap {
                kind: "death".into(),
                position: Vec2::new(50.0, 50.0),
            },
        )
        .await;
        let info = relay.info().await.unwrap();
        assert!(info.hazards >= last);
        last = info.hazards;
    }
    assert_eq!(last, 5);
}

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let relay = spawn_relay(HubConfig::default());
    let a = attach(&relay, 1).await;
    let mut b = attach(&relay, 2).await;
    send(&relay, &a, register("Alice")).await;
    settle(&relay).await;
    b.drain();

    relay.disconnect(a.id).await.unwrap();
    relay.disconnect(a.id).await.unwrap();
    settle(&relay).await;

    assert_eq!(b.drain(), vec![ServerEvent::Unspawn { id: a.id }]);
    assert_eq!(relay.info().await.unwrap().connections, 1);
}

#[tokio::test]
async fn test_unregistered_disconnect_sends_nothing() {
    let relay = spawn_relay(HubConfig::default());
    let a = attach(&relay, 1).await;
    let mut b = attach(&relay, 2).await;

    relay.disconnect(a.id).await.unwrap();
    settle(&relay).await;

    assert!(b.drain().is_empty());
}

#[tokio::test]
async fn test_independent_relays_do_not_share_state() {
    let first = spawn_relay(HubConfig::default());
    let second = spawn_relay(HubConfig::default());
    let a = attach(&first, 1).await;
    send(&first, &a, register("Alice")).await;

    assert_eq!(first.info().await.unwrap().players.len(), 1);
    assert!(second.info().await.unwrap().players.is_empty());
}

#[tokio::test]
async fn test_custom_fallback_name() {
    let relay = spawn_relay(HubConfig {
        fallback_name: "Stray".into(),
        ..HubConfig::default()
    });
    let a = attach(&relay, 1).await;
    send(&relay, &a, ClientEvent::Register { name: None }).await;

    let info = relay.info().await.unwrap();
    assert_eq!(info.players[0].name, "Stray");
}

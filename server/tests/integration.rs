//! Integration tests for the relay server.
//!
//! These tests start a real server instance and connect via WebSocket
//! to verify end-to-end behavior.

use futures_util::{SinkExt, StreamExt};
use shooter_server::config::ServerConfig;
use shooter_shared::{ClientMsg, ServerMsg, Vec3};
use std::collections::HashSet;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::{connect_async, tungstenite::Message};

type Ws =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

fn test_config() -> ServerConfig {
    ServerConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        static_dir: None,
        ..Default::default()
    }
}

/// Start a test server on a random available port and return its address.
async fn start_test_server() -> String {
    start_test_server_with(test_config()).await
}

async fn start_test_server_with(config: ServerConfig) -> String {
    let listener = TcpListener::bind(&config.listen_addr).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let relay_tx = shooter_server::relay::spawn_relay(&config);
    let app = shooter_server::ws::app(&config, relay_tx);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr.to_string()
}

async fn connect(addr: &str) -> Ws {
    let (ws, _) = connect_async(format!("ws://{}/ws", addr))
        .await
        .expect("Failed to connect");
    ws
}

/// Read the next text message and parse as ServerMsg.
async fn recv_msg(ws: &mut Ws) -> ServerMsg {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                return ServerMsg::decode(&text).expect("Failed to parse server message");
            }
            Some(Ok(_)) => continue, // Skip ping/pong
            Some(Err(e)) => panic!("WebSocket error: {}", e),
            None => panic!("WebSocket closed unexpectedly"),
        }
    }
}

/// Read the next text message with a timeout.
async fn recv_msg_timeout(ws: &mut Ws, timeout: Duration) -> Option<ServerMsg> {
    tokio::time::timeout(timeout, recv_msg(ws)).await.ok()
}

/// Wait for the server to end the connection.
async fn expect_closed(ws: &mut Ws) {
    let closed = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "Server kept the connection open");
}

async fn send(ws: &mut Ws, msg: &ClientMsg) {
    let json = serde_json::to_string(msg).unwrap();
    ws.send(Message::Text(json.into())).await.unwrap();
}

async fn expect_init(ws: &mut Ws) -> (String, Vec<String>) {
    match recv_msg(ws).await {
        ServerMsg::Init(init) => (
            init.your_id,
            init.players.into_iter().map(|p| p.id).collect(),
        ),
        other => panic!("Expected Init, got {:?}", other),
    }
}

async fn expect_spawn(ws: &mut Ws) -> String {
    match recv_msg(ws).await {
        ServerMsg::Spawn(spawn) => spawn.player.id,
        other => panic!("Expected Spawn, got {:?}", other),
    }
}

fn input(x: f64) -> ClientMsg {
    ClientMsg::Input {
        x,
        y: 2.0,
        z: 3.0,
        rot_y: 0.25,
        rot_x: 0.0,
    }
}

/// Three connected clients with all join traffic already consumed.
async fn three_clients(addr: &str) -> [(Ws, String); 3] {
    let mut a = connect(addr).await;
    let (id_a, _) = expect_init(&mut a).await;

    let mut b = connect(addr).await;
    let (id_b, _) = expect_init(&mut b).await;
    assert_eq!(expect_spawn(&mut a).await, id_b);

    let mut c = connect(addr).await;
    let (id_c, _) = expect_init(&mut c).await;
    assert_eq!(expect_spawn(&mut a).await, id_c);
    assert_eq!(expect_spawn(&mut b).await, id_c);

    [(a, id_a), (b, id_b), (c, id_c)]
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_connect_and_receive_init() {
    let addr = start_test_server().await;
    let mut ws = connect(&addr).await;

    match recv_msg(&mut ws).await {
        ServerMsg::Init(init) => {
            assert!(!init.your_id.is_empty());
            assert_eq!(init.players.len(), 1, "players should include self");
            let me = &init.players[0];
            assert_eq!(me.id, init.your_id);
            assert_eq!((me.x, me.y, me.z), (0.0, 2.0, 0.0));
            assert_eq!((me.scale_x, me.scale_y, me.scale_z), (1.0, 1.0, 1.0));
        }
        other => panic!("Expected Init, got {:?}", other),
    }
}

#[tokio::test]
async fn test_root_path_accepts_upgrade() {
    let addr = start_test_server().await;
    let (mut ws, _) = connect_async(format!("ws://{}", addr))
        .await
        .expect("Failed to connect");
    assert!(matches!(recv_msg(&mut ws).await, ServerMsg::Init(_)));
}

#[tokio::test]
async fn test_multiple_clients_get_unique_ids() {
    let addr = start_test_server().await;
    let [(_a, id_a), (_b, id_b), (_c, id_c)] = three_clients(&addr).await;

    let ids: HashSet<_> = [id_a, id_b, id_c].into_iter().collect();
    assert_eq!(ids.len(), 3, "Each client should get a unique ID");
}

#[tokio::test]
async fn test_init_lists_existing_players() {
    let addr = start_test_server().await;
    let mut a = connect(&addr).await;
    let (id_a, _) = expect_init(&mut a).await;

    let mut b = connect(&addr).await;
    let (id_b, players) = expect_init(&mut b).await;

    let players: HashSet<_> = players.into_iter().collect();
    assert_eq!(players, HashSet::from([id_a, id_b]));
}

#[tokio::test]
async fn test_shoot_reaches_others_but_not_shooter() {
    let addr = start_test_server().await;
    let [(mut a, id_a), (mut b, _), (mut c, _)] = three_clients(&addr).await;

    send(
        &mut a,
        &ClientMsg::Shoot {
            origin: Vec3::new(0.0, 1.6, 0.0),
            direction: Vec3::new(0.0, 0.0, -1.0),
            hit_id: Some("nobody".to_string()),
        },
    )
    .await;

    for ws in [&mut b, &mut c] {
        match recv_msg(ws).await {
            ServerMsg::PlayerFired(fired) => {
                assert_eq!(fired.id, id_a);
                assert_eq!(fired.origin, Vec3::new(0.0, 1.6, 0.0));
                assert_eq!(fired.direction, Vec3::new(0.0, 0.0, -1.0));
            }
            other => panic!("Expected PlayerFired, got {:?}", other),
        }
        assert!(recv_msg_timeout(ws, Duration::from_millis(100)).await.is_none());
    }

    assert!(
        recv_msg_timeout(&mut a, Duration::from_millis(200)).await.is_none(),
        "Shooter must not receive its own playerFired"
    );
}

#[tokio::test]
async fn test_input_broadcasts_update_to_everyone() {
    let addr = start_test_server().await;
    let [(mut a, id_a), (mut b, _), (mut c, _)] = three_clients(&addr).await;

    send(&mut a, &input(5.0)).await;

    // Sender included: the relay echoes updates by default.
    for ws in [&mut a, &mut b, &mut c] {
        match recv_msg(ws).await {
            ServerMsg::Update(update) => {
                assert_eq!(update.player.id, id_a);
                assert_eq!(update.player.x, 5.0);
                assert_eq!(update.player.rot_y, 0.25);
            }
            other => panic!("Expected Update, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_inputs_from_one_client_arrive_in_order() {
    let addr = start_test_server().await;
    let mut a = connect(&addr).await;
    expect_init(&mut a).await;
    let mut b = connect(&addr).await;
    expect_init(&mut b).await;
    expect_spawn(&mut a).await;

    for i in 0..20 {
        send(&mut a, &input(i as f64)).await;
    }
    for i in 0..20 {
        match recv_msg(&mut b).await {
            ServerMsg::Update(update) => assert_eq!(update.player.x, i as f64),
            other => panic!("Expected Update, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_disconnect_despawns_player() {
    let addr = start_test_server().await;
    let [(mut a, id_a), (mut b, _), (mut c, _)] = three_clients(&addr).await;

    a.close(None).await.unwrap();

    for ws in [&mut b, &mut c] {
        match recv_msg(ws).await {
            ServerMsg::Despawn(despawn) => assert_eq!(despawn.id, id_a),
            other => panic!("Expected Despawn, got {:?}", other),
        }
    }

    // A newcomer no longer sees the departed player.
    let mut d = connect(&addr).await;
    let (_, players) = expect_init(&mut d).await;
    assert!(!players.contains(&id_a));
    assert_eq!(players.len(), 3);
}

#[tokio::test]
async fn test_malformed_payload_keeps_connection_open() {
    let addr = start_test_server().await;
    let mut a = connect(&addr).await;
    let (id_a, _) = expect_init(&mut a).await;

    for bad in [
        "not valid json",
        r#"{"x":1}"#,
        r#"{"type":"input","x":"one"}"#,
        r#"{"type":"teleport","x":100}"#,
    ] {
        a.send(Message::Text(bad.into())).await.unwrap();
    }
    assert!(
        recv_msg_timeout(&mut a, Duration::from_millis(200)).await.is_none(),
        "Bad payloads get no reply"
    );

    send(&mut a, &input(7.0)).await;
    match recv_msg(&mut a).await {
        ServerMsg::Update(update) => {
            assert_eq!(update.player.id, id_a);
            assert_eq!(update.player.x, 7.0);
        }
        other => panic!("Expected Update, got {:?}", other),
    }
}

#[tokio::test]
async fn test_binary_text_frame_is_accepted() {
    let addr = start_test_server().await;
    let mut a = connect(&addr).await;
    let (id_a, _) = expect_init(&mut a).await;

    let json = serde_json::to_string(&input(4.5)).unwrap();
    a.send(Message::Binary(json.into_bytes().into())).await.unwrap();

    match recv_msg(&mut a).await {
        ServerMsg::Update(update) => {
            assert_eq!(update.player.id, id_a);
            assert_eq!(update.player.x, 4.5);
        }
        other => panic!("Expected Update, got {:?}", other),
    }
}

#[tokio::test]
async fn test_oversized_frame_ends_connection() {
    let addr = start_test_server_with(ServerConfig {
        max_message_bytes: 512,
        ..test_config()
    })
    .await;

    let mut a = connect(&addr).await;
    let (id_a, _) = expect_init(&mut a).await;
    let mut b = connect(&addr).await;
    expect_init(&mut b).await;
    assert!(matches!(recv_msg(&mut a).await, ServerMsg::Spawn(_)));

    // Small frames are still fine.
    send(&mut a, &input(1.0)).await;
    for ws in [&mut a, &mut b] {
        assert!(matches!(recv_msg(ws).await, ServerMsg::Update(_)));
    }

    let oversized = format!(r#"{{"type":"teleport","pad":"{}"}}"#, "x".repeat(1024));
    let _ = a.send(Message::Text(oversized.into())).await;

    expect_closed(&mut a).await;
    match recv_msg_timeout(&mut b, Duration::from_secs(2)).await {
        Some(ServerMsg::Despawn(despawn)) => assert_eq!(despawn.id, id_a),
        other => panic!("Expected Despawn, got {:?}", other),
    }
}

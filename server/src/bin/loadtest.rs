//! Load test for the relay server.
//!
//! Spawns multiple fake WebSocket clients that:
//! - Connect to the server and wait for `init`
//! - Send `input` at a fixed rate, walking in a small circle
//! - Occasionally send `shoot`
//! - Count every message they receive, by type
//!
//! Usage: cargo run --bin loadtest -- [OPTIONS]
//!
//! Options:
//!   --clients N      Number of clients to spawn (default: 50)
//!   --duration S     Test duration in seconds (default: 30)
//!   --rate R         Input messages per second per client (default: 20)
//!   --url URL        Server URL (default: ws://127.0.0.1:3000/ws)

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use shooter_shared::{ClientMsg, Pose, Vec3};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Shots per input message (roughly one shot every few seconds).
const SHOOT_EVERY_N_INPUTS: u64 = 50;

#[derive(Deserialize)]
struct Tagged {
    #[serde(rename = "type")]
    kind: String,
}

// === Metrics ===

#[derive(Default)]
struct Metrics {
    connected: AtomicU64,
    messages_received: AtomicU64,
    inits: AtomicU64,
    spawns: AtomicU64,
    updates: AtomicU64,
    despawns: AtomicU64,
    fired: AtomicU64,
    inputs_sent: AtomicU64,
    shots_sent: AtomicU64,
    errors: AtomicU64,
    latency_sum_ms: AtomicU64,
    latency_count: AtomicU64,
}

impl Metrics {
    fn record(&self, text: &str) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        let Ok(tagged) = serde_json::from_str::<Tagged>(text) else {
            self.errors.fetch_add(1, Ordering::Relaxed);
            return;
        };
        let counter = match tagged.kind.as_str() {
            "init" => &self.inits,
            "spawn" => &self.spawns,
            "update" => &self.updates,
            "despawn" => &self.despawns,
            "playerFired" => &self.fired,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

// === Client task ===

async fn run_client(client_id: u32, url: String, rate: f64, duration: Duration, metrics: Arc<Metrics>) {
    let connect_start = Instant::now();

    let (mut ws, _) = match connect_async(&url).await {
        Ok(conn) => conn,
        Err(e) => {
            if client_id < 5 {
                eprintln!("Client {} failed to connect: {}", client_id, e);
            }
            metrics.errors.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };

    // Connect latency is measured up to the init message.
    let got_init = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(msg) = ws.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    metrics.record(&text);
                    if text.contains("\"type\":\"init\"") {
                        return true;
                    }
                }
                Ok(Message::Close(_)) | Err(_) => return false,
                _ => {}
            }
        }
        false
    })
    .await;

    if !matches!(got_init, Ok(true)) {
        if client_id < 3 {
            eprintln!("Client {} never got init", client_id);
        }
        metrics.errors.fetch_add(1, Ordering::Relaxed);
        return;
    }

    metrics
        .latency_sum_ms
        .fetch_add(connect_start.elapsed().as_millis() as u64, Ordering::Relaxed);
    metrics.latency_count.fetch_add(1, Ordering::Relaxed);
    metrics.connected.fetch_add(1, Ordering::Relaxed);

    let input_interval = Duration::from_secs_f64(1.0 / rate.max(0.1));
    let mut input_timer = tokio::time::interval(input_interval);
    input_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let test_end = Instant::now() + duration;
    let phase = client_id as f64 * 0.37;
    let mut sent: u64 = 0;

    loop {
        if Instant::now() >= test_end {
            break;
        }

        tokio::select! {
            _ = input_timer.tick() => {
                let t = sent as f64 * input_interval.as_secs_f64() + phase;
                let pose = Pose::new(Vec3::new(5.0 * t.cos(), 2.0, 5.0 * t.sin()), t, 0.0);
                let mut outgoing = vec![pose.to_input()];
                if sent % SHOOT_EVERY_N_INPUTS == SHOOT_EVERY_N_INPUTS - 1 {
                    outgoing.push(ClientMsg::Shoot {
                        origin: pose.position,
                        direction: shooter_shared::vec3::look_direction(pose.yaw, pose.pitch),
                        hit_id: None,
                    });
                }
                sent += 1;

                let mut failed = false;
                for msg in outgoing {
                    let Ok(json) = serde_json::to_string(&msg) else { continue };
                    if ws.send(Message::Text(json.into())).await.is_err() {
                        failed = true;
                        break;
                    }
                    let counter = match msg {
                        ClientMsg::Input { .. } => &metrics.inputs_sent,
                        ClientMsg::Shoot { .. } => &metrics.shots_sent,
                    };
                    counter.fetch_add(1, Ordering::Relaxed);
                }
                if failed {
                    metrics.errors.fetch_add(1, Ordering::Relaxed);
                    break;
                }
            }

            msg = ws.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => metrics.record(&text),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        if client_id < 3 {
                            eprintln!("Client {} error: {}", client_id, e);
                        }
                        metrics.errors.fetch_add(1, Ordering::Relaxed);
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    let _ = ws.close(None).await;
    metrics.connected.fetch_sub(1, Ordering::Relaxed);
}

// === Main ===

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut num_clients: u32 = 50;
    let mut duration_secs: u64 = 30;
    let mut rate: f64 = 20.0;
    let mut url = "ws://127.0.0.1:3000/ws".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--clients" => {
                i += 1;
                num_clients = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(50);
            }
            "--duration" => {
                i += 1;
                duration_secs = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(30);
            }
            "--rate" => {
                i += 1;
                rate = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(20.0);
            }
            "--url" => {
                i += 1;
                url = args.get(i).cloned().unwrap_or(url);
            }
            _ => {}
        }
        i += 1;
    }

    println!("=== Relay Load Test ===");
    println!("Clients: {}", num_clients);
    println!("Duration: {}s", duration_secs);
    println!("Input rate: {}/s per client", rate);
    println!("URL: {}", url);
    println!();

    let metrics = Arc::new(Metrics::default());
    let duration = Duration::from_secs(duration_secs);

    let mut handles = Vec::with_capacity(num_clients as usize);
    let spawn_start = Instant::now();

    for client_id in 0..num_clients {
        let url = url.clone();
        let metrics = Arc::clone(&metrics);
        handles.push(tokio::spawn(async move {
            run_client(client_id, url, rate, duration, metrics).await;
        }));

        // Stagger spawns slightly to avoid thundering herd
        if client_id % 50 == 49 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    println!("All clients spawned in {:?}", spawn_start.elapsed());
    println!();

    // Print stats periodically
    let metrics_clone = Arc::clone(&metrics);
    let stats_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        let start = Instant::now();
        loop {
            interval.tick().await;
            let m = &metrics_clone;
            println!(
                "[{:3}s] connected={}, msgs={}, updates={}, fired={}, inputs_sent={}, errors={}",
                start.elapsed().as_secs(),
                m.connected.load(Ordering::Relaxed),
                m.messages_received.load(Ordering::Relaxed),
                m.updates.load(Ordering::Relaxed),
                m.fired.load(Ordering::Relaxed),
                m.inputs_sent.load(Ordering::Relaxed),
                m.errors.load(Ordering::Relaxed),
            );
        }
    });

    for handle in handles {
        let _ = handle.await;
    }
    stats_handle.abort();

    // Final stats
    let m = &metrics;
    println!();
    println!("=== Final Results ===");
    println!("Total messages received: {}", m.messages_received.load(Ordering::Relaxed));
    println!(
        "init={} spawn={} update={} despawn={} playerFired={}",
        m.inits.load(Ordering::Relaxed),
        m.spawns.load(Ordering::Relaxed),
        m.updates.load(Ordering::Relaxed),
        m.despawns.load(Ordering::Relaxed),
        m.fired.load(Ordering::Relaxed),
    );
    let inputs = m.inputs_sent.load(Ordering::Relaxed);
    println!("Total input sent: {}", inputs);
    println!("Total shoot sent: {}", m.shots_sent.load(Ordering::Relaxed));
    println!("Total errors: {}", m.errors.load(Ordering::Relaxed));

    let latency_count = m.latency_count.load(Ordering::Relaxed);
    if latency_count > 0 {
        println!(
            "Average connect latency: {}ms",
            m.latency_sum_ms.load(Ordering::Relaxed) / latency_count
        );
    }

    // With echo on, every input fans out to every connected client.
    let expected_updates = inputs * num_clients as u64;
    if expected_updates > 0 {
        let delivery_rate = m.updates.load(Ordering::Relaxed) as f64 / expected_updates as f64 * 100.0;
        println!("Update delivery rate: {:.1}%", delivery_rate);
    }
}

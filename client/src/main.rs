use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use shooter_client::game::bot::{CircleWalker, LogScene, SphereHitTester};
use shooter_client::game::ClientSession;
use shooter_client::net::types::ConnectionState;
use tracing_subscriber::EnvFilter;

const FRAME: Duration = Duration::from_millis(16);
const FIRE_EVERY: Duration = Duration::from_secs(2);

fn ws_url_from_env() -> anyhow::Result<String> {
    let raw = std::env::var("SHOOTER_WS_URL").unwrap_or_else(|_| {
        format!(
            "ws://127.0.0.1:{}/ws",
            shooter_shared::config::DEFAULT_PORT
        )
    });
    let url = url::Url::parse(&raw).with_context(|| format!("invalid SHOOTER_WS_URL {raw:?}"))?;
    match url.scheme() {
        "ws" | "wss" => Ok(url.into()),
        other => bail!("SHOOTER_WS_URL must use ws:// or wss://, got {other}://"),
    }
}

fn run_for_from_env() -> anyhow::Result<Option<Duration>> {
    match std::env::var("SHOOTER_BOT_SECONDS") {
        Ok(s) => {
            let secs: u64 = s
                .parse()
                .with_context(|| format!("invalid SHOOTER_BOT_SECONDS {s:?}"))?;
            Ok(Some(Duration::from_secs(secs)))
        }
        Err(_) => Ok(None),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let url = ws_url_from_env()?;
    let run_for = run_for_from_env()?;

    let mut session = ClientSession::connect(url);
    let mut walker = CircleWalker::default();
    let mut scene = LogScene::default();
    let hits = SphereHitTester::default();

    let started = Instant::now();
    let mut last_frame = started;
    let mut last_shot = started;

    loop {
        let now = Instant::now();
        walker.update(now.duration_since(last_frame).as_secs_f64());
        last_frame = now;

        session.frame(&walker, &mut scene);

        if session.state() == ConnectionState::Disconnected {
            break;
        }

        if now.duration_since(last_shot) >= FIRE_EVERY {
            let (origin, direction) = walker.aim();
            if session.fire(origin, direction, &hits) {
                last_shot = now;
            }
        }

        if run_for.is_some_and(|limit| started.elapsed() >= limit) {
            break;
        }

        std::thread::sleep(FRAME);
    }

    let agent = session.agent();
    tracing::info!(
        "Bot done: {} inputs, {} shots, {} players seen, {} remote shots",
        agent.inputs_sent(),
        agent.shots_sent(),
        scene.spawned,
        scene.shots_seen
    );
    Ok(())
}

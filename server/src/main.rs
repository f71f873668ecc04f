use anyhow::Context;
use shooter_server::config::ServerConfig;
use shooter_server::relay::spawn_relay;
use shooter_server::ws;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env();

    // Validate configuration before starting
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid server configuration: {}", e))?;

    let relay_tx = spawn_relay(&config);
    let app = ws::app(&config, relay_tx);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

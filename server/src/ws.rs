use std::path::Path;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use shooter_shared::ClientMsg;
use tokio::sync::{mpsc, oneshot};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::config::ServerConfig;
use crate::relay::RelayCommand;

/// Shared app state passed to each WebSocket handler
#[derive(Clone)]
pub struct AppState {
    pub relay_tx: mpsc::Sender<RelayCommand>,
    pub outbound_buffer: usize,
    pub max_message_bytes: usize,
}

/// HTTP app: WebSocket upgrades on the configured path and on `/`, plus the
/// static browser client when its directory exists.
pub fn app(config: &ServerConfig, relay_tx: mpsc::Sender<RelayCommand>) -> Router {
    let state = AppState {
        relay_tx,
        outbound_buffer: config.outbound_buffer,
        max_message_bytes: config.max_message_bytes,
    };

    let mut router = Router::new().route(&config.ws_path, get(ws_handler));
    if config.ws_path != "/" {
        router = router.route("/", get(root_handler));
    }

    match config.static_dir.as_deref().filter(|dir| dir.is_dir()) {
        Some(dir) => {
            tracing::info!("Serving static client from {}", dir.display());
            router = router.fallback_service(static_files(dir));
        }
        None => tracing::info!("No static client directory; serving WebSocket only"),
    }

    router.layer(CorsLayer::permissive()).with_state(state)
}

fn static_files(dir: &Path) -> ServeDir {
    ServeDir::new(dir).append_index_html_on_directories(true)
}

/// HTTP handler for WebSocket upgrade
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<AppState>) -> Response {
    upgrade(ws, app_state)
}

/// The browser client connects to the bare host, so `/` upgrades too.
/// Plain page loads go to the static index.
async fn root_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(app_state): State<AppState>,
) -> Response {
    match ws {
        Ok(ws) => upgrade(ws, app_state),
        Err(_) => Redirect::temporary("/index.html").into_response(),
    }
}

fn upgrade(ws: WebSocketUpgrade, app_state: AppState) -> Response {
    ws.max_message_size(app_state.max_message_bytes)
        .on_upgrade(|socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<Utf8Bytes>(app_state.outbound_buffer);

    // Join the relay
    let (resp_tx, resp_rx) = oneshot::channel();
    if app_state
        .relay_tx
        .send(RelayCommand::Join {
            outbound: out_tx,
            response: resp_tx,
        })
        .await
        .is_err()
    {
        tracing::error!("Failed to send Join command");
        return;
    }

    let my_id = match resp_rx.await {
        Ok(Ok(id)) => id,
        Ok(Err(e)) => {
            tracing::warn!("Connection rejected: {}", e);
            let _ = sink.close().await;
            return;
        }
        Err(_) => {
            tracing::error!("Relay dropped the join request");
            return;
        }
    };

    // Relay -> Client. Ends when the relay drops our queue or the peer is gone.
    let mut writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if sink.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    // Client -> Relay
    loop {
        tokio::select! {
            msg = stream.next() => {
                let decoded = match msg {
                    Some(Ok(Message::Text(text))) => ClientMsg::decode(text.as_str()),
                    Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                        Ok(text) => ClientMsg::decode(text),
                        Err(_) => {
                            tracing::warn!("Player {} sent non-UTF-8 binary frame", my_id);
                            continue;
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!("Player {} transport error: {}", my_id, e);
                        break;
                    }
                    Some(Ok(_)) => continue, // ping/pong
                };

                match decoded {
                    Ok(msg) => {
                        let cmd = RelayCommand::Message { id: my_id.clone(), msg };
                        if app_state.relay_tx.send(cmd).await.is_err() {
                            tracing::error!("Relay task is gone");
                            break;
                        }
                    }
                    Err(e) if e.is_unknown_type() => {
                        tracing::debug!("Player {}: {}", my_id, e);
                    }
                    Err(e) => {
                        tracing::warn!("Player {} sent bad payload: {}", my_id, e);
                    }
                }
            }

            _ = &mut writer => {
                tracing::debug!("Player {} writer finished", my_id);
                break;
            }
        }
    }

    // Cleanup on disconnect
    let _ = app_state
        .relay_tx
        .send(RelayCommand::Leave { id: my_id.clone() })
        .await;
}

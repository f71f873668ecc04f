use std::sync::mpsc::{self, Receiver, Sender};

use shooter_shared::{ClientMsg, ServerMsg};

use super::types::ConnectionState;
use crate::game::collab::MessageSink;

#[derive(Debug, Clone)]
pub enum NetEvent {
    Connected,
    Disconnected,
    Message(ServerMsg),
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("not connected to the relay")]
    NotConnected,
}

type CmdSender = tokio::sync::mpsc::UnboundedSender<ClientMsg>;

/// WebSocket link to the relay.
///
/// The socket lives on a background thread with its own runtime. Inbound
/// events queue up until [`ServerConnection::poll_events`] drains them once per
/// frame; outbound messages are queued without blocking. The link is not
/// re-established after it drops.
pub struct ServerConnection {
    state: ConnectionState,
    event_rx: Receiver<NetEvent>,
    cmd_tx: Option<CmdSender>,
}

impl ServerConnection {
    pub fn new(url: String) -> Self {
        let (event_tx, event_rx) = mpsc::channel::<NetEvent>();
        let cmd_tx = spawn_network_thread(url, event_tx);
        Self {
            state: ConnectionState::Connecting,
            event_rx,
            cmd_tx: Some(cmd_tx),
        }
    }

    /// A connection fed by hand instead of a socket.
    pub fn detached() -> (
        Self,
        Sender<NetEvent>,
        tokio::sync::mpsc::UnboundedReceiver<ClientMsg>,
    ) {
        let (event_tx, event_rx) = mpsc::channel::<NetEvent>();
        let (cmd_tx, cmd_rx) = tokio::sync::mpsc::unbounded_channel();
        let conn = Self {
            state: ConnectionState::Connecting,
            event_rx,
            cmd_tx: Some(cmd_tx),
        };
        (conn, event_tx, cmd_rx)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Drain everything received since the last call, in arrival order.
    pub fn poll_events(&mut self) -> Vec<NetEvent> {
        let mut out = Vec::new();
        while let Ok(evt) = self.event_rx.try_recv() {
            match evt {
                NetEvent::Connected => self.state = ConnectionState::Connected,
                NetEvent::Disconnected => self.state = ConnectionState::Disconnected,
                NetEvent::Message(_) => {}
            }
            out.push(evt);
        }
        out
    }
}

impl MessageSink for ServerConnection {
    fn is_open(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    fn send(&self, msg: ClientMsg) -> Result<(), SendError> {
        let tx = self.cmd_tx.as_ref().ok_or(SendError::NotConnected)?;
        tx.send(msg).map_err(|_| SendError::NotConnected)
    }
}

fn spawn_network_thread(url: String, event_tx: Sender<NetEvent>) -> CmdSender {
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    let (cmd_tx, mut cmd_rx) = tokio::sync::mpsc::unbounded_channel::<ClientMsg>();

    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!("Failed to build network runtime: {}", e);
                let _ = event_tx.send(NetEvent::Disconnected);
                return;
            }
        };

        rt.block_on(async move {
            tracing::info!("Connecting to: {}", url);
            let ws_stream = match tokio_tungstenite::connect_async(url.as_str()).await {
                Ok((ws_stream, _)) => ws_stream,
                Err(e) => {
                    tracing::warn!("Failed to connect to {}: {}", url, e);
                    let _ = event_tx.send(NetEvent::Disconnected);
                    return;
                }
            };

            tracing::info!("Connected to game server");
            let _ = event_tx.send(NetEvent::Connected);

            let (mut write, mut read) = ws_stream.split();

            loop {
                tokio::select! {
                    biased;

                    cmd = cmd_rx.recv() => {
                        let Some(cmd) = cmd else {
                            // ServerConnection dropped.
                            let _ = write.close().await;
                            break;
                        };
                        match serde_json::to_string(&cmd) {
                            Ok(text) => {
                                if write.send(Message::Text(text.into())).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => tracing::warn!("Failed to encode {:?}: {}", cmd, e),
                        }
                    }

                    msg = read.next() => {
                        match msg {
                            Some(Ok(Message::Text(txt))) => match ServerMsg::decode(&txt) {
                                Ok(server_msg) => {
                                    let _ = event_tx.send(NetEvent::Message(server_msg));
                                }
                                Err(e) if e.is_unknown_type() => tracing::debug!("{}", e),
                                Err(e) => tracing::warn!("Bad message from server: {}", e),
                            },
                            Some(Ok(Message::Close(_))) | None => break,
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                tracing::debug!("WebSocket error: {}", e);
                                break;
                            }
                        }
                    }
                }
            }

            tracing::info!("Disconnected from game server");
            let _ = event_tx.send(NetEvent::Disconnected);
        });
    });

    cmd_tx
}

use shooter_shared::protocol::{DespawnMsg, InitMsg, PlayerFiredMsg, SpawnMsg, UpdateMsg};
use shooter_shared::{ClientMsg, PlayerId, PlayerWire, Pose, ServerMsg, Vec3};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::registry::{PlayerRegistry, RegistryError};
use crate::router::{BroadcastRouter, Delivery, Outbound};

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Commands from connection tasks to the relay task
pub enum RelayCommand {
    Join {
        outbound: Outbound,
        response: oneshot::Sender<Result<PlayerId, RelayError>>,
    },
    Message {
        id: PlayerId,
        msg: ClientMsg,
    },
    Leave {
        id: PlayerId,
    },
}

/// Registry plus connection set, driven by decoded client messages.
pub struct Relay {
    registry: PlayerRegistry,
    router: BroadcastRouter,
    echo_updates_to_sender: bool,
}

impl Relay {
    pub fn new(echo_updates_to_sender: bool) -> Self {
        Self {
            registry: PlayerRegistry::new(),
            router: BroadcastRouter::new(),
            echo_updates_to_sender,
        }
    }

    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    pub fn connection_count(&self) -> usize {
        self.router.len()
    }

    /// Accept a new connection under a fresh id.
    pub fn join(&mut self, outbound: Outbound) -> Result<PlayerId, RelayError> {
        let id = Uuid::new_v4().to_string();
        self.join_as(id.clone(), outbound)?;
        Ok(id)
    }

    /// Register `id`, send it `init`, then announce it to everyone else.
    /// On a duplicate id nothing is sent and `outbound` is dropped, which
    /// closes that connection.
    pub fn join_as(&mut self, id: PlayerId, outbound: Outbound) -> Result<(), RelayError> {
        let spawned = self.registry.register(id.clone())?.to_wire();
        self.router.add(id.clone(), outbound);

        let init = ServerMsg::Init(InitMsg {
            players: self.registry.snapshot().iter().map(PlayerWire::from).collect(),
            your_id: id.clone(),
        });
        self.router.send(&init, Delivery::Only(&id));
        self.router.send(
            &ServerMsg::Spawn(SpawnMsg { player: spawned }),
            Delivery::AllExcept(&id),
        );

        tracing::info!("Client connected: {} ({} players)", id, self.registry.len());
        Ok(())
    }

    pub fn handle_message(&mut self, id: &str, msg: ClientMsg) {
        match msg {
            ClientMsg::Input {
                x,
                y,
                z,
                rot_y,
                rot_x,
            } => {
                let pose = Pose::new(Vec3::new(x, y, z), rot_y, rot_x);
                self.handle_input(id, pose);
            }
            ClientMsg::Shoot {
                origin,
                direction,
                hit_id,
            } => self.handle_shoot(id, origin, direction, hit_id),
        }
    }

    fn handle_input(&mut self, id: &str, pose: Pose) {
        let Some(player) = self.registry.apply_input(id, pose) else {
            tracing::debug!("Input from unknown player {} dropped", id);
            return;
        };
        let update = ServerMsg::Update(UpdateMsg {
            player: player.to_wire(),
        });
        let delivery = if self.echo_updates_to_sender {
            Delivery::All
        } else {
            Delivery::AllExcept(id)
        };
        self.router.send(&update, delivery);
    }

    fn handle_shoot(&mut self, id: &str, origin: Vec3, direction: Vec3, hit_id: Option<String>) {
        if !self.registry.contains(id) {
            tracing::debug!("Shot from unknown player {} dropped", id);
            return;
        }
        if let Some(target) = &hit_id {
            tracing::debug!("Player {} reports a hit on {}", id, target);
        }
        let fired = ServerMsg::PlayerFired(PlayerFiredMsg {
            id: id.to_string(),
            origin,
            direction,
        });
        self.router.send(&fired, Delivery::AllExcept(id));
    }

    /// Remove a closed connection and tell everyone. Returns false if it was
    /// already gone, in which case nothing is broadcast.
    pub fn leave(&mut self, id: &str) -> bool {
        self.router.remove(id);
        if self.registry.unregister(id).is_none() {
            tracing::debug!("Leave for unknown player {}", id);
            return false;
        }
        self.router.send(
            &ServerMsg::Despawn(DespawnMsg { id: id.to_string() }),
            Delivery::All,
        );
        tracing::info!("Client disconnected: {} ({} players)", id, self.registry.len());
        true
    }
}

/// Run the relay. Owns all player state; exits when every command sender is gone.
pub async fn run_relay(mut cmd_rx: mpsc::Receiver<RelayCommand>, mut relay: Relay) {
    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            RelayCommand::Join { outbound, response } => {
                let result = relay.join(outbound);
                if let Err(e) = &result {
                    tracing::warn!("Rejected connection: {}", e);
                }
                let _ = response.send(result);
            }
            RelayCommand::Message { id, msg } => relay.handle_message(&id, msg),
            RelayCommand::Leave { id } => {
                relay.leave(&id);
            }
        }
    }

    tracing::info!("Relay loop ended");
}

/// Spawn the relay task and return the handle connections talk to it through.
pub fn spawn_relay(config: &ServerConfig) -> mpsc::Sender<RelayCommand> {
    let (relay_tx, relay_rx) = mpsc::channel::<RelayCommand>(config.command_buffer);
    let relay = Relay::new(config.echo_updates_to_sender);
    tokio::spawn(run_relay(relay_rx, relay));
    relay_tx
}

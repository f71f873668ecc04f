use std::collections::HashMap;

use axum::extract::ws::Utf8Bytes;
use shooter_shared::{PlayerId, ServerMsg};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Outbound queue of one connection, drained by that connection's writer task.
/// Bounded: a peer that stops reading fills only its own queue.
pub type Outbound = mpsc::Sender<Utf8Bytes>;

/// Which connections a message goes to.
#[derive(Debug, Clone, Copy)]
pub enum Delivery<'a> {
    All,
    AllExcept(&'a str),
    Only(&'a str),
}

impl Delivery<'_> {
    fn includes(&self, id: &str) -> bool {
        match self {
            Delivery::All => true,
            Delivery::AllExcept(excluded) => *excluded != id,
            Delivery::Only(target) => *target == id,
        }
    }
}

/// Fan-out of server messages to the open connection set.
#[derive(Debug, Default)]
pub struct BroadcastRouter {
    connections: HashMap<PlayerId, Outbound>,
}

impl BroadcastRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: PlayerId, outbound: Outbound) {
        self.connections.insert(id, outbound);
    }

    /// Drop a connection's queue. Its writer task finishes once the queue is drained.
    pub fn remove(&mut self, id: &str) -> bool {
        self.connections.remove(id).is_some()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.connections.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Serialize `msg` once and queue it for every included connection.
    /// Returns how many connections it was queued for.
    ///
    /// A connection whose queue is full has fallen too far behind to be
    /// brought back in sync (a dropped `spawn` or `despawn` is never resent),
    /// so its queue is dropped. The writer then closes the socket and the
    /// usual leave path despawns the player.
    pub fn send(&mut self, msg: &ServerMsg, delivery: Delivery<'_>) -> usize {
        let frame = match serde_json::to_string(msg) {
            Ok(json) => Utf8Bytes::from(json),
            Err(e) => {
                tracing::error!("Failed to serialize {:?}: {}", msg, e);
                return 0;
            }
        };

        let mut delivered = 0;
        let mut lagging = Vec::new();
        for (id, outbound) in &self.connections {
            if !delivery.includes(id) {
                continue;
            }
            match outbound.try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => lagging.push(id.clone()),
                Err(TrySendError::Closed(_)) => {}
            }
        }

        for id in lagging {
            tracing::warn!("Player {} lagged past its outbound queue, disconnecting", id);
            self.connections.remove(&id);
        }
        delivered
    }
}

use shooter_shared::{ServerMsg, Vec3};

use super::collab::{HitTester, PoseSource, Scene};
use super::sync::LocalSyncAgent;
use crate::net::connection::{NetEvent, ServerConnection};
use crate::net::remote::RemoteEntityCache;
use crate::net::types::ConnectionState;

/// One participant: transport, remote-player cache and local reporting,
/// advanced once per frame by the host loop.
pub struct ClientSession {
    conn: ServerConnection,
    cache: RemoteEntityCache,
    agent: LocalSyncAgent,
}

impl ClientSession {
    pub fn connect(url: impl Into<String>) -> Self {
        Self::new(ServerConnection::new(url.into()))
    }

    pub fn new(conn: ServerConnection) -> Self {
        Self {
            conn,
            cache: RemoteEntityCache::new(),
            agent: LocalSyncAgent::new(),
        }
    }

    pub fn cache(&self) -> &RemoteEntityCache {
        &self.cache
    }

    pub fn agent(&self) -> &LocalSyncAgent {
        &self.agent
    }

    pub fn state(&self) -> ConnectionState {
        self.conn.state()
    }

    pub fn self_id(&self) -> Option<&str> {
        self.cache.self_id()
    }

    /// Apply everything that arrived since the last frame, then report the
    /// local pose.
    pub fn frame(&mut self, pose: &impl PoseSource, scene: &mut impl Scene) {
        for evt in self.conn.poll_events() {
            match evt {
                NetEvent::Connected => {}
                NetEvent::Disconnected => self.agent.on_left(),
                NetEvent::Message(msg) => {
                    for change in self.cache.apply(&msg) {
                        scene.apply(&change);
                    }
                    if let ServerMsg::Init(init) = &msg {
                        tracing::info!(
                            "Joined as {} with {} other players",
                            init.your_id,
                            self.cache.len()
                        );
                        self.agent.on_joined();
                    }
                }
            }
        }

        self.agent.tick(pose, &self.conn);
    }

    pub fn fire(&mut self, origin: Vec3, direction: Vec3, hits: &impl HitTester) -> bool {
        self.agent
            .fire(origin, direction, hits, &self.cache, &self.conn)
    }
}

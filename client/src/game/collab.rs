//! Seams to the parts of the game this crate does not own: physics/movement,
//! raycasting, rendering and the transport.

use shooter_shared::{ClientMsg, PlayerId, Pose, Vec3};

use crate::net::connection::SendError;
use crate::net::remote::RemoteEntityCache;
use crate::net::types::EntityEvent;

/// Movement/physics: where the local player is this frame.
pub trait PoseSource {
    fn local_pose(&self) -> Pose;
}

/// Raycasting against the visuals of known remote players.
pub trait HitTester {
    fn hit_test(&self, origin: Vec3, direction: Vec3, targets: &RemoteEntityCache) -> Option<PlayerId>;
}

/// For frontends without local hit detection.
pub struct NoHitTest;

impl HitTester for NoHitTest {
    fn hit_test(&self, _: Vec3, _: Vec3, _: &RemoteEntityCache) -> Option<PlayerId> {
        None
    }
}

/// Rendering: creates, moves and removes the proxies.
pub trait Scene {
    fn apply(&mut self, event: &EntityEvent);
}

/// Outbound half of the transport.
pub trait MessageSink {
    fn is_open(&self) -> bool;
    fn send(&self, msg: ClientMsg) -> Result<(), SendError>;
}

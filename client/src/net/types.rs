use shooter_shared::{PlayerId, PlayerWire, Vec3};

/// Visual proxy for another participant.
///
/// Only the reconciliation code writes these; the renderer sees them through
/// `&RemoteEntity` or copies carried in [`EntityEvent`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEntity {
    pub id: PlayerId,
    pub position: Vec3,
    pub yaw: f64,
    pub scale: Vec3,
}

impl From<&PlayerWire> for RemoteEntity {
    fn from(p: &PlayerWire) -> Self {
        Self {
            id: p.id.clone(),
            position: Vec3::new(p.x, p.y, p.z),
            yaw: p.rot_y,
            scale: Vec3::new(p.scale_x, p.scale_y, p.scale_z),
        }
    }
}

/// What the scene has to do after a relay event.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityEvent {
    Spawned(RemoteEntity),
    Moved {
        id: PlayerId,
        position: Vec3,
        yaw: f64,
    },
    Despawned(PlayerId),
    Fired {
        id: PlayerId,
        origin: Vec3,
        direction: Vec3,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

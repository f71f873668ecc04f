use shooter_shared::config::DEFAULT_SCALE;
use shooter_shared::{PlayerId, PlayerWire, Pose, Vec3};

/// One connected participant's authoritative state.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub pose: Pose,
    /// Carried on the wire; no message changes it.
    pub scale: Vec3,
}

impl Player {
    /// A freshly connected player standing at the spawn point.
    pub fn spawn(id: PlayerId) -> Self {
        Self {
            id,
            pose: Pose::default(),
            scale: DEFAULT_SCALE,
        }
    }

    pub fn to_wire(&self) -> PlayerWire {
        PlayerWire::from(self)
    }
}

impl From<&Player> for PlayerWire {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id.clone(),
            x: player.pose.position.x,
            y: player.pose.position.y,
            z: player.pose.position.z,
            rot_y: player.pose.yaw,
            rot_x: player.pose.pitch,
            scale_x: player.scale.x,
            scale_y: player.scale.y,
            scale_z: player.scale.z,
        }
    }
}

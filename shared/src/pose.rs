use crate::config::SPAWN_POSITION;
use crate::protocol::{ClientMsg, PlayerWire};
use crate::vec3::Vec3;

/// Position plus yaw (`rotY`) and pitch (`rotX`). There is no roll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub yaw: f64,
    pub pitch: f64,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: SPAWN_POSITION,
            yaw: 0.0,
            pitch: 0.0,
        }
    }
}

impl Pose {
    pub fn new(position: Vec3, yaw: f64, pitch: f64) -> Self {
        Self {
            position,
            yaw,
            pitch,
        }
    }

    /// The `input` message that reports this pose to the relay.
    pub fn to_input(&self) -> ClientMsg {
        ClientMsg::Input {
            x: self.position.x,
            y: self.position.y,
            z: self.position.z,
            rot_y: self.yaw,
            rot_x: self.pitch,
        }
    }
}

impl From<&PlayerWire> for Pose {
    fn from(p: &PlayerWire) -> Self {
        Self {
            position: Vec3::new(p.x, p.y, p.z),
            yaw: p.rot_y,
            pitch: p.rot_x,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pose_is_spawn_point() {
        let pose = Pose::default();
        assert_eq!(pose.position, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(pose.yaw, 0.0);
        assert_eq!(pose.pitch, 0.0);
    }

    #[test]
    fn to_input_carries_every_field() {
        let pose = Pose::new(Vec3::new(1.0, 2.0, 3.0), 0.5, -0.25);
        match pose.to_input() {
            ClientMsg::Input {
                x,
                y,
                z,
                rot_y,
                rot_x,
            } => {
                assert_eq!((x, y, z), (1.0, 2.0, 3.0));
                assert_eq!(rot_y, 0.5);
                assert_eq!(rot_x, -0.25);
            }
            other => panic!("Expected Input, got {:?}", other),
        }
    }
}

use crate::vec3::Vec3;

/// Port the relay listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 3000;

/// Where every player appears when they connect.
pub const SPAWN_POSITION: Vec3 = Vec3::new(0.0, 2.0, 0.0);

/// Scale carried in the player record. Nothing mutates it yet.
pub const DEFAULT_SCALE: Vec3 = Vec3::ONE;

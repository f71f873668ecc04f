//! Headless stand-ins for movement, hit detection and rendering, used by the
//! `shooter-bot` binary.

use shooter_shared::config::SPAWN_POSITION;
use shooter_shared::vec3::{add, dot, look_direction, normalize, sub};
use shooter_shared::{PlayerId, Pose, Vec3};

use super::collab::{HitTester, PoseSource, Scene};
use crate::net::remote::RemoteEntityCache;
use crate::net::types::EntityEvent;

const WALK_RADIUS: f64 = 4.0;
const WALK_SPEED: f64 = 0.5; // rad/s
const EYE_HEIGHT: f64 = 1.6;

/// Walks a circle around the spawn point, always facing along the path.
#[derive(Debug, Clone)]
pub struct CircleWalker {
    center: Vec3,
    radius: f64,
    speed: f64,
    angle: f64,
}

impl Default for CircleWalker {
    fn default() -> Self {
        Self::new(SPAWN_POSITION, WALK_RADIUS, WALK_SPEED)
    }
}

impl CircleWalker {
    pub fn new(center: Vec3, radius: f64, speed: f64) -> Self {
        Self {
            center,
            radius,
            speed,
            angle: 0.0,
        }
    }

    /// Start somewhere else on the circle.
    pub fn with_phase(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    pub fn update(&mut self, dt: f64) {
        self.angle = (self.angle + self.speed * dt) % std::f64::consts::TAU;
    }

    /// Ray for a shot from eye height along the view direction.
    pub fn aim(&self) -> (Vec3, Vec3) {
        let pose = self.local_pose();
        let origin = add(pose.position, Vec3::new(0.0, EYE_HEIGHT, 0.0));
        (origin, look_direction(pose.yaw, pose.pitch))
    }
}

impl PoseSource for CircleWalker {
    fn local_pose(&self) -> Pose {
        let (sin, cos) = self.angle.sin_cos();
        let position = Vec3::new(
            self.center.x + self.radius * cos,
            self.center.y,
            self.center.z + self.radius * sin,
        );
        // Tangent (-sin, 0, cos) expressed as yaw, where yaw 0 looks down -z.
        let yaw = sin.atan2(-cos);
        Pose::new(position, yaw, 0.0)
    }
}

/// Treats every remote player as a sphere around their position.
#[derive(Debug, Clone, Copy)]
pub struct SphereHitTester {
    pub radius: f64,
}

impl Default for SphereHitTester {
    fn default() -> Self {
        Self { radius: 0.5 }
    }
}

impl HitTester for SphereHitTester {
    fn hit_test(&self, origin: Vec3, direction: Vec3, targets: &RemoteEntityCache) -> Option<PlayerId> {
        let dir = normalize(direction);
        let r2 = self.radius * self.radius;

        let mut best: Option<(f64, &PlayerId)> = None;
        for entity in targets.iter() {
            let to_center = sub(entity.position, origin);
            let along = dot(to_center, dir);
            if along < 0.0 {
                continue;
            }
            let miss2 = dot(to_center, to_center) - along * along;
            if miss2 > r2 {
                continue;
            }
            if best.map_or(true, |(t, _)| along < t) {
                best = Some((along, &entity.id));
            }
        }
        best.map(|(_, id)| id.clone())
    }
}

/// Scene that only logs what a renderer would do.
#[derive(Debug, Default)]
pub struct LogScene {
    pub spawned: usize,
    pub despawned: usize,
    pub shots_seen: usize,
}

impl Scene for LogScene {
    fn apply(&mut self, event: &EntityEvent) {
        match event {
            EntityEvent::Spawned(e) => {
                self.spawned += 1;
                tracing::info!("Player {} appeared at {:?}", e.id, e.position);
            }
            EntityEvent::Moved { id, position, .. } => {
                tracing::trace!("Player {} moved to {:?}", id, position);
            }
            EntityEvent::Despawned(id) => {
                self.despawned += 1;
                tracing::info!("Player {} left", id);
            }
            EntityEvent::Fired { id, direction, .. } => {
                self.shots_seen += 1;
                tracing::debug!("Player {} fired toward {:?}", id, direction);
            }
        }
    }
}

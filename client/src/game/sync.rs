use shooter_shared::{ClientMsg, Vec3};

use super::collab::{HitTester, MessageSink, PoseSource};
use crate::net::remote::RemoteEntityCache;

/// Reports the local player to the relay: one `input` per tick, one `shoot`
/// per fire intent. No batching and no rate limiting.
#[derive(Debug, Default)]
pub struct LocalSyncAgent {
    joined: bool,
    inputs_sent: u64,
    shots_sent: u64,
}

impl LocalSyncAgent {
    pub fn new() -> Self {
        Self::default()
    }

    /// `init` arrived; from now on ticks report the pose.
    pub fn on_joined(&mut self) {
        self.joined = true;
    }

    pub fn on_left(&mut self) {
        self.joined = false;
    }

    pub fn is_joined(&self) -> bool {
        self.joined
    }

    pub fn inputs_sent(&self) -> u64 {
        self.inputs_sent
    }

    pub fn shots_sent(&self) -> u64 {
        self.shots_sent
    }

    /// Send the current pose. Returns whether a message went out.
    pub fn tick(&mut self, pose: &impl PoseSource, sink: &impl MessageSink) -> bool {
        if !self.joined || !sink.is_open() {
            return false;
        }
        match sink.send(pose.local_pose().to_input()) {
            Ok(()) => {
                self.inputs_sent += 1;
                true
            }
            Err(e) => {
                tracing::debug!("Dropped input: {}", e);
                false
            }
        }
    }

    /// Send a shot along the ray, tagged with whatever the local hit test found.
    /// Like ticks, shots need a joined session.
    pub fn fire(
        &mut self,
        origin: Vec3,
        direction: Vec3,
        hits: &impl HitTester,
        targets: &RemoteEntityCache,
        sink: &impl MessageSink,
    ) -> bool {
        if !self.joined || !sink.is_open() {
            return false;
        }
        let hit_id = hits.hit_test(origin, direction, targets);
        if let Some(id) = &hit_id {
            tracing::debug!("Local hit on {}", id);
        }
        let msg = ClientMsg::Shoot {
            origin,
            direction,
            hit_id,
        };
        match sink.send(msg) {
            Ok(()) => {
                self.shots_sent += 1;
                true
            }
            Err(e) => {
                tracing::debug!("Dropped shot: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::collab::NoHitTest;
    use crate::net::connection::SendError;
    use shooter_shared::{PlayerId, Pose};
    use std::cell::RefCell;

    struct FixedPose(Pose);

    impl PoseSource for FixedPose {
        fn local_pose(&self) -> Pose {
            self.0
        }
    }

    struct AlwaysHits(&'static str);

    impl HitTester for AlwaysHits {
        fn hit_test(&self, _: Vec3, _: Vec3, _: &RemoteEntityCache) -> Option<PlayerId> {
            Some(self.0.to_string())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        closed: bool,
        sent: RefCell<Vec<ClientMsg>>,
    }

    impl MessageSink for RecordingSink {
        fn is_open(&self) -> bool {
            !self.closed
        }

        fn send(&self, msg: ClientMsg) -> Result<(), SendError> {
            if self.closed {
                return Err(SendError::NotConnected);
            }
            self.sent.borrow_mut().push(msg);
            Ok(())
        }
    }

    fn pose() -> FixedPose {
        FixedPose(Pose::new(Vec3::new(1.0, 2.0, 3.0), 0.5, -0.2))
    }

    #[test]
    fn tick_waits_for_join() {
        let mut agent = LocalSyncAgent::new();
        let sink = RecordingSink::default();

        assert!(!agent.tick(&pose(), &sink));
        agent.on_joined();
        assert!(agent.tick(&pose(), &sink));

        assert_eq!(*sink.sent.borrow(), vec![pose().0.to_input()]);
        assert_eq!(agent.inputs_sent(), 1);
    }

    #[test]
    fn one_input_per_tick() {
        let mut agent = LocalSyncAgent::new();
        let sink = RecordingSink::default();
        agent.on_joined();
        for _ in 0..5 {
            agent.tick(&pose(), &sink);
        }
        assert_eq!(sink.sent.borrow().len(), 5);
    }

    #[test]
    fn nothing_sent_when_transport_closed() {
        let mut agent = LocalSyncAgent::new();
        let sink = RecordingSink {
            closed: true,
            ..Default::default()
        };
        agent.on_joined();

        assert!(!agent.tick(&pose(), &sink));
        assert!(!agent.fire(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), &NoHitTest, &RemoteEntityCache::new(), &sink));
        assert_eq!(agent.inputs_sent(), 0);
        assert_eq!(agent.shots_sent(), 0);
    }

    #[test]
    fn tick_stops_after_leaving() {
        let mut agent = LocalSyncAgent::new();
        let sink = RecordingSink::default();
        agent.on_joined();
        agent.on_left();
        assert!(!agent.tick(&pose(), &sink));
    }

    #[test]
    fn fire_carries_ray_and_hit_id() {
        let mut agent = LocalSyncAgent::new();
        let sink = RecordingSink::default();
        let cache = RemoteEntityCache::new();
        let origin = Vec3::new(0.0, 1.6, 0.0);
        let direction = Vec3::new(0.0, 0.0, -1.0);

        assert!(!agent.fire(origin, direction, &NoHitTest, &cache, &sink));
        agent.on_joined();
        assert!(agent.fire(origin, direction, &AlwaysHits("B"), &cache, &sink));
        assert!(agent.fire(origin, direction, &NoHitTest, &cache, &sink));

        let sent = sink.sent.borrow();
        assert_eq!(
            sent[0],
            ClientMsg::Shoot {
                origin,
                direction,
                hit_id: Some("B".to_string()),
            }
        );
        assert!(matches!(&sent[1], ClientMsg::Shoot { hit_id: None, .. }));
        assert_eq!(agent.shots_sent(), 2);
    }
}

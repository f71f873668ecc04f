use std::collections::HashMap;

use shooter_shared::protocol::{InitMsg, PlayerFiredMsg};
use shooter_shared::{PlayerId, PlayerWire, ServerMsg};

use super::types::{EntityEvent, RemoteEntity};

/// Last known state of every other player, built only from relay events.
///
/// No interpolation: an entity sits exactly where the last `spawn` or
/// `update` put it. Never holds an entity for our own id.
#[derive(Debug, Default)]
pub struct RemoteEntityCache {
    self_id: Option<PlayerId>,
    entities: HashMap<PlayerId, RemoteEntity>,
}

impl RemoteEntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Our id, once `init` has arrived.
    pub fn self_id(&self) -> Option<&str> {
        self.self_id.as_deref()
    }

    pub fn get(&self, id: &str) -> Option<&RemoteEntity> {
        self.entities.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RemoteEntity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Copy of every known entity, sorted by id.
    pub fn snapshot(&self) -> Vec<RemoteEntity> {
        let mut all: Vec<_> = self.entities.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Apply one relay event and return what changed.
    pub fn apply(&mut self, msg: &ServerMsg) -> Vec<EntityEvent> {
        match msg {
            ServerMsg::Init(init) => self.on_init(init),
            ServerMsg::Spawn(spawn) => self.spawn(&spawn.player).into_iter().collect(),
            ServerMsg::Update(update) => self.update(&update.player).into_iter().collect(),
            ServerMsg::Despawn(despawn) => self.despawn(&despawn.id).into_iter().collect(),
            ServerMsg::PlayerFired(fired) => self.fired(fired).into_iter().collect(),
        }
    }

    fn is_self(&self, id: &str) -> bool {
        self.self_id.as_deref() == Some(id)
    }

    fn on_init(&mut self, init: &InitMsg) -> Vec<EntityEvent> {
        self.self_id = Some(init.your_id.clone());

        let mut events = Vec::new();
        // A spawn for our id may have raced ahead of init.
        if self.entities.remove(&init.your_id).is_some() {
            events.push(EntityEvent::Despawned(init.your_id.clone()));
        }
        events.extend(init.players.iter().filter_map(|p| self.spawn(p)));
        events
    }

    fn spawn(&mut self, player: &PlayerWire) -> Option<EntityEvent> {
        if self.is_self(&player.id) || self.entities.contains_key(&player.id) {
            return None;
        }
        let entity = RemoteEntity::from(player);
        self.entities.insert(entity.id.clone(), entity.clone());
        Some(EntityEvent::Spawned(entity))
    }

    fn update(&mut self, player: &PlayerWire) -> Option<EntityEvent> {
        // Our own echoed update never matches an entity.
        let entity = self.entities.get_mut(&player.id)?;
        let updated = RemoteEntity::from(player);
        entity.position = updated.position;
        entity.yaw = updated.yaw;
        Some(EntityEvent::Moved {
            id: player.id.clone(),
            position: entity.position,
            yaw: entity.yaw,
        })
    }

    fn despawn(&mut self, id: &str) -> Option<EntityEvent> {
        self.entities
            .remove(id)
            .map(|entity| EntityEvent::Despawned(entity.id))
    }

    fn fired(&self, fired: &PlayerFiredMsg) -> Option<EntityEvent> {
        if self.is_self(&fired.id) {
            return None;
        }
        Some(EntityEvent::Fired {
            id: fired.id.clone(),
            origin: fired.origin,
            direction: fired.direction,
        })
    }
}

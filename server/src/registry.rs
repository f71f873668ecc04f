use std::collections::HashMap;

use shooter_shared::{PlayerId, Pose};

use crate::player::Player;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("player id {0} is already registered")]
    DuplicateId(PlayerId),
}

/// Authoritative set of connected players, keyed by id.
///
/// Owned by the relay task; every mutation happens there, so a snapshot can
/// never observe a half-applied change.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: HashMap<PlayerId, Player>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a player at the spawn pose. Fails if the id is already taken.
    pub fn register(&mut self, id: PlayerId) -> Result<&Player, RegistryError> {
        use std::collections::hash_map::Entry;
        match self.players.entry(id) {
            Entry::Occupied(e) => Err(RegistryError::DuplicateId(e.key().clone())),
            Entry::Vacant(e) => {
                let player = Player::spawn(e.key().clone());
                Ok(e.insert(player))
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.players.contains_key(id)
    }

    /// Overwrite position and rotation. Returns the updated player, or `None`
    /// if the id is gone (a late message after disconnect).
    pub fn apply_input(&mut self, id: &str, pose: Pose) -> Option<&Player> {
        let player = self.players.get_mut(id)?;
        player.pose = pose;
        Some(player)
    }

    /// Remove a player. Calling it twice is harmless.
    pub fn unregister(&mut self, id: &str) -> Option<Player> {
        self.players.remove(id)
    }

    pub fn snapshot(&self) -> Vec<Player> {
        self.players.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

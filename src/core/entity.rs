//! Entity system with simple integer IDs

use crate::Result;
use crate::SimError;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Simple integer ID for players, teams, referees and matches
///
/// IDs are stable for the lifetime of a league: entities are never deallocated
/// while a season is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    pub const fn new(id: u32) -> Self {
        EntityId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type PlayerId = EntityId;
pub type TeamId = EntityId;
pub type RefereeId = EntityId;
pub type MatchId = EntityId;

/// Base trait for named entities
pub trait Entity {
    fn id(&self) -> EntityId;
    fn name(&self) -> &str;
}

/// Central storage for entities keyed by ID
///
/// Uses FxHashMap for fast hashing of integer keys. Iteration order is not
/// meaningful; use `sorted_ids` where a stable order matters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityStore<T> {
    entities: FxHashMap<EntityId, T>,
    next_id: u32,
}

impl<T> EntityStore<T> {
    pub fn new() -> Self {
        EntityStore {
            entities: FxHashMap::default(),
            next_id: 0,
        }
    }

    /// Generate a new unique EntityId
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Insert an entity with a specific ID
    pub fn insert(&mut self, id: EntityId, entity: T) {
        self.next_id = self.next_id.max(id.as_u32() + 1);
        self.entities.insert(id, entity);
    }

    pub fn get(&self, id: EntityId) -> Result<&T> {
        self.entities
            .get(&id)
            .ok_or(SimError::EntityNotFound(id.as_u32()))
    }

    pub fn get_mut(&mut self, id: EntityId) -> Result<&mut T> {
        self.entities
            .get_mut(&id)
            .ok_or(SimError::EntityNotFound(id.as_u32()))
    }

    /// Take an entity out of the store; its ID stays reserved
    pub fn remove(&mut self, id: EntityId) -> Result<T> {
        self.entities
            .remove(&id)
            .ok_or(SimError::EntityNotFound(id.as_u32()))
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &T)> {
        self.entities.iter()
    }

    /// All IDs in ascending order
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.entities.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct TestEntity {
        id: EntityId,
        name: String,
    }

    impl Entity for TestEntity {
        fn id(&self) -> EntityId {
            self.id
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    #[test]
    fn test_entity_store() {
        let mut store = EntityStore::new();
        let id1 = store.next_id();
        let id2 = store.next_id();

        assert_eq!(id1.as_u32(), 0);
        assert_eq!(id2.as_u32(), 1);

        store.insert(
            id1,
            TestEntity {
                id: id1,
                name: "Hosts".to_string(),
            },
        );
        store.insert(
            id2,
            TestEntity {
                id: id2,
                name: "Visitors".to_string(),
            },
        );

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(id1).unwrap().name(), "Hosts");
        assert_eq!(store.get(id2).unwrap().id(), id2);
        assert!(store.get(EntityId::new(999)).is_err());
    }

    #[test]
    fn test_insert_with_explicit_id_advances_counter() {
        let mut store: EntityStore<u8> = EntityStore::new();
        store.insert(EntityId::new(7), 1);
        assert_eq!(store.next_id(), EntityId::new(8));
        assert_eq!(store.sorted_ids(), vec![EntityId::new(7)]);
    }

    #[test]
    fn test_remove_keeps_id_reserved() {
        let mut store: EntityStore<&str> = EntityStore::new();
        let id = store.next_id();
        store.insert(id, "Hosts");
        assert_eq!(store.remove(id).unwrap(), "Hosts");
        assert!(!store.contains(id));
        assert!(matches!(store.remove(id), Err(SimError::EntityNotFound(0))));
        assert_eq!(store.next_id(), EntityId::new(1));
    }
}

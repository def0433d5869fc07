//! Referees and the pre-match referee draw

use crate::core::entity::{Entity, EntityStore, RefereeId};
use crate::rng::MatchRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referee {
    pub id: RefereeId,
    pub name: String,
    pub country: Option<String>,
    /// Eligible to be drawn for matches without an appointed referee
    pub in_pool: bool,
}

impl Referee {
    pub fn new(id: RefereeId, name: impl Into<String>) -> Self {
        Referee {
            id,
            name: name.into(),
            country: None,
            in_pool: true,
        }
    }
}

impl Entity for Referee {
    fn id(&self) -> RefereeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Draw a referee from the pool, skipping `excluded`
///
/// Returns `None` when nobody is eligible; the match is then played
/// without a named referee.
pub fn draw_referee(
    referees: &EntityStore<Referee>,
    excluded: &[RefereeId],
    rng: &mut MatchRng,
) -> Option<RefereeId> {
    let eligible: Vec<RefereeId> = referees
        .sorted_ids()
        .into_iter()
        .filter(|id| !excluded.contains(id))
        .filter(|&id| referees.get(id).map(|r| r.in_pool).unwrap_or(false))
        .collect();

    rng.pick(&eligible).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::EntityId;

    #[test]
    fn test_draw_respects_pool_and_exclusions() {
        let mut store = EntityStore::new();
        let a = store.next_id();
        let b = store.next_id();
        let c = store.next_id();
        store.insert(a, Referee::new(a, "Alex Whistle"));
        let mut retired = Referee::new(b, "Sam Flag");
        retired.in_pool = false;
        store.insert(b, retired);
        store.insert(c, Referee::new(c, "Jo Card"));

        let mut rng = MatchRng::seed_from_u64(9);
        for _ in 0..50 {
            assert_eq!(draw_referee(&store, &[a], &mut rng), Some(c));
        }
    }

    #[test]
    fn test_draw_from_empty_pool() {
        let store: EntityStore<Referee> = EntityStore::new();
        let mut rng = MatchRng::seed_from_u64(1);
        assert_eq!(draw_referee(&store, &[EntityId::new(3)], &mut rng), None);
    }
}

//! Per-player statistics and points ledgers

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counted player events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatKind {
    GamesPlayed,
    GamesPlayedSub,
    MinutesPlayed,
    Carries,
    MetresRun,
    MetresKicked,
    PassesMade,
    PassesCompleted,
    PassesMissed,
    Offloads,
    TacklesMade,
    TacklesCompleted,
    TacklesMissed,
    TacklesReceived,
    HighTackles,
    DangerousTackles,
    PenaltiesCaused,
    HandlingErrors,
    YellowCards,
    RedCards,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    values: BTreeMap<StatKind, u32>,
}

impl PlayerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: StatKind) -> u32 {
        self.values.get(&kind).copied().unwrap_or(0)
    }

    pub fn increment(&mut self, kind: StatKind) {
        self.add(kind, 1);
    }

    pub fn add(&mut self, kind: StatKind, amount: u32) {
        if amount > 0 {
            *self.values.entry(kind).or_insert(0) += amount;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatKind, u32)> + '_ {
        self.values.iter().map(|(&k, &v)| (k, v))
    }

    pub fn merge(&mut self, other: &PlayerStats) {
        for (kind, value) in other.iter() {
            self.add(kind, value);
        }
    }
}

/// Scoring events a player can be credited with
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PointEvent {
    Try,
    Conversion,
    Penalty,
    DropGoal,
}

/// Point value per scoring event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointValues {
    #[serde(rename = "try")]
    pub try_: u16,
    pub conversion: u16,
    pub penalty: u16,
    pub drop_goal: u16,
}

impl Default for PointValues {
    fn default() -> Self {
        PointValues {
            try_: 5,
            conversion: 2,
            penalty: 3,
            drop_goal: 3,
        }
    }
}

impl PointValues {
    pub fn value(&self, event: PointEvent) -> u16 {
        match event {
            PointEvent::Try => self.try_,
            PointEvent::Conversion => self.conversion,
            PointEvent::Penalty => self.penalty,
            PointEvent::DropGoal => self.drop_goal,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPoints {
    pub tries: u16,
    pub conversions: u16,
    pub penalties: u16,
    pub drop_goals: u16,
}

impl PlayerPoints {
    pub fn record(&mut self, event: PointEvent) {
        match event {
            PointEvent::Try => self.tries += 1,
            PointEvent::Conversion => self.conversions += 1,
            PointEvent::Penalty => self.penalties += 1,
            PointEvent::DropGoal => self.drop_goals += 1,
        }
    }

    pub fn count(&self, event: PointEvent) -> u16 {
        match event {
            PointEvent::Try => self.tries,
            PointEvent::Conversion => self.conversions,
            PointEvent::Penalty => self.penalties,
            PointEvent::DropGoal => self.drop_goals,
        }
    }

    pub fn points(&self, values: &PointValues) -> u16 {
        self.tries * values.try_
            + self.conversions * values.conversion
            + self.penalties * values.penalty
            + self.drop_goals * values.drop_goal
    }

    pub fn is_empty(&self) -> bool {
        self.tries + self.conversions + self.penalties + self.drop_goals == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_increment_and_merge() {
        let mut a = PlayerStats::new();
        a.increment(StatKind::Carries);
        a.add(StatKind::MetresRun, 12);
        assert_eq!(a.get(StatKind::Carries), 1);
        assert_eq!(a.get(StatKind::TacklesMade), 0);

        let mut b = PlayerStats::new();
        b.add(StatKind::MetresRun, 3);
        b.merge(&a);
        assert_eq!(b.get(StatKind::MetresRun), 15);
    }

    #[test]
    fn test_zero_add_leaves_no_entry() {
        let mut s = PlayerStats::new();
        s.add(StatKind::MetresKicked, 0);
        assert_eq!(s.iter().count(), 0);
    }

    #[test]
    fn test_player_points() {
        let mut p = PlayerPoints::default();
        p.record(PointEvent::Try);
        p.record(PointEvent::Conversion);
        p.record(PointEvent::Penalty);
        assert_eq!(p.points(&PointValues::default()), 10);
        assert_eq!(p.count(PointEvent::DropGoal), 0);
        assert!(!p.is_empty());
    }
}

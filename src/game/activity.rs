//! Table-driven mapping from activity rolls to outcomes
//!
//! Each [`ActionKind`] owns an ascending list of upper thresholds. A roll is
//! resolved to the first outcome whose threshold is at least the roll. Base
//! probabilities for yes/no events live alongside the thresholds so that the
//! whole table can be tuned from a settings file.

use crate::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Base action category a roll is made for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Play,
    Tackling,
    Ruck,
    Passing,
    Kicking,
    Scrum,
    FoulPlay,
}

impl ActionKind {
    pub const ALL: [ActionKind; 7] = [
        ActionKind::Play,
        ActionKind::Tackling,
        ActionKind::Ruck,
        ActionKind::Passing,
        ActionKind::Kicking,
        ActionKind::Scrum,
        ActionKind::FoulPlay,
    ];
}

/// Outcome subtype selected by a roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Outcome {
    // play
    Run,
    Pass,
    Kick,
    // tackling
    RuckFormed,
    PushedIntoTouch,
    BallLost,
    HighTackle,
    DangerousPlay,
    // ruck
    AnotherPhase,
    NotReleasingBall,
    NotReleasingPlayer,
    Offside,
    OffFeet,
    InAtTheSide,
    // passing
    PassOk,
    PassMissed,
    KnockOn,
    ForwardPass,
    Intercepted,
    PassIntoTouch,
    // kicking
    KickedForward,
    KickedIntoTouch,
    KickBlocked,
    DropGoalAttempt,
    // scrum
    ScrumWon,
    ScrumLost,
    ScrumCollapsed,
    IntentionallyCollapsed,
    NotBinding,
    NotPushingStraight,
    // foul play
    Warning,
    SinBinned,
    SentOff,
}

/// Yes/no events with a configurable base probability (percent)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProbabilityKind {
    RunPlayerTackled,
    TryUnderReview,
    TryIllegal,
    TackleOffload,
    RunTackleCompleted,
    TackleUnderReview,
    PassDeliberateForwardPass,
    KickCaughtByOpponent,
    KickDirectlyIntoTouch,
    TapPenaltyPossible,
    PenaltyScored,
    PenaltyKickIntoTouch,
    ConversionKicked,
    ConversionSuccessful,
    ScrumBallThrownStraight,
    LineoutStraight,
    LineoutWon,
}

impl ProbabilityKind {
    pub const ALL: [ProbabilityKind; 17] = [
        ProbabilityKind::RunPlayerTackled,
        ProbabilityKind::TryUnderReview,
        ProbabilityKind::TryIllegal,
        ProbabilityKind::TackleOffload,
        ProbabilityKind::RunTackleCompleted,
        ProbabilityKind::TackleUnderReview,
        ProbabilityKind::PassDeliberateForwardPass,
        ProbabilityKind::KickCaughtByOpponent,
        ProbabilityKind::KickDirectlyIntoTouch,
        ProbabilityKind::TapPenaltyPossible,
        ProbabilityKind::PenaltyScored,
        ProbabilityKind::PenaltyKickIntoTouch,
        ProbabilityKind::ConversionKicked,
        ProbabilityKind::ConversionSuccessful,
        ProbabilityKind::ScrumBallThrownStraight,
        ProbabilityKind::LineoutStraight,
        ProbabilityKind::LineoutWon,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTable {
    thresholds: BTreeMap<ActionKind, Vec<(u16, Outcome)>>,
    probabilities: BTreeMap<ProbabilityKind, u8>,
}

impl ActivityTable {
    /// The default tuning used by every new league
    pub fn standard() -> Self {
        use Outcome::*;

        let thresholds = BTreeMap::from([
            (ActionKind::Play, vec![(30, Run), (60, Pass), (70, Kick)]),
            (
                ActionKind::Tackling,
                vec![
                    (80, RuckFormed),
                    (88, PushedIntoTouch),
                    (95, BallLost),
                    (98, HighTackle),
                    (100, DangerousPlay),
                ],
            ),
            (
                ActionKind::Ruck,
                vec![
                    (40, AnotherPhase),
                    (42, NotReleasingBall),
                    (44, NotReleasingPlayer),
                    (46, Offside),
                    (48, OffFeet),
                    (50, InAtTheSide),
                ],
            ),
            (
                ActionKind::Passing,
                vec![
                    (80, PassOk),
                    (88, PassMissed),
                    (93, KnockOn),
                    (96, ForwardPass),
                    (98, Intercepted),
                    (100, PassIntoTouch),
                ],
            ),
            (
                ActionKind::Kicking,
                vec![
                    (60, KickedForward),
                    (90, KickedIntoTouch),
                    (95, KickBlocked),
                    (100, DropGoalAttempt),
                ],
            ),
            (
                ActionKind::Scrum,
                vec![
                    (75, ScrumWon),
                    (90, ScrumLost),
                    (100, ScrumCollapsed),
                    (107, IntentionallyCollapsed),
                    (114, NotBinding),
                    (120, NotPushingStraight),
                ],
            ),
            (ActionKind::FoulPlay, vec![(60, Warning), (92, SinBinned), (100, SentOff)]),
        ]);

        let probabilities = BTreeMap::from([
            (ProbabilityKind::RunPlayerTackled, 70),
            (ProbabilityKind::TryUnderReview, 10),
            (ProbabilityKind::TryIllegal, 30),
            (ProbabilityKind::TackleOffload, 15),
            (ProbabilityKind::RunTackleCompleted, 85),
            (ProbabilityKind::TackleUnderReview, 20),
            (ProbabilityKind::PassDeliberateForwardPass, 20),
            (ProbabilityKind::KickCaughtByOpponent, 70),
            (ProbabilityKind::KickDirectlyIntoTouch, 30),
            (ProbabilityKind::TapPenaltyPossible, 30),
            (ProbabilityKind::PenaltyScored, 90),
            (ProbabilityKind::PenaltyKickIntoTouch, 85),
            (ProbabilityKind::ConversionKicked, 97),
            (ProbabilityKind::ConversionSuccessful, 90),
            (ProbabilityKind::ScrumBallThrownStraight, 95),
            (ProbabilityKind::LineoutStraight, 92),
            (ProbabilityKind::LineoutWon, 85),
        ]);

        ActivityTable {
            thresholds,
            probabilities,
        }
    }

    /// Check that every action and probability kind is present and that
    /// thresholds ascend strictly
    pub fn validate(&self) -> Result<()> {
        for kind in ActionKind::ALL {
            let rows = self.rows(kind)?;
            if rows.is_empty() {
                return Err(SimError::Config(format!("no outcomes for {kind:?}")));
            }
            if rows.windows(2).any(|w| w[0].0 >= w[1].0) {
                return Err(SimError::Config(format!("thresholds for {kind:?} must ascend")));
            }
            if rows[0].0 == 0 {
                return Err(SimError::Config(format!("first threshold for {kind:?} is zero")));
            }
        }
        for kind in ProbabilityKind::ALL {
            let p = self.base_probability(kind)?;
            if p > 100 {
                return Err(SimError::Config(format!("{kind:?} probability {p} exceeds 100")));
            }
        }
        Ok(())
    }

    fn rows(&self, kind: ActionKind) -> Result<&[(u16, Outcome)]> {
        self.thresholds
            .get(&kind)
            .map(Vec::as_slice)
            .ok_or_else(|| SimError::Config(format!("missing activity table for {kind:?}")))
    }

    /// Resolve a roll; rolls above the last threshold are a configuration error
    pub fn outcome(&self, kind: ActionKind, roll: u16) -> Result<Outcome> {
        self.rows(kind)?
            .iter()
            .find(|&&(upper, _)| roll <= upper)
            .map(|&(_, outcome)| outcome)
            .ok_or_else(|| SimError::Config(format!("roll {roll} out of range for {kind:?}")))
    }

    /// Full roll range `1..=max` for an action
    pub fn range(&self, kind: ActionKind) -> Result<(u16, u16)> {
        let rows = self.rows(kind)?;
        let max = rows.last().map(|&(upper, _)| upper).unwrap_or(1);
        Ok((1, max))
    }

    /// Upper threshold of an outcome
    pub fn upper_bound(&self, outcome: Outcome) -> Result<u16> {
        self.thresholds
            .values()
            .flatten()
            .find(|&&(_, o)| o == outcome)
            .map(|&(upper, _)| upper)
            .ok_or_else(|| SimError::Config(format!("outcome {outcome:?} not in activity table")))
    }

    pub fn base_probability(&self, kind: ProbabilityKind) -> Result<u8> {
        self.probabilities
            .get(&kind)
            .copied()
            .ok_or_else(|| SimError::Config(format!("missing base probability for {kind:?}")))
    }

    pub fn set_base_probability(&mut self, kind: ProbabilityKind, percent: u8) {
        self.probabilities.insert(kind, percent);
    }

    /// Replace the thresholds of one action kind
    pub fn set_thresholds(&mut self, kind: ActionKind, rows: Vec<(u16, Outcome)>) {
        self.thresholds.insert(kind, rows);
    }

    pub fn remove(&mut self, kind: ActionKind) {
        self.thresholds.remove(&kind);
    }
}

impl Default for ActivityTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_is_valid() {
        ActivityTable::standard().validate().unwrap();
    }

    #[test]
    fn test_outcome_boundaries() {
        let table = ActivityTable::standard();
        assert_eq!(table.outcome(ActionKind::Play, 1).unwrap(), Outcome::Run);
        assert_eq!(table.outcome(ActionKind::Play, 30).unwrap(), Outcome::Run);
        assert_eq!(table.outcome(ActionKind::Play, 31).unwrap(), Outcome::Pass);
        assert_eq!(table.outcome(ActionKind::Play, 70).unwrap(), Outcome::Kick);
        assert!(table.outcome(ActionKind::Play, 71).is_err());
        assert_eq!(table.outcome(ActionKind::Scrum, 101).unwrap(), Outcome::IntentionallyCollapsed);
    }

    #[test]
    fn test_upper_bound_and_range() {
        let table = ActivityTable::standard();
        assert_eq!(table.upper_bound(Outcome::KickedForward).unwrap(), 60);
        assert_eq!(table.range(ActionKind::Ruck).unwrap(), (1, 50));
        assert_eq!(table.range(ActionKind::Scrum).unwrap(), (1, 120));
    }

    #[test]
    fn test_missing_entries_fail_loudly() {
        let mut table = ActivityTable::standard();
        table.remove(ActionKind::Ruck);
        assert!(matches!(table.outcome(ActionKind::Ruck, 1), Err(SimError::Config(_))));
        assert!(table.validate().is_err());

        let mut table = ActivityTable::standard();
        table.set_thresholds(ActionKind::Kicking, vec![(60, Outcome::KickedForward), (50, Outcome::KickBlocked)]);
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_base_probability_lookup() {
        let mut table = ActivityTable::standard();
        assert_eq!(table.base_probability(ProbabilityKind::LineoutWon).unwrap(), 85);
        table.set_base_probability(ProbabilityKind::LineoutWon, 101);
        assert!(table.validate().is_err());
    }
}

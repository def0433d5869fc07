//! Decision strategies and the read-only match view they decide from
//!
//! The engine calls a [`DecisionStrategy`] at every point where a coach or
//! captain would make a call. Headless runs use [`AutomaticStrategy`]; an
//! interactive front end implements the trait itself and may block inside
//! a call until the user has answered.

use crate::core::{ConditionWeights, Player, PlayerId, PreferredAction, Team};
use crate::game::match_state::{Match, MatchType, Side};
use crate::game::period::MatchPeriod;
use crate::rng::MatchRng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Coin toss winner's choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideOrBall {
    /// Choose the end; the opponents kick off
    Side,
    /// Kick off
    Ball,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PenaltyOption {
    KickAtGoal,
    KickToTouch,
    Scrum,
    TapPenalty,
}

impl PenaltyOption {
    pub const ALL: [PenaltyOption; 4] = [
        PenaltyOption::KickAtGoal,
        PenaltyOption::KickToTouch,
        PenaltyOption::Scrum,
        PenaltyOption::TapPenalty,
    ];
}

/// Where a penalty was awarded and what may be done with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PenaltyContext {
    pub distance_to_goal: i16,
    pub distance_from_middle: u8,
    pub options: SmallVec<[PenaltyOption; 4]>,
}

/// Read-only view of a match from one side
pub struct MatchView<'a> {
    game: &'a Match,
    team: &'a Team,
    side: Side,
    weights: &'a ConditionWeights,
}

impl<'a> MatchView<'a> {
    pub fn new(game: &'a Match, team: &'a Team, side: Side, weights: &'a ConditionWeights) -> Self {
        MatchView {
            game,
            team,
            side,
            weights,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn team(&self) -> &Team {
        self.team
    }

    pub fn match_type(&self) -> MatchType {
        self.game.match_type
    }

    pub fn current_period(&self) -> MatchPeriod {
        self.game.clock.current_period()
    }

    pub fn minutes_played(&self) -> u16 {
        self.game.clock.minutes_played()
    }

    /// Own points minus opponent points
    pub fn point_difference(&self) -> i32 {
        self.game.point_difference(self.side)
    }

    pub fn point_difference_in_range(&self, min: i32, max: i32, min_closed: bool, max_closed: bool) -> bool {
        self.game
            .point_difference_in_range(self.side, min, max, min_closed, max_closed)
    }

    pub fn tries(&self) -> u16 {
        self.game.score(self.side).tries()
    }

    pub fn replacements_made(&self) -> usize {
        self.game.no_replacements(self.side)
    }

    pub fn overall(&self, player: &Player) -> u16 {
        player.overall(self.weights)
    }
}

/// Decision points of a match
pub trait DecisionStrategy {
    fn name(&self) -> &str;

    fn choose_side_or_ball(&mut self, view: &MatchView<'_>, rng: &mut MatchRng) -> SideOrBall;

    fn choose_penalty_option(
        &mut self,
        view: &MatchView<'_>,
        penalty: &PenaltyContext,
        rng: &mut MatchRng,
    ) -> PenaltyOption;

    /// A player's condition has dropped to critical: replace them?
    fn confirm_fatigue_replacement(&mut self, view: &MatchView<'_>, player: &Player) -> bool;

    /// Pick a replacement from `candidates` (best first), or keep the player on
    ///
    /// With `forced` the outgoing player cannot continue, so declining leaves
    /// the team a player short.
    fn choose_replacement(
        &mut self,
        view: &MatchView<'_>,
        outgoing: &Player,
        candidates: &[&Player],
        forced: bool,
        rng: &mut MatchRng,
    ) -> Option<PlayerId>;

    /// Override the proposed kicker for penalties and conversions
    fn choose_kicker(&mut self, _view: &MatchView<'_>, _action: PreferredAction, proposed: PlayerId) -> PlayerId {
        proposed
    }
}

/// Rule-based decisions used in headless play
#[derive(Debug, Clone, Copy, Default)]
pub struct AutomaticStrategy;

impl AutomaticStrategy {
    pub fn new() -> Self {
        AutomaticStrategy
    }
}

impl DecisionStrategy for AutomaticStrategy {
    fn name(&self) -> &str {
        "automatic"
    }

    fn choose_side_or_ball(&mut self, _view: &MatchView<'_>, rng: &mut MatchRng) -> SideOrBall {
        if rng.chance(70) {
            SideOrBall::Side
        } else {
            SideOrBall::Ball
        }
    }

    fn choose_penalty_option(
        &mut self,
        view: &MatchView<'_>,
        penalty: &PenaltyContext,
        rng: &mut MatchRng,
    ) -> PenaltyOption {
        // Going for a try pays off when trailing by one score or one try short of the bonus
        let chasing_try = view.point_difference_in_range(-7, -3, true, false) || view.tries() == 3;
        let dtg = penalty.distance_to_goal;
        let offered = |o: PenaltyOption| penalty.options.contains(&o);

        if dtg <= 10 && chasing_try && offered(PenaltyOption::Scrum) {
            PenaltyOption::Scrum
        } else if dtg <= 22 && penalty.distance_from_middle <= 12 && offered(PenaltyOption::KickAtGoal) {
            PenaltyOption::KickAtGoal
        } else if dtg > 22 && chasing_try && offered(PenaltyOption::KickToTouch) {
            PenaltyOption::KickToTouch
        } else {
            rng.pick(&penalty.options)
                .copied()
                .unwrap_or(PenaltyOption::Scrum)
        }
    }

    fn confirm_fatigue_replacement(&mut self, _view: &MatchView<'_>, _player: &Player) -> bool {
        true
    }

    fn choose_replacement(
        &mut self,
        view: &MatchView<'_>,
        outgoing: &Player,
        candidates: &[&Player],
        forced: bool,
        _rng: &mut MatchRng,
    ) -> Option<PlayerId> {
        let best = candidates.first()?;
        let threshold = view.overall(outgoing) as f64 * 1.05;
        (forced || view.overall(best) as f64 > threshold).then_some(best.id)
    }
}

/// Coin-flip decisions drawn from the strategy's own generator
///
/// Drawing from a private generator keeps the match's own random sequence
/// identical whichever strategy is plugged in.
#[derive(Debug, Clone)]
pub struct RandomStrategy {
    rng: MatchRng,
}

impl RandomStrategy {
    pub fn new() -> Self {
        RandomStrategy {
            rng: MatchRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        RandomStrategy {
            rng: MatchRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionStrategy for RandomStrategy {
    fn name(&self) -> &str {
        "random"
    }

    fn choose_side_or_ball(&mut self, _view: &MatchView<'_>, _rng: &mut MatchRng) -> SideOrBall {
        if self.rng.chance(50) {
            SideOrBall::Side
        } else {
            SideOrBall::Ball
        }
    }

    fn choose_penalty_option(
        &mut self,
        _view: &MatchView<'_>,
        penalty: &PenaltyContext,
        _rng: &mut MatchRng,
    ) -> PenaltyOption {
        self.rng
            .pick(&penalty.options)
            .copied()
            .unwrap_or(PenaltyOption::Scrum)
    }

    fn confirm_fatigue_replacement(&mut self, _view: &MatchView<'_>, _player: &Player) -> bool {
        self.rng.chance(50)
    }

    fn choose_replacement(
        &mut self,
        _view: &MatchView<'_>,
        _outgoing: &Player,
        candidates: &[&Player],
        forced: bool,
        _rng: &mut MatchRng,
    ) -> Option<PlayerId> {
        if !forced && !self.rng.chance(30) {
            return None;
        }
        self.rng.pick(candidates).map(|p| p.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ConditionKind, EntityId, PointEvent, PositionType};
    use crate::game::settings::CompetitionRules;
    use smallvec::smallvec;

    fn fixture() -> (Match, Team) {
        let game = Match::new(
            EntityId::new(1),
            1,
            EntityId::new(10),
            EntityId::new(20),
            MatchType::Regular,
            CompetitionRules::default(),
        );
        (game, Team::new(EntityId::new(10), "Harbour", 3))
    }

    fn penalty(dtg: i16, middle: u8) -> PenaltyContext {
        PenaltyContext {
            distance_to_goal: dtg,
            distance_from_middle: middle,
            options: smallvec![
                PenaltyOption::KickAtGoal,
                PenaltyOption::KickToTouch,
                PenaltyOption::Scrum,
            ],
        }
    }

    #[test]
    fn test_automatic_penalty_kicks_when_in_front() {
        let (game, team) = fixture();
        let weights = ConditionWeights::default();
        let view = MatchView::new(&game, &team, Side::Hosts, &weights);
        let mut rng = MatchRng::seed_from_u64(1);
        let mut strategy = AutomaticStrategy::new();
        assert_eq!(
            strategy.choose_penalty_option(&view, &penalty(20, 5), &mut rng),
            PenaltyOption::KickAtGoal
        );
    }

    #[test]
    fn test_automatic_penalty_goes_for_try_when_trailing() {
        let (mut game, team) = fixture();
        game.score_mut(Side::Visitors).record(PointEvent::Try);
        let weights = ConditionWeights::default();
        let view = MatchView::new(&game, &team, Side::Hosts, &weights);
        let mut rng = MatchRng::seed_from_u64(1);
        let mut strategy = AutomaticStrategy::new();
        assert_eq!(
            strategy.choose_penalty_option(&view, &penalty(8, 20), &mut rng),
            PenaltyOption::Scrum
        );
        assert_eq!(
            strategy.choose_penalty_option(&view, &penalty(35, 20), &mut rng),
            PenaltyOption::KickToTouch
        );
    }

    #[test]
    fn test_automatic_replacement_needs_clear_edge() {
        let (game, team) = fixture();
        let weights = ConditionWeights::default();
        let view = MatchView::new(&game, &team, Side::Hosts, &weights);
        let mut rng = MatchRng::seed_from_u64(1);
        let mut strategy = AutomaticStrategy::new();

        let mut tired = Player::new(EntityId::new(1), "Tired Lock", PositionType::Lock);
        tired.condition.decrease(ConditionKind::Fatigue, 3);
        let fresh = Player::new(EntityId::new(2), "Fresh Lock", PositionType::Lock);
        let same = Player::new(EntityId::new(3), "Same Lock", PositionType::Lock);

        assert_eq!(
            strategy.choose_replacement(&view, &tired, &[&fresh], false, &mut rng),
            Some(fresh.id)
        );
        assert_eq!(strategy.choose_replacement(&view, &same, &[&fresh], false, &mut rng), None);
        assert_eq!(
            strategy.choose_replacement(&view, &same, &[&fresh], true, &mut rng),
            Some(fresh.id)
        );
        assert_eq!(strategy.choose_replacement(&view, &same, &[], true, &mut rng), None);
    }

    #[test]
    fn test_random_strategy_is_reproducible() {
        let (game, team) = fixture();
        let weights = ConditionWeights::default();
        let view = MatchView::new(&game, &team, Side::Hosts, &weights);
        let mut rng = MatchRng::seed_from_u64(1);
        let mut a = RandomStrategy::with_seed(9);
        let mut b = RandomStrategy::with_seed(9);
        let xs: Vec<_> = (0..20).map(|_| a.choose_side_or_ball(&view, &mut rng)).collect();
        let ys: Vec<_> = (0..20).map(|_| b.choose_side_or_ball(&view, &mut rng)).collect();
        assert_eq!(xs, ys);
    }
}

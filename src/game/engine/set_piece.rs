//! Set pieces: penalties, scrums and lineouts

use super::{ground, times, Action, GameEngine};
use crate::core::{PointEvent, PreferredAction, StatKind};
use crate::game::activity::{ActionKind, Outcome, ProbabilityKind};
use crate::game::controller::{MatchView, PenaltyContext, PenaltyOption};
use crate::game::score::ScrumResult;
use crate::Result;
use smallvec::SmallVec;

impl<'a> GameEngine<'a> {
    /// Penalty awarded to the team in possession
    pub(super) fn penalty(&mut self) -> Result<()> {
        let side = self.team_in_possession;
        self.phases = 0;
        self.next_action = None;
        self.game.score_mut(side.opponent()).add_penalty_caused();

        let from_middle = self.rng.int(0, ground::TOUCH_TO_MIDDLE);
        let original = self.distance_to_goal();
        let dtg = self.move_ball_to(ground::FIVE_METRE_LINE);

        let mut options: SmallVec<[PenaltyOption; 4]> = PenaltyOption::ALL.iter().copied().collect();
        if dtg >= (self.settings.kick_max_distance as i16).min(ground::HALFWAY) {
            options.retain(|o| *o != PenaltyOption::KickAtGoal);
        }
        let tap_possible = self
            .rng
            .chance(self.base_probability(ProbabilityKind::TapPenaltyPossible)?);
        if !tap_possible || original < ground::FIVE_METRE_LINE {
            options.retain(|o| *o != PenaltyOption::TapPenalty);
        }
        let context = PenaltyContext {
            distance_to_goal: dtg,
            distance_from_middle: from_middle,
            options,
        };

        let choice = {
            let view = MatchView::new(
                &*self.game,
                &*self.teams[side.index()],
                side,
                &self.settings.condition_weights,
            );
            self.strategies[side.index()].choose_penalty_option(&view, &context, &mut self.rng)
        };
        let choice = if context.options.contains(&choice) {
            choice
        } else {
            PenaltyOption::KickToTouch
        };
        let strategy = self.strategies[side.index()].name().to_string();
        let text = format!(
            "{} penalty {} m out, {} m from the middle: {:?}",
            self.team(side).abbr,
            dtg,
            from_middle,
            choice
        );
        self.sink.strategy_choice(&strategy, &text);

        match choice {
            PenaltyOption::KickAtGoal => {
                let kicker = self.specialist(PreferredAction::Penalty)?;
                let percent =
                    self.kick_at_goal_percent(side, kicker, from_middle, dtg, ProbabilityKind::PenaltyScored)?;
                let scored = self.rng.chance(percent);

                self.change_possession();
                if scored {
                    self.score_points(side, kicker, PointEvent::Penalty)?;
                    self.change_in_morale(side, kicker, true)?;
                    self.restart = true;
                } else {
                    log_if_verbose!(self, "{} penalty missed", self.game.clock);
                    self.change_in_morale(side, kicker, false)?;
                    self.move_ball_to(ground::TWENTY_TWO);
                    self.next_action = Some(Action::Kicking);
                }
                self.specialist(PreferredAction::KickOff)?;
                self.refresh_time(times::PENALTY, true)
            }
            PenaltyOption::KickToTouch => {
                let kicker = self.specialist(PreferredAction::KickOff)?;
                let longest = (self.settings.kick_max_distance as i16).min(dtg).max(1);
                let mut metres = self.rng.int(1, longest);
                let in_touch = self
                    .rng
                    .chance(self.probability(ProbabilityKind::PenaltyKickIntoTouch, false)?);
                if in_touch {
                    metres = metres.min(dtg - ground::FIVE_METRE_LINE).max(0);
                }
                self.change_ball_position(metres);
                self.add_stat(side, kicker, StatKind::MetresKicked, metres as u32)?;
                self.game.score_mut(side).kick(metres as u32);

                if in_touch {
                    // Lineout throw stays with the kicking side
                    self.refresh_time(times::PENALTY, false)?;
                    self.lineout()
                } else {
                    self.change_possession();
                    self.change_carrier();
                    self.refresh_time(times::PENALTY_KICK, true)
                }
            }
            PenaltyOption::Scrum => self.scrum(),
            PenaltyOption::TapPenalty => {
                self.change_carrier();
                self.refresh_time(times::TAP_PENALTY, true)
            }
        }
    }

    /// Roll a scrum, shifted towards the heavier pack
    pub(super) fn scrum_outcome(&mut self) -> Result<Outcome> {
        let side = self.team_in_possession;
        let coefficient = self.settings.incomplete_weight_coefficient;
        let unknown = self.settings.unknown_weight_coefficient;
        let (own, _) = self.team(side).pack_weight(self.positions, coefficient);
        let (other, _) = self.team(side.opponent()).pack_weight(self.positions, coefficient);

        // An unknown pack weight is estimated from the opposing pack
        let estimate = |known: u16| (known as f64 * unknown).round() as u16;
        let (own, other) = match (own, other) {
            (0, 0) => (0, 0),
            (0, w) => (estimate(w), w),
            (w, 0) => (w, estimate(w)),
            pair => pair,
        };

        let compensation = ((own as i32 - other as i32) / 10).clamp(-5, 5);
        let shift = self.settings.scrum_weight_shift;
        let (_, max) = self.settings.activities.range(ActionKind::Scrum)?;
        let raw = self.rng.int(shift.min(max), max) as i32;
        let roll = (raw - compensation * shift as i32).clamp(1, max as i32) as u16;
        self.settings.activities.outcome(ActionKind::Scrum, roll)
    }

    pub(super) fn scrum(&mut self) -> Result<()> {
        loop {
            self.phases = 0;
            self.next_action = None;
            self.move_ball_to(ground::FIVE_METRE_LINE);
            let side = self.team_in_possession;
            self.specialist(PreferredAction::Scrum)?;

            if !self
                .rng
                .chance(self.base_probability(ProbabilityKind::ScrumBallThrownStraight)?)
            {
                log_if_verbose!(self, "{} scrum feed not straight, free kick", self.game.clock);
                self.change_possession();
                self.specialist(PreferredAction::KickOff)?;
                return self.refresh_time(times::FREE_KICK, true);
            }

            let outcome = self.scrum_outcome()?;
            let infringement = matches!(
                outcome,
                Outcome::IntentionallyCollapsed | Outcome::NotBinding | Outcome::NotPushingStraight
            );
            let by_feeding_side = infringement && self.rng.chance(25);
            let result = match outcome {
                Outcome::ScrumWon => ScrumResult::Won,
                Outcome::ScrumLost => ScrumResult::Lost,
                Outcome::ScrumCollapsed => ScrumResult::Undetermined,
                _ if by_feeding_side => ScrumResult::Lost,
                _ => ScrumResult::Won,
            };
            let mirrored = match result {
                ScrumResult::Won => ScrumResult::Lost,
                ScrumResult::Lost => ScrumResult::Won,
                ScrumResult::Undetermined => ScrumResult::Undetermined,
            };
            self.game.score_mut(side).record_scrum(result);
            self.game.score_mut(side.opponent()).record_scrum(mirrored);

            if outcome == Outcome::ScrumCollapsed {
                log_if_verbose!(self, "{} scrum collapsed, reset", self.game.clock);
                self.refresh_time(times::SCRUM_RESET, false)?;
                continue;
            }

            if infringement {
                let offenders = if by_feeding_side { side } else { side.opponent() };
                if let Some(forward) = self.search_for_player(offenders) {
                    self.stat(offenders, forward, StatKind::PenaltiesCaused)?;
                }
                if by_feeding_side {
                    self.change_possession();
                }
                self.refresh_time(times::SCRUM, false)?;
                return self.penalty();
            }

            if result == ScrumResult::Lost {
                self.change_possession();
                self.specialist(PreferredAction::Scrum)?;
            }
            return self.refresh_time(times::SCRUM, true);
        }
    }

    pub(super) fn lineout(&mut self) -> Result<()> {
        self.phases = 0;
        self.next_action = None;
        self.move_ball_to(ground::FIVE_METRE_LINE);
        let side = self.team_in_possession;
        self.specialist(PreferredAction::Lineout)?;

        if !self
            .rng
            .chance(self.probability(ProbabilityKind::LineoutStraight, false)?)
        {
            log_if_verbose!(self, "{} lineout throw not straight", self.game.clock);
            self.refresh_time(times::LINEOUT, false)?;
            self.change_possession();
            return self.scrum();
        }

        let won = self.rng.chance(self.probability(ProbabilityKind::LineoutWon, false)?);
        self.game.score_mut(side).record_lineout(won);
        if !won {
            self.change_possession();
            self.change_carrier();
        }
        self.refresh_time(times::LINEOUT, true)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::fixture;
    use super::super::MatchContext;
    use super::*;
    use crate::core::{Player, PlayerId};
    use crate::game::controller::{DecisionStrategy, SideOrBall};
    use crate::game::match_state::{MatchType, Side};
    use crate::game::settings::MatchSettings;
    use crate::rng::MatchRng;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn scrum_win_rate(hosts_forward_weight: u16, seed: u64) -> f64 {
        let (mut game, mut hosts, mut visitors, positions) = fixture(MatchType::Regular);
        for player in hosts.squad.iter_mut().filter(|p| positions.is_forward(p.position)) {
            player.attributes.weight_kg = hosts_forward_weight;
        }
        let settings = MatchSettings::default();
        let context = MatchContext {
            positions: &positions,
            settings: &settings,
        };
        let mut engine = GameEngine::new(&mut game, &mut hosts, &mut visitors, context)
            .unwrap()
            .with_seed(seed);
        engine.start_of_match().unwrap();
        engine.team_in_possession = Side::Hosts;

        let rounds = 600;
        let won = (0..rounds)
            .filter(|_| engine.scrum_outcome().unwrap() == Outcome::ScrumWon)
            .count();
        won as f64 / rounds as f64
    }

    #[test]
    fn test_heavier_pack_wins_more_scrums() {
        let even = scrum_win_rate(110, 21);
        let heavy = scrum_win_rate(150, 21);
        assert!(heavy > even + 0.1, "heavy {heavy} vs even {even}");
    }

    /// Records the options of every penalty and always packs down a scrum
    struct PenaltyRecorder {
        offered: Rc<RefCell<Vec<SmallVec<[PenaltyOption; 4]>>>>,
    }

    impl DecisionStrategy for PenaltyRecorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn choose_side_or_ball(&mut self, _view: &MatchView<'_>, _rng: &mut MatchRng) -> SideOrBall {
            SideOrBall::Ball
        }

        fn choose_penalty_option(
            &mut self,
            _view: &MatchView<'_>,
            penalty: &PenaltyContext,
            _rng: &mut MatchRng,
        ) -> PenaltyOption {
            self.offered.borrow_mut().push(penalty.options.clone());
            PenaltyOption::Scrum
        }

        fn confirm_fatigue_replacement(&mut self, _view: &MatchView<'_>, _player: &Player) -> bool {
            false
        }

        fn choose_replacement(
            &mut self,
            _view: &MatchView<'_>,
            _outgoing: &Player,
            candidates: &[&Player],
            forced: bool,
            _rng: &mut MatchRng,
        ) -> Option<PlayerId> {
            candidates.first().filter(|_| forced).map(|p| p.id)
        }
    }

    #[test]
    fn test_penalty_in_own_half_offers_no_shot_at_goal() {
        let (mut game, mut hosts, mut visitors, positions) = fixture(MatchType::Regular);
        let settings = MatchSettings::default();
        let context = MatchContext {
            positions: &positions,
            settings: &settings,
        };
        let offered = Rc::new(RefCell::new(Vec::new()));
        let mut engine = GameEngine::new(&mut game, &mut hosts, &mut visitors, context)
            .unwrap()
            .with_seed(5)
            .with_strategy(
                Side::Hosts,
                PenaltyRecorder {
                    offered: Rc::clone(&offered),
                },
            );
        engine.start_of_match().unwrap();
        engine.team_in_possession = Side::Hosts;
        engine.distance_from_halfway = -20;

        engine.penalty().unwrap();

        let first = offered.borrow()[0].clone();
        assert!(!first.contains(&PenaltyOption::KickAtGoal));
        assert!(first.contains(&PenaltyOption::KickToTouch));
        assert!(first.contains(&PenaltyOption::Scrum));
        assert!(engine.game.score(Side::Visitors).penalties_caused() >= 1);
    }
}

//! Open play: running, tackles, rucks, passing, kicking and scoring tries

use super::{ground, times, Action, GameEngine};
use crate::core::{grade, PlayerId, PointEvent, PreferredAction, StatKind};
use crate::game::activity::{ActionKind, Outcome, ProbabilityKind};
use crate::game::match_state::Side;
use crate::game::period::MatchPeriod;
use crate::game::sink::Notice;
use crate::{Result, SimError};

impl<'a> GameEngine<'a> {
    /// Resolve the pending action, or roll a new one
    pub(super) fn play_action(&mut self) -> Result<()> {
        if self.restart {
            self.ball_to_halfway();
            return self.kicking();
        }

        let action = match self.next_action.take() {
            Some(action) => action,
            None => match self.roll(ActionKind::Play, 1)? {
                Outcome::Run => Action::Running,
                Outcome::Pass => Action::Passing,
                Outcome::Kick => Action::Kicking,
                other => {
                    return Err(SimError::InvalidState(format!("{other:?} does not start play")));
                }
            },
        };

        match action {
            Action::Running => self.running(),
            Action::Tackling => self.tackling(),
            Action::Ruck => self.ruck(),
            Action::Passing => self.passing(),
            Action::Kicking => self.kicking(),
        }
    }

    pub(super) fn running(&mut self) -> Result<()> {
        let side = self.team_in_possession;
        let carrier = self.carrier()?;
        let tackled = self.rng.chance(self.probability(ProbabilityKind::RunPlayerTackled, true)?);

        let dtg = self.distance_to_goal();
        let max = if tackled {
            if dtg >= 5 {
                5
            } else {
                dtg + 1
            }
        } else {
            grade(self.player(side, carrier)?.attributes.speed) as i16 * 2
        };
        let metres = self.rng.int(if tackled { 0 } else { 1 }, max.max(1));
        let crossed = metres > dtg;
        let gained = metres.min(dtg).max(0);

        if self.increment_carries {
            self.stat(side, carrier, StatKind::Carries)?;
            self.game.score_mut(side).add_carry();
            self.increment_carries = false;
        }
        self.add_stat(side, carrier, StatKind::MetresRun, gained as u32)?;
        self.game.score_mut(side).run(gained as u32);
        self.change_ball_position(gained);
        log_if_verbose!(
            self,
            "{} {} runs {} m",
            self.game.clock,
            self.name_of(side, carrier),
            gained
        );

        self.refresh_time(gained as u32, !crossed)?;
        if crossed {
            return self.try_attempt(carrier);
        }

        if tackled {
            self.stat(side, carrier, StatKind::TacklesReceived)?;
            if self.rng.chance(self.probability(ProbabilityKind::TackleOffload, false)?) {
                self.offload = true;
                self.next_action = Some(Action::Passing);
            } else {
                self.next_action = Some(Action::Tackling);
            }
            self.refresh_time(times::TACKLED, true)?;
        }
        Ok(())
    }

    /// The carrier grounded the ball over the line; the officials may review it
    fn try_attempt(&mut self, scorer: PlayerId) -> Result<()> {
        let side = self.team_in_possession;
        let reviewed = !self
            .rng
            .chance(100 - self.base_probability(ProbabilityKind::TryUnderReview)?.min(100));
        let legal = if reviewed {
            let name = self.name_of(side, scorer);
            self.notify(Notice::TryUnderReview, &[&name]);
            let illegal = self.probability(ProbabilityKind::TryIllegal, true)?;
            self.rng.chance(100 - illegal)
        } else {
            true
        };

        if !legal {
            log_if_verbose!(self, "{} no try after review", self.game.clock);
            self.refresh_time(times::ILLEGAL_TRY, false)?;
            self.change_possession();
            self.move_ball_to(ground::TWENTY_TWO);
            self.specialist(PreferredAction::KickOff)?;
            self.next_action = Some(Action::Kicking);
            return Ok(());
        }

        self.score_points(side, scorer, PointEvent::Try)?;
        self.change_in_team_morale(side, true)?;
        self.refresh_time(times::TRY, false)?;
        if self.game.clock.current_period() != MatchPeriod::FullTime {
            self.conversion()?;
        }
        Ok(())
    }

    /// Conversion after a try, then the conceding side restarts
    fn conversion(&mut self) -> Result<()> {
        let side = self.team_in_possession;
        let from_middle = self.rng.int(0, ground::TOUCH_TO_MIDDLE);
        let back: i16 = if from_middle <= 3 {
            5
        } else if from_middle <= 18 {
            self.rng.int(10, 22)
        } else {
            self.rng.int(22, 40)
        };

        let attempted = self
            .rng
            .chance(self.base_probability(ProbabilityKind::ConversionKicked)?);
        if attempted {
            let kicker = self.specialist(PreferredAction::Conversion)?;
            let percent =
                self.kick_at_goal_percent(side, kicker, from_middle, back, ProbabilityKind::ConversionSuccessful)?;
            if self.rng.chance(percent) {
                self.score_points(side, kicker, PointEvent::Conversion)?;
                self.change_in_morale(side, kicker, true)?;
            } else {
                log_if_verbose!(self, "{} conversion missed", self.game.clock);
                self.change_in_morale(side, kicker, false)?;
            }
        } else {
            log_if_verbose!(self, "{} conversion not attempted", self.game.clock);
        }

        self.change_in_team_morale(side.opponent(), false)?;
        self.change_possession();
        self.specialist(PreferredAction::KickOff)?;
        self.restart = true;
        self.next_action = None;
        self.refresh_time(if attempted { times::CONVERSION } else { 0 }, true)
    }

    pub(super) fn tackling(&mut self) -> Result<()> {
        let side = self.team_in_possession;
        let defence = side.opponent();
        let carrier = self.carrier()?;
        let Some(tackler) = self.search_for_opponents_player() else {
            self.next_action = Some(Action::Running);
            return Ok(());
        };

        self.stat(defence, tackler, StatKind::TacklesMade)?;
        let ratio = self.players_on_pitch_ratio(defence);
        let percent = (ratio * self.probability(ProbabilityKind::RunTackleCompleted, true)? as f64)
            .round()
            .min(100.0) as u8;
        let completed = self.rng.chance(percent);
        self.game.score_mut(defence).record_tackle(completed);

        if !completed {
            self.stat(defence, tackler, StatKind::TacklesMissed)?;
            log_if_verbose!(
                self,
                "{} {} misses the tackle",
                self.game.clock,
                self.name_of(defence, tackler)
            );
            self.next_action = Some(Action::Running);
            return Ok(());
        }
        self.stat(defence, tackler, StatKind::TacklesCompleted)?;

        match self.roll(ActionKind::Tackling, 1)? {
            Outcome::RuckFormed => {
                self.next_action = Some(Action::Ruck);
                self.refresh_time(times::TACKLE, true)
            }
            Outcome::PushedIntoTouch => {
                self.change_possession();
                self.lineout()
            }
            Outcome::BallLost => {
                self.handling_error(side, carrier)?;
                self.change_possession();
                self.player_in_possession = Some(tackler);
                self.increment_carries = true;
                self.refresh_time(times::TACKLE, true)
            }
            outcome @ (Outcome::HighTackle | Outcome::DangerousPlay) => {
                self.foul_tackle(tackler, carrier, outcome)
            }
            other => Err(SimError::InvalidState(format!("{other:?} is not a tackle outcome"))),
        }
    }

    pub(super) fn ruck(&mut self) -> Result<()> {
        let side = self.team_in_possession;
        match self.roll(ActionKind::Ruck, 1)? {
            Outcome::AnotherPhase => {
                self.phases += 1;
                self.change_carrier();
                self.refresh_time(times::RUCK_PHASE, true)
            }
            Outcome::NotReleasingBall => {
                let carrier = self.carrier()?;
                self.stat(side, carrier, StatKind::PenaltiesCaused)?;
                self.change_possession();
                self.penalty()
            }
            Outcome::NotReleasingPlayer | Outcome::Offside | Outcome::OffFeet | Outcome::InAtTheSide => {
                if let Some(infringer) = self.search_for_opponents_player() {
                    self.stat(side.opponent(), infringer, StatKind::PenaltiesCaused)?;
                }
                self.penalty()
            }
            other => Err(SimError::InvalidState(format!("{other:?} is not a ruck outcome"))),
        }
    }

    pub(super) fn passing(&mut self) -> Result<()> {
        let side = self.team_in_possession;
        let passer = self.carrier()?;
        self.stat(side, passer, StatKind::PassesMade)?;

        // A defence with more players on the pitch makes clean passes rarer
        let ratio = self.players_on_pitch_ratio(side.opponent());
        let from = if ratio <= 1.0 {
            1
        } else {
            (((ratio - 1.0) * 100.0).round().min(100.0) as u16).max(1)
        };
        let outcome = self.roll(ActionKind::Passing, from)?;
        self.refresh_time(times::PASS, true)?;
        let offload = std::mem::take(&mut self.offload);

        match outcome {
            Outcome::PassOk => {
                self.stat(side, passer, StatKind::PassesCompleted)?;
                self.game.score_mut(side).record_pass(true);
                if offload {
                    self.stat(side, passer, StatKind::Offloads)?;
                    self.game.score_mut(side).add_offload();
                }
                self.change_carrier();
            }
            Outcome::PassMissed => {
                self.pass_missed(side, passer)?;
                if self.rng.chance(50) {
                    self.handling_error(side, passer)?;
                    self.change_possession();
                    self.change_carrier();
                }
            }
            Outcome::KnockOn | Outcome::ForwardPass => {
                self.pass_missed(side, passer)?;
                let deliberate = outcome == Outcome::ForwardPass
                    && self
                        .rng
                        .chance(self.base_probability(ProbabilityKind::PassDeliberateForwardPass)?);
                self.change_possession();
                if deliberate {
                    self.stat(side, passer, StatKind::PenaltiesCaused)?;
                    self.penalty()?;
                } else {
                    self.handling_error(side, passer)?;
                    self.scrum()?;
                }
            }
            Outcome::Intercepted => {
                self.pass_missed(side, passer)?;
                self.handling_error(side, passer)?;
                self.change_possession();
                self.change_carrier();
            }
            Outcome::PassIntoTouch => {
                self.pass_missed(side, passer)?;
                self.handling_error(side, passer)?;
                self.change_possession();
                self.lineout()?;
            }
            other => {
                return Err(SimError::InvalidState(format!("{other:?} is not a passing outcome")));
            }
        }
        Ok(())
    }

    pub(super) fn kicking(&mut self) -> Result<()> {
        let side = self.team_in_possession;
        self.phases = 0;
        let dtg = self.distance_to_goal();

        // Too close to the line to kick forward
        let from = if dtg > 2 {
            1
        } else {
            self.settings.activities.upper_bound(Outcome::KickedForward)? + 1
        };
        let mut outcome = self.roll(ActionKind::Kicking, from)?;
        if self.restart
            || (outcome == Outcome::DropGoalAttempt && dtg > self.settings.drop_goal_max_distance as i16)
        {
            outcome = Outcome::KickedForward;
        }

        let kicker = self.carrier()?;
        let longest = (self.settings.kick_max_distance as i16).min(dtg).max(1);
        let mut metres = self.rng.int(1, longest);

        match outcome {
            Outcome::KickedForward => {
                self.restart = false;
                self.change_ball_position(metres);
                self.kicked(side, kicker, metres)?;
                log_if_verbose!(
                    self,
                    "{} {} kicks {} m",
                    self.game.clock,
                    self.name_of(side, kicker),
                    metres
                );
                self.refresh_time((metres / 4) as u32, true)?;
                if self
                    .rng
                    .chance(self.base_probability(ProbabilityKind::KickCaughtByOpponent)?)
                {
                    self.change_possession();
                }
                self.change_carrier();
            }
            Outcome::KickedIntoTouch => {
                if metres > 1 {
                    metres -= self.rng.int(1, metres - 1);
                }
                if self
                    .rng
                    .chance(self.base_probability(ProbabilityKind::KickDirectlyIntoTouch)?)
                    && dtg <= ground::OWN_TWENTY_TWO
                {
                    metres = 0;
                }
                metres = metres.min(dtg - ground::FIVE_METRE_LINE).max(0);
                self.change_ball_position(metres);
                self.kicked(side, kicker, metres)?;
                self.refresh_time((metres / 4) as u32, false)?;
                self.change_possession();
                self.lineout()?;
            }
            Outcome::KickBlocked => {
                log_if_verbose!(self, "{} kick charged down", self.game.clock);
                self.refresh_time(times::KICK_BLOCKED, true)?;
                if self.rng.chance(50) {
                    self.change_possession();
                }
                self.change_carrier();
            }
            Outcome::DropGoalAttempt => {
                metres = dtg;
                self.kicked(side, kicker, metres)?;
                self.score_points(side, kicker, PointEvent::DropGoal)?;
                self.change_in_morale(side, kicker, true)?;
                self.refresh_time((metres / 4) as u32 + times::DROP_GOAL, true)?;
                self.change_possession();
                self.specialist(PreferredAction::KickOff)?;
                self.restart = true;
            }
            other => {
                return Err(SimError::InvalidState(format!("{other:?} is not a kicking outcome")));
            }
        }
        Ok(())
    }

    fn kicked(&mut self, side: Side, kicker: PlayerId, metres: i16) -> Result<()> {
        let metres = metres.max(0) as u32;
        self.add_stat(side, kicker, StatKind::MetresKicked, metres)?;
        self.game.score_mut(side).kick(metres);
        Ok(())
    }

    fn pass_missed(&mut self, side: Side, passer: PlayerId) -> Result<()> {
        self.stat(side, passer, StatKind::PassesMissed)?;
        self.game.score_mut(side).record_pass(false);
        Ok(())
    }

    fn handling_error(&mut self, side: Side, player: PlayerId) -> Result<()> {
        self.stat(side, player, StatKind::HandlingErrors)?;
        self.game.score_mut(side).add_handling_error();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::fixture;
    use super::super::MatchContext;
    use super::*;
    use crate::game::match_state::MatchType;
    use crate::game::settings::MatchSettings;

    #[test]
    fn test_run_from_the_line_scores_a_try() {
        let (mut game, mut hosts, mut visitors, positions) = fixture(MatchType::Regular);
        let settings = MatchSettings::default();
        let context = MatchContext {
            positions: &positions,
            settings: &settings,
        };
        let mut engine = GameEngine::new(&mut game, &mut hosts, &mut visitors, context)
            .unwrap()
            .with_seed(3);
        engine.start_of_match().unwrap();

        for _ in 0..20 {
            engine.team_in_possession = Side::Hosts;
            engine.distance_from_halfway = ground::HALFWAY;
            engine.restart = false;
            engine.running().unwrap();
            if engine.game.score(Side::Hosts).tries() > 0 {
                break;
            }
        }

        let score = engine.game.score(Side::Hosts);
        assert_eq!(score.tries(), 1);
        assert_eq!(score.points(), 5 * score.tries() + 2 * score.conversions());
        assert!(engine.restart);
        assert_eq!(engine.team_in_possession, Side::Visitors);

        let scorer_points: u16 = engine
            .game
            .all_player_points(Side::Hosts)
            .values()
            .map(|p| p.count(PointEvent::Try))
            .sum();
        assert_eq!(scorer_points, 1);
    }

    #[test]
    fn test_restart_is_a_kick_from_halfway() {
        let (mut game, mut hosts, mut visitors, positions) = fixture(MatchType::Regular);
        let settings = MatchSettings::default();
        let context = MatchContext {
            positions: &positions,
            settings: &settings,
        };
        let mut engine = GameEngine::new(&mut game, &mut hosts, &mut visitors, context)
            .unwrap()
            .with_seed(8);
        engine.start_of_match().unwrap();
        engine.team_in_possession = Side::Hosts;
        engine.distance_from_halfway = -30;
        engine.restart = true;

        engine.play_action().unwrap();

        assert!(!engine.restart);
        assert!(engine.distance_from_halfway > 0);
        assert!(engine.game.score(Side::Hosts).metres_kicked() > 0);
    }
}

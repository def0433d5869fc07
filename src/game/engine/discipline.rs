//! Foul play, cards, the sin bin and injuries

use super::{times, GameEngine};
use crate::core::{grade, ConditionKind, HealthStatus, PlayerId, StatKind};
use crate::game::activity::{ActionKind, Outcome, ProbabilityKind};
use crate::game::match_state::{CardKind, Side};
use crate::game::sink::Notice;
use crate::{Result, SimError};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// What made a tackle dangerous
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DangerousTackleKind {
    Late,
    NoArms,
    Lifting,
    Shoulder,
}

impl DangerousTackleKind {
    pub const ALL: [DangerousTackleKind; 4] = [
        DangerousTackleKind::Late,
        DangerousTackleKind::NoArms,
        DangerousTackleKind::Lifting,
        DangerousTackleKind::Shoulder,
    ];

    pub fn description(self) -> &'static str {
        match self {
            DangerousTackleKind::Late => "late tackle",
            DangerousTackleKind::NoArms => "no arms in the tackle",
            DangerousTackleKind::Lifting => "lifting tackle",
            DangerousTackleKind::Shoulder => "shoulder charge",
        }
    }
}

impl<'a> GameEngine<'a> {
    /// High or dangerous tackle by the defending side: sanction, then a
    /// penalty. The carrier can only be hurt by a tackle that draws a card.
    pub(super) fn foul_tackle(&mut self, tackler: PlayerId, carrier: PlayerId, outcome: Outcome) -> Result<()> {
        let attack = self.team_in_possession;
        let defence = attack.opponent();

        match outcome {
            Outcome::HighTackle => {
                self.stat(defence, tackler, StatKind::HighTackles)?;
                self.stat(defence, tackler, StatKind::DangerousTackles)?;
                log_if_verbose!(
                    self,
                    "{} high tackle by {}",
                    self.game.clock,
                    self.name_of(defence, tackler)
                );
            }
            Outcome::DangerousPlay => {
                self.stat(defence, tackler, StatKind::DangerousTackles)?;
                let kind = DangerousTackleKind::ALL[self.rng.int(1usize, 4) - 1];
                let reviewed = !self
                    .rng
                    .chance(100 - self.base_probability(ProbabilityKind::TackleUnderReview)?.min(100));
                if reviewed {
                    let name = self.name_of(defence, tackler);
                    self.notify(Notice::TackleUnderReview, &[&name, kind.description()]);
                }
            }
            other => {
                return Err(SimError::InvalidState(format!("{other:?} is not foul play")));
            }
        }
        self.stat(defence, tackler, StatKind::PenaltiesCaused)?;

        if self.dangerous_tackle(defence, tackler)?.is_some() {
            self.refresh_time(times::SUSPENSION, false)?;
            if self.injury_check(attack, carrier)? {
                let seconds = self.substitution(attack, Some(carrier))?;
                self.refresh_time(seconds, false)?;
            }
        }

        self.penalty()
    }

    /// Referee's sanction for a foul tackle; calmer players draw fewer cards
    pub(super) fn dangerous_tackle(&mut self, side: Side, player: PlayerId) -> Result<Option<CardKind>> {
        let morale = self.player(side, player)?.condition.value(ConditionKind::Morale);
        let from = 11u16.saturating_sub(morale as u16).max(1);
        match self.roll(ActionKind::FoulPlay, from)? {
            Outcome::Warning => {
                log_if_verbose!(self, "{} {} warned", self.game.clock, self.name_of(side, player));
                Ok(None)
            }
            Outcome::SinBinned => self.issue_card(side, player, CardKind::Yellow).map(Some),
            Outcome::SentOff => self.issue_card(side, player, CardKind::Red).map(Some),
            other => Err(SimError::InvalidState(format!("{other:?} is not a sanction"))),
        }
    }

    /// Show a card; a second yellow in the match is a red
    pub(super) fn issue_card(&mut self, side: Side, player: PlayerId, card: CardKind) -> Result<CardKind> {
        let yellows = self
            .game
            .player_stats(side, player)
            .map_or(0, |s| s.get(StatKind::YellowCards));
        let card = if card == CardKind::Yellow && yellows >= 1 {
            CardKind::Red
        } else {
            card
        };

        let no_on_pitch = self.player(side, player)?.no_on_pitch;
        match card {
            CardKind::Yellow => {
                self.game.score_mut(side).add_yellow_card();
                self.stat(side, player, StatKind::YellowCards)?;
            }
            CardKind::Red => {
                self.game.score_mut(side).add_red_card();
                self.stat(side, player, StatKind::RedCards)?;
            }
        }
        self.game
            .add_suspension(player, no_on_pitch, side, card, self.settings.sin_bin_minutes);

        let off = self.player_mut(side, player)?;
        off.withdraw();
        if card == CardKind::Red {
            off.sent_off = true;
        }
        if self.player_in_possession == Some(player) {
            self.player_in_possession = None;
        }

        let name = self.name_of(side, player);
        let notice = match card {
            CardKind::Yellow => Notice::SinBin,
            CardKind::Red => Notice::SentOff,
        };
        self.notify(notice, &[&name]);
        Ok(card)
    }

    /// Count down yellow cards and bring players back when their time is up
    pub(super) fn update_suspensions(&mut self, minutes: u16) -> Result<()> {
        let mut returning: SmallVec<[(Side, PlayerId, u8); 2]> = SmallVec::new();
        for suspension in self.game.suspensions_mut() {
            if suspension.card != CardKind::Yellow || suspension.minutes_remaining == 0 {
                continue;
            }
            suspension.minutes_remaining = suspension.minutes_remaining.saturating_sub(minutes);
            if suspension.minutes_remaining == 0 {
                returning.push((suspension.side, suspension.player, suspension.no_on_pitch));
            }
        }

        for (side, id, no_on_pitch) in returning {
            let player = self.player_mut(side, id)?;
            if player.sent_off || player.on_pitch || !player.is_healthy() {
                continue;
            }
            player.introduce(no_on_pitch);
            let name = self.name_of(side, id);
            self.notify(Notice::ReturnFromSinBin, &[&name]);
        }
        Ok(())
    }

    /// Whether a tackled player got hurt; agility and dexterity protect them
    pub(super) fn injury_check(&mut self, side: Side, player: PlayerId) -> Result<bool> {
        let attributes = &self.player(side, player)?.attributes;
        let resilience = 50
            + (grade(attributes.agility) as u16 * 2
                + grade(attributes.dexterity) as u16 * 5
                + grade(attributes.tackling) as u16 * 3)
                / 2;
        let injured = self.rng.chance(100u16.saturating_sub(resilience) as u8);
        if !injured {
            return Ok(false);
        }

        let status = self.teams[side.index()]
            .player_mut(player)?
            .condition
            .new_health_issue(&mut self.rng, HealthStatus::Injury, HealthStatus::SeriousInjury);
        let name = self.name_of(side, player);
        self.notify(Notice::Injury, &[&name, &format!("{status:?}")]);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::fixture;
    use super::super::MatchContext;
    use super::*;
    use crate::game::match_state::MatchType;
    use crate::game::period::MatchPeriod;
    use crate::game::settings::MatchSettings;

    #[test]
    fn test_sin_bin_from_minute_ten_to_twenty() {
        let (mut game, mut hosts, mut visitors, positions) = fixture(MatchType::Regular);
        let offender = hosts.squad.iter().find(|p| p.shirt_no == 7).unwrap().id;
        let mut settings = MatchSettings::default();
        settings.automatic_substitutions = false;
        let context = MatchContext {
            positions: &positions,
            settings: &settings,
        };
        let mut engine = GameEngine::new(&mut game, &mut hosts, &mut visitors, context)
            .unwrap()
            .with_seed(9);
        engine.start_of_match().unwrap();
        engine.draw().unwrap();
        engine.game.clock.switch_to(Some(MatchPeriod::FirstHalf)).unwrap();
        engine.game.clock.add_time(10 * 60);
        engine.game.clock.reset_increment();
        let slot = engine.player(Side::Hosts, offender).unwrap().no_on_pitch;

        let card = engine.issue_card(Side::Hosts, offender, CardKind::Yellow).unwrap();
        assert_eq!(card, CardKind::Yellow);
        assert!(!engine.player(Side::Hosts, offender).unwrap().on_pitch);
        assert_eq!(engine.team(Side::Hosts).number_on_pitch(), 14);

        for _ in 0..3 {
            engine.refresh_time(60, false).unwrap();
            engine.minute_effects().unwrap();
            assert!(!engine.player(Side::Hosts, offender).unwrap().on_pitch);
        }

        // A long stoppage crosses five minutes at once
        engine.refresh_time(5 * 60 + 30, false).unwrap();
        engine.minute_effects().unwrap();
        assert_eq!(engine.game.suspensions()[0].minutes_remaining, 2);

        engine.refresh_time(89, false).unwrap();
        engine.minute_effects().unwrap();
        assert_eq!(engine.game.clock.time_played_seconds(), 19 * 60 + 59);
        assert!(!engine.player(Side::Hosts, offender).unwrap().on_pitch);
        assert!(engine.game.is_suspended(offender));

        engine.refresh_time(1, false).unwrap();
        assert_eq!(engine.game.clock.time_played_seconds(), 20 * 60);
        engine.minute_effects().unwrap();
        let back = engine.player(Side::Hosts, offender).unwrap();
        assert!(back.on_pitch);
        assert_eq!(back.no_on_pitch, slot);
        assert!(!engine.game.is_suspended(offender));
    }

    #[test]
    fn test_warning_never_injures_the_carrier() {
        for seed in 0..24 {
            let (mut game, mut hosts, mut visitors, positions) = fixture(MatchType::Regular);
            let tackler = visitors.squad.iter().find(|p| p.shirt_no == 6).unwrap().id;
            let carrier = hosts.squad.iter().find(|p| p.shirt_no == 12).unwrap().id;
            // Fragile carrier: any injury roll would come up often
            for player in hosts.squad.iter_mut().filter(|p| p.id == carrier) {
                player.attributes.agility = 1;
                player.attributes.dexterity = 1;
                player.attributes.tackling = 1;
            }
            let mut settings = MatchSettings::default();
            settings
                .activities
                .set_thresholds(ActionKind::FoulPlay, vec![(100, Outcome::Warning)]);
            let context = MatchContext {
                positions: &positions,
                settings: &settings,
            };
            let mut engine = GameEngine::new(&mut game, &mut hosts, &mut visitors, context)
                .unwrap()
                .with_seed(seed);
            engine.start_of_match().unwrap();
            engine.game.clock.switch_to(Some(MatchPeriod::FirstHalf)).unwrap();
            engine.team_in_possession = Side::Hosts;
            engine.player_in_possession = Some(carrier);
            let history = engine.player(Side::Hosts, carrier).unwrap().condition.health_history().len();

            engine.foul_tackle(tackler, carrier, Outcome::HighTackle).unwrap();

            let player = engine.player(Side::Hosts, carrier).unwrap();
            assert_eq!(player.condition.health_history().len(), history, "seed {seed}");
            assert!(player.is_healthy());
            assert!(engine.game.suspensions().is_empty());
            assert_eq!(engine.game.no_replacements(Side::Hosts), 0);

            let stats = engine.game.player_stats(Side::Visitors, tackler).unwrap();
            assert_eq!(stats.get(StatKind::HighTackles), 1);
            assert_eq!(stats.get(StatKind::DangerousTackles), 1);
        }
    }

    #[test]
    fn test_second_yellow_is_red() {
        let (mut game, mut hosts, mut visitors, positions) = fixture(MatchType::Regular);
        let offender = visitors.squad.iter().find(|p| p.shirt_no == 3).unwrap().id;
        let settings = MatchSettings::default();
        let context = MatchContext {
            positions: &positions,
            settings: &settings,
        };
        let mut engine = GameEngine::new(&mut game, &mut hosts, &mut visitors, context)
            .unwrap()
            .with_seed(9);
        engine.start_of_match().unwrap();

        engine.issue_card(Side::Visitors, offender, CardKind::Yellow).unwrap();
        engine.update_suspensions(10).unwrap();
        assert!(engine.player(Side::Visitors, offender).unwrap().on_pitch);

        let second = engine.issue_card(Side::Visitors, offender, CardKind::Yellow).unwrap();
        assert_eq!(second, CardKind::Red);
        let player = engine.player(Side::Visitors, offender).unwrap();
        assert!(player.sent_off);
        assert!(!player.on_pitch);
        assert!(engine.game.is_suspended(offender));
        assert_eq!(engine.game.score(Side::Visitors).yellow_cards(), 1);
        assert_eq!(engine.game.score(Side::Visitors).red_cards(), 1);

        engine.update_suspensions(30).unwrap();
        assert!(!engine.player(Side::Visitors, offender).unwrap().on_pitch);
    }
}

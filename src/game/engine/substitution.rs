//! Fatigue and replacements

use super::{times, GameEngine};
use crate::core::{
    grade, ConditionKind, ConditionWeights, HealthStatus, Player, PlayerId, PositionTable, Severity, StatKind, Team,
};
use crate::game::controller::MatchView;
use crate::game::match_state::{Match, Side};
use crate::game::sink::Notice;
use crate::Result;
use smallvec::{smallvec, SmallVec};

/// Replacements made in one substitution window at most
const MAX_PER_WINDOW: usize = 3;

impl<'a> GameEngine<'a> {
    /// Ten more minutes played: the player may tire
    ///
    /// Returns true when the player should be replaced, either because they
    /// collapsed with exhaustion or because their coach confirmed it.
    pub(super) fn change_in_fatigue(&mut self, side: Side, player: PlayerId) -> Result<bool> {
        let endurance = self.player(side, player)?.attributes.endurance;
        if !self.rng.chance(72 - grade(endurance) * 2) {
            return Ok(false);
        }

        if self.player(side, player)?.condition.is_at_minimum(ConditionKind::Fatigue) {
            let status = self.teams[side.index()]
                .player_mut(player)?
                .condition
                .new_health_issue(&mut self.rng, HealthStatus::Injury, HealthStatus::Injury);
            let name = self.name_of(side, player);
            self.notify(Notice::Injury, &[&name, &format!("{status:?}")]);
            return Ok(true);
        }

        self.player_mut(side, player)?
            .condition
            .decrease(ConditionKind::Fatigue, 1);
        let tired = self.player(side, player)?;
        if tired.condition.severity(ConditionKind::Fatigue) != Severity::Critical {
            return Ok(false);
        }

        let view = MatchView::new(
            &*self.game,
            &*self.teams[side.index()],
            side,
            &self.settings.condition_weights,
        );
        let tired = self.teams[side.index()].player(player)?;
        Ok(self.strategies[side.index()].confirm_fatigue_replacement(&view, tired))
    }

    /// Replace `player`, or run a regular window over every tired player
    ///
    /// Returns the seconds the replacements took.
    pub(super) fn substitution(&mut self, side: Side, player: Option<PlayerId>) -> Result<u32> {
        let min_minutes = self.settings.min_play_interval.max(1) as u32;
        let outgoing: SmallVec<[PlayerId; 16]> = match player {
            Some(id) => smallvec![id],
            None => {
                let game = &*self.game;
                let mut ids: SmallVec<[PlayerId; 16]> = self
                    .team(side)
                    .players_on_pitch()
                    .filter(|p| {
                        !p.is_healthy()
                            || game
                                .player_stats(side, p.id)
                                .map_or(0, |s| s.get(StatKind::MinutesPlayed))
                                >= min_minutes
                    })
                    .map(|p| p.id)
                    .collect();
                // Hurt players go first
                ids.sort_by_key(|&id| self.team(side).player(id).map_or(true, |p| p.is_healthy()));
                ids
            }
        };

        let mut seconds = 0;
        let mut made = 0;
        for out_id in outgoing {
            let out = self.player(side, out_id)?;
            if !out.on_pitch {
                continue;
            }
            let forced = !out.is_healthy();

            match self.pick_replacement(side, out_id, forced)? {
                Some(in_id) => {
                    self.switch_players(side, out_id, in_id)?;
                    made += 1;
                    let first = self.game.add_substitution(out_id, in_id, side);
                    if first && !self.game.clock.current_period().is_interval() {
                        seconds += times::REPLACEMENT;
                    }
                    let (off, on) = (self.name_of(side, out_id), self.name_of(side, in_id));
                    self.notify(Notice::Substitution, &[&off, &on]);
                }
                None if forced => {
                    self.player_mut(side, out_id)?.withdraw();
                    if self.player_in_possession == Some(out_id) {
                        self.player_in_possession = None;
                    }
                    log_if_verbose!(
                        self,
                        "{} {} leaves the field without replacement",
                        self.game.clock,
                        self.name_of(side, out_id)
                    );
                }
                None => {}
            }

            if (forced && player.is_some()) || made >= MAX_PER_WINDOW {
                break;
            }
        }
        Ok(seconds)
    }

    fn pick_replacement(&mut self, side: Side, outgoing: PlayerId, forced: bool) -> Result<Option<PlayerId>> {
        let team: &Team = &*self.teams[side.index()];
        let game: &Match = &*self.game;
        let weights = &self.settings.condition_weights;
        let candidates = replacements_for(team, game, self.positions, weights, side, outgoing)?;

        let view = MatchView::new(game, team, side, weights);
        let out = team.player(outgoing)?;
        let choice =
            self.strategies[side.index()].choose_replacement(&view, out, &candidates, forced, &mut self.rng);
        Ok(choice.filter(|id| candidates.iter().any(|p| p.id == *id)))
    }

    /// The incoming player takes over the outgoing player's slot and roles
    fn switch_players(&mut self, side: Side, out_id: PlayerId, in_id: PlayerId) -> Result<()> {
        let out = self.player(side, out_id)?;
        let (no_on_pitch, current_no, current_type) = (out.no_on_pitch, out.current_no, out.current_type);
        let preferences = out.preferences.clone();

        let out_of_position = self.player(side, in_id)?.position != current_type;
        let loses_form = out_of_position && self.rng.chance(50);
        let transfer = self.settings.transfer_preferences;

        let incoming = self.player_mut(side, in_id)?;
        incoming.current_no = current_no;
        incoming.current_type = current_type;
        incoming.introduce(no_on_pitch);
        if transfer {
            for action in preferences.iter() {
                incoming.preferences.insert(action);
            }
        }
        if loses_form {
            incoming.condition.decrease(ConditionKind::Form, 1);
        }

        let outgoing = self.player_mut(side, out_id)?;
        if transfer {
            outgoing.preferences.clear();
        }
        outgoing.withdraw();

        self.game.add_stats_record(side, in_id);
        self.stat(side, in_id, StatKind::GamesPlayed)?;
        self.stat(side, in_id, StatKind::GamesPlayedSub)?;
        if self.player_in_possession == Some(out_id) {
            self.player_in_possession = Some(in_id);
        }
        Ok(())
    }
}

/// Healthy bench players of the same base type who have not played yet,
/// best conditioned first
fn replacements_for<'t>(
    team: &'t Team,
    game: &Match,
    positions: &PositionTable,
    weights: &ConditionWeights,
    side: Side,
    outgoing: PlayerId,
) -> Result<SmallVec<[&'t Player; 8]>> {
    let base = positions.base_type_of(team.player(outgoing)?.current_type);
    let mut candidates: SmallVec<[&Player; 8]> = team
        .squad
        .iter()
        .filter(|p| {
            p.is_on_bench()
                && p.is_healthy()
                && !p.sent_off
                && !game.is_suspended(p.id)
                && !game.has_stats_record(side, p.id)
                && positions.base_type_of(p.position) == base
        })
        .collect();
    candidates.sort_by(|a, b| b.overall(weights).cmp(&a.overall(weights)));
    Ok(candidates)
}

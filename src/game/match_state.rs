//! Match record: teams, clock, scores, per-player ledgers and discipline

use crate::core::{MatchId, PlayerId, PlayerPoints, PlayerStats, RefereeId, ResultType, TeamId};
use crate::game::clock::MatchClock;
use crate::game::score::MatchScore;
use crate::game::settings::CompetitionRules;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    Hosts,
    Visitors,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Hosts, Side::Visitors];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::Hosts => Side::Visitors,
            Side::Visitors => Side::Hosts,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchType {
    Regular,
    Playoffs,
}

/// How a playoff fixture's teams are determined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayoffRule {
    /// Teams placed in regular-season groups (ranking 1 = group winner)
    FromRegularSeason {
        hosts_group: String,
        hosts_ranking: u8,
        visitors_group: String,
        visitors_ranking: u8,
    },
    /// Winner (or loser) of earlier playoff matches
    FromPriorPlayoffRound {
        hosts_from_match: MatchId,
        hosts_winner: bool,
        visitors_from_match: MatchId,
        visitors_winner: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardKind {
    Yellow,
    Red,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinBin {
    pub player: PlayerId,
    /// Pitch slot the player left, taken back on return
    pub no_on_pitch: u8,
    pub side: Side,
    pub card: CardKind,
    pub at_minute: u16,
    pub minutes_remaining: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub player_out: PlayerId,
    pub player_in: PlayerId,
    pub side: Side,
    pub minute: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub round: u16,
    pub hosts: TeamId,
    pub visitors: TeamId,
    pub match_type: MatchType,
    pub scheduled: Option<String>,
    pub referee: Option<RefereeId>,
    pub venue: Option<String>,
    pub played: bool,
    pub stored: bool,
    pub playoff_rule: Option<PlayoffRule>,
    pub clock: MatchClock,
    pub rules: CompetitionRules,
    scores: [MatchScore; 2],
    player_stats: [BTreeMap<PlayerId, PlayerStats>; 2],
    player_points: [BTreeMap<PlayerId, PlayerPoints>; 2],
    sin_bin: Vec<SinBin>,
    substitutions: Vec<Substitution>,
}

impl Match {
    pub fn new(
        id: MatchId,
        round: u16,
        hosts: TeamId,
        visitors: TeamId,
        match_type: MatchType,
        rules: CompetitionRules,
    ) -> Self {
        Match {
            id,
            round,
            hosts,
            visitors,
            match_type,
            scheduled: None,
            referee: None,
            venue: None,
            played: false,
            stored: false,
            playoff_rule: None,
            clock: MatchClock::new(),
            rules,
            scores: [MatchScore::new(rules.point_values), MatchScore::new(rules.point_values)],
            player_stats: [BTreeMap::new(), BTreeMap::new()],
            player_points: [BTreeMap::new(), BTreeMap::new()],
            sin_bin: Vec::new(),
            substitutions: Vec::new(),
        }
    }

    pub fn team_id(&self, side: Side) -> TeamId {
        match side {
            Side::Hosts => self.hosts,
            Side::Visitors => self.visitors,
        }
    }

    pub fn side_of(&self, team: TeamId) -> Option<Side> {
        if team == self.hosts {
            Some(Side::Hosts)
        } else if team == self.visitors {
            Some(Side::Visitors)
        } else {
            None
        }
    }

    pub fn venue_name(&self) -> &str {
        self.venue.as_deref().unwrap_or("neutral ground")
    }

    pub fn score(&self, side: Side) -> &MatchScore {
        &self.scores[side.index()]
    }

    pub fn score_mut(&mut self, side: Side) -> &mut MatchScore {
        &mut self.scores[side.index()]
    }

    pub fn points_scored(&self, side: Side) -> u16 {
        self.score(side).points()
    }

    /// Hosts minus visitors, negated for the visitors
    pub fn point_difference(&self, side: Side) -> i32 {
        let diff = self.points_scored(Side::Hosts) as i32 - self.points_scored(Side::Visitors) as i32;
        match side {
            Side::Hosts => diff,
            Side::Visitors => -diff,
        }
    }

    pub fn point_difference_in_range(
        &self,
        side: Side,
        min: i32,
        max: i32,
        min_closed: bool,
        max_closed: bool,
    ) -> bool {
        let diff = self.point_difference(side);
        let above = if min_closed { diff >= min } else { diff > min };
        let below = if max_closed { diff <= max } else { diff < max };
        above && below
    }

    /// Result on points alone
    pub fn result_for(&self, side: Side) -> ResultType {
        match self.point_difference(side) {
            d if d > 0 => ResultType::Win,
            0 => ResultType::Draw,
            _ => ResultType::Loss,
        }
    }

    /// Final result, with playoff draws settled by the kicking competition
    pub fn result_type_for(&self, side: Side) -> ResultType {
        let result = self.result_for(side);
        if result != ResultType::Draw || self.match_type != MatchType::Playoffs {
            return result;
        }
        let own = self.score(side).shoot_out_goals();
        let other = self.score(side.opponent()).shoot_out_goals();
        match own.cmp(&other) {
            std::cmp::Ordering::Greater => ResultType::Win,
            std::cmp::Ordering::Equal => ResultType::Draw,
            std::cmp::Ordering::Less => ResultType::Loss,
        }
    }

    pub fn winner(&self) -> Option<Side> {
        Side::ALL.into_iter().find(|&s| self.result_type_for(s) == ResultType::Win)
    }

    pub fn winner_team(&self) -> Option<TeamId> {
        self.winner().map(|s| self.team_id(s))
    }

    pub fn loser_team(&self) -> Option<TeamId> {
        self.winner().map(|s| self.team_id(s.opponent()))
    }

    pub fn bonus_point_try(&self, side: Side) -> bool {
        self.score(side).tries() >= self.rules.tries_for_bonus
    }

    pub fn diff_bonus_point(&self, side: Side) -> bool {
        let diff = self.point_difference(side);
        diff < 0 && diff.unsigned_abs() <= self.rules.losing_bonus_margin as u32
    }

    /// Standings points earned from this match
    pub fn points(&self, side: Side) -> u16 {
        let standings = &self.rules.standings;
        let base = match self.result_type_for(side) {
            ResultType::Win => standings.win,
            ResultType::Draw => standings.draw,
            ResultType::Loss if self.diff_bonus_point(side) => standings.losing_bonus,
            ResultType::Loss => 0,
        };
        let try_bonus = if self.bonus_point_try(side) {
            standings.try_bonus
        } else {
            0
        };
        base + try_bonus
    }

    /// "hosts : visitors" goals of the kicking competition, if one decided anything
    pub fn shoot_out_result(&self) -> Option<String> {
        let hosts = self.score(Side::Hosts).shoot_out_goals();
        let visitors = self.score(Side::Visitors).shoot_out_goals();
        (hosts != visitors).then(|| format!("{hosts} : {visitors}"))
    }

    /// Share of possession in percent, `None` before any time was booked
    pub fn possession_ratio(&self, side: Side) -> Option<u8> {
        let own = self.score(side).possession_seconds();
        let total = own + self.score(side.opponent()).possession_seconds();
        (total > 0).then(|| (own as u64 * 100 / total as u64) as u8)
    }

    pub fn territory_ratio(&self, side: Side) -> Option<u8> {
        let own = self.score(side).territory_seconds();
        let total = own + self.score(side.opponent()).territory_seconds();
        (total > 0).then(|| (own as u64 * 100 / total as u64) as u8)
    }

    pub fn has_stats_record(&self, side: Side, player: PlayerId) -> bool {
        self.player_stats[side.index()].contains_key(&player)
    }

    pub fn add_stats_record(&mut self, side: Side, player: PlayerId) {
        self.player_stats[side.index()].entry(player).or_default();
    }

    pub fn player_stats(&self, side: Side, player: PlayerId) -> Option<&PlayerStats> {
        self.player_stats[side.index()].get(&player)
    }

    pub fn player_stats_mut(&mut self, side: Side, player: PlayerId) -> &mut PlayerStats {
        self.player_stats[side.index()].entry(player).or_default()
    }

    pub fn all_player_stats(&self, side: Side) -> &BTreeMap<PlayerId, PlayerStats> {
        &self.player_stats[side.index()]
    }

    pub fn player_points(&self, side: Side, player: PlayerId) -> Option<&PlayerPoints> {
        self.player_points[side.index()].get(&player)
    }

    pub fn player_points_mut(&mut self, side: Side, player: PlayerId) -> &mut PlayerPoints {
        self.player_points[side.index()].entry(player).or_default()
    }

    pub fn all_player_points(&self, side: Side) -> &BTreeMap<PlayerId, PlayerPoints> {
        &self.player_points[side.index()]
    }

    /// Suspend a player from the next minute on; red cards never expire
    pub fn add_suspension(
        &mut self,
        player: PlayerId,
        no_on_pitch: u8,
        side: Side,
        card: CardKind,
        minutes: u16,
    ) {
        let minutes_remaining = match card {
            CardKind::Yellow => minutes,
            CardKind::Red => 0,
        };
        self.sin_bin.push(SinBin {
            player,
            no_on_pitch,
            side,
            card,
            at_minute: self.clock.minutes_played() + 1,
            minutes_remaining,
        });
    }

    pub fn suspensions(&self) -> &[SinBin] {
        &self.sin_bin
    }

    pub fn suspensions_mut(&mut self) -> &mut [SinBin] {
        &mut self.sin_bin
    }

    pub fn no_suspensions(&self) -> usize {
        self.sin_bin.len()
    }

    pub fn is_suspended(&self, player: PlayerId) -> bool {
        self.sin_bin
            .iter()
            .any(|s| s.player == player && (s.card == CardKind::Red || s.minutes_remaining > 0))
    }

    /// Record a replacement; returns true when it is the first one at this minute
    pub fn add_substitution(&mut self, player_out: PlayerId, player_in: PlayerId, side: Side) -> bool {
        let minute = self.clock.minutes_played() + 1;
        let first = !self.substitutions.iter().any(|s| s.minute == minute);
        self.substitutions.push(Substitution {
            player_out,
            player_in,
            side,
            minute,
        });
        first
    }

    pub fn substitutions(&self) -> &[Substitution] {
        &self.substitutions
    }

    pub fn no_replacements(&self, side: Side) -> usize {
        self.substitutions.iter().filter(|s| s.side == side).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EntityId, PointEvent};

    fn fixture(match_type: MatchType) -> Match {
        Match::new(
            EntityId::new(1),
            1,
            EntityId::new(10),
            EntityId::new(20),
            match_type,
            CompetitionRules::default(),
        )
    }

    #[test]
    fn test_standings_points_with_bonuses() {
        let mut m = fixture(MatchType::Regular);
        for _ in 0..4 {
            m.score_mut(Side::Hosts).record(PointEvent::Try);
        }
        for _ in 0..7 {
            m.score_mut(Side::Visitors).record(PointEvent::Penalty);
        }
        // 20 : 21
        assert_eq!(m.result_for(Side::Hosts), ResultType::Loss);
        assert!(m.diff_bonus_point(Side::Hosts));
        assert!(m.bonus_point_try(Side::Hosts));
        assert_eq!(m.points(Side::Hosts), 2);
        assert_eq!(m.points(Side::Visitors), 4);
        assert_eq!(m.winner_team(), Some(EntityId::new(20)));
    }

    #[test]
    fn test_draw_in_playoffs_settled_by_shoot_out() {
        let mut m = fixture(MatchType::Playoffs);
        assert_eq!(m.result_type_for(Side::Hosts), ResultType::Draw);
        assert_eq!(m.shoot_out_result(), None);
        m.score_mut(Side::Hosts).set_shoot_out_goals(3);
        m.score_mut(Side::Visitors).set_shoot_out_goals(4);
        assert_eq!(m.result_for(Side::Hosts), ResultType::Draw);
        assert_eq!(m.result_type_for(Side::Hosts), ResultType::Loss);
        assert_eq!(m.winner(), Some(Side::Visitors));
        assert_eq!(m.shoot_out_result().as_deref(), Some("3 : 4"));
    }

    #[test]
    fn test_point_difference_in_range() {
        let mut m = fixture(MatchType::Regular);
        m.score_mut(Side::Visitors).record(PointEvent::Try);
        assert!(m.point_difference_in_range(Side::Hosts, -7, -3, true, false));
        assert!(!m.point_difference_in_range(Side::Visitors, -7, -3, true, false));
        assert!(m.point_difference_in_range(Side::Visitors, 5, 5, true, true));
    }

    #[test]
    fn test_first_substitution_at_minute() {
        let mut m = fixture(MatchType::Regular);
        assert!(m.add_substitution(EntityId::new(1), EntityId::new(2), Side::Hosts));
        assert!(!m.add_substitution(EntityId::new(3), EntityId::new(4), Side::Visitors));
        assert_eq!(m.no_replacements(Side::Hosts), 1);
        m.clock.add_time(60);
        assert!(m.add_substitution(EntityId::new(5), EntityId::new(6), Side::Hosts));
    }

    #[test]
    fn test_red_card_never_expires() {
        let mut m = fixture(MatchType::Regular);
        m.add_suspension(EntityId::new(7), 4, Side::Hosts, CardKind::Red, 10);
        assert_eq!(m.suspensions()[0].minutes_remaining, 0);
        assert!(m.is_suspended(EntityId::new(7)));
        assert_eq!(m.venue_name(), "neutral ground");
    }
}

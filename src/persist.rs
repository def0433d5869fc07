//! Flat rows a completed match is stored as
//!
//! A [`MatchRecord`] holds one [`TeamScoreRow`] per side, one
//! [`PlayerPointsRow`] per scoring player, one [`PlayerStatsRow`] per player
//! who took part, and one row per suspension and per substitution. Standings
//! can be rebuilt from the team rows alone with [`standings_from_rows`].

use crate::core::{MatchId, PlayerId, PlayerStats, RefereeId, ResultType, TeamId, TeamPoints, TeamResults};
use crate::game::{CardKind, CompetitionRules, Match, MatchPeriod, MatchType, Side};
use crate::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamScoreRow {
    pub match_id: MatchId,
    pub team: TeamId,
    pub side: Side,
    pub match_type: MatchType,
    pub points: u16,
    pub tries: u16,
    pub conversions: u16,
    pub penalties: u16,
    pub drop_goals: u16,
    pub scrums_won: u16,
    pub scrums_lost: u16,
    pub lineouts_won: u16,
    pub lineouts_lost: u16,
    pub tackles_completed: u16,
    pub tackles_missed: u16,
    pub passes_completed: u16,
    pub passes_missed: u16,
    pub carries: u16,
    pub metres_run: u32,
    pub metres_kicked: u32,
    pub handling_errors: u16,
    pub offloads: u16,
    pub penalties_caused: u16,
    pub yellow_cards: u16,
    pub red_cards: u16,
    pub shoot_out_goals: u16,
    pub possession_seconds: u32,
    pub territory_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPointsRow {
    pub match_id: MatchId,
    pub team: TeamId,
    pub player: PlayerId,
    pub tries: u16,
    pub conversions: u16,
    pub penalties: u16,
    pub drop_goals: u16,
    pub points: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStatsRow {
    pub match_id: MatchId,
    pub team: TeamId,
    pub player: PlayerId,
    pub stats: PlayerStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspensionRow {
    pub match_id: MatchId,
    pub team: TeamId,
    pub player: PlayerId,
    pub card: CardKind,
    pub at_minute: u16,
    pub minutes_remaining: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionRow {
    pub match_id: MatchId,
    pub team: TeamId,
    pub player_out: PlayerId,
    pub player_in: PlayerId,
    pub minute: u16,
}

/// Everything the store keeps of one played match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: MatchId,
    pub round: u16,
    pub referee: Option<RefereeId>,
    pub venue: String,
    pub last_period_played: MatchPeriod,
    pub teams: Vec<TeamScoreRow>,
    pub player_points: Vec<PlayerPointsRow>,
    pub player_stats: Vec<PlayerStatsRow>,
    pub suspensions: Vec<SuspensionRow>,
    pub substitutions: Vec<SubstitutionRow>,
}

impl MatchRecord {
    /// Flatten a played match into rows
    pub fn from_match(game: &Match) -> Result<Self> {
        if !game.played {
            return Err(SimError::InvalidState(format!(
                "match {} has not been played",
                game.id
            )));
        }

        let teams = Side::ALL.into_iter().map(|side| team_row(game, side)).collect();

        let mut player_points = Vec::new();
        let mut player_stats = Vec::new();
        for side in Side::ALL {
            let team = game.team_id(side);
            let values = game.score(side).point_values();
            for (&player, points) in game.all_player_points(side) {
                if points.is_empty() {
                    continue;
                }
                player_points.push(PlayerPointsRow {
                    match_id: game.id,
                    team,
                    player,
                    tries: points.tries,
                    conversions: points.conversions,
                    penalties: points.penalties,
                    drop_goals: points.drop_goals,
                    points: points.points(values),
                });
            }
            for (&player, stats) in game.all_player_stats(side) {
                player_stats.push(PlayerStatsRow {
                    match_id: game.id,
                    team,
                    player,
                    stats: stats.clone(),
                });
            }
        }

        let suspensions = game
            .suspensions()
            .iter()
            .map(|s| SuspensionRow {
                match_id: game.id,
                team: game.team_id(s.side),
                player: s.player,
                card: s.card,
                at_minute: s.at_minute,
                minutes_remaining: s.minutes_remaining,
            })
            .collect();

        let substitutions = game
            .substitutions()
            .iter()
            .map(|s| SubstitutionRow {
                match_id: game.id,
                team: game.team_id(s.side),
                player_out: s.player_out,
                player_in: s.player_in,
                minute: s.minute,
            })
            .collect();

        Ok(MatchRecord {
            match_id: game.id,
            round: game.round,
            referee: game.referee,
            venue: game.venue_name().to_string(),
            last_period_played: game.clock.last_period_played(),
            teams,
            player_points,
            player_stats,
            suspensions,
            substitutions,
        })
    }

    pub fn team_row(&self, side: Side) -> Option<&TeamScoreRow> {
        self.teams.iter().find(|row| row.side == side)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn team_row(game: &Match, side: Side) -> TeamScoreRow {
    let score = game.score(side);
    TeamScoreRow {
        match_id: game.id,
        team: game.team_id(side),
        side,
        match_type: game.match_type,
        points: score.points(),
        tries: score.tries(),
        conversions: score.conversions(),
        penalties: score.penalties(),
        drop_goals: score.drop_goals(),
        scrums_won: score.scrums_won(),
        scrums_lost: score.scrums_lost(),
        lineouts_won: score.lineouts_won(),
        lineouts_lost: score.lineouts_lost(),
        tackles_completed: score.tackles_completed(),
        tackles_missed: score.tackles_missed(),
        passes_completed: score.passes_completed(),
        passes_missed: score.passes_missed(),
        carries: score.carries(),
        metres_run: score.metres_run(),
        metres_kicked: score.metres_kicked(),
        handling_errors: score.handling_errors(),
        offloads: score.offloads(),
        penalties_caused: score.penalties_caused(),
        yellow_cards: score.yellow_cards(),
        red_cards: score.red_cards(),
        shoot_out_goals: score.shoot_out_goals(),
        possession_seconds: score.possession_seconds(),
        territory_seconds: score.territory_seconds(),
    }
}

/// A team's regular-season record rebuilt from stored rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub results: TeamResults,
    pub points: TeamPoints,
}

/// Rebuild regular-season records from team rows
///
/// Rows are paired by match; playoff rows and matches with a missing side
/// are skipped, since only regular-season matches count towards standings.
pub fn standings_from_rows(rows: &[TeamScoreRow], rules: &CompetitionRules) -> BTreeMap<TeamId, Standing> {
    let mut by_match: BTreeMap<MatchId, [Option<&TeamScoreRow>; 2]> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.match_type == MatchType::Regular) {
        by_match.entry(row.match_id).or_default()[row.side.index()] = Some(row);
    }

    let mut standings: BTreeMap<TeamId, Standing> = BTreeMap::new();
    for pair in by_match.values() {
        let [Some(hosts), Some(visitors)] = *pair else {
            continue;
        };
        for (own, other) in [(hosts, visitors), (visitors, hosts)] {
            let diff = own.points as i32 - other.points as i32;
            let result = match diff {
                d if d > 0 => ResultType::Win,
                0 => ResultType::Draw,
                _ => ResultType::Loss,
            };
            let try_bonus = own.tries >= rules.tries_for_bonus;
            let diff_bonus = diff < 0 && diff.unsigned_abs() <= rules.losing_bonus_margin as u32;

            let standing = standings.entry(own.team).or_default();
            standing.results.update_results(result, try_bonus, diff_bonus);
            let points = &mut standing.points;
            points.tries += own.tries;
            points.conversions += own.conversions;
            points.penalties += own.penalties;
            points.drop_goals += own.drop_goals;
            points.points_for += own.points;
            points.points_against += other.points;
            points.tries_against += other.tries;
        }
    }
    standings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::engine::tests::fixture;
    use crate::game::{GameEngine, MatchContext, MatchSettings};

    fn played(match_type: MatchType, seed: u64) -> (Match, crate::core::Team, crate::core::Team) {
        let (mut game, mut hosts, mut visitors, positions) = fixture(match_type);
        let settings = MatchSettings::default();
        let context = MatchContext {
            positions: &positions,
            settings: &settings,
        };
        GameEngine::new(&mut game, &mut hosts, &mut visitors, context)
            .unwrap()
            .with_seed(seed)
            .play_to_completion()
            .unwrap();
        (game, hosts, visitors)
    }

    #[test]
    fn test_unplayed_match_is_rejected() {
        let (game, _, _, _) = fixture(MatchType::Regular);
        assert!(matches!(MatchRecord::from_match(&game), Err(SimError::InvalidState(_))));
    }

    #[test]
    fn test_rows_match_the_score() {
        let (game, _, _) = played(MatchType::Regular, 21);
        let record = MatchRecord::from_match(&game).unwrap();

        assert_eq!(record.teams.len(), 2);
        for side in Side::ALL {
            let row = record.team_row(side).unwrap();
            assert_eq!(row.team, game.team_id(side));
            assert_eq!(row.points, game.points_scored(side));
            let scorers: u16 = record
                .player_points
                .iter()
                .filter(|p| p.team == row.team)
                .map(|p| p.points)
                .sum();
            assert_eq!(scorers, row.points);
        }
        assert_eq!(record.substitutions.len(), game.substitutions().len());
        assert!(record.player_stats.len() >= 30);
    }

    #[test]
    fn test_standings_from_rows_match_team_records() {
        let (game, hosts, visitors) = played(MatchType::Regular, 5);
        let record = MatchRecord::from_match(&game).unwrap();
        let restored = MatchRecord::from_json(&record.to_json().unwrap()).unwrap();

        let standings = standings_from_rows(&restored.teams, &game.rules);
        for team in [&hosts, &visitors] {
            let standing = standings[&team.id];
            similar_asserts::assert_eq!(standing.results, team.results);
            similar_asserts::assert_eq!(standing.points, team.points);
        }
    }

    #[test]
    fn test_playoff_rows_do_not_count() {
        let (game, _, _) = played(MatchType::Playoffs, 5);
        let record = MatchRecord::from_match(&game).unwrap();
        assert!(standings_from_rows(&record.teams, &game.rules).is_empty());
    }
}

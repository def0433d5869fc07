//! League fixtures, rounds and playoffs
//!
//! A [`League`] owns the teams, the referee pool and every fixture of a
//! season. Rounds are played in parallel with rayon: each fixture takes its
//! two teams out of the store, plays on its own seeded engine and hands them
//! back, so results never depend on thread scheduling.

use crate::core::{
    draw_referee, EntityId, EntityStore, MatchId, PositionTable, Referee, RefereeId, Team, TeamId,
};
use crate::game::{
    GameEngine, Match, MatchContext, MatchSettings, MatchSummary, MatchType, NullSink, PlayoffRule,
    PresentationSink, VerbosityLevel,
};
use crate::persist::MatchRecord;
use crate::rng::MatchRng;
use crate::{Result, SimError};
use rayon::prelude::*;
use std::cmp::Reverse;

/// Placeholder for playoff teams not known yet
pub const TO_BE_DECIDED: TeamId = EntityId::new(u32::MAX);

/// Days of rest between two rounds
const DAYS_BETWEEN_ROUNDS: u16 = 7;

/// Odd constant spreading per-fixture seeds over the seed space
const SEED_SPREAD: u64 = 0x9E37_79B9_7F4A_7C15;

/// Seed of the fixture at `index`, derived from the league seed
pub fn fixture_seed(seed: u64, index: usize) -> u64 {
    seed.wrapping_add((index as u64).wrapping_mul(SEED_SPREAD))
}

pub struct League {
    pub name: String,
    pub teams: EntityStore<Team>,
    pub referees: EntityStore<Referee>,
    matches: Vec<Match>,
    records: Vec<MatchRecord>,
    positions: PositionTable,
    settings: MatchSettings,
    seed: u64,
    verbosity: VerbosityLevel,
}

impl League {
    pub fn new(name: impl Into<String>, positions: PositionTable, settings: MatchSettings, seed: u64) -> Self {
        League {
            name: name.into(),
            teams: EntityStore::new(),
            referees: EntityStore::new(),
            matches: Vec::new(),
            records: Vec::new(),
            positions,
            settings,
            seed,
            verbosity: VerbosityLevel::Silent,
        }
    }

    /// Replace the match settings; unplayed fixtures adopt the new rules
    pub fn with_settings(mut self, settings: MatchSettings) -> Result<Self> {
        settings.validate()?;
        for game in self.matches.iter_mut().filter(|m| !m.played) {
            let mut fresh = Match::new(
                game.id,
                game.round,
                game.hosts,
                game.visitors,
                game.match_type,
                settings.rules,
            );
            fresh.scheduled = game.scheduled.take();
            fresh.referee = game.referee;
            fresh.venue = game.venue.take();
            fresh.playoff_rule = game.playoff_rule.take();
            *game = fresh;
        }
        self.settings = settings;
        Ok(self)
    }

    /// Narration level of matches played through [`League::play_match`]
    pub fn with_verbosity(mut self, verbosity: VerbosityLevel) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn positions(&self) -> &PositionTable {
        &self.positions
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn get_match(&self, id: MatchId) -> Result<&Match> {
        self.matches
            .iter()
            .find(|m| m.id == id)
            .ok_or(SimError::EntityNotFound(id.as_u32()))
    }

    pub fn add_team(&mut self, team: Team) -> TeamId {
        let id = team.id;
        self.teams.insert(id, team);
        id
    }

    pub fn add_referee(&mut self, referee: Referee) -> RefereeId {
        let id = referee.id;
        self.referees.insert(id, referee);
        id
    }

    /// Schedule a regular-season fixture at the hosts' venue
    pub fn add_fixture(&mut self, round: u16, hosts: TeamId, visitors: TeamId) -> Result<MatchId> {
        if hosts == visitors {
            return Err(SimError::Config(format!("team {hosts} cannot play itself")));
        }
        let venue = self.teams.get(hosts)?.venue.clone();
        self.teams.get(visitors)?;

        let id = EntityId::new(self.matches.len() as u32);
        let mut game = Match::new(id, round, hosts, visitors, MatchType::Regular, self.settings.rules);
        game.venue = venue;
        self.matches.push(game);
        Ok(id)
    }

    /// Schedule a playoff fixture whose teams are resolved by `rule`
    pub fn add_playoff_fixture(&mut self, round: u16, rule: PlayoffRule) -> Result<MatchId> {
        if let PlayoffRule::FromPriorPlayoffRound {
            hosts_from_match,
            visitors_from_match,
            ..
        } = &rule
        {
            for from in [*hosts_from_match, *visitors_from_match] {
                let earlier = self.get_match(from)?;
                if earlier.match_type != MatchType::Playoffs || earlier.round >= round {
                    return Err(SimError::Config(format!(
                        "match {from} is not an earlier playoff match"
                    )));
                }
            }
        }

        let id = EntityId::new(self.matches.len() as u32);
        let mut game = Match::new(
            id,
            round,
            TO_BE_DECIDED,
            TO_BE_DECIDED,
            MatchType::Playoffs,
            self.settings.rules,
        );
        game.playoff_rule = Some(rule);
        self.matches.push(game);
        Ok(id)
    }

    /// Lowest round with an unplayed fixture
    pub fn next_round(&self) -> Option<u16> {
        self.matches.iter().filter(|m| !m.played).map(|m| m.round).min()
    }

    /// The team's next unplayed fixture
    pub fn next_match_for(&self, team: TeamId) -> Option<&Match> {
        self.matches
            .iter()
            .filter(|m| !m.played && (m.hosts == team || m.visitors == team))
            .min_by_key(|m| (m.round, m.id))
    }

    /// Teams ordered by standings points, then points difference, then tries
    ///
    /// `group` restricts the table to one regular-season group.
    pub fn standings(&self, group: Option<&str>) -> Vec<&Team> {
        let standings = &self.settings.rules.standings;
        let mut table: Vec<&Team> = self
            .teams
            .iter()
            .map(|(_, team)| team)
            .filter(|team| group.map_or(true, |g| team.group == g))
            .collect();
        table.sort_by_key(|team| {
            (
                Reverse(team.results.points_total(standings)),
                Reverse(team.points.difference()),
                Reverse(team.points.tries),
                team.id,
            )
        });
        table
    }

    /// Fill in the teams of this round's playoff fixtures
    pub fn assign_playoff_teams(&mut self, round: u16) -> Result<()> {
        for index in 0..self.matches.len() {
            let game = &self.matches[index];
            if game.round != round || game.played || game.hosts != TO_BE_DECIDED {
                continue;
            }
            let Some(rule) = game.playoff_rule.clone() else {
                continue;
            };

            let (hosts, visitors) = match &rule {
                PlayoffRule::FromRegularSeason {
                    hosts_group,
                    hosts_ranking,
                    visitors_group,
                    visitors_ranking,
                } => (
                    self.placed_team(hosts_group, *hosts_ranking)?,
                    self.placed_team(visitors_group, *visitors_ranking)?,
                ),
                PlayoffRule::FromPriorPlayoffRound {
                    hosts_from_match,
                    hosts_winner,
                    visitors_from_match,
                    visitors_winner,
                } => (
                    self.playoff_team(*hosts_from_match, *hosts_winner)?,
                    self.playoff_team(*visitors_from_match, *visitors_winner)?,
                ),
            };

            if hosts == visitors {
                return Err(SimError::Config(format!(
                    "playoff match {} pairs team {hosts} with itself",
                    self.matches[index].id
                )));
            }
            let venue = self.teams.get(hosts)?.venue.clone();
            for id in [hosts, visitors] {
                self.teams.get_mut(id)?.in_playoffs = true;
            }

            let game = &mut self.matches[index];
            game.hosts = hosts;
            game.visitors = visitors;
            game.venue = venue;
        }
        Ok(())
    }

    fn placed_team(&self, group: &str, ranking: u8) -> Result<TeamId> {
        let place = (ranking as usize).checked_sub(1);
        place
            .and_then(|i| self.standings(Some(group)).get(i).map(|team| team.id))
            .ok_or_else(|| SimError::Config(format!("group {group:?} has no team placed {ranking}")))
    }

    fn playoff_team(&self, from: MatchId, winner: bool) -> Result<TeamId> {
        let earlier = self.get_match(from)?;
        if !earlier.played {
            return Err(SimError::InvalidState(format!("playoff match {from} has not been played")));
        }
        let team = if winner {
            earlier.winner_team()
        } else {
            earlier.loser_team()
        };
        team.ok_or_else(|| SimError::InvalidState(format!("playoff match {from} has no winner")))
    }

    /// Play one fixture on its own, narrated to `sink`
    pub fn play_match<'s>(&'s mut self, id: MatchId, sink: impl PresentationSink + 's) -> Result<MatchSummary> {
        let index = self
            .matches
            .iter()
            .position(|m| m.id == id)
            .ok_or(SimError::EntityNotFound(id.as_u32()))?;
        let round = self.matches[index].round;
        self.assign_playoff_teams(round)?;
        self.appoint_referees(&[index]);

        let (hosts_id, visitors_id) = (self.matches[index].hosts, self.matches[index].visitors);
        self.teams.get(visitors_id)?;
        let mut hosts = self.teams.remove(hosts_id)?;
        let mut visitors = self.teams.remove(visitors_id)?;
        let seed = fixture_seed(self.seed, index);
        let played = play_fixture(
            &mut self.matches[index],
            &mut hosts,
            &mut visitors,
            &self.positions,
            &self.settings,
            seed,
            self.verbosity,
            sink,
        );
        self.teams.insert(hosts.id, hosts);
        self.teams.insert(visitors.id, visitors);

        let summary = played?;
        self.store(index)?;
        Ok(summary)
    }

    /// Play every unplayed fixture of `round`, then let the squads rest
    ///
    /// Summaries come back in fixture order.
    pub fn play_round(&mut self, round: u16) -> Result<Vec<MatchSummary>> {
        self.assign_playoff_teams(round)?;
        let indices: Vec<usize> = (0..self.matches.len())
            .filter(|&i| self.matches[i].round == round && !self.matches[i].played)
            .collect();
        self.appoint_referees(&indices);

        let mut taken: Vec<TeamId> = Vec::with_capacity(indices.len() * 2);
        for &index in &indices {
            let game = &self.matches[index];
            for id in [game.hosts, game.visitors] {
                if taken.contains(&id) {
                    return Err(SimError::Config(format!("team {id} plays twice in round {round}")));
                }
                self.teams.get(id)?;
                taken.push(id);
            }
        }

        let mut jobs = Vec::with_capacity(indices.len());
        for &index in &indices {
            let (hosts, visitors) = (self.matches[index].hosts, self.matches[index].visitors);
            jobs.push((index, self.teams.remove(hosts)?, self.teams.remove(visitors)?));
        }

        let (positions, settings, seed) = (&self.positions, &self.settings, self.seed);
        let mut fixtures: Vec<&mut Match> = self
            .matches
            .iter_mut()
            .enumerate()
            .filter(|(i, _)| indices.contains(i))
            .map(|(_, game)| game)
            .collect();

        let results: Vec<Result<MatchSummary>> = fixtures
            .par_iter_mut()
            .zip(jobs.par_iter_mut())
            .map(|(game, (index, hosts, visitors))| {
                play_fixture(
                    game,
                    hosts,
                    visitors,
                    positions,
                    settings,
                    fixture_seed(seed, *index),
                    VerbosityLevel::Silent,
                    NullSink,
                )
            })
            .collect();

        self.return_teams(jobs);
        let summaries = results.into_iter().collect::<Result<Vec<_>>>()?;
        for &index in &indices {
            self.store(index)?;
        }
        self.rest(DAYS_BETWEEN_ROUNDS);
        Ok(summaries)
    }

    /// Play rounds until every fixture, playoffs included, is decided
    pub fn play_season(&mut self) -> Result<Vec<MatchSummary>> {
        let mut summaries = Vec::new();
        while let Some(round) = self.next_round() {
            summaries.extend(self.play_round(round)?);
        }
        Ok(summaries)
    }

    /// Let `days` pass: injuries heal and healthy players recover fully
    pub fn rest(&mut self, days: u16) {
        for id in self.teams.sorted_ids() {
            let Ok(team) = self.teams.get_mut(id) else {
                continue;
            };
            for player in team.squad.iter_mut() {
                player.condition.recover(days);
                if player.condition.is_healthy() {
                    player.condition.refresh();
                }
            }
        }
    }

    fn return_teams(&mut self, jobs: Vec<(usize, Team, Team)>) {
        for (_, hosts, visitors) in jobs {
            self.teams.insert(hosts.id, hosts);
            self.teams.insert(visitors.id, visitors);
        }
    }

    /// Referees for fixtures without one, never the same referee twice in a batch
    fn appoint_referees(&mut self, indices: &[usize]) {
        let mut rng = MatchRng::seed_from_u64(self.seed ^ indices.first().copied().unwrap_or(0) as u64);
        let mut busy: Vec<RefereeId> = indices.iter().filter_map(|&i| self.matches[i].referee).collect();
        for &index in indices {
            if self.matches[index].referee.is_some() {
                continue;
            }
            if let Some(referee) = draw_referee(&self.referees, &busy, &mut rng) {
                self.matches[index].referee = Some(referee);
                busy.push(referee);
            }
        }
    }

    fn store(&mut self, index: usize) -> Result<()> {
        let record = MatchRecord::from_match(&self.matches[index])?;
        self.records.push(record);
        self.matches[index].stored = true;
        Ok(())
    }
}

/// Select both squads and play one fixture to the end
#[allow(clippy::too_many_arguments)]
fn play_fixture<'a>(
    game: &'a mut Match,
    hosts: &'a mut Team,
    visitors: &'a mut Team,
    positions: &'a PositionTable,
    settings: &'a MatchSettings,
    seed: u64,
    verbosity: VerbosityLevel,
    sink: impl PresentationSink + 'a,
) -> Result<MatchSummary> {
    let mut rng = MatchRng::seed_from_u64(seed);
    for team in [&mut *hosts, &mut *visitors] {
        team.select_players_for_next_match(positions, &settings.condition_weights, &mut rng)?;
        team.select_substitutes(&settings.condition_weights);
    }

    let context = MatchContext { positions, settings };
    GameEngine::new(game, hosts, visitors, context)?
        .with_rng(rng)
        .with_sink(sink)
        .with_verbosity(verbosity)
        .play_to_completion()
}

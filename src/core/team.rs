//! Team entity: squad, selection, pack weight and season records

use crate::core::condition::{ConditionKind, ConditionWeights, PositionFit};
use crate::core::entity::{Entity, PlayerId, TeamId};
use crate::core::player::{Player, PreferredAction};
use crate::core::position::{PositionTable, PositionType};
use crate::game::score::MatchScore;
use crate::rng::MatchRng;
use crate::{Result, SimError};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Outcome of a match from one side's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultType {
    Win,
    Draw,
    Loss,
}

/// Standings points per result and bonus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsPoints {
    pub win: u16,
    pub draw: u16,
    pub try_bonus: u16,
    pub losing_bonus: u16,
}

impl Default for StandingsPoints {
    fn default() -> Self {
        StandingsPoints {
            win: 4,
            draw: 2,
            try_bonus: 1,
            losing_bonus: 1,
        }
    }
}

/// Scoring totals accumulated over a season
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamPoints {
    pub tries: u16,
    pub conversions: u16,
    pub penalties: u16,
    pub drop_goals: u16,
    pub points_for: u16,
    pub points_against: u16,
    pub tries_against: u16,
}

impl TeamPoints {
    pub fn update_from_score(
        &mut self,
        score: &MatchScore,
        points_for: u16,
        points_against: u16,
        tries_against: u16,
    ) {
        self.tries += score.tries();
        self.conversions += score.conversions();
        self.penalties += score.penalties();
        self.drop_goals += score.drop_goals();
        self.points_for += points_for;
        self.points_against += points_against;
        self.tries_against += tries_against;
    }

    pub fn difference(&self) -> i32 {
        self.points_for as i32 - self.points_against as i32
    }
}

/// Win/draw/loss counts split by bonus points earned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamResults {
    pub wins_with_bonus: u16,
    pub wins_without_bonus: u16,
    pub draws_with_bonus: u16,
    pub draws_without_bonus: u16,
    pub losses_with_both_bonuses: u16,
    pub losses_with_try_bonus: u16,
    pub losses_with_diff_bonus: u16,
    pub losses_without_bonus: u16,
}

impl TeamResults {
    pub fn update_results(&mut self, result: ResultType, try_bonus: bool, diff_bonus: bool) {
        match result {
            ResultType::Win if try_bonus => self.wins_with_bonus += 1,
            ResultType::Win => self.wins_without_bonus += 1,
            ResultType::Draw if try_bonus => self.draws_with_bonus += 1,
            ResultType::Draw => self.draws_without_bonus += 1,
            ResultType::Loss => match (try_bonus, diff_bonus) {
                (true, true) => self.losses_with_both_bonuses += 1,
                (true, false) => self.losses_with_try_bonus += 1,
                (false, true) => self.losses_with_diff_bonus += 1,
                (false, false) => self.losses_without_bonus += 1,
            },
        }
    }

    pub fn wins(&self) -> u16 {
        self.wins_with_bonus + self.wins_without_bonus
    }

    pub fn draws(&self) -> u16 {
        self.draws_with_bonus + self.draws_without_bonus
    }

    pub fn losses(&self) -> u16 {
        self.losses_with_both_bonuses
            + self.losses_with_try_bonus
            + self.losses_with_diff_bonus
            + self.losses_without_bonus
    }

    pub fn played(&self) -> u16 {
        self.wins() + self.draws() + self.losses()
    }

    pub fn bonus_points(&self, points: &StandingsPoints) -> u16 {
        (self.wins_with_bonus + self.draws_with_bonus + self.losses_with_try_bonus) * points.try_bonus
            + self.losses_with_diff_bonus * points.losing_bonus
            + self.losses_with_both_bonuses * (points.try_bonus + points.losing_bonus)
    }

    pub fn points_total(&self, points: &StandingsPoints) -> u16 {
        self.wins() * points.win + self.draws() * points.draw + self.bonus_points(points)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub abbr: String,
    pub venue: Option<String>,
    /// Lower is stronger
    pub ranking: u8,
    pub group: String,
    pub squad: Vec<Player>,
    pub points: TeamPoints,
    pub results: TeamResults,
    pub in_playoffs: bool,
}

impl Team {
    pub fn new(id: TeamId, name: impl Into<String>, ranking: u8) -> Self {
        let name = name.into();
        let abbr = name.chars().filter(|c| c.is_alphanumeric()).take(3).collect::<String>().to_uppercase();
        Team {
            id,
            name,
            abbr,
            venue: None,
            ranking,
            group: String::new(),
            squad: Vec::new(),
            points: TeamPoints::default(),
            results: TeamResults::default(),
            in_playoffs: false,
        }
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player> {
        self.squad
            .iter()
            .find(|p| p.id == id)
            .ok_or(SimError::EntityNotFound(id.as_u32()))
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.squad
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(SimError::EntityNotFound(id.as_u32()))
    }

    pub fn players_on_pitch(&self) -> impl Iterator<Item = &Player> {
        self.squad.iter().filter(|p| p.on_pitch)
    }

    pub fn number_on_pitch(&self) -> u8 {
        self.players_on_pitch().count() as u8
    }

    /// On-pitch players of a position type, excluding `exclude`
    pub fn available_players(
        &self,
        position_type: PositionType,
        exclude: Option<PlayerId>,
    ) -> SmallVec<[PlayerId; 4]> {
        self.players_on_pitch()
            .filter(|p| p.current_type == position_type && Some(p.id) != exclude)
            .map(|p| p.id)
            .collect()
    }

    /// True when the starting fifteen is complete (shirts 1..=15 all taken)
    pub fn are_all_players_selected(&self) -> bool {
        let checksum: u16 = self
            .squad
            .iter()
            .filter(|p| p.is_base_player() && p.is_available())
            .map(|p| p.shirt_no as u16)
            .sum();
        checksum == (1..=PositionTable::ON_PITCH as u16).sum::<u16>()
    }

    /// Pick the starting fifteen, one position at a time
    ///
    /// Candidates are available players whose natural position matches
    /// exactly or by type, falling back to the same base type. The best
    /// weighted condition wins; picking a player out of position may cost
    /// form and morale.
    pub fn select_players_for_next_match(
        &mut self,
        positions: &PositionTable,
        weights: &ConditionWeights,
        rng: &mut MatchRng,
    ) -> Result<()> {
        for player in self.squad.iter_mut() {
            player.shirt_no = 0;
            player.preferences.clear();
        }

        for entry in positions.entries() {
            let eligible = |p: &Player| p.is_available() && p.shirt_no == 0;
            let mut candidates: SmallVec<[usize; 8]> = self
                .squad
                .iter()
                .enumerate()
                .filter(|(_, p)| {
                    eligible(p) && (p.preferred_no == Some(entry.no) || p.position == entry.position_type)
                })
                .map(|(i, _)| i)
                .collect();

            if candidates.is_empty() {
                let base = Some(entry.base_type);
                candidates = self
                    .squad
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| eligible(p) && positions.base_type_of(p.position) == base)
                    .map(|(i, _)| i)
                    .collect();
            }

            let mut best: Option<(usize, u32, PositionFit)> = None;
            for &i in &candidates {
                let player = &self.squad[i];
                let fit = if player.preferred_no == Some(entry.no) {
                    PositionFit::Exact
                } else if player.is_position_generic() {
                    PositionFit::Generic
                } else if player.position == entry.position_type {
                    PositionFit::Different
                } else {
                    PositionFit::Unrelated
                };
                let shape = player.overall(weights) as u32 * weights.fit_weight(fit) as u32;
                if best.map_or(true, |(_, s, _)| shape >= s) {
                    best = Some((i, shape, fit));
                }
            }

            let Some((index, _, fit)) = best else {
                return Err(SimError::Selection(format!(
                    "{}: no player available for {}",
                    self.name, entry.name
                )));
            };

            let player = &mut self.squad[index];
            let new_position = player.current_no != Some(entry.no);
            if fit == PositionFit::Different && new_position {
                let drop = rng.chance(25) as u8;
                player.condition.decrease(ConditionKind::Form, drop);
            }
            if fit == PositionFit::Unrelated && new_position {
                let drop = rng.chance(50) as u8;
                player.condition.decrease(ConditionKind::Form, drop);
                let drop = rng.chance(25) as u8;
                player.condition.decrease(ConditionKind::Morale, drop);
            }

            player.shirt_no = entry.no;
            player.assign_position(entry);
            match entry.no {
                2 => player.preferences.insert(PreferredAction::Lineout),
                9 => player.preferences.insert(PreferredAction::Scrum),
                10 => {
                    player.preferences.insert(PreferredAction::Penalty);
                    player.preferences.insert(PreferredAction::Conversion);
                }
                15 => player.preferences.insert(PreferredAction::KickOff),
                _ => {}
            }
        }

        Ok(())
    }

    /// Give the best remaining players bench shirts 16..=23, ordered by position
    pub fn select_substitutes(&mut self, weights: &ConditionWeights) -> usize {
        const BENCH: usize = 8;

        let mut ranked: Vec<(usize, u32)> = self
            .squad
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_available() && p.shirt_no == 0)
            .map(|(i, p)| {
                let fit = match (p.preferred_no, p.current_no) {
                    (Some(pref), Some(cur)) if pref == cur => PositionFit::Exact,
                    (None, _) => PositionFit::Generic,
                    (Some(_), Some(_)) => PositionFit::Different,
                    (Some(_), None) => PositionFit::Exact,
                };
                (i, p.overall(weights) as u32 * weights.fit_weight(fit) as u32)
            })
            .collect();

        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(BENCH);
        ranked.sort_by_key(|&(i, _)| {
            let p = &self.squad[i];
            (p.position, p.preferred_no.unwrap_or(u8::MAX), i)
        });

        for (offset, &(i, _)) in ranked.iter().enumerate() {
            let player = &mut self.squad[i];
            player.shirt_no = PositionTable::ON_PITCH + 1 + offset as u8;
            if player.current_no.is_none() {
                player.current_type = player.position;
            }
        }
        ranked.len()
    }

    /// Put the starting fifteen on the pitch for kick-off
    pub fn take_the_field(&mut self, positions: &PositionTable) -> u8 {
        let mut introduced = 0;
        for player in self.squad.iter_mut() {
            player.withdraw();
            player.sent_off = false;
            if player.is_base_player() && player.is_available() {
                if let Some(entry) = positions.by_no(player.shirt_no) {
                    player.assign_position(entry);
                }
                player.introduce(player.shirt_no);
                introduced += 1;
            }
        }
        introduced
    }

    pub fn clean_pitch(&mut self) {
        for player in self.squad.iter_mut() {
            player.withdraw();
        }
    }

    /// Aggregate weight of the forwards on the pitch
    ///
    /// Returns `(weight, adjusted)`. When some weights are unknown the total is
    /// extrapolated from the known ones, unless fewer than three are known, in
    /// which case the weight is reported as 0 (unknown).
    pub fn pack_weight(&self, positions: &PositionTable, incomplete_coefficient: f64) -> (u16, bool) {
        let mut total: u32 = 0;
        let mut known: u32 = 0;
        let mut pack: u32 = 0;

        for player in self.players_on_pitch().filter(|p| positions.is_forward(p.current_type)) {
            pack += 1;
            if player.attributes.weight_kg > 0 {
                known += 1;
                total += player.attributes.weight_kg as u32;
            }
        }

        if known == pack {
            return (total as u16, false);
        }
        if known < (PositionTable::FORWARDS / 2 - 1) as u32 {
            return (0, false);
        }

        let adjusted = total as f64 / known as f64 * pack as f64 * incomplete_coefficient;
        (adjusted.round() as u16, true)
    }

    pub fn captain(&self) -> Option<&Player> {
        self.players_on_pitch().find(|p| p.captain)
    }
}

impl Entity for Team {
    fn id(&self) -> TeamId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::EntityId;

    fn squad_team() -> Team {
        let positions = PositionTable::standard();
        let mut team = Team::new(EntityId::new(1), "Harbour", 5);
        let mut next = 100;
        for entry in positions.entries() {
            for _ in 0..2 {
                let mut p = Player::new(EntityId::new(next), format!("Player {next}"), entry.position_type)
                    .with_preferred_no(entry.no);
                p.attributes.weight_kg = if entry.no <= 8 { 110 } else { 90 };
                team.squad.push(p);
                next += 1;
            }
        }
        team
    }

    #[test]
    fn test_selection_fills_fifteen_and_roles() {
        let positions = PositionTable::standard();
        let weights = ConditionWeights::default();
        let mut rng = MatchRng::seed_from_u64(1);
        let mut team = squad_team();

        team.select_players_for_next_match(&positions, &weights, &mut rng).unwrap();
        assert!(team.are_all_players_selected());

        let fly_half = team.squad.iter().find(|p| p.shirt_no == 10).unwrap();
        assert!(fly_half.is_preferred_for(PreferredAction::Penalty));
        assert!(fly_half.is_preferred_for(PreferredAction::Conversion));
        let hooker = team.squad.iter().find(|p| p.shirt_no == 2).unwrap();
        assert!(hooker.is_preferred_for(PreferredAction::Lineout));

        assert_eq!(team.select_substitutes(&weights), 8);
        let bench: Vec<u8> = team.squad.iter().filter(|p| p.shirt_no > 15).map(|p| p.shirt_no).collect();
        assert_eq!(bench.len(), 8);
        assert!(bench.iter().all(|&n| (16..=23).contains(&n)));
    }

    #[test]
    fn test_selection_fails_without_enough_players() {
        let positions = PositionTable::standard();
        let mut team = Team::new(EntityId::new(2), "Tiny", 9);
        team.squad.push(Player::new(EntityId::new(1), "Solo", PositionType::Wing));
        let mut rng = MatchRng::seed_from_u64(1);
        let result = team.select_players_for_next_match(&positions, &ConditionWeights::default(), &mut rng);
        assert!(matches!(result, Err(SimError::Selection(_))));
        assert!(!team.are_all_players_selected());
    }

    #[test]
    fn test_pack_weight_fallbacks() {
        let positions = PositionTable::standard();
        let weights = ConditionWeights::default();
        let mut rng = MatchRng::seed_from_u64(1);
        let mut team = squad_team();
        team.select_players_for_next_match(&positions, &weights, &mut rng).unwrap();
        assert_eq!(team.take_the_field(&positions), 15);

        assert_eq!(team.pack_weight(&positions, 1.0), (880, false));

        // Two unknown weights: extrapolated from the six known ones
        let mut unknown = 0;
        for p in team.squad.iter_mut().filter(|p| p.on_pitch && p.shirt_no <= 8) {
            if unknown < 2 {
                p.attributes.weight_kg = 0;
                unknown += 1;
            }
        }
        assert_eq!(team.pack_weight(&positions, 1.0), (880, true));

        // Only two known: the value is scrapped
        let mut cleared = 0;
        for p in team.squad.iter_mut().filter(|p| p.on_pitch && p.shirt_no <= 8) {
            if p.attributes.weight_kg > 0 && cleared < 4 {
                p.attributes.weight_kg = 0;
                cleared += 1;
            }
        }
        assert_eq!(team.pack_weight(&positions, 1.0), (0, false));
    }

    #[test]
    fn test_results_points_total() {
        let mut results = TeamResults::default();
        results.update_results(ResultType::Win, true, false);
        results.update_results(ResultType::Draw, false, false);
        results.update_results(ResultType::Loss, true, true);
        let points = StandingsPoints::default();
        assert_eq!(results.played(), 3);
        assert_eq!(results.points_total(&points), 5 + 2 + 2);
    }
}

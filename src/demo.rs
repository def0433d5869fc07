//! Generated leagues for the CLI, tests and benchmarks

use crate::core::{Attributes, EntityId, Player, PositionTable, Referee, Team, TeamId};
use crate::game::{MatchSettings, PlayoffRule};
use crate::season::League;
use crate::Result;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

const CITIES: [&str; 16] = [
    "Ashford", "Brackley", "Carrow", "Dunmore", "Elstow", "Farley", "Glenmoor", "Harwick", "Ivybridge",
    "Kelso", "Lanark", "Melrose", "Northam", "Otley", "Penrith", "Redruth",
];

const SURNAMES: [&str; 20] = [
    "Adams", "Barnes", "Carter", "Dawson", "Evans", "Fraser", "Gibson", "Hughes", "Irvine", "Jones",
    "Kerr", "Lewis", "Morgan", "Nolan", "Owens", "Price", "Quinn", "Reid", "Scott", "Turner",
];

/// Shirt numbers of the reserves every generated squad carries
const RESERVE_NUMBERS: [u8; 8] = [1, 2, 4, 7, 9, 10, 12, 15];

const GROUP: &str = "A";

/// A single-group league playing a double round robin
///
/// The same `teams` and `seed` always produce the same league: squads,
/// attributes and home/away order all come from one xoshiro stream.
pub fn generate_league(teams: usize, seed: u64) -> Result<League> {
    let positions = PositionTable::standard();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut league = League::new("Demo League", positions.clone(), MatchSettings::default(), seed);

    let mut ids = Vec::with_capacity(teams);
    for i in 0..teams {
        let id = EntityId::new(i as u32);
        let city = CITIES[i % CITIES.len()];
        let mut team = Team::new(id, format!("{city} RFC"), rng.gen_range(1..=20));
        team.venue = Some(format!("{city} Park"));
        team.group = GROUP.to_string();
        team.squad = generate_squad(id, &positions, &mut rng);
        ids.push(league.add_team(team));
    }

    for (i, name) in ["A. Whitfield", "B. Okafor", "C. Lacroix", "D. Moreno"].into_iter().enumerate() {
        league.add_referee(Referee::new(EntityId::new(i as u32), name));
    }

    for (round, pairs) in round_robin(&ids).into_iter().enumerate() {
        for (a, b) in pairs {
            let (hosts, visitors) = if rng.gen_bool(0.5) { (a, b) } else { (b, a) };
            let first = round as u16 + 1;
            let second = first + ids.len().saturating_sub(1) as u16 + (ids.len() % 2) as u16;
            league.add_fixture(first, hosts, visitors)?;
            league.add_fixture(second, visitors, hosts)?;
        }
    }
    Ok(league)
}

/// Semi-finals (1st v 4th, 2nd v 3rd) and a final after the regular season
pub fn add_playoffs(league: &mut League) -> Result<()> {
    let round = league.matches().iter().map(|m| m.round).max().unwrap_or(0) + 1;
    let semi = |hosts_ranking, visitors_ranking| PlayoffRule::FromRegularSeason {
        hosts_group: GROUP.to_string(),
        hosts_ranking,
        visitors_group: GROUP.to_string(),
        visitors_ranking,
    };
    let first = league.add_playoff_fixture(round, semi(1, 4))?;
    let second = league.add_playoff_fixture(round, semi(2, 3))?;
    league.add_playoff_fixture(
        round + 1,
        PlayoffRule::FromPriorPlayoffRound {
            hosts_from_match: first,
            hosts_winner: true,
            visitors_from_match: second,
            visitors_winner: true,
        },
    )?;
    Ok(())
}

fn generate_squad(team: TeamId, positions: &PositionTable, rng: &mut Xoshiro256PlusPlus) -> Vec<Player> {
    let numbers = positions
        .entries()
        .iter()
        .map(|e| e.no)
        .chain(RESERVE_NUMBERS);

    numbers
        .enumerate()
        .filter_map(|(i, no)| {
            let entry = positions.by_no(no)?;
            let id = EntityId::new(team.as_u32() * 100 + i as u32);
            let surname = SURNAMES[rng.gen_range(0..SURNAMES.len())];
            let initial = (b'A' + rng.gen_range(0..26u8)) as char;
            let forward = positions.is_forward(entry.position_type);

            let mut skill = || rng.gen_range(35..=90u8);
            let attributes = Attributes {
                kicking: skill(),
                handling: skill(),
                strength: skill(),
                speed: skill(),
                tackling: skill(),
                agility: skill(),
                dexterity: skill(),
                endurance: skill(),
                weight_kg: if forward {
                    rng.gen_range(98..=125)
                } else {
                    rng.gen_range(78..=100)
                },
                height_cm: rng.gen_range(172..=204),
            };

            let mut player = Player::new(id, format!("{initial}. {surname}"), entry.position_type)
                .with_attributes(attributes);
            // Starters know their exact shirt, reserves only their position type
            if i < PositionTable::ON_PITCH as usize {
                player = player.with_preferred_no(no);
            }
            Some(player)
        })
        .collect()
}

/// Circle-method pairings: every team meets every other team once
fn round_robin(ids: &[TeamId]) -> Vec<Vec<(TeamId, TeamId)>> {
    let mut slots: Vec<Option<TeamId>> = ids.iter().copied().map(Some).collect();
    if slots.len() % 2 == 1 {
        slots.push(None);
    }
    let n = slots.len();
    if n < 2 {
        return Vec::new();
    }

    let mut rounds = Vec::with_capacity(n - 1);
    for _ in 0..n - 1 {
        let pairs = (0..n / 2)
            .filter_map(|i| match (slots[i], slots[n - 1 - i]) {
                (Some(a), Some(b)) => Some((a, b)),
                _ => None,
            })
            .collect();
        rounds.push(pairs);
        slots[1..].rotate_right(1);
    }
    rounds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin_meets_everyone_once() {
        let ids: Vec<TeamId> = (0..5).map(EntityId::new).collect();
        let rounds = round_robin(&ids);
        assert_eq!(rounds.len(), 5);

        let mut pairs: Vec<(TeamId, TeamId)> = rounds
            .iter()
            .flatten()
            .map(|&(a, b)| (a.min(b), a.max(b)))
            .collect();
        pairs.sort();
        pairs.dedup();
        assert_eq!(pairs.len(), 10);
        for round in &rounds {
            let mut seen: Vec<TeamId> = round.iter().flat_map(|&(a, b)| [a, b]).collect();
            let before = seen.len();
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), before);
        }
    }

    #[test]
    fn test_generated_league_is_deterministic() {
        let a = generate_league(6, 99).unwrap();
        let b = generate_league(6, 99).unwrap();
        assert_eq!(a.matches(), b.matches());
        for id in a.teams.sorted_ids() {
            assert_eq!(a.teams.get(id).unwrap(), b.teams.get(id).unwrap());
        }
    }

    #[test]
    fn test_generated_squads_can_be_selected() {
        let league = generate_league(4, 1).unwrap();
        assert_eq!(league.matches().len(), 12);
        let weights = league.settings().condition_weights.clone();
        let mut rng = crate::rng::MatchRng::seed_from_u64(1);
        for id in league.teams.sorted_ids() {
            let mut team = league.teams.get(id).unwrap().clone();
            assert_eq!(team.squad.len(), 23);
            team.select_players_for_next_match(league.positions(), &weights, &mut rng)
                .unwrap();
            assert!(team.are_all_players_selected());
            assert_eq!(team.select_substitutes(&weights), 8);
        }
    }
}

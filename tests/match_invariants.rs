//! Invariants that hold for every simulated match
//!
//! Scores are derived from counted events, totals from their parts, the clock
//! never runs backwards and the result follows the competition's rules.

use rugby_sim::core::{PositionTable, ResultType, StatKind, Team};
use rugby_sim::demo::generate_league;
use rugby_sim::game::{
    GameEngine, Match, MatchContext, MatchPeriod, MatchSettings, MatchType, Side, StepOutcome,
};
use rugby_sim::rng::MatchRng;

const SEEDS: std::ops::Range<u64> = 0..12;

/// The first fixture of a generated league, squads selected, as the given type
fn fixture(match_type: MatchType, seed: u64) -> (Match, Team, Team, PositionTable, MatchSettings) {
    let league = generate_league(2, 3).unwrap();
    let template = &league.matches()[0];
    let game = Match::new(
        template.id,
        template.round,
        template.hosts,
        template.visitors,
        match_type,
        league.settings().rules,
    );
    let settings = league.settings().clone();
    let mut rng = MatchRng::seed_from_u64(seed);
    let mut teams = [game.hosts, game.visitors].map(|id| league.teams.get(id).unwrap().clone());
    for team in teams.iter_mut() {
        team.select_players_for_next_match(league.positions(), &settings.condition_weights, &mut rng)
            .unwrap();
        team.select_substitutes(&settings.condition_weights);
    }
    let [hosts, visitors] = teams;
    (game, hosts, visitors, league.positions().clone(), settings)
}

#[test]
fn test_points_follow_counted_events() {
    for seed in SEEDS {
        let (mut game, mut hosts, mut visitors, positions, settings) = fixture(MatchType::Regular, seed);
        let context = MatchContext {
            positions: &positions,
            settings: &settings,
        };
        GameEngine::new(&mut game, &mut hosts, &mut visitors, context)
            .unwrap()
            .with_seed(seed)
            .play_to_completion()
            .unwrap();

        let values = settings.rules.point_values;
        for side in Side::ALL {
            let score = game.score(side);
            let expected = score.tries() * values.try_
                + score.conversions() * values.conversion
                + score.penalties() * values.penalty
                + score.drop_goals() * values.drop_goal;
            assert_eq!(score.points(), expected, "seed {seed}, {side:?}");
            assert_eq!(score.tackles(), score.tackles_completed() + score.tackles_missed());
            assert_eq!(score.passes(), score.passes_completed() + score.passes_missed());
            assert_eq!(score.scrums(), score.scrums_won() + score.scrums_lost());
            assert_eq!(score.lineouts(), score.lineouts_won() + score.lineouts_lost());
            assert!(score.conversions() <= score.tries(), "seed {seed}: more conversions than tries");

            let scorers: u16 = game
                .all_player_points(side)
                .values()
                .map(|p| p.points(&values))
                .sum();
            assert_eq!(scorers, score.points(), "seed {seed}: player ledger drifted");
        }
    }
}

#[test]
fn test_clock_never_runs_backwards() {
    let (mut game, mut hosts, mut visitors, positions, settings) = fixture(MatchType::Playoffs, 8);
    let context = MatchContext {
        positions: &positions,
        settings: &settings,
    };
    let mut engine = GameEngine::new(&mut game, &mut hosts, &mut visitors, context)
        .unwrap()
        .with_seed(8);

    let mut last_raw = 0;
    let mut last_period = MatchPeriod::WarmUp;
    loop {
        let outcome = engine.step().unwrap();
        let clock = &engine.game().clock;
        assert!(clock.raw_seconds() >= last_raw);
        assert!(clock.current_period() >= last_period);
        last_raw = clock.raw_seconds();
        last_period = clock.current_period();
        if outcome == StepOutcome::MatchFinished {
            break;
        }
    }
    assert_eq!(last_period, MatchPeriod::FullTime);
    assert!(last_raw >= 80 * 60);
}

#[test]
fn test_regular_match_ends_after_second_half() {
    for seed in SEEDS {
        let (mut game, mut hosts, mut visitors, positions, settings) = fixture(MatchType::Regular, seed);
        let context = MatchContext {
            positions: &positions,
            settings: &settings,
        };
        let summary = GameEngine::new(&mut game, &mut hosts, &mut visitors, context)
            .unwrap()
            .with_seed(seed)
            .play_to_completion()
            .unwrap();

        assert_eq!(summary.last_period_played, MatchPeriod::SecondHalf, "seed {seed}");
        assert_eq!(summary.shoot_out, None);
        if summary.hosts_points == summary.visitors_points {
            assert_eq!(summary.hosts_result, ResultType::Draw);
            assert_eq!(summary.winner, None);
        }
        assert_eq!(hosts.results.played(), 1);
        assert_eq!(visitors.results.played(), 1);
    }
}

#[test]
fn test_playoff_match_always_has_a_winner() {
    for seed in SEEDS {
        let (mut game, mut hosts, mut visitors, positions, settings) = fixture(MatchType::Playoffs, seed);
        let context = MatchContext {
            positions: &positions,
            settings: &settings,
        };
        let summary = GameEngine::new(&mut game, &mut hosts, &mut visitors, context)
            .unwrap()
            .with_seed(seed)
            .play_to_completion()
            .unwrap();

        assert!(summary.winner.is_some(), "seed {seed}: playoff match without winner");
        assert_ne!(summary.hosts_result, ResultType::Draw);
        if summary.shoot_out.is_some() {
            assert_eq!(summary.hosts_points, summary.visitors_points);
            assert_eq!(summary.last_period_played, MatchPeriod::KickingCompetition);
        }
        if summary.last_period_played > MatchPeriod::SecondHalf {
            assert!(game.clock.seconds_in_period(MatchPeriod::FirstExtraTime) > 0);
        }
        // Playoff results stay out of the regular-season records
        assert_eq!(hosts.results.played(), 0);
    }
}

#[test]
fn test_cards_and_replacements_are_consistent() {
    for seed in SEEDS {
        let (mut game, mut hosts, mut visitors, positions, settings) = fixture(MatchType::Regular, seed);
        let context = MatchContext {
            positions: &positions,
            settings: &settings,
        };
        GameEngine::new(&mut game, &mut hosts, &mut visitors, context)
            .unwrap()
            .with_seed(seed)
            .play_to_completion()
            .unwrap();

        for side in Side::ALL {
            let score = game.score(side);
            let carded = game.suspensions().iter().filter(|s| s.side == side).count() as u16;
            assert_eq!(carded, score.yellow_cards() + score.red_cards(), "seed {seed}");

            let replaced: Vec<_> = game
                .substitutions()
                .iter()
                .filter(|s| s.side == side)
                .map(|s| s.player_in)
                .collect();
            for id in &replaced {
                let stats = game.player_stats(side, *id).unwrap();
                assert_eq!(stats.get(StatKind::GamesPlayedSub), 1);
            }
            // Nobody comes on twice
            let mut unique = replaced.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), replaced.len());
        }

        let team_players = [&hosts, &visitors];
        for team in team_players {
            assert!(team.squad.iter().all(|p| !p.on_pitch && p.no_on_pitch == 0));
        }
    }
}

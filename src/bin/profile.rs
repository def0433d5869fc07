//! Profiling binary for match execution
//!
//! This binary plays matches in a tight loop for profiling with
//! cargo-flamegraph. Unlike the Criterion benchmarks, this has minimal
//! overhead and produces cleaner flamegraphs.
//!
//! Usage:
//!   cargo flamegraph --bin profile
//!   PROFILE_ITERATIONS=5000 cargo flamegraph --bin profile

use rugby_sim::demo::generate_league;
use rugby_sim::game::{GameEngine, MatchContext, VerbosityLevel};
use rugby_sim::rng::MatchRng;

fn main() -> rugby_sim::Result<()> {
    // Allow overriding iterations via environment variable
    let iterations: u64 = std::env::var("PROFILE_ITERATIONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000);

    let league = generate_league(2, 42)?;
    let template = league.matches()[0].clone();
    let ids = [template.hosts, template.visitors];
    let weights = &league.settings().condition_weights;

    println!("Profiling match execution...");
    println!("Running {iterations} matches from seed 42");
    println!();

    for i in 0..iterations {
        let mut game = template.clone();
        let mut rng = MatchRng::seed_from_u64(42 + i);
        let mut hosts = league.teams.get(ids[0])?.clone();
        let mut visitors = league.teams.get(ids[1])?.clone();
        for team in [&mut hosts, &mut visitors] {
            team.select_players_for_next_match(league.positions(), weights, &mut rng)?;
            team.select_substitutes(weights);
        }

        let context = MatchContext {
            positions: league.positions(),
            settings: league.settings(),
        };
        GameEngine::new(&mut game, &mut hosts, &mut visitors, context)?
            .with_rng(rng)
            .with_verbosity(VerbosityLevel::Silent)
            .play_to_completion()?;

        if (i + 1) % 100 == 0 {
            println!("Completed {} matches", i + 1);
        }
    }

    println!();
    println!("Profiling complete! {iterations} matches executed.");
    Ok(())
}

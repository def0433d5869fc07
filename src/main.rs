//! rugby-sim - command line driver
//!
//! Plays a single narrated match or a whole generated season.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use rugby_sim::{
    demo::{add_playoffs, generate_league},
    game::{MatchLogger, MatchSettings, Notice, OutputFormat, PresentationSink, ScoreboardField, Side, VerbosityLevel},
    persist::MatchRecord,
    season::League,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Verbosity level for match output (custom parser supporting both names and numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(VerbosityLevel);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg(VerbosityLevel::Silent)),
            "minimal" | "1" => Ok(VerbosityArg(VerbosityLevel::Minimal)),
            "normal" | "2" => Ok(VerbosityArg(VerbosityLevel::Normal)),
            "verbose" | "3" => Ok(VerbosityArg(VerbosityLevel::Verbose)),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

impl From<VerbosityArg> for VerbosityLevel {
    fn from(arg: VerbosityArg) -> Self {
        arg.0
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "rugby-sim")]
#[command(about = "Rugby union match and season simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one fixture of a generated league with live narration
    Play {
        /// Number of teams in the generated league
        #[arg(long, default_value_t = 4)]
        teams: usize,

        /// Fixture to play (default: the first one)
        #[arg(long)]
        match_id: Option<u32>,

        /// Set random seed for deterministic runs
        #[arg(long)]
        seed: Option<u64>,

        /// Verbosity level for match output (0=silent, 1=minimal, 2=normal, 3=verbose)
        #[arg(long, default_value = "normal", short = 'v')]
        verbosity: VerbosityArg,

        /// Match settings file (JSON)
        #[arg(long, value_name = "SETTINGS_FILE")]
        settings: Option<PathBuf>,

        /// Pause after every narrated line, in milliseconds
        #[arg(long, default_value_t = 0)]
        pace_ms: u64,

        /// Narration format
        #[arg(long, value_enum, default_value = "text")]
        format: FormatArg,

        /// Print scoreboard updates as they happen
        #[arg(long)]
        scoreboard: bool,

        /// Print the stored match record as JSON afterwards
        #[arg(long)]
        record: bool,
    },

    /// Play a full generated season
    Season {
        /// Number of teams in the generated league
        #[arg(long, default_value_t = 8)]
        teams: usize,

        /// Set random seed for deterministic runs
        #[arg(long)]
        seed: Option<u64>,

        /// Verbosity level (0=silent prints the final table only)
        #[arg(long, default_value = "minimal", short = 'v')]
        verbosity: VerbosityArg,

        /// Match settings file (JSON)
        #[arg(long, value_name = "SETTINGS_FILE")]
        settings: Option<PathBuf>,

        /// Add semi-finals and a final after the regular season
        #[arg(long)]
        playoffs: bool,

        /// Worker threads for parallel fixtures (default: one per core)
        #[arg(long)]
        threads: Option<usize>,
    },

    /// Write the default match settings as JSON
    Settings {
        /// Output file (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

/// Sink adapter that pauses after each narrated line
struct PacedSink<'a> {
    inner: &'a mut MatchLogger,
    pace: Duration,
}

impl PacedSink<'_> {
    fn pause(&self) {
        if !self.pace.is_zero() {
            std::thread::sleep(self.pace);
        }
    }
}

impl PresentationSink for PacedSink<'_> {
    fn log_record(&mut self, text: &str) {
        self.inner.log_record(text);
        self.pause();
    }

    fn notify(&mut self, notice: Notice, args: &[&str]) {
        self.inner.notify(notice, args);
        self.pause();
    }

    fn update_scoreboard(&mut self, side: Side, field: ScoreboardField, value: &str) {
        self.inner.update_scoreboard(side, field, value);
    }

    fn strategy_choice(&mut self, strategy: &str, text: &str) {
        self.inner.strategy_choice(strategy, text);
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            teams,
            match_id,
            seed,
            verbosity,
            settings,
            pace_ms,
            format,
            scoreboard,
            record,
        } => run_play(PlayArgs {
            teams,
            match_id,
            seed,
            verbosity: verbosity.into(),
            settings,
            pace: Duration::from_millis(pace_ms),
            format,
            scoreboard,
            record,
        }),
        Commands::Season {
            teams,
            seed,
            verbosity,
            settings,
            playoffs,
            threads,
        } => run_season(teams, seed, verbosity.into(), settings, playoffs, threads),
        Commands::Settings { output } => run_settings(output),
    }
}

struct PlayArgs {
    teams: usize,
    match_id: Option<u32>,
    seed: Option<u64>,
    verbosity: VerbosityLevel,
    settings: Option<PathBuf>,
    pace: Duration,
    format: FormatArg,
    scoreboard: bool,
    record: bool,
}

fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| rugby_sim::rng::MatchRng::from_entropy().next_u64())
}

fn load_settings(path: Option<&PathBuf>) -> anyhow::Result<MatchSettings> {
    match path {
        Some(path) => MatchSettings::load_from_file(path)
            .with_context(|| format!("loading settings from {}", path.display())),
        None => Ok(MatchSettings::default()),
    }
}

fn build_league(teams: usize, seed: u64, settings: Option<&PathBuf>) -> anyhow::Result<League> {
    if teams < 2 {
        bail!("a league needs at least two teams, got {teams}");
    }
    let settings = load_settings(settings)?;
    Ok(generate_league(teams, seed)?.with_settings(settings)?)
}

fn run_play(args: PlayArgs) -> anyhow::Result<()> {
    let seed = resolve_seed(args.seed);
    let mut league = build_league(args.teams, seed, args.settings.as_ref())?.with_verbosity(args.verbosity);

    let id = match args.match_id {
        Some(id) => rugby_sim::core::EntityId::new(id),
        None => league.matches().first().map(|m| m.id).context("league has no fixtures")?,
    };
    let game = league.get_match(id)?;
    let hosts = league.teams.get(game.hosts)?.name.clone();
    let visitors = league.teams.get(game.visitors)?.name.clone();

    let mut logger = MatchLogger::with_verbosity(args.verbosity);
    logger.set_show_scoreboard(args.scoreboard);
    logger.set_output_format(match args.format {
        FormatArg::Text => OutputFormat::Text,
        FormatArg::Json => OutputFormat::Json,
    });
    if args.verbosity > VerbosityLevel::Silent {
        println!("=== {hosts} v {visitors} (seed {seed}) ===\n");
    }

    let summary = league.play_match(
        id,
        PacedSink {
            inner: &mut logger,
            pace: args.pace,
        },
    )?;

    println!(
        "\nFull time: {hosts} {} : {} {visitors}",
        summary.hosts_points, summary.visitors_points
    );
    if let Some(shoot_out) = &summary.shoot_out {
        println!("Kicking competition: {shoot_out}");
    }
    println!("Last period played: {:?}", summary.last_period_played);

    if args.record {
        let record = league
            .records()
            .iter()
            .find(|r| r.match_id == id)
            .context("match record missing")?;
        println!("{}", MatchRecord::to_json(record)?);
    }
    Ok(())
}

fn run_season(
    teams: usize,
    seed: Option<u64>,
    verbosity: VerbosityLevel,
    settings: Option<PathBuf>,
    playoffs: bool,
    threads: Option<usize>,
) -> anyhow::Result<()> {
    if let Some(threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("configuring worker threads")?;
    }

    let seed = resolve_seed(seed);
    let mut league = build_league(teams, seed, settings.as_ref())?;
    if playoffs {
        if teams < 4 {
            bail!("playoffs need at least four teams, got {teams}");
        }
        add_playoffs(&mut league)?;
    }

    println!("=== {} - {teams} teams, seed {seed} ===", league.name);
    let start = Instant::now();
    let mut played = 0usize;
    while let Some(round) = league.next_round() {
        let summaries = league.play_round(round)?;
        played += summaries.len();
        if verbosity >= VerbosityLevel::Minimal {
            println!("\nRound {round}");
            for summary in &summaries {
                let hosts = &league.teams.get(summary.hosts)?.name;
                let visitors = &league.teams.get(summary.visitors)?.name;
                let extra = summary
                    .shoot_out
                    .as_ref()
                    .map(|s| format!(" (kicks {s})"))
                    .unwrap_or_default();
                println!(
                    "  {hosts} {} : {} {visitors}{extra}",
                    summary.hosts_points, summary.visitors_points
                );
            }
        }
    }
    let elapsed = start.elapsed();

    let standings = league.settings().rules.standings;
    println!("\n{:<4}{:<18}{:>3}{:>3}{:>3}{:>3}{:>6}{:>5}", "", "Team", "P", "W", "D", "L", "Diff", "Pts");
    for (place, team) in league.standings(None).iter().enumerate() {
        println!(
            "{:<4}{:<18}{:>3}{:>3}{:>3}{:>3}{:>6}{:>5}",
            place + 1,
            team.name,
            team.results.played(),
            team.results.wins(),
            team.results.draws(),
            team.results.losses(),
            team.points.difference(),
            team.results.points_total(&standings)
        );
    }

    if let Some(last) = league.matches().iter().rev().find(|m| m.playoff_rule.is_some()) {
        if let Some(champion) = last.winner_team() {
            println!("\nChampions: {}", league.teams.get(champion)?.name);
        }
    }

    println!(
        "\n{played} matches in {:.2}s ({:.1} matches/sec)",
        elapsed.as_secs_f64(),
        played as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );
    Ok(())
}

fn run_settings(output: Option<PathBuf>) -> anyhow::Result<()> {
    let settings = MatchSettings::default();
    match output {
        Some(path) => {
            settings
                .save_to_file(&path)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Settings written to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&settings)?),
    }
    Ok(())
}

//! Match engine: drives one match from warm-up to full time
//!
//! The engine is stepped by its caller. Each [`GameEngine::step`] either
//! handles a period boundary (coin toss, interval, kicking competition, full
//! time) or resolves one action of open play followed by the per-minute
//! effects the elapsed time triggered.

// Narration macro, compiled away without the verbose-logging feature
macro_rules! log_if_verbose {
    ($self:expr, $($arg:tt)*) => {
        #[cfg(feature = "verbose-logging")]
        {
            if $self.verbosity >= $crate::game::VerbosityLevel::Normal {
                $self.log_normal(&format!($($arg)*));
            }
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            let _ = &$self;
        }
    };
}

mod discipline;
mod open_play;
mod set_piece;
mod substitution;

pub use discipline::DangerousTackleKind;

use crate::core::{
    draw_referee, grade, ConditionKind, EntityStore, Player, PlayerId, PointEvent, PositionTable, PositionType,
    PreferredAction, Referee, RefereeId, ResultType, StatKind, Team, TeamId,
};
use crate::game::activity::{ActionKind, Outcome, ProbabilityKind};
use crate::game::controller::{AutomaticStrategy, DecisionStrategy, MatchView, SideOrBall};
use crate::game::match_state::{Match, MatchType, Side};
use crate::game::period::MatchPeriod;
use crate::game::settings::MatchSettings;
use crate::game::sink::{Notice, NullSink, PresentationSink, ScoreboardField};
use crate::rng::MatchRng;
use crate::{Result, SimError};
use smallvec::SmallVec;

/// Verbosity level for match narration
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum VerbosityLevel {
    /// No narration at all
    Silent = 0,
    /// Scores, cards and the result
    Minimal = 1,
    /// Every action of play (default)
    #[default]
    Normal = 2,
    /// Also scoreboard and clock bookkeeping
    Verbose = 3,
}

/// Action durations in seconds
pub(crate) mod times {
    pub const PASS: u32 = 3;
    pub const TACKLE: u32 = 6;
    pub const TACKLED: u32 = 4;
    pub const RUCK_PHASE: u32 = 8;
    pub const SCRUM: u32 = 60;
    pub const SCRUM_RESET: u32 = 30;
    pub const FREE_KICK: u32 = 30;
    pub const LINEOUT: u32 = 45;
    pub const PENALTY: u32 = 60;
    pub const PENALTY_KICK: u32 = 30;
    pub const TAP_PENALTY: u32 = 15;
    pub const CONVERSION: u32 = 60;
    pub const TRY: u32 = 30;
    pub const DROP_GOAL: u32 = 30;
    pub const ILLEGAL_TRY: u32 = 90;
    pub const SUSPENSION: u32 = 60;
    pub const REPLACEMENT: u32 = 30;
    pub const KICK_BLOCKED: u32 = 4;
}

/// Pitch geometry in metres
pub(crate) mod ground {
    pub const FIVE_METRE_LINE: i16 = 5;
    pub const TWENTY_TWO: i16 = 22;
    pub const HALFWAY: i16 = 50;
    /// Beyond this distance to goal the kicker stands inside their own 22
    pub const OWN_TWENTY_TWO: i16 = 78;
    pub const TOUCH_TO_MIDDLE: u8 = 35;
    pub const POSTS_HALF_WIDTH: f64 = 2.8;
    pub const TEN_METRE_LINE: f64 = 40.0;
}

/// Tries to find a receiver by position type before falling back to any player
const RECEIVER_ATTEMPTS: usize = 32;

/// Safety net for [`GameEngine::play_to_completion`]
const MAX_STEPS: u32 = 200_000;

/// Immutable inputs shared by every match of a competition
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub positions: &'a PositionTable,
    pub settings: &'a MatchSettings,
}

/// What a single [`GameEngine::step`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    /// The given period is over; the match goes on
    PeriodEnded(MatchPeriod),
    MatchFinished,
}

/// Final outcome of a match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSummary {
    pub hosts: TeamId,
    pub visitors: TeamId,
    pub hosts_points: u16,
    pub visitors_points: u16,
    pub winner: Option<TeamId>,
    pub hosts_result: ResultType,
    pub last_period_played: MatchPeriod,
    pub shoot_out: Option<String>,
    pub raw_seconds: u32,
}

/// Next action of open play, when the previous one dictates it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Running,
    Tackling,
    Ruck,
    Passing,
    Kicking,
}

pub struct GameEngine<'a> {
    game: &'a mut Match,
    teams: [&'a mut Team; 2],
    positions: &'a PositionTable,
    settings: &'a MatchSettings,
    rng: MatchRng,
    sink: Box<dyn PresentationSink + 'a>,
    strategies: [Box<dyn DecisionStrategy + 'a>; 2],
    referees: Option<(&'a EntityStore<Referee>, Vec<RefereeId>)>,
    verbosity: VerbosityLevel,

    /// Signed, positive towards the visitors' goal line
    distance_from_halfway: i16,
    team_in_possession: Side,
    player_in_possession: Option<PlayerId>,
    phases: u16,
    next_action: Option<Action>,
    /// Play restarts with a kick-off from halfway
    restart: bool,
    /// The pending pass is an offload out of a tackle
    offload: bool,
    /// The next metres gained count as a new carry
    increment_carries: bool,
    hosts_first_kick_off: bool,
}

impl<'a> GameEngine<'a> {
    /// Bind an engine to a match and its two selected teams
    pub fn new(
        game: &'a mut Match,
        hosts: &'a mut Team,
        visitors: &'a mut Team,
        context: MatchContext<'a>,
    ) -> Result<Self> {
        context.settings.validate()?;
        if game.played {
            return Err(SimError::InvalidState(format!("match {} was already played", game.id)));
        }
        if hosts.id != game.hosts || visitors.id != game.visitors {
            return Err(SimError::InvalidState(format!(
                "teams {} and {} do not play match {}",
                hosts.id, visitors.id, game.id
            )));
        }
        for team in [&*hosts, &*visitors] {
            if !team.are_all_players_selected() {
                return Err(SimError::Selection(format!("{} has no complete starting fifteen", team.name)));
            }
        }

        Ok(GameEngine {
            game,
            teams: [hosts, visitors],
            positions: context.positions,
            settings: context.settings,
            rng: MatchRng::from_entropy(),
            sink: Box::new(NullSink),
            strategies: [Box::new(AutomaticStrategy), Box::new(AutomaticStrategy)],
            referees: None,
            verbosity: context.settings.verbosity,
            distance_from_halfway: 0,
            team_in_possession: Side::Hosts,
            player_in_possession: None,
            phases: 0,
            next_action: None,
            restart: true,
            offload: false,
            increment_carries: true,
            hosts_first_kick_off: true,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = MatchRng::seed_from_u64(seed);
        self
    }

    pub fn with_rng(mut self, rng: MatchRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_sink(mut self, sink: impl PresentationSink + 'a) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn with_strategy(mut self, side: Side, strategy: impl DecisionStrategy + 'a) -> Self {
        self.strategies[side.index()] = Box::new(strategy);
        self
    }

    /// Referee pool used when the match has no referee yet
    pub fn with_referees(mut self, pool: &'a EntityStore<Referee>, exclude: Vec<RefereeId>) -> Self {
        self.referees = Some((pool, exclude));
        self
    }

    pub fn with_verbosity(mut self, verbosity: VerbosityLevel) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn game(&self) -> &Match {
        &*self.game
    }

    pub fn team_in_possession(&self) -> Side {
        self.team_in_possession
    }

    pub fn player_in_possession(&self) -> Option<PlayerId> {
        self.player_in_possession
    }

    pub fn phases(&self) -> u16 {
        self.phases
    }

    pub fn distance_from_halfway(&self) -> i16 {
        self.distance_from_halfway
    }

    /// Advance the match by one action or one period boundary
    pub fn step(&mut self) -> Result<StepOutcome> {
        let current = self.game.clock.current_period();
        match current {
            MatchPeriod::FullTime => {
                if !self.game.played {
                    self.finish_match()?;
                }
                return Ok(StepOutcome::MatchFinished);
            }
            MatchPeriod::WarmUp => {
                self.start_of_match()?;
                self.draw()?;
                return Ok(StepOutcome::Continue);
            }
            MatchPeriod::BeforeKickingInterval => {
                self.kicking_competition()?;
                self.finish_match()?;
                return Ok(StepOutcome::MatchFinished);
            }
            period if period.is_interval() => {
                self.start_next_period(period)?;
                return Ok(StepOutcome::Continue);
            }
            _ => {}
        }

        if self.game.clock.time_played_seconds() >= current.cumulative_seconds() {
            // Time ran out while play could not stop: stop it now
            self.refresh_time(0, true)?;
        } else {
            self.play_action()?;
            self.minute_effects()?;
        }

        match self.game.clock.current_period() {
            MatchPeriod::FullTime => {
                self.finish_match()?;
                Ok(StepOutcome::MatchFinished)
            }
            now if now != current => {
                self.notify(Notice::PeriodEnd, &[current.description()]);
                Ok(StepOutcome::PeriodEnded(current))
            }
            _ => Ok(StepOutcome::Continue),
        }
    }

    /// Step until the current period ends or the match finishes
    pub fn play_period(&mut self) -> Result<StepOutcome> {
        loop {
            match self.step()? {
                StepOutcome::Continue => continue,
                outcome => return Ok(outcome),
            }
        }
    }

    pub fn play_to_completion(&mut self) -> Result<MatchSummary> {
        for _ in 0..MAX_STEPS {
            if self.step()? == StepOutcome::MatchFinished {
                return Ok(self.summary());
            }
        }
        Err(SimError::InvalidState(format!(
            "match {} did not finish within {} steps",
            self.game.id, MAX_STEPS
        )))
    }

    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            hosts: self.game.hosts,
            visitors: self.game.visitors,
            hosts_points: self.game.points_scored(Side::Hosts),
            visitors_points: self.game.points_scored(Side::Visitors),
            winner: self.game.winner_team(),
            hosts_result: self.game.result_type_for(Side::Hosts),
            last_period_played: self.game.clock.last_period_played(),
            shoot_out: self.game.shoot_out_result(),
            raw_seconds: self.game.clock.raw_seconds(),
        }
    }

    // ----- narration and presentation -----

    #[allow(dead_code)]
    fn log_normal(&mut self, message: &str) {
        self.sink.log_record(message);
    }

    fn notify(&mut self, notice: Notice, args: &[&str]) {
        self.sink.notify(notice, args);
    }

    fn name_of(&self, side: Side, player: PlayerId) -> String {
        self.team(side)
            .player(player)
            .map(Player::short_name)
            .unwrap_or_else(|_| format!("#{player}"))
    }

    // ----- team and player access -----

    fn team(&self, side: Side) -> &Team {
        &*self.teams[side.index()]
    }

    fn team_mut(&mut self, side: Side) -> &mut Team {
        &mut *self.teams[side.index()]
    }

    fn player(&self, side: Side, player: PlayerId) -> Result<&Player> {
        self.team(side).player(player)
    }

    fn player_mut(&mut self, side: Side, player: PlayerId) -> Result<&mut Player> {
        self.team_mut(side).player_mut(player)
    }

    fn on_pitch_ids(&self, side: Side) -> SmallVec<[PlayerId; 16]> {
        self.team(side).players_on_pitch().map(|p| p.id).collect()
    }

    /// Players on the pitch of `side` relative to the opponents
    fn players_on_pitch_ratio(&self, side: Side) -> f64 {
        let own = self.team(side).number_on_pitch() as f64;
        let other = self.team(side.opponent()).number_on_pitch() as f64;
        if other == 0.0 {
            1.0
        } else {
            own / other
        }
    }

    /// Add to a statistic in the match ledger and the player's career together
    fn add_stat(&mut self, side: Side, player: PlayerId, kind: StatKind, amount: u32) -> Result<()> {
        self.player_mut(side, player)?.stats.add(kind, amount);
        self.game.player_stats_mut(side, player).add(kind, amount);
        Ok(())
    }

    fn stat(&mut self, side: Side, player: PlayerId, kind: StatKind) -> Result<()> {
        self.add_stat(side, player, kind, 1)
    }

    /// Credit points to a player, their team's score and the scoreboard
    fn score_points(&mut self, side: Side, player: PlayerId, event: PointEvent) -> Result<()> {
        self.player_mut(side, player)?.points.record(event);
        self.game.player_points_mut(side, player).record(event);
        let count = self.game.score_mut(side).record(event);

        let field = match event {
            PointEvent::Try => ScoreboardField::Tries,
            PointEvent::Conversion => ScoreboardField::Conversions,
            PointEvent::Penalty => ScoreboardField::Penalties,
            PointEvent::DropGoal => ScoreboardField::DropGoals,
        };
        let points = self.game.points_scored(side);
        self.sink.update_scoreboard(side, field, &count.to_string());
        self.sink.update_scoreboard(side, ScoreboardField::Points, &points.to_string());
        log_if_verbose!(
            self,
            "{} {:?} by {} ({} {} : {} {})",
            self.game.clock,
            event,
            self.name_of(side, player),
            self.team(Side::Hosts).abbr,
            self.game.points_scored(Side::Hosts),
            self.game.points_scored(Side::Visitors),
            self.team(Side::Visitors).abbr
        );
        Ok(())
    }

    fn change_in_morale(&mut self, side: Side, player: PlayerId, increase: bool) -> Result<()> {
        let morale = self.settings.morale;
        if !self.rng.chance(morale.change_probability) {
            return Ok(());
        }
        let condition = &mut self.player_mut(side, player)?.condition;
        if increase {
            condition.increase(ConditionKind::Morale, morale.step);
        } else {
            condition.decrease(ConditionKind::Morale, morale.step);
        }
        Ok(())
    }

    fn change_in_team_morale(&mut self, side: Side, increase: bool) -> Result<()> {
        for id in self.on_pitch_ids(side) {
            self.change_in_morale(side, id, increase)?;
        }
        Ok(())
    }

    // ----- ball and possession -----

    /// Metres from the ball to the goal line the team in possession attacks
    pub fn distance_to_goal(&self) -> i16 {
        match self.team_in_possession {
            Side::Hosts => ground::HALFWAY - self.distance_from_halfway,
            Side::Visitors => ground::HALFWAY + self.distance_from_halfway,
        }
    }

    /// Move the ball towards the goal line of the team in possession
    fn change_ball_position(&mut self, metres: i16) {
        let delta = match self.team_in_possession {
            Side::Hosts => metres,
            Side::Visitors => -metres,
        };
        self.distance_from_halfway =
            (self.distance_from_halfway + delta).clamp(-ground::HALFWAY, ground::HALFWAY);
    }

    /// Bring the ball at least `from_goal_line` metres away from either goal
    /// line; returns the new distance to goal
    fn move_ball_to(&mut self, from_goal_line: i16) -> i16 {
        let d = self.distance_from_halfway;
        if from_goal_line <= ground::HALFWAY && ground::HALFWAY - d.abs() < from_goal_line {
            self.distance_from_halfway = d.signum() * (ground::HALFWAY - from_goal_line);
        }
        self.distance_to_goal()
    }

    fn ball_to_halfway(&mut self) {
        self.distance_from_halfway = 0;
    }

    fn change_possession(&mut self) {
        self.team_in_possession = self.team_in_possession.opponent();
        self.phases = 0;
        self.offload = false;
    }

    /// Current ball carrier, drawing one if the ball is loose
    fn carrier(&mut self) -> Result<PlayerId> {
        let side = self.team_in_possession;
        if let Some(id) = self.player_in_possession {
            if self.team(side).player(id).map_or(false, |p| p.on_pitch) {
                return Ok(id);
            }
        }
        let ids = self.on_pitch_ids(side);
        let id = *self
            .rng
            .pick(&ids)
            .ok_or_else(|| SimError::InvalidState(format!("{side:?} have nobody on the pitch")))?;
        self.player_in_possession = Some(id);
        Ok(id)
    }

    /// Draw a player of `side` to receive or contest the ball
    ///
    /// Position types close to the carrier's are more likely. Returns `None`
    /// when `side` has nobody but the carrier on the pitch.
    fn search_for_player(&mut self, side: Side) -> Option<PlayerId> {
        let carrier = self.player_in_possession;
        let reference = carrier
            .and_then(|id| self.team(self.team_in_possession).player(id).ok())
            .map(|p| p.current_type)
            .unwrap_or(PositionType::FlyHalf);

        let others: SmallVec<[PlayerId; 16]> = self
            .team(side)
            .players_on_pitch()
            .filter(|p| Some(p.id) != carrier)
            .map(|p| p.id)
            .collect();
        if others.is_empty() {
            return None;
        }

        let centre = reference.index() as i32;
        let weights: SmallVec<[u16; 10]> = PositionType::ALL
            .iter()
            .map(|t| (7 - (t.index() as i32 - centre).abs()).max(1) as u16)
            .collect();
        let total: u16 = weights.iter().sum();

        for _ in 0..RECEIVER_ATTEMPTS {
            let mut roll = self.rng.int(1, total);
            let mut chosen = PositionType::Fullback;
            for (t, &w) in PositionType::ALL.iter().zip(weights.iter()) {
                if roll <= w {
                    chosen = *t;
                    break;
                }
                roll -= w;
            }
            let candidates = self.team(side).available_players(chosen, carrier);
            if let Some(&id) = self.rng.pick(&candidates) {
                return Some(id);
            }
        }
        self.rng.pick(&others).copied()
    }

    fn change_carrier(&mut self) {
        if let Some(id) = self.search_for_player(self.team_in_possession) {
            self.player_in_possession = Some(id);
            self.increment_carries = true;
        }
    }

    fn search_for_opponents_player(&mut self) -> Option<PlayerId> {
        self.search_for_player(self.team_in_possession.opponent())
    }

    /// Hand the ball to the best player nominated for `action`
    fn specialist(&mut self, action: PreferredAction) -> Result<PlayerId> {
        let side = self.team_in_possession;
        let team: &Team = &*self.teams[side.index()];
        let weights = &self.settings.condition_weights;

        let healthy: SmallVec<[&Player; 16]> = team
            .players_on_pitch()
            .filter(|p| p.is_healthy())
            .collect();
        let fallback = self.rng.pick(&healthy).map(|p| p.id);
        let preferred = healthy
            .iter()
            .filter(|p| p.is_preferred_for(action))
            .max_by_key(|p| {
                let skill = if action.is_kicking_role() {
                    p.attributes.kicking
                } else {
                    p.attributes.handling
                };
                p.overall(weights) as u32 * grade(skill) as u32
            })
            .map(|p| p.id);

        let proposed = preferred
            .or(fallback)
            .ok_or_else(|| SimError::InvalidState(format!("{side:?} have nobody fit to take the ball")))?;

        let chosen = if matches!(action, PreferredAction::Penalty | PreferredAction::Conversion) {
            let view = MatchView::new(&*self.game, team, side, weights);
            let pick = self.strategies[side.index()].choose_kicker(&view, action, proposed);
            if healthy.iter().any(|p| p.id == pick) {
                pick
            } else {
                proposed
            }
        } else {
            proposed
        };

        self.player_in_possession = Some(chosen);
        self.increment_carries = true;
        Ok(chosen)
    }

    /// Base probability adjusted by the ranking gap between the teams
    ///
    /// With `opponent` the adjustment favours the defending team instead.
    fn probability(&self, kind: ProbabilityKind, opponent: bool) -> Result<u8> {
        let base = self.settings.activities.base_probability(kind)? as i16;
        let attacking = self.team(self.team_in_possession).ranking as i16;
        let defending = self.team(self.team_in_possession.opponent()).ranking as i16;
        let mut diff = (defending - attacking).clamp(-20, 20);
        if opponent {
            diff = -diff;
        }
        Ok((base + diff).clamp(1, 99) as u8)
    }

    fn base_probability(&self, kind: ProbabilityKind) -> Result<u8> {
        self.settings.activities.base_probability(kind)
    }

    /// Chance in percent that `kicker` lands a kick at goal from the given
    /// spot; team rankings play no part
    fn kick_at_goal_percent(
        &self,
        side: Side,
        kicker: PlayerId,
        from_middle: u8,
        metres: i16,
        kind: ProbabilityKind,
    ) -> Result<u8> {
        let kicking = self.player(side, kicker)?.attributes.kicking;
        let percent = kick_at_goal_probability(from_middle, metres, kicking, self.settings.kick_max_distance)
            * self.base_probability(kind)? as f64;
        Ok(percent.round().clamp(0.0, 100.0) as u8)
    }

    /// Roll `from..=max` and resolve it against the activity table
    fn roll(&mut self, kind: ActionKind, from: u16) -> Result<Outcome> {
        let (_, max) = self.settings.activities.range(kind)?;
        let roll = self.rng.int(from.clamp(1, max), max);
        self.settings.activities.outcome(kind, roll)
    }

    // ----- clock -----

    /// Let `seconds` of play pass
    ///
    /// Books possession and territory, then ends the period (or the match)
    /// when its time is up and `change` allows play to stop. In a period that
    /// ends on a result change, any change ends the match at once.
    fn refresh_time(&mut self, seconds: u32, change: bool) -> Result<()> {
        if seconds > 0 {
            let territory = if self.distance_from_halfway < 0 {
                Side::Visitors
            } else {
                Side::Hosts
            };
            self.game.score_mut(self.team_in_possession).add_possession(seconds);
            self.game.score_mut(territory).add_territory(seconds);
            self.game.clock.add_time(seconds);
        }

        let current = self.game.clock.current_period();
        let hosts_result = self.game.result_for(Side::Hosts);
        let immediate = current.ends_with_result_change() && hosts_result != ResultType::Draw;
        let time_up = self.game.clock.time_played_seconds() >= current.cumulative_seconds();

        if (time_up && current.is_playing()) || immediate {
            let end = immediate || (change && current.match_ends(self.game.match_type, hosts_result));
            if end {
                self.game.clock.switch_to(Some(MatchPeriod::FullTime))?;
            } else if change {
                self.game.clock.switch_to(None)?;
            }
        }
        Ok(())
    }

    /// Minutes played, fatigue, sin-bin countdown and substitution windows
    fn minute_effects(&mut self) -> Result<()> {
        let minutes = self.game.clock.last_increment();
        if minutes == 0 {
            return Ok(());
        }
        self.game.clock.reset_increment();

        for side in Side::ALL {
            let ids: SmallVec<[PlayerId; 16]> = self
                .team(side)
                .players_on_pitch()
                .filter(|p| p.is_healthy())
                .map(|p| p.id)
                .collect();
            for id in ids {
                if !self.player(side, id)?.on_pitch {
                    continue;
                }
                self.add_stat(side, id, StatKind::MinutesPlayed, minutes as u32)?;
                let after = self
                    .game
                    .player_stats(side, id)
                    .map_or(0, |s| s.get(StatKind::MinutesPlayed));
                let before = after.saturating_sub(minutes as u32);
                if after / 10 > before / 10 && self.change_in_fatigue(side, id)? {
                    let seconds = self.substitution(side, Some(id))?;
                    self.refresh_time(seconds, false)?;
                }
            }
        }

        if self.game.no_suspensions() > 0 {
            self.update_suspensions(minutes)?;
        }

        let interval = self.settings.replacement_interval;
        if self.game.clock.current_period() != MatchPeriod::FullTime
            && interval > 0
            && self.settings.automatic_substitutions
        {
            let now = self.game.clock.minutes_played();
            let before = now.saturating_sub(minutes);
            if now / interval > before / interval {
                for side in Side::ALL {
                    let seconds = self.substitution(side, None)?;
                    self.refresh_time(seconds, false)?;
                }
            }
        }
        Ok(())
    }

    // ----- match boundaries -----

    fn start_of_match(&mut self) -> Result<()> {
        for side in Side::ALL {
            let positions = self.positions;
            let on_pitch = self.team_mut(side).take_the_field(positions);
            if on_pitch < PositionTable::ON_PITCH {
                return Err(SimError::Selection(format!(
                    "{} can field only {} players",
                    self.team(side).name,
                    on_pitch
                )));
            }
            for id in self.on_pitch_ids(side) {
                self.game.add_stats_record(side, id);
                self.stat(side, id, StatKind::GamesPlayed)?;
            }
        }
        log_if_verbose!(
            self,
            "{} v {} at {}",
            self.team(Side::Hosts).name,
            self.team(Side::Visitors).name,
            self.game.venue_name()
        );
        Ok(())
    }

    /// Coin toss: the winner chooses to kick off or to pick an end
    fn draw(&mut self) -> Result<()> {
        self.game.clock.switch_to(Some(MatchPeriod::Draw))?;

        if self.game.referee.is_none() {
            if let Some((pool, exclude)) = &self.referees {
                self.game.referee = draw_referee(pool, exclude, &mut self.rng);
            }
        }

        self.hosts_first_kick_off = self.rng.chance(50);
        let winner = if self.hosts_first_kick_off {
            Side::Hosts
        } else {
            Side::Visitors
        };
        self.team_in_possession = winner;

        let choice = {
            let view = MatchView::new(
                &*self.game,
                &*self.teams[winner.index()],
                winner,
                &self.settings.condition_weights,
            );
            self.strategies[winner.index()].choose_side_or_ball(&view, &mut self.rng)
        };
        let strategy = self.strategies[winner.index()].name().to_string();
        let team_name = self.team(winner).name.clone();
        self.sink
            .strategy_choice(&strategy, &format!("{team_name} won the toss and chose {choice:?}"));
        self.notify(Notice::CoinToss, &[&team_name]);

        if choice == SideOrBall::Side {
            self.change_possession();
            self.hosts_first_kick_off = !self.hosts_first_kick_off;
        }
        self.specialist(PreferredAction::KickOff)?;
        Ok(())
    }

    /// Close an interval and set up the kick-off of the next period
    fn start_next_period(&mut self, interval: MatchPeriod) -> Result<()> {
        self.game.clock.set_time_for_interval(interval.length_seconds());
        self.game.clock.reset_time(interval.cumulative_minutes());
        let next = self.game.clock.switch_to(None)?;

        self.team_in_possession = if self.hosts_first_kick_off {
            Side::Hosts
        } else {
            Side::Visitors
        };
        self.hosts_first_kick_off = !self.hosts_first_kick_off;
        self.phases = 0;
        self.restart = true;
        self.offload = false;
        self.next_action = None;
        self.specialist(PreferredAction::KickOff)?;
        self.notify(Notice::PeriodStart, &[next.description()]);
        Ok(())
    }

    /// Shoot-out between each side's best kickers
    fn kicking_competition(&mut self) -> Result<()> {
        self.game.clock.switch_to(Some(MatchPeriod::KickingCompetition))?;
        self.notify(Notice::KickingCompetition, &[]);

        let mut max = [1u16; 2];
        let mut goals = [0u16; 2];
        for side in Side::ALL {
            let mut grades: SmallVec<[u16; 16]> = self
                .team(side)
                .players_on_pitch()
                .map(|p| grade(p.attributes.kicking) as u16)
                .collect();
            grades.sort_unstable_by(|a, b| b.cmp(a));
            let sum: u16 = grades.iter().take(self.settings.shoot_out_kickers).sum();
            max[side.index()] = sum.div_ceil(10).max(1);
            goals[side.index()] = self.rng.int(0, max[side.index()]);
        }
        while goals[0] == goals[1] {
            goals[1] = self.rng.int(0, max[1]);
        }

        for side in Side::ALL {
            self.game.score_mut(side).set_shoot_out_goals(goals[side.index()]);
            self.sink
                .update_scoreboard(side, ScoreboardField::ShootOutGoals, &goals[side.index()].to_string());
        }
        self.game
            .clock
            .add_time(MatchPeriod::KickingCompetition.length_seconds());
        self.game.clock.switch_to(Some(MatchPeriod::FullTime))?;
        Ok(())
    }

    fn finish_match(&mut self) -> Result<()> {
        if self.game.clock.current_period() != MatchPeriod::FullTime {
            self.game.clock.switch_to(Some(MatchPeriod::FullTime))?;
        }
        self.game
            .clock
            .set_time_for_interval(MatchPeriod::FullTime.length_seconds());
        self.end_of_match();
        Ok(())
    }

    /// Clear the pitch and book the result into the standings
    fn end_of_match(&mut self) {
        for side in Side::ALL {
            self.team_mut(side).clean_pitch();
        }

        if self.game.match_type == MatchType::Regular {
            for side in Side::ALL {
                let result = self.game.result_type_for(side);
                let try_bonus = self.game.bonus_point_try(side);
                let diff_bonus = self.game.diff_bonus_point(side);
                let points_for = self.game.points_scored(side);
                let points_against = self.game.points_scored(side.opponent());
                let tries_against = self.game.score(side.opponent()).tries();

                let team: &mut Team = &mut *self.teams[side.index()];
                team.results.update_results(result, try_bonus, diff_bonus);
                team.points
                    .update_from_score(self.game.score(side), points_for, points_against, tries_against);
            }
        }

        self.game.played = true;
        for side in Side::ALL {
            for (field, value) in [
                (ScoreboardField::Possession, self.game.possession_ratio(side)),
                (ScoreboardField::Territory, self.game.territory_ratio(side)),
            ] {
                if let Some(value) = value {
                    self.sink.update_scoreboard(side, field, &value.to_string());
                }
            }
        }
        let line = format!(
            "{} {} : {} {}",
            self.team(Side::Hosts).name,
            self.game.points_scored(Side::Hosts),
            self.game.points_scored(Side::Visitors),
            self.team(Side::Visitors).name
        );
        self.notify(Notice::FullTime, &[&line]);
    }
}

/// Probability (0..1) that a kick at goal succeeds
///
/// `from_middle` is the lateral distance from the line through the posts,
/// `metres` the distance from the goal line. The angle term compares the
/// opening between the posts with the opening seen from straight in front
/// at the 10 m line.
pub fn kick_at_goal_probability(from_middle: u8, metres: i16, kicking: u8, kick_max: u8) -> f64 {
    let depth = metres.max(1) as f64;
    let lateral = from_middle as f64;
    let half = ground::POSTS_HALF_WIDTH;

    let opening = if lateral <= half {
        ((half - lateral) / depth).atan() + ((half + lateral) / depth).atan()
    } else {
        ((lateral + half) / depth).atan() - ((lateral - half) / depth).atan()
    };
    let reference = 2.0 * (half / ground::TEN_METRE_LINE).atan();
    let angle = (1.0 + (opening / reference).min(1.0)) / 2.0;

    let distance = (lateral * lateral + depth * depth).sqrt();
    let distance_probability = if distance <= 0.8 * kick_max as f64 {
        1.0
    } else {
        0.8
    };

    let skill = 0.8 + kicking as f64 / 500.0;
    angle * distance_probability * skill
}

//! Match state, timetable and the engine that plays a match

pub mod activity;
pub mod clock;
pub mod controller;
pub mod engine;
pub mod logger;
pub mod match_state;
pub mod period;
pub mod score;
pub mod settings;
pub mod sink;

pub use activity::{ActionKind, ActivityTable, Outcome, ProbabilityKind};
pub use clock::MatchClock;
pub use controller::{
    AutomaticStrategy, DecisionStrategy, MatchView, PenaltyContext, PenaltyOption, RandomStrategy, SideOrBall,
};
pub use engine::{
    kick_at_goal_probability, DangerousTackleKind, GameEngine, MatchContext, MatchSummary, StepOutcome,
    VerbosityLevel,
};
pub use logger::{LogEntry, MatchLogger, OutputFormat, OutputMode};
pub use match_state::{CardKind, Match, MatchType, PlayoffRule, Side, SinBin, Substitution};
pub use period::MatchPeriod;
pub use score::{MatchScore, ScrumResult};
pub use settings::{CompetitionRules, MatchSettings, MoraleSettings};
pub use sink::{Notice, NullSink, PresentationSink, ScoreboardField};

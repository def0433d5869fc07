//! Presentation boundary of the engine
//!
//! The engine never knows whether anybody is watching. It reports narration,
//! notable events and scoreboard changes to a [`PresentationSink`]; headless
//! runs plug in [`NullSink`].

use crate::game::match_state::Side;
use serde::{Deserialize, Serialize};

/// Notable events surfaced to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Notice {
    CoinToss,
    TryUnderReview,
    TackleUnderReview,
    Injury,
    SinBin,
    SentOff,
    ReturnFromSinBin,
    Substitution,
    PeriodStart,
    PeriodEnd,
    KickingCompetition,
    FullTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreboardField {
    Points,
    Tries,
    Conversions,
    Penalties,
    DropGoals,
    ShootOutGoals,
    Possession,
    Territory,
}

pub trait PresentationSink {
    /// One line of match narration
    fn log_record(&mut self, text: &str);

    /// A notable event with its arguments (player names, minute, ...)
    fn notify(&mut self, notice: Notice, args: &[&str]);

    fn update_scoreboard(&mut self, side: Side, field: ScoreboardField, value: &str);

    /// A decision taken by a strategy (coin toss, penalty option, replacement)
    fn strategy_choice(&mut self, strategy: &str, text: &str) {
        let _ = strategy;
        self.log_record(text);
    }
}

/// Sink for headless runs
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl PresentationSink for NullSink {
    fn log_record(&mut self, _text: &str) {}

    fn notify(&mut self, _notice: Notice, _args: &[&str]) {}

    fn update_scoreboard(&mut self, _side: Side, _field: ScoreboardField, _value: &str) {}
}

impl<T: PresentationSink + ?Sized> PresentationSink for &mut T {
    fn log_record(&mut self, text: &str) {
        (**self).log_record(text)
    }

    fn notify(&mut self, notice: Notice, args: &[&str]) {
        (**self).notify(notice, args)
    }

    fn update_scoreboard(&mut self, side: Side, field: ScoreboardField, value: &str) {
        (**self).update_scoreboard(side, field, value)
    }

    fn strategy_choice(&mut self, strategy: &str, text: &str) {
        (**self).strategy_choice(strategy, text)
    }
}

//! Match periods and their fixed timetable

use crate::core::ResultType;
use crate::game::match_state::MatchType;
use serde::{Deserialize, Serialize};

/// Every phase a match passes through, in playing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MatchPeriod {
    WarmUp,
    Draw,
    FirstHalf,
    HalfTimeInterval,
    SecondHalf,
    BeforeExtraTimeInterval,
    FirstExtraTime,
    ExtraTimeInterval,
    SecondExtraTime,
    BeforeSuddenDeathInterval,
    SuddenDeath,
    BeforeKickingInterval,
    KickingCompetition,
    FullTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodKind {
    Regular,
    Extra,
    SuddenDeath,
    Interval,
    Other,
}

/// Static description of one period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodInfo {
    pub kind: PeriodKind,
    pub length_minutes: u8,
    /// Match clock (minutes) at which the period is due to end
    pub cumulative_minutes: u16,
    /// The match goes on past this period only for this match type and result
    pub continues_if: Option<(MatchType, ResultType)>,
    pub description: &'static str,
}

const fn info(
    kind: PeriodKind,
    length_minutes: u8,
    cumulative_minutes: u16,
    continues_if: Option<(MatchType, ResultType)>,
    description: &'static str,
) -> PeriodInfo {
    PeriodInfo {
        kind,
        length_minutes,
        cumulative_minutes,
        continues_if,
        description,
    }
}

const PLAYOFFS_DRAW: Option<(MatchType, ResultType)> = Some((MatchType::Playoffs, ResultType::Draw));

impl MatchPeriod {
    pub const ALL: [MatchPeriod; 14] = [
        MatchPeriod::WarmUp,
        MatchPeriod::Draw,
        MatchPeriod::FirstHalf,
        MatchPeriod::HalfTimeInterval,
        MatchPeriod::SecondHalf,
        MatchPeriod::BeforeExtraTimeInterval,
        MatchPeriod::FirstExtraTime,
        MatchPeriod::ExtraTimeInterval,
        MatchPeriod::SecondExtraTime,
        MatchPeriod::BeforeSuddenDeathInterval,
        MatchPeriod::SuddenDeath,
        MatchPeriod::BeforeKickingInterval,
        MatchPeriod::KickingCompetition,
        MatchPeriod::FullTime,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// The period that follows in playing order (`None` after full time)
    pub fn next(self) -> Option<MatchPeriod> {
        Self::ALL.get(self.ordinal() + 1).copied()
    }

    pub fn previous(self) -> Option<MatchPeriod> {
        self.ordinal().checked_sub(1).map(|i| Self::ALL[i])
    }

    pub fn info(self) -> PeriodInfo {
        use PeriodKind::{Extra, Interval, Other, Regular};

        match self {
            MatchPeriod::WarmUp => info(Other, 0, 0, None, "before match (warm-up)"),
            MatchPeriod::Draw => info(Interval, 0, 0, None, "coin toss"),
            MatchPeriod::FirstHalf => info(Regular, 40, 40, None, "first half"),
            MatchPeriod::HalfTimeInterval => info(Interval, 15, 40, None, "half-time interval"),
            MatchPeriod::SecondHalf => info(Regular, 40, 80, PLAYOFFS_DRAW, "second half"),
            MatchPeriod::BeforeExtraTimeInterval => info(Interval, 5, 80, None, "before extra time"),
            MatchPeriod::FirstExtraTime => info(Extra, 10, 90, None, "first period of extra time"),
            MatchPeriod::ExtraTimeInterval => info(Interval, 5, 90, None, "extra-time interval"),
            MatchPeriod::SecondExtraTime => {
                info(Extra, 10, 100, PLAYOFFS_DRAW, "second period of extra time")
            }
            MatchPeriod::BeforeSuddenDeathInterval => info(Interval, 5, 100, None, "before sudden death"),
            MatchPeriod::SuddenDeath => info(PeriodKind::SuddenDeath, 10, 110, PLAYOFFS_DRAW, "sudden death"),
            MatchPeriod::BeforeKickingInterval => {
                info(Interval, 0, 110, None, "kicking competition in preparation")
            }
            MatchPeriod::KickingCompetition => info(Other, 5, 110, None, "kicking competition"),
            MatchPeriod::FullTime => info(Other, 3, u16::MAX, None, "full time"),
        }
    }

    pub fn kind(self) -> PeriodKind {
        self.info().kind
    }

    pub fn length_minutes(self) -> u8 {
        self.info().length_minutes
    }

    pub fn length_seconds(self) -> u32 {
        self.length_minutes() as u32 * 60
    }

    pub fn cumulative_minutes(self) -> u16 {
        self.info().cumulative_minutes
    }

    pub fn cumulative_seconds(self) -> u32 {
        self.cumulative_minutes() as u32 * 60
    }

    pub fn description(self) -> &'static str {
        self.info().description
    }

    /// Regular, extra or sudden-death time: the ball is in play
    pub fn is_playing(self) -> bool {
        matches!(
            self.kind(),
            PeriodKind::Regular | PeriodKind::Extra | PeriodKind::SuddenDeath
        )
    }

    pub fn is_interval(self) -> bool {
        self.kind() == PeriodKind::Interval
    }

    /// The next change of result ends the match straight away
    pub fn ends_with_result_change(self) -> bool {
        self.kind() == PeriodKind::SuddenDeath
    }

    /// Whether the match is over once this period has run its course
    ///
    /// Only periods carrying a continuation rule can end a match; the match
    /// ends unless both the match type and the current result match the rule.
    pub fn match_ends(self, match_type: MatchType, result: ResultType) -> bool {
        match self.info().continues_if {
            Some((rule_type, rule_result)) => rule_type != match_type || rule_result != result,
            None => false,
        }
    }
}

impl std::fmt::Display for MatchPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_and_next() {
        assert_eq!(MatchPeriod::WarmUp.next(), Some(MatchPeriod::Draw));
        assert_eq!(MatchPeriod::FullTime.next(), None);
        assert_eq!(MatchPeriod::WarmUp.previous(), None);
        assert!(MatchPeriod::SecondHalf < MatchPeriod::BeforeExtraTimeInterval);
    }

    #[test]
    fn test_regular_match_ends_after_second_half() {
        let p = MatchPeriod::SecondHalf;
        assert!(p.match_ends(MatchType::Regular, ResultType::Draw));
        assert!(p.match_ends(MatchType::Regular, ResultType::Win));
        assert!(p.match_ends(MatchType::Playoffs, ResultType::Win));
        assert!(!p.match_ends(MatchType::Playoffs, ResultType::Draw));
        assert!(!MatchPeriod::FirstHalf.match_ends(MatchType::Regular, ResultType::Win));
    }

    #[test]
    fn test_timetable() {
        assert_eq!(MatchPeriod::SecondHalf.cumulative_minutes(), 80);
        assert_eq!(MatchPeriod::SuddenDeath.cumulative_seconds(), 110 * 60);
        assert_eq!(MatchPeriod::HalfTimeInterval.length_seconds(), 900);
        assert!(MatchPeriod::SuddenDeath.ends_with_result_change());
        assert!(MatchPeriod::Draw.is_interval());
        assert!(!MatchPeriod::KickingCompetition.is_playing());
    }
}

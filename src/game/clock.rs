//! Match clock: displayed time, per-period seconds and period switching

use crate::game::period::MatchPeriod;
use crate::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Time keeping for one match
///
/// The displayed clock (`minutes:seconds`) is reset to the nominal start of
/// each playing period, whereas the per-period seconds only ever grow and add
/// up to the raw time the ball has been in play (plus intervals).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchClock {
    minutes: u16,
    seconds: u8,
    /// Whole minutes crossed since the last reset, drives per-minute effects
    last_increment: u16,
    current: MatchPeriod,
    periods: BTreeMap<MatchPeriod, u32>,
}

impl MatchClock {
    pub fn new() -> Self {
        let mut periods = BTreeMap::new();
        periods.insert(MatchPeriod::WarmUp, 0);
        MatchClock {
            minutes: 0,
            seconds: 0,
            last_increment: 0,
            current: MatchPeriod::WarmUp,
            periods,
        }
    }

    pub fn current_period(&self) -> MatchPeriod {
        self.current
    }

    pub fn add_time(&mut self, seconds: u32) {
        let whole_minutes = (seconds / 60) as u16;
        self.minutes += whole_minutes;
        self.last_increment += whole_minutes;

        let total = self.seconds as u32 + seconds % 60;
        let carried = (total / 60) as u16;
        self.minutes += carried;
        self.last_increment += carried;
        self.seconds = (total % 60) as u8;

        *self.periods.entry(self.current).or_insert(0) += seconds;
    }

    pub fn last_increment(&self) -> u16 {
        self.last_increment
    }

    pub fn reset_increment(&mut self) {
        self.last_increment = 0;
    }

    /// Switch to `target`, or to the next period when `None`
    ///
    /// Periods only move forward; switching backwards or past full time is an
    /// error.
    pub fn switch_to(&mut self, target: Option<MatchPeriod>) -> Result<MatchPeriod> {
        let next = match target {
            Some(period) => period,
            None => self.current.next().ok_or_else(|| {
                SimError::InvalidPeriod(format!("no period follows {:?}", self.current))
            })?,
        };
        if next <= self.current {
            return Err(SimError::InvalidPeriod(format!(
                "cannot switch from {:?} back to {:?}",
                self.current, next
            )));
        }
        self.current = next;
        self.periods.insert(next, 0);
        Ok(next)
    }

    /// The period played before the current one
    pub fn last_period_played(&self) -> MatchPeriod {
        let mut keys = self.periods.keys().rev();
        let last = keys.next().copied().unwrap_or(self.current);
        keys.next().copied().unwrap_or(last)
    }

    /// Fix the length of an interval (or full-time) period
    ///
    /// Any time already booked against the interval is moved back to the
    /// period that preceded it.
    pub fn set_time_for_interval(&mut self, seconds: u32) {
        if self.periods.len() > 1 {
            let previous = if self.current == MatchPeriod::FullTime {
                self.last_period_played()
            } else {
                self.current.previous().unwrap_or(self.current)
            };
            let booked = self.periods.get(&self.current).copied().unwrap_or(0);
            *self.periods.entry(previous).or_insert(0) += booked;
        }
        self.periods.insert(self.current, seconds);
    }

    /// Set the displayed clock to the start of a period (in minutes)
    pub fn reset_time(&mut self, minutes: u16) {
        self.minutes = minutes;
        self.seconds = 0;
    }

    pub fn minutes_played(&self) -> u16 {
        self.minutes
    }

    /// Displayed clock in seconds
    pub fn time_played_seconds(&self) -> u32 {
        self.minutes as u32 * 60 + self.seconds as u32
    }

    /// Sum of every period's seconds, never decreases
    pub fn raw_seconds(&self) -> u32 {
        self.periods.values().sum()
    }

    pub fn seconds_in_period(&self, period: MatchPeriod) -> u32 {
        self.periods.get(&period).copied().unwrap_or(0)
    }

    /// Periods visited so far with the seconds booked against each
    pub fn periods(&self) -> impl Iterator<Item = (MatchPeriod, u32)> + '_ {
        self.periods.iter().map(|(&p, &s)| (p, s))
    }
}

impl Default for MatchClock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MatchClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>3}m:{:02}s", self.minutes, self.seconds)
    }
}

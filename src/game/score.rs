//! Per-team match score and statistics ledger
//!
//! Totals (tackles attempted, passes attempted, scrums and lineouts played)
//! are never stored: they are derived from the completed/missed or won/lost
//! counters on every read.

use crate::core::{PointEvent, PointValues};
use serde::{Deserialize, Serialize};

/// Outcome of a scrum from one team's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrumResult {
    Won,
    Lost,
    Undetermined,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    values: PointValues,
    tries: u16,
    conversions: u16,
    penalties: u16,
    drop_goals: u16,
    scrums_won: u16,
    scrums_lost: u16,
    lineouts_won: u16,
    lineouts_lost: u16,
    tackles_completed: u16,
    tackles_missed: u16,
    passes_completed: u16,
    passes_missed: u16,
    carries: u16,
    metres_run: u32,
    metres_kicked: u32,
    handling_errors: u16,
    offloads: u16,
    penalties_caused: u16,
    yellow_cards: u16,
    red_cards: u16,
    shoot_out_goals: u16,
    possession_seconds: u32,
    territory_seconds: u32,
}

impl MatchScore {
    pub fn new(values: PointValues) -> Self {
        MatchScore {
            values,
            ..Default::default()
        }
    }

    pub fn point_values(&self) -> &PointValues {
        &self.values
    }

    /// Record a scoring event and return the new count for that event
    pub fn record(&mut self, event: PointEvent) -> u16 {
        let counter = match event {
            PointEvent::Try => &mut self.tries,
            PointEvent::Conversion => &mut self.conversions,
            PointEvent::Penalty => &mut self.penalties,
            PointEvent::DropGoal => &mut self.drop_goals,
        };
        *counter += 1;
        *counter
    }

    pub fn count(&self, event: PointEvent) -> u16 {
        match event {
            PointEvent::Try => self.tries,
            PointEvent::Conversion => self.conversions,
            PointEvent::Penalty => self.penalties,
            PointEvent::DropGoal => self.drop_goals,
        }
    }

    pub fn tries(&self) -> u16 {
        self.tries
    }

    pub fn conversions(&self) -> u16 {
        self.conversions
    }

    pub fn penalties(&self) -> u16 {
        self.penalties
    }

    pub fn drop_goals(&self) -> u16 {
        self.drop_goals
    }

    pub fn points(&self) -> u16 {
        self.tries * self.values.try_
            + self.conversions * self.values.conversion
            + self.penalties * self.values.penalty
            + self.drop_goals * self.values.drop_goal
    }

    pub fn record_scrum(&mut self, result: ScrumResult) {
        match result {
            ScrumResult::Won => self.scrums_won += 1,
            ScrumResult::Lost => self.scrums_lost += 1,
            ScrumResult::Undetermined => {}
        }
    }

    pub fn scrums_won(&self) -> u16 {
        self.scrums_won
    }

    pub fn scrums_lost(&self) -> u16 {
        self.scrums_lost
    }

    pub fn scrums(&self) -> u16 {
        self.scrums_won + self.scrums_lost
    }

    pub fn record_lineout(&mut self, won: bool) {
        if won {
            self.lineouts_won += 1;
        } else {
            self.lineouts_lost += 1;
        }
    }

    pub fn lineouts_won(&self) -> u16 {
        self.lineouts_won
    }

    pub fn lineouts_lost(&self) -> u16 {
        self.lineouts_lost
    }

    pub fn lineouts(&self) -> u16 {
        self.lineouts_won + self.lineouts_lost
    }

    pub fn record_tackle(&mut self, completed: bool) {
        if completed {
            self.tackles_completed += 1;
        } else {
            self.tackles_missed += 1;
        }
    }

    pub fn tackles_completed(&self) -> u16 {
        self.tackles_completed
    }

    pub fn tackles_missed(&self) -> u16 {
        self.tackles_missed
    }

    pub fn tackles(&self) -> u16 {
        self.tackles_completed + self.tackles_missed
    }

    pub fn record_pass(&mut self, completed: bool) {
        if completed {
            self.passes_completed += 1;
        } else {
            self.passes_missed += 1;
        }
    }

    pub fn passes_completed(&self) -> u16 {
        self.passes_completed
    }

    pub fn passes_missed(&self) -> u16 {
        self.passes_missed
    }

    pub fn passes(&self) -> u16 {
        self.passes_completed + self.passes_missed
    }

    pub fn add_carry(&mut self) {
        self.carries += 1;
    }

    pub fn carries(&self) -> u16 {
        self.carries
    }

    /// Add metres run and return the running total
    pub fn run(&mut self, metres: u32) -> u32 {
        self.metres_run += metres;
        self.metres_run
    }

    pub fn metres_run(&self) -> u32 {
        self.metres_run
    }

    /// Add metres kicked and return the running total
    pub fn kick(&mut self, metres: u32) -> u32 {
        self.metres_kicked += metres;
        self.metres_kicked
    }

    pub fn metres_kicked(&self) -> u32 {
        self.metres_kicked
    }

    pub fn add_handling_error(&mut self) {
        self.handling_errors += 1;
    }

    pub fn handling_errors(&self) -> u16 {
        self.handling_errors
    }

    pub fn add_offload(&mut self) {
        self.offloads += 1;
    }

    pub fn offloads(&self) -> u16 {
        self.offloads
    }

    pub fn add_penalty_caused(&mut self) {
        self.penalties_caused += 1;
    }

    pub fn penalties_caused(&self) -> u16 {
        self.penalties_caused
    }

    pub fn add_yellow_card(&mut self) {
        self.yellow_cards += 1;
    }

    pub fn yellow_cards(&self) -> u16 {
        self.yellow_cards
    }

    pub fn add_red_card(&mut self) {
        self.red_cards += 1;
    }

    pub fn red_cards(&self) -> u16 {
        self.red_cards
    }

    pub fn set_shoot_out_goals(&mut self, goals: u16) {
        self.shoot_out_goals = goals;
    }

    pub fn shoot_out_goals(&self) -> u16 {
        self.shoot_out_goals
    }

    pub fn add_possession(&mut self, seconds: u32) {
        self.possession_seconds += seconds;
    }

    pub fn possession_seconds(&self) -> u32 {
        self.possession_seconds
    }

    pub fn add_territory(&mut self, seconds: u32) {
        self.territory_seconds += seconds;
    }

    pub fn territory_seconds(&self) -> u32 {
        self.territory_seconds
    }

    pub fn tackle_success_rate(&self) -> Option<f64> {
        rate(self.tackles_completed, self.tackles())
    }

    pub fn pass_success_rate(&self) -> Option<f64> {
        rate(self.passes_completed, self.passes())
    }

    pub fn scrum_success_rate(&self) -> Option<f64> {
        rate(self.scrums_won, self.scrums())
    }

    pub fn lineout_success_rate(&self) -> Option<f64> {
        rate(self.lineouts_won, self.lineouts())
    }
}

fn rate(part: u16, total: u16) -> Option<f64> {
    (total > 0).then(|| part as f64 * 100.0 / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_follow_counts() {
        let mut score = MatchScore::new(PointValues::default());
        assert_eq!(score.record(PointEvent::Try), 1);
        assert_eq!(score.record(PointEvent::Try), 2);
        score.record(PointEvent::Conversion);
        score.record(PointEvent::Penalty);
        score.record(PointEvent::DropGoal);
        assert_eq!(score.points(), 2 * 5 + 2 + 3 + 3);

        let custom = PointValues {
            try_: 4,
            ..PointValues::default()
        };
        let mut old_rules = MatchScore::new(custom);
        old_rules.record(PointEvent::Try);
        assert_eq!(old_rules.points(), 4);
    }

    #[test]
    fn test_totals_are_derived() {
        let mut score = MatchScore::default();
        score.record_tackle(true);
        score.record_tackle(true);
        score.record_tackle(false);
        score.record_pass(false);
        score.record_scrum(ScrumResult::Undetermined);
        score.record_scrum(ScrumResult::Won);
        score.record_lineout(false);

        assert_eq!(score.tackles(), 3);
        assert_eq!(score.passes(), 1);
        assert_eq!(score.scrums(), 1);
        assert_eq!(score.lineouts(), 1);
        assert_eq!(score.pass_success_rate(), Some(0.0));
        assert!(score.tackle_success_rate().unwrap() > 66.0);
    }

    #[test]
    fn test_rates_without_attempts() {
        let score = MatchScore::default();
        assert_eq!(score.tackle_success_rate(), None);
        assert_eq!(score.lineout_success_rate(), None);
    }

    #[test]
    fn test_metres_running_totals() {
        let mut score = MatchScore::default();
        assert_eq!(score.run(12), 12);
        assert_eq!(score.run(3), 15);
        assert_eq!(score.kick(40), 40);
        assert_eq!(score.metres_run(), 15);
    }
}

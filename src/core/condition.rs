//! Player condition: fatigue, fitness, health, morale, form and health issues

use crate::rng::MatchRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConditionKind {
    Fatigue,
    Fitness,
    Health,
    Morale,
    Form,
}

impl ConditionKind {
    pub const ALL: [ConditionKind; 5] = [
        ConditionKind::Fatigue,
        ConditionKind::Fitness,
        ConditionKind::Health,
        ConditionKind::Morale,
        ConditionKind::Form,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Normal,
    Low,
    Critical,
}

/// Bounds shared by every condition value
pub mod scale {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;
    pub const LOW: u8 = 4;
    pub const CRITICAL: u8 = 2;
}

/// How well a player fits the position they are selected for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionFit {
    Exact,
    Generic,
    Different,
    Unrelated,
}

/// Weights used to fold individual conditions into an overall value and to
/// rank candidates during squad selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionWeights {
    pub fatigue: u16,
    pub fitness: u16,
    pub health: u16,
    pub morale: u16,
    pub form: u16,
    pub exact_position: u16,
    pub generic_position: u16,
    pub different_position: u16,
    pub unrelated_position: u16,
}

impl Default for ConditionWeights {
    fn default() -> Self {
        ConditionWeights {
            fatigue: 3,
            fitness: 2,
            health: 2,
            morale: 1,
            form: 2,
            exact_position: 4,
            generic_position: 3,
            different_position: 2,
            unrelated_position: 1,
        }
    }
}

impl ConditionWeights {
    pub fn weight(&self, kind: ConditionKind) -> u16 {
        match kind {
            ConditionKind::Fatigue => self.fatigue,
            ConditionKind::Fitness => self.fitness,
            ConditionKind::Health => self.health,
            ConditionKind::Morale => self.morale,
            ConditionKind::Form => self.form,
        }
    }

    pub fn fit_weight(&self, fit: PositionFit) -> u16 {
        match fit {
            PositionFit::Exact => self.exact_position,
            PositionFit::Generic => self.generic_position,
            PositionFit::Different => self.different_position,
            PositionFit::Unrelated => self.unrelated_position,
        }
    }

    pub fn total(&self) -> u16 {
        ConditionKind::ALL.iter().map(|&k| self.weight(k)).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    Nausea,
    Sick,
    Injury,
    SeriousInjury,
    Mental,
    Coma,
}

/// (status, minimum days out, maximum days out, relative weight)
pub const HEALTH_ISSUES: [(HealthStatus, u16, u16, u16); 6] = [
    (HealthStatus::Nausea, 1, 3, 200),
    (HealthStatus::Sick, 3, 10, 300),
    (HealthStatus::Injury, 5, 30, 280),
    (HealthStatus::SeriousInjury, 30, 90, 200),
    (HealthStatus::Mental, 1, 90, 18),
    (HealthStatus::Coma, 45, 90, 2),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthIssue {
    pub status: HealthStatus,
    pub days_out: u16,
    pub days_remaining: u16,
}

impl HealthIssue {
    pub fn is_live(&self) -> bool {
        self.days_remaining > 0
    }
}

fn cumulative_weight(up_to: HealthStatus) -> u16 {
    let mut sum = 0;
    for &(status, _, _, weight) in HEALTH_ISSUES.iter() {
        sum += weight;
        if status == up_to {
            break;
        }
    }
    sum
}

/// Current condition as maximum values minus accumulated decrements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCondition {
    base: [u8; 5],
    decrease: [u8; 5],
    health_issues: Vec<HealthIssue>,
}

impl PlayerCondition {
    /// Fully fit, fresh player
    pub fn new() -> Self {
        PlayerCondition {
            base: [scale::MAX; 5],
            decrease: [0; 5],
            health_issues: Vec::new(),
        }
    }

    /// Condition with explicit current values (clamped into the scale)
    pub fn with_values(fatigue: u8, fitness: u8, health: u8, morale: u8, form: u8) -> Self {
        let mut condition = Self::new();
        for (kind, value) in ConditionKind::ALL
            .iter()
            .zip([fatigue, fitness, health, morale, form])
        {
            let value = value.clamp(scale::MIN, scale::MAX);
            condition.decrease[kind.index()] = scale::MAX - value;
        }
        condition
    }

    pub fn value(&self, kind: ConditionKind) -> u8 {
        self.base[kind.index()] - self.decrease[kind.index()]
    }

    pub fn severity(&self, kind: ConditionKind) -> Severity {
        severity_of(self.value(kind))
    }

    pub fn is_at_minimum(&self, kind: ConditionKind) -> bool {
        self.value(kind) <= scale::MIN
    }

    pub fn decrease(&mut self, kind: ConditionKind, by: u8) {
        let i = kind.index();
        let room = self.base[i] - scale::MIN - self.decrease[i];
        self.decrease[i] += by.min(room);
    }

    pub fn increase(&mut self, kind: ConditionKind, by: u8) {
        let i = kind.index();
        self.decrease[i] -= by.min(self.decrease[i]);
    }

    /// Restore every condition except form to its maximum
    pub fn refresh(&mut self) {
        for kind in [
            ConditionKind::Fatigue,
            ConditionKind::Fitness,
            ConditionKind::Health,
            ConditionKind::Morale,
        ] {
            self.decrease[kind.index()] = 0;
        }
    }

    pub fn overall(&self, weights: &ConditionWeights) -> u16 {
        ConditionKind::ALL
            .iter()
            .map(|&k| self.value(k) as u16 * weights.weight(k))
            .sum()
    }

    /// Severity of the overall value, judged against the weighted thresholds
    pub fn overall_severity(&self, weights: &ConditionWeights) -> Severity {
        let overall = self.overall(weights);
        let total = weights.total();
        if overall <= scale::CRITICAL as u16 * total {
            Severity::Critical
        } else if overall <= scale::LOW as u16 * total {
            Severity::Low
        } else {
            Severity::Normal
        }
    }

    pub fn is_healthy(&self) -> bool {
        !self.health_issues.iter().any(HealthIssue::is_live)
    }

    pub fn live_health_issue(&self) -> Option<&HealthIssue> {
        self.health_issues.iter().find(|h| h.is_live())
    }

    pub fn health_history(&self) -> &[HealthIssue] {
        &self.health_issues
    }

    /// Draw a new health issue whose status lies within `from..=to`
    pub fn new_health_issue(
        &mut self,
        rng: &mut MatchRng,
        from: HealthStatus,
        to: HealthStatus,
    ) -> HealthStatus {
        let low = match HEALTH_ISSUES.iter().position(|&(s, ..)| s == from) {
            Some(0) | None => 1,
            Some(i) => cumulative_weight(HEALTH_ISSUES[i - 1].0) + 1,
        };
        let high = cumulative_weight(to);

        let mut roll = rng.int(low, high) as i32;
        let mut chosen = to;
        for &(status, _, _, weight) in HEALTH_ISSUES.iter() {
            roll -= weight as i32;
            if roll <= 0 {
                chosen = status;
                break;
            }
        }

        let (min_days, max_days) = HEALTH_ISSUES
            .iter()
            .find(|&&(s, ..)| s == chosen)
            .map(|&(_, lo, hi, _)| (lo, hi))
            .unwrap_or((1, 1));
        let days = rng.int(min_days, max_days);
        self.health_issues.push(HealthIssue {
            status: chosen,
            days_out: days,
            days_remaining: days,
        });
        chosen
    }

    /// Let `days` pass for any live health issue
    pub fn recover(&mut self, days: u16) {
        for issue in self.health_issues.iter_mut() {
            issue.days_remaining = issue.days_remaining.saturating_sub(days);
        }
    }
}

impl Default for PlayerCondition {
    fn default() -> Self {
        Self::new()
    }
}

pub fn severity_of(value: u8) -> Severity {
    if value <= scale::CRITICAL {
        Severity::Critical
    } else if value <= scale::LOW {
        Severity::Low
    } else {
        Severity::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_never_leaves_scale() {
        let mut c = PlayerCondition::new();
        c.decrease(ConditionKind::Fatigue, 50);
        assert_eq!(c.value(ConditionKind::Fatigue), scale::MIN);
        assert!(c.is_at_minimum(ConditionKind::Fatigue));
        c.increase(ConditionKind::Fatigue, 50);
        assert_eq!(c.value(ConditionKind::Fatigue), scale::MAX);
    }

    #[test]
    fn test_severity_thresholds() {
        assert_eq!(severity_of(10), Severity::Normal);
        assert_eq!(severity_of(4), Severity::Low);
        assert_eq!(severity_of(2), Severity::Critical);
    }

    #[test]
    fn test_overall_is_weighted_sum() {
        let weights = ConditionWeights::default();
        let c = PlayerCondition::new();
        assert_eq!(c.overall(&weights), 10 * weights.total());
        assert_eq!(c.overall_severity(&weights), Severity::Normal);

        let tired = PlayerCondition::with_values(1, 1, 1, 1, 1);
        assert_eq!(tired.overall_severity(&weights), Severity::Critical);
    }

    #[test]
    fn test_health_issue_within_range() {
        let mut rng = MatchRng::seed_from_u64(11);
        for _ in 0..200 {
            let mut c = PlayerCondition::new();
            let status = c.new_health_issue(&mut rng, HealthStatus::Injury, HealthStatus::SeriousInjury);
            assert!(matches!(status, HealthStatus::Injury | HealthStatus::SeriousInjury));
            assert!(!c.is_healthy());
            let issue = c.live_health_issue().unwrap();
            match issue.status {
                HealthStatus::Injury => assert!((5..=30).contains(&issue.days_out)),
                _ => assert!((30..=90).contains(&issue.days_out)),
            }
        }
    }

    #[test]
    fn test_recovery_clears_issue() {
        let mut rng = MatchRng::seed_from_u64(5);
        let mut c = PlayerCondition::new();
        c.new_health_issue(&mut rng, HealthStatus::Nausea, HealthStatus::Nausea);
        c.recover(3);
        assert!(c.is_healthy());
        assert_eq!(c.health_history().len(), 1);
    }
}

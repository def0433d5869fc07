//! Tunable match settings, loaded from and saved to JSON

use crate::core::{ConditionWeights, PointValues, StandingsPoints};
use crate::game::activity::ActivityTable;
use crate::game::VerbosityLevel;
use crate::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Scoring and standings rules of a competition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitionRules {
    pub point_values: PointValues,
    pub standings: StandingsPoints,
    /// Tries needed for the try bonus point
    pub tries_for_bonus: u16,
    /// Largest losing margin that still earns the losing bonus point
    pub losing_bonus_margin: u16,
}

impl Default for CompetitionRules {
    fn default() -> Self {
        CompetitionRules {
            point_values: PointValues::default(),
            standings: StandingsPoints::default(),
            tries_for_bonus: 4,
            losing_bonus_margin: 7,
        }
    }
}

/// Morale swings after scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoraleSettings {
    /// Chance (percent) that a given player's morale moves at all
    pub change_probability: u8,
    pub step: u8,
}

impl Default for MoraleSettings {
    fn default() -> Self {
        MoraleSettings {
            change_probability: 25,
            step: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    pub activities: ActivityTable,
    pub kick_max_distance: u8,
    pub drop_goal_max_distance: u8,
    /// Minutes between regular substitution windows, 0 disables them
    pub replacement_interval: u16,
    /// Minutes a player must have played before a tactical replacement
    pub min_play_interval: u16,
    pub automatic_substitutions: bool,
    /// Replacements inherit the set-piece roles of the player they replace
    pub transfer_preferences: bool,
    pub verbosity: VerbosityLevel,
    pub rules: CompetitionRules,
    pub morale: MoraleSettings,
    /// Roll shift per 10 kg of pack weight difference in scrums
    pub scrum_weight_shift: u16,
    /// Applied to the known pack weight to estimate an unknown one
    pub unknown_weight_coefficient: f64,
    pub incomplete_weight_coefficient: f64,
    pub condition_weights: ConditionWeights,
    pub shoot_out_kickers: usize,
    pub sin_bin_minutes: u16,
}

impl Default for MatchSettings {
    fn default() -> Self {
        MatchSettings {
            activities: ActivityTable::standard(),
            kick_max_distance: 60,
            drop_goal_max_distance: 40,
            replacement_interval: 10,
            min_play_interval: 10,
            automatic_substitutions: true,
            transfer_preferences: true,
            verbosity: VerbosityLevel::default(),
            rules: CompetitionRules::default(),
            morale: MoraleSettings::default(),
            scrum_weight_shift: 6,
            unknown_weight_coefficient: 0.95,
            incomplete_weight_coefficient: 1.0,
            condition_weights: ConditionWeights::default(),
            shoot_out_kickers: 5,
            sin_bin_minutes: 10,
        }
    }
}

impl MatchSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: MatchSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.activities.validate()?;
        if self.kick_max_distance == 0 {
            return Err(SimError::Config("kick_max_distance must be positive".into()));
        }
        if self.drop_goal_max_distance > self.kick_max_distance {
            return Err(SimError::Config(format!(
                "drop_goal_max_distance {} exceeds kick_max_distance {}",
                self.drop_goal_max_distance, self.kick_max_distance
            )));
        }
        if self.morale.change_probability > 100 {
            return Err(SimError::Config("morale change probability exceeds 100".into()));
        }
        if self.shoot_out_kickers == 0 {
            return Err(SimError::Config("shoot_out_kickers must be positive".into()));
        }
        if self.condition_weights.total() == 0 {
            return Err(SimError::Config("condition weights are all zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_validate() {
        MatchSettings::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = MatchSettings::from_json_str(r#"{ "kick_max_distance": 55 }"#).unwrap();
        assert_eq!(settings.kick_max_distance, 55);
        assert_eq!(settings.sin_bin_minutes, 10);
        assert_eq!(settings.rules.point_values.try_, 5);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let err = MatchSettings::from_json_str(r#"{ "kick_max_distance": 30 }"#);
        assert!(matches!(err, Err(SimError::Config(_))));
        assert!(MatchSettings::from_json_str("not json").is_err());
    }
}

//! Player entity: attributes, role preferences and on-pitch state

use crate::core::condition::{ConditionWeights, PlayerCondition};
use crate::core::entity::{Entity, PlayerId};
use crate::core::position::{PositionEntry, PositionType};
use crate::core::stats::{PlayerPoints, PlayerStats};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Set-piece and kicking roles a player can be nominated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PreferredAction {
    KickOff,
    Penalty,
    Conversion,
    Scrum,
    Lineout,
}

impl PreferredAction {
    pub const ALL: [PreferredAction; 5] = [
        PreferredAction::KickOff,
        PreferredAction::Penalty,
        PreferredAction::Conversion,
        PreferredAction::Scrum,
        PreferredAction::Lineout,
    ];

    /// Kicking roles are judged on kicking, set-piece feeds on handling
    pub fn is_kicking_role(self) -> bool {
        matches!(
            self,
            PreferredAction::KickOff | PreferredAction::Penalty | PreferredAction::Conversion
        )
    }
}

/// Small set of preferred actions (captaincy is tracked separately)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceSet(SmallVec<[PreferredAction; 4]>);

impl PreferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, action: PreferredAction) {
        if !self.contains(action) {
            self.0.push(action);
            self.0.sort();
        }
    }

    pub fn remove(&mut self, action: PreferredAction) -> bool {
        match self.0.iter().position(|&a| a == action) {
            Some(i) => {
                self.0.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, action: PreferredAction) -> bool {
        self.0.contains(&action)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = PreferredAction> + '_ {
        self.0.iter().copied()
    }
}

/// Skill attributes on a 1..=99 scale plus physical measurements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub kicking: u8,
    pub handling: u8,
    pub strength: u8,
    pub speed: u8,
    pub tackling: u8,
    pub agility: u8,
    pub dexterity: u8,
    pub endurance: u8,
    /// Body weight in kilograms, 0 when unknown
    pub weight_kg: u16,
    /// Height in centimetres, 0 when unknown
    pub height_cm: u16,
}

impl Default for Attributes {
    fn default() -> Self {
        Attributes {
            kicking: 50,
            handling: 50,
            strength: 50,
            speed: 50,
            tackling: 50,
            agility: 50,
            dexterity: 50,
            endurance: 50,
            weight_kg: 0,
            height_cm: 0,
        }
    }
}

/// Collapse a 1..=99 attribute into a 1..=10 grade used by engine formulas
pub fn grade(value: u8) -> u8 {
    (value / 10).clamp(1, 10)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Natural position type
    pub position: PositionType,
    /// Natural shirt number when the player has a specific position
    pub preferred_no: Option<u8>,
    /// Position currently assigned by selection
    pub current_no: Option<u8>,
    pub current_type: PositionType,
    /// 0 = not selected, 1..=15 starting, 16.. bench
    pub shirt_no: u8,
    /// Pitch slot (1..=15) while on the pitch, 0 otherwise
    pub no_on_pitch: u8,
    pub on_pitch: bool,
    pub sent_off: bool,
    pub captain: bool,
    pub attributes: Attributes,
    pub condition: PlayerCondition,
    pub preferences: PreferenceSet,
    /// Career totals
    pub stats: PlayerStats,
    pub points: PlayerPoints,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, position: PositionType) -> Self {
        Player {
            id,
            name: name.into(),
            position,
            preferred_no: None,
            current_no: None,
            current_type: position,
            shirt_no: 0,
            no_on_pitch: 0,
            on_pitch: false,
            sent_off: false,
            captain: false,
            attributes: Attributes::default(),
            condition: PlayerCondition::new(),
            preferences: PreferenceSet::new(),
            stats: PlayerStats::new(),
            points: PlayerPoints::default(),
        }
    }

    pub fn with_preferred_no(mut self, no: u8) -> Self {
        self.preferred_no = Some(no);
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Generic players know their position type but no specific shirt
    pub fn is_position_generic(&self) -> bool {
        self.preferred_no.is_none()
    }

    pub fn assign_position(&mut self, entry: &PositionEntry) {
        self.current_no = Some(entry.no);
        self.current_type = entry.position_type;
    }

    pub fn is_available(&self) -> bool {
        self.condition.is_healthy()
    }

    pub fn is_healthy(&self) -> bool {
        self.condition.is_healthy()
    }

    /// Selected for the starting fifteen
    pub fn is_base_player(&self) -> bool {
        (1..=15).contains(&self.shirt_no)
    }

    pub fn is_on_bench(&self) -> bool {
        self.shirt_no > 15 && !self.on_pitch
    }

    pub fn introduce(&mut self, no_on_pitch: u8) {
        self.on_pitch = true;
        self.no_on_pitch = no_on_pitch;
    }

    pub fn withdraw(&mut self) {
        self.on_pitch = false;
        self.no_on_pitch = 0;
    }

    pub fn overall(&self, weights: &ConditionWeights) -> u16 {
        self.condition.overall(weights)
    }

    pub fn is_preferred_for(&self, action: PreferredAction) -> bool {
        self.preferences.contains(action)
    }

    /// Initial plus surname, used in narration ("J. Smith")
    pub fn short_name(&self) -> String {
        let mut parts = self.name.split_whitespace();
        match (parts.next(), parts.last()) {
            (Some(first), Some(last)) => {
                let initial = first.chars().next().unwrap_or(' ');
                format!("{initial}. {last}")
            }
            _ => self.name.clone(),
        }
    }
}

impl Entity for Player {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::EntityId;

    #[test]
    fn test_preference_set_is_a_set() {
        let mut prefs = PreferenceSet::new();
        prefs.insert(PreferredAction::Penalty);
        prefs.insert(PreferredAction::Penalty);
        prefs.insert(PreferredAction::KickOff);
        assert_eq!(prefs.iter().count(), 2);
        assert!(prefs.contains(PreferredAction::KickOff));
        assert!(prefs.remove(PreferredAction::KickOff));
        assert!(!prefs.remove(PreferredAction::KickOff));
        assert!(!prefs.contains(PreferredAction::Scrum));
    }

    #[test]
    fn test_captain_is_independent_of_preferences() {
        let mut player = Player::new(EntityId::new(1), "Ann Example", PositionType::FlyHalf);
        player.captain = true;
        player.preferences.clear();
        assert!(player.captain);
        assert!(player.preferences.is_empty());
    }

    #[test]
    fn test_grade_bounds() {
        assert_eq!(grade(1), 1);
        assert_eq!(grade(55), 5);
        assert_eq!(grade(99), 9);
        assert_eq!(grade(100), 10);
    }

    #[test]
    fn test_introduce_and_withdraw() {
        let mut player = Player::new(EntityId::new(2), "Bo Tester", PositionType::Wing);
        player.shirt_no = 18;
        assert!(player.is_on_bench());
        player.introduce(11);
        assert!(player.on_pitch);
        assert!(!player.is_on_bench());
        player.withdraw();
        assert_eq!(player.no_on_pitch, 0);
    }

    #[test]
    fn test_short_name() {
        let player = Player::new(EntityId::new(3), "Cara Lee Jones", PositionType::Lock);
        assert_eq!(player.short_name(), "C. Jones");
        let mononym = Player::new(EntityId::new(4), "Pelé", PositionType::Lock);
        assert_eq!(mononym.short_name(), "Pelé");
    }
}

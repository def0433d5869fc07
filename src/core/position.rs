//! Playing positions
//!
//! The position table is built once (usually via [`PositionTable::standard`])
//! and handed by reference to everything that needs to map shirt numbers to
//! position types: squad selection, substitutions and the match engine.

use crate::{Result, SimError};
use serde::{Deserialize, Serialize};

/// Forwards form the pack; backs play outside it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionBaseType {
    Forward,
    Back,
}

/// Position type, ordered from the front row out to the fullback
///
/// The order matters: ball transfer between players favours neighbouring types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PositionType {
    Prop,
    Hooker,
    Lock,
    Flanker,
    NumberEight,
    ScrumHalf,
    FlyHalf,
    Centre,
    Wing,
    Fullback,
}

impl PositionType {
    pub const ALL: [PositionType; 10] = [
        PositionType::Prop,
        PositionType::Hooker,
        PositionType::Lock,
        PositionType::Flanker,
        PositionType::NumberEight,
        PositionType::ScrumHalf,
        PositionType::FlyHalf,
        PositionType::Centre,
        PositionType::Wing,
        PositionType::Fullback,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One row of the position table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionEntry {
    pub no: u8,
    pub name: String,
    pub position_type: PositionType,
    pub base_type: PositionBaseType,
}

/// Immutable lookup table of the fifteen on-pitch positions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionTable {
    entries: Vec<PositionEntry>,
}

impl PositionTable {
    /// Number of players a side fields
    pub const ON_PITCH: u8 = 15;
    /// Number of forwards in a full pack
    pub const FORWARDS: u8 = 8;

    /// The standard union numbering (1 loosehead prop .. 15 fullback)
    pub fn standard() -> Self {
        use PositionBaseType::*;
        use PositionType::*;

        let rows: [(u8, &str, PositionType, PositionBaseType); 15] = [
            (1, "Loosehead Prop", Prop, Forward),
            (2, "Hooker", Hooker, Forward),
            (3, "Tighthead Prop", Prop, Forward),
            (4, "Left Lock", Lock, Forward),
            (5, "Right Lock", Lock, Forward),
            (6, "Blindside Flanker", Flanker, Forward),
            (7, "Openside Flanker", Flanker, Forward),
            (8, "Number Eight", NumberEight, Forward),
            (9, "Scrum-half", ScrumHalf, Back),
            (10, "Fly-half", FlyHalf, Back),
            (11, "Left Wing", Wing, Back),
            (12, "Inside Centre", Centre, Back),
            (13, "Outside Centre", Centre, Back),
            (14, "Right Wing", Wing, Back),
            (15, "Fullback", Fullback, Back),
        ];

        PositionTable {
            entries: rows
                .iter()
                .map(|&(no, name, position_type, base_type)| PositionEntry {
                    no,
                    name: name.to_string(),
                    position_type,
                    base_type,
                })
                .collect(),
        }
    }

    /// Build a table from custom entries (e.g. localised names)
    ///
    /// Every shirt number 1..=15 must appear exactly once and each position
    /// type must always carry the same base type.
    pub fn from_entries(mut entries: Vec<PositionEntry>) -> Result<Self> {
        entries.sort_by_key(|e| e.no);
        let numbers: Vec<u8> = entries.iter().map(|e| e.no).collect();
        let expected: Vec<u8> = (1..=Self::ON_PITCH).collect();
        if numbers != expected {
            return Err(SimError::Config(format!(
                "position table must contain shirt numbers 1..=15 exactly once, got {numbers:?}"
            )));
        }
        for entry in &entries {
            if entries
                .iter()
                .any(|e| e.position_type == entry.position_type && e.base_type != entry.base_type)
            {
                return Err(SimError::Config(format!(
                    "position type {:?} has conflicting base types",
                    entry.position_type
                )));
            }
        }
        Ok(PositionTable { entries })
    }

    pub fn entries(&self) -> &[PositionEntry] {
        &self.entries
    }

    pub fn by_no(&self, no: u8) -> Option<&PositionEntry> {
        self.entries.iter().find(|e| e.no == no)
    }

    pub fn no_by_name(&self, name: &str) -> Option<u8> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.no)
    }

    pub fn base_type_of(&self, position_type: PositionType) -> Option<PositionBaseType> {
        self.entries
            .iter()
            .find(|e| e.position_type == position_type)
            .map(|e| e.base_type)
    }

    pub fn positions_of_type(&self, position_type: PositionType) -> impl Iterator<Item = &PositionEntry> {
        self.entries
            .iter()
            .filter(move |e| e.position_type == position_type)
    }

    pub fn positions_of_base_type(&self, base_type: PositionBaseType) -> impl Iterator<Item = &PositionEntry> {
        self.entries.iter().filter(move |e| e.base_type == base_type)
    }

    pub fn is_forward(&self, position_type: PositionType) -> bool {
        self.base_type_of(position_type) == Some(PositionBaseType::Forward)
    }
}

impl Default for PositionTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_has_fifteen_positions() {
        let table = PositionTable::standard();
        assert_eq!(table.entries().len(), 15);
        assert_eq!(
            table.positions_of_base_type(PositionBaseType::Forward).count(),
            PositionTable::FORWARDS as usize
        );
        assert_eq!(table.by_no(9).unwrap().position_type, PositionType::ScrumHalf);
        assert_eq!(table.no_by_name("Fullback"), Some(15));
        assert_eq!(table.positions_of_type(PositionType::Prop).count(), 2);
    }

    #[test]
    fn test_from_entries_rejects_missing_numbers() {
        let mut entries = PositionTable::standard().entries().to_vec();
        entries.pop();
        assert!(PositionTable::from_entries(entries).is_err());
    }

    #[test]
    fn test_from_entries_rejects_conflicting_base_types() {
        let mut entries = PositionTable::standard().entries().to_vec();
        entries[0].base_type = PositionBaseType::Back;
        assert!(PositionTable::from_entries(entries).is_err());
    }

    #[test]
    fn test_base_type_lookup() {
        let table = PositionTable::standard();
        assert!(table.is_forward(PositionType::NumberEight));
        assert!(!table.is_forward(PositionType::FlyHalf));
    }
}

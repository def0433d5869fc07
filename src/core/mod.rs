//! Core domain types and entities

pub mod condition;
pub mod entity;
pub mod player;
pub mod position;
pub mod referee;
pub mod stats;
pub mod team;

pub use condition::{ConditionKind, ConditionWeights, HealthStatus, PlayerCondition, PositionFit, Severity};
pub use entity::{Entity, EntityId, EntityStore, MatchId, PlayerId, RefereeId, TeamId};
pub use player::{grade, Attributes, Player, PreferenceSet, PreferredAction};
pub use position::{PositionBaseType, PositionEntry, PositionTable, PositionType};
pub use referee::{draw_referee, Referee};
pub use stats::{PlayerPoints, PlayerStats, PointEvent, PointValues, StatKind};
pub use team::{ResultType, StandingsPoints, Team, TeamPoints, TeamResults};

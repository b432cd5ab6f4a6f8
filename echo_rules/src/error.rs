//! Error types for rule operations.
//!
//! Every error here is recoverable: the action that produced it had no effect
//! on game state and the session can continue.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A resource a player action can run short of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resource {
    Hp,
    Mp,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Hp => write!(f, "HP"),
            Resource::Mp => write!(f, "MP"),
        }
    }
}

/// Kinds of things an action can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    Quest,
    Objective,
    Enemy,
    Combat,
    Skill,
    Archetype,
    DialogueChoice,
    SaveSlot,
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TargetKind::Quest => "quest",
            TargetKind::Objective => "objective",
            TargetKind::Enemy => "enemy",
            TargetKind::Combat => "combat",
            TargetKind::Skill => "skill",
            TargetKind::Archetype => "archetype",
            TargetKind::DialogueChoice => "dialogue choice",
            TargetKind::SaveSlot => "save slot",
        };
        write!(f, "{name}")
    }
}

/// Errors reported by the rule book and the session API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    /// The action is not legal in the current state.
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Not enough of a resource to pay for the action.
    #[error("Insufficient {resource}: need {required}, have {available}")]
    InsufficientResource {
        resource: Resource,
        required: i32,
        available: i32,
    },

    /// The referenced quest, enemy, skill or handle does not exist.
    #[error("Unknown {kind}: {id}")]
    InvalidTarget { kind: TargetKind, id: String },

    /// A configuration document could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A session snapshot could not be encoded or decoded.
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl GameError {
    /// Shorthand for [`GameError::InvalidAction`].
    pub fn invalid_action(reason: impl Into<String>) -> Self {
        GameError::InvalidAction(reason.into())
    }

    /// Shorthand for [`GameError::InvalidTarget`].
    pub fn invalid_target(kind: TargetKind, id: impl std::fmt::Display) -> Self {
        GameError::InvalidTarget {
            kind,
            id: id.to_string(),
        }
    }
}

/// Result type for rule operations.
pub type GameResult<T> = Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GameError::InsufficientResource {
            resource: Resource::Mp,
            required: 15,
            available: 4,
        };
        assert_eq!(err.to_string(), "Insufficient MP: need 15, have 4");

        let err = GameError::invalid_target(TargetKind::Quest, "side_nothing");
        assert_eq!(err.to_string(), "Unknown quest: side_nothing");
    }
}

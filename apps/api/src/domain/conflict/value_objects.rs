use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::CoreError;

/// Conflict taxonomy
///
/// Types that arrive from the outside but are not part of the taxonomy
/// deserialize to `Unrecognized` so they can fail closed instead of failing to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    FileConflict,
    DesignConflict,
    RequirementConflict,
    ResourceConflict,
    #[serde(other)]
    Unrecognized,
}

impl std::fmt::Display for ConflictType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictType::FileConflict => write!(f, "file_conflict"),
            ConflictType::DesignConflict => write!(f, "design_conflict"),
            ConflictType::RequirementConflict => write!(f, "requirement_conflict"),
            ConflictType::ResourceConflict => write!(f, "resource_conflict"),
            ConflictType::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

impl FromStr for ConflictType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file_conflict" => Ok(ConflictType::FileConflict),
            "design_conflict" => Ok(ConflictType::DesignConflict),
            "requirement_conflict" => Ok(ConflictType::RequirementConflict),
            "resource_conflict" => Ok(ConflictType::ResourceConflict),
            other => Err(CoreError::UnknownConflictType(other.to_string())),
        }
    }
}

/// Lifecycle status of a conflict
///
/// # Status Transitions
/// ```text
/// Pending -> Resolving -> Resolved
///    |          |-> Pending
///    |          \-> Escalated -> Resolving
///    \-> Escalated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStatus {
    Pending,
    Resolving,
    Resolved,
    Escalated,
}

impl ConflictStatus {
    pub fn can_transition_to(&self, next: ConflictStatus) -> bool {
        use ConflictStatus::*;
        matches!(
            (self, next),
            (Pending, Resolving)
                | (Pending, Escalated)
                | (Resolving, Resolved)
                | (Resolving, Pending)
                | (Resolving, Escalated)
                | (Escalated, Resolving)
        )
    }
}

impl std::fmt::Display for ConflictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictStatus::Pending => write!(f, "pending"),
            ConflictStatus::Resolving => write!(f, "resolving"),
            ConflictStatus::Resolved => write!(f, "resolved"),
            ConflictStatus::Escalated => write!(f, "escalated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_types_deserialize_to_unrecognized() {
        let parsed: ConflictType = serde_json::from_str("\"license_conflict\"").unwrap();
        assert_eq!(parsed, ConflictType::Unrecognized);

        let parsed: ConflictType = serde_json::from_str("\"file_conflict\"").unwrap();
        assert_eq!(parsed, ConflictType::FileConflict);
    }

    #[test]
    fn from_str_rejects_unknown_types() {
        assert!(matches!(
            "license_conflict".parse::<ConflictType>(),
            Err(CoreError::UnknownConflictType(t)) if t == "license_conflict"
        ));
        assert_eq!(
            "resource_conflict".parse::<ConflictType>().unwrap(),
            ConflictType::ResourceConflict
        );
    }

    #[test]
    fn resolved_is_terminal() {
        for next in [
            ConflictStatus::Pending,
            ConflictStatus::Resolving,
            ConflictStatus::Escalated,
        ] {
            assert!(!ConflictStatus::Resolved.can_transition_to(next));
        }
    }

    #[test]
    fn pending_cannot_skip_resolving() {
        assert!(!ConflictStatus::Pending.can_transition_to(ConflictStatus::Resolved));
        assert!(!ConflictStatus::Escalated.can_transition_to(ConflictStatus::Resolved));
    }
}

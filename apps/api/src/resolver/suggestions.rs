use crate::domain::conflict::{ConflictType, SuggestedResolution};

fn suggestion(strategy: &str, description: &str, pros: &[&str], cons: &[&str], confidence: u8) -> SuggestedResolution {
    SuggestedResolution {
        strategy: strategy.to_string(),
        description: description.to_string(),
        pros: pros.iter().map(|p| p.to_string()).collect(),
        cons: cons.iter().map(|c| c.to_string()).collect(),
        confidence,
    }
}

/// Options offered for a conflict that was reported without any
pub fn default_suggestions(conflict_type: ConflictType) -> Vec<SuggestedResolution> {
    match conflict_type {
        ConflictType::FileConflict => vec![
            suggestion(
                "auto_merge",
                "Splice non-overlapping edits into the base version",
                &["Keeps every agent's work", "No waiting"],
                &["Only possible when line ranges do not overlap"],
                80,
            ),
            suggestion(
                "agent_consensus",
                "Ask the involved agents to settle on one version",
                &["Agents know their own changes"],
                &["May discard work"],
                60,
            ),
            suggestion(
                "manual_intervention",
                "Review the competing edits by hand",
                &["Most reliable result"],
                &["Blocks the file until someone looks at it"],
                90,
            ),
        ],
        ConflictType::DesignConflict => vec![
            suggestion(
                "agent_consensus",
                "Follow the recorded design guidance",
                &["Consistent with earlier decisions"],
                &["Guidance may be outdated"],
                70,
            ),
            suggestion(
                "user_decision",
                "Let the project owner choose",
                &["Authoritative"],
                &["Needs the owner's time"],
                85,
            ),
        ],
        ConflictType::RequirementConflict => vec![
            suggestion(
                "auto_merge",
                "Fold the requirements into the highest-priority one",
                &["Single source of truth"],
                &["Lower-priority nuance may be lost"],
                75,
            ),
            suggestion(
                "user_decision",
                "Let the project owner rewrite the requirement",
                &["Captures intent exactly"],
                &["Slower"],
                80,
            ),
        ],
        ConflictType::ResourceConflict => vec![suggestion(
            "manual_intervention",
            "Schedule access to the contested resource",
            &["Avoids corrupting shared state"],
            &["One agent waits"],
            85,
        )],
        ConflictType::Unrecognized => vec![suggestion(
            "manual_intervention",
            "Inspect the conflict by hand",
            &["Nothing is decided blindly"],
            &["Needs a human"],
            50,
        )],
    }
}

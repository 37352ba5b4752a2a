// Goal and instruction classification
//
// A heuristic behind a trait so a stronger language model can replace it
// without touching orchestration control flow.

use serde::{Deserialize, Serialize};

use crate::domain::agent::AgentName;
use crate::domain::project::{InstructionPriority, InstructionType};
use crate::domain::task::Complexity;

/// Canonical goal shapes with a known task breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalArchetype {
    Authentication,
    Api,
    Database,
    Generic,
}

impl std::fmt::Display for GoalArchetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GoalArchetype::Authentication => write!(f, "authentication"),
            GoalArchetype::Api => write!(f, "api"),
            GoalArchetype::Database => write!(f, "database"),
            GoalArchetype::Generic => write!(f, "generic"),
        }
    }
}

pub trait Classifier: Send + Sync {
    fn classify_goal(&self, goal: &str) -> GoalArchetype;

    fn classify_instruction(&self, instruction: &str) -> InstructionType;

    fn instruction_priority(&self, instruction: &str) -> InstructionPriority;

    /// First roster agent named in the text
    fn mentioned_agent(&self, text: &str) -> Option<AgentName>;

    fn estimate_complexity(&self, goal: &str) -> Complexity;
}

/// Keyword matching over lowercased word tokens
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }
}

fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn any_token<F>(tokens: &[String], predicate: F) -> bool
where
    F: Fn(&str) -> bool,
{
    tokens.iter().any(|t| predicate(t))
}

fn any_prefix(tokens: &[String], prefixes: &[&str]) -> bool {
    any_token(tokens, |t| prefixes.iter().any(|p| t.starts_with(p)))
}

impl Classifier for KeywordClassifier {
    fn classify_goal(&self, goal: &str) -> GoalArchetype {
        let words = tokens(goal);

        if any_token(&words, |t| t.contains("auth"))
            || any_prefix(&words, &["login", "signin", "signup", "password", "sso"])
        {
            GoalArchetype::Authentication
        } else if any_prefix(&words, &["database", "schema", "migration", "sql", "postgres"]) {
            GoalArchetype::Database
        } else if any_prefix(&words, &["api", "endpoint", "graphql", "rest", "webhook"]) {
            GoalArchetype::Api
        } else {
            GoalArchetype::Generic
        }
    }

    fn classify_instruction(&self, instruction: &str) -> InstructionType {
        let words = tokens(instruction);

        if any_prefix(&words, &["priorit", "urgent", "asap", "deprioritiz"]) {
            InstructionType::PriorityChange
        } else if self.mentioned_agent(instruction).is_some()
            || any_prefix(&words, &["style", "prefer", "always", "never", "behav"])
        {
            InstructionType::AgentBehavior
        } else if any_prefix(&words, &["design", "architect", "pattern", "approach", "layout"]) {
            InstructionType::DesignFeedback
        } else {
            InstructionType::TaskGuidance
        }
    }

    fn instruction_priority(&self, instruction: &str) -> InstructionPriority {
        let words = tokens(instruction);

        if any_prefix(&words, &["urgent", "asap", "immediately", "critical", "blocker"]) {
            InstructionPriority::Urgent
        } else if any_prefix(&words, &["important", "high"]) {
            InstructionPriority::High
        } else if any_prefix(&words, &["minor", "eventually", "someday", "low", "nice"]) {
            InstructionPriority::Low
        } else {
            InstructionPriority::Medium
        }
    }

    fn mentioned_agent(&self, text: &str) -> Option<AgentName> {
        let words = tokens(text);
        AgentName::ROSTER
            .into_iter()
            .find(|name| words.iter().any(|w| w == &name.as_str().to_lowercase()))
    }

    fn estimate_complexity(&self, goal: &str) -> Complexity {
        let words = tokens(goal);

        if any_prefix(&words, &["enterprise", "distributed", "microservice", "realtime", "scalab"]) {
            Complexity::Expert
        } else if any_prefix(&words, &["integrat", "complex", "multiple", "system", "platform"]) {
            Complexity::Complex
        } else if words.len() <= 4 {
            Complexity::Simple
        } else {
            Complexity::Moderate
        }
    }
}

// Goal decomposition into dependency-ordered task sets

use super::classifier::GoalArchetype;
use crate::domain::task::{Complexity, Task};
use crate::domain::value_objects::Priority;

struct Stage {
    title: String,
    description: String,
    priority: Priority,
    complexity: Complexity,
    minutes: u32,
    /// Indexes of earlier stages
    depends_on: &'static [usize],
}

fn stage(
    title: impl Into<String>,
    description: impl Into<String>,
    priority: Priority,
    complexity: Complexity,
    minutes: u32,
    depends_on: &'static [usize],
) -> Stage {
    Stage {
        title: title.into(),
        description: description.into(),
        priority,
        complexity,
        minutes,
        depends_on,
    }
}

fn stages(archetype: GoalArchetype, goal: &str, complexity: Complexity) -> Vec<Stage> {
    use Complexity::*;
    use Priority::*;

    match archetype {
        GoalArchetype::Authentication => vec![
            stage(
                "Design authentication architecture",
                format!("Design the authentication flow, token handling and session model for: {goal}"),
                High,
                Moderate,
                60,
                &[],
            ),
            stage(
                "Implement authentication backend",
                "Build the backend endpoints for sign-in, token issuance, refresh and verification",
                High,
                Complex,
                120,
                &[0],
            ),
            stage(
                "Build login UI",
                "Create the frontend login and consent screens with clear error states",
                Medium,
                Moderate,
                90,
                &[0],
            ),
            stage(
                "Security audit of authentication",
                "Security review of token storage, session expiry and the login flow",
                High,
                Moderate,
                60,
                &[1, 2],
            ),
        ],
        GoalArchetype::Api => vec![
            stage(
                "Design API contract",
                format!("Define resources, request and response shapes and error codes for: {goal}"),
                High,
                Moderate,
                60,
                &[],
            ),
            stage(
                "Implement API endpoints",
                "Build the backend handlers, validation and persistence behind the contract",
                High,
                Complex,
                180,
                &[0],
            ),
            stage(
                "Write API tests and documentation",
                "Integration testing of every endpoint and reference documentation",
                Medium,
                Moderate,
                90,
                &[1],
            ),
        ],
        GoalArchetype::Database => vec![
            stage(
                "Design database schema",
                format!("Model tables, keys and constraints for: {goal}"),
                High,
                Moderate,
                90,
                &[],
            ),
            stage(
                "Write database migrations",
                "Versioned migrations for the new schema, with rollback",
                High,
                Moderate,
                60,
                &[0],
            ),
            stage(
                "Implement data access layer",
                "Backend repositories and queries over the new schema",
                High,
                Complex,
                120,
                &[1],
            ),
            stage(
                "Review query performance",
                "Review indexes and query plans, monitoring the slowest queries",
                Medium,
                Moderate,
                60,
                &[2],
            ),
        ],
        GoalArchetype::Generic => vec![
            stage(
                format!("Research: {goal}"),
                "Research the requirements, constraints and prior art",
                High,
                Simple,
                60,
                &[],
            ),
            stage(
                format!("Implement: {goal}"),
                "Build the feature end to end",
                High,
                complexity,
                complexity.baseline_minutes(),
                &[0],
            ),
            stage(
                format!("Test: {goal}"),
                "Testing and integration checks for the new feature",
                Medium,
                Simple,
                60,
                &[1],
            ),
        ],
    }
}

/// Builds the task set for a goal
///
/// Every dependency points at a task earlier in the returned list.
pub fn decompose(archetype: GoalArchetype, goal: &str, complexity: Complexity) -> Vec<Task> {
    let goal = goal.trim();
    let mut tasks: Vec<Task> = Vec::new();

    for stage in stages(archetype, goal, complexity) {
        let dependencies: Vec<_> = stage
            .depends_on
            .iter()
            .filter_map(|&i| tasks.get(i).map(|t| t.id))
            .collect();
        let task = Task::new(
            stage.title,
            stage.description,
            stage.priority,
            stage.complexity,
            stage.minutes,
        )
        .depends_on(dependencies);
        tasks.push(task);
    }

    tasks
}

// User guidance routing
//
// Every instruction is written to the project's instruction log, whether its
// handler applied it, ignored it or failed.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::manager::Orchestrator;
use crate::domain::agent::AgentName;
use crate::domain::project::{
    DesignCategory, DesignChoice, InstructionOutcome, InstructionPriority, InstructionRecord,
    InstructionType, UserInstruction,
};
use crate::domain::task::TaskStatus;
use crate::domain::value_objects::Priority;
use crate::errors::{CoreError, CoreResult};

const DEFAULT_ISSUER: &str = "user";
const BLANK_INSTRUCTION: &str = "Instruction must not be empty";

impl From<InstructionPriority> for Priority {
    fn from(priority: InstructionPriority) -> Self {
        match priority {
            InstructionPriority::Urgent => Priority::Critical,
            InstructionPriority::High => Priority::High,
            InstructionPriority::Medium => Priority::Medium,
            InstructionPriority::Low => Priority::Low,
        }
    }
}

impl Orchestrator {
    /// Classifies an instruction, routes it and records the outcome
    ///
    /// Only an unknown project, a blank instruction or a failed audit write is
    /// an error. A blank instruction is still audited as failed before it is
    /// rejected. Handler failures are reported in the returned record's outcome.
    pub async fn receive_user_guidance(
        &self,
        project_id: &str,
        instruction: UserInstruction,
    ) -> CoreResult<InstructionRecord> {
        self.context.get(project_id).await?;

        let text = instruction.instruction.trim().to_string();
        let blank = text.is_empty();

        let instruction_type = instruction
            .instruction_type
            .unwrap_or_else(|| self.classifier.classify_instruction(&text));
        let priority = instruction
            .priority
            .unwrap_or_else(|| self.classifier.instruction_priority(&text));
        let issued_by = instruction
            .issued_by
            .clone()
            .unwrap_or_else(|| DEFAULT_ISSUER.to_string());
        let target = instruction.target.clone();

        let handled = if blank {
            Err(CoreError::InvalidInput(BLANK_INSTRUCTION.to_string()))
        } else {
            self.route(project_id, instruction_type, priority, &text, target.as_deref(), &issued_by)
                .await
        };

        let outcome = match handled {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(project_id, %instruction_type, error = %e, "Instruction could not be applied");
                InstructionOutcome::Failed(e.to_string())
            }
        };

        let record = InstructionRecord {
            id: Uuid::new_v4(),
            instruction: text,
            instruction_type,
            priority,
            target,
            issued_by,
            outcome,
            received_at: Utc::now(),
        };
        self.context.record_instruction(project_id, record.clone()).await?;
        info!(project_id, %instruction_type, instruction_id = %record.id, "Instruction recorded");

        if blank {
            return Err(CoreError::InvalidInput(BLANK_INSTRUCTION.to_string()));
        }
        Ok(record)
    }

    async fn route(
        &self,
        project_id: &str,
        instruction_type: InstructionType,
        priority: InstructionPriority,
        text: &str,
        target: Option<&str>,
        issued_by: &str,
    ) -> CoreResult<InstructionOutcome> {
        match instruction_type {
            InstructionType::TaskGuidance => self.apply_task_guidance(project_id, text, target).await,
            InstructionType::AgentBehavior => {
                self.apply_agent_behavior(project_id, text, target, issued_by).await
            }
            InstructionType::PriorityChange => {
                self.apply_priority_change(project_id, priority, target).await
            }
            InstructionType::DesignFeedback => self.apply_design_feedback(project_id, text).await,
        }
    }

    async fn apply_task_guidance(
        &self,
        project_id: &str,
        text: &str,
        target: Option<&str>,
    ) -> CoreResult<InstructionOutcome> {
        let note = text.to_string();

        if let Some(target) = target {
            let task_id = parse_task_id(target)?;
            let task = self
                .context
                .update_task(project_id, task_id, move |task| {
                    task.guidance.push(note);
                    Ok(())
                })
                .await?;
            return Ok(InstructionOutcome::Applied(format!("Guidance added to \"{}\"", task.title)));
        }

        let updated = self
            .context
            .write(project_id, move |context| {
                let mut updated = 0;
                for task in context
                    .active_context
                    .active_tasks
                    .iter_mut()
                    .filter(|t| t.status == TaskStatus::Pending)
                {
                    task.guidance.push(note.clone());
                    updated += 1;
                }
                Ok(updated)
            })
            .await?;

        Ok(if updated == 0 {
            InstructionOutcome::Ignored("No pending tasks to guide".to_string())
        } else {
            InstructionOutcome::Applied(format!("Guidance added to {} pending task(s)", updated))
        })
    }

    async fn apply_agent_behavior(
        &self,
        project_id: &str,
        text: &str,
        target: Option<&str>,
        issued_by: &str,
    ) -> CoreResult<InstructionOutcome> {
        let agent = match target {
            Some(target) => Some(target.parse::<AgentName>()?),
            None => self.classifier.mentioned_agent(text),
        };
        let Some(agent) = agent else {
            return Ok(InstructionOutcome::Ignored("No agent named".to_string()));
        };

        self.context
            .upsert_agent_profile(project_id, agent.as_str(), text, issued_by)
            .await?;
        Ok(InstructionOutcome::Applied(format!("Updated {}'s profile", agent)))
    }

    async fn apply_priority_change(
        &self,
        project_id: &str,
        priority: InstructionPriority,
        target: Option<&str>,
    ) -> CoreResult<InstructionOutcome> {
        let Some(target) = target else {
            return Ok(InstructionOutcome::Ignored("No task targeted".to_string()));
        };
        let task_id = parse_task_id(target)?;
        let priority = Priority::from(priority);

        let task = self
            .context
            .update_task(project_id, task_id, move |task| {
                task.priority = priority;
                Ok(())
            })
            .await?;
        Ok(InstructionOutcome::Applied(format!(
            "\"{}\" is now {} priority",
            task.title, priority
        )))
    }

    async fn apply_design_feedback(&self, project_id: &str, text: &str) -> CoreResult<InstructionOutcome> {
        let choice = DesignChoice {
            category: DesignCategory::Approach,
            decision: text.to_string(),
            reasoning: "User feedback".to_string(),
            alternatives: Vec::new(),
            impact: String::new(),
            confidence: 100,
            last_reviewed: Utc::now(),
            reviewed_by: DEFAULT_ISSUER.to_string(),
        };
        self.context.add_design_choice(project_id, choice).await?;
        Ok(InstructionOutcome::Applied("Recorded as a design choice".to_string()))
    }
}

fn parse_task_id(target: &str) -> CoreResult<Uuid> {
    Uuid::parse_str(target.trim())
        .map_err(|_| CoreError::InvalidInput(format!("Target is not a task id: {}", target)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::agents::AgentRuntime;
    use crate::context_store::ContextStore;
    use crate::domain::project::ProjectVision;
    use crate::infrastructure::repositories::{InMemoryConflictRepository, InMemoryContextRepository};
    use crate::infrastructure::{EventBus, OfflineGenerator};
    use crate::orchestrator::KeywordClassifier;

    async fn orchestrator() -> Orchestrator {
        let events = EventBus::new(64);
        let store = Arc::new(ContextStore::new(
            Arc::new(InMemoryContextRepository::new()),
            None,
            events.clone(),
        ));
        store
            .create_project("p1", ProjectVision::new("Shop", ""), vec![])
            .await
            .unwrap();
        let runtime = Arc::new(AgentRuntime::new(
            store.clone(),
            Arc::new(OfflineGenerator::new()),
            events.clone(),
            50,
        ));
        Orchestrator::new(
            store,
            runtime,
            Arc::new(InMemoryConflictRepository::new()),
            Arc::new(KeywordClassifier::new()),
            events,
        )
    }

    #[tokio::test]
    async fn task_guidance_reaches_pending_tasks() {
        let orchestrator = orchestrator().await;
        orchestrator.decompose_goal("p1", "build a landing page").await.unwrap();

        let record = orchestrator
            .receive_user_guidance("p1", UserInstruction::new("Keep the copy short"))
            .await
            .unwrap();

        assert_eq!(record.instruction_type, InstructionType::TaskGuidance);
        assert!(matches!(record.outcome, InstructionOutcome::Applied(_)));
        let context = orchestrator.context().get("p1").await.unwrap();
        assert!(context
            .tasks()
            .iter()
            .all(|t| t.guidance == vec!["Keep the copy short".to_string()]));
        assert_eq!(context.instruction_log.len(), 1);
    }

    #[tokio::test]
    async fn agent_behavior_updates_the_mentioned_agent() {
        let orchestrator = orchestrator().await;

        let record = orchestrator
            .receive_user_guidance("p1", UserInstruction::new("Zola should always write doc comments"))
            .await
            .unwrap();

        assert_eq!(record.instruction_type, InstructionType::AgentBehavior);
        let profile = orchestrator
            .context()
            .get_agent_profile("p1", "Zola")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.custom_instructions, "Zola should always write doc comments");
        assert_eq!(profile.updated_by, "user");
    }

    #[tokio::test]
    async fn urgent_priority_change_makes_the_task_critical() {
        let orchestrator = orchestrator().await;
        let tasks = orchestrator.decompose_goal("p1", "build a landing page").await.unwrap();

        let record = orchestrator
            .receive_user_guidance(
                "p1",
                UserInstruction::new("Prioritize this, it is urgent").targeting(tasks[2].id.to_string()),
            )
            .await
            .unwrap();

        assert_eq!(record.instruction_type, InstructionType::PriorityChange);
        assert_eq!(record.priority, InstructionPriority::Urgent);
        let context = orchestrator.context().get("p1").await.unwrap();
        assert_eq!(context.task(tasks[2].id).unwrap().priority, Priority::Critical);
    }

    #[tokio::test]
    async fn design_feedback_becomes_a_user_choice() {
        let orchestrator = orchestrator().await;

        orchestrator
            .receive_user_guidance("p1", UserInstruction::new("Use a layered architecture for the backend"))
            .await
            .unwrap();

        let context = orchestrator.context().get("p1").await.unwrap();
        let choice = context.design_choices.detailed_choices.last().unwrap();
        assert_eq!(choice.category, DesignCategory::Approach);
        assert_eq!(choice.confidence, 100);
        assert_eq!(choice.reviewed_by, "user");
    }

    #[tokio::test]
    async fn failed_instructions_are_still_audited() {
        let orchestrator = orchestrator().await;

        let record = orchestrator
            .receive_user_guidance("p1", UserInstruction::new("Add retries").targeting("not-a-task"))
            .await
            .unwrap();

        assert!(matches!(record.outcome, InstructionOutcome::Failed(_)));
        let context = orchestrator.context().get("p1").await.unwrap();
        assert_eq!(context.instruction_log, vec![record]);
    }

    #[tokio::test]
    async fn blank_instructions_are_audited_and_rejected() {
        let orchestrator = orchestrator().await;

        let result = orchestrator
            .receive_user_guidance("p1", UserInstruction::new("   "))
            .await;

        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
        let context = orchestrator.context().get("p1").await.unwrap();
        assert_eq!(context.instruction_log.len(), 1);
        let entry = &context.instruction_log[0];
        assert_eq!(entry.instruction, "");
        assert!(matches!(
            &entry.outcome,
            InstructionOutcome::Failed(reason) if reason.contains("must not be empty")
        ));
    }
}

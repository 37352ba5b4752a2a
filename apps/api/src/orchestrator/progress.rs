// Progress reporting
//
// Testing and deployment phase progress trail development by a fixed factor.
// That is a simplification, not a measured signal.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::agents::AgentSession;
use crate::context_store::queries::percentage;
use crate::domain::progress::{AgentPerformance, Milestone, ProgressBlocker, ProgressReport};
use crate::domain::project::ProjectContext;
use crate::domain::task::{Task, TaskStatus};
use crate::domain::value_objects::Priority;

const TESTING_LAG: f64 = 0.8;
const DEPLOYMENT_LAG: f64 = 0.6;

pub fn build_report(context: &ProjectContext, sessions: &[AgentSession], now: DateTime<Utc>) -> ProgressReport {
    let tasks = context.tasks();
    let by_status = |status: TaskStatus| -> Vec<Task> {
        tasks.iter().filter(|t| t.status == status).cloned().collect()
    };
    let active = by_status(TaskStatus::InProgress);
    let completed = by_status(TaskStatus::Completed);
    let blocked = by_status(TaskStatus::Blocked);

    let overall = percentage(completed.len(), tasks.len());

    let mut phase_progress = BTreeMap::new();
    phase_progress.insert("planning".to_string(), 100.0);
    phase_progress.insert("development".to_string(), overall);
    phase_progress.insert("testing".to_string(), overall * TESTING_LAG);
    phase_progress.insert("deployment".to_string(), overall * DEPLOYMENT_LAG);

    let agent_performance = sessions
        .iter()
        .map(|session| (session.name.to_string(), agent_performance(session, tasks)))
        .collect();

    let blockers = blocked
        .iter()
        .map(|task| ProgressBlocker {
            id: format!("blocker-{}", task.id),
            description: format!("Task \"{}\" is blocked", task.title),
            severity: match task.priority {
                Priority::Critical => Priority::Critical,
                _ => Priority::High,
            },
            blocked_tasks: vec![task.id],
            resolution_plan: task
                .assigned_to
                .map(|agent| format!("Reassign or unblock the work {} started", agent)),
        })
        .collect();

    let next_milestones = active
        .iter()
        .map(|task| Milestone {
            title: task.title.clone(),
            estimated_completion: task.started_at.unwrap_or(now)
                + Duration::minutes(i64::from(task.estimated_duration)),
            dependencies: task.dependencies.iter().copied().collect(),
        })
        .collect();

    ProgressReport {
        project_id: context.project_id.clone(),
        overall_progress: overall,
        phase_progress,
        active_tasks: active,
        completed_tasks: completed,
        blocked_tasks: blocked,
        agent_performance,
        blockers,
        next_milestones,
        last_updated: now,
    }
}

fn agent_performance(session: &AgentSession, tasks: &[Task]) -> AgentPerformance {
    let owned = tasks.iter().filter(|t| t.assigned_to == Some(session.name));
    let mut completed = 0usize;
    let mut blocked = 0usize;
    let mut total_minutes = 0.0;

    for task in owned {
        match task.status {
            TaskStatus::Completed => {
                completed += 1;
                if let (Some(start), Some(end)) = (task.started_at, task.completed_at) {
                    total_minutes += (end - start).num_milliseconds().max(0) as f64 / 60_000.0;
                }
            }
            TaskStatus::Blocked => blocked += 1,
            _ => {}
        }
    }

    AgentPerformance {
        tasks_completed: completed,
        average_completion_time: if completed == 0 {
            0.0
        } else {
            total_minutes / completed as f64
        },
        quality_score: percentage(completed, completed + blocked),
        current_status: session.status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::AgentName;
    use crate::domain::project::ProjectVision;
    use crate::domain::task::Complexity;

    fn task(title: &str) -> Task {
        Task::new(title, "", Priority::Medium, Complexity::Moderate, 90)
    }

    #[test]
    fn empty_project_reports_zero() {
        let context = ProjectContext::new("p1", ProjectVision::new("Shop", ""), vec![]);
        let report = build_report(&context, &[], Utc::now());

        assert_eq!(report.overall_progress, 0.0);
        assert_eq!(report.phase_progress["planning"], 100.0);
        assert!(report.blockers.is_empty());
    }

    #[test]
    fn report_derives_phases_blockers_and_milestones() {
        let now = Utc::now();
        let mut context = ProjectContext::new("p1", ProjectVision::new("Shop", ""), vec![]);

        let mut done = task("Schema");
        done.start(AgentName::Zola).unwrap();
        done.complete().unwrap();
        let mut failed = task("Login UI");
        failed.start(AgentName::Abeni).unwrap();
        failed.block().unwrap();
        let mut running = task("Audit");
        running.start(AgentName::Jabari).unwrap();
        let pending = task("Docs");

        context.active_context.active_tasks = vec![done, failed.clone(), running.clone(), pending];

        let mut jabari = AgentSession::new("p1", AgentName::Jabari);
        jabari.assign_task(running.id).unwrap();
        let sessions = vec![
            AgentSession::new("p1", AgentName::Zola),
            jabari,
            AgentSession::new("p1", AgentName::Abeni),
        ];

        let report = build_report(&context, &sessions, now);

        assert_eq!(report.overall_progress, 25.0);
        assert_eq!(report.phase_progress["testing"], 20.0);
        assert_eq!(report.phase_progress["deployment"], 15.0);
        assert_eq!(report.blockers.len(), 1);
        assert_eq!(report.blockers[0].blocked_tasks, vec![failed.id]);
        assert_eq!(report.next_milestones.len(), 1);
        assert_eq!(
            report.next_milestones[0].estimated_completion,
            running.started_at.unwrap() + Duration::minutes(90)
        );

        let zola = &report.agent_performance["Zola"];
        assert_eq!(zola.tasks_completed, 1);
        assert_eq!(zola.quality_score, 100.0);
        assert_eq!(report.agent_performance["Abeni"].quality_score, 0.0);
        assert_eq!(report.agent_performance["Jabari"].current_status, crate::domain::agent::AgentStatus::Thinking);
    }
}

// Task assignment scoring
//
// score = 0.4 x capability overlap + 0.4 x availability + 0.2 x performance,
// every component on a 0-100 scale.

use serde::Serialize;
use uuid::Uuid;

use crate::agents::{AgentSession, PerformanceHistory};
use crate::domain::agent::{AgentName, AgentStatus};
use crate::domain::task::Task;

const CAPABILITY_WEIGHT: f64 = 0.4;
const AVAILABILITY_WEIGHT: f64 = 0.4;
const PERFORMANCE_WEIGHT: f64 = 0.2;
const POINTS_PER_CAPABILITY: f64 = 25.0;

/// Outcome of assigning a task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub task_id: Uuid,
    pub agent: AgentName,
    pub reasoning: String,
    /// 0-100
    pub confidence: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateScore {
    pub agent: AgentName,
    pub matched_capabilities: Vec<String>,
    pub capability: f64,
    pub availability: f64,
    pub performance: f64,
    pub total: f64,
}

impl CandidateScore {
    pub fn reasoning(&self, task: &Task) -> String {
        let fit = if self.matched_capabilities.is_empty() {
            "no matching capabilities, chosen for availability".to_string()
        } else {
            format!("matches {}", self.matched_capabilities.join(", "))
        };
        format!(
            "{} {}; {:.0} historical performance on {} tasks",
            self.agent, fit, self.performance, task.complexity
        )
    }

    pub fn confidence(&self) -> u8 {
        self.total.round().clamp(0.0, 100.0) as u8
    }
}

fn availability(status: AgentStatus) -> f64 {
    match status {
        AgentStatus::Idle => 100.0,
        _ => 0.0,
    }
}

pub fn score(session: &AgentSession, task: &Task, performance: &PerformanceHistory) -> CandidateScore {
    let matched: Vec<String> = session
        .matching_capabilities(&task.keywords())
        .into_iter()
        .map(str::to_string)
        .collect();
    let capability = (matched.len() as f64 * POINTS_PER_CAPABILITY).min(100.0);
    let availability = availability(session.status);
    let performance = performance.score(session.name, task.complexity);

    CandidateScore {
        agent: session.name,
        matched_capabilities: matched,
        capability,
        availability,
        performance,
        total: CAPABILITY_WEIGHT * capability
            + AVAILABILITY_WEIGHT * availability
            + PERFORMANCE_WEIGHT * performance,
    }
}

/// Highest scoring idle candidate; ties go to the earlier roster agent
pub fn best_candidate(
    sessions: &[AgentSession],
    task: &Task,
    performance: &PerformanceHistory,
) -> Option<CandidateScore> {
    let mut ordered: Vec<&AgentSession> = sessions
        .iter()
        .filter(|s| s.status == AgentStatus::Idle)
        .collect();
    ordered.sort_by_key(|s| s.name);

    let mut best: Option<CandidateScore> = None;
    for session in ordered {
        let candidate = score(session, task, performance);
        let better = match &best {
            Some(current) => candidate.total > current.total,
            None => true,
        };
        if better {
            best = Some(candidate);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::Complexity;
    use crate::domain::value_objects::Priority;

    fn roster() -> Vec<AgentSession> {
        AgentName::ROSTER
            .into_iter()
            .map(|name| AgentSession::new("p1", name))
            .collect()
    }

    fn task(title: &str, description: &str) -> Task {
        Task::new(title, description, Priority::High, Complexity::Moderate, 60)
    }

    #[test]
    fn backend_work_goes_to_zola() {
        let best = best_candidate(
            &roster(),
            &task("Implement authentication backend", "Build the API and database access"),
            &PerformanceHistory::new(),
        )
        .unwrap();

        assert_eq!(best.agent, AgentName::Zola);
        assert!(best.matched_capabilities.contains(&"backend_development".to_string()));
        assert_eq!(best.confidence(), 78);
    }

    #[test]
    fn security_review_goes_to_jabari() {
        let best = best_candidate(
            &roster(),
            &task("Security audit", "Security review of the login flow"),
            &PerformanceHistory::new(),
        )
        .unwrap();

        assert_eq!(best.agent, AgentName::Jabari);
    }

    #[test]
    fn busy_agents_are_not_candidates() {
        let mut sessions = roster();
        for session in sessions.iter_mut() {
            session.assign_task(Uuid::new_v4()).unwrap();
        }

        assert!(best_candidate(&sessions, &task("anything", ""), &PerformanceHistory::new()).is_none());
    }

    #[test]
    fn ties_go_to_roster_order() {
        let sessions: Vec<AgentSession> = [AgentName::Nexus, AgentName::Jabari]
            .into_iter()
            .map(|name| AgentSession::new("p1", name))
            .collect();
        // Both have an 80 baseline on simple work and match nothing here
        let simple = Task::new("Quarterly report", "", Priority::Low, Complexity::Simple, 60);

        let best = best_candidate(&sessions, &simple, &PerformanceHistory::new()).unwrap();
        assert_eq!(best.agent, AgentName::Jabari);
    }

    #[test]
    fn capability_points_are_capped() {
        let session = AgentSession::new("p1", AgentName::Zola);
        let scored = score(
            &session,
            &task("backend api database architecture design development system", ""),
            &PerformanceHistory::new(),
        );

        assert_eq!(scored.capability, 100.0);
    }
}

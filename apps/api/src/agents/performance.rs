// Historical performance per agent and task complexity
//
// Feeds the 20% performance share of assignment scoring.

use dashmap::DashMap;
use serde::Serialize;

use crate::domain::agent::AgentName;
use crate::domain::task::Complexity;

/// Prior expectation (0-100) of how well an agent handles a complexity
pub fn baseline(agent: AgentName, complexity: Complexity) -> f64 {
    use AgentName::*;
    use Complexity::*;
    match (agent, complexity) {
        (Zola, Simple) => 85.0,
        (Zola, Moderate) => 90.0,
        (Zola, Complex) => 95.0,
        (Zola, Expert) => 85.0,
        (Jabari, Simple) => 80.0,
        (Jabari, Moderate) => 85.0,
        (Jabari, Complex) => 80.0,
        (Jabari, Expert) => 90.0,
        (Kofi, Simple) => 85.0,
        (Kofi, Moderate) => 80.0,
        (Kofi, Complex) => 85.0,
        (Kofi, Expert) => 80.0,
        (Abeni, Simple) => 90.0,
        (Abeni, Moderate) => 85.0,
        (Abeni, Complex) => 80.0,
        (Abeni, Expert) => 75.0,
        (Nexus, Simple) => 80.0,
        (Nexus, Moderate) => 85.0,
        (Nexus, Complex) => 85.0,
        (Nexus, Expert) => 85.0,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerformanceRecord {
    pub completed: u32,
    pub failed: u32,
    pub total_minutes: f64,
}

impl PerformanceRecord {
    pub fn success_rate(&self) -> Option<f64> {
        let attempts = self.completed + self.failed;
        (attempts > 0).then(|| self.completed as f64 / attempts as f64 * 100.0)
    }
}

#[derive(Debug, Default)]
pub struct PerformanceHistory {
    records: DashMap<(AgentName, Complexity), PerformanceRecord>,
}

impl PerformanceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, agent: AgentName, complexity: Complexity, minutes: f64) {
        let mut record = self.records.entry((agent, complexity)).or_default();
        record.completed += 1;
        record.total_minutes += minutes.max(0.0);
    }

    pub fn record_failure(&self, agent: AgentName, complexity: Complexity) {
        self.records.entry((agent, complexity)).or_default().failed += 1;
    }

    pub fn record(&self, agent: AgentName, complexity: Complexity) -> PerformanceRecord {
        self.records
            .get(&(agent, complexity))
            .map(|r| *r)
            .unwrap_or_default()
    }

    /// Baseline blended half and half with the observed success rate
    pub fn score(&self, agent: AgentName, complexity: Complexity) -> f64 {
        let prior = baseline(agent, complexity);
        match self.record(agent, complexity).success_rate() {
            Some(rate) => (prior + rate) / 2.0,
            None => prior,
        }
    }
}

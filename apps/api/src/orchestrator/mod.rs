// Orchestrator
// Turns goals into tasks, hands tasks to agents and keeps conflicts moving

pub mod assignment;
pub mod classifier;
pub mod decomposition;
pub mod guidance;
pub mod manager;
pub mod monitor;
pub mod progress;

pub use assignment::{Assignment, CandidateScore};
pub use classifier::{Classifier, GoalArchetype, KeywordClassifier};
pub use manager::{NewConflict, Orchestrator, UserDecision};
pub use monitor::{ConflictMonitor, MonitorSettings, Monitors, ScanSummary};
pub use progress::build_report;

// Agent Runtime
//
// Agent sessions, supervised task execution, agent messaging and the
// merge ladder for file conflicts.

pub mod generation;
pub mod merge;
pub mod messages;
pub mod performance;
pub mod prompts;
pub mod runtime;
pub mod types;
pub mod worker;

// Re-export main types
pub use generation::{GenerationOutput, GenerationProvider};
pub use messages::{AgentMessage, DirectDelivery, MessageBus, MessageType};
pub use performance::PerformanceHistory;
pub use runtime::AgentRuntime;
pub use types::TaskOutcome;
pub use worker::AgentSession;

// Context Store
//
// Owns the versioned shared state of every project. All writes to a project
// are serialized through one per-project lock and bump the version exactly once.

pub mod queries;
pub mod store;
pub mod sync;

pub use queries::{ContextSummary, Relevance, SearchHit};
pub use store::{ContextStore, RequirementUpdate};
pub use sync::SyncOutcome;

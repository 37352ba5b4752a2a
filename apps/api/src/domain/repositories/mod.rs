// Storage ports
// Implemented by adapters in the infrastructure layer

pub mod conflict_repository;
pub mod context_repository;

pub use conflict_repository::ConflictRepository;
pub use context_repository::{ContextRepository, RemoteContextStore};

// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod memory_conflict_repository;
pub mod memory_context_repository;
pub mod memory_remote_store;
pub mod postgres_remote_store;

pub use memory_conflict_repository::InMemoryConflictRepository;
pub use memory_context_repository::InMemoryContextRepository;
pub use memory_remote_store::InMemoryRemoteStore;
pub use postgres_remote_store::PostgresRemoteStore;

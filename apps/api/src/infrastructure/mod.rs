// Infrastructure layer module
// Contains storage adapters, the event bus and external service integrations
// Follows Hexagonal Architecture

pub mod event_bus;
pub mod generation;
pub mod repositories;

pub use event_bus::{EventBus, EventBusError, EventReceiver};
pub use generation::OfflineGenerator;

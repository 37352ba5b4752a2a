// Domain layer module exports
// Following Hexagonal Architecture and DDD principles
// Domain is independent of infrastructure concerns

pub mod agent;
pub mod conflict;
pub mod events;
pub mod progress;
pub mod project;
pub mod repositories;
pub mod task;
pub mod value_objects;

pub mod agents;
pub mod conflicts;
pub mod events;
pub mod health;
pub mod projects;
pub mod tasks;

//! Conclave API Library
//!
//! Orchestration core for a team of AI agents working on shared projects:
//! a versioned context store, an agent runtime, a conflict resolver and the
//! orchestrator that drives them, plus the HTTP adapter in front of them.

pub mod agents;
pub mod api;
pub mod app;
pub mod config;
pub mod context_store;
pub mod domain;
pub mod errors;
pub mod infrastructure;
pub mod orchestrator;
pub mod resolver;

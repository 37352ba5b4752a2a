// Conflict domain module
// Detected incompatibilities between agents, and the resolutions recorded for them

#![allow(clippy::module_inception)]

pub mod conflict;
pub mod merge;
pub mod resolution;
pub mod value_objects;

pub use conflict::{Conflict, ConflictContext, SuggestedResolution};
pub use merge::{AgentChange, MergeConflict};
pub use resolution::{Resolution, ResolutionStrategy};
pub use value_objects::{ConflictStatus, ConflictType};

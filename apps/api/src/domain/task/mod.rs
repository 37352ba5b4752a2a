// Task domain module
// Contains the task entity and its lifecycle value objects

#![allow(clippy::module_inception)]

pub mod task;
pub mod value_objects;

pub use task::Task;
pub use value_objects::{Complexity, TaskStatus};

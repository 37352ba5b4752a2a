// Project domain module
// The versioned shared context every agent works against

pub mod context;
pub mod instruction;
pub mod patch;
pub mod value_objects;

pub use context::{
    ActiveContext, AgentBehaviorProfile, Blocker, ContextMetadata, DesignChoice, DesignChoices,
    ImplementationLogEntry, ProjectContext, ProjectVision, Requirement, Requirements,
    ResolutionRecord,
};
pub use instruction::{
    InstructionOutcome, InstructionPriority, InstructionRecord, InstructionType, UserInstruction,
};
pub use patch::ContextPatch;
pub use value_objects::{DesignCategory, RequirementStatus};

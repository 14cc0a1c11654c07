//! Workflow execution: a declared sequence of extract / transform / validate
//! steps run against the job coordinator.
//!
//! ```text
//! JSON → WorkflowDefinition::from_value (validated) → WorkflowExecutor::execute → WorkflowRun
//! ```

pub mod types;
pub mod executor;

pub use types::*;
pub use executor::WorkflowExecutor;

use thiserror::Error;

/// Upper bound on steps in one definition.
pub const MAX_WORKFLOW_STEPS: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Workflow definition is required")]
    MissingDefinition,

    #[error("Invalid workflow definition: {0}")]
    InvalidDefinition(String),

    #[error("Workflow has no steps")]
    NoSteps,

    #[error("Workflow has {count} steps; at most {max} are allowed")]
    TooManySteps { count: usize, max: usize },

    #[error("Step {index}: {reason}")]
    InvalidStep { index: usize, reason: String },
}
